//! Frame linkage, state reporting and host value integration.

use std::sync::Arc;

use core_types::Value;
use generator::{get_identity, is_generator, Generator, GeneratorState, Resumption, WeakGenerator};
use host_runtime::{CodeMetadata, Frame, ThreadState};
use parking_lot::Mutex;

use super::make;

#[test]
fn test_frame_executing_only_while_body_runs() {
    let gen = make("flagged", |y| {
        let executing = y.frame().is_executing();
        y.yield_value(Value::from(executing))?;
        Ok(Value::from(y.frame().is_executing()))
    });

    assert!(!gen.frame().is_executing());
    assert_eq!(gen.resume(Value::None).unwrap(), Resumption::Yielded(Value::from(true)));
    assert!(!gen.frame().is_executing());
    assert_eq!(gen.resume(Value::None).unwrap(), Resumption::Completed(Value::from(true)));
    assert!(!gen.frame().is_executing());
}

#[test]
fn test_body_sees_driver_stack() {
    let outer = Arc::new(Frame::new(Arc::new(CodeMetadata::generator(
        "driver", "main.py", 3,
    ))));
    let state = ThreadState::current();
    let _outer = state.enter(outer);

    let gen = make("inspected", |y| {
        let current = ThreadState::current();
        let on_top = current
            .current_frame()
            .map(|top| Arc::ptr_eq(&top, y.frame()))
            .unwrap_or(false);
        let trace = current.capture_trace();
        let names: Vec<Value> = trace
            .iter()
            .map(|frame| Value::from(frame.function_name.clone().unwrap_or_default()))
            .collect();
        y.yield_value(Value::from(on_top))?;
        Ok(Value::tuple(names))
    });

    let depth_before = state.depth();
    assert_eq!(gen.resume(Value::None).unwrap(), Resumption::Yielded(Value::from(true)));
    assert_eq!(state.depth(), depth_before);
    assert_eq!(
        gen.resume(Value::None).unwrap(),
        Resumption::Completed(Value::tuple(vec![
            Value::from("inspected"),
            Value::from("driver"),
        ]))
    );
}

#[test]
fn test_state_reporting() {
    let slot: Arc<Mutex<Option<WeakGenerator>>> = Arc::new(Mutex::new(None));
    let inner = slot.clone();
    let gen = make("stateful", move |y| {
        let seen = inner
            .lock()
            .as_ref()
            .and_then(|weak| weak.upgrade())
            .map(|me| me.state().name().to_string())
            .unwrap_or_default();
        y.yield_value(Value::from(seen))?;
        Ok(Value::None)
    });
    *slot.lock() = Some(gen.downgrade());

    assert_eq!(gen.state(), GeneratorState::Created);
    assert_eq!(
        gen.resume(Value::None).unwrap(),
        Resumption::Yielded(Value::from("GEN_RUNNING"))
    );
    assert_eq!(gen.state(), GeneratorState::Suspended);
    gen.resume(Value::None).unwrap();
    assert_eq!(gen.state(), GeneratorState::Closed);
}

#[test]
fn test_line_tracking() {
    let gen = make("lines", |y| {
        y.set_line(12);
        y.yield_value(Value::None)?;
        y.set_line(14);
        Ok(Value::None)
    });

    assert_eq!(gen.frame().line(), 1);
    gen.resume(Value::None).unwrap();
    assert_eq!(gen.frame().line(), 12);
    assert_eq!(gen.frame().snapshot().line, 12);
}

#[test]
fn test_identity_and_code() {
    let gen = make("numbers", |_| Ok(Value::None));
    assert_eq!(gen.identity(), "numbers");
    assert_eq!(gen.code().name(), "numbers");
    assert_eq!(gen.code().filename(), "contracts.py");
    assert!(gen.to_string().starts_with("<compiled generator object numbers at 0x"));
}

#[test]
fn test_host_value_round_trip() {
    let gen = make("boxed", |_| Ok(Value::None));
    let value = gen.clone().into_value();

    assert!(is_generator(&value));
    assert!(!is_generator(&Value::from(1)));
    assert_eq!(get_identity(&value).as_deref(), Some("boxed"));
    assert_eq!(get_identity(&Value::None), None);
    assert_eq!(value.type_name(), "compiled_generator");

    let back = Generator::from_value(&value).unwrap();
    assert!(back.ptr_eq(&gen));
    assert!(Generator::from_value(&Value::from("boxed")).is_none());
}

#[test]
fn test_nested_generator_frames_stack() {
    let inner = make("inner", |y| {
        let depth = ThreadState::current().depth();
        y.yield_value(Value::from(depth as i64))?;
        Ok(Value::None)
    });

    let outer = make("outer", move |y| {
        let own_depth = ThreadState::current().depth() as i64;
        let nested = inner.resume(Value::None).map_err(core_types::ErrorPayload::from)?;
        let nested_depth = match nested {
            Resumption::Yielded(Value::Int(n)) => i64::try_from(n).unwrap_or(-1),
            _ => -1,
        };
        y.yield_value(Value::from(nested_depth - own_depth))?;
        Ok(Value::None)
    });

    assert_eq!(outer.resume(Value::None).unwrap(), Resumption::Yielded(Value::from(1_i64)));
}

#[test]
fn test_identity_with_nul_byte_still_runs() {
    let gen = make("bad\0name", |y| {
        y.yield_value(Value::from(std::thread::current().name().unwrap_or("").to_string()))?;
        Ok(Value::None)
    });

    assert_eq!(
        gen.resume(Value::None).unwrap(),
        Resumption::Yielded(Value::from("fiber-badname"))
    );
    assert_eq!(gen.identity(), "bad\0name");
    assert_eq!(gen.resume(Value::None).unwrap(), Resumption::Completed(Value::None));
}
