//! Error injection and propagation.

use core_types::{ErrorKind, ErrorPayload, Value};
use generator::{GeneratorStatus, Resumption};

use super::{bump, count, counter, make, make_counted};

fn boom() -> ErrorPayload {
    ErrorPayload::with_message(ErrorKind::custom("Boom"), "kaboom")
}

#[test]
fn test_throw_into_unused_raises_before_first_instruction() {
    let runs = counter();
    let releases = counter();
    let body_runs = runs.clone();
    let gen = make_counted("unstarted", &releases, move |y| {
        bump(&body_runs);
        y.yield_value(Value::from(1))?;
        Ok(Value::None)
    });

    match gen.throw_into(boom()).unwrap() {
        Resumption::Raised(error) => {
            assert!(error.is(&ErrorKind::custom("Boom")));
            assert_eq!(error.value, Value::from("kaboom"));
        }
        other => panic!("expected Raised, got {:?}", other),
    }
    assert_eq!(count(&runs), 0);
    assert_eq!(gen.status(), GeneratorStatus::Finished);
    assert_eq!(count(&releases), 1);
}

#[test]
fn test_throw_into_suspended_is_seen_at_the_yield() {
    let gen = make("handler", |y| {
        match y.yield_value(Value::from(1)) {
            Err(error) if error.is(&ErrorKind::custom("Boom")) => {
                y.yield_value(Value::from("caught"))?;
            }
            Err(error) => return Err(error),
            Ok(_) => {}
        }
        Ok(Value::from("end"))
    });

    assert_eq!(gen.resume(Value::None).unwrap(), Resumption::Yielded(Value::from(1)));
    assert_eq!(
        gen.throw_into(boom()).unwrap(),
        Resumption::Yielded(Value::from("caught"))
    );
    assert_eq!(
        gen.resume(Value::None).unwrap(),
        Resumption::Completed(Value::from("end"))
    );
}

#[test]
fn test_unhandled_throw_finishes_and_releases_once() {
    let releases = counter();
    let gen = make_counted("unhandled", &releases, |y| {
        y.yield_value(Value::from(1))?;
        y.yield_value(Value::from(2))?;
        Ok(Value::None)
    });

    gen.resume(Value::None).unwrap();
    match gen.throw_into(boom()).unwrap() {
        Resumption::Raised(error) => assert!(error.is(&ErrorKind::custom("Boom"))),
        other => panic!("expected Raised, got {:?}", other),
    }
    assert_eq!(gen.status(), GeneratorStatus::Finished);
    assert_eq!(count(&releases), 1);

    drop(gen);
    assert_eq!(count(&releases), 1);
}

#[test]
fn test_throw_into_finished_returns_the_error() {
    let runs = counter();
    let body_runs = runs.clone();
    let gen = make("spent", move |_| {
        bump(&body_runs);
        Ok(Value::None)
    });
    gen.resume(Value::None).unwrap();

    assert_eq!(gen.throw_into(boom()).unwrap(), Resumption::Raised(boom()));
    assert_eq!(count(&runs), 1);
}

#[test]
fn test_escaping_error_carries_generator_frame() {
    let gen = make("tracer", |y| {
        y.set_line(7);
        y.yield_value(Value::None)?;
        y.set_line(9);
        Err(ErrorPayload::with_message(ErrorKind::ValueError, "bad"))
    });

    gen.resume(Value::None).unwrap();
    let error = match gen.resume(Value::None).unwrap() {
        Resumption::Raised(error) => error,
        other => panic!("expected Raised, got {:?}", other),
    };

    let frame = error.trace.last().unwrap();
    assert_eq!(frame.function_name.as_deref(), Some("tracer"));
    assert_eq!(frame.line, 9);
    assert!(error.format_trace().contains("line 9, in tracer"));
}

#[test]
fn test_body_panic_becomes_runtime_error() {
    let releases = counter();
    let gen = make_counted("panicky", &releases, |_| -> Result<Value, ErrorPayload> {
        panic!("compiled code bug")
    });

    match gen.resume(Value::None).unwrap() {
        Resumption::Raised(error) => {
            assert!(error.is(&ErrorKind::RuntimeError));
            assert!(error.to_string().contains("compiled code bug"));
        }
        other => panic!("expected Raised, got {:?}", other),
    }
    assert_eq!(gen.status(), GeneratorStatus::Finished);
    assert_eq!(count(&releases), 1);
}

#[test]
fn test_stop_iteration_raised_by_body_propagates() {
    let gen = make("stopper", |_| {
        Err(ErrorPayload::new(ErrorKind::StopIteration, Value::None))
    });

    match gen.resume(Value::None).unwrap() {
        Resumption::Raised(error) => assert!(error.is(&ErrorKind::StopIteration)),
        other => panic!("expected Raised, got {:?}", other),
    }
}
