//! Close, destruction and native resource release.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use core_types::{ErrorKind, ErrorPayload, Value};
use generator::{Generator, GeneratorError, GeneratorStatus, NativeResource, Resumption};

use super::{bump, code, count, counter, make, make_counted};

/// Bumps its counter when dropped, like a `finally` block.
struct Finally(Arc<std::sync::atomic::AtomicUsize>);

impl Drop for Finally {
    fn drop(&mut self) {
        bump(&self.0);
    }
}

#[test]
fn test_close_suspended_releases_once() {
    let releases = counter();
    let saw_exit = Arc::new(AtomicBool::new(false));
    let flag = saw_exit.clone();
    let gen = make_counted("closable", &releases, move |y| {
        if let Err(error) = y.yield_value(Value::from(1)) {
            flag.store(error.is(&ErrorKind::GeneratorExit), Ordering::SeqCst);
            return Err(error);
        }
        Ok(Value::None)
    });

    gen.resume(Value::None).unwrap();
    gen.close().unwrap();
    assert!(saw_exit.load(Ordering::SeqCst));
    assert_eq!(gen.status(), GeneratorStatus::Finished);
    assert_eq!(count(&releases), 1);

    gen.close().unwrap();
    assert_eq!(count(&releases), 1);
    assert_eq!(gen.resume(Value::None).unwrap(), Resumption::Exhausted);
}

#[test]
fn test_close_unused_never_runs_body() {
    let runs = counter();
    let releases = counter();
    let body_runs = runs.clone();
    let gen = make_counted("never", &releases, move |_| {
        bump(&body_runs);
        Ok(Value::None)
    });

    gen.close().unwrap();
    assert_eq!(gen.status(), GeneratorStatus::Finished);
    assert_eq!(count(&runs), 0);
    assert_eq!(count(&releases), 1);
}

#[test]
fn test_close_after_return_is_noop() {
    let releases = counter();
    let gen = make_counted("returned", &releases, |_| Ok(Value::None));
    gen.resume(Value::None).unwrap();
    assert_eq!(count(&releases), 1);

    gen.close().unwrap();
    assert_eq!(count(&releases), 1);
}

#[test]
fn test_close_reports_foreign_error() {
    let releases = counter();
    let gen = make_counted("cleanup_fails", &releases, |y| {
        match y.yield_value(Value::None) {
            Err(error) if error.is(&ErrorKind::GeneratorExit) => Err(ErrorPayload::with_message(
                ErrorKind::ValueError,
                "cleanup failed",
            )),
            other => other,
        }
    });

    gen.resume(Value::None).unwrap();
    match gen.close() {
        Err(GeneratorError::Raised(error)) => assert!(error.is(&ErrorKind::ValueError)),
        other => panic!("expected Raised, got {:?}", other),
    }
    assert_eq!(gen.status(), GeneratorStatus::Finished);
    assert_eq!(count(&releases), 1);
}

#[test]
fn test_close_accepts_return_after_exit() {
    let gen = make("graceful", |y| {
        let _ = y.yield_value(Value::None);
        Ok(Value::from("bye"))
    });
    gen.resume(Value::None).unwrap();
    assert!(gen.close().is_ok());
    assert_eq!(gen.status(), GeneratorStatus::Finished);
}

#[test]
fn test_destroy_unused_releases_once() {
    let runs = counter();
    let releases = counter();
    let body_runs = runs.clone();
    let gen = make_counted("dropped_early", &releases, move |_| {
        bump(&body_runs);
        Ok(Value::None)
    });

    drop(gen);
    assert_eq!(count(&runs), 0);
    assert_eq!(count(&releases), 1);
}

#[test]
fn test_destroy_suspended_runs_finally_then_releases() {
    let releases = counter();
    let finally_runs = counter();
    let guard_counter = finally_runs.clone();
    let gen = make_counted("dropped_suspended", &releases, move |y| {
        let _finally = Finally(guard_counter);
        y.yield_value(Value::from(1))?;
        y.yield_value(Value::from(2))?;
        Ok(Value::None)
    });

    gen.resume(Value::None).unwrap();
    drop(gen);
    assert_eq!(count(&finally_runs), 1);
    assert_eq!(count(&releases), 1);
}

#[test]
fn test_ignored_exit_is_reported_then_unwound_on_destroy() {
    let releases = counter();
    let exits = counter();
    let body_exits = exits.clone();
    let gen = make_counted("stubborn", &releases, move |y| loop {
        if let Err(error) = y.yield_value(Value::from("again")) {
            if y.is_unwinding() {
                bump(&body_exits);
                return Err(error);
            }
        }
    });

    gen.resume(Value::None).unwrap();
    match gen.close() {
        Err(GeneratorError::IgnoredGeneratorExit { identity }) => assert_eq!(&*identity, "stubborn"),
        other => panic!("expected IgnoredGeneratorExit, got {:?}", other),
    }
    assert_eq!(gen.status(), GeneratorStatus::Running);
    assert_eq!(count(&releases), 0);

    drop(gen);
    assert_eq!(count(&exits), 1);
    assert_eq!(count(&releases), 1);
}

#[test]
fn test_release_happens_at_termination() {
    let releases = counter();
    let gen = make_counted("short", &releases, |y| {
        y.yield_value(Value::None)?;
        Ok(Value::None)
    });

    gen.resume(Value::None).unwrap();
    assert_eq!(count(&releases), 0);
    assert!(!gen.is_resource_released());

    gen.resume(Value::None).unwrap();
    assert_eq!(count(&releases), 1);
    assert!(gen.is_resource_released());
}

#[test]
fn test_failing_release_is_contained() {
    let gen = Generator::new(
        |_| Ok(Value::None),
        "bad_release",
        code("bad_release"),
        NativeResource::new((), |()| Err(ErrorPayload::runtime_error("leak"))),
    );
    assert_eq!(gen.resume(Value::None).unwrap(), Resumption::Completed(Value::None));
    assert!(gen.is_resource_released());
}

#[test]
fn test_panicking_release_is_contained_on_destroy() {
    let gen = Generator::new(
        |_| Ok(Value::None),
        "panicking_release",
        code("panicking_release"),
        NativeResource::new((), |()| -> Result<(), ErrorPayload> { panic!("release") }),
    );
    drop(gen);
}

#[test]
fn test_body_reads_native_context() {
    let released = Arc::new(parking_lot::Mutex::new(None::<Vec<i64>>));
    let release_seen = released.clone();
    let gen = Generator::new(
        |y| {
            let seen = y.with_resource(|locals: &mut Vec<i64>| {
                locals.push(4);
                locals.len() as i64
            });
            Ok(Value::from(seen.unwrap_or(-1)))
        },
        "locals",
        code("locals"),
        NativeResource::new(vec![1_i64, 2, 3], move |locals| {
            *release_seen.lock() = Some(locals);
            Ok(())
        }),
    );
    assert_eq!(gen.resume(Value::None).unwrap(), Resumption::Completed(Value::from(4_i64)));
    assert_eq!(*released.lock(), Some(vec![1, 2, 3, 4]));
}

#[test]
fn test_destroy_returns_when_body_swallows_every_error() {
    let releases = counter();
    let gen = make_counted("swallower", &releases, |y| loop {
        let _ = y.yield_value(Value::from("still here"));
    });
    assert_eq!(
        gen.resume(Value::None).unwrap(),
        Resumption::Yielded(Value::from("still here"))
    );

    let (done_tx, done_rx) = crossbeam::channel::bounded(1);
    std::thread::spawn(move || {
        drop(gen);
        let _ = done_tx.send(());
    });

    done_rx
        .recv_timeout(std::time::Duration::from_secs(5))
        .expect("dropping a generator that swallows GeneratorExit blocked");
    assert_eq!(count(&releases), 1);
}
