//! Body-side half of the suspension protocol.

use std::sync::Arc;

use core_types::{ErrorPayload, Value};
use fibers::Suspender;
use host_runtime::{Frame, ThreadState};
use log::trace;
use parking_lot::Mutex;

use crate::rendezvous::{BodyResult, Rendezvous};
use crate::resource::NativeResource;

/// Entry point of a compiled generator body.
///
/// Runs once, on the generator's fiber, the first time the generator is
/// resumed. Returning `Ok` finishes the generator with that return value;
/// returning `Err` lets the error escape to the driver.
pub type BodyEntry = Box<dyn FnOnce(&mut Yielder<'_>) -> BodyResult + Send + 'static>;

/// Handed to a running body so it can suspend and observe injected errors.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use core_types::Value;
/// use generator::{Generator, NativeResource, Resumption};
/// use host_runtime::CodeMetadata;
///
/// let code = Arc::new(CodeMetadata::generator("echo", "echo.py", 1));
/// let echo = Generator::new(
///     |y| {
///         let reply = y.yield_value(Value::from("ready"))?;
///         Ok(reply)
///     },
///     "echo",
///     code,
///     NativeResource::empty(),
/// );
///
/// assert_eq!(echo.resume(Value::None).unwrap(), Resumption::Yielded(Value::from("ready")));
/// assert_eq!(echo.resume(Value::from(5)).unwrap(), Resumption::Completed(Value::from(5)));
/// ```
pub struct Yielder<'a> {
    suspender: &'a Suspender,
    cells: Arc<Rendezvous>,
    frame: Arc<Frame>,
    resource: Arc<Mutex<NativeResource>>,
    identity: Arc<str>,
}

impl<'a> Yielder<'a> {
    pub(crate) fn new(
        suspender: &'a Suspender,
        cells: Arc<Rendezvous>,
        frame: Arc<Frame>,
        resource: Arc<Mutex<NativeResource>>,
        identity: Arc<str>,
    ) -> Self {
        Self {
            suspender,
            cells,
            frame,
            resource,
            identity,
        }
    }

    /// Suspend with `value` until the driver resumes the generator.
    ///
    /// Returns the value sent by the driver (`None` for a plain `next`), or
    /// the error the driver injected with `throw_into` or `close()`. If the
    /// generator is destroyed while suspended this returns `GeneratorExit`
    /// and the body must return. Yielding again after that parks the body
    /// for good and its fiber is leaked.
    pub fn yield_value(&mut self, value: Value) -> BodyResult {
        self.cells.put_yielded(value);
        if self.suspender.switch_out().is_err() {
            trace!("generator '{}' unwinding at yield", self.identity);
            self.cells.clear();
            return Err(ErrorPayload::generator_exit());
        }
        self.adopt_driver_state();
        self.check_injected_error()?;
        Ok(self.cells.take_sent().unwrap_or(Value::None))
    }

    /// Raise the error injected by the driver, if there is one.
    ///
    /// Compiled code calls this on entry and after every suspension point.
    pub fn check_injected_error(&mut self) -> Result<(), ErrorPayload> {
        match self.cells.take_error() {
            Some(error) => {
                // A thrown error replaces the sent value
                self.cells.take_sent();
                Err(error)
            }
            None => Ok(()),
        }
    }

    /// Record the source line the body is executing.
    pub fn set_line(&self, line: u32) {
        self.frame.set_line(line);
    }

    /// Frame of the generator.
    pub fn frame(&self) -> &Arc<Frame> {
        &self.frame
    }

    /// Identity of the generator.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// True once the generator is being torn down.
    pub fn is_unwinding(&self) -> bool {
        self.suspender.is_unwinding()
    }

    /// Borrow the generator's native context as `T`.
    ///
    /// Returns `None` if the context is not a `T` or was already released.
    pub fn with_resource<T, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R>
    where
        T: std::any::Any,
    {
        self.resource.lock().with_handle(f)
    }

    /// Make the driver's frame stack this thread's current stack.
    pub(crate) fn adopt_driver_state(&self) {
        if let Some(state) = self.cells.driver() {
            ThreadState::install(state);
        }
    }
}

impl std::fmt::Debug for Yielder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Yielder")
            .field("identity", &self.identity)
            .field("line", &self.frame.line())
            .finish()
    }
}
