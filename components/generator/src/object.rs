//! The compiled generator object and its driver protocol.
//!
//! A [`GeneratorObject`] owns a body entry, a frame, a native resource and,
//! once started, the fiber the body runs on. The driver hands control to
//! the fiber with [`GeneratorObject::resume`] or
//! [`GeneratorObject::throw_into`]; the body hands it back by yielding or by
//! returning.
//!
//! Around every switch the generator's frame is pushed on the driver's
//! thread state and popped as soon as control returns, so the frame reads
//! as executing exactly while the body runs.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use core_types::{ErrorKind, ErrorPayload, HostObject, Value};
use crossbeam::atomic::AtomicCell;
use fibers::{Fiber, FiberConfig, FiberError, Suspender, Transfer};
use host_runtime::{CodeMetadata, Frame, ThreadState};
use log::{debug, error, trace, warn};
use parking_lot::Mutex;

use crate::error::{GeneratorError, GeneratorResult};
use crate::iter::GeneratorIter;
use crate::rendezvous::{BodyResult, Rendezvous};
use crate::resource::NativeResource;
use crate::status::{GeneratorState, GeneratorStatus, Resumption};
use crate::weakref::{WeakGenerator, WeakRegistry};
use crate::yielder::{BodyEntry, Yielder};

/// Host type name of compiled generators.
pub const GENERATOR_TYPE_NAME: &str = "compiled_generator";

/// What the driver hands the body on a switch.
enum Delivery {
    Send(Value),
    Throw(ErrorPayload),
}

/// Set while a driver holds control of the body; cleared on drop.
struct RunningFlag<'a>(&'a AtomicBool);

impl<'a> RunningFlag<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunningFlag(flag))
    }
}

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A compiled generator.
///
/// Always shared through a [`Generator`] handle; the object is destroyed
/// when the last strong handle goes away.
pub struct GeneratorObject {
    identity: Arc<str>,
    code: Arc<CodeMetadata>,
    frame: Arc<Frame>,
    config: FiberConfig,
    status: AtomicCell<GeneratorStatus>,
    running: AtomicBool,
    body: Mutex<Option<BodyEntry>>,
    fiber: Mutex<Option<Fiber>>,
    cells: Arc<Rendezvous>,
    resource: Arc<Mutex<NativeResource>>,
    observers: WeakRegistry,
}

impl GeneratorObject {
    /// Identity the generator was created with.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Code metadata of the body.
    pub fn code(&self) -> &Arc<CodeMetadata> {
        &self.code
    }

    /// The generator's frame.
    pub fn frame(&self) -> &Arc<Frame> {
        &self.frame
    }

    /// Current lifecycle status.
    pub fn status(&self) -> GeneratorStatus {
        self.status.load()
    }

    /// True while a driver holds control of the body.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Status and running flag folded into one observable state.
    pub fn state(&self) -> GeneratorState {
        match self.status() {
            GeneratorStatus::Unused => GeneratorState::Created,
            GeneratorStatus::Running if self.is_running() => GeneratorState::Executing,
            GeneratorStatus::Running => GeneratorState::Suspended,
            GeneratorStatus::Finished => GeneratorState::Closed,
        }
    }

    /// True once the native resource has been released.
    pub fn is_resource_released(&self) -> bool {
        self.resource.lock().is_released()
    }

    /// Number of weak references still registered.
    pub fn weak_count(&self) -> usize {
        self.observers.len()
    }

    /// Resume the body, sending `input` as the result of its pending yield.
    ///
    /// The first resume of an unused generator must send `None`.
    pub fn resume(&self, input: Value) -> GeneratorResult<Resumption> {
        self.drive(Delivery::Send(input))
    }

    /// Resume the body by raising `error` at its pending yield.
    ///
    /// On an unused generator the error is raised before the first
    /// instruction of the body. On a finished generator the error comes
    /// straight back as `Raised` without entering the body.
    pub fn throw_into(&self, error: ErrorPayload) -> GeneratorResult<Resumption> {
        self.drive(Delivery::Throw(error))
    }

    /// Ask the body to finish by injecting `GeneratorExit`.
    ///
    /// An unused generator is finished without running its body. Calling
    /// this on a finished generator does nothing.
    pub fn close(&self) -> GeneratorResult<()> {
        match self.status() {
            GeneratorStatus::Finished => Ok(()),
            GeneratorStatus::Unused => {
                let running = self.acquire()?;
                if self.status() != GeneratorStatus::Unused {
                    // Started by another driver in the meantime
                    drop(running);
                    return self.close();
                }
                let mut fiber = self.fiber.lock();
                self.finish(&mut fiber);
                Ok(())
            }
            GeneratorStatus::Running => match self.throw_into(ErrorPayload::generator_exit())? {
                Resumption::Yielded(_) => Err(GeneratorError::IgnoredGeneratorExit {
                    identity: self.identity.clone(),
                }),
                Resumption::Completed(_) | Resumption::Exhausted => Ok(()),
                Resumption::Raised(error)
                    if error.is(&ErrorKind::GeneratorExit)
                        || error.is(&ErrorKind::StopIteration) =>
                {
                    Ok(())
                }
                Resumption::Raised(error) => Err(GeneratorError::Raised(error)),
            },
        }
    }

    fn acquire(&self) -> GeneratorResult<RunningFlag<'_>> {
        RunningFlag::acquire(&self.running).ok_or_else(|| GeneratorError::AlreadyRunning {
            identity: self.identity.clone(),
        })
    }

    fn drive(&self, delivery: Delivery) -> GeneratorResult<Resumption> {
        let _running = self.acquire()?;

        let status = self.status();
        let delivery = match (status, delivery) {
            (GeneratorStatus::Finished, Delivery::Send(_)) => return Ok(Resumption::Exhausted),
            (GeneratorStatus::Finished, Delivery::Throw(error)) => {
                return Ok(Resumption::Raised(error))
            }
            (GeneratorStatus::Unused, Delivery::Send(value)) if !value.is_none() => {
                return Err(GeneratorError::NonNoneInitialSend)
            }
            (_, delivery) => delivery,
        };

        let mut fiber = self.fiber.lock();
        if status == GeneratorStatus::Unused {
            match self.start_fiber() {
                Ok(started) => *fiber = Some(started),
                Err(err) => {
                    warn!("generator '{}' failed to start: {}", self.identity, err);
                    self.finish(&mut fiber);
                    return Err(err.into());
                }
            }
            self.status.store(GeneratorStatus::Running);
        }

        match delivery {
            Delivery::Send(value) => self.cells.put_sent(value),
            Delivery::Throw(error) => self.cells.inject_error(error),
        }

        let state = ThreadState::current();
        self.cells.set_driver(state.clone());

        let transfer = match fiber.as_mut() {
            Some(active) => {
                trace!("resuming generator '{}'", self.identity);
                let _frame = state.enter(self.frame.clone());
                active.switch_in()
            }
            None => Err(FiberError::Exited),
        };

        match transfer {
            Ok(Transfer::Suspended) => {
                let value = self.cells.take_yielded().unwrap_or(Value::None);
                trace!("generator '{}' yielded {}", self.identity, value);
                Ok(Resumption::Yielded(value))
            }
            Ok(Transfer::Exited) => {
                let outcome = self.cells.take_returned().unwrap_or(Ok(Value::None));
                self.finish(&mut fiber);
                match outcome {
                    Ok(value) => Ok(Resumption::Completed(value)),
                    Err(mut error) => {
                        error.push_frame(self.frame.snapshot());
                        Ok(Resumption::Raised(error))
                    }
                }
            }
            Err(FiberError::Panicked(message)) => {
                self.finish(&mut fiber);
                let mut error = ErrorPayload::runtime_error(format!(
                    "generator '{}' panicked: {}",
                    self.identity, message
                ));
                error.push_frame(self.frame.snapshot());
                Ok(Resumption::Raised(error))
            }
            Err(err) => {
                self.finish(&mut fiber);
                Err(err.into())
            }
        }
    }

    fn start_fiber(&self) -> Result<Fiber, FiberError> {
        let body = self.body.lock().take().ok_or(FiberError::Exited)?;
        let cells = self.cells.clone();
        let frame = self.frame.clone();
        let resource = self.resource.clone();
        let identity = self.identity.clone();

        debug!("starting generator '{}'", self.identity);
        Fiber::spawn(&self.config, &self.identity, move |suspender: &Suspender| {
            let mut yielder = Yielder::new(suspender, cells.clone(), frame, resource, identity);
            yielder.adopt_driver_state();
            let result: BodyResult = match yielder.check_injected_error() {
                Ok(()) => {
                    cells.take_sent();
                    body(&mut yielder)
                }
                Err(error) => Err(error),
            };
            cells.put_returned(result);
        })
    }

    /// Move to `Finished` and release everything the body owned.
    fn finish(&self, fiber: &mut Option<Fiber>) {
        self.status.store(GeneratorStatus::Finished);
        if let Some(mut fiber) = fiber.take() {
            fiber.destroy();
        }
        drop(self.body.lock().take());
        self.cells.clear();
        self.release_resource();
        debug!("generator '{}' finished", self.identity);
    }

    fn release_resource(&self) {
        if let Err(failure) = self.resource.lock().release() {
            error!(
                "releasing resources of generator '{}' failed: {}",
                self.identity, failure
            );
        }
    }
}

impl Drop for GeneratorObject {
    fn drop(&mut self) {
        debug!("destroying generator '{}' ({})", self.identity, self.state());

        self.observers.clear(&self.identity);

        if self.status() == GeneratorStatus::Running {
            if let Err(err) = self.close() {
                warn!("closing generator '{}' on destroy: {}", self.identity, err);
            }
        }

        // A body that ignored GeneratorExit is still parked; unwind it, or
        // detach it if it yields yet again
        if let Some(mut fiber) = self.fiber.get_mut().take() {
            fiber.destroy();
        }
        self.status.store(GeneratorStatus::Finished);
        self.release_resource();
    }
}

impl HostObject for GeneratorObject {
    fn type_name(&self) -> &str {
        GENERATOR_TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn repr(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GeneratorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<compiled generator object {} at {:p}>",
            self.code.qualified_name(),
            self as *const Self
        )
    }
}

impl fmt::Debug for GeneratorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorObject")
            .field("identity", &self.identity)
            .field("status", &self.status())
            .field("running", &self.is_running())
            .field("line", &self.frame.line())
            .finish()
    }
}

/// Shared handle to a compiled generator.
///
/// Cloning the handle shares the generator; the generator is destroyed
/// when the last handle is dropped. Driver operations are reached through
/// `Deref` to [`GeneratorObject`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use core_types::Value;
/// use generator::{Generator, NativeResource, Resumption};
/// use host_runtime::CodeMetadata;
///
/// let code = Arc::new(CodeMetadata::generator("count", "count.py", 1));
/// let gen = Generator::new(
///     |y| {
///         y.yield_value(Value::from(1))?;
///         y.yield_value(Value::from(2))?;
///         Ok(Value::from(3))
///     },
///     "count",
///     code,
///     NativeResource::empty(),
/// );
///
/// assert_eq!(gen.resume(Value::None).unwrap(), Resumption::Yielded(Value::from(1)));
/// assert_eq!(gen.resume(Value::None).unwrap(), Resumption::Yielded(Value::from(2)));
/// assert_eq!(gen.resume(Value::None).unwrap(), Resumption::Completed(Value::from(3)));
/// assert_eq!(gen.resume(Value::None).unwrap(), Resumption::Exhausted);
/// ```
#[derive(Clone)]
pub struct Generator(Arc<GeneratorObject>);

impl Generator {
    /// Create an unused generator with the default fiber configuration.
    ///
    /// Nothing runs until the first resume.
    pub fn new<F>(body: F, identity: &str, code: Arc<CodeMetadata>, resource: NativeResource) -> Self
    where
        F: FnOnce(&mut Yielder<'_>) -> BodyResult + Send + 'static,
    {
        Self::with_config(FiberConfig::default(), body, identity, code, resource)
    }

    /// Create an unused generator whose fiber uses `config`.
    pub fn with_config<F>(
        config: FiberConfig,
        body: F,
        identity: &str,
        code: Arc<CodeMetadata>,
        resource: NativeResource,
    ) -> Self
    where
        F: FnOnce(&mut Yielder<'_>) -> BodyResult + Send + 'static,
    {
        let identity: Arc<str> = Arc::from(identity);
        let frame = Arc::new(Frame::new(code.clone()));
        debug!("created generator '{}' for {}", identity, code);

        Generator(Arc::new(GeneratorObject {
            identity,
            code,
            frame,
            config,
            status: AtomicCell::new(GeneratorStatus::Unused),
            running: AtomicBool::new(false),
            body: Mutex::new(Some(Box::new(body))),
            fiber: Mutex::new(None),
            cells: Rendezvous::new(),
            resource: Arc::new(Mutex::new(resource)),
            observers: WeakRegistry::default(),
        }))
    }

    pub(crate) fn from_object(object: Arc<GeneratorObject>) -> Self {
        Generator(object)
    }

    /// Wrap the generator as a host value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Recover a generator handle from a host value.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        if object.type_name() != GENERATOR_TYPE_NAME {
            return None;
        }
        object
            .clone()
            .into_any()
            .downcast::<GeneratorObject>()
            .ok()
            .map(Generator)
    }

    /// Take a weak reference.
    pub fn downgrade(&self) -> WeakGenerator {
        let expired = self.0.observers.register(None);
        WeakGenerator::new(Arc::downgrade(&self.0), expired, self.0.identity.clone())
    }

    /// Take a weak reference whose callback runs when the generator is
    /// destroyed, before its native resource is released.
    pub fn downgrade_with_callback<F>(&self, callback: F) -> WeakGenerator
    where
        F: FnOnce(&str) + Send + 'static,
    {
        let expired = self.0.observers.register(Some(Box::new(callback)));
        WeakGenerator::new(Arc::downgrade(&self.0), expired, self.0.identity.clone())
    }

    /// Number of strong handles.
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// True if both handles share one generator.
    pub fn ptr_eq(&self, other: &Generator) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Iterate the yielded values, resuming with `None` each step.
    pub fn iter(&self) -> GeneratorIter {
        GeneratorIter::new(self.clone())
    }
}

impl std::ops::Deref for Generator {
    type Target = GeneratorObject;

    fn deref(&self) -> &GeneratorObject {
        &self.0
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl From<Generator> for Value {
    fn from(generator: Generator) -> Self {
        generator.into_value()
    }
}

/// True if `value` is a compiled generator.
pub fn is_generator(value: &Value) -> bool {
    value
        .as_object()
        .map(|object| object.as_any().is::<GeneratorObject>())
        .unwrap_or(false)
}

/// Identity of the generator in `value`, if it is one.
pub fn get_identity(value: &Value) -> Option<Arc<str>> {
    value
        .as_object()?
        .as_any()
        .downcast_ref::<GeneratorObject>()
        .map(|object| object.identity.clone())
}
