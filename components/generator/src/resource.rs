//! Native resources owned by a generator.
//!
//! The compiled body keeps its locals and temporaries in a heap context it
//! does not own; the generator holds that context together with the callback
//! that frees it. Release happens exactly once, whichever of termination,
//! `close()` or destruction gets there first.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use core_types::ErrorPayload;
use fibers::panic_message;
use log::error;

use crate::error::CleanupFailure;

type Handle = Box<dyn Any + Send>;
type ReleaseFn = Box<dyn FnOnce(Handle) -> Result<(), ErrorPayload> + Send>;

/// An opaque native handle paired with its release callback.
///
/// # Examples
///
/// ```
/// use generator::NativeResource;
///
/// let mut resource = NativeResource::new(vec![1u8, 2, 3], |buffer| {
///     assert_eq!(buffer.len(), 3);
///     Ok(())
/// });
///
/// assert_eq!(resource.with_handle(|buffer: &mut Vec<u8>| buffer.len()), Some(3));
/// resource.release().unwrap();
/// assert!(resource.is_released());
/// ```
pub struct NativeResource {
    handle: Option<Handle>,
    release: Option<ReleaseFn>,
    type_name: &'static str,
}

impl NativeResource {
    /// Pair `handle` with the callback that frees it.
    pub fn new<T, F>(handle: T, release: F) -> Self
    where
        T: Any + Send,
        F: FnOnce(T) -> Result<(), ErrorPayload> + Send + 'static,
    {
        let release: ReleaseFn = Box::new(move |boxed: Handle| match boxed.downcast::<T>() {
            Ok(handle) => release(*handle),
            Err(_) => Err(ErrorPayload::type_error("native handle changed type")),
        });
        Self {
            handle: Some(Box::new(handle)),
            release: Some(release),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// A resource with nothing to release.
    pub fn empty() -> Self {
        Self {
            handle: None,
            release: None,
            type_name: "()",
        }
    }

    /// True once the release callback has run, or if there never was one.
    pub fn is_released(&self) -> bool {
        self.release.is_none()
    }

    /// Borrow the handle as `T`.
    ///
    /// Returns `None` after release or if the handle is not a `T`.
    pub fn with_handle<T, R>(&mut self, f: impl FnOnce(&mut T) -> R) -> Option<R>
    where
        T: Any,
    {
        self.handle
            .as_mut()
            .and_then(|handle| handle.downcast_mut::<T>())
            .map(f)
    }

    /// Run the release callback if it has not run yet.
    ///
    /// Errors and panics from the callback are caught and returned; later
    /// calls do nothing.
    pub fn release(&mut self) -> Result<(), CleanupFailure> {
        let Some(release) = self.release.take() else {
            return Ok(());
        };
        let handle: Handle = self.handle.take().unwrap_or_else(|| Box::new(()));

        match panic::catch_unwind(AssertUnwindSafe(move || release(handle))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(payload)) => Err(CleanupFailure::Raised(payload)),
            Err(panic) => Err(CleanupFailure::Panicked(panic_message(panic.as_ref()))),
        }
    }
}

impl Default for NativeResource {
    fn default() -> Self {
        Self::empty()
    }
}

impl Drop for NativeResource {
    fn drop(&mut self) {
        if let Err(failure) = self.release() {
            error!("releasing native resource '{}' failed: {}", self.type_name, failure);
        }
    }
}

impl fmt::Debug for NativeResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeResource")
            .field("type", &self.type_name)
            .field("released", &self.is_released())
            .finish()
    }
}
