//! Driver-facing generator errors.

use core_types::{ErrorKind, ErrorPayload};
use fibers::FiberError;
use std::sync::Arc;

/// Errors a driver gets back instead of a [`crate::Resumption`].
///
/// Errors raised by the body itself are not listed here: they arrive as
/// `Resumption::Raised`, except during `close()` where a foreign error is
/// reported through [`GeneratorError::Raised`].
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Resume attempted while the body holds control. State is unchanged.
    #[error("generator '{identity}' already executing")]
    AlreadyRunning {
        /// Identity of the generator
        identity: Arc<str>,
    },

    /// A non-`None` value was sent into a generator that has not started.
    #[error("can't send non-None value to a just-started generator")]
    NonNoneInitialSend,

    /// `close()` injected `GeneratorExit` and the body yielded again.
    #[error("generator '{identity}' ignored GeneratorExit")]
    IgnoredGeneratorExit {
        /// Identity of the generator
        identity: Arc<str>,
    },

    /// `close()` injected `GeneratorExit` and the body raised something else.
    #[error("generator raised during close: {0}")]
    Raised(ErrorPayload),

    /// The fiber backing the body could not be created or vanished.
    #[error(transparent)]
    Fiber(#[from] FiberError),
}

/// Result type for driver operations
pub type GeneratorResult<T> = Result<T, GeneratorError>;

impl From<GeneratorError> for ErrorPayload {
    /// The error the host language raises for each driver failure.
    fn from(err: GeneratorError) -> Self {
        match err {
            GeneratorError::AlreadyRunning { .. } => {
                ErrorPayload::with_message(ErrorKind::ValueError, "generator already executing")
            }
            GeneratorError::NonNoneInitialSend => ErrorPayload::type_error(err.to_string()),
            GeneratorError::IgnoredGeneratorExit { .. } => {
                ErrorPayload::runtime_error("generator ignored GeneratorExit")
            }
            GeneratorError::Raised(payload) => payload,
            GeneratorError::Fiber(fiber) => ErrorPayload::runtime_error(fiber.to_string()),
        }
    }
}

/// Failure of a native resource's release callback.
///
/// Always contained: callers log it, nothing propagates it further.
#[derive(Debug, thiserror::Error)]
pub enum CleanupFailure {
    /// The release callback returned an error
    #[error("release callback raised {0}")]
    Raised(ErrorPayload),

    /// The release callback panicked
    #[error("release callback panicked: {0}")]
    Panicked(String),
}
