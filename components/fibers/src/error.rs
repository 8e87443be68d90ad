//! Fiber error types.

/// Errors raised by the driver side of a fiber.
#[derive(Debug, thiserror::Error)]
pub enum FiberError {
    /// The OS refused to create the backing thread
    #[error("failed to spawn fiber thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The fiber entry panicked; the message is the panic payload if printable
    #[error("fiber body panicked: {0}")]
    Panicked(String),

    /// The body side vanished without reporting an exit
    #[error("fiber disconnected")]
    Disconnected,

    /// Control was transferred into a fiber whose entry already returned
    #[error("fiber has already exited")]
    Exited,
}

/// Result type for driver-side fiber operations
pub type FiberResult<T> = Result<T, FiberError>;

/// Returned by [`crate::Suspender::switch_out`] when the fiber is being
/// destroyed instead of resumed.
///
/// Once observed, every later `switch_out` returns it again immediately, so a
/// body can only unwind from this point on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("fiber is unwinding")]
pub struct Unwinding;
