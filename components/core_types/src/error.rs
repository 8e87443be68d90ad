//! Error payloads raised inside and around generator bodies.
//!
//! The host does not model an exception class hierarchy here. An error is an
//! opaque kind/value/trace triple that can be stored in a rendezvous cell,
//! moved across a fiber switch, and raised on the other side.

use std::fmt;
use std::sync::Arc;

use crate::{StackFrame, Value};

/// The kind of a raised error.
///
/// Only the kinds the generator protocol itself produces or inspects are
/// named; everything else is [`ErrorKind::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Injected by `close()` to ask a suspended body to unwind
    GeneratorExit,
    /// Signals exhaustion of an iterator
    StopIteration,
    /// Protocol violation detected at runtime
    RuntimeError,
    /// Operation applied to an unsuitable value
    TypeError,
    /// Argument with the right type but an unsuitable value
    ValueError,
    /// Any other kind, identified by name
    Custom(Arc<str>),
}

impl ErrorKind {
    /// Creates a custom kind with the given name.
    pub fn custom(name: &str) -> Self {
        ErrorKind::Custom(Arc::from(name))
    }

    /// Name of the kind as the host language prints it.
    pub fn name(&self) -> &str {
        match self {
            ErrorKind::GeneratorExit => "GeneratorExit",
            ErrorKind::StopIteration => "StopIteration",
            ErrorKind::RuntimeError => "RuntimeError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ValueError => "ValueError",
            ErrorKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A raised error in transit.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, ErrorPayload, Value};
///
/// let error = ErrorPayload::new(ErrorKind::ValueError, Value::from("bad input"));
///
/// assert!(error.is(&ErrorKind::ValueError));
/// assert_eq!(error.to_string(), "ValueError: 'bad input'");
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {value}")]
pub struct ErrorPayload {
    /// The kind of error
    pub kind: ErrorKind,
    /// The value carried with the error
    pub value: Value,
    /// Frames the error has crossed, innermost first
    pub trace: Vec<StackFrame>,
}

impl ErrorPayload {
    /// Creates a payload with an empty trace.
    pub fn new(kind: ErrorKind, value: Value) -> Self {
        Self {
            kind,
            value,
            trace: Vec::new(),
        }
    }

    /// Creates a payload whose value is a message string.
    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, Value::from(message.into()))
    }

    /// The cancellation error injected by `close()`.
    pub fn generator_exit() -> Self {
        Self::new(ErrorKind::GeneratorExit, Value::None)
    }

    /// A `RuntimeError` with the given message.
    pub fn runtime_error(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::RuntimeError, message)
    }

    /// A `TypeError` with the given message.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::TypeError, message)
    }

    /// Returns true if this payload is of the given kind.
    pub fn is(&self, kind: &ErrorKind) -> bool {
        &self.kind == kind
    }

    /// Records that the error crossed `frame` on its way out.
    pub fn push_frame(&mut self, frame: StackFrame) {
        self.trace.push(frame);
    }

    /// Renders the trace outermost first, followed by the error line.
    pub fn format_trace(&self) -> String {
        let mut out = String::from("Traceback (most recent call last):\n");
        for frame in self.trace.iter().rev() {
            out.push_str(&frame.to_string());
            out.push('\n');
        }
        out.push_str(&self.to_string());
        out
    }
}
