//! Generator status and resumption outcomes.

use core_types::{ErrorPayload, Value};
use std::fmt;

/// Lifecycle status of a generator.
///
/// Moves forward only: `Unused` → `Running` → `Finished`. `Running` covers
/// both "body executing" and "suspended at a yield"; the running flag tells
/// the two apart.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeneratorStatus {
    /// Created, body fiber not started
    #[default]
    Unused = 0,
    /// Body fiber started and not yet terminated
    Running = 1,
    /// Body returned, raised, or the generator was closed
    Finished = 2,
}

impl GeneratorStatus {
    /// Returns true once no more values can come.
    #[inline]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Returns true if a resume can still reach the body.
    #[inline]
    pub const fn is_resumable(self) -> bool {
        matches!(self, Self::Unused | Self::Running)
    }
}

impl fmt::Display for GeneratorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unused => "unused",
            Self::Running => "running",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Externally observable generator state, as `inspect` reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorState {
    /// Not yet started
    Created,
    /// Body currently holds control
    Executing,
    /// Parked at a yield
    Suspended,
    /// Finished
    Closed,
}

impl GeneratorState {
    /// Host-language name for this state.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Created => "GEN_CREATED",
            Self::Executing => "GEN_RUNNING",
            Self::Suspended => "GEN_SUSPENDED",
            Self::Closed => "GEN_CLOSED",
        }
    }
}

impl fmt::Display for GeneratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a resume or throw-into.
#[derive(Debug, Clone, PartialEq)]
pub enum Resumption {
    /// The body yielded a value and is suspended
    Yielded(Value),
    /// The body returned; the generator is finished
    Completed(Value),
    /// An error escaped the body; the generator is finished
    Raised(ErrorPayload),
    /// The generator was already finished; the body was not entered
    Exhausted,
}

impl Resumption {
    /// Returns true for every outcome except `Yielded`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Resumption::Yielded(_))
    }

    /// The yielded value, if the body yielded.
    pub fn yielded(self) -> Option<Value> {
        match self {
            Resumption::Yielded(value) => Some(value),
            _ => None,
        }
    }
}
