//! Host runtime services used by compiled generators.
//!
//! This crate provides the pieces of the surrounding object runtime that a
//! generator has to cooperate with:
//! - [`CodeMetadata`] - immutable description of a compiled body
//! - [`Frame`] - the frame a generator pushes while its body runs
//! - [`ThreadState`] - the per-thread current-frame stack used for diagnostics
//!
//! # Example
//!
//! ```
//! use host_runtime::{CodeMetadata, Frame, ThreadState};
//! use std::sync::Arc;
//!
//! let frame = Arc::new(Frame::new(Arc::new(CodeMetadata::generator("gen", "app.py", 1))));
//! let state = ThreadState::current();
//!
//! {
//!     let _guard = state.enter(frame.clone());
//!     assert!(frame.is_executing());
//!     assert_eq!(state.capture_trace()[0].function_name.as_deref(), Some("gen"));
//! }
//! assert!(!frame.is_executing());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod code;
pub mod frame;
pub mod thread_state;

// Re-export main types at crate root
pub use code::{CodeFlags, CodeMetadata};
pub use frame::Frame;
pub use thread_state::{FrameGuard, ThreadState};
