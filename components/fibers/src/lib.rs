//! Stackful fibers for resumable execution.
//!
//! This crate provides the execution-context pair a generator runs on:
//! a driver context (whatever thread calls [`Fiber::switch_in`]) and a body
//! context with its own stack. Exactly one of the two runs at any instant.
//!
//! - [`Fiber::spawn`] - create a body context around an entry function
//! - [`Fiber::switch_in`] / [`Suspender::switch_out`] - swap control
//! - [`Fiber::destroy`] - tear the body context down (also on drop)
//!
//! # Example
//!
//! ```
//! use fibers::{Fiber, FiberConfig, Transfer};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let steps = Arc::new(AtomicUsize::new(0));
//! let seen = steps.clone();
//!
//! let mut fiber = Fiber::spawn(&FiberConfig::default(), "counter", move |suspender| {
//!     for _ in 0..2 {
//!         seen.fetch_add(1, Ordering::SeqCst);
//!         if suspender.switch_out().is_err() {
//!             return;
//!         }
//!     }
//! })
//! .unwrap();
//!
//! assert_eq!(fiber.switch_in().unwrap(), Transfer::Suspended);
//! assert_eq!(steps.load(Ordering::SeqCst), 1);
//! assert_eq!(fiber.switch_in().unwrap(), Transfer::Suspended);
//! assert_eq!(fiber.switch_in().unwrap(), Transfer::Exited);
//! assert_eq!(steps.load(Ordering::SeqCst), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod config;
mod error;
mod fiber;

pub use config::{FiberConfig, DEFAULT_NAME_PREFIX, DEFAULT_STACK_SIZE};
pub use error::{FiberError, FiberResult, Unwinding};
pub use fiber::{panic_message, Fiber, FiberState, Suspender, Transfer};
