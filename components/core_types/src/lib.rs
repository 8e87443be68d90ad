//! Core host value types and error payloads.
//!
//! This crate provides the foundational types shared by the fiber, host
//! runtime and generator components: the value model, the opaque error
//! payload that travels across suspension points, and trace records.
//!
//! # Overview
//!
//! - [`Value`] - Reference-counted, thread-safe host values
//! - [`HostObject`] - Trait for opaque objects carried in a [`Value`]
//! - [`ErrorPayload`] - A raised error: kind, value and trace
//! - [`ErrorKind`] - Kinds the generator protocol needs to tell apart
//! - [`StackFrame`] - One entry of an error trace
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, ErrorPayload, Value};
//!
//! let value = Value::from(42);
//! assert!(value.is_truthy());
//! assert_eq!(value.type_name(), "int");
//!
//! let error = ErrorPayload::new(ErrorKind::custom("KeyError"), Value::from("k"));
//! assert_eq!(error.kind.name(), "KeyError");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod source;
mod value;

pub use error::{ErrorKind, ErrorPayload};
pub use source::StackFrame;
pub use value::{HostObject, ObjectRef, Value};
