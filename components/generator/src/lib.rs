//! Compiled generator objects.
//!
//! A compiled generator is a resumable computation whose body runs on its
//! own fiber. The driver side resumes it, throws errors into it, closes it
//! and observes it; the body side suspends with [`Yielder::yield_value`]
//! and checks for injected errors after every suspension.
//!
//! # Lifecycle
//!
//! ```text
//!   Unused --resume--> Running --return/raise/close--> Finished
//!      \________________close___________________________/
//! ```
//!
//! Leaving `Running` for `Finished` releases the generator's
//! [`NativeResource`] right away. Destroying a generator expires its weak
//! references first, then closes a suspended body, then releases the
//! resource if that has not happened yet.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use core_types::{ErrorKind, ErrorPayload, Value};
//! use generator::{Generator, NativeResource, Resumption};
//! use host_runtime::CodeMetadata;
//!
//! let code = Arc::new(CodeMetadata::generator("squares", "squares.py", 1));
//! let squares = Generator::new(
//!     |y| {
//!         for n in 1..=3_i64 {
//!             y.yield_value(Value::from(n * n))?;
//!         }
//!         Ok(Value::None)
//!     },
//!     "squares",
//!     code,
//!     NativeResource::empty(),
//! );
//!
//! let values: Vec<Value> = squares.iter().collect::<Result<_, _>>().unwrap();
//! assert_eq!(values, vec![Value::from(1), Value::from(4), Value::from(9)]);
//! assert_eq!(squares.resume(Value::None).unwrap(), Resumption::Exhausted);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod iter;
mod object;
mod rendezvous;
mod resource;
mod status;
mod weakref;
mod yielder;

pub use error::{CleanupFailure, GeneratorError, GeneratorResult};
pub use iter::GeneratorIter;
pub use object::{get_identity, is_generator, Generator, GeneratorObject, GENERATOR_TYPE_NAME};
pub use rendezvous::BodyResult;
pub use resource::NativeResource;
pub use status::{GeneratorState, GeneratorStatus, Resumption};
pub use weakref::{ExpiryCallback, WeakGenerator};
pub use yielder::{BodyEntry, Yielder};
