//! `Iterator` adapter over a generator.

use std::iter::FusedIterator;

use core_types::{ErrorPayload, Value};

use crate::object::Generator;
use crate::status::Resumption;

/// Drives a generator with `None` until it stops.
///
/// Yields `Ok(value)` for every yielded value and `Err(error)` once if the
/// body raises; a return value ends the iteration. Driver errors such as a
/// reentrant resume come out as the error the host language would raise.
#[derive(Debug, Clone)]
pub struct GeneratorIter {
    generator: Generator,
    done: bool,
}

impl GeneratorIter {
    pub(crate) fn new(generator: Generator) -> Self {
        Self {
            generator,
            done: false,
        }
    }

    /// The generator being iterated.
    pub fn generator(&self) -> &Generator {
        &self.generator
    }
}

impl Iterator for GeneratorIter {
    type Item = Result<Value, ErrorPayload>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = match self.generator.resume(Value::None) {
            Ok(Resumption::Yielded(value)) => return Some(Ok(value)),
            Ok(Resumption::Completed(_)) | Ok(Resumption::Exhausted) => None,
            Ok(Resumption::Raised(error)) => Some(Err(error)),
            Err(err) => Some(Err(err.into())),
        };
        self.done = true;
        item
    }
}

impl FusedIterator for GeneratorIter {}

impl IntoIterator for &Generator {
    type Item = Result<Value, ErrorPayload>;
    type IntoIter = GeneratorIter;

    fn into_iter(self) -> GeneratorIter {
        self.iter()
    }
}
