//! Weak references to generators.
//!
//! A generator keeps a registry of the weak references taken to it. On
//! destruction every registered reference is marked expired, and its
//! callback (if any) runs, before the native resource is released.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use log::{trace, warn};
use parking_lot::Mutex;

use crate::object::{Generator, GeneratorObject};

/// Callback run when a weakly referenced generator is destroyed.
///
/// Receives the identity of the generator that went away.
pub type ExpiryCallback = Box<dyn FnOnce(&str) + Send + 'static>;

struct Observer {
    expired: Arc<AtomicBool>,
    callback: Option<ExpiryCallback>,
}

/// Registry of observers held by every generator.
#[derive(Default)]
pub(crate) struct WeakRegistry {
    observers: Mutex<Vec<Observer>>,
}

impl WeakRegistry {
    /// Register an observer and return its expiry flag.
    pub(crate) fn register(&self, callback: Option<ExpiryCallback>) -> Arc<AtomicBool> {
        let expired = Arc::new(AtomicBool::new(false));
        let mut observers = self.observers.lock();
        // Callback-less observers whose reference was dropped need no notice
        observers.retain(|o| o.callback.is_some() || Arc::strong_count(&o.expired) > 1);
        observers.push(Observer {
            expired: expired.clone(),
            callback,
        });
        expired
    }

    /// Number of observers still registered.
    pub(crate) fn len(&self) -> usize {
        self.observers.lock().len()
    }

    /// Expire every observer and run its callback.
    pub(crate) fn clear(&self, identity: &str) {
        let observers = std::mem::take(&mut *self.observers.lock());
        if !observers.is_empty() {
            trace!("expiring {} weak reference(s) to '{}'", observers.len(), identity);
        }
        for observer in observers {
            observer.expired.store(true, Ordering::Release);
            if let Some(callback) = observer.callback {
                if panic::catch_unwind(AssertUnwindSafe(|| callback(identity))).is_err() {
                    warn!("weak reference callback for '{}' panicked", identity);
                }
            }
        }
    }
}

/// A reference to a generator that does not keep it alive.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use core_types::Value;
/// use generator::{Generator, NativeResource};
/// use host_runtime::CodeMetadata;
///
/// let code = Arc::new(CodeMetadata::generator("g", "g.py", 1));
/// let gen = Generator::new(|_| Ok(Value::None), "g", code, NativeResource::empty());
///
/// let weak = gen.downgrade();
/// assert!(weak.upgrade().is_some());
///
/// drop(gen);
/// assert!(weak.is_expired());
/// assert!(weak.upgrade().is_none());
/// ```
#[derive(Clone)]
pub struct WeakGenerator {
    target: Weak<GeneratorObject>,
    expired: Arc<AtomicBool>,
    identity: Arc<str>,
}

impl WeakGenerator {
    pub(crate) fn new(
        target: Weak<GeneratorObject>,
        expired: Arc<AtomicBool>,
        identity: Arc<str>,
    ) -> Self {
        Self {
            target,
            expired,
            identity,
        }
    }

    /// A strong handle, if the generator is still alive.
    pub fn upgrade(&self) -> Option<Generator> {
        if self.expired.load(Ordering::Acquire) {
            return None;
        }
        self.target.upgrade().map(Generator::from_object)
    }

    /// True once the generator has been destroyed or is being destroyed.
    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::Acquire) || self.target.strong_count() == 0
    }

    /// Identity of the referenced generator; survives its destruction.
    pub fn identity(&self) -> &str {
        &self.identity
    }
}

impl fmt::Debug for WeakGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakGenerator")
            .field("identity", &self.identity)
            .field("expired", &self.is_expired())
            .finish()
    }
}
