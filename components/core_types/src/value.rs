//! Host value representation.
//!
//! This module provides the `Value` enum that travels between a generator
//! driver and its body. Every variant is `Send + Sync` so a value can cross
//! the fiber boundary, and shared payloads are reference counted so a clone
//! is only a count increment.

use num_bigint::BigInt;
use num_traits::Zero;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An opaque object owned by the host runtime.
///
/// Anything that is not a primitive (the compiled generator among them) is
/// carried inside [`Value::Object`] through this trait.
pub trait HostObject: Any + Send + Sync + fmt::Debug {
    /// Name of the object's type as the host language reports it.
    fn type_name(&self) -> &str;

    /// Borrow as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Convert a shared handle into a shared `Any` for owned downcasting.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Host-language `repr` of the object.
    fn repr(&self) -> String {
        format!("<{} object>", self.type_name())
    }
}

/// Shared, reference-counted handle to a host object.
pub type ObjectRef = Arc<dyn HostObject>;

/// Represents any host value.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// let none = Value::None;
/// let number = Value::from(42);
/// let text = Value::from("spam");
///
/// assert!(!none.is_truthy());
/// assert!(number.is_truthy());
/// assert_eq!(text.type_name(), "str");
/// ```
#[derive(Clone)]
pub enum Value {
    /// The host's `None`
    None,
    /// Boolean
    Bool(bool),
    /// Arbitrary precision integer
    Int(BigInt),
    /// IEEE 754 double-precision floating point
    Float(f64),
    /// Immutable string
    Str(Arc<str>),
    /// Immutable tuple
    Tuple(Arc<[Value]>),
    /// Opaque host object
    Object(ObjectRef),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Value::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::Tuple(items) => f.debug_tuple("Tuple").field(items).finish(),
            Value::Object(obj) => f.debug_tuple("Object").field(&obj.type_name()).finish(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            // Objects compare by identity
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// Build a tuple value from its items.
    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(items.into())
    }

    /// Returns whether this value is truthy.
    ///
    /// `None`, `False`, zero, the empty string and the empty tuple are
    /// falsy; everything else, including every object, is truthy.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// assert!(!Value::None.is_truthy());
    /// assert!(!Value::Bool(false).is_truthy());
    /// assert!(!Value::from(0).is_truthy());
    /// assert!(!Value::from("").is_truthy());
    ///
    /// assert!(Value::from(7).is_truthy());
    /// assert!(Value::from("x").is_truthy());
    /// ```
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => !n.is_zero(),
            Value::Float(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Returns true for `None`.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Returns the host-language type name of this value.
    pub fn type_name(&self) -> &str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Tuple(_) => "tuple",
            Value::Object(obj) => obj.type_name(),
        }
    }

    /// Borrow the object payload, if this is an object.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(BigInt::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(BigInt::from(n))
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

/// `repr`-style rendering.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// assert_eq!(Value::None.to_string(), "None");
/// assert_eq!(Value::Bool(true).to_string(), "True");
/// assert_eq!(Value::from(42).to_string(), "42");
/// assert_eq!(Value::from("a").to_string(), "'a'");
/// ```
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => {
                if n.is_nan() {
                    write!(f, "nan")
                } else if n.is_infinite() {
                    write!(f, "{}", if n.is_sign_positive() { "inf" } else { "-inf" })
                } else if n.fract() == 0.0 && n.abs() < 1e16 {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Str(s) => write!(f, "'{}'", s),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::Object(obj) => write!(f, "{}", obj.repr()),
        }
    }
}
