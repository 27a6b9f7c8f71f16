//! Dynamic Value
//!
//! The tagged union every request and response is expressed in before it is
//! framed onto a plugin session. Extraction is always checked: asking for the
//! wrong variant yields [`Error::TypeMismatch`], and the only conversion
//! between variants is range-checked integer narrowing.

mod wire;

use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::fmt;

/// Key/value mapping carried by [`Value::Object`].
///
/// Equality ignores insertion order.
pub type Object = IndexMap<String, Value>;

// =============================================================================
// Integer
// =============================================================================

/// Integer payload spanning `i64::MIN ..= u64::MAX`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Integer(i128);

impl Integer {
    /// Smallest representable value
    pub const MIN: i128 = i64::MIN as i128;
    /// Largest representable value
    pub const MAX: i128 = u64::MAX as i128;

    /// Build from a wide integer; `None` if outside the value space
    pub fn new(value: i128) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    /// Raw value
    pub fn get(self) -> i128 {
        self.0
    }
}

macro_rules! integer_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Integer {
                fn from(v: $ty) -> Self {
                    Integer(v as i128)
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Integer(Integer::from(v))
                }
            }
        )*
    };
}

integer_from!(i8, i16, i32, i64, u8, u16, u32, u64);

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Value
// =============================================================================

/// Variant tag of a [`Value`], used in mismatch reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    String,
    Array,
    Object,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Null => write!(f, "null"),
            ValueKind::Boolean => write!(f, "boolean"),
            ValueKind::Integer => write!(f, "integer"),
            ValueKind::String => write!(f, "string"),
            ValueKind::Array => write!(f, "array"),
            ValueKind::Object => write!(f, "object"),
        }
    }
}

/// Universal wire payload
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(Integer),
    String(String),
    Array(Vec<Value>),
    Object(Object),
}

macro_rules! integer_accessors {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Extract as `", stringify!($ty), "`, failing if the value is not an integer or does not fit.")]
            pub fn $name(&self) -> Result<$ty> {
                let n = self.as_integer()?;
                <$ty>::try_from(n.get()).map_err(|_| Error::TypeMismatch {
                    expected: stringify!($ty).to_string(),
                    found: format!("integer {}", n),
                })
            }
        )*
    };
}

impl Value {
    /// Build an object from key/value pairs
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Variant tag
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn mismatch(&self, expected: ValueKind) -> Error {
        Error::TypeMismatch {
            expected: expected.to_string(),
            found: self.kind().to_string(),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            other => Err(other.mismatch(ValueKind::Boolean)),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(other.mismatch(ValueKind::String)),
        }
    }

    pub fn as_integer(&self) -> Result<Integer> {
        match self {
            Value::Integer(n) => Ok(*n),
            other => Err(other.mismatch(ValueKind::Integer)),
        }
    }

    integer_accessors! {
        as_i8 => i8,
        as_i16 => i16,
        as_i32 => i32,
        as_i64 => i64,
        as_u8 => u8,
        as_u16 => u16,
        as_u32 => u32,
        as_u64 => u64,
    }

    pub fn as_array(&self) -> Result<&[Value]> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(other.mismatch(ValueKind::Array)),
        }
    }

    pub fn as_object(&self) -> Result<&Object> {
        match self {
            Value::Object(map) => Ok(map),
            other => Err(other.mismatch(ValueKind::Object)),
        }
    }

    pub fn into_string(self) -> Result<String> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(other.mismatch(ValueKind::String)),
        }
    }

    pub fn into_array(self) -> Result<Vec<Value>> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(other.mismatch(ValueKind::Array)),
        }
    }

    pub fn into_object(self) -> Result<Object> {
        match self {
            Value::Object(map) => Ok(map),
            other => Err(other.mismatch(ValueKind::Object)),
        }
    }

    /// Look up a key; fails if this is not an object, `None` if the key is absent
    pub fn get(&self, key: &str) -> Result<Option<&Value>> {
        Ok(self.as_object()?.get(key))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::String(v.clone())
    }
}

impl From<Integer> for Value {
    fn from(v: Integer) -> Self {
        Value::Integer(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Value::Object(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "<{}>", self.kind()),
        }
    }
}
