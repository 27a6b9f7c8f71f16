//! Entity Codec
//!
//! Bidirectional mapping between [`Value`] objects and domain records. Every
//! record object carries a `"class"` key naming its record type plus a fixed
//! set of fields. Decoding is strict: a missing field, a field of the wrong
//! variant or a foreign class name is a [`Error::SchemaViolation`].
//!
//! The codec is pure. It never performs I/O and never fails for any other
//! reason.

mod block;
mod capabilities;
mod file;

use crate::domain::RecordKind;
use crate::error::{Error, Result};
use crate::value::{Object, Value};

/// Key naming the record type inside every encoded object
pub const CLASS_KEY: &str = "class";

/// A domain record with a fixed wire shape
pub trait Record: Sized {
    /// Value of the `"class"` key
    const CLASS: &'static str;
    /// Record kind reported in validation errors
    const KIND: RecordKind;

    /// Encode into an `Object` value
    fn encode(&self) -> Value;

    /// Decode from a value produced by [`Record::encode`] or by a plugin
    fn decode(value: &Value) -> Result<Self>;
}

// =============================================================================
// Lists And Optional Records
// =============================================================================

/// Encode a slice of records as an `Array` of objects
pub fn encode_list<R: Record>(records: &[R]) -> Value {
    Value::Array(records.iter().map(Record::encode).collect())
}

/// Decode an `Array` of objects. `Null` decodes to an empty list.
pub fn decode_list<R: Record>(value: &Value) -> Result<Vec<R>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items.iter().map(R::decode).collect(),
        other => Err(Error::SchemaViolation {
            record: R::CLASS,
            reason: format!("expected array of records, found {}", other.kind()),
        }),
    }
}

/// Encode an optional record; `None` becomes `Null`
pub fn encode_optional<R: Record>(record: Option<&R>) -> Value {
    record.map_or(Value::Null, Record::encode)
}

/// Decode an optional record; `Null` becomes `None`
pub fn decode_optional<R: Record>(value: &Value) -> Result<Option<R>> {
    match value {
        Value::Null => Ok(None),
        other => R::decode(other).map(Some),
    }
}

/// Encode a string list. An absent list is `Null`.
pub fn encode_string_list(list: Option<&[String]>) -> Value {
    match list {
        Some(items) => Value::Array(items.iter().map(Value::from).collect()),
        None => Value::Null,
    }
}

/// Decode a string list. `Null` decodes to an empty list.
pub fn decode_string_list(value: &Value) -> Result<Vec<String>> {
    let violation = |reason: String| Error::SchemaViolation {
        record: "StringList",
        reason,
    };
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .map_err(|e| violation(e.to_string()))
            })
            .collect(),
        other => Err(violation(format!("expected array, found {}", other.kind()))),
    }
}

// =============================================================================
// Field Reader
// =============================================================================

/// Checked view over the fields of a record object
pub(crate) struct Fields<'a> {
    record: &'static str,
    map: &'a Object,
}

impl<'a> Fields<'a> {
    /// Open `value` as an object whose class key equals `class`
    pub(crate) fn open(value: &'a Value, class: &'static str) -> Result<Self> {
        let map = value.as_object().map_err(|_| Error::SchemaViolation {
            record: class,
            reason: format!("expected object, found {}", value.kind()),
        })?;
        let fields = Self { record: class, map };
        let found = fields.string(CLASS_KEY)?;
        if found != class {
            return Err(fields.violation(format!("class is {found:?}")));
        }
        Ok(fields)
    }

    fn violation(&self, reason: String) -> Error {
        Error::SchemaViolation {
            record: self.record,
            reason,
        }
    }

    /// Map a variant error on `key` into a schema violation
    fn checked<T>(&self, key: &str, result: Result<T>) -> Result<T> {
        result.map_err(|e| self.violation(format!("field {key:?}: {e}")))
    }

    pub(crate) fn field(&self, key: &str) -> Result<&'a Value> {
        self.map
            .get(key)
            .ok_or_else(|| self.violation(format!("missing field {key:?}")))
    }

    pub(crate) fn string(&self, key: &str) -> Result<String> {
        let value = self.field(key)?;
        self.checked(key, value.as_str().map(str::to_string))
    }

    /// String field that may be `Null`
    pub(crate) fn opt_string(&self, key: &str) -> Result<Option<String>> {
        match self.field(key)? {
            Value::Null => Ok(None),
            other => self.checked(key, other.as_str().map(|s| Some(s.to_string()))),
        }
    }

    pub(crate) fn u64(&self, key: &str) -> Result<u64> {
        let value = self.field(key)?;
        self.checked(key, value.as_u64())
    }

    pub(crate) fn u32(&self, key: &str) -> Result<u32> {
        let value = self.field(key)?;
        self.checked(key, value.as_u32())
    }

    pub(crate) fn i32(&self, key: &str) -> Result<i32> {
        let value = self.field(key)?;
        self.checked(key, value.as_i32())
    }

    /// Integer field holding a wire code decoded through `convert`
    pub(crate) fn code<T>(&self, key: &str, convert: fn(i32) -> Option<T>) -> Result<T> {
        let raw = self.i32(key)?;
        convert(raw).ok_or_else(|| self.violation(format!("field {key:?}: unknown code {raw}")))
    }

    /// String-list field; `Null` reads as empty
    pub(crate) fn string_list(&self, key: &str) -> Result<Vec<String>> {
        let value = self.field(key)?;
        self.checked(key, decode_string_list(value))
    }
}

/// Start an encoded record object with its class key
pub(crate) fn record_object<const N: usize>(
    class: &'static str,
    fields: [(&str, Value); N],
) -> Value {
    let mut map = Object::with_capacity(N + 1);
    map.insert(CLASS_KEY.to_string(), Value::from(class));
    for (key, value) in fields {
        map.insert(key.to_string(), value);
    }
    Value::Object(map)
}
