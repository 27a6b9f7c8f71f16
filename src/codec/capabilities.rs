//! Capability set codec
//!
//! The slot table travels as a lowercase hex string, two digits per slot.

use super::{record_object, Fields, Record};
use crate::domain::{RecordKind, StorageCapabilities};
use crate::error::{Error, Result};
use crate::value::Value;
use std::fmt::Write;

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

fn from_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 || !text.is_ascii() {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&text[i..i + 2], 16).ok())
        .collect()
}

impl Record for StorageCapabilities {
    const CLASS: &'static str = "Capabilities";
    const KIND: RecordKind = RecordKind::Capabilities;

    fn encode(&self) -> Value {
        record_object(Self::CLASS, [("cap", Value::from(to_hex(self.as_bytes())))])
    }

    fn decode(value: &Value) -> Result<Self> {
        let f = Fields::open(value, Self::CLASS)?;
        let violation = |reason: String| Error::SchemaViolation {
            record: Self::CLASS,
            reason,
        };
        let text = f.string("cap")?;
        let bytes = from_hex(&text).ok_or_else(|| violation("cap is not a hex string".into()))?;
        Ok(StorageCapabilities::from_bytes(bytes))
    }
}
