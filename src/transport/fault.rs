//! Fault translation
//!
//! Every failure seen while exchanging a request with a plugin is first
//! classified as a [`Failure`] and then converted into the public [`Error`]
//! in exactly one place.

use crate::error::Error;
use crate::value::Value;
use std::io;

/// Classified transport failure
#[derive(Debug)]
pub(crate) enum Failure {
    /// Response frame could not be decoded or violated the envelope
    Malformed(String),
    /// Plugin answered with a structured fault
    Fault {
        code: i32,
        message: String,
        data: Option<String>,
        domain: Option<i32>,
        level: Option<i32>,
    },
    /// Channel reached end of stream or was reset mid-call
    Closed(String),
    /// Connection timeout expired before the response arrived
    TimedOut { method: String, timeout_ms: u32 },
    /// Anything else
    Unexpected(String),
}

impl Failure {
    /// Short label used for metrics and logs
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Failure::Malformed(_) => "serialization",
            Failure::Fault { .. } => "plugin",
            Failure::Closed(_) => "communication",
            Failure::TimedOut { .. } => "timeout",
            Failure::Unexpected(_) => "internal",
        }
    }

    /// Parse the `error` member of a response envelope
    pub(crate) fn from_fault_object(fault: &Value) -> Failure {
        let parsed = (|| -> crate::error::Result<Failure> {
            let code = fault
                .get("code")?
                .ok_or_else(|| Error::Serialization("fault has no code".into()))?
                .as_i32()?;
            let message = fault
                .get("message")?
                .ok_or_else(|| Error::Serialization("fault has no message".into()))?
                .as_str()?
                .to_string();
            let data = match fault.get("data")? {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            };
            let optional_int = |key: &str| -> crate::error::Result<Option<i32>> {
                match fault.get(key)? {
                    None | Some(Value::Null) => Ok(None),
                    Some(v) => v.as_i32().map(Some),
                }
            };
            Ok(Failure::Fault {
                code,
                message,
                data,
                domain: optional_int("domain")?,
                level: optional_int("level")?,
            })
        })();
        parsed.unwrap_or_else(|e| Failure::Malformed(format!("malformed fault: {e}")))
    }
}

impl From<io::Error> for Failure {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected => Failure::Closed(err.to_string()),
            io::ErrorKind::InvalidData => Failure::Malformed(err.to_string()),
            _ => Failure::Unexpected(err.to_string()),
        }
    }
}

impl From<Failure> for Error {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Malformed(reason) => Error::Serialization(reason),
            Failure::Fault {
                code,
                message,
                data,
                domain,
                level,
            } => Error::Plugin {
                code,
                message,
                data,
                domain,
                level,
            },
            Failure::Closed(reason) => Error::Communication(format!("plugin died: {reason}")),
            Failure::TimedOut { method, timeout_ms } => Error::Timeout { method, timeout_ms },
            Failure::Unexpected(reason) => Error::Internal(format!("unexpected failure: {reason}")),
        }
    }
}
