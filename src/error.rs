//! Error types for the storage management client
//!
//! Every public operation returns [`Result`]. Each [`Error`] variant maps to
//! a stable integer code (see [`ErrorCode`]) and to a [`Recovery`] telling the
//! caller whether the connection is still usable.

use crate::domain::RecordKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Stable Error Codes
// =============================================================================

/// Stable integer taxonomy exposed to callers.
///
/// `Ok` and `JobStarted` are success markers; they never appear inside an
/// [`Error`] but are part of the code space so callers can store outcomes
/// as plain integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ErrorCode {
    Ok = 0,
    InternalError = 1,
    JobStarted = 7,
    Timeout = 11,
    DaemonNotRunning = 12,

    InvalidArgument = 101,
    InvalidAccessGroup = 102,
    InvalidBlockRange = 103,
    InvalidConnection = 104,
    InvalidError = 105,
    InvalidFs = 106,
    InvalidInitiator = 107,
    InvalidJob = 108,
    InvalidName = 109,
    InvalidNfsExport = 110,
    InvalidPlugin = 111,
    InvalidPool = 112,
    InvalidStringList = 113,
    InvalidSnapshot = 114,
    InvalidUri = 115,
    InvalidValue = 116,
    InvalidVolume = 117,
    InvalidCapability = 118,
    InvalidSystem = 119,
    InvalidDisk = 121,

    NoMemory = 152,
    NoSupport = 153,

    VolumeSameSize = 160,
    JobFailed = 201,

    TransportCommunication = 400,
    TransportSerialization = 401,
    TransportInvalidArgument = 402,
}

impl ErrorCode {
    /// Numeric value as sent on the wire and returned to callers.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code as i32
    }
}

// =============================================================================
// Error
// =============================================================================

/// Unified error type for the client library
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Local Validation Errors
    // =========================================================================
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("Invalid {kind}: {reason}")]
    InvalidRecord { kind: RecordKind, reason: String },

    #[error("Invalid job: {0}")]
    InvalidJob(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Value And Schema Errors
    // =========================================================================
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Schema violation in {record}: {reason}")]
    SchemaViolation { record: &'static str, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    // =========================================================================
    // Communication Errors
    // =========================================================================
    #[error("Communication error: {0}")]
    Communication(String),

    #[error("Timed out after {timeout_ms} ms waiting for {method}")]
    Timeout { method: String, timeout_ms: u32 },

    #[error("Connection is no longer usable")]
    InvalidConnection,

    #[error("Plugin daemon is not running: {0}")]
    DaemonNotRunning(String),

    #[error("Plugin unavailable: {plugin} - {reason}")]
    PluginUnavailable { plugin: String, reason: String },

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// Fault declared by the plugin; code and message are passed through verbatim.
    #[error("Plugin error {code}: {message}")]
    Plugin {
        code: i32,
        message: String,
        data: Option<String>,
        /// Backend-specific error domain
        domain: Option<i32>,
        /// Backend-specific severity
        level: Option<i32>,
    },

    #[error("Job {job_id} finished with status {status}")]
    JobFailed { job_id: String, status: String },

    // =========================================================================
    // Business Rule Errors
    // =========================================================================
    #[error("Volume {volume} already has the requested size")]
    VolumeSameSize { volume: String },

    #[error("Operation not supported: {0}")]
    NoSupport(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Discovery of {path} failed: {reason}")]
    Discovery { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a caller should do with its connection after an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Connection is unaffected; fix the input or accept the outcome
    None,
    /// Payload was malformed; the peer may be confused
    Inspect,
    /// Connection is dead or in an undefined state; discard and reconnect
    Reconnect,
}

impl Error {
    /// Stable integer code for this error.
    ///
    /// Plugin-declared faults return the plugin's own code unchanged.
    pub fn code(&self) -> i32 {
        match self {
            Error::Plugin { code, .. } => *code,
            other => other.error_code().as_i32(),
        }
    }

    /// Framework code for this error; plugin faults report `InternalError`
    /// here because their numeric code is not necessarily a known variant.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Error::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Error::InvalidUri(_) => ErrorCode::InvalidUri,
            Error::InvalidRecord { kind, .. } => kind.invalid_code(),
            Error::InvalidJob(_) => ErrorCode::InvalidJob,
            Error::Configuration(_) => ErrorCode::InvalidArgument,
            Error::TypeMismatch { .. }
            | Error::SchemaViolation { .. }
            | Error::Serialization(_) => ErrorCode::TransportSerialization,
            Error::Communication(_) => ErrorCode::TransportCommunication,
            Error::Timeout { .. } => ErrorCode::Timeout,
            Error::InvalidConnection => ErrorCode::InvalidConnection,
            Error::DaemonNotRunning(_) => ErrorCode::DaemonNotRunning,
            Error::PluginUnavailable { .. } => ErrorCode::InvalidPlugin,
            Error::Plugin { .. } => ErrorCode::InternalError,
            Error::JobFailed { .. } => ErrorCode::JobFailed,
            Error::VolumeSameSize { .. } => ErrorCode::VolumeSameSize,
            Error::NoSupport(_) => ErrorCode::NoSupport,
            Error::Internal(_) | Error::Discovery { .. } | Error::Io(_) => {
                ErrorCode::InternalError
            }
        }
    }

    /// Determine what the caller should do with the connection
    pub fn recovery(&self) -> Recovery {
        match self {
            // Channel is gone or mid-frame
            Error::Communication(_)
            | Error::Timeout { .. }
            | Error::InvalidConnection
            | Error::DaemonNotRunning(_)
            | Error::PluginUnavailable { .. }
            | Error::Io(_) => Recovery::Reconnect,

            // Peer sent something we could not make sense of
            Error::TypeMismatch { .. }
            | Error::SchemaViolation { .. }
            | Error::Serialization(_)
            | Error::Internal(_) => Recovery::Inspect,

            _ => Recovery::None,
        }
    }

    /// Check if the connection must be discarded
    pub fn is_fatal_to_connection(&self) -> bool {
        matches!(self.recovery(), Recovery::Reconnect)
    }

    /// Check if this error was raised locally without contacting the plugin
    pub fn is_local_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument(_)
                | Error::InvalidUri(_)
                | Error::InvalidRecord { .. }
                | Error::InvalidJob(_)
                | Error::VolumeSameSize { .. }
        )
    }

    pub(crate) fn invalid(kind: RecordKind, reason: impl Into<String>) -> Self {
        Error::InvalidRecord {
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn argument(reason: impl Into<String>) -> Self {
        Error::InvalidArgument(reason.into())
    }
}

/// Result type alias for the client library
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Error Detail (last-error slot)
// =============================================================================

/// Where an error originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorOrigin {
    /// Raised by this library
    Framework,
    /// Declared by the plugin
    Plugin,
}

/// Structured record of the most recent failure on a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable code, see [`Error::code`]
    pub code: i32,
    /// Human-readable message
    pub message: String,
    /// Additional detail from the plugin, if any
    pub exception: Option<String>,
    /// Error origin
    pub origin: ErrorOrigin,
    /// Plugin-reported error domain
    pub domain: Option<i32>,
    /// Plugin-reported severity
    pub level: Option<i32>,
}

impl From<&Error> for ErrorDetail {
    fn from(err: &Error) -> Self {
        match err {
            Error::Plugin {
                code,
                message,
                data,
                domain,
                level,
            } => ErrorDetail {
                code: *code,
                message: message.clone(),
                exception: data.clone(),
                origin: ErrorOrigin::Plugin,
                domain: *domain,
                level: *level,
            },
            other => ErrorDetail {
                code: other.code(),
                message: other.to_string(),
                exception: None,
                origin: ErrorOrigin::Framework,
                domain: None,
                level: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_code_passes_through() {
        let err = Error::Plugin {
            code: 54,
            message: "pool not found".into(),
            data: None,
            domain: Some(2),
            level: Some(3),
        };
        assert_eq!(err.code(), 54);
        assert_eq!(err.recovery(), Recovery::None);

        let detail = ErrorDetail::from(&err);
        assert_eq!(detail.origin, ErrorOrigin::Plugin);
        assert_eq!(detail.message, "pool not found");
        assert_eq!(detail.domain, Some(2));
        assert_eq!(detail.level, Some(3));

        let local = ErrorDetail::from(&Error::argument("bad"));
        assert_eq!(local.origin, ErrorOrigin::Framework);
        assert_eq!(local.domain, None);
    }

    #[test]
    fn test_error_recovery() {
        let eof = Error::Communication("plugin died".into());
        assert_eq!(eof.code(), 400);
        assert!(eof.is_fatal_to_connection());

        let bad = Error::Serialization("truncated payload".into());
        assert_eq!(bad.code(), 401);
        assert_eq!(bad.recovery(), Recovery::Inspect);

        let same = Error::VolumeSameSize {
            volume: "vol-1".into(),
        };
        assert_eq!(same.code(), ErrorCode::VolumeSameSize.as_i32());
        assert!(same.is_local_validation());
        assert!(!same.is_fatal_to_connection());
    }

    #[test]
    fn test_invalid_record_codes() {
        let err = Error::invalid(RecordKind::Pool, "empty id");
        assert_eq!(err.code(), ErrorCode::InvalidPool.as_i32());
        assert_eq!(err.to_string(), "Invalid pool: empty id");

        let err = Error::invalid(RecordKind::Snapshot, "empty id");
        assert_eq!(err.error_code(), ErrorCode::InvalidSnapshot);
    }
}
