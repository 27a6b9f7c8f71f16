//! Domain layer - Storage records and port definitions
//!
//! Records are plain values decoded from plugin responses. The ports module
//! defines the seam between the connection logic and the channel that
//! carries frames to a plugin process.

pub mod capabilities;
pub mod ports;
pub mod records;
pub mod types;

pub use capabilities::{Capability, CapabilityValue, StorageCapabilities};
pub use ports::{Channel, ChannelFactory};
pub use records::*;
pub use types::*;

use crate::error::ErrorCode;
use std::fmt;

/// Kind of domain record, used for validation errors and codec diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    System,
    Pool,
    Volume,
    Disk,
    Initiator,
    AccessGroup,
    FileSystem,
    Snapshot,
    NfsExport,
    BlockRange,
    Capabilities,
    StringList,
}

impl RecordKind {
    /// Error code reported when a record of this kind fails validation
    pub fn invalid_code(self) -> ErrorCode {
        match self {
            RecordKind::System => ErrorCode::InvalidSystem,
            RecordKind::Pool => ErrorCode::InvalidPool,
            RecordKind::Volume => ErrorCode::InvalidVolume,
            RecordKind::Disk => ErrorCode::InvalidDisk,
            RecordKind::Initiator => ErrorCode::InvalidInitiator,
            RecordKind::AccessGroup => ErrorCode::InvalidAccessGroup,
            RecordKind::FileSystem => ErrorCode::InvalidFs,
            RecordKind::Snapshot => ErrorCode::InvalidSnapshot,
            RecordKind::NfsExport => ErrorCode::InvalidNfsExport,
            RecordKind::BlockRange => ErrorCode::InvalidBlockRange,
            RecordKind::Capabilities => ErrorCode::InvalidCapability,
            RecordKind::StringList => ErrorCode::InvalidStringList,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::System => write!(f, "system"),
            RecordKind::Pool => write!(f, "pool"),
            RecordKind::Volume => write!(f, "volume"),
            RecordKind::Disk => write!(f, "disk"),
            RecordKind::Initiator => write!(f, "initiator"),
            RecordKind::AccessGroup => write!(f, "access group"),
            RecordKind::FileSystem => write!(f, "file system"),
            RecordKind::Snapshot => write!(f, "snapshot"),
            RecordKind::NfsExport => write!(f, "NFS export"),
            RecordKind::BlockRange => write!(f, "block range"),
            RecordKind::Capabilities => write!(f, "capabilities"),
            RecordKind::StringList => write!(f, "string list"),
        }
    }
}
