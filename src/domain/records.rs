//! Domain records
//!
//! Plain value objects produced by the entity codec from plugin responses, or
//! built by the caller for outbound requests. Identifiers are opaque strings
//! assigned by the plugin and only meaningful on the connection that
//! returned them.

use super::types::{DiskType, InitiatorType};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Block Storage Records
// =============================================================================

/// A storage array (or array controller) managed by the plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct System {
    pub id: String,
    pub name: String,
    /// Status bit field
    pub status: u32,
}

impl System {
    pub const STATUS_UNKNOWN: u32 = 0x0;
    pub const STATUS_OK: u32 = 0x1;
    pub const STATUS_DEGRADED: u32 = 0x2;
    pub const STATUS_ERROR: u32 = 0x4;
    pub const STATUS_PREDICTIVE_FAILURE: u32 = 0x8;
}

/// Storage pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: String,
    pub name: String,
    /// Total capacity in bytes
    pub total_space: u64,
    /// Free capacity in bytes
    pub free_space: u64,
    pub system_id: String,
}

/// Block volume (LUN)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    pub name: String,
    /// SCSI VPD page 0x83 identifier
    pub vpd83: String,
    pub block_size: u64,
    pub num_of_blocks: u64,
    /// Status bit field; several bits may be set at once
    pub status: u32,
    pub system_id: String,
}

impl Volume {
    pub const STATUS_UNKNOWN: u32 = 0x0;
    pub const STATUS_OK: u32 = 0x1;
    pub const STATUS_DEGRADED: u32 = 0x2;
    pub const STATUS_ERR: u32 = 0x4;
    pub const STATUS_STARTING: u32 = 0x8;
    pub const STATUS_DORMANT: u32 = 0x10;

    /// Volume size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.block_size.saturating_mul(self.num_of_blocks)
    }
}

/// Physical disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disk {
    pub id: String,
    pub name: String,
    pub disk_type: DiskType,
    pub block_size: u64,
    pub num_of_blocks: u64,
    /// Status bit field
    pub status: u64,
    pub system_id: String,
}

impl Disk {
    pub fn size_bytes(&self) -> u64 {
        self.block_size.saturating_mul(self.num_of_blocks)
    }
}

/// Host-side endpoint that can be granted access to volumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initiator {
    pub id: String,
    pub initiator_type: InitiatorType,
    pub name: String,
}

/// Named set of initiators that share volume grants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGroup {
    pub id: String,
    pub name: String,
    /// Initiator identifiers in the group
    pub initiators: Vec<String>,
    pub system_id: String,
}

/// Contiguous block extent used by range replication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRange {
    pub src_block: u64,
    pub dest_block: u64,
    pub block_count: u64,
}

impl BlockRange {
    pub fn new(src_block: u64, dest_block: u64, block_count: u64) -> Self {
        Self {
            src_block,
            dest_block,
            block_count,
        }
    }
}

// =============================================================================
// File Storage Records
// =============================================================================

/// File system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSystem {
    pub id: String,
    pub name: String,
    pub total_space: u64,
    pub free_space: u64,
    pub pool_id: String,
    pub system_id: String,
}

/// Point-in-time file system snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub name: String,
    /// Creation time, seconds since the Unix epoch
    pub ts: u64,
}

impl Snapshot {
    /// Creation time, if representable
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.ts).ok()?;
        Utc.timestamp_opt(secs, 0).single()
    }
}

/// NFS export of a file system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NfsExport {
    pub id: String,
    pub fs_id: String,
    pub export_path: Option<String>,
    /// Authentication type
    pub auth: Option<String>,
    /// Hosts with root access (no root squash)
    pub root: Vec<String>,
    /// Hosts with read/write access
    pub rw: Vec<String>,
    /// Hosts with read-only access
    pub ro: Vec<String>,
    pub anonuid: u64,
    pub anongid: u64,
    pub options: Option<String>,
}

impl NfsExport {
    /// Anonymous uid/gid not applicable
    pub const ANON_UID_GID_NA: u64 = u64::MAX;
    /// Anonymous uid/gid could not be retrieved
    pub const ANON_UID_GID_ERROR: u64 = u64::MAX - 1;
}

/// Parameters for exporting a file system over NFS
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NfsExportRequest {
    pub fs_id: String,
    /// Requested export path; the plugin picks one when `None`
    pub export_path: Option<String>,
    pub root_list: Option<Vec<String>>,
    pub rw_list: Option<Vec<String>>,
    pub ro_list: Option<Vec<String>>,
    pub anon_uid: u64,
    pub anon_gid: u64,
    pub auth_type: Option<String>,
    pub options: Option<String>,
}

impl NfsExportRequest {
    /// Export `fs_id` with anonymous uid/gid left to the plugin
    pub fn new(fs_id: impl Into<String>) -> Self {
        Self {
            fs_id: fs_id.into(),
            anon_uid: NfsExport::ANON_UID_GID_NA,
            anon_gid: NfsExport::ANON_UID_GID_NA,
            ..Default::default()
        }
    }
}

/// Plugin self-description returned by `plugin_info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub description: String,
    pub version: String,
}
