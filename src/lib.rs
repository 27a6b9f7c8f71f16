//! Storage Management Client - Plugin Control Plane
//!
//! Client side of a storage array management protocol. Each array vendor
//! ships a plugin process listening on a Unix socket; this crate connects to
//! it, exchanges framed JSON requests and exposes the array's systems, pools,
//! volumes, access groups, file systems, snapshots and NFS exports as typed
//! records. Long-running operations come back as jobs that are polled to
//! completion.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                          Operation Façade (ops)                       │
//! │   systems · pools · volumes · access groups · fs · snapshots · nfs    │
//! ├──────────────────────────────┬───────────────────────────────────────┤
//! │   Connection / Lifecycle     │            Job Tracker                 │
//! │   (handshake, timeout,       │   (Completion, poll, wait, free)      │
//! │    last error, close)        │                                       │
//! ├──────────────────────────────┴───────────────────────────────────────┤
//! │                 Entity Codec (records <-> Value objects)              │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │       RPC Transport (10-digit length header + JSON payload)           │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │            Dynamic Value (null/bool/int/string/array/object)          │
//! └──────────────────────────────────────────────────────────────────────┘
//!                                  │
//!                       <ipc_dir>/<plugin> Unix socket
//! ```
//!
//! # Modules
//!
//! - [`value`]: Dynamic value tree and its JSON wire form
//! - [`codec`]: Record encoding and decoding
//! - [`transport`]: Frame codec and request/response exchange
//! - [`connection`]: Plugin URIs, handshake, discovery
//! - [`job`]: Asynchronous job tracking
//! - [`ops`]: Storage operations on a [`Connection`]
//! - [`domain`]: Records, enumerations and capabilities
//! - [`error`]: Error types and codes

pub mod codec;
pub mod config;
pub mod connection;
pub mod domain;
pub mod error;
pub mod job;
pub mod metrics;
pub mod ops;
pub mod transport;
pub mod value;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use codec::Record;

pub use config::{ClientConfig, JobPollConfig};

pub use connection::{available_plugins, available_plugins_with, Connection, Connector, PluginUri};

pub use domain::{
    AccessGroup, AccessType, BlockRange, Capability, CapabilityValue, Disk, DiskType, FileSystem,
    Initiator, InitiatorType, JobStatus, NfsExport, NfsExportRequest, PluginInfo, Pool,
    PoolMemberType, PoolRaidType, ProvisionType, ReplicationType, Snapshot, StorageCapabilities,
    System, Volume,
};

pub use error::{Error, ErrorCode, ErrorDetail, Recovery, Result};

pub use job::{Completion, DecodedJobResult, Job, JobId, JobKind, JobReport, JobState};

pub use metrics::RpcMetrics;

pub use ops::access::ChapCredentials;
pub use ops::fs::RevertScope;

pub use value::{Integer, Object, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
