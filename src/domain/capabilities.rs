//! Capability set
//!
//! A plugin reports which optional operations it supports as a fixed table
//! of one-byte slots indexed by [`Capability`] code.

use super::types::wire_enum;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

wire_enum! {
    /// Support level stored in a capability slot
    CapabilityValue {
        Unsupported = 0, "UNSUPPORTED";
        Supported = 1, "SUPPORTED";
        SupportedOffline = 2, "SUPPORTED_OFFLINE";
        NotImplemented = 3, "NOT_IMPLEMENTED";
        Unknown = 4, "UNKNOWN";
    }
}

wire_enum! {
    /// Optional operation a plugin may support
    Capability {
        BlockSupport = 0, "BLOCK_SUPPORT";
        FsSupport = 1, "FS_SUPPORT";

        Volumes = 20, "VOLUMES";
        VolumeCreate = 21, "VOLUME_CREATE";
        VolumeResize = 22, "VOLUME_RESIZE";
        VolumeReplicate = 23, "VOLUME_REPLICATE";
        VolumeReplicateClone = 24, "VOLUME_REPLICATE_CLONE";
        VolumeReplicateCopy = 25, "VOLUME_REPLICATE_COPY";
        VolumeReplicateMirrorAsync = 26, "VOLUME_REPLICATE_MIRROR_ASYNC";
        VolumeReplicateMirrorSync = 27, "VOLUME_REPLICATE_MIRROR_SYNC";
        VolumeCopyRangeBlockSize = 28, "VOLUME_COPY_RANGE_BLOCK_SIZE";
        VolumeCopyRange = 29, "VOLUME_COPY_RANGE";
        VolumeCopyRangeClone = 30, "VOLUME_COPY_RANGE_CLONE";
        VolumeCopyRangeCopy = 31, "VOLUME_COPY_RANGE_COPY";
        VolumeDelete = 33, "VOLUME_DELETE";
        VolumeOnline = 34, "VOLUME_ONLINE";
        VolumeOffline = 35, "VOLUME_OFFLINE";
        AccessGroupGrant = 36, "ACCESS_GROUP_GRANT";
        AccessGroupRevoke = 37, "ACCESS_GROUP_REVOKE";
        AccessGroupList = 38, "ACCESS_GROUP_LIST";
        AccessGroupCreate = 39, "ACCESS_GROUP_CREATE";
        AccessGroupDelete = 40, "ACCESS_GROUP_DELETE";
        AccessGroupAddInitiator = 41, "ACCESS_GROUP_ADD_INITIATOR";
        AccessGroupDelInitiator = 42, "ACCESS_GROUP_DEL_INITIATOR";
        VolumesAccessibleByAccessGroup = 43, "VOLUMES_ACCESSIBLE_BY_ACCESS_GROUP";
        AccessGroupsGrantedToVolume = 44, "ACCESS_GROUPS_GRANTED_TO_VOLUME";
        VolumeChildDependency = 45, "VOLUME_CHILD_DEPENDENCY";
        VolumeChildDependencyRm = 46, "VOLUME_CHILD_DEPENDENCY_RM";

        Fs = 100, "FS";
        FsDelete = 101, "FS_DELETE";
        FsResize = 102, "FS_RESIZE";
        FsCreate = 103, "FS_CREATE";
        FsClone = 104, "FS_CLONE";
        FileClone = 105, "FILE_CLONE";
        Snapshots = 106, "SNAPSHOTS";
        SnapshotCreate = 107, "SNAPSHOT_CREATE";
        SnapshotCreateSpecificFiles = 108, "SNAPSHOT_CREATE_SPECIFIC_FILES";
        SnapshotDelete = 109, "SNAPSHOT_DELETE";
        SnapshotRevert = 110, "SNAPSHOT_REVERT";
        SnapshotRevertSpecificFiles = 111, "SNAPSHOT_REVERT_SPECIFIC_FILES";
        FsChildDependency = 112, "FS_CHILD_DEPENDENCY";
        FsChildDependencyRm = 113, "FS_CHILD_DEPENDENCY_RM";
        FsChildDependencyRmSpecificFiles = 114, "FS_CHILD_DEPENDENCY_RM_SPECIFIC_FILES";

        ExportAuth = 120, "EXPORT_AUTH";
        Exports = 121, "EXPORTS";
        ExportFs = 122, "EXPORT_FS";
        ExportRemove = 123, "EXPORT_REMOVE";
    }
}

/// Capabilities reported by a plugin for one system
#[derive(Clone, PartialEq, Eq)]
pub struct StorageCapabilities {
    slots: Vec<u8>,
}

impl StorageCapabilities {
    /// Number of slots in the table
    pub const SLOTS: usize = 512;

    /// Empty table with every slot `Unsupported`
    pub fn new() -> Self {
        Self {
            slots: vec![CapabilityValue::Unsupported.code() as u8; Self::SLOTS],
        }
    }

    /// Build from raw slot bytes. Plugins may send fewer or more than
    /// [`Self::SLOTS`] slots; missing slots read as `Unknown`.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { slots: bytes }
    }

    /// Raw slot bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.slots
    }

    /// Value stored for `cap`. Slot bytes outside the known range read as `Unknown`.
    pub fn get(&self, cap: Capability) -> CapabilityValue {
        self.slots
            .get(cap.code() as usize)
            .and_then(|b| CapabilityValue::from_code(i32::from(*b)))
            .unwrap_or(CapabilityValue::Unknown)
    }

    /// Store `value` for `cap`, growing a short table with `Unknown` slots
    pub fn set(&mut self, cap: Capability, value: CapabilityValue) {
        let idx = cap.code() as usize;
        if idx >= self.slots.len() {
            self.slots
                .resize(idx + 1, CapabilityValue::Unknown.code() as u8);
        }
        self.slots[idx] = value.code() as u8;
    }

    /// Mark every known capability as supported
    pub fn enable_all(&mut self) {
        for cap in Capability::ALL {
            self.set(*cap, CapabilityValue::Supported);
        }
    }

    pub fn is_supported(&self, cap: Capability) -> bool {
        self.get(cap) == CapabilityValue::Supported
    }

    /// Fail with `NoSupport` unless `cap` is supported
    pub fn require(&self, cap: Capability) -> Result<()> {
        if self.is_supported(cap) {
            Ok(())
        } else {
            Err(Error::NoSupport(format!("{} is {}", cap, self.get(cap))))
        }
    }

    /// Supported capabilities, in code order
    pub fn supported(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL
            .iter()
            .copied()
            .filter(move |cap| self.is_supported(*cap))
    }
}

impl Default for StorageCapabilities {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StorageCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.supported()).finish()
    }
}
