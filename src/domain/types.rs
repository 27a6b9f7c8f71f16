//! Enumerations with fixed wire codes
//!
//! Each enum is declared once through [`wire_enum!`] so the variant list,
//! its integer code and its display name can never drift apart.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $code:literal, $display:literal; )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )*
        }

        impl $name {
            /// Integer code carried on the wire
            pub fn code(self) -> i32 {
                match self {
                    $( Self::$variant => $code, )*
                }
            }

            /// Decode from a wire code. Returns `None` for unknown codes.
            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $( $code => Some(Self::$variant), )*
                    _ => None,
                }
            }

            /// Human-readable name
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $display, )*
                }
            }

            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )* ];
        }

        impl TryFrom<i32> for $name {
            type Error = Error;

            fn try_from(code: i32) -> Result<Self> {
                Self::from_code(code).ok_or_else(|| {
                    Error::InvalidArgument(format!(
                        "{} is not a valid {}",
                        code,
                        stringify!($name)
                    ))
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

pub(crate) use wire_enum;

wire_enum! {
    /// Volume provisioning strategy
    ProvisionType {
        Unknown = -1, "UNKNOWN";
        Thin = 1, "THIN";
        Full = 2, "FULL";
        Default = 3, "DEFAULT";
    }
}

wire_enum! {
    /// Volume replication strategy
    ReplicationType {
        Unknown = -1, "UNKNOWN";
        Snapshot = 1, "SNAPSHOT";
        Clone = 2, "CLONE";
        Copy = 3, "COPY";
        MirrorSync = 4, "MIRROR_SYNC";
        MirrorAsync = 5, "MIRROR_ASYNC";
    }
}

wire_enum! {
    /// Access level granted to an initiator or access group
    AccessType {
        ReadOnly = 1, "RO";
        ReadWrite = 2, "RW";
        None = 3, "NONE";
    }
}

wire_enum! {
    /// Initiator identifier format
    InitiatorType {
        Other = 1, "OTHER";
        PortWwn = 2, "PORT_WWN";
        NodeWwn = 3, "NODE_WWN";
        Hostname = 4, "HOSTNAME";
        Iscsi = 5, "ISCSI";
    }
}

wire_enum! {
    /// RAID layout of a pool
    PoolRaidType {
        Raid0 = 0, "RAID0";
        Raid1 = 1, "RAID1";
        Raid3 = 3, "RAID3";
        Raid5 = 5, "RAID5";
        Raid6 = 6, "RAID6";
        Raid10 = 10, "RAID10";
        Raid15 = 15, "RAID15";
        Raid16 = 16, "RAID16";
        Raid50 = 50, "RAID50";
        Raid60 = 60, "RAID60";
        Raid51 = 51, "RAID51";
        Raid61 = 61, "RAID61";
        Jbod = 20, "JBOD";
        Unknown = 21, "UNKNOWN";
        NotApplicable = 22, "NOT_APPLICABLE";
        Mixed = 23, "MIXED";
    }
}

wire_enum! {
    /// What a pool is assembled from
    PoolMemberType {
        Unknown = 0, "UNKNOWN";
        Disk = 1, "DISK";
        Pool = 2, "POOL";
        Volume = 3, "VOLUME";
        DiskMix = 10, "DISK_MIX";
        DiskAta = 11, "DISK_ATA";
        DiskSata = 12, "DISK_SATA";
        DiskSas = 13, "DISK_SAS";
        DiskFc = 14, "DISK_FC";
        DiskSop = 15, "DISK_SOP";
        DiskScsi = 16, "DISK_SCSI";
        DiskNlSas = 17, "DISK_NL_SAS";
        DiskHdd = 18, "DISK_HDD";
        DiskSsd = 19, "DISK_SSD";
        DiskHybrid = 20, "DISK_HYBRID";
    }
}

wire_enum! {
    /// Physical disk interface or media
    DiskType {
        Unknown = 0, "UNKNOWN";
        Other = 1, "OTHER";
        NotApplicable = 2, "NOT_APPLICABLE";
        Ata = 3, "ATA";
        Sata = 4, "SATA";
        Sas = 5, "SAS";
        Fc = 6, "FC";
        Sop = 7, "SOP";
        Scsi = 8, "SCSI";
        Lun = 9, "LUN";
        NlSas = 51, "NL_SAS";
        Hdd = 52, "HDD";
        Ssd = 53, "SSD";
        Hybrid = 54, "HYBRID";
    }
}

wire_enum! {
    /// Job status code reported by `job_status`
    JobStatus {
        InProgress = 1, "INPROGRESS";
        Complete = 2, "COMPLETE";
        Stopped = 3, "STOPPED";
        Error = 4, "ERROR";
    }
}
