//! Volume operations

use super::{check, non_empty};
use crate::codec::{encode_list, encode_optional, Record};
use crate::connection::Connection;
use crate::domain::{BlockRange, Pool, ProvisionType, RecordKind, ReplicationType, System, Volume};
use crate::error::{Error, Result};
use crate::job::Completion;
use crate::value::Value;
use tracing::debug;

impl Connection {
    pub async fn volumes(&self) -> Result<Vec<Volume>> {
        self.tracked(self.list("volumes", [])).await
    }

    /// Create a volume of `size_bytes` in `pool`
    pub async fn volume_create(
        &self,
        pool: &Pool,
        name: &str,
        size_bytes: u64,
        provisioning: ProvisionType,
    ) -> Result<Completion<Volume>> {
        self.tracked(async {
            check(pool)?;
            non_empty("volume name", name)?;
            if size_bytes == 0 {
                return Err(Error::argument("volume size must be greater than zero"));
            }
            self.mutate(
                "volume_create",
                [
                    ("pool", pool.encode()),
                    ("volume_name", Value::from(name)),
                    ("size_bytes", Value::from(size_bytes)),
                    ("provisioning", Value::from(provisioning.code())),
                ],
            )
            .await
        })
        .await
    }

    /// Resize `volume` to `new_size_bytes`.
    ///
    /// Fails locally with [`Error::VolumeSameSize`] when the new size
    /// rounds down to the volume's current block count.
    pub async fn volume_resize(
        &self,
        volume: &Volume,
        new_size_bytes: u64,
    ) -> Result<Completion<Volume>> {
        self.tracked(async {
            check(volume)?;
            if volume.block_size == 0 {
                return Err(Error::invalid(RecordKind::Volume, "block size must not be zero"));
            }
            if new_size_bytes == 0 {
                return Err(Error::argument("new size must be greater than zero"));
            }
            if new_size_bytes / volume.block_size == volume.num_of_blocks {
                debug!("Volume {} already spans {} bytes", volume.id, new_size_bytes);
                return Err(Error::VolumeSameSize {
                    volume: volume.id.clone(),
                });
            }
            self.mutate(
                "volume_resize",
                [
                    ("volume", volume.encode()),
                    ("new_size_bytes", Value::from(new_size_bytes)),
                ],
            )
            .await
        })
        .await
    }

    /// Replicate `source` into a new volume called `name`.
    ///
    /// With `pool` unset the plugin picks the destination pool.
    pub async fn volume_replicate(
        &self,
        pool: Option<&Pool>,
        rep_type: ReplicationType,
        source: &Volume,
        name: &str,
    ) -> Result<Completion<Volume>> {
        self.tracked(async {
            if let Some(pool) = pool {
                check(pool)?;
            }
            check(source)?;
            non_empty("replica name", name)?;
            self.mutate(
                "volume_replicate",
                [
                    ("pool", encode_optional(pool)),
                    ("rep_type", Value::from(rep_type.code())),
                    ("volume_src", source.encode()),
                    ("name", Value::from(name)),
                ],
            )
            .await
        })
        .await
    }

    /// Block size, in bytes, used by [`Connection::volume_replicate_range`]
    pub async fn volume_replicate_range_block_size(&self, system: &System) -> Result<u32> {
        self.tracked(async {
            check(system)?;
            let value = self
                .rpc("volume_replicate_range_block_size", [("system", system.encode())])
                .await?;
            value.as_u32().map_err(|e| {
                Error::Serialization(format!("volume_replicate_range_block_size: {}", e))
            })
        })
        .await
    }

    /// Copy block `ranges` from `source` to `dest`
    pub async fn volume_replicate_range(
        &self,
        rep_type: ReplicationType,
        source: &Volume,
        dest: &Volume,
        ranges: &[BlockRange],
    ) -> Result<Completion<()>> {
        self.tracked(async {
            check(source)?;
            check(dest)?;
            if ranges.is_empty() {
                return Err(Error::argument("at least one block range is required"));
            }
            self.mutate(
                "volume_replicate_range",
                [
                    ("rep_type", Value::from(rep_type.code())),
                    ("volume_src", source.encode()),
                    ("volume_dest", dest.encode()),
                    ("ranges", encode_list(ranges)),
                ],
            )
            .await
        })
        .await
    }

    pub async fn volume_delete(&self, volume: &Volume) -> Result<Completion<()>> {
        self.tracked(async {
            check(volume)?;
            self.mutate("volume_delete", [("volume", volume.encode())]).await
        })
        .await
    }

    /// Bring `volume` online
    pub async fn volume_online(&self, volume: &Volume) -> Result<()> {
        self.tracked(async {
            check(volume)?;
            self.invoke("volume_online", [("volume", volume.encode())]).await
        })
        .await
    }

    /// Take `volume` offline
    pub async fn volume_offline(&self, volume: &Volume) -> Result<()> {
        self.tracked(async {
            check(volume)?;
            self.invoke("volume_offline", [("volume", volume.encode())]).await
        })
        .await
    }

    /// Whether other volumes (clones, snapshots) depend on `volume`
    pub async fn volume_child_dependency(&self, volume: &Volume) -> Result<bool> {
        self.tracked(async {
            check(volume)?;
            self.ask("volume_child_dependency", [("volume", volume.encode())])
                .await
        })
        .await
    }

    /// Break the dependencies reported by [`Connection::volume_child_dependency`]
    pub async fn volume_child_dependency_rm(&self, volume: &Volume) -> Result<Completion<()>> {
        self.tracked(async {
            check(volume)?;
            self.mutate("volume_child_dependency_rm", [("volume", volume.encode())])
                .await
        })
        .await
    }
}
