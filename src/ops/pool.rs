//! Pool operations

use super::{check, non_empty};
use crate::codec::{encode_list, Record};
use crate::connection::Connection;
use crate::domain::{Disk, Pool, PoolMemberType, PoolRaidType, System, Volume};
use crate::error::{Error, Result};
use crate::job::Completion;
use crate::value::Value;

impl Connection {
    pub async fn pools(&self) -> Result<Vec<Pool>> {
        self.tracked(self.list("pools", [])).await
    }

    /// Create a pool of `size_bytes` on `system`
    pub async fn pool_create(
        &self,
        system: &System,
        name: &str,
        size_bytes: u64,
        raid_type: PoolRaidType,
        member_type: PoolMemberType,
    ) -> Result<Completion<Pool>> {
        self.tracked(async {
            check(system)?;
            non_empty("pool name", name)?;
            if size_bytes == 0 {
                return Err(Error::argument("pool size must be greater than zero"));
            }
            self.mutate(
                "pool_create",
                [
                    ("system", system.encode()),
                    ("pool_name", Value::from(name)),
                    ("size_bytes", Value::from(size_bytes)),
                    ("raid_type", Value::from(raid_type.code())),
                    ("member_type", Value::from(member_type.code())),
                ],
            )
            .await
        })
        .await
    }

    /// Create a pool from whole disks
    pub async fn pool_create_from_disks(
        &self,
        system: &System,
        name: &str,
        disks: &[Disk],
        raid_type: PoolRaidType,
    ) -> Result<Completion<Pool>> {
        self.tracked(async {
            check(system)?;
            non_empty("pool name", name)?;
            if disks.is_empty() {
                return Err(Error::argument("at least one disk is required"));
            }
            disks.iter().try_for_each(check)?;
            self.mutate(
                "pool_create_from_disks",
                [
                    ("system", system.encode()),
                    ("pool_name", Value::from(name)),
                    ("disks", encode_list(disks)),
                    ("raid_type", Value::from(raid_type.code())),
                ],
            )
            .await
        })
        .await
    }

    /// Create a pool from existing volumes
    pub async fn pool_create_from_volumes(
        &self,
        system: &System,
        name: &str,
        volumes: &[Volume],
        raid_type: PoolRaidType,
    ) -> Result<Completion<Pool>> {
        self.tracked(async {
            check(system)?;
            non_empty("pool name", name)?;
            if volumes.is_empty() {
                return Err(Error::argument("at least one volume is required"));
            }
            volumes.iter().try_for_each(check)?;
            self.mutate(
                "pool_create_from_volumes",
                [
                    ("system", system.encode()),
                    ("pool_name", Value::from(name)),
                    ("volumes", encode_list(volumes)),
                    ("raid_type", Value::from(raid_type.code())),
                ],
            )
            .await
        })
        .await
    }

    /// Carve a new pool of `size_bytes` out of `pool`
    pub async fn pool_create_from_pool(
        &self,
        system: &System,
        name: &str,
        pool: &Pool,
        size_bytes: u64,
    ) -> Result<Completion<Pool>> {
        self.tracked(async {
            check(system)?;
            check(pool)?;
            non_empty("pool name", name)?;
            if size_bytes == 0 {
                return Err(Error::argument("pool size must be greater than zero"));
            }
            self.mutate(
                "pool_create_from_pool",
                [
                    ("system", system.encode()),
                    ("pool_name", Value::from(name)),
                    ("size_bytes", Value::from(size_bytes)),
                    ("pool", pool.encode()),
                ],
            )
            .await
        })
        .await
    }

    pub async fn pool_delete(&self, pool: &Pool) -> Result<Completion<()>> {
        self.tracked(async {
            check(pool)?;
            self.mutate("pool_delete", [("pool", pool.encode())]).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing::SimulatedPlugin;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_pool_lifecycle() {
        let sim = SimulatedPlugin::start("sim").await;
        let conn = sim.connector().connect("sim://", None, 30_000).await.unwrap();
        let system = conn.systems().await.unwrap().remove(0);
        let before = conn.pools().await.unwrap().len();

        let pool = conn
            .pool_create(&system, "gold", 1 << 40, PoolRaidType::Raid5, PoolMemberType::DiskSsd)
            .await
            .unwrap()
            .done()
            .unwrap();
        assert_eq!(pool.name, "gold");
        assert_eq!(pool.total_space, 1 << 40);
        assert_eq!(conn.pools().await.unwrap().len(), before + 1);

        let params = sim.last_params("pool_create").unwrap();
        assert_eq!(params.get("raid_type").unwrap().unwrap().as_i32().unwrap(), 5);
        assert_eq!(params.get("member_type").unwrap().unwrap().as_i32().unwrap(), 19);
        assert_eq!(params.get("flags").unwrap().unwrap().as_u8().unwrap(), 0);

        let outcome = conn.pool_delete(&pool).await.unwrap();
        assert_eq!(outcome.code(), ErrorCode::Ok);
        assert_eq!(conn.pools().await.unwrap().len(), before);
    }

    #[tokio::test]
    async fn test_pool_from_members() {
        let sim = SimulatedPlugin::start("sim").await;
        let conn = sim.connector().connect("sim://", None, 30_000).await.unwrap();
        let system = conn.systems().await.unwrap().remove(0);
        let disks = conn.disks().await.unwrap();
        let parent = conn.pools().await.unwrap().remove(0);

        let from_disks = conn
            .pool_create_from_disks(&system, "raid1", &disks[..2], PoolRaidType::Raid1)
            .await
            .unwrap();
        assert!(!from_disks.is_job());
        let sent = sim.last_params("pool_create_from_disks").unwrap();
        let sent_disks = sent.get("disks").unwrap().unwrap().as_array().unwrap();
        assert_eq!(sent_disks.len(), 2);
        assert_eq!(Disk::decode(&sent_disks[0]).unwrap(), disks[0]);

        let sub = conn
            .pool_create_from_pool(&system, "sub", &parent, 1 << 30)
            .await
            .unwrap()
            .done()
            .unwrap();
        assert_eq!(sub.total_space, 1 << 30);
    }

    #[tokio::test]
    async fn test_pool_validation_skips_rpc() {
        let sim = SimulatedPlugin::start("sim").await;
        let conn = sim.connector().connect("sim://", None, 30_000).await.unwrap();
        let system = conn.systems().await.unwrap().remove(0);
        let mut pool = conn.pools().await.unwrap().remove(0);

        assert_matches!(
            conn.pool_create(&system, "", 1, PoolRaidType::Raid0, PoolMemberType::Disk)
                .await,
            Err(Error::InvalidArgument(_))
        );
        assert_matches!(
            conn.pool_create(&system, "p", 0, PoolRaidType::Raid0, PoolMemberType::Disk)
                .await,
            Err(Error::InvalidArgument(_))
        );
        assert_matches!(
            conn.pool_create_from_volumes(&system, "p", &[], PoolRaidType::Raid0)
                .await,
            Err(Error::InvalidArgument(_))
        );

        pool.id.clear();
        let err = conn.pool_delete(&pool).await.unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::InvalidPool);

        assert_eq!(sim.calls("pool_create"), 0);
        assert_eq!(sim.calls("pool_create_from_volumes"), 0);
        assert_eq!(sim.calls("pool_delete"), 0);
    }
}
