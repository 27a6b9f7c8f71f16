//! Host access: initiators, access groups and volume grants

use super::{check, non_empty};
use crate::codec::Record;
use crate::connection::Connection;
use crate::domain::{AccessGroup, AccessType, Initiator, InitiatorType, Volume};
use crate::error::Result;
use crate::value::Value;

/// iSCSI CHAP credentials; unset fields are sent as `Null`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapCredentials {
    pub in_user: Option<String>,
    pub in_password: Option<String>,
    pub out_user: Option<String>,
    pub out_password: Option<String>,
}

impl Connection {
    // =========================================================================
    // Initiators
    // =========================================================================

    /// Configure CHAP authentication for `initiator`
    pub async fn iscsi_chap_auth(
        &self,
        initiator: &Initiator,
        chap: &ChapCredentials,
    ) -> Result<()> {
        self.tracked(async {
            check(initiator)?;
            self.invoke(
                "iscsi_chap_auth",
                [
                    ("initiator", initiator.encode()),
                    ("in_user", Value::from(chap.in_user.as_deref())),
                    ("in_password", Value::from(chap.in_password.as_deref())),
                    ("out_user", Value::from(chap.out_user.as_deref())),
                    ("out_password", Value::from(chap.out_password.as_deref())),
                ],
            )
            .await
        })
        .await
    }

    /// Grant the initiator `initiator_id` `access` to `volume`
    pub async fn initiator_grant(
        &self,
        initiator_id: &str,
        initiator_type: InitiatorType,
        volume: &Volume,
        access: AccessType,
    ) -> Result<()> {
        self.tracked(async {
            check(volume)?;
            non_empty("initiator id", initiator_id)?;
            self.invoke(
                "initiator_grant",
                [
                    ("initiator_id", Value::from(initiator_id)),
                    ("initiator_type", Value::from(initiator_type.code())),
                    ("volume", volume.encode()),
                    ("access", Value::from(access.code())),
                ],
            )
            .await
        })
        .await
    }

    pub async fn initiator_revoke(&self, initiator: &Initiator, volume: &Volume) -> Result<()> {
        self.tracked(async {
            check(initiator)?;
            check(volume)?;
            self.invoke(
                "initiator_revoke",
                [("initiator", initiator.encode()), ("volume", volume.encode())],
            )
            .await
        })
        .await
    }

    pub async fn volumes_accessible_by_initiator(
        &self,
        initiator: &Initiator,
    ) -> Result<Vec<Volume>> {
        self.tracked(async {
            check(initiator)?;
            self.list("volumes_accessible_by_initiator", [("initiator", initiator.encode())])
                .await
        })
        .await
    }

    pub async fn initiators_granted_to_volume(&self, volume: &Volume) -> Result<Vec<Initiator>> {
        self.tracked(async {
            check(volume)?;
            self.list("initiators_granted_to_volume", [("volume", volume.encode())])
                .await
        })
        .await
    }

    // =========================================================================
    // Access Groups
    // =========================================================================

    pub async fn access_groups(&self) -> Result<Vec<AccessGroup>> {
        self.tracked(self.list("access_group_list", [])).await
    }

    /// Create an access group on `system_id` seeded with one initiator
    pub async fn access_group_create(
        &self,
        name: &str,
        initiator_id: &str,
        id_type: InitiatorType,
        system_id: &str,
    ) -> Result<AccessGroup> {
        self.tracked(async {
            non_empty("access group name", name)?;
            non_empty("initiator id", initiator_id)?;
            non_empty("system id", system_id)?;
            let value = self
                .rpc(
                    "access_group_create",
                    [
                        ("name", Value::from(name)),
                        ("initiator_id", Value::from(initiator_id)),
                        ("id_type", Value::from(id_type.code())),
                        ("system_id", Value::from(system_id)),
                    ],
                )
                .await?;
            AccessGroup::decode(&value)
        })
        .await
    }

    pub async fn access_group_delete(&self, group: &AccessGroup) -> Result<()> {
        self.tracked(async {
            check(group)?;
            self.invoke("access_group_del", [("group", group.encode())]).await
        })
        .await
    }

    pub async fn access_group_add_initiator(
        &self,
        group: &AccessGroup,
        initiator_id: &str,
        id_type: InitiatorType,
    ) -> Result<()> {
        self.tracked(async {
            check(group)?;
            non_empty("initiator id", initiator_id)?;
            self.invoke(
                "access_group_add_initiator",
                [
                    ("group", group.encode()),
                    ("initiator_id", Value::from(initiator_id)),
                    ("id_type", Value::from(id_type.code())),
                ],
            )
            .await
        })
        .await
    }

    pub async fn access_group_del_initiator(
        &self,
        group: &AccessGroup,
        initiator_id: &str,
    ) -> Result<()> {
        self.tracked(async {
            check(group)?;
            non_empty("initiator id", initiator_id)?;
            self.invoke(
                "access_group_del_initiator",
                [
                    ("group", group.encode()),
                    ("initiator_id", Value::from(initiator_id)),
                ],
            )
            .await
        })
        .await
    }

    /// Grant every initiator in `group` `access` to `volume`
    pub async fn access_group_grant(
        &self,
        group: &AccessGroup,
        volume: &Volume,
        access: AccessType,
    ) -> Result<()> {
        self.tracked(async {
            check(group)?;
            check(volume)?;
            self.invoke(
                "access_group_grant",
                [
                    ("group", group.encode()),
                    ("volume", volume.encode()),
                    ("access", Value::from(access.code())),
                ],
            )
            .await
        })
        .await
    }

    pub async fn access_group_revoke(&self, group: &AccessGroup, volume: &Volume) -> Result<()> {
        self.tracked(async {
            check(group)?;
            check(volume)?;
            self.invoke(
                "access_group_revoke",
                [("group", group.encode()), ("volume", volume.encode())],
            )
            .await
        })
        .await
    }

    pub async fn volumes_accessible_by_access_group(
        &self,
        group: &AccessGroup,
    ) -> Result<Vec<Volume>> {
        self.tracked(async {
            check(group)?;
            self.list("volumes_accessible_by_access_group", [("group", group.encode())])
                .await
        })
        .await
    }

    pub async fn access_groups_granted_to_volume(
        &self,
        volume: &Volume,
    ) -> Result<Vec<AccessGroup>> {
        self.tracked(async {
            check(volume)?;
            self.list("access_groups_granted_to_volume", [("volume", volume.encode())])
                .await
        })
        .await
    }
}
