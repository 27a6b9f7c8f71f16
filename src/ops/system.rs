//! System, capability and inventory queries

use super::check;
use crate::codec::Record;
use crate::connection::Connection;
use crate::domain::{Disk, Initiator, PluginInfo, StorageCapabilities, System};
use crate::error::{Error, Result};

impl Connection {
    /// Plugin description and version
    pub async fn plugin_info(&self) -> Result<PluginInfo> {
        self.tracked(async {
            let value = self.rpc("plugin_info", []).await?;
            let malformed =
                |reason: String| Error::Serialization(format!("plugin_info: {}", reason));
            let items = value.as_array().map_err(|e| malformed(e.to_string()))?;
            match items {
                [description, version] => Ok(PluginInfo {
                    description: description
                        .as_str()
                        .map_err(|e| malformed(e.to_string()))?
                        .to_string(),
                    version: version
                        .as_str()
                        .map_err(|e| malformed(e.to_string()))?
                        .to_string(),
                }),
                other => Err(malformed(format!("expected 2 elements, found {}", other.len()))),
            }
        })
        .await
    }

    /// Storage systems managed by the plugin
    pub async fn systems(&self) -> Result<Vec<System>> {
        self.tracked(self.list("systems", [])).await
    }

    /// Capability set of `system`
    pub async fn capabilities(&self, system: &System) -> Result<StorageCapabilities> {
        self.tracked(async {
            check(system)?;
            let value = self.rpc("capabilities", [("system", system.encode())]).await?;
            StorageCapabilities::decode(&value)
        })
        .await
    }

    pub async fn disks(&self) -> Result<Vec<Disk>> {
        self.tracked(self.list("disks", [])).await
    }

    pub async fn initiators(&self) -> Result<Vec<Initiator>> {
        self.tracked(self.list("initiators", [])).await
    }
}
