//! Plugin discovery
//!
//! Enumerates the sockets in the IPC directory, queries each plugin for its
//! description and version and builds a catalog of
//! `description<separator>version` strings.

use super::{Connector, PluginUri};
use crate::config::ClientConfig;
use crate::domain::PluginInfo;
use crate::error::Result;
use tracing::{debug, warn};

/// Enumerate installed plugins using the sockets under `config.ipc_dir`
pub async fn available_plugins(config: &ClientConfig, separator: &str) -> Result<Vec<String>> {
    available_plugins_with(&Connector::new(config.clone()), separator).await
}

/// Enumerate installed plugins through `connector`'s channel factory.
///
/// Plugins that cannot be reached or do not answer `plugin_info` are
/// skipped. Only a failure to list the directory itself is an error.
pub async fn available_plugins_with(connector: &Connector, separator: &str) -> Result<Vec<String>> {
    let names = connector.factory().list().await?;
    debug!("Probing {} plugin socket(s)", names.len());

    let mut catalog = Vec::with_capacity(names.len());
    for name in names {
        match query_info(connector, &name).await {
            Ok(info) => catalog.push(format!("{}{}{}", info.description, separator, info.version)),
            Err(e) => warn!("Skipping plugin {}: {}", name, e),
        }
    }
    Ok(catalog)
}

async fn query_info(connector: &Connector, name: &str) -> Result<PluginInfo> {
    let raw = format!("{}://", name);
    let uri = PluginUri::parse(&raw)?;
    let conn = connector
        .open(uri, &raw, connector.config().discovery_timeout_ms)
        .await?;
    // dropped without shutdown; the query never registered a session
    conn.plugin_info().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::SimulatedPlugin;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::default().with_ipc_dir(dir.path());
        assert!(available_plugins(&config, " ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::default().with_ipc_dir(dir.path().join("absent"));
        assert_matches!(
            available_plugins(&config, " ").await,
            Err(Error::Discovery { .. })
        );
    }

    #[tokio::test]
    async fn test_catalog_skips_plain_files() {
        let sim = SimulatedPlugin::start("sim").await;
        std::fs::write(sim.ipc_dir().join("README"), "not a socket").unwrap();

        let catalog = available_plugins_with(&sim.connector(), " | ").await.unwrap();
        assert_eq!(catalog, vec![format!("Simulated storage plugin | {}", crate::VERSION)]);
        assert_eq!(sim.calls("plugin_register"), 0);
        assert_eq!(sim.calls("shutdown"), 0);
    }

    #[tokio::test]
    async fn test_unresponsive_plugin_is_skipped() {
        let sim = SimulatedPlugin::start("sim").await;
        sim.fail_method("plugin_info", 1, "broken");
        let catalog = available_plugins_with(&sim.connector(), "/").await.unwrap();
        assert!(catalog.is_empty());
        assert_eq!(sim.calls("plugin_info"), 1);
    }
}
