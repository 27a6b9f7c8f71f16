//! Unix domain socket channels
//!
//! Each plugin daemon listens on a socket named after its URI scheme inside
//! a shared IPC directory.

use crate::domain::{Channel, ChannelFactory};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use tokio::net::UnixStream;
use tracing::debug;

/// Opens channels to plugin sockets under an IPC directory
#[derive(Debug, Clone)]
pub struct UdsChannelFactory {
    ipc_dir: PathBuf,
}

impl UdsChannelFactory {
    pub fn new(ipc_dir: impl Into<PathBuf>) -> Self {
        Self {
            ipc_dir: ipc_dir.into(),
        }
    }

    pub fn ipc_dir(&self) -> &Path {
        &self.ipc_dir
    }

    /// Socket path for `plugin`
    pub fn socket_path(&self, plugin: &str) -> PathBuf {
        self.ipc_dir.join(plugin)
    }
}

#[async_trait]
impl ChannelFactory for UdsChannelFactory {
    async fn open(&self, plugin: &str) -> Result<Box<dyn Channel>> {
        if plugin.is_empty() || plugin.contains('/') || plugin == "." || plugin == ".." {
            return Err(Error::PluginUnavailable {
                plugin: plugin.to_string(),
                reason: "not a valid plugin name".into(),
            });
        }

        if !tokio::fs::try_exists(&self.ipc_dir).await.unwrap_or(false) {
            return Err(Error::DaemonNotRunning(format!(
                "IPC directory {} does not exist",
                self.ipc_dir.display()
            )));
        }

        let path = self.socket_path(plugin);
        debug!("Opening plugin socket {}", path.display());
        let stream = UnixStream::connect(&path)
            .await
            .map_err(|e| Error::PluginUnavailable {
                plugin: plugin.to_string(),
                reason: format!("{}: {}", path.display(), e),
            })?;
        Ok(Box::new(stream))
    }

    async fn list(&self) -> Result<Vec<String>> {
        let discovery_error = |e: std::io::Error| Error::Discovery {
            path: self.ipc_dir.display().to_string(),
            reason: e.to_string(),
        };

        let mut entries = tokio::fs::read_dir(&self.ipc_dir)
            .await
            .map_err(discovery_error)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(discovery_error)? {
            let is_socket = match entry.file_type().await {
                Ok(ft) => ft.is_socket(),
                Err(_) => false,
            };
            if !is_socket {
                debug!("Skipping non-socket entry {}", entry.path().display());
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
