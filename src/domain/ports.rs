//! Domain Ports - Boundaries between the client core and plugin processes
//!
//! The connection logic never touches sockets directly. It asks a
//! [`ChannelFactory`] for a [`Channel`] to a named plugin and speaks the
//! framed protocol over whatever byte stream comes back.

use crate::error::Result;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

// =============================================================================
// Session Channel
// =============================================================================

/// Bidirectional byte stream to a single plugin instance
pub trait Channel: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> Channel for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

// =============================================================================
// Channel Factory
// =============================================================================

/// Opens session channels to plugins by name
#[async_trait]
pub trait ChannelFactory: Send + Sync {
    /// Open a fresh channel to `plugin` (the URI scheme up to the first `+`)
    async fn open(&self, plugin: &str) -> Result<Box<dyn Channel>>;

    /// Plugin names this factory can currently reach
    async fn list(&self) -> Result<Vec<String>>;
}
