//! Connection & Plugin Lifecycle
//!
//! A [`Connection`] owns one session with one plugin process. It is created
//! by [`Connector::connect`], which parses the URI, opens the plugin's
//! channel and performs the registration handshake, and it ends with
//! [`Connection::close`].
//!
//! Only one request is ever outstanding on a session. Concurrent callers
//! sharing a `Connection` are queued on the session lock rather than
//! interleaved on the wire.

pub mod discovery;
pub mod uri;

pub use discovery::{available_plugins, available_plugins_with};
pub use uri::PluginUri;

use crate::config::{ClientConfig, JobPollConfig};
use crate::domain::ChannelFactory;
use crate::error::{Error, ErrorDetail, Result};
use crate::job::{FreedJobs, JobEntry};
use crate::metrics::RpcMetrics;
use crate::transport::{Transport, UdsChannelFactory};
use crate::value::{Object, Value};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

// =============================================================================
// Connector
// =============================================================================

/// Builds connections with shared configuration, channel factory and metrics
#[derive(Clone)]
pub struct Connector {
    config: ClientConfig,
    factory: Arc<dyn ChannelFactory>,
    metrics: Option<Arc<RpcMetrics>>,
}

impl Connector {
    /// Connector opening Unix sockets under `config.ipc_dir`
    pub fn new(config: ClientConfig) -> Self {
        let factory = Arc::new(UdsChannelFactory::new(config.ipc_dir.clone()));
        Self {
            config,
            factory,
            metrics: None,
        }
    }

    /// Replace the channel factory
    pub fn with_channel_factory(mut self, factory: Arc<dyn ChannelFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Record call metrics for every connection made by this connector
    pub fn with_metrics(mut self, metrics: Arc<RpcMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn factory(&self) -> &Arc<dyn ChannelFactory> {
        &self.factory
    }

    /// Connect to the plugin selected by `uri` and register the session.
    ///
    /// `timeout_ms` bounds every request on the connection, including the
    /// handshake. It must be greater than zero.
    pub async fn connect(
        &self,
        uri: &str,
        password: Option<&str>,
        timeout_ms: u32,
    ) -> Result<Connection> {
        if uri.is_empty() {
            return Err(Error::argument("URI must not be empty"));
        }
        if timeout_ms == 0 {
            return Err(Error::argument("timeout must be greater than zero"));
        }

        let parsed = PluginUri::parse(uri)?;
        let conn = self.open(parsed, uri, timeout_ms).await?;

        let params = Value::object([
            ("uri", Value::from(uri)),
            ("password", Value::from(password)),
            ("timeout", Value::from(timeout_ms)),
            ("flags", Value::from(0u8)),
        ]);
        // A failed handshake drops `conn`, closing the channel
        conn.call("plugin_register", params).await?;

        info!(
            "Connected to plugin {} (timeout {} ms)",
            conn.plugin_name(),
            timeout_ms
        );
        Ok(conn)
    }

    /// Open an unregistered session, used for probing plugins
    pub(crate) async fn open(
        &self,
        uri: PluginUri,
        raw_uri: &str,
        timeout_ms: u32,
    ) -> Result<Connection> {
        let channel = self.factory.open(uri.plugin_name()).await?;
        let transport = Transport::new(channel, self.config.max_frame_bytes)
            .with_metrics(self.metrics.clone());
        debug!("Opened session channel to {}", uri.plugin_name());

        Ok(Connection {
            uri,
            raw_uri: raw_uri.to_string(),
            timeout_ms: AtomicU32::new(timeout_ms),
            session: tokio::sync::Mutex::new(Some(transport)),
            last_error: Mutex::new(None),
            jobs: DashMap::new(),
            freed_jobs: Mutex::new(FreedJobs::default()),
            job_poll: self.config.job_poll.clone(),
        })
    }
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("config", &self.config)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

// =============================================================================
// Connection
// =============================================================================

/// Live session with a plugin
pub struct Connection {
    uri: PluginUri,
    raw_uri: String,
    timeout_ms: AtomicU32,
    /// `None` once the session has failed irrecoverably
    session: tokio::sync::Mutex<Option<Transport>>,
    last_error: Mutex<Option<ErrorDetail>>,
    /// Jobs handed out by this connection
    pub(crate) jobs: DashMap<String, JobEntry>,
    pub(crate) freed_jobs: Mutex<FreedJobs>,
    pub(crate) job_poll: JobPollConfig,
}

impl Connection {
    /// Connect using [`ClientConfig::from_env`]
    pub async fn connect(uri: &str, password: Option<&str>, timeout_ms: u32) -> Result<Self> {
        Connector::new(ClientConfig::from_env())
            .connect(uri, password, timeout_ms)
            .await
    }

    pub fn uri(&self) -> &PluginUri {
        &self.uri
    }

    /// URI exactly as passed to `connect`
    pub fn raw_uri(&self) -> &str {
        &self.raw_uri
    }

    pub fn plugin_name(&self) -> &str {
        self.uri.plugin_name()
    }

    /// Timeout applied to each request, as last set on this connection
    pub fn local_timeout_ms(&self) -> u32 {
        self.timeout_ms.load(Ordering::Relaxed)
    }

    /// Detail of the most recent failed operation, cleared when the next one starts
    pub fn last_error(&self) -> Option<ErrorDetail> {
        self.last_error.lock().clone()
    }

    /// Whether the session survived every call so far
    pub async fn is_usable(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Set the plugin-side timeout and the local per-request timeout
    pub async fn set_timeout(&self, timeout_ms: u32) -> Result<()> {
        self.tracked(async {
            if timeout_ms == 0 {
                return Err(Error::argument("timeout must be greater than zero"));
            }
            self.rpc("time_out_set", [("ms", Value::from(timeout_ms))])
                .await?;
            self.timeout_ms.store(timeout_ms, Ordering::Relaxed);
            Ok(())
        })
        .await
    }

    /// Timeout currently in effect on the plugin side
    pub async fn timeout(&self) -> Result<u32> {
        self.tracked(async {
            let value = self.rpc("time_out_get", []).await?;
            value.as_u32().map_err(|e| Error::Serialization(e.to_string()))
        })
        .await
    }

    /// Ask the plugin to shut the session down, then release it.
    ///
    /// The local session is released whether or not the shutdown request
    /// succeeds; its outcome is returned for information only.
    pub async fn close(self) -> Result<()> {
        let timeout = Duration::from_millis(u64::from(self.local_timeout_ms()));
        let mut session = self.session.lock().await;
        let result = match session.as_mut() {
            Some(transport) => transport
                .call("shutdown", flags_only(), timeout)
                .await
                .map(|_| ()),
            None => Err(Error::InvalidConnection),
        };
        *session = None;

        match &result {
            Ok(()) => info!("Closed connection to plugin {}", self.uri.plugin_name()),
            Err(e) => warn!(
                "Shutdown of plugin {} failed, session released anyway: {}",
                self.uri.plugin_name(),
                e
            ),
        }
        result
    }

    // =========================================================================
    // Call plumbing
    // =========================================================================

    /// Run one public operation: clear the last-error slot, run it, record
    /// any failure.
    pub(crate) async fn tracked<T, F>(&self, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        *self.last_error.lock() = None;
        let result = op.await;
        if let Err(e) = &result {
            *self.last_error.lock() = Some(ErrorDetail::from(e));
        }
        result
    }

    /// Issue `method` with `params` plus `flags = 0`
    pub(crate) async fn rpc<const N: usize>(
        &self,
        method: &str,
        params: [(&str, Value); N],
    ) -> Result<Value> {
        let mut map = Object::with_capacity(N + 1);
        for (key, value) in params {
            map.insert(key.to_string(), value);
        }
        map.insert("flags".to_string(), Value::from(0u8));
        self.call(method, Value::Object(map)).await
    }

    /// Issue a raw request on the session
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let timeout = Duration::from_millis(u64::from(self.local_timeout_ms()));
        let mut session = self.session.lock().await;
        let transport = session.as_mut().ok_or(Error::InvalidConnection)?;

        let result = transport.call(method, params, timeout).await;
        if let Err(e) = &result {
            if matches!(e, Error::Communication(_) | Error::Timeout { .. }) {
                warn!(
                    "Dropping session to plugin {} after {}",
                    self.uri.plugin_name(),
                    e
                );
                *session = None;
            }
        }
        result
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("uri", &self.uri)
            .field("timeout_ms", &self.local_timeout_ms())
            .field("jobs", &self.jobs.len())
            .finish()
    }
}

fn flags_only() -> Value {
    Value::object([("flags", Value::from(0u8))])
}
