//! Storage Management CLI
//!
//! Small inspection tool built on the client library. Lists the plugins
//! installed in the IPC directory and dumps a plugin's inventory as JSON.
//!
//! ```text
//! storage-mgmt plugins
//! storage-mgmt --uri sim:// pools
//! LSMCLI_PASSWORD=... storage-mgmt --uri ontap+ssl://admin@filer volumes
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storage_mgmt_client::{available_plugins, ClientConfig, Connection, Connector, RpcMetrics};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Storage Management CLI - query storage array plugins
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Plugin URI, e.g. `sim://` or `ontap+ssl://user@host`
    #[arg(long, env = "LSMCLI_URI", default_value = "sim://")]
    uri: String,

    /// Plugin password
    #[arg(long, env = "LSMCLI_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Plugin timeout in milliseconds
    #[arg(long, env = "LSMCLI_TIMEOUT", default_value = "30000")]
    timeout_ms: u32,

    /// YAML client configuration file
    #[arg(long, env = "LSMCLI_CONFIG")]
    config: Option<PathBuf>,

    /// Print RPC metrics in Prometheus text format on exit
    #[arg(long)]
    metrics: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List installed plugins and their versions
    Plugins {
        /// Separator between description and version
        #[arg(long, default_value = " | ")]
        separator: String,
    },
    /// Plugin description and version
    Info,
    /// Storage systems
    Systems,
    /// Capabilities supported by the first system
    Capabilities,
    /// Storage pools
    Pools,
    /// Volumes
    Volumes,
    /// Physical disks
    Disks,
    /// Host initiators
    Initiators,
    /// Access groups
    AccessGroups,
    /// File systems
    Fs,
    /// Snapshots of a file system
    Snapshots {
        /// File system id
        fs_id: String,
    },
    /// NFS exports
    Exports,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let config = match &args.config {
        Some(path) => ClientConfig::from_yaml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ClientConfig::from_env(),
    };
    debug!("Client configuration: {:?}", config);

    if let Command::Plugins { separator } = &args.command {
        for entry in available_plugins(&config, separator).await? {
            println!("{}", entry);
        }
        return Ok(());
    }

    let registry = Registry::new();
    let metrics = Arc::new(RpcMetrics::register(&registry)?);

    let conn = Connector::new(config)
        .with_metrics(metrics)
        .connect(&args.uri, args.password.as_deref(), args.timeout_ms)
        .await
        .with_context(|| format!("connecting to {}", args.uri))?;
    info!("Connected to plugin {}", conn.plugin_name());

    let outcome = run(&conn, &args.command).await;
    if let Err(e) = conn.close().await {
        warn!("Plugin did not shut down cleanly: {}", e);
    }

    if args.metrics {
        report_metrics(&registry, &mut std::io::stderr());
    }
    outcome
}

async fn run(conn: &Connection, command: &Command) -> Result<()> {
    match command {
        Command::Plugins { .. } => Ok(()),
        Command::Info => print_json(&conn.plugin_info().await?),
        Command::Systems => print_json(&conn.systems().await?),
        Command::Capabilities => {
            let system = conn
                .systems()
                .await?
                .into_iter()
                .next()
                .context("plugin reports no systems")?;
            let caps = conn.capabilities(&system).await?;
            let names: Vec<&str> = caps.supported().map(|c| c.name()).collect();
            print_json(&names)
        }
        Command::Pools => print_json(&conn.pools().await?),
        Command::Volumes => print_json(&conn.volumes().await?),
        Command::Disks => print_json(&conn.disks().await?),
        Command::Initiators => print_json(&conn.initiators().await?),
        Command::AccessGroups => print_json(&conn.access_groups().await?),
        Command::Fs => print_json(&conn.fs().await?),
        Command::Snapshots { fs_id } => {
            let fs = conn
                .fs()
                .await?
                .into_iter()
                .find(|f| f.id == *fs_id)
                .with_context(|| format!("no file system {}", fs_id))?;
            print_json(&conn.fs_snapshots(&fs).await?)
        }
        Command::Exports => print_json(&conn.exports().await?),
    }
}

/// Write the registry in Prometheus text format; never masks the command's
/// own outcome
fn report_metrics(registry: &Registry, out: &mut impl Write) {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&registry.gather(), &mut buffer) {
        warn!("Could not encode metrics: {}", e);
        return;
    }
    if let Err(e) = out.write_all(&buffer) {
        warn!("Could not write metrics: {}", e);
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // stdout is reserved for command output
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_metrics_report_includes_failed_calls() {
        let registry = Registry::new();
        let metrics = RpcMetrics::register(&registry).unwrap();
        metrics.observe("volumes", Duration::from_millis(3), Some("plugin"));

        let mut out = Vec::new();
        report_metrics(&registry, &mut out);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("storage_mgmt_rpc_calls_total{method=\"volumes\"} 1"));
        let faults = text
            .lines()
            .find(|line| line.starts_with("storage_mgmt_rpc_faults_total{"))
            .unwrap();
        assert!(faults.contains("kind=\"plugin\""));
        assert!(faults.ends_with(" 1"));
    }
}
