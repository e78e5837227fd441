//! # N2K Bridge
//!
//! Turn engine, tank and temperature readings into periodic NMEA 2000
//! messages.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load the TOML configuration (first argument, default `config/default.toml`)
//!    - Set up logging with tracing subscriber (and a rolling file if configured)
//!    - Open the transport and build one encoder per enabled section
//!
//! 2. **Main Loop**
//!    - Read `<path> <value>` readings from stdin into the encoder fields
//!    - Transmit every encoder on its own cadence, fresh data or not
//!    - Log throughput every `stats_interval_s`
//!    - Handle Ctrl+C for graceful shutdown
//!
//! # Examples
//!
//! ```bash
//! echo "engine.0.speed 1500" | RUST_LOG=debug cargo run --release -- config/default.toml
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tokio::task::LocalSet;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use n2k_bridge::bridge::Bridge;
use n2k_bridge::clock::TokioClock;
use n2k_bridge::config::{Config, LoggingConfig, TransportConfig, TransportKind};
use n2k_bridge::encoders::Scheduler;
use n2k_bridge::input;
use n2k_bridge::runner::{self, RunOptions};
use n2k_bridge::transport::jsonl::JsonlTransport;
use n2k_bridge::transport::{LogTransport, Transport};

/// Used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// How long a pending stdin read may hold up process exit
const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    let _log_guard = init_logging(&config.logging);

    info!("N2K Bridge v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from {}", config_path.display());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;

    let result = runtime.block_on(serve(config));

    // The stdin reader blocks on its own thread; do not wait for it.
    runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);

    let sent = result?;
    info!("Total messages sent: {}", sent);
    Ok(())
}

/// Build the encoders and run until Ctrl+C
async fn serve(config: Config) -> Result<u64> {
    let mut transport = open_transport(&config.transport)?;
    let mut scheduler = Scheduler::new(TokioClock::shared());

    let bridge = Bridge::build(&config, &mut scheduler).context("Failed to build encoders")?;
    let inputs = bridge.into_inputs();

    let local = LocalSet::new();
    if config.input.stdin {
        info!("Reading sensor input from stdin ({} paths)", inputs.len());
        local.spawn_local(async move {
            if let Err(e) = input::pump(BufReader::new(tokio::io::stdin()), &inputs).await {
                warn!("Input feed failed: {}", e);
            }
        });
    }

    info!("Press Ctrl+C to exit");
    let options = RunOptions::from(&config.runner);
    let sent = local
        .run_until(runner::run(&mut scheduler, transport.as_mut(), options, shutdown_signal()))
        .await;

    Ok(sent)
}

/// Resolve on Ctrl+C
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down..."),
        Err(e) => warn!("Cannot listen for Ctrl+C ({}), shutting down", e),
    }
}

/// Open the configured transport
fn open_transport(config: &TransportConfig) -> Result<Box<dyn Transport>> {
    match config.kind {
        TransportKind::Log => {
            info!("Logging messages at debug level (set RUST_LOG=n2k_bridge=debug to see them)");
            Ok(Box::new(LogTransport::new()))
        }
        TransportKind::Jsonl => {
            let path = config
                .path
                .as_deref()
                .context("transport path is required for kind = \"jsonl\"")?;
            let transport = JsonlTransport::open(path)
                .with_context(|| format!("Failed to open capture file {}", path.display()))?;
            Ok(Box::new(transport))
        }
    }
}

/// Console logging, plus a daily rolling file when a directory is configured.
///
/// The returned guard flushes the file writer when dropped.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_path() {
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
    }

    #[test]
    fn test_open_log_transport() {
        let config = TransportConfig {
            kind: TransportKind::Log,
            path: None,
        };
        assert!(open_transport(&config).is_ok());
    }

    #[test]
    fn test_open_jsonl_transport() {
        let dir = tempdir().unwrap();
        let config = TransportConfig {
            kind: TransportKind::Jsonl,
            path: Some(dir.path().join("capture.jsonl")),
        };
        assert!(open_transport(&config).is_ok());
        assert!(dir.path().join("capture.jsonl").exists());
    }

    #[test]
    fn test_jsonl_transport_without_path() {
        let config = TransportConfig {
            kind: TransportKind::Jsonl,
            path: None,
        };
        assert!(open_transport(&config).is_err());
    }
}
