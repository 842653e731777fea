//! socksproxy - SOCKS4 / SOCKS4a / SOCKS5 CONNECT proxy
//!
//! This is the main entry point for the socksproxy application.

use anyhow::Result;
use clap::Parser;
use socksproxy::config::{load_config, Config};
use socksproxy::server::run_server;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// socksproxy - transparent TCP proxy for SOCKS4, SOCKS4a and SOCKS5 clients
#[derive(Parser, Debug)]
#[command(name = "socksproxy")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (built-in defaults when omitted)
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long)]
    json_log: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    setup_logging(&args.log_level, args.json_log)?;

    // Load configuration
    let config = match &args.config {
        Some(path) => {
            let config = load_config(path)?;
            info!("Configuration loaded from: {:?}", path);
            config
        }
        None => {
            info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    info!("socksproxy v{}", socksproxy::VERSION);

    // Setup shutdown signal
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    // Handle Ctrl+C and termination signals (cross-platform)
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {
                            info!("Received Ctrl+C, shutting down...");
                        }
                        _ = sigterm.recv() => {
                            info!("Received SIGTERM, shutting down...");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to setup SIGTERM handler: {}", e);
                    let _ = tokio::signal::ctrl_c().await;
                    info!("Received Ctrl+C, shutting down...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            // On Windows, only handle Ctrl+C
            let _ = tokio::signal::ctrl_c().await;
            info!("Received Ctrl+C, shutting down...");
        }

        let _ = shutdown_tx.send(true);
    });

    // Run the accept loop
    run_server(config, shutdown_rx).await
}

/// Map the `--log-level` flag onto an `EnvFilter` directive
fn level_directive(level: &str) -> &'static str {
    match level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => "info",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `--log-level` when set.
fn setup_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(level)));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive("DEBUG"), "debug");
        assert_eq!(level_directive("warning"), "warn");
        assert_eq!(level_directive("error"), "error");
        assert_eq!(level_directive("verbose"), "info");
    }

    #[test]
    fn test_cli_defaults() {
        let args = Args::parse_from(["socksproxy"]);
        assert!(args.config.is_none());
        assert_eq!(args.log_level, "info");
        assert!(!args.json_log);

        let args = Args::parse_from(["socksproxy", "-l", "trace", "--json-log", "proxy.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("proxy.toml")));
        assert_eq!(args.log_level, "trace");
        assert!(args.json_log);
    }
}
