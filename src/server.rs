//! Accept loop
//!
//! Binds the listener and spawns one independent handler task per accepted
//! connection. Handler failures stay local to their connection; an accept
//! failure ends the loop with an error.

use crate::config::Config;
use crate::dial::{Dialer, SocketOpts, TcpDialer};
use crate::socks::handle_connection;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Bind `config.listen_addr()` and serve until shutdown
pub async fn run_server(config: Config, shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
    let listener = TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("Failed to listen on {}", config.listen_addr()))?;

    let dialer = Arc::new(TcpDialer::new(SocketOpts::from_tcp_config(&config.tcp)));
    serve(listener, Arc::new(config), dialer, shutdown_rx).await
}

/// Accept connections on `listener` until shutdown or an accept error
pub async fn serve(
    listener: TcpListener,
    config: Arc<Config>,
    dialer: Arc<dyn Dialer>,
    mut shutdown_rx: broadcast::Receiver<bool>,
) -> Result<()> {
    let local_addr = listener
        .local_addr()
        .with_context(|| "Failed to read listener address")?;
    info!("listen at: {}", local_addr);
    info!("timeout: {:?}", config.timeout());
    info!("debug: {}", config.debug);

    let socket_opts = SocketOpts::from_tcp_config(&config.tcp);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, client_addr) = accepted.with_context(|| "Accept failed")?;

                if let Err(e) = socket_opts.apply(&stream) {
                    warn!("Failed to apply socket options to {}: {}", client_addr, e);
                }

                let config = config.clone();
                let dialer = dialer.clone();
                tokio::spawn(async move {
                    match handle_connection(stream, client_addr, dialer.as_ref(), &config).await {
                        Ok(stats) => debug!("Connection from {} closed: {:?}", client_addr, stats),
                        Err(e) => warn!("Connection from {} aborted: {:#}", client_addr, e),
                    }
                });
            }
            _ = shutdown_rx.recv() => {
                info!("Shutdown signal received, stopping accept loop");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn start(
        config: Config,
    ) -> (
        std::net::SocketAddr,
        broadcast::Sender<bool>,
        tokio::task::JoinHandle<Result<()>>,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(serve(
            listener,
            Arc::new(config),
            Arc::new(TcpDialer::default()),
            shutdown_rx,
        ));
        (addr, shutdown_tx, handle)
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let (_, shutdown_tx, handle) = start(Config::default()).await;

        shutdown_tx.send(true).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_serve_survives_bad_client() {
        let (addr, shutdown_tx, handle) = start(Config::default()).await;

        let mut bad = TcpStream::connect(addr).await.unwrap();
        bad.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
        let mut buf = Vec::new();
        let _ = tokio::time::timeout(Duration::from_secs(2), bad.read_to_end(&mut buf))
            .await
            .unwrap();
        assert!(buf.is_empty());

        // The loop still accepts after a failed handshake.
        let mut good = TcpStream::connect(addr).await.unwrap();
        good.write_all(&[0x05, 0x01, 0x00]).await.unwrap();
        let mut ack = [0u8; 2];
        good.read_exact(&mut ack).await.unwrap();
        assert_eq!(ack, [0x05, 0x00]);

        shutdown_tx.send(true).unwrap();
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_run_server_bind_failure() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = occupied.local_addr().unwrap().port();

        let config = Config {
            address: "127.0.0.1".to_string(),
            port,
            ..Default::default()
        };
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let result = run_server(config, shutdown_rx).await;

        assert!(result.is_err());
        assert!(format!("{:#}", result.unwrap_err()).contains("Failed to listen"));
    }
}
