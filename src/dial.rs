//! Outbound dialing
//!
//! The [`Dialer`] trait is the seam between a negotiated request and the
//! target connection. [`TcpDialer`] is the production implementation.

use crate::config::TcpConfig;
use async_trait::async_trait;
use std::fmt::Debug;
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;

/// Socket options for configuring connections
#[derive(Debug, Clone)]
pub struct SocketOpts {
    /// Enable TCP_NODELAY
    pub nodelay: bool,
    /// TCP keepalive timeout
    pub keepalive_secs: Option<u64>,
    /// TCP keepalive interval
    pub keepalive_interval: Option<u64>,
}

impl Default for SocketOpts {
    fn default() -> Self {
        SocketOpts::from_tcp_config(&TcpConfig::default())
    }
}

impl SocketOpts {
    /// Create socket options from TCP config; a zero keepalive disables it
    pub fn from_tcp_config(config: &TcpConfig) -> Self {
        let keepalive = config.keepalive_secs > 0;
        SocketOpts {
            nodelay: config.nodelay,
            keepalive_secs: keepalive.then_some(config.keepalive_secs),
            keepalive_interval: keepalive.then_some(config.keepalive_interval),
        }
    }

    /// Apply socket options to a TCP stream
    pub fn apply(&self, stream: &TcpStream) -> io::Result<()> {
        stream.set_nodelay(self.nodelay)?;

        if let (Some(timeout), Some(interval)) = (self.keepalive_secs, self.keepalive_interval) {
            let socket = socket2::SockRef::from(stream);
            let keepalive = socket2::TcpKeepalive::new()
                .with_time(Duration::from_secs(timeout))
                .with_interval(Duration::from_secs(interval));
            socket.set_tcp_keepalive(&keepalive)?;
        }

        Ok(())
    }
}

/// Opens the outbound connection for a negotiated request.
///
/// Called exactly once per successfully parsed request and never retried.
#[async_trait]
pub trait Dialer: Debug + Send + Sync {
    /// Connect to `target` (`host:port`), giving up after `timeout`
    async fn dial(&self, target: &str, timeout: Duration) -> io::Result<TcpStream>;
}

/// Dials targets over plain TCP, resolving hostnames through the system resolver
#[derive(Debug, Clone, Default)]
pub struct TcpDialer {
    socket_opts: SocketOpts,
}

impl TcpDialer {
    /// Create a dialer applying `socket_opts` to every connection
    pub fn new(socket_opts: SocketOpts) -> Self {
        TcpDialer { socket_opts }
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    async fn dial(&self, target: &str, timeout: Duration) -> io::Result<TcpStream> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(target))
            .await
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect timed out after {:?}", timeout),
                )
            })??;

        if let Err(e) = self.socket_opts.apply(&stream) {
            tracing::warn!("Failed to apply socket options to {}: {}", target, e);
        }

        tracing::debug!("TCP connection established to {}", target);

        Ok(stream)
    }
}
