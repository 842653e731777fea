//! Relay engine
//!
//! Copies bytes between the client and the target until one side is done.
//! The target→client direction runs as a spawned task; the client→target
//! direction runs on the caller's task. When the caller's copy returns, the
//! spawned task is aborted and both streams are dropped, which closes them.
//!
//! The spawned task may still be mid-copy when [`ProxySession::run`]
//! returns. Nothing is shared between the two directions, so that is safe.
//! There is no idle timeout: a relay where both peers stay silent lives
//! until TCP keepalive or a peer closes it.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Byte counts of a finished relay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Bytes copied client → target
    pub client_to_target: u64,
    /// Bytes copied target → client, if that direction finished first
    pub target_to_client: Option<u64>,
}

/// An established client/target pair.
///
/// Owns both streams; they are closed when the session ends regardless of
/// which direction finished first.
pub struct ProxySession<C, T> {
    client: C,
    target: T,
    debug: bool,
}

impl<C, T> ProxySession<C, T>
where
    C: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Pair an already-acknowledged client with its dialed target
    pub fn new(client: C, target: T, debug: bool) -> Self {
        ProxySession {
            client,
            target,
            debug,
        }
    }

    /// Relay until the client→target direction reaches EOF or an error
    pub async fn run(self) -> RelayStats {
        let (mut client_read, mut client_write) = tokio::io::split(self.client);
        let (mut target_read, mut target_write) = tokio::io::split(self.target);

        let to_client = tokio::spawn(async move {
            let result = tokio::io::copy(&mut target_read, &mut client_write).await;
            // Let the client see EOF once the target is done sending.
            let _ = client_write.shutdown().await;
            result
        });

        let client_to_target = match tokio::io::copy(&mut client_read, &mut target_write).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("client -> target error: {}", e);
                0
            }
        };

        let target_to_client = if to_client.is_finished() {
            match to_client.await {
                Ok(Ok(bytes)) => Some(bytes),
                Ok(Err(e)) => {
                    debug!("target -> client error: {}", e);
                    None
                }
                Err(_) => None,
            }
        } else {
            to_client.abort();
            None
        };

        let stats = RelayStats {
            client_to_target,
            target_to_client,
        };
        if self.debug {
            info!(
                "Relay finished: {} bytes client -> target, {:?} bytes target -> client",
                stats.client_to_target, stats.target_to_client
            );
        } else {
            debug!(
                "Relay finished: {} bytes client -> target, {:?} bytes target -> client",
                stats.client_to_target, stats.target_to_client
            );
        }
        stats
    }
}

/// Relay between `client` and `target` until the client side is done
pub async fn relay<C, T>(client: C, target: T) -> RelayStats
where
    C: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    ProxySession::new(client, target, false).run().await
}
