//! Per-connection handler
//!
//! Orchestrates one client connection: negotiate the handshake, dial the
//! target, acknowledge, then hand both streams to the relay engine.
//!
//! # Connection Flow
//!
//! ```text
//! AwaitingFirstRead -> (Socks5AuthAck -> AwaitingCommand) | ParsingLegacyRequest
//!     -> ParsedRequest -> Dialing -> Relaying -> Closed
//! ```
//!
//! Every failure converges on `Closed` without sending a reply.

use crate::config::Config;
use crate::dial::Dialer;
use crate::error::ProxyError;
use crate::socks::negotiator::negotiate;
use crate::socks::relay::{ProxySession, RelayStats};
use crate::socks::reply::send_success;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

/// Handle a single client connection from handshake to teardown.
///
/// At most one dial is made, and only after a successful negotiation.
///
/// # Arguments
///
/// * `client` - The accepted client stream
/// * `client_addr` - Peer address of the client, for logging
/// * `dialer` - Opens the outbound connection
/// * `config` - Supplies the dial timeout and debug flag
pub async fn handle_connection<S, D>(
    mut client: S,
    client_addr: SocketAddr,
    dialer: &D,
    config: &Config,
) -> Result<RelayStats>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    D: Dialer + ?Sized,
{
    let request = negotiate(&mut client)
        .await
        .map_err(ProxyError::from)
        .with_context(|| format!("Negotiation with {} failed", client_addr))?;

    let target = request.target();
    if config.debug {
        info!("{} {} ==> {}", request.variant, client_addr, target);
    } else {
        debug!("{} {} ==> {}", request.variant, client_addr, target);
    }

    let server = dialer
        .dial(&target, config.timeout())
        .await
        .map_err(|source| ProxyError::Dial {
            target: target.clone(),
            source,
        })?;

    let target_ip = server.peer_addr().ok().map(|addr| addr.ip());
    send_success(&mut client, &request, target_ip)
        .await
        .with_context(|| format!("Failed to acknowledge {} to {}", request, client_addr))?;

    Ok(ProxySession::new(client, server, config.debug).run().await)
}
