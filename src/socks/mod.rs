//! SOCKS protocol module
//!
//! Handshake negotiation for SOCKS4, SOCKS4a and SOCKS5 CONNECT requests,
//! the success replies, and the byte relay that follows.

mod consts;
mod handler;
mod negotiator;
mod relay;
mod reply;
mod types;

pub use consts::*;
pub use handler::handle_connection;
pub use negotiator::{negotiate, parse_request, HandshakeBuffer, NegotiationState, Negotiator};
pub use relay::{relay, ProxySession, RelayStats};
pub use reply::{method_ack, send_success, socks4_granted, socks5_succeeded, success_reply};
pub use types::{format_ipv4, format_ipv6, join_host_port, port_from_bytes, ConnectionRequest, Variant};
