//! SOCKS type definitions
//!
//! The parsed result of a handshake plus the address and port formatting
//! helpers shared by the negotiator and the dialer.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Protocol variant detected from the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// SOCKS4 with a literal IPv4 destination
    Socks4,
    /// SOCKS4a with a domain name after the user-id
    Socks4a,
    /// SOCKS5 without authentication
    Socks5,
}

impl Variant {
    /// Whether replies use the 8-byte SOCKS4 frame
    pub fn is_legacy(self) -> bool {
        matches!(self, Variant::Socks4 | Variant::Socks4a)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Socks4 => write!(f, "socks4"),
            Variant::Socks4a => write!(f, "socks4a"),
            Variant::Socks5 => write!(f, "socks5"),
        }
    }
}

/// Destination requested by the client.
///
/// `host` is either a textual domain name, copied verbatim from the request,
/// or an IP literal in its standard textual form. It is never resolved here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    /// Protocol variant the client spoke
    pub variant: Variant,
    /// Hostname or IP literal
    pub host: String,
    /// Destination port
    pub port: u16,
}

impl ConnectionRequest {
    /// Create a new request
    pub fn new(variant: Variant, host: impl Into<String>, port: u16) -> Self {
        ConnectionRequest {
            variant,
            host: host.into(),
            port,
        }
    }

    /// The `host:port` string handed to the dialer
    pub fn target(&self) -> String {
        join_host_port(&self.host, self.port)
    }
}

impl fmt::Display for ConnectionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.variant, self.target())
    }
}

/// Big-endian port from two wire bytes
pub fn port_from_bytes(hi: u8, lo: u8) -> u16 {
    u16::from_be_bytes([hi, lo])
}

/// Dotted-quad text of four wire bytes
pub fn format_ipv4(octets: [u8; 4]) -> String {
    Ipv4Addr::from(octets).to_string()
}

/// Standard IPv6 text (RFC 5952) of sixteen wire bytes
pub fn format_ipv6(octets: [u8; 16]) -> String {
    Ipv6Addr::from(octets).to_string()
}

/// Join host and port, bracketing hosts that contain a colon
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
