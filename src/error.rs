//! Error types for socksproxy
//!
//! This module defines the custom error types used throughout the proxy.

use std::io;
use thiserror::Error;

/// Main error type for proxy operations
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Handshake negotiation error
    #[error("Handshake error: {0}")]
    Handshake(#[from] HandshakeError),

    /// Outbound connection to the requested target failed
    #[error("dial to [{target}] failed: {source}")]
    Dial {
        /// The `host:port` that was dialed
        target: String,
        /// Underlying cause
        #[source]
        source: io::Error,
    },
}

/// Failures while negotiating a SOCKS4, SOCKS4a or SOCKS5 handshake.
///
/// Every variant aborts the connection without a reply.
#[derive(Error, Debug)]
pub enum HandshakeError {
    /// Reading from the client failed
    #[error("read error: {0}")]
    Read(#[source] io::Error),

    /// Writing the method acknowledgement to the client failed
    #[error("write error: {0}")]
    Write(#[source] io::Error),

    /// Client closed the connection before sending anything
    #[error("connection closed before handshake")]
    EmptyRead,

    /// SOCKS5 command request was missing or shorter than the minimum
    #[error("invalid command request ({0} bytes)")]
    InvalidCommandRequest(usize),

    /// Leading byte is neither SOCKS4 nor SOCKS5, or the request is too short
    #[error("unsupported version: {0} or invalid request")]
    UnsupportedVersion(u8),

    /// Command other than CONNECT
    #[error("unsupported command: {0}")]
    UnsupportedCommand(u8),

    /// SOCKS5 ATYP not one of IPv4, domain, IPv6
    #[error("unsupported address type: {0}")]
    UnsupportedAddressType(u8),

    /// Request shorter than its address type requires
    #[error("truncated request: need {needed} bytes, got {got}")]
    Truncated {
        /// Minimum number of bytes for this request
        needed: usize,
        /// Number of bytes received
        got: usize,
    },

    /// SOCKS4 user-id is not NUL terminated within the received bytes
    #[error("socks4 user-id is not terminated")]
    MissingUserIdTerminator,

    /// SOCKS4a domain is not NUL terminated
    #[error("socks4a domain is not terminated")]
    MissingDomainTerminator,

    /// SOCKS4a domain is present but empty
    #[error("socks4a domain is empty")]
    EmptyDomain,

    /// Domain bytes are not valid UTF-8
    #[error("domain is not valid UTF-8")]
    InvalidDomain,
}
