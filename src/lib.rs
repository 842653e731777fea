//! # socksproxy - SOCKS4 / SOCKS4a / SOCKS5 CONNECT Proxy
//!
//! socksproxy accepts TCP connections, detects which SOCKS variant the
//! client speaks from its first bytes, dials the requested destination and
//! then relays raw bytes in both directions until either side closes.
//!
//! ## Features
//!
//! - **Variant Detection**: SOCKS4, SOCKS4a and SOCKS5 on the same port
//! - **No-Auth SOCKS5**: Offered methods are ignored and no-auth is selected
//! - **CONNECT Only**: BIND and UDP ASSOCIATE are rejected during negotiation
//! - **Bounded Dial**: Outbound connects give up after the configured timeout
//!
//! ## Usage
//!
//! ```rust,ignore
//! use socksproxy::config::load_config;
//! use socksproxy::server::run_server;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("socksproxy.toml")?;
//!     let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     run_server(config, shutdown_rx).await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Client -> Negotiator -> Dialer -> Target
//!    ^                                 |
//!    +---------- Relay Engine <--------+
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod dial;
pub mod error;
pub mod server;
pub mod socks;

// Re-export commonly used items
pub use config::{load_config, Config};
pub use dial::{Dialer, TcpDialer};
pub use error::{HandshakeError, ProxyError};
pub use server::{run_server, serve};
pub use socks::{handle_connection, ConnectionRequest, Variant};

/// Version of the socksproxy library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
