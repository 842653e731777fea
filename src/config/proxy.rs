//! Proxy configuration
//!
//! Listen address, dial timeout and debug flag. Read once at startup and
//! shared read-only by every connection handler.

use super::TcpConfig;
use crate::error::ProxyError;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Default dial timeout in seconds
fn default_timeout() -> u64 {
    8
}

fn default_debug() -> bool {
    true
}

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Listen address (IP literal or hostname)
    #[serde(default = "default_address", alias = "ip")]
    pub address: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Outbound dial timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Log every negotiated request at info level
    #[serde(default = "default_debug")]
    pub debug: bool,

    /// Socket options for client and target connections
    #[serde(default)]
    pub tcp: TcpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            address: default_address(),
            port: default_port(),
            timeout: default_timeout(),
            debug: default_debug(),
            tcp: TcpConfig::default(),
        }
    }
}

impl Config {
    /// The `address:port` string to bind the listener on
    pub fn listen_addr(&self) -> String {
        match self.address.parse::<IpAddr>() {
            Ok(IpAddr::V6(ip)) => format!("[{}]:{}", ip, self.port),
            _ => format!("{}:{}", self.address, self.port),
        }
    }

    /// Outbound dial timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ProxyError> {
        if self.address.trim().is_empty() {
            return Err(ProxyError::Config("listen address is empty".to_string()));
        }
        if self.timeout == 0 {
            return Err(ProxyError::Config("timeout must be at least 1 second".to_string()));
        }
        Ok(())
    }
}
