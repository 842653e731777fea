//! Test utilities for socksproxy integration tests
//!
//! Loopback listeners, an echo target, a running proxy, and raw request
//! builders for each SOCKS variant.

#![allow(dead_code)]

use socksproxy::config::Config;
use socksproxy::dial::TcpDialer;
use socksproxy::server::serve;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// A loopback port with nothing listening on it
pub async fn unreachable_addr() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    drop(listener);
    addr
}

/// Spawn a target that echoes everything back on every connection
pub async fn spawn_echo_target() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut reader, mut writer) = stream.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
            });
        }
    });
    addr
}

/// Spawn a target that writes `greeting` to the first connection and closes it
pub async fn spawn_greeting_target(greeting: &'static [u8]) -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            let _ = stream.write_all(greeting).await;
        }
    });
    addr
}

/// A proxy serving on a loopback port
pub struct TestProxy {
    /// Address clients connect to
    pub addr: SocketAddr,
    shutdown_tx: broadcast::Sender<bool>,
}

impl TestProxy {
    /// Start a proxy with a short dial timeout
    pub async fn start() -> Self {
        Self::start_with(Config {
            address: "127.0.0.1".to_string(),
            port: 0,
            timeout: 2,
            debug: true,
            ..Default::default()
        })
        .await
    }

    /// Start a proxy with `config`, ignoring its listen address
    pub async fn start_with(config: Config) -> Self {
        let (listener, addr) = create_test_listener().await;
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        tokio::spawn(serve(
            listener,
            Arc::new(config),
            Arc::new(TcpDialer::default()),
            shutdown_rx,
        ));
        TestProxy { addr, shutdown_tx }
    }

    /// Open a raw client connection to the proxy
    pub async fn connect(&self) -> TcpStream {
        TcpStream::connect(self.addr).await.unwrap()
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Raw SOCKS request builders
pub mod socks_mock {
    use std::net::SocketAddr;

    /// SOCKS4 CONNECT to an IPv4 address
    pub fn socks4_connect(addr: SocketAddr, user_id: &[u8]) -> Vec<u8> {
        let ip = match addr {
            SocketAddr::V4(v4) => v4.ip().octets(),
            SocketAddr::V6(_) => panic!("SOCKS4 needs an IPv4 target"),
        };
        let mut request = vec![0x04, 0x01];
        request.extend_from_slice(&addr.port().to_be_bytes());
        request.extend_from_slice(&ip);
        request.extend_from_slice(user_id);
        request.push(0x00);
        request
    }

    /// SOCKS4a CONNECT to a domain
    pub fn socks4a_connect(domain: &str, port: u16) -> Vec<u8> {
        let mut request = vec![0x04, 0x01];
        request.extend_from_slice(&port.to_be_bytes());
        request.extend_from_slice(&[0, 0, 0, 1]);
        request.push(0x00);
        request.extend_from_slice(domain.as_bytes());
        request.push(0x00);
        request
    }

    /// SOCKS5 method selection offering only no-auth
    pub fn socks5_greeting() -> Vec<u8> {
        vec![0x05, 0x01, 0x00]
    }

    /// SOCKS5 CONNECT to an IPv4 address
    pub fn socks5_connect_ipv4(addr: SocketAddr) -> Vec<u8> {
        let ip = match addr {
            SocketAddr::V4(v4) => v4.ip().octets(),
            SocketAddr::V6(_) => panic!("expected an IPv4 target"),
        };
        let mut request = vec![0x05, 0x01, 0x00, 0x01];
        request.extend_from_slice(&ip);
        request.extend_from_slice(&addr.port().to_be_bytes());
        request
    }

    /// SOCKS5 CONNECT to a domain
    pub fn socks5_connect_domain(domain: &str, port: u16) -> Vec<u8> {
        let mut request = vec![0x05, 0x01, 0x00, 0x03, domain.len() as u8];
        request.extend_from_slice(domain.as_bytes());
        request.extend_from_slice(&port.to_be_bytes());
        request
    }
}

/// Run a SOCKS5 no-auth handshake for `command` and return the reply
pub async fn socks5_handshake(stream: &mut TcpStream, command: &[u8]) -> [u8; 10] {
    stream.write_all(&socks_mock::socks5_greeting()).await.unwrap();
    let mut ack = [0u8; 2];
    stream.read_exact(&mut ack).await.unwrap();
    assert_eq!(ack, [0x05, 0x00]);

    stream.write_all(command).await.unwrap();
    let mut reply = [0u8; 10];
    stream.read_exact(&mut reply).await.unwrap();
    reply
}

/// Run a SOCKS4 / SOCKS4a handshake and return the reply
pub async fn socks4_handshake(stream: &mut TcpStream, request: &[u8]) -> [u8; 8] {
    stream.write_all(request).await.unwrap();
    let mut reply = [0u8; 8];
    stream.read_exact(&mut reply).await.unwrap();
    reply
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_test_listener() {
        let (listener, addr) = create_test_listener().await;
        assert!(addr.port() > 0);
        drop(listener);
    }

    #[test]
    fn test_socks_mock_socks4a() {
        let request = socks_mock::socks4a_connect("localhost", 8080);
        assert_eq!(
            request,
            vec![
                0x04, 0x01, 0x1F, 0x90, 0x00, 0x00, 0x00, 0x01, 0x00, 0x6C, 0x6F, 0x63, 0x61, 0x6C,
                0x68, 0x6F, 0x73, 0x74, 0x00
            ]
        );
    }

    #[test]
    fn test_socks_mock_socks5_ipv4() {
        let request = socks_mock::socks5_connect_ipv4("127.0.0.1:8080".parse().unwrap());
        assert_eq!(
            request,
            vec![0x05, 0x01, 0x00, 0x01, 0x7F, 0x00, 0x00, 0x01, 0x1F, 0x90]
        );
    }
}
