//! SOCKS reply frames
//!
//! Builds the acknowledgement frames sent to the client. Failure replies are
//! never sent: a failed negotiation or dial just closes the connection.

use crate::socks::consts::*;
use crate::socks::types::ConnectionRequest;
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// SOCKS5 method selection reply: version 5, no authentication required
pub fn method_ack() -> [u8; 2] {
    [SOCKS5_VERSION, SOCKS5_AUTH_METHOD_NONE]
}

/// SOCKS4 / SOCKS4a "request granted" reply
///
/// ```text
/// +----+----+---------+---------+
/// | VN | CD | DSTPORT |  DSTIP  |
/// +----+----+---------+---------+
/// | 0  | 5A |    2    |    4    |
/// +----+----+---------+---------+
/// ```
pub fn socks4_granted(port: u16, bound: Option<Ipv4Addr>) -> [u8; 8] {
    let port = port.to_be_bytes();
    let ip = bound.unwrap_or(Ipv4Addr::UNSPECIFIED).octets();
    [
        SOCKS4_REPLY_VERSION,
        SOCKS4_REPLY_GRANTED,
        port[0],
        port[1],
        ip[0],
        ip[1],
        ip[2],
        ip[3],
    ]
}

/// SOCKS5 success reply, always reporting `0.0.0.0:0` as the bound address
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 5  |  0  |   0   |  1   | 0.0.0.0  |    0     |
/// +----+-----+-------+------+----------+----------+
/// ```
pub fn socks5_succeeded() -> [u8; 10] {
    [
        SOCKS5_VERSION,
        SOCKS5_REPLY_SUCCEEDED,
        SOCKS5_RESERVED,
        SOCKS5_ADDR_TYPE_IPV4,
        0,
        0,
        0,
        0,
        0,
        0,
    ]
}

/// Variant-correct success reply for a dialed request.
///
/// `target_ip` is the address of the dialed connection; SOCKS4 replies carry
/// it when it is IPv4.
pub fn success_reply(request: &ConnectionRequest, target_ip: Option<IpAddr>) -> Vec<u8> {
    if request.variant.is_legacy() {
        let bound = match target_ip {
            Some(IpAddr::V4(ip)) => Some(ip),
            _ => None,
        };
        socks4_granted(request.port, bound).to_vec()
    } else {
        socks5_succeeded().to_vec()
    }
}

/// Send the success reply for `request`
pub async fn send_success<S>(
    stream: &mut S,
    request: &ConnectionRequest,
    target_ip: Option<IpAddr>,
) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(&success_reply(request, target_ip)).await?;
    stream.flush().await
}
