//! Handshake negotiator
//!
//! Detects the protocol variant from the first bytes a client sends and
//! extracts the requested destination. The flow is an explicit state
//! machine driven one transition at a time by [`Negotiator::step`]:
//!
//! ```text
//! AwaitingFirstRead ─┬─ 0x05 ─> Socks5AuthAck ─> AwaitingCommand ─┐
//!                    └─ else ─> ParsingLegacyRequest ─────────────┴─> Parsed
//! ```
//!
//! No transition re-enters an earlier state and every failure aborts the
//! negotiation without a reply.

use crate::error::HandshakeError;
use crate::socks::consts::*;
use crate::socks::reply::method_ack;
use crate::socks::types::{format_ipv4, format_ipv6, port_from_bytes, ConnectionRequest, Variant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Fixed-capacity scratch buffer holding the latest client read.
///
/// Owned by a single connection for the duration of its handshake.
pub struct HandshakeBuffer {
    data: [u8; HANDSHAKE_BUFFER_SIZE],
    len: usize,
}

impl HandshakeBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        HandshakeBuffer {
            data: [0u8; HANDSHAKE_BUFFER_SIZE],
            len: 0,
        }
    }

    /// Replace the contents with a single read from `stream`
    pub async fn fill_from<S>(&mut self, stream: &mut S) -> std::io::Result<usize>
    where
        S: AsyncRead + Unpin,
    {
        self.len = 0;
        self.len = stream.read(&mut self.data).await?;
        Ok(self.len)
    }

    /// Bytes received by the latest read
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Number of bytes received by the latest read
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the latest read returned nothing
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for HandshakeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Negotiation states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationState {
    /// Nothing read from the client yet
    AwaitingFirstRead,
    /// First byte was 0x05; the method acknowledgement is due
    Socks5AuthAck,
    /// Acknowledged; waiting for the SOCKS5 command request
    AwaitingCommand,
    /// The first read holds a complete SOCKS4 / SOCKS4a request
    ParsingLegacyRequest,
    /// Destination extracted
    Parsed(ConnectionRequest),
}

impl NegotiationState {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, NegotiationState::Parsed(_))
    }
}

/// Drives the handshake on one client stream
pub struct Negotiator<'a, S> {
    stream: &'a mut S,
    buffer: HandshakeBuffer,
}

impl<'a, S> Negotiator<'a, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a negotiator over `stream`
    pub fn new(stream: &'a mut S) -> Self {
        Negotiator {
            stream,
            buffer: HandshakeBuffer::new(),
        }
    }

    /// Run the state machine until the request is parsed
    pub async fn run(mut self) -> Result<ConnectionRequest, HandshakeError> {
        let mut state = NegotiationState::AwaitingFirstRead;
        loop {
            state = match state {
                NegotiationState::Parsed(request) => return Ok(request),
                state => self.step(state).await?,
            };
        }
    }

    /// Perform the single transition out of `state`
    pub async fn step(
        &mut self,
        state: NegotiationState,
    ) -> Result<NegotiationState, HandshakeError> {
        trace!("Negotiation state: {:?}", state);

        match state {
            NegotiationState::AwaitingFirstRead => {
                let n = self
                    .buffer
                    .fill_from(&mut *self.stream)
                    .await
                    .map_err(HandshakeError::Read)?;
                if n == 0 {
                    return Err(HandshakeError::EmptyRead);
                }

                if self.buffer.as_slice()[0] == SOCKS5_VERSION {
                    Ok(NegotiationState::Socks5AuthAck)
                } else {
                    Ok(NegotiationState::ParsingLegacyRequest)
                }
            }

            // Offered methods are ignored; no-auth is always selected.
            NegotiationState::Socks5AuthAck => {
                self.stream
                    .write_all(&method_ack())
                    .await
                    .map_err(HandshakeError::Write)?;
                self.stream.flush().await.map_err(HandshakeError::Write)?;
                Ok(NegotiationState::AwaitingCommand)
            }

            NegotiationState::AwaitingCommand => {
                let n = self
                    .buffer
                    .fill_from(&mut *self.stream)
                    .await
                    .map_err(HandshakeError::Read)?;
                if n < SOCKS5_MIN_COMMAND_LEN {
                    return Err(HandshakeError::InvalidCommandRequest(n));
                }
                parse_request(self.buffer.as_slice()).map(NegotiationState::Parsed)
            }

            NegotiationState::ParsingLegacyRequest => {
                parse_request(self.buffer.as_slice()).map(NegotiationState::Parsed)
            }

            NegotiationState::Parsed(request) => Ok(NegotiationState::Parsed(request)),
        }
    }
}

/// Negotiate a handshake on `stream` and return the requested destination
pub async fn negotiate<S>(stream: &mut S) -> Result<ConnectionRequest, HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    Negotiator::new(stream).run().await
}

/// Parse a complete SOCKS4, SOCKS4a or SOCKS5 CONNECT request.
///
/// The leading byte selects the layout. Only CONNECT is accepted.
pub fn parse_request(buf: &[u8]) -> Result<ConnectionRequest, HandshakeError> {
    let n = buf.len();

    match buf.first() {
        None => Err(HandshakeError::EmptyRead),
        Some(&SOCKS4_VERSION) if n > SOCKS4_HEADER_LEN => {
            check_command(buf[1])?;
            parse_socks4(buf)
        }
        Some(&SOCKS5_VERSION) if n > SOCKS5_HEADER_LEN + 1 => {
            check_command(buf[1])?;
            parse_socks5(buf)
        }
        Some(&version) => Err(HandshakeError::UnsupportedVersion(version)),
    }
}

fn check_command(cmd: u8) -> Result<(), HandshakeError> {
    if cmd == CMD_CONNECT {
        Ok(())
    } else {
        Err(HandshakeError::UnsupportedCommand(cmd))
    }
}

/// SOCKS4 / SOCKS4a
///
/// ```text
/// +----+----+---------+-------+----------+------------------+
/// | VN | CD | DSTPORT | DSTIP |  USERID  |    DSTDOMAIN     |
/// +----+----+---------+-------+----------+------------------+
/// | 1  | 1  |    2    |   4   | var, NUL | var, NUL (4a)    |
/// +----+----+---------+-------+----------+------------------+
/// ```
fn parse_socks4(buf: &[u8]) -> Result<ConnectionRequest, HandshakeError> {
    let port = port_from_bytes(buf[2], buf[3]);

    let user_id = &buf[SOCKS4_HEADER_LEN..];
    let user_end = user_id
        .iter()
        .position(|&b| b == 0)
        .ok_or(HandshakeError::MissingUserIdTerminator)?;
    let trailing = &user_id[user_end + 1..];

    if trailing.is_empty() {
        let host = format_ipv4([buf[4], buf[5], buf[6], buf[7]]);
        return Ok(ConnectionRequest::new(Variant::Socks4, host, port));
    }

    let domain_end = trailing
        .iter()
        .position(|&b| b == 0)
        .ok_or(HandshakeError::MissingDomainTerminator)?;
    if domain_end == 0 {
        return Err(HandshakeError::EmptyDomain);
    }

    let host = domain_from_bytes(&trailing[..domain_end])?;
    Ok(ConnectionRequest::new(Variant::Socks4a, host, port))
}

/// SOCKS5
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// The port is read from the last two bytes received.
fn parse_socks5(buf: &[u8]) -> Result<ConnectionRequest, HandshakeError> {
    let n = buf.len();
    let addr = &buf[SOCKS5_HEADER_LEN..];

    let host = match buf[3] {
        SOCKS5_ADDR_TYPE_IPV4 => {
            require_len(n, SOCKS5_HEADER_LEN + 4 + 2)?;
            format_ipv4([addr[0], addr[1], addr[2], addr[3]])
        }
        SOCKS5_ADDR_TYPE_DOMAIN => {
            let len = addr[0] as usize;
            require_len(n, SOCKS5_HEADER_LEN + 1 + len + 2)?;
            if len == 0 {
                return Err(HandshakeError::EmptyDomain);
            }
            domain_from_bytes(&addr[1..1 + len])?
        }
        SOCKS5_ADDR_TYPE_IPV6 => {
            require_len(n, SOCKS5_HEADER_LEN + 16 + 2)?;
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&addr[..16]);
            format_ipv6(octets)
        }
        other => return Err(HandshakeError::UnsupportedAddressType(other)),
    };

    let port = port_from_bytes(buf[n - 2], buf[n - 1]);
    Ok(ConnectionRequest::new(Variant::Socks5, host, port))
}

/// Domain bytes are kept as sent, not checked as a hostname. Only UTF-8
/// is required since the host is carried as text.
fn domain_from_bytes(bytes: &[u8]) -> Result<String, HandshakeError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| HandshakeError::InvalidDomain)
}

fn require_len(got: usize, needed: usize) -> Result<(), HandshakeError> {
    if got < needed {
        Err(HandshakeError::Truncated { needed, got })
    } else {
        Ok(())
    }
}
