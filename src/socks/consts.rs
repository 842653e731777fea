//! SOCKS protocol constants
//!
//! Wire constants for the SOCKS4, SOCKS4a and SOCKS5 CONNECT handshakes.

/// SOCKS4 / SOCKS4a protocol version
pub const SOCKS4_VERSION: u8 = 0x04;

/// SOCKS5 protocol version
pub const SOCKS5_VERSION: u8 = 0x05;

/// Version byte of a SOCKS4 reply
pub const SOCKS4_REPLY_VERSION: u8 = 0x00;

// Commands
/// CONNECT command (shared by SOCKS4 and SOCKS5)
pub const CMD_CONNECT: u8 = 0x01;
/// BIND command (not implemented)
pub const CMD_BIND: u8 = 0x02;
/// SOCKS5 UDP ASSOCIATE command (not implemented)
pub const CMD_UDP_ASSOCIATE: u8 = 0x03;

// Authentication methods
/// No authentication required
pub const SOCKS5_AUTH_METHOD_NONE: u8 = 0x00;

// Address types
/// IPv4 address
pub const SOCKS5_ADDR_TYPE_IPV4: u8 = 0x01;
/// Domain name
pub const SOCKS5_ADDR_TYPE_DOMAIN: u8 = 0x03;
/// IPv6 address
pub const SOCKS5_ADDR_TYPE_IPV6: u8 = 0x04;

// Reply codes
/// SOCKS5 succeeded
pub const SOCKS5_REPLY_SUCCEEDED: u8 = 0x00;
/// SOCKS4 request granted
pub const SOCKS4_REPLY_GRANTED: u8 = 0x5A;

/// Reserved byte value (always 0x00)
pub const SOCKS5_RESERVED: u8 = 0x00;

// Buffer sizes
/// Capacity of the per-connection handshake buffer
pub const HANDSHAKE_BUFFER_SIZE: usize = 1024;

// Minimum request lengths
/// Shortest SOCKS5 command request accepted from the second read
pub const SOCKS5_MIN_COMMAND_LEN: usize = 7;
/// VN CD DSTPORT DSTIP, followed by the user-id
pub const SOCKS4_HEADER_LEN: usize = 8;
/// VER CMD RSV ATYP, followed by DST.ADDR
pub const SOCKS5_HEADER_LEN: usize = 4;
