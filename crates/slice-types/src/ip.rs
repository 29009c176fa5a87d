//! IPv4 prefix type with safe parsing.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// An IPv4 network prefix in CIDR notation.
///
/// The stored address is always the network address: host bits are masked
/// off on construction, so `10.0.0.7/24` and `10.0.0.0/24` compare equal.
///
/// # Examples
///
/// ```
/// use slice_types::Ipv4Prefix;
/// use std::net::Ipv4Addr;
///
/// let prefix: Ipv4Prefix = "10.0.0.0/24".parse().unwrap();
/// assert!(prefix.contains(Ipv4Addr::new(10, 0, 0, 1)));
/// assert!(!prefix.contains(Ipv4Addr::new(10, 0, 1, 1)));
///
/// let host = Ipv4Prefix::host(Ipv4Addr::new(10, 0, 0, 2));
/// assert_eq!(host.to_string(), "10.0.0.2/32");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Prefix {
    address: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Prefix {
    pub const MAX_LEN: u8 = 32;

    /// Creates a prefix, masking `address` down to its network address.
    pub fn new(address: Ipv4Addr, prefix_len: u8) -> Result<Self, ParseError> {
        if prefix_len > Self::MAX_LEN {
            return Err(ParseError::InvalidIpPrefix(format!(
                "{}/{}",
                address, prefix_len
            )));
        }
        let masked = u32::from(address) & Self::mask_bits(prefix_len);
        Ok(Self {
            address: Ipv4Addr::from(masked),
            prefix_len,
        })
    }

    /// Full-length (/32) prefix for a single host.
    pub const fn host(address: Ipv4Addr) -> Self {
        Self {
            address,
            prefix_len: Self::MAX_LEN,
        }
    }

    pub const fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn netmask(&self) -> Ipv4Addr {
        Ipv4Addr::from(Self::mask_bits(self.prefix_len))
    }

    pub const fn is_host_route(&self) -> bool {
        self.prefix_len == Self::MAX_LEN
    }

    /// Returns true if `address` falls inside this prefix.
    pub fn contains(&self, address: Ipv4Addr) -> bool {
        u32::from(address) & Self::mask_bits(self.prefix_len) == u32::from(self.address)
    }

    fn mask_bits(prefix_len: u8) -> u32 {
        match prefix_len {
            0 => 0,
            len => u32::MAX << (32 - u32::from(len)),
        }
    }
}

impl fmt::Display for Ipv4Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for Ipv4Prefix {
    type Err = ParseError;

    /// Parses `a.b.c.d/len`; a bare address is treated as a host route.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, len) = match s.split_once('/') {
            Some((addr, len)) => {
                let len = len
                    .parse::<u8>()
                    .map_err(|_| ParseError::InvalidIpPrefix(s.to_string()))?;
                (addr, len)
            }
            None => (s, Self::MAX_LEN),
        };
        let address = addr
            .parse::<Ipv4Addr>()
            .map_err(|_| ParseError::InvalidIpAddress(addr.to_string()))?;
        Self::new(address, len).map_err(|_| ParseError::InvalidIpPrefix(s.to_string()))
    }
}

impl TryFrom<String> for Ipv4Prefix {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Ipv4Prefix> for String {
    fn from(prefix: Ipv4Prefix) -> String {
        prefix.to_string()
    }
}
