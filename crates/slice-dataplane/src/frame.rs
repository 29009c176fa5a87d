//! Ethernet, ARP and IPv4 decoding plus the frames the control plane
//! synthesises (ARP replies, test traffic).

use crate::error::{DataplaneError, DataplaneResult};
use crate::types::EtherType;
use byteorder::{BigEndian, ByteOrder};
use slice_types::MacAddress;
use std::net::Ipv4Addr;

const ETHERNET_HEADER_LEN: usize = 14;
const ARP_IPV4_LEN: usize = 28;
const IPV4_MIN_HEADER_LEN: usize = 20;

const ARP_HTYPE_ETHERNET: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOperation {
    Request,
    Reply,
    Other(u16),
}

impl ArpOperation {
    fn value(&self) -> u16 {
        match self {
            ArpOperation::Request => 1,
            ArpOperation::Reply => 2,
            ArpOperation::Other(v) => *v,
        }
    }
}

impl From<u16> for ArpOperation {
    fn from(value: u16) -> Self {
        match value {
            1 => ArpOperation::Request,
            2 => ArpOperation::Reply,
            other => ArpOperation::Other(other),
        }
    }
}

/// ARP for IPv4 over Ethernet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpPacket {
    pub operation: ArpOperation,
    pub sender_mac: MacAddress,
    pub sender_ip: Ipv4Addr,
    pub target_mac: MacAddress,
    pub target_ip: Ipv4Addr,
}

impl ArpPacket {
    fn parse(data: &[u8]) -> DataplaneResult<Self> {
        if data.len() < ARP_IPV4_LEN {
            return Err(DataplaneError::Truncated {
                layer: "arp",
                needed: ARP_IPV4_LEN,
                available: data.len(),
            });
        }
        let htype = BigEndian::read_u16(&data[0..2]);
        let ptype = BigEndian::read_u16(&data[2..4]);
        if htype != ARP_HTYPE_ETHERNET || ptype != EtherType::IPV4 || data[4] != 6 || data[5] != 4
        {
            return Err(DataplaneError::malformed(
                "arp",
                format!(
                    "unsupported htype {} ptype 0x{:04x} hlen {} plen {}",
                    htype, ptype, data[4], data[5]
                ),
            ));
        }

        let sender_mac = MacAddress::from_slice(&data[8..14])
            .ok_or_else(|| DataplaneError::malformed("arp", "sender hardware address"))?;
        let target_mac = MacAddress::from_slice(&data[18..24])
            .ok_or_else(|| DataplaneError::malformed("arp", "target hardware address"))?;

        Ok(Self {
            operation: ArpOperation::from(BigEndian::read_u16(&data[6..8])),
            sender_mac,
            sender_ip: read_ipv4(&data[14..18]),
            target_mac,
            target_ip: read_ipv4(&data[24..28]),
        })
    }

    fn write(&self, buf: &mut [u8]) {
        BigEndian::write_u16(&mut buf[0..2], ARP_HTYPE_ETHERNET);
        BigEndian::write_u16(&mut buf[2..4], EtherType::IPV4);
        buf[4] = 6;
        buf[5] = 4;
        BigEndian::write_u16(&mut buf[6..8], self.operation.value());
        buf[8..14].copy_from_slice(self.sender_mac.as_bytes());
        buf[14..18].copy_from_slice(&self.sender_ip.octets());
        buf[18..24].copy_from_slice(self.target_mac.as_bytes());
        buf[24..28].copy_from_slice(&self.target_ip.octets());
    }
}

/// The IPv4 header fields the control plane cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub protocol: u8,
    pub ttl: u8,
}

impl Ipv4Header {
    fn parse(data: &[u8]) -> DataplaneResult<Self> {
        if data.len() < IPV4_MIN_HEADER_LEN {
            return Err(DataplaneError::Truncated {
                layer: "ipv4",
                needed: IPV4_MIN_HEADER_LEN,
                available: data.len(),
            });
        }
        let version = data[0] >> 4;
        let header_len = usize::from(data[0] & 0x0f) * 4;
        if version != 4 || header_len < IPV4_MIN_HEADER_LEN {
            return Err(DataplaneError::malformed(
                "ipv4",
                format!("version {} header length {}", version, header_len),
            ));
        }
        if data.len() < header_len {
            return Err(DataplaneError::Truncated {
                layer: "ipv4",
                needed: header_len,
                available: data.len(),
            });
        }
        Ok(Self {
            ttl: data[8],
            protocol: data[9],
            src: read_ipv4(&data[12..16]),
            dst: read_ipv4(&data[16..20]),
        })
    }

    fn write(&self, buf: &mut [u8]) {
        buf[0] = 0x45;
        buf[1] = 0;
        BigEndian::write_u16(&mut buf[2..4], IPV4_MIN_HEADER_LEN as u16);
        BigEndian::write_u16(&mut buf[4..6], 0);
        BigEndian::write_u16(&mut buf[6..8], 0x4000);
        buf[8] = self.ttl;
        buf[9] = self.protocol;
        BigEndian::write_u16(&mut buf[10..12], 0);
        buf[12..16].copy_from_slice(&self.src.octets());
        buf[16..20].copy_from_slice(&self.dst.octets());
        let checksum = header_checksum(&buf[..IPV4_MIN_HEADER_LEN]);
        BigEndian::write_u16(&mut buf[10..12], checksum);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    Arp(ArpPacket),
    Ipv4(Ipv4Header),
    /// Any EtherType the control plane does not decode.
    Other(EtherType),
}

/// A decoded Ethernet II frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetFrame {
    pub dst: MacAddress,
    pub src: MacAddress,
    pub payload: Payload,
}

impl EthernetFrame {
    /// Decodes an Ethernet frame and its ARP or IPv4 payload.
    ///
    /// Unknown EtherTypes decode successfully as [`Payload::Other`]; a known
    /// EtherType with a broken header is an error.
    pub fn parse(data: &[u8]) -> DataplaneResult<Self> {
        if data.len() < ETHERNET_HEADER_LEN {
            return Err(DataplaneError::Truncated {
                layer: "ethernet",
                needed: ETHERNET_HEADER_LEN,
                available: data.len(),
            });
        }
        let dst = MacAddress::from_slice(&data[0..6])
            .ok_or_else(|| DataplaneError::malformed("ethernet", "destination address"))?;
        let src = MacAddress::from_slice(&data[6..12])
            .ok_or_else(|| DataplaneError::malformed("ethernet", "source address"))?;
        let body = &data[ETHERNET_HEADER_LEN..];

        let payload = match EtherType::from(BigEndian::read_u16(&data[12..14])) {
            EtherType::Arp => Payload::Arp(ArpPacket::parse(body)?),
            EtherType::Ipv4 => Payload::Ipv4(Ipv4Header::parse(body)?),
            other => Payload::Other(other),
        };

        Ok(Self { dst, src, payload })
    }

    pub fn ether_type(&self) -> EtherType {
        match self.payload {
            Payload::Arp(_) => EtherType::Arp,
            Payload::Ipv4(_) => EtherType::Ipv4,
            Payload::Other(t) => t,
        }
    }

    /// Sender IP of an ARP payload or source IP of an IPv4 payload.
    pub fn source_ip(&self) -> Option<Ipv4Addr> {
        match &self.payload {
            Payload::Arp(arp) => Some(arp.sender_ip),
            Payload::Ipv4(ip) => Some(ip.src),
            Payload::Other(_) => None,
        }
    }

    /// Broadcast ARP request for `target_ip`.
    pub fn arp_request(sender_mac: MacAddress, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        Self {
            dst: MacAddress::BROADCAST,
            src: sender_mac,
            payload: Payload::Arp(ArpPacket {
                operation: ArpOperation::Request,
                sender_mac,
                sender_ip,
                target_mac: MacAddress::ZERO,
                target_ip,
            }),
        }
    }

    /// Answer to an ARP request, claiming `answer_mac` owns the requested IP.
    ///
    /// Returns `None` if `self` is not an ARP request.
    pub fn arp_reply(&self, answer_mac: MacAddress) -> Option<Self> {
        let request = match &self.payload {
            Payload::Arp(arp) if arp.operation == ArpOperation::Request => arp,
            _ => return None,
        };
        Some(Self {
            dst: self.src,
            src: answer_mac,
            payload: Payload::Arp(ArpPacket {
                operation: ArpOperation::Reply,
                sender_mac: answer_mac,
                sender_ip: request.target_ip,
                target_mac: request.sender_mac,
                target_ip: request.sender_ip,
            }),
        })
    }

    /// Header-only IPv4 frame.
    pub fn ipv4(dst: MacAddress, src: MacAddress, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> Self {
        Self {
            dst,
            src,
            payload: Payload::Ipv4(Ipv4Header {
                src: src_ip,
                dst: dst_ip,
                protocol: 1,
                ttl: 64,
            }),
        }
    }

    /// Encodes the frame. `Other` payloads are emitted with an empty body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let body_len = match self.payload {
            Payload::Arp(_) => ARP_IPV4_LEN,
            Payload::Ipv4(_) => IPV4_MIN_HEADER_LEN,
            Payload::Other(_) => 0,
        };
        let mut buf = vec![0u8; ETHERNET_HEADER_LEN + body_len];
        buf[0..6].copy_from_slice(self.dst.as_bytes());
        buf[6..12].copy_from_slice(self.src.as_bytes());
        BigEndian::write_u16(&mut buf[12..14], self.ether_type().value());
        let body = &mut buf[ETHERNET_HEADER_LEN..];
        match &self.payload {
            Payload::Arp(arp) => arp.write(body),
            Payload::Ipv4(ip) => ip.write(body),
            Payload::Other(_) => {}
        }
        buf
    }
}

fn read_ipv4(bytes: &[u8]) -> Ipv4Addr {
    Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3])
}

fn header_checksum(header: &[u8]) -> u16 {
    let mut sum: u32 = header
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u32::from(*hi) << 8 | u32::from(*lo),
            [hi] => u32::from(*hi) << 8,
            _ => 0,
        })
        .sum();
    while sum > 0xffff {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}
