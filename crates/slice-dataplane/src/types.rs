//! Rule identifiers and EtherType constants.

use std::fmt;

/// Identifier of an installed flow rule.
///
/// Assigned by the engine when it builds a rule; the platform uses it to
/// find the rule again on removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowRuleId(u64);

impl FlowRuleId {
    pub const fn new(raw: u64) -> Self {
        FlowRuleId(raw)
    }

    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FlowRuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

/// EtherType values the slicing data plane understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EtherType {
    Ipv4,
    Arp,
    MplsUnicast,
    Other(u16),
}

impl EtherType {
    pub const IPV4: u16 = 0x0800;
    pub const ARP: u16 = 0x0806;
    pub const MPLS_UNICAST: u16 = 0x8847;

    pub const fn value(&self) -> u16 {
        match self {
            EtherType::Ipv4 => Self::IPV4,
            EtherType::Arp => Self::ARP,
            EtherType::MplsUnicast => Self::MPLS_UNICAST,
            EtherType::Other(v) => *v,
        }
    }
}

impl From<u16> for EtherType {
    fn from(value: u16) -> Self {
        match value {
            Self::IPV4 => EtherType::Ipv4,
            Self::ARP => EtherType::Arp,
            Self::MPLS_UNICAST => EtherType::MplsUnicast,
            other => EtherType::Other(other),
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::Ipv4 => write!(f, "ipv4"),
            EtherType::Arp => write!(f, "arp"),
            EtherType::MplsUnicast => write!(f, "mpls_unicast"),
            EtherType::Other(v) => write!(f, "0x{:04x}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ethertype_mapping() {
        assert_eq!(EtherType::from(0x0800), EtherType::Ipv4);
        assert_eq!(EtherType::from(0x8847).value(), 0x8847);
        assert_eq!(EtherType::from(0x86dd), EtherType::Other(0x86dd));
        assert_eq!(EtherType::Other(0x86dd).to_string(), "0x86dd");
    }
}
