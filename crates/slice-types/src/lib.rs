//! Typed network primitives shared by the slicing control plane.
//!
//! Everything that crosses a crate boundary in the workspace is expressed
//! with one of these types rather than raw strings or integers:
//!
//! - [`MacAddress`]: 48-bit Ethernet MAC addresses
//! - [`Ipv4Prefix`]: IPv4 network prefixes (CIDR notation)
//! - [`DeviceId`], [`PortNumber`], [`ConnectPoint`]: attachment points
//! - [`TenantId`], [`NetworkId`], [`HostId`]: tenant-scoped identities
//! - [`MplsLabel`]: 20-bit MPLS label values

mod ids;
mod ip;
mod mac;
mod mpls;
mod port;

pub use ids::{DeviceId, HostId, NetworkId, TenantId};
pub use ip::Ipv4Prefix;
pub use mac::MacAddress;
pub use mpls::MplsLabel;
pub use port::{ConnectPoint, PortNumber};

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("invalid IP prefix format: {0}")]
    InvalidIpPrefix(String),

    #[error("invalid device identifier: {0:?}")]
    InvalidDeviceId(String),

    #[error("invalid port number: {0}")]
    InvalidPortNumber(String),

    #[error("invalid connect point: {0} (expected <device>/<port>)")]
    InvalidConnectPoint(String),

    #[error("invalid MPLS label: {0} (must be 0-1048575)")]
    InvalidMplsLabel(u32),
}
