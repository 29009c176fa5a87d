//! Tenant topology directory.
//!
//! Tenants, networks, devices, ports and links are owned by the platform;
//! the engine only reads them and creates hosts it learns from traffic.
//! [`TenantDirectory`] is the seam, [`InMemoryDirectory`] the implementation
//! used by the daemon and the tests.

mod memory;

pub use memory::InMemoryDirectory;

use crate::error::Result;
use serde::Serialize;
use slice_types::{ConnectPoint, DeviceId, HostId, MacAddress, NetworkId, PortNumber, TenantId};
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

/// A port of a virtual device, optionally bound to a physical connect point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualPort {
    pub device: DeviceId,
    pub number: PortNumber,
    pub realized_by: Option<ConnectPoint>,
}

impl VirtualPort {
    pub fn new(device: DeviceId, number: impl Into<PortNumber>) -> Self {
        Self {
            device,
            number: number.into(),
            realized_by: None,
        }
    }

    pub fn realized_by(mut self, point: ConnectPoint) -> Self {
        self.realized_by = Some(point);
        self
    }

    pub fn connect_point(&self) -> ConnectPoint {
        ConnectPoint::new(self.device.clone(), self.number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    Active,
    Inactive,
}

/// Directed link between two virtual ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualLink {
    pub src: ConnectPoint,
    pub dst: ConnectPoint,
    pub state: LinkState,
}

impl VirtualLink {
    pub fn new(src: ConnectPoint, dst: ConnectPoint) -> Self {
        Self {
            src,
            dst,
            state: LinkState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == LinkState::Active
    }

    pub fn reversed(&self) -> Self {
        Self {
            src: self.dst.clone(),
            dst: self.src.clone(),
            state: self.state,
        }
    }
}

/// End station learned inside one tenant network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualHost {
    pub id: HostId,
    pub mac: MacAddress,
    pub ips: BTreeSet<Ipv4Addr>,
    pub location: ConnectPoint,
}

impl VirtualHost {
    pub fn new(mac: MacAddress, ip: Option<Ipv4Addr>, location: ConnectPoint) -> Self {
        Self {
            id: HostId::from_mac(mac),
            mac,
            ips: ip.into_iter().collect(),
            location,
        }
    }

    pub fn has_ip(&self, ip: Ipv4Addr) -> bool {
        self.ips.contains(&ip)
    }
}

/// Decides whether a physical connect point faces end hosts.
pub trait EdgeClassifier: Send + Sync {
    fn is_edge(&self, point: &ConnectPoint) -> bool;
}

/// Read access to tenant topologies plus host creation.
///
/// Every enumeration returns an owned snapshot; an unknown tenant or network
/// yields an empty collection rather than an error.
pub trait TenantDirectory: Send + Sync {
    fn tenants(&self) -> Vec<TenantId>;

    fn networks(&self, tenant: &TenantId) -> Vec<NetworkId>;

    fn devices(&self, network: NetworkId) -> Vec<DeviceId>;

    fn ports(&self, network: NetworkId, device: &DeviceId) -> Vec<VirtualPort>;

    fn hosts(&self, network: NetworkId) -> Vec<VirtualHost>;

    fn links(&self, network: NetworkId) -> Vec<VirtualLink>;

    /// Registers a host. If a host with the same id already exists the
    /// stored host is returned unchanged.
    fn create_host(&self, network: NetworkId, host: VirtualHost) -> Result<VirtualHost>;

    fn host(&self, network: NetworkId, id: HostId) -> Option<VirtualHost> {
        self.hosts(network).into_iter().find(|h| h.id == id)
    }

    fn host_by_ip(&self, network: NetworkId, ip: Ipv4Addr) -> Option<VirtualHost> {
        self.hosts(network).into_iter().find(|h| h.has_ip(ip))
    }
}
