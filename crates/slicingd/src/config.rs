//! Daemon configuration file.
//!
//! Loads and validates slicingd configuration from TOML.
//! Default location: /etc/netslice/slicingd.toml
//!
//! Besides daemon tuning the file seeds the in-memory tenant directory
//! (tenants, networks, devices, ports, links) and each network's routed
//! subnets and forbidden pairs.

use crate::directory::{InMemoryDirectory, LinkState, VirtualLink, VirtualPort};
use crate::error::{Result, SlicingError};
use crate::host::DEFAULT_GATEWAY_MAC;
use crate::slicing::{SlicingOrch, SlicingOrchConfig};
use crate::flow::FlowPathBuilder;
use log::info;
use serde::{Deserialize, Serialize};
use slice_types::{ConnectPoint, DeviceId, Ipv4Prefix, MacAddress, MplsLabel, NetworkId, PortNumber, TenantId};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/netslice/slicingd.toml";

/// Daemon loop tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Heartbeat interval in milliseconds
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_ms: u64,

    /// Maximum events handled per orch pass
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

/// Path setup parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// MAC answered for routed-network gateways
    #[serde(default = "default_gateway_mac")]
    pub gateway_mac: MacAddress,

    /// Priority of every installed rule
    #[serde(default = "default_priority")]
    pub priority: u16,

    /// Highest label a device may issue; unset means the MPLS maximum
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfig {
    pub device: DeviceId,
    pub number: PortNumber,
    /// Physical port realising this virtual port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realized_by: Option<ConnectPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    pub src: ConnectPoint,
    pub dst: ConnectPoint,

    #[serde(default = "default_true")]
    pub active: bool,

    /// Also register the reverse direction
    #[serde(default = "default_true")]
    pub bidirectional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutedConfig {
    pub cidr: Ipv4Prefix,
    pub gateway: Ipv4Addr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbiddenConfig {
    pub a: Ipv4Addr,
    pub b: Ipv4Addr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub id: NetworkId,

    #[serde(default)]
    pub devices: Vec<DeviceId>,

    #[serde(default)]
    pub ports: Vec<PortConfig>,

    #[serde(default)]
    pub links: Vec<LinkConfig>,

    #[serde(default)]
    pub routed: Vec<RoutedConfig>,

    #[serde(default)]
    pub forbidden: Vec<ForbiddenConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantConfig {
    pub id: TenantId,

    #[serde(default)]
    pub networks: Vec<NetworkConfig>,
}

/// Complete slicingd configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlicingConfig {
    /// Physical edge ports; empty means every bound port faces hosts
    #[serde(default)]
    pub edge_ports: Vec<ConnectPoint>,

    #[serde(default)]
    pub daemon: DaemonConfig,

    #[serde(default)]
    pub slicing: EngineConfig,

    #[serde(default)]
    pub tenants: Vec<TenantConfig>,
}

fn default_heartbeat_interval() -> u64 {
    1000
}

fn default_batch_size() -> usize {
    128
}

fn default_gateway_mac() -> MacAddress {
    DEFAULT_GATEWAY_MAC
}

fn default_priority() -> u16 {
    FlowPathBuilder::DEFAULT_PRIORITY
}

fn default_true() -> bool {
    true
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: default_heartbeat_interval(),
            batch_size: default_batch_size(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gateway_mac: default_gateway_mac(),
            priority: default_priority(),
            label_limit: None,
        }
    }
}

impl SlicingConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                SlicingError::Configuration(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "slicingd: Config file {} not found, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(SlicingError::Io(e)),
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SlicingError::Configuration(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.daemon.heartbeat_interval_ms)
    }

    pub fn orch_config(&self) -> SlicingOrchConfig {
        SlicingOrchConfig {
            gateway_mac: self.slicing.gateway_mac,
            priority: self.slicing.priority,
            batch_size: self.daemon.batch_size,
            label_limit: self.slicing.label_limit,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.daemon.heartbeat_interval_ms == 0 {
            return Err(invalid("heartbeat_interval_ms must be > 0"));
        }
        if self.daemon.batch_size == 0 {
            return Err(invalid("batch_size must be > 0"));
        }
        let mac = self.slicing.gateway_mac;
        if !mac.is_unicast() || mac.is_zero() {
            return Err(invalid(format!("gateway_mac {} must be a non-zero unicast MAC", mac)));
        }
        if let Some(limit) = self.slicing.label_limit {
            if limit == 0 || limit > MplsLabel::MAX_VALUE {
                return Err(invalid(format!(
                    "label_limit must be 1-{}",
                    MplsLabel::MAX_VALUE
                )));
            }
        }

        let mut tenants = HashSet::new();
        let mut networks = HashSet::new();
        for tenant in &self.tenants {
            if !tenants.insert(&tenant.id) {
                return Err(invalid(format!("tenant {} declared twice", tenant.id)));
            }
            for network in &tenant.networks {
                if !networks.insert(network.id) {
                    return Err(invalid(format!("network {} declared twice", network.id)));
                }
                network.validate()?;
            }
        }
        Ok(())
    }

    /// Builds the tenant directory the file describes.
    pub fn build_directory(&self) -> Result<InMemoryDirectory> {
        let directory = InMemoryDirectory::new();
        directory.set_edge_ports(self.edge_ports.iter().cloned());

        for tenant in &self.tenants {
            directory.add_tenant(tenant.id.clone());
            for network in &tenant.networks {
                directory.add_network(&tenant.id, network.id)?;
                for device in &network.devices {
                    directory.add_device(network.id, device.clone())?;
                }
                for port in &network.ports {
                    let mut virtual_port = VirtualPort::new(port.device.clone(), port.number);
                    if let Some(point) = &port.realized_by {
                        virtual_port = virtual_port.realized_by(point.clone());
                    }
                    directory.add_port(network.id, virtual_port)?;
                }
                for link in &network.links {
                    let state = if link.active { LinkState::Active } else { LinkState::Inactive };
                    let mut forward = VirtualLink::new(link.src.clone(), link.dst.clone());
                    forward.state = state;
                    if link.bidirectional {
                        directory.add_link(network.id, forward.reversed())?;
                    }
                    directory.add_link(network.id, forward)?;
                }
            }
        }
        Ok(directory)
    }

    /// Registers every configured routed network and forbidden pair.
    pub fn apply_policies(&self, orch: &SlicingOrch) -> Result<()> {
        for network in self.tenants.iter().flat_map(|t| &t.networks) {
            for routed in &network.routed {
                orch.add_routed_network(network.id, routed.cidr, routed.gateway)?;
            }
            for pair in &network.forbidden {
                orch.add_forbidden_traffic(network.id, pair.a, pair.b);
            }
        }
        Ok(())
    }
}

impl NetworkConfig {
    fn validate(&self) -> Result<()> {
        let devices: BTreeSet<&DeviceId> = self.devices.iter().collect();
        let check = |device: &DeviceId, what: &str| {
            if devices.contains(device) {
                Ok(())
            } else {
                Err(invalid(format!(
                    "network {}: {} references undeclared device {}",
                    self.id, what, device
                )))
            }
        };

        for port in &self.ports {
            check(&port.device, "port")?;
        }
        for link in &self.links {
            check(&link.src.device, "link")?;
            check(&link.dst.device, "link")?;
        }
        for routed in &self.routed {
            if !routed.cidr.contains(routed.gateway) {
                return Err(invalid(format!(
                    "network {}: gateway {} is not inside {}",
                    self.id, routed.gateway, routed.cidr
                )));
            }
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> SlicingError {
    SlicingError::Configuration(message.into())
}
