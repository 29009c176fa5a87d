//! In-process tenant directory.

use super::{EdgeClassifier, LinkState, TenantDirectory, VirtualHost, VirtualLink, VirtualPort};
use crate::error::{Result, SlicingError};
use log::debug;
use parking_lot::RwLock;
use slice_types::{ConnectPoint, DeviceId, HostId, NetworkId, TenantId};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug)]
struct NetworkEntry {
    tenant: TenantId,
    devices: BTreeSet<DeviceId>,
    ports: BTreeMap<DeviceId, Vec<VirtualPort>>,
    links: Vec<VirtualLink>,
    hosts: BTreeMap<HostId, VirtualHost>,
}

#[derive(Debug, Default)]
struct Inner {
    tenants: BTreeMap<TenantId, Vec<NetworkId>>,
    networks: BTreeMap<NetworkId, NetworkEntry>,
    edge_ports: BTreeSet<ConnectPoint>,
}

impl NetworkEntry {
    /// Ports at either end of a virtual link face other devices, whatever
    /// the link state.
    fn is_link_endpoint(&self, point: &ConnectPoint) -> bool {
        self.links.iter().any(|l| &l.src == point || &l.dst == point)
    }
}

impl Inner {
    fn network_mut(&mut self, network: NetworkId) -> Result<&mut NetworkEntry> {
        self.networks
            .get_mut(&network)
            .ok_or_else(|| SlicingError::Directory(format!("unknown network {}", network)))
    }
}

/// Tenant directory held in memory behind a read-write lock.
///
/// Registration methods take `&self` so the directory can be shared through
/// an `Arc` with the engine while the platform keeps mutating it.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    inner: RwLock<Inner>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tenant(&self, tenant: TenantId) {
        self.inner.write().tenants.entry(tenant).or_default();
    }

    pub fn add_network(&self, tenant: &TenantId, network: NetworkId) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.networks.contains_key(&network) {
            return Err(SlicingError::Directory(format!(
                "network {} already registered",
                network
            )));
        }
        let networks = inner
            .tenants
            .get_mut(tenant)
            .ok_or_else(|| SlicingError::Directory(format!("unknown tenant {}", tenant)))?;
        networks.push(network);
        inner.networks.insert(
            network,
            NetworkEntry {
                tenant: tenant.clone(),
                devices: BTreeSet::new(),
                ports: BTreeMap::new(),
                links: Vec::new(),
                hosts: BTreeMap::new(),
            },
        );
        Ok(())
    }

    pub fn add_device(&self, network: NetworkId, device: DeviceId) -> Result<()> {
        let mut inner = self.inner.write();
        inner.network_mut(network)?.devices.insert(device);
        Ok(())
    }

    pub fn add_port(&self, network: NetworkId, port: VirtualPort) -> Result<()> {
        let mut inner = self.inner.write();
        let entry = inner.network_mut(network)?;
        if !entry.devices.contains(&port.device) {
            return Err(SlicingError::Directory(format!(
                "port {} references unknown device in network {}",
                port.connect_point(),
                network
            )));
        }
        let ports = entry.ports.entry(port.device.clone()).or_default();
        ports.retain(|p| p.number != port.number);
        ports.push(port);
        Ok(())
    }

    pub fn add_link(&self, network: NetworkId, link: VirtualLink) -> Result<()> {
        let mut inner = self.inner.write();
        let entry = inner.network_mut(network)?;
        for end in [&link.src, &link.dst] {
            if !entry.devices.contains(&end.device) {
                return Err(SlicingError::Directory(format!(
                    "link endpoint {} is not a device of network {}",
                    end, network
                )));
            }
        }
        entry
            .links
            .retain(|l| !(l.src == link.src && l.dst == link.dst));
        entry.links.push(link);
        Ok(())
    }

    /// Adds `a -> b` and `b -> a`, both active.
    pub fn add_bidirectional_link(
        &self,
        network: NetworkId,
        a: ConnectPoint,
        b: ConnectPoint,
    ) -> Result<()> {
        let link = VirtualLink::new(a, b);
        self.add_link(network, link.reversed())?;
        self.add_link(network, link)
    }

    /// Changes the state of the directed link `src -> dst`.
    ///
    /// Returns false when no such link exists.
    pub fn set_link_state(
        &self,
        network: NetworkId,
        src: &ConnectPoint,
        dst: &ConnectPoint,
        state: LinkState,
    ) -> Result<bool> {
        let mut inner = self.inner.write();
        let entry = inner.network_mut(network)?;
        match entry
            .links
            .iter_mut()
            .find(|l| &l.src == src && &l.dst == dst)
        {
            Some(link) => {
                link.state = state;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Replaces the explicit edge port set. With an empty set, every bound
    /// virtual port that does not terminate a virtual link is an edge port.
    pub fn set_edge_ports(&self, ports: impl IntoIterator<Item = ConnectPoint>) {
        self.inner.write().edge_ports = ports.into_iter().collect();
    }

    /// Forgets a learned host so it is relearned where it next shows up.
    pub fn remove_host(&self, network: NetworkId, id: HostId) -> Option<VirtualHost> {
        self.inner
            .write()
            .networks
            .get_mut(&network)
            .and_then(|e| e.hosts.remove(&id))
    }

    pub fn tenant_of(&self, network: NetworkId) -> Option<TenantId> {
        self.inner
            .read()
            .networks
            .get(&network)
            .map(|e| e.tenant.clone())
    }
}

impl TenantDirectory for InMemoryDirectory {
    fn tenants(&self) -> Vec<TenantId> {
        self.inner.read().tenants.keys().cloned().collect()
    }

    fn networks(&self, tenant: &TenantId) -> Vec<NetworkId> {
        self.inner
            .read()
            .tenants
            .get(tenant)
            .cloned()
            .unwrap_or_default()
    }

    fn devices(&self, network: NetworkId) -> Vec<DeviceId> {
        self.inner
            .read()
            .networks
            .get(&network)
            .map(|e| e.devices.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn ports(&self, network: NetworkId, device: &DeviceId) -> Vec<VirtualPort> {
        self.inner
            .read()
            .networks
            .get(&network)
            .and_then(|e| e.ports.get(device).cloned())
            .unwrap_or_default()
    }

    fn hosts(&self, network: NetworkId) -> Vec<VirtualHost> {
        self.inner
            .read()
            .networks
            .get(&network)
            .map(|e| e.hosts.values().cloned().collect())
            .unwrap_or_default()
    }

    fn links(&self, network: NetworkId) -> Vec<VirtualLink> {
        self.inner
            .read()
            .networks
            .get(&network)
            .map(|e| e.links.clone())
            .unwrap_or_default()
    }

    fn create_host(&self, network: NetworkId, host: VirtualHost) -> Result<VirtualHost> {
        let mut inner = self.inner.write();
        let entry = inner.network_mut(network)?;
        if let Some(existing) = entry.hosts.get(&host.id) {
            return Ok(existing.clone());
        }
        debug!(
            "InMemoryDirectory: host {} created at {} in network {}",
            host.id, host.location, network
        );
        entry.hosts.insert(host.id, host.clone());
        Ok(host)
    }

    fn host(&self, network: NetworkId, id: HostId) -> Option<VirtualHost> {
        self.inner
            .read()
            .networks
            .get(&network)
            .and_then(|e| e.hosts.get(&id).cloned())
    }
}

impl EdgeClassifier for InMemoryDirectory {
    fn is_edge(&self, point: &ConnectPoint) -> bool {
        let inner = self.inner.read();
        if !inner.edge_ports.is_empty() {
            return inner.edge_ports.contains(point);
        }
        inner.networks.values().any(|e| {
            e.ports.values().flatten().any(|p| {
                p.realized_by.as_ref() == Some(point) && !e.is_link_endpoint(&p.connect_point())
            })
        })
    }
}
