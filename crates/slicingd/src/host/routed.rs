//! Routed subnets and their gateways, per tenant network.

use crate::error::{Result, SlicingError};
use serde::Serialize;
use slice_types::{Ipv4Prefix, NetworkId};
use std::collections::{BTreeMap, HashMap};
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoutedNetwork {
    pub cidr: Ipv4Prefix,
    pub gateway: Ipv4Addr,
}

#[derive(Debug, Clone, Default)]
pub struct RoutedNetworks {
    networks: HashMap<NetworkId, BTreeMap<Ipv4Prefix, Ipv4Addr>>,
}

impl RoutedNetworks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `cidr` with `gateway`, replacing the gateway of an already
    /// registered prefix. The gateway must lie inside the prefix.
    pub fn add(&mut self, network: NetworkId, cidr: Ipv4Prefix, gateway: Ipv4Addr) -> Result<Option<Ipv4Addr>> {
        if !cidr.contains(gateway) {
            return Err(SlicingError::InvalidRoutedNetwork { cidr, gateway });
        }
        Ok(self.networks.entry(network).or_default().insert(cidr, gateway))
    }

    pub fn remove(&mut self, network: NetworkId, cidr: &Ipv4Prefix) -> Option<Ipv4Addr> {
        let routed = self.networks.get_mut(&network)?;
        let gateway = routed.remove(cidr);
        if routed.is_empty() {
            self.networks.remove(&network);
        }
        gateway
    }

    /// Routed networks sorted by prefix.
    pub fn list(&self, network: NetworkId) -> Vec<RoutedNetwork> {
        self.networks
            .get(&network)
            .map(|routed| {
                routed
                    .iter()
                    .map(|(cidr, gateway)| RoutedNetwork {
                        cidr: *cidr,
                        gateway: *gateway,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_gateway(&self, network: NetworkId, ip: Ipv4Addr) -> bool {
        self.networks
            .get(&network)
            .map(|routed| routed.values().any(|gw| *gw == ip))
            .unwrap_or(false)
    }
}
