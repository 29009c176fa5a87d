//! Per-hop label distribution.
//!
//! Every device has its own label space ([`LabelPool`]) and its own cache of
//! which label it uses for a destination ([`ForwardingLabelTable`]). The
//! [`LabelManager`] ties the two together: flows towards the same host
//! through the same device share one label, and the label only goes back to
//! the pool once no installed rule matches on it.

mod pool;
mod table;

pub use pool::{LabelPool, LabelPools};
pub use table::{ForwardingLabelTable, ForwardingLabelTables, LabelBinding, LabelRelease};

use crate::error::Result;
use log::{debug, error, warn};
use slice_types::{DeviceId, HostId, MplsLabel, NetworkId};

#[derive(Debug, Clone, Default)]
pub struct LabelManager {
    pools: LabelPools,
    tables: ForwardingLabelTables,
}

impl LabelManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pools(pools: LabelPools) -> Self {
        Self {
            pools,
            tables: ForwardingLabelTables::new(),
        }
    }

    /// Returns the label `device` uses for traffic towards `host`, allocating
    /// and binding one if none is bound, and takes a reference on it.
    pub fn acquire_label(
        &mut self,
        device: &DeviceId,
        network: NetworkId,
        host: HostId,
    ) -> Result<MplsLabel> {
        let label = match self.tables.get(device, network, host) {
            Some(label) => {
                debug!(
                    "LabelManager: reusing label {} on {} for {} in network {}",
                    label, device, host, network
                );
                label
            }
            None => {
                let label = self.pools.allocate(device)?;
                self.tables.table_mut(device).bind(network, host, label);
                label
            }
        };
        if let Err(e) = self.tables.table_mut(device).acquire(network, host) {
            error!(
                "LabelManager: binding for {} on {} vanished: {}",
                host, device, e
            );
        }
        Ok(label)
    }

    /// Drops one reference to `label`. When no reference is left the binding
    /// is cleared and the label returns to the device pool.
    ///
    /// Returns true if the label went back to the pool.
    pub fn release_label(
        &mut self,
        device: &DeviceId,
        network: NetworkId,
        host: HostId,
        label: MplsLabel,
    ) -> bool {
        match self.tables.table_mut(device).release(network, host, label) {
            LabelRelease::Freed(label) => self.pools.release(device, label),
            LabelRelease::Retained(remaining) => {
                debug!(
                    "LabelManager: label {} on {} still used by {} rule(s)",
                    label, device, remaining
                );
                false
            }
            LabelRelease::Stale => {
                // Already freed; the label may belong to another destination now.
                warn!(
                    "LabelManager: no binding of label {} on {} for {} in network {}",
                    label, device, host, network
                );
                false
            }
        }
    }

    pub fn bound_label(&self, device: &DeviceId, network: NetworkId, host: HostId) -> Option<MplsLabel> {
        self.tables.get(device, network, host)
    }

    pub fn pool(&self, device: &DeviceId) -> Option<&LabelPool> {
        self.pools.pool(device)
    }

    pub fn table(&self, device: &DeviceId) -> Option<&ForwardingLabelTable> {
        self.tables.table(device)
    }
}
