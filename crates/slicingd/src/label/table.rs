//! Per-device forwarding label tables.

use slice_common::{HasRefCount, SyncMap, SyncMapError};
use slice_types::{DeviceId, HostId, MplsLabel, NetworkId};
use std::collections::HashMap;

/// Label bound on a device for traffic towards one destination host, with
/// the number of installed rules matching on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelBinding {
    pub label: MplsLabel,
    refs: u32,
}

impl LabelBinding {
    pub fn new(label: MplsLabel) -> Self {
        Self { label, refs: 0 }
    }
}

impl HasRefCount for LabelBinding {
    fn increment_ref(&mut self) -> u32 {
        self.refs = self.refs.saturating_add(1);
        self.refs
    }

    fn decrement_ref(&mut self) -> Option<u32> {
        self.refs = self.refs.checked_sub(1)?;
        Some(self.refs)
    }

    fn ref_count(&self) -> u32 {
        self.refs
    }
}

/// Result of dropping one reference to a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRelease {
    /// Last reference gone; the binding was removed and the label is free.
    Freed(MplsLabel),
    /// Other rules still use the label; this many references remain.
    Retained(u32),
    /// No binding for this destination carries that label.
    Stale,
}

type BindingKey = (NetworkId, HostId);

/// (network, destination host) -> label for one device.
#[derive(Debug, Clone, Default)]
pub struct ForwardingLabelTable {
    bindings: SyncMap<BindingKey, LabelBinding>,
}

impl ForwardingLabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, network: NetworkId, host: HostId) -> Option<MplsLabel> {
        self.bindings.get(&(network, host)).map(|b| b.label)
    }

    /// Binds `label`, overwriting any previous binding.
    ///
    /// Rebinding the label already bound keeps its references. Returns the
    /// label that was replaced, if different.
    pub fn bind(&mut self, network: NetworkId, host: HostId, label: MplsLabel) -> Option<MplsLabel> {
        let key = (network, host);
        if let Some(existing) = self.bindings.get(&key) {
            if existing.label == label {
                return None;
            }
        }
        self.bindings
            .insert(key, LabelBinding::new(label))
            .map(|previous| previous.label)
    }

    /// Takes a reference on the current binding.
    pub fn acquire(&mut self, network: NetworkId, host: HostId) -> Result<u32, SyncMapError> {
        self.bindings.increment_ref(&(network, host))
    }

    /// Drops the reference a rule holds on `label`.
    pub fn release(&mut self, network: NetworkId, host: HostId, label: MplsLabel) -> LabelRelease {
        let key = (network, host);
        match self.bindings.get(&key) {
            Some(binding) if binding.label == label => {}
            _ => return LabelRelease::Stale,
        }
        match self.bindings.release(&key) {
            Ok(Some(binding)) => LabelRelease::Freed(binding.label),
            Ok(None) => LabelRelease::Retained(self.bindings.ref_count(&key).unwrap_or(0)),
            // Bound but never referenced: drop the binding so the label can
            // be returned.
            Err(SyncMapError::RefCountUnderflow) => {
                self.bindings.remove(&key);
                LabelRelease::Freed(label)
            }
            Err(SyncMapError::KeyNotFound) => LabelRelease::Stale,
        }
    }

    pub fn ref_count(&self, network: NetworkId, host: HostId) -> Option<u32> {
        self.bindings.ref_count(&(network, host))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Forwarding label tables for every device, created on first use.
#[derive(Debug, Clone, Default)]
pub struct ForwardingLabelTables {
    tables: HashMap<DeviceId, ForwardingLabelTable>,
}

impl ForwardingLabelTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, device: &DeviceId, network: NetworkId, host: HostId) -> Option<MplsLabel> {
        self.tables.get(device)?.get(network, host)
    }

    pub fn table(&self, device: &DeviceId) -> Option<&ForwardingLabelTable> {
        self.tables.get(device)
    }

    pub fn table_mut(&mut self, device: &DeviceId) -> &mut ForwardingLabelTable {
        self.tables.entry(device.clone()).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NET: NetworkId = NetworkId::new(1);

    fn host(last: u8) -> HostId {
        HostId::from_mac([0, 0, 0, 0, 0, last].into())
    }

    fn label(v: u32) -> MplsLabel {
        MplsLabel::new(v).unwrap()
    }

    #[test]
    fn test_get_and_bind() {
        let mut table = ForwardingLabelTable::new();
        assert_eq!(table.get(NET, host(1)), None);

        assert_eq!(table.bind(NET, host(1), label(4)), None);
        assert_eq!(table.get(NET, host(1)), Some(label(4)));
        assert_eq!(table.get(NetworkId::new(2), host(1)), None);

        assert_eq!(table.bind(NET, host(1), label(9)), Some(label(4)));
        assert_eq!(table.get(NET, host(1)), Some(label(9)));
    }

    #[test]
    fn test_rebinding_same_label_keeps_references() {
        let mut table = ForwardingLabelTable::new();
        table.bind(NET, host(1), label(4));
        table.acquire(NET, host(1)).unwrap();

        assert_eq!(table.bind(NET, host(1), label(4)), None);
        assert_eq!(table.ref_count(NET, host(1)), Some(1));
    }

    #[test]
    fn test_release_frees_on_last_reference() {
        let mut table = ForwardingLabelTable::new();
        table.bind(NET, host(1), label(4));
        table.acquire(NET, host(1)).unwrap();
        table.acquire(NET, host(1)).unwrap();

        assert_eq!(table.release(NET, host(1), label(4)), LabelRelease::Retained(1));
        assert_eq!(table.release(NET, host(1), label(4)), LabelRelease::Freed(label(4)));
        assert_eq!(table.get(NET, host(1)), None);
        assert!(table.is_empty());
        assert_eq!(table.release(NET, host(1), label(4)), LabelRelease::Stale);
    }

    #[test]
    fn test_release_of_replaced_label_is_stale() {
        let mut table = ForwardingLabelTable::new();
        table.bind(NET, host(1), label(4));
        table.acquire(NET, host(1)).unwrap();

        assert_eq!(table.release(NET, host(1), label(7)), LabelRelease::Stale);
        assert_eq!(table.ref_count(NET, host(1)), Some(1));
    }

    #[test]
    fn test_acquire_requires_binding() {
        let mut table = ForwardingLabelTable::new();
        assert_eq!(table.acquire(NET, host(1)), Err(SyncMapError::KeyNotFound));
    }

    #[test]
    fn test_tables_are_per_device() {
        let x: DeviceId = "x".parse().unwrap();
        let y: DeviceId = "y".parse().unwrap();
        let mut tables = ForwardingLabelTables::new();

        tables.table_mut(&x).bind(NET, host(1), label(3));
        assert_eq!(tables.get(&x, NET, host(1)), Some(label(3)));
        assert_eq!(tables.get(&y, NET, host(1)), None);
        assert!(tables.table(&y).is_none());
    }
}
