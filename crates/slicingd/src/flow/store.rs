//! Installed flows, keyed by network and flow pair.

use super::types::{FlowPair, FlowRuleRecord};
use slice_types::{DeviceId, NetworkId};
use std::collections::{BTreeMap, BTreeSet};

/// Records of every installed rule, grouped by flow.
///
/// Each flow's records are kept in path order (source device first).
/// Lookups for networks or pairs that were never stored return empty
/// results.
#[derive(Debug, Clone, Default)]
pub struct FlowRecordStore {
    flows: BTreeMap<NetworkId, BTreeMap<FlowPair, Vec<FlowRuleRecord>>>,
}

impl FlowRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, network: NetworkId, pair: FlowPair, record: FlowRuleRecord) {
        self.flows
            .entry(network)
            .or_default()
            .entry(pair)
            .or_default()
            .push(record);
    }

    pub fn add_all(
        &mut self,
        network: NetworkId,
        pair: FlowPair,
        records: impl IntoIterator<Item = FlowRuleRecord>,
    ) {
        self.flows
            .entry(network)
            .or_default()
            .entry(pair)
            .or_default()
            .extend(records);
    }

    pub fn get_all(&self, network: NetworkId, pair: &FlowPair) -> &[FlowRuleRecord] {
        self.flows
            .get(&network)
            .and_then(|flows| flows.get(pair))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Removes and returns a flow's records. Empty if the flow is unknown.
    pub fn delete_all(&mut self, network: NetworkId, pair: &FlowPair) -> Vec<FlowRuleRecord> {
        let Some(flows) = self.flows.get_mut(&network) else {
            return Vec::new();
        };
        let removed = flows.remove(pair).unwrap_or_default();
        if flows.is_empty() {
            self.flows.remove(&network);
        }
        removed
    }

    pub fn contains(&self, network: NetworkId, pair: &FlowPair) -> bool {
        !self.get_all(network, pair).is_empty()
    }

    /// Every stored (network, pair) with its records.
    pub fn all_flows(&self) -> impl Iterator<Item = (NetworkId, &FlowPair, &[FlowRuleRecord])> {
        self.flows.iter().flat_map(|(network, flows)| {
            flows
                .iter()
                .map(move |(pair, records)| (*network, pair, records.as_slice()))
        })
    }

    pub fn flows_in(&self, network: NetworkId) -> impl Iterator<Item = (&FlowPair, &[FlowRuleRecord])> {
        self.flows
            .get(&network)
            .into_iter()
            .flat_map(|flows| flows.iter().map(|(pair, records)| (pair, records.as_slice())))
    }

    /// Devices a flow's installed rules touch.
    pub fn devices_of(&self, network: NetworkId, pair: &FlowPair) -> BTreeSet<DeviceId> {
        self.get_all(network, pair)
            .iter()
            .map(|r| r.device.clone())
            .collect()
    }

    /// Number of stored flows across all networks.
    pub fn len(&self) -> usize {
        self.flows.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}
