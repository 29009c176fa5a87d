//! Per-network lists of traffic that must never be programmed.

use crate::flow::FlowPair;
use slice_types::NetworkId;
use std::collections::HashMap;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Default)]
pub struct ForbiddenTraffic {
    pairs: HashMap<NetworkId, Vec<FlowPair>>,
}

impl ForbiddenTraffic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forbids `a <-> b` in both directions. Returns the pairs that were
    /// newly recorded.
    pub fn insert(&mut self, network: NetworkId, a: Ipv4Addr, b: Ipv4Addr) -> Vec<FlowPair> {
        let pairs = self.pairs.entry(network).or_default();
        let forward = FlowPair::new(a, b);
        let mut added = Vec::new();
        for pair in [forward, forward.reversed()] {
            if !pairs.contains(&pair) {
                pairs.push(pair);
                added.push(pair);
            }
        }
        added
    }

    /// Lifts the ban on `a <-> b`. Returns true if either direction was
    /// recorded.
    pub fn remove(&mut self, network: NetworkId, a: Ipv4Addr, b: Ipv4Addr) -> bool {
        let Some(pairs) = self.pairs.get_mut(&network) else {
            return false;
        };
        let forward = FlowPair::new(a, b);
        let before = pairs.len();
        pairs.retain(|p| *p != forward && *p != forward.reversed());
        let removed = pairs.len() != before;
        if pairs.is_empty() {
            self.pairs.remove(&network);
        }
        removed
    }

    pub fn is_forbidden(&self, network: NetworkId, pair: &FlowPair) -> bool {
        self.pairs
            .get(&network)
            .map(|pairs| pairs.contains(pair))
            .unwrap_or(false)
    }

    /// Recorded pairs in insertion order.
    pub fn list(&self, network: NetworkId) -> Vec<FlowPair> {
        self.pairs.get(&network).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NET: NetworkId = NetworkId::new(1);

    fn ip(last: u8) -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, last)
    }

    #[test]
    fn test_insert_records_both_directions() {
        let mut forbidden = ForbiddenTraffic::new();
        let added = forbidden.insert(NET, ip(1), ip(2));

        assert_eq!(added, vec![FlowPair::new(ip(1), ip(2)), FlowPair::new(ip(2), ip(1))]);
        assert!(forbidden.is_forbidden(NET, &FlowPair::new(ip(2), ip(1))));
        assert!(!forbidden.is_forbidden(NetworkId::new(2), &FlowPair::new(ip(1), ip(2))));

        // Reverse insert adds nothing new.
        assert!(forbidden.insert(NET, ip(2), ip(1)).is_empty());
        assert_eq!(forbidden.list(NET).len(), 2);
    }

    #[test]
    fn test_remove() {
        let mut forbidden = ForbiddenTraffic::new();
        forbidden.insert(NET, ip(1), ip(2));
        forbidden.insert(NET, ip(1), ip(3));

        assert!(forbidden.remove(NET, ip(2), ip(1)));
        assert!(!forbidden.remove(NET, ip(2), ip(1)));
        assert_eq!(
            forbidden.list(NET),
            vec![FlowPair::new(ip(1), ip(3)), FlowPair::new(ip(3), ip(1))]
        );
        assert!(!forbidden.remove(NetworkId::new(9), ip(1), ip(3)));
    }

    #[test]
    fn test_list_unknown_network_is_empty() {
        assert!(ForbiddenTraffic::new().list(NET).is_empty());
    }
}
