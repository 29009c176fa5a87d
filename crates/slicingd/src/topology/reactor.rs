//! Tears down flows broken by a topology change.

use crate::flow::{FlowPair, FlowRecordStore, TeardownReport};
use crate::state::SliceState;
use log::{info, warn};
use serde::Serialize;
use slice_dataplane::FlowProgrammer;
use slice_types::{ConnectPoint, DeviceId, NetworkId};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkChangeKind {
    Added,
    Removed,
    Updated,
}

impl fmt::Display for LinkChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkChangeKind::Added => write!(f, "added"),
            LinkChangeKind::Removed => write!(f, "removed"),
            LinkChangeKind::Updated => write!(f, "updated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkChange {
    pub src: ConnectPoint,
    pub dst: ConnectPoint,
    pub kind: LinkChangeKind,
}

impl LinkChange {
    pub fn new(src: ConnectPoint, dst: ConnectPoint, kind: LinkChangeKind) -> Self {
        Self { src, dst, kind }
    }

    pub fn removed(src: ConnectPoint, dst: ConnectPoint) -> Self {
        Self::new(src, dst, LinkChangeKind::Removed)
    }
}

/// A batch of link changes reported together by the topology service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopologyEvent {
    pub changes: Vec<LinkChange>,
}

impl TopologyEvent {
    pub fn new(changes: Vec<LinkChange>) -> Self {
        Self { changes }
    }

    /// Both endpoint devices of every changed link.
    pub fn affected_devices(&self) -> BTreeSet<DeviceId> {
        self.changes
            .iter()
            .flat_map(|c| [c.src.device.clone(), c.dst.device.clone()])
            .collect()
    }
}

/// Outcome of one topology reaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReactionReport {
    pub torn_down: Vec<(NetworkId, FlowPair)>,
    pub teardown: TeardownReport,
}

/// Flows whose rules touch every affected device.
///
/// An empty affected set breaks nothing.
pub fn broken_flows(store: &FlowRecordStore, affected: &BTreeSet<DeviceId>) -> Vec<(NetworkId, FlowPair)> {
    if affected.is_empty() {
        return Vec::new();
    }
    store
        .all_flows()
        .filter(|(_, _, records)| {
            let devices: BTreeSet<&DeviceId> = records.iter().map(|r| &r.device).collect();
            affected.iter().all(|d| devices.contains(d))
        })
        .map(|(network, pair, _)| (network, *pair))
        .collect()
}

/// Removes every broken flow, continuing past individual failures.
pub fn react(state: &mut SliceState, programmer: &dyn FlowProgrammer, event: &TopologyEvent) -> ReactionReport {
    let affected = event.affected_devices();
    let broken = broken_flows(&state.flows, &affected);

    let mut report = ReactionReport::default();
    for (network, pair) in broken {
        match state.teardown_flow(programmer, network, &pair) {
            Some(teardown) => {
                if teardown.removal_failures > 0 {
                    warn!(
                        "TopologyReactor: {} rule(s) of {} in network {} could not be removed",
                        teardown.removal_failures, pair, network
                    );
                }
                report.teardown.merge(&teardown);
                report.torn_down.push((network, pair));
            }
            None => warn!("TopologyReactor: {} in network {} vanished before teardown", pair, network),
        }
    }

    if !report.torn_down.is_empty() {
        info!(
            "TopologyReactor: {} change(s) on {:?} tore down {} flow(s)",
            event.changes.len(),
            affected,
            report.torn_down.len()
        );
    }
    report
}
