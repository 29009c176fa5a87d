//! Flow identity and bookkeeping types.

use serde::Serialize;
use slice_dataplane::FlowRule;
use slice_types::{DeviceId, HostId, MplsLabel, PortNumber};
use std::fmt;
use std::net::Ipv4Addr;

/// Directional (source IP, destination IP) pair identifying a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FlowPair {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
}

impl FlowPair {
    pub const fn new(src: Ipv4Addr, dst: Ipv4Addr) -> Self {
        Self { src, dst }
    }

    pub const fn reversed(&self) -> Self {
        Self {
            src: self.dst,
            dst: self.src,
        }
    }
}

impl fmt::Display for FlowPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dst)
    }
}

/// One installed rule of a flow and the label its match consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowRuleRecord {
    pub device: DeviceId,
    pub in_port: PortNumber,
    pub out_port: PortNumber,
    /// Rule rewrites the destination MAC of routed traffic.
    pub rewrites_eth_dst: bool,
    pub rule: FlowRule,
    pub label: Option<MplsLabel>,
    /// Host the label was bound for; labels are keyed by destination.
    pub destination: HostId,
}

impl FlowRuleRecord {
    pub fn hop(&self) -> HopPorts {
        HopPorts {
            device: self.device.clone(),
            in_port: self.in_port,
            out_port: self.out_port,
        }
    }

    /// Whether a flow's `records` already realise `hops`, with the MAC
    /// rewrite present exactly when `routed`.
    pub fn follow(records: &[FlowRuleRecord], hops: &[HopPorts], routed: bool) -> bool {
        records.len() == hops.len()
            && records.iter().zip(hops).all(|(record, hop)| record.hop() == *hop)
            && records.iter().any(|r| r.rewrites_eth_dst) == routed
    }
}

/// Ports a path enters and leaves one device through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopPorts {
    pub device: DeviceId,
    pub in_port: PortNumber,
    pub out_port: PortNumber,
}

/// Role of a device on a multi-hop path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopRole {
    /// Source host's device: pushes the label.
    Originating,
    /// Label switching in the middle of the path.
    Transit,
    /// Destination host's device: pops the label.
    Terminating,
}

impl HopRole {
    /// Role of hop `index` on a path of `len` hops (`len >= 2`).
    pub fn at(index: usize, len: usize) -> Self {
        if index == 0 {
            HopRole::Originating
        } else if index + 1 == len {
            HopRole::Terminating
        } else {
            HopRole::Transit
        }
    }
}

/// Enumerable view of an installed flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowSummary {
    pub pair: FlowPair,
    /// Devices in source-to-destination order.
    pub path: Vec<DeviceId>,
    /// Labels consumed per device, in path order.
    pub labels: Vec<(DeviceId, MplsLabel)>,
}

/// What tearing down one flow did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub rules_removed: usize,
    pub removal_failures: usize,
    pub labels_released: usize,
}

impl TeardownReport {
    pub fn merge(&mut self, other: &TeardownReport) {
        self.rules_removed += other.rules_removed;
        self.removal_failures += other.removal_failures;
        self.labels_released += other.labels_released;
    }
}
