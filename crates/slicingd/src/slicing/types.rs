//! Events, outcomes and counters of the slicing orch.

use crate::flow::{FlowPair, FlowPathBuilder};
use crate::host::DEFAULT_GATEWAY_MAC;
use crate::topology::TopologyEvent;
use slice_common::{TaskStats, TaskStatus};
use slice_dataplane::InboundPacket;
use slice_types::{MacAddress, NetworkId};
use std::fmt;
use std::net::Ipv4Addr;

/// Why a punted frame was discarded without installing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    NotEdgePort,
    Unparseable,
    /// Ingress port is not bound to any tenant network.
    UnknownNetwork,
    /// Neither an ARP request nor IPv4.
    UnsupportedPayload,
    UnresolvedArpTarget,
    UnresolvedDestination,
    Forbidden,
    NoPath,
    /// A device pair on the computed path has no active link.
    NoLinksOnPath,
    LabelSpaceExhausted,
    HostLearningFailed,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DropReason::NotEdgePort => "ingress is not an edge port",
            DropReason::Unparseable => "frame could not be decoded",
            DropReason::UnknownNetwork => "no tenant network owns the ingress port",
            DropReason::UnsupportedPayload => "payload is not an ARP request or IPv4",
            DropReason::UnresolvedArpTarget => "ARP target is unknown",
            DropReason::UnresolvedDestination => "destination host is unknown",
            DropReason::Forbidden => "traffic between the hosts is forbidden",
            DropReason::NoPath => "no path between the hosts' devices",
            DropReason::NoLinksOnPath => "path has no usable links",
            DropReason::LabelSpaceExhausted => "label space exhausted",
            DropReason::HostLearningFailed => "source host could not be learned",
        };
        f.write_str(s)
    }
}

/// Work queued for the slicing orch.
#[derive(Debug, Clone)]
pub enum SliceEvent {
    PacketIn(InboundPacket),
    TopologyChanged(TopologyEvent),
}

/// What handling one punted frame did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketOutcome {
    ArpReplied {
        target_ip: Ipv4Addr,
        via_gateway: bool,
    },
    Installed {
        network: NetworkId,
        pair: FlowPair,
        rules: usize,
        /// An older flow with a different path was torn down first.
        superseded: bool,
    },
    /// Flow already installed along the same path; only the frame was sent on.
    Redirected {
        network: NetworkId,
        pair: FlowPair,
    },
    Dropped(DropReason),
    Failed(String),
}

impl PacketOutcome {
    pub fn status(&self) -> TaskStatus {
        match self {
            PacketOutcome::ArpReplied { .. } | PacketOutcome::Installed { .. } => TaskStatus::Success,
            PacketOutcome::Redirected { .. } => TaskStatus::Ignore,
            PacketOutcome::Dropped(_) => TaskStatus::Dropped,
            PacketOutcome::Failed(_) => TaskStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlicingStats {
    pub tasks: TaskStats,
    pub packets: u64,
    pub arp_replies: u64,
    pub flows_installed: u64,
    pub flows_torn_down: u64,
    pub drops: u64,
}

#[derive(Debug, Clone)]
pub struct SlicingOrchConfig {
    /// MAC answered for gateway addresses and matched as "routed" traffic.
    pub gateway_mac: MacAddress,
    pub priority: u16,
    pub batch_size: usize,
    /// Caps labels issued per device below the MPLS maximum.
    pub label_limit: Option<u32>,
}

impl Default for SlicingOrchConfig {
    fn default() -> Self {
        Self {
            gateway_mac: DEFAULT_GATEWAY_MAC,
            priority: FlowPathBuilder::DEFAULT_PRIORITY,
            batch_size: 128,
            label_limit: None,
        }
    }
}
