//! Path finding over a tenant network and reaction to link changes.

mod graph;
mod reactor;

pub use graph::{links_along, TopologyGraph};
pub use reactor::{broken_flows, react, LinkChange, LinkChangeKind, ReactionReport, TopologyEvent};
