//! Flow construction and bookkeeping.
//!
//! - [`FlowPathBuilder`]: per-hop rule construction with label distribution
//! - [`FlowRecordStore`]: installed rules per (network, flow pair)

mod builder;
mod store;
mod types;

pub use builder::FlowPathBuilder;
pub use store::FlowRecordStore;
pub use types::{FlowPair, FlowRuleRecord, FlowSummary, HopPorts, HopRole, TeardownReport};
