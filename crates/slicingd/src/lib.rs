//! slicingd - Multi-tenant Network Slicing Daemon
//!
//! Reactively sets up isolated forwarding paths for hosts of virtual
//! networks that share one physical fabric. Paths are realised with per-hop
//! MPLS labels: each device hands out labels from its own pool, binds one
//! label per destination host and network, and the rules along a path push,
//! swap and finally pop those labels.
//!
//! # Architecture
//!
//! ```text
//! [PacketIo] ──> [Producer] ──> [SlicingOrch] ──> [FlowProgrammer]
//! [Topology] ───────┘               │
//!                                  ↓
//!                  [LabelManager / FlowRecordStore / ForbiddenTraffic]
//! ```
//!
//! # Key Components
//!
//! - [`daemon::SliceDaemon`]: Main event loop and Orch coordination
//! - [`slicing::SlicingOrch`]: Packet handling, topology reaction, management
//! - [`label::LabelManager`]: Per-device label pools and forwarding tables
//! - [`directory::TenantDirectory`]: Tenants, networks, ports, links, hosts

pub mod audit;
pub mod config;
pub mod daemon;
pub mod directory;
pub mod error;
pub mod flow;
pub mod forbidden;
pub mod host;
pub mod label;
pub mod slicing;
pub mod state;
pub mod topology;

pub use config::SlicingConfig;
pub use daemon::{SliceDaemon, SliceDaemonConfig};
pub use error::{Result, SlicingError};
pub use slicing::{DropReason, PacketOutcome, SliceEvent, SlicingOrch, SlicingOrchConfig};
