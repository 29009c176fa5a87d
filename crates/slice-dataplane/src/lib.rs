//! Southbound abstraction for slice forwarding.
//!
//! The slicing engine never talks to a device directly. It describes what it
//! wants in terms of this crate and hands the result to whatever platform
//! implements the traits:
//!
//! - [`types`]: rule identifiers and EtherType constants
//! - [`error`]: error type shared by every southbound call
//! - [`api`]: the flow-rule model plus the [`FlowProgrammer`] and [`PacketIo`] traits
//! - [`frame`]: Ethernet/ARP/IPv4 decoding and ARP reply synthesis
//! - [`memory`]: in-process implementations used by the simulation daemon and tests
//!
//! # Example
//!
//! ```
//! use slice_dataplane::{FlowRule, FlowRuleId, TrafficSelector, TrafficTreatment};
//! use slice_types::{DeviceId, Ipv4Prefix, PortNumber};
//! use std::net::Ipv4Addr;
//!
//! let rule = FlowRule::new(
//!     FlowRuleId::new(1),
//!     "of:1".parse::<DeviceId>().unwrap(),
//!     TrafficSelector::builder()
//!         .match_in_port(PortNumber::new(1))
//!         .match_ipv4_dst(Ipv4Prefix::host(Ipv4Addr::new(10, 0, 0, 2)))
//!         .build(),
//!     TrafficTreatment::builder().output(PortNumber::new(2)).build(),
//!     100,
//! );
//! assert_eq!(rule.treatment.output_port(), Some(PortNumber::new(2)));
//! ```

pub mod api;
pub mod error;
pub mod frame;
pub mod memory;
pub mod types;

pub use api::{
    Criterion, FlowProgrammer, FlowRule, InboundPacket, Instruction, OutboundPacket, PacketIo,
    TrafficSelector, TrafficTreatment,
};
pub use error::{DataplaneError, DataplaneResult};
pub use frame::{ArpOperation, ArpPacket, EthernetFrame, Ipv4Header, Payload};
pub use memory::{InMemoryProgrammer, PacketRecord, RecordingPacketIo};
pub use types::{EtherType, FlowRuleId};
