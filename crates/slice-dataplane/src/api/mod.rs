//! Southbound interfaces consumed by the slicing engine.
//!
//! - [`flow`]: match/action model and the [`FlowProgrammer`] trait
//! - [`packet`]: packet-in/packet-out model and the [`PacketIo`] trait

pub mod flow;
pub mod packet;

pub use flow::{
    Criterion, FlowProgrammer, FlowRule, Instruction, TrafficSelector, TrafficSelectorBuilder,
    TrafficTreatment, TrafficTreatmentBuilder,
};
pub use packet::{InboundPacket, OutboundPacket, PacketIo};
