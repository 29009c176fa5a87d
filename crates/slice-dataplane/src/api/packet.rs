//! Packet-in / packet-out model.

use crate::error::DataplaneResult;
use slice_types::{ConnectPoint, PortNumber};

/// A frame punted to the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundPacket {
    /// Physical attachment point the frame arrived on.
    pub received_from: ConnectPoint,
    pub data: Vec<u8>,
}

impl InboundPacket {
    pub fn new(received_from: ConnectPoint, data: Vec<u8>) -> Self {
        Self {
            received_from,
            data,
        }
    }
}

/// A frame synthesised by the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundPacket {
    pub send_to: ConnectPoint,
    pub data: Vec<u8>,
}

impl OutboundPacket {
    pub fn new(send_to: ConnectPoint, data: Vec<u8>) -> Self {
        Self { send_to, data }
    }
}

/// Frame emission towards devices.
pub trait PacketIo: Send + Sync {
    /// Sends a control-plane generated frame out of `packet.send_to`.
    fn emit(&self, packet: OutboundPacket) -> DataplaneResult<()>;

    /// Releases a punted frame out of `port` on the device it arrived on.
    fn forward(&self, packet: &InboundPacket, port: PortNumber) -> DataplaneResult<()>;
}
