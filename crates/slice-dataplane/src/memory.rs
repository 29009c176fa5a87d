//! In-process southbound implementations.
//!
//! Used by the daemon when it runs without a controller attached and by the
//! engine's tests to observe exactly which rules and frames were produced.

use crate::api::{FlowProgrammer, FlowRule, InboundPacket, OutboundPacket, PacketIo};
use crate::error::{DataplaneError, DataplaneResult};
use crate::types::FlowRuleId;
use log::debug;
use parking_lot::Mutex;
use slice_types::{ConnectPoint, DeviceId, PortNumber};
use std::collections::{BTreeMap, HashSet};

/// Rule table keyed by rule id.
#[derive(Debug, Default)]
pub struct InMemoryProgrammer {
    rules: Mutex<BTreeMap<FlowRuleId, FlowRule>>,
    unreachable: Mutex<HashSet<DeviceId>>,
}

impl InMemoryProgrammer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call touching `device` fail.
    pub fn mark_unreachable(&self, device: DeviceId) {
        self.unreachable.lock().insert(device);
    }

    pub fn mark_reachable(&self, device: &DeviceId) {
        self.unreachable.lock().remove(device);
    }

    pub fn rules(&self) -> Vec<FlowRule> {
        self.rules.lock().values().cloned().collect()
    }

    pub fn rules_on(&self, device: &DeviceId) -> Vec<FlowRule> {
        self.rules
            .lock()
            .values()
            .filter(|r| &r.device == device)
            .cloned()
            .collect()
    }

    pub fn contains(&self, id: FlowRuleId) -> bool {
        self.rules.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.rules.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.lock().is_empty()
    }

    fn check_reachable(&self, device: &DeviceId) -> DataplaneResult<()> {
        if self.unreachable.lock().contains(device) {
            return Err(DataplaneError::DeviceUnreachable(device.clone()));
        }
        Ok(())
    }
}

impl FlowProgrammer for InMemoryProgrammer {
    fn install(&self, rule: &FlowRule) -> DataplaneResult<()> {
        self.check_reachable(&rule.device)?;
        debug!("InMemoryProgrammer: install {}", rule);
        self.rules.lock().insert(rule.id, rule.clone());
        Ok(())
    }

    fn remove(&self, rule: &FlowRule) -> DataplaneResult<()> {
        self.check_reachable(&rule.device)?;
        match self.rules.lock().remove(&rule.id) {
            Some(_) => {
                debug!("InMemoryProgrammer: removed rule {} from {}", rule.id, rule.device);
                Ok(())
            }
            None => Err(DataplaneError::RuleNotFound {
                id: rule.id,
                device: rule.device.clone(),
            }),
        }
    }
}

/// A frame handed to [`RecordingPacketIo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketRecord {
    Emitted(OutboundPacket),
    Forwarded {
        received_from: ConnectPoint,
        out_port: PortNumber,
        data: Vec<u8>,
    },
}

/// Packet sink that remembers everything it was asked to send.
#[derive(Debug, Default)]
pub struct RecordingPacketIo {
    records: Mutex<Vec<PacketRecord>>,
}

impl RecordingPacketIo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<PacketRecord> {
        self.records.lock().clone()
    }

    /// Drains the recorded frames.
    pub fn take(&self) -> Vec<PacketRecord> {
        std::mem::take(&mut *self.records.lock())
    }
}

impl PacketIo for RecordingPacketIo {
    fn emit(&self, packet: OutboundPacket) -> DataplaneResult<()> {
        debug!(
            "RecordingPacketIo: emit {} bytes to {}",
            packet.data.len(),
            packet.send_to
        );
        self.records.lock().push(PacketRecord::Emitted(packet));
        Ok(())
    }

    fn forward(&self, packet: &InboundPacket, port: PortNumber) -> DataplaneResult<()> {
        debug!(
            "RecordingPacketIo: forward frame from {} out port {}",
            packet.received_from, port
        );
        self.records.lock().push(PacketRecord::Forwarded {
            received_from: packet.received_from.clone(),
            out_port: port,
            data: packet.data.clone(),
        });
        Ok(())
    }
}
