//! Flow-rule model: what to match, what to do, where to install it.

use crate::error::DataplaneResult;
use crate::types::{EtherType, FlowRuleId};
use slice_types::{DeviceId, Ipv4Prefix, MacAddress, MplsLabel, PortNumber};
use std::fmt;

/// A single match field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Criterion {
    InPort(PortNumber),
    EthType(EtherType),
    Ipv4Dst(Ipv4Prefix),
    MplsLabel(MplsLabel),
    /// Bottom-of-stack bit of the outermost label.
    MplsBos(bool),
}

/// Conjunction of match fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TrafficSelector {
    criteria: Vec<Criterion>,
}

impl TrafficSelector {
    pub fn builder() -> TrafficSelectorBuilder {
        TrafficSelectorBuilder::default()
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn in_port(&self) -> Option<PortNumber> {
        self.criteria.iter().find_map(|c| match c {
            Criterion::InPort(port) => Some(*port),
            _ => None,
        })
    }

    pub fn eth_type(&self) -> Option<EtherType> {
        self.criteria.iter().find_map(|c| match c {
            Criterion::EthType(t) => Some(*t),
            _ => None,
        })
    }

    pub fn ipv4_dst(&self) -> Option<Ipv4Prefix> {
        self.criteria.iter().find_map(|c| match c {
            Criterion::Ipv4Dst(prefix) => Some(*prefix),
            _ => None,
        })
    }

    pub fn mpls_label(&self) -> Option<MplsLabel> {
        self.criteria.iter().find_map(|c| match c {
            Criterion::MplsLabel(label) => Some(*label),
            _ => None,
        })
    }

    pub fn mpls_bos(&self) -> Option<bool> {
        self.criteria.iter().find_map(|c| match c {
            Criterion::MplsBos(bos) => Some(*bos),
            _ => None,
        })
    }
}

#[derive(Debug, Default)]
pub struct TrafficSelectorBuilder {
    criteria: Vec<Criterion>,
}

impl TrafficSelectorBuilder {
    pub fn match_in_port(mut self, port: PortNumber) -> Self {
        self.criteria.push(Criterion::InPort(port));
        self
    }

    pub fn match_eth_type(mut self, eth_type: EtherType) -> Self {
        self.criteria.push(Criterion::EthType(eth_type));
        self
    }

    /// Matches an IPv4 destination; implies the IPv4 EtherType.
    pub fn match_ipv4_dst(mut self, prefix: Ipv4Prefix) -> Self {
        if !self
            .criteria
            .iter()
            .any(|c| matches!(c, Criterion::EthType(EtherType::Ipv4)))
        {
            self.criteria.push(Criterion::EthType(EtherType::Ipv4));
        }
        self.criteria.push(Criterion::Ipv4Dst(prefix));
        self
    }

    /// Matches a label-switched frame carrying `label`; implies the MPLS
    /// unicast EtherType.
    pub fn match_mpls_label(mut self, label: MplsLabel) -> Self {
        if !self
            .criteria
            .iter()
            .any(|c| matches!(c, Criterion::EthType(EtherType::MplsUnicast)))
        {
            self.criteria.push(Criterion::EthType(EtherType::MplsUnicast));
        }
        self.criteria.push(Criterion::MplsLabel(label));
        self
    }

    pub fn match_mpls_bos(mut self, bos: bool) -> Self {
        self.criteria.push(Criterion::MplsBos(bos));
        self
    }

    pub fn build(self) -> TrafficSelector {
        TrafficSelector {
            criteria: self.criteria,
        }
    }
}

/// A single action, applied in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instruction {
    SetEthDst(MacAddress),
    /// Push an empty label header; always followed by `SetMplsLabel`.
    PushMpls,
    SetMplsLabel(MplsLabel),
    /// Pop the outermost label and restore the given EtherType.
    PopMpls(EtherType),
    Output(PortNumber),
}

/// Ordered list of actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TrafficTreatment {
    instructions: Vec<Instruction>,
}

impl TrafficTreatment {
    pub fn builder() -> TrafficTreatmentBuilder {
        TrafficTreatmentBuilder::default()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn output_port(&self) -> Option<PortNumber> {
        self.instructions.iter().find_map(|i| match i {
            Instruction::Output(port) => Some(*port),
            _ => None,
        })
    }

    pub fn eth_dst(&self) -> Option<MacAddress> {
        self.instructions.iter().find_map(|i| match i {
            Instruction::SetEthDst(mac) => Some(*mac),
            _ => None,
        })
    }

    /// Label written by this treatment, whether pushed or swapped in.
    pub fn mpls_label(&self) -> Option<MplsLabel> {
        self.instructions.iter().find_map(|i| match i {
            Instruction::SetMplsLabel(label) => Some(*label),
            _ => None,
        })
    }

    pub fn pushes_mpls(&self) -> bool {
        self.instructions.contains(&Instruction::PushMpls)
    }

    pub fn pops_mpls(&self) -> bool {
        self.instructions
            .iter()
            .any(|i| matches!(i, Instruction::PopMpls(_)))
    }

    /// Label replaced in place (set without a preceding push).
    pub fn swapped_label(&self) -> Option<MplsLabel> {
        if self.pushes_mpls() {
            None
        } else {
            self.mpls_label()
        }
    }
}

#[derive(Debug, Default)]
pub struct TrafficTreatmentBuilder {
    instructions: Vec<Instruction>,
}

impl TrafficTreatmentBuilder {
    pub fn set_eth_dst(mut self, mac: MacAddress) -> Self {
        self.instructions.push(Instruction::SetEthDst(mac));
        self
    }

    pub fn push_mpls(mut self, label: MplsLabel) -> Self {
        self.instructions.push(Instruction::PushMpls);
        self.instructions.push(Instruction::SetMplsLabel(label));
        self
    }

    pub fn swap_mpls(mut self, label: MplsLabel) -> Self {
        self.instructions.push(Instruction::SetMplsLabel(label));
        self
    }

    pub fn pop_mpls(mut self, restored: EtherType) -> Self {
        self.instructions.push(Instruction::PopMpls(restored));
        self
    }

    pub fn output(mut self, port: PortNumber) -> Self {
        self.instructions.push(Instruction::Output(port));
        self
    }

    pub fn build(self) -> TrafficTreatment {
        TrafficTreatment {
            instructions: self.instructions,
        }
    }
}

/// A rule to install on one device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlowRule {
    pub id: FlowRuleId,
    pub device: DeviceId,
    pub selector: TrafficSelector,
    pub treatment: TrafficTreatment,
    pub priority: u16,
}

impl FlowRule {
    pub fn new(
        id: FlowRuleId,
        device: DeviceId,
        selector: TrafficSelector,
        treatment: TrafficTreatment,
        priority: u16,
    ) -> Self {
        Self {
            id,
            device,
            selector,
            treatment,
            priority,
        }
    }
}

impl fmt::Display for FlowRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rule {} on {} prio {} match {:?} => {:?}",
            self.id,
            self.device,
            self.priority,
            self.selector.criteria(),
            self.treatment.instructions()
        )
    }
}

/// Pushes rules to devices.
///
/// Calls are fire-and-forget from the engine's point of view: an `Ok` means
/// the request was accepted, not that the device has applied it.
pub trait FlowProgrammer: Send + Sync {
    fn install(&self, rule: &FlowRule) -> DataplaneResult<()>;

    fn remove(&self, rule: &FlowRule) -> DataplaneResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;

    fn label(v: u32) -> MplsLabel {
        MplsLabel::new(v).unwrap()
    }

    #[test]
    fn test_ipv4_match_implies_ethertype_once() {
        let selector = TrafficSelector::builder()
            .match_in_port(PortNumber::new(1))
            .match_eth_type(EtherType::Ipv4)
            .match_ipv4_dst(Ipv4Prefix::host(Ipv4Addr::new(10, 0, 0, 2)))
            .build();
        let eth_types = selector
            .criteria()
            .iter()
            .filter(|c| matches!(c, Criterion::EthType(_)))
            .count();
        assert_eq!(eth_types, 1);
        assert_eq!(selector.in_port(), Some(PortNumber::new(1)));
        assert_eq!(
            selector.ipv4_dst(),
            Some(Ipv4Prefix::host(Ipv4Addr::new(10, 0, 0, 2)))
        );
    }

    #[test]
    fn test_mpls_selector() {
        let selector = TrafficSelector::builder()
            .match_in_port(PortNumber::new(3))
            .match_mpls_label(label(5))
            .match_mpls_bos(true)
            .build();
        assert_eq!(selector.eth_type(), Some(EtherType::MplsUnicast));
        assert_eq!(selector.mpls_label(), Some(label(5)));
        assert_eq!(selector.mpls_bos(), Some(true));
        assert_eq!(selector.ipv4_dst(), None);
    }

    #[test]
    fn test_treatment_push_swap_pop() {
        let push = TrafficTreatment::builder()
            .push_mpls(label(9))
            .output(PortNumber::new(2))
            .build();
        assert!(push.pushes_mpls());
        assert_eq!(push.mpls_label(), Some(label(9)));
        assert_eq!(push.swapped_label(), None);

        let swap = TrafficTreatment::builder()
            .swap_mpls(label(4))
            .output(PortNumber::new(2))
            .build();
        assert!(!swap.pushes_mpls());
        assert_eq!(swap.swapped_label(), Some(label(4)));

        let pop = TrafficTreatment::builder()
            .pop_mpls(EtherType::Ipv4)
            .output(PortNumber::new(7))
            .build();
        assert!(pop.pops_mpls());
        assert_eq!(pop.mpls_label(), None);
        assert_eq!(pop.output_port(), Some(PortNumber::new(7)));
    }
}
