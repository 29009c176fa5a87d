//! Turns a host pair and a device path into per-hop rules.

use super::types::{FlowRuleRecord, HopPorts, HopRole};
use crate::directory::VirtualLink;
use crate::error::{Result, SlicingError};
use crate::host::ForwardRequest;
use crate::label::LabelManager;
use log::debug;
use slice_dataplane::{EtherType, FlowRule, FlowRuleId, TrafficSelector, TrafficTreatment};
use slice_types::{ConnectPoint, DeviceId, Ipv4Prefix, MplsLabel};

/// Builds the match/action program for a flow.
///
/// Rule ids are issued from a counter owned by the builder, so one builder
/// must be shared by everything that installs rules.
#[derive(Debug, Clone)]
pub struct FlowPathBuilder {
    priority: u16,
    next_rule_id: u64,
}

impl FlowPathBuilder {
    pub const DEFAULT_PRIORITY: u16 = 100;

    pub fn new(priority: u16) -> Self {
        Self {
            priority,
            next_rule_id: 1,
        }
    }

    pub fn priority(&self) -> u16 {
        self.priority
    }

    fn next_id(&mut self) -> FlowRuleId {
        let id = FlowRuleId::new(self.next_rule_id);
        self.next_rule_id += 1;
        id
    }

    fn rule(&mut self, device: &DeviceId, selector: TrafficSelector, treatment: TrafficTreatment) -> FlowRule {
        let id = self.next_id();
        FlowRule::new(id, device.clone(), selector, treatment, self.priority)
    }

    /// Derives the (device, in port, out port) of every hop.
    ///
    /// The first hop enters on the source host's port, the last leaves on
    /// the destination host's port, and every other port comes from the
    /// links. `links` must be non-empty and chained end to end from `src`'s
    /// device to `dst`'s device.
    pub fn hops(src: &ConnectPoint, dst: &ConnectPoint, links: &[VirtualLink]) -> Result<Vec<HopPorts>> {
        let (first, last) = match (links.first(), links.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(SlicingError::InvalidPath("no links".to_string())),
        };
        if first.src.device != src.device || last.dst.device != dst.device {
            return Err(SlicingError::InvalidPath(format!(
                "links run {} -> {}, hosts sit on {} and {}",
                first.src.device, last.dst.device, src.device, dst.device
            )));
        }

        let mut hops = Vec::with_capacity(links.len() + 1);
        hops.push(HopPorts {
            device: src.device.clone(),
            in_port: src.port,
            out_port: first.src.port,
        });
        for pair in links.windows(2) {
            let (inbound, outbound) = (&pair[0], &pair[1]);
            if inbound.dst.device != outbound.src.device {
                return Err(SlicingError::InvalidPath(format!(
                    "link into {} is followed by a link out of {}",
                    inbound.dst.device, outbound.src.device
                )));
            }
            hops.push(HopPorts {
                device: inbound.dst.device.clone(),
                in_port: inbound.dst.port,
                out_port: outbound.src.port,
            });
        }
        hops.push(HopPorts {
            device: dst.device.clone(),
            in_port: last.dst.port,
            out_port: dst.port,
        });
        Ok(hops)
    }

    /// Single rule for hosts on the same device.
    pub fn same_device_rule(&mut self, request: &ForwardRequest) -> FlowRuleRecord {
        let device = &request.src.location.device;
        let selector = TrafficSelector::builder()
            .match_in_port(request.src.location.port)
            .match_ipv4_dst(Ipv4Prefix::host(request.pair.dst))
            .build();
        let mut treatment = TrafficTreatment::builder();
        if request.routed {
            treatment = treatment.set_eth_dst(request.dst.mac);
        }
        let treatment = treatment.output(request.dst.location.port).build();

        FlowRuleRecord {
            device: device.clone(),
            in_port: request.src.location.port,
            out_port: request.dst.location.port,
            rewrites_eth_dst: request.routed,
            rule: self.rule(device, selector, treatment),
            label: None,
            destination: request.dst.id,
        }
    }

    /// Rules for a path of two or more hops, in path order.
    ///
    /// Labels are handed out from the destination backwards so every device
    /// knows the label its downstream neighbour expects. The terminating and
    /// transit hops each take a reference on their own label; if any
    /// allocation fails the references already taken are dropped again.
    pub fn path_rules(
        &mut self,
        labels: &mut LabelManager,
        request: &ForwardRequest,
        hops: &[HopPorts],
    ) -> Result<Vec<FlowRuleRecord>> {
        if hops.len() < 2 {
            return Err(SlicingError::InvalidPath(format!(
                "{} hop(s) is not a multi-device path",
                hops.len()
            )));
        }

        let mut acquired: Vec<(DeviceId, MplsLabel)> = Vec::new();
        let mut records = Vec::with_capacity(hops.len());
        let mut downstream: Option<MplsLabel> = None;

        for (index, hop) in hops.iter().enumerate().rev() {
            let role = HopRole::at(index, hops.len());
            let record = match (role, downstream) {
                (HopRole::Terminating, _) => {
                    let label = match labels.acquire_label(&hop.device, request.network, request.dst.id) {
                        Ok(label) => label,
                        Err(e) => {
                            Self::rollback(labels, request, &acquired);
                            return Err(e);
                        }
                    };
                    acquired.push((hop.device.clone(), label));
                    downstream = Some(label);
                    self.terminating(hop, label, request)
                }
                (HopRole::Transit, Some(next)) => {
                    let label = match labels.acquire_label(&hop.device, request.network, request.dst.id) {
                        Ok(label) => label,
                        Err(e) => {
                            Self::rollback(labels, request, &acquired);
                            return Err(e);
                        }
                    };
                    acquired.push((hop.device.clone(), label));
                    downstream = Some(label);
                    self.transit(hop, label, next, request)
                }
                (HopRole::Originating, Some(next)) => self.originating(hop, next, request),
                (_, None) => {
                    Self::rollback(labels, request, &acquired);
                    return Err(SlicingError::InvalidPath(format!(
                        "no downstream label at {}",
                        hop.device
                    )));
                }
            };
            debug!("FlowPathBuilder: {:?} hop {}", role, record.rule);
            records.push(record);
        }

        records.reverse();
        Ok(records)
    }

    fn terminating(&mut self, hop: &HopPorts, label: MplsLabel, request: &ForwardRequest) -> FlowRuleRecord {
        let selector = TrafficSelector::builder()
            .match_in_port(hop.in_port)
            .match_mpls_label(label)
            .match_mpls_bos(true)
            .build();
        let treatment = TrafficTreatment::builder()
            .pop_mpls(EtherType::Ipv4)
            .output(hop.out_port)
            .build();
        FlowRuleRecord {
            device: hop.device.clone(),
            in_port: hop.in_port,
            out_port: hop.out_port,
            rewrites_eth_dst: false,
            rule: self.rule(&hop.device, selector, treatment),
            label: Some(label),
            destination: request.dst.id,
        }
    }

    fn transit(
        &mut self,
        hop: &HopPorts,
        label: MplsLabel,
        next: MplsLabel,
        request: &ForwardRequest,
    ) -> FlowRuleRecord {
        let selector = TrafficSelector::builder()
            .match_in_port(hop.in_port)
            .match_mpls_label(label)
            .build();
        let treatment = TrafficTreatment::builder()
            .swap_mpls(next)
            .output(hop.out_port)
            .build();
        FlowRuleRecord {
            device: hop.device.clone(),
            in_port: hop.in_port,
            out_port: hop.out_port,
            rewrites_eth_dst: false,
            rule: self.rule(&hop.device, selector, treatment),
            label: Some(label),
            destination: request.dst.id,
        }
    }

    fn originating(&mut self, hop: &HopPorts, next: MplsLabel, request: &ForwardRequest) -> FlowRuleRecord {
        let selector = TrafficSelector::builder()
            .match_in_port(hop.in_port)
            .match_ipv4_dst(Ipv4Prefix::host(request.pair.dst))
            .build();
        let mut treatment = TrafficTreatment::builder();
        if request.routed {
            treatment = treatment.set_eth_dst(request.dst.mac);
        }
        let treatment = treatment.push_mpls(next).output(hop.out_port).build();
        FlowRuleRecord {
            device: hop.device.clone(),
            in_port: hop.in_port,
            out_port: hop.out_port,
            rewrites_eth_dst: request.routed,
            rule: self.rule(&hop.device, selector, treatment),
            label: None,
            destination: request.dst.id,
        }
    }

    fn rollback(labels: &mut LabelManager, request: &ForwardRequest, acquired: &[(DeviceId, MplsLabel)]) {
        for (device, label) in acquired {
            labels.release_label(device, request.network, request.dst.id, *label);
        }
    }
}

impl Default for FlowPathBuilder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PRIORITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::VirtualHost;
    use crate::flow::FlowPair;
    use crate::label::LabelPools;
    use pretty_assertions::assert_eq;
    use slice_dataplane::Instruction;
    use slice_types::{MacAddress, NetworkId, PortNumber, TenantId};
    use std::net::Ipv4Addr;

    const NET: NetworkId = NetworkId::new(1);

    fn cp(s: &str) -> ConnectPoint {
        s.parse().unwrap()
    }

    fn link(src: &str, dst: &str) -> VirtualLink {
        VirtualLink::new(cp(src), cp(dst))
    }

    fn host(last: u8, location: &str) -> VirtualHost {
        VirtualHost::new(
            MacAddress::new([0, 0, 0, 0, 0, last]),
            Some(Ipv4Addr::new(10, 0, 0, last)),
            cp(location),
        )
    }

    fn request(src: VirtualHost, dst: VirtualHost, routed: bool) -> ForwardRequest {
        let pair = FlowPair::new(
            src.ips.iter().next().copied().unwrap(),
            dst.ips.iter().next().copied().unwrap(),
        );
        ForwardRequest {
            tenant: TenantId::new("acme"),
            network: NET,
            src,
            dst,
            pair,
            routed,
        }
    }

    fn label(v: u32) -> MplsLabel {
        MplsLabel::new(v).unwrap()
    }

    #[test]
    fn test_hops_from_links() {
        let links = vec![link("x/3", "y/1"), link("y/2", "z/4")];
        let hops = FlowPathBuilder::hops(&cp("x/1"), &cp("z/2"), &links).unwrap();

        let ports: Vec<_> = hops
            .iter()
            .map(|h| (h.device.to_string(), h.in_port.get(), h.out_port.get()))
            .collect();
        assert_eq!(
            ports,
            vec![
                ("x".to_string(), 1, 3),
                ("y".to_string(), 1, 2),
                ("z".to_string(), 4, 2),
            ]
        );
    }

    #[test]
    fn test_hops_reject_broken_chains() {
        assert!(FlowPathBuilder::hops(&cp("x/1"), &cp("z/2"), &[]).is_err());
        assert!(FlowPathBuilder::hops(&cp("x/1"), &cp("z/2"), &[link("x/3", "y/1")]).is_err());
        assert!(FlowPathBuilder::hops(
            &cp("x/1"),
            &cp("z/2"),
            &[link("x/3", "y/1"), link("q/2", "z/4")]
        )
        .is_err());
    }

    #[test]
    fn test_same_device_rule() {
        let mut builder = FlowPathBuilder::default();
        let record = builder.same_device_rule(&request(host(1, "x/1"), host(2, "x/2"), false));

        assert_eq!(record.device.as_str(), "x");
        assert_eq!(record.label, None);
        assert_eq!(record.rule.priority, 100);
        assert_eq!(record.rule.selector.in_port(), Some(PortNumber::new(1)));
        assert_eq!(
            record.rule.selector.ipv4_dst(),
            Some(Ipv4Prefix::host(Ipv4Addr::new(10, 0, 0, 2)))
        );
        assert_eq!(record.rule.treatment.output_port(), Some(PortNumber::new(2)));
        assert_eq!(record.rule.treatment.eth_dst(), None);
    }

    #[test]
    fn test_same_device_routed_rewrites_mac() {
        let mut builder = FlowPathBuilder::default();
        let record = builder.same_device_rule(&request(host(1, "x/1"), host(2, "x/2"), true));
        assert_eq!(
            record.rule.treatment.eth_dst(),
            Some(MacAddress::new([0, 0, 0, 0, 0, 2]))
        );
    }

    #[test]
    fn test_three_hop_label_chain() {
        let mut builder = FlowPathBuilder::default();
        let mut labels = LabelManager::new();
        let req = request(host(1, "x/1"), host(2, "z/2"), false);
        let hops =
            FlowPathBuilder::hops(&cp("x/1"), &cp("z/2"), &[link("x/3", "y/1"), link("y/2", "z/4")])
                .unwrap();

        let records = builder.path_rules(&mut labels, &req, &hops).unwrap();
        assert_eq!(records.len(), 3);

        let (x, y, z) = (&records[0], &records[1], &records[2]);
        assert_eq!(z.device.as_str(), "z");
        assert_eq!(z.label, Some(label(1)));
        assert_eq!(z.rule.selector.mpls_label(), Some(label(1)));
        assert_eq!(z.rule.selector.mpls_bos(), Some(true));
        assert!(z.rule.treatment.pops_mpls());
        assert_eq!(z.rule.treatment.output_port(), Some(PortNumber::new(2)));

        assert_eq!(y.label, Some(label(1)));
        assert_eq!(y.rule.selector.mpls_label(), Some(label(1)));
        assert_eq!(y.rule.selector.in_port(), Some(PortNumber::new(1)));
        assert_eq!(y.rule.treatment.swapped_label(), Some(label(1)));
        assert_eq!(y.rule.treatment.output_port(), Some(PortNumber::new(2)));

        assert_eq!(x.label, None);
        assert!(x.rule.treatment.pushes_mpls());
        assert_eq!(x.rule.treatment.mpls_label(), y.label);
        assert_eq!(x.rule.treatment.output_port(), Some(PortNumber::new(3)));
        assert_eq!(
            x.rule.selector.ipv4_dst(),
            Some(Ipv4Prefix::host(Ipv4Addr::new(10, 0, 0, 2)))
        );

        // Destination first: the terminating rule got the first id.
        assert!(z.rule.id.as_raw() < y.rule.id.as_raw());
        assert!(y.rule.id.as_raw() < x.rule.id.as_raw());
    }

    #[test]
    fn test_two_hop_path_has_no_transit() {
        let mut builder = FlowPathBuilder::default();
        let mut labels = LabelManager::new();
        let req = request(host(1, "x/1"), host(2, "y/2"), true);
        let hops = FlowPathBuilder::hops(&cp("x/1"), &cp("y/2"), &[link("x/3", "y/1")]).unwrap();

        let records = builder.path_rules(&mut labels, &req, &hops).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].rule.treatment.pushes_mpls());
        assert_eq!(
            records[0].rule.treatment.instructions()[0],
            Instruction::SetEthDst(MacAddress::new([0, 0, 0, 0, 0, 2]))
        );
        assert!(records[1].rule.treatment.pops_mpls());
    }

    #[test]
    fn test_exhaustion_rolls_back_acquired_labels() {
        let mut builder = FlowPathBuilder::default();
        let mut labels = LabelManager::with_pools(LabelPools::with_limit(1));
        let y: DeviceId = "y".parse().unwrap();
        let z: DeviceId = "z".parse().unwrap();
        // Use up y's only label on another destination.
        labels.acquire_label(&y, NET, host(9, "y/9").id).unwrap();

        let req = request(host(1, "x/1"), host(2, "z/2"), false);
        let hops =
            FlowPathBuilder::hops(&cp("x/1"), &cp("z/2"), &[link("x/3", "y/1"), link("y/2", "z/4")])
                .unwrap();

        assert!(matches!(
            builder.path_rules(&mut labels, &req, &hops),
            Err(SlicingError::LabelSpaceExhausted(d)) if d == y
        ));
        assert_eq!(labels.bound_label(&z, NET, req.dst.id), None);
        assert_eq!(labels.pool(&z).map(|p| p.withdrawn_count()), Some(1));
    }
}
