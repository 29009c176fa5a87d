//! Classifies punted frames: tenant network, source learning, ARP answers and
//! destination lookup.

use super::routed::RoutedNetworks;
use crate::directory::{EdgeClassifier, TenantDirectory, VirtualHost};
use crate::flow::FlowPair;
use crate::slicing::DropReason;
use log::{debug, trace, warn};
use slice_dataplane::{ArpOperation, EthernetFrame, InboundPacket, OutboundPacket, Payload};
use slice_types::{ConnectPoint, HostId, MacAddress, NetworkId, TenantId};
use std::net::Ipv4Addr;
use std::sync::Arc;

/// MAC the slice gateways answer ARP with.
pub const DEFAULT_GATEWAY_MAC: MacAddress = MacAddress::new([0x00, 0x01, 0x02, 0x03, 0x04, 0x05]);

/// Everything the path builder needs to serve one IPv4 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardRequest {
    pub tenant: TenantId,
    pub network: NetworkId,
    pub src: VirtualHost,
    pub dst: VirtualHost,
    pub pair: FlowPair,
    /// Frame was addressed to the gateway MAC; the destination MAC must be
    /// rewritten on the way.
    pub routed: bool,
}

impl ForwardRequest {
    pub fn same_device(&self) -> bool {
        self.src.location.device == self.dst.location.device
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// ARP request answered locally; emit `reply` and install nothing.
    ArpReply {
        tenant: TenantId,
        network: NetworkId,
        reply: OutboundPacket,
        target_ip: Ipv4Addr,
        via_gateway: bool,
    },
    Forward(ForwardRequest),
}

pub struct HostResolver {
    directory: Arc<dyn TenantDirectory>,
    edges: Arc<dyn EdgeClassifier>,
    gateway_mac: MacAddress,
}

impl HostResolver {
    pub fn new(
        directory: Arc<dyn TenantDirectory>,
        edges: Arc<dyn EdgeClassifier>,
        gateway_mac: MacAddress,
    ) -> Self {
        Self {
            directory,
            edges,
            gateway_mac,
        }
    }

    pub fn gateway_mac(&self) -> MacAddress {
        self.gateway_mac
    }

    pub fn resolve(&self, packet: &InboundPacket, routed: &RoutedNetworks) -> Result<Resolution, DropReason> {
        let ingress = &packet.received_from;
        if !self.edges.is_edge(ingress) {
            return Err(DropReason::NotEdgePort);
        }

        let frame = EthernetFrame::parse(&packet.data).map_err(|e| {
            trace!("HostResolver: undecodable frame from {}: {}", ingress, e);
            DropReason::Unparseable
        })?;

        let (tenant, network) = self.network_of(ingress).ok_or(DropReason::UnknownNetwork)?;

        if let Payload::Other(ether_type) = frame.payload {
            trace!("HostResolver: ignoring {} frame from {}", ether_type, ingress);
            return Err(DropReason::UnsupportedPayload);
        }

        let src = self.learn_source(network, &frame, ingress)?;

        match frame.payload {
            Payload::Arp(arp) => {
                if arp.operation != ArpOperation::Request {
                    return Err(DropReason::UnsupportedPayload);
                }
                let (answer, via_gateway) = if routed.is_gateway(network, arp.target_ip) {
                    (self.gateway_mac, true)
                } else {
                    let host = self
                        .directory
                        .host_by_ip(network, arp.target_ip)
                        .ok_or(DropReason::UnresolvedArpTarget)?;
                    (host.mac, false)
                };
                let reply = frame.arp_reply(answer).ok_or(DropReason::UnsupportedPayload)?;
                debug!(
                    "HostResolver: {} asks for {}, answering {}",
                    src.id, arp.target_ip, answer
                );
                Ok(Resolution::ArpReply {
                    tenant,
                    network,
                    reply: OutboundPacket::new(ingress.clone(), reply.to_bytes()),
                    target_ip: arp.target_ip,
                    via_gateway,
                })
            }
            Payload::Ipv4(ip) => {
                let to_gateway = frame.dst == self.gateway_mac;
                let dst = match to_gateway {
                    true => self.directory.host_by_ip(network, ip.dst),
                    false => self.directory.host(network, HostId::from_mac(frame.dst)),
                };
                let dst = dst.ok_or(DropReason::UnresolvedDestination)?;

                Ok(Resolution::Forward(ForwardRequest {
                    tenant,
                    network,
                    src,
                    dst,
                    pair: FlowPair::new(ip.src, ip.dst),
                    routed: to_gateway,
                }))
            }
            Payload::Other(_) => Err(DropReason::UnsupportedPayload),
        }
    }

    /// Finds the tenant network owning the virtual port bound to `point`.
    pub fn network_of(&self, point: &ConnectPoint) -> Option<(TenantId, NetworkId)> {
        for tenant in self.directory.tenants() {
            for network in self.directory.networks(&tenant) {
                for device in self.directory.devices(network) {
                    let bound = self
                        .directory
                        .ports(network, &device)
                        .iter()
                        .any(|port| port.realized_by.as_ref() == Some(point));
                    if bound {
                        return Some((tenant, network));
                    }
                }
            }
        }
        None
    }

    /// Looks up the sender, creating it on first sight. A known host keeps
    /// its first location.
    fn learn_source(
        &self,
        network: NetworkId,
        frame: &EthernetFrame,
        ingress: &ConnectPoint,
    ) -> Result<VirtualHost, DropReason> {
        if let Some(host) = self.directory.host(network, HostId::from_mac(frame.src)) {
            if &host.location != ingress {
                warn!(
                    "HostResolver: host {} seen at {} but stays at {}",
                    host.id, ingress, host.location
                );
            }
            return Ok(host);
        }

        let host = VirtualHost::new(frame.src, frame.source_ip(), ingress.clone());
        self.directory.create_host(network, host).map_err(|e| {
            warn!("HostResolver: cannot learn {} in network {}: {}", frame.src, network, e);
            DropReason::HostLearningFailed
        })
    }
}
