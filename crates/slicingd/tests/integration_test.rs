//! End-to-end tests for the slicing engine.
//!
//! These drive SlicingOrch through the in-memory tenant directory, flow
//! programmer and packet sink, the same way the daemon runs without a
//! controller attached.

use pretty_assertions::assert_eq;
use slice_common::Orch;
use slice_dataplane::{
    ArpOperation, EthernetFrame, InMemoryProgrammer, InboundPacket, PacketRecord, Payload,
    RecordingPacketIo,
};
use slice_types::{ConnectPoint, DeviceId, HostId, Ipv4Prefix, MacAddress, MplsLabel, NetworkId, PortNumber, TenantId};
use slicingd::directory::{InMemoryDirectory, LinkState, VirtualPort};
use slicingd::flow::FlowPair;
use slicingd::host::DEFAULT_GATEWAY_MAC;
use slicingd::topology::{LinkChange, TopologyEvent};
use slicingd::{
    DropReason, PacketOutcome, SliceDaemon, SliceDaemonConfig, SliceEvent, SlicingConfig, SlicingOrch,
    SlicingOrchConfig,
};
use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::sync::Arc;

const NET: NetworkId = NetworkId::new(1);

fn cp(s: &str) -> ConnectPoint {
    s.parse().unwrap()
}

fn dev(s: &str) -> DeviceId {
    s.parse().unwrap()
}

fn mac(last: u8) -> MacAddress {
    MacAddress::new([0, 0, 0, 0, 0, last])
}

fn ip(last: u8) -> Ipv4Addr {
    Ipv4Addr::new(10, 0, 0, last)
}

fn host(last: u8) -> HostId {
    HostId::from_mac(mac(last))
}

fn label(value: u32) -> MplsLabel {
    MplsLabel::new(value).unwrap()
}

fn port(number: u32) -> PortNumber {
    PortNumber::new(number)
}

// Host attachment points:
//   A (.1) x/1   B (.2) z/2   C (.3) x/3   D (.4) y/3   E (.5) z/3
const A: (u8, &str) = (1, "x/1");
const B: (u8, &str) = (2, "z/2");
const C: (u8, &str) = (3, "x/3");
const D: (u8, &str) = (4, "y/3");
const E: (u8, &str) = (5, "z/3");

struct Slice {
    dir: Arc<InMemoryDirectory>,
    programmer: Arc<InMemoryProgrammer>,
    packets: Arc<RecordingPacketIo>,
    orch: SlicingOrch,
}

/// Devices x, y and z with ports 1-4, chained x/2 <-> y/1 and y/2 <-> z/1.
fn slice_with(config: SlicingOrchConfig) -> Slice {
    let dir = Arc::new(InMemoryDirectory::new());
    let tenant = TenantId::new("acme");
    dir.add_tenant(tenant.clone());
    dir.add_network(&tenant, NET).unwrap();
    for device in ["x", "y", "z"] {
        dir.add_device(NET, dev(device)).unwrap();
        for number in 1..=4u32 {
            dir.add_port(
                NET,
                VirtualPort::new(dev(device), number).realized_by(ConnectPoint::new(dev(device), number)),
            )
            .unwrap();
        }
    }
    dir.add_bidirectional_link(NET, cp("x/2"), cp("y/1")).unwrap();
    dir.add_bidirectional_link(NET, cp("y/2"), cp("z/1")).unwrap();
    dir.set_edge_ports([A.1, B.1, C.1, D.1, E.1].into_iter().map(cp));

    let programmer = Arc::new(InMemoryProgrammer::new());
    let packets = Arc::new(RecordingPacketIo::new());
    let orch = SlicingOrch::new(config, dir.clone(), dir.clone(), programmer.clone(), packets.clone());
    Slice {
        dir,
        programmer,
        packets,
        orch,
    }
}

fn slice() -> Slice {
    slice_with(SlicingOrchConfig::default())
}

fn arp(from: (u8, &str), target: Ipv4Addr) -> InboundPacket {
    let (id, at) = from;
    InboundPacket::new(cp(at), EthernetFrame::arp_request(mac(id), ip(id), target).to_bytes())
}

fn ipv4(from: (u8, &str), to: (u8, &str)) -> InboundPacket {
    let (src, at) = from;
    let dst = to.0;
    InboundPacket::new(cp(at), EthernetFrame::ipv4(mac(dst), mac(src), ip(src), ip(dst)).to_bytes())
}

impl Slice {
    /// Lets the engine learn hosts from ARP requests nobody answers.
    fn learn(&self, hosts: &[(u8, &str)]) {
        for &h in hosts {
            assert_eq!(
                self.orch.process_packet(&arp(h, ip(99))),
                PacketOutcome::Dropped(DropReason::UnresolvedArpTarget)
            );
        }
    }

    fn send(&self, from: (u8, &str), to: (u8, &str)) -> PacketOutcome {
        self.orch.process_packet(&ipv4(from, to))
    }

    fn bound(&self, device: &str, dst: (u8, &str)) -> Option<MplsLabel> {
        self.orch.bound_label(&dev(device), NET, host(dst.0))
    }
}

// ============================================================================
// Worked three-device example
// ============================================================================

#[test]
fn test_three_device_path_push_swap_pop() {
    let s = slice();
    s.learn(&[A, B]);

    assert_eq!(
        s.send(A, B),
        PacketOutcome::Installed {
            network: NET,
            pair: FlowPair::new(ip(1), ip(2)),
            rules: 3,
            superseded: false,
        }
    );

    let z = s.programmer.rules_on(&dev("z"));
    assert_eq!(z.len(), 1);
    assert_eq!(z[0].selector.in_port(), Some(port(1)));
    assert_eq!(z[0].selector.mpls_label(), Some(label(1)));
    assert_eq!(z[0].selector.mpls_bos(), Some(true));
    assert!(z[0].treatment.pops_mpls());
    assert_eq!(z[0].treatment.output_port(), Some(port(2)));

    let y = s.programmer.rules_on(&dev("y"));
    assert_eq!(y.len(), 1);
    assert_eq!(y[0].selector.in_port(), Some(port(1)));
    assert_eq!(y[0].selector.mpls_label(), Some(label(1)));
    assert_eq!(y[0].treatment.swapped_label(), Some(label(1)));
    assert_eq!(y[0].treatment.output_port(), Some(port(2)));

    let x = s.programmer.rules_on(&dev("x"));
    assert_eq!(x.len(), 1);
    assert_eq!(x[0].selector.in_port(), Some(port(1)));
    assert_eq!(x[0].selector.ipv4_dst(), Some(Ipv4Prefix::host(ip(2))));
    assert!(x[0].treatment.pushes_mpls());
    assert_eq!(x[0].treatment.mpls_label(), Some(label(1)));
    assert_eq!(x[0].treatment.output_port(), Some(port(2)));

    // The first frame itself leaves x towards y.
    assert!(matches!(
        s.packets.take().last(),
        Some(PacketRecord::Forwarded { out_port, .. }) if *out_port == port(2)
    ));

    let flows = s.orch.list_flows(NET);
    assert_eq!(flows.len(), 1);
    assert_eq!(flows[0].path, vec![dev("x"), dev("y"), dev("z")]);
    assert_eq!(flows[0].labels, vec![(dev("y"), label(1)), (dev("z"), label(1))]);

    let report = s.orch.delete_flow(NET, ip(1), ip(2)).unwrap();
    assert_eq!(report.rules_removed, 3);
    assert_eq!(report.removal_failures, 0);
    assert_eq!(report.labels_released, 2);
    assert!(s.programmer.is_empty());
    assert!(s.orch.list_flows(NET).is_empty());
    assert_eq!(s.bound("y", B), None);
    assert_eq!(s.bound("z", B), None);
}

// ============================================================================
// Path shapes
// ============================================================================

#[test]
fn test_same_device_hosts_get_one_plain_rule() {
    let s = slice();
    s.learn(&[A, C]);

    assert!(matches!(s.send(A, C), PacketOutcome::Installed { rules: 1, .. }));

    let rules = s.programmer.rules();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].device, dev("x"));
    assert_eq!(rules[0].selector.in_port(), Some(port(1)));
    assert_eq!(rules[0].treatment.output_port(), Some(port(3)));
    assert!(!rules[0].treatment.pushes_mpls());
    assert_eq!(rules[0].treatment.mpls_label(), None);

    let flows = s.orch.list_flows(NET);
    assert_eq!(flows[0].path, vec![dev("x")]);
    assert!(flows[0].labels.is_empty());
}

#[test]
fn test_one_link_path_has_originating_and_terminating_rules() {
    let s = slice();
    s.learn(&[A, D]);

    assert!(matches!(s.send(A, D), PacketOutcome::Installed { rules: 2, .. }));
    let x = s.programmer.rules_on(&dev("x"));
    let y = s.programmer.rules_on(&dev("y"));
    assert_eq!(x[0].treatment.mpls_label(), y[0].selector.mpls_label());
    assert!(x[0].treatment.pushes_mpls());
    assert!(y[0].treatment.pops_mpls());
    assert_eq!(y[0].treatment.output_port(), Some(port(3)));
}

#[test]
fn test_flows_to_same_destination_share_labels() {
    let s = slice();
    s.learn(&[A, B, C]);

    s.send(A, B);
    s.send(C, B);

    // One label per device for B, each rule holding a reference.
    assert_eq!(s.bound("y", B), Some(label(1)));
    assert_eq!(s.bound("z", B), Some(label(1)));
    assert_eq!(s.programmer.len(), 6);

    s.orch.delete_flow(NET, ip(1), ip(2)).unwrap();
    assert_eq!(s.bound("z", B), Some(label(1)));

    s.orch.delete_flow(NET, ip(3), ip(2)).unwrap();
    assert_eq!(s.bound("z", B), None);
}

// ============================================================================
// Label reuse
// ============================================================================

#[test]
fn test_released_labels_are_reissued_oldest_first() {
    let s = slice();
    s.learn(&[A, B, E]);

    s.send(A, B);
    s.send(A, E);
    assert_eq!(s.bound("z", B), Some(label(1)));
    assert_eq!(s.bound("z", E), Some(label(2)));

    s.orch.delete_flow(NET, ip(1), ip(2)).unwrap();
    s.orch.delete_flow(NET, ip(1), ip(5)).unwrap();

    // Reinstall in the opposite order: E takes the label released first.
    s.send(A, E);
    s.send(A, B);
    assert_eq!(s.bound("z", E), Some(label(1)));
    assert_eq!(s.bound("z", B), Some(label(2)));
    assert_eq!(s.bound("y", E), Some(label(1)));
    assert_eq!(s.bound("y", B), Some(label(2)));
}

#[test]
fn test_exhausted_label_space_drops_and_rolls_back() {
    let s = slice_with(SlicingOrchConfig {
        label_limit: Some(1),
        ..SlicingOrchConfig::default()
    });
    s.learn(&[A, B, D]);

    // y's only label goes to D.
    assert!(matches!(s.send(A, D), PacketOutcome::Installed { .. }));
    assert_eq!(s.bound("y", D), Some(label(1)));

    // z can bind B but y cannot: nothing is installed and z's label is returned.
    assert_eq!(s.send(A, B), PacketOutcome::Dropped(DropReason::LabelSpaceExhausted));
    assert_eq!(s.bound("z", B), None);
    assert_eq!(s.programmer.len(), 2);
    assert_eq!(s.orch.list_flows(NET).len(), 1);

    s.orch.delete_flow(NET, ip(1), ip(4)).unwrap();
    assert!(matches!(s.send(A, B), PacketOutcome::Installed { rules: 3, .. }));
    assert_eq!(s.bound("z", B), Some(label(1)));
    assert_eq!(s.bound("y", B), Some(label(1)));
}

// ============================================================================
// Topology changes
// ============================================================================

#[test]
fn test_link_removal_tears_down_only_broken_flows() {
    let s = slice();
    s.learn(&[A, B, D]);

    s.send(A, B);
    s.send(D, B);
    assert_eq!(s.orch.list_flows(NET).len(), 2);

    let report = s
        .orch
        .handle_topology_change(&TopologyEvent::new(vec![LinkChange::removed(cp("x/2"), cp("y/1"))]));
    assert_eq!(report.torn_down, vec![(NET, FlowPair::new(ip(1), ip(2)))]);
    assert_eq!(report.teardown.rules_removed, 3);

    let remaining = s.orch.list_flows(NET);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].pair, FlowPair::new(ip(4), ip(2)));
    assert_eq!(s.programmer.len(), 2);

    // D -> B still holds z's label; y's label for B is free again.
    assert_eq!(s.bound("z", B), Some(label(1)));
    assert_eq!(s.bound("y", B), None);
    s.send(B, D);
    assert_eq!(s.bound("y", D), Some(label(1)));

    // With the link gone from the directory the pair has no path.
    s.dir
        .set_link_state(NET, &cp("x/2"), &cp("y/1"), LinkState::Inactive)
        .unwrap();
    s.dir
        .set_link_state(NET, &cp("y/1"), &cp("x/2"), LinkState::Inactive)
        .unwrap();
    assert_eq!(s.send(A, B), PacketOutcome::Dropped(DropReason::NoPath));
}

#[test]
fn test_shorter_path_supersedes_installed_flow() {
    let s = slice();
    s.learn(&[A, B]);
    s.send(A, B);
    assert_eq!(s.send(A, B), PacketOutcome::Redirected {
        network: NET,
        pair: FlowPair::new(ip(1), ip(2)),
    });

    s.dir.add_bidirectional_link(NET, cp("x/4"), cp("z/4")).unwrap();
    assert!(matches!(
        s.send(A, B),
        PacketOutcome::Installed {
            rules: 2,
            superseded: true,
            ..
        }
    ));

    assert!(s.programmer.rules_on(&dev("y")).is_empty());
    assert_eq!(s.bound("y", B), None);
    assert_eq!(s.orch.list_flows(NET)[0].path, vec![dev("x"), dev("z")]);
    assert_eq!(s.programmer.rules_on(&dev("x"))[0].treatment.output_port(), Some(port(4)));
}

#[test]
fn test_parallel_link_reinstalls_through_new_ports() {
    let s = slice();
    s.dir.add_bidirectional_link(NET, cp("x/4"), cp("y/4")).unwrap();
    s.learn(&[A, D]);

    assert!(matches!(s.send(A, D), PacketOutcome::Installed { superseded: false, .. }));
    assert_eq!(s.programmer.rules_on(&dev("x"))[0].treatment.output_port(), Some(port(2)));

    // Same devices, but x/2 -> y/1 no longer carries traffic.
    s.dir
        .set_link_state(NET, &cp("x/2"), &cp("y/1"), LinkState::Inactive)
        .unwrap();
    s.packets.take();
    assert!(matches!(
        s.send(A, D),
        PacketOutcome::Installed {
            rules: 2,
            superseded: true,
            ..
        }
    ));

    let x = s.programmer.rules_on(&dev("x"));
    let y = s.programmer.rules_on(&dev("y"));
    assert_eq!((x.len(), y.len()), (1, 1));
    assert_eq!(x[0].treatment.output_port(), Some(port(4)));
    assert_eq!(y[0].selector.in_port(), Some(port(4)));
    assert_eq!(x[0].treatment.mpls_label(), y[0].selector.mpls_label());
    assert_eq!(s.orch.list_flows(NET)[0].path, vec![dev("x"), dev("y")]);
    assert!(matches!(
        s.packets.take().last(),
        Some(PacketRecord::Forwarded { out_port, .. }) if *out_port == port(4)
    ));

    assert!(matches!(s.send(A, D), PacketOutcome::Redirected { .. }));
}

#[test]
fn test_routed_frame_reinstalls_direct_flow_with_mac_rewrite() {
    let s = slice();
    s.learn(&[A, B]);

    assert!(matches!(s.send(A, B), PacketOutcome::Installed { .. }));
    assert_eq!(s.programmer.rules_on(&dev("x"))[0].treatment.eth_dst(), None);

    let routed = InboundPacket::new(
        cp(A.1),
        EthernetFrame::ipv4(DEFAULT_GATEWAY_MAC, mac(1), ip(1), ip(2)).to_bytes(),
    );
    assert!(matches!(
        s.orch.process_packet(&routed),
        PacketOutcome::Installed {
            rules: 3,
            superseded: true,
            ..
        }
    ));
    assert_eq!(s.programmer.len(), 3);
    assert_eq!(s.programmer.rules_on(&dev("x"))[0].treatment.eth_dst(), Some(mac(2)));
    assert_eq!(s.bound("z", B), Some(label(1)));

    assert!(matches!(s.orch.process_packet(&routed), PacketOutcome::Redirected { .. }));
}

#[test]
fn test_empty_topology_event_changes_nothing() {
    let s = slice();
    s.learn(&[A, B]);
    s.send(A, B);

    let report = s.orch.handle_topology_change(&TopologyEvent::default());
    assert!(report.torn_down.is_empty());
    assert_eq!(s.orch.list_flows(NET).len(), 1);
}

// ============================================================================
// Policies
// ============================================================================

#[test]
fn test_forbidden_pair_never_installs() {
    let s = slice();
    s.learn(&[A, B]);

    assert!(s.orch.add_forbidden_traffic(NET, ip(1), ip(2)).is_empty());
    assert_eq!(
        s.orch.list_forbidden_traffic(NET),
        vec![FlowPair::new(ip(1), ip(2)), FlowPair::new(ip(2), ip(1))]
    );
    assert_eq!(s.send(A, B), PacketOutcome::Dropped(DropReason::Forbidden));
    assert_eq!(s.send(B, A), PacketOutcome::Dropped(DropReason::Forbidden));
    assert!(s.programmer.is_empty());
    assert_eq!(s.bound("z", B), None);

    assert!(s.orch.remove_forbidden_traffic(NET, ip(2), ip(1)));
    assert!(!s.orch.remove_forbidden_traffic(NET, ip(2), ip(1)));
    assert!(matches!(s.send(A, B), PacketOutcome::Installed { .. }));
}

#[test]
fn test_arp_answers_for_known_hosts_and_gateways() {
    let s = slice();
    s.learn(&[B]);
    s.packets.take();

    assert_eq!(
        s.orch.process_packet(&arp(A, ip(2))),
        PacketOutcome::ArpReplied {
            target_ip: ip(2),
            via_gateway: false,
        }
    );
    let records = s.packets.take();
    let reply = match records.as_slice() {
        [PacketRecord::Emitted(out)] => {
            assert_eq!(out.send_to, cp(A.1));
            EthernetFrame::parse(&out.data).unwrap()
        }
        other => panic!("unexpected packet records: {:?}", other),
    };
    assert_eq!(reply.dst, mac(1));
    assert!(matches!(
        reply.payload,
        Payload::Arp(a) if a.operation == ArpOperation::Reply && a.sender_mac == mac(2)
    ));

    let cidr: Ipv4Prefix = "10.0.0.0/24".parse().unwrap();
    s.orch.add_routed_network(NET, cidr, ip(254)).unwrap();
    assert_eq!(
        s.orch.process_packet(&arp(A, ip(254))),
        PacketOutcome::ArpReplied {
            target_ip: ip(254),
            via_gateway: true,
        }
    );

    // Routed traffic is addressed to the gateway MAC; the first hop rewrites it.
    let routed = InboundPacket::new(
        cp(A.1),
        EthernetFrame::ipv4(DEFAULT_GATEWAY_MAC, mac(1), ip(1), ip(2)).to_bytes(),
    );
    assert!(matches!(s.orch.process_packet(&routed), PacketOutcome::Installed { rules: 3, .. }));
    assert_eq!(s.programmer.rules_on(&dev("x"))[0].treatment.eth_dst(), Some(mac(2)));
}

#[test]
fn test_unclassifiable_frames_are_dropped() {
    let s = slice();
    s.learn(&[A]);

    let core = InboundPacket::new(cp("x/2"), EthernetFrame::ipv4(mac(2), mac(1), ip(1), ip(2)).to_bytes());
    assert_eq!(s.orch.process_packet(&core), PacketOutcome::Dropped(DropReason::NotEdgePort));

    let garbage = InboundPacket::new(cp(A.1), vec![0xde, 0xad]);
    assert_eq!(s.orch.process_packet(&garbage), PacketOutcome::Dropped(DropReason::Unparseable));

    assert_eq!(s.send(A, B), PacketOutcome::Dropped(DropReason::UnresolvedDestination));
    assert!(s.programmer.is_empty());
    assert_eq!(s.orch.stats().drops, 4);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_packets_never_share_a_label() {
    const FLOWS: u8 = 30;
    let s = slice();

    // Destinations 10..40 each on their own port of z.
    let dsts: Vec<(u8, String)> = (10..10 + FLOWS).map(|id| (id, format!("z/{}", id))).collect();
    for (id, at) in &dsts {
        s.dir
            .add_port(NET, VirtualPort::new(dev("z"), u32::from(*id)).realized_by(cp(at)))
            .unwrap();
    }
    s.dir
        .set_edge_ports(std::iter::once(cp(A.1)).chain(dsts.iter().map(|(_, at)| cp(at))));
    s.learn(&[A]);
    for (id, at) in &dsts {
        s.learn(&[(*id, at.as_str())]);
    }

    let orch = Arc::new(s.orch);
    let workers: Vec<_> = dsts
        .iter()
        .map(|(id, at)| {
            let orch = Arc::clone(&orch);
            let packet = ipv4(A, (*id, at.as_str()));
            std::thread::spawn(move || orch.process_packet(&packet))
        })
        .collect();
    for worker in workers {
        assert!(matches!(worker.join().unwrap(), PacketOutcome::Installed { rules: 3, .. }));
    }

    for device in ["y", "z"] {
        let labels: BTreeSet<MplsLabel> = dsts
            .iter()
            .filter_map(|(id, _)| orch.bound_label(&dev(device), NET, host(*id)))
            .collect();
        assert_eq!(labels.len(), usize::from(FLOWS), "labels bound on {}", device);
    }
    assert_eq!(s.programmer.len(), 3 * usize::from(FLOWS));
    assert_eq!(orch.list_flows(NET).len(), usize::from(FLOWS));
    assert_eq!(orch.stats().flows_installed, u64::from(FLOWS));
}

// ============================================================================
// Daemon and configuration
// ============================================================================

#[tokio::test]
async fn test_daemon_drives_queued_events() {
    let s = slice();
    let producer = s.orch.producer();
    let programmer = s.programmer.clone();

    let mut daemon = SliceDaemon::new(SliceDaemonConfig::default());
    daemon.register_orch(Box::new(s.orch));

    producer.push(SliceEvent::PacketIn(arp(A, ip(99))));
    producer.push(SliceEvent::PacketIn(arp(B, ip(99))));
    producer.push(SliceEvent::PacketIn(ipv4(A, B)));
    assert!(daemon.dump()[1].contains("SlicingOrch - 3 pending"));

    assert_eq!(daemon.process_pending().await, 1);
    assert_eq!(programmer.len(), 3);

    producer.push(SliceEvent::TopologyChanged(TopologyEvent::new(vec![LinkChange::removed(
        cp("y/2"),
        cp("z/1"),
    )])));
    daemon.process_pending().await;
    assert!(programmer.is_empty());
    assert_eq!(daemon.process_pending().await, 0);
}

#[test]
fn test_engine_from_configuration() {
    let config: SlicingConfig = toml::from_str(
        r#"
edge_ports = ["x/1", "y/3"]

[[tenants]]
id = "acme"

[[tenants.networks]]
id = 1
devices = ["x", "y"]
ports = [
    { device = "x", number = 1, realized_by = "x/1" },
    { device = "y", number = 3, realized_by = "y/3" },
]
links = [{ src = "x/2", dst = "y/1" }]
routed = [{ cidr = "10.0.0.0/24", gateway = "10.0.0.254" }]
forbidden = [{ a = "10.0.0.1", b = "10.0.0.4" }]
"#,
    )
    .unwrap();
    config.validate().unwrap();

    let dir = Arc::new(config.build_directory().unwrap());
    let programmer = Arc::new(InMemoryProgrammer::new());
    let orch = SlicingOrch::new(
        config.orch_config(),
        dir.clone(),
        dir,
        programmer.clone(),
        Arc::new(RecordingPacketIo::new()),
    );
    config.apply_policies(&orch).unwrap();

    assert_eq!(orch.list_routed_networks(NET).len(), 1);
    assert_eq!(orch.list_forbidden_traffic(NET).len(), 2);

    orch.process_packet(&arp(A, ip(99)));
    orch.process_packet(&arp(D, ip(99)));
    assert_eq!(orch.process_packet(&ipv4(A, D)), PacketOutcome::Dropped(DropReason::Forbidden));

    orch.remove_forbidden_traffic(NET, ip(1), ip(4));
    assert!(matches!(orch.process_packet(&ipv4(A, D)), PacketOutcome::Installed { rules: 2, .. }));
    assert_eq!(programmer.len(), 2);
}
