//! SlicingOrch: reactive path setup, topology reaction and the management
//! surface.

use super::types::{DropReason, PacketOutcome, SliceEvent, SlicingOrchConfig, SlicingStats};
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::audit_log;
use crate::directory::{EdgeClassifier, TenantDirectory};
use crate::error::{Result, SlicingError};
use crate::flow::{FlowPair, FlowPathBuilder, FlowRuleRecord, FlowSummary, HopPorts, TeardownReport};
use crate::host::{ForwardRequest, HostResolver, Resolution, RoutedNetwork};
use crate::label::{LabelManager, LabelPools};
use crate::state::SliceState;
use crate::topology::{links_along, react, ReactionReport, TopologyEvent, TopologyGraph};
use async_trait::async_trait;
use log::{debug, info, warn};
use parking_lot::Mutex;
use slice_common::{Consumer, ConsumerConfig, Orch, Producer};
use slice_dataplane::{FlowProgrammer, InboundPacket, PacketIo};
use slice_types::{DeviceId, HostId, Ipv4Prefix, MplsLabel, NetworkId};
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Drives the slicing engine.
///
/// Packet handling, topology reactions and management calls all take
/// `&self` and serialise on the one [`SliceState`] lock, so the orch can be
/// shared between workers as well as driven by the daemon loop.
pub struct SlicingOrch {
    config: SlicingOrchConfig,
    state: Mutex<SliceState>,
    directory: Arc<dyn TenantDirectory>,
    resolver: HostResolver,
    programmer: Arc<dyn FlowProgrammer>,
    packet_io: Arc<dyn PacketIo>,
    events: Consumer<SliceEvent>,
    stats: Mutex<SlicingStats>,
}

impl SlicingOrch {
    pub fn new(
        config: SlicingOrchConfig,
        directory: Arc<dyn TenantDirectory>,
        edges: Arc<dyn EdgeClassifier>,
        programmer: Arc<dyn FlowProgrammer>,
        packet_io: Arc<dyn PacketIo>,
    ) -> Self {
        let labels = match config.label_limit {
            Some(limit) => LabelManager::with_pools(LabelPools::with_limit(limit)),
            None => LabelManager::new(),
        };
        let state = SliceState {
            labels,
            ..SliceState::new(FlowPathBuilder::new(config.priority))
        };
        let resolver = HostResolver::new(Arc::clone(&directory), edges, config.gateway_mac);
        let events = Consumer::new(ConsumerConfig::new("SLICE_EVENTS").with_batch_size(config.batch_size));

        Self {
            config,
            state: Mutex::new(state),
            directory,
            resolver,
            programmer,
            packet_io,
            events,
            stats: Mutex::new(SlicingStats::default()),
        }
    }

    pub fn config(&self) -> &SlicingOrchConfig {
        &self.config
    }

    /// Handle for platform adapters to queue packets and topology changes.
    pub fn producer(&self) -> Producer<SliceEvent> {
        self.events.producer()
    }

    pub fn stats(&self) -> SlicingStats {
        *self.stats.lock()
    }

    /// Label a device has bound for traffic towards `host`.
    pub fn bound_label(&self, device: &DeviceId, network: NetworkId, host: HostId) -> Option<MplsLabel> {
        self.state.lock().labels.bound_label(device, network, host)
    }

    // ====================================================================
    // Packet path
    // ====================================================================

    pub fn process_packet(&self, packet: &InboundPacket) -> PacketOutcome {
        let outcome = {
            let mut state = self.state.lock();
            match self.resolver.resolve(packet, &state.routed) {
                Err(reason) => PacketOutcome::Dropped(reason),
                Ok(Resolution::ArpReply {
                    reply,
                    target_ip,
                    via_gateway,
                    ..
                }) => match self.packet_io.emit(reply) {
                    Ok(()) => PacketOutcome::ArpReplied { target_ip, via_gateway },
                    Err(e) => PacketOutcome::Failed(e.to_string()),
                },
                Ok(Resolution::Forward(request)) => self.forward(&mut state, packet, &request),
            }
        };

        match &outcome {
            PacketOutcome::Dropped(reason) => {
                debug!("SlicingOrch: dropped frame from {}: {}", packet.received_from, reason)
            }
            PacketOutcome::Failed(e) => {
                warn!("SlicingOrch: frame from {} failed: {}", packet.received_from, e)
            }
            _ => {}
        }
        self.record(&outcome);
        outcome
    }

    fn forward(&self, state: &mut SliceState, packet: &InboundPacket, request: &ForwardRequest) -> PacketOutcome {
        let network = request.network;
        let pair = request.pair;

        if state.forbidden.is_forbidden(network, &pair) {
            return PacketOutcome::Dropped(DropReason::Forbidden);
        }

        let hops = match self.plan(request) {
            Ok(hops) => hops,
            Err(reason) => return PacketOutcome::Dropped(reason),
        };
        let out_port = hops[0].out_port;

        let mut superseded = false;
        let existing = state.flows.get_all(network, &pair);
        if !existing.is_empty() {
            if FlowRuleRecord::follow(existing, &hops, request.routed) {
                if let Err(e) = self.packet_io.forward(packet, out_port) {
                    return PacketOutcome::Failed(e.to_string());
                }
                return PacketOutcome::Redirected { network, pair };
            }
            info!("SlicingOrch: {} in network {} changed path, reinstalling", pair, network);
            if let Some(report) = state.teardown_flow(self.programmer.as_ref(), network, &pair) {
                self.stats.lock().flows_torn_down += 1;
                debug!("SlicingOrch: superseded flow teardown {:?}", report);
            }
            superseded = true;
        }

        let records = if hops.len() == 1 {
            vec![state.builder.same_device_rule(request)]
        } else {
            match state.builder.path_rules(&mut state.labels, request, &hops) {
                Ok(records) => records,
                Err(SlicingError::LabelSpaceExhausted(device)) => {
                    debug!("SlicingOrch: no label left on {} for {}", device, pair);
                    return PacketOutcome::Dropped(DropReason::LabelSpaceExhausted);
                }
                Err(e) => return PacketOutcome::Failed(e.to_string()),
            }
        };
        let rules = records.len();

        if let Err(e) = state.install_flow(self.programmer.as_ref(), network, pair, records) {
            return PacketOutcome::Failed(e.to_string());
        }
        if let Err(e) = self.packet_io.forward(packet, out_port) {
            warn!("SlicingOrch: {} installed but the frame was not sent on: {}", pair, e);
        }

        info!(
            "SlicingOrch: installed {} in network {} of tenant {} ({} rule(s))",
            pair, network, request.tenant, rules
        );
        PacketOutcome::Installed {
            network,
            pair,
            rules,
            superseded,
        }
    }

    /// Ports of every hop between the two hosts, source first.
    fn plan(&self, request: &ForwardRequest) -> std::result::Result<Vec<HopPorts>, DropReason> {
        let src = &request.src.location;
        let dst = &request.dst.location;
        if request.same_device() {
            return Ok(vec![HopPorts {
                device: src.device.clone(),
                in_port: src.port,
                out_port: dst.port,
            }]);
        }

        let links = self.directory.links(request.network);
        let path = TopologyGraph::from_links(&links).shortest_path(&src.device, &dst.device);
        if path.is_empty() {
            return Err(DropReason::NoPath);
        }
        let along = links_along(&links, &path).ok_or(DropReason::NoLinksOnPath)?;
        FlowPathBuilder::hops(src, dst, &along).map_err(|e| {
            debug!("SlicingOrch: {} has an unusable path: {}", request.pair, e);
            DropReason::NoLinksOnPath
        })
    }

    fn record(&self, outcome: &PacketOutcome) {
        let mut stats = self.stats.lock();
        stats.packets += 1;
        stats.tasks.record(outcome.status());
        match outcome {
            PacketOutcome::ArpReplied { .. } => stats.arp_replies += 1,
            PacketOutcome::Installed { .. } => stats.flows_installed += 1,
            PacketOutcome::Dropped(_) => stats.drops += 1,
            PacketOutcome::Redirected { .. } | PacketOutcome::Failed(_) => {}
        }
    }

    // ====================================================================
    // Topology
    // ====================================================================

    pub fn handle_topology_change(&self, event: &TopologyEvent) -> ReactionReport {
        let report = react(&mut self.state.lock(), self.programmer.as_ref(), event);
        if report.torn_down.is_empty() {
            return report;
        }

        self.stats.lock().flows_torn_down += report.torn_down.len() as u64;
        let outcome = match report.teardown.removal_failures {
            0 => AuditOutcome::Success,
            _ => AuditOutcome::Failure,
        };
        audit_log!(AuditRecord::new(AuditCategory::TopologyChange, "SlicingOrch", "teardown_broken_flows")
            .with_outcome(outcome)
            .with_object_type("flow")
            .with_details(serde_json::json!({
                "changes": event.changes,
                "flows": report.torn_down.iter().map(|(n, p)| format!("{}: {}", n, p)).collect::<Vec<_>>(),
                "rules_removed": report.teardown.rules_removed,
                "removal_failures": report.teardown.removal_failures,
                "labels_released": report.teardown.labels_released,
            })));
        report
    }

    // ====================================================================
    // Management
    // ====================================================================

    /// Forbids traffic between `a` and `b` in both directions and tears down
    /// any flow already installed between them. Returns the torn down pairs.
    pub fn add_forbidden_traffic(&self, network: NetworkId, a: Ipv4Addr, b: Ipv4Addr) -> Vec<FlowPair> {
        let mut state = self.state.lock();
        let added = state.forbidden.insert(network, a, b);

        let forward = FlowPair::new(a, b);
        let mut torn_down = Vec::new();
        for pair in [forward, forward.reversed()] {
            if state.teardown_flow(self.programmer.as_ref(), network, &pair).is_some() {
                torn_down.push(pair);
            }
        }
        drop(state);
        self.stats.lock().flows_torn_down += torn_down.len() as u64;

        audit_log!(AuditRecord::new(AuditCategory::SecurityPolicy, "SlicingOrch", "add_forbidden_traffic")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(format!("network {}: {} <-> {}", network, a, b))
            .with_object_type("forbidden_pair")
            .with_details(serde_json::json!({
                "newly_forbidden": added.len(),
                "flows_torn_down": torn_down,
            })));
        torn_down
    }

    pub fn remove_forbidden_traffic(&self, network: NetworkId, a: Ipv4Addr, b: Ipv4Addr) -> bool {
        let removed = self.state.lock().forbidden.remove(network, a, b);
        let outcome = if removed { AuditOutcome::Success } else { AuditOutcome::Failure };
        audit_log!(AuditRecord::new(AuditCategory::SecurityPolicy, "SlicingOrch", "remove_forbidden_traffic")
            .with_outcome(outcome)
            .with_object_id(format!("network {}: {} <-> {}", network, a, b))
            .with_object_type("forbidden_pair"));
        removed
    }

    pub fn list_forbidden_traffic(&self, network: NetworkId) -> Vec<FlowPair> {
        self.state.lock().forbidden.list(network)
    }

    pub fn list_flows(&self, network: NetworkId) -> Vec<FlowSummary> {
        self.state.lock().flow_summaries(network)
    }

    /// Removes an installed flow and returns its labels.
    pub fn delete_flow(&self, network: NetworkId, src: Ipv4Addr, dst: Ipv4Addr) -> Result<TeardownReport> {
        let pair = FlowPair::new(src, dst);
        let report = self
            .state
            .lock()
            .teardown_flow(self.programmer.as_ref(), network, &pair);

        let record = AuditRecord::new(AuditCategory::ResourceDelete, "SlicingOrch", "delete_flow")
            .with_object_id(format!("network {}: {}", network, pair))
            .with_object_type("flow");
        match report {
            Some(report) => {
                self.stats.lock().flows_torn_down += 1;
                audit_log!(record.with_outcome(AuditOutcome::Success).with_details(serde_json::json!({
                    "rules_removed": report.rules_removed,
                    "removal_failures": report.removal_failures,
                    "labels_released": report.labels_released,
                })));
                Ok(report)
            }
            None => {
                let error = SlicingError::FlowNotFound { network, src, dst };
                audit_log!(record.with_error(error.to_string()));
                Err(error)
            }
        }
    }

    /// Registers a routed subnet; returns the gateway it replaced, if any.
    pub fn add_routed_network(
        &self,
        network: NetworkId,
        cidr: Ipv4Prefix,
        gateway: Ipv4Addr,
    ) -> Result<Option<Ipv4Addr>> {
        let result = self.state.lock().routed.add(network, cidr, gateway);
        let record = AuditRecord::new(AuditCategory::NetworkConfig, "SlicingOrch", "add_routed_network")
            .with_object_id(format!("network {}: {}", network, cidr))
            .with_object_type("routed_network");
        match &result {
            Ok(previous) => {
                audit_log!(record.with_outcome(AuditOutcome::Success).with_details(serde_json::json!({
                    "gateway": gateway,
                    "replaced": previous,
                })));
            }
            Err(e) => {
                audit_log!(record.with_error(e.to_string()));
            }
        }
        result
    }

    pub fn remove_routed_network(&self, network: NetworkId, cidr: &Ipv4Prefix) -> Option<Ipv4Addr> {
        let removed = self.state.lock().routed.remove(network, cidr);
        let outcome = match removed {
            Some(_) => AuditOutcome::Success,
            None => AuditOutcome::Failure,
        };
        audit_log!(AuditRecord::new(AuditCategory::NetworkConfig, "SlicingOrch", "remove_routed_network")
            .with_outcome(outcome)
            .with_object_id(format!("network {}: {}", network, cidr))
            .with_object_type("routed_network"));
        removed
    }

    pub fn list_routed_networks(&self, network: NetworkId) -> Vec<RoutedNetwork> {
        self.state.lock().routed.list(network)
    }
}

#[async_trait]
impl Orch for SlicingOrch {
    fn name(&self) -> &str {
        "SlicingOrch"
    }

    async fn do_task(&mut self) {
        for event in self.events.pop_batch() {
            match event {
                SliceEvent::PacketIn(packet) => {
                    self.process_packet(&packet);
                }
                SliceEvent::TopologyChanged(change) => {
                    self.handle_topology_change(&change);
                }
            }
        }
    }

    fn has_pending_tasks(&self) -> bool {
        self.events.has_pending()
    }

    fn dump_pending_tasks(&self) -> Vec<String> {
        self.events.dump()
    }

    fn on_timer(&mut self) {
        let stats = self.stats();
        debug!(
            "SlicingOrch: {} packet(s), {} flow(s) installed, {} torn down, {} drop(s), {} ARP repl(ies)",
            stats.packets, stats.flows_installed, stats.flows_torn_down, stats.drops, stats.arp_replies
        );
    }
}
