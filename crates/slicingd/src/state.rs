//! Mutable engine state shared by packet handling, topology reactions and
//! management calls.

use crate::flow::{FlowPair, FlowPathBuilder, FlowRecordStore, FlowRuleRecord, FlowSummary, TeardownReport};
use crate::forbidden::ForbiddenTraffic;
use crate::host::RoutedNetworks;
use crate::label::LabelManager;
use log::{debug, warn};
use slice_dataplane::{DataplaneError, FlowProgrammer};
use slice_types::NetworkId;

/// Label pools and tables, installed flows, forbidden pairs and routed
/// networks.
///
/// Everything that allocates labels or changes flow records does so while
/// holding the one lock around this value.
#[derive(Debug, Clone, Default)]
pub struct SliceState {
    pub labels: LabelManager,
    pub flows: FlowRecordStore,
    pub forbidden: ForbiddenTraffic,
    pub routed: RoutedNetworks,
    pub builder: FlowPathBuilder,
}

impl SliceState {
    pub fn new(builder: FlowPathBuilder) -> Self {
        Self {
            builder,
            ..Default::default()
        }
    }

    /// Installs `records` destination first and stores them under `pair`.
    ///
    /// On an install failure the rules already pushed are removed again and
    /// every label the records hold is released; nothing is stored.
    pub fn install_flow(
        &mut self,
        programmer: &dyn FlowProgrammer,
        network: NetworkId,
        pair: FlowPair,
        records: Vec<FlowRuleRecord>,
    ) -> Result<(), DataplaneError> {
        let mut installed = 0;
        let mut failure = None;
        for record in records.iter().rev() {
            match programmer.install(&record.rule) {
                Ok(()) => installed += 1,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if let Some(e) = failure {
            warn!(
                "SliceState: installing {} in network {} failed after {} rule(s): {}",
                pair, network, installed, e
            );
            for record in records.iter().rev().take(installed) {
                if let Err(e) = programmer.remove(&record.rule) {
                    warn!("SliceState: cleanup of {} failed: {}", record.rule.id, e);
                }
            }
            self.release_labels(network, &records);
            return Err(e);
        }

        debug!(
            "SliceState: installed {} rule(s) for {} in network {}",
            records.len(),
            pair,
            network
        );
        self.flows.add_all(network, pair, records);
        Ok(())
    }

    /// Removes every rule of a flow, releases its labels and forgets it.
    ///
    /// Failures to remove a rule are counted and skipped. `None` if the flow
    /// is not installed.
    pub fn teardown_flow(
        &mut self,
        programmer: &dyn FlowProgrammer,
        network: NetworkId,
        pair: &FlowPair,
    ) -> Option<TeardownReport> {
        let records = self.flows.delete_all(network, pair);
        if records.is_empty() {
            return None;
        }

        let mut report = TeardownReport::default();
        for record in &records {
            match programmer.remove(&record.rule) {
                Ok(()) => report.rules_removed += 1,
                Err(e) => {
                    warn!(
                        "SliceState: removing {} of {} in network {} failed: {}",
                        record.rule.id, pair, network, e
                    );
                    report.removal_failures += 1;
                }
            }
        }
        report.labels_released = self.release_labels(network, &records);

        debug!(
            "SliceState: tore down {} in network {} ({} removed, {} failed, {} label(s) freed)",
            pair, network, report.rules_removed, report.removal_failures, report.labels_released
        );
        Some(report)
    }

    fn release_labels(&mut self, network: NetworkId, records: &[FlowRuleRecord]) -> usize {
        records
            .iter()
            .filter_map(|r| r.label.map(|label| (r, label)))
            .filter(|(r, label)| {
                self.labels
                    .release_label(&r.device, network, r.destination, *label)
            })
            .count()
    }

    pub fn summarize(pair: FlowPair, records: &[FlowRuleRecord]) -> FlowSummary {
        FlowSummary {
            pair,
            path: records.iter().map(|r| r.device.clone()).collect(),
            labels: records
                .iter()
                .filter_map(|r| r.label.map(|l| (r.device.clone(), l)))
                .collect(),
        }
    }

    pub fn flow_summaries(&self, network: NetworkId) -> Vec<FlowSummary> {
        self.flows
            .flows_in(network)
            .map(|(pair, records)| Self::summarize(*pair, records))
            .collect()
    }
}
