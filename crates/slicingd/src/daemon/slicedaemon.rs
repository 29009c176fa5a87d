//! SliceDaemon implementation.
//!
//! The SliceDaemon owns every registered Orch and runs the main loop:
//! - Orch registration and priority ordering
//! - Task dispatch to Orchs with pending work
//! - Heartbeat timer callbacks
//! - Cancellation-driven shutdown

use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::audit_log;
use log::{debug, info};
use slice_common::Orch;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Configuration for the SliceDaemon.
#[derive(Debug, Clone)]
pub struct SliceDaemonConfig {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval_ms: u64,
}

impl Default for SliceDaemonConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: 1000,
        }
    }
}

pub struct SliceDaemon {
    config: SliceDaemonConfig,
    /// Registered Orchs keyed by priority (lowest first)
    orchs: BTreeMap<i32, Vec<Box<dyn Orch>>>,
    shutdown: CancellationToken,
    running: bool,
}

impl SliceDaemon {
    pub fn new(config: SliceDaemonConfig) -> Self {
        Self {
            config,
            orchs: BTreeMap::new(),
            shutdown: CancellationToken::new(),
            running: false,
        }
    }

    /// Registers an Orch. Orchs are processed by ascending priority.
    pub fn register_orch(&mut self, orch: Box<dyn Orch>) {
        let priority = orch.priority();
        let orch_name = orch.name().to_string();
        info!("Registering {} with priority {}", orch_name, priority);

        let record = AuditRecord::new(
            AuditCategory::ResourceCreate,
            "SliceDaemon",
            format!("register_orch: {}", orch_name),
        )
        .with_outcome(AuditOutcome::Success)
        .with_object_id(&orch_name)
        .with_object_type("orch_module")
        .with_details(serde_json::json!({
            "priority": priority,
        }));
        audit_log!(record);

        self.orchs.entry(priority).or_default().push(orch);
    }

    /// Token that stops [`SliceDaemon::run`] when cancelled. Safe to hand to
    /// a signal handler while the loop holds `&mut self`.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn orch_count(&self) -> usize {
        self.orchs.values().map(Vec::len).sum()
    }

    /// Processes every Orch with pending work once, in priority order.
    /// Returns how many Orchs ran.
    pub async fn process_pending(&mut self) -> usize {
        let mut ran = 0;
        for orchs in self.orchs.values_mut() {
            for orch in orchs.iter_mut() {
                if orch.has_pending_tasks() {
                    debug!("Processing tasks for {}", orch.name());
                    orch.do_task().await;
                    ran += 1;
                }
            }
        }
        ran
    }

    fn tick(&mut self) {
        for orch in self.orchs.values_mut().flatten() {
            orch.on_timer();
        }
    }

    /// Runs the main loop until the shutdown token is cancelled.
    pub async fn run(&mut self) {
        info!("Starting SliceDaemon event loop");
        self.running = true;

        audit_log!(AuditRecord::new(AuditCategory::SystemLifecycle, "SliceDaemon", "event_loop_started")
            .with_outcome(AuditOutcome::Success)
            .with_details(serde_json::json!({
                "heartbeat_interval_ms": self.config.heartbeat_interval_ms,
                "orch_count": self.orch_count(),
            })));

        let heartbeat = Duration::from_millis(self.config.heartbeat_interval_ms);
        while !self.shutdown.is_cancelled() {
            self.process_pending().await;

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(heartbeat) => self.tick(),
            }
        }

        self.running = false;
        info!("SliceDaemon event loop stopped");
        audit_log!(AuditRecord::new(AuditCategory::SystemLifecycle, "SliceDaemon", "event_loop_stopped")
            .with_outcome(AuditOutcome::Success));
    }

    /// Requests the loop to stop after the current pass.
    pub fn stop(&self) {
        info!("Stopping SliceDaemon");
        audit_log!(AuditRecord::new(AuditCategory::AdminAction, "SliceDaemon", "stop_requested")
            .with_outcome(AuditOutcome::Success));
        self.shutdown.cancel();
    }

    /// Dumps state for debugging.
    pub fn dump(&self) -> Vec<String> {
        let mut lines = vec![format!("SliceDaemon running: {}", self.running)];
        for (priority, orchs) in &self.orchs {
            for orch in orchs {
                lines.push(format!(
                    "  [{:3}] {} - {} pending",
                    priority,
                    orch.name(),
                    orch.dump_pending_tasks().len()
                ));
            }
        }
        lines
    }
}
