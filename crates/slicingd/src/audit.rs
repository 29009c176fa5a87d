//! Structured audit records and log initialisation.
//!
//! Management calls (forbidden traffic, routed networks, flow deletion) and
//! daemon lifecycle events produce an [`AuditRecord`] that is emitted
//! through [`audit_log!`] on the `audit` tracing target. The record is
//! serialised as JSON into the `audit_json` field so log shippers can index
//! it without parsing the message text.
//!
//! Severity follows the outcome: success at info, in-progress at debug,
//! failure at warn.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Kind of event an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditCategory {
    /// Orch registration
    ResourceCreate,
    /// Flow deletion
    ResourceDelete,
    /// Daemon startup and event loop
    SystemLifecycle,
    /// Forbidden-traffic list changes
    SecurityPolicy,
    /// Routed network changes
    NetworkConfig,
    /// Flows torn down by link changes
    TopologyChange,
    AdminAction,
}

impl AuditCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditCategory::ResourceCreate => "RESOURCE_CREATE",
            AuditCategory::ResourceDelete => "RESOURCE_DELETE",
            AuditCategory::SystemLifecycle => "SYSTEM_LIFECYCLE",
            AuditCategory::SecurityPolicy => "SECURITY_POLICY",
            AuditCategory::NetworkConfig => "NETWORK_CONFIG",
            AuditCategory::TopologyChange => "TOPOLOGY_CHANGE",
            AuditCategory::AdminAction => "ADMIN_ACTION",
        }
    }
}

impl fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure,
    InProgress,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuditOutcome::Success => "success",
            AuditOutcome::Failure => "failure",
            AuditOutcome::InProgress => "in_progress",
        })
    }
}

/// One audited action.
///
/// Built with [`AuditRecord::new`] and the `with_*` methods, then handed to
/// [`audit_log!`]. The outcome starts as `InProgress`.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    /// UTC, microsecond precision.
    pub timestamp: DateTime<Utc>,
    pub category: AuditCategory,
    /// Component that performed the action, e.g. `SlicingOrch`.
    pub source: String,
    pub action: String,
    pub outcome: AuditOutcome,
    /// e.g. `network 7: 10.0.0.1 -> 10.0.0.2`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    /// e.g. `flow`, `forbidden_pair`, `routed_network`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditRecord {
    pub fn new(category: AuditCategory, source: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            category,
            source: source.into(),
            action: action.into(),
            outcome: AuditOutcome::InProgress,
            object_id: None,
            object_type: None,
            details: None,
            error: None,
        }
    }

    pub fn with_outcome(self, outcome: AuditOutcome) -> Self {
        Self { outcome, ..self }
    }

    pub fn with_object_id(self, id: impl Into<String>) -> Self {
        Self {
            object_id: Some(id.into()),
            ..self
        }
    }

    pub fn with_object_type(self, kind: impl Into<String>) -> Self {
        Self {
            object_type: Some(kind.into()),
            ..self
        }
    }

    pub fn with_details(self, details: serde_json::Value) -> Self {
        Self {
            details: Some(details),
            ..self
        }
    }

    /// Records `error` and marks the outcome as `Failure`.
    pub fn with_error(self, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            outcome: AuditOutcome::Failure,
            ..self
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"action":"{}","serialization_error":"{}"}}"#, self.action, e))
    }
}

/// Writes `record` to the `audit` target. Prefer [`audit_log!`].
pub fn emit(record: &AuditRecord) {
    let json = record.to_json();
    match record.outcome {
        AuditOutcome::Success => tracing::info!(
            target: "audit",
            source = %record.source,
            audit_json = %json,
            "AUDIT: {} - {} - {}",
            record.category,
            record.action,
            record.outcome
        ),
        AuditOutcome::InProgress => tracing::debug!(
            target: "audit",
            source = %record.source,
            audit_json = %json,
            "AUDIT: {} - {} - {}",
            record.category,
            record.action,
            record.outcome
        ),
        AuditOutcome::Failure => tracing::warn!(
            target: "audit",
            source = %record.source,
            error = record.error.as_deref().unwrap_or(""),
            audit_json = %json,
            "AUDIT: {} - {} - {}",
            record.category,
            record.action,
            record.outcome
        ),
    }
}

/// Emits an [`AuditRecord`] on the `audit` target at a level derived from
/// its outcome.
///
/// ```ignore
/// audit_log!(AuditRecord::new(AuditCategory::SecurityPolicy, "SlicingOrch", "add_forbidden_traffic")
///     .with_outcome(AuditOutcome::Success)
///     .with_object_type("forbidden_pair"));
/// ```
#[macro_export]
macro_rules! audit_log {
    ($record:expr) => {
        $crate::audit::emit(&$record)
    };
}

/// Installs the global subscriber, JSON lines when `json` is set and
/// human-readable output otherwise.
///
/// `RUST_LOG` wins over `log_level` when set. Records from the `log` facade
/// are bridged into the same subscriber.
pub fn init_logging(log_level: &str, json: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let layer = fmt::layer().with_target(true).with_file(true).with_line_number(true);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.with_thread_ids(true).json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.pretty())
            .init();
    }
}
