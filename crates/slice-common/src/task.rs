//! Per-event outcome classification and counters.

use std::fmt;

/// Outcome of handling a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Event handled and produced its effect.
    Success,
    /// Event was a no-op (e.g. a flow that is already installed).
    Ignore,
    /// Event was discarded by policy or classification.
    Dropped,
    /// Event could not be handled because of an error.
    Failed,
}

impl TaskStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Ignore)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Success => "success",
            TaskStatus::Ignore => "ignore",
            TaskStatus::Dropped => "dropped",
            TaskStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Running totals of event outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub success: u64,
    pub ignored: u64,
    pub dropped: u64,
    pub failed: u64,
}

impl TaskStats {
    pub fn record(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Success => self.success += 1,
            TaskStatus::Ignore => self.ignored += 1,
            TaskStatus::Dropped => self.dropped += 1,
            TaskStatus::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.success + self.ignored + self.dropped + self.failed
    }
}
