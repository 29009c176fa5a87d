//! Base Orch trait.

use async_trait::async_trait;

/// Base trait for work units driven by the daemon loop.
///
/// # Lifecycle
///
/// 1. Construction: the Orch is created with its collaborators
/// 2. Registration: the daemon orders Orchs by [`Orch::priority`]
/// 3. Event loop: `do_task()` runs whenever `has_pending_tasks()` is true
/// 4. Shutdown: the Orch is dropped
#[async_trait]
pub trait Orch: Send + Sync {
    /// Returns the name of this Orch (for logging and debugging).
    fn name(&self) -> &str;

    /// Processes one batch of pending events.
    async fn do_task(&mut self);

    /// Returns the priority of this Orch (lower = processed first).
    fn priority(&self) -> i32 {
        0
    }

    /// Returns true if this Orch has pending work.
    fn has_pending_tasks(&self) -> bool {
        false
    }

    /// Human-readable description of pending work, for debugging.
    fn dump_pending_tasks(&self) -> Vec<String> {
        vec![]
    }

    /// Called on every daemon heartbeat.
    fn on_timer(&mut self) {}
}
