//! Orchestration scaffolding for the slicing daemon.
//!
//! - [`Orch`]: unit of work driven by the daemon loop
//! - [`Consumer`] / [`Producer`]: batched event queue feeding an Orch
//! - [`SyncMap`]: map that never creates entries implicitly, with
//!   reference-counting helpers for shared resources
//! - [`TaskStatus`] / [`TaskStats`]: per-event outcome accounting
//!
//! # Architecture
//!
//! 1. Platform adapters push events through a [`Producer`]
//! 2. The owning Orch reports pending work via `has_pending_tasks()`
//! 3. The daemon loop calls `do_task()`, which pops a batch from its
//!    [`Consumer`] and handles each event
//! 4. Each handled event is classified as a [`TaskStatus`] and counted
//!
//! # Example
//!
//! ```ignore
//! use slice_common::{Consumer, ConsumerConfig, Orch, TaskStatus};
//!
//! struct MyOrch {
//!     events: Consumer<MyEvent>,
//! }
//!
//! #[async_trait]
//! impl Orch for MyOrch {
//!     fn name(&self) -> &str { "MyOrch" }
//!
//!     async fn do_task(&mut self) {
//!         for event in self.events.pop_batch() {
//!             self.handle(event);
//!         }
//!     }
//!
//!     fn has_pending_tasks(&self) -> bool {
//!         self.events.has_pending()
//!     }
//! }
//! ```

mod consumer;
mod orch;
mod sync_map;
mod task;

pub use consumer::{Consumer, ConsumerConfig, Producer};
pub use orch::Orch;
pub use sync_map::{HasRefCount, SyncMap, SyncMapError};
pub use task::{TaskStats, TaskStatus};
