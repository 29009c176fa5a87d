//! The slicing orch and its event/outcome types.

mod orch;
mod types;

pub use orch::SlicingOrch;
pub use types::{DropReason, PacketOutcome, SliceEvent, SlicingOrchConfig, SlicingStats};
