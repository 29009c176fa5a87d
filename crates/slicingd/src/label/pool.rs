//! Per-device label allocator.

use crate::error::{Result, SlicingError};
use log::{debug, warn};
use slice_types::{DeviceId, MplsLabel};
use std::collections::{HashMap, HashSet, VecDeque};

/// Label allocator for one device.
///
/// Fresh labels are issued from a counter starting at 1. Released labels go
/// to a FIFO and are handed out again, oldest first, before the counter
/// advances.
#[derive(Debug, Clone)]
pub struct LabelPool {
    next: u32,
    limit: u32,
    withdrawn: VecDeque<MplsLabel>,
    withdrawn_set: HashSet<MplsLabel>,
}

impl Default for LabelPool {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelPool {
    pub const FIRST_LABEL: u32 = 1;

    pub fn new() -> Self {
        Self::with_limit(MplsLabel::MAX_VALUE)
    }

    /// Pool that never issues a label above `limit` (clamped to the 20-bit
    /// label space).
    pub fn with_limit(limit: u32) -> Self {
        Self {
            next: Self::FIRST_LABEL,
            limit: limit.min(MplsLabel::MAX_VALUE),
            withdrawn: VecDeque::new(),
            withdrawn_set: HashSet::new(),
        }
    }

    /// Returns the oldest withdrawn label, else the next fresh one.
    ///
    /// `None` once the counter has passed the limit and nothing was returned.
    pub fn allocate(&mut self) -> Option<MplsLabel> {
        if let Some(label) = self.withdrawn.pop_front() {
            self.withdrawn_set.remove(&label);
            return Some(label);
        }
        if self.next > self.limit {
            return None;
        }
        let label = MplsLabel::new(self.next).ok()?;
        self.next += 1;
        Some(label)
    }

    /// Returns `label` to the pool.
    ///
    /// Labels that were never issued or are already withdrawn are ignored;
    /// the return value says whether the label was accepted.
    pub fn release(&mut self, label: MplsLabel) -> bool {
        if label.get() < Self::FIRST_LABEL || label.get() >= self.next {
            return false;
        }
        if !self.withdrawn_set.insert(label) {
            return false;
        }
        self.withdrawn.push_back(label);
        true
    }

    /// Number of labels ever issued from the counter.
    pub fn issued(&self) -> u32 {
        self.next - Self::FIRST_LABEL
    }

    pub fn withdrawn_count(&self) -> usize {
        self.withdrawn.len()
    }

    /// Labels currently handed out.
    pub fn in_use(&self) -> usize {
        self.issued() as usize - self.withdrawn.len()
    }

    pub fn is_withdrawn(&self, label: MplsLabel) -> bool {
        self.withdrawn_set.contains(&label)
    }
}

/// Label pools for every device, created on first use.
#[derive(Debug, Clone, Default)]
pub struct LabelPools {
    pools: HashMap<DeviceId, LabelPool>,
    limit: Option<u32>,
}

impl LabelPools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pools whose devices stop issuing fresh labels after `limit`.
    pub fn with_limit(limit: u32) -> Self {
        Self {
            pools: HashMap::new(),
            limit: Some(limit),
        }
    }

    pub fn allocate(&mut self, device: &DeviceId) -> Result<MplsLabel> {
        let limit = self.limit;
        let pool = self
            .pools
            .entry(device.clone())
            .or_insert_with(|| limit.map(LabelPool::with_limit).unwrap_or_default());
        match pool.allocate() {
            Some(label) => {
                debug!("LabelPools: allocated label {} on {}", label, device);
                Ok(label)
            }
            None => {
                warn!("LabelPools: label space exhausted on {}", device);
                Err(SlicingError::LabelSpaceExhausted(device.clone()))
            }
        }
    }

    /// Returns a label to the device's pool. Releasing to a device that
    /// never allocated is ignored.
    pub fn release(&mut self, device: &DeviceId, label: MplsLabel) -> bool {
        let accepted = self
            .pools
            .get_mut(device)
            .map(|pool| pool.release(label))
            .unwrap_or(false);
        if accepted {
            debug!("LabelPools: released label {} on {}", label, device);
        } else {
            warn!(
                "LabelPools: ignored release of label {} on {}",
                label, device
            );
        }
        accepted
    }

    pub fn pool(&self, device: &DeviceId) -> Option<&LabelPool> {
        self.pools.get(device)
    }
}
