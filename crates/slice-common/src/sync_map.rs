//! Reference-counted entries that are only ever created by `insert`.
//!
//! Label bindings are shared by every rule that matches on them. A count kept
//! behind `HashMap::entry` can quietly bring back a binding that the last
//! rule just released, so lookups and count changes here fail on a missing
//! key instead.

use std::collections::HashMap;
use std::hash::Hash;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncMapError {
    #[error("Key not found")]
    KeyNotFound,

    #[error("Reference count underflow")]
    RefCountUnderflow,
}

/// Value that tracks how many users hold it.
pub trait HasRefCount {
    /// Adds a user; returns the new count.
    fn increment_ref(&mut self) -> u32;

    /// Drops a user; `None` when the count is already zero.
    fn decrement_ref(&mut self) -> Option<u32>;

    fn ref_count(&self) -> u32;
}

/// Keyed store of refcounted values.
///
/// ```
/// use slice_common::SyncMap;
///
/// let mut bindings: SyncMap<u32, u32> = SyncMap::new();
/// assert!(bindings.get(&7).is_none());
/// bindings.insert(7, 100);
/// assert_eq!(bindings.get(&7), Some(&100));
/// ```
#[derive(Debug, Clone)]
pub struct SyncMap<K, V> {
    entries: HashMap<K, V>,
}

impl<K: Eq + Hash, V> Default for SyncMap<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V> SyncMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Stores `value` under `key` with whatever count it carries.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    /// Removes the entry regardless of its count.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash, V: HasRefCount> SyncMap<K, V> {
    pub fn ref_count(&self, key: &K) -> Option<u32> {
        self.entries.get(key).map(HasRefCount::ref_count)
    }

    pub fn increment_ref(&mut self, key: &K) -> Result<u32, SyncMapError> {
        self.entries
            .get_mut(key)
            .map(HasRefCount::increment_ref)
            .ok_or(SyncMapError::KeyNotFound)
    }

    /// Drops one reference. The entry is removed and returned with the last
    /// one; `Ok(None)` means other holders remain.
    pub fn release(&mut self, key: &K) -> Result<Option<V>, SyncMapError> {
        let entry = self.entries.get_mut(key).ok_or(SyncMapError::KeyNotFound)?;
        match entry.decrement_ref() {
            None => Err(SyncMapError::RefCountUnderflow),
            Some(0) => Ok(self.entries.remove(key)),
            Some(_) => Ok(None),
        }
    }
}
