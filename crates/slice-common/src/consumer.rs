//! Batched event queue between platform adapters and an Orch.

use log::debug;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::Arc;

/// Configuration for a Consumer.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Queue name used in logs (e.g. "PACKET_IN", "TOPOLOGY").
    pub name: String,
    /// Maximum number of events returned by one `pop_batch()`.
    pub batch_size: usize,
}

impl ConsumerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batch_size: 128,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

/// Sending half of an event queue. Cheap to clone; safe to use from any
/// thread.
#[derive(Debug)]
pub struct Producer<T> {
    queue: Arc<Mutex<VecDeque<T>>>,
}

impl<T> Clone for Producer<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
        }
    }
}

impl<T> Producer<T> {
    pub fn push(&self, event: T) {
        self.queue.lock().push_back(event);
    }

    pub fn push_all(&self, events: impl IntoIterator<Item = T>) {
        self.queue.lock().extend(events);
    }

    pub fn pending_count(&self) -> usize {
        self.queue.lock().len()
    }
}

/// Receiving half of an event queue, owned by one Orch.
///
/// Events are handed out in arrival order. Unlike a table consumer there is
/// no per-key merging: every packet-in and every topology notification is
/// significant on its own.
#[derive(Debug)]
pub struct Consumer<T> {
    config: ConsumerConfig,
    queue: Arc<Mutex<VecDeque<T>>>,
}

impl<T> Consumer<T> {
    pub fn new(config: ConsumerConfig) -> Self {
        Self {
            config,
            queue: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Returns a new sending handle for this queue.
    pub fn producer(&self) -> Producer<T> {
        Producer {
            queue: Arc::clone(&self.queue),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.lock().is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.lock().len()
    }

    /// Removes up to `batch_size` events from the head of the queue.
    pub fn pop_batch(&mut self) -> Vec<T> {
        let mut queue = self.queue.lock();
        let count = queue.len().min(self.config.batch_size);
        if count > 0 {
            debug!(
                "Popped {} event(s) from {}, {} left",
                count,
                self.config.name,
                queue.len() - count
            );
        }
        queue.drain(..count).collect()
    }

    /// Removes every pending event.
    pub fn drain(&mut self) -> Vec<T> {
        self.queue.lock().drain(..).collect()
    }

    /// Puts an event back at the head of the queue.
    pub fn retry(&mut self, event: T) {
        self.queue.lock().push_front(event);
    }

    pub fn clear(&mut self) {
        self.queue.lock().clear();
    }
}

impl<T: Debug> Consumer<T> {
    /// Dumps pending events for debugging.
    pub fn dump(&self) -> Vec<String> {
        self.queue
            .lock()
            .iter()
            .map(|e| format!("{}: {:?}", self.config.name, e))
            .collect()
    }
}
