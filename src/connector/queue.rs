use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::message::QueuedMessage;

/// FIFO between the transport callbacks and the poll loop.
///
/// Clones share the same queue. Producers only [`push`](Self::push); the
/// connector that created the queue is the only consumer.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    inner: Arc<Mutex<VecDeque<QueuedMessage>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: QueuedMessage) {
        self.lock().push_back(message);
    }

    pub fn pop(&self) -> Option<QueuedMessage> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every queued message.
    pub fn clear(&self) {
        self.lock().clear();
    }

    #[cfg(test)]
    pub(crate) fn hold_lock(&self) -> MutexGuard<'_, VecDeque<QueuedMessage>> {
        self.lock()
    }

    // a panicking producer must not wedge the poll loop
    fn lock(&self) -> MutexGuard<'_, VecDeque<QueuedMessage>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
