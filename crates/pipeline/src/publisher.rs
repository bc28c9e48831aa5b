//! Subscribable operation record.
//!
//! [`RecordPublisher`] owns the current [`OperationRecord`] in a
//! `tokio::sync::watch` channel. Events are applied atomically through
//! [`OperationRecord::apply`], so subscribers only ever see records that
//! satisfy its invariants.

use sparsify_core::record::{OperationEvent, OperationRecord};
use tokio::sync::watch;

pub struct RecordPublisher<T> {
    sender: watch::Sender<OperationRecord<T>>,
}

impl<T> RecordPublisher<T> {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(OperationRecord::idle());
        Self { sender }
    }

    /// Apply an event and notify subscribers.
    pub fn apply(&self, event: OperationEvent<T>) {
        self.sender.send_modify(|record| record.apply(event));
    }

    /// Return the record to idle, dropping any retained value.
    pub fn reset(&self) {
        self.sender.send_modify(|record| record.reset());
    }

    pub fn subscribe(&self) -> watch::Receiver<OperationRecord<T>> {
        self.sender.subscribe()
    }
}

impl<T: Clone> RecordPublisher<T> {
    /// Snapshot of the current record.
    pub fn current(&self) -> OperationRecord<T> {
        self.sender.borrow().clone()
    }
}

impl<T> Default for RecordPublisher<T> {
    fn default() -> Self {
        Self::new()
    }
}
