use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;

use super::{PendingTestSource, ResultPublisher};
use crate::{PendingTest, Result, TestRunMessage};

/// An in-process queue with explicit acknowledgement.
///
/// Received tests stay in flight until deleted; [`MemoryQueue::redeliver`]
/// puts unacknowledged ones back, the way a broker's visibility timeout
/// would.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    waiting: Mutex<VecDeque<PendingTest>>,
    in_flight: Mutex<Vec<PendingTest>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, pending: PendingTest) {
        self.waiting
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(pending);
    }

    /// Tests received but never deleted.
    pub fn in_flight(&self) -> Vec<PendingTest> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Tests not yet received.
    pub fn waiting(&self) -> usize {
        self.waiting.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn redeliver(&self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        self.waiting
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(in_flight.drain(..));
    }
}

#[async_trait]
impl PendingTestSource for MemoryQueue {
    async fn receive(&self, max: usize) -> Result<Vec<PendingTest>> {
        let mut waiting = self.waiting.lock().unwrap_or_else(PoisonError::into_inner);
        let take = max.min(waiting.len());
        let batch: Vec<PendingTest> = waiting.drain(..take).collect();

        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(batch.iter().cloned());

        Ok(batch)
    }

    async fn delete(&self, batch: &[PendingTest]) -> Result<()> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|pending| !batch.contains(pending));
        Ok(())
    }
}

/// Keeps every published message for inspection.
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    messages: Mutex<Vec<TestRunMessage>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<TestRunMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Ids of the published targets, in publishing order.
    pub fn published(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|message| message.id.clone())
            .collect()
    }
}

#[async_trait]
impl ResultPublisher for MemoryPublisher {
    async fn publish(&self, message: &TestRunMessage) -> Result<()> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        Ok(())
    }
}
