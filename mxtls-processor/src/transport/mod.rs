//! Where pending tests come from and where results go.

mod lines;
mod memory;

use async_trait::async_trait;

pub use lines::{JsonLinesPublisher, JsonLinesSource};
pub use memory::{MemoryPublisher, MemoryQueue};

use crate::{PendingTest, Result, TestRunMessage};

#[async_trait]
pub trait PendingTestSource: Send + Sync {
    /// Up to `max` pending tests. An empty batch means nothing is waiting.
    async fn receive(&self, max: usize) -> Result<Vec<PendingTest>>;

    /// Acknowledges a batch so it is not delivered again.
    async fn delete(&self, batch: &[PendingTest]) -> Result<()>;

    /// True once the source can never produce another batch.
    fn is_exhausted(&self) -> bool {
        false
    }
}

#[async_trait]
pub trait ResultPublisher: Send + Sync {
    async fn publish(&self, message: &TestRunMessage) -> Result<()>;
}
