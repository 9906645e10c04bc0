use std::time::Duration;

use serde::Deserialize;

/// How batches are pulled and how long each may run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProcessorConfig {
    /// How long a whole batch may run before unfinished targets are
    /// abandoned (in seconds)
    ///
    /// Default: 300 seconds
    #[serde(default = "defaults::batch_timeout_secs")]
    pub batch_timeout_secs: u64,

    /// How often to poll the source for pending tests (in seconds)
    ///
    /// Default: 10 seconds
    #[serde(default = "defaults::poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Most pending tests taken in one batch
    ///
    /// Default: 10
    #[serde(default = "defaults::max_batch_size")]
    pub max_batch_size: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            batch_timeout_secs: defaults::batch_timeout_secs(),
            poll_interval_secs: defaults::poll_interval_secs(),
            max_batch_size: defaults::max_batch_size(),
        }
    }
}

impl ProcessorConfig {
    pub const fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }

    /// Never shorter than a second, as a zero period cannot be polled.
    pub const fn poll_interval(&self) -> Duration {
        if self.poll_interval_secs == 0 {
            Duration::from_secs(1)
        } else {
            Duration::from_secs(self.poll_interval_secs)
        }
    }
}

mod defaults {
    pub const fn batch_timeout_secs() -> u64 {
        300 // 5 minutes
    }
    pub const fn poll_interval_secs() -> u64 {
        10
    }
    pub const fn max_batch_size() -> usize {
        10
    }
}
