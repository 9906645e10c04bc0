//! Configuration shared across the probe pipeline.

mod timeouts;

pub use timeouts::{ProbeTimeouts, TimeoutConfig};
