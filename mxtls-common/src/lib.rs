//! Types shared by every mxtls crate: the TLS registries (versions, cipher
//! suites, groups, signature algorithms), the probe data model, logging
//! initialisation and the timeout configuration.

pub mod config;
pub mod criteria;
pub mod logging;
pub mod probe;
pub mod tls;

pub use criteria::{TestCriteria, TlsTestType};
pub use probe::{ClassifiedError, ErrorClass, ProbeResult};
pub use tracing;

/// Broadcast to long running tasks when the process is asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Shutdown,
}
