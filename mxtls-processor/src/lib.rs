//! Batch orchestration: pending tests come in from a [`PendingTestSource`],
//! every target in a batch is probed concurrently by a [`TargetTester`] and
//! each conclusive run is handed to a [`ResultPublisher`].

mod certificates;
mod config;
mod error;
mod message;
mod processor;
mod tester;
pub mod transport;

pub use certificates::{CertificateCache, thumbprint};
pub use config::ProcessorConfig;
pub use error::{ProcessorError, Result};
pub use message::{PendingTest, SimplifiedTlsConnectionResult, TestRunMessage};
pub use processor::{BatchReport, Processor};
pub use tester::{SecurityTester, TargetTester, TestRun};
pub use transport::{PendingTestSource, ResultPublisher};
