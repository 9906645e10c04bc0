//! Forced-parameter TLS handshakes against mail servers.
//!
//! A probe connects to the server, negotiates STARTTLS and sends a
//! ClientHello offering exactly the version, suites and groups of one
//! [`TestCriteria`](mxtls_common::TestCriteria). Whatever the server does next
//! is folded into a [`ProbeResult`](mxtls_common::ProbeResult).

mod client;
mod engine;
mod error;
pub mod wire;

pub use client::TlsProbeClient;
pub use engine::{Engine, Negotiated};
pub use error::{ProbeError, Result};
