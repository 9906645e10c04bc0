//! Socket timeout configuration for probes.
//!
//! Every probe opens one TCP connection, speaks SMTP until STARTTLS and then
//! performs a single TLS handshake. Each socket operation is bounded by one of
//! the timeouts below, which is what limits how long an abandoned run can hang
//! after the batch timeout has fired.
//!
//! The defaults follow the five minute RFC 5321 recommendation for SMTP
//! command replies.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Common interface for anything that bounds socket operations.
pub trait TimeoutConfig {
    /// Timeout for establishing the TCP connection.
    fn connect_timeout(&self) -> Duration;

    /// Timeout for a single write.
    fn send_timeout(&self) -> Duration;

    /// Timeout for a single read.
    fn receive_timeout(&self) -> Duration;
}

/// Timeouts applied to every probe connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeTimeouts {
    /// Timeout for the TCP connect.
    ///
    /// Default: 300 seconds
    #[serde(default = "defaults::connect_secs")]
    pub connect_secs: u64,

    /// Timeout for each write on the socket.
    ///
    /// Default: 300 seconds
    #[serde(default = "defaults::send_secs")]
    pub send_secs: u64,

    /// Timeout for each read on the socket.
    ///
    /// Default: 300 seconds
    #[serde(default = "defaults::receive_secs")]
    pub receive_secs: u64,
}

impl Default for ProbeTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: defaults::connect_secs(),
            send_secs: defaults::send_secs(),
            receive_secs: defaults::receive_secs(),
        }
    }
}

impl ProbeTimeouts {
    /// The same timeout for every operation; handy in tests.
    #[must_use]
    pub const fn uniform(secs: u64) -> Self {
        Self {
            connect_secs: secs,
            send_secs: secs,
            receive_secs: secs,
        }
    }
}

impl TimeoutConfig for ProbeTimeouts {
    fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_secs)
    }

    fn receive_timeout(&self) -> Duration {
        Duration::from_secs(self.receive_secs)
    }
}

mod defaults {
    pub const fn connect_secs() -> u64 {
        300 // 5 minutes
    }
    pub const fn send_secs() -> u64 {
        300
    }
    pub const fn receive_secs() -> u64 {
        300
    }
}
