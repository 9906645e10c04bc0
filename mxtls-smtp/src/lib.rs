//! Drives an SMTP server from its greeting to the point where a TLS
//! handshake can begin.
//!
//! ```no_run
//! use mxtls_common::config::ProbeTimeouts;
//! use mxtls_smtp::{SmtpConfig, SmtpNegotiator};
//!
//! # async fn example() -> std::io::Result<()> {
//! let stream = tokio::net::TcpStream::connect("192.0.2.10:25").await?;
//! let negotiator = SmtpNegotiator::new(SmtpConfig::default(), ProbeTimeouts::default());
//! let negotiation = negotiator.negotiate("192.0.2.10", stream).await;
//!
//! if negotiation.is_success() {
//!     // negotiation.stream is ready for a ClientHello
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod negotiator;
mod response;
mod transcript;

pub use config::SmtpConfig;
pub use error::{Result, SmtpError};
pub use negotiator::{Negotiation, NegotiationOutcome, SmtpNegotiator};
pub use response::{ResponseCode, SmtpResponse};
pub use transcript::Transcript;
