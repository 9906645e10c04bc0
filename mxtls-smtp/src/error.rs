//! Error types for SMTP negotiation.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmtpError {
    /// A response line does not follow `<3 digits><'-' | ' '><text>`.
    #[error("Malformed SMTP response: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The server did not answer within the receive timeout, or a write did
    /// not complete within the send timeout.
    #[error("Timed out waiting to {0}")]
    Timeout(&'static str),

    #[error("Connection closed by server")]
    ConnectionClosed,
}

impl SmtpError {
    /// Failures where the server never said anything we could act on.
    #[must_use]
    pub const fn is_silence(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::ConnectionClosed)
    }
}

pub type Result<T> = std::result::Result<T, SmtpError>;
