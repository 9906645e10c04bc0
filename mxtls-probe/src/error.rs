use std::io;

use mxtls_common::{
    ClassifiedError,
    tls::{AlertDescription, TlsVersion},
};
use thiserror::Error;
use tokio_rustls::rustls;

pub type Result<T> = std::result::Result<T, ProbeError>;

/// Why a handshake attempt stopped. Internal to the probe; callers only ever
/// see the [`ClassifiedError`] produced by [`ProbeError::classify`].
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Malformed message: {0}")]
    Decode(String),

    #[error("Server sent a fatal {0} alert")]
    AlertReceived(AlertDescription),

    /// The server's answer broke the forced parameters; we raise the alert.
    #[error("{reason}")]
    Rejected {
        alert: AlertDescription,
        reason: String,
        observed: Option<TlsVersion>,
    },

    #[error("Connection closed by the server without an alert")]
    ConnectionClosed,

    #[error("Timed out while trying to {0}")]
    Timeout(&'static str),

    #[error("Unable to offer the requested parameters: {0}")]
    Unsupported(String),

    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ProbeError {
    /// The version the server answered with, when it answered at all.
    pub const fn observed_version(&self) -> Option<TlsVersion> {
        match self {
            Self::Rejected { observed, .. } => *observed,
            _ => None,
        }
    }

    pub fn classify(&self) -> ClassifiedError {
        match self {
            Self::Decode(_) => AlertDescription::DecodeError.into(),
            Self::AlertReceived(alert) | Self::Rejected { alert, .. } => (*alert).into(),
            Self::ConnectionClosed => ClassifiedError::ConnectionClosed,
            Self::Tls(err) => classify_rustls(err),
            Self::Io(err) => classify_io(err),
            Self::Timeout(_) | Self::Unsupported(_) => ClassifiedError::InternalError,
        }
    }
}

fn classify_io(err: &io::Error) -> ClassifiedError {
    // tokio-rustls hands TLS failures back wrapped in an io::Error.
    if let Some(tls) = err.get_ref().and_then(|inner| inner.downcast_ref::<rustls::Error>()) {
        return classify_rustls(tls);
    }

    match err.kind() {
        io::ErrorKind::UnexpectedEof
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => ClassifiedError::ConnectionClosed,
        _ => ClassifiedError::InternalError,
    }
}

fn classify_rustls(err: &rustls::Error) -> ClassifiedError {
    match err {
        rustls::Error::AlertReceived(alert) => {
            AlertDescription::from_wire(u8::from(*alert)).map_or(ClassifiedError::InternalError, Into::into)
        }
        rustls::Error::InvalidMessage(_) => AlertDescription::DecodeError.into(),
        rustls::Error::PeerIncompatible(rustls::PeerIncompatible::ServerTlsVersionIsDisabledByOurConfig) => {
            AlertDescription::ProtocolVersion.into()
        }
        rustls::Error::PeerIncompatible(_) => AlertDescription::HandshakeFailure.into(),
        rustls::Error::PeerMisbehaved(_) => AlertDescription::IllegalParameter.into(),
        _ => ClassifiedError::InternalError,
    }
}
