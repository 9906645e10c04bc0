//! The outcome of one forced handshake.

use serde::{Serialize, Serializer};

use crate::tls::{
    AlertDescription, CipherSuite, DhGroup, KeyExchange, NamedGroup, SignatureAlgorithm,
    TlsVersion,
};

/// Which layer a probe failed in. Rules branch on this before anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Nothing was learned about the server's TLS policy.
    Connectivity,
    /// The server answered at the TLS layer and refused or misbehaved.
    Protocol,
    /// Something went wrong on our side.
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ClassifiedError {
    /// The server sent a fatal alert, or the client raised one itself while
    /// checking the server's messages.
    #[error("{0}")]
    Alert(AlertDescription),

    /// The server closed the connection after the ClientHello without
    /// sending an alert.
    #[error("connection_closed")]
    ConnectionClosed,

    #[error("tcp_connection_failed")]
    TcpConnectionFailed,

    #[error("host_not_found")]
    HostNotFound,

    /// SMTP did not get as far as a successful STARTTLS.
    #[error("session_initialization_failed")]
    SessionInitializationFailed,

    #[error("internal_error")]
    InternalError,
}

impl ClassifiedError {
    #[must_use]
    pub const fn class(self) -> ErrorClass {
        match self {
            Self::Alert(_) | Self::ConnectionClosed => ErrorClass::Protocol,
            Self::TcpConnectionFailed | Self::HostNotFound | Self::SessionInitializationFailed => {
                ErrorClass::Connectivity
            }
            Self::InternalError => ErrorClass::Internal,
        }
    }

    #[must_use]
    pub const fn is_connectivity(self) -> bool {
        matches!(self.class(), ErrorClass::Connectivity)
    }

    /// Connectivity and internal failures say nothing about the server.
    #[must_use]
    pub const fn is_inconclusive(self) -> bool {
        !matches!(self.class(), ErrorClass::Protocol)
    }

    #[must_use]
    pub const fn alert(self) -> Option<AlertDescription> {
        match self {
            Self::Alert(alert) => Some(alert),
            _ => None,
        }
    }
}

impl From<AlertDescription> for ClassifiedError {
    fn from(alert: AlertDescription) -> Self {
        Self::Alert(alert)
    }
}

impl Serialize for ClassifiedError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Everything one handshake attempt revealed.
///
/// A result either carries a negotiated cipher suite or a classified error.
/// Connectivity failures never carry TLS-layer fields; the constructors and
/// builders keep it that way.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProbeResult {
    version: Option<TlsVersion>,
    cipher_suite: Option<CipherSuite>,
    key_exchange: Option<KeyExchange>,
    error: Option<ClassifiedError>,
    error_description: Option<String>,
    certificates: Vec<Vec<u8>>,
    smtp_transcript: Vec<String>,
}

impl ProbeResult {
    /// A completed negotiation. `certificates` are DER, leaf first.
    #[must_use]
    pub fn negotiated(
        version: TlsVersion,
        cipher_suite: CipherSuite,
        key_exchange: Option<KeyExchange>,
        certificates: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            version: Some(version),
            cipher_suite: Some(cipher_suite),
            key_exchange,
            error: None,
            error_description: None,
            certificates,
            smtp_transcript: Vec::new(),
        }
    }

    #[must_use]
    pub fn failed(error: ClassifiedError, description: impl Into<String>) -> Self {
        Self {
            error: Some(error),
            error_description: Some(description.into()),
            ..Self::default()
        }
    }

    /// Records the version a server answered with, even though the
    /// handshake failed. Ignored for connectivity failures.
    #[must_use]
    pub fn with_observed_version(mut self, version: TlsVersion) -> Self {
        if !self.error.is_some_and(ClassifiedError::is_connectivity) {
            self.version = Some(version);
        }
        self
    }

    #[must_use]
    pub fn with_transcript(mut self, transcript: Vec<String>) -> Self {
        self.smtp_transcript = transcript;
        self
    }

    pub const fn version(&self) -> Option<TlsVersion> {
        self.version
    }

    pub const fn cipher_suite(&self) -> Option<CipherSuite> {
        self.cipher_suite
    }

    pub const fn key_exchange(&self) -> Option<&KeyExchange> {
        self.key_exchange.as_ref()
    }

    pub fn curve(&self) -> Option<NamedGroup> {
        self.key_exchange.as_ref().and_then(KeyExchange::curve)
    }

    pub fn group(&self) -> Option<DhGroup> {
        self.key_exchange.as_ref().and_then(KeyExchange::dh_group)
    }

    pub fn signature(&self) -> Option<SignatureAlgorithm> {
        self.key_exchange.as_ref().and_then(KeyExchange::signature)
    }

    pub const fn error(&self) -> Option<ClassifiedError> {
        self.error
    }

    pub fn error_description(&self) -> Option<&str> {
        self.error_description.as_deref()
    }

    pub fn certificates(&self) -> &[Vec<u8>] {
        &self.certificates
    }

    pub fn smtp_transcript(&self) -> &[String] {
        &self.smtp_transcript
    }

    pub const fn is_success(&self) -> bool {
        self.error.is_none() && self.cipher_suite.is_some()
    }

    pub fn error_class(&self) -> Option<ErrorClass> {
        self.error.map(ClassifiedError::class)
    }

    /// True when the failure is one of the given alerts.
    pub fn failed_with(&self, alerts: &[AlertDescription]) -> bool {
        self.error
            .and_then(ClassifiedError::alert)
            .is_some_and(|alert| alerts.contains(&alert))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_error_classes() {
        assert_eq!(
            ClassifiedError::Alert(AlertDescription::HandshakeFailure).class(),
            ErrorClass::Protocol
        );
        assert_eq!(ClassifiedError::ConnectionClosed.class(), ErrorClass::Protocol);
        assert_eq!(ClassifiedError::HostNotFound.class(), ErrorClass::Connectivity);
        assert_eq!(ClassifiedError::TcpConnectionFailed.class(), ErrorClass::Connectivity);
        assert_eq!(
            ClassifiedError::SessionInitializationFailed.class(),
            ErrorClass::Connectivity
        );
        assert_eq!(ClassifiedError::InternalError.class(), ErrorClass::Internal);
        assert!(ClassifiedError::InternalError.is_inconclusive());
        assert!(!ClassifiedError::Alert(AlertDescription::InternalError).is_inconclusive());
    }

    #[test]
    fn test_connectivity_failure_carries_no_tls_fields() {
        let result = ProbeResult::failed(ClassifiedError::TcpConnectionFailed, "refused")
            .with_observed_version(TlsVersion::Tls12);
        assert_eq!(result.version(), None);
        assert_eq!(result.cipher_suite(), None);
        assert!(!result.is_success());

        let result = ProbeResult::failed(
            ClassifiedError::Alert(AlertDescription::ProtocolVersion),
            "server chose TLS 1.0",
        )
        .with_observed_version(TlsVersion::Tls10);
        assert_eq!(result.version(), Some(TlsVersion::Tls10));
    }

    #[test]
    fn test_display_and_alert_match() {
        let error = ClassifiedError::Alert(AlertDescription::HandshakeFailure);
        assert_eq!(error.to_string(), "handshake_failure");
        assert_eq!(ClassifiedError::HostNotFound.to_string(), "host_not_found");

        let result = ProbeResult::failed(error, "refused");
        assert!(result.failed_with(&[AlertDescription::HandshakeFailure]));
        assert!(!result.failed_with(&[AlertDescription::ProtocolVersion]));
    }
}
