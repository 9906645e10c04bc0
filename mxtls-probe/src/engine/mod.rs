//! The two ways a forced handshake is carried out. Both stop once the
//! server has revealed its choices and neither validates the certificate.

pub mod legacy;
pub mod library;

use mxtls_common::{
    TestCriteria,
    tls::{AlertDescription, CipherSuite, KeyExchange, TlsVersion},
};

use crate::error::{ProbeError, Result};

/// What the server chose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    pub version: TlsVersion,
    pub cipher_suite: CipherSuite,
    pub key_exchange: Option<KeyExchange>,
    /// DER, leaf first.
    pub certificates: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    /// Hand-built ClientHello, any version.
    Legacy,
    /// rustls, TLS 1.3 only.
    Library,
}

impl Engine {
    /// rustls is used for TLS 1.3 whenever it can offer exactly what the
    /// criteria ask for.
    pub fn for_criteria(criteria: &TestCriteria) -> Self {
        if criteria.version == TlsVersion::Tls13 && library::can_offer(criteria) {
            Self::Library
        } else {
            Self::Legacy
        }
    }
}

/// The server must answer with the forced version and one of the offered
/// suites.
pub fn check_server_choice(
    criteria: &TestCriteria,
    version: Option<TlsVersion>,
    wire_version: u16,
    cipher_suite: CipherSuite,
) -> Result<TlsVersion> {
    let Some(version) = version.filter(|version| *version == criteria.version) else {
        return Err(ProbeError::Rejected {
            alert: AlertDescription::ProtocolVersion,
            reason: format!(
                "Server selected version 0x{wire_version:04X}, {} was required",
                criteria.version
            ),
            observed: version,
        });
    };

    if !criteria.cipher_suites.contains(&cipher_suite) {
        return Err(ProbeError::Rejected {
            alert: AlertDescription::IllegalParameter,
            reason: format!("Server selected {cipher_suite}, which was not offered"),
            observed: Some(version),
        });
    }

    Ok(version)
}
