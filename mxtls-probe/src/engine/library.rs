use std::sync::{Arc, OnceLock};

use mxtls_common::{
    TestCriteria,
    config::{ProbeTimeouts, TimeoutConfig},
    internal,
    tls::{
        CipherSuite, DhGroup, KeyExchange, NamedGroup, SignatureAlgorithm, SignatureScheme,
        TlsVersion,
    },
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::{
    TlsConnector,
    rustls::{
        self, ClientConfig, DigitallySignedStruct,
        client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
        crypto::{CryptoProvider, SupportedKxGroup, aws_lc_rs},
        pki_types::{CertificateDer, ServerName, UnixTime},
    },
};

use super::{Negotiated, check_server_choice};
use crate::error::{ProbeError, Result};

fn supported_group(group: NamedGroup) -> Option<&'static dyn SupportedKxGroup> {
    aws_lc_rs::ALL_KX_GROUPS
        .iter()
        .find(|supported| u16::from(supported.name()) == group.0)
        .copied()
}

/// Whether the library provider can offer every suite, and every group when
/// the criteria name them.
pub fn can_offer(criteria: &TestCriteria) -> bool {
    let provider = aws_lc_rs::default_provider();

    let suites = criteria.cipher_suites.iter().all(|suite| {
        provider
            .cipher_suites
            .iter()
            .any(|supported| u16::from(supported.suite()) == suite.0)
    });

    let groups = criteria
        .groups
        .as_ref()
        .is_none_or(|groups| groups.iter().all(|group| supported_group(*group).is_some()));

    suites && groups
}

/// Whether some of the groups the criteria stand for cannot be offered here,
/// so a refusal may be down to the offer rather than the server.
pub fn narrows_offer(criteria: &TestCriteria) -> bool {
    criteria
        .offered_groups()
        .iter()
        .any(|group| supported_group(*group).is_none())
}

/// The default provider cut down to the criteria, in the criteria's order.
/// Without named groups every group the provider implements is offered.
fn provider_for(criteria: &TestCriteria) -> Result<CryptoProvider> {
    let defaults = aws_lc_rs::default_provider();

    let cipher_suites = criteria
        .cipher_suites
        .iter()
        .filter_map(|suite| {
            defaults
                .cipher_suites
                .iter()
                .find(|supported| u16::from(supported.suite()) == suite.0)
                .copied()
        })
        .collect::<Vec<_>>();

    let kx_groups = match &criteria.groups {
        Some(groups) => groups.iter().filter_map(|group| supported_group(*group)).collect(),
        None => aws_lc_rs::ALL_KX_GROUPS.to_vec(),
    };

    if cipher_suites.is_empty() || kx_groups.is_empty() {
        return Err(ProbeError::Unsupported(format!(
            "none of the suites or groups of {} are available",
            criteria.name
        )));
    }

    Ok(CryptoProvider {
        cipher_suites,
        kx_groups,
        ..defaults
    })
}

/// Accepts any certificate and remembers which scheme signed the handshake.
#[derive(Debug)]
struct RecordingVerifier {
    schemes: Vec<rustls::SignatureScheme>,
    signature: OnceLock<rustls::SignatureScheme>,
}

impl ServerCertVerifier for RecordingVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        let _ = self.signature.set(dss.scheme);
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        let _ = self.signature.set(dss.scheme);
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        self.schemes.clone()
    }
}

/// A complete TLS 1.3 handshake through rustls. The connection is dropped
/// as soon as the parameters are read back.
pub async fn handshake<S>(
    stream: S,
    criteria: &TestCriteria,
    host: &str,
    timeouts: &ProbeTimeouts,
) -> Result<Negotiated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let provider = provider_for(criteria)?;
    let verifier = Arc::new(RecordingVerifier {
        schemes: provider.signature_verification_algorithms.supported_schemes(),
        signature: OnceLock::new(),
    });

    let config = ClientConfig::builder_with_provider(Arc::new(provider))
        .with_protocol_versions(&[&rustls::version::TLS13])?
        .dangerous()
        .with_custom_certificate_verifier(Arc::clone(&verifier) as Arc<dyn ServerCertVerifier>)
        .with_no_client_auth();

    let server_name = ServerName::try_from(host.trim_end_matches('.').to_owned())
        .map_err(|err| ProbeError::Unsupported(format!("invalid server name {host}: {err}")))?;

    let tls = tokio::time::timeout(
        timeouts.receive_timeout(),
        TlsConnector::from(Arc::new(config)).connect(server_name, stream),
    )
    .await
    .map_err(|_| ProbeError::Timeout("complete the TLS handshake"))??;

    let (_, connection) = tls.get_ref();

    let Some(suite) = connection.negotiated_cipher_suite() else {
        return Err(ProbeError::Decode("handshake finished without a cipher suite".into()));
    };
    let cipher_suite = CipherSuite(u16::from(suite.suite()));
    let wire_version = connection.protocol_version().map_or(0, u16::from);
    let version = check_server_choice(
        criteria,
        TlsVersion::from_wire(wire_version),
        wire_version,
        cipher_suite,
    )?;

    let signature = verifier
        .signature
        .get()
        .map(|scheme| SignatureAlgorithm::Scheme(SignatureScheme(u16::from(*scheme))));

    let key_exchange = connection.negotiated_key_exchange_group().map(|group| {
        let group = NamedGroup(u16::from(group.name()));
        match DhGroup::from_named(group) {
            Some(dh) => KeyExchange::Dhe {
                group: dh,
                signature,
            },
            None => KeyExchange::Ecdhe {
                curve: group,
                signature,
            },
        }
    });

    let certificates = connection
        .peer_certificates()
        .map(|chain| chain.iter().map(|cert| cert.as_ref().to_vec()).collect())
        .unwrap_or_default();

    internal!(
        level = DEBUG,
        "Library handshake completed with {cipher_suite}, key exchange {key_exchange:?}"
    );

    Ok(Negotiated {
        version,
        cipher_suite,
        key_exchange,
        certificates,
    })
}
