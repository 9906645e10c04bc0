use std::net::SocketAddr;

use mxtls_common::{
    ClassifiedError, ProbeResult, TestCriteria,
    config::{ProbeTimeouts, TimeoutConfig},
    internal,
    tls::AlertDescription,
};
use mxtls_smtp::{SmtpConfig, SmtpNegotiator};
use mxtls_tracing::traced;
use tokio::net::{TcpStream, lookup_host};

use crate::engine::{Engine, legacy, library};

type Failure = (ClassifiedError, String);

/// Performs one forced handshake per call, from DNS lookup to the server's
/// choice of parameters.
///
/// Holds nothing but configuration, so it can be shared freely between
/// tasks.
#[derive(Debug, Clone)]
pub struct TlsProbeClient {
    negotiator: SmtpNegotiator,
    timeouts: ProbeTimeouts,
}

impl TlsProbeClient {
    #[must_use]
    pub fn new(smtp: SmtpConfig, timeouts: ProbeTimeouts) -> Self {
        Self {
            negotiator: SmtpNegotiator::new(smtp, timeouts.clone()),
            timeouts,
        }
    }

    /// Runs `criteria` against `host:port`.
    ///
    /// Never fails: connectivity problems, SMTP refusals and TLS alerts all
    /// come back as a classified [`ProbeResult`], carrying the SMTP
    /// transcript whenever the session got that far.
    ///
    /// rustls cannot offer every group of the default list. When it was used
    /// with that list and the server refused, the handshake is repeated on a
    /// fresh session with the hand-built ClientHello and its full offer.
    #[traced(instrument(level = tracing::Level::DEBUG, skip_all, fields(target = %host, test = %criteria.name)), timing(precision = "ms"))]
    pub async fn probe(&self, criteria: &TestCriteria, host: &str, port: u16) -> ProbeResult {
        let engine = Engine::for_criteria(criteria);
        let result = self.attempt(engine, criteria, host, port).await;

        if engine == Engine::Library
            && library::narrows_offer(criteria)
            && result.failed_with(&[
                AlertDescription::HandshakeFailure,
                AlertDescription::InsufficientSecurity,
            ])
        {
            internal!(
                level = DEBUG,
                "{host} refused the library offer for {}, retrying with every group",
                criteria.name
            );
            return self.attempt(Engine::Legacy, criteria, host, port).await;
        }

        result
    }

    /// One session with one engine.
    async fn attempt(
        &self,
        engine: Engine,
        criteria: &TestCriteria,
        host: &str,
        port: u16,
    ) -> ProbeResult {
        let (stream, peer) = match self.connect(host, port).await {
            Ok(connected) => connected,
            Err((error, description)) => {
                internal!(level = DEBUG, "Unable to reach {host}:{port}: {description}");
                return ProbeResult::failed(error, description);
            }
        };

        let negotiation = self.negotiator.negotiate(&peer.to_string(), stream).await;
        if !negotiation.is_success() {
            let description = negotiation.description.as_deref().unwrap_or_default();
            return ProbeResult::failed(
                ClassifiedError::SessionInitializationFailed,
                format!("{} ({description})", negotiation.outcome),
            )
            .with_transcript(negotiation.transcript);
        }

        let mut stream = negotiation.stream;
        let outcome = match engine {
            Engine::Legacy => legacy::handshake(&mut stream, criteria, host, &self.timeouts).await,
            Engine::Library => library::handshake(stream, criteria, host, &self.timeouts).await,
        };

        let result = match outcome {
            Ok(negotiated) => {
                tracing::debug!(
                    version = %negotiated.version,
                    cipher_suite = %negotiated.cipher_suite,
                    "Handshake negotiated"
                );
                ProbeResult::negotiated(
                    negotiated.version,
                    negotiated.cipher_suite,
                    negotiated.key_exchange,
                    negotiated.certificates,
                )
            }
            Err(err) => {
                let error = err.classify();
                tracing::debug!(%error, "Handshake failed: {err}");

                let result = ProbeResult::failed(error, err.to_string());
                match err.observed_version() {
                    Some(version) => result.with_observed_version(version),
                    None => result,
                }
            }
        };

        result.with_transcript(negotiation.transcript)
    }

    /// Resolves `host` and connects to the first address that answers.
    async fn connect(&self, host: &str, port: u16) -> Result<(TcpStream, SocketAddr), Failure> {
        let addresses: Vec<SocketAddr> =
            tokio::time::timeout(self.timeouts.connect_timeout(), lookup_host((host, port)))
                .await
                .map_err(|_| {
                    (
                        ClassifiedError::HostNotFound,
                        format!("Timed out resolving {host}"),
                    )
                })?
                .map_err(|err| {
                    (
                        ClassifiedError::HostNotFound,
                        format!("Unable to resolve {host}: {err}"),
                    )
                })?
                .collect();

        if addresses.is_empty() {
            return Err((
                ClassifiedError::HostNotFound,
                format!("No addresses found for {host}"),
            ));
        }

        let mut last_error = String::new();
        for address in addresses {
            match tokio::time::timeout(self.timeouts.connect_timeout(), TcpStream::connect(address))
                .await
            {
                Ok(Ok(stream)) => return Ok((stream, address)),
                Ok(Err(err)) => last_error = format!("Unable to connect to {address}: {err}"),
                Err(_) => last_error = format!("Timed out connecting to {address}"),
            }
            internal!(level = DEBUG, "{last_error}");
        }

        Err((ClassifiedError::TcpConnectionFailed, last_error))
    }
}
