use std::fmt;

use mxtls_common::{
    config::{ProbeTimeouts, TimeoutConfig},
    incoming, internal, outgoing, tracing,
};
use mxtls_tracing::traced;
use rand::Rng;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{
    config::SmtpConfig,
    error::{Result, SmtpError},
    response::{ResponseCode, SmtpResponse},
    transcript::Transcript,
};

/// Longest reply line we are willing to buffer.
const MAX_LINE_LENGTH: u64 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationOutcome {
    /// STARTTLS was accepted; the stream is ready for a ClientHello.
    Ready,
    /// The greeting was a 421.
    TransientError,
    /// The greeting was neither 220 nor 421.
    NotReady,
    /// The server sent nothing before closing or timing out.
    NoResponse,
    StartTlsNotSupported,
    StartTlsRequestFailed,
    /// I/O failure, timeout or malformed reply after the greeting.
    Failed,
}

impl fmt::Display for NegotiationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ready => "Ready",
            Self::TransientError => "TransientError",
            Self::NotReady => "NotReady",
            Self::NoResponse => "NoResponse",
            Self::StartTlsNotSupported => "StartTlsNotSupported",
            Self::StartTlsRequestFailed => "StartTlsRequestFailed",
            Self::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// What came of an attempt to reach STARTTLS. The stream is handed back on
/// every path so the caller decides when it is closed.
#[derive(Debug)]
pub struct Negotiation<S> {
    pub outcome: NegotiationOutcome,
    pub description: Option<String>,
    pub transcript: Vec<String>,
    pub stream: S,
}

impl<S> Negotiation<S> {
    pub fn is_success(&self) -> bool {
        self.outcome == NegotiationOutcome::Ready
    }
}

struct Stop {
    outcome: NegotiationOutcome,
    description: String,
}

impl Stop {
    fn new(outcome: NegotiationOutcome, description: impl fmt::Display) -> Self {
        Self {
            outcome,
            description: description.to_string(),
        }
    }

    fn failed(err: SmtpError) -> Self {
        Self::new(NegotiationOutcome::Failed, err)
    }
}

fn describe(reply: &[SmtpResponse]) -> String {
    reply
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" / ")
}

#[derive(Debug, Clone)]
pub struct SmtpNegotiator {
    config: SmtpConfig,
    timeouts: ProbeTimeouts,
}

impl SmtpNegotiator {
    #[must_use]
    pub const fn new(config: SmtpConfig, timeouts: ProbeTimeouts) -> Self {
        Self { config, timeouts }
    }

    /// `gatewayN.<suffix>` with N drawn uniformly from the configured pool.
    #[must_use]
    pub fn gateway_hostname(&self) -> String {
        let n = rand::rng().random_range(1..=self.config.gateway_pool.max(1));
        format!("gateway{n}.{}", self.config.gateway_suffix)
    }

    /// Reads the greeting, sends EHLO and STARTTLS, and reports how far the
    /// server let us get.
    #[traced(instrument(level = tracing::Level::DEBUG, skip_all, fields(peer = %peer)), timing(precision = "ms"))]
    pub async fn negotiate<S>(&self, peer: &str, stream: S) -> Negotiation<S>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut transcript = Transcript::new(peer);
        let mut reader = BufReader::new(stream);

        let (outcome, description) = match self.exchange(&mut reader, &mut transcript).await {
            Ok(()) => (NegotiationOutcome::Ready, None),
            Err(stop) => {
                internal!(level = DEBUG, "Negotiation stopped: {} ({})", stop.outcome, stop.description);
                (stop.outcome, Some(stop.description))
            }
        };

        if outcome == NegotiationOutcome::Ready && !reader.buffer().is_empty() {
            tracing::warn!(
                peer,
                bytes = reader.buffer().len(),
                "Discarding data sent after the STARTTLS reply"
            );
        }

        Negotiation {
            outcome,
            description,
            transcript: transcript.to_lines(),
            stream: reader.into_inner(),
        }
    }

    async fn exchange<S>(
        &self,
        reader: &mut BufReader<S>,
        transcript: &mut Transcript,
    ) -> std::result::Result<(), Stop>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let greeting = self.read_reply(reader, transcript).await.map_err(|err| {
            if err.is_silence() {
                Stop::new(NegotiationOutcome::NoResponse, err)
            } else {
                Stop::failed(err)
            }
        })?;

        match greeting.first().map(|response| response.code) {
            Some(ResponseCode::ServiceReady) => {}
            Some(ResponseCode::TransientError) => {
                return Err(Stop::new(NegotiationOutcome::TransientError, describe(&greeting)));
            }
            _ => return Err(Stop::new(NegotiationOutcome::NotReady, describe(&greeting))),
        }

        let ehlo = format!("EHLO {}", self.gateway_hostname());
        self.send(reader, transcript, &ehlo).await.map_err(Stop::failed)?;
        let capabilities = self.read_reply(reader, transcript).await.map_err(Stop::failed)?;

        if !capabilities.iter().any(|line| line.advertises("STARTTLS")) {
            return Err(Stop::new(
                NegotiationOutcome::StartTlsNotSupported,
                describe(&capabilities),
            ));
        }

        self.send(reader, transcript, "STARTTLS").await.map_err(Stop::failed)?;
        let reply = self.read_reply(reader, transcript).await.map_err(Stop::failed)?;

        match reply.first().map(|response| response.code) {
            Some(ResponseCode::ServiceReady) => Ok(()),
            _ => Err(Stop::new(
                NegotiationOutcome::StartTlsRequestFailed,
                describe(&reply),
            )),
        }
    }

    async fn send<S>(
        &self,
        reader: &mut BufReader<S>,
        transcript: &mut Transcript,
        command: &str,
    ) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        transcript.sent(command);
        outgoing!("{command}");

        let data = format!("{command}\r\n");
        let stream = reader.get_mut();

        tokio::time::timeout(self.timeouts.send_timeout(), async {
            stream.write_all(data.as_bytes()).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| SmtpError::Timeout("send a command"))??;

        Ok(())
    }

    /// Reads one reply, every line of it, recording each in the transcript.
    async fn read_reply<S>(
        &self,
        reader: &mut BufReader<S>,
        transcript: &mut Transcript,
    ) -> Result<Vec<SmtpResponse>>
    where
        S: AsyncRead + Unpin,
    {
        let mut responses = Vec::new();
        let mut line = String::new();

        loop {
            line.clear();
            let read = tokio::time::timeout(
                self.timeouts.receive_timeout(),
                (&mut *reader).take(MAX_LINE_LENGTH).read_line(&mut line),
            )
            .await
            .map_err(|_| SmtpError::Timeout("read a reply"))??;

            if read == 0 {
                return Err(SmtpError::ConnectionClosed);
            }

            let trimmed = line.trim_end_matches(['\r', '\n']);
            transcript.received(trimmed);
            incoming!("{trimmed}");

            let (response, is_last) = SmtpResponse::parse_line(trimmed)?;
            responses.push(response);

            if is_last {
                return Ok(responses);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_hostname_pool() {
        let negotiator = SmtpNegotiator::new(SmtpConfig::default(), ProbeTimeouts::default());
        for _ in 0..64 {
            let hostname = negotiator.gateway_hostname();
            let n = hostname
                .strip_prefix("gateway")
                .and_then(|rest| rest.strip_suffix(".mxtls.invalid"))
                .and_then(|n| n.parse::<u8>().ok())
                .unwrap();
            assert!((1..=5).contains(&n), "{hostname}");
        }
    }

    #[tokio::test]
    async fn test_negotiate_over_duplex() {
        let (client, mut server) = tokio::io::duplex(1024);
        let negotiator = SmtpNegotiator::new(SmtpConfig::default(), ProbeTimeouts::uniform(5));

        let script = tokio::spawn(async move {
            let mut lines = BufReader::new(&mut server);
            let mut line = String::new();
            lines.get_mut().write_all(b"220 ready\r\n").await.unwrap();
            lines.read_line(&mut line).await.unwrap();
            lines
                .get_mut()
                .write_all(b"250-mx.example.com\r\n250 STARTTLS\r\n")
                .await
                .unwrap();
            line.clear();
            lines.read_line(&mut line).await.unwrap();
            assert_eq!(line, "STARTTLS\r\n");
            lines.get_mut().write_all(b"220 go ahead\r\n").await.unwrap();
        });

        let negotiation = negotiator.negotiate("duplex", client).await;
        script.await.unwrap();

        assert_eq!(negotiation.outcome, NegotiationOutcome::Ready);
        assert_eq!(negotiation.transcript.len(), 6);
        assert!(negotiation.transcript[1].starts_with("C: EHLO gateway"));
        assert_eq!(negotiation.transcript[5], "S: 220 go ahead");
    }
}
