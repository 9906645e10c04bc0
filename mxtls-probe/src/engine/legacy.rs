use mxtls_common::{
    TestCriteria,
    config::{ProbeTimeouts, TimeoutConfig},
    internal, outgoing,
    tls::{AlertDescription, DhGroup, KeyExchange, KeyExchangeFamily, TlsVersion},
};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use super::{Negotiated, check_server_choice};
use crate::{
    error::{ProbeError, Result},
    wire::{
        HANDSHAKE_CERTIFICATE, HANDSHAKE_SERVER_HELLO, HANDSHAKE_SERVER_HELLO_DONE,
        HANDSHAKE_SERVER_KEY_EXCHANGE,
        hello::ClientHello,
        record::RecordReader,
        server::{ServerHello, parse_certificates, parse_server_key_exchange},
    },
};

/// Sends a hand-built ClientHello and reads the server's first flight.
///
/// Up to TLS 1.2 the flight runs to ServerHelloDone and yields the chain and
/// key exchange parameters. For TLS 1.3 only the (retry) ServerHello is read:
/// it names the suite and group, everything after it is encrypted.
pub async fn handshake<S>(
    stream: &mut S,
    criteria: &TestCriteria,
    host: &str,
    timeouts: &ProbeTimeouts,
) -> Result<Negotiated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let record = ClientHello::new(criteria, host).to_record();
    outgoing!(
        level = DEBUG,
        "ClientHello {} with {} suites ({} bytes)",
        criteria.version,
        criteria.cipher_suites.len(),
        record.len()
    );

    tokio::time::timeout(timeouts.send_timeout(), async {
        stream.write_all(&record).await?;
        stream.flush().await
    })
    .await
    .map_err(|_| ProbeError::Timeout("send the ClientHello"))??;

    let mut reader = RecordReader::new(stream, timeouts.receive_timeout());

    let first = reader.next_message().await?;
    if first.kind != HANDSHAKE_SERVER_HELLO {
        return Err(ProbeError::Decode(format!(
            "expected ServerHello, got handshake type {}",
            first.kind
        )));
    }

    let hello = ServerHello::parse(&first.body)?;
    internal!(
        level = DEBUG,
        "Server selected 0x{:04X} with {}",
        hello.selected_version,
        hello.cipher_suite
    );

    let version = check_server_choice(
        criteria,
        hello.version(),
        hello.selected_version,
        hello.cipher_suite,
    )?;

    if hello.compression != 0 {
        return Err(ProbeError::Rejected {
            alert: AlertDescription::IllegalParameter,
            reason: format!("Server selected compression method {}", hello.compression),
            observed: Some(version),
        });
    }

    if version == TlsVersion::Tls13 {
        return Ok(Negotiated {
            version,
            cipher_suite: hello.cipher_suite,
            key_exchange: hello.key_share_group.map(|group| {
                DhGroup::from_named(group).map_or(
                    KeyExchange::Ecdhe {
                        curve: group,
                        signature: None,
                    },
                    |group| KeyExchange::Dhe {
                        group,
                        signature: None,
                    },
                )
            }),
            certificates: Vec::new(),
        });
    }

    let mut certificates = Vec::new();
    let mut server_key_exchange = None;

    loop {
        let message = reader.next_message().await?;
        match message.kind {
            HANDSHAKE_CERTIFICATE => certificates = parse_certificates(&message.body)?,
            HANDSHAKE_SERVER_KEY_EXCHANGE => server_key_exchange = Some(message.body),
            HANDSHAKE_SERVER_HELLO_DONE => break,
            // CertificateStatus, CertificateRequest and anything else we
            // have no use for.
            _ => {}
        }
    }

    let key_exchange = match hello.cipher_suite.family() {
        KeyExchangeFamily::Rsa => Some(KeyExchange::Rsa),
        KeyExchangeFamily::Dh => Some(KeyExchange::Dh { group: None }),
        KeyExchangeFamily::Ecdh => Some(KeyExchange::Ecdh { curve: None }),
        KeyExchangeFamily::Dhe | KeyExchangeFamily::Ecdhe => {
            let (Some(body), Some(algorithm)) =
                (server_key_exchange, hello.cipher_suite.key_exchange())
            else {
                return Err(ProbeError::Decode(format!(
                    "no ServerKeyExchange for {}",
                    hello.cipher_suite
                )));
            };
            Some(parse_server_key_exchange(&body, algorithm, version)?)
        }
        KeyExchangeFamily::Tls13 | KeyExchangeFamily::None => None,
    };

    Ok(Negotiated {
        version,
        cipher_suite: hello.cipher_suite,
        key_exchange,
        certificates,
    })
}
