//! Mail servers that speak SMTP up to STARTTLS, then either answer the
//! ClientHello with a scripted flight or complete the handshake with rustls.
#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc};

use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::mpsc,
};
use tokio_rustls::{
    TlsAcceptor,
    rustls::{
        self, ServerConfig,
        crypto::{CryptoProvider, SupportedKxGroup, aws_lc_rs},
        pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer},
    },
};

pub struct MockMailServer {
    addr: SocketAddr,
    hellos: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl MockMailServer {
    /// Answers every ClientHello with `flight` and hangs up.
    pub async fn start(flight: Vec<u8>) -> std::io::Result<Self> {
        Self::spawn(flight, true).await
    }

    /// Never advertises STARTTLS.
    pub async fn without_starttls() -> std::io::Result<Self> {
        Self::spawn(Vec::new(), false).await
    }

    async fn spawn(flight: Vec<u8>, starttls: bool) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (tx, hellos) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let flight = flight.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let _ = handle_client(stream, &flight, starttls, tx).await;
                });
            }
        });

        Ok(Self { addr, hellos })
    }

    pub const fn port(&self) -> u16 {
        self.addr.port()
    }

    /// The raw ClientHello record of the next connection.
    pub async fn client_hello(&mut self) -> Vec<u8> {
        self.hellos.recv().await.unwrap_or_default()
    }
}

/// Runs the SMTP dialogue. True once the client may start its handshake.
async fn smtp_until_starttls(stream: &mut TcpStream, starttls: bool) -> std::io::Result<bool> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();

    reader.get_mut().write_all(b"220 mock.example.com ESMTP\r\n").await?;
    reader.read_line(&mut line).await?;

    if !starttls {
        reader
            .get_mut()
            .write_all(b"250-mock.example.com\r\n250 SIZE 10000\r\n")
            .await?;
        return Ok(false);
    }

    reader
        .get_mut()
        .write_all(b"250-mock.example.com\r\n250 STARTTLS\r\n")
        .await?;
    line.clear();
    reader.read_line(&mut line).await?;
    reader.get_mut().write_all(b"220 Ready to start TLS\r\n").await?;
    Ok(true)
}

async fn handle_client(
    mut stream: TcpStream,
    flight: &[u8],
    starttls: bool,
    hellos: mpsc::UnboundedSender<Vec<u8>>,
) -> std::io::Result<()> {
    if !smtp_until_starttls(&mut stream, starttls).await? {
        return Ok(());
    }

    let mut header = [0u8; 5];
    stream.read_exact(&mut header).await?;
    let mut record = header.to_vec();
    record.resize(5 + usize::from(u16::from_be_bytes([header[3], header[4]])), 0);
    stream.read_exact(&mut record[5..]).await?;
    let _ = hellos.send(record);

    stream.write_all(flight).await?;
    stream.flush().await?;
    stream.shutdown().await
}

/// A mail server that hands the connection to rustls after STARTTLS.
pub struct RustlsMailServer {
    addr: SocketAddr,
}

impl RustlsMailServer {
    /// Serves a fixed ECDSA P-256 certificate with `versions`, `suites` and
    /// `groups`, the latter two in the server's order of preference.
    pub async fn start(
        versions: &[&'static rustls::SupportedProtocolVersion],
        suites: &[rustls::SupportedCipherSuite],
        groups: &[&'static dyn SupportedKxGroup],
    ) -> std::io::Result<Self> {
        let provider = CryptoProvider {
            cipher_suites: suites.to_vec(),
            kx_groups: groups.to_vec(),
            ..aws_lc_rs::default_provider()
        };
        let cert = CertificateDer::from(include_bytes!("../data/cert.der").to_vec());
        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(
            include_bytes!("../data/key.der").to_vec(),
        ));
        let config = ServerConfig::builder_with_provider(Arc::new(provider))
            .with_protocol_versions(versions)
            .map_err(std::io::Error::other)?
            .with_no_client_auth()
            .with_single_cert(vec![cert], key)
            .map_err(std::io::Error::other)?;
        let acceptor = TlsAcceptor::from(Arc::new(config));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    if smtp_until_starttls(&mut stream, true).await? {
                        let _ = acceptor.accept(stream).await?;
                    }
                    Ok::<_, std::io::Error>(())
                });
            }
        });

        Ok(Self { addr })
    }

    pub const fn port(&self) -> u16 {
        self.addr.port()
    }
}

/// Builders for the server's side of a handshake.
pub mod flight {
    fn u16_bytes(value: usize) -> [u8; 2] {
        u16::try_from(value).unwrap_or(u16::MAX).to_be_bytes()
    }

    fn u24_bytes(value: usize) -> [u8; 3] {
        let bytes = u32::try_from(value).unwrap_or(u32::MAX).to_be_bytes();
        [bytes[1], bytes[2], bytes[3]]
    }

    pub fn record(content_type: u8, fragment: &[u8]) -> Vec<u8> {
        let mut out = vec![content_type, 0x03, 0x03];
        out.extend_from_slice(&u16_bytes(fragment.len()));
        out.extend_from_slice(fragment);
        out
    }

    pub fn handshake(kind: u8, body: &[u8]) -> Vec<u8> {
        let mut message = vec![kind];
        message.extend_from_slice(&u24_bytes(body.len()));
        message.extend_from_slice(body);
        record(22, &message)
    }

    pub fn alert(description: u8) -> Vec<u8> {
        record(21, &[2, description])
    }

    pub fn server_hello(version: u16, random: [u8; 32], suite: u16, extensions: &[u8]) -> Vec<u8> {
        let mut body = version.to_be_bytes().to_vec();
        body.extend_from_slice(&random);
        body.push(0);
        body.extend_from_slice(&suite.to_be_bytes());
        body.push(0);
        body.extend_from_slice(&u16_bytes(extensions.len()));
        body.extend_from_slice(extensions);
        handshake(2, &body)
    }

    pub fn certificate(chain: &[&[u8]]) -> Vec<u8> {
        let mut list = Vec::new();
        for cert in chain {
            list.extend_from_slice(&u24_bytes(cert.len()));
            list.extend_from_slice(cert);
        }

        let mut body = u24_bytes(list.len()).to_vec();
        body.extend_from_slice(&list);
        handshake(11, &body)
    }

    /// Named-curve ECDHE parameters signed with a TLS 1.2 scheme.
    pub fn ecdhe_key_exchange(curve: u16, scheme: u16) -> Vec<u8> {
        let mut body = vec![3];
        body.extend_from_slice(&curve.to_be_bytes());
        body.extend_from_slice(&[4, 0x04, 0xAA, 0xBB, 0xCC]);
        body.extend_from_slice(&scheme.to_be_bytes());
        body.extend_from_slice(&[0, 3, 0x30, 0x01, 0x00]);
        handshake(12, &body)
    }

    /// DHE parameters signed with a TLS 1.2 scheme.
    pub fn dhe_key_exchange(prime: &[u8], scheme: u16) -> Vec<u8> {
        let mut body = u16_bytes(prime.len()).to_vec();
        body.extend_from_slice(prime);
        body.extend_from_slice(&[0, 1, 2, 0, 1, 7]);
        body.extend_from_slice(&scheme.to_be_bytes());
        body.extend_from_slice(&[0, 1, 0x00]);
        handshake(12, &body)
    }

    pub fn server_hello_done() -> Vec<u8> {
        handshake(14, &[])
    }

    /// The first 2048-bit RFC 7919 prime's recognisable head, padded out.
    pub fn ffdhe2048_prime() -> Vec<u8> {
        let mut prime = vec![0xFF; 8];
        prime.extend_from_slice(&[0xAD, 0xF8, 0x54, 0x58, 0xA2, 0xBB, 0x4A, 0x9A]);
        prime.resize(256, 0x5A);
        prime
    }

    pub const HELLO_RETRY_REQUEST_RANDOM: [u8; 32] = [
        0xCF, 0x21, 0xAD, 0x74, 0xE5, 0x9A, 0x61, 0x11, 0xBE, 0x1D, 0x8C, 0x02, 0x1E, 0x65, 0xB8,
        0x91, 0xC2, 0xA2, 0x11, 0x16, 0x7A, 0xBB, 0x8C, 0x5E, 0x07, 0x9E, 0x09, 0xE2, 0xC8, 0xA8,
        0x33, 0x9C,
    ];
}

/// The cipher suites offered in a captured ClientHello, in order.
pub fn offered_suites(record: &[u8]) -> Vec<u16> {
    // record header (5), handshake header (4), version (2), random (32)
    let mut at = 5 + 4 + 2 + 32;
    let session_id = usize::from(record[at]);
    at += 1 + session_id;

    let len = usize::from(u16::from_be_bytes([record[at], record[at + 1]]));
    at += 2;
    record[at..at + len]
        .chunks(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect()
}

/// The groups in `supported_groups` of a captured ClientHello, in order.
pub fn offered_groups(record: &[u8]) -> Vec<u16> {
    let u16_at = |at: usize| usize::from(u16::from_be_bytes([record[at], record[at + 1]]));

    let mut at = 5 + 4 + 2 + 32;
    at += 1 + usize::from(record[at]);
    at += 2 + u16_at(at);
    at += 1 + usize::from(record[at]);

    let end = at + 2 + u16_at(at);
    at += 2;
    while at + 4 <= end {
        let (kind, len) = (u16_at(at), u16_at(at + 2));
        at += 4;
        if kind == 0x000A {
            return record[at + 2..at + 2 + u16_at(at)]
                .chunks(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
        }
        at += len;
    }

    Vec::new()
}
