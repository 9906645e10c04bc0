//! End-to-end negotiation against a scripted server.

mod support;

use mxtls_common::config::ProbeTimeouts;
use mxtls_smtp::{Negotiation, NegotiationOutcome, SmtpConfig, SmtpNegotiator};
use pretty_assertions::assert_eq;
use support::{MockSmtpServer, Reply};
use tokio::net::TcpStream;

async fn negotiate(server: &MockSmtpServer) -> Negotiation<TcpStream> {
    let stream = TcpStream::connect(server.addr()).await.unwrap();
    SmtpNegotiator::new(SmtpConfig::default(), ProbeTimeouts::uniform(5))
        .negotiate(&server.addr().to_string(), stream)
        .await
}

#[tokio::test]
async fn test_busy_greeting_is_transient() {
    let server = MockSmtpServer::builder()
        .with_greeting(Reply::new(421, "too busy"))
        .build()
        .await
        .unwrap();

    let negotiation = negotiate(&server).await;

    assert_eq!(negotiation.outcome, NegotiationOutcome::TransientError);
    assert!(!negotiation.is_success());
    assert_eq!(negotiation.transcript, vec!["S: 421 too busy".to_owned()]);
    assert!(server.commands().await.is_empty());
}

#[tokio::test]
async fn test_missing_starttls_capability() {
    let server = MockSmtpServer::builder()
        .with_ehlo(Reply::multi(250, &["mock.example.com", "SIZE 10000", "8BITMIME"]))
        .build()
        .await
        .unwrap();

    let negotiation = negotiate(&server).await;

    assert_eq!(negotiation.outcome, NegotiationOutcome::StartTlsNotSupported);
    assert!(!negotiation.is_success());
    assert_eq!(negotiation.transcript.len(), 5);
    let commands = server.commands().await;
    assert_eq!(commands.len(), 1);
    assert!(commands[0].starts_with("EHLO gateway"));
}

#[tokio::test]
async fn test_full_negotiation_is_ready() {
    let server = MockSmtpServer::builder().build().await.unwrap();

    let negotiation = negotiate(&server).await;

    assert_eq!(negotiation.outcome, NegotiationOutcome::Ready);
    assert!(negotiation.is_success());
    assert_eq!(negotiation.description, None);
    assert_eq!(negotiation.transcript.first().unwrap(), "S: 220 mock.example.com ESMTP");
    assert_eq!(negotiation.transcript.last().unwrap(), "S: 220 Ready to start TLS");
    assert_eq!(server.commands().await.last().unwrap(), "STARTTLS");
}

#[tokio::test]
async fn test_starttls_refused() {
    let server = MockSmtpServer::builder()
        .with_starttls(Reply::new(454, "TLS not available due to temporary reason"))
        .build()
        .await
        .unwrap();

    let negotiation = negotiate(&server).await;

    assert_eq!(negotiation.outcome, NegotiationOutcome::StartTlsRequestFailed);
    assert!(negotiation.description.unwrap().contains("454"));
}

#[tokio::test]
async fn test_other_greeting_is_not_ready() {
    let server = MockSmtpServer::builder()
        .with_greeting(Reply::new(554, "no service"))
        .build()
        .await
        .unwrap();

    assert_eq!(negotiate(&server).await.outcome, NegotiationOutcome::NotReady);
}

#[tokio::test]
async fn test_silent_server_is_no_response() {
    let server = MockSmtpServer::builder().silent().build().await.unwrap();

    let negotiation = negotiate(&server).await;

    assert_eq!(negotiation.outcome, NegotiationOutcome::NoResponse);
    assert!(negotiation.transcript.is_empty());
}

#[tokio::test]
async fn test_malformed_greeting_fails_with_transcript() {
    let server = MockSmtpServer::builder()
        .with_raw_greeting(b"22O ready\r\n")
        .build()
        .await
        .unwrap();

    let negotiation = negotiate(&server).await;

    assert_eq!(negotiation.outcome, NegotiationOutcome::Failed);
    assert_eq!(negotiation.transcript, vec!["S: 22O ready".to_owned()]);
    assert!(negotiation.description.unwrap().contains("Malformed"));
}
