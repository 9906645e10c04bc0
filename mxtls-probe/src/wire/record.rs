use std::{io, time::Duration};

use mxtls_common::{incoming, tls::AlertDescription};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::{
    CONTENT_ALERT, CONTENT_APPLICATION_DATA, CONTENT_CHANGE_CIPHER_SPEC, CONTENT_HANDSHAKE,
};
use crate::error::{ProbeError, Result};

/// Plaintext limit plus the expansion allowance for protected records.
const MAX_RECORD_LENGTH: usize = 16384 + 2048;
/// Upper bound on everything we are willing to read before ServerHelloDone.
const MAX_FLIGHT_LENGTH: usize = 256 * 1024;

const ALERT_LEVEL_WARNING: u8 = 1;

/// One handshake message with its header stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeMessage {
    pub kind: u8,
    pub body: Vec<u8>,
}

/// Reads plaintext records and reassembles the handshake messages they carry.
pub struct RecordReader<'s, S> {
    stream: &'s mut S,
    timeout: Duration,
    pending: Vec<u8>,
    received: usize,
}

impl<'s, S: AsyncRead + Unpin> RecordReader<'s, S> {
    pub const fn new(stream: &'s mut S, timeout: Duration) -> Self {
        Self {
            stream,
            timeout,
            pending: Vec::new(),
            received: 0,
        }
    }

    /// The next complete handshake message, reading as many records as it
    /// takes. Alerts end the flight.
    pub async fn next_message(&mut self) -> Result<HandshakeMessage> {
        loop {
            if let Some(message) = self.take_pending()? {
                return Ok(message);
            }

            let (content_type, fragment) = self.read_record().await?;

            match content_type {
                CONTENT_HANDSHAKE => self.pending.extend_from_slice(&fragment),
                CONTENT_ALERT => {
                    let [level, description, ..] = fragment[..] else {
                        return Err(ProbeError::Decode("alert record too short".into()));
                    };
                    let alert = AlertDescription::from_wire(description).ok_or_else(|| {
                        ProbeError::Decode(format!("unknown alert description {description}"))
                    })?;

                    incoming!(level = DEBUG, "Alert: {alert} (level {level})");
                    if level == ALERT_LEVEL_WARNING && alert != AlertDescription::CloseNotify {
                        continue;
                    }
                    return Err(ProbeError::AlertReceived(alert));
                }
                CONTENT_CHANGE_CIPHER_SPEC => {}
                CONTENT_APPLICATION_DATA => {
                    return Err(ProbeError::Decode(
                        "encrypted record before the end of the server flight".into(),
                    ));
                }
                other => {
                    return Err(ProbeError::Decode(format!("unexpected record type {other}")));
                }
            }
        }
    }

    fn take_pending(&mut self) -> Result<Option<HandshakeMessage>> {
        let Some(header) = self.pending.get(..4) else {
            return Ok(None);
        };

        let kind = header[0];
        let len = usize::from(header[1]) << 16 | usize::from(header[2]) << 8 | usize::from(header[3]);
        if len > MAX_FLIGHT_LENGTH {
            return Err(ProbeError::Decode(format!(
                "handshake message of {len} bytes"
            )));
        }
        if self.pending.len() < 4 + len {
            return Ok(None);
        }

        let body = self.pending[4..4 + len].to_vec();
        self.pending.drain(..4 + len);
        Ok(Some(HandshakeMessage { kind, body }))
    }

    async fn read_record(&mut self) -> Result<(u8, Vec<u8>)> {
        let mut header = [0u8; 5];
        self.read_exact(&mut header).await?;

        let content_type = header[0];
        let len = usize::from(u16::from_be_bytes([header[3], header[4]]));
        if len > MAX_RECORD_LENGTH {
            return Err(ProbeError::Decode(format!("record of {len} bytes")));
        }

        self.received += header.len() + len;
        if self.received > MAX_FLIGHT_LENGTH {
            return Err(ProbeError::Decode("server flight too large".into()));
        }

        let mut fragment = vec![0u8; len];
        self.read_exact(&mut fragment).await?;
        incoming!("Record type {content_type}, {len} bytes");

        Ok((content_type, fragment))
    }

    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        tokio::time::timeout(self.timeout, self.stream.read_exact(buf))
            .await
            .map_err(|_| ProbeError::Timeout("read a record"))?
            .map_err(|err| match err.kind() {
                io::ErrorKind::UnexpectedEof => ProbeError::ConnectionClosed,
                _ => ProbeError::Io(err),
            })?;

        Ok(())
    }
}
