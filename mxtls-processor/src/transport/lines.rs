use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use mxtls_common::internal;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};

use super::{PendingTestSource, ResultPublisher};
use crate::{PendingTest, ProcessorError, Result, TestRunMessage};

struct Lines<R> {
    reader: R,
    /// Owned here rather than by the read future, so bytes of a line that
    /// is still arriving when `linger` runs out are kept for the next read.
    partial: Vec<u8>,
}

impl<R> Lines<R> {
    /// Takes the buffered line and parses it. Blank and malformed lines
    /// yield nothing.
    fn take(&mut self) -> Option<PendingTest> {
        let line = std::mem::take(&mut self.partial);
        let line = line.trim_ascii();
        if line.is_empty() {
            return None;
        }

        match serde_json::from_slice(line) {
            Ok(pending) => Some(pending),
            Err(err) => {
                let line = String::from_utf8_lossy(line);
                internal!(level = WARN, "Skipping malformed pending test {line:?}: {err}");
                None
            }
        }
    }
}

/// Reads one JSON encoded [`PendingTest`] per line.
///
/// A batch ends once `max` tests were read, the input ends, or no complete
/// line arrives within `linger`. A line cut off by `linger` is completed by
/// the next receive. Lines are consumed as they are read, so deleting a
/// batch is a no-op.
pub struct JsonLinesSource<R> {
    lines: Mutex<Lines<R>>,
    linger: Duration,
    exhausted: AtomicBool,
}

impl<R> JsonLinesSource<R> {
    pub fn new(reader: R, linger: Duration) -> Self {
        Self {
            lines: Mutex::new(Lines {
                reader,
                partial: Vec::new(),
            }),
            linger,
            exhausted: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl<R> PendingTestSource for JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn receive(&self, max: usize) -> Result<Vec<PendingTest>> {
        let mut lines = self.lines.lock().await;
        let mut batch = Vec::new();

        while batch.len() < max {
            let Lines { reader, partial } = &mut *lines;
            let read = tokio::time::timeout(self.linger, reader.read_until(b'\n', partial)).await;

            match read {
                Err(_) => break,
                Ok(Ok(0)) => {
                    // End of input right after bytes left by a timed out read.
                    batch.extend(lines.take());
                    self.exhausted.store(true, Ordering::Release);
                    break;
                }
                Ok(Ok(_)) => batch.extend(lines.take()),
                Ok(Err(err)) => return Err(ProcessorError::Source(err.to_string())),
            }
        }

        Ok(batch)
    }

    async fn delete(&self, _batch: &[PendingTest]) -> Result<()> {
        Ok(())
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Acquire)
    }
}

/// Writes each message as one line of JSON.
pub struct JsonLinesPublisher<W> {
    writer: Mutex<W>,
}

impl<W> JsonLinesPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> ResultPublisher for JsonLinesPublisher<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn publish(&self, message: &TestRunMessage) -> Result<()> {
        let mut line = serde_json::to_vec(message)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&line)
            .await
            .map_err(|err| ProcessorError::Publish(err.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|err| ProcessorError::Publish(err.to_string()))
    }
}
