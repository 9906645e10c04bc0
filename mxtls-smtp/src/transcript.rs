use mxtls_common::tracing;

/// Line-by-line record of an SMTP exchange.
///
/// The whole transcript is logged when the value is dropped, whichever way
/// the negotiation ended.
#[derive(Debug)]
pub struct Transcript {
    peer: String,
    lines: Vec<String>,
}

impl Transcript {
    pub fn new(peer: impl Into<String>) -> Self {
        Self {
            peer: peer.into(),
            lines: Vec::new(),
        }
    }

    pub fn sent(&mut self, line: &str) {
        self.lines.push(format!("C: {line}"));
    }

    pub fn received(&mut self, line: &str) {
        self.lines.push(format!("S: {line}"));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// A copy of the recorded lines; the guard still logs on drop.
    pub fn to_lines(&self) -> Vec<String> {
        self.lines.clone()
    }
}

impl Drop for Transcript {
    fn drop(&mut self) {
        tracing::debug!(
            peer = %self.peer,
            transcript = %self.lines.join("\n"),
            "SMTP transcript"
        );
    }
}
