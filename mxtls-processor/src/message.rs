//! Messages exchanged with the queue and pub/sub collaborators.

use std::collections::BTreeMap;

use mxtls_evaluator::Advisory;
use serde::{Deserialize, Serialize};

/// A target waiting to be tested.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTest {
    /// IP address of the mail server.
    pub id: String,
    pub correlation_id: String,
    pub message_id: String,
}

impl PendingTest {
    pub fn new(id: impl Into<String>, correlation_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            correlation_id: correlation_id.into(),
            message_id: message_id.into(),
        }
    }
}

/// One probe's outcome, without the parameters only grading needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifiedTlsConnectionResult {
    pub test_name: String,
    pub cipher_suite: Option<String>,
    /// Leaf first, as the server presented them.
    pub certificate_thumbprints: Vec<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub smtp_handshake: Vec<String>,
}

/// Published once per target whose run completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunMessage {
    pub id: String,
    /// `None` exactly when `inconclusive` is set.
    pub advisory_messages: Option<Vec<Advisory>>,
    pub simplified_tls_connection_results: Vec<SimplifiedTlsConnectionResult>,
    /// Base64 DER keyed by thumbprint.
    pub certificates: BTreeMap<String, String>,
    pub inconclusive: bool,
}

impl TestRunMessage {
    pub fn new(
        id: String,
        advisories: Option<Vec<Advisory>>,
        results: Vec<SimplifiedTlsConnectionResult>,
        certificates: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id,
            inconclusive: advisories.is_none(),
            advisory_messages: advisories,
            simplified_tls_connection_results: results,
            certificates,
        }
    }
}
