use std::collections::BTreeMap;

use base64::{Engine, engine::general_purpose::STANDARD};
use dashmap::DashMap;
use sha2::{Digest, Sha256};

/// Uppercase hex SHA-256 of a DER certificate.
pub fn thumbprint(der: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(der))
}

/// Certificates seen during one batch, keyed by thumbprint and stored as
/// base64 DER. Every target's run writes into the same cache, so a chain
/// shared by many servers is only encoded once.
#[derive(Debug, Default)]
pub struct CertificateCache {
    certificates: DashMap<String, String>,
}

impl CertificateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `der` unless it is already known, returning its thumbprint.
    pub fn insert(&self, der: &[u8]) -> String {
        let thumbprint = thumbprint(der);
        self.certificates
            .entry(thumbprint.clone())
            .or_insert_with(|| STANDARD.encode(der));
        thumbprint
    }

    pub fn get(&self, thumbprint: &str) -> Option<String> {
        self.certificates
            .get(thumbprint)
            .map(|encoded| encoded.value().clone())
    }

    /// The encoded certificates for `thumbprints`, skipping unknown ones.
    pub fn select<'t>(&self, thumbprints: impl IntoIterator<Item = &'t String>) -> BTreeMap<String, String> {
        thumbprints
            .into_iter()
            .filter_map(|thumbprint| {
                self.get(thumbprint)
                    .map(|encoded| (thumbprint.clone(), encoded))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }
}
