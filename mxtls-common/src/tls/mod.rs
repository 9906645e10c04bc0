//! Registries of the TLS identifiers a probe offers or observes.
//!
//! Identifiers are kept as thin newtypes over their wire values so that a
//! server choosing something we have never heard of still round-trips through
//! the model; the registries only add names and classification on top.

mod alert;
mod cipher_suite;
mod group;
mod key_exchange;
mod signature;
mod version;

pub use alert::AlertDescription;
pub use cipher_suite::{BulkCipher, CipherSuite, HashAlgorithm, KeyExchangeAlgorithm};
pub use group::NamedGroup;
pub use key_exchange::{DhFamily, DhGroup, KeyExchange, KeyExchangeFamily};
pub use signature::{SignatureAlgorithm, SignatureScheme};
pub use version::TlsVersion;
