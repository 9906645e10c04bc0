use mxtls_common::tls::{
    CipherSuite, DhGroup, KeyExchange, KeyExchangeAlgorithm, NamedGroup, SignatureAlgorithm,
    SignatureScheme, TlsVersion,
};

use super::{EXT_KEY_SHARE, EXT_SUPPORTED_VERSIONS, Reader};
use crate::error::{ProbeError, Result};

/// `SHA-256("HelloRetryRequest")`, the fixed random of a HelloRetryRequest.
const HELLO_RETRY_REQUEST_RANDOM: [u8; 32] = [
    0xCF, 0x21, 0xAD, 0x74, 0xE5, 0x9A, 0x61, 0x11, 0xBE, 0x1D, 0x8C, 0x02, 0x1E, 0x65, 0xB8, 0x91,
    0xC2, 0xA2, 0x11, 0x16, 0x7A, 0xBB, 0x8C, 0x5E, 0x07, 0x9E, 0x09, 0xE2, 0xC8, 0xA8, 0x33, 0x9C,
];

const CURVE_TYPE_EXPLICIT_PRIME: u8 = 1;
const CURVE_TYPE_EXPLICIT_CHAR2: u8 = 2;
const CURVE_TYPE_NAMED: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    /// The version the server settled on: `supported_versions` when
    /// present, the legacy field otherwise.
    pub selected_version: u16,
    pub cipher_suite: CipherSuite,
    pub compression: u8,
    /// The group named in `key_share`, TLS 1.3 only.
    pub key_share_group: Option<NamedGroup>,
    pub is_retry_request: bool,
}

impl ServerHello {
    pub fn parse(body: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(body, "ServerHello");

        let legacy_version = reader.u16()?;
        let is_retry_request = reader.take(32)? == HELLO_RETRY_REQUEST_RANDOM;
        reader.vec8()?;
        let cipher_suite = CipherSuite(reader.u16()?);
        let compression = reader.u8()?;

        let mut hello = Self {
            selected_version: legacy_version,
            cipher_suite,
            compression,
            key_share_group: None,
            is_retry_request,
        };

        // SSL 3.0 servers may stop right after the compression method.
        if reader.is_empty() {
            return Ok(hello);
        }

        let mut extensions = Reader::new(reader.vec16()?, "ServerHello extensions");
        while !extensions.is_empty() {
            let kind = extensions.u16()?;
            let mut data = Reader::new(extensions.vec16()?, "ServerHello extension");

            match kind {
                EXT_SUPPORTED_VERSIONS => hello.selected_version = data.u16()?,
                // A retry names the group alone; a full hello adds the share.
                EXT_KEY_SHARE => hello.key_share_group = Some(NamedGroup(data.u16()?)),
                _ => {}
            }
        }

        Ok(hello)
    }

    pub const fn version(&self) -> Option<TlsVersion> {
        TlsVersion::from_wire(self.selected_version)
    }
}

/// The DER certificates of a TLS 1.2 (or earlier) Certificate message,
/// leaf first.
pub fn parse_certificates(body: &[u8]) -> Result<Vec<Vec<u8>>> {
    let mut reader = Reader::new(body, "Certificate");
    let mut list = Reader::new(reader.vec24()?, "certificate list");

    let mut certificates = Vec::new();
    while !list.is_empty() {
        certificates.push(list.vec24()?.to_vec());
    }

    Ok(certificates)
}

/// Curve or group and signature algorithm from a ServerKeyExchange.
pub fn parse_server_key_exchange(
    body: &[u8],
    key_exchange: KeyExchangeAlgorithm,
    version: TlsVersion,
) -> Result<KeyExchange> {
    let mut reader = Reader::new(body, "ServerKeyExchange");

    match key_exchange {
        KeyExchangeAlgorithm::EcdheEcdsa
        | KeyExchangeAlgorithm::EcdheRsa
        | KeyExchangeAlgorithm::EcdhAnon => {
            let curve = match reader.u8()? {
                CURVE_TYPE_NAMED => NamedGroup(reader.u16()?),
                CURVE_TYPE_EXPLICIT_PRIME | CURVE_TYPE_EXPLICIT_CHAR2 => {
                    return Err(ProbeError::Decode(
                        "explicit curve parameters are not supported".into(),
                    ));
                }
                other => return Err(ProbeError::Decode(format!("unknown curve type {other}"))),
            };
            reader.vec8()?;

            Ok(KeyExchange::Ecdhe {
                curve,
                signature: read_signature(&mut reader, key_exchange, version)?,
            })
        }
        KeyExchangeAlgorithm::DheDss | KeyExchangeAlgorithm::DheRsa | KeyExchangeAlgorithm::DhAnon => {
            let prime = reader.vec16()?;
            reader.vec16()?; // generator
            reader.vec16()?; // public value

            Ok(KeyExchange::Dhe {
                group: DhGroup::from_prime(prime),
                signature: read_signature(&mut reader, key_exchange, version)?,
            })
        }
        other => Err(ProbeError::Decode(format!(
            "unexpected ServerKeyExchange for {other:?} key exchange"
        ))),
    }
}

fn read_signature(
    reader: &mut Reader<'_>,
    key_exchange: KeyExchangeAlgorithm,
    version: TlsVersion,
) -> Result<Option<SignatureAlgorithm>> {
    if key_exchange.is_anonymous() {
        return Ok(None);
    }

    if version.has_signature_algorithms() {
        let scheme = SignatureScheme(reader.u16()?);
        reader.vec16()?;
        return Ok(Some(SignatureAlgorithm::Scheme(scheme)));
    }

    reader.vec16()?;
    let implicit = match key_exchange {
        KeyExchangeAlgorithm::EcdheEcdsa => SignatureAlgorithm::EcdsaSha1,
        KeyExchangeAlgorithm::DheDss => SignatureAlgorithm::DsaSha1,
        _ => SignatureAlgorithm::RsaMd5Sha1,
    };
    Ok(Some(implicit))
}
