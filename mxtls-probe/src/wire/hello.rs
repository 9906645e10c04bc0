use std::net::IpAddr;

use mxtls_common::{
    TestCriteria,
    tls::{CipherSuite, NamedGroup, SignatureScheme, TlsVersion},
};

use super::{
    CONTENT_HANDSHAKE, EXT_EC_POINT_FORMATS, EXT_KEY_SHARE, EXT_SERVER_NAME,
    EXT_SIGNATURE_ALGORITHMS, EXT_SUPPORTED_GROUPS, EXT_SUPPORTED_VERSIONS,
    HANDSHAKE_CLIENT_HELLO, put_extension, put_u16, put_vec,
};

/// A ClientHello that offers exactly what it is told to: no GREASE, no
/// signalling suites we were not asked for, no reordering.
#[derive(Debug, Clone)]
pub struct ClientHello<'a> {
    pub version: TlsVersion,
    pub cipher_suites: &'a [CipherSuite],
    pub groups: &'a [NamedGroup],
    pub server_name: Option<&'a str>,
    pub random: [u8; 32],
}

impl<'a> ClientHello<'a> {
    pub fn new(criteria: &'a TestCriteria, host: &'a str) -> Self {
        Self {
            version: criteria.version,
            cipher_suites: &criteria.cipher_suites,
            groups: criteria.offered_groups(),
            server_name: server_name(host),
            random: rand::random(),
        }
    }

    /// The version written in the record header and `client_version`.
    /// TLS 1.3 hides behind TLS 1.0 / 1.2 and names itself in
    /// `supported_versions`.
    const fn legacy_versions(&self) -> (u16, u16) {
        match self.version {
            TlsVersion::Tls13 => (TlsVersion::Tls10.wire(), TlsVersion::Tls12.wire()),
            version => (version.wire(), version.wire()),
        }
    }

    /// The complete handshake record, ready to be written to the socket.
    pub fn to_record(&self) -> Vec<u8> {
        let (record_version, client_version) = self.legacy_versions();

        let mut record = vec![CONTENT_HANDSHAKE];
        put_u16(&mut record, record_version);
        put_vec(&mut record, 2, |handshake| {
            handshake.push(HANDSHAKE_CLIENT_HELLO);
            put_vec(handshake, 3, |body| {
                put_u16(body, client_version);
                body.extend_from_slice(&self.random);
                // Empty session id.
                body.push(0);
                put_vec(body, 2, |suites| {
                    for suite in self.cipher_suites {
                        put_u16(suites, suite.0);
                    }
                });
                // Null compression only.
                body.extend_from_slice(&[1, 0]);

                if self.version != TlsVersion::Ssl3 {
                    put_vec(body, 2, |extensions| self.write_extensions(extensions));
                }
            });
        });

        record
    }

    fn write_extensions(&self, out: &mut Vec<u8>) {
        if let Some(name) = self.server_name {
            put_extension(out, EXT_SERVER_NAME, |ext| {
                put_vec(ext, 2, |list| {
                    // host_name
                    list.push(0);
                    put_vec(list, 2, |host| host.extend_from_slice(name.as_bytes()));
                });
            });
        }

        put_extension(out, EXT_SUPPORTED_GROUPS, |ext| {
            put_vec(ext, 2, |list| {
                for group in self.groups {
                    put_u16(list, group.0);
                }
            });
        });

        put_extension(out, EXT_EC_POINT_FORMATS, |ext| {
            // uncompressed
            put_vec(ext, 1, |formats| formats.push(0));
        });

        if self.version.has_signature_algorithms() {
            put_extension(out, EXT_SIGNATURE_ALGORITHMS, |ext| {
                put_vec(ext, 2, |list| {
                    for scheme in SignatureScheme::DEFAULT_OFFER {
                        put_u16(list, scheme.0);
                    }
                });
            });
        }

        if self.version == TlsVersion::Tls13 {
            put_extension(out, EXT_SUPPORTED_VERSIONS, |ext| {
                put_vec(ext, 1, |versions| put_u16(versions, TlsVersion::Tls13.wire()));
            });
            // No shares: the server answers with a HelloRetryRequest naming
            // the group it prefers, which is all we want to know.
            put_extension(out, EXT_KEY_SHARE, |ext| put_vec(ext, 2, |_| {}));
        }
    }
}

/// SNI is only sent for DNS names; IP literals are not allowed in it.
fn server_name(host: &str) -> Option<&str> {
    let host = host.trim_end_matches('.');
    if host.is_empty() || host.parse::<IpAddr>().is_ok() {
        None
    } else {
        Some(host)
    }
}

#[cfg(test)]
mod tests {
    use mxtls_common::TlsTestType;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::wire::Reader;

    struct Parsed {
        record_version: u16,
        client_version: u16,
        suites: Vec<u16>,
        extensions: Vec<(u16, Vec<u8>)>,
    }

    fn parse(record: &[u8]) -> Parsed {
        let mut reader = Reader::new(record, "record");
        assert_eq!(reader.u8().unwrap(), CONTENT_HANDSHAKE);
        let record_version = reader.u16().unwrap();
        let mut handshake = Reader::new(reader.vec16().unwrap(), "handshake");
        assert!(reader.is_empty());

        assert_eq!(handshake.u8().unwrap(), HANDSHAKE_CLIENT_HELLO);
        let mut body = Reader::new(handshake.vec24().unwrap(), "hello");
        let client_version = body.u16().unwrap();
        body.take(32).unwrap();
        assert!(body.vec8().unwrap().is_empty());

        let suites = body
            .vec16()
            .unwrap()
            .chunks(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        assert_eq!(body.vec8().unwrap(), [0]);

        let mut extensions = Vec::new();
        if !body.is_empty() {
            let mut list = Reader::new(body.vec16().unwrap(), "extensions");
            while !list.is_empty() {
                let kind = list.u16().unwrap();
                extensions.push((kind, list.vec16().unwrap().to_vec()));
            }
        }
        assert!(body.is_empty());

        Parsed {
            record_version,
            client_version,
            suites,
            extensions,
        }
    }

    fn extension(parsed: &Parsed, kind: u16) -> Option<&[u8]> {
        parsed
            .extensions
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, data)| data.as_slice())
    }

    #[test]
    fn test_suites_and_groups_are_offered_in_order() {
        let criteria = TestCriteria::new(
            TlsTestType::Tls12AvailableWithWeakCipherSuiteNotSelected,
            TlsVersion::Tls12,
            vec![
                CipherSuite::TLS_RSA_WITH_RC4_128_SHA,
                CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
                CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
            ],
        )
        .with_groups(vec![NamedGroup::SECP192R1, NamedGroup::X25519]);

        let parsed = parse(&ClientHello::new(&criteria, "mx.example.com").to_record());

        assert_eq!(parsed.record_version, 0x0303);
        assert_eq!(parsed.client_version, 0x0303);
        assert_eq!(parsed.suites, vec![0x0005, 0xC02F, 0x002F]);
        assert_eq!(
            extension(&parsed, EXT_SUPPORTED_GROUPS).unwrap(),
            [0x00, 0x04, 0x00, 0x13, 0x00, 0x1D]
        );
        assert_eq!(extension(&parsed, EXT_EC_POINT_FORMATS).unwrap(), [1, 0]);
        assert!(extension(&parsed, EXT_SIGNATURE_ALGORITHMS).is_some());
        assert!(extension(&parsed, EXT_SUPPORTED_VERSIONS).is_none());

        let sni = extension(&parsed, EXT_SERVER_NAME).unwrap();
        assert_eq!(&sni[5..], b"mx.example.com");
    }

    #[test]
    fn test_no_signalling_suite_is_added() {
        let criteria = TestCriteria::new(
            TlsTestType::Tls10AvailableWithBestCipherSuiteSelected,
            TlsVersion::Tls10,
            vec![CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA],
        );

        let parsed = parse(&ClientHello::new(&criteria, "192.0.2.1").to_record());

        assert_eq!(parsed.record_version, 0x0301);
        assert_eq!(parsed.suites, vec![0x002F]);
        assert!(extension(&parsed, EXT_SERVER_NAME).is_none());
        assert!(extension(&parsed, EXT_SIGNATURE_ALGORITHMS).is_none());
    }

    #[test]
    fn test_ssl3_has_no_extensions() {
        let criteria = TestCriteria::new(
            TlsTestType::Ssl3FailsWithBadCipherSuite,
            TlsVersion::Ssl3,
            vec![CipherSuite::TLS_RSA_WITH_3DES_EDE_CBC_SHA],
        );

        let parsed = parse(&ClientHello::new(&criteria, "mx.example.com").to_record());

        assert_eq!(parsed.record_version, 0x0300);
        assert_eq!(parsed.client_version, 0x0300);
        assert!(parsed.extensions.is_empty());
    }

    #[test]
    fn test_tls13_hello() {
        let criteria = TestCriteria::new(
            TlsTestType::Tls13AvailableWithBestCipherSuiteSelected,
            TlsVersion::Tls13,
            vec![CipherSuite::TLS_AES_256_GCM_SHA384],
        );

        let parsed = parse(&ClientHello::new(&criteria, "mx.example.com.").to_record());

        assert_eq!(parsed.record_version, 0x0301);
        assert_eq!(parsed.client_version, 0x0303);
        assert_eq!(extension(&parsed, EXT_SUPPORTED_VERSIONS).unwrap(), [2, 0x03, 0x04]);
        assert_eq!(extension(&parsed, EXT_KEY_SHARE).unwrap(), [0, 0]);
        let sni = extension(&parsed, EXT_SERVER_NAME).unwrap();
        assert_eq!(&sni[5..], b"mx.example.com");
    }
}
