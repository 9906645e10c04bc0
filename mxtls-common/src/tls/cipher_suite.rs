use std::fmt;

use serde::{Deserialize, Serialize};

use super::KeyExchangeFamily;

/// How the premaster secret is agreed (and whether the server signs it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyExchangeAlgorithm {
    Rsa,
    RsaExport,
    DhDss,
    DhRsa,
    DheDss,
    DheRsa,
    DhAnon,
    EcdhEcdsa,
    EcdhRsa,
    EcdheEcdsa,
    EcdheRsa,
    EcdhAnon,
    /// TLS 1.3 suites do not name a key exchange.
    Tls13,
    /// Signalling values, never negotiated.
    Scsv,
}

impl KeyExchangeAlgorithm {
    #[must_use]
    pub const fn family(self) -> KeyExchangeFamily {
        match self {
            Self::Rsa | Self::RsaExport => KeyExchangeFamily::Rsa,
            Self::DhDss | Self::DhRsa => KeyExchangeFamily::Dh,
            Self::DheDss | Self::DheRsa | Self::DhAnon => KeyExchangeFamily::Dhe,
            Self::EcdhEcdsa | Self::EcdhRsa => KeyExchangeFamily::Ecdh,
            Self::EcdheEcdsa | Self::EcdheRsa | Self::EcdhAnon => KeyExchangeFamily::Ecdhe,
            Self::Tls13 => KeyExchangeFamily::Tls13,
            Self::Scsv => KeyExchangeFamily::None,
        }
    }

    #[must_use]
    pub const fn is_anonymous(self) -> bool {
        matches!(self, Self::DhAnon | Self::EcdhAnon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkCipher {
    Null,
    Rc4_40,
    Rc4_128,
    Rc2Cbc40,
    DesCbc40,
    DesCbc,
    TripleDesEdeCbc,
    IdeaCbc,
    SeedCbc,
    Aes128Cbc,
    Aes256Cbc,
    Camellia128Cbc,
    Camellia256Cbc,
    Aes128Gcm,
    Aes256Gcm,
    Aes128Ccm,
    Aes128Ccm8,
    Chacha20Poly1305,
}

impl BulkCipher {
    #[must_use]
    pub const fn is_aead(self) -> bool {
        matches!(
            self,
            Self::Aes128Gcm
                | Self::Aes256Gcm
                | Self::Aes128Ccm
                | Self::Aes128Ccm8
                | Self::Chacha20Poly1305
        )
    }

    /// Broken, export-grade, 64-bit block (SWEET32) or no encryption at all.
    #[must_use]
    pub const fn is_weak(self) -> bool {
        matches!(
            self,
            Self::Null
                | Self::Rc4_40
                | Self::Rc4_128
                | Self::Rc2Cbc40
                | Self::DesCbc40
                | Self::DesCbc
                | Self::TripleDesEdeCbc
                | Self::IdeaCbc
        )
    }

    #[must_use]
    pub const fn is_export(self) -> bool {
        matches!(self, Self::Rc4_40 | Self::Rc2Cbc40 | Self::DesCbc40)
    }
}

/// The record MAC for CBC/stream suites, or the PRF hash for AEAD suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashAlgorithm {
    Null,
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    #[must_use]
    pub const fn is_sha2(self) -> bool {
        matches!(self, Self::Sha224 | Self::Sha256 | Self::Sha384 | Self::Sha512)
    }
}

/// A cipher suite identifier as it appears on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CipherSuite(pub u16);

struct SuiteInfo {
    suite: CipherSuite,
    name: &'static str,
    key_exchange: KeyExchangeAlgorithm,
    cipher: BulkCipher,
    hash: HashAlgorithm,
}

macro_rules! cipher_suites {
    ($( $value:literal => $name:ident ($kx:ident, $cipher:ident, $hash:ident), )+) => {
        #[allow(non_upper_case_globals)]
        impl CipherSuite {
            $( pub const $name: Self = Self($value); )+
        }

        static REGISTRY: &[SuiteInfo] = &[
            $( SuiteInfo {
                suite: CipherSuite($value),
                name: stringify!($name),
                key_exchange: KeyExchangeAlgorithm::$kx,
                cipher: BulkCipher::$cipher,
                hash: HashAlgorithm::$hash,
            }, )+
        ];
    };
}

cipher_suites! {
    0x0001 => TLS_RSA_WITH_NULL_MD5 (Rsa, Null, Md5),
    0x0002 => TLS_RSA_WITH_NULL_SHA (Rsa, Null, Sha1),
    0x0003 => TLS_RSA_EXPORT_WITH_RC4_40_MD5 (RsaExport, Rc4_40, Md5),
    0x0004 => TLS_RSA_WITH_RC4_128_MD5 (Rsa, Rc4_128, Md5),
    0x0005 => TLS_RSA_WITH_RC4_128_SHA (Rsa, Rc4_128, Sha1),
    0x0006 => TLS_RSA_EXPORT_WITH_RC2_CBC_40_MD5 (RsaExport, Rc2Cbc40, Md5),
    0x0007 => TLS_RSA_WITH_IDEA_CBC_SHA (Rsa, IdeaCbc, Sha1),
    0x0008 => TLS_RSA_EXPORT_WITH_DES40_CBC_SHA (RsaExport, DesCbc40, Sha1),
    0x0009 => TLS_RSA_WITH_DES_CBC_SHA (Rsa, DesCbc, Sha1),
    0x000A => TLS_RSA_WITH_3DES_EDE_CBC_SHA (Rsa, TripleDesEdeCbc, Sha1),
    0x000D => TLS_DH_DSS_WITH_3DES_EDE_CBC_SHA (DhDss, TripleDesEdeCbc, Sha1),
    0x0010 => TLS_DH_RSA_WITH_3DES_EDE_CBC_SHA (DhRsa, TripleDesEdeCbc, Sha1),
    0x0011 => TLS_DHE_DSS_EXPORT_WITH_DES40_CBC_SHA (DheDss, DesCbc40, Sha1),
    0x0012 => TLS_DHE_DSS_WITH_DES_CBC_SHA (DheDss, DesCbc, Sha1),
    0x0013 => TLS_DHE_DSS_WITH_3DES_EDE_CBC_SHA (DheDss, TripleDesEdeCbc, Sha1),
    0x0014 => TLS_DHE_RSA_EXPORT_WITH_DES40_CBC_SHA (DheRsa, DesCbc40, Sha1),
    0x0015 => TLS_DHE_RSA_WITH_DES_CBC_SHA (DheRsa, DesCbc, Sha1),
    0x0016 => TLS_DHE_RSA_WITH_3DES_EDE_CBC_SHA (DheRsa, TripleDesEdeCbc, Sha1),
    0x0017 => TLS_DH_anon_EXPORT_WITH_RC4_40_MD5 (DhAnon, Rc4_40, Md5),
    0x0018 => TLS_DH_anon_WITH_RC4_128_MD5 (DhAnon, Rc4_128, Md5),
    0x001B => TLS_DH_anon_WITH_3DES_EDE_CBC_SHA (DhAnon, TripleDesEdeCbc, Sha1),
    0x002F => TLS_RSA_WITH_AES_128_CBC_SHA (Rsa, Aes128Cbc, Sha1),
    0x0030 => TLS_DH_DSS_WITH_AES_128_CBC_SHA (DhDss, Aes128Cbc, Sha1),
    0x0031 => TLS_DH_RSA_WITH_AES_128_CBC_SHA (DhRsa, Aes128Cbc, Sha1),
    0x0032 => TLS_DHE_DSS_WITH_AES_128_CBC_SHA (DheDss, Aes128Cbc, Sha1),
    0x0033 => TLS_DHE_RSA_WITH_AES_128_CBC_SHA (DheRsa, Aes128Cbc, Sha1),
    0x0034 => TLS_DH_anon_WITH_AES_128_CBC_SHA (DhAnon, Aes128Cbc, Sha1),
    0x0035 => TLS_RSA_WITH_AES_256_CBC_SHA (Rsa, Aes256Cbc, Sha1),
    0x0036 => TLS_DH_DSS_WITH_AES_256_CBC_SHA (DhDss, Aes256Cbc, Sha1),
    0x0037 => TLS_DH_RSA_WITH_AES_256_CBC_SHA (DhRsa, Aes256Cbc, Sha1),
    0x0038 => TLS_DHE_DSS_WITH_AES_256_CBC_SHA (DheDss, Aes256Cbc, Sha1),
    0x0039 => TLS_DHE_RSA_WITH_AES_256_CBC_SHA (DheRsa, Aes256Cbc, Sha1),
    0x003A => TLS_DH_anon_WITH_AES_256_CBC_SHA (DhAnon, Aes256Cbc, Sha1),
    0x003B => TLS_RSA_WITH_NULL_SHA256 (Rsa, Null, Sha256),
    0x003C => TLS_RSA_WITH_AES_128_CBC_SHA256 (Rsa, Aes128Cbc, Sha256),
    0x003D => TLS_RSA_WITH_AES_256_CBC_SHA256 (Rsa, Aes256Cbc, Sha256),
    0x0040 => TLS_DHE_DSS_WITH_AES_128_CBC_SHA256 (DheDss, Aes128Cbc, Sha256),
    0x0041 => TLS_RSA_WITH_CAMELLIA_128_CBC_SHA (Rsa, Camellia128Cbc, Sha1),
    0x0045 => TLS_DHE_RSA_WITH_CAMELLIA_128_CBC_SHA (DheRsa, Camellia128Cbc, Sha1),
    0x0067 => TLS_DHE_RSA_WITH_AES_128_CBC_SHA256 (DheRsa, Aes128Cbc, Sha256),
    0x006A => TLS_DHE_DSS_WITH_AES_256_CBC_SHA256 (DheDss, Aes256Cbc, Sha256),
    0x006B => TLS_DHE_RSA_WITH_AES_256_CBC_SHA256 (DheRsa, Aes256Cbc, Sha256),
    0x0084 => TLS_RSA_WITH_CAMELLIA_256_CBC_SHA (Rsa, Camellia256Cbc, Sha1),
    0x0088 => TLS_DHE_RSA_WITH_CAMELLIA_256_CBC_SHA (DheRsa, Camellia256Cbc, Sha1),
    0x0096 => TLS_RSA_WITH_SEED_CBC_SHA (Rsa, SeedCbc, Sha1),
    0x009C => TLS_RSA_WITH_AES_128_GCM_SHA256 (Rsa, Aes128Gcm, Sha256),
    0x009D => TLS_RSA_WITH_AES_256_GCM_SHA384 (Rsa, Aes256Gcm, Sha384),
    0x009E => TLS_DHE_RSA_WITH_AES_128_GCM_SHA256 (DheRsa, Aes128Gcm, Sha256),
    0x009F => TLS_DHE_RSA_WITH_AES_256_GCM_SHA384 (DheRsa, Aes256Gcm, Sha384),
    0x00A2 => TLS_DHE_DSS_WITH_AES_128_GCM_SHA256 (DheDss, Aes128Gcm, Sha256),
    0x00A3 => TLS_DHE_DSS_WITH_AES_256_GCM_SHA384 (DheDss, Aes256Gcm, Sha384),
    0x00FF => TLS_EMPTY_RENEGOTIATION_INFO_SCSV (Scsv, Null, Null),
    0x1301 => TLS_AES_128_GCM_SHA256 (Tls13, Aes128Gcm, Sha256),
    0x1302 => TLS_AES_256_GCM_SHA384 (Tls13, Aes256Gcm, Sha384),
    0x1303 => TLS_CHACHA20_POLY1305_SHA256 (Tls13, Chacha20Poly1305, Sha256),
    0x1304 => TLS_AES_128_CCM_SHA256 (Tls13, Aes128Ccm, Sha256),
    0x1305 => TLS_AES_128_CCM_8_SHA256 (Tls13, Aes128Ccm8, Sha256),
    0x5600 => TLS_FALLBACK_SCSV (Scsv, Null, Null),
    0xC002 => TLS_ECDH_ECDSA_WITH_RC4_128_SHA (EcdhEcdsa, Rc4_128, Sha1),
    0xC003 => TLS_ECDH_ECDSA_WITH_3DES_EDE_CBC_SHA (EcdhEcdsa, TripleDesEdeCbc, Sha1),
    0xC004 => TLS_ECDH_ECDSA_WITH_AES_128_CBC_SHA (EcdhEcdsa, Aes128Cbc, Sha1),
    0xC005 => TLS_ECDH_ECDSA_WITH_AES_256_CBC_SHA (EcdhEcdsa, Aes256Cbc, Sha1),
    0xC007 => TLS_ECDHE_ECDSA_WITH_RC4_128_SHA (EcdheEcdsa, Rc4_128, Sha1),
    0xC008 => TLS_ECDHE_ECDSA_WITH_3DES_EDE_CBC_SHA (EcdheEcdsa, TripleDesEdeCbc, Sha1),
    0xC009 => TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA (EcdheEcdsa, Aes128Cbc, Sha1),
    0xC00A => TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA (EcdheEcdsa, Aes256Cbc, Sha1),
    0xC00C => TLS_ECDH_RSA_WITH_RC4_128_SHA (EcdhRsa, Rc4_128, Sha1),
    0xC00D => TLS_ECDH_RSA_WITH_3DES_EDE_CBC_SHA (EcdhRsa, TripleDesEdeCbc, Sha1),
    0xC00E => TLS_ECDH_RSA_WITH_AES_128_CBC_SHA (EcdhRsa, Aes128Cbc, Sha1),
    0xC00F => TLS_ECDH_RSA_WITH_AES_256_CBC_SHA (EcdhRsa, Aes256Cbc, Sha1),
    0xC010 => TLS_ECDHE_RSA_WITH_NULL_SHA (EcdheRsa, Null, Sha1),
    0xC011 => TLS_ECDHE_RSA_WITH_RC4_128_SHA (EcdheRsa, Rc4_128, Sha1),
    0xC012 => TLS_ECDHE_RSA_WITH_3DES_EDE_CBC_SHA (EcdheRsa, TripleDesEdeCbc, Sha1),
    0xC013 => TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA (EcdheRsa, Aes128Cbc, Sha1),
    0xC014 => TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA (EcdheRsa, Aes256Cbc, Sha1),
    0xC016 => TLS_ECDH_anon_WITH_RC4_128_SHA (EcdhAnon, Rc4_128, Sha1),
    0xC017 => TLS_ECDH_anon_WITH_3DES_EDE_CBC_SHA (EcdhAnon, TripleDesEdeCbc, Sha1),
    0xC018 => TLS_ECDH_anon_WITH_AES_128_CBC_SHA (EcdhAnon, Aes128Cbc, Sha1),
    0xC019 => TLS_ECDH_anon_WITH_AES_256_CBC_SHA (EcdhAnon, Aes256Cbc, Sha1),
    0xC023 => TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA256 (EcdheEcdsa, Aes128Cbc, Sha256),
    0xC024 => TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA384 (EcdheEcdsa, Aes256Cbc, Sha384),
    0xC025 => TLS_ECDH_ECDSA_WITH_AES_128_CBC_SHA256 (EcdhEcdsa, Aes128Cbc, Sha256),
    0xC026 => TLS_ECDH_ECDSA_WITH_AES_256_CBC_SHA384 (EcdhEcdsa, Aes256Cbc, Sha384),
    0xC027 => TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256 (EcdheRsa, Aes128Cbc, Sha256),
    0xC028 => TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA384 (EcdheRsa, Aes256Cbc, Sha384),
    0xC029 => TLS_ECDH_RSA_WITH_AES_128_CBC_SHA256 (EcdhRsa, Aes128Cbc, Sha256),
    0xC02A => TLS_ECDH_RSA_WITH_AES_256_CBC_SHA384 (EcdhRsa, Aes256Cbc, Sha384),
    0xC02B => TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256 (EcdheEcdsa, Aes128Gcm, Sha256),
    0xC02C => TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384 (EcdheEcdsa, Aes256Gcm, Sha384),
    0xC02D => TLS_ECDH_ECDSA_WITH_AES_128_GCM_SHA256 (EcdhEcdsa, Aes128Gcm, Sha256),
    0xC02E => TLS_ECDH_ECDSA_WITH_AES_256_GCM_SHA384 (EcdhEcdsa, Aes256Gcm, Sha384),
    0xC02F => TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256 (EcdheRsa, Aes128Gcm, Sha256),
    0xC030 => TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384 (EcdheRsa, Aes256Gcm, Sha384),
    0xC031 => TLS_ECDH_RSA_WITH_AES_128_GCM_SHA256 (EcdhRsa, Aes128Gcm, Sha256),
    0xC032 => TLS_ECDH_RSA_WITH_AES_256_GCM_SHA384 (EcdhRsa, Aes256Gcm, Sha384),
    0xCCA8 => TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256 (EcdheRsa, Chacha20Poly1305, Sha256),
    0xCCA9 => TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256 (EcdheEcdsa, Chacha20Poly1305, Sha256),
    0xCCAA => TLS_DHE_RSA_WITH_CHACHA20_POLY1305_SHA256 (DheRsa, Chacha20Poly1305, Sha256),
}

impl CipherSuite {
    fn info(self) -> Option<&'static SuiteInfo> {
        REGISTRY.iter().find(|info| info.suite == self)
    }

    /// The IANA name, if the suite is registered here.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        self.info().map(|info| info.name)
    }

    #[must_use]
    pub fn key_exchange(self) -> Option<KeyExchangeAlgorithm> {
        self.info().map(|info| info.key_exchange)
    }

    /// The key-exchange family; unregistered suites report `None`.
    #[must_use]
    pub fn family(self) -> KeyExchangeFamily {
        self.key_exchange()
            .map_or(KeyExchangeFamily::None, KeyExchangeAlgorithm::family)
    }

    #[must_use]
    pub fn cipher(self) -> Option<BulkCipher> {
        self.info().map(|info| info.cipher)
    }

    #[must_use]
    pub fn hash(self) -> Option<HashAlgorithm> {
        self.info().map(|info| info.hash)
    }

    #[must_use]
    pub fn is_scsv(self) -> bool {
        matches!(self.key_exchange(), Some(KeyExchangeAlgorithm::Scsv))
    }

    #[must_use]
    pub fn is_tls13(self) -> bool {
        matches!(self.key_exchange(), Some(KeyExchangeAlgorithm::Tls13))
    }

    #[must_use]
    pub fn is_forward_secret(self) -> bool {
        matches!(
            self.family(),
            KeyExchangeFamily::Dhe | KeyExchangeFamily::Ecdhe | KeyExchangeFamily::Tls13
        )
    }

    /// Weak bulk cipher, export grade, or unauthenticated key exchange.
    #[must_use]
    pub fn is_weak(self) -> bool {
        self.info().is_some_and(|info| {
            info.cipher.is_weak()
                || info.key_exchange.is_anonymous()
                || matches!(info.key_exchange, KeyExchangeAlgorithm::RsaExport)
        })
    }

    /// Uses a SHA-2 family hash for its MAC or PRF.
    #[must_use]
    pub fn uses_sha2(self) -> bool {
        self.hash().is_some_and(HashAlgorithm::is_sha2)
    }

    #[must_use]
    pub fn is_aead(self) -> bool {
        self.cipher().is_some_and(BulkCipher::is_aead)
    }

    /// Every suite in the registry, in wire-value order.
    pub fn registered() -> impl Iterator<Item = Self> {
        REGISTRY.iter().map(|info| info.suite)
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:04X}", self.0),
        }
    }
}

impl fmt::Debug for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}(0x{:04X})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_sorted_and_unique() {
        let values: Vec<u16> = CipherSuite::registered().map(|suite| suite.0).collect();
        let mut sorted = values.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(values, sorted);
    }

    #[test]
    fn test_classification() {
        let rsa = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA;
        assert_eq!(rsa.family(), KeyExchangeFamily::Rsa);
        assert!(!rsa.is_forward_secret());
        assert!(!rsa.is_weak());
        assert!(!rsa.uses_sha2());

        let ecdhe = CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384;
        assert!(ecdhe.is_forward_secret());
        assert!(ecdhe.is_aead());
        assert!(ecdhe.uses_sha2());

        assert!(CipherSuite::TLS_RSA_WITH_RC4_128_SHA.is_weak());
        assert!(CipherSuite::TLS_RSA_WITH_3DES_EDE_CBC_SHA.is_weak());
        assert!(CipherSuite::TLS_DH_anon_WITH_AES_128_CBC_SHA.is_weak());
        assert!(CipherSuite::TLS_FALLBACK_SCSV.is_scsv());
        assert!(CipherSuite::TLS_AES_128_GCM_SHA256.is_tls13());
    }

    #[test]
    fn test_unknown_suite_display() {
        let unknown = CipherSuite(0xFEFE);
        assert_eq!(unknown.to_string(), "0xFEFE");
        assert_eq!(unknown.family(), KeyExchangeFamily::None);
        assert!(!unknown.is_weak());
    }
}
