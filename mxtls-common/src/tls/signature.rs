use std::fmt;

use serde::{Deserialize, Serialize};

/// TLS 1.2 `SignatureAndHashAlgorithm` (`hash << 8 | signature`) and TLS 1.3
/// `SignatureScheme` share one code space.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureScheme(pub u16);

macro_rules! signature_schemes {
    ($( $value:literal => $konst:ident : $name:literal, )+) => {
        impl SignatureScheme {
            $( pub const $konst: Self = Self($value); )+

            #[must_use]
            pub const fn name(self) -> Option<&'static str> {
                match self.0 {
                    $( $value => Some($name), )+
                    _ => None,
                }
            }
        }
    };
}

signature_schemes! {
    0x0101 => RSA_PKCS1_MD5: "rsa_pkcs1_md5",
    0x0201 => RSA_PKCS1_SHA1: "rsa_pkcs1_sha1",
    0x0202 => DSA_SHA1: "dsa_sha1",
    0x0203 => ECDSA_SHA1: "ecdsa_sha1",
    0x0301 => RSA_PKCS1_SHA224: "rsa_pkcs1_sha224",
    0x0302 => DSA_SHA224: "dsa_sha224",
    0x0303 => ECDSA_SHA224: "ecdsa_sha224",
    0x0401 => RSA_PKCS1_SHA256: "rsa_pkcs1_sha256",
    0x0402 => DSA_SHA256: "dsa_sha256",
    0x0403 => ECDSA_SECP256R1_SHA256: "ecdsa_secp256r1_sha256",
    0x0501 => RSA_PKCS1_SHA384: "rsa_pkcs1_sha384",
    0x0503 => ECDSA_SECP384R1_SHA384: "ecdsa_secp384r1_sha384",
    0x0601 => RSA_PKCS1_SHA512: "rsa_pkcs1_sha512",
    0x0603 => ECDSA_SECP521R1_SHA512: "ecdsa_secp521r1_sha512",
    0x0804 => RSA_PSS_RSAE_SHA256: "rsa_pss_rsae_sha256",
    0x0805 => RSA_PSS_RSAE_SHA384: "rsa_pss_rsae_sha384",
    0x0806 => RSA_PSS_RSAE_SHA512: "rsa_pss_rsae_sha512",
    0x0807 => ED25519: "ed25519",
    0x0808 => ED448: "ed448",
    0x0809 => RSA_PSS_PSS_SHA256: "rsa_pss_pss_sha256",
    0x080A => RSA_PSS_PSS_SHA384: "rsa_pss_pss_sha384",
    0x080B => RSA_PSS_PSS_SHA512: "rsa_pss_pss_sha512",
}

impl SignatureScheme {
    /// Offered in the `signature_algorithms` extension, strongest first.
    pub const DEFAULT_OFFER: &'static [Self] = &[
        Self::ECDSA_SECP256R1_SHA256,
        Self::ECDSA_SECP384R1_SHA384,
        Self::ECDSA_SECP521R1_SHA512,
        Self::ED25519,
        Self::ED448,
        Self::RSA_PSS_RSAE_SHA256,
        Self::RSA_PSS_RSAE_SHA384,
        Self::RSA_PSS_RSAE_SHA512,
        Self::RSA_PSS_PSS_SHA256,
        Self::RSA_PSS_PSS_SHA384,
        Self::RSA_PSS_PSS_SHA512,
        Self::RSA_PKCS1_SHA256,
        Self::RSA_PKCS1_SHA384,
        Self::RSA_PKCS1_SHA512,
        Self::DSA_SHA256,
        Self::ECDSA_SHA224,
        Self::RSA_PKCS1_SHA224,
        Self::DSA_SHA224,
        Self::ECDSA_SHA1,
        Self::RSA_PKCS1_SHA1,
        Self::DSA_SHA1,
    ];

    /// The hash half of a TLS 1.2 pair, or the scheme's intrinsic hash.
    #[must_use]
    pub const fn uses_sha1_or_weaker(self) -> bool {
        matches!(self.0 >> 8, 0x01 | 0x02)
    }
}

impl fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:04X}", self.0),
        }
    }
}

impl fmt::Debug for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}(0x{:04X})", self.0)
    }
}

/// The algorithm a server used to sign its ephemeral key exchange parameters.
///
/// Before TLS 1.2 the algorithm is not negotiated and follows from the
/// certificate type, so those handshakes report one of the legacy values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureAlgorithm {
    Scheme(SignatureScheme),
    RsaMd5Sha1,
    EcdsaSha1,
    DsaSha1,
}

impl SignatureAlgorithm {
    #[must_use]
    pub const fn is_weak(self) -> bool {
        match self {
            Self::Scheme(scheme) => scheme.uses_sha1_or_weaker(),
            Self::RsaMd5Sha1 | Self::EcdsaSha1 | Self::DsaSha1 => true,
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheme(scheme) => scheme.fmt(f),
            Self::RsaMd5Sha1 => f.write_str("rsa_md5_sha1"),
            Self::EcdsaSha1 => f.write_str("ecdsa_sha1"),
            Self::DsaSha1 => f.write_str("dsa_sha1"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weakness() {
        assert!(SignatureAlgorithm::Scheme(SignatureScheme::RSA_PKCS1_SHA1).is_weak());
        assert!(SignatureAlgorithm::RsaMd5Sha1.is_weak());
        assert!(!SignatureAlgorithm::Scheme(SignatureScheme::RSA_PSS_RSAE_SHA256).is_weak());
        assert!(!SignatureAlgorithm::Scheme(SignatureScheme::ED25519).is_weak());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            SignatureAlgorithm::Scheme(SignatureScheme::ECDSA_SECP256R1_SHA256).to_string(),
            "ecdsa_secp256r1_sha256"
        );
        assert_eq!(SignatureScheme(0xFFFF).to_string(), "0xFFFF");
    }
}
