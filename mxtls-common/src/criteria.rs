//! The forced handshake configurations a run is made of.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tls::{CipherSuite, NamedGroup, TlsVersion};

macro_rules! test_types {
    ($( $variant:ident, )+) => {
        /// Identifies one probe of the standard matrix, and the judgment
        /// produced from it.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum TlsTestType {
            $( $variant, )+
        }

        impl TlsTestType {
            pub const ALL: &'static [Self] = &[ $( Self::$variant, )+ ];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => stringify!($variant), )+
                }
            }
        }
    };
}

test_types! {
    Tls12AvailableWithBestCipherSuiteSelected,
    Tls12AvailableWithBestCipherSuiteSelectedFromReverseList,
    Tls12AvailableWithSha2HashFunctionSelected,
    Tls12AvailableWithWeakCipherSuiteNotSelected,
    Tls11AvailableWithBestCipherSuiteSelected,
    Tls11AvailableWithWeakCipherSuiteNotSelected,
    Tls10AvailableWithBestCipherSuiteSelected,
    Tls10AvailableWithWeakCipherSuiteNotSelected,
    Ssl3FailsWithBadCipherSuite,
    TlsSecureEllipticCurveSelected,
    TlsSecureDiffieHellmanGroupSelected,
    TlsWeakCipherSuitesRejected,
    Tls13AvailableWithBestCipherSuiteSelected,
}

impl fmt::Display for TlsTestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One forced handshake: the version is pinned, the suites are offered in
/// exactly this order and, when present, `groups` replaces the default
/// `supported_groups` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCriteria {
    pub test_type: TlsTestType,
    pub name: String,
    pub version: TlsVersion,
    pub cipher_suites: Vec<CipherSuite>,
    #[serde(default)]
    pub groups: Option<Vec<NamedGroup>>,
}

impl TestCriteria {
    #[must_use]
    pub fn new(test_type: TlsTestType, version: TlsVersion, cipher_suites: Vec<CipherSuite>) -> Self {
        Self {
            test_type,
            name: test_type.as_str().to_owned(),
            version,
            cipher_suites,
            groups: None,
        }
    }

    #[must_use]
    pub fn with_groups(mut self, groups: Vec<NamedGroup>) -> Self {
        self.groups = Some(groups);
        self
    }

    /// The groups to put in `supported_groups`.
    #[must_use]
    pub fn offered_groups(&self) -> &[NamedGroup] {
        self.groups.as_deref().unwrap_or(NamedGroup::DEFAULT_OFFER)
    }

    /// The thirteen probes every target is tested with, in evaluation order.
    #[must_use]
    pub fn standard_set() -> Vec<Self> {
        let tls12_best = suites::tls12_best();
        let tls12_reverse = tls12_best.iter().rev().copied().collect();

        let mut weak_first_curves: Vec<NamedGroup> = NamedGroup::ALL
            .iter()
            .copied()
            .filter(|group| group.is_elliptic_curve())
            .collect();
        weak_first_curves.sort_by_key(|group| group.bits());

        vec![
            Self::new(
                TlsTestType::Tls12AvailableWithBestCipherSuiteSelected,
                TlsVersion::Tls12,
                tls12_best,
            ),
            Self::new(
                TlsTestType::Tls12AvailableWithBestCipherSuiteSelectedFromReverseList,
                TlsVersion::Tls12,
                tls12_reverse,
            ),
            Self::new(
                TlsTestType::Tls12AvailableWithSha2HashFunctionSelected,
                TlsVersion::Tls12,
                suites::tls12_sha1_then_sha2(),
            ),
            Self::new(
                TlsTestType::Tls12AvailableWithWeakCipherSuiteNotSelected,
                TlsVersion::Tls12,
                [suites::WEAK, suites::tls12_best().as_slice()].concat(),
            ),
            Self::new(
                TlsTestType::Tls11AvailableWithBestCipherSuiteSelected,
                TlsVersion::Tls11,
                suites::LEGACY_CBC.to_vec(),
            ),
            Self::new(
                TlsTestType::Tls11AvailableWithWeakCipherSuiteNotSelected,
                TlsVersion::Tls11,
                [suites::WEAK, suites::LEGACY_CBC].concat(),
            ),
            Self::new(
                TlsTestType::Tls10AvailableWithBestCipherSuiteSelected,
                TlsVersion::Tls10,
                suites::LEGACY_CBC.to_vec(),
            ),
            Self::new(
                TlsTestType::Tls10AvailableWithWeakCipherSuiteNotSelected,
                TlsVersion::Tls10,
                [suites::WEAK, suites::LEGACY_CBC].concat(),
            ),
            Self::new(
                TlsTestType::Ssl3FailsWithBadCipherSuite,
                TlsVersion::Ssl3,
                suites::SSL3.to_vec(),
            ),
            Self::new(
                TlsTestType::TlsSecureEllipticCurveSelected,
                TlsVersion::Tls12,
                suites::ECDHE.to_vec(),
            )
            .with_groups(weak_first_curves),
            Self::new(
                TlsTestType::TlsSecureDiffieHellmanGroupSelected,
                TlsVersion::Tls12,
                suites::DHE.to_vec(),
            ),
            Self::new(
                TlsTestType::TlsWeakCipherSuitesRejected,
                TlsVersion::Tls12,
                suites::WEAK.to_vec(),
            ),
            Self::new(
                TlsTestType::Tls13AvailableWithBestCipherSuiteSelected,
                TlsVersion::Tls13,
                suites::TLS13.to_vec(),
            ),
        ]
    }
}

mod suites {
    use crate::tls::CipherSuite as S;

    pub const AEAD_PFS: &[S] = &[
        S::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
        S::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
        S::TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256,
        S::TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
        S::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
        S::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
        S::TLS_DHE_RSA_WITH_AES_256_GCM_SHA384,
        S::TLS_DHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
        S::TLS_DHE_RSA_WITH_AES_128_GCM_SHA256,
    ];

    pub const CBC_SHA2: &[S] = &[
        S::TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA384,
        S::TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA384,
        S::TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA256,
        S::TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256,
        S::TLS_DHE_RSA_WITH_AES_256_CBC_SHA256,
        S::TLS_DHE_RSA_WITH_AES_128_CBC_SHA256,
    ];

    pub const RSA_SHA2: &[S] = &[
        S::TLS_RSA_WITH_AES_256_GCM_SHA384,
        S::TLS_RSA_WITH_AES_128_GCM_SHA256,
        S::TLS_RSA_WITH_AES_256_CBC_SHA256,
        S::TLS_RSA_WITH_AES_128_CBC_SHA256,
    ];

    /// Strong suites available to TLS 1.0 and 1.1, forward secret first.
    pub const LEGACY_CBC: &[S] = &[
        S::TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA,
        S::TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA,
        S::TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA,
        S::TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA,
        S::TLS_DHE_RSA_WITH_AES_256_CBC_SHA,
        S::TLS_DHE_RSA_WITH_AES_128_CBC_SHA,
        S::TLS_RSA_WITH_AES_256_CBC_SHA,
        S::TLS_RSA_WITH_AES_128_CBC_SHA,
    ];

    pub const WEAK: &[S] = &[
        S::TLS_RSA_WITH_NULL_MD5,
        S::TLS_RSA_WITH_NULL_SHA,
        S::TLS_RSA_EXPORT_WITH_RC4_40_MD5,
        S::TLS_RSA_EXPORT_WITH_RC2_CBC_40_MD5,
        S::TLS_RSA_EXPORT_WITH_DES40_CBC_SHA,
        S::TLS_DHE_RSA_EXPORT_WITH_DES40_CBC_SHA,
        S::TLS_DH_anon_WITH_AES_128_CBC_SHA,
        S::TLS_DH_anon_WITH_3DES_EDE_CBC_SHA,
        S::TLS_ECDH_anon_WITH_AES_128_CBC_SHA,
        S::TLS_RSA_WITH_DES_CBC_SHA,
        S::TLS_DHE_RSA_WITH_DES_CBC_SHA,
        S::TLS_RSA_WITH_IDEA_CBC_SHA,
        S::TLS_RSA_WITH_RC4_128_MD5,
        S::TLS_RSA_WITH_RC4_128_SHA,
        S::TLS_ECDHE_RSA_WITH_RC4_128_SHA,
        S::TLS_ECDHE_ECDSA_WITH_RC4_128_SHA,
        S::TLS_RSA_WITH_3DES_EDE_CBC_SHA,
        S::TLS_DHE_RSA_WITH_3DES_EDE_CBC_SHA,
        S::TLS_ECDHE_RSA_WITH_3DES_EDE_CBC_SHA,
        S::TLS_ECDHE_ECDSA_WITH_3DES_EDE_CBC_SHA,
    ];

    pub const SSL3: &[S] = &[
        S::TLS_RSA_WITH_AES_256_CBC_SHA,
        S::TLS_RSA_WITH_AES_128_CBC_SHA,
        S::TLS_DHE_RSA_WITH_AES_256_CBC_SHA,
        S::TLS_DHE_RSA_WITH_AES_128_CBC_SHA,
        S::TLS_RSA_WITH_3DES_EDE_CBC_SHA,
        S::TLS_DHE_RSA_WITH_3DES_EDE_CBC_SHA,
        S::TLS_RSA_WITH_RC4_128_SHA,
        S::TLS_RSA_WITH_RC4_128_MD5,
        S::TLS_RSA_WITH_DES_CBC_SHA,
        S::TLS_RSA_EXPORT_WITH_DES40_CBC_SHA,
        S::TLS_RSA_EXPORT_WITH_RC4_40_MD5,
    ];

    pub const ECDHE: &[S] = &[
        S::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
        S::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
        S::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
        S::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
        S::TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA384,
        S::TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA384,
        S::TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA,
        S::TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA,
    ];

    pub const DHE: &[S] = &[
        S::TLS_DHE_RSA_WITH_AES_256_GCM_SHA384,
        S::TLS_DHE_RSA_WITH_AES_128_GCM_SHA256,
        S::TLS_DHE_RSA_WITH_AES_256_CBC_SHA256,
        S::TLS_DHE_RSA_WITH_AES_128_CBC_SHA256,
        S::TLS_DHE_RSA_WITH_AES_256_CBC_SHA,
        S::TLS_DHE_RSA_WITH_AES_128_CBC_SHA,
        S::TLS_DHE_DSS_WITH_AES_256_CBC_SHA,
        S::TLS_DHE_DSS_WITH_AES_128_CBC_SHA,
    ];

    pub const TLS13: &[S] = &[
        S::TLS_AES_256_GCM_SHA384,
        S::TLS_CHACHA20_POLY1305_SHA256,
        S::TLS_AES_128_GCM_SHA256,
    ];

    pub fn tls12_best() -> Vec<S> {
        [AEAD_PFS, CBC_SHA2, LEGACY_CBC, RSA_SHA2].concat()
    }

    pub fn tls12_sha1_then_sha2() -> Vec<S> {
        [LEGACY_CBC, CBC_SHA2, RSA_SHA2].concat()
    }
}
