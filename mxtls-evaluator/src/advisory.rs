use std::{
    fmt,
    hash::{Hash, Hasher},
};

use serde::Serialize;
use uuid::Uuid;

use crate::Grade;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Success,
}

impl From<Severity> for Grade {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => Self::Fail,
            Severity::Warning => Self::Warning,
            Severity::Info => Self::Informational,
            Severity::Success => Self::Pass,
        }
    }
}

/// A user-facing message with a stable id. Two advisories are the same
/// advisory when their ids match.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisory {
    pub id: Uuid,
    pub name: &'static str,
    #[serde(rename = "messageType")]
    pub severity: Severity,
    pub text: &'static str,
    #[serde(rename = "markDown")]
    pub markdown: Option<&'static str>,
}

impl PartialEq for Advisory {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Advisory {}

impl Hash for Advisory {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.name, self.severity)
    }
}

macro_rules! advisories {
    (@markdown) => { None };
    (@markdown $markdown:literal) => { Some($markdown) };

    ($(
        $(#[$meta:meta])*
        $konst:ident = $id:literal, $severity:ident, $name:literal, $text:literal $(, markdown: $markdown:literal)?;
    )+) => {
        $(
            $(#[$meta])*
            pub const $konst: Advisory = Advisory {
                id: Uuid::from_u128($id),
                name: $name,
                severity: Severity::$severity,
                text: $text,
                markdown: advisories!(@markdown $($markdown)?),
            };
        )+

        /// Every advisory, in declaration order.
        pub const ALL: &[Advisory] = &[ $( $konst, )+ ];
    };
}

/// The fixed set of advisories rules can raise. Ids never change once
/// published, downstream storage keys on them.
pub mod catalogue {
    use uuid::Uuid;

    use super::{Advisory, Severity};

    advisories! {
        TLS12_SUPPORTED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_0001, Success,
            "TLS 1.2 supported",
            "The server supports TLS 1.2 with a strong, forward secret cipher suite.";
        TLS12_UNSUPPORTED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_0002, Error,
            "TLS 1.2 not supported",
            "The server could not negotiate TLS 1.2 with any broadly used cipher suite. Most mail servers will fall back to plaintext delivery.",
            markdown: "Enable **TLS 1.2** with ECDHE and AES-GCM cipher suites.";
        TLS12_NO_FORWARD_SECRECY = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_0003, Warning,
            "No Perfect Forward Secrecy",
            "The server selected a cipher suite without Perfect Forward Secrecy (PFS). Prefer ECDHE or DHE key exchange so that recorded traffic cannot be decrypted if the server's private key is later compromised.",
            markdown: "Prefer `ECDHE` or `DHE` suites over static `RSA` key exchange.";
        TLS12_NON_AEAD_PREFERRED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_0004, Info,
            "CBC cipher suite preferred",
            "The server selected a forward secret CBC cipher suite although AEAD suites were offered.";
        TLS12_SERVER_PREFERENCE = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_0005, Success,
            "Server cipher preference",
            "The server chooses a strong cipher suite regardless of the order the client offers them in.";
        TLS12_CLIENT_PREFERENCE = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_0006, Warning,
            "Client cipher preference",
            "The server follows the client's cipher suite order and selected a suite without forward secrecy when it was offered first.",
            markdown: "Configure the server to enforce its own cipher suite order.";
        TLS12_SHA2_SELECTED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_0007, Success,
            "SHA-2 cipher suite selected",
            "The server selected a cipher suite using a SHA-2 hash or an AEAD cipher.";
        TLS12_SHA1_SELECTED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_0008, Warning,
            "SHA-1 cipher suite selected",
            "The server selected a SHA-1 cipher suite although SHA-2 suites were offered.";
        WEAK_SUITE_SELECTED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_0009, Error,
            "Weak cipher suite selected",
            "The server selected a weak cipher suite (RC4, 3DES, NULL, export grade or anonymous) although strong suites were offered.",
            markdown: "Remove `RC4`, `3DES`, `NULL`, `EXPORT` and anonymous suites from the server configuration.";
        WEAK_SUITE_NOT_SELECTED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_000a, Success,
            "Weak cipher suites avoided",
            "The server selected a strong cipher suite when weak suites were offered first.";
        TLS11_ENABLED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_000b, Info,
            "TLS 1.1 enabled",
            "The server still accepts TLS 1.1, which is deprecated by RFC 8996.";
        TLS11_DISABLED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_000c, Success,
            "TLS 1.1 disabled",
            "The server does not accept TLS 1.1.";
        TLS10_ENABLED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_000d, Info,
            "TLS 1.0 enabled",
            "The server still accepts TLS 1.0, which is deprecated by RFC 8996.";
        TLS10_DISABLED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_000e, Success,
            "TLS 1.0 disabled",
            "The server does not accept TLS 1.0.";
        SSL3_ENABLED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_000f, Error,
            "SSL 3.0 enabled",
            "The server accepts SSL 3.0, which is broken (POODLE) and prohibited by RFC 7568.",
            markdown: "Disable **SSL 3.0** entirely.";
        SSL3_DISABLED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_0010, Success,
            "SSL 3.0 disabled",
            "The server does not accept SSL 3.0.";
        SECURE_CURVE_SELECTED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_0011, Success,
            "Secure elliptic curve",
            "The server selected an elliptic curve of at least 256 bits when weak curves were offered first.";
        WEAK_CURVE_SELECTED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_0012, Warning,
            "Weak elliptic curve",
            "The server selected an elliptic curve of fewer than 256 bits.";
        ECDHE_UNSUPPORTED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_0013, Info,
            "ECDHE not supported",
            "The server refused every ECDHE cipher suite.";
        SECURE_DH_GROUP_SELECTED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_0014, Success,
            "Secure Diffie-Hellman group",
            "The server uses a Diffie-Hellman group of at least 2048 bits.";
        WEAK_DH_GROUP_SELECTED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_0015, Warning,
            "Weak Diffie-Hellman group",
            "The server uses a Diffie-Hellman group of fewer than 2048 bits.";
        INSECURE_DH_GROUP_SELECTED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_0016, Error,
            "Insecure Diffie-Hellman group",
            "The server uses a Diffie-Hellman group of 1024 bits or fewer, which is within reach of precomputation attacks (Logjam).",
            markdown: "Use a 2048-bit or larger group, ideally one of the RFC 7919 `ffdhe` groups.";
        DHE_UNSUPPORTED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_0017, Info,
            "DHE not supported",
            "The server refused every DHE cipher suite.";
        WEAK_SUITES_REFUSED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_0018, Info,
            "Weak cipher suites refused",
            "The server refused to negotiate when only weak cipher suites were offered.";
        WEAK_SUITES_ACCEPTED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_0019, Error,
            "Weak cipher suites accepted",
            "The server negotiated a weak cipher suite when nothing else was offered.";
        TLS13_SUPPORTED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_001a, Success,
            "TLS 1.3 supported",
            "The server supports TLS 1.3.";
        TLS13_UNSUPPORTED = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_001b, Info,
            "TLS 1.3 not supported",
            "The server does not support TLS 1.3.";
        TLS13_UNSUPPORTED_WITH_WEAKNESSES = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_001c, Warning,
            "TLS 1.3 not supported",
            "The server does not support TLS 1.3 and earlier tests found weaknesses in its TLS 1.2 configuration.";
        /// Attached to judgments that could not be graded; never published.
        UNCLASSIFIED_RESULT = 0x6f1c_2a80_0c3e_4c5e_9a41_5b1f_0e2d_00ff, Info,
            "Unclassified result",
            "The server's response could not be classified.";
    }

    #[must_use]
    pub fn by_id(id: Uuid) -> Option<&'static Advisory> {
        ALL.iter().find(|advisory| advisory.id == id)
    }
}

impl Advisory {
    #[must_use]
    pub fn grade(&self) -> Grade {
        self.severity.into()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_catalogue_ids_are_unique() {
        let ids: HashSet<Uuid> = catalogue::ALL.iter().map(|advisory| advisory.id).collect();
        assert_eq!(ids.len(), catalogue::ALL.len());
        assert_eq!(
            catalogue::by_id(catalogue::SSL3_ENABLED.id),
            Some(&catalogue::SSL3_ENABLED)
        );
    }

    #[test]
    fn test_equality_is_by_id() {
        let mut renamed = catalogue::TLS13_SUPPORTED;
        renamed.name = "renamed";
        assert_eq!(renamed, catalogue::TLS13_SUPPORTED);
        assert_ne!(catalogue::TLS13_UNSUPPORTED, catalogue::TLS13_UNSUPPORTED_WITH_WEAKNESSES);
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(catalogue::WEAK_SUITES_REFUSED).unwrap();
        assert_eq!(json["messageType"], "info");
        assert_eq!(json["name"], "Weak cipher suites refused");
        assert!(json["markDown"].is_null());
        assert_eq!(json["id"], "6f1c2a80-0c3e-4c5e-9a41-5b1f0e2d0018");
    }
}
