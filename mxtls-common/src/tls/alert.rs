use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! alerts {
    ($( $value:literal => $variant:ident : $name:literal, )+) => {
        /// TLS alert descriptions (RFC 5246 section 7.2, RFC 8446 section 6).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum AlertDescription {
            $( $variant, )+
        }

        impl AlertDescription {
            pub const ALL: &'static [Self] = &[ $( Self::$variant, )+ ];

            #[must_use]
            pub const fn from_wire(value: u8) -> Option<Self> {
                match value {
                    $( $value => Some(Self::$variant), )+
                    _ => None,
                }
            }

            #[must_use]
            pub const fn wire(self) -> u8 {
                match self {
                    $( Self::$variant => $value, )+
                }
            }

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )+
                }
            }
        }
    };
}

alerts! {
    0 => CloseNotify: "close_notify",
    10 => UnexpectedMessage: "unexpected_message",
    20 => BadRecordMac: "bad_record_mac",
    21 => DecryptionFailed: "decryption_failed",
    22 => RecordOverflow: "record_overflow",
    30 => DecompressionFailure: "decompression_failure",
    40 => HandshakeFailure: "handshake_failure",
    41 => NoCertificate: "no_certificate",
    42 => BadCertificate: "bad_certificate",
    43 => UnsupportedCertificate: "unsupported_certificate",
    44 => CertificateRevoked: "certificate_revoked",
    45 => CertificateExpired: "certificate_expired",
    46 => CertificateUnknown: "certificate_unknown",
    47 => IllegalParameter: "illegal_parameter",
    48 => UnknownCa: "unknown_ca",
    49 => AccessDenied: "access_denied",
    50 => DecodeError: "decode_error",
    51 => DecryptError: "decrypt_error",
    60 => ExportRestriction: "export_restriction",
    70 => ProtocolVersion: "protocol_version",
    71 => InsufficientSecurity: "insufficient_security",
    80 => InternalError: "internal_error",
    86 => InappropriateFallback: "inappropriate_fallback",
    90 => UserCanceled: "user_canceled",
    100 => NoRenegotiation: "no_renegotiation",
    109 => MissingExtension: "missing_extension",
    110 => UnsupportedExtension: "unsupported_extension",
    111 => CertificateUnobtainable: "certificate_unobtainable",
    112 => UnrecognizedName: "unrecognized_name",
    113 => BadCertificateStatusResponse: "bad_certificate_status_response",
    114 => BadCertificateHashValue: "bad_certificate_hash_value",
    115 => UnknownPskIdentity: "unknown_psk_identity",
    116 => CertificateRequired: "certificate_required",
    120 => NoApplicationProtocol: "no_application_protocol",
}

impl fmt::Display for AlertDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
