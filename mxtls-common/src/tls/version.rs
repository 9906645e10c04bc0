use std::fmt;

use serde::{Deserialize, Serialize};

/// Protocol versions a probe can force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TlsVersion {
    Ssl3,
    Tls10,
    Tls11,
    Tls12,
    Tls13,
}

impl TlsVersion {
    pub const ALL: [Self; 5] = [Self::Ssl3, Self::Tls10, Self::Tls11, Self::Tls12, Self::Tls13];

    /// The two-byte `ProtocolVersion` value.
    #[must_use]
    pub const fn wire(self) -> u16 {
        match self {
            Self::Ssl3 => 0x0300,
            Self::Tls10 => 0x0301,
            Self::Tls11 => 0x0302,
            Self::Tls12 => 0x0303,
            Self::Tls13 => 0x0304,
        }
    }

    #[must_use]
    pub const fn from_wire(value: u16) -> Option<Self> {
        match value {
            0x0300 => Some(Self::Ssl3),
            0x0301 => Some(Self::Tls10),
            0x0302 => Some(Self::Tls11),
            0x0303 => Some(Self::Tls12),
            0x0304 => Some(Self::Tls13),
            _ => None,
        }
    }

    /// Whether `signature_algorithms` exists and ServerKeyExchange signatures
    /// carry an explicit algorithm.
    #[must_use]
    pub const fn has_signature_algorithms(self) -> bool {
        matches!(self, Self::Tls12 | Self::Tls13)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ssl3 => "SSL 3.0",
            Self::Tls10 => "TLS 1.0",
            Self::Tls11 => "TLS 1.1",
            Self::Tls12 => "TLS 1.2",
            Self::Tls13 => "TLS 1.3",
        }
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values() {
        for version in TlsVersion::ALL {
            assert_eq!(TlsVersion::from_wire(version.wire()), Some(version));
        }
        assert_eq!(TlsVersion::from_wire(0x0200), None);
        assert_eq!(TlsVersion::Tls12.wire(), 0x0303);
    }

    #[test]
    fn test_ordering_follows_release_order() {
        assert!(TlsVersion::Ssl3 < TlsVersion::Tls10);
        assert!(TlsVersion::Tls12 < TlsVersion::Tls13);
    }
}
