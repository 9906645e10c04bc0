use std::fmt;

use serde::{Deserialize, Serialize};

use super::{NamedGroup, SignatureAlgorithm};

/// Key-exchange family of a cipher suite, used to decide which parameters a
/// handshake is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyExchangeFamily {
    Rsa,
    Dh,
    Dhe,
    Ecdh,
    Ecdhe,
    /// TLS 1.3: always ephemeral, the group comes from `key_share`.
    Tls13,
    None,
}

/// Where a finite-field group's prime comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DhFamily {
    /// RFC 7919 negotiated groups.
    Ffdhe,
    /// RFC 2409 / RFC 3526 Oakley groups.
    Modp,
    /// A prime we do not recognise, likely generated by the server.
    Custom,
}

/// A finite-field Diffie-Hellman group as observed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DhGroup {
    pub bits: u16,
    pub family: DhFamily,
}

/// The eight bytes following the leading all-ones word of every RFC 7919 prime.
const FFDHE_PREFIX: [u8; 8] = [0xAD, 0xF8, 0x54, 0x58, 0xA2, 0xBB, 0x4A, 0x9A];
/// As above, for the Oakley primes (the binary expansion of pi).
const MODP_PREFIX: [u8; 8] = [0xC9, 0x0F, 0xDA, 0xA2, 0x21, 0x68, 0xC2, 0x34];

impl DhGroup {
    /// Recognise a group from the big-endian prime a server sent in its
    /// ServerKeyExchange.
    #[must_use]
    pub fn from_prime(prime: &[u8]) -> Self {
        let prime = match prime.iter().position(|byte| *byte != 0) {
            Some(start) => &prime[start..],
            None => &[],
        };

        let bits = prime.first().map_or(0, |first| {
            let len = u16::try_from(prime.len()).unwrap_or(u16::MAX / 8);
            len.saturating_mul(8)
                .saturating_sub(u16::try_from(first.leading_zeros()).unwrap_or(0))
        });

        let family = match prime.get(..16) {
            Some(head) if head[..8] == [0xFF; 8] && head[8..] == FFDHE_PREFIX => DhFamily::Ffdhe,
            Some(head) if head[..8] == [0xFF; 8] && head[8..] == MODP_PREFIX => DhFamily::Modp,
            _ => DhFamily::Custom,
        };

        Self { bits, family }
    }

    /// A TLS 1.3 (or RFC 7919 negotiated) FFDHE group.
    #[must_use]
    pub fn from_named(group: NamedGroup) -> Option<Self> {
        if !group.is_ffdhe() {
            return None;
        }

        group.bits().map(|bits| Self {
            bits,
            family: DhFamily::Ffdhe,
        })
    }

    /// The matching named group for well-known primes.
    #[must_use]
    pub fn named(self) -> Option<NamedGroup> {
        if self.family != DhFamily::Ffdhe {
            return None;
        }

        NamedGroup::ALL
            .iter()
            .copied()
            .find(|group| group.is_ffdhe() && group.bits() == Some(self.bits))
    }

    /// 2048 bits or more.
    #[must_use]
    pub const fn is_secure(self) -> bool {
        self.bits >= 2048
    }
}

impl fmt::Display for DhGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.family, self.named()) {
            (_, Some(named)) => named.fmt(f),
            (DhFamily::Modp, None) => write!(f, "modp{}", self.bits),
            (_, None) => write!(f, "custom dh {} bits", self.bits),
        }
    }
}

/// Parameters of the key exchange a handshake actually used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeyExchange {
    Rsa,
    Dh {
        group: Option<DhGroup>,
    },
    Dhe {
        group: DhGroup,
        signature: Option<SignatureAlgorithm>,
    },
    Ecdh {
        curve: Option<NamedGroup>,
    },
    Ecdhe {
        curve: NamedGroup,
        signature: Option<SignatureAlgorithm>,
    },
}

impl KeyExchange {
    #[must_use]
    pub const fn curve(&self) -> Option<NamedGroup> {
        match self {
            Self::Ecdh { curve } => *curve,
            Self::Ecdhe { curve, .. } => Some(*curve),
            Self::Rsa | Self::Dh { .. } | Self::Dhe { .. } => None,
        }
    }

    #[must_use]
    pub const fn dh_group(&self) -> Option<DhGroup> {
        match self {
            Self::Dh { group } => *group,
            Self::Dhe { group, .. } => Some(*group),
            Self::Rsa | Self::Ecdh { .. } | Self::Ecdhe { .. } => None,
        }
    }

    #[must_use]
    pub const fn signature(&self) -> Option<SignatureAlgorithm> {
        match self {
            Self::Dhe { signature, .. } | Self::Ecdhe { signature, .. } => *signature,
            Self::Rsa | Self::Dh { .. } | Self::Ecdh { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_ephemeral(&self) -> bool {
        matches!(self, Self::Dhe { .. } | Self::Ecdhe { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prime(prefix: &[u8], len: usize) -> Vec<u8> {
        let mut prime = vec![0xFF; 8];
        prime.extend_from_slice(prefix);
        prime.resize(len, 0xAB);
        prime
    }

    #[test]
    fn test_recognises_ffdhe() {
        let group = DhGroup::from_prime(&prime(&FFDHE_PREFIX, 256));
        assert_eq!(group, DhGroup {
            bits: 2048,
            family: DhFamily::Ffdhe
        });
        assert_eq!(group.named(), Some(NamedGroup::FFDHE2048));
        assert_eq!(group.to_string(), "ffdhe2048");
    }

    #[test]
    fn test_recognises_modp() {
        let group = DhGroup::from_prime(&prime(&MODP_PREFIX, 128));
        assert_eq!(group.family, DhFamily::Modp);
        assert_eq!(group.bits, 1024);
        assert!(!group.is_secure());
        assert_eq!(group.to_string(), "modp1024");
    }

    #[test]
    fn test_custom_prime_with_leading_zero() {
        let mut raw = vec![0x00, 0x7F];
        raw.resize(129, 0x11);
        let group = DhGroup::from_prime(&raw);
        assert_eq!(group.family, DhFamily::Custom);
        assert_eq!(group.bits, 1023);
    }

    #[test]
    fn test_accessors() {
        let kx = KeyExchange::Ecdhe {
            curve: NamedGroup::X25519,
            signature: Some(SignatureAlgorithm::RsaMd5Sha1),
        };
        assert_eq!(kx.curve(), Some(NamedGroup::X25519));
        assert_eq!(kx.dh_group(), None);
        assert!(kx.is_ephemeral());
        assert_eq!(KeyExchange::Rsa.signature(), None);
    }
}
