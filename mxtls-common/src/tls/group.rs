use std::fmt;

use serde::{Deserialize, Serialize};

/// A `supported_groups` identifier (RFC 8422, RFC 7919, RFC 8446).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamedGroup(pub u16);

macro_rules! named_groups {
    ($( $value:literal => $konst:ident : $name:literal, $bits:literal, )+) => {
        impl NamedGroup {
            $( pub const $konst: Self = Self($value); )+

            /// Every group in the registry, in wire-value order.
            pub const ALL: &'static [Self] = &[ $( Self::$konst, )+ ];

            #[must_use]
            pub const fn name(self) -> Option<&'static str> {
                match self.0 {
                    $( $value => Some($name), )+
                    _ => None,
                }
            }

            /// Approximate security strength expressed as the key size of the
            /// group (field size for curves, modulus size for FFDHE).
            #[must_use]
            pub const fn bits(self) -> Option<u16> {
                match self.0 {
                    $( $value => Some($bits), )+
                    _ => None,
                }
            }
        }
    };
}

named_groups! {
    1 => SECT163K1: "sect163k1", 163,
    2 => SECT163R1: "sect163r1", 163,
    3 => SECT163R2: "sect163r2", 163,
    4 => SECT193R1: "sect193r1", 193,
    5 => SECT193R2: "sect193r2", 193,
    6 => SECT233K1: "sect233k1", 233,
    7 => SECT233R1: "sect233r1", 233,
    8 => SECT239K1: "sect239k1", 239,
    9 => SECT283K1: "sect283k1", 283,
    10 => SECT283R1: "sect283r1", 283,
    11 => SECT409K1: "sect409k1", 409,
    12 => SECT409R1: "sect409r1", 409,
    13 => SECT571K1: "sect571k1", 571,
    14 => SECT571R1: "sect571r1", 571,
    15 => SECP160K1: "secp160k1", 160,
    16 => SECP160R1: "secp160r1", 160,
    17 => SECP160R2: "secp160r2", 160,
    18 => SECP192K1: "secp192k1", 192,
    19 => SECP192R1: "secp192r1", 192,
    20 => SECP224K1: "secp224k1", 224,
    21 => SECP224R1: "secp224r1", 224,
    22 => SECP256K1: "secp256k1", 256,
    23 => SECP256R1: "secp256r1", 256,
    24 => SECP384R1: "secp384r1", 384,
    25 => SECP521R1: "secp521r1", 521,
    26 => BRAINPOOLP256R1: "brainpoolP256r1", 256,
    27 => BRAINPOOLP384R1: "brainpoolP384r1", 384,
    28 => BRAINPOOLP512R1: "brainpoolP512r1", 512,
    29 => X25519: "x25519", 256,
    30 => X448: "x448", 448,
    256 => FFDHE2048: "ffdhe2048", 2048,
    257 => FFDHE3072: "ffdhe3072", 3072,
    258 => FFDHE4096: "ffdhe4096", 4096,
    259 => FFDHE6144: "ffdhe6144", 6144,
    260 => FFDHE8192: "ffdhe8192", 8192,
}

impl NamedGroup {
    /// The list offered when a probe does not name its own groups: modern
    /// curves first, then the remaining registered curves and FFDHE groups.
    pub const DEFAULT_OFFER: &'static [Self] = &[
        Self::X25519,
        Self::SECP256R1,
        Self::SECP384R1,
        Self::SECP521R1,
        Self::X448,
        Self::BRAINPOOLP256R1,
        Self::BRAINPOOLP384R1,
        Self::BRAINPOOLP512R1,
        Self::SECP256K1,
        Self::SECP224R1,
        Self::SECP224K1,
        Self::SECP192R1,
        Self::SECP192K1,
        Self::SECP160R2,
        Self::SECP160R1,
        Self::SECP160K1,
        Self::SECT571R1,
        Self::SECT571K1,
        Self::SECT409R1,
        Self::SECT409K1,
        Self::SECT283R1,
        Self::SECT283K1,
        Self::SECT239K1,
        Self::SECT233R1,
        Self::SECT233K1,
        Self::SECT193R2,
        Self::SECT193R1,
        Self::SECT163R2,
        Self::SECT163R1,
        Self::SECT163K1,
        Self::FFDHE2048,
        Self::FFDHE3072,
        Self::FFDHE4096,
        Self::FFDHE6144,
        Self::FFDHE8192,
    ];

    #[must_use]
    pub const fn is_ffdhe(self) -> bool {
        matches!(self.0, 256..=260)
    }

    #[must_use]
    pub const fn is_elliptic_curve(self) -> bool {
        matches!(self.0, 1..=30)
    }

    /// Curves of at least 256 bits, and FFDHE groups of at least 2048 bits.
    #[must_use]
    pub const fn is_secure(self) -> bool {
        match self.bits() {
            Some(bits) if self.is_ffdhe() => bits >= 2048,
            Some(bits) => bits >= 256,
            None => false,
        }
    }
}

impl fmt::Display for NamedGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:04X}", self.0),
        }
    }
}

impl fmt::Debug for NamedGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength() {
        assert!(NamedGroup::X25519.is_secure());
        assert!(NamedGroup::SECP256R1.is_secure());
        assert!(!NamedGroup::SECP224R1.is_secure());
        assert!(!NamedGroup::SECT163K1.is_secure());
        assert!(NamedGroup::FFDHE2048.is_secure());
        assert!(!NamedGroup(0x1234).is_secure());
    }

    #[test]
    fn test_default_offer_covers_registry() {
        let mut offered = NamedGroup::DEFAULT_OFFER.to_vec();
        offered.sort_unstable();
        assert_eq!(offered, NamedGroup::ALL);
    }

    #[test]
    fn test_display() {
        assert_eq!(NamedGroup::SECP384R1.to_string(), "secp384r1");
        assert_eq!(NamedGroup(0x0A0A).to_string(), "0x0A0A");
    }
}
