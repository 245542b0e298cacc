//! Fixed-width permission masks and their decimal-string wire form.
//!
//! Masks are persisted and transported as base-10 strings so that JSON
//! consumers never round them through a lossy float. The in-memory width is
//! 128 bits; the registry refuses permissions beyond [`MAX_PERMISSIONS`].

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Number of distinct permission bits a [`Mask`] can hold
pub const MAX_PERMISSIONS: u32 = u128::BITS;

/// A set of permission bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mask(u128);

impl Mask {
    pub const EMPTY: Mask = Mask(0);

    #[inline]
    pub const fn from_bits(bits: u128) -> Self {
        Mask(bits)
    }

    /// Mask with only `bit` set, or `None` past the ceiling
    #[inline]
    pub const fn from_bit(bit: u32) -> Option<Self> {
        if bit < MAX_PERMISSIONS {
            Some(Mask(1 << bit))
        } else {
            None
        }
    }

    #[inline]
    pub const fn bits(self) -> u128 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every bit of `other` is set in `self`
    #[inline]
    pub const fn contains(self, other: Mask) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if `self` and `other` share at least one bit
    #[inline]
    pub const fn intersects(self, other: Mask) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn union(self, other: Mask) -> Mask {
        Mask(self.0 | other.0)
    }

    #[inline]
    pub const fn difference(self, other: Mask) -> Mask {
        Mask(self.0 & !other.0)
    }

    /// Indices of the set bits, lowest first
    pub fn iter_bits(self) -> impl Iterator<Item = u32> {
        let mut rest = self.0;
        std::iter::from_fn(move || {
            if rest == 0 {
                return None;
            }
            let bit = rest.trailing_zeros();
            rest &= rest - 1;
            Some(bit)
        })
    }

    /// Parse the decimal wire form.
    ///
    /// Only ASCII digits are accepted: signs, whitespace and the empty string
    /// are rejected, as is anything that does not fit in 128 bits.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason| Error::InvalidMask {
            input: input.to_string(),
            reason,
        };
        if input.is_empty() {
            return Err(invalid("empty string"));
        }
        if !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected an unsigned decimal integer"));
        }
        input
            .parse::<u128>()
            .map(Mask)
            .map_err(|_| invalid("value exceeds the mask width"))
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Mask {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Mask::parse(s)
    }
}

impl From<u128> for Mask {
    fn from(bits: u128) -> Self {
        Mask(bits)
    }
}

impl From<u64> for Mask {
    fn from(bits: u64) -> Self {
        Mask(bits as u128)
    }
}

impl BitOr for Mask {
    type Output = Mask;
    fn bitor(self, rhs: Mask) -> Mask {
        self.union(rhs)
    }
}

impl BitOrAssign for Mask {
    fn bitor_assign(&mut self, rhs: Mask) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Mask {
    type Output = Mask;
    fn bitand(self, rhs: Mask) -> Mask {
        Mask(self.0 & rhs.0)
    }
}

impl Not for Mask {
    type Output = Mask;
    fn not(self) -> Mask {
        Mask(!self.0)
    }
}

// Wire form is always the decimal string
impl Serialize for Mask {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Mask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Mask::parse(&s).map_err(serde::de::Error::custom)
    }
}
