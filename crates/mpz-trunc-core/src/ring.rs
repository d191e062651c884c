//! Arithmetic in `Z_{2^bw}` over `u64` words.

use serde::{Deserialize, Serialize};

/// Returns a mask selecting the `bit_width` least significant bits.
///
/// Widths of 64 or more select the whole word.
#[inline]
pub fn mask(bit_width: u32) -> u64 {
    if bit_width >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << bit_width) - 1
    }
}

/// The ring of integers modulo `2^bw`, with `1 <= bw <= 64`.
///
/// Elements are stored in the low `bw` bits of a `u64`. Every operation returns
/// a reduced element, bits above `bw` are always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Ring {
    bit_width: u32,
}

impl Ring {
    /// Largest supported bit width.
    pub const MAX_BIT_WIDTH: u32 = u64::BITS;

    /// Creates a new ring of the given bit width.
    pub fn new(bit_width: u32) -> Result<Self, RingError> {
        if bit_width == 0 || bit_width > Self::MAX_BIT_WIDTH {
            return Err(RingError(bit_width));
        }

        Ok(Self { bit_width })
    }

    /// Creates a new ring from an already validated bit width.
    #[inline]
    pub(crate) fn new_unchecked(bit_width: u32) -> Self {
        debug_assert!(bit_width > 0 && bit_width <= Self::MAX_BIT_WIDTH);
        Self { bit_width }
    }

    /// Returns the bit width.
    #[inline]
    pub fn bit_width(&self) -> u32 {
        self.bit_width
    }

    /// Returns the mask of the ring, `2^bw - 1`.
    #[inline]
    pub fn mask(&self) -> u64 {
        mask(self.bit_width)
    }

    /// Reduces `x` into the ring.
    #[inline]
    pub fn reduce(&self, x: u64) -> u64 {
        x & self.mask()
    }

    /// Returns `a + b`.
    #[inline]
    pub fn add(&self, a: u64, b: u64) -> u64 {
        a.wrapping_add(b) & self.mask()
    }

    /// Returns `a - b`.
    #[inline]
    pub fn sub(&self, a: u64, b: u64) -> u64 {
        a.wrapping_sub(b) & self.mask()
    }

    /// Returns `2^bw - 1 - x`.
    ///
    /// For reduced `a` and `b`, `a + b >= 2^bw` holds if and only if
    /// `a > complement(b)`.
    #[inline]
    pub fn complement(&self, x: u64) -> u64 {
        self.mask().wrapping_sub(x) & self.mask()
    }

    /// Returns `2^k` reduced into the ring.
    #[inline]
    pub fn pow2(&self, k: u32) -> u64 {
        if k >= self.bit_width {
            0
        } else {
            1u64 << k
        }
    }

    /// Returns the most significant bit of `x`.
    #[inline]
    pub fn msb(&self, x: u64) -> bool {
        (x >> (self.bit_width - 1)) & 1 == 1
    }

    /// Interprets `x` as a two's complement integer.
    pub fn to_signed(&self, x: u64) -> i64 {
        let x = self.reduce(x);
        if self.msb(x) {
            (x | !self.mask()) as i64
        } else {
            x as i64
        }
    }

    /// Encodes a signed integer into the ring.
    #[inline]
    pub fn from_signed(&self, x: i64) -> u64 {
        self.reduce(x as u64)
    }
}

impl TryFrom<u32> for Ring {
    type Error = RingError;

    fn try_from(bit_width: u32) -> Result<Self, Self::Error> {
        Self::new(bit_width)
    }
}

impl From<Ring> for u32 {
    fn from(ring: Ring) -> Self {
        ring.bit_width
    }
}

/// Error for [`Ring`].
#[derive(Debug, thiserror::Error)]
#[error("invalid ring bit width {0}, must be in 1..=64")]
pub struct RingError(u32);
