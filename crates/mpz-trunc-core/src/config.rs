use derive_builder::Builder;

use crate::{mask, Ring};

/// Default heuristic margin, the offset added by the MSB heuristic is
/// `2^(bw - 3)`.
pub const DEFAULT_HEURISTIC_MARGIN: u32 = 3;

/// Truncation configuration.
///
/// Both parties must use the same configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct TruncConfig {
    /// Bit width of the ring, in `1..=64`.
    bit_width: u32,
    /// Number of bits to shift right by, must be less than the bit width.
    shift: u32,
    /// Whether the shared values are two's complement signed integers.
    #[builder(default)]
    signed: bool,
    /// Whether to also correct the carry out of the low `shift` bits.
    ///
    /// Without it the result may be one less than the exact truncation, in
    /// exchange the MSB-aware variants do not need a comparison.
    #[builder(default = "true")]
    exact: bool,
    /// Whether the generic truncation uses the MSB heuristic instead of a
    /// comparison.
    #[builder(default)]
    heuristic: bool,
    /// Margin of the MSB heuristic, the offset added is `2^(bw - margin)`.
    #[builder(default = "DEFAULT_HEURISTIC_MARGIN")]
    heuristic_margin: u32,
}

impl TruncConfig {
    /// Creates a new builder for TruncConfig.
    pub fn builder() -> TruncConfigBuilder {
        TruncConfigBuilder::default()
    }

    /// Creates a new configuration with default options.
    ///
    /// # Arguments
    ///
    /// * `bit_width` - Bit width of the ring.
    /// * `shift` - Right shift amount.
    /// * `signed` - Whether values are signed.
    pub fn new(bit_width: u32, shift: u32, signed: bool) -> Result<Self, ConfigError> {
        check(bit_width, shift, false, DEFAULT_HEURISTIC_MARGIN)?;

        Ok(Self {
            bit_width,
            shift,
            signed,
            exact: true,
            heuristic: false,
            heuristic_margin: DEFAULT_HEURISTIC_MARGIN,
        })
    }

    /// Returns the bit width of the ring.
    pub fn bit_width(&self) -> u32 {
        self.bit_width
    }

    /// Returns the shift amount.
    pub fn shift(&self) -> u32 {
        self.shift
    }

    /// Returns `true` if values are signed.
    pub fn signed(&self) -> bool {
        self.signed
    }

    /// Returns `true` if the truncation is exact.
    pub fn exact(&self) -> bool {
        self.exact
    }

    /// Returns `true` if the MSB heuristic is enabled.
    pub fn heuristic(&self) -> bool {
        self.heuristic
    }

    /// Returns the margin of the MSB heuristic.
    pub fn heuristic_margin(&self) -> u32 {
        self.heuristic_margin
    }

    /// Returns the ring.
    pub fn ring(&self) -> Ring {
        Ring::new_unchecked(self.bit_width)
    }

    /// Returns the bit width of the truncated value, `bw - shift`.
    pub fn upper_width(&self) -> u32 {
        self.bit_width - self.shift
    }

    /// Returns the mask of the truncated value.
    pub fn upper_mask(&self) -> u64 {
        mask(self.upper_width())
    }

    /// Returns the offset added by the MSB heuristic, `2^(bw - margin)`.
    pub fn heuristic_offset(&self) -> u64 {
        self.ring()
            .pow2(self.bit_width.saturating_sub(self.heuristic_margin))
    }
}

impl TruncConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        // Missing fields are reported by the build function.
        let (Some(bit_width), Some(shift)) = (self.bit_width, self.shift) else {
            return Ok(());
        };

        check(
            bit_width,
            shift,
            self.heuristic.unwrap_or_default(),
            self.heuristic_margin.unwrap_or(DEFAULT_HEURISTIC_MARGIN),
        )
        .map_err(|err| err.to_string())
    }
}

fn check(bit_width: u32, shift: u32, heuristic: bool, margin: u32) -> Result<(), ConfigError> {
    if bit_width == 0 || bit_width > Ring::MAX_BIT_WIDTH {
        return Err(ConfigError::InvalidBitWidth(bit_width));
    }

    // Also leaves room for the sign bit of signed results.
    if shift >= bit_width {
        return Err(ConfigError::FullWidthShift { shift, bit_width });
    }

    if heuristic && (margin == 0 || shift + margin > bit_width) {
        return Err(ConfigError::InvalidHeuristicMargin {
            margin,
            bit_width,
            shift,
        });
    }

    Ok(())
}

/// Error for [`TruncConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[allow(missing_docs)]
pub enum ConfigError {
    #[error("invalid bit width {0}, must be in 1..=64")]
    InvalidBitWidth(u32),
    #[error("shift {shift} truncates the full bit width {bit_width}")]
    FullWidthShift { shift: u32, bit_width: u32 },
    #[error("heuristic margin {margin} is invalid for bit width {bit_width} and shift {shift}")]
    InvalidHeuristicMargin {
        margin: u32,
        bit_width: u32,
        shift: u32,
    },
}
