use std::borrow::Cow;

use crate::{Role, TruncConfig};

/// Offset applied by the MSB heuristic.
///
/// Adding a large public offset moves values of modest magnitude into the
/// range where the MSB is known, so the zero-MSB truncation can be used
/// without a comparison. Only Bob applies the offset, Alice's shares pass
/// through unchanged.
///
/// The truncation is correct for every `x` with `x + offset` in
/// `[0, 2^(bw - 1))` over the integers. Outside of this range the result may
/// be off by `2^(bw - shift)`, which is not detected.
#[derive(Debug, Clone, Copy)]
pub struct MsbHeuristic {
    role: Role,
    config: TruncConfig,
}

impl MsbHeuristic {
    /// Creates a new heuristic for the given party.
    pub fn new(role: Role, config: &TruncConfig) -> Self {
        Self {
            role,
            config: *config,
        }
    }

    /// Returns the offset added to the input value.
    pub fn offset(&self) -> u64 {
        self.config.heuristic_offset()
    }

    /// Returns the offset removed from the truncated value.
    pub fn output_offset(&self) -> u64 {
        self.offset() >> self.config.shift()
    }

    /// Adds the offset to the input shares.
    pub fn adjust_input<'a>(&self, input: &'a [u64]) -> Cow<'a, [u64]> {
        match self.role {
            Role::Alice => Cow::Borrowed(input),
            Role::Bob => {
                let ring = self.config.ring();
                let offset = self.offset();
                Cow::Owned(input.iter().map(|&x| ring.add(x, offset)).collect())
            }
        }
    }

    /// Removes the offset from the truncated output shares.
    pub fn adjust_output(&self, output: &mut [u64]) {
        if self.role.is_alice() {
            return;
        }

        let ring = self.config.ring();
        let offset = self.output_offset();
        output
            .iter_mut()
            .for_each(|y| *y = ring.sub(*y, offset));
    }

    /// Returns `true` if the truncation of `x` is guaranteed to be correct.
    pub fn covers(&self, x: u64) -> bool {
        let ring = self.config.ring();
        let value = if self.config.signed() {
            ring.to_signed(x) as i128
        } else {
            ring.reduce(x) as i128
        };

        let shifted = value + self.offset() as i128;
        shifted >= 0 && shifted < 1i128 << (ring.bit_width() - 1)
    }
}
