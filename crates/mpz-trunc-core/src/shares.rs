//! Local, role-dependent processing of the shares being truncated.

use crate::{mask, Role, TruncConfig};

/// Local shares of a single truncation.
///
/// Holds the party's shares after re-centering and derives the inputs of the
/// wrap detection functionalities. Once the arithmetic shares of the wrap bits
/// are available, [`LocalShares::finish`] computes the truncated shares.
///
/// Re-centering happens on an owned copy, the caller's input is never
/// modified.
#[derive(Debug, Clone)]
pub struct LocalShares {
    role: Role,
    config: TruncConfig,
    shares: Vec<u64>,
}

impl LocalShares {
    /// Creates new local shares.
    ///
    /// For signed truncation Alice adds `2^(bw - 1)` to each of her shares,
    /// which maps the signed range onto the unsigned range.
    ///
    /// # Arguments
    ///
    /// * `role` - Role of this party.
    /// * `config` - Truncation configuration.
    /// * `input` - Input shares.
    pub fn new(role: Role, config: &TruncConfig, input: &[u64]) -> Self {
        let ring = config.ring();
        let offset = if config.signed() && role.is_alice() {
            ring.pow2(ring.bit_width() - 1)
        } else {
            0
        };

        Self {
            role,
            config: *config,
            shares: input.iter().map(|&x| ring.add(x, offset)).collect(),
        }
    }

    /// Returns the number of shares.
    pub fn len(&self) -> usize {
        self.shares.len()
    }

    /// Returns `true` if there are no shares.
    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    /// Returns the re-centered shares.
    pub fn as_slice(&self) -> &[u64] {
        &self.shares
    }

    /// Returns the inputs to the comparison which detects the wrap.
    ///
    /// Bob complements his shares, so that Alice's input is greater than Bob's
    /// input exactly when the sum of the shares reaches `2^bw`.
    pub fn wrap_inputs(&self) -> Vec<u64> {
        let ring = self.config.ring();
        match self.role {
            Role::Alice => self.shares.clone(),
            Role::Bob => self.shares.iter().map(|&x| ring.complement(x)).collect(),
        }
    }

    /// Returns the inputs to the comparison which detects the carry out of the
    /// low `shift` bits.
    pub fn carry_inputs(&self) -> Vec<u64> {
        let low_mask = mask(self.config.shift());
        self.shares
            .iter()
            .map(|&x| match self.role {
                Role::Alice => x & low_mask,
                Role::Bob => low_mask - (x & low_mask),
            })
            .collect()
    }

    /// Orients shares of the input MSB for the wrap conversion.
    ///
    /// The caller supplies the MSB of the input value. Re-centering flips it,
    /// which Alice applies to her share.
    pub fn orient_msb(&self, msb: &[bool]) -> Vec<bool> {
        let flip = self.config.signed() && self.role.is_alice();
        msb.iter().map(|&bit| bit ^ flip).collect()
    }

    /// Computes the truncated output shares.
    ///
    /// # Arguments
    ///
    /// * `wrap` - Arithmetic shares of the wrap bits, modulo `2^shift` or any
    ///   larger power of two up to `2^bw`.
    /// * `carry` - Arithmetic shares of the low carry bits modulo `2^bw`, for
    ///   exact truncation.
    /// * `output` - Output shares.
    pub fn finish(
        &self,
        wrap: &[u64],
        carry: Option<&[u64]>,
        output: &mut [u64],
    ) -> Result<(), ShareError> {
        check_len("wrap", self.len(), wrap.len())?;
        check_len("output", self.len(), output.len())?;
        if let Some(carry) = carry {
            check_len("carry", self.len(), carry.len())?;
        }

        let ring = self.config.ring();
        let shift = self.config.shift();
        let upper_width = self.config.upper_width();
        let upper_mask = self.config.upper_mask();
        let bias = if self.config.signed() && self.role.is_alice() {
            ring.pow2(upper_width - 1)
        } else {
            0
        };

        for (i, (out, (&x, &w))) in output
            .iter_mut()
            .zip(self.shares.iter().zip(wrap))
            .enumerate()
        {
            // A wrap in the full ring leaves an extra 2^(bw - shift) in the
            // locally shifted shares.
            let correction = w.checked_shl(upper_width).unwrap_or(0);
            let mut y = ring.sub((x >> shift) & upper_mask, correction);
            if let Some(carry) = carry {
                y = ring.add(y, carry[i]);
            }
            *out = ring.sub(y, bias);
        }

        Ok(())
    }
}

fn check_len(name: &'static str, expected: usize, actual: usize) -> Result<(), ShareError> {
    if expected != actual {
        return Err(ShareError {
            name,
            expected,
            actual,
        });
    }

    Ok(())
}

/// Error for [`LocalShares`].
#[derive(Debug, thiserror::Error)]
#[error("{name} length mismatch: expected {expected}, actual {actual}")]
pub struct ShareError {
    name: &'static str,
    expected: usize,
    actual: usize,
}
