use mpz_trunc_core::{LocalShares, MsbHeuristic, Role, TruncConfig};

use crate::{Channel, Compare, Convert, TruncError};

type Result<T, E = TruncError> = core::result::Result<T, E>;

/// Truncation protocol party.
///
/// Each call completes only once all of its sub-protocol rounds have completed.
/// Calls take `&mut self`, so a truncator runs one truncation at a time over
/// its functionalities and channel.
#[derive(Debug)]
pub struct Truncator<C, A, IO> {
    role: Role,
    cmp: C,
    aux: A,
    io: IO,
}

impl<C, A, IO> Truncator<C, A, IO> {
    /// Creates a new truncator.
    ///
    /// # Arguments
    ///
    /// * `role` - Role of this party.
    /// * `cmp` - Comparison functionality.
    /// * `aux` - Auxiliary conversion functionality.
    /// * `io` - Channel to the other party.
    pub fn new(role: Role, cmp: C, aux: A, io: IO) -> Self {
        Self { role, cmp, aux, io }
    }

    /// Returns the role of this party.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the channel.
    pub fn channel(&self) -> &IO {
        &self.io
    }

    /// Returns the functionalities and the channel.
    pub fn into_inner(self) -> (C, A, IO) {
        (self.cmp, self.aux, self.io)
    }
}

impl<C, A, IO> Truncator<C, A, IO>
where
    C: Compare,
    A: Convert,
    IO: Channel,
{
    /// Truncates shared values, computing shares of `x >> shift`.
    ///
    /// If shares of the MSB of the input values are provided the wrap is derived
    /// from them, see [`Truncator::truncate_msb`]. Otherwise the wrap is
    /// detected with a comparison, or with the MSB heuristic if it is enabled
    /// in the configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Truncation configuration.
    /// * `input` - Input shares.
    /// * `output` - Output shares.
    /// * `msb` - Optional XOR shares of the MSB of the input values.
    #[tracing::instrument(
        fields(role = %self.role, dim = input.len(), bw = config.bit_width(), shift = config.shift()),
        skip_all,
        err
    )]
    pub async fn truncate(
        &mut self,
        config: &TruncConfig,
        input: &[u64],
        output: &mut [u64],
        msb: Option<&[bool]>,
    ) -> Result<()> {
        check_output(input, output)?;

        if let Some(msb) = msb {
            return self.truncate_msb(config, input, output, msb).await;
        }

        if is_trivial(config, input, output) {
            return Ok(());
        }

        if config.heuristic() {
            return self.truncate_heuristic(config, input, output).await;
        }

        let local = LocalShares::new(self.role, config, input);

        // The carry comparison is batched with the wrap comparison.
        let mut inputs = local.wrap_inputs();
        if config.exact() {
            inputs.extend(local.carry_inputs());
        }

        let bits = self.compare(&inputs, config.bit_width()).await?;

        self.finish(config, &local, bits, output).await
    }

    /// Truncates shared values, given XOR shares of the MSB of the input
    /// values.
    ///
    /// The wrap is derived from the MSB without a comparison. Exact truncation
    /// still runs one comparison at width `shift` for the carry of the low
    /// bits.
    ///
    /// # Arguments
    ///
    /// * `config` - Truncation configuration.
    /// * `input` - Input shares.
    /// * `output` - Output shares.
    /// * `msb` - XOR shares of the MSB of the input values.
    #[tracing::instrument(
        fields(role = %self.role, dim = input.len(), bw = config.bit_width(), shift = config.shift()),
        skip_all,
        err
    )]
    pub async fn truncate_msb(
        &mut self,
        config: &TruncConfig,
        input: &[u64],
        output: &mut [u64],
        msb: &[bool],
    ) -> Result<()> {
        check_output(input, output)?;
        if msb.len() != input.len() {
            return Err(TruncError::msb_length(input.len(), msb.len()));
        }

        if is_trivial(config, input, output) {
            return Ok(());
        }

        let local = LocalShares::new(self.role, config, input);
        let msb = local.orient_msb(msb);

        let bits = self
            .aux
            .msb_to_wrap(local.as_slice(), &msb, config.bit_width())
            .await
            .map_err(TruncError::convert)?;
        let bits = self.append_carry(config, &local, bits).await?;

        self.finish(config, &local, bits, output).await
    }

    /// Truncates shared values whose MSB is known to be 0.
    ///
    /// For signed values this means the values are non-negative. The result is
    /// incorrect if the MSB is not 0.
    ///
    /// As with [`Truncator::truncate_msb`], exact truncation runs one
    /// comparison at width `shift` for the carry of the low bits.
    ///
    /// # Arguments
    ///
    /// * `config` - Truncation configuration.
    /// * `input` - Input shares.
    /// * `output` - Output shares.
    #[tracing::instrument(
        fields(role = %self.role, dim = input.len(), bw = config.bit_width(), shift = config.shift()),
        skip_all,
        err
    )]
    pub async fn truncate_msb0(
        &mut self,
        config: &TruncConfig,
        input: &[u64],
        output: &mut [u64],
    ) -> Result<()> {
        check_output(input, output)?;

        if is_trivial(config, input, output) {
            return Ok(());
        }

        self.truncate_known_msb(config, input, output).await
    }

    async fn truncate_heuristic(
        &mut self,
        config: &TruncConfig,
        input: &[u64],
        output: &mut [u64],
    ) -> Result<()> {
        let heuristic = MsbHeuristic::new(self.role, config);
        tracing::debug!(offset = heuristic.offset(), "applying msb heuristic");

        let input = heuristic.adjust_input(input);
        self.truncate_known_msb(config, &input, output).await?;
        heuristic.adjust_output(output);

        Ok(())
    }

    async fn truncate_known_msb(
        &mut self,
        config: &TruncConfig,
        input: &[u64],
        output: &mut [u64],
    ) -> Result<()> {
        let local = LocalShares::new(self.role, config, input);
        let bit_width = config.bit_width();

        // Re-centering sets the MSB of signed values.
        let bits = if config.signed() {
            self.aux.msb1_to_wrap(local.as_slice(), bit_width).await
        } else {
            self.aux.msb0_to_wrap(local.as_slice(), bit_width).await
        }
        .map_err(TruncError::convert)?;
        let bits = self.append_carry(config, &local, bits).await?;

        self.finish(config, &local, bits, output).await
    }

    /// Appends the carry bits of exact truncation to the wrap bits.
    async fn append_carry(
        &mut self,
        config: &TruncConfig,
        local: &LocalShares,
        mut bits: Vec<bool>,
    ) -> Result<Vec<bool>> {
        check_bits("wrap", local.len(), bits.len())?;

        if config.exact() {
            let carry = self.compare(&local.carry_inputs(), config.shift()).await?;
            check_bits("carry", local.len(), carry.len())?;
            bits.extend(carry);
        }

        Ok(bits)
    }

    async fn compare(&mut self, inputs: &[u64], bit_width: u32) -> Result<Vec<bool>> {
        let start = self.io.bytes_transferred();

        let bits = self
            .cmp
            .compare(inputs, bit_width)
            .await
            .map_err(TruncError::compare)?;

        tracing::debug!(
            bytes = self.io.bytes_transferred().saturating_sub(start),
            "comparison complete"
        );

        Ok(bits)
    }

    /// Converts the wrap, and carry, bits and computes the output shares.
    async fn finish(
        &mut self,
        config: &TruncConfig,
        local: &LocalShares,
        bits: Vec<bool>,
        output: &mut [u64],
    ) -> Result<()> {
        let n = local.len();
        let (expected, bit_width) = if config.exact() {
            (2 * n, config.bit_width())
        } else {
            (n, config.shift())
        };

        check_bits("wrap and carry", expected, bits.len())?;

        let start = self.io.bytes_transferred();

        let arith = self
            .aux
            .b2a(&bits, bit_width)
            .await
            .map_err(TruncError::convert)?;
        self.io.flush().await.map_err(TruncError::io)?;

        tracing::debug!(
            bytes = self.io.bytes_transferred().saturating_sub(start),
            "b2a complete"
        );

        if arith.len() != expected {
            return Err(TruncError::convert(format!(
                "expected {expected} arithmetic shares, got {}",
                arith.len()
            )));
        }

        let (wrap, carry) = arith.split_at(n);
        local.finish(wrap, config.exact().then_some(carry), output)?;

        Ok(())
    }
}

fn check_output(input: &[u64], output: &[u64]) -> Result<()> {
    if input.len() != output.len() {
        return Err(TruncError::length(input.len(), output.len()));
    }

    Ok(())
}

fn check_bits(name: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(TruncError::convert(format!(
            "expected {expected} {name} bits, got {actual}"
        )));
    }

    Ok(())
}

/// Handles the cases which need no communication.
fn is_trivial(config: &TruncConfig, input: &[u64], output: &mut [u64]) -> bool {
    if config.shift() == 0 {
        output.copy_from_slice(input);
        true
    } else {
        input.is_empty()
    }
}
