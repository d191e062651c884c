//! Two-party truncation of additively shared ring elements, with semi-honest
//! security.
//!
//! The [`Truncator`] drives the protocol. The wrap bits it needs are computed
//! by a comparison functionality ([`Compare`]) and an auxiliary conversion
//! functionality ([`Convert`]), and all messages go through a [`Channel`].
//! None of them are implemented here, see the [`ideal`] module for reference
//! implementations which can be used for testing.

#![deny(missing_docs, unreachable_pub, unused_must_use)]
#![deny(unsafe_code)]
#![deny(clippy::all)]

mod error;
#[cfg(any(test, feature = "ideal"))]
pub mod ideal;
mod truncator;

pub use error::TruncError;
pub use mpz_trunc_core::{
    ConfigError, MsbHeuristic, Ring, RingError, Role, TruncConfig, TruncConfigBuilder,
    TruncConfigBuilderError, DEFAULT_HEURISTIC_MARGIN,
};
pub use truncator::Truncator;

use async_trait::async_trait;

/// Secure comparison functionality.
#[async_trait]
pub trait Compare {
    /// Error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Compares the inputs of both parties.
    ///
    /// Returns XOR shares of `alice_input > bob_input` for each pair of
    /// inputs, read modulo `2^bit_width`.
    ///
    /// # Arguments
    ///
    /// * `inputs` - Inputs of this party.
    /// * `bit_width` - Bit width of the inputs.
    async fn compare(&mut self, inputs: &[u64], bit_width: u32) -> Result<Vec<bool>, Self::Error>;
}

/// Auxiliary share conversion functionality.
#[async_trait]
pub trait Convert {
    /// Error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Converts XOR shares of bits into additive shares modulo `2^bit_width`.
    async fn b2a(&mut self, bits: &[bool], bit_width: u32) -> Result<Vec<u64>, Self::Error>;

    /// Returns XOR shares of the wrap bit of each pair of additive shares,
    /// given XOR shares of the MSB of their sum.
    async fn msb_to_wrap(
        &mut self,
        shares: &[u64],
        msb: &[bool],
        bit_width: u32,
    ) -> Result<Vec<bool>, Self::Error>;

    /// Returns XOR shares of the wrap bit of each pair of additive shares,
    /// assuming the MSB of their sum is 0.
    async fn msb0_to_wrap(&mut self, shares: &[u64], bit_width: u32)
        -> Result<Vec<bool>, Self::Error>;

    /// Returns XOR shares of the wrap bit of each pair of additive shares,
    /// assuming the MSB of their sum is 1.
    async fn msb1_to_wrap(&mut self, shares: &[u64], bit_width: u32)
        -> Result<Vec<bool>, Self::Error>;
}

/// Channel to the other party.
#[async_trait]
pub trait Channel {
    /// Error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Flushes pending messages.
    async fn flush(&mut self) -> Result<(), Self::Error>;

    /// Returns the number of bytes sent and received so far.
    fn bytes_transferred(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ideal::{ideal_truncators, IdealTruncator};
    use mpz_trunc_core::{
        ideal::CallKind,
        test::{random_bounded_values, random_msb0_values, random_values, truncate_plain},
    };
    use rand::{rngs::StdRng, SeedableRng};
    use rstest::*;
    use test::{test_truncate, truncate_shared, Variant};

    #[fixture]
    fn truncators() -> (IdealTruncator, IdealTruncator) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        ideal_truncators(0)
    }

    async fn truncate_pair(
        (alice, bob): &mut (IdealTruncator, IdealTruncator),
        config: &TruncConfig,
        alice_input: &[u64],
        bob_input: &[u64],
    ) -> Vec<u64> {
        let mut alice_output = vec![0; alice_input.len()];
        let mut bob_output = vec![0; bob_input.len()];

        let (a, b) = tokio::join!(
            alice.truncate(config, alice_input, &mut alice_output, None),
            bob.truncate(config, bob_input, &mut bob_output, None),
        );
        a.unwrap();
        b.unwrap();

        alice_output
            .into_iter()
            .zip(bob_output)
            .map(|(a, b)| config.ring().add(a, b))
            .collect()
    }

    #[rstest]
    #[tokio::test]
    async fn test_truncate_unsigned_scenario(mut truncators: (IdealTruncator, IdealTruncator)) {
        let config = TruncConfig::new(8, 2, false).unwrap();

        // 200 + 100 = 44 mod 256.
        let output = truncate_pair(&mut truncators, &config, &[200], &[100]).await;

        assert_eq!(output, vec![11]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_truncate_signed_scenario(mut truncators: (IdealTruncator, IdealTruncator)) {
        let config = TruncConfig::new(8, 3, true).unwrap();
        let ring = config.ring();

        // 150 + 56 = 206 = -50.
        let output = truncate_pair(&mut truncators, &config, &[150], &[56]).await;

        assert_eq!(ring.to_signed(output[0]), -7);
        assert_eq!(output[0] & 0x1f, ring.from_signed(-7) & 0x1f);
    }

    #[rstest]
    #[tokio::test]
    async fn test_truncate_no_shift(truncators: (IdealTruncator, IdealTruncator)) {
        let (mut alice, mut bob) = truncators;
        let config = TruncConfig::new(16, 0, true).unwrap();

        let input = [0xbeef, 0x0001, 0xffff];
        let mut alice_output = [0; 3];
        let mut bob_output = [0; 3];
        alice
            .truncate(&config, &input, &mut alice_output, None)
            .await
            .unwrap();
        bob.truncate_msb0(&config, &input, &mut bob_output)
            .await
            .unwrap();

        assert_eq!(alice_output, input);
        assert_eq!(bob_output, input);
        assert_eq!(alice.channel().flushes(), 0);

        let (cmp, aux, _) = alice.into_inner();
        assert_eq!(cmp.rounds(), 0);
        assert_eq!(aux.rounds(CallKind::B2A), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_truncate_empty(truncators: (IdealTruncator, IdealTruncator)) {
        let (mut alice, _bob) = truncators;
        let config = TruncConfig::new(16, 4, false).unwrap();

        alice.truncate(&config, &[], &mut [], None).await.unwrap();
        alice
            .truncate(&config, &[], &mut [], Some(&[]))
            .await
            .unwrap();
        alice.truncate_msb0(&config, &[], &mut []).await.unwrap();

        assert_eq!(alice.channel().flushes(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_truncate_exact(
        truncators: (IdealTruncator, IdealTruncator),
        #[values(2, 8, 17, 32, 64)] bit_width: u32,
        #[values(false, true)] signed: bool,
        #[values(Variant::Generic, Variant::Msb, Variant::Msb0)] variant: Variant,
    ) {
        let (mut alice, mut bob) = truncators;

        for shift in 1..bit_width {
            let config = TruncConfig::new(bit_width, shift, signed).unwrap();
            test_truncate(&mut alice, &mut bob, &config, variant, 16).await;
        }
    }

    #[rstest]
    #[case::unsigned(false)]
    #[case::signed(true)]
    #[tokio::test]
    async fn test_truncate_max_shift(
        truncators: (IdealTruncator, IdealTruncator),
        #[case] signed: bool,
    ) {
        let (mut alice, mut bob) = truncators;
        let config = TruncConfig::new(8, 7, signed).unwrap();

        let values = [0x00, 0x7f, 0x80, 0xff];
        let expected: Vec<u64> = if signed {
            vec![0x00, 0x00, 0xff, 0xff]
        } else {
            vec![0, 0, 1, 1]
        };

        for variant in [Variant::Generic, Variant::Msb] {
            let output = truncate_shared(&mut alice, &mut bob, &config, &values, variant, 0)
                .await
                .unwrap();
            assert_eq!(output, expected);
        }
    }

    #[rstest]
    #[tokio::test]
    async fn test_truncate_variants_agree(truncators: (IdealTruncator, IdealTruncator)) {
        let (mut alice, mut bob) = truncators;
        let mut rng = StdRng::seed_from_u64(0);
        let config = TruncConfig::new(32, 13, true).unwrap();
        let ring = config.ring();

        let values = random_values(&mut rng, &ring, 128);
        let generic = truncate_shared(&mut alice, &mut bob, &config, &values, Variant::Generic, 1)
            .await
            .unwrap();
        let msb = truncate_shared(&mut alice, &mut bob, &config, &values, Variant::Msb, 1)
            .await
            .unwrap();
        assert_eq!(generic, msb);

        let values = random_msb0_values(&mut rng, &ring, 128);
        let generic = truncate_shared(&mut alice, &mut bob, &config, &values, Variant::Generic, 2)
            .await
            .unwrap();
        let msb0 = truncate_shared(&mut alice, &mut bob, &config, &values, Variant::Msb0, 2)
            .await
            .unwrap();
        assert_eq!(generic, msb0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_truncate_input_unchanged(truncators: (IdealTruncator, IdealTruncator)) {
        let (mut alice, mut bob) = truncators;
        let config = TruncConfig::new(16, 5, true).unwrap();

        let alice_input = vec![0x1234, 0xfedc, 0x8000];
        let bob_input = vec![0x4321, 0x0001, 0x7fff];
        let (alice_copy, bob_copy) = (alice_input.clone(), bob_input.clone());

        let mut alice_output = vec![0; 3];
        let mut bob_output = vec![0; 3];
        let (a, b) = tokio::join!(
            alice.truncate(&config, &alice_input, &mut alice_output, None),
            bob.truncate(&config, &bob_input, &mut bob_output, None),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(alice_input, alice_copy);
        assert_eq!(bob_input, bob_copy);
    }

    #[rstest]
    #[case::unsigned(false)]
    #[case::signed(true)]
    #[tokio::test]
    async fn test_truncate_heuristic_in_range(
        truncators: (IdealTruncator, IdealTruncator),
        #[case] signed: bool,
    ) {
        let (mut alice, mut bob) = truncators;
        let mut rng = StdRng::seed_from_u64(0);
        let config = TruncConfig::builder()
            .bit_width(32)
            .shift(12)
            .signed(signed)
            .heuristic(true)
            .build()
            .unwrap();
        let ring = config.ring();

        let values = if signed {
            random_bounded_values(&mut rng, &ring, 1 << 28, 256)
        } else {
            random_msb0_values(&mut rng, &Ring::new(30).unwrap(), 256)
        };

        let output = truncate_shared(&mut alice, &mut bob, &config, &values, Variant::Generic, 1)
            .await
            .unwrap();

        for (x, y) in values.into_iter().zip(output) {
            assert_eq!(y, truncate_plain(&config, x));
        }

        // The wrap comes from the known MSB, the only comparison is for the carry.
        let (cmp, _, _) = alice.into_inner();
        assert_eq!(cmp.rounds(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_truncate_heuristic_out_of_range(truncators: (IdealTruncator, IdealTruncator)) {
        let (mut alice, mut bob) = truncators;
        let mut rng = StdRng::seed_from_u64(0);
        let config = TruncConfig::builder()
            .bit_width(16)
            .shift(4)
            .signed(true)
            .heuristic(true)
            .build()
            .unwrap();
        let ring = config.ring();
        let heuristic = MsbHeuristic::new(Role::Bob, &config);

        let values = random_values(&mut rng, &ring, 512);
        let output = truncate_shared(&mut alice, &mut bob, &config, &values, Variant::Generic, 1)
            .await
            .unwrap();

        let mut misses = 0;
        let mut uncovered = 0;
        for (x, y) in values.into_iter().zip(output) {
            let correct = y == truncate_plain(&config, x);
            if heuristic.covers(x) {
                assert!(correct, "x = {x}");
            } else {
                uncovered += 1;
            }
            misses += !correct as usize;
        }

        assert!(uncovered > 0);
        assert!(misses <= uncovered);
    }

    #[rstest]
    #[case::generic(Variant::Generic, 1)]
    #[case::msb(Variant::Msb, 0)]
    #[case::msb0(Variant::Msb0, 0)]
    #[tokio::test]
    async fn test_truncate_faithful(
        truncators: (IdealTruncator, IdealTruncator),
        #[case] variant: Variant,
        #[case] compare_rounds: usize,
    ) {
        let (mut alice, mut bob) = truncators;
        let mut rng = StdRng::seed_from_u64(0);
        let config = TruncConfig::builder()
            .bit_width(24)
            .shift(7)
            .signed(true)
            .exact(false)
            .build()
            .unwrap();
        let ring = config.ring();

        let values = match variant {
            Variant::Msb0 => random_msb0_values(&mut rng, &ring, 256),
            _ => random_values(&mut rng, &ring, 256),
        };
        let output = truncate_shared(&mut alice, &mut bob, &config, &values, variant, 1)
            .await
            .unwrap();

        let mut off_by_one = 0;
        for (x, y) in values.into_iter().zip(output) {
            let expected = truncate_plain(&config, x);
            if y != expected {
                assert_eq!(y, ring.sub(expected, 1), "x = {x}");
                off_by_one += 1;
            }
        }
        assert!(off_by_one > 0);

        assert_eq!(alice.channel().flushes(), 1);
        let (cmp, aux, _) = alice.into_inner();
        assert_eq!(cmp.rounds(), compare_rounds);
        assert_eq!(aux.rounds(CallKind::B2A), 1);
    }

    #[rstest]
    #[case::generic(Variant::Generic, 1)]
    #[case::msb(Variant::Msb, 1)]
    #[case::msb0(Variant::Msb0, 1)]
    #[tokio::test]
    async fn test_truncate_exact_cost(
        truncators: (IdealTruncator, IdealTruncator),
        #[case] variant: Variant,
        #[case] compare_rounds: usize,
    ) {
        let (mut alice, mut bob) = truncators;
        let config = TruncConfig::new(16, 3, false).unwrap();

        test_truncate(&mut alice, &mut bob, &config, variant, 32).await;

        assert_eq!(alice.channel().flushes(), 1);
        assert_eq!(bob.channel().flushes(), 1);
        let (cmp, aux, _) = alice.into_inner();
        assert_eq!(cmp.rounds(), compare_rounds);
        assert_eq!(aux.rounds(CallKind::B2A), 1);
        assert_eq!(
            aux.rounds(CallKind::MsbToWrap) + aux.rounds(CallKind::Msb0ToWrap),
            (variant != Variant::Generic) as usize
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_truncate_length_mismatch(truncators: (IdealTruncator, IdealTruncator)) {
        let (mut alice, _bob) = truncators;
        let config = TruncConfig::new(16, 3, false).unwrap();

        let mut output = [0; 2];
        assert!(alice
            .truncate(&config, &[1, 2, 3], &mut output, None)
            .await
            .is_err());
        assert!(alice
            .truncate(&config, &[1, 2], &mut output, Some(&[true]))
            .await
            .is_err());
        assert!(alice
            .truncate_msb0(&config, &[1], &mut output)
            .await
            .is_err());

        assert_eq!(alice.channel().flushes(), 0);
    }

    #[rstest]
    #[case::exact(true)]
    #[case::faithful(false)]
    #[tokio::test]
    async fn test_truncate_msb_overrides_heuristic(
        truncators: (IdealTruncator, IdealTruncator),
        #[case] exact: bool,
    ) {
        let (mut alice, mut bob) = truncators;
        let mut rng = StdRng::seed_from_u64(0);
        let config = TruncConfig::builder()
            .bit_width(16)
            .shift(4)
            .signed(true)
            .exact(exact)
            .heuristic(true)
            .build()
            .unwrap();
        let ring = config.ring();
        let heuristic = MsbHeuristic::new(Role::Bob, &config);

        // Values the heuristic is not guaranteed to handle.
        let values: Vec<u64> = random_values(&mut rng, &ring, 512)
            .into_iter()
            .filter(|&x| !heuristic.covers(x))
            .collect();
        assert!(!values.is_empty());

        let output = truncate_shared(&mut alice, &mut bob, &config, &values, Variant::Msb, 1)
            .await
            .unwrap();

        for (x, y) in values.into_iter().zip(output) {
            if exact {
                assert_eq!(y, truncate_plain(&config, x), "x = {x}");
            } else {
                let expected = truncate_plain(&config, x);
                assert!(y == expected || y == ring.sub(expected, 1), "x = {x}");
            }
        }

        assert_eq!(alice.role(), Role::Alice);
        let (_, aux, _) = alice.into_inner();
        assert_eq!(aux.rounds(CallKind::MsbToWrap), 1);
        assert_eq!(
            aux.rounds(CallKind::Msb0ToWrap) + aux.rounds(CallKind::Msb1ToWrap),
            0
        );
    }

    /// Returns one wrap bit too many from `msb_to_wrap`.
    #[derive(Debug)]
    struct ExtraWrapBit(ideal::IdealConvert);

    #[async_trait]
    impl Convert for ExtraWrapBit {
        type Error = mpz_trunc_core::ideal::IdealAuxError;

        async fn b2a(&mut self, bits: &[bool], bit_width: u32) -> Result<Vec<u64>, Self::Error> {
            self.0.b2a(bits, bit_width).await
        }

        async fn msb_to_wrap(
            &mut self,
            shares: &[u64],
            msb: &[bool],
            bit_width: u32,
        ) -> Result<Vec<bool>, Self::Error> {
            let mut bits = self.0.msb_to_wrap(shares, msb, bit_width).await?;
            bits.push(false);
            Ok(bits)
        }

        async fn msb0_to_wrap(
            &mut self,
            shares: &[u64],
            bit_width: u32,
        ) -> Result<Vec<bool>, Self::Error> {
            self.0.msb0_to_wrap(shares, bit_width).await
        }

        async fn msb1_to_wrap(
            &mut self,
            shares: &[u64],
            bit_width: u32,
        ) -> Result<Vec<bool>, Self::Error> {
            self.0.msb1_to_wrap(shares, bit_width).await
        }
    }

    /// Drops the last bit of every comparison.
    #[derive(Debug)]
    struct ShortCompare(ideal::IdealCompare);

    #[async_trait]
    impl Compare for ShortCompare {
        type Error = mpz_trunc_core::ideal::IdealAuxError;

        async fn compare(
            &mut self,
            inputs: &[u64],
            bit_width: u32,
        ) -> Result<Vec<bool>, Self::Error> {
            let mut bits = self.0.compare(inputs, bit_width).await?;
            bits.pop();
            Ok(bits)
        }
    }

    #[tokio::test]
    async fn test_truncate_rejects_misaligned_wrap_bits() {
        let config = TruncConfig::new(16, 4, false).unwrap();
        let (alice_cmp, bob_cmp) = ideal::ideal_compare(0);
        let (alice_aux, bob_aux) = ideal::ideal_convert(1);

        let mut alice = Truncator::new(
            Role::Alice,
            ShortCompare(alice_cmp),
            ExtraWrapBit(alice_aux),
            ideal::IdealChannel::default(),
        );
        let mut bob = Truncator::new(
            Role::Bob,
            ShortCompare(bob_cmp),
            ExtraWrapBit(bob_aux),
            ideal::IdealChannel::default(),
        );

        // One extra wrap bit and one missing carry bit add up to the right
        // total, the wrap bits alone do not.
        let err = truncate_shared(&mut alice, &mut bob, &config, &[1, 2, 3], Variant::Msb, 0)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("expected 3 wrap bits, got 4"));

        assert_eq!(alice.channel().flushes(), 0);
        let (cmp, aux, _) = alice.into_inner();
        assert_eq!(cmp.0.rounds(), 0);
        assert_eq!(aux.0.rounds(CallKind::B2A), 0);
    }
}
