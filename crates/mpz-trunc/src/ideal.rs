//! Ideal functionalities.

use std::sync::Arc;

use async_trait::async_trait;
use mpz_trunc_core::{
    ideal::{Call, CallKind, IdealAux, IdealAuxError, Reply},
    Role,
};
use tokio::sync::Barrier;

use crate::{Channel, Compare, Convert, Truncator};

/// Truncator using ideal functionalities.
pub type IdealTruncator = Truncator<IdealCompare, IdealConvert, IdealChannel>;

/// Creates a pair of truncators using ideal functionalities, for Alice and Bob.
pub fn ideal_truncators(seed: u64) -> (IdealTruncator, IdealTruncator) {
    let (alice_cmp, bob_cmp) = ideal_compare(seed);
    let (alice_aux, bob_aux) = ideal_convert(seed.wrapping_add(1));

    (
        Truncator::new(Role::Alice, alice_cmp, alice_aux, IdealChannel::default()),
        Truncator::new(Role::Bob, bob_cmp, bob_aux, IdealChannel::default()),
    )
}

/// Creates a pair of ideal comparison functionalities, for Alice and Bob.
pub fn ideal_compare(seed: u64) -> (IdealCompare, IdealCompare) {
    let (alice, bob) = ideal_pair(seed);
    (IdealCompare(alice), IdealCompare(bob))
}

/// Creates a pair of ideal conversion functionalities, for Alice and Bob.
pub fn ideal_convert(seed: u64) -> (IdealConvert, IdealConvert) {
    let (alice, bob) = ideal_pair(seed);
    (IdealConvert(alice), IdealConvert(bob))
}

fn ideal_pair(seed: u64) -> (Party, Party) {
    let core = IdealAux::new(seed);
    let (alice_sync, bob_sync) = flush_sync();

    (
        Party {
            role: Role::Alice,
            core: core.clone(),
            sync: alice_sync,
        },
        Party {
            role: Role::Bob,
            core,
            sync: bob_sync,
        },
    )
}

#[derive(Debug)]
struct Party {
    role: Role,
    core: IdealAux,
    sync: FlushSync,
}

impl Party {
    async fn call(&mut self, call: Call) -> Result<Reply, IdealAuxError> {
        self.core.queue(self.role, call)?;
        self.sync.flush(&mut self.core).await?;
        self.core.take(self.role)
    }
}

/// Ideal comparison functionality.
#[derive(Debug)]
pub struct IdealCompare(Party);

impl IdealCompare {
    /// Returns the number of comparisons run by the pair.
    pub fn rounds(&self) -> usize {
        self.0.core.rounds(CallKind::Compare)
    }
}

#[async_trait]
impl Compare for IdealCompare {
    type Error = IdealAuxError;

    async fn compare(&mut self, inputs: &[u64], bit_width: u32) -> Result<Vec<bool>, Self::Error> {
        self.0
            .call(Call::Compare {
                inputs: inputs.to_vec(),
                bit_width,
            })
            .await?
            .into_bits()
    }
}

/// Ideal auxiliary conversion functionality.
#[derive(Debug)]
pub struct IdealConvert(Party);

impl IdealConvert {
    /// Returns the number of calls of the given kind run by the pair.
    pub fn rounds(&self, kind: CallKind) -> usize {
        self.0.core.rounds(kind)
    }
}

#[async_trait]
impl Convert for IdealConvert {
    type Error = IdealAuxError;

    async fn b2a(&mut self, bits: &[bool], bit_width: u32) -> Result<Vec<u64>, Self::Error> {
        self.0
            .call(Call::B2A {
                bits: bits.to_vec(),
                bit_width,
            })
            .await?
            .into_arith()
    }

    async fn msb_to_wrap(
        &mut self,
        shares: &[u64],
        msb: &[bool],
        bit_width: u32,
    ) -> Result<Vec<bool>, Self::Error> {
        self.0
            .call(Call::MsbToWrap {
                shares: shares.to_vec(),
                msb: msb.to_vec(),
                bit_width,
            })
            .await?
            .into_bits()
    }

    async fn msb0_to_wrap(
        &mut self,
        shares: &[u64],
        bit_width: u32,
    ) -> Result<Vec<bool>, Self::Error> {
        self.0
            .call(Call::Msb0ToWrap {
                shares: shares.to_vec(),
                bit_width,
            })
            .await?
            .into_bits()
    }

    async fn msb1_to_wrap(
        &mut self,
        shares: &[u64],
        bit_width: u32,
    ) -> Result<Vec<bool>, Self::Error> {
        self.0
            .call(Call::Msb1ToWrap {
                shares: shares.to_vec(),
                bit_width,
            })
            .await?
            .into_bits()
    }
}

/// Ideal channel.
///
/// Nothing is sent over it, it only counts flushes.
#[derive(Debug, Default)]
pub struct IdealChannel {
    flushes: usize,
}

impl IdealChannel {
    /// Returns the number of flushes.
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

#[async_trait]
impl Channel for IdealChannel {
    type Error = std::convert::Infallible;

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.flushes += 1;
        Ok(())
    }

    fn bytes_transferred(&self) -> u64 {
        0
    }
}

fn flush_sync() -> (FlushSync, FlushSync) {
    let barrier = Arc::new(Barrier::new(2));
    (
        FlushSync {
            barrier: Arc::clone(&barrier),
        },
        FlushSync { barrier },
    )
}

/// Flushes the [`IdealAux`] shared by a pair of parties.
///
/// Each party queues its call and then waits here. Once both calls are queued
/// the leader flushes, and neither party takes its reply before the flush is
/// done.
#[derive(Debug)]
struct FlushSync {
    barrier: Arc<Barrier>,
}

impl FlushSync {
    async fn flush(&mut self, core: &mut IdealAux) -> Result<(), IdealAuxError> {
        let res = if self.barrier.wait().await.is_leader() {
            core.flush()
        } else {
            Ok(())
        };

        self.barrier.wait().await;

        res
    }
}
