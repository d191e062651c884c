//! Ideal comparison and wrap conversion functionality.
//!
//! The ideal functionality sees the inputs of both parties, computes the result
//! in the clear and hands out fresh random shares of it. It is only suitable
//! for testing.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use rand::Rng;
use rand_chacha::{rand_core::SeedableRng, ChaCha12Rng};

use crate::{Ring, Role};

type Error = IdealAuxError;
type Result<T, E = Error> = core::result::Result<T, E>;

/// A call made by one party to the ideal functionality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// Shares of `alice_input > bob_input`.
    Compare {
        /// Comparison inputs.
        inputs: Vec<u64>,
        /// Bit width of the inputs.
        bit_width: u32,
    },
    /// Boolean to arithmetic share conversion.
    B2A {
        /// Boolean shares.
        bits: Vec<bool>,
        /// Bit width of the arithmetic shares.
        bit_width: u32,
    },
    /// Wrap of the shares, given shares of the MSB of their sum.
    MsbToWrap {
        /// Arithmetic shares.
        shares: Vec<u64>,
        /// Boolean shares of the MSB.
        msb: Vec<bool>,
        /// Bit width of the ring.
        bit_width: u32,
    },
    /// Wrap of the shares, the MSB of their sum is 0.
    Msb0ToWrap {
        /// Arithmetic shares.
        shares: Vec<u64>,
        /// Bit width of the ring.
        bit_width: u32,
    },
    /// Wrap of the shares, the MSB of their sum is 1.
    Msb1ToWrap {
        /// Arithmetic shares.
        shares: Vec<u64>,
        /// Bit width of the ring.
        bit_width: u32,
    },
}

impl Call {
    /// Returns the kind of the call.
    pub fn kind(&self) -> CallKind {
        match self {
            Call::Compare { .. } => CallKind::Compare,
            Call::B2A { .. } => CallKind::B2A,
            Call::MsbToWrap { .. } => CallKind::MsbToWrap,
            Call::Msb0ToWrap { .. } => CallKind::Msb0ToWrap,
            Call::Msb1ToWrap { .. } => CallKind::Msb1ToWrap,
        }
    }

    fn len(&self) -> usize {
        match self {
            Call::Compare { inputs, .. } => inputs.len(),
            Call::B2A { bits, .. } => bits.len(),
            Call::MsbToWrap { shares, .. }
            | Call::Msb0ToWrap { shares, .. }
            | Call::Msb1ToWrap { shares, .. } => shares.len(),
        }
    }

    fn bit_width(&self) -> u32 {
        match self {
            Call::Compare { bit_width, .. }
            | Call::B2A { bit_width, .. }
            | Call::MsbToWrap { bit_width, .. }
            | Call::Msb0ToWrap { bit_width, .. }
            | Call::Msb1ToWrap { bit_width, .. } => *bit_width,
        }
    }
}

/// Kind of a [`Call`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum CallKind {
    Compare,
    B2A,
    MsbToWrap,
    Msb0ToWrap,
    Msb1ToWrap,
}

/// Output of a call for one party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Boolean shares.
    Bits(Vec<bool>),
    /// Arithmetic shares.
    Arith(Vec<u64>),
}

impl Reply {
    /// Returns the boolean shares.
    pub fn into_bits(self) -> Result<Vec<bool>> {
        match self {
            Reply::Bits(bits) => Ok(bits),
            Reply::Arith(_) => Err(Error::new("expected boolean shares")),
        }
    }

    /// Returns the arithmetic shares.
    pub fn into_arith(self) -> Result<Vec<u64>> {
        match self {
            Reply::Arith(shares) => Ok(shares),
            Reply::Bits(_) => Err(Error::new("expected arithmetic shares")),
        }
    }
}

/// Ideal comparison and wrap conversion functionality.
///
/// Both parties hold a clone. Each party queues one call, once both calls are
/// queued the functionality can be flushed and each party takes its reply.
#[derive(Debug, Clone)]
pub struct IdealAux {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug)]
struct Inner {
    rng: ChaCha12Rng,
    alice_call: Option<Call>,
    bob_call: Option<Call>,
    alice_reply: Option<Reply>,
    bob_reply: Option<Reply>,
    rounds: HashMap<CallKind, usize>,
}

impl IdealAux {
    /// Creates a new ideal functionality.
    ///
    /// # Arguments
    ///
    /// * `seed` - Seed of the randomness used for the output shares.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                rng: ChaCha12Rng::seed_from_u64(seed),
                alice_call: None,
                bob_call: None,
                alice_reply: None,
                bob_reply: None,
                rounds: HashMap::new(),
            })),
        }
    }

    /// Queues a call of a party.
    pub fn queue(&mut self, role: Role, call: Call) -> Result<()> {
        let mut this = self.inner.lock().unwrap();
        let slot = match role {
            Role::Alice => &mut this.alice_call,
            Role::Bob => &mut this.bob_call,
        };

        if slot.is_some() {
            return Err(Error::new(format!("{role} already has a queued call")));
        }

        *slot = Some(call);

        Ok(())
    }

    /// Returns `true` if the functionality wants to flush.
    pub fn wants_flush(&self) -> bool {
        let this = self.inner.lock().unwrap();
        this.alice_call.is_some() && this.bob_call.is_some()
    }

    /// Flushes the functionality.
    pub fn flush(&mut self) -> Result<()> {
        let mut this = self.inner.lock().unwrap();
        this.flush()
    }

    /// Takes the reply of a party.
    pub fn take(&mut self, role: Role) -> Result<Reply> {
        let mut this = self.inner.lock().unwrap();
        match role {
            Role::Alice => this.alice_reply.take(),
            Role::Bob => this.bob_reply.take(),
        }
        .ok_or_else(|| Error::new(format!("no reply for {role}")))
    }

    /// Returns the number of completed rounds of the given kind.
    pub fn rounds(&self, kind: CallKind) -> usize {
        let this = self.inner.lock().unwrap();
        this.rounds.get(&kind).copied().unwrap_or_default()
    }

    /// Executes a call for both parties.
    pub fn call(&mut self, alice: Call, bob: Call) -> Result<(Reply, Reply)> {
        self.queue(Role::Alice, alice)?;
        self.queue(Role::Bob, bob)?;
        self.flush()?;

        Ok((self.take(Role::Alice)?, self.take(Role::Bob)?))
    }
}

impl Inner {
    fn flush(&mut self) -> Result<()> {
        let (alice, bob) = match (self.alice_call.take(), self.bob_call.take()) {
            (Some(alice), Some(bob)) => (alice, bob),
            (alice, bob) => {
                self.alice_call = alice;
                self.bob_call = bob;
                return Err(Error::new("not ready to flush"));
            }
        };

        if alice.kind() != bob.kind() {
            return Err(Error::new(format!(
                "call mismatch: alice={:?}, bob={:?}",
                alice.kind(),
                bob.kind()
            )));
        } else if alice.len() != bob.len() {
            return Err(Error::new(format!(
                "length mismatch: alice={}, bob={}",
                alice.len(),
                bob.len()
            )));
        } else if alice.bit_width() != bob.bit_width() {
            return Err(Error::new(format!(
                "bit width mismatch: alice={}, bob={}",
                alice.bit_width(),
                bob.bit_width()
            )));
        }

        let kind = alice.kind();
        let ring = Ring::new(alice.bit_width()).map_err(|err| Error::new(err.to_string()))?;

        let (alice_reply, bob_reply) = match (alice, bob) {
            (Call::Compare { inputs: a, .. }, Call::Compare { inputs: b, .. }) => {
                let bits = a
                    .iter()
                    .zip(&b)
                    .map(|(&a, &b)| ring.reduce(a) > ring.reduce(b))
                    .collect();
                self.share_bits(bits)
            }
            (Call::B2A { bits: a, .. }, Call::B2A { bits: b, .. }) => {
                let values = a.iter().zip(&b).map(|(&a, &b)| (a ^ b) as u64).collect();
                self.share_arith(&ring, values)
            }
            (
                Call::MsbToWrap {
                    shares: a, msb: ma, ..
                },
                Call::MsbToWrap {
                    shares: b, msb: mb, ..
                },
            ) => {
                let msb: Vec<bool> = ma.iter().zip(&mb).map(|(&a, &b)| a ^ b).collect();
                let bits = wrap_bits(&ring, &a, &b, |i| msb[i]);
                self.share_bits(bits)
            }
            (Call::Msb0ToWrap { shares: a, .. }, Call::Msb0ToWrap { shares: b, .. }) => {
                let bits = wrap_bits(&ring, &a, &b, |_| false);
                self.share_bits(bits)
            }
            (Call::Msb1ToWrap { shares: a, .. }, Call::Msb1ToWrap { shares: b, .. }) => {
                let bits = wrap_bits(&ring, &a, &b, |_| true);
                self.share_bits(bits)
            }
            _ => return Err(Error::new("call mismatch")),
        };

        self.alice_reply = Some(alice_reply);
        self.bob_reply = Some(bob_reply);
        *self.rounds.entry(kind).or_default() += 1;

        Ok(())
    }

    fn share_bits(&mut self, bits: Vec<bool>) -> (Reply, Reply) {
        let (alice, bob) = bits
            .into_iter()
            .map(|bit| {
                let mask: bool = self.rng.gen();
                (mask, bit ^ mask)
            })
            .unzip();

        (Reply::Bits(alice), Reply::Bits(bob))
    }

    fn share_arith(&mut self, ring: &Ring, values: Vec<u64>) -> (Reply, Reply) {
        let (alice, bob) = values
            .into_iter()
            .map(|value| {
                let mask = ring.reduce(self.rng.gen());
                (mask, ring.sub(value, mask))
            })
            .unzip();

        (Reply::Arith(alice), Reply::Arith(bob))
    }
}

/// Computes the wrap of each pair of shares from the MSBs of the shares and
/// the MSB of their sum.
///
/// This is how a real protocol derives the wrap, so an incorrect MSB yields an
/// incorrect wrap.
fn wrap_bits(ring: &Ring, a: &[u64], b: &[u64], msb: impl Fn(usize) -> bool) -> Vec<bool> {
    a.iter()
        .zip(b)
        .enumerate()
        .map(|(i, (&a, &b))| {
            let (msb_a, msb_b) = (ring.msb(a), ring.msb(b));
            (msb_a && msb_b) || ((msb_a ^ msb_b) && !msb(i))
        })
        .collect()
}

/// Error for [`IdealAux`].
#[derive(Debug, thiserror::Error)]
#[error("ideal aux error: {0}")]
pub struct IdealAuxError(String);

impl IdealAuxError {
    fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}
