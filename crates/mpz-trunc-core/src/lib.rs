//! Core library for two-party truncation of additively shared ring elements.
//!
//! Two parties, Alice and Bob, hold shares `a` and `b` of a secret
//! `x = a + b mod 2^bw`. Truncation produces shares of `x >> shift` (rounding
//! toward negative infinity, for unsigned or two's complement signed `x`)
//! without revealing `x`. Shifting each share locally is almost right, the
//! local result only has to be corrected by `2^(bw - shift)` whenever the two
//! shares wrap around the ring when added over the integers.
//!
//! This crate contains the synchronous, communication-free parts of the
//! protocol: ring arithmetic, the role-dependent orientation of the local shares
//! and the final correction. The wrap bits themselves are computed by external
//! comparison and conversion functionalities, see the `mpz-trunc` crate for the
//! protocol which drives them.
//!
//! # ⚠️ Warning ⚠️
//!
//! The local operations here assume that both parties run the exact same
//! sequence of steps with the same configuration. Mixing configurations between
//! the parties silently produces garbage shares.

#![deny(missing_docs, unreachable_pub, unused_must_use)]
#![deny(unsafe_code)]
#![deny(clippy::all)]

mod config;
mod heuristic;
#[cfg(any(test, feature = "test-utils"))]
pub mod ideal;
mod ring;
mod role;
mod shares;

pub use config::{
    ConfigError, TruncConfig, TruncConfigBuilder, TruncConfigBuilderError,
    DEFAULT_HEURISTIC_MARGIN,
};
pub use heuristic::MsbHeuristic;
pub use ring::{mask, Ring, RingError};
pub use role::Role;
pub use shares::{LocalShares, ShareError};
