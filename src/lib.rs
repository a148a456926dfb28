//! Off-chain codec for a concentrated-liquidity pool on Cardano.
//!
//! - [`datum`]: the pool datum and its canonical Plutus Data encoding.
//! - [`packer`] and [`redeemer`]: the fixed-width swap action redeemer.
//! - [`reserves`]: reserve snapshots and swap output reconciliation.
//! - [`api`], [`pool`] and [`quote`]: glue for pricing responses and pool outputs.
//!
//! ```
//! use clmm_pool_codec::{redeemer::build_swap_redeemer, num_bigint::BigInt};
//!
//! let redeemer = build_swap_redeemer(2, &BigInt::from(1_000_000)).unwrap();
//! assert!(redeemer.starts_with("582402030200"));
//! ```

pub mod api;
pub mod config;
pub mod datum;
pub mod error;
pub mod packer;
pub mod plutus;
pub mod pool;
pub mod quote;
pub mod rational;
pub mod redeemer;
pub mod reserves;
pub mod token;

pub use num_bigint;

pub use datum::{PoolDatum, decode_datum, encode_datum};
pub use error::{CodecError, Result};
pub use rational::Rational;
pub use redeemer::{SwapRedeemer, build_swap_redeemer};
pub use reserves::{ReserveSnapshot, reconcile};
pub use token::{AssetUnit, TokenId, parse_token_id};
