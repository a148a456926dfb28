use std::path::PathBuf;

use anyhow::{Result, anyhow};
use num_bigint::{BigInt, BigUint};

use crate::{pool::DEFAULT_POOL_SCRIPT_HASH, token::POLICY_ID_BYTES};

pub type ScriptHash = [u8; POLICY_ID_BYTES];

#[derive(clap::Parser, Debug)]
#[command(version, about = "Pool datum and swap redeemer codec")]
pub struct Args {
    /// Policy id of the pool validity NFTs.
    #[arg(
        long,
        env = "CLMM_POOL_SCRIPT_HASH",
        default_value = DEFAULT_POOL_SCRIPT_HASH,
        value_parser = parse_script_hash
    )]
    pub pool_script_hash: ScriptHash,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, env = "CLMM_LOG", default_value = "info")]
    pub log: String,

    #[command(subcommand)]
    pub command: Commands,
}

pub fn parse_script_hash(raw: &str) -> Result<ScriptHash> {
    let bytes = hex::decode(raw)?;

    bytes.try_into().map_err(|b: Vec<u8>| {
        anyhow!(
            "Expected length {} for script hash, but got {}",
            POLICY_ID_BYTES,
            b.len()
        )
    })
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Decode a hex pool datum and print it as JSON.
    DecodeDatum { datum: String },

    /// Encode a JSON pool datum (pricing service shape) to hex.
    EncodeDatum {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Build the swap redeemer for a resolved pool input index.
    SwapRedeemer {
        #[arg(short, long)]
        pool_in_index: u64,

        #[arg(short, long, allow_hyphen_values = true)]
        delta_amount: BigInt,
    },

    /// Output amount between two JSON reserve snapshots.
    Reconcile {
        #[arg(long)]
        pre: PathBuf,

        #[arg(long)]
        post: PathBuf,

        #[arg(long, default_value = "")]
        token_x: String,

        #[arg(long)]
        token_y: String,
    },

    /// Quote or prepare a swap from recorded pricing responses.
    Quote {
        #[arg(long, env = "CLMM_RESPONSES_DIR")]
        responses: PathBuf,

        #[arg(long)]
        pool_id: String,

        #[arg(short, long, allow_hyphen_values = true)]
        delta_amount: BigInt,

        /// Enforce a minimum output and print the prepared swap.
        #[arg(long)]
        min_output: Option<BigUint>,
    },

    /// List the pools created by a transaction's outputs (JSON file).
    ScanPools {
        #[arg(long)]
        tx_id: String,

        #[arg(long)]
        outputs: PathBuf,
    },
}
