use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser as _;
use clmm_pool_codec::{
    api::ApiPoolDatum,
    config::{Args, Commands},
    datum::{PoolDatum, decode_datum, encode_datum},
    pool::{PoolOutput, find_pools},
    quote::{JsonFileSource, calculate_swap_out, prepare_swap},
    redeemer::build_swap_redeemer,
    reserves::{ReserveSnapshot, reconcile},
    token::TokenId,
};
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

async fn run(args: Args) -> Result<()> {
    match args.command {
        Commands::DecodeDatum { datum } => {
            let decoded = decode_datum(&datum)?;
            let json = serde_json::json!({
                "datum": ApiPoolDatum::try_from(&decoded)?,
                "datumHash": decoded.hash().to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Commands::EncodeDatum { file } => {
            let api: ApiPoolDatum = read_json(&file)?;
            println!("{}", encode_datum(&PoolDatum::try_from(&api)?));
        }
        Commands::SwapRedeemer {
            pool_in_index,
            delta_amount,
        } => {
            println!("{}", build_swap_redeemer(pool_in_index, &delta_amount)?);
        }
        Commands::Reconcile {
            pre,
            post,
            token_x,
            token_y,
        } => {
            let pre: ReserveSnapshot = read_json(&pre)?;
            let post: ReserveSnapshot = read_json(&post)?;
            let token_x: TokenId = token_x.parse()?;
            let token_y: TokenId = token_y.parse()?;
            println!("{}", reconcile(&pre, &post, &token_x, &token_y)?);
        }
        Commands::Quote {
            responses,
            pool_id,
            delta_amount,
            min_output,
        } => {
            let source = JsonFileSource::new(responses);
            match min_output {
                None => {
                    let out = calculate_swap_out(&source, &pool_id, &delta_amount).await?;
                    println!("{out}");
                }
                Some(min_output) => {
                    let prepared =
                        prepare_swap(&source, &pool_id, &delta_amount, &min_output).await?;
                    let json = serde_json::json!({
                        "expectedOutput": prepared.expected_output.to_string(),
                        "poolOutAddress": prepared.pool_out_address,
                        "poolOutValue": prepared.pool_out_value,
                        "poolOutDatum": prepared.pool_out_datum,
                        // index 0 stands in until the builder orders inputs
                        "redeemerAtIndex0": prepared.redeemer.make_redeemer(&[0])?,
                    });
                    println!("{}", serde_json::to_string_pretty(&json)?);
                }
            }
        }
        Commands::ScanPools { tx_id, outputs } => {
            let outputs: Vec<PoolOutput> = read_json(&outputs)?;
            let listing = find_pools(&tx_id, &outputs, &args.pool_script_hash)?
                .iter()
                .map(|pool| pool.to_api())
                .collect::<Result<Vec<_>, _>>()?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    run(args).await
}
