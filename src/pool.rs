use num_bigint::BigUint;
use num_traits::One;
use serde::Deserialize;
use tracing::debug;

use crate::{
    api::{self, ApiConcentratedPool},
    datum::{PoolDatum, decode_datum},
    error::{CodecError, Result},
    reserves::ReserveSnapshot,
    token::{AssetUnit, POLICY_ID_BYTES},
};

/// Policy of the pool validity NFTs on mainnet.
pub const DEFAULT_POOL_SCRIPT_HASH: &str = "273a576a5de694ff507765c57b47efdc81ea7f13a43dc4441644fab0";

/// A transaction output as seen by the pool scanner.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolOutput {
    pub address: String,
    pub value: ReserveSnapshot,
    /// Inline datum, hex encoded.
    #[serde(default)]
    pub datum: Option<String>,
}

/// A live pool: its output, validity NFT, decoded datum and reserves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcentratedPool {
    pub out_ref: String,
    pub address: String,
    pub validity_nft: AssetUnit,
    pub value: ReserveSnapshot,
    pub datum: PoolDatum,
}

impl ConcentratedPool {
    pub fn reserve_x(&self) -> BigUint {
        self.value.quantity_of(&self.datum.token_x)
    }

    pub fn reserve_y(&self) -> BigUint {
        self.value.quantity_of(&self.datum.token_y)
    }

    /// The pool in the shape of the listing endpoint.
    pub fn to_api(&self) -> Result<ApiConcentratedPool> {
        let datum = api::ApiPoolDatum::try_from(&self.datum)?;
        Ok(ApiConcentratedPool {
            out_ref: self.out_ref.clone(),
            address: self.address.clone(),
            coin: api::coin(&self.value),
            multi_assets: api::multi_assets(&self.value),
            validity_nft: self.validity_nft.to_string(),
            token_a: datum.token_x,
            token_a_reserve: self.reserve_x().to_string(),
            token_b: datum.token_y,
            token_b_reserve: self.reserve_y().to_string(),
            lp_fee_rate: datum.lp_fee_rate,
            price_lower_num: datum.sqrt_lower_price_num,
            price_lower_den: datum.sqrt_lower_price_den,
            price_upper_num: datum.sqrt_upper_price_num,
            price_upper_den: datum.sqrt_upper_price_den,
            platform_fee_a: datum.platform_fee_x,
            platform_fee_b: datum.platform_fee_y,
            min_a_change: datum.min_x_change,
            min_b_change: datum.min_y_change,
            lp_token_total_supply: datum.circulating_lp_token,
            last_withdraw_epoch: datum.last_withdraw_epoch,
        })
    }
}

/// Finds the pools created by a transaction's outputs.
///
/// An output is a pool when it carries a datum and holds a single unit of a
/// token under the pool script policy; each such token is a validity NFT.
pub fn find_pools(
    tx_id: &str,
    outputs: &[PoolOutput],
    pool_script_hash: &[u8],
) -> Result<Vec<ConcentratedPool>> {
    if pool_script_hash.len() != POLICY_ID_BYTES {
        return Err(CodecError::InvalidTokenId(hex::encode(pool_script_hash)));
    }

    let mut pools = vec![];
    for (index, output) in outputs.iter().enumerate() {
        let Some(datum_hex) = &output.datum else {
            continue;
        };
        let nfts: Vec<AssetUnit> = output
            .value
            .iter()
            .filter(|(unit, qty)| unit.policy_id() == Some(pool_script_hash) && qty.is_one())
            .map(|(unit, _)| unit.clone())
            .collect();
        if nfts.is_empty() {
            continue;
        }

        let datum = decode_datum(datum_hex)?;
        for validity_nft in nfts {
            let out_ref = format!("{tx_id}#{index}");
            debug!(%out_ref, %validity_nft, "found pool output");
            pools.push(ConcentratedPool {
                out_ref,
                address: output.address.clone(),
                validity_nft,
                value: output.value.clone(),
                datum: datum.clone(),
            });
        }
    }
    Ok(pools)
}
