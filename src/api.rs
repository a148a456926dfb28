//! JSON shapes returned by the pool pricing service and their conversion into
//! codec values. Transport is left to the caller.

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::{
    datum::PoolDatum,
    error::{CodecError, Result},
    rational::Rational,
    reserves::{ReserveSnapshot, parse_amount, parse_quantity},
    token::AssetUnit,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T = ApiData> {
    pub code: i64,
    pub trace_id: String,
    pub message: String,
    pub data: T,
}

/// Pre/post pool outputs for one requested swap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiData {
    pub inputs: ApiInputs,
    pub outputs: ApiOutputs,
    #[serde(default)]
    pub withdrawal: Option<ApiWithdrawal>,
    #[serde(default)]
    pub reference_inputs: Vec<ApiReferenceInput>,
    #[serde(default)]
    pub smart_contract_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInputs {
    pub pool_in_utxo: ApiUtxo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOutputs {
    pub pool_out_utxo: ApiUtxo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReferenceInput {
    pub out_ref: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiWithdrawal {
    pub reward_address_script_hash: String,
    pub coin: String,
    pub stake_address: Option<String>,
    pub stake_rewards: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiAsset {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMultiAsset {
    pub policy_id: String,
    pub assets: Vec<ApiAsset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUtxo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_ref: Option<String>,
    pub address: String,
    pub coin: String,
    #[serde(default)]
    pub multi_assets: Vec<ApiMultiAsset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum: Option<ApiPoolDatum>,
}

impl ApiUtxo {
    /// Value held by this output.
    pub fn snapshot(&self) -> Result<ReserveSnapshot> {
        let mut snapshot =
            ReserveSnapshot::default().with(AssetUnit::Lovelace, parse_quantity(&self.coin)?);
        for group in &self.multi_assets {
            if group.policy_id == "ada" {
                continue;
            }
            for asset in &group.assets {
                let unit: AssetUnit = format!("{}{}", group.policy_id, asset.name).parse()?;
                snapshot = snapshot.with(unit, parse_quantity(&asset.value)?);
            }
        }
        Ok(snapshot)
    }

    pub fn pool_datum(&self) -> Result<PoolDatum> {
        self.datum
            .as_ref()
            .ok_or_else(|| CodecError::malformed("pool output carries no datum"))?
            .try_into()
    }
}

/// Pool datum as the service spells it: numbers as decimal strings and token
/// ids as `<policy>.<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPoolDatum {
    pub token_x: String,
    pub token_y: String,
    pub sqrt_lower_price_num: String,
    pub sqrt_lower_price_den: String,
    pub sqrt_upper_price_num: String,
    pub sqrt_upper_price_den: String,
    pub lp_fee_rate: u64,
    pub platform_fee_x: String,
    pub platform_fee_y: String,
    pub min_x_change: String,
    pub min_y_change: String,
    #[serde(rename = "circulatingLPToken")]
    pub circulating_lp_token: String,
    pub last_withdraw_epoch: u64,
}

impl TryFrom<&ApiPoolDatum> for PoolDatum {
    type Error = CodecError;

    fn try_from(api: &ApiPoolDatum) -> Result<Self> {
        Ok(PoolDatum {
            token_x: api.token_x.parse()?,
            token_y: api.token_y.parse()?,
            lp_fee_rate: api.lp_fee_rate.into(),
            platform_fee_x: parse_amount(&api.platform_fee_x)?,
            platform_fee_y: parse_amount(&api.platform_fee_y)?,
            sqrt_lower_price: Rational::new(
                parse_amount(&api.sqrt_lower_price_num)?,
                parse_amount(&api.sqrt_lower_price_den)?,
            )?,
            sqrt_upper_price: Rational::new(
                parse_amount(&api.sqrt_upper_price_num)?,
                parse_amount(&api.sqrt_upper_price_den)?,
            )?,
            min_x_change: parse_amount(&api.min_x_change)?,
            min_y_change: parse_amount(&api.min_y_change)?,
            circulating_lp_token: parse_amount(&api.circulating_lp_token)?,
            last_withdraw_epoch: api.last_withdraw_epoch.into(),
        })
    }
}

fn small(value: &BigInt) -> Result<u64> {
    value
        .to_u64()
        .ok_or_else(|| CodecError::InvalidAmount(value.to_string()))
}

impl TryFrom<&PoolDatum> for ApiPoolDatum {
    type Error = CodecError;

    fn try_from(datum: &PoolDatum) -> Result<Self> {
        Ok(ApiPoolDatum {
            token_x: datum.token_x.to_string(),
            token_y: datum.token_y.to_string(),
            sqrt_lower_price_num: datum.sqrt_lower_price.numerator().to_string(),
            sqrt_lower_price_den: datum.sqrt_lower_price.denominator().to_string(),
            sqrt_upper_price_num: datum.sqrt_upper_price.numerator().to_string(),
            sqrt_upper_price_den: datum.sqrt_upper_price.denominator().to_string(),
            lp_fee_rate: small(&datum.lp_fee_rate)?,
            platform_fee_x: datum.platform_fee_x.to_string(),
            platform_fee_y: datum.platform_fee_y.to_string(),
            min_x_change: datum.min_x_change.to_string(),
            min_y_change: datum.min_y_change.to_string(),
            circulating_lp_token: datum.circulating_lp_token.to_string(),
            last_withdraw_epoch: small(&datum.last_withdraw_epoch)?,
        })
    }
}

/// One entry of the pool listing endpoint. The listing names the pool assets
/// A and B; they are the datum's X and Y.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConcentratedPool {
    pub out_ref: String,
    pub address: String,
    pub coin: String,
    #[serde(default)]
    pub multi_assets: Vec<ApiMultiAsset>,
    pub validity_nft: String,
    pub token_a: String,
    pub token_a_reserve: String,
    pub token_b: String,
    pub token_b_reserve: String,
    pub lp_fee_rate: u64,
    pub price_lower_num: String,
    pub price_lower_den: String,
    pub price_upper_num: String,
    pub price_upper_den: String,
    pub platform_fee_a: String,
    pub platform_fee_b: String,
    pub min_a_change: String,
    pub min_b_change: String,
    pub lp_token_total_supply: String,
    pub last_withdraw_epoch: u64,
}

impl ApiConcentratedPool {
    pub fn to_utxo(&self) -> ApiUtxo {
        ApiUtxo {
            out_ref: Some(self.out_ref.clone()),
            address: self.address.clone(),
            coin: self.coin.clone(),
            multi_assets: self.multi_assets.clone(),
            datum: Some(ApiPoolDatum {
                token_x: self.token_a.clone(),
                token_y: self.token_b.clone(),
                sqrt_lower_price_num: self.price_lower_num.clone(),
                sqrt_lower_price_den: self.price_lower_den.clone(),
                sqrt_upper_price_num: self.price_upper_num.clone(),
                sqrt_upper_price_den: self.price_upper_den.clone(),
                lp_fee_rate: self.lp_fee_rate,
                platform_fee_x: self.platform_fee_a.clone(),
                platform_fee_y: self.platform_fee_b.clone(),
                min_x_change: self.min_a_change.clone(),
                min_y_change: self.min_b_change.clone(),
                circulating_lp_token: self.lp_token_total_supply.clone(),
                last_withdraw_epoch: self.last_withdraw_epoch,
            }),
        }
    }
}

/// Groups the native assets of a snapshot by policy, the way the service
/// lists them.
pub fn multi_assets(snapshot: &ReserveSnapshot) -> Vec<ApiMultiAsset> {
    let mut groups: Vec<ApiMultiAsset> = Vec::new();
    for (unit, quantity) in snapshot.iter() {
        let (Some(policy), Some(name)) = (unit.policy_id(), unit.asset_name()) else {
            continue;
        };
        let policy_id = hex::encode(policy);
        let asset = ApiAsset {
            name: hex::encode(name),
            value: quantity.to_string(),
        };
        match groups.last_mut() {
            Some(group) if group.policy_id == policy_id => group.assets.push(asset),
            _ => groups.push(ApiMultiAsset {
                policy_id,
                assets: vec![asset],
            }),
        }
    }
    groups
}

/// Lovelace held by a snapshot, as the service's `coin` string.
pub fn coin(snapshot: &ReserveSnapshot) -> String {
    snapshot.quantity(&AssetUnit::Lovelace).to_string()
}
