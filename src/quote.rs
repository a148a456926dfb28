use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use num_bigint::{BigInt, BigUint};
use tracing::{debug, info};

use crate::{
    api::{ApiData, ApiResponse},
    datum::{PoolDatum, encode_datum},
    error::CodecError,
    redeemer::SwapRedeemer,
    reserves::{ReserveSnapshot, SwapDirection, enforce_min_output, reconcile},
};

/// Pool output after the swap, as proposed by the pricing service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolState {
    pub address: String,
    pub value: ReserveSnapshot,
    pub datum: PoolDatum,
}

/// Pool value before the swap and the pool output after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapParameters {
    pub pool_in: ReserveSnapshot,
    pub pool_out: PoolState,
}

impl TryFrom<&ApiData> for SwapParameters {
    type Error = CodecError;

    fn try_from(data: &ApiData) -> Result<Self, CodecError> {
        let pool_out = &data.outputs.pool_out_utxo;
        Ok(SwapParameters {
            pool_in: data.inputs.pool_in_utxo.snapshot()?,
            pool_out: PoolState {
                address: pool_out.address.clone(),
                value: pool_out.snapshot()?,
                datum: pool_out.pool_datum()?,
            },
        })
    }
}

/// Supplies pre/post pool snapshots for a requested trade.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn swap_parameters(&self, pool_id: &str, delta_amount: &BigInt) -> Result<SwapParameters>;
}

/// Reads recorded pricing responses from `<dir>/<pool_id>.json`.
pub struct JsonFileSource {
    dir: PathBuf,
}

impl JsonFileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SnapshotSource for JsonFileSource {
    async fn swap_parameters(&self, pool_id: &str, _delta_amount: &BigInt) -> Result<SwapParameters> {
        let path = self.dir.join(format!("{pool_id}.json"));
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let response: ApiResponse = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(SwapParameters::try_from(&response.data)?)
    }
}

/// Amount the pool would pay out for `delta_amount`, without building anything.
///
/// A positive delta sells X for Y, a negative one sells Y for X.
pub async fn calculate_swap_out<S>(source: &S, pool_id: &str, delta_amount: &BigInt) -> Result<BigInt>
where
    S: SnapshotSource + ?Sized,
{
    let params = source
        .swap_parameters(pool_id, delta_amount)
        .await
        .context("Could not calculate the swap output amount")?;
    let datum = &params.pool_out.datum;
    let out = reconcile(
        &params.pool_in,
        &params.pool_out.value,
        &datum.token_x,
        &datum.token_y,
    )?;
    info!(pool_id, %delta_amount, %out, "quoted swap");
    Ok(out)
}

/// Quotes several trades concurrently; results keep the request order.
pub async fn quote_many<S>(source: &S, requests: &[(String, BigInt)]) -> Vec<Result<BigInt>>
where
    S: SnapshotSource + ?Sized,
{
    join_all(
        requests
            .iter()
            .map(|(pool_id, delta)| calculate_swap_out(source, pool_id, delta)),
    )
    .await
}

/// Everything the transaction builder needs for the pool side of a swap.
#[derive(Debug, Clone)]
pub struct PreparedSwap {
    pub direction: SwapDirection,
    pub pool_out_address: String,
    pub pool_out_value: ReserveSnapshot,
    pub pool_out_datum: String,
    pub redeemer: SwapRedeemer,
    pub expected_output: BigInt,
}

/// Fetches swap parameters, enforces the caller's minimum output and
/// produces the new pool datum and the deferred swap redeemer.
pub async fn prepare_swap<S>(
    source: &S,
    pool_id: &str,
    delta_amount: &BigInt,
    min_output: &BigUint,
) -> Result<PreparedSwap>
where
    S: SnapshotSource + ?Sized,
{
    let direction = SwapDirection::from_delta(delta_amount)?;
    let params = source.swap_parameters(pool_id, delta_amount).await?;
    let pool_out = params.pool_out;

    let expected_output = enforce_min_output(
        &params.pool_in,
        &pool_out.value,
        &pool_out.datum,
        direction,
        min_output,
    )?;
    let pool_out_datum = encode_datum(&pool_out.datum);
    debug!(pool_id, ?direction, %expected_output, "prepared swap");

    Ok(PreparedSwap {
        direction,
        pool_out_address: pool_out.address,
        pool_out_value: pool_out.value,
        pool_out_datum,
        redeemer: SwapRedeemer::single(delta_amount.clone()),
        expected_output,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{datum::tests::sample_datum, redeemer::SwapAction, token::AssetUnit};

    struct FixedSource {
        pools: HashMap<String, SwapParameters>,
    }

    #[async_trait]
    impl SnapshotSource for FixedSource {
        async fn swap_parameters(&self, pool_id: &str, _: &BigInt) -> Result<SwapParameters> {
            self.pools
                .get(pool_id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("unknown pool {pool_id}"))
        }
    }

    fn source() -> FixedSource {
        let datum = sample_datum();
        let value = |x: u64, y: u64| {
            ReserveSnapshot::default()
                .with(AssetUnit::Lovelace, x)
                .with(datum.token_y.unit(), y)
        };
        let pools = HashMap::from([
            (
                "sell-x".to_string(),
                SwapParameters {
                    pool_in: value(100, 50),
                    pool_out: PoolState {
                        address: "addr_pool".into(),
                        value: value(110, 40),
                        datum: datum.clone(),
                    },
                },
            ),
            (
                "no-op".to_string(),
                SwapParameters {
                    pool_in: value(100, 50),
                    pool_out: PoolState {
                        address: "addr_pool".into(),
                        value: value(100, 50),
                        datum: datum.clone(),
                    },
                },
            ),
        ]);
        FixedSource { pools }
    }

    #[tokio::test]
    async fn quotes_output() {
        let out = calculate_swap_out(&source(), "sell-x", &BigInt::from(10))
            .await
            .unwrap();
        assert_eq!(out, BigInt::from(10));
    }

    #[tokio::test]
    async fn quote_surfaces_anomalies() {
        let err = calculate_swap_out(&source(), "no-op", &BigInt::from(10))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CodecError>(),
            Some(CodecError::ReconciliationAnomaly { .. })
        ));
    }

    #[tokio::test]
    async fn quotes_many_in_order() {
        let requests = vec![
            ("sell-x".to_string(), BigInt::from(10)),
            ("missing".to_string(), BigInt::from(10)),
        ];
        let results = quote_many(&source(), &requests).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap(), &BigInt::from(10));
        assert!(results[1].is_err());
    }

    #[tokio::test]
    async fn prepares_swap_within_slippage() {
        let prepared = prepare_swap(&source(), "sell-x", &BigInt::from(10), &BigUint::from(9u32))
            .await
            .unwrap();
        assert_eq!(prepared.direction, SwapDirection::XToY);
        assert_eq!(prepared.expected_output, BigInt::from(10));
        assert_eq!(prepared.pool_out_datum, encode_datum(&sample_datum()));

        let redeemer = prepared.redeemer.make_redeemer(&[4]).unwrap();
        let action = SwapAction::from_hex(&redeemer).unwrap();
        assert_eq!(action.pool_in_index, 4);
        assert_eq!(action.delta_amount, BigInt::from(10));
    }

    #[tokio::test]
    async fn rejects_excess_slippage() {
        let err = prepare_swap(&source(), "sell-x", &BigInt::from(10), &BigUint::from(11u32))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CodecError>(),
            Some(CodecError::SlippageExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn rejects_zero_delta() {
        assert!(
            prepare_swap(&source(), "sell-x", &BigInt::from(0), &BigUint::from(0u32))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn prepare_rejects_unchanged_pool() {
        let err = prepare_swap(&source(), "no-op", &BigInt::from(10), &BigUint::from(0u32))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CodecError>(),
            Some(CodecError::ReconciliationAnomaly { .. })
        ));
    }

    #[tokio::test]
    async fn prepare_rejects_payout_on_input_side() {
        // "sell-x" pays out Y, so a Y-selling trade against it is inconsistent
        let err = prepare_swap(&source(), "sell-x", &BigInt::from(-10), &BigUint::from(0u32))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CodecError>(),
            Some(CodecError::ReconciliationAnomaly { .. })
        ));
    }
}
