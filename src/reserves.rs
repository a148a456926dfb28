use std::collections::BTreeMap;

use num_bigint::{BigInt, BigUint};
use num_traits::Signed;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    datum::PoolDatum,
    error::{CodecError, Result},
    token::{AssetUnit, TokenId},
};

/// Value held by one pool output at a point in time.
///
/// The map is sparse: an asset that is not present holds zero. Snapshots are
/// built once and then only read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<AssetUnit, String>", into = "BTreeMap<AssetUnit, String>")]
pub struct ReserveSnapshot {
    assets: BTreeMap<AssetUnit, BigUint>,
}

impl ReserveSnapshot {
    /// Adds `quantity` of `unit` to the snapshot being built.
    pub fn with(mut self, unit: AssetUnit, quantity: impl Into<BigUint>) -> Self {
        let quantity: BigUint = quantity.into();
        *self.assets.entry(unit).or_default() += quantity;
        self
    }

    pub fn quantity(&self, unit: &AssetUnit) -> BigUint {
        self.assets.get(unit).cloned().unwrap_or_default()
    }

    pub fn quantity_of(&self, token: &TokenId) -> BigUint {
        self.quantity(&token.unit())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetUnit, &BigUint)> {
        self.assets.iter()
    }

    /// `post[unit] - pre[unit]`; positive when the pool gained the asset.
    pub fn change(pre: &Self, post: &Self, unit: &AssetUnit) -> BigInt {
        BigInt::from(post.quantity(unit)) - BigInt::from(pre.quantity(unit))
    }
}

impl FromIterator<(AssetUnit, BigUint)> for ReserveSnapshot {
    fn from_iter<I: IntoIterator<Item = (AssetUnit, BigUint)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::default(), |snapshot, (unit, qty)| snapshot.with(unit, qty))
    }
}

impl TryFrom<BTreeMap<AssetUnit, String>> for ReserveSnapshot {
    type Error = CodecError;

    fn try_from(raw: BTreeMap<AssetUnit, String>) -> Result<Self> {
        raw.into_iter()
            .map(|(unit, qty)| parse_quantity(&qty).map(|qty| (unit, qty)))
            .collect()
    }
}

impl From<ReserveSnapshot> for BTreeMap<AssetUnit, String> {
    fn from(snapshot: ReserveSnapshot) -> Self {
        snapshot
            .assets
            .into_iter()
            .map(|(unit, qty)| (unit, qty.to_string()))
            .collect()
    }
}

pub(crate) fn parse_quantity(raw: &str) -> Result<BigUint> {
    raw.trim()
        .parse()
        .map_err(|_| CodecError::InvalidAmount(raw.to_string()))
}

pub(crate) fn parse_amount(raw: &str) -> Result<BigInt> {
    raw.trim()
        .parse()
        .map_err(|_| CodecError::InvalidAmount(raw.to_string()))
}

/// Which pool asset the user pays in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDirection {
    /// Positive delta: the user sells X and receives Y.
    XToY,
    /// Negative delta: the user sells Y and receives X.
    YToX,
}

impl SwapDirection {
    pub fn from_delta(delta_amount: &BigInt) -> Result<Self> {
        if delta_amount.is_positive() {
            Ok(SwapDirection::XToY)
        } else if delta_amount.is_negative() {
            Ok(SwapDirection::YToX)
        } else {
            Err(CodecError::InvalidAmount(delta_amount.to_string()))
        }
    }

    pub fn token_in<'a>(&self, datum: &'a PoolDatum) -> &'a TokenId {
        match self {
            SwapDirection::XToY => &datum.token_x,
            SwapDirection::YToX => &datum.token_y,
        }
    }

    pub fn token_out<'a>(&self, datum: &'a PoolDatum) -> &'a TokenId {
        match self {
            SwapDirection::XToY => &datum.token_y,
            SwapDirection::YToX => &datum.token_x,
        }
    }
}

/// Signed change of each pool side between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReserveDelta {
    pub delta_x: BigInt,
    pub delta_y: BigInt,
}

impl ReserveDelta {
    pub fn between(
        pre: &ReserveSnapshot,
        post: &ReserveSnapshot,
        token_x: &TokenId,
        token_y: &TokenId,
    ) -> Self {
        Self {
            delta_x: ReserveSnapshot::change(pre, post, &token_x.unit()),
            delta_y: ReserveSnapshot::change(pre, post, &token_y.unit()),
        }
    }

    /// The swap these deltas describe, read from the side that decreased.
    ///
    /// Exactly one side must decrease; anything else is reported as
    /// [`CodecError::ReconciliationAnomaly`].
    pub fn direction(&self) -> Result<SwapDirection> {
        match (self.delta_x.is_negative(), self.delta_y.is_negative()) {
            (false, true) => Ok(SwapDirection::XToY),
            (true, false) => Ok(SwapDirection::YToX),
            _ => {
                warn!(delta_x = %self.delta_x, delta_y = %self.delta_y, "reserves do not describe a swap");
                Err(self.anomaly())
            }
        }
    }

    /// Amount paid out by the pool: the magnitude of the side that decreased.
    pub fn output_amount(&self) -> Result<BigInt> {
        Ok(match self.direction()? {
            SwapDirection::XToY => -&self.delta_y,
            SwapDirection::YToX => -&self.delta_x,
        })
    }

    fn anomaly(&self) -> CodecError {
        CodecError::ReconciliationAnomaly {
            delta_x: self.delta_x.clone(),
            delta_y: self.delta_y.clone(),
        }
    }
}

/// Output amount of the swap that turned `pre` into `post`.
pub fn reconcile(
    pre: &ReserveSnapshot,
    post: &ReserveSnapshot,
    token_x: &TokenId,
    token_y: &TokenId,
) -> Result<BigInt> {
    ReserveDelta::between(pre, post, token_x, token_y).output_amount()
}

/// Reconciles `pre` against `post`, checks that the pool paid out the side
/// `direction` expects, and that it paid at least `minimum`. Returns the
/// actual amount.
pub fn enforce_min_output(
    pre: &ReserveSnapshot,
    post: &ReserveSnapshot,
    datum: &PoolDatum,
    direction: SwapDirection,
    minimum: &BigUint,
) -> Result<BigInt> {
    let delta = ReserveDelta::between(pre, post, &datum.token_x, &datum.token_y);
    let paid = delta.direction()?;
    if paid != direction {
        warn!(expected = ?direction, actual = ?paid, "pool paid out the input side");
        return Err(delta.anomaly());
    }
    let actual = delta.output_amount()?;
    if actual < BigInt::from(minimum.clone()) {
        let token_out = direction.token_out(datum);
        warn!(%minimum, %actual, %token_out, "slippage check failed");
        return Err(CodecError::SlippageExceeded {
            minimum: minimum.clone(),
            actual,
        });
    }
    Ok(actual)
}
