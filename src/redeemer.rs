use num_bigint::BigInt;
use tracing::debug;

use crate::{
    error::{CodecError, Result},
    packer::{pack_signed, unpack_signed},
};

/// Action tag the pool validator reads as "swap".
pub const SWAP_ACTION: u8 = 3;

/// Length of the action payload handed to the validator.
pub const ACTION_BYTES: usize = 36;

/// CBOR header of a 36-byte byte string.
pub const REDEEMER_HEADER: &str = "5824";

const INDEX_WIDTH: usize = 1;
const AMOUNT_WIDTH: usize = 32;

/// One resolved swap action:
/// `[poolIn][action][poolIn][poolOut][deltaAmount:32]`.
///
/// The pool input index appears twice; the validator reads both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapAction {
    pub pool_in_index: u64,
    pub pool_out_index: u64,
    pub delta_amount: BigInt,
}

impl SwapAction {
    pub fn to_bytes(&self) -> Result<[u8; ACTION_BYTES]> {
        let pool_in = pack_signed(&BigInt::from(self.pool_in_index), INDEX_WIDTH)?;
        let pool_out = pack_signed(&BigInt::from(self.pool_out_index), INDEX_WIDTH)?;
        let amount = pack_signed(&self.delta_amount, AMOUNT_WIDTH)?;

        let mut action = [0u8; ACTION_BYTES];
        action[0] = pool_in[0];
        action[1] = SWAP_ACTION;
        action[2] = pool_in[0];
        action[3] = pool_out[0];
        action[4..].copy_from_slice(&amount);
        Ok(action)
    }

    /// Redeemer hex: the CBOR byte-string header followed by the 36 payload bytes.
    pub fn to_hex(&self) -> Result<String> {
        Ok(format!("{REDEEMER_HEADER}{}", hex::encode(self.to_bytes()?)))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: &[u8; ACTION_BYTES] = bytes.try_into().map_err(|_| {
            CodecError::MalformedRedeemer(format!(
                "expected {ACTION_BYTES} bytes, got {}",
                bytes.len()
            ))
        })?;
        if bytes[1] != SWAP_ACTION {
            return Err(CodecError::MalformedRedeemer(format!(
                "unsupported action {}",
                bytes[1]
            )));
        }
        if bytes[0] != bytes[2] {
            return Err(CodecError::MalformedRedeemer(format!(
                "pool input index mismatch: {} != {}",
                bytes[0], bytes[2]
            )));
        }
        Ok(Self {
            pool_in_index: bytes[0].into(),
            pool_out_index: bytes[3].into(),
            delta_amount: unpack_signed(&bytes[4..], true),
        })
    }

    pub fn from_hex(redeemer_hex: &str) -> Result<Self> {
        let payload = redeemer_hex.strip_prefix(REDEEMER_HEADER).ok_or_else(|| {
            CodecError::MalformedRedeemer(format!("missing {REDEEMER_HEADER} header"))
        })?;
        Self::from_bytes(&hex::decode(payload)?)
    }
}

/// A pool output paired with the signed amount swapped against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapLeg {
    pub output_index: u64,
    pub delta_amount: BigInt,
}

/// Swap redeemer whose pool input index is only known once the surrounding
/// transaction has ordered its inputs.
///
/// The transaction builder calls [`SwapRedeemer::make_redeemer`] with the
/// final positions of the selected pool inputs. Only a single pool in and a
/// single pool out are accepted for now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRedeemer {
    legs: Vec<SwapLeg>,
}

impl SwapRedeemer {
    pub fn new(legs: Vec<SwapLeg>) -> Self {
        Self { legs }
    }

    /// One pool in, one pool out; the pool output sits first in the outputs.
    pub fn single(delta_amount: BigInt) -> Self {
        Self::new(vec![SwapLeg {
            output_index: 0,
            delta_amount,
        }])
    }

    pub fn legs(&self) -> &[SwapLeg] {
        &self.legs
    }

    pub fn make_redeemer(&self, input_indices: &[u64]) -> Result<String> {
        let (pool_in_index, leg) = match (input_indices, self.legs.as_slice()) {
            ([pool_in_index], [leg]) => (*pool_in_index, leg),
            _ => {
                return Err(CodecError::UnsupportedBatchSize {
                    inputs: input_indices.len(),
                    legs: self.legs.len(),
                });
            }
        };
        let action = SwapAction {
            pool_in_index,
            pool_out_index: leg.output_index,
            delta_amount: leg.delta_amount.clone(),
        };
        let redeemer = action.to_hex()?;
        debug!(
            pool_in_index,
            pool_out_index = leg.output_index,
            delta_amount = %leg.delta_amount,
            "built swap redeemer"
        );
        Ok(redeemer)
    }

    /// Hands the redeemer over as the callback form a transaction builder
    /// stores until input ordering is final.
    pub fn into_callback(self) -> impl Fn(&[u64]) -> Result<String> + Send + Sync {
        move |input_indices: &[u64]| self.make_redeemer(input_indices)
    }
}

/// Redeemer for a resolved single-pool swap.
pub fn build_swap_redeemer(pool_in_index: u64, delta_amount: &BigInt) -> Result<String> {
    SwapRedeemer::single(delta_amount.clone()).make_redeemer(&[pool_in_index])
}
