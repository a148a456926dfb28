//! Fixed-width big-endian packing of signed integers.
//!
//! Negative values are carried with a `2^256` bias, so a negative amount in a
//! 32-byte field reads back as its two's complement.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Signed};

use crate::error::{CodecError, Result};

/// Width in bits of the bias applied to negative values.
pub const BIAS_BITS: u64 = 256;

fn bias() -> BigInt {
    BigInt::one() << BIAS_BITS
}

/// Packs `n` into exactly `length` big-endian bytes, left padded with zeros.
///
/// Fails with [`CodecError::Overflow`] when the biased value needs more than
/// `length` bytes, or when `n` is below `-2^256`.
pub fn pack_signed(n: &BigInt, length: usize) -> Result<Vec<u8>> {
    let biased = if n.is_negative() { n + bias() } else { n.clone() };
    let magnitude = match biased.to_biguint() {
        Some(m) => m,
        None => {
            return Err(CodecError::Overflow {
                value: n.clone(),
                required: (n.bits() as usize).div_ceil(8),
                length,
            });
        }
    };

    let minimal = if magnitude.bits() == 0 {
        Vec::new()
    } else {
        magnitude.to_bytes_be()
    };
    // a zero still occupies one byte of the minimal form
    let required = minimal.len().max(1);
    if required > length {
        return Err(CodecError::Overflow {
            value: n.clone(),
            required,
            length,
        });
    }

    let mut packed = vec![0u8; length];
    packed[length - minimal.len()..].copy_from_slice(&minimal);
    Ok(packed)
}

/// Reads a big-endian unsigned value; with `signed`, values in
/// `[2^255, 2^256)` are taken as biased negatives.
pub fn unpack_signed(bytes: &[u8], signed: bool) -> BigInt {
    let value = BigInt::from_biguint(Sign::Plus, BigUint::from_bytes_be(bytes));
    let bias = bias();
    if signed && value >= (&bias >> 1usize) && value < bias {
        value - bias
    } else {
        value
    }
}
