//! Glue between [`plutus_parser`] and the codec.
//!
//! Node building and shape matching go through `AsPlutus`, which already
//! writes non-empty arrays indefinite-length. What lives here is the
//! conversion between the ledger's integer node and [`num_bigint::BigInt`],
//! the CBOR entry points, and [`field`], which turns a parser error into
//! [`CodecError::MalformedDatum`] naming the field that failed.

use num_bigint::{BigInt, Sign};
use num_traits::{One, ToPrimitive};
use pallas_codec::{minicbor, utils::Int};
use pallas_primitives::{BigInt as PlutusInt, BoundedBytes, PlutusData};
use plutus_parser::AsPlutus;

use crate::error::{CodecError, Result};

/// Integers that fit a CBOR int are written inline; anything wider becomes a
/// tagged bignum with a minimal big-endian magnitude.
pub fn to_plutus_int(value: &BigInt) -> PlutusInt {
    let inline = value
        .to_i128()
        .and_then(|v| minicbor::data::Int::try_from(v).ok());
    match inline {
        Some(v) => PlutusInt::Int(Int(v)),
        None if value.sign() == Sign::Minus => {
            let magnitude = (-value - BigInt::one()).magnitude().to_bytes_be();
            PlutusInt::BigNInt(BoundedBytes::from(magnitude))
        }
        None => PlutusInt::BigUInt(BoundedBytes::from(value.magnitude().to_bytes_be())),
    }
}

pub fn from_plutus_int(value: &PlutusInt) -> BigInt {
    match value {
        PlutusInt::Int(v) => BigInt::from(i128::from(v.0)),
        PlutusInt::BigUInt(magnitude) => BigInt::from_bytes_be(Sign::Plus, magnitude),
        PlutusInt::BigNInt(magnitude) => {
            -BigInt::from_bytes_be(Sign::Plus, magnitude) - BigInt::one()
        }
    }
}

pub fn integer(value: &BigInt) -> PlutusData {
    to_plutus_int(value).to_plutus()
}

/// Parses one field, reporting any shape mismatch under `what`.
pub fn field<T: AsPlutus>(data: PlutusData, what: &str) -> Result<T> {
    T::from_plutus(data).map_err(|e| CodecError::malformed(format!("{what}: {e}")))
}

pub fn expect_integer(data: PlutusData, what: &str) -> Result<BigInt> {
    field::<PlutusInt>(data, what).map(|int| from_plutus_int(&int))
}

pub fn to_cbor(data: &PlutusData) -> Vec<u8> {
    minicbor::to_vec(data).expect("encoding into a Vec is infallible")
}

/// Decodes exactly one node; trailing bytes are an error.
pub fn from_cbor(cbor: &[u8]) -> Result<PlutusData> {
    let mut decoder = minicbor::Decoder::new(cbor);
    let data: PlutusData = decoder
        .decode()
        .map_err(|e| CodecError::malformed(format!("invalid cbor: {e}")))?;
    if decoder.position() != cbor.len() {
        return Err(CodecError::malformed(format!(
            "{} trailing bytes after datum",
            cbor.len() - decoder.position()
        )));
    }
    Ok(data)
}
