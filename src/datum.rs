use num_bigint::BigInt;
use pallas_crypto::hash::{Hash, Hasher};
use pallas_primitives::PlutusData;
use plutus_parser::{AsPlutus, DecodeError, create_constr, parse_constr, parse_variant};
use tracing::debug;

use crate::{
    error::{CodecError, Result},
    plutus::{self, expect_integer, field},
    rational::Rational,
    token::TokenId,
};

/// Number of fields in the pool datum's outer constructor.
pub const POOL_DATUM_FIELDS: usize = 11;

/// `(policy id, asset name)` as two byte strings.
type AssetClass = (Vec<u8>, Vec<u8>);

// Kept in its own scope: the `AsPlutus` derive expands to an unqualified
// `Result<_, DecodeError>`, which the crate's `Result<T>` alias would shadow.
mod price_bound {
    use pallas_primitives::BigInt as PlutusInt;
    use plutus_parser::AsPlutus;

    #[derive(AsPlutus)]
    pub(super) struct PriceBound {
        pub(super) numerator: PlutusInt,
        pub(super) denominator: PlutusInt,
    }
}
use price_bound::PriceBound;

/// Full invariant state of one concentrated-liquidity pool.
///
/// Field order is the on-chain order. A new value is produced for every
/// state transition; datums are never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolDatum {
    pub token_x: TokenId,
    pub token_y: TokenId,
    pub lp_fee_rate: BigInt,
    pub platform_fee_x: BigInt,
    pub platform_fee_y: BigInt,
    pub sqrt_lower_price: Rational,
    pub sqrt_upper_price: Rational,
    pub min_x_change: BigInt,
    pub min_y_change: BigInt,
    pub circulating_lp_token: BigInt,
    pub last_withdraw_epoch: BigInt,
}

fn token_to_plutus(token: &TokenId) -> PlutusData {
    let asset: AssetClass = (token.policy_id().to_vec(), token.asset_name().to_vec());
    asset.to_plutus()
}

fn token_from_plutus(data: PlutusData, what: &str) -> Result<TokenId> {
    let (policy_id, asset_name) = field::<AssetClass>(data, what)?;
    TokenId::new(policy_id, asset_name).map_err(|e| CodecError::malformed(format!("{what}: {e}")))
}

fn rational_to_plutus(r: &Rational) -> PlutusData {
    PriceBound {
        numerator: plutus::to_plutus_int(r.numerator()),
        denominator: plutus::to_plutus_int(r.denominator()),
    }
    .to_plutus()
}

fn rational_from_plutus(data: PlutusData, what: &str) -> Result<Rational> {
    let bound = field::<PriceBound>(data, what)?;
    Rational::new(
        plutus::from_plutus_int(&bound.numerator),
        plutus::from_plutus_int(&bound.denominator),
    )
    .map_err(|e| match e {
        CodecError::MalformedDatum(msg) => CodecError::malformed(format!("{what}: {msg}")),
        other => other,
    })
}

impl PoolDatum {
    pub fn to_plutus(&self) -> PlutusData {
        create_constr(
            0,
            vec![
                token_to_plutus(&self.token_x),
                token_to_plutus(&self.token_y),
                plutus::integer(&self.lp_fee_rate),
                plutus::integer(&self.platform_fee_x),
                plutus::integer(&self.platform_fee_y),
                rational_to_plutus(&self.sqrt_lower_price),
                rational_to_plutus(&self.sqrt_upper_price),
                plutus::integer(&self.min_x_change),
                plutus::integer(&self.min_y_change),
                plutus::integer(&self.circulating_lp_token),
                plutus::integer(&self.last_withdraw_epoch),
            ],
        )
    }

    pub fn from_plutus(data: PlutusData) -> Result<Self> {
        let malformed = |e: DecodeError| CodecError::malformed(format!("pool datum: {e}"));
        let (variant, fields) = parse_constr(data).map_err(malformed)?;
        if variant != 0 {
            return Err(CodecError::malformed(format!(
                "pool datum: expected constructor 0, got {variant}"
            )));
        }
        let [
            token_x,
            token_y,
            lp_fee_rate,
            platform_fee_x,
            platform_fee_y,
            sqrt_lower_price,
            sqrt_upper_price,
            min_x_change,
            min_y_change,
            circulating_lp_token,
            last_withdraw_epoch,
        ] = parse_variant::<POOL_DATUM_FIELDS>(variant, fields).map_err(malformed)?;

        Ok(Self {
            token_x: token_from_plutus(token_x, "tokenX")?,
            token_y: token_from_plutus(token_y, "tokenY")?,
            lp_fee_rate: expect_integer(lp_fee_rate, "lpFeeRate")?,
            platform_fee_x: expect_integer(platform_fee_x, "platformFeeX")?,
            platform_fee_y: expect_integer(platform_fee_y, "platformFeeY")?,
            sqrt_lower_price: rational_from_plutus(sqrt_lower_price, "sqrtLowerPrice")?,
            sqrt_upper_price: rational_from_plutus(sqrt_upper_price, "sqrtUpperPrice")?,
            min_x_change: expect_integer(min_x_change, "minXChange")?,
            min_y_change: expect_integer(min_y_change, "minYChange")?,
            circulating_lp_token: expect_integer(circulating_lp_token, "circulatingLPToken")?,
            last_withdraw_epoch: expect_integer(last_withdraw_epoch, "lastWithdrawEpoch")?,
        })
    }

    /// Canonical CBOR bytes of the datum.
    pub fn encode(&self) -> Vec<u8> {
        plutus::to_cbor(&self.to_plutus())
    }

    pub fn decode(cbor: &[u8]) -> Result<Self> {
        Self::from_plutus(plutus::from_cbor(cbor)?)
    }

    /// Blake2b-256 of the canonical bytes, as referenced by a datum-hash output.
    pub fn hash(&self) -> Hash<32> {
        Hasher::<256>::hash(&self.encode())
    }
}

pub fn encode_datum(datum: &PoolDatum) -> String {
    let encoded = hex::encode(datum.encode());
    debug!(bytes = encoded.len() / 2, "encoded pool datum");
    encoded
}

pub fn decode_datum(datum_hex: &str) -> Result<PoolDatum> {
    let datum = PoolDatum::decode(&hex::decode(datum_hex.trim())?)?;
    debug!(token_x = %datum.token_x, token_y = %datum.token_y, "decoded pool datum");
    Ok(datum)
}

#[cfg(test)]
pub(crate) mod tests {
    use plutus_parser::create_array;

    use super::*;

    pub(crate) const POLICY: &str = "273a576a5de694ff507765c57b47efdc81ea7f13a43dc4441644fab0";

    pub(crate) fn sample_datum() -> PoolDatum {
        PoolDatum {
            token_x: TokenId::lovelace(),
            token_y: format!("{POLICY}.4d494e").parse().unwrap(),
            lp_fee_rate: 30.into(),
            platform_fee_x: 1_500.into(),
            platform_fee_y: 0.into(),
            sqrt_lower_price: Rational::new(1, 1_000).unwrap(),
            sqrt_upper_price: Rational::new(BigInt::from(u64::MAX) * 7, 3).unwrap(),
            min_x_change: 1_000_000.into(),
            min_y_change: 1.into(),
            circulating_lp_token: BigInt::from(10).pow(30),
            last_withdraw_epoch: 512.into(),
        }
    }

    fn with_fields(n: usize) -> Vec<u8> {
        let datum = sample_datum();
        let PlutusData::Constr(constr) = datum.to_plutus() else {
            unreachable!()
        };
        let mut fields = constr.fields.to_vec();
        fields.resize(n, plutus::integer(&BigInt::from(0)));
        plutus::to_cbor(&create_constr(0, fields))
    }

    #[test]
    fn round_trips() {
        let datum = sample_datum();
        let decoded = decode_datum(&encode_datum(&datum)).unwrap();
        assert_eq!(decoded, datum);
        assert_eq!(encode_datum(&decoded), encode_datum(&datum));
    }

    #[test]
    fn known_layout() {
        let datum = PoolDatum {
            token_x: TokenId::lovelace(),
            token_y: TokenId::lovelace(),
            lp_fee_rate: 1.into(),
            platform_fee_x: 2.into(),
            platform_fee_y: 3.into(),
            sqrt_lower_price: Rational::new(4, 5).unwrap(),
            sqrt_upper_price: Rational::new(6, 7).unwrap(),
            min_x_change: 8.into(),
            min_y_change: 9.into(),
            circulating_lp_token: 10.into(),
            last_withdraw_epoch: 11.into(),
        };
        assert_eq!(
            encode_datum(&datum),
            "d8799f9f4040ff9f4040ff010203d8799f0405ffd8799f0607ff08090a0bff"
        );
    }

    #[test]
    fn rejects_wrong_arity() {
        for n in [10, 12] {
            assert!(matches!(
                PoolDatum::decode(&with_fields(n)),
                Err(CodecError::MalformedDatum(_))
            ));
        }
        assert!(PoolDatum::decode(&with_fields(POOL_DATUM_FIELDS)).is_ok());
    }

    #[test]
    fn rejects_bare_list() {
        let datum = sample_datum();
        let PlutusData::Constr(constr) = datum.to_plutus() else {
            unreachable!()
        };
        let cbor = plutus::to_cbor(&create_array(constr.fields.to_vec()));
        assert!(matches!(
            PoolDatum::decode(&cbor),
            Err(CodecError::MalformedDatum(_))
        ));
    }

    #[test]
    fn rejects_untagged_rational() {
        // sqrtLowerPrice as a plain list instead of constructor 0
        let hex = "d8799f9f4040ff9f4040ff0102039f0405ffd8799f0607ff08090a0bff";
        let err = decode_datum(hex).unwrap_err();
        assert!(matches!(err, CodecError::MalformedDatum(msg) if msg.contains("sqrtLowerPrice")));
    }

    #[test]
    fn rejects_token_that_is_not_a_pair() {
        // tokenX as a one-element list
        let single = "d8799f9f40ff9f4040ff010203d8799f0405ffd8799f0607ff08090a0bff";
        // tokenX as constructor 0 around the pair
        let wrapped = "d8799fd8799f4040ff9f4040ff010203d8799f0405ffd8799f0607ff08090a0bff";
        for hex in [single, wrapped] {
            let err = decode_datum(hex).unwrap_err();
            assert!(matches!(err, CodecError::MalformedDatum(msg) if msg.starts_with("tokenX: ")));
        }
    }

    #[test]
    fn rejects_short_policy_in_token() {
        // tokenY policy of two bytes
        let hex = "d8799f9f4040ff9f42abcd40ff010203d8799f0405ffd8799f0607ff08090a0bff";
        let err = decode_datum(hex).unwrap_err();
        assert!(matches!(err, CodecError::MalformedDatum(msg) if msg.starts_with("tokenY: ")));
    }

    #[test]
    fn rejects_zero_denominator() {
        let hex = "d8799f9f4040ff9f4040ff010203d8799f0400ffd8799f0607ff08090a0bff";
        let err = decode_datum(hex).unwrap_err();
        assert!(matches!(err, CodecError::MalformedDatum(msg) if msg.starts_with("sqrtLowerPrice: ")));
    }

    #[test]
    fn rejects_other_constructor() {
        // constructor 1 with the same fields
        let hex = "d87a9f9f4040ff9f4040ff010203d8799f0405ffd8799f0607ff08090a0bff";
        assert!(matches!(decode_datum(hex), Err(CodecError::MalformedDatum(_))));
    }

    #[test]
    fn rejects_bad_hex() {
        assert!(matches!(decode_datum("d87"), Err(CodecError::InvalidHex(_))));
    }

    #[test]
    fn hash_follows_bytes() {
        let datum = sample_datum();
        assert_eq!(datum.hash(), Hasher::<256>::hash(&datum.encode()));
        let mut other = datum.clone();
        other.last_withdraw_epoch += 1;
        assert_ne!(datum.hash(), other.hash());
    }
}
