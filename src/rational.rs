use std::fmt;

use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::error::{CodecError, Result};

/// A square-root price bound kept as an exact fraction.
///
/// The pair is stored as given; it is never reduced. Construction goes
/// through [`Rational::new`], so the numerator is never negative and the
/// denominator is always positive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rational {
    numerator: BigInt,
    denominator: BigInt,
}

impl Rational {
    pub fn new(numerator: impl Into<BigInt>, denominator: impl Into<BigInt>) -> Result<Self> {
        let numerator = numerator.into();
        let denominator = denominator.into();
        if numerator.is_negative() {
            return Err(CodecError::malformed(format!(
                "rational numerator must be non-negative, got {numerator}"
            )));
        }
        if denominator.is_negative() || denominator.is_zero() {
            return Err(CodecError::malformed(format!(
                "rational denominator must be positive, got {denominator}"
            )));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> &BigInt {
        &self.numerator
    }

    pub fn denominator(&self) -> &BigInt {
        &self.denominator
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_pair_unreduced() {
        let r = Rational::new(4, 8).unwrap();
        assert_eq!(r.numerator(), &BigInt::from(4));
        assert_eq!(r.denominator(), &BigInt::from(8));
        assert_eq!(r.to_string(), "4/8");
    }

    #[test]
    fn rejects_bad_bounds() {
        assert!(Rational::new(-1, 2).is_err());
        assert!(Rational::new(1, 0).is_err());
        assert!(Rational::new(1, -3).is_err());
        assert!(Rational::new(0, 1).is_ok());
    }
}
