use num_bigint::{BigInt, BigUint};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Malformed datum: {0}")]
    MalformedDatum(String),

    #[error("Malformed redeemer: {0}")]
    MalformedRedeemer(String),

    #[error("Invalid token id: {0:?}")]
    InvalidTokenId(String),

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    #[error("Number {value} requires {required} bytes, but target length is {length}")]
    Overflow {
        value: BigInt,
        required: usize,
        length: usize,
    },

    #[error("Unsupported batch size: expected 1 pool input and 1 delta amount, got {inputs} and {legs}")]
    UnsupportedBatchSize { inputs: usize, legs: usize },

    #[error("Reconciliation anomaly: deltaX={delta_x}, deltaY={delta_y}")]
    ReconciliationAnomaly { delta_x: BigInt, delta_y: BigInt },

    #[error("Slippage too high. Minimum expected output: {minimum}, actual output: {actual}")]
    SlippageExceeded { minimum: BigUint, actual: BigInt },
}

impl CodecError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedDatum(msg.into())
    }
}

impl From<hex::FromHexError> for CodecError {
    fn from(err: hex::FromHexError) -> Self {
        Self::InvalidHex(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
