//! Numeric encoding primitives shared by every transaction variant.
//!
//! The chain stores prices and quantities as `int64` values scaled by `1e8`.
//! Amounts enter the API either as exact decimals or as floats; the two paths
//! deliberately encode differently (exact arithmetic vs. IEEE-754 multiply)
//! so that values round-trip byte-for-byte with other client
//! implementations.

use crate::core::errors::ChainError;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;

/// Fixed-point scale for on-chain amounts: 1 unit = 1e8 base units.
pub const FIXED_POINT_SCALE: i64 = 100_000_000;

/// An order price, quantity or token amount before wire encoding.
///
/// `Decimal` amounts encode exactly; `Float` amounts go through an IEEE-754
/// multiply and truncate, which is lossy for values a binary double cannot
/// represent. Prefer `Decimal` anywhere money is involved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amount {
    Decimal(Decimal),
    Float(f64),
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self::Decimal(Decimal::from(value))
    }
}

impl From<u32> for Amount {
    fn from(value: u32) -> Self {
        Self::Decimal(Decimal::from(value))
    }
}

/// Scale an amount by `1e8` and truncate to the wire integer.
///
/// Truncation is toward zero on both paths. Amounts whose scaled value falls
/// outside the `i64` range are rejected rather than wrapped.
pub fn encode_fixed_point(amount: Amount) -> Result<i64, ChainError> {
    match amount {
        Amount::Decimal(d) => d
            .checked_mul(Decimal::from(FIXED_POINT_SCALE))
            .map(|scaled| scaled.trunc())
            .and_then(|scaled| scaled.to_i64())
            .ok_or_else(|| {
                ChainError::EncodingInvariantViolation(format!(
                    "amount {} does not fit the fixed-point range",
                    d
                ))
            }),
        Amount::Float(f) => {
            let scaled = f * 1e8;
            if !scaled.is_finite() || scaled >= 9_223_372_036_854_775_808.0 || scaled <= -9_223_372_036_854_775_808.0 {
                return Err(ChainError::EncodingInvariantViolation(format!(
                    "amount {} does not fit the fixed-point range",
                    f
                )));
            }
            #[allow(clippy::cast_possible_truncation)]
            Ok(scaled as i64)
        }
    }
}

/// Encode an unsigned integer as a little-endian base-128 varint.
pub fn encode_varint(mut value: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(2);
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            buf.push(byte | 0x80);
        } else {
            buf.push(byte);
            break;
        }
    }
    buf
}
