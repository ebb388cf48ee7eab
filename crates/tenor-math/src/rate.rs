//! Annualized rate to fp32 price conversion
//!
//! A limit price is the fraction of face value paid now for one unit
//! of face value repaid at maturity, under simple interest over the
//! market tenor:
//!
//!   price = FP32_ONE * K / (K + rate * tenor)    where K = year * bps
//!
//! Division truncates, so the round trip is lossy by design; the
//! inverse recovers the rate to within one basis point for any tenor
//! of an hour or longer.

use crate::{MathError, FP32_ONE};

/// Basis point scale (10_000 = 100%)
pub const BPS: u64 = 10_000;

/// Seconds in the rate year (365 days)
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Combined bps-year scale used by both conversions
const K: u128 = SECONDS_PER_YEAR as u128 * BPS as u128;

/// Convert an annualized rate in basis points to an fp32 limit price
/// for an instrument maturing `tenor_seconds` from fill.
pub fn rate_to_price(rate_bps: u64, tenor_seconds: u64) -> Result<u64, MathError> {
    if tenor_seconds == 0 {
        return Err(MathError::ZeroDivision);
    }
    let interest = (rate_bps as u128)
        .checked_mul(tenor_seconds as u128)
        .ok_or(MathError::Overflow)?;
    let denom = K.checked_add(interest).ok_or(MathError::Overflow)?;
    // numerator fits: 2^32 * K < 2^71
    let price = (FP32_ONE as u128 * K) / denom;
    Ok(price as u64)
}

/// Recover the annualized rate in basis points from an fp32 limit
/// price. Inverse of [`rate_to_price`] up to integer truncation.
pub fn price_to_rate(price_fp32: u64, tenor_seconds: u64) -> Result<u64, MathError> {
    if tenor_seconds == 0 || price_fp32 == 0 {
        return Err(MathError::ZeroDivision);
    }
    if price_fp32 > FP32_ONE {
        // above face value implies a negative rate
        return Err(MathError::Underflow);
    }
    let discount = (FP32_ONE - price_fp32) as u128;
    let num = K.checked_mul(discount).ok_or(MathError::Overflow)?;
    let rate = num / (price_fp32 as u128 * tenor_seconds as u128);
    if rate > u64::MAX as u128 {
        return Err(MathError::Overflow);
    }
    Ok(rate as u64)
}
