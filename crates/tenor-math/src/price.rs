//! fp32 price arithmetic
//!
//! Limit prices on the book are 32-bit fixed point: `FP32_ONE` is full
//! face value. Base quantities are fp0, so base * price yields the
//! quote quantity after shifting the fraction back out.

use crate::MathError;

/// Full face value in fp32 terms
pub const FP32_ONE: u64 = 1 << 32;

/// Multiply an fp0 base quantity by an fp32 price, yielding fp0 quote
pub fn fp32_mul(base: u64, price_fp32: u64) -> Result<u64, MathError> {
    let wide = (base as u128)
        .checked_mul(price_fp32 as u128)
        .ok_or(MathError::Overflow)?;
    downcast(wide >> 32)
}

/// Divide an fp0 quote quantity by an fp32 price, yielding fp0 base
pub fn fp32_div(quote: u64, price_fp32: u64) -> Result<u64, MathError> {
    if price_fp32 == 0 {
        return Err(MathError::ZeroDivision);
    }
    let wide = ((quote as u128) << 32) / price_fp32 as u128;
    downcast(wide)
}

fn downcast(n: u128) -> Result<u64, MathError> {
    if n > u64::MAX as u128 {
        Err(MathError::Overflow)
    } else {
        Ok(n as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fp32_identity() {
        assert_eq!(fp32_mul(1_000, FP32_ONE).unwrap(), 1_000);
        assert_eq!(fp32_div(1_000, FP32_ONE).unwrap(), 1_000);
    }

    #[test]
    fn test_fp32_half_price() {
        let half = FP32_ONE / 2;
        assert_eq!(fp32_mul(1_000, half).unwrap(), 500);
        assert_eq!(fp32_div(500, half).unwrap(), 1_000);
    }

    #[test]
    fn test_fp32_mul_truncates() {
        // 3 * (1/3-ish) truncates toward zero
        let third = FP32_ONE / 3;
        assert_eq!(fp32_mul(3, third).unwrap(), 0);
    }

    #[test]
    fn test_fp32_div_zero_price() {
        assert_eq!(fp32_div(1_000, 0), Err(MathError::ZeroDivision));
    }

    #[test]
    fn test_fp32_mul_overflow() {
        assert_eq!(fp32_mul(u64::MAX, u64::MAX), Err(MathError::Overflow));
    }
}
