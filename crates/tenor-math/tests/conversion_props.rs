//! Property tests for the rate/price conversions and fp32 arithmetic

use proptest::prelude::*;

use tenor_math::{fp32_div, fp32_mul, price_to_rate, rate_to_price, FP32_ONE};

const ONE_HOUR: u64 = 3_600;
const TWO_YEARS: u64 = 2 * 31_536_000;

proptest! {
    /// Prices never exceed face value and shrink as the rate grows
    #[test]
    fn price_bounded_and_antitone_in_rate(
        rate in 0u64..=50_000,
        tenor in ONE_HOUR..=TWO_YEARS,
    ) {
        let price = rate_to_price(rate, tenor).unwrap();
        prop_assert!(price <= FP32_ONE);
        prop_assert!(price > 0);

        let steeper = rate_to_price(rate + 1, tenor).unwrap();
        prop_assert!(steeper <= price);
    }

    /// Rate -> price -> rate is exact to within one basis point for any
    /// tenor of an hour or longer
    #[test]
    fn rate_round_trip_within_one_bp(
        rate in 0u64..=50_000,
        tenor in ONE_HOUR..=TWO_YEARS,
    ) {
        let price = rate_to_price(rate, tenor).unwrap();
        let back = price_to_rate(price, tenor).unwrap();
        prop_assert!(back.abs_diff(rate) <= 1, "rate {} came back as {}", rate, back);
    }

    /// Base -> quote -> base never gains value under truncation
    #[test]
    fn fp32_mul_div_never_gains(
        base in 0u64..=u32::MAX as u64,
        price in 1u64..=FP32_ONE,
    ) {
        let quote = fp32_mul(base, price).unwrap();
        let back = fp32_div(quote, price).unwrap();
        prop_assert!(back <= base);
    }
}
