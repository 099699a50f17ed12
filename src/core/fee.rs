//! Fee calculation
//!
//! Fees are rounded to the currency's minor unit (2 decimal places by default)
//! using round-half-up.

use crate::types::{EngineError, FeePolicy, FeeType};
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places of the currencies in use
pub const CURRENCY_DECIMALS: u32 = 2;

/// Compute the fee for `amount` under `policy`
///
/// # Errors
///
/// - `InvalidFeePolicy` if the policy value is negative
/// - `ArithmeticOverflow` if a percentage fee does not fit in a `Decimal`
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use treasury_engine::core::fee::compute_fee;
/// use treasury_engine::types::FeePolicy;
///
/// // 2% of 500.00 = 10.00
/// let fee = compute_fee(Decimal::new(500, 0), &FeePolicy::percentage(Decimal::new(2, 0))).unwrap();
/// assert_eq!(fee, Decimal::new(10, 0));
/// ```
pub fn compute_fee(amount: Decimal, policy: &FeePolicy) -> Result<Decimal, EngineError> {
    compute_fee_with_precision(amount, policy, CURRENCY_DECIMALS)
}

/// Compute a fee rounded to `decimals` places instead of the default
pub fn compute_fee_with_precision(
    amount: Decimal,
    policy: &FeePolicy,
    decimals: u32,
) -> Result<Decimal, EngineError> {
    if policy.value < Decimal::ZERO {
        return Err(EngineError::invalid_fee_policy(policy.value));
    }

    let fee = match policy.fee_type {
        FeeType::Percentage => amount
            .checked_mul(policy.value)
            .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
            .map(|fee| fee.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero))
            .ok_or_else(|| EngineError::arithmetic_overflow_in("fee"))?,
        FeeType::Fixed => policy.value,
    };

    Ok(fee.max(Decimal::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::two_percent(Decimal::new(500, 0), FeePolicy::percentage(Decimal::new(2, 0)), Decimal::new(10, 0))]
    #[case::fractional_percent(Decimal::new(1000, 0), FeePolicy::percentage(Decimal::new(25, 1)), Decimal::new(25, 0))]
    #[case::rounds_half_up(Decimal::new(125, 2), FeePolicy::percentage(Decimal::new(2, 0)), Decimal::new(3, 2))]
    #[case::rounds_down_below_half(Decimal::new(124, 2), FeePolicy::percentage(Decimal::new(2, 0)), Decimal::new(2, 2))]
    #[case::zero_percent(Decimal::new(500, 0), FeePolicy::percentage(Decimal::ZERO), Decimal::ZERO)]
    #[case::fixed(Decimal::new(500, 0), FeePolicy::fixed(Decimal::new(10, 0)), Decimal::new(10, 0))]
    #[case::fixed_ignores_amount(Decimal::new(1, 0), FeePolicy::fixed(Decimal::new(10, 0)), Decimal::new(10, 0))]
    #[case::none(Decimal::new(500, 0), FeePolicy::none(), Decimal::ZERO)]
    fn test_compute_fee(#[case] amount: Decimal, #[case] policy: FeePolicy, #[case] expected: Decimal) {
        assert_eq!(compute_fee(amount, &policy).unwrap(), expected);
    }

    #[rstest]
    #[case(FeePolicy::percentage(Decimal::new(-1, 0)))]
    #[case(FeePolicy::fixed(Decimal::new(-5, 1)))]
    fn test_negative_policy_value_is_rejected(#[case] policy: FeePolicy) {
        assert_eq!(
            compute_fee(Decimal::new(100, 0), &policy).unwrap_err(),
            EngineError::invalid_fee_policy(policy.value)
        );
    }

    #[test]
    fn test_compute_fee_is_deterministic() {
        let policy = FeePolicy::percentage(Decimal::new(175, 2));
        for cents in [1_i64, 99, 12_345, 7_777_777] {
            let amount = Decimal::new(cents, 2);
            let first = compute_fee(amount, &policy).unwrap();
            let second = compute_fee(amount, &policy).unwrap();
            assert_eq!(first, second);
            assert!(first >= Decimal::ZERO);
        }
    }

    #[test]
    fn test_custom_precision() {
        let policy = FeePolicy::percentage(Decimal::new(1, 0));
        // 1% of 12.345 = 0.12345
        assert_eq!(
            compute_fee_with_precision(Decimal::new(12345, 3), &policy, 3).unwrap(),
            Decimal::new(123, 3)
        );
        assert_eq!(
            compute_fee_with_precision(Decimal::new(12345, 3), &policy, 0).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_overflowing_percentage_is_reported_as_overflow() {
        let policy = FeePolicy::percentage(Decimal::MAX);
        assert_eq!(
            compute_fee(Decimal::MAX, &policy).unwrap_err(),
            EngineError::arithmetic_overflow_in("fee")
        );
    }
}
