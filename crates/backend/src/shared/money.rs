//! Money calculation utilities using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to
//! `f64` for storage/serialization.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Convert f64 to Decimal for calculation
///
/// Input values are validated at the API boundary. If NaN/Infinity somehow
/// reaches here, logs an error and returns ZERO to avoid silent data
/// corruption in financial calculations.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Round an f64 amount to money precision
#[inline]
pub fn round_money(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: f64, b: f64) -> bool {
    let diff = (to_decimal(a) - to_decimal(b)).abs();
    diff < MONEY_TOLERANCE
}

/// Sum a slice of f64 amounts with precise arithmetic
pub fn sum(values: impl IntoIterator<Item = f64>) -> f64 {
    let total: Decimal = values.into_iter().map(to_decimal).sum();
    to_f64(total)
}

/// Комиссия платформы по строке: line_total * pct / 100
pub fn platform_fee_amount(line_total: f64, fee_percentage: f64) -> f64 {
    let fee = to_decimal(line_total) * to_decimal(fee_percentage) / Decimal::ONE_HUNDRED;
    to_f64(fee)
}

/// Чистая выплата по строке: line_total - комиссия - перерасход доставки
pub fn net_payout_item(line_total: f64, fee_percentage: f64, shipping_extra: f64) -> f64 {
    let line = to_decimal(line_total);
    let fee = line * to_decimal(fee_percentage) / Decimal::ONE_HUNDRED;
    let net = line
        - fee.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        - to_decimal(shipping_extra);
    to_f64(net)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_is_percentage_of_line_total() {
        assert_eq!(platform_fee_amount(100.0, 5.0), 5.0);
        assert_eq!(platform_fee_amount(50.0, 5.0), 2.5);
        assert_eq!(platform_fee_amount(0.0, 5.0), 0.0);
    }

    #[test]
    fn fee_rounds_half_away_from_zero() {
        // 33.33 * 7.5% = 2.49975 -> 2.50
        assert_eq!(platform_fee_amount(33.33, 7.5), 2.5);
    }

    #[test]
    fn net_payout_subtracts_fee_and_shipping_extra() {
        assert_eq!(net_payout_item(100.0, 5.0, 0.0), 95.0);
        assert_eq!(net_payout_item(100.0, 5.0, 3.4), 91.6);
    }

    #[test]
    fn sum_is_exact_for_typical_amounts() {
        // 0.1 + 0.2 style drift must not leak into totals
        let total = sum([0.1, 0.2, 0.3, 100.4]);
        assert_eq!(total, 101.0);
    }

    #[test]
    fn money_eq_tolerates_sub_cent_noise() {
        assert!(money_eq(10.0, 10.0049999));
        assert!(!money_eq(10.0, 10.02));
    }
}
