//! Money arithmetic for order totals.
//!
//! All amounts are fixed-point decimals with 2 fractional digits; binary
//! floating point never touches a price.

use rust_decimal::{Decimal, RoundingStrategy};

/// Sales tax applied on top of the seat subtotal (5%).
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Breakdown of an order total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Computes the order total from the seat subtotal. Tax is rounded to
/// 2 decimals, half away from zero.
#[must_use]
pub fn order_totals(subtotal: Decimal, tax_rate: Decimal) -> Totals {
    let tax = (subtotal * tax_rate)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    Totals {
        subtotal,
        tax,
        total: subtotal + tax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_subtotal_has_exact_tax() {
        let totals = order_totals(dec!(100.00), DEFAULT_TAX_RATE);
        assert_eq!(totals.tax, dec!(5.00));
        assert_eq!(totals.total, dec!(105.00));
    }

    #[test]
    fn test_midpoint_tax_rounds_away_from_zero() {
        // 99.99 * 0.05 = 4.9995, which rounds up to 5.00.
        let totals = order_totals(dec!(99.99), DEFAULT_TAX_RATE);
        assert_eq!(totals.tax, dec!(5.00));
        assert_eq!(totals.total, dec!(104.99));
    }

    #[test]
    fn test_three_seat_subtotal() {
        // 3 x 1000.25 = 3000.75; tax 150.0375 rounds to 150.04.
        let subtotal = dec!(1000.25) * dec!(3);
        let totals = order_totals(subtotal, DEFAULT_TAX_RATE);
        assert_eq!(totals.tax, dec!(150.04));
        assert_eq!(totals.total, dec!(3150.79));
    }

    #[test]
    fn test_zero_subtotal() {
        let totals = order_totals(dec!(0), DEFAULT_TAX_RATE);
        assert_eq!(totals.tax, dec!(0));
        assert_eq!(totals.total, dec!(0));
    }
}
