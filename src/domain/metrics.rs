//! Commission and performance-rate arithmetic.
//!
//! Pure functions over Money with fixed 2-decimal rounding. All ratio
//! helpers guard the zero denominator and report 0 instead of failing.

use crate::domain::Money;

/// Commission owed for an order: `order_value * rate / 100`, rounded to
/// 2 decimal places.
///
/// `rate` is a percentage in [0, 100]. Callers with no order value pass
/// `Money::zero()` and get a zero commission.
pub fn commission(order_value: Money, rate: Money) -> Money {
    (order_value * rate / Money::hundred()).round2()
}

/// Click-through rate as a percentage: `conversions / clicks * 100`.
///
/// Returns 0 when there are no clicks.
pub fn ctr(clicks: i64, conversions: i64) -> Money {
    rate_percent(conversions, clicks)
}

/// Generic action-over-views percentage, reused for copy-rate,
/// click-rate, and click-through-rate reporting.
///
/// Returns 0 when there are no views.
pub fn conversion_rate(actions: i64, views: i64) -> Money {
    rate_percent(actions, views)
}

fn rate_percent(numerator: i64, denominator: i64) -> Money {
    if denominator == 0 {
        return Money::zero();
    }
    (Money::from(numerator) / Money::from(denominator) * Money::hundred()).round2()
}
