//! Money helpers using rust_decimal for precision
//!
//! Amounts travel as `f64` in the store snapshot; every sum or product
//! is done in `Decimal` and rounded to cents before it is shown.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Largest amount accepted from a snapshot (R$ 1 billion)
pub const MAX_AMOUNT: f64 = 1_000_000_000.0;

/// Shown in place of an amount that cannot be computed
pub const AMOUNT_UNAVAILABLE: &str = "R$ --";

/// Convert a stored amount to Decimal
///
/// Non-finite values collapse to zero.
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert a stored amount, `None` beyond [`MAX_AMOUNT`]
pub fn checked_amount(value: f64) -> Option<Decimal> {
    if value.abs() > MAX_AMOUNT {
        return None;
    }
    Some(to_decimal(value))
}

/// Convert back to `f64`, rounded to cents
pub fn to_f64(value: Decimal) -> f64 {
    round(value).to_f64().unwrap_or_default()
}

pub fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Receipt total from the stored snapshot fields
///
/// `subtotal + delivery_fee - coupon_discount`; never recomputed from items.
/// `None` when any field is out of range.
pub fn receipt_total(subtotal: f64, delivery_fee: f64, coupon_discount: f64) -> Option<Decimal> {
    let total = checked_amount(subtotal)?
        .checked_add(checked_amount(delivery_fee)?)?
        .checked_sub(checked_amount(coupon_discount)?)?;
    Some(round(total))
}

/// Format as Brazilian real: `R$ 1.234,50`
pub fn format_brl(value: Decimal) -> String {
    let value = round(value);
    let negative = value.is_sign_negative() && !value.is_zero();
    let abs = value.abs();
    let units = abs.trunc();
    let frac = ((abs - units) * Decimal::ONE_HUNDRED).trunc().to_u8().unwrap_or_default();
    let whole = units.to_u128().unwrap_or_default().to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    format!("{}R$ {},{:02}", sign, grouped, frac)
}

/// Format a stored amount, [`AMOUNT_UNAVAILABLE`] when out of range
pub fn format_brl_f64(value: f64) -> String {
    checked_amount(value)
        .map(format_brl)
        .unwrap_or_else(|| AMOUNT_UNAVAILABLE.to_string())
}
