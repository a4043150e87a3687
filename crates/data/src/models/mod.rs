//! Data models for the bar stores.
//!
//! Prices use `rust_decimal::Decimal` (persisted with two fractional digits),
//! counts use `i64`. Models derive `sqlx::FromRow` for database compatibility.

pub mod derivatives;
pub mod equity;

pub use derivatives::{
    FutureBar, FutureQuery, Instrument, OptionBar, OptionQuery, OptionType, ParseOptionTypeError,
};
pub use equity::EquityBar;

use rust_decimal::Decimal;

use crate::error::{StoreError, StoreResult};

/// Width of the `symbol` column, in characters.
pub const MAX_SYMBOL_LEN: usize = 50;

/// Fractional digits kept by the `DECIMAL(10,2)` price and strike columns.
pub const PRICE_SCALE: u32 = 2;

pub(crate) fn check_symbol(symbol: &str) -> StoreResult<()> {
    if symbol.trim().is_empty() {
        return Err(StoreError::invalid_bar("symbol must not be empty"));
    }
    if symbol.chars().count() > MAX_SYMBOL_LEN {
        return Err(StoreError::invalid_bar(format!(
            "symbol longer than {MAX_SYMBOL_LEN} characters: {symbol}"
        )));
    }
    Ok(())
}

pub(crate) fn check_price(field: &str, value: Option<Decimal>) -> StoreResult<()> {
    match value {
        Some(v) if v.is_sign_negative() && !v.is_zero() => Err(StoreError::invalid_bar(
            format!("{field} must be non-negative, got {v}"),
        )),
        Some(v) => check_scale(field, v),
        None => Ok(()),
    }
}

pub(crate) fn check_strike(value: Decimal) -> StoreResult<()> {
    if value <= Decimal::ZERO {
        return Err(StoreError::invalid_bar(format!(
            "strike_price must be positive, got {value}"
        )));
    }
    check_scale("strike_price", value)
}

/// Rejects values the column would round. Trailing zeros are ignored.
fn check_scale(field: &str, value: Decimal) -> StoreResult<()> {
    if value.normalize().scale() > PRICE_SCALE {
        return Err(StoreError::invalid_bar(format!(
            "{field} has more than {PRICE_SCALE} decimal places: {value}"
        )));
    }
    Ok(())
}

pub(crate) fn check_count(field: &str, value: Option<i64>) -> StoreResult<()> {
    match value {
        Some(v) if v < 0 => Err(StoreError::invalid_bar(format!(
            "{field} must be non-negative, got {v}"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_symbol_length_limit() {
        assert!(check_symbol(&"X".repeat(MAX_SYMBOL_LEN)).is_ok());
        assert!(check_symbol(&"X".repeat(MAX_SYMBOL_LEN + 1)).is_err());
    }

    #[test]
    fn test_symbol_length_counts_characters() {
        // 50 two-byte characters fit in VARCHAR(50)
        let symbol = "\u{e9}".repeat(MAX_SYMBOL_LEN);
        assert_eq!(symbol.len(), MAX_SYMBOL_LEN * 2);
        assert!(check_symbol(&symbol).is_ok());
        assert!(check_symbol(&"\u{e9}".repeat(MAX_SYMBOL_LEN + 1)).is_err());
    }

    #[test]
    fn test_price_scale_limit() {
        assert!(check_price("close", Some(dec!(10.01))).is_ok());
        assert!(check_price("close", Some(dec!(10.000))).is_ok());

        let err = check_price("close", Some(dec!(10.005))).unwrap_err();
        assert!(matches!(err, StoreError::InvalidBar(_)));
        assert!(err.to_string().contains("close"));
    }

    #[test]
    fn test_strike_check() {
        assert!(check_strike(dec!(2500)).is_ok());
        assert!(check_strike(dec!(2500.50)).is_ok());
        assert!(check_strike(dec!(0)).is_err());
        assert!(check_strike(dec!(-100)).is_err());
        assert!(check_strike(dec!(2500.004)).is_err());
    }

    #[test]
    fn test_price_check_allows_zero_and_null() {
        assert!(check_price("close", None).is_ok());
        assert!(check_price("close", Some(dec!(0))).is_ok());
        assert!(check_price("close", Some(dec!(-0.00))).is_ok());
        assert!(check_price("close", Some(dec!(-1))).is_err());
    }

    #[test]
    fn test_count_check() {
        assert!(check_count("volume", None).is_ok());
        assert!(check_count("volume", Some(0)).is_ok());
        assert!(check_count("volume", Some(-1)).is_err());
    }
}
