//! Daily equity bar model.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{check_count, check_price, check_symbol};
use crate::error::StoreResult;

/// One trading day of OHLCV data for an equity.
///
/// Natural key: (`symbol`, `date`). Price and volume fields are nullable;
/// re-upserting the same key replaces them but never the key itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EquityBar {
    /// Exchange ticker (e.g., "RELIANCE")
    pub symbol: String,
    /// Trading date
    pub date: NaiveDate,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    /// Shares traded
    pub volume: Option<i64>,
}

impl EquityBar {
    /// Creates a fully populated bar.
    pub fn new(
        symbol: impl Into<String>,
        date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: i64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(volume),
        }
    }

    /// Creates a bar with only its key set.
    pub fn empty(symbol: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            open: None,
            high: None,
            low: None,
            close: None,
            volume: None,
        }
    }

    /// Checks the bar before it is written.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidBar` for an empty symbol, a negative price,
    /// a price with more than two decimal places or a negative volume.
    pub fn validate(&self) -> StoreResult<()> {
        check_symbol(&self.symbol)?;
        check_price("open", self.open)?;
        check_price("high", self.high)?;
        check_price("low", self.low)?;
        check_price("close", self.close)?;
        check_count("volume", self.volume)
    }
}
