//! Futures and options bar models, plus their query filters.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{check_count, check_price, check_strike, check_symbol};
use crate::error::StoreResult;

/// One trading day of data for a futures contract.
///
/// Natural key: (`symbol`, `expiry_date`, `date`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FutureBar {
    /// Underlying symbol (e.g., "NIFTY")
    pub symbol: String,
    /// Contract expiry
    pub expiry_date: NaiveDate,
    /// Trading date
    pub date: NaiveDate,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Option<i64>,
    /// Outstanding contracts at end of day
    pub open_interest: Option<i64>,
}

impl FutureBar {
    /// Creates a bar with only its key set.
    pub fn empty(symbol: impl Into<String>, expiry_date: NaiveDate, date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            expiry_date,
            date,
            open: None,
            high: None,
            low: None,
            close: None,
            volume: None,
            open_interest: None,
        }
    }

    /// Sets open, high, low and close.
    #[must_use]
    pub fn with_prices(mut self, open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Self {
        self.open = Some(open);
        self.high = Some(high);
        self.low = Some(low);
        self.close = Some(close);
        self
    }

    /// Sets volume and open interest.
    #[must_use]
    pub fn with_activity(mut self, volume: i64, open_interest: i64) -> Self {
        self.volume = Some(volume);
        self.open_interest = Some(open_interest);
        self
    }

    /// Checks the bar before it is written.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidBar` for an empty symbol, a negative price,
    /// volume or open interest.
    pub fn validate(&self) -> StoreResult<()> {
        check_symbol(&self.symbol)?;
        check_price("open", self.open)?;
        check_price("high", self.high)?;
        check_price("low", self.low)?;
        check_price("close", self.close)?;
        check_count("volume", self.volume)?;
        check_count("open_interest", self.open_interest)
    }
}

/// One trading day of data for an option series.
///
/// Natural key: (`symbol`, `expiry_date`, `strike_price`, `option_type`, `date`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OptionBar {
    pub symbol: String,
    pub expiry_date: NaiveDate,
    pub strike_price: Decimal,
    #[sqlx(try_from = "String")]
    pub option_type: OptionType,
    pub date: NaiveDate,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Option<i64>,
    pub open_interest: Option<i64>,
}

impl OptionBar {
    /// Creates a bar with only its key set.
    pub fn empty(
        symbol: impl Into<String>,
        expiry_date: NaiveDate,
        strike_price: Decimal,
        option_type: OptionType,
        date: NaiveDate,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            expiry_date,
            strike_price,
            option_type,
            date,
            open: None,
            high: None,
            low: None,
            close: None,
            volume: None,
            open_interest: None,
        }
    }

    /// Sets open, high, low and close.
    #[must_use]
    pub fn with_prices(mut self, open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Self {
        self.open = Some(open);
        self.high = Some(high);
        self.low = Some(low);
        self.close = Some(close);
        self
    }

    /// Sets volume and open interest.
    #[must_use]
    pub fn with_activity(mut self, volume: i64, open_interest: i64) -> Self {
        self.volume = Some(volume);
        self.open_interest = Some(open_interest);
        self
    }

    /// Checks the bar before it is written.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidBar` for an empty symbol, a non-positive
    /// strike, a negative price, volume or open interest, or a strike or price
    /// with more than two decimal places.
    pub fn validate(&self) -> StoreResult<()> {
        check_symbol(&self.symbol)?;
        check_strike(self.strike_price)?;
        check_price("open", self.open)?;
        check_price("high", self.high)?;
        check_price("low", self.low)?;
        check_price("close", self.close)?;
        check_count("volume", self.volume)?;
        check_count("open_interest", self.open_interest)
    }
}

/// Option right, stored with the exchange codes `CE` (call) and `PE` (put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    #[serde(rename = "CE")]
    Call,
    #[serde(rename = "PE")]
    Put,
}

impl OptionType {
    /// Returns the stored code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Call => "CE",
            OptionType::Put => "PE",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown option type: {0}")]
pub struct ParseOptionTypeError(pub String);

impl FromStr for OptionType {
    type Err = ParseOptionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CE" | "CALL" | "C" => Ok(OptionType::Call),
            "PE" | "PUT" | "P" => Ok(OptionType::Put),
            _ => Err(ParseOptionTypeError(s.to_string())),
        }
    }
}

impl TryFrom<String> for OptionType {
    type Error = ParseOptionTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Derivative table selector for expiry listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    Futures,
    Options,
}

impl Instrument {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Instrument::Futures => "futures",
            Instrument::Options => "options",
        }
    }
}

impl FromStr for Instrument {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "futures" | "future" | "fut" => Ok(Instrument::Futures),
            "options" | "option" | "opt" => Ok(Instrument::Options),
            _ => Err(format!("unknown instrument: {s}")),
        }
    }
}

/// Filters for futures queries. Every optional filter is independent and
/// combined with AND; date bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FutureQuery {
    pub symbol: String,
    pub expiry_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl FutureQuery {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            expiry_date: None,
            start_date: None,
            end_date: None,
        }
    }

    #[must_use]
    pub fn with_expiry(mut self, expiry_date: NaiveDate) -> Self {
        self.expiry_date = Some(expiry_date);
        self
    }

    #[must_use]
    pub fn with_start(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    #[must_use]
    pub fn with_end(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }
}

/// Filters for options queries. Same semantics as [`FutureQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionQuery {
    pub symbol: String,
    pub option_type: Option<OptionType>,
    pub strike_price: Option<Decimal>,
    pub expiry_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl OptionQuery {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            option_type: None,
            strike_price: None,
            expiry_date: None,
            start_date: None,
            end_date: None,
        }
    }

    #[must_use]
    pub fn with_option_type(mut self, option_type: OptionType) -> Self {
        self.option_type = Some(option_type);
        self
    }

    #[must_use]
    pub fn with_strike(mut self, strike_price: Decimal) -> Self {
        self.strike_price = Some(strike_price);
        self
    }

    #[must_use]
    pub fn with_expiry(mut self, expiry_date: NaiveDate) -> Self {
        self.expiry_date = Some(expiry_date);
        self
    }

    #[must_use]
    pub fn with_start(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    #[must_use]
    pub fn with_end(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_option_type_codes() {
        assert_eq!(OptionType::Call.as_str(), "CE");
        assert_eq!(OptionType::Put.as_str(), "PE");
        assert_eq!(OptionType::Put.to_string(), "PE");
    }

    #[test]
    fn test_option_type_parsing() {
        assert_eq!("CE".parse::<OptionType>(), Ok(OptionType::Call));
        assert_eq!("pe".parse::<OptionType>(), Ok(OptionType::Put));
        assert_eq!("Call".parse::<OptionType>(), Ok(OptionType::Call));
        assert_eq!(
            OptionType::try_from("PUT".to_string()),
            Ok(OptionType::Put)
        );
        assert!("XX".parse::<OptionType>().is_err());
    }

    #[test]
    fn test_option_type_serde_uses_codes() {
        let json = serde_json::to_string(&OptionType::Call).unwrap();
        assert_eq!(json, "\"CE\"");
        let parsed: OptionType = serde_json::from_str("\"PE\"").unwrap();
        assert_eq!(parsed, OptionType::Put);
    }

    #[test]
    fn test_instrument_parsing() {
        assert_eq!("futures".parse::<Instrument>(), Ok(Instrument::Futures));
        assert_eq!("OPTIONS".parse::<Instrument>(), Ok(Instrument::Options));
        assert!("swaps".parse::<Instrument>().is_err());
    }

    #[test]
    fn test_future_bar_builders() {
        let bar = FutureBar::empty("NIFTY", day(25), day(2))
            .with_prices(dec!(21700), dec!(21800), dec!(21650), dec!(21750.50))
            .with_activity(120_000, 9_800_000);

        assert_eq!(bar.close, Some(dec!(21750.50)));
        assert_eq!(bar.open_interest, Some(9_800_000));
        assert!(bar.validate().is_ok());
    }

    #[test]
    fn test_future_bar_negative_open_interest_rejected() {
        let mut bar = FutureBar::empty("NIFTY", day(25), day(2));
        bar.open_interest = Some(-5);
        let err = bar.validate().unwrap_err();
        assert!(err.to_string().contains("open_interest"));
    }

    #[test]
    fn test_option_bar_requires_positive_strike() {
        let bar = OptionBar::empty("RELIANCE", day(25), dec!(0), OptionType::Call, day(2));
        assert!(bar.validate().is_err());

        let bar = OptionBar::empty("RELIANCE", day(25), dec!(2500), OptionType::Call, day(2))
            .with_prices(dec!(45), dec!(52.5), dec!(40), dec!(50))
            .with_activity(3_000, 150_000);
        assert!(bar.validate().is_ok());
    }

    #[test]
    fn test_option_bar_rejects_strike_the_column_would_round() {
        let bar = OptionBar::empty("RELIANCE", day(25), dec!(2500.004), OptionType::Call, day(2));
        let err = bar.validate().unwrap_err();
        assert!(matches!(err, StoreError::InvalidBar(_)));
        assert!(err.to_string().contains("strike_price"));

        let bar = OptionBar::empty("RELIANCE", day(25), dec!(2500.00), OptionType::Put, day(2))
            .with_prices(dec!(45), dec!(52.5), dec!(40.125), dec!(50));
        assert!(bar.validate().unwrap_err().to_string().contains("low"));
    }

    #[test]
    fn test_option_query_builder_sets_filters() {
        let query = OptionQuery::new("RELIANCE")
            .with_option_type(OptionType::Call)
            .with_strike(dec!(2500))
            .with_expiry(day(25))
            .with_start(day(1))
            .with_end(day(5));

        assert_eq!(query.option_type, Some(OptionType::Call));
        assert_eq!(query.strike_price, Some(dec!(2500)));
        assert_eq!(query.expiry_date, Some(day(25)));
        assert_eq!(query.start_date, Some(day(1)));
        assert_eq!(query.end_date, Some(day(5)));
    }

    #[test]
    fn test_future_query_defaults_to_no_filters() {
        let query = FutureQuery::new("NIFTY");
        assert!(query.expiry_date.is_none());
        assert!(query.start_date.is_none());
        assert!(query.end_date.is_none());
    }
}
