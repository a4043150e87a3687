//! Derivatives CLI commands: futures, options, expiries and strikes.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use ohlcv_store_data::{FutureQuery, Instrument, OptionQuery, OptionType};
use rust_decimal::Decimal;

use super::{format_count, format_decimal, print_rule, Store};

/// Arguments for the futures command.
#[derive(Args, Debug, Clone)]
pub struct FuturesArgs {
    /// Underlying symbol (e.g., "NIFTY")
    #[arg(long)]
    pub symbol: String,

    /// Contract expiry (YYYY-MM-DD)
    #[arg(long)]
    pub expiry: Option<NaiveDate>,

    /// First trading date to include (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last trading date to include (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

impl FuturesArgs {
    fn to_query(&self) -> FutureQuery {
        FutureQuery {
            symbol: self.symbol.clone(),
            expiry_date: self.expiry,
            start_date: self.start,
            end_date: self.end,
        }
    }
}

/// Arguments for the options command.
#[derive(Args, Debug, Clone)]
pub struct OptionsArgs {
    /// Underlying symbol (e.g., "RELIANCE")
    #[arg(long)]
    pub symbol: String,

    /// CE or PE
    #[arg(long)]
    pub option_type: Option<OptionType>,

    /// Strike price (e.g., 2500)
    #[arg(long)]
    pub strike: Option<Decimal>,

    /// Contract expiry (YYYY-MM-DD)
    #[arg(long)]
    pub expiry: Option<NaiveDate>,

    /// First trading date to include (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last trading date to include (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

impl OptionsArgs {
    fn to_query(&self) -> OptionQuery {
        OptionQuery {
            symbol: self.symbol.clone(),
            option_type: self.option_type,
            strike_price: self.strike,
            expiry_date: self.expiry,
            start_date: self.start,
            end_date: self.end,
        }
    }
}

/// Arguments for the expiries command.
#[derive(Args, Debug, Clone)]
pub struct ExpiriesArgs {
    /// Underlying symbol
    #[arg(long)]
    pub symbol: String,

    /// Table to look in: futures or options
    #[arg(long, default_value = "futures")]
    pub instrument: Instrument,
}

/// Arguments for the strikes command.
#[derive(Args, Debug, Clone)]
pub struct StrikesArgs {
    /// Underlying symbol
    #[arg(long)]
    pub symbol: String,

    /// Contract expiry (YYYY-MM-DD)
    #[arg(long)]
    pub expiry: NaiveDate,

    /// Restrict to CE or PE
    #[arg(long)]
    pub option_type: Option<OptionType>,
}

/// Prints futures bars as a table.
///
/// # Errors
/// Returns an error only when the store propagates read failures.
pub async fn run_futures(store: &Store, args: FuturesArgs) -> Result<()> {
    let bars = store.repos.derivatives.query_futures(&args.to_query()).await?;
    if bars.is_empty() {
        println!("No futures bars for {}", args.symbol);
        return Ok(());
    }

    println!(
        "{:<12} {:<12} {:>12} {:>12} {:>12} {:>12} {:>14} {:>14}",
        "Date", "Expiry", "Open", "High", "Low", "Close", "Volume", "OI"
    );
    print_rule(108);
    for bar in &bars {
        println!(
            "{:<12} {:<12} {:>12} {:>12} {:>12} {:>12} {:>14} {:>14}",
            bar.date,
            bar.expiry_date,
            format_decimal(bar.open),
            format_decimal(bar.high),
            format_decimal(bar.low),
            format_decimal(bar.close),
            format_count(bar.volume),
            format_count(bar.open_interest)
        );
    }
    println!("({} bars)", bars.len());
    Ok(())
}

/// Prints options bars as a table.
///
/// # Errors
/// Returns an error only when the store propagates read failures.
pub async fn run_options(store: &Store, args: OptionsArgs) -> Result<()> {
    let bars = store.repos.derivatives.query_options(&args.to_query()).await?;
    if bars.is_empty() {
        println!("No options bars for {}", args.symbol);
        return Ok(());
    }

    println!(
        "{:<12} {:<12} {:>10} {:<4} {:>10} {:>10} {:>10} {:>10} {:>12} {:>12}",
        "Date", "Expiry", "Strike", "Type", "Open", "High", "Low", "Close", "Volume", "OI"
    );
    print_rule(112);
    for bar in &bars {
        println!(
            "{:<12} {:<12} {:>10} {:<4} {:>10} {:>10} {:>10} {:>10} {:>12} {:>12}",
            bar.date,
            bar.expiry_date,
            format_decimal(Some(bar.strike_price)),
            bar.option_type,
            format_decimal(bar.open),
            format_decimal(bar.high),
            format_decimal(bar.low),
            format_decimal(bar.close),
            format_count(bar.volume),
            format_count(bar.open_interest)
        );
    }
    println!("({} bars)", bars.len());
    Ok(())
}

/// Prints the distinct expiries for a symbol.
///
/// # Errors
/// Returns an error only when the store propagates read failures.
pub async fn run_expiries(store: &Store, args: ExpiriesArgs) -> Result<()> {
    let expiries = store
        .repos
        .derivatives
        .list_expiries(&args.symbol, args.instrument)
        .await?;
    if expiries.is_empty() {
        println!(
            "No {} expiries for {}",
            args.instrument.as_str(),
            args.symbol
        );
        return Ok(());
    }
    for expiry in expiries {
        println!("{expiry}");
    }
    Ok(())
}

/// Prints the distinct strikes for a symbol and expiry.
///
/// # Errors
/// Returns an error only when the store propagates read failures.
pub async fn run_strikes(store: &Store, args: StrikesArgs) -> Result<()> {
    let strikes = store
        .repos
        .derivatives
        .list_strikes(&args.symbol, args.expiry, args.option_type)
        .await?;
    if strikes.is_empty() {
        println!("No strikes for {} expiring {}", args.symbol, args.expiry);
        return Ok(());
    }
    let line = strikes
        .iter()
        .map(|s| format_decimal(Some(*s)))
        .collect::<Vec<_>>()
        .join(" ");
    println!("{line}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_args_map_to_query() {
        let args = OptionsArgs {
            symbol: "RELIANCE".to_string(),
            option_type: Some(OptionType::Call),
            strike: Some(Decimal::new(2500, 0)),
            expiry: NaiveDate::from_ymd_opt(2024, 1, 25),
            start: None,
            end: None,
        };
        let query = args.to_query();
        assert_eq!(query.symbol, "RELIANCE");
        assert_eq!(query.option_type, Some(OptionType::Call));
        assert_eq!(query.strike_price, Some(Decimal::new(2500, 0)));
        assert!(query.start_date.is_none());
    }

    #[test]
    fn test_futures_args_map_to_query() {
        let args = FuturesArgs {
            symbol: "NIFTY".to_string(),
            expiry: None,
            start: NaiveDate::from_ymd_opt(2024, 1, 1),
            end: NaiveDate::from_ymd_opt(2024, 1, 31),
        };
        let query = args.to_query();
        let expected = FutureQuery::new("NIFTY")
            .with_start(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .with_end(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert_eq!(query, expected);
    }
}
