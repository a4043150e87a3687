//! Equity CLI commands: symbols, bars and range.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;

use super::{format_count, format_decimal, print_rule, Store};

/// Arguments for the bars command.
#[derive(Args, Debug, Clone)]
pub struct BarsArgs {
    /// Equity symbol (e.g., "RELIANCE")
    #[arg(long)]
    pub symbol: String,

    /// First trading date to include (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last trading date to include (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

/// Arguments for the range command.
#[derive(Args, Debug, Clone)]
pub struct RangeArgs {
    /// Equity symbol (e.g., "RELIANCE")
    #[arg(long)]
    pub symbol: String,
}

/// Prints every stored equity symbol.
///
/// # Errors
/// Returns an error only when the store propagates read failures.
pub async fn run_symbols(store: &Store) -> Result<()> {
    let symbols = store.repos.equity.list_symbols().await?;
    if symbols.is_empty() {
        println!("No equity data stored");
        return Ok(());
    }
    for symbol in &symbols {
        println!("{symbol}");
    }
    println!("({} symbols)", symbols.len());
    Ok(())
}

/// Prints the bars for a symbol as a table.
///
/// # Errors
/// Returns an error only when the store propagates read failures.
pub async fn run_bars(store: &Store, args: BarsArgs) -> Result<()> {
    let bars = store
        .repos
        .equity
        .query_bars(&args.symbol, args.start, args.end)
        .await?;

    if bars.is_empty() {
        println!("No bars for {}", args.symbol);
        return Ok(());
    }

    println!(
        "{:<12} {:>12} {:>12} {:>12} {:>12} {:>16}",
        "Date", "Open", "High", "Low", "Close", "Volume"
    );
    print_rule(82);
    for bar in &bars {
        println!(
            "{:<12} {:>12} {:>12} {:>12} {:>12} {:>16}",
            bar.date,
            format_decimal(bar.open),
            format_decimal(bar.high),
            format_decimal(bar.low),
            format_decimal(bar.close),
            format_count(bar.volume)
        );
    }
    println!("({} bars)", bars.len());
    Ok(())
}

/// Prints the earliest and latest stored date for a symbol.
///
/// # Errors
/// Returns an error only when the store propagates read failures.
pub async fn run_range(store: &Store, args: RangeArgs) -> Result<()> {
    match store.repos.equity.date_range(&args.symbol).await? {
        Some((first, last)) => {
            let days = (last - first).num_days() + 1;
            println!("{}: {first} .. {last} ({days} calendar days)", args.symbol);
        }
        None => println!("No data for {}", args.symbol),
    }
    Ok(())
}
