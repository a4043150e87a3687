use clap::{Parser, Subcommand};

mod commands;

use commands::{
    BarsArgs, ExpiriesArgs, FuturesArgs, OptionsArgs, RangeArgs, StoreArgs, StrikesArgs,
};

#[derive(Parser)]
#[command(name = "ohlcv-store")]
#[command(about = "Inspect daily equity, futures and options bars stored in PostgreSQL", long_about = None)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check connectivity and create all tables and indexes
    Init,
    /// List every equity symbol with stored bars
    Symbols,
    /// Show equity bars for a symbol
    Bars(BarsArgs),
    /// Show the first and last stored date for an equity symbol
    Range(RangeArgs),
    /// Show futures bars for a symbol
    Futures(FuturesArgs),
    /// Show options bars for a symbol
    Options(OptionsArgs),
    /// List expiry dates for a symbol
    Expiries(ExpiriesArgs),
    /// List strike prices for a symbol and expiry
    Strikes(StrikesArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let store = commands::open_store(&cli.store).await?;

    let result = match cli.command {
        Commands::Init => commands::run_init(&store).await,
        Commands::Symbols => commands::run_symbols(&store).await,
        Commands::Bars(args) => commands::run_bars(&store, args).await,
        Commands::Range(args) => commands::run_range(&store, args).await,
        Commands::Futures(args) => commands::run_futures(&store, args).await,
        Commands::Options(args) => commands::run_options(&store, args).await,
        Commands::Expiries(args) => commands::run_expiries(&store, args).await,
        Commands::Strikes(args) => commands::run_strikes(&store, args).await,
    };

    store.client.close().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ohlcv_store_data::{Instrument, OptionType};
    use rust_decimal::Decimal;

    #[test]
    fn test_parse_bars_with_range() {
        let cli = Cli::try_parse_from([
            "ohlcv-store",
            "--db-url",
            "postgresql://localhost/test",
            "bars",
            "--symbol",
            "RELIANCE",
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-31",
        ])
        .unwrap();

        assert_eq!(cli.store.db_url.as_deref(), Some("postgresql://localhost/test"));
        let Commands::Bars(args) = cli.command else {
            panic!("expected bars command");
        };
        assert_eq!(args.symbol, "RELIANCE");
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(args.end, NaiveDate::from_ymd_opt(2024, 1, 31));
    }

    #[test]
    fn test_parse_options_filters() {
        let cli = Cli::try_parse_from([
            "ohlcv-store",
            "options",
            "--symbol",
            "RELIANCE",
            "--option-type",
            "ce",
            "--strike",
            "2500",
        ])
        .unwrap();

        let Commands::Options(args) = cli.command else {
            panic!("expected options command");
        };
        assert_eq!(args.option_type, Some(OptionType::Call));
        assert_eq!(args.strike, Some(Decimal::new(2500, 0)));
        assert!(args.expiry.is_none());
    }

    #[test]
    fn test_expiries_defaults_to_futures() {
        let cli =
            Cli::try_parse_from(["ohlcv-store", "expiries", "--symbol", "NIFTY"]).unwrap();
        let Commands::Expiries(args) = cli.command else {
            panic!("expected expiries command");
        };
        assert_eq!(args.instrument, Instrument::Futures);
        assert_eq!(cli.store.config, "config/Config.toml");
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let bad_date = ["ohlcv-store", "bars", "--symbol", "X", "--start", "01/02/2024"];
        assert!(Cli::try_parse_from(bad_date).is_err());

        let bad_type = ["ohlcv-store", "options", "--symbol", "X", "--option-type", "XX"];
        assert!(Cli::try_parse_from(bad_type).is_err());

        // strikes requires an expiry
        assert!(Cli::try_parse_from(["ohlcv-store", "strikes", "--symbol", "X"]).is_err());
        assert!(Cli::try_parse_from(["ohlcv-store", "bars"]).is_err());
    }
}
