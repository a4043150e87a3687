//! Subcommands of the `ohlcv-store` binary.

mod derivatives;
mod equity;
mod init;

pub use derivatives::{
    run_expiries, run_futures, run_options, run_strikes, ExpiriesArgs, FuturesArgs, OptionsArgs,
    StrikesArgs,
};
pub use equity::{run_bars, run_range, run_symbols, BarsArgs, RangeArgs};
pub use init::run_init;

use anyhow::{Context, Result};
use clap::Args;
use ohlcv_store_core::ConfigLoader;
use ohlcv_store_data::{DatabaseClient, Repositories};
use rust_decimal::Decimal;

/// Connection arguments shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Config file path
    #[arg(short, long, global = true, default_value = "config/Config.toml")]
    pub config: String,

    /// Database connection URL, overrides the config file (uses DATABASE_URL env var if set)
    #[arg(long, global = true, env = "DATABASE_URL")]
    pub db_url: Option<String>,
}

/// An open connection plus both repositories.
pub struct Store {
    pub client: DatabaseClient,
    pub repos: Repositories,
}

/// Loads configuration and connects to the database.
///
/// # Errors
/// Returns an error if the config cannot be parsed or the database is unreachable.
pub async fn open_store(args: &StoreArgs) -> Result<Store> {
    let mut config = ConfigLoader::load_from(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;
    if let Some(url) = &args.db_url {
        config.database.url.clone_from(url);
    }

    let client = DatabaseClient::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    tracing::info!(
        read_policy = config.store.read_policy.as_str(),
        "connected to database"
    );

    let repos = Repositories::new(client.clone(), config.store.read_policy);
    Ok(Store { client, repos })
}

pub(crate) fn format_decimal(value: Option<Decimal>) -> String {
    value
        .map(|d| format!("{:.2}", d))
        .unwrap_or_else(|| "-".to_string())
}

pub(crate) fn format_count(value: Option<i64>) -> String {
    let Some(n) = value else {
        return "-".to_string();
    };
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub(crate) fn print_rule(width: usize) {
    println!("{}", "-".repeat(width));
}
