//! Init CLI command.
//!
//! Verifies connectivity and creates the equity, futures and options tables.

use anyhow::{Context, Result};

use super::Store;

/// Runs the init command.
///
/// # Errors
/// Returns an error if the connection check or schema creation fails.
pub async fn run_init(store: &Store) -> Result<()> {
    let version = store
        .client
        .test_connection()
        .await
        .context("Database connection check failed")?;
    println!("Connected: {version}");

    store
        .repos
        .ensure_schema()
        .await
        .context("Failed to create schema")?;
    println!("Tables ready: nse_equity_data, nse_futures_data, nse_options_data");
    Ok(())
}
