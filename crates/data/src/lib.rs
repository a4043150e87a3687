//! Storage for daily OHLCV bars of equities, futures and options.
//!
//! This crate provides:
//! - A shared `PostgreSQL` client with scoped write transactions
//! - Data models for the three bar kinds and their query filters
//! - The equity and derivatives repositories (schema, upsert, filtered queries)

pub mod database;
pub mod error;
pub mod models;
pub mod repositories;
pub mod schema;

// Re-export commonly used types
pub use database::{DatabaseClient, WriteScope};
pub use error::{StoreError, StoreResult};
pub use ohlcv_store_core::ReadPolicy;

pub use models::{
    EquityBar, FutureBar, FutureQuery, Instrument, OptionBar, OptionQuery, OptionType,
};

pub use repositories::{DerivativesRepository, EquityRepository, Repositories};
