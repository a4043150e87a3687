//! Configuration for the OHLCV market data store.

pub mod config;
pub mod config_loader;

pub use config::{AppConfig, DatabaseConfig, ReadPolicy, StoreConfig};
pub use config_loader::ConfigLoader;
