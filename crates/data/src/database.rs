//! Shared storage adapter used by both bar stores.
//!
//! Owns the connection pool and hands out scoped write transactions. Pooled
//! connections and transactions are released when their guard is dropped, so
//! every exit path (including `?` on an error) gives the connection back and
//! an uncommitted transaction is rolled back.

use std::time::Duration;

use ohlcv_store_core::DatabaseConfig;
use sqlx::postgres::{PgConnection, PgPoolOptions};
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct DatabaseClient {
    pool: PgPool,
}

impl DatabaseClient {
    /// Creates a new database client connected to the configured `PostgreSQL` database.
    ///
    /// # Errors
    /// Returns `StoreError::Connection` if the database connection cannot be established.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = pool_options(config)
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        tracing::debug!(
            max_connections = config.max_connections,
            "database pool established"
        );
        Ok(Self { pool })
    }

    /// Creates a client whose connections are opened on first use.
    ///
    /// # Errors
    /// Returns `StoreError::Connection` if the connection string cannot be parsed.
    pub fn connect_lazy(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = pool_options(config)
            .connect_lazy(&config.url)
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Checks connectivity and returns the server version string.
    ///
    /// # Errors
    /// Returns `StoreError::Connection` if the server cannot be reached.
    pub async fn test_connection(&self) -> StoreResult<String> {
        let version: String = sqlx::query_scalar("SELECT version()")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        tracing::info!(%version, "connected to PostgreSQL");
        Ok(version)
    }

    /// Opens a write transaction.
    ///
    /// # Errors
    /// Returns `StoreError::Connection` if no connection can be acquired.
    pub async fn begin_write(&self) -> StoreResult<WriteScope> {
        let tx = self.pool.begin().await.map_err(StoreError::from_write)?;
        Ok(WriteScope { tx })
    }

    /// Closes the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
}

/// A write transaction scoped to one store operation.
///
/// Nothing is visible to other sessions until [`WriteScope::commit`]. Dropping
/// the scope without committing rolls the transaction back.
pub struct WriteScope {
    tx: Transaction<'static, Postgres>,
}

impl WriteScope {
    /// Connection to execute statements on inside the transaction.
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    /// Commits all statements executed through this scope.
    ///
    /// # Errors
    /// Returns an error if the commit fails; the transaction is then rolled back.
    pub async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await.map_err(StoreError::from_write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_options_follow_config() {
        let config = DatabaseConfig {
            url: "postgresql://localhost/market".to_string(),
            max_connections: 3,
            acquire_timeout_secs: 7,
        };
        let options = pool_options(&config);
        assert_eq!(options.get_max_connections(), 3);
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(7));
    }

    #[tokio::test]
    async fn test_connect_lazy_rejects_malformed_url() {
        let config = DatabaseConfig::with_url("not a url");
        let err = DatabaseClient::connect_lazy(&config).unwrap_err();
        assert!(err.is_connection());
    }

    #[tokio::test]
    async fn test_connect_lazy_does_not_touch_network() {
        let config = DatabaseConfig::with_url("postgresql://postgres@127.0.0.1:1/unreachable");
        let client = DatabaseClient::connect_lazy(&config).unwrap();
        assert_eq!(client.pool().size(), 0);
    }
}
