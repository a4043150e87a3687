//! Database repositories for the bar stores.
//!
//! Each repository owns the schema of its tables, upserts on the natural key
//! and answers filtered range queries. Both share one [`DatabaseClient`].

pub mod derivatives_repo;
pub mod equity_repo;

pub use derivatives_repo::DerivativesRepository;
pub use equity_repo::EquityRepository;

use chrono::NaiveDate;
use ohlcv_store_core::ReadPolicy;
use sqlx::{Postgres, QueryBuilder};

use crate::database::DatabaseClient;
use crate::error::{StoreError, StoreResult};

/// Both stores built from a single database client.
#[derive(Debug, Clone)]
pub struct Repositories {
    pub equity: EquityRepository,
    pub derivatives: DerivativesRepository,
}

impl Repositories {
    /// Creates both repositories with the given read policy.
    #[must_use]
    pub fn new(client: DatabaseClient, read_policy: ReadPolicy) -> Self {
        Self {
            equity: EquityRepository::new(client.clone()).with_read_policy(read_policy),
            derivatives: DerivativesRepository::new(client).with_read_policy(read_policy),
        }
    }

    /// Creates all three tables and their indexes.
    ///
    /// # Errors
    /// Returns an error if any DDL statement fails.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        self.equity.ensure_schema().await?;
        self.derivatives.ensure_schema().await
    }
}

/// Runs a batch of DDL statements in one transaction under the schema lock.
pub(crate) async fn apply_ddl(client: &DatabaseClient, statements: &[&str]) -> StoreResult<()> {
    let mut scope = client.begin_write().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(crate::schema::SCHEMA_LOCK_KEY)
        .execute(scope.conn())
        .await
        .map_err(StoreError::from_write)?;

    for statement in statements {
        sqlx::query(*statement)
            .execute(scope.conn())
            .await
            .map_err(StoreError::from_write)?;
    }

    scope.commit().await
}

/// Applies the read policy to the outcome of a query.
///
/// Under [`ReadPolicy::Degrade`] a failure is logged and replaced by the empty
/// value of `T` (empty `Vec`, `None`, `0`).
pub(crate) fn settle_read<T: Default>(
    policy: ReadPolicy,
    operation: &'static str,
    result: Result<T, sqlx::Error>,
) -> StoreResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) => {
            let err = StoreError::from_read(e);
            match policy {
                ReadPolicy::Degrade => {
                    tracing::warn!(operation, error = %err, "read failed, returning empty result");
                    Ok(T::default())
                }
                ReadPolicy::Propagate => {
                    tracing::warn!(operation, error = %err, "read failed");
                    Err(err)
                }
            }
        }
    }
}

/// Appends inclusive `date` bounds. An absent bound leaves that side open.
pub(crate) fn push_date_range(
    builder: &mut QueryBuilder<'_, Postgres>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) {
    if let Some(start) = start_date {
        builder.push(" AND date >= ").push_bind(start);
    }
    if let Some(end) = end_date {
        builder.push(" AND date <= ").push_bind(end);
    }
}
