//! Equity bar repository.
//!
//! Owns `nse_equity_data`: one row per (symbol, date), upserted with
//! last-write-wins on the price and volume columns.

use chrono::NaiveDate;
use ohlcv_store_core::ReadPolicy;
use sqlx::{Postgres, QueryBuilder};
use tracing::{Instrument, Span};

use super::{apply_ddl, push_date_range, settle_read};
use crate::database::DatabaseClient;
use crate::error::{StoreError, StoreResult};
use crate::models::EquityBar;
use crate::schema::EQUITY_DDL;

const UPSERT_SQL: &str = r"
    INSERT INTO nse_equity_data (symbol, date, open_price, high_price, low_price, close_price, volume)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    ON CONFLICT (symbol, date) DO UPDATE SET
        open_price = EXCLUDED.open_price,
        high_price = EXCLUDED.high_price,
        low_price = EXCLUDED.low_price,
        close_price = EXCLUDED.close_price,
        volume = EXCLUDED.volume
";

const SELECT_COLUMNS: &str = "SELECT symbol, date, open_price AS open, high_price AS high, \
     low_price AS low, close_price AS close, volume FROM nse_equity_data";

/// Repository for daily equity bars.
#[derive(Debug, Clone)]
pub struct EquityRepository {
    client: DatabaseClient,
    read_policy: ReadPolicy,
    span: Span,
}

impl EquityRepository {
    /// Creates a repository that degrades failed reads to empty results.
    #[must_use]
    pub fn new(client: DatabaseClient) -> Self {
        Self {
            client,
            read_policy: ReadPolicy::default(),
            span: tracing::info_span!("equity_store"),
        }
    }

    #[must_use]
    pub fn with_read_policy(mut self, read_policy: ReadPolicy) -> Self {
        self.read_policy = read_policy;
        self
    }

    /// Sets the span all operations of this store are recorded under.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    #[must_use]
    pub fn read_policy(&self) -> ReadPolicy {
        self.read_policy
    }

    /// Creates the equity table and its indexes if they do not exist.
    ///
    /// # Errors
    /// Returns an error if the DDL transaction fails.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        async {
            apply_ddl(&self.client, EQUITY_DDL)
                .await
                .inspect_err(|e| tracing::error!(error = %e, "failed to create equity schema"))?;
            tracing::info!("equity schema ready");
            Ok::<_, StoreError>(())
        }
        .instrument(self.span.clone())
        .await
    }

    /// Inserts a bar, or overwrites its OHLCV fields if the (symbol, date) key exists.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidBar` before touching the database if the bar
    /// fails validation; otherwise any database failure after rollback.
    pub async fn upsert_bar(&self, bar: &EquityBar) -> StoreResult<()> {
        bar.validate()?;
        let span = tracing::debug_span!(
            parent: &self.span,
            "upsert_bar",
            symbol = %bar.symbol,
            date = %bar.date
        );

        async {
            let mut scope = self.client.begin_write().await?;
            bind_upsert(bar)
                .execute(scope.conn())
                .await
                .map_err(StoreError::from_write)?;
            scope.commit().await
        }
        .instrument(span.clone())
        .await
        .inspect(|_| span.in_scope(|| tracing::debug!("upserted equity bar")))
        .inspect_err(|e| span.in_scope(|| tracing::error!(error = %e, "equity upsert failed")))
    }

    /// Upserts a batch of bars in one transaction. Either every bar is written or none is.
    ///
    /// # Returns
    /// The number of rows inserted or updated.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidBar` if any bar fails validation, or the
    /// database failure that aborted the transaction.
    pub async fn upsert_bars(&self, bars: &[EquityBar]) -> StoreResult<u64> {
        if bars.is_empty() {
            return Ok(0);
        }
        for bar in bars {
            bar.validate()?;
        }

        async {
            let mut scope = self.client.begin_write().await?;
            let mut written = 0u64;
            for bar in bars {
                let result = bind_upsert(bar)
                    .execute(scope.conn())
                    .await
                    .map_err(StoreError::from_write)?;
                written += result.rows_affected();
            }
            scope.commit().await?;
            tracing::debug!(written, "upserted equity batch");
            Ok::<_, StoreError>(written)
        }
        .instrument(self.span.clone())
        .await
        .inspect_err(|e| {
            self.span.in_scope(|| {
                tracing::error!(error = %e, count = bars.len(), "equity batch upsert failed");
            });
        })
    }

    /// Returns bars for `symbol` within the inclusive date range, oldest first.
    ///
    /// # Errors
    /// Only under [`ReadPolicy::Propagate`]; otherwise failures yield an empty vector.
    pub async fn query_bars(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> StoreResult<Vec<EquityBar>> {
        let mut builder = bars_query(symbol, start_date, end_date);
        let result = builder
            .build_query_as::<EquityBar>()
            .fetch_all(self.client.pool())
            .instrument(self.span.clone())
            .await;
        self.span
            .in_scope(|| settle_read(self.read_policy, "query_bars", result))
    }

    /// Returns every distinct symbol in ascending order.
    ///
    /// # Errors
    /// Only under [`ReadPolicy::Propagate`].
    pub async fn list_symbols(&self) -> StoreResult<Vec<String>> {
        let result = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT symbol FROM nse_equity_data ORDER BY symbol",
        )
        .fetch_all(self.client.pool())
        .instrument(self.span.clone())
        .await;
        self.span
            .in_scope(|| settle_read(self.read_policy, "list_symbols", result))
    }

    /// Gets the earliest and latest date stored for a symbol.
    ///
    /// # Returns
    /// A tuple of (earliest, latest), or None if no data exists.
    ///
    /// # Errors
    /// Only under [`ReadPolicy::Propagate`].
    pub async fn date_range(&self, symbol: &str) -> StoreResult<Option<(NaiveDate, NaiveDate)>> {
        let result = sqlx::query_as::<_, (Option<NaiveDate>, Option<NaiveDate>)>(
            "SELECT MIN(date), MAX(date) FROM nse_equity_data WHERE symbol = $1",
        )
        .bind(symbol)
        .fetch_one(self.client.pool())
        .instrument(self.span.clone())
        .await
        .map(|row| match row {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        });
        self.span
            .in_scope(|| settle_read(self.read_policy, "date_range", result))
    }

    /// Counts the rows stored for a symbol.
    ///
    /// # Errors
    /// Only under [`ReadPolicy::Propagate`].
    pub async fn count_bars(&self, symbol: &str) -> StoreResult<i64> {
        let result =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM nse_equity_data WHERE symbol = $1")
                .bind(symbol)
                .fetch_one(self.client.pool())
                .instrument(self.span.clone())
                .await;
        self.span
            .in_scope(|| settle_read(self.read_policy, "count_bars", result))
    }
}

fn bind_upsert(
    bar: &EquityBar,
) -> sqlx::query::Query<'_, Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(UPSERT_SQL)
        .bind(&bar.symbol)
        .bind(bar.date)
        .bind(bar.open)
        .bind(bar.high)
        .bind(bar.low)
        .bind(bar.close)
        .bind(bar.volume)
}

fn bars_query(
    symbol: &str,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new(SELECT_COLUMNS);
    builder.push(" WHERE symbol = ").push_bind(symbol);
    push_date_range(&mut builder, start_date, end_date);
    builder.push(" ORDER BY date ASC");
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use ohlcv_store_core::DatabaseConfig;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn unreachable_repo() -> EquityRepository {
        let config = DatabaseConfig {
            url: "postgresql://postgres@127.0.0.1:1/unreachable".to_string(),
            max_connections: 1,
            acquire_timeout_secs: 1,
        };
        EquityRepository::new(DatabaseClient::connect_lazy(&config).unwrap())
    }

    #[test]
    fn test_bars_query_without_filters() {
        let builder = bars_query("RELIANCE", None, None);
        assert_eq!(
            builder.sql(),
            format!("{SELECT_COLUMNS} WHERE symbol = $1 ORDER BY date ASC")
        );
    }

    #[test]
    fn test_bars_query_with_range() {
        let builder = bars_query("RELIANCE", Some(day(2)), Some(day(2)));
        assert!(builder
            .sql()
            .ends_with("WHERE symbol = $1 AND date >= $2 AND date <= $3 ORDER BY date ASC"));
    }

    #[test]
    fn test_upsert_updates_only_value_columns() {
        let update = UPSERT_SQL.split("DO UPDATE SET").nth(1).unwrap();
        assert!(!update.contains("symbol ="));
        assert!(!update.contains(" date ="));
        for column in ["open_price", "high_price", "low_price", "close_price", "volume"] {
            assert!(update.contains(&format!("{column} = EXCLUDED.{column}")));
        }
    }

    #[tokio::test]
    async fn test_invalid_bar_rejected_before_database() {
        let repo = unreachable_repo();
        let mut bar = EquityBar::empty("RELIANCE", day(1));
        bar.volume = Some(-10);

        let err = repo.upsert_bar(&bar).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidBar(_)));
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let repo = unreachable_repo();
        let bar = EquityBar::new(
            "RELIANCE",
            day(1),
            dec!(2500),
            dec!(2520),
            dec!(2480),
            dec!(2510),
            1_000_000,
        );

        let err = repo.upsert_bar(&bar).await.unwrap_err();
        assert!(err.is_connection());
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let repo = unreachable_repo();
        assert_eq!(repo.upsert_bars(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_degraded_reads_return_empty() {
        let repo = unreachable_repo();
        assert_eq!(repo.read_policy(), ReadPolicy::Degrade);

        assert!(repo.query_bars("RELIANCE", None, None).await.unwrap().is_empty());
        assert!(repo.list_symbols().await.unwrap().is_empty());
        assert!(repo.date_range("RELIANCE").await.unwrap().is_none());
        assert_eq!(repo.count_bars("RELIANCE").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_propagated_reads_return_error() {
        let repo = unreachable_repo().with_read_policy(ReadPolicy::Propagate);

        let err = repo.query_bars("RELIANCE", None, None).await.unwrap_err();
        assert!(err.is_connection());
        assert!(repo.list_symbols().await.is_err());
        assert!(repo.date_range("RELIANCE").await.is_err());
    }
}
