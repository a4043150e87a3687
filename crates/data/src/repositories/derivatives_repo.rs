//! Futures and options bar repository.
//!
//! Owns `nse_futures_data` and `nse_options_data`. Mirrors the equity store:
//! upserts on the natural key, optional filters combined with AND, results
//! ordered by trading date.

use chrono::NaiveDate;
use ohlcv_store_core::ReadPolicy;
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};
use tracing::{Instrument as _, Span};

use super::{apply_ddl, push_date_range, settle_read};
use crate::database::DatabaseClient;
use crate::error::{StoreError, StoreResult};
use crate::models::{FutureBar, FutureQuery, Instrument, OptionBar, OptionQuery, OptionType};
use crate::schema::DERIVATIVES_DDL;

const UPSERT_FUTURE_SQL: &str = r"
    INSERT INTO nse_futures_data
        (symbol, expiry_date, date, open_price, high_price, low_price, close_price, volume, open_interest)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
    ON CONFLICT (symbol, expiry_date, date) DO UPDATE SET
        open_price = EXCLUDED.open_price,
        high_price = EXCLUDED.high_price,
        low_price = EXCLUDED.low_price,
        close_price = EXCLUDED.close_price,
        volume = EXCLUDED.volume,
        open_interest = EXCLUDED.open_interest
";

const UPSERT_OPTION_SQL: &str = r"
    INSERT INTO nse_options_data
        (symbol, expiry_date, strike_price, option_type, date,
         open_price, high_price, low_price, close_price, volume, open_interest)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
    ON CONFLICT (symbol, expiry_date, strike_price, option_type, date) DO UPDATE SET
        open_price = EXCLUDED.open_price,
        high_price = EXCLUDED.high_price,
        low_price = EXCLUDED.low_price,
        close_price = EXCLUDED.close_price,
        volume = EXCLUDED.volume,
        open_interest = EXCLUDED.open_interest
";

const SELECT_FUTURES: &str = "SELECT symbol, expiry_date, date, open_price AS open, \
     high_price AS high, low_price AS low, close_price AS close, volume, open_interest \
     FROM nse_futures_data";

const SELECT_OPTIONS: &str = "SELECT symbol, expiry_date, strike_price, option_type, date, \
     open_price AS open, high_price AS high, low_price AS low, close_price AS close, volume, \
     open_interest FROM nse_options_data";

const FUTURES_EXPIRIES_SQL: &str =
    "SELECT DISTINCT expiry_date FROM nse_futures_data WHERE symbol = $1 ORDER BY expiry_date";

const OPTIONS_EXPIRIES_SQL: &str =
    "SELECT DISTINCT expiry_date FROM nse_options_data WHERE symbol = $1 ORDER BY expiry_date";

/// Repository for futures and options bars.
#[derive(Debug, Clone)]
pub struct DerivativesRepository {
    client: DatabaseClient,
    read_policy: ReadPolicy,
    span: Span,
}

impl DerivativesRepository {
    /// Creates a repository that degrades failed reads to empty results.
    #[must_use]
    pub fn new(client: DatabaseClient) -> Self {
        Self {
            client,
            read_policy: ReadPolicy::default(),
            span: tracing::info_span!("derivatives_store"),
        }
    }

    #[must_use]
    pub fn with_read_policy(mut self, read_policy: ReadPolicy) -> Self {
        self.read_policy = read_policy;
        self
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    #[must_use]
    pub fn read_policy(&self) -> ReadPolicy {
        self.read_policy
    }

    /// Creates the futures and options tables and their indexes if missing.
    ///
    /// # Errors
    /// Returns an error if the DDL transaction fails.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        async {
            apply_ddl(&self.client, DERIVATIVES_DDL).await.inspect_err(|e| {
                tracing::error!(error = %e, "failed to create derivatives schema");
            })?;
            tracing::info!("derivatives schema ready");
            Ok::<_, StoreError>(())
        }
        .instrument(self.span.clone())
        .await
    }

    /// Inserts a futures bar, or overwrites its values if
    /// (symbol, expiry_date, date) already exists.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidBar` for a bar that fails validation,
    /// otherwise any database failure after rollback.
    pub async fn upsert_future(&self, bar: &FutureBar) -> StoreResult<()> {
        bar.validate()?;
        let span = tracing::debug_span!(
            parent: &self.span,
            "upsert_future",
            symbol = %bar.symbol,
            expiry = %bar.expiry_date,
            date = %bar.date
        );

        async {
            let mut scope = self.client.begin_write().await?;
            sqlx::query(UPSERT_FUTURE_SQL)
                .bind(&bar.symbol)
                .bind(bar.expiry_date)
                .bind(bar.date)
                .bind(bar.open)
                .bind(bar.high)
                .bind(bar.low)
                .bind(bar.close)
                .bind(bar.volume)
                .bind(bar.open_interest)
                .execute(scope.conn())
                .await
                .map_err(StoreError::from_write)?;
            scope.commit().await
        }
        .instrument(span.clone())
        .await
        .inspect(|_| span.in_scope(|| tracing::debug!("upserted futures bar")))
        .inspect_err(|e| span.in_scope(|| tracing::error!(error = %e, "futures upsert failed")))
    }

    /// Inserts an options bar, or overwrites its values if
    /// (symbol, expiry_date, strike_price, option_type, date) already exists.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidBar` for a bar that fails validation,
    /// otherwise any database failure after rollback.
    pub async fn upsert_option(&self, bar: &OptionBar) -> StoreResult<()> {
        bar.validate()?;
        let span = tracing::debug_span!(
            parent: &self.span,
            "upsert_option",
            symbol = %bar.symbol,
            expiry = %bar.expiry_date,
            strike = %bar.strike_price,
            option_type = bar.option_type.as_str(),
            date = %bar.date
        );

        async {
            let mut scope = self.client.begin_write().await?;
            sqlx::query(UPSERT_OPTION_SQL)
                .bind(&bar.symbol)
                .bind(bar.expiry_date)
                .bind(bar.strike_price)
                .bind(bar.option_type.as_str())
                .bind(bar.date)
                .bind(bar.open)
                .bind(bar.high)
                .bind(bar.low)
                .bind(bar.close)
                .bind(bar.volume)
                .bind(bar.open_interest)
                .execute(scope.conn())
                .await
                .map_err(StoreError::from_write)?;
            scope.commit().await
        }
        .instrument(span.clone())
        .await
        .inspect(|_| span.in_scope(|| tracing::debug!("upserted options bar")))
        .inspect_err(|e| span.in_scope(|| tracing::error!(error = %e, "options upsert failed")))
    }

    /// Returns futures bars matching every filter that is set, oldest first.
    ///
    /// # Errors
    /// Only under [`ReadPolicy::Propagate`].
    pub async fn query_futures(&self, query: &FutureQuery) -> StoreResult<Vec<FutureBar>> {
        let mut builder = futures_query(SELECT_FUTURES, query);
        builder.push(" ORDER BY date ASC, expiry_date ASC");
        let result = builder
            .build_query_as::<FutureBar>()
            .fetch_all(self.client.pool())
            .instrument(self.span.clone())
            .await;
        self.span
            .in_scope(|| settle_read(self.read_policy, "query_futures", result))
    }

    /// Returns options bars matching every filter that is set, oldest first.
    /// Rows on the same date are ordered by strike, then calls before puts.
    ///
    /// # Errors
    /// Only under [`ReadPolicy::Propagate`].
    pub async fn query_options(&self, query: &OptionQuery) -> StoreResult<Vec<OptionBar>> {
        let mut builder = options_query(SELECT_OPTIONS, query);
        builder.push(" ORDER BY date ASC, strike_price ASC, option_type ASC");
        let result = builder
            .build_query_as::<OptionBar>()
            .fetch_all(self.client.pool())
            .instrument(self.span.clone())
            .await;
        self.span
            .in_scope(|| settle_read(self.read_policy, "query_options", result))
    }

    /// Counts futures rows matching the filters.
    ///
    /// # Errors
    /// Only under [`ReadPolicy::Propagate`].
    pub async fn count_futures(&self, query: &FutureQuery) -> StoreResult<i64> {
        let mut builder = futures_query("SELECT COUNT(*) FROM nse_futures_data", query);
        let result = builder
            .build_query_scalar::<i64>()
            .fetch_one(self.client.pool())
            .instrument(self.span.clone())
            .await;
        self.span
            .in_scope(|| settle_read(self.read_policy, "count_futures", result))
    }

    /// Counts options rows matching the filters.
    ///
    /// # Errors
    /// Only under [`ReadPolicy::Propagate`].
    pub async fn count_options(&self, query: &OptionQuery) -> StoreResult<i64> {
        let mut builder = options_query("SELECT COUNT(*) FROM nse_options_data", query);
        let result = builder
            .build_query_scalar::<i64>()
            .fetch_one(self.client.pool())
            .instrument(self.span.clone())
            .await;
        self.span
            .in_scope(|| settle_read(self.read_policy, "count_options", result))
    }

    /// Lists distinct expiry dates for a symbol in the chosen instrument's table, ascending.
    ///
    /// # Errors
    /// Only under [`ReadPolicy::Propagate`].
    pub async fn list_expiries(
        &self,
        symbol: &str,
        instrument: Instrument,
    ) -> StoreResult<Vec<NaiveDate>> {
        let sql = match instrument {
            Instrument::Futures => FUTURES_EXPIRIES_SQL,
            Instrument::Options => OPTIONS_EXPIRIES_SQL,
        };
        let result = sqlx::query_scalar::<_, NaiveDate>(sql)
            .bind(symbol)
            .fetch_all(self.client.pool())
            .instrument(self.span.clone())
            .await;
        self.span
            .in_scope(|| settle_read(self.read_policy, "list_expiries", result))
    }

    /// Lists distinct strikes for a symbol and expiry, optionally narrowed to
    /// one option type, ascending.
    ///
    /// # Errors
    /// Only under [`ReadPolicy::Propagate`].
    pub async fn list_strikes(
        &self,
        symbol: &str,
        expiry_date: NaiveDate,
        option_type: Option<OptionType>,
    ) -> StoreResult<Vec<Decimal>> {
        let mut builder = strikes_query(symbol, expiry_date, option_type);
        let result = builder
            .build_query_scalar::<Decimal>()
            .fetch_all(self.client.pool())
            .instrument(self.span.clone())
            .await;
        self.span
            .in_scope(|| settle_read(self.read_policy, "list_strikes", result))
    }
}

fn futures_query<'a>(head: &str, query: &'a FutureQuery) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(head);
    builder.push(" WHERE symbol = ").push_bind(query.symbol.as_str());
    if let Some(expiry) = query.expiry_date {
        builder.push(" AND expiry_date = ").push_bind(expiry);
    }
    push_date_range(&mut builder, query.start_date, query.end_date);
    builder
}

fn options_query<'a>(head: &str, query: &'a OptionQuery) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(head);
    builder.push(" WHERE symbol = ").push_bind(query.symbol.as_str());
    if let Some(option_type) = query.option_type {
        builder.push(" AND option_type = ").push_bind(option_type.as_str());
    }
    if let Some(strike) = query.strike_price {
        builder.push(" AND strike_price = ").push_bind(strike);
    }
    if let Some(expiry) = query.expiry_date {
        builder.push(" AND expiry_date = ").push_bind(expiry);
    }
    push_date_range(&mut builder, query.start_date, query.end_date);
    builder
}

fn strikes_query(
    symbol: &str,
    expiry_date: NaiveDate,
    option_type: Option<OptionType>,
) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new("SELECT DISTINCT strike_price FROM nse_options_data");
    builder.push(" WHERE symbol = ").push_bind(symbol);
    builder.push(" AND expiry_date = ").push_bind(expiry_date);
    if let Some(option_type) = option_type {
        builder.push(" AND option_type = ").push_bind(option_type.as_str());
    }
    builder.push(" ORDER BY strike_price");
    builder
}
