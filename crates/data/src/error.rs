//! Error types for the bar stores.
//!
//! Separates connection problems from integrity violations and plain query
//! failures so callers can decide what to surface.

use thiserror::Error;

/// Errors returned by the equity and derivatives stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be reached or refused the credentials.
    #[error("connection error: {0}")]
    Connection(String),

    /// A write violated an integrity constraint. The transaction was rolled back.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The server aborted the transaction on a serialization failure or deadlock.
    /// Nothing was written.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// Any other failure while writing. The transaction was rolled back.
    #[error("write failed: {0}")]
    Write(String),

    /// A read query failed.
    #[error("read failed: {0}")]
    Read(String),

    /// The bar failed validation and was never sent to the database.
    #[error("invalid bar: {0}")]
    InvalidBar(String),
}

impl StoreError {
    /// Classifies a sqlx error raised while writing.
    pub fn from_write(err: sqlx::Error) -> Self {
        if is_connection_error(&err) {
            return Self::Connection(err.to_string());
        }
        match &err {
            sqlx::Error::Database(db) if is_integrity_violation(db.kind()) => {
                Self::Constraint(db.message().to_string())
            }
            sqlx::Error::Database(db) if is_transaction_conflict(db.code().as_deref()) => {
                Self::Conflict(db.message().to_string())
            }
            _ => Self::Write(err.to_string()),
        }
    }

    /// Classifies a sqlx error raised while reading.
    pub fn from_read(err: sqlx::Error) -> Self {
        if is_connection_error(&err) {
            return Self::Connection(err.to_string());
        }
        match &err {
            sqlx::Error::Database(db) if is_transaction_conflict(db.code().as_deref()) => {
                Self::Conflict(db.message().to_string())
            }
            _ => Self::Read(err.to_string()),
        }
    }

    /// Creates a validation error.
    pub fn invalid_bar(reason: impl Into<String>) -> Self {
        Self::InvalidBar(reason.into())
    }

    /// Returns true if the storage engine could not be reached.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns true if repeating the call could succeed: the server was
    /// unreachable or aborted the transaction on a conflict. The stores never
    /// retry on their own.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Conflict(_))
    }
}

fn is_connection_error(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Configuration(_)
    )
}

/// `serialization_failure` and `deadlock_detected`.
fn is_transaction_conflict(code: Option<&str>) -> bool {
    matches!(code, Some("40001" | "40P01"))
}

fn is_integrity_violation(kind: sqlx::error::ErrorKind) -> bool {
    matches!(
        kind,
        sqlx::error::ErrorKind::UniqueViolation
            | sqlx::error::ErrorKind::ForeignKeyViolation
            | sqlx::error::ErrorKind::NotNullViolation
            | sqlx::error::ErrorKind::CheckViolation
    )
}

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
