//! Typed error type for the db crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlx error: {0}")]
    Sqlx(sqlx::Error),

    #[error("row not found")]
    NotFound,

    /// A unique constraint rejected the write.
    #[error("unique constraint failed: {0}")]
    Conflict(String),

    /// Another writer held the database lock past the busy timeout.
    #[error("database is busy: {0}")]
    Busy(String),

    /// A stored row could not be decoded into its typed form.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::Conflict(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) if is_busy(db_err.as_ref()) => {
                DbError::Busy(db_err.message().to_string())
            }
            err => DbError::Sqlx(err),
        }
    }
}

/// `SQLITE_BUSY` or `SQLITE_LOCKED`, including their extended codes.
fn is_busy(err: &dyn sqlx::error::DatabaseError) -> bool {
    err.code()
        .and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| matches!(code & 0xff, 5 | 6))
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Corrupt(err.to_string())
    }
}

impl From<uuid::Error> for DbError {
    fn from(err: uuid::Error) -> Self {
        DbError::Corrupt(err.to_string())
    }
}
