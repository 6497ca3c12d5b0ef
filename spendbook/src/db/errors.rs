//! Database error classification.
//!
//! Converts raw [`sqlx::Error`] values into a small taxonomy the service
//! layer can map onto HTTP statuses without inspecting driver internals.

use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum DbError {
    /// Query expected a row but none matched
    #[error("Record not found")]
    NotFound,

    /// A UNIQUE constraint rejected the write
    #[error("Unique constraint violation: {message}")]
    UniqueViolation {
        constraint: Option<String>,
        message: String,
    },

    /// Any other driver or connection failure
    #[error(transparent)]
    Other(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                // SQLite reports the column list in the message, e.g.
                // "UNIQUE constraint failed: users.email"
                DbError::UniqueViolation {
                    constraint: db_err.constraint().map(|c| c.to_string()),
                    message: db_err.message().to_string(),
                }
            }
            _ => DbError::Other(err),
        }
    }
}

/// Result alias for repository operations
pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
    /// True when the violated constraint involves the given table.column.
    pub fn violates(&self, column: &str) -> bool {
        match self {
            DbError::UniqueViolation { constraint, message } => {
                constraint.as_deref().is_some_and(|c| c.contains(column)) || message.contains(column)
            }
            _ => false,
        }
    }
}
