//! Error types for the SQLite driver.

use entity_schema_discovery::DriverError;
use thiserror::Error;

/// Errors that can occur while talking to SQLite.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// The request needs a feature SQLite does not have.
    #[error("{0}")]
    Unsupported(&'static str),
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;

impl From<SqliteError> for DriverError {
    /// Keeps SQLite's own message, without the `database error:` prefix.
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::DatabaseError(e) => DriverError::new(e.to_string()),
            SqliteError::Unsupported(message) => DriverError::new(message),
        }
    }
}
