/// tabledb Error Module
///
/// Defines the error type shared by every layer of the crate, from session
/// management through statement building to result mapping.
use thiserror::Error;

/// Error type for all tabledb operations.
///
/// Engine errors are passed through untouched; the crate never interprets or
/// translates what the database reports.
#[derive(Error, Debug)]
pub enum DbError {
    /// Connect or reconnect failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Error reported by SQLite, verbatim
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Error reported by a non-SQLite engine
    #[error("Query error: {0}")]
    Query(String),

    /// A statement that cannot be built (no table, nothing to update)
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Failure while discarding a stale result. Logged, never returned.
    #[error("Drain error: {0}")]
    Drain(String),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Result to use DbError as the error type.
pub type Result<T> = std::result::Result<T, DbError>;
