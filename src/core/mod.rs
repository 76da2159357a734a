/// Core Module for tabledb
///
/// Holds the database layer and the error type every other module builds on.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{DbError, Result};
