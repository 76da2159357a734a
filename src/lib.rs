// Core infrastructure modules
pub mod config;
pub mod core;

// Table-level CRUD facade
pub mod database;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
mod test_utils;

pub use crate::config::DbConfig;
pub use crate::core::db::{
    ColumnValues, Columns, Connector, Cursor, Dialect, EscapeStyle, Filter, Limit,
    PlaceholderStyle, Record, Row, Rows, Session, SessionState, SqliteConnector, SqliteSession,
    Statement, Value,
};
pub use crate::core::{DbError, Result};
pub use crate::database::Database;
