/// Query Execution Module
///
/// Runs built statements on cursors handed out by the connection manager.
/// Streaming reads give the cursor to the returned `Rows`; everything else
/// consumes and releases the cursor before returning.

use crate::core::db::builder::Statement;
use crate::core::db::connection::ConnectionManager;
use crate::core::db::result::{collect_records, Record, Rows};
use crate::core::db::session::Session;
use crate::core::Result;
use tracing::debug;

/// Query execution service that operates on a connection manager
pub struct QueryExecutor<'m, S: Session> {
    manager: &'m mut ConnectionManager<S>,
}

impl<'m, S: Session> QueryExecutor<'m, S> {
    pub fn new(manager: &'m mut ConnectionManager<S>) -> Self {
        QueryExecutor { manager }
    }

    /// Executes `statement` and hands back its rows lazily.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` if no live cursor can be obtained, or the
    /// engine's error if the statement fails.
    pub fn stream(self, statement: &Statement) -> Result<Rows<'m>> {
        log_statement(statement);
        let mut cursor = self.manager.acquire_cursor()?;
        cursor.execute(&statement.sql, &statement.params)?;
        Ok(Rows::new(cursor))
    }

    /// Executes `statement` and returns every row as a `Record`.
    pub fn fetch_records(self, statement: &Statement) -> Result<Vec<Record>> {
        log_statement(statement);
        let mut cursor = self.manager.acquire_cursor()?;
        cursor.execute(&statement.sql, &statement.params)?;
        collect_records(cursor.as_mut())
    }

    /// Executes `statement` to completion and returns the generated row id, or
    /// 0 if the engine generated none.
    pub fn run(self, statement: &Statement) -> Result<i64> {
        log_statement(statement);
        let mut cursor = self.manager.acquire_cursor()?;
        cursor.execute(&statement.sql, &statement.params)?;
        while cursor.fetch_one()?.is_some() {}
        Ok(cursor.last_row_id().unwrap_or(0))
    }
}

fn log_statement(statement: &Statement) {
    debug!(params = statement.params.len(), "sql: {}", statement.sql);
}
