//! Table-level CRUD over a single session.
//!
//! `Database` ties a dialect, a default table and a connection manager
//! together. Each operation builds its statement, logs it and runs it on a
//! fresh cursor.

use crate::config::DbConfig;
use crate::core::db::builder::{Columns, Filter, Limit, QueryBuilder, Statement};
use crate::core::db::connection::ConnectionManager;
use crate::core::db::dialect::Dialect;
use crate::core::db::query::QueryExecutor;
use crate::core::db::result::{Record, Rows};
use crate::core::db::session::{Connector, Session, SessionState};
use crate::core::db::sqlite::{SqliteConnector, SqliteSession};
use crate::core::db::value::ColumnValues;
use crate::core::{DbError, Result};
use tracing::debug;

/// CRUD handle over one session.
///
/// Every operation takes `&mut self`, and a live `Rows` borrows the handle, so
/// one instance is never used from two places at once. The session itself
/// stays behind the connection manager:
///
/// ```compile_fail
/// let mut db = tabledb::Database::open_in_memory().unwrap();
/// db.session_mut();
/// ```
#[derive(Debug)]
pub struct Database<S: Session = SqliteSession> {
    manager: ConnectionManager<S>,
    builder: QueryBuilder,
    default_table: Option<String>,
}

impl Database<SqliteSession> {
    /// Opens the SQLite database named by `config.database`.
    pub fn open(config: &DbConfig) -> Result<Self> {
        Self::connect(config, &SqliteConnector)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(&DbConfig::in_memory())
    }
}

impl<S: Session> Database<S> {
    /// Opens a session through `connector` and applies the dialect and default
    /// table from `config`.
    ///
    /// # Errors
    ///
    /// Returns whatever the connector reports, normally `DbError::Connection`.
    pub fn connect<C>(config: &DbConfig, connector: &C) -> Result<Self>
    where
        C: Connector<Session = S>,
    {
        let session = connector.connect(config)?;
        debug!("Connected to {}", config.database);
        let mut database = Self::from_session(session, config.dialect());
        database.default_table = config.default_table.clone();
        Ok(database)
    }

    /// Wraps an already connected session.
    pub fn from_session(session: S, dialect: Dialect) -> Self {
        Database {
            manager: ConnectionManager::new(session),
            builder: QueryBuilder::new(dialect),
            default_table: None,
        }
    }

    /// Sets the table used when an operation is given `None`.
    #[must_use]
    pub fn with_default_table(mut self, table: impl Into<String>) -> Self {
        self.default_table = Some(table.into());
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.builder.dialect()
    }

    pub fn state(&self) -> SessionState {
        self.manager.state()
    }

    #[cfg(test)]
    pub(crate) fn session_mut(&mut self) -> &mut S {
        self.manager.session_mut()
    }

    /// Streams the rows matching `filter`. The cursor stays open until the
    /// returned iterator is exhausted or dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// # use tabledb::{ColumnValues, Database, Value};
    /// # let mut db = Database::open_in_memory()?;
    /// # db.execute(&tabledb::Statement::new("CREATE TABLE test (name, age)", vec![]))?.count();
    /// db.insert(Some("test"), ColumnValues::new().with("name", "binux").with("age", 23))?;
    /// let mut rows = db.select(Some("test"), "name, age", None, None)?;
    /// assert_eq!(rows.next().unwrap()?, vec![Value::from("binux"), Value::from(23)]);
    /// # Ok::<(), tabledb::DbError>(())
    /// ```
    pub fn select(
        &mut self,
        table: Option<&str>,
        columns: impl Into<Columns>,
        filter: Option<Filter>,
        limit: Option<Limit>,
    ) -> Result<Rows<'_>> {
        let table = self.table(table)?;
        let statement = self
            .builder
            .select(table, &columns.into(), filter.as_ref(), limit);
        QueryExecutor::new(&mut self.manager).stream(&statement)
    }

    /// Like [`Database::select`], but reads every row up front and keys each
    /// one by column name.
    pub fn select_as_mapping(
        &mut self,
        table: Option<&str>,
        columns: impl Into<Columns>,
        filter: Option<Filter>,
        limit: Option<Limit>,
    ) -> Result<Vec<Record>> {
        let table = self.table(table)?;
        let statement = self
            .builder
            .select(table, &columns.into(), filter.as_ref(), limit);
        QueryExecutor::new(&mut self.manager).fetch_records(&statement)
    }

    /// Inserts one row and returns its generated id. An empty `values` inserts
    /// the table's default row.
    pub fn insert(&mut self, table: Option<&str>, values: ColumnValues) -> Result<i64> {
        let statement = self.builder.insert(self.table(table)?, &values);
        QueryExecutor::new(&mut self.manager).run(&statement)
    }

    /// Inserts or fully overwrites one row and returns its generated id.
    /// Columns missing from `values` fall back to their defaults.
    pub fn replace(&mut self, table: Option<&str>, values: ColumnValues) -> Result<i64> {
        let statement = self.builder.replace(self.table(table)?, &values);
        QueryExecutor::new(&mut self.manager).run(&statement)
    }

    /// Updates the rows matching `filter`. With no filter nothing is updated.
    pub fn update(
        &mut self,
        table: Option<&str>,
        filter: Option<Filter>,
        values: ColumnValues,
    ) -> Result<()> {
        let statement = self
            .builder
            .update(self.table(table)?, filter.as_ref(), &values)?;
        QueryExecutor::new(&mut self.manager).run(&statement)?;
        Ok(())
    }

    /// Deletes the rows matching `filter`. With no filter nothing is deleted.
    pub fn delete(&mut self, table: Option<&str>, filter: Option<Filter>) -> Result<()> {
        let statement = self.builder.delete(self.table(table)?, filter.as_ref());
        QueryExecutor::new(&mut self.manager).run(&statement)?;
        Ok(())
    }

    /// Runs a pre-built or hand-written statement and streams whatever it
    /// returns.
    pub fn execute(&mut self, statement: &Statement) -> Result<Rows<'_>> {
        QueryExecutor::new(&mut self.manager).stream(statement)
    }

    /// Releases the session.
    pub fn close(self) -> Result<()> {
        self.manager.close()
    }

    fn table<'a>(&'a self, table: Option<&'a str>) -> Result<&'a str> {
        table
            .or(self.default_table.as_deref())
            .ok_or_else(|| DbError::InvalidQuery("no table given and no default table set".to_string()))
    }
}
