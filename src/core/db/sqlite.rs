/// SQLite Session Module
///
/// The bundled `Session` implementation over rusqlite. A file path gives a
/// persistent database; `:memory:` gives a private in-memory one.
///
/// A statement that returns rows is stepped one row per fetch. While it is
/// open the connection lives inside `PendingRows` together with the prepared
/// statement and its row cursor, so rows a caller never fetched stay behind as
/// the session's unread result until the next cursor drains them.

use crate::config::DbConfig;
use crate::core::db::session::{Connector, Cursor, Session};
use crate::core::db::value::Value;
use crate::core::{DbError, Result};
use ouroboros::self_referencing;
use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, Rows, Statement, ToSql};
use std::fmt;
use tracing::debug;

const MEMORY_PATH: &str = ":memory:";

/// Opens `SqliteSession`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteConnector;

impl Connector for SqliteConnector {
    type Session = SqliteSession;

    fn connect(&self, config: &DbConfig) -> Result<SqliteSession> {
        if config.host.is_some() || config.user.is_some() || config.auth_plugin.is_some() {
            debug!("SQLite session ignores host, user and auth plugin settings");
        }
        SqliteSession::open(&config.database)
    }
}

/// A connection with one statement mid-flight.
#[self_referencing]
struct PendingRows {
    connection: Connection,
    #[borrows(connection)]
    #[covariant]
    statement: Statement<'this>,
    #[borrows(mut statement)]
    #[not_covariant]
    rows: Rows<'this>,
}

enum Link {
    Idle(Connection),
    Streaming(PendingRows),
    Down,
}

/// A single rusqlite connection, possibly with an open result.
pub struct SqliteSession {
    path: String,
    link: Link,
}

impl fmt::Debug for SqliteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let link = match self.link {
            Link::Idle(_) => "idle",
            Link::Streaming(_) => "streaming",
            Link::Down => "down",
        };
        f.debug_struct("SqliteSession")
            .field("path", &self.path)
            .field("link", &link)
            .finish()
    }
}

impl SqliteSession {
    /// Opens the database at `path`, or an in-memory one for `:memory:`.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` if the database cannot be opened.
    pub fn open(path: &str) -> Result<Self> {
        let connection = open_connection(path)?;
        debug!("Opened SQLite session at {}", path);
        Ok(SqliteSession {
            path: path.to_string(),
            link: Link::Idle(connection),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(MEMORY_PATH)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Drops the connection without closing the session for good, as a lost
    /// network link would. The next ping fails and a reconnect reopens it.
    pub fn disconnect(&mut self) {
        self.link = Link::Down;
    }

    fn connection(&self) -> Result<&Connection> {
        match &self.link {
            Link::Idle(connection) => Ok(connection),
            Link::Streaming(pending) => Ok(pending.borrow_connection()),
            Link::Down => Err(DbError::Connection(format!(
                "session for {} is disconnected",
                self.path
            ))),
        }
    }

    /// Finalizes the open statement, if any, and keeps the connection.
    fn release_rows(&mut self) {
        self.link = match std::mem::replace(&mut self.link, Link::Down) {
            Link::Streaming(pending) => Link::Idle(pending.into_heads().connection),
            other => other,
        };
    }

    fn take_connection(&mut self) -> Result<Connection> {
        self.release_rows();
        match std::mem::replace(&mut self.link, Link::Down) {
            Link::Idle(connection) => Ok(connection),
            _ => Err(DbError::Connection(format!(
                "session for {} is disconnected",
                self.path
            ))),
        }
    }
}

impl Session for SqliteSession {
    fn ping(&mut self) -> Result<()> {
        self.connection()?.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        !matches!(self.link, Link::Down)
    }

    fn reconnect(&mut self) -> Result<()> {
        if self.path == MEMORY_PATH {
            debug!("Reconnecting an in-memory session starts from an empty database");
        }
        self.link = Link::Down;
        self.link = Link::Idle(open_connection(&self.path)?);
        Ok(())
    }

    fn has_unread_result(&self) -> bool {
        matches!(self.link, Link::Streaming(_))
    }

    fn drain_unread_result(&mut self) -> Result<usize> {
        let mut drained = 0;
        let stepped: rusqlite::Result<()> = match &mut self.link {
            Link::Streaming(pending) => pending.with_rows_mut(|rows| {
                while rows.next()?.is_some() {
                    drained += 1;
                }
                Ok(())
            }),
            _ => Ok(()),
        };
        self.release_rows();
        stepped?;
        Ok(drained)
    }

    fn cursor(&mut self) -> Result<Box<dyn Cursor + '_>> {
        self.connection()?;
        Ok(Box::new(SqliteCursor {
            session: self,
            columns: Vec::new(),
            last_row_id: None,
        }))
    }

    fn close(&mut self) -> Result<()> {
        self.release_rows();
        match std::mem::replace(&mut self.link, Link::Down) {
            Link::Idle(connection) => connection.close().map_err(|(_, e)| DbError::Database(e)),
            _ => Ok(()),
        }
    }
}

struct SqliteCursor<'s> {
    session: &'s mut SqliteSession,
    columns: Vec<String>,
    last_row_id: Option<i64>,
}

impl SqliteCursor<'_> {
    fn finish(&mut self) {
        self.session.release_rows();
        self.last_row_id = self
            .session
            .connection()
            .ok()
            .map(|connection| connection.last_insert_rowid());
    }
}

impl Cursor for SqliteCursor<'_> {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<()> {
        let connection = self.session.take_connection()?;
        let mut columns = Vec::new();
        let opened = PendingRows::try_new_or_recover(
            connection,
            |connection| {
                connection.prepare(sql).map(|statement| {
                    columns = statement.column_names().into_iter().map(String::from).collect();
                    statement
                })
            },
            |statement| statement.query(params_from_iter(params.iter())),
        );

        match opened {
            Ok(pending) => self.session.link = Link::Streaming(pending),
            Err((e, heads)) => {
                self.session.link = Link::Idle(heads.connection);
                return Err(DbError::Database(e));
            }
        }
        self.columns = columns;
        self.last_row_id = None;

        // Statements without a result set run to completion here
        if self.columns.is_empty() {
            while self.fetch_one()?.is_some() {}
        }
        Ok(())
    }

    fn description(&self) -> &[String] {
        &self.columns
    }

    fn fetch_one(&mut self) -> Result<Option<Vec<Value>>> {
        let width = self.columns.len();
        let fetched = match &mut self.session.link {
            Link::Streaming(pending) => pending.with_rows_mut(|rows| next_values(rows, width)),
            _ => return Ok(None),
        };

        match fetched {
            Ok(Some(values)) => Ok(Some(values)),
            Ok(None) => {
                self.finish();
                Ok(None)
            }
            Err(e) => {
                self.finish();
                Err(DbError::Database(e))
            }
        }
    }

    fn last_row_id(&self) -> Option<i64> {
        self.last_row_id
    }
}

/// Steps the statement once and copies out the row it lands on.
fn next_values(rows: &mut Rows<'_>, width: usize) -> rusqlite::Result<Option<Vec<Value>>> {
    let row = match rows.next()? {
        Some(row) => row,
        None => return Ok(None),
    };
    let mut values = Vec::with_capacity(width);
    for i in 0..width {
        values.push(Value::from(row.get_ref(i)?));
    }
    Ok(Some(values))
}

fn open_connection(path: &str) -> Result<Connection> {
    let connection = if path == MEMORY_PATH {
        Connection::open_in_memory()
    } else {
        Connection::open(path)
    };
    connection.map_err(|e| DbError::Connection(format!("failed to open {path}: {e}")))
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => match String::from_utf8(t.to_vec()) {
                Ok(text) => Value::Text(text),
                Err(e) => Value::Blob(e.into_bytes()),
            },
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}
