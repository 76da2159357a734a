/// # Test Utilities Module
///
/// Shared fixtures for the unit and integration tests:
/// - `DatabaseFixture`: an in-memory SQLite `Database` with sample tables
/// - `ScriptedSession`: a `Session` double whose liveness, drain and reconnect
///   behavior is driven from the test through a shared `ScriptLog`
/// - error assertion helpers

use crate::core::db::builder::Statement;
use crate::core::db::session::{Cursor, Session};
use crate::core::db::value::Value;
use crate::core::{DbError, Result};
use crate::database::Database;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// In-memory SQLite database with the tables the scenario tests use
pub struct DatabaseFixture {
    pub db: Database,
}

impl DatabaseFixture {
    /// Creates an empty `test` table: autoincrement id plus untyped name and age.
    pub fn new() -> Result<Self> {
        let mut db = Database::open_in_memory()?.with_default_table("test");
        run(
            &mut db,
            "CREATE TABLE `test` (id INTEGER PRIMARY KEY AUTOINCREMENT, name, age)",
        )?;
        Ok(DatabaseFixture { db })
    }

    /// Adds a `users` table with a defaulted column and three rows.
    pub fn with_sample_data() -> Result<Self> {
        let mut fixture = Self::new()?;
        run(
            &mut fixture.db,
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                active INTEGER DEFAULT 1,
                avatar BLOB
            )",
        )?;
        for name in ["alice", "bob", "charlie"] {
            fixture.db.insert(
                Some("users"),
                crate::ColumnValues::new()
                    .with("username", name)
                    .with("avatar", name.as_bytes().to_vec()),
            )?;
        }
        Ok(fixture)
    }

    /// Number of rows currently in `table`.
    pub fn count(&mut self, table: &str) -> Result<i64> {
        let records = self.db.select_as_mapping(Some(table), "count(*) AS n", None, None)?;
        Ok(records[0]["n"].as_integer().unwrap_or_default())
    }
}

/// Runs one DDL or DML statement and discards whatever it returns.
pub fn run<S: Session>(db: &mut Database<S>, sql: &str) -> Result<()> {
    for row in db.execute(&Statement::new(sql, Vec::new()))? {
        row?;
    }
    Ok(())
}

/// Shared, test-controlled state of a `ScriptedSession`
#[derive(Debug)]
pub struct ScriptLog {
    pub alive: bool,
    pub closed: bool,
    pub fail_reconnect: bool,
    pub fail_drain: bool,
    pub fail_execute: Option<String>,
    pub pings: usize,
    pub reconnects: usize,
    pub drains: usize,
    pub executed: Vec<Statement>,
    pub next_row_id: Option<i64>,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    unread: VecDeque<Vec<Value>>,
}

impl ScriptLog {
    /// Result every following statement produces.
    pub fn serve(&mut self, columns: &[&str], rows: Vec<Vec<Value>>) {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self.rows = rows;
    }

    /// Pretends an earlier streaming read left `count` rows behind.
    pub fn leave_unread(&mut self, count: usize) {
        self.unread
            .extend((0..count).map(|i| vec![Value::Integer(i as i64)]));
    }
}

pub type SharedLog = Rc<RefCell<ScriptLog>>;

/// `Session` double backed by a `ScriptLog`
#[derive(Debug)]
pub struct ScriptedSession {
    log: SharedLog,
}

impl ScriptedSession {
    pub fn new() -> (Self, SharedLog) {
        let log = Rc::new(RefCell::new(ScriptLog {
            alive: true,
            closed: false,
            fail_reconnect: false,
            fail_drain: false,
            fail_execute: None,
            pings: 0,
            reconnects: 0,
            drains: 0,
            executed: Vec::new(),
            next_row_id: None,
            columns: Vec::new(),
            rows: Vec::new(),
            unread: VecDeque::new(),
        }));
        (ScriptedSession { log: Rc::clone(&log) }, log)
    }
}

impl Session for ScriptedSession {
    fn ping(&mut self) -> Result<()> {
        let mut log = self.log.borrow_mut();
        log.pings += 1;
        if log.alive {
            Ok(())
        } else {
            Err(DbError::Connection("server has gone away".to_string()))
        }
    }

    fn is_connected(&self) -> bool {
        self.log.borrow().alive
    }

    fn reconnect(&mut self) -> Result<()> {
        let mut log = self.log.borrow_mut();
        log.reconnects += 1;
        if log.fail_reconnect {
            return Err(DbError::Connection("connection refused".to_string()));
        }
        log.alive = true;
        Ok(())
    }

    fn has_unread_result(&self) -> bool {
        !self.log.borrow().unread.is_empty()
    }

    fn drain_unread_result(&mut self) -> Result<usize> {
        let mut log = self.log.borrow_mut();
        log.drains += 1;
        if log.fail_drain {
            return Err(DbError::Query("commands out of sync".to_string()));
        }
        let drained = log.unread.len();
        log.unread.clear();
        Ok(drained)
    }

    fn cursor(&mut self) -> Result<Box<dyn Cursor + '_>> {
        Ok(Box::new(ScriptedCursor {
            log: Rc::clone(&self.log),
            columns: Vec::new(),
            last_row_id: None,
        }))
    }

    fn close(&mut self) -> Result<()> {
        let mut log = self.log.borrow_mut();
        log.closed = true;
        log.alive = false;
        Ok(())
    }
}

struct ScriptedCursor {
    log: SharedLog,
    columns: Vec<String>,
    last_row_id: Option<i64>,
}

impl Cursor for ScriptedCursor {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<()> {
        let mut log = self.log.borrow_mut();
        log.executed.push(Statement::new(sql, params.to_vec()));
        if let Some(msg) = log.fail_execute.clone() {
            return Err(DbError::Query(msg));
        }
        self.columns = log.columns.clone();
        self.last_row_id = log.next_row_id;
        log.unread = log.rows.iter().cloned().collect();
        Ok(())
    }

    fn description(&self) -> &[String] {
        &self.columns
    }

    fn fetch_one(&mut self) -> Result<Option<Vec<Value>>> {
        Ok(self.log.borrow_mut().unread.pop_front())
    }

    fn last_row_id(&self) -> Option<i64> {
        self.last_row_id
    }
}

/// Error assertion helpers
pub mod error_testing {
    use crate::core::DbError;

    /// Asserts `result` failed and its message mentions `fragment`.
    pub fn assert_error_mentions<T>(result: &std::result::Result<T, DbError>, fragment: &str) {
        match result {
            Ok(_) => panic!("Expected error mentioning '{}' but got Ok", fragment),
            Err(e) => {
                let error_str = e.to_string();
                assert!(
                    error_str.to_lowercase().contains(&fragment.to_lowercase()),
                    "Expected '{}' in error message '{}'",
                    fragment,
                    error_str
                );
            }
        }
    }
}
