/// Session Capability Module
///
/// The seam between the CRUD layer and a concrete driver. A `Connector` opens a
/// `Session`; a `Session` hands out short-lived `Cursor`s that borrow it.

use crate::config::DbConfig;
use crate::core::db::value::Value;
use crate::core::Result;

/// Liveness of the underlying session, as seen by the connection manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Closed, or dropped and not yet reconnected
    Disconnected,
    /// Ready for a new statement
    Connected,
    /// A previous streaming read was abandoned before its last row
    PendingResult,
}

/// A driver session: one live connection to one database.
pub trait Session {
    /// Checks liveness. An error means the session has dropped.
    fn ping(&mut self) -> Result<()>;

    /// Whether the session believes it is connected, without a round trip.
    fn is_connected(&self) -> bool;

    /// Re-establishes a dropped session using its original parameters.
    fn reconnect(&mut self) -> Result<()>;

    /// Whether rows from an earlier statement are still waiting to be read.
    fn has_unread_result(&self) -> bool;

    /// Consumes and discards the unread result, returning how many rows were
    /// thrown away.
    fn drain_unread_result(&mut self) -> Result<usize>;

    /// Opens a cursor on this session.
    fn cursor(&mut self) -> Result<Box<dyn Cursor + '_>>;

    /// Releases the session. Nothing may be called afterwards.
    fn close(&mut self) -> Result<()>;
}

/// A statement cursor. Dropping it closes it.
pub trait Cursor {
    /// Runs `sql` with positional `params`.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<()>;

    /// Column names of the current result, in reported order. Empty for
    /// statements that produce no rows.
    fn description(&self) -> &[String];

    /// Next raw row, or `None` once the result is exhausted.
    fn fetch_one(&mut self) -> Result<Option<Vec<Value>>>;

    /// Row id generated by the last insert or replace on this cursor.
    fn last_row_id(&self) -> Option<i64>;
}

/// Opens sessions from configuration. Lets callers substitute a driver
/// without touching the CRUD layer.
pub trait Connector {
    type Session: Session;

    fn connect(&self, config: &DbConfig) -> Result<Self::Session>;
}
