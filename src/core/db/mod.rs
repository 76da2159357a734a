/// Database Module
///
/// The CRUD engine, organized leaf-first:
/// - **Values** (`value.rs`): parameter/result values and ordered column-value lists
/// - **Dialect** (`dialect.rs`): placeholder tokens and identifier quoting
/// - **Statement Building** (`builder.rs`): pure SQL text + parameter construction
/// - **Session Capability** (`session.rs`): the driver seam, plus the bundled
///   SQLite implementation (`sqlite.rs`)
/// - **Connection Management** (`connection.rs`): drain, ping, reconnect, cursor
/// - **Query Execution** (`query.rs`): runs statements on managed cursors
/// - **Result Mapping** (`result.rs`): row normalization, `Rows` and `Record`
///
/// ## Error Handling
///
/// All database operations use the standardized `DbError` type.
pub mod builder;
pub mod connection;
pub mod dialect;
pub mod query;
pub mod result;
pub mod session;
pub mod sqlite;
pub mod value;

pub use builder::*;
pub use connection::*;
pub use dialect::*;
pub use query::*;
pub use result::*;
pub use session::*;
pub use sqlite::*;
pub use value::*;
