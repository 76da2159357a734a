/// Statement Builder Module
///
/// Turns table names, column selectors, where-fragments and column-value lists
/// into SQL text plus a positional parameter list. Nothing here touches a
/// session; every function is pure over its inputs and the instance dialect.

use crate::core::db::dialect::Dialect;
use crate::core::db::value::{ColumnValues, Value};
use crate::core::{DbError, Result};

/// Where-fragment used by update and delete when the caller supplies none.
/// Matches no rows.
pub const MATCH_NOTHING: &str = "1=0";

/// The five statement shapes the builder produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Select,
    Insert,
    Replace,
    Update,
    Delete,
}

impl QueryKind {
    fn verb(self) -> &'static str {
        match self {
            QueryKind::Select => "SELECT",
            QueryKind::Insert => "INSERT INTO",
            QueryKind::Replace => "REPLACE INTO",
            QueryKind::Update => "UPDATE",
            QueryKind::Delete => "DELETE FROM",
        }
    }
}

/// Column selector for a select.
///
/// A list is escaped entry by entry. A bare string is trusted SQL and goes into
/// the statement untouched, which is how aggregates and expressions get in.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Columns {
    #[default]
    All,
    List(Vec<String>),
    Raw(String),
}

impl From<&str> for Columns {
    fn from(raw: &str) -> Self {
        Columns::Raw(raw.to_string())
    }
}

impl From<String> for Columns {
    fn from(raw: String) -> Self {
        Columns::Raw(raw)
    }
}

impl From<Vec<String>> for Columns {
    fn from(list: Vec<String>) -> Self {
        Columns::List(list)
    }
}

impl From<Vec<&str>> for Columns {
    fn from(list: Vec<&str>) -> Self {
        Columns::List(list.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for Columns {
    fn from(list: &[&str]) -> Self {
        Columns::List(list.iter().map(|c| c.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Columns {
    fn from(list: [&str; N]) -> Self {
        Columns::List(list.iter().map(|c| c.to_string()).collect())
    }
}

/// A raw where-fragment and the parameters its placeholders bind to.
///
/// The fragment is not escaped; keeping it injection-free is the caller's job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clause: String,
    params: Vec<Value>,
}

impl Filter {
    pub fn new(clause: impl Into<String>) -> Self {
        Filter {
            clause: clause.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(clause: impl Into<String>, params: Vec<Value>) -> Self {
        Filter {
            clause: clause.into(),
            params,
        }
    }

    /// Appends one parameter.
    #[must_use]
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn clause(&self) -> &str {
        &self.clause
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    fn is_blank(&self) -> bool {
        self.clause.trim().is_empty()
    }
}

impl From<&str> for Filter {
    fn from(clause: &str) -> Self {
        Filter::new(clause)
    }
}

impl From<String> for Filter {
    fn from(clause: String) -> Self {
        Filter::new(clause)
    }
}

/// `LIMIT offset, count`. Both halves always travel together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub offset: u64,
    pub count: u64,
}

impl Limit {
    pub fn new(offset: u64, count: u64) -> Self {
        Limit { offset, count }
    }
}

/// SQL text plus the positional parameters it binds.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Statement {
            sql: sql.into(),
            params,
        }
    }
}

/// Builds statements for one dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryBuilder {
    dialect: Dialect,
}

impl QueryBuilder {
    pub fn new(dialect: Dialect) -> Self {
        QueryBuilder { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn select(
        &self,
        table: &str,
        columns: &Columns,
        filter: Option<&Filter>,
        limit: Option<Limit>,
    ) -> Statement {
        let what = match columns {
            Columns::All => "*".to_string(),
            Columns::List(list) if list.is_empty() => "*".to_string(),
            Columns::List(list) => list
                .iter()
                .map(|c| self.dialect.escape(c))
                .collect::<Vec<_>>()
                .join(","),
            Columns::Raw(raw) => raw.clone(),
        };

        let mut sql = format!(
            "{} {} FROM {}",
            QueryKind::Select.verb(),
            what,
            self.dialect.escape(table)
        );
        let mut params = Vec::new();
        if let Some(filter) = filter.filter(|f| !f.is_blank()) {
            sql.push_str(" WHERE ");
            sql.push_str(filter.clause());
            params.extend_from_slice(filter.params());
        }
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}, {}", limit.offset, limit.count));
        }

        Statement { sql, params }
    }

    pub fn insert(&self, table: &str, values: &ColumnValues) -> Statement {
        self.write(QueryKind::Insert, table, values)
    }

    pub fn replace(&self, table: &str, values: &ColumnValues) -> Statement {
        self.write(QueryKind::Replace, table, values)
    }

    /// `UPDATE ... SET ... WHERE ...`. Without a filter the statement matches
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidQuery` when `values` is empty.
    pub fn update(
        &self,
        table: &str,
        filter: Option<&Filter>,
        values: &ColumnValues,
    ) -> Result<Statement> {
        if values.is_empty() {
            return Err(DbError::InvalidQuery(format!(
                "update of {table} has no columns to set"
            )));
        }

        let assignments = values
            .columns()
            .enumerate()
            .map(|(i, column)| {
                format!("{} = {}", self.dialect.escape(column), self.dialect.placeholder(i + 1))
            })
            .collect::<Vec<_>>()
            .join(", ");

        let (clause, filter_params) = where_or_nothing(filter);
        let sql = format!(
            "{} {} SET {} WHERE {}",
            QueryKind::Update.verb(),
            self.dialect.escape(table),
            assignments,
            clause
        );

        let mut params: Vec<Value> = values.values().cloned().collect();
        params.extend_from_slice(filter_params);
        Ok(Statement { sql, params })
    }

    /// `DELETE FROM ... WHERE ...`. Without a filter the statement matches
    /// nothing.
    pub fn delete(&self, table: &str, filter: Option<&Filter>) -> Statement {
        let (clause, params) = where_or_nothing(filter);
        Statement {
            sql: format!(
                "{} {} WHERE {}",
                QueryKind::Delete.verb(),
                self.dialect.escape(table),
                clause
            ),
            params: params.to_vec(),
        }
    }

    fn write(&self, kind: QueryKind, table: &str, values: &ColumnValues) -> Statement {
        let table = self.dialect.escape(table);
        if values.is_empty() {
            return Statement {
                sql: format!("{} {} DEFAULT VALUES", kind.verb(), table),
                params: Vec::new(),
            };
        }

        let columns = values
            .columns()
            .map(|c| self.dialect.escape(c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=values.len())
            .map(|i| self.dialect.placeholder(i))
            .collect::<Vec<_>>()
            .join(", ");

        Statement {
            sql: format!("{} {} ({}) VALUES ({})", kind.verb(), table, columns, placeholders),
            params: values.values().cloned().collect(),
        }
    }
}

fn where_or_nothing(filter: Option<&Filter>) -> (&str, &[Value]) {
    match filter {
        Some(filter) if !filter.is_blank() => (filter.clause(), filter.params()),
        _ => (MATCH_NOTHING, &[]),
    }
}
