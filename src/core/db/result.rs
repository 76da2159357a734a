/// Result Mapping Module
///
/// Normalizes raw driver rows. Two shapes come out: a lazy `Rows` iterator
/// that owns its cursor, and eagerly built `Record`s keyed by column name.

use crate::core::db::session::Cursor;
use crate::core::db::value::Value;
use crate::core::Result;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::ops::Index;

/// One result row, values in column order.
pub type Row = Vec<Value>;

/// Decodes blobs holding valid UTF-8 into text. Everything else, including
/// blobs that are not UTF-8, passes through unchanged.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Blob(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Value::Text(text),
            Err(e) => Value::Blob(e.into_bytes()),
        },
        other => other,
    }
}

pub fn normalize_row(row: Row) -> Row {
    row.into_iter().map(normalize).collect()
}

/// Lazy, single-pass row sequence over a live cursor.
///
/// The cursor is released as soon as the rows run out, a fetch fails, or the
/// iterator is dropped. Dropping it early leaves the remaining rows unread on
/// the session; they are drained before the next statement runs.
pub struct Rows<'a> {
    cursor: Option<Box<dyn Cursor + 'a>>,
    columns: Vec<String>,
}

impl<'a> Rows<'a> {
    pub(crate) fn new(cursor: Box<dyn Cursor + 'a>) -> Self {
        let columns = cursor.description().to_vec();
        Rows {
            cursor: Some(cursor),
            columns,
        }
    }

    /// Column names reported for this result.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether the cursor has been released.
    pub fn is_closed(&self) -> bool {
        self.cursor.is_none()
    }
}

impl Iterator for Rows<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;
        match cursor.fetch_one() {
            Ok(Some(row)) => Some(Ok(normalize_row(row))),
            Ok(None) => {
                self.cursor = None;
                None
            }
            Err(e) => {
                self.cursor = None;
                Some(Err(e))
            }
        }
    }
}

/// A row keyed by column name. Keeps the column order the cursor reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(columns: &[String], row: Row) -> Self {
        Record {
            fields: columns.iter().cloned().zip(row).collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn into_row(self) -> Row {
        self.fields.into_iter().map(|(_, value)| value).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Index<&str> for Record {
    type Output = Value;

    fn index(&self, column: &str) -> &Value {
        match self.get(column) {
            Some(value) => value,
            None => panic!("no column named {column} in record"),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Pulls every row off `cursor`, normalizes it and pairs it with the cursor's
/// column names. The cursor is fully consumed before this returns.
pub fn collect_records<C: Cursor + ?Sized>(cursor: &mut C) -> Result<Vec<Record>> {
    let columns = cursor.description().to_vec();
    let mut records = Vec::new();
    while let Some(row) = cursor.fetch_one()? {
        records.push(Record::new(&columns, normalize_row(row)));
    }
    Ok(records)
}
