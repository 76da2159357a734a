use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::core::db::dialect::{Dialect, EscapeStyle, PlaceholderStyle};
use crate::core::{DbError, Result};

/// Connection and dialect settings for one `Database` instance.
///
/// Network options are carried for drivers that need them; the bundled SQLite
/// session only reads `database`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DbConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Database name, or file path (`:memory:` for an in-memory SQLite database)
    pub database: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub auth_plugin: Option<String>,
    #[serde(default)]
    pub placeholder: PlaceholderStyle,
    #[serde(default)]
    pub escape: EscapeStyle,
    /// Table used when an operation does not name one
    pub default_table: Option<String>,
}

impl DbConfig {
    /// Config for a database with every optional setting left unset.
    pub fn new(database: impl Into<String>) -> Self {
        DbConfig {
            host: None,
            port: None,
            database: database.into(),
            user: None,
            password: None,
            auth_plugin: None,
            placeholder: PlaceholderStyle::default(),
            escape: EscapeStyle::default(),
            default_table: None,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    pub fn dialect(&self) -> Dialect {
        Dialect::new(self.placeholder, self.escape)
    }
}

/// Loads configuration from a TOML file at the given path.
///
/// # Example
///
/// ```no_run
/// let config = tabledb::config::load_config("tabledb.toml").expect("Failed to load config");
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DbConfig> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses configuration from TOML text.
pub fn parse_config(content: &str) -> Result<DbConfig> {
    toml::from_str(content).map_err(|e| DbError::Config(e.to_string()))
}
