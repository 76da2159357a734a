/// Dialect Module
///
/// Placeholder tokens and identifier quoting for the SQL variant an instance
/// targets. A `Dialect` is fixed for the lifetime of a `Database`.

use serde::Deserialize;

/// How bound parameters are spelled in generated SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderStyle {
    /// `%s` (MySQL connectors)
    Format,
    /// `?`
    #[default]
    Qmark,
    /// `?1`, `?2`, ...
    Numbered,
    /// `$1`, `$2`, ...
    Dollar,
}

impl PlaceholderStyle {
    /// Token for the parameter at 1-based `position`.
    pub fn token(self, position: usize) -> String {
        match self {
            PlaceholderStyle::Format => "%s".to_string(),
            PlaceholderStyle::Qmark => "?".to_string(),
            PlaceholderStyle::Numbered => format!("?{position}"),
            PlaceholderStyle::Dollar => format!("${position}"),
        }
    }
}

/// How table and column names are quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscapeStyle {
    /// `` `name` ``
    #[default]
    Backtick,
    /// `"name"`
    DoubleQuote,
    /// `[name]`
    Bracket,
}

impl EscapeStyle {
    /// Quotes `identifier`, doubling any embedded closing quote character.
    pub fn escape(self, identifier: &str) -> String {
        let (open, close) = match self {
            EscapeStyle::Backtick => ('`', '`'),
            EscapeStyle::DoubleQuote => ('"', '"'),
            EscapeStyle::Bracket => ('[', ']'),
        };

        let mut quoted = String::with_capacity(identifier.len() + 2);
        quoted.push(open);
        for c in identifier.chars() {
            if c == close {
                quoted.push(close);
            }
            quoted.push(c);
        }
        quoted.push(close);
        quoted
    }
}

/// The SQL-variant conventions one instance uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dialect {
    pub placeholder: PlaceholderStyle,
    pub escape: EscapeStyle,
}

impl Dialect {
    pub const MYSQL: Dialect = Dialect {
        placeholder: PlaceholderStyle::Format,
        escape: EscapeStyle::Backtick,
    };

    pub const SQLITE: Dialect = Dialect {
        placeholder: PlaceholderStyle::Qmark,
        escape: EscapeStyle::Backtick,
    };

    pub const POSTGRES: Dialect = Dialect {
        placeholder: PlaceholderStyle::Dollar,
        escape: EscapeStyle::DoubleQuote,
    };

    pub fn new(placeholder: PlaceholderStyle, escape: EscapeStyle) -> Self {
        Dialect { placeholder, escape }
    }

    pub fn escape(&self, identifier: &str) -> String {
        self.escape.escape(identifier)
    }

    pub fn placeholder(&self, position: usize) -> String {
        self.placeholder.token(position)
    }
}
