//! Supported database dialects

use std::fmt;
use std::str::FromStr;

use crate::error::MigrationError;

/// Target database product. Selects SQL text in the catalog and the
/// version-table DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    pub const ALL: [Dialect; 2] = [Dialect::Sqlite, Dialect::Postgres];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
        }
    }

    /// Bind placeholder for the `n`th (1-based) parameter
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Dialect::Sqlite => "?".to_string(),
            Dialect::Postgres => format!("${}", n),
        }
    }

    /// Column type used for `applied_at`, with its default
    pub(crate) fn timestamp_column(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "DATETIME DEFAULT CURRENT_TIMESTAMP",
            Dialect::Postgres => "TIMESTAMP WITH TIME ZONE DEFAULT NOW()",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            _ => Err(MigrationError::UnsupportedDialect(s.to_string())),
        }
    }
}
