//! Query types

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

/// Named query parameters
pub type QueryParams = Map<String, Value>;

/// How a query file produces its query text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// `.sql`: the file holds the query
    Sql,
    /// `.py`: running the file prints the query
    Script,
}

impl QueryKind {
    /// Extensions with a finder, dot included
    pub const EXTENSIONS: &'static [&'static str] = &[".sql", ".py"];

    /// Pick the kind from a file's extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("sql") => Ok(Self::Sql),
            Some("py") => Ok(Self::Script),
            other => Err(Error::UnsupportedQueryType {
                extension: other.map(|e| format!(".{e}")).unwrap_or_default(),
            }),
        }
    }
}

/// Database a query runs against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Connector {
    /// DuckDB file, or in-memory when no path is given
    #[default]
    Duckdb,
    /// SQLite file attached through DuckDB's sqlite extension
    Sqlite,
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duckdb => write!(f, "duckdb"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}
