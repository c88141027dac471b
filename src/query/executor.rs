//! DuckDB-backed query executor
//!
//! Rows are returned through DuckDB's native JSON export, which keeps column
//! names and converts dates, decimals and nested types consistently.

use super::finder::finder_for;
use super::types::{Connector, QueryParams};
use crate::error::{Error, Result};
use crate::job::LocalArtifact;
use duckdb::Connection;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

static EXPORT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Runs queries against one database
pub struct QueryExecutor {
    conn: Connection,
    connector: Connector,
    directory: Option<PathBuf>,
}

impl QueryExecutor {
    /// Open a connection
    ///
    /// `Duckdb` opens the file at `database` (in-memory when `None`).
    /// `Sqlite` attaches the file at `database` and makes it the default
    /// catalog.
    pub fn open(connector: Connector, database: Option<&str>) -> Result<Self> {
        let conn = match (connector, database) {
            (Connector::Duckdb, Some(path)) => Connection::open(path)?,
            (Connector::Duckdb, None) => Connection::open_in_memory()?,
            (Connector::Sqlite, Some(path)) => {
                let conn = Connection::open_in_memory()?;
                conn.execute_batch("INSTALL sqlite; LOAD sqlite;")
                    .map_err(|e| Error::query(format!("Failed to load sqlite extension: {e}")))?;
                let path = path.replace('\'', "''");
                conn.execute_batch(&format!(
                    "ATTACH '{path}' AS query_db (TYPE SQLITE); USE query_db;"
                ))
                .map_err(|e| Error::query(format!("Failed to attach SQLite: {e}")))?;
                conn
            }
            (Connector::Sqlite, None) => {
                return Err(Error::invalid_value(
                    "database",
                    "the sqlite connector needs a database file",
                ))
            }
        };

        debug!("Opened {connector} connection");
        Ok(Self {
            conn,
            connector,
            directory: None,
        })
    }

    /// Resolve relative query files against `dir`
    #[must_use]
    pub fn with_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = Some(dir.into());
        self
    }

    /// The connector in use
    pub fn connector(&self) -> Connector {
        self.connector
    }

    /// Run `query`, returning its rows when `return_results` is set
    pub fn execute(&self, query: &str, return_results: bool) -> Result<Option<Vec<Value>>> {
        if !return_results {
            self.conn.execute_batch(query)?;
            return Ok(None);
        }

        let query = query.trim().trim_end_matches(';');
        let export = LocalArtifact::new(std::env::temp_dir().join(format!(
            "fetchsink_query_{}_{}.json",
            std::process::id(),
            EXPORT_COUNTER.fetch_add(1, Ordering::Relaxed)
        )));
        let export_path = export
            .path()
            .to_str()
            .ok_or_else(|| Error::query("Invalid temp path"))?;

        self.conn
            .execute_batch(&format!(
                "COPY ({query}) TO '{export_path}' (FORMAT JSON, ARRAY true);"
            ))?;

        let content = std::fs::read_to_string(export.path())?;
        if content.trim().is_empty() {
            return Ok(Some(Vec::new()));
        }
        let rows: Vec<Value> = serde_json::from_str(&content)?;
        Ok(Some(rows))
    }

    /// Find, log and run the query in `file`
    pub fn execute_file(
        &self,
        file: impl AsRef<Path>,
        params: &QueryParams,
        return_results: bool,
    ) -> Result<Option<Vec<Value>>> {
        let path = match self.directory {
            Some(ref dir) => dir.join(file.as_ref()),
            None => file.as_ref().to_path_buf(),
        };

        let finder = finder_for(&path)?;
        let query = finder.find(&path, params)?;
        log_query(&query, params);

        self.execute(&query, return_results)
    }
}

fn log_query(query: &str, params: &QueryParams) {
    info!("Executing query:\n{query}");
    for (name, value) in params {
        info!(param = %name, value = %value, "With parameter");
    }
}
