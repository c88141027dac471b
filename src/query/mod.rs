//! Query module
//!
//! Runs queries stored in files. The file's extension picks a finder that
//! produces the query text, and a [`QueryExecutor`] runs it on DuckDB,
//! optionally returning rows as JSON objects.

mod executor;
mod finder;
mod types;

pub use executor::QueryExecutor;
pub use finder::{finder_for, render_params, QueryFinder, ScriptFinder, SqlFinder};
pub use types::{Connector, QueryKind, QueryParams};
