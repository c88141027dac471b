//! CLI module
//!
//! Command-line interface for fetch jobs and stored queries.
//!
//! # Commands
//!
//! - `search` - Fetch one day of results for a term and upload the file
//! - `query` - Run a query stored in a `.sql` or `.py` file
//! - `sources` - List available sources

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{describe_error, parse_params, Runner};
