//! CLI commands and argument parsing

use crate::config::OutputMode;
use crate::query::Connector;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fetch paginated API results into files and run stored queries
#[derive(Parser, Debug)]
#[command(name = "fetchsink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,

    /// Output format for reports
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search a source for one day and upload the results
    Search {
        /// Source name (see `sources`)
        source: String,

        /// Search term
        query: String,

        /// Day to fetch, YYYY-MM-DD (defaults to yesterday, UTC)
        #[arg(short, long)]
        date: Option<String>,

        /// Maximum number of pages
        #[arg(short = 'n', long)]
        max_pages: Option<u32>,

        /// Destination: gs://, s3://, r2://, az:// URL or a local directory
        #[arg(short, long)]
        bucket: String,

        /// Local output filename; its extension picks the format
        #[arg(short, long)]
        output: Option<String>,

        /// Write records or whole page bodies
        #[arg(long, default_value = "records")]
        mode: OutputMode,

        /// Object name at the destination
        #[arg(long)]
        object_name: Option<String>,

        /// Path prefix at the destination
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Run a query stored in a .sql or .py file
    Query {
        /// Query file
        file: PathBuf,

        /// Database connector
        #[arg(short, long, default_value = "duckdb")]
        connector: Connector,

        /// Database file (in-memory DuckDB when omitted)
        #[arg(long)]
        database: Option<String>,

        /// Directory that relative query files are resolved against
        #[arg(long)]
        query_dir: Option<PathBuf>,

        /// JSON object of query parameters
        #[arg(short, long)]
        params: Option<String>,

        /// Print the resulting rows
        #[arg(short, long)]
        return_results: bool,
    },

    /// List available sources
    Sources,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
