// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # fetchsink
//!
//! Resilient extraction of cursor-paginated search APIs into files, plus a
//! small runner for queries stored in `.sql` and `.py` files.
//!
//! ## Features
//!
//! - **Bounded retries**: exponential backoff over transport and validation
//!   failures, with cancellation
//! - **Cursor pagination**: follows continuation tokens under a page cap
//! - **Pluggable formats**: JSON Lines, CSV and Parquet chosen by extension
//! - **Storage sinks**: GCS, S3, R2, Azure and local directories
//! - **Stored queries**: DuckDB and SQLite through DuckDB
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fetchsink::{
//!     config::{Credentials, JobConfig},
//!     http::{HttpTransport, RetryPolicy, RetryingTransport},
//!     job::FetchJob,
//!     output::ObjectStoreSink,
//!     sources, DateWindow, Result,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let transport = RetryingTransport::new(
//!         HttpTransport::new("fetchsink")?,
//!         RetryPolicy::default(),
//!     );
//!     let job = FetchJob::new(transport, sources::twitter(), Arc::new(ObjectStoreSink::new()))
//!         .with_credentials(Credentials::from_env());
//!
//!     let config = JobConfig::builder("rust", "gs://my-bucket/raw")
//!         .window(DateWindow::parse("2021-10-24")?)
//!         .build()?;
//!     let report = job.run(&config).await?;
//!     println!("{} pages -> {}", report.pages, report.stored_at);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        FetchJob                          │
//! │   resolve format → walk pages → write file → upload      │
//! └──────────────────────────────────────────────────────────┘
//!          │                                   │
//! ┌────────┴─────────┐              ┌──────────┴───────────┐
//! │    PageWalker    │              │    FormatRegistry    │
//! │ cursor, page cap │              │ jsonl, csv, parquet  │
//! ├──────────────────┤              ├──────────────────────┤
//! │RetryingTransport │              │     SinkUploader     │
//! │ backoff, validate│              │ gs, s3, r2, az, dir  │
//! │ rate limit,cancel│              │                      │
//! └──────────────────┘              └──────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Day-granular date windows
pub mod dates;

/// Requests, transports and the retrying driver
pub mod http;

/// Cursor pagination
pub mod pagination;

/// Serializers, format registry and storage sinks
pub mod output;

/// Settings, credentials and job configuration
pub mod config;

/// Source definitions and presets
pub mod sources;

/// Fetch job orchestration
pub mod job;

/// Stored query execution
pub mod query;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use dates::DateWindow;
pub use error::{Error, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
