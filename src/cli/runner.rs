//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{Credentials, JobConfig, OutputMode, Settings};
use crate::dates::DateWindow;
use crate::error::{Error, Result};
use crate::http::{HttpTransport, RateLimiter, RetryingTransport};
use crate::job::FetchJob;
use crate::output::UploadOptions;
use crate::query::{Connector, QueryExecutor, QueryParams};
use crate::sources::{source_by_name, SourceDefinition, SOURCE_NAMES};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
    cancel: CancellationToken,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that aborts in-flight requests and retry waits
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Search {
                source,
                query,
                date,
                max_pages,
                bucket,
                output,
                mode,
                object_name,
                prefix,
            } => {
                let upload = UploadOptions {
                    object_name: object_name.clone(),
                    prefix: prefix.clone(),
                };
                self.search(
                    source,
                    query,
                    date.as_deref(),
                    *max_pages,
                    bucket,
                    output.as_deref(),
                    *mode,
                    upload,
                )
                .await
            }
            Commands::Query {
                file,
                connector,
                database,
                query_dir,
                params,
                return_results,
            } => self.query(
                file,
                *connector,
                database.as_deref(),
                query_dir.as_deref(),
                params.as_deref(),
                *return_results,
            ),
            Commands::Sources => self.sources(),
        }
    }

    /// Load the settings file, or defaults when none was given
    fn load_settings(&self) -> Result<Settings> {
        let settings = match self.cli.settings {
            Some(ref path) => Settings::load(path)?,
            None => Settings::default(),
        };
        Ok(settings.with_env_overrides())
    }

    /// Custom sources shadow the built-in presets
    fn resolve_source(settings: &Settings, name: &str) -> Result<SourceDefinition> {
        match settings.source(name) {
            Some(source) => Ok(source.clone()),
            None => source_by_name(name),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn search(
        &self,
        source: &str,
        term: &str,
        date: Option<&str>,
        max_pages: Option<u32>,
        destination: &str,
        output: Option<&str>,
        mode: OutputMode,
        upload: UploadOptions,
    ) -> Result<()> {
        let settings = self.load_settings()?;
        let source = Self::resolve_source(&settings, source)?;

        let mut builder = JobConfig::builder(term, destination).mode(mode);
        if let Some(date) = date {
            builder = builder.window(DateWindow::parse(date)?);
        }
        if let Some(max_pages) = max_pages.or(settings.max_pages) {
            builder = builder.max_pages(max_pages);
        }
        if let Some(output) = output {
            builder = builder.output(output);
        }
        builder = builder.upload(UploadOptions {
            object_name: upload.object_name.or(settings.upload.object_name.clone()),
            prefix: upload.prefix.or(settings.upload.prefix.clone()),
        });
        let config = builder.build()?;

        let http = HttpTransport::new(concat!("fetchsink/", env!("CARGO_PKG_VERSION")))?;
        let mut transport = RetryingTransport::new(http, settings.retry.policy()?)
            .with_cancellation(self.cancel.clone());
        if let Some(ref limit) = settings.rate_limit {
            transport = transport.with_rate_limiter(RateLimiter::new(limit));
        }

        let job = FetchJob::new(transport, source, Arc::new(settings.sink()))
            .with_credentials(Credentials::from_env());
        let report = job.run(&config).await?;

        info!(
            pages = report.pages,
            rows = report.rows,
            "Stored {}",
            report.stored_at
        );
        self.output_message(&json!({
            "type": "REPORT",
            "source": job.source().name,
            "term": config.term,
            "date": config.window.to_string(),
            "report": report,
        }));
        Ok(())
    }

    fn query(
        &self,
        file: &Path,
        connector: Connector,
        database: Option<&str>,
        query_dir: Option<&Path>,
        params: Option<&str>,
        return_results: bool,
    ) -> Result<()> {
        let params = parse_params(params)?;

        let mut executor = QueryExecutor::open(connector, database)?;
        if let Some(dir) = query_dir {
            executor = executor.with_directory(dir);
        }

        match executor.execute_file(file, &params, return_results)? {
            Some(rows) => self.output_message(&json!({
                "type": "ROWS",
                "count": rows.len(),
                "rows": rows,
            })),
            None => self.output_message(&json!({
                "type": "QUERY",
                "status": "SUCCEEDED",
                "file": file.display().to_string(),
            })),
        }
        Ok(())
    }

    fn sources(&self) -> Result<()> {
        let settings = self.load_settings()?;

        let mut sources: Vec<Value> = Vec::new();
        for name in SOURCE_NAMES {
            let source = source_by_name(name)?;
            sources.push(describe_source(&source, "builtin"));
        }
        for source in &settings.sources {
            sources.push(describe_source(source, "settings"));
        }

        self.output_message(&json!({
            "type": "SOURCES",
            "sources": sources,
        }));
        Ok(())
    }

    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

fn describe_source(source: &SourceDefinition, origin: &str) -> Value {
    json!({
        "name": source.name,
        "origin": origin,
        "endpoint": format!("{}://{}/{}", source.scheme, source.host, source.path),
        "term_param": source.term_param,
        "cursor_param": source.pagination.cursor_param,
    })
}

/// Parse `--params` into a JSON object
pub fn parse_params(params: Option<&str>) -> Result<QueryParams> {
    let Some(raw) = params else {
        return Ok(QueryParams::new());
    };
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        _ => Err(Error::invalid_value("params", "must be a JSON object")),
    }
}

/// One-line description of a failed run: kind, attempts when retried, cause
pub fn describe_error(error: &Error) -> String {
    match error.attempts() {
        Some(attempts) => format!(
            "{} after {attempts} attempt(s): {error}",
            error.kind()
        ),
        None => format!("{}: {error}", error.kind()),
    }
}
