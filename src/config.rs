//! Runtime configuration
//!
//! [`Settings`] is the optional settings file (YAML or JSON) holding retry,
//! rate limit and upload defaults plus custom source definitions.
//! [`Credentials`] are read once from the environment at the process
//! boundary. [`JobConfig`] is the validated, read-only input of one fetch job.

use crate::dates::DateWindow;
use crate::error::{Error, Result};
use crate::http::{RateLimiterConfig, RetryPolicy};
use crate::output::{ObjectStoreSink, UploadOptions};
use crate::sources::SourceDefinition;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the bearer token
pub const BEARER_TOKEN_VAR: &str = "BEARER_TOKEN";

/// Environment variable holding the Cloudflare R2 endpoint
pub const R2_ENDPOINT_VAR: &str = "R2_ENDPOINT_URL";

/// Default number of pages per job
pub const DEFAULT_MAX_PAGES: u32 = 5;

// ============================================================================
// Settings File
// ============================================================================

/// Settings loaded from a YAML or JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Retry behavior for every request
    #[serde(default)]
    pub retry: RetrySettings,

    /// Optional client-side rate limit
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,

    /// Default page cap for jobs that do not set one
    #[serde(default)]
    pub max_pages: Option<u32>,

    /// Default naming for uploaded objects
    #[serde(default)]
    pub upload: UploadOptions,

    /// S3-compatible endpoint for `r2://` destinations
    #[serde(default)]
    pub r2_endpoint: Option<String>,

    /// Additional sources, looked up before the built-in presets
    #[serde(default)]
    pub sources: Vec<SourceDefinition>,
}

impl Settings {
    /// Load settings from a `.yaml`, `.yml` or `.json` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::file_not_found(path.display().to_string())
            } else {
                Error::config(format!(
                    "Failed to read settings file '{}': {e}",
                    path.display()
                ))
            }
        })?;

        let settings: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => serde_yaml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            _ => {
                return Err(Error::config(format!(
                    "Settings file '{}' must be .yaml, .yml or .json",
                    path.display()
                )))
            }
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let settings: Self = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check every value
    pub fn validate(&self) -> Result<()> {
        self.retry.policy()?;
        if let Some(ref limit) = self.rate_limit {
            if limit.requests_per_second == 0 {
                return Err(Error::invalid_value(
                    "rate_limit.requests_per_second",
                    "must be at least 1",
                ));
            }
        }
        if self.max_pages == Some(0) {
            return Err(Error::invalid_value("max_pages", "must be at least 1"));
        }
        for source in &self.sources {
            source.validate()?;
        }
        Ok(())
    }

    /// Fill settings the file left unset from the environment
    ///
    /// Called once at the process boundary.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if self.r2_endpoint.is_none() {
            self.r2_endpoint = std::env::var(R2_ENDPOINT_VAR)
                .ok()
                .filter(|e| !e.trim().is_empty());
        }
        self
    }

    /// Build the storage sink these settings describe
    pub fn sink(&self) -> ObjectStoreSink {
        match self.r2_endpoint {
            Some(ref endpoint) => ObjectStoreSink::new().with_r2_endpoint(endpoint.clone()),
            None => ObjectStoreSink::new(),
        }
    }

    /// Find a custom source by name, ignoring case
    pub fn source(&self, name: &str) -> Option<&SourceDefinition> {
        self.sources
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }
}

/// Retry settings in file units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per request
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay after the first failure, in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Growth factor between delays
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Per-attempt timeout, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_max_attempts() -> u32 {
    10
}

fn default_initial_delay_ms() -> u64 {
    3_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_timeout_ms() -> u64 {
    15_000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl RetrySettings {
    /// Build the validated [`RetryPolicy`]
    pub fn policy(&self) -> Result<RetryPolicy> {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_delay_ms),
            self.backoff_multiplier,
            Duration::from_millis(self.timeout_ms),
        )
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Secrets passed explicitly into sources
#[derive(Clone, Default)]
pub struct Credentials {
    bearer_token: Option<String>,
}

impl Credentials {
    /// Credentials holding a bearer token
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer_token: Some(token.into()),
        }
    }

    /// Read credentials from the process environment
    pub fn from_env() -> Self {
        let bearer_token = std::env::var(BEARER_TOKEN_VAR)
            .ok()
            .filter(|t| !t.trim().is_empty());
        Self { bearer_token }
    }

    /// Bearer token, if any
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    /// Bearer token, failing if it is missing
    pub fn require_bearer_token(&self) -> Result<&str> {
        self.bearer_token().ok_or_else(|| {
            Error::config(format!(
                "Bearer token required; set {BEARER_TOKEN_VAR} in the environment"
            ))
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "***"))
            .finish()
    }
}

// ============================================================================
// Job Config
// ============================================================================

/// What a job writes to its output file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Every record of every page, in fetch order
    #[default]
    Records,
    /// Every page body as returned by the source
    Pages,
}

/// Validated input of one fetch job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    /// Search term
    pub term: String,
    /// Day to fetch
    pub window: DateWindow,
    /// Page cap, at least 1
    pub max_pages: u32,
    /// Local output filename; its extension picks the format
    pub output: String,
    /// Sink destination (bucket URL or directory)
    pub destination: String,
    /// Naming options for the upload
    pub upload: UploadOptions,
    /// Records or whole pages
    pub mode: OutputMode,
}

impl JobConfig {
    /// Start building a job for `term` uploading to `destination`
    pub fn builder(term: impl Into<String>, destination: impl Into<String>) -> JobConfigBuilder {
        JobConfigBuilder {
            term: term.into(),
            destination: destination.into(),
            window: None,
            max_pages: None,
            output: None,
            upload: UploadOptions::default(),
            mode: OutputMode::default(),
        }
    }

    /// Default output filename: `{term}_{date}.jsonl`
    ///
    /// Characters that are unsafe in file names are replaced with `_`.
    pub fn default_output(term: &str, window: &DateWindow) -> String {
        let safe: String = term
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{safe}_{window}.jsonl")
    }
}

/// Builder for [`JobConfig`]
#[derive(Debug, Clone)]
pub struct JobConfigBuilder {
    term: String,
    destination: String,
    window: Option<DateWindow>,
    max_pages: Option<u32>,
    output: Option<String>,
    upload: UploadOptions,
    mode: OutputMode,
}

impl JobConfigBuilder {
    /// Day to fetch (defaults to yesterday, UTC)
    #[must_use]
    pub fn window(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Page cap (defaults to 5)
    #[must_use]
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Local output filename (defaults to `{term}_{date}.jsonl`)
    #[must_use]
    pub fn output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Upload naming options
    #[must_use]
    pub fn upload(mut self, upload: UploadOptions) -> Self {
        self.upload = upload;
        self
    }

    /// Write records (default) or whole page bodies
    #[must_use]
    pub fn mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<JobConfig> {
        if self.term.trim().is_empty() {
            return Err(Error::invalid_value("term", "must not be empty"));
        }
        if self.destination.trim().is_empty() {
            return Err(Error::invalid_value("destination", "must not be empty"));
        }

        let max_pages = self.max_pages.unwrap_or(DEFAULT_MAX_PAGES);
        if max_pages == 0 {
            return Err(Error::invalid_value("max_pages", "must be at least 1"));
        }

        let window = self.window.unwrap_or_else(DateWindow::yesterday);
        let output = match self.output {
            Some(output) if output.trim().is_empty() => {
                return Err(Error::invalid_value("output", "must not be empty"))
            }
            Some(output) => output,
            None => JobConfig::default_output(&self.term, &window),
        };

        Ok(JobConfig {
            term: self.term,
            window,
            max_pages,
            output,
            destination: self.destination,
            upload: self.upload,
            mode: self.mode,
        })
    }
}
