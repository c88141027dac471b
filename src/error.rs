//! Error types for fetchsink
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! The retry loop never inspects messages: it asks [`Error::is_retryable`],
//! which classifies each variant structurally.

use thiserror::Error;

/// The main error type for fetchsink
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Invalid date '{input}': expected YYYY-MM-DD")]
    InvalidDateFormat { input: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Response failed validation: {message}")]
    Validation { message: String },

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<Error> },

    #[error("Cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Dispatch Errors
    // ============================================================================
    #[error("Unsupported file format '{extension}' (supported: {supported})")]
    UnsupportedFormat { extension: String, supported: String },

    #[error("Unsupported query file type '{extension}' (use .sql or .py)")]
    UnsupportedQueryType { extension: String },

    // ============================================================================
    // Output Errors
    // ============================================================================
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Output error: {message}")]
    Output { message: String },

    #[error("Upload to '{destination}' failed: {message}")]
    SinkUpload {
        destination: String,
        message: String,
    },

    // ============================================================================
    // Query Errors
    // ============================================================================
    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("Query error: {message}")]
    Query { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Create a sink upload error
    pub fn sink(destination: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkUpload {
            destination: destination.into(),
            message: message.into(),
        }
    }

    /// Create a query error
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Check if this error is retryable
    ///
    /// Transport failures of any kind and validation failures are retryable.
    /// Everything else is fatal and propagates without another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => !e.is_builder(),
            Error::HttpStatus { status, .. } => is_error_status(*status),
            Error::Timeout { .. } | Error::Validation { .. } => true,
            _ => false,
        }
    }

    /// Short, stable name of the error kind for user-facing reports
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config { .. } | Error::InvalidConfigValue { .. } => "ConfigError",
            Error::InvalidDateFormat { .. } => "InvalidDateFormat",
            Error::YamlParse(_) | Error::JsonParse(_) => "ParseError",
            Error::Http(_) | Error::HttpStatus { .. } | Error::Timeout { .. } => {
                "TransientNetworkError"
            }
            Error::Validation { .. } => "ValidationFailure",
            Error::RetriesExhausted { .. } => "RetriesExhausted",
            Error::Cancelled { .. } => "Cancelled",
            Error::InvalidUrl(_) => "InvalidUrl",
            Error::UnsupportedFormat { .. } => "UnsupportedFormat",
            Error::UnsupportedQueryType { .. } => "UnsupportedQueryType",
            Error::Csv(_) | Error::Arrow(_) | Error::Parquet(_) | Error::Output { .. } => {
                "OutputError"
            }
            Error::SinkUpload { .. } => "SinkUploadError",
            Error::Database(_) | Error::Query { .. } => "QueryError",
            Error::Io(_) => "IoError",
            Error::FileNotFound { .. } => "FileNotFound",
            Error::Other(_) => "Error",
        }
    }

    /// Number of attempts made, when the error came out of the retry loop
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Error::RetriesExhausted { attempts, .. } | Error::Cancelled { attempts } => {
                Some(*attempts)
            }
            _ => None,
        }
    }

    /// The underlying failure of an exhausted retry loop, or `self`
    pub fn root(&self) -> &Error {
        match self {
            Error::RetriesExhausted { last, .. } => last.root(),
            other => other,
        }
    }
}

/// Check if an HTTP status code signals a failed request
fn is_error_status(status: u16) -> bool {
    (400..600).contains(&status)
}

/// Result type alias for fetchsink
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::http_status(503, "Service Unavailable");
        assert_eq!(err.to_string(), "HTTP 503: Service Unavailable");

        let err = Error::InvalidDateFormat {
            input: "2021-13-40".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid date '2021-13-40': expected YYYY-MM-DD"
        );
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::Timeout { timeout_ms: 1000 }.is_retryable());
        assert!(Error::validation("missing meta").is_retryable());
        assert!(Error::http_status(429, "").is_retryable());
        assert!(Error::http_status(500, "").is_retryable());
        assert!(Error::http_status(404, "").is_retryable());

        assert!(!Error::http_status(302, "").is_retryable());
        assert!(!Error::config("test").is_retryable());
        assert!(!Error::sink("gs://bucket", "denied").is_retryable());
        assert!(!Error::Cancelled { attempts: 1 }.is_retryable());
        assert!(!Error::RetriesExhausted {
            attempts: 3,
            last: Box::new(Error::Timeout { timeout_ms: 10 }),
        }
        .is_retryable());
    }

    #[test]
    fn test_kind_and_attempts() {
        let err = Error::RetriesExhausted {
            attempts: 4,
            last: Box::new(Error::validation("no meta")),
        };
        assert_eq!(err.kind(), "RetriesExhausted");
        assert_eq!(err.attempts(), Some(4));
        assert_eq!(err.root().kind(), "ValidationFailure");

        let err = Error::sink("gs://b", "boom");
        assert_eq!(err.kind(), "SinkUploadError");
        assert_eq!(err.attempts(), None);
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
