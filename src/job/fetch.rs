//! Fetch job orchestration

use super::types::{JobReport, LocalArtifact};
use crate::config::{Credentials, JobConfig, OutputMode};
use crate::error::Result;
use crate::http::{RetryingTransport, Transport};
use crate::output::{FormatRegistry, SinkUploader};
use crate::pagination::PageWalker;
use crate::sources::SourceDefinition;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Fetches every page for one term, writes one file and uploads it
///
/// A run goes through these stages, stopping at the first error:
///
/// 1. resolve the serializer for the output filename (no network yet)
/// 2. build the first request from the source and the date window
/// 3. walk pages under the page cap
/// 4. write the file in the working directory
/// 5. upload it to the sink
///
/// The local file is removed on every exit path once stage 4 starts, and the
/// error of the failing stage is returned unchanged.
pub struct FetchJob<T> {
    transport: RetryingTransport<T>,
    source: SourceDefinition,
    credentials: Credentials,
    formats: FormatRegistry,
    sink: Arc<dyn SinkUploader>,
    work_dir: PathBuf,
}

impl<T: Transport> FetchJob<T> {
    /// Create a job with the default formats, writing in the current directory
    pub fn new(
        transport: RetryingTransport<T>,
        source: SourceDefinition,
        sink: Arc<dyn SinkUploader>,
    ) -> Self {
        Self {
            transport,
            source,
            credentials: Credentials::default(),
            formats: FormatRegistry::with_defaults(),
            sink,
            work_dir: PathBuf::from("."),
        }
    }

    /// Credentials used to authenticate against the source
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Replace the format registry
    #[must_use]
    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = formats;
        self
    }

    /// Directory for the transient local file
    #[must_use]
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// The source being fetched
    pub fn source(&self) -> &SourceDefinition {
        &self.source
    }

    /// Run the job
    pub async fn run(&self, config: &JobConfig) -> Result<JobReport> {
        let started = Instant::now();
        let serializer = self.formats.resolve(&config.output)?;

        let first = self
            .source
            .first_request(&config.term, &config.window, &self.credentials)?;
        info!(
            source = %self.source.name,
            term = %config.term,
            date = %config.window,
            max_pages = config.max_pages,
            "Starting fetch"
        );

        let results = PageWalker::new(&self.transport, &self.source.pagination)
            .with_validator(self.source.validator())
            .walk(|| first.clone(), config.max_pages)
            .await?;

        let rows = match config.mode {
            OutputMode::Records => results.to_records(),
            OutputMode::Pages => results.to_page_bodies(),
        };

        let artifact = LocalArtifact::new(self.work_dir.join(&config.output));
        let written = serializer.write(&rows, artifact.path())?;
        info!(
            rows = written,
            format = serializer.name(),
            "Wrote {}",
            artifact.path().display()
        );

        let stored_at = self
            .sink
            .upload(artifact.path(), &config.destination, &config.upload)
            .await?;
        drop(artifact);

        Ok(JobReport {
            pages: results.len(),
            rows: written,
            output: config.output.clone(),
            stored_at,
            elapsed: started.elapsed(),
        })
    }
}
