//! Tests for job module

use super::*;
use crate::config::{Credentials, JobConfig, OutputMode};
use crate::dates::DateWindow;
use crate::error::{Error, Result};
use crate::http::{transport_fn, Request, RetryPolicy, RetryingTransport, Transport};
use crate::output::{SinkUploader, UploadOptions};
use crate::sources::{twitter, SourceDefinition};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

fn policy() -> RetryPolicy {
    RetryPolicy::new(2, Duration::from_millis(5), 2.0, Duration::from_secs(1)).unwrap()
}

fn window() -> DateWindow {
    DateWindow::parse("2021-10-24").unwrap()
}

/// Two pages of two tweets each
fn two_pages(calls: Arc<AtomicU32>) -> RetryingTransport<impl Transport> {
    let transport = transport_fn(move |req: &Request| {
        calls.fetch_add(1, Ordering::SeqCst);
        let body = match req.param("next_token") {
            None => json!({
                "data": [{"id": "1"}, {"id": "2"}],
                "meta": {"next_token": "b"}
            }),
            Some(_) => json!({"data": [{"id": "3"}, {"id": "4"}], "meta": {}}),
        };
        Ok(body.to_string())
    });
    RetryingTransport::new(transport, policy())
}

/// Captures what it was asked to upload
#[derive(Default)]
struct RecordingSink {
    uploads: Mutex<Vec<(PathBuf, String, String)>>,
}

#[async_trait]
impl SinkUploader for RecordingSink {
    async fn upload(
        &self,
        local_path: &Path,
        destination: &str,
        _options: &UploadOptions,
    ) -> Result<String> {
        let content = std::fs::read_to_string(local_path)?;
        self.uploads.lock().unwrap().push((
            local_path.to_path_buf(),
            destination.to_string(),
            content,
        ));
        Ok(format!("{destination}/stored"))
    }
}

/// Fails every upload after checking the file is there
#[derive(Default)]
struct FailingSink {
    saw_file: Mutex<Option<PathBuf>>,
}

#[async_trait]
impl SinkUploader for FailingSink {
    async fn upload(
        &self,
        local_path: &Path,
        destination: &str,
        _options: &UploadOptions,
    ) -> Result<String> {
        assert!(local_path.exists());
        *self.saw_file.lock().unwrap() = Some(local_path.to_path_buf());
        Err(Error::sink(destination, "permission denied"))
    }
}

fn job_config(output: &str) -> JobConfig {
    JobConfig::builder("rust", "gs://bucket")
        .window(window())
        .max_pages(5)
        .output(output)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_run_writes_uploads_and_cleans_up() {
    let dir = tempdir().unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let sink = Arc::new(RecordingSink::default());

    let job = FetchJob::new(two_pages(calls.clone()), twitter(), sink.clone())
        .with_credentials(Credentials::bearer("t"))
        .with_work_dir(dir.path());
    let config = job_config("rust_2021-10-24.jsonl");

    let report = job.run(&config).await.unwrap();

    assert_eq!(report.pages, 2);
    assert_eq!(report.rows, 4);
    assert_eq!(report.stored_at, "gs://bucket/stored");
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let uploads = sink.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    let (path, destination, content) = &uploads[0];
    assert_eq!(destination, "gs://bucket");
    assert_eq!(path, &dir.path().join("rust_2021-10-24.jsonl"));
    let ids: Vec<Value> = content
        .lines()
        .map(|l| serde_json::from_str::<Value>(l).unwrap()["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!("1"), json!("2"), json!("3"), json!("4")]);

    assert!(!path.exists());
}

#[tokio::test]
async fn test_run_page_mode_writes_bodies() {
    let dir = tempdir().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let job = FetchJob::new(
        two_pages(Arc::new(AtomicU32::new(0))),
        twitter(),
        sink.clone(),
    )
    .with_credentials(Credentials::bearer("t"))
    .with_work_dir(dir.path());

    let mut config = job_config("pages.jsonl");
    config.mode = OutputMode::Pages;
    let report = job.run(&config).await.unwrap();

    assert_eq!(report.rows, 2);
    let uploads = sink.uploads.lock().unwrap();
    let first: Value = serde_json::from_str(uploads[0].2.lines().next().unwrap()).unwrap();
    assert_eq!(first["meta"]["next_token"], json!("b"));
}

#[tokio::test]
async fn test_unknown_extension_fails_before_network() {
    let dir = tempdir().unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let job = FetchJob::new(
        two_pages(calls.clone()),
        twitter(),
        Arc::new(RecordingSink::default()),
    )
    .with_credentials(Credentials::bearer("t"))
    .with_work_dir(dir.path());

    let err = job.run(&job_config("tweets.xyz")).await.unwrap_err();

    assert!(matches!(err, Error::UnsupportedFormat { ref extension, .. } if extension == "xyz"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!dir.path().join("tweets.xyz").exists());
}

#[tokio::test]
async fn test_failing_sink_removes_local_file() {
    let dir = tempdir().unwrap();
    let sink = Arc::new(FailingSink::default());
    let job = FetchJob::new(
        two_pages(Arc::new(AtomicU32::new(0))),
        twitter(),
        sink.clone(),
    )
    .with_credentials(Credentials::bearer("t"))
    .with_work_dir(dir.path());

    let err = job.run(&job_config("out.jsonl")).await.unwrap_err();

    assert_eq!(err.kind(), "SinkUploadError");
    let seen = sink.saw_file.lock().unwrap().clone().unwrap();
    assert_eq!(seen, dir.path().join("out.jsonl"));
    assert!(!seen.exists());
}

#[tokio::test(start_paused = true)]
async fn test_walk_failure_writes_nothing() {
    let dir = tempdir().unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let transport = RetryingTransport::new(
        transport_fn(move |_req: &Request| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"errors": [{"message": "rate limited"}]}).to_string())
        }),
        policy(),
    );
    let sink = Arc::new(RecordingSink::default());
    let job = FetchJob::new(transport, twitter(), sink.clone())
        .with_credentials(Credentials::bearer("t"))
        .with_work_dir(dir.path());

    let err = job.run(&job_config("out.jsonl")).await.unwrap_err();

    assert_eq!(err.kind(), "RetriesExhausted");
    assert_eq!(err.attempts(), Some(2));
    assert_eq!(err.root().kind(), "ValidationFailure");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(sink.uploads.lock().unwrap().is_empty());
    assert!(!dir.path().join("out.jsonl").exists());
}

#[tokio::test]
async fn test_missing_credentials_fail_before_network() {
    let dir = tempdir().unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let job = FetchJob::new(
        two_pages(calls.clone()),
        twitter(),
        Arc::new(RecordingSink::default()),
    )
    .with_work_dir(dir.path());

    let err = job.run(&job_config("out.jsonl")).await.unwrap_err();

    assert_eq!(err.kind(), "ConfigError");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_request_carries_window_and_term() {
    let dir = tempdir().unwrap();
    let seen = Arc::new(Mutex::new(Vec::<Request>::new()));
    let recorder = seen.clone();
    let transport = RetryingTransport::new(
        transport_fn(move |req: &Request| {
            recorder.lock().unwrap().push(req.clone());
            Ok(json!({"results": [[1, "a"]]}).to_string())
        }),
        policy(),
    );
    let source: SourceDefinition = serde_yaml::from_str(
        r"
name: local
host: localhost
path: search
term_param: q
start_param: from
end_param: to
pagination:
  data_path: results
  cursor_path: next
  cursor_param: cursor
",
    )
    .unwrap();
    let sink = Arc::new(RecordingSink::default());
    let job = FetchJob::new(transport, source, sink.clone()).with_work_dir(dir.path());

    let report = job.run(&job_config("rows.csv")).await.unwrap();
    assert_eq!(report.rows, 1);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].param("q"), Some("rust"));
    assert_eq!(seen[0].param("from"), Some("2021-10-24T00:00:00Z"));
    assert_eq!(seen[0].param("to"), Some("2021-10-24T23:59:59Z"));
    assert_eq!(sink.uploads.lock().unwrap()[0].2, "1,a\n");
}
