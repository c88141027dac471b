//! Tests for output module

use super::*;
use crate::error::Error;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;
use test_case::test_case;

fn tweets() -> Vec<Value> {
    vec![
        json!({"id": "1", "text": "hello, world", "lang": "en"}),
        json!({"id": "2", "text": "second", "lang": null}),
    ]
}

// ============================================================================
// JSONL Tests
// ============================================================================

#[test]
fn test_jsonl_one_record_per_line() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.jsonl");

    let written = JsonlSerializer.write(&tweets(), &path).unwrap();
    assert_eq!(written, 2);

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.ends_with('\n'));
    let parsed: Vec<Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(parsed, tweets());
}

#[test]
fn test_jsonl_empty_records_writes_empty_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.jsonl");

    assert_eq!(JsonlSerializer.write(&[], &path).unwrap(), 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), "");
}

#[test]
fn test_jsonl_overwrites_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.jsonl");
    fs::write(&path, "stale\nstale\nstale\n").unwrap();

    JsonlSerializer.write(&[json!(1)], &path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "1\n");
}

// ============================================================================
// CSV Tests
// ============================================================================

#[test]
fn test_csv_object_values_in_field_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.csv");

    CsvSerializer::new().write(&tweets(), &path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "1,\"hello, world\",en\n2,second,\n");
}

#[test]
fn test_csv_with_header_and_array_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rows.csv");
    let rows = vec![json!(["a", 1, true]), json!(["b", 2.5, {"k": "v"}])];

    let written = CsvSerializer::new()
        .with_header(["name", "value", "extra"])
        .write(&rows, &path)
        .unwrap();
    assert_eq!(written, 2);

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(header, vec!["name", "value", "extra"]);

    let records: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    assert_eq!(
        records,
        vec![
            vec!["a".to_string(), "1".to_string(), "true".to_string()],
            vec!["b".to_string(), "2.5".to_string(), r#"{"k":"v"}"#.to_string()],
        ]
    );
}

#[test]
fn test_csv_header_selects_object_fields_by_name() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tweets.csv");
    let records = vec![
        json!({"id": "2", "text": "b"}),
        json!({"text": "c", "id": "3"}),
        json!({"lang": "fr", "extra": 1, "id": "4", "text": "d"}),
    ];

    CsvSerializer::new()
        .with_header(["id", "text", "lang"])
        .write(&records, &path)
        .unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "id,text,lang\n2,b,\n3,c,\n4,d,fr\n");
}

#[test]
fn test_csv_round_trip_object_records() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tweets.csv");
    let columns = ["id", "text", "lang"];
    let records = vec![
        json!({"id": "1", "text": "hello, world", "lang": "en"}),
        json!({"id": "2", "text": "line\nbreak", "lang": "de"}),
        json!({"id": "3", "text": "\"quoted\"", "lang": "en"}),
    ];

    let written = CsvSerializer::new()
        .with_header(columns)
        .write(&records, &path)
        .unwrap();
    assert_eq!(written, records.len());

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let read_back: Vec<Value> = reader
        .records()
        .map(|row| {
            let row = row.unwrap();
            let map = columns
                .iter()
                .zip(row.iter())
                .map(|(column, cell)| ((*column).to_string(), json!(cell)))
                .collect::<serde_json::Map<String, Value>>();
            Value::Object(map)
        })
        .collect();

    assert_eq!(read_back, records);
}

// ============================================================================
// Parquet Tests
// ============================================================================

#[test]
fn test_parquet_round_trip_row_count() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.parquet");

    let written = ParquetSerializer::new().write(&tweets(), &path).unwrap();
    assert_eq!(written, 2);

    let file = fs::File::open(&path).unwrap();
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .unwrap()
        .build()
        .unwrap();
    let rows: usize = reader.map(|batch| batch.unwrap().num_rows()).sum();
    assert_eq!(rows, 2);
}

#[test]
fn test_parquet_rejects_empty_and_scalar_records() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.parquet");

    let err = ParquetSerializer::new().write(&[], &path).unwrap_err();
    assert!(matches!(err, Error::Output { .. }));

    let err = ParquetSerializer::new()
        .write(&[json!(1), json!(2)], &path)
        .unwrap_err();
    assert!(matches!(err, Error::Output { .. }));
}

// ============================================================================
// FormatRegistry Tests
// ============================================================================

#[test_case("tweets.jsonl", "jsonl")]
#[test_case("tweets.csv", "csv")]
#[test_case("dir.with.dots/tweets.parquet", "parquet")]
fn test_registry_resolves_defaults(filename: &str, expected: &str) {
    let registry = FormatRegistry::with_defaults();
    assert_eq!(registry.resolve(filename).unwrap().name(), expected);
}

#[test_case("tweets.xml", "xml")]
#[test_case("tweets.JSONL", "JSONL")]
#[test_case("tweets", "")]
fn test_registry_rejects_unknown_extensions(filename: &str, extension: &str) {
    let registry = FormatRegistry::with_defaults();
    let err = registry.resolve(filename).unwrap_err();

    match err {
        Error::UnsupportedFormat {
            extension: ext,
            supported,
        } => {
            assert_eq!(ext, extension);
            assert_eq!(supported, "csv, jsonl, parquet");
        }
        other => panic!("Expected UnsupportedFormat, got {other:?}"),
    }
}

#[test]
fn test_registry_empty_resolves_nothing() {
    let registry = FormatRegistry::new();
    assert!(registry.extensions().is_empty());
    assert_eq!(
        registry.resolve("a.jsonl").unwrap_err().kind(),
        "UnsupportedFormat"
    );
}

#[test]
fn test_registry_register_replaces() {
    let mut registry = FormatRegistry::with_defaults();
    registry.register(".jsonl", CsvSerializer::new());

    assert_eq!(registry.extensions(), vec!["csv", "jsonl", "parquet"]);
    assert_eq!(registry.resolve("a.jsonl").unwrap().name(), "csv");
}

#[test]
fn test_registry_resolved_serializer_is_debug() {
    let registry = FormatRegistry::with_defaults();

    let serializer = registry.resolve("out.csv").unwrap();
    assert!(format!("{serializer:?}").starts_with("CsvSerializer"));
    assert!(format!("{registry:?}").contains("parquet"));
}

// ============================================================================
// Sink Tests
// ============================================================================

#[tokio::test]
async fn test_sink_local_directory() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let local = src.path().join("rust_2021-01-01.jsonl");
    fs::write(&local, "{\"id\":1}\n").unwrap();

    let destination = dest.path().join("landing");
    let destination = destination.to_str().unwrap();
    let stored = ObjectStoreSink::new()
        .upload(&local, destination, &UploadOptions::new().prefix("raw/twitter"))
        .await
        .unwrap();

    let uploaded = dest
        .path()
        .join("landing/raw/twitter/rust_2021-01-01.jsonl");
    assert_eq!(fs::read_to_string(uploaded).unwrap(), "{\"id\":1}\n");
    assert!(stored.ends_with("raw/twitter/rust_2021-01-01.jsonl"));
    assert!(local.exists());
}

#[tokio::test]
async fn test_sink_bucket_prefix_and_object_name() {
    let src = tempdir().unwrap();
    let local = src.path().join("out.csv");
    fs::write(&local, "a,b\n").unwrap();

    let store = Arc::new(InMemory::new());
    let sink = ObjectStoreSink::with_store(store.clone());

    let stored = sink
        .upload(
            &local,
            "gs://my-bucket/exports/",
            &UploadOptions::new().object_name("daily.csv").prefix("2021"),
        )
        .await
        .unwrap();
    assert_eq!(stored, "gs://my-bucket/exports/2021/daily.csv");

    let data = store
        .get(&ObjectPath::from("exports/2021/daily.csv"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(&data[..], b"a,b\n");
}

#[tokio::test]
async fn test_sink_missing_local_file() {
    let dir = tempdir().unwrap();
    let sink = ObjectStoreSink::with_store(Arc::new(InMemory::new()));

    let err = sink
        .upload(&dir.path().join("nope.jsonl"), "s3://b", &UploadOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "SinkUploadError");
}

#[tokio::test]
async fn test_sink_rejects_unknown_scheme() {
    let dir = tempdir().unwrap();
    let local = dir.path().join("a.jsonl");
    fs::write(&local, "").unwrap();

    let err = ObjectStoreSink::new()
        .upload(&local, "ftp://host/dir", &UploadOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SinkUpload { .. }));
}

#[tokio::test]
async fn test_sink_r2_requires_endpoint() {
    let dir = tempdir().unwrap();
    let local = dir.path().join("a.jsonl");
    fs::write(&local, "").unwrap();

    let err = ObjectStoreSink::new()
        .upload(&local, "r2://bucket/raw", &UploadOptions::new())
        .await
        .unwrap_err();
    match err {
        Error::SinkUpload { message, .. } => assert!(message.contains("endpoint")),
        other => panic!("Expected SinkUpload, got {other:?}"),
    }

    let sink = ObjectStoreSink::new().with_r2_endpoint("https://acct.r2.example.com");
    assert!(format!("{sink:?}").contains("https://acct.r2.example.com"));
}
