//! File serializers
//!
//! Each serializer writes a slice of JSON records to a caller-supplied path
//! and returns the number of records written.

use crate::error::{Error, Result};
use arrow::json::reader::{infer_json_schema_from_iterator, ReaderBuilder};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde_json::Value;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Writes records to a file in one format
pub trait Serializer: fmt::Debug + Send + Sync {
    /// Short name of the format, used in logs
    fn name(&self) -> &'static str;

    /// Write `records` to `path`, replacing any existing file
    fn write(&self, records: &[Value], path: &Path) -> Result<usize>;
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| Error::Output {
        message: format!("Failed to create {}: {e}", path.display()),
    })?;
    Ok(BufWriter::new(file))
}

// ============================================================================
// JSON Lines
// ============================================================================

/// One JSON document per line, newline-terminated
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonlSerializer;

impl Serializer for JsonlSerializer {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    fn write(&self, records: &[Value], path: &Path) -> Result<usize> {
        let mut out = create(path)?;
        for record in records {
            serde_json::to_writer(&mut out, record)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;

        debug!("Wrote {} JSONL records to {}", records.len(), path.display());
        Ok(records.len())
    }
}

// ============================================================================
// CSV
// ============================================================================

/// One row per record
///
/// Array records become rows as-is and scalars become single-cell rows.
/// Object records contribute their values in field order, or, when a header
/// is supplied, the value named by each header column (empty when missing).
/// A header row is written only when one is supplied.
#[derive(Debug, Clone, Default)]
pub struct CsvSerializer {
    header: Option<Vec<String>>,
}

impl CsvSerializer {
    /// Create a serializer without a header row
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `header` as the first row
    #[must_use]
    pub fn with_header<I, S>(mut self, header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header = Some(header.into_iter().map(Into::into).collect());
        self
    }
}

impl Serializer for CsvSerializer {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn write(&self, records: &[Value], path: &Path) -> Result<usize> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(create(path)?);

        if let Some(ref header) = self.header {
            writer.write_record(header)?;
        }

        for record in records {
            writer.write_record(row_of(record, self.header.as_deref()))?;
        }
        writer.flush()?;

        debug!("Wrote {} CSV rows to {}", records.len(), path.display());
        Ok(records.len())
    }
}

fn row_of(record: &Value, header: Option<&[String]>) -> Vec<String> {
    match (record, header) {
        (Value::Array(items), _) => items.iter().map(cell_of).collect(),
        (Value::Object(map), Some(columns)) => columns
            .iter()
            .map(|column| map.get(column).map(cell_of).unwrap_or_default())
            .collect(),
        (Value::Object(map), None) => map.values().map(cell_of).collect(),
        (scalar, _) => vec![cell_of(scalar)],
    }
}

fn cell_of(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        nested => nested.to_string(),
    }
}

// ============================================================================
// Parquet
// ============================================================================

/// Arrow-inferred schema written as a single Parquet row group
#[derive(Debug, Clone)]
pub struct ParquetSerializer {
    compression: Compression,
}

impl Default for ParquetSerializer {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
        }
    }
}

impl ParquetSerializer {
    /// Create a serializer with Snappy compression
    pub fn new() -> Self {
        Self::default()
    }

    /// Use no compression
    #[must_use]
    pub fn uncompressed(mut self) -> Self {
        self.compression = Compression::UNCOMPRESSED;
        self
    }
}

impl Serializer for ParquetSerializer {
    fn name(&self) -> &'static str {
        "parquet"
    }

    fn write(&self, records: &[Value], path: &Path) -> Result<usize> {
        if records.is_empty() {
            return Err(Error::output("Parquet output needs at least one record"));
        }
        if let Some(bad) = records.iter().find(|r| !r.is_object()) {
            return Err(Error::output(format!(
                "Parquet output needs object records, found {bad}"
            )));
        }

        let schema = Arc::new(infer_json_schema_from_iterator(records.iter().map(Ok))?);

        let mut decoder = ReaderBuilder::new(schema.clone()).build_decoder()?;
        decoder.serialize(records)?;
        let batch = decoder
            .flush()?
            .ok_or_else(|| Error::output("No rows decoded"))?;

        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .build();
        let file = File::create(path).map_err(|e| Error::Output {
            message: format!("Failed to create {}: {e}", path.display()),
        })?;
        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(&batch)?;
        writer.close()?;

        debug!("Wrote {} Parquet rows to {}", batch.num_rows(), path.display());
        Ok(batch.num_rows())
    }
}
