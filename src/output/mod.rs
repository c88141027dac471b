//! Output module
//!
//! Persists a fetched result set: a [`FormatRegistry`] picks the serializer
//! for a file by its extension, and a [`SinkUploader`] moves the written file
//! to its destination.
//!
//! # Overview
//!
//! - JSON Lines, CSV and Parquet serializers
//! - Extension-keyed dispatch with replace-on-register
//! - Object store uploads (GCS, S3, R2, Azure, local directories)

mod registry;
mod sink;
mod writer;

pub use registry::FormatRegistry;
pub use sink::{ObjectStoreSink, SinkUploader, UploadOptions};
pub use writer::{CsvSerializer, JsonlSerializer, ParquetSerializer, Serializer};

#[cfg(test)]
mod tests;
