//! Extension-keyed serializer dispatch

use super::writer::{CsvSerializer, JsonlSerializer, ParquetSerializer, Serializer};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Maps file extensions (without the dot) to serializers
///
/// Lookup is case-sensitive: `out.JSONL` does not resolve to the `jsonl`
/// serializer.
#[derive(Clone, Default)]
pub struct FormatRegistry {
    serializers: HashMap<String, Arc<dyn Serializer>>,
}

impl FormatRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `jsonl`, `csv` and `parquet` registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("jsonl", JsonlSerializer);
        registry.register("csv", CsvSerializer::new());
        registry.register("parquet", ParquetSerializer::new());
        registry
    }

    /// Register `serializer` for `extension`, replacing any previous one
    pub fn register<S>(&mut self, extension: impl Into<String>, serializer: S) -> &mut Self
    where
        S: Serializer + 'static,
    {
        let extension = extension.into();
        let extension = extension.trim_start_matches('.').to_string();
        self.serializers.insert(extension, Arc::new(serializer));
        self
    }

    /// Find the serializer for `filename` by its extension
    pub fn resolve(&self, filename: &str) -> Result<Arc<dyn Serializer>> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        self.serializers
            .get(extension)
            .cloned()
            .ok_or_else(|| Error::UnsupportedFormat {
                extension: extension.to_string(),
                supported: self.extensions().join(", "),
            })
    }

    /// Registered extensions, sorted
    pub fn extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<&str> = self.serializers.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        extensions
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}
