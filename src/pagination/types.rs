//! Pagination types
//!
//! Defines where records and continuation tokens live in a page body, and the
//! append-only result set a walk produces.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Location of the data and cursor sections in a page body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageShape {
    /// Dotted path to the record array (e.g., "data")
    #[serde(default = "default_data_path")]
    pub data_path: String,
    /// Dotted path to the continuation token (e.g., "meta.next_token")
    #[serde(default = "default_cursor_path")]
    pub cursor_path: String,
    /// Query parameter that carries the token on the next request
    #[serde(default = "default_cursor_param")]
    pub cursor_param: String,
}

fn default_data_path() -> String {
    "data".to_string()
}

fn default_cursor_path() -> String {
    "meta.next_token".to_string()
}

fn default_cursor_param() -> String {
    "next_token".to_string()
}

impl Default for PageShape {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            cursor_path: default_cursor_path(),
            cursor_param: default_cursor_param(),
        }
    }
}

impl PageShape {
    /// Create a page shape
    pub fn new(
        data_path: impl Into<String>,
        cursor_path: impl Into<String>,
        cursor_param: impl Into<String>,
    ) -> Self {
        Self {
            data_path: data_path.into(),
            cursor_path: cursor_path.into(),
            cursor_param: cursor_param.into(),
        }
    }
}

/// One fetched page
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Raw response body
    pub raw: String,
    /// Parsed body
    pub body: Value,
    /// Records from the data section
    pub records: Vec<Value>,
    /// Continuation token; `None` marks the last page
    pub cursor: Option<String>,
}

impl Page {
    /// Parse a page body according to `shape`
    ///
    /// A missing data section means zero records. A missing, null or empty
    /// cursor means this is the last page.
    pub fn parse(raw: String, shape: &PageShape) -> Result<Self> {
        let body: Value = serde_json::from_str(&raw)?;

        let records = match extract_path(&body, &shape.data_path) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(other) => {
                return Err(Error::validation(format!(
                    "`{}` is not an array (found {})",
                    shape.data_path,
                    type_name(other)
                )))
            }
        };

        let cursor = match extract_path(&body, &shape.cursor_path) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        Ok(Self {
            raw,
            body,
            records,
            cursor,
        })
    }

    /// Check if this is the last page
    pub fn is_terminal(&self) -> bool {
        self.cursor.is_none()
    }
}

/// Ordered, append-only sequence of pages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pages: Vec<Page>,
}

impl ResultSet {
    /// Create an empty result set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page
    pub fn push(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// Number of pages
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Check if no page has been fetched
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Pages in fetch order
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Records of every page, in fetch order
    pub fn records(&self) -> impl Iterator<Item = &Value> {
        self.pages.iter().flat_map(|p| p.records.iter())
    }

    /// Total number of records
    pub fn record_count(&self) -> usize {
        self.pages.iter().map(|p| p.records.len()).sum()
    }

    /// Owned copy of every record, in fetch order
    pub fn to_records(&self) -> Vec<Value> {
        self.records().cloned().collect()
    }

    /// Owned copy of every page body, in fetch order
    pub fn to_page_bodies(&self) -> Vec<Value> {
        self.pages.iter().map(|p| p.body.clone()).collect()
    }
}

/// Follow a dotted path (`$.` prefix allowed) through nested objects
pub fn extract_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value);
    }

    path.split('.').try_fold(value, |current, part| match current {
        Value::Object(map) => map.get(part),
        _ => None,
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
