//! Immutable request description
//!
//! A [`Request`] is built once and sent as-is on every attempt. Continuation
//! parameters are injected by deriving a new request, never by mutation.

use crate::error::Result;
use serde_json::Value;
use url::Url;

/// Default URL scheme for requests
pub const DEFAULT_SCHEME: &str = "https";

/// One HTTP request: target, ordered query, headers and optional JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    scheme: String,
    host: String,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Value>,
}

impl Request {
    /// Create a request for `https://{host}/{path}`
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            host: host.into(),
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Set the URL scheme
    #[must_use]
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Append a query parameter (repeated keys are kept)
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append every pair from an iterator
    #[must_use]
    pub fn query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Return a copy with `key` set to `value`, replacing any existing values
    #[must_use]
    pub fn with_param(&self, key: &str, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.query.retain(|(k, _)| k != key);
        next.query.push((key.to_string(), value.into()));
        next
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Host (may include a port or leading path segment)
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Path below the host
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters in insertion order
    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    /// First value of a query parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Headers in insertion order
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// JSON body, if any
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Build the full URL with the urlencoded query
    pub fn url(&self) -> Result<Url> {
        let host = self.host.trim_end_matches('/');
        let path = self.path.trim_start_matches('/');
        let mut url = Url::parse(&format!("{}://{host}/{path}", self.scheme))?;

        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }

        Ok(url)
    }
}
