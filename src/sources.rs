//! Source definitions
//!
//! A [`SourceDefinition`] describes one searchable API: where its endpoint
//! lives, which parameters carry the term and the date window, how its pages
//! are shaped and what a well-formed page must contain. Built-in presets are
//! looked up with [`source_by_name`]; custom ones come from the settings file.

use crate::config::Credentials;
use crate::dates::DateWindow;
use crate::error::{Error, Result};
use crate::http::{Request, Validator, DEFAULT_SCHEME};
use crate::pagination::PageShape;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Names of the built-in presets
pub const SOURCE_NAMES: &[&str] = &["twitter"];

/// One searchable API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Unique name (matched case-insensitively)
    pub name: String,

    /// URL scheme
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Host, optionally with port
    pub host: String,

    /// Endpoint path below the host
    pub path: String,

    /// Static headers sent on every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Static query parameters sent on every request
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    /// Send `Authorization: Bearer <token>` from the credentials
    #[serde(default)]
    pub bearer_auth: bool,

    /// Query parameter carrying the search term
    #[serde(default = "default_term_param")]
    pub term_param: String,

    /// Query parameter carrying the window start timestamp
    #[serde(default)]
    pub start_param: Option<String>,

    /// Query parameter carrying the window end timestamp
    #[serde(default)]
    pub end_param: Option<String>,

    /// Where records and cursors live in a page
    #[serde(default)]
    pub pagination: PageShape,

    /// Dotted path that must exist in every page body
    #[serde(default)]
    pub required_field: Option<String>,
}

fn default_scheme() -> String {
    DEFAULT_SCHEME.to_string()
}

fn default_term_param() -> String {
    "query".to_string()
}

impl SourceDefinition {
    /// Check required fields
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::config("Source name cannot be empty"));
        }
        if self.host.trim().is_empty() {
            return Err(Error::config(format!(
                "Source '{}' must have a host",
                self.name
            )));
        }
        if self.term_param.trim().is_empty() {
            return Err(Error::config(format!(
                "Source '{}' must have a term_param",
                self.name
            )));
        }
        if self.pagination.cursor_param.trim().is_empty() {
            return Err(Error::config(format!(
                "Source '{}' must have a cursor parameter",
                self.name
            )));
        }
        Ok(())
    }

    /// Build the first-page request for `term` over `window`
    pub fn first_request(
        &self,
        term: &str,
        window: &DateWindow,
        credentials: &Credentials,
    ) -> Result<Request> {
        let mut request = Request::new(&self.host, &self.path).scheme(&self.scheme);

        for (name, value) in &self.headers {
            request = request.header(name, value);
        }
        if self.bearer_auth {
            let token = credentials.require_bearer_token()?;
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        request = request
            .query_pairs(&self.params)
            .query(&self.term_param, term);
        if let Some(ref start) = self.start_param {
            request = request.query(start, window.start_timestamp());
        }
        if let Some(ref end) = self.end_param {
            request = request.query(end, window.end_timestamp());
        }

        Ok(request)
    }

    /// Page validator for this source
    pub fn validator(&self) -> Validator {
        match self.required_field {
            Some(ref field) => Validator::require_json_field(field.clone()),
            None => Validator::accept_all(),
        }
    }
}

/// Twitter v2 recent search
///
/// Pages carry tweets under `data` and the continuation token under
/// `meta.next_token`; a page without `meta` is an error page.
pub fn twitter() -> SourceDefinition {
    SourceDefinition {
        name: "twitter".to_string(),
        scheme: default_scheme(),
        host: "api.twitter.com".to_string(),
        path: "2/tweets/search/recent".to_string(),
        headers: BTreeMap::from([("Content-Type".to_string(), "application/json".to_string())]),
        params: BTreeMap::from([("max_results".to_string(), "100".to_string())]),
        bearer_auth: true,
        term_param: "query".to_string(),
        start_param: Some("start_time".to_string()),
        end_param: Some("end_time".to_string()),
        pagination: PageShape::new("data", "meta.next_token", "next_token"),
        required_field: Some("meta".to_string()),
    }
}

/// Look up a built-in preset, ignoring case
pub fn source_by_name(name: &str) -> Result<SourceDefinition> {
    match name.to_ascii_lowercase().as_str() {
        "twitter" => Ok(twitter()),
        _ => Err(Error::config(format!(
            "Invalid API '{name}' (available: {})",
            SOURCE_NAMES.join(", ")
        ))),
    }
}
