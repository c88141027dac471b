//! Query finders
//!
//! A finder turns a query file into query text. `.sql` files are read and
//! their `{{ name }}` placeholders filled from the parameters; `.py` files are
//! run with the parameters as JSON on stdin and print the query on stdout.

use super::types::{QueryKind, QueryParams};
use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use tracing::debug;

/// Regex for query placeholders: {{ name }}
static PARAM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}\}").unwrap());

/// Produces query text from a file
pub trait QueryFinder: Send + Sync {
    /// Build the query in `path` with `params`
    fn find(&self, path: &Path, params: &QueryParams) -> Result<String>;
}

/// Reads `.sql` files
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlFinder;

impl QueryFinder for SqlFinder {
    fn find(&self, path: &Path, params: &QueryParams) -> Result<String> {
        let template = std::fs::read_to_string(path)?;
        render_params(&template, params)
    }
}

/// Runs `.py` files and captures the printed query
#[derive(Debug, Clone)]
pub struct ScriptFinder {
    interpreter: String,
}

impl Default for ScriptFinder {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
        }
    }
}

impl ScriptFinder {
    /// Run scripts with `interpreter` instead of `python3`
    pub fn with_interpreter(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl QueryFinder for ScriptFinder {
    fn find(&self, path: &Path, params: &QueryParams) -> Result<String> {
        debug!("Running {} {}", self.interpreter, path.display());

        let mut child = Command::new(&self.interpreter)
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::query(format!("Failed to run {}: {e}", self.interpreter)))?;

        if let Some(mut stdin) = child.stdin.take() {
            serde_json::to_writer(&mut stdin, params)?;
            stdin.write_all(b"\n")?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(Error::query(format!(
                "{} exited with {}: {}",
                path.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let query = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if query.is_empty() {
            return Err(Error::query(format!(
                "{} printed no query",
                path.display()
            )));
        }
        Ok(query)
    }
}

/// Check `path` and pick its finder
///
/// A missing file is reported before an unsupported extension.
pub fn finder_for(path: &Path) -> Result<Box<dyn QueryFinder>> {
    if !path.is_file() {
        return Err(Error::file_not_found(path.display().to_string()));
    }

    Ok(match QueryKind::from_path(path)? {
        QueryKind::Sql => Box::new(SqlFinder),
        QueryKind::Script => Box::new(ScriptFinder::default()),
    })
}

/// Replace `{{ name }}` placeholders with parameter values
///
/// Strings are inserted as-is, other values as JSON. Every placeholder must
/// have a parameter.
pub fn render_params(template: &str, params: &QueryParams) -> Result<String> {
    let mut missing = Vec::new();

    let rendered = PARAM_REGEX.replace_all(template, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        match params.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) => "NULL".to_string(),
            Some(other) => other.to_string(),
            None => {
                missing.push(name.to_string());
                caps[0].to_string()
            }
        }
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::query(format!(
            "Missing query parameters: {}",
            missing.join(", ")
        )))
    }
}
