//! Retry policy and validation predicates

use crate::error::{Error, Result};
use crate::pagination::extract_path;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Bounded exponential backoff
///
/// The delay after attempt `n` (1-based) is
/// `initial_delay * backoff_multiplier^(n - 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of send attempts, including the first
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub initial_delay: Duration,
    /// Growth factor applied per attempt
    pub backoff_multiplier: f64,
    /// Timeout for a single attempt
    pub timeout_per_attempt: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay: Duration::from_secs(3),
            backoff_multiplier: 2.0,
            timeout_per_attempt: Duration::from_secs(15),
        }
    }
}

impl RetryPolicy {
    /// Create a policy, rejecting non-positive values
    pub fn new(
        max_attempts: u32,
        initial_delay: Duration,
        backoff_multiplier: f64,
        timeout_per_attempt: Duration,
    ) -> Result<Self> {
        let policy = Self {
            max_attempts,
            initial_delay,
            backoff_multiplier,
            timeout_per_attempt,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Check that every setting is positive
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::invalid_value("max_attempts", "must be at least 1"));
        }
        if self.initial_delay.is_zero() {
            return Err(Error::invalid_value("initial_delay", "must be positive"));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier <= 0.0 {
            return Err(Error::invalid_value(
                "backoff_multiplier",
                "must be a positive number",
            ));
        }
        if self.timeout_per_attempt.is_zero() {
            return Err(Error::invalid_value("timeout", "must be positive"));
        }
        Ok(())
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.backoff_multiplier.powi(exponent);
        let nanos = self.initial_delay.as_nanos() as f64 * factor;

        if nanos >= u64::MAX as f64 {
            Duration::from_nanos(u64::MAX)
        } else {
            Duration::from_nanos(nanos as u64)
        }
    }
}

/// Outcome of checking a response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Body is acceptable
    Valid,
    /// Body should be retried, with the reason
    Invalid(String),
}

impl Validation {
    /// Check if the body was accepted
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl From<bool> for Validation {
    fn from(ok: bool) -> Self {
        if ok {
            Self::Valid
        } else {
            Self::Invalid("response rejected by validator".to_string())
        }
    }
}

/// Caller-supplied check deciding whether a response body is usable
#[derive(Clone)]
pub struct Validator(Arc<dyn Fn(&str) -> Validation + Send + Sync>);

impl Validator {
    /// Wrap a predicate
    pub fn new<F, V>(check: F) -> Self
    where
        F: Fn(&str) -> V + Send + Sync + 'static,
        V: Into<Validation>,
    {
        Self(Arc::new(move |body| check(body).into()))
    }

    /// Accept every body
    pub fn accept_all() -> Self {
        Self::new(|_| Validation::Valid)
    }

    /// Require the body to be JSON containing the given dotted path
    pub fn require_json_field(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(move |body| match serde_json::from_str::<serde_json::Value>(body) {
            Ok(value) if extract_path(&value, &path).is_some() => Validation::Valid,
            Ok(_) => Validation::Invalid(format!("`{path}` key not present")),
            Err(e) => Validation::Invalid(format!("body is not valid JSON: {e}")),
        })
    }

    /// Run `self`, then `next` on bodies `self` accepts
    #[must_use]
    pub fn and(self, next: Validator) -> Self {
        Self(Arc::new(move |body| match self.check(body) {
            Validation::Valid => next.check(body),
            invalid => invalid,
        }))
    }

    /// Run the check
    pub fn check(&self, body: &str) -> Validation {
        (self.0)(body)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::accept_all()
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator").finish_non_exhaustive()
    }
}
