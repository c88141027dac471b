//! Retrying transport
//!
//! Wraps a [`Transport`] in a bounded backoff loop:
//!
//! ```text
//! ATTEMPTING --valid body--------------------> SUCCEEDED
//! ATTEMPTING --retryable, attempts left------> WAITING --sleep--> ATTEMPTING
//! ATTEMPTING --retryable, no attempts left---> EXHAUSTED
//! ATTEMPTING --fatal-------------------------> (error returned as-is)
//! ```
//!
//! Validation failures go through the same loop as transport failures.
//! Cancellation is observed before each attempt, while sending and while
//! sleeping.

use super::rate_limit::RateLimiter;
use super::request::Request;
use super::retry::{RetryPolicy, Validation, Validator};
use super::transport::Transport;
use crate::error::{Error, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Transport that retries retryable failures under a [`RetryPolicy`]
pub struct RetryingTransport<T> {
    transport: T,
    policy: RetryPolicy,
    rate_limiter: Option<RateLimiter>,
    cancel: CancellationToken,
}

impl<T: Transport> RetryingTransport<T> {
    /// Create a retrying transport
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            rate_limiter: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Throttle attempts through a rate limiter
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Abort retries when the token is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The retry policy in effect
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The cancellation token observed by this transport
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Send a request until it yields a body accepted by `validate`
    ///
    /// Returns the last underlying failure wrapped in
    /// [`Error::RetriesExhausted`] once `max_attempts` sends have failed.
    pub async fn send(&self, request: &Request, validate: &Validator) -> Result<String> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled { attempts: attempt });
            }

            if let Some(ref limiter) = self.rate_limiter {
                tokio::select! {
                    () = limiter.wait() => {}
                    () = self.cancel.cancelled() => {
                        return Err(Error::Cancelled { attempts: attempt });
                    }
                }
            }

            attempt += 1;

            let outcome = tokio::select! {
                outcome = self.attempt(request, validate) => outcome,
                () = self.cancel.cancelled() => {
                    return Err(Error::Cancelled { attempts: attempt });
                }
            };

            let error = match outcome {
                Ok(body) => {
                    debug!(attempt, "Request succeeded");
                    return Ok(body);
                }
                Err(e) => e,
            };

            if !error.is_retryable() {
                return Err(error);
            }

            if attempt >= max_attempts {
                warn!(
                    attempts = attempt,
                    reason = %error,
                    "Retries exhausted"
                );
                return Err(Error::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            let delay = self.policy.delay_for_attempt(attempt);
            warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                reason = %error,
                "Request failed, retrying in {:?}",
                delay
            );

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.cancel.cancelled() => {
                    return Err(Error::Cancelled { attempts: attempt });
                }
            }
        }
    }

    /// One send plus validation
    async fn attempt(&self, request: &Request, validate: &Validator) -> Result<String> {
        let body = self
            .transport
            .send(request, self.policy.timeout_per_attempt)
            .await?;

        match validate.check(&body) {
            Validation::Valid => Ok(body),
            Validation::Invalid(reason) => Err(Error::validation(reason)),
        }
    }
}

impl<T> std::fmt::Debug for RetryingTransport<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingTransport")
            .field("policy", &self.policy)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
