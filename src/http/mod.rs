//! HTTP module
//!
//! Request model, single-attempt transports and the retrying driver.
//!
//! # Features
//!
//! - **Immutable requests**: ordered query parameters, repeated keys allowed
//! - **Bounded retries**: exponential backoff under a [`RetryPolicy`]
//! - **Validation**: bodies rejected by a [`Validator`] are retried like
//!   transport failures
//! - **Rate limiting**: optional token bucket using governor
//! - **Cancellation**: a `CancellationToken` interrupts sends and sleeps

mod client;
mod rate_limit;
mod request;
mod retry;
mod transport;

pub use client::RetryingTransport;
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use request::{Request, DEFAULT_SCHEME};
pub use retry::{RetryPolicy, Validation, Validator};
pub use transport::{transport_fn, FnTransport, HttpTransport, Transport};
