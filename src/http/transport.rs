//! Single-attempt transports
//!
//! A [`Transport`] sends one request and reports the raw outcome. It never
//! retries; that is the job of [`super::RetryingTransport`].

use super::request::Request;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::debug;

/// Sends one request and returns the response body
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a single attempt, failing on connection errors, timeouts and
    /// HTTP error statuses
    async fn send(&self, request: &Request, timeout: Duration) -> Result<String>;
}

/// Transport backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the given user agent
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    /// Wrap an existing reqwest client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &Request, timeout: Duration) -> Result<String> {
        let url = request.url()?;
        let method = if request.body().is_some() {
            Method::POST
        } else {
            Method::GET
        };

        debug!("{} {}", method, url);

        let mut req = self.client.request(method, url).timeout(timeout);
        for (key, value) in request.headers() {
            req = req.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body() {
            req = req.json(body);
        }

        let response = req.send().await.map_err(|e| classify(e, timeout))?;
        let status = response.status();

        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::http_status(status.as_u16(), body));
        }

        response.text().await.map_err(|e| classify(e, timeout))
    }
}

/// Map reqwest timeouts onto the dedicated variant
fn classify(error: reqwest::Error, timeout: Duration) -> Error {
    if error.is_timeout() {
        Error::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        Error::Http(error)
    }
}

/// Transport driven by a synchronous closure
///
/// Useful for scripted sources and for exercising the retry loop without a
/// network.
pub struct FnTransport<F>(F);

/// Build a [`Transport`] from a closure
pub fn transport_fn<F>(f: F) -> FnTransport<F>
where
    F: Fn(&Request) -> Result<String> + Send + Sync,
{
    FnTransport(f)
}

#[async_trait]
impl<F> Transport for FnTransport<F>
where
    F: Fn(&Request) -> Result<String> + Send + Sync,
{
    async fn send(&self, request: &Request, _timeout: Duration) -> Result<String> {
        (self.0)(request)
    }
}
