//! HTTP request/response transport.
//!
//! Speaks WebDriver Classic: every reply body is a JSON object whose
//! `value` member carries the result, or on failure an object with
//! `error` and `message`.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use webdriver_dispatch::{HttpTransport, HttpTransportOptions};
//!
//! let transport = HttpTransport::with_options(
//!     "http://127.0.0.1:4444",
//!     HttpTransportOptions::new().with_timeout(Duration::from_secs(10)),
//! )?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::catalog::Method;
use crate::error::{Error, Result};

use super::RequestTransport;

// ============================================================================
// Constants
// ============================================================================

/// Default per-request timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default `User-Agent` header.
const DEFAULT_USER_AGENT: &str = concat!("webdriver-dispatch/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HttpTransportOptions
// ============================================================================

/// HTTP client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTransportOptions {
    /// Total time allowed for one request.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for HttpTransportOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransportOptions {
    /// Creates options with defaults (30s timeout).
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Sets the per-request timeout.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the `User-Agent` header.
    #[inline]
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

// ============================================================================
// HttpTransport
// ============================================================================

/// Request/response adapter over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Creates a transport with default options.
    ///
    /// # Errors
    ///
    /// See [`HttpTransport::with_options`].
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_options(base_url, HttpTransportOptions::new())
    }

    /// Creates a transport.
    ///
    /// `base_url` may carry a path prefix such as `/wd/hub`; command paths
    /// are appended to it.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if `base_url` does not parse
    /// - [`Error::Config`] if it is not `http` or `https`
    /// - [`Error::Http`] if the client cannot be built
    pub fn with_options(base_url: &str, options: HttpTransportOptions) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "unsupported scheme '{}' for request transport",
                base_url.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Returns the absolute URL for a resolved command path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if the joined string does not parse.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }
}

#[async_trait]
impl RequestTransport for HttpTransport {
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = self.endpoint(path)?;
        debug!(%method, %url, "Sending request");

        let request = match method {
            Method::Get => self.client.get(url),
            Method::Delete => self.client.delete(url),
            Method::Post => {
                let empty = Value::Object(Default::default());
                self.client.post(url).json(body.unwrap_or(&empty))
            }
        };

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let payload: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| {
                Error::transport_status(status.as_u16(), format!("malformed response body: {e}"))
            })?
        };

        if !status.is_success() {
            let message = error_message(&payload).unwrap_or_else(|| text.clone());
            warn!(%method, path, status = status.as_u16(), %message, "Request failed");
            return Err(Error::transport_status(status.as_u16(), message));
        }

        Ok(unwrap_value(payload))
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Takes the `value` member of a W3C reply envelope.
fn unwrap_value(payload: Value) -> Value {
    match payload {
        Value::Object(mut map) if map.contains_key("value") => {
            map.remove("value").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Builds `"<error>: <message>"` from a W3C error body.
fn error_message(payload: &Value) -> Option<String> {
    let body = payload.get("value").unwrap_or(payload);
    let error = body.get("error").and_then(Value::as_str)?;
    let message = body.get("message").and_then(Value::as_str).unwrap_or_default();
    Some(if message.is_empty() {
        error.to_string()
    } else {
        format!("{error}: {message}")
    })
}

// ============================================================================
// Tests
// ============================================================================
