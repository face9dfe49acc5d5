//! Transport adapters.
//!
//! The engine talks to the remote end through two capability traits:
//!
//! | Trait | Shape | Failure |
//! |-------|-------|---------|
//! | [`RequestTransport`] | `send(method, path, body)` | [`Error::Transport`](crate::Error::Transport) |
//! | [`SessionChannel`] | `call(method, params)` | [`Error::Protocol`](crate::Error::Protocol) or transport error |
//!
//! A session owns one [`TransportHandle`] holding both. Strategies build an
//! [`Exchange`] and hand it to [`TransportHandle::exchange`], which routes it
//! to the right adapter. Neither adapter retries.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   Exchange::Request   ┌──────────────────┐
//! │                  │──────────────────────►│  HttpTransport   │──► HTTP
//! │ TransportHandle  │                       └──────────────────┘
//! │                  │   Exchange::Channel   ┌──────────────────┐
//! │                  │──────────────────────►│ WebSocketChannel │◄─► WebSocket
//! └──────────────────┘                       └──────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `channel` | WebSocket BiDi channel and event loop |
//! | `http` | HTTP request/response adapter |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket BiDi session channel.
pub mod channel;

/// HTTP request/response transport.
pub mod http;

/// Recording doubles for tests.
#[cfg(test)]
pub(crate) mod recording;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;

use crate::catalog::Method;
use crate::error::{Error, Result};
use crate::protocol::ChannelCall;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::{ChannelOptions, EventHandler, WebSocketChannel};
pub use http::{HttpTransport, HttpTransportOptions};

// ============================================================================
// Traits
// ============================================================================

/// Stateless request/response exchange.
#[async_trait]
pub trait RequestTransport: Send + Sync {
    /// Sends one request and returns the unwrapped result value.
    ///
    /// # Errors
    ///
    /// Returns a transport-category error on connection failure or a
    /// non-success status.
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value>;
}

/// Named remote calls over a persistent bidirectional channel.
#[async_trait]
pub trait SessionChannel: Send + Sync {
    /// Issues one call and returns its result object.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] if the remote end answers with an error frame
    /// - a transport-category error if the channel fails
    async fn call(&self, call: ChannelCall) -> Result<Value>;
}

// ============================================================================
// Exchange
// ============================================================================

/// One transport round trip, in the shape of either adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum Exchange {
    /// Classic request.
    Request {
        /// HTTP verb.
        method: Method,
        /// Resolved path.
        path: String,
        /// JSON body for verbs that carry one.
        body: Option<Value>,
    },
    /// BiDi channel call.
    Channel(ChannelCall),
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request { method, path, .. } => write!(f, "{method} {path}"),
            Self::Channel(call) => f.write_str(&call.method),
        }
    }
}

// ============================================================================
// TransportHandle
// ============================================================================

/// The transports one session owns.
#[derive(Clone)]
pub struct TransportHandle {
    request: Arc<dyn RequestTransport>,
    channel: Option<Arc<dyn SessionChannel>>,
}

impl fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportHandle")
            .field("has_channel", &self.channel.is_some())
            .finish_non_exhaustive()
    }
}

impl TransportHandle {
    /// Creates a handle with only a request transport.
    #[must_use]
    pub fn new(request: Arc<dyn RequestTransport>) -> Self {
        Self {
            request,
            channel: None,
        }
    }

    /// Attaches a session channel.
    #[must_use]
    pub fn with_channel(mut self, channel: Arc<dyn SessionChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Returns `true` if a session channel is attached.
    #[inline]
    #[must_use]
    pub fn has_channel(&self) -> bool {
        self.channel.is_some()
    }

    /// Performs one exchange on the matching adapter.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] for a channel exchange without a channel
    /// - whatever the adapter returns
    pub async fn exchange(&self, exchange: Exchange) -> Result<Value> {
        trace!(%exchange, "Transport exchange");
        match exchange {
            Exchange::Request { method, path, body } => {
                self.request.send(method, &path, body.as_ref()).await
            }
            Exchange::Channel(call) => {
                let channel = self.channel.as_ref().ok_or_else(|| {
                    Error::transport(format!("no session channel for '{}'", call.method))
                })?;
                channel.call(call).await
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
