//! Error types for WebDriver command dispatch.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use webdriver_dispatch::{Arguments, Result};
//!
//! async fn example(engine: &DispatchEngine, session: &Session) -> Result<()> {
//!     engine.invoke(session, "navigateTo", Arguments::named([("url", "https://example.com")])).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Catalog | [`Error::Catalog`], [`Error::UnknownCommand`] |
//! | Configuration | [`Error::Config`] |
//! | Input | [`Error::Validation`], [`Error::MissingVariable`] |
//! | Capability | [`Error::UnsupportedOperation`] |
//! | Transport | [`Error::Transport`], [`Error::Connection`], [`Error::ConnectionClosed`], [`Error::RequestTimeout`] |
//! | Protocol | [`Error::Protocol`], [`Error::UnexpectedResponse`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Http`], [`Error::Url`] |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::CommandId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Restriction
// ============================================================================

/// A session capability that rules out an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Restriction {
    /// Operation cannot run on mobile devices.
    Mobile,
    /// Operation requires a BiDi session channel.
    BidiOnly,
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mobile => f.write_str("not supported on mobile"),
            Self::BidiOnly => f.write_str("only supported on BiDi sessions"),
        }
    }
}

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Catalog Errors
    // ========================================================================
    /// Malformed command catalog.
    ///
    /// Returned at load time; a registry is never built from a bad catalog.
    #[error("Catalog error: {message}")]
    Catalog {
        /// Description of the catalog defect.
        message: String,
    },

    /// Command name not present in the registry.
    #[error("Unknown command: {command}")]
    UnknownCommand {
        /// The unrecognized command name.
        command: String,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when engine, session, or transport configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Input Errors
    // ========================================================================
    /// Argument missing or of the wrong type.
    ///
    /// Always raised before any network activity.
    #[error("Invalid arguments for {command}: {message}")]
    Validation {
        /// Command being invoked.
        command: String,
        /// What was wrong with the arguments.
        message: String,
    },

    /// Path variable could not be resolved.
    ///
    /// Indicates a definition/context mismatch rather than a runtime condition.
    #[error("Missing value for path variable '{variable}' of {command}")]
    MissingVariable {
        /// Command being invoked.
        command: String,
        /// Name of the unresolved variable.
        variable: String,
    },

    // ========================================================================
    // Capability Errors
    // ========================================================================
    /// Session capabilities preclude the operation.
    #[error("{command} is {restriction}")]
    UnsupportedOperation {
        /// Command being invoked.
        command: String,
        /// The restriction that applied.
        restriction: Restriction,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Request/response transport failure or non-success status.
    #[error("Transport error{}: {message}", status_suffix(.status))]
    Transport {
        /// Description of the failure.
        message: String,
        /// HTTP status, if the remote end answered.
        status: Option<u16>,
    },

    /// WebSocket connection failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// WebSocket connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Channel command timed out.
    #[error("Command {command_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The command ID that timed out.
        command_id: CommandId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Remote end reported an error frame on the session channel.
    #[error("Protocol error: {error}: {message}")]
    Protocol {
        /// Remote error code.
        error: String,
        /// Remote error message.
        message: String,
    },

    /// A composite step got a reply it cannot continue from.
    #[error("Unexpected response for {command}: {message}")]
    UnexpectedResponse {
        /// Command being invoked.
        command: String,
        /// What was missing or malformed.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

/// Formats the optional HTTP status for [`Error::Transport`].
fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a catalog error.
    #[inline]
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    /// Creates an unknown command error.
    #[inline]
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a validation error.
    #[inline]
    pub fn validation(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Creates a missing variable error.
    #[inline]
    pub fn missing_variable(command: impl Into<String>, variable: impl Into<String>) -> Self {
        Self::MissingVariable {
            command: command.into(),
            variable: variable.into(),
        }
    }

    /// Creates an unsupported operation error.
    #[inline]
    pub fn unsupported(command: impl Into<String>, restriction: Restriction) -> Self {
        Self::UnsupportedOperation {
            command: command.into(),
            restriction,
        }
    }

    /// Creates a transport error without a status.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: None,
        }
    }

    /// Creates a transport error for a non-success status.
    #[inline]
    pub fn transport_status(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(command_id: CommandId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            command_id,
            timeout_ms,
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            error: error.into(),
            message: message.into(),
        }
    }

    /// Creates an unexpected response error.
    #[inline]
    pub fn unexpected_response(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            command: command.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::RequestTimeout { .. } => true,
            Self::Http(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns `true` if the caller's input was rejected before dispatch.
    #[inline]
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns `true` if this error came from the transport layer.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::Connection { .. }
                | Self::ConnectionClosed
                | Self::RequestTimeout { .. }
                | Self::WebSocket(_)
                | Self::Http(_)
                | Self::ChannelClosed(_)
        )
    }

    /// Returns `true` if this error means the session forbids the operation.
    #[inline]
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedOperation { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
