//! Request and Response frames.
//!
//! Defines the command and reply frames of a BiDi session channel.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::CommandId;

use super::ChannelCall;

// ============================================================================
// Request
// ============================================================================

/// A command frame from local end to remote end.
///
/// # Format
///
/// ```json
/// {
///   "id": 1,
///   "method": "module.methodName",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Identifier for request/response correlation.
    pub id: CommandId,

    /// Method and params.
    #[serde(flatten)]
    pub call: ChannelCall,
}

impl Request {
    /// Creates a request frame.
    #[inline]
    #[must_use]
    pub fn new(id: CommandId, call: ChannelCall) -> Self {
        Self { id, call }
    }
}

// ============================================================================
// Response
// ============================================================================

/// A reply frame from remote end to local end.
///
/// # Format
///
/// Success:
/// ```json
/// {
///   "type": "success",
///   "id": 1,
///   "result": { ... }
/// }
/// ```
///
/// Error:
/// ```json
/// {
///   "type": "error",
///   "id": 1,
///   "error": "no such frame",
///   "message": "..."
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Matches the command `id`; `null` for errors not tied to a command.
    #[serde(default)]
    pub id: Option<CommandId>,

    /// Response type.
    #[serde(rename = "type")]
    pub response_type: ResponseType,

    /// Result data (if success).
    #[serde(default)]
    pub result: Option<Value>,

    /// Error code (if error).
    #[serde(default)]
    pub error: Option<String>,

    /// Error message (if error).
    #[serde(default)]
    pub message: Option<String>,
}

impl Response {
    /// Returns `true` if this is a success response.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.response_type == ResponseType::Success
    }

    /// Extracts the result value, returning error if response was error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the response was an error frame.
    pub fn into_result(self) -> Result<Value> {
        match self.response_type {
            ResponseType::Success => Ok(self.result.unwrap_or(Value::Null)),
            ResponseType::Error => {
                let error_code = self.error.unwrap_or_else(|| "unknown error".to_string());
                let message = self.message.unwrap_or_else(|| error_code.clone());
                Err(Error::protocol(error_code, message))
            }
        }
    }
}

// ============================================================================
// ResponseType
// ============================================================================

/// Response type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Successful response.
    Success,
    /// Error response.
    Error,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let call = ChannelCall::new("browsingContext.navigate", json!({ "url": "https://a.b" }));
        let request = Request::new(CommandId::new(3), call);
        let value = serde_json::to_value(&request).expect("serialize");

        assert_eq!(
            value,
            json!({
                "id": 3,
                "method": "browsingContext.navigate",
                "params": { "url": "https://a.b" }
            })
        );
    }

    #[test]
    fn test_success_response() {
        let json_str = r#"{"type": "success", "id": 4, "result": {"context": "abc"}}"#;

        let response: Response = serde_json::from_str(json_str).expect("parse");
        assert!(response.is_success());
        assert_eq!(response.id, Some(CommandId::new(4)));

        let result = response.into_result().expect("should succeed");
        assert_eq!(result["context"], "abc");
    }

    #[test]
    fn test_into_result_error() {
        let json_str = r#"{
            "type": "error",
            "id": 5,
            "error": "no such frame",
            "message": "Context not found"
        }"#;

        let response: Response = serde_json::from_str(json_str).expect("parse");
        assert!(!response.is_success());

        match response.into_result() {
            Err(Error::Protocol { error, message }) => {
                assert_eq!(error, "no such frame");
                assert_eq!(message, "Context not found");
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn test_error_without_id() {
        let json_str = r#"{"type": "error", "id": null, "error": "invalid argument"}"#;
        let response: Response = serde_json::from_str(json_str).expect("parse");
        assert_eq!(response.id, None);
    }

    #[test]
    fn test_event_is_not_a_response() {
        let json_str = r#"{"type": "event", "method": "log.entryAdded", "params": {}}"#;
        assert!(serde_json::from_str::<Response>(json_str).is_err());
    }
}
