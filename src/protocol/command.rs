//! Typed BiDi commands.
//!
//! Most channel traffic is built from catalog data, but composite
//! strategies issue a few commands whose shape is fixed by the protocol.
//! Those are typed here and lowered to a [`ChannelCall`] before sending.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::WindowHandle;

// ============================================================================
// ChannelCall
// ============================================================================

/// A named remote call with a structured payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelCall {
    /// Remote method in `module.methodName` form.
    pub method: String,
    /// Parameter object.
    pub params: Value,
}

impl ChannelCall {
    /// Creates a call from a method name and params.
    #[inline]
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

// ============================================================================
// ContextType
// ============================================================================

/// Kind of top-level browsing context to create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextType {
    /// A tab in an existing window.
    Tab,
    /// A new OS-level window.
    #[default]
    Window,
}

impl ContextType {
    /// Returns the wire name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tab => "tab",
            Self::Window => "window",
        }
    }
}

impl fmt::Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tab" => Ok(Self::Tab),
            "window" => Ok(Self::Window),
            other => Err(Error::config(format!(
                "invalid context type '{other}', expected 'tab' or 'window'"
            ))),
        }
    }
}

// ============================================================================
// BrowsingContext Commands
// ============================================================================

/// BrowsingContext module commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum BrowsingContextCommand {
    /// Create a tab or window.
    #[serde(rename = "browsingContext.create")]
    Create {
        /// Kind of context.
        #[serde(rename = "type")]
        context_type: ContextType,
    },

    /// Navigate a context to a URL.
    #[serde(rename = "browsingContext.navigate")]
    Navigate {
        /// Target context.
        context: WindowHandle,
        /// URL to load.
        url: String,
    },
}

impl BrowsingContextCommand {
    /// Lowers the command to a method name and params object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn into_call(self) -> Result<ChannelCall> {
        let call: ChannelCall = serde_json::from_value(serde_json::to_value(self)?)?;
        Ok(call)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_into_call() {
        let call = BrowsingContextCommand::Create {
            context_type: ContextType::Tab,
        }
        .into_call()
        .expect("lower");

        assert_eq!(call.method, "browsingContext.create");
        assert_eq!(call.params, json!({ "type": "tab" }));
    }

    #[test]
    fn test_navigate_into_call() {
        let call = BrowsingContextCommand::Navigate {
            context: WindowHandle::new("ctx-9"),
            url: "https://example.com".to_string(),
        }
        .into_call()
        .expect("lower");

        assert_eq!(call.method, "browsingContext.navigate");
        assert_eq!(
            call.params,
            json!({ "context": "ctx-9", "url": "https://example.com" })
        );
    }

    #[test]
    fn test_context_type_from_str() {
        assert_eq!("tab".parse::<ContextType>().ok(), Some(ContextType::Tab));
        assert_eq!(
            "window".parse::<ContextType>().ok(),
            Some(ContextType::Window)
        );
        assert!("popup".parse::<ContextType>().is_err());
        assert_eq!(ContextType::default(), ContextType::Window);
    }
}
