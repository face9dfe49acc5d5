//! Session descriptor consulted at every dispatch.
//!
//! A [`Session`] bundles what the engine needs to know about one live
//! automation session: its ID, the capabilities that gate strategies, and
//! the transports it owns. The engine only ever borrows a session for the
//! duration of one call.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use webdriver_dispatch::{HttpTransport, Session, SessionId};
//!
//! let http = Arc::new(HttpTransport::new("http://localhost:4444")?);
//! let session = Session::classic(SessionId::new("abc").unwrap(), http).with_mobile(false);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Restriction, Result};
use crate::identifiers::SessionId;
use crate::transport::{RequestTransport, SessionChannel, TransportHandle};

// ============================================================================
// Constants
// ============================================================================

/// Path variable filled from the session rather than from arguments.
pub const SESSION_VARIABLE: &str = "sessionId";

/// `platformName` values that mark a mobile session.
const MOBILE_PLATFORMS: &[&str] = &["android", "ios"];

/// Capability keys only present on mobile sessions.
const MOBILE_CAPABILITY_KEYS: &[&str] = &["appium:deviceName", "deviceName"];

// ============================================================================
// ProtocolMode
// ============================================================================

/// Transport the session was negotiated with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ProtocolMode {
    /// Request/response over HTTP only.
    #[default]
    Classic,
    /// BiDi session channel alongside HTTP.
    Bidi,
}

impl fmt::Display for ProtocolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classic => f.write_str("classic"),
            Self::Bidi => f.write_str("bidi"),
        }
    }
}

// ============================================================================
// SessionCapabilities
// ============================================================================

/// Capability flags that select or forbid dispatch strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCapabilities {
    /// Session drives a mobile device.
    pub is_mobile: bool,
    /// Negotiated protocol.
    pub protocol_mode: ProtocolMode,
}

impl SessionCapabilities {
    /// Desktop, classic-only capabilities.
    #[inline]
    #[must_use]
    pub const fn desktop() -> Self {
        Self {
            is_mobile: false,
            protocol_mode: ProtocolMode::Classic,
        }
    }

    /// Sets the mobile flag.
    #[inline]
    #[must_use]
    pub const fn with_mobile(mut self, is_mobile: bool) -> Self {
        self.is_mobile = is_mobile;
        self
    }

    /// Sets the protocol mode.
    #[inline]
    #[must_use]
    pub const fn with_protocol_mode(mut self, protocol_mode: ProtocolMode) -> Self {
        self.protocol_mode = protocol_mode;
        self
    }

    /// Derives flags from the capabilities object a new-session reply carries.
    ///
    /// A session is mobile when `platformName` is Android or iOS, or when a
    /// device name capability is present. It is BiDi when the remote end
    /// returned a `webSocketUrl`.
    #[must_use]
    pub fn from_capabilities(capabilities: &Value) -> Self {
        let platform = capabilities
            .get("platformName")
            .and_then(Value::as_str)
            .map(str::to_ascii_lowercase);
        let is_mobile = platform.is_some_and(|p| MOBILE_PLATFORMS.contains(&p.as_str()))
            || MOBILE_CAPABILITY_KEYS
                .iter()
                .any(|key| capabilities.get(key).is_some());

        let protocol_mode = if capabilities
            .get("webSocketUrl")
            .is_some_and(Value::is_string)
        {
            ProtocolMode::Bidi
        } else {
            ProtocolMode::Classic
        };

        Self {
            is_mobile,
            protocol_mode,
        }
    }

    /// Returns `true` if these capabilities do not trip `restriction`.
    #[must_use]
    pub fn permits(&self, restriction: Restriction) -> bool {
        match restriction {
            Restriction::Mobile => !self.is_mobile,
            Restriction::BidiOnly => self.protocol_mode == ProtocolMode::Bidi,
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// One live automation session.
#[derive(Clone)]
pub struct Session {
    id: SessionId,
    capabilities: SessionCapabilities,
    transport: TransportHandle,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("capabilities", &self.capabilities)
            .field("has_channel", &self.transport.has_channel())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a session, checking that capabilities match the transports.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the protocol mode is BiDi but the
    /// transport handle has no session channel.
    pub fn new(
        id: SessionId,
        capabilities: SessionCapabilities,
        transport: TransportHandle,
    ) -> Result<Self> {
        if capabilities.protocol_mode == ProtocolMode::Bidi && !transport.has_channel() {
            return Err(Error::config(format!(
                "session {id} is in BiDi mode but has no session channel"
            )));
        }
        Ok(Self {
            id,
            capabilities,
            transport,
        })
    }

    /// Creates a desktop classic session over one request transport.
    #[must_use]
    pub fn classic(id: SessionId, request: Arc<dyn RequestTransport>) -> Self {
        Self {
            id,
            capabilities: SessionCapabilities::desktop(),
            transport: TransportHandle::new(request),
        }
    }

    /// Creates a desktop BiDi session.
    #[must_use]
    pub fn bidi(
        id: SessionId,
        request: Arc<dyn RequestTransport>,
        channel: Arc<dyn SessionChannel>,
    ) -> Self {
        Self {
            id,
            capabilities: SessionCapabilities::desktop().with_protocol_mode(ProtocolMode::Bidi),
            transport: TransportHandle::new(request).with_channel(channel),
        }
    }

    /// Marks the session as running on a mobile device.
    #[must_use]
    pub fn with_mobile(mut self, is_mobile: bool) -> Self {
        self.capabilities.is_mobile = is_mobile;
        self
    }

    /// Returns the session ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the capability flags.
    #[inline]
    #[must_use]
    pub fn capabilities(&self) -> SessionCapabilities {
        self.capabilities
    }

    /// Returns `true` for mobile sessions.
    #[inline]
    #[must_use]
    pub fn is_mobile(&self) -> bool {
        self.capabilities.is_mobile
    }

    /// Returns the negotiated protocol.
    #[inline]
    #[must_use]
    pub fn protocol_mode(&self) -> ProtocolMode {
        self.capabilities.protocol_mode
    }

    /// Returns the transports.
    #[inline]
    #[must_use]
    pub fn transport(&self) -> &TransportHandle {
        &self.transport
    }

    /// Returns the session-supplied value of a path variable, if any.
    #[must_use]
    pub fn context_variable(&self, name: &str) -> Option<&str> {
        (name == SESSION_VARIABLE).then(|| self.id.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
