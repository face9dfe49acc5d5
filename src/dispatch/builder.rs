//! Builder pattern for engine configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use webdriver_dispatch::{DispatchEngine, ExtraArguments, HandlePolling, Registry, Restriction};
//!
//! let engine = DispatchEngine::builder(Arc::new(Registry::webdriver()?))
//!     .extra_arguments(ExtraArguments::Reject)
//!     .guard("takeScreenshot", Restriction::Mobile)
//!     .handle_polling(HandlePolling::new(20, Duration::from_millis(250)))
//!     .build()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::catalog::Registry;
use crate::error::{Restriction, Result};

use super::engine::DispatchEngine;
use super::resolver::CommandResolver;
use super::validator::ExtraArguments;

// ============================================================================
// Constants
// ============================================================================

/// Default number of handle enumerations after `window.open`.
const DEFAULT_POLL_ATTEMPTS: u32 = 50;

/// Default pause between handle enumerations.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ============================================================================
// HandlePolling
// ============================================================================

/// How Classic `newWindow` waits for the opened window's handle.
///
/// `window.open` may return before the remote end lists the new window, so
/// handles are enumerated up to `attempts` times, `interval` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlePolling {
    /// Maximum enumerations; at least one.
    pub attempts: u32,
    /// Pause between enumerations.
    pub interval: Duration,
}

impl HandlePolling {
    /// Creates a polling bound. Zero attempts is raised to one.
    #[inline]
    #[must_use]
    pub const fn new(attempts: u32, interval: Duration) -> Self {
        Self {
            attempts: if attempts == 0 { 1 } else { attempts },
            interval,
        }
    }
}

impl Default for HandlePolling {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL)
    }
}

// ============================================================================
// EngineBuilder
// ============================================================================

/// Builder for configuring a [`DispatchEngine`].
///
/// Use [`DispatchEngine::builder()`] to create a new builder.
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    /// Command definitions.
    registry: Arc<Registry>,
    /// Policy for undeclared named arguments.
    extra_arguments: ExtraArguments,
    /// Capability guards by command name.
    guards: Vec<(String, Restriction)>,
    /// Wait for new window handles.
    handle_polling: HandlePolling,
}

// ============================================================================
// EngineBuilder Implementation
// ============================================================================

impl EngineBuilder {
    /// Creates a builder over `registry` with default settings.
    #[inline]
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            extra_arguments: ExtraArguments::default(),
            guards: Vec::new(),
            handle_polling: HandlePolling::default(),
        }
    }

    /// Sets the policy for undeclared named arguments.
    #[inline]
    #[must_use]
    pub fn extra_arguments(mut self, policy: ExtraArguments) -> Self {
        self.extra_arguments = policy;
        self
    }

    /// Forbids a catalog command on sessions that trip `restriction`.
    ///
    /// A later guard on the same name replaces an earlier one.
    #[inline]
    #[must_use]
    pub fn guard(mut self, command: impl Into<String>, restriction: Restriction) -> Self {
        self.guards.push((command.into(), restriction));
        self
    }

    /// Sets how long Classic `newWindow` waits for the new handle.
    #[inline]
    #[must_use]
    pub fn handle_polling(mut self, polling: HandlePolling) -> Self {
        self.handle_polling = polling;
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if a guard names a
    /// command the registry does not hold.
    pub fn build(self) -> Result<DispatchEngine> {
        let guards = self.guards.len();
        let resolver = CommandResolver::new(self.registry, self.guards)?;

        debug!(
            commands = resolver.registry().len(),
            guards,
            extra_arguments = ?self.extra_arguments,
            handle_polling = ?self.handle_polling,
            "Dispatch engine built"
        );

        Ok(DispatchEngine::from_parts(
            resolver,
            self.extra_arguments,
            self.handle_polling,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================
