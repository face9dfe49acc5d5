//! Strategy selection.
//!
//! Every command name maps to exactly one [`Strategy`]:
//!
//! | Strategy | Transport calls |
//! |----------|-----------------|
//! | `Simple` | one request/response call |
//! | `Guarded` | capability check, then one request/response call |
//! | `Composite` | fixed sequence chosen from session capabilities |
//!
//! Built-in composites take precedence over catalog entries of the same
//! name.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::catalog::{CommandDefinition, Registry};
use crate::error::{Error, Restriction, Result};

// ============================================================================
// Composite
// ============================================================================

/// Built-in multi-step commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Composite {
    /// Open a tab or window, navigate it, and return its handle.
    NewWindow,
}

impl Composite {
    /// All built-in composites.
    pub const ALL: &'static [Self] = &[Self::NewWindow];

    /// Returns the command name callers use.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NewWindow => "newWindow",
        }
    }

    /// Looks up a composite by command name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }
}

impl fmt::Display for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// How one invocation is carried out.
#[derive(Debug, Clone, Copy)]
pub enum Strategy<'a> {
    /// One request/response call built from the definition.
    Simple(&'a CommandDefinition),
    /// Like `Simple`, after the session passes `restriction`.
    Guarded {
        /// Command definition.
        definition: &'a CommandDefinition,
        /// Capability the session must not trip.
        restriction: Restriction,
    },
    /// Built-in multi-step command.
    Composite(Composite),
}

impl Strategy<'_> {
    /// Short label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Simple(_) => "simple",
            Self::Guarded { .. } => "guarded",
            Self::Composite(_) => "composite",
        }
    }
}

// ============================================================================
// CommandResolver
// ============================================================================

/// Maps command names to strategies.
///
/// Immutable once built.
#[derive(Debug, Clone)]
pub struct CommandResolver {
    registry: Arc<Registry>,
    guards: FxHashMap<String, Restriction>,
}

impl CommandResolver {
    /// Creates a resolver.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a guard names a command the registry
    /// does not hold.
    pub fn new(
        registry: Arc<Registry>,
        guards: impl IntoIterator<Item = (String, Restriction)>,
    ) -> Result<Self> {
        let guards: FxHashMap<String, Restriction> = guards.into_iter().collect();
        if let Some(unknown) = guards.keys().find(|name| !registry.contains(name)) {
            return Err(Error::config(format!(
                "cannot guard '{unknown}': no such catalog command"
            )));
        }
        Ok(Self { registry, guards })
    }

    /// Creates a resolver with no guards.
    #[must_use]
    pub fn unguarded(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            guards: FxHashMap::default(),
        }
    }

    /// Returns the strategy for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCommand`] if nothing is registered under
    /// `name`.
    pub fn resolve(&self, name: &str) -> Result<Strategy<'_>> {
        if let Some(composite) = Composite::from_name(name) {
            return Ok(Strategy::Composite(composite));
        }

        let definition = self.registry.require(name)?;
        Ok(match self.guards.get(name) {
            Some(&restriction) => Strategy::Guarded {
                definition,
                restriction,
            },
            None => Strategy::Simple(definition),
        })
    }

    /// Returns the registry.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the restriction attached to `name`, if any.
    #[inline]
    #[must_use]
    pub fn guard(&self, name: &str) -> Option<Restriction> {
        self.guards.get(name).copied()
    }
}

// ============================================================================
// Tests
// ============================================================================
