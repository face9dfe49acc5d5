//! Command dispatch engine.
//!
//! The engine is the caller-facing entry point: one [`DispatchEngine::invoke`]
//! per command name. It borrows the session for the length of one call and
//! keeps no per-session state.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use serde_json::json;
//! use webdriver_dispatch::{Arguments, DispatchEngine, Registry};
//!
//! let engine = DispatchEngine::new(Arc::new(Registry::webdriver()?));
//! let title = engine.invoke(&session, "getTitle", Arguments::None).await?;
//! engine
//!     .invoke(&session, "navigateTo", json!({ "url": "https://example.com" }).into())
//!     .await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::catalog::{CommandDefinition, Registry};
use crate::error::{Error, Result};
use crate::session::Session;
use crate::transport::Exchange;

use super::arguments::Arguments;
use super::builder::{EngineBuilder, HandlePolling};
use super::composite;
use super::mapper;
use super::path;
use super::resolver::{CommandResolver, Strategy};
use super::validator::{self, ExtraArguments};

// ============================================================================
// ValidatedCall
// ============================================================================

/// A request ready for the transport: definition, resolved path, body.
///
/// Built per call and consumed immediately.
#[derive(Debug, Clone)]
pub struct ValidatedCall<'a> {
    /// Definition the call was built from.
    pub definition: &'a CommandDefinition,
    /// Path with every variable substituted.
    pub path: String,
    /// JSON body, present only for verbs that carry one.
    pub body: Option<Value>,
}

impl ValidatedCall<'_> {
    /// Converts into a transport exchange.
    #[must_use]
    pub fn into_exchange(self) -> Exchange {
        Exchange::Request {
            method: self.definition.method,
            path: self.path,
            body: self.body,
        }
    }
}

// ============================================================================
// DispatchEngine
// ============================================================================

struct EngineInner {
    resolver: CommandResolver,
    extra_arguments: ExtraArguments,
    handle_polling: HandlePolling,
}

/// Turns command names and arguments into validated transport calls.
///
/// Cheap to clone; clones share one immutable resolver.
#[derive(Clone)]
pub struct DispatchEngine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for DispatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchEngine")
            .field("commands", &self.registry().len())
            .field("extra_arguments", &self.inner.extra_arguments)
            .field("handle_polling", &self.inner.handle_polling)
            .finish()
    }
}

impl DispatchEngine {
    /// Creates an engine with default settings and no guards.
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::from_parts(
            CommandResolver::unguarded(registry),
            ExtraArguments::default(),
            HandlePolling::default(),
        )
    }

    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder(registry: Arc<Registry>) -> EngineBuilder {
        EngineBuilder::new(registry)
    }

    pub(crate) fn from_parts(
        resolver: CommandResolver,
        extra_arguments: ExtraArguments,
        handle_polling: HandlePolling,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                resolver,
                extra_arguments,
                handle_polling,
            }),
        }
    }

    /// Returns the registry.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Registry {
        self.inner.resolver.registry()
    }

    /// Returns the strategy table.
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &CommandResolver {
        &self.inner.resolver
    }

    /// Returns the extra-argument policy.
    #[inline]
    #[must_use]
    pub fn extra_arguments(&self) -> ExtraArguments {
        self.inner.extra_arguments
    }

    /// Returns the new-window handle polling bound.
    #[inline]
    #[must_use]
    pub fn handle_polling(&self) -> HandlePolling {
        self.inner.handle_polling
    }

    /// Invokes a command by name.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownCommand`] if `name` is not registered
    /// - [`Error::UnsupportedOperation`] if the session forbids the command
    /// - [`Error::Validation`] if `args` do not fit the schema
    /// - [`Error::MissingVariable`] if a path variable has no value
    /// - transport and protocol errors from the session's adapters
    ///
    /// Nothing is sent when any of the first four occur.
    pub async fn invoke(&self, session: &Session, name: &str, args: Arguments) -> Result<Value> {
        let strategy = self.inner.resolver.resolve(name)?;
        debug!(
            session = %session.id(),
            command = name,
            strategy = strategy.kind(),
            "Dispatching command"
        );

        match strategy {
            Strategy::Simple(definition) => self.run_simple(session, definition, &args).await,
            Strategy::Guarded {
                definition,
                restriction,
            } => {
                if !session.capabilities().permits(restriction) {
                    return Err(Error::unsupported(name, restriction));
                }
                self.run_simple(session, definition, &args).await
            }
            Strategy::Composite(composite) => {
                composite::run(self, composite, session, &args).await
            }
        }
    }

    /// Validates arguments and resolves the path for a catalog command
    /// without sending anything.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownCommand`] if `name` is not a catalog command
    /// - [`Error::Validation`] or [`Error::MissingVariable`] as for
    ///   [`DispatchEngine::invoke`]
    pub fn prepare<'a>(
        &'a self,
        session: &Session,
        name: &str,
        args: &Arguments,
    ) -> Result<ValidatedCall<'a>> {
        let definition = self.registry().require(name)?;
        self.prepare_definition(session, definition, args)
    }

    /// Runs one catalog command as a simple call, bypassing guards and
    /// composites.
    pub(crate) async fn dispatch_catalog(
        &self,
        session: &Session,
        name: &str,
        args: &Arguments,
    ) -> Result<Value> {
        let definition = self.registry().require(name)?;
        self.run_simple(session, definition, args).await
    }

    async fn run_simple(
        &self,
        session: &Session,
        definition: &CommandDefinition,
        args: &Arguments,
    ) -> Result<Value> {
        if let Some(ref notice) = definition.deprecated {
            warn!(command = %definition.name, %notice, "Deprecated command");
        }

        let call = self.prepare_definition(session, definition, args)?;
        let raw = session.transport().exchange(call.into_exchange()).await?;
        Ok(mapper::map(definition.returns.as_ref(), raw))
    }

    fn prepare_definition<'a>(
        &self,
        session: &Session,
        definition: &'a CommandDefinition,
        args: &Arguments,
    ) -> Result<ValidatedCall<'a>> {
        let validated = validator::validate(definition, args, self.inner.extra_arguments)?;
        let mut variables = validated.variables;

        for name in definition.variables() {
            if variables.contains_key(name) {
                continue;
            }
            if let Some(value) = session.context_variable(name) {
                variables.insert(name.clone(), value.to_string());
            }
        }

        let path = path::resolve(&definition.name, &definition.path, &variables)?;
        let body = definition
            .method
            .carries_body()
            .then(|| Value::Object(validated.body));

        Ok(ValidatedCall {
            definition,
            path,
            body,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
