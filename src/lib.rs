//! WebDriver dispatch - catalog-driven command engine.
//!
//! This library turns a declarative catalog of WebDriver endpoints into
//! validated, callable commands and picks the right implementation for each
//! call from the session's capabilities.
//!
//! # Architecture
//!
//! The engine sits between callers and two transports:
//!
//! - **Request/Response (Classic)**: one HTTP call per command
//! - **Session Channel (BiDi)**: named calls over a persistent WebSocket
//!
//! Key design principles:
//!
//! - The catalog is parsed and checked once into a read-only [`Registry`]
//! - Arguments are validated before any transport use
//! - Each command resolves to one [`Strategy`]: simple, guarded, or composite
//! - Sessions own their transports; the engine only borrows them per call
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use webdriver_dispatch::{Arguments, DispatchEngine, HttpTransport, Registry, Result, Session, SessionId};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let engine = DispatchEngine::new(Arc::new(Registry::webdriver()?));
//!
//!     let http = Arc::new(HttpTransport::new("http://127.0.0.1:4444")?);
//!     let id = SessionId::new("4f2c1d").expect("non-empty session id");
//!     let session = Session::classic(id, http);
//!
//!     engine
//!         .invoke(&session, "navigateTo", Arguments::from(json!({ "url": "https://example.com" })))
//!         .await?;
//!     let title = engine.invoke(&session, "getTitle", Arguments::None).await?;
//!     println!("Page title: {title}");
//!
//!     let window = engine
//!         .invoke(&session, "newWindow", Arguments::positional(["https://example.org"]))
//!         .await?;
//!     println!("Opened: {window}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`catalog`] | Command definitions and the [`Registry`] |
//! | [`dispatch`] | Validation, path resolution, strategies, [`DispatchEngine`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | BiDi frame types |
//! | [`session`] | Session descriptor and capabilities |
//! | [`transport`] | HTTP and WebSocket adapters |

// ============================================================================
// Modules
// ============================================================================

/// Declarative command catalog.
///
/// Use [`Registry::webdriver()`] for the bundled W3C catalog or
/// [`Registry::from_json_str`] for your own.
pub mod catalog;

/// Command dispatch.
///
/// [`DispatchEngine::invoke`] is the caller-facing entry point.
pub mod dispatch;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// BiDi protocol frame types.
pub mod protocol;

/// Session descriptor consulted at every dispatch.
pub mod session;

/// Transport adapters.
///
/// HTTP request/response and WebSocket session channel.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Catalog types
pub use catalog::{CommandDefinition, Method, Parameter, Registry, ReturnDescriptor, TypeDescriptor};

// Dispatch types
pub use dispatch::{
    Arguments, CommandResolver, Composite, DispatchEngine, EngineBuilder, ExtraArguments,
    HandlePolling, Strategy, ValidatedArgs, ValidatedCall,
};

// Error types
pub use error::{Error, Restriction, Result};

// Identifier types
pub use identifiers::{CommandId, SessionId, WindowHandle};

// Session types
pub use session::{ProtocolMode, Session, SessionCapabilities};

// Transport types
pub use transport::{
    ChannelOptions, EventHandler, Exchange, HttpTransport, HttpTransportOptions, RequestTransport,
    SessionChannel, TransportHandle, WebSocketChannel,
};
