//! Command dispatch.
//!
//! Turns a command name plus arguments into one or more transport calls.
//!
//! # Flow
//!
//! ```text
//! invoke(session, name, args)
//!   │
//!   ├─► CommandResolver::resolve(name) ──► Strategy
//!   │
//!   ├─► Simple / Guarded ──► validate ──► resolve path ──► exchange ──► map
//!   │
//!   └─► Composite ──► ordered exchanges chosen from session capabilities
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `arguments` | Named / positional caller arguments |
//! | `builder` | Engine configuration |
//! | `composite` | Built-in multi-step commands |
//! | `engine` | Caller-facing entry point |
//! | `mapper` | Response shaping |
//! | `path` | Path variable substitution |
//! | `resolver` | Strategy selection |
//! | `validator` | Argument validation |

// ============================================================================
// Submodules
// ============================================================================

/// Caller-supplied arguments.
pub mod arguments;

/// Engine configuration.
pub mod builder;

/// Built-in multi-step commands.
mod composite;

/// Caller-facing entry point.
pub mod engine;

/// Response shaping.
pub mod mapper;

/// Path variable substitution.
pub mod path;

/// Strategy selection.
pub mod resolver;

/// Argument validation.
pub mod validator;

// ============================================================================
// Re-exports
// ============================================================================

pub use arguments::Arguments;
pub use builder::{EngineBuilder, HandlePolling};
pub use engine::{DispatchEngine, ValidatedCall};
pub use resolver::{CommandResolver, Composite, Strategy};
pub use validator::{ExtraArguments, ValidatedArgs};
