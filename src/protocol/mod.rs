//! WebDriver BiDi message types.
//!
//! This module defines the frames exchanged over a session channel.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Local → Remote | Command with integer `id` |
//! | `Response` | Remote → Local | `success` or `error` reply for an `id` |
//! | `Event` | Remote → Local | Unsolicited notification |
//!
//! # Command Naming
//!
//! Commands follow `module.methodName` format:
//!
//! - `browsingContext.create`
//! - `browsingContext.navigate`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Typed commands used by composite strategies |
//! | `event` | Event frames |
//! | `request` | Request and Response frames |

// ============================================================================
// Submodules
// ============================================================================

/// Typed BiDi commands.
pub mod command;

/// Event frames.
pub mod event;

/// Request and Response frames.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{BrowsingContextCommand, ChannelCall, ContextType};
pub use event::Event;
pub use request::{Request, Response, ResponseType};
