//! Declarative command catalog.
//!
//! A catalog maps endpoint paths and verbs to command definitions. It is
//! parsed and validated once into a [`Registry`] that the dispatch engine
//! reads from.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `definition` | Typed definitions, parameters, type descriptors |
//! | `registry` | Catalog loading and lookup |
//! | `template` | `:variable` path templates |

// ============================================================================
// Submodules
// ============================================================================

/// Typed command definitions.
pub mod definition;

/// Catalog loading and lookup.
pub mod registry;

/// Path templates.
pub mod template;

// ============================================================================
// Re-exports
// ============================================================================

pub use definition::{
    CommandDefinition, Method, Parameter, ReturnDescriptor, TypeDescriptor, ValueKind,
};
pub use registry::Registry;
pub use template::{PathTemplate, Segment};
