//! Response shaping.
//!
//! Return descriptors are informational, so mapping is lenient: it reshapes
//! where it can and never fails.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value};

use crate::catalog::ReturnDescriptor;

// ============================================================================
// Mapping
// ============================================================================

/// Converts a raw transport result into the declared return shape.
///
/// - No descriptor: `null`, whatever the payload.
/// - Declared properties and an object payload: the object projected onto
///   those properties, extras dropped, missing ones `null`.
/// - Anything else: the payload unchanged.
#[must_use]
pub fn map(returns: Option<&ReturnDescriptor>, raw: Value) -> Value {
    let Some(returns) = returns else {
        return Value::Null;
    };

    match raw {
        Value::Object(mut object) if !returns.properties.is_empty() => {
            let projected: Map<String, Value> = returns
                .properties
                .iter()
                .map(|name| (name.clone(), object.remove(name).unwrap_or(Value::Null)))
                .collect();
            Value::Object(projected)
        }
        other => other,
    }
}

// ============================================================================
// Tests
// ============================================================================
