//! Path variable substitution.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;

use crate::catalog::{PathTemplate, Segment};
use crate::error::{Error, Result};

// ============================================================================
// Resolution
// ============================================================================

/// Substitutes every `:variable` in `template` with its percent-encoded value.
///
/// Literal text is copied verbatim; each placeholder is replaced exactly once.
///
/// # Errors
///
/// - [`Error::MissingVariable`] if a variable has no value or an empty one
/// - [`Error::Validation`] if a value is a dot segment (`.` or `..`), which
///   URL normalization would collapse into a different endpoint
pub fn resolve(
    command: &str,
    template: &PathTemplate,
    values: &FxHashMap<String, String>,
) -> Result<String> {
    let mut path = String::with_capacity(template.as_str().len());

    for segment in template.segments() {
        match segment {
            Segment::Literal(text) => path.push_str(text),
            Segment::Variable(name) => {
                let value = values
                    .get(name)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| Error::missing_variable(command, name))?;
                if is_dot_segment(value) {
                    return Err(Error::validation(
                        command,
                        format!("Invalid value \"{value}\" for path variable \"{name}\""),
                    ));
                }
                path.push_str(&urlencoding::encode(value));
            }
        }
    }

    Ok(path)
}

/// Values that are still dot segments after percent-encoding.
fn is_dot_segment(value: &str) -> bool {
    matches!(value, "." | "..")
}

// ============================================================================
// Tests
// ============================================================================
