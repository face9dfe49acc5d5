//! Path templates with `:variable` placeholders.
//!
//! A template such as `/session/:sessionId/element/:elementId/click` is
//! split once into literal and variable segments so that resolution is a
//! single pass with no re-parsing.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Matches one `:name` placeholder.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").expect("placeholder pattern is valid")
});

// ============================================================================
// Segment
// ============================================================================

/// A piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Copied verbatim.
    Literal(String),
    /// Replaced by the named variable's encoded value.
    Variable(String),
}

// ============================================================================
// PathTemplate
// ============================================================================

/// A parsed endpoint path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
    variables: Vec<String>,
}

impl PathTemplate {
    /// Parses a template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Catalog`] if the template does not start with `/`
    /// or names the same variable twice.
    pub fn parse(raw: &str) -> Result<Self> {
        if !raw.starts_with('/') {
            return Err(Error::catalog(format!(
                "path template '{raw}' must start with '/'"
            )));
        }

        let mut segments = Vec::new();
        let mut variables: Vec<String> = Vec::new();
        let mut cursor = 0;

        for captures in PLACEHOLDER.captures_iter(raw) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            if whole.start() > cursor {
                segments.push(Segment::Literal(raw[cursor..whole.start()].to_string()));
            }

            let name = name.as_str().to_string();
            if variables.contains(&name) {
                return Err(Error::catalog(format!(
                    "path template '{raw}' repeats variable '{name}'"
                )));
            }
            variables.push(name.clone());
            segments.push(Segment::Variable(name));
            cursor = whole.end();
        }

        if cursor < raw.len() {
            segments.push(Segment::Literal(raw[cursor..].to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
            variables,
        })
    }

    /// Returns the template as written.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed segments.
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns placeholder names in order of appearance.
    #[inline]
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ============================================================================
// Tests
// ============================================================================
