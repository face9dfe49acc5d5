//! Caller-supplied command arguments.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value};

// ============================================================================
// Arguments
// ============================================================================

/// Arguments to one command invocation.
///
/// Positional values bind to caller-supplied path variables first, in
/// template order, then to parameters in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Arguments {
    /// No arguments.
    #[default]
    None,
    /// Values in binding order.
    Positional(Vec<Value>),
    /// Values keyed by variable or parameter name.
    Named(Map<String, Value>),
}

impl Arguments {
    /// Creates named arguments from key/value pairs.
    #[must_use]
    pub fn named<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Named(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Creates positional arguments.
    #[must_use]
    pub fn positional<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self::Positional(values.into_iter().map(Into::into).collect())
    }

    /// Returns the number of supplied values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Positional(values) => values.len(),
            Self::Named(map) => map.len(),
        }
    }

    /// Returns `true` if no values were supplied.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Value> for Arguments {
    /// Objects become named, arrays positional, `null` none, and any other
    /// scalar a single positional value.
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::None,
            Value::Object(map) => Self::Named(map),
            Value::Array(values) => Self::Positional(values),
            scalar => Self::Positional(vec![scalar]),
        }
    }
}

impl From<Map<String, Value>> for Arguments {
    fn from(map: Map<String, Value>) -> Self {
        Self::Named(map)
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(values: Vec<Value>) -> Self {
        Self::Positional(values)
    }
}

// ============================================================================
// Tests
// ============================================================================
