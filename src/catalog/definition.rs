//! Strongly typed command definitions.
//!
//! A [`CommandDefinition`] is the parsed, validated form of one catalog
//! entry. Definitions are built once by the registry and never mutated.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{Error, Result};

use super::template::PathTemplate;

// ============================================================================
// Method
// ============================================================================

/// HTTP verb of a classic endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Returns the verb in upper case.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }

    /// Returns `true` if requests with this verb carry a JSON body.
    #[inline]
    #[must_use]
    pub const fn carries_body(self) -> bool {
        matches!(self, Self::Post)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "DELETE" => Ok(Self::Delete),
            other => Err(Error::catalog(format!("unsupported method '{other}'"))),
        }
    }
}

// ============================================================================
// ValueKind
// ============================================================================

/// Primitive JSON kind named in a type descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// JSON string.
    String,
    /// JSON number.
    Number,
    /// JSON boolean.
    Boolean,
    /// JSON object (not array).
    Object,
    /// JSON array.
    Array,
    /// JSON `null`.
    Null,
    /// Anything.
    Any,
}

impl ValueKind {
    /// Returns the kind of a JSON value.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Boolean,
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
            Value::Null => Self::Null,
        }
    }

    /// Returns `true` if `value` is of this kind.
    #[inline]
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        self == Self::Any || self == Self::of(value)
    }

    /// Returns the descriptor name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Null => "null",
            Self::Any => "*",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(Self::String),
            "number" | "integer" => Ok(Self::Number),
            "boolean" | "bool" => Ok(Self::Boolean),
            "object" => Ok(Self::Object),
            "array" => Ok(Self::Array),
            "null" => Ok(Self::Null),
            "*" | "any" => Ok(Self::Any),
            other => Err(Error::catalog(format!("unknown type '{other}'"))),
        }
    }
}

// ============================================================================
// TypeDescriptor
// ============================================================================

/// Union of accepted kinds, e.g. `string`, `(string|object)`, `number[]`.
///
/// With the `[]` suffix the argument must be an array whose every element
/// matches one of the kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    kinds: Vec<ValueKind>,
    element_array: bool,
}

impl TypeDescriptor {
    /// Creates a descriptor accepting a single kind.
    #[inline]
    #[must_use]
    pub fn of(kind: ValueKind) -> Self {
        Self {
            kinds: vec![kind],
            element_array: false,
        }
    }

    /// Parses a catalog type string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Catalog`] on empty or unknown type names.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut text = raw.trim();
        let element_array = text.ends_with("[]");
        if element_array {
            text = &text[..text.len() - 2];
        }
        let text = text
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .unwrap_or(text);

        let kinds = text
            .split('|')
            .map(ValueKind::from_str)
            .collect::<Result<Vec<_>>>()
            .map_err(|e| Error::catalog(format!("invalid type descriptor '{raw}': {e}")))?;

        Ok(Self {
            kinds,
            element_array,
        })
    }

    /// Returns `true` if `value` satisfies the descriptor.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        if self.element_array {
            return value
                .as_array()
                .is_some_and(|items| items.iter().all(|item| self.matches_one(item)));
        }
        self.matches_one(value)
    }

    /// Returns `true` if a bare `null` is an acceptable value.
    #[inline]
    #[must_use]
    pub fn admits_null(&self) -> bool {
        !self.element_array && self.matches_one(&Value::Null)
    }

    fn matches_one(&self, value: &Value) -> bool {
        self.kinds.iter().any(|kind| kind.matches(value))
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.kinds.iter().map(|k| k.as_str()).collect();
        if names.len() > 1 {
            write!(f, "({})", names.join("|"))?;
        } else {
            f.write_str(names.first().copied().unwrap_or_default())?;
        }
        if self.element_array {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

// ============================================================================
// Parameter
// ============================================================================

/// One declared body parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name (body key).
    pub name: String,
    /// Accepted types.
    pub type_descriptor: TypeDescriptor,
    /// Whether the caller must supply it.
    pub required: bool,
    /// Documentation.
    pub description: String,
}

impl Parameter {
    /// Creates a parameter without description.
    #[must_use]
    pub fn new(name: impl Into<String>, type_descriptor: TypeDescriptor, required: bool) -> Self {
        Self {
            name: name.into(),
            type_descriptor,
            required,
            description: String::new(),
        }
    }
}

// ============================================================================
// ReturnDescriptor
// ============================================================================

/// Informational description of a command's result.
///
/// `type_name` is documentation only. `properties`, when present, lists the
/// fields an object-shaped result is projected onto.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReturnDescriptor {
    /// Declared type, as written in the catalog.
    pub type_name: String,
    /// Name of the returned value.
    pub name: String,
    /// Documentation.
    pub description: String,
    /// Declared object properties.
    pub properties: Vec<String>,
}

// ============================================================================
// CommandDefinition
// ============================================================================

/// One remote operation: verb, path, parameter schema, result shape.
#[derive(Debug, Clone)]
pub struct CommandDefinition {
    /// Unique command name.
    pub name: String,
    /// HTTP verb.
    pub method: Method,
    /// Path with `:variable` placeholders.
    pub path: PathTemplate,
    /// Body parameters in declaration order.
    pub parameters: Vec<Parameter>,
    /// Result description; `None` means no meaningful result.
    pub returns: Option<ReturnDescriptor>,
    /// Documentation.
    pub description: String,
    /// Link to the protocol documentation.
    pub reference: Option<String>,
    /// Deprecation notice.
    pub deprecated: Option<String>,
}

impl CommandDefinition {
    /// Returns the path variables in template order.
    #[inline]
    #[must_use]
    pub fn variables(&self) -> &[String] {
        self.path.variables()
    }

    /// Looks up a parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_simple_type() {
        let ty = TypeDescriptor::parse("string").expect("parse");
        assert!(ty.matches(&json!("x")));
        assert!(!ty.matches(&json!(1)));
        assert!(!ty.admits_null());
        assert_eq!(ty.to_string(), "string");
    }

    #[test]
    fn test_parse_union_type() {
        let ty = TypeDescriptor::parse("(string|object)").expect("parse");
        assert!(ty.matches(&json!("x")));
        assert!(ty.matches(&json!({ "a": 1 })));
        assert!(!ty.matches(&json!([1])));
        assert_eq!(ty.to_string(), "(string|object)");

        let bare = TypeDescriptor::parse("String|Number").expect("parse");
        assert!(bare.matches(&json!(3.5)));
    }

    #[test]
    fn test_parse_element_array_type() {
        let ty = TypeDescriptor::parse("number[]").expect("parse");
        assert!(ty.matches(&json!([1, 2, 3])));
        assert!(ty.matches(&json!([])));
        assert!(!ty.matches(&json!([1, "2"])));
        assert!(!ty.matches(&json!(1)));
        assert_eq!(ty.to_string(), "number[]");
    }

    #[test]
    fn test_null_admission() {
        let ty = TypeDescriptor::parse("(number|object|null)").expect("parse");
        assert!(ty.admits_null());
        assert!(ty.matches(&Value::Null));

        let any = TypeDescriptor::parse("*").expect("parse");
        assert!(any.admits_null());
    }

    #[test]
    fn test_unknown_type_is_catalog_error() {
        let err = TypeDescriptor::parse("widget").unwrap_err();
        assert!(matches!(err, Error::Catalog { .. }));
        assert!(TypeDescriptor::parse("").is_err());
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("get".parse::<Method>().ok(), Some(Method::Get));
        assert_eq!("POST".parse::<Method>().ok(), Some(Method::Post));
        assert!("PATCH".parse::<Method>().is_err());
        assert!(Method::Post.carries_body());
        assert!(!Method::Delete.carries_body());
    }
}
