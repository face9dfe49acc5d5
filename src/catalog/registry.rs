//! Command registry built from a declarative catalog.
//!
//! # Catalog Format
//!
//! ```json
//! {
//!   "/session/:sessionId/url": {
//!     "POST": {
//!       "command": "navigateTo",
//!       "description": "Navigate to a new URL.",
//!       "ref": "https://w3c.github.io/webdriver/#navigate-to",
//!       "variables": ["sessionId"],
//!       "parameters": [
//!         { "name": "url", "type": "string", "required": true }
//!       ]
//!     }
//!   }
//! }
//! ```
//!
//! Loading validates every entry and fails on the first defect, so a
//! [`Registry`] only ever holds well-formed definitions.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::session::SESSION_VARIABLE;

use super::definition::{CommandDefinition, Method, Parameter, ReturnDescriptor, TypeDescriptor};
use super::template::PathTemplate;

// ============================================================================
// Constants
// ============================================================================

/// WebDriver Classic catalog shipped with the crate.
const WEBDRIVER_CATALOG: &str = include_str!("webdriver.json");

// ============================================================================
// Raw Catalog Types
// ============================================================================

/// Catalog as written: path → verb → entry.
type RawCatalog = BTreeMap<String, BTreeMap<String, RawCommand>>;

#[derive(Debug, Deserialize)]
struct RawCommand {
    command: String,
    #[serde(default)]
    description: String,
    #[serde(default, rename = "ref")]
    reference: Option<String>,
    #[serde(default)]
    deprecated: Option<String>,
    #[serde(default)]
    variables: Vec<RawVariable>,
    #[serde(default)]
    parameters: Vec<RawParameter>,
    #[serde(default)]
    returns: Option<RawReturns>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawVariable {
    Name(String),
    Described { name: String },
}

impl RawVariable {
    fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Described { name, .. } => name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawParameter {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct RawReturns {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    properties: Vec<String>,
}

// ============================================================================
// Registry
// ============================================================================

/// Read-only table of command definitions keyed by name.
///
/// Built once at startup and shared by reference (`Arc<Registry>`).
#[derive(Debug, Clone, Default)]
pub struct Registry {
    commands: FxHashMap<String, CommandDefinition>,
}

// ============================================================================
// Registry - Constructors
// ============================================================================

impl Registry {
    /// Loads the bundled WebDriver Classic catalog.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Catalog`] if the bundled data is malformed.
    pub fn webdriver() -> Result<Self> {
        Self::from_json_str(WEBDRIVER_CATALOG)
    }

    /// Loads a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the file cannot be read
    /// - [`Error::Catalog`] if the catalog is malformed
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading command catalog");
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Loads a catalog from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Catalog`] if the JSON does not have the catalog
    /// shape or any entry fails validation.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: RawCatalog = serde_json::from_str(text)
            .map_err(|e| Error::catalog(format!("malformed catalog: {e}")))?;

        let mut definitions = Vec::new();
        for (path, methods) in raw {
            let template = PathTemplate::parse(&path)?;
            for (verb, entry) in methods {
                let method: Method = verb.parse()?;
                definitions.push(build_definition(template.clone(), method, entry)?);
            }
        }

        Self::from_definitions(definitions)
    }

    /// Builds a registry from already-constructed definitions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Catalog`] if two definitions share a name.
    pub fn from_definitions(definitions: impl IntoIterator<Item = CommandDefinition>) -> Result<Self> {
        let mut commands: FxHashMap<String, CommandDefinition> = FxHashMap::default();
        for definition in definitions {
            if let Some(previous) = commands.get(&definition.name) {
                return Err(Error::catalog(format!(
                    "duplicate command '{}' ({} {} and {} {})",
                    definition.name,
                    previous.method,
                    previous.path,
                    definition.method,
                    definition.path
                )));
            }
            commands.insert(definition.name.clone(), definition);
        }

        debug!(commands = commands.len(), "Command registry built");
        Ok(Self { commands })
    }
}

// ============================================================================
// Registry - Lookup
// ============================================================================

impl Registry {
    /// Looks up a command by name.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    /// Looks up a command, failing on unknown names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCommand`] if no definition has this name.
    pub fn require(&self, name: &str) -> Result<&CommandDefinition> {
        self.get(name).ok_or_else(|| Error::unknown_command(name))
    }

    /// Returns `true` if a definition with this name exists.
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Returns the number of definitions.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if the registry is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterates over all definitions in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.commands.values()
    }
}

// ============================================================================
// Entry Validation
// ============================================================================

/// Validates one raw entry and converts it to a definition.
fn build_definition(path: PathTemplate, method: Method, entry: RawCommand) -> Result<CommandDefinition> {
    let name = entry.command;
    if name.is_empty() {
        return Err(Error::catalog(format!("{method} {path}: empty command name")));
    }

    check_variables(&name, &path, &entry.variables)?;

    let mut seen = FxHashSet::default();
    let mut parameters = Vec::with_capacity(entry.parameters.len());
    for raw in entry.parameters {
        if path.variables().contains(&raw.name) {
            return Err(Error::catalog(format!(
                "{name}: parameter '{}' shadows a path variable",
                raw.name
            )));
        }
        if !seen.insert(raw.name.clone()) {
            return Err(Error::catalog(format!(
                "{name}: duplicate parameter '{}'",
                raw.name
            )));
        }
        let type_descriptor = TypeDescriptor::parse(&raw.type_name)
            .map_err(|e| Error::catalog(format!("{name}: parameter '{}': {e}", raw.name)))?;
        parameters.push(Parameter {
            name: raw.name,
            type_descriptor,
            required: raw.required,
            description: raw.description,
        });
    }

    let returns = entry.returns.map(|raw| ReturnDescriptor {
        type_name: raw.type_name,
        name: raw.name,
        description: raw.description,
        properties: raw.properties,
    });

    Ok(CommandDefinition {
        name,
        method,
        path,
        parameters,
        returns,
        description: entry.description,
        reference: entry.reference,
        deprecated: entry.deprecated,
    })
}

/// Checks that declared variables equal the template placeholders.
///
/// The session placeholder is filled from the session, so entries may leave
/// it undeclared.
fn check_variables(name: &str, path: &PathTemplate, declared: &[RawVariable]) -> Result<()> {
    let mut declared_names = FxHashSet::default();
    for variable in declared {
        if !declared_names.insert(variable.name()) {
            return Err(Error::catalog(format!(
                "{name}: variable '{}' declared twice",
                variable.name()
            )));
        }
    }

    let placeholders: FxHashSet<&str> = path.variables().iter().map(String::as_str).collect();

    if let Some(extra) = declared_names.difference(&placeholders).next() {
        return Err(Error::catalog(format!(
            "{name}: variable '{extra}' is not a placeholder of '{path}'"
        )));
    }
    if let Some(missing) = placeholders
        .difference(&declared_names)
        .find(|p| **p != SESSION_VARIABLE)
    {
        return Err(Error::catalog(format!(
            "{name}: placeholder ':{missing}' of '{path}' is not declared"
        )));
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    const SMALL_CATALOG: &str = r#"{
        "/session/:sessionId/element/:elementId/attribute/:name": {
            "GET": {
                "command": "getElementAttribute",
                "variables": [
                    "sessionId",
                    { "name": "elementId", "description": "element to read" },
                    "name"
                ],
                "returns": { "type": "string", "name": "attribute" }
            }
        },
        "/session/:sessionId/url": {
            "GET": { "command": "getUrl", "variables": ["sessionId"] },
            "POST": {
                "command": "navigateTo",
                "variables": ["sessionId"],
                "parameters": [{ "name": "url", "type": "string", "required": true }]
            }
        }
    }"#;

    #[test]
    fn test_load_small_catalog() {
        let registry = Registry::from_json_str(SMALL_CATALOG).expect("load");
        assert_eq!(registry.len(), 3);

        let nav = registry.require("navigateTo").expect("navigateTo");
        assert_eq!(nav.method, Method::Post);
        assert_eq!(nav.variables(), &["sessionId"]);
        assert!(nav.parameter("url").is_some_and(|p| p.required));

        let attr = registry.require("getElementAttribute").expect("attr");
        assert_eq!(attr.variables(), &["sessionId", "elementId", "name"]);
    }

    #[test]
    fn test_unknown_command() {
        let registry = Registry::from_json_str(SMALL_CATALOG).expect("load");
        assert!(matches!(
            registry.require("nope"),
            Err(Error::UnknownCommand { .. })
        ));
    }

    #[test]
    fn test_undeclared_placeholder_rejected() {
        let catalog = r#"{ "/session/:sessionId/element/:elementId/text": {
            "GET": { "command": "getElementText" }
        } }"#;
        let err = Registry::from_json_str(catalog).unwrap_err();
        assert!(err.to_string().contains(":elementId"), "{err}");
    }

    #[test]
    fn test_session_placeholder_may_be_undeclared() {
        let catalog = r#"{
            "/session/:sessionId/sauce/ondemand/mock/:mockId": {
                "GET": {
                    "command": "getMockCalls",
                    "variables": [{ "name": "mockId", "description": "the id of the mock" }],
                    "returns": { "type": "object[]", "name": "requests" }
                }
            },
            "/session/:sessionId/title": { "GET": { "command": "getTitle" } }
        }"#;

        let registry = Registry::from_json_str(catalog).expect("load");
        let mock = registry.require("getMockCalls").expect("getMockCalls");
        assert_eq!(mock.variables(), &["sessionId", "mockId"]);
        let title = registry.require("getTitle").expect("getTitle");
        assert_eq!(title.variables(), &["sessionId"]);
    }

    #[test]
    fn test_extra_variable_rejected() {
        let catalog = r#"{ "/status": { "GET": { "command": "status", "variables": ["sessionId"] } } }"#;
        let err = Registry::from_json_str(catalog).unwrap_err();
        assert!(err.to_string().contains("not a placeholder"), "{err}");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let catalog = r#"{
            "/a": { "GET": { "command": "same" } },
            "/b": { "GET": { "command": "same" } }
        }"#;
        let err = Registry::from_json_str(catalog).unwrap_err();
        assert!(err.to_string().contains("duplicate command"), "{err}");
    }

    #[test]
    fn test_bad_method_and_type_rejected() {
        let bad_method = r#"{ "/a": { "PATCH": { "command": "a" } } }"#;
        assert!(Registry::from_json_str(bad_method).is_err());

        let bad_type = r#"{ "/a": { "POST": {
            "command": "a",
            "parameters": [{ "name": "x", "type": "widget" }]
        } } }"#;
        assert!(matches!(
            Registry::from_json_str(bad_type),
            Err(Error::Catalog { .. })
        ));
    }

    #[test]
    fn test_parameter_shadowing_variable_rejected() {
        let catalog = r#"{ "/a/:id": { "POST": {
            "command": "a",
            "variables": ["id"],
            "parameters": [{ "name": "id", "type": "string" }]
        } } }"#;
        assert!(Registry::from_json_str(catalog).is_err());
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SMALL_CATALOG.as_bytes()).expect("write");

        let registry = Registry::from_path(file.path()).expect("load");
        assert!(registry.contains("getUrl"));
    }

    #[test]
    fn test_bundled_catalog_loads() {
        let registry = Registry::webdriver().expect("bundled catalog");
        for name in [
            "navigateTo",
            "getWindowHandles",
            "switchToWindow",
            "executeScript",
        ] {
            assert!(registry.contains(name), "missing {name}");
        }
    }

    #[test]
    fn test_bundled_catalog_variables_are_bijective() {
        let registry = Registry::webdriver().expect("bundled catalog");
        for definition in registry.iter() {
            let placeholders: Vec<String> = definition
                .path
                .as_str()
                .split('/')
                .filter_map(|s| s.strip_prefix(':'))
                .map(str::to_string)
                .collect();
            assert_eq!(definition.variables(), placeholders.as_slice());
            assert!(
                placeholders.is_empty() || placeholders[0] == SESSION_VARIABLE,
                "{}",
                definition.name
            );
        }
    }
}
