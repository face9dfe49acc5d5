//! Argument validation against a parameter schema.
//!
//! Validation is pure and runs before any transport use, so a rejected call
//! never reaches the network.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

use crate::catalog::{CommandDefinition, Parameter, ValueKind};
use crate::error::{Error, Result};
use crate::session::SESSION_VARIABLE;

use super::arguments::Arguments;

// ============================================================================
// ExtraArguments
// ============================================================================

/// What to do with named arguments the schema does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtraArguments {
    /// Forward them in the body unchanged.
    #[default]
    PassThrough,
    /// Fail with a validation error.
    Reject,
}

// ============================================================================
// ValidatedArgs
// ============================================================================

/// Arguments split into path-variable values and body parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArgs {
    /// Caller-supplied path-variable values, stringified.
    pub variables: FxHashMap<String, String>,
    /// Body object: validated parameters plus passed-through extras.
    pub body: Map<String, Value>,
}

// ============================================================================
// Validation
// ============================================================================

/// Validates `args` against a command definition.
///
/// # Errors
///
/// Returns [`Error::Validation`] if a required parameter is missing, a value
/// has the wrong type, too many positional values are given, or an extra
/// argument is supplied under [`ExtraArguments::Reject`].
pub fn validate(
    definition: &CommandDefinition,
    args: &Arguments,
    policy: ExtraArguments,
) -> Result<ValidatedArgs> {
    validate_parameters(
        &definition.name,
        definition.variables(),
        &definition.parameters,
        args,
        policy,
    )
}

/// Validates `args` against a bare variable list and parameter schema.
///
/// Shared by catalog commands and built-in composites.
///
/// # Errors
///
/// See [`validate`].
pub fn validate_parameters(
    command: &str,
    variables: &[String],
    parameters: &[Parameter],
    args: &Arguments,
    policy: ExtraArguments,
) -> Result<ValidatedArgs> {
    let mut named = bind(command, variables, parameters, args)?;
    let mut validated = ValidatedArgs::default();

    for variable in variables {
        let Some(value) = named.remove(variable) else {
            continue;
        };
        match value {
            Value::Null => {}
            Value::String(s) => {
                validated.variables.insert(variable.clone(), s);
            }
            Value::Number(n) => {
                validated.variables.insert(variable.clone(), n.to_string());
            }
            other => {
                return Err(Error::validation(
                    command,
                    format!(
                        "Malformed type for \"{variable}\" variable\nExpected: string or number\nActual: {}",
                        ValueKind::of(&other)
                    ),
                ));
            }
        }
    }

    for parameter in parameters {
        let value = named
            .remove(&parameter.name)
            .filter(|v| !v.is_null() || parameter.type_descriptor.admits_null());

        let Some(value) = value else {
            if parameter.required {
                return Err(Error::validation(
                    command,
                    format!(
                        "Missing required parameter \"{}\"\nUsage: {}",
                        parameter.name,
                        usage(command, variables, parameters)
                    ),
                ));
            }
            continue;
        };

        if !parameter.type_descriptor.matches(&value) {
            return Err(Error::validation(
                command,
                format!(
                    "Malformed type for \"{}\" parameter\nExpected: {}\nActual: {}",
                    parameter.name,
                    parameter.type_descriptor,
                    ValueKind::of(&value)
                ),
            ));
        }

        validated.body.insert(parameter.name.clone(), value);
    }

    if !named.is_empty() {
        match policy {
            ExtraArguments::PassThrough => validated.body.extend(named),
            ExtraArguments::Reject => {
                let extras: Vec<&str> = named.keys().map(String::as_str).collect();
                return Err(Error::validation(
                    command,
                    format!("Unexpected arguments: {}", extras.join(", ")),
                ));
            }
        }
    }

    Ok(validated)
}

/// Renders `command(var, param, [optional])`.
#[must_use]
pub fn usage(command: &str, variables: &[String], parameters: &[Parameter]) -> String {
    let names: Vec<String> = caller_variables(variables)
        .map(str::to_string)
        .chain(parameters.iter().map(|p| {
            if p.required {
                p.name.clone()
            } else {
                format!("[{}]", p.name)
            }
        }))
        .collect();
    format!("{command}({})", names.join(", "))
}

// ============================================================================
// Helpers
// ============================================================================

/// Path variables the caller is expected to supply.
fn caller_variables(variables: &[String]) -> impl Iterator<Item = &str> {
    variables
        .iter()
        .map(String::as_str)
        .filter(|v| *v != SESSION_VARIABLE)
}

/// Turns any argument form into a name → value map.
fn bind(
    command: &str,
    variables: &[String],
    parameters: &[Parameter],
    args: &Arguments,
) -> Result<Map<String, Value>> {
    match args {
        Arguments::None => Ok(Map::new()),
        Arguments::Named(map) => Ok(map.clone()),
        Arguments::Positional(values) => {
            let names: Vec<&str> = caller_variables(variables)
                .chain(parameters.iter().map(|p| p.name.as_str()))
                .collect();

            if values.len() > names.len() {
                return Err(Error::validation(
                    command,
                    format!(
                        "Wrong parameters applied for {command}: expected at most {}, got {}\nUsage: {}",
                        names.len(),
                        values.len(),
                        usage(command, variables, parameters)
                    ),
                ));
            }

            Ok(names
                .into_iter()
                .zip(values.iter().cloned())
                .map(|(name, value)| (name.to_string(), value))
                .collect())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Method, PathTemplate, TypeDescriptor};
    use serde_json::json;

    fn find_child() -> CommandDefinition {
        CommandDefinition {
            name: "findElementFromElement".into(),
            method: Method::Post,
            path: PathTemplate::parse("/session/:sessionId/element/:elementId/element")
                .expect("template"),
            parameters: vec![
                Parameter::new("using", TypeDescriptor::of(ValueKind::String), true),
                Parameter::new("value", TypeDescriptor::of(ValueKind::String), true),
                Parameter::new(
                    "timeout",
                    TypeDescriptor::parse("(number|null)").expect("type"),
                    false,
                ),
                Parameter::new("hint", TypeDescriptor::of(ValueKind::String), false),
            ],
            returns: None,
            description: String::new(),
            reference: None,
            deprecated: None,
        }
    }

    #[test]
    fn test_named_arguments_split() {
        let args = Arguments::from(json!({
            "elementId": "e-1",
            "using": "css selector",
            "value": "#main"
        }));
        let validated = validate(&find_child(), &args, ExtraArguments::PassThrough)
            .expect("valid");

        assert_eq!(validated.variables.get("elementId").map(String::as_str), Some("e-1"));
        assert_eq!(
            Value::Object(validated.body),
            json!({ "using": "css selector", "value": "#main" })
        );
    }

    #[test]
    fn test_positional_binds_variables_then_parameters() {
        let args = Arguments::from(json!(["e-1", "xpath", "//a"]));
        let validated = validate(&find_child(), &args, ExtraArguments::PassThrough)
            .expect("valid");

        assert_eq!(validated.variables.get("elementId").map(String::as_str), Some("e-1"));
        assert_eq!(validated.body.get("using"), Some(&json!("xpath")));
        assert_eq!(validated.body.get("value"), Some(&json!("//a")));
    }

    #[test]
    fn test_missing_required_parameter() {
        let args = Arguments::from(json!({ "using": "css selector" }));
        let err = validate(&find_child(), &args, ExtraArguments::PassThrough).unwrap_err();

        assert!(err.is_validation_error());
        let message = err.to_string();
        assert!(message.contains("\"value\""), "{message}");
        assert!(
            message.contains("findElementFromElement(elementId, using, value, [timeout], [hint])"),
            "{message}"
        );
    }

    #[test]
    fn test_null_for_required_parameter_is_missing() {
        let args = Arguments::from(json!({ "using": null, "value": "#main" }));
        let err = validate(&find_child(), &args, ExtraArguments::PassThrough).unwrap_err();
        assert!(err.to_string().contains("Missing required parameter \"using\""));
    }

    #[test]
    fn test_null_handling_for_optional_parameters() {
        let args = Arguments::from(json!({
            "using": "css selector",
            "value": "#main",
            "timeout": null,
            "hint": null
        }));
        let validated = validate(&find_child(), &args, ExtraArguments::PassThrough)
            .expect("valid");

        assert_eq!(validated.body.get("timeout"), Some(&Value::Null));
        assert!(!validated.body.contains_key("hint"));
    }

    #[test]
    fn test_type_mismatch_names_expected_and_actual() {
        let args = Arguments::from(json!({ "using": "css selector", "value": 5 }));
        let err = validate(&find_child(), &args, ExtraArguments::PassThrough).unwrap_err();

        let message = err.to_string();
        assert!(message.contains("Malformed type for \"value\""), "{message}");
        assert!(message.contains("Expected: string"), "{message}");
        assert!(message.contains("Actual: number"), "{message}");
    }

    #[test]
    fn test_union_type_accepts_each_member() {
        let args = Arguments::from(json!({ "using": "a", "value": "b", "timeout": 10 }));
        assert!(validate(&find_child(), &args, ExtraArguments::PassThrough).is_ok());

        let args = Arguments::from(json!({ "using": "a", "value": "b", "timeout": "10" }));
        assert!(validate(&find_child(), &args, ExtraArguments::PassThrough).is_err());
    }

    #[test]
    fn test_extras_pass_through_by_default() {
        let args = Arguments::from(json!({ "using": "a", "value": "b", "vendor:flag": true }));
        let validated = validate(&find_child(), &args, ExtraArguments::default())
            .expect("valid");
        assert_eq!(validated.body.get("vendor:flag"), Some(&json!(true)));
    }

    #[test]
    fn test_extras_rejected_by_policy() {
        let args = Arguments::from(json!({ "using": "a", "value": "b", "vendor:flag": true }));
        let err = validate(&find_child(), &args, ExtraArguments::Reject).unwrap_err();
        assert!(err.to_string().contains("vendor:flag"));
    }

    #[test]
    fn test_too_many_positional_values() {
        let args = Arguments::from(json!(["e-1", "a", "b", 1, "h", "extra"]));
        let err = validate(&find_child(), &args, ExtraArguments::PassThrough).unwrap_err();

        assert!(err.is_validation_error());
        assert!(err.to_string().contains("Wrong parameters applied"));
    }

    #[test]
    fn test_variable_values() {
        let args = Arguments::from(json!({ "elementId": 42, "using": "a", "value": "b" }));
        let validated = validate(&find_child(), &args, ExtraArguments::PassThrough)
            .expect("valid");
        assert_eq!(validated.variables.get("elementId").map(String::as_str), Some("42"));

        let args = Arguments::from(json!({ "elementId": { "id": 1 }, "using": "a", "value": "b" }));
        let err = validate(&find_child(), &args, ExtraArguments::PassThrough).unwrap_err();
        assert!(err.to_string().contains("\"elementId\" variable"));
    }

    #[test]
    fn test_session_variable_may_be_overridden() {
        let args = Arguments::from(json!({
            "sessionId": "other",
            "elementId": "e",
            "using": "a",
            "value": "b"
        }));
        let validated = validate(&find_child(), &args, ExtraArguments::Reject).expect("valid");
        assert_eq!(validated.variables.get("sessionId").map(String::as_str), Some("other"));
    }
}
