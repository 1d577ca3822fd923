//! User variables: loading them from inline YAML or a file, and binding
//! them against the variables declared by a template manifest.

use crate::error::{Error, Result};
use crate::manifest::TemplateSchema;
use crate::types::{same_structural_type, type_name};
use indexmap::IndexMap;
use log::debug;
use serde_json::Value;
use std::path::Path;

/// Variables as supplied by the user, in input order.
pub type UserVariables = IndexMap<String, Value>;

/// User variables reconciled with a template schema.
///
/// Every declared variable is present, either with a type-checked value,
/// its default, or an unchecked value when the declaration opted out of
/// validation. Undeclared user variables are carried along untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundVariables(UserVariables);

impl BoundVariables {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// The variables as the data context handed to the template engine.
    pub fn to_context(&self) -> Value {
        Value::Object(self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

/// Binds user variables to the variables declared in `schema`.
///
/// # Errors
/// * `Error::MissingVariableError` if a variable without default is absent
/// * `Error::VariableTypeError` if a value does not match its example's type
pub fn bind_variables(schema: &TemplateSchema, mut user_vars: UserVariables) -> Result<BoundVariables> {
    for variable in &schema.variables {
        if !user_vars.contains_key(&variable.name) {
            match &variable.default {
                None => {
                    return Err(Error::MissingVariableError { name: variable.name.clone() });
                }
                Some(default) => {
                    debug!("Using default value for variable '{}'", variable.name);
                    user_vars.insert(variable.name.clone(), default.clone());
                }
            }
        }

        if !variable.validate {
            debug!("Skipping type check of variable '{}'", variable.name);
            continue;
        }

        // A decimal example also accepts an integer value.
        let value = &user_vars[&variable.name];
        if !same_structural_type(&variable.example, value) {
            return Err(Error::VariableTypeError {
                name: variable.name.clone(),
                actual: type_name(value),
                required: type_name(&variable.example),
            });
        }
    }
    Ok(BoundVariables(user_vars))
}

/// Parses inline YAML holding user variables. An empty document means no variables.
pub fn parse_user_variables(raw: &str) -> Result<UserVariables> {
    let value: Value = serde_yaml::from_str(raw).map_err(|e| {
        Error::VariablesSourceError(format!("failed to parse variables YAML: {e}"))
    })?;
    match value {
        Value::Null => Ok(UserVariables::new()),
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(Error::VariablesSourceError(format!(
            "variables must be a mapping of names to values, found '{}'",
            type_name(&other)
        ))),
    }
}

/// Reads user variables from a `.yaml` or `.yml` file.
pub fn read_user_variables_file<P: AsRef<Path>>(path: P) -> Result<UserVariables> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => {}
        _ => {
            return Err(Error::VariablesSourceError(format!(
                "unsupported variables file '{}', expected a '.yaml' or '.yml' file",
                path.display()
            )))
        }
    }
    let content = std::fs::read_to_string(path)?;
    parse_user_variables(&content)
}

/// Loads user variables from either inline YAML or a file path.
///
/// Inline YAML is tried first. Anything that is not a YAML mapping is
/// treated as a path; a path that does not exist means no variables.
pub fn load_user_variables(source: &str) -> Result<UserVariables> {
    if let Ok(Value::Object(map)) = serde_yaml::from_str::<Value>(source) {
        debug!("Reading variables from inline YAML");
        return Ok(map.into_iter().collect());
    }

    let path = Path::new(source);
    if source.trim().is_empty() || !path.is_file() {
        debug!("No variables found at '{source}'");
        return Ok(UserVariables::new());
    }
    debug!("Reading variables from '{}'", path.display());
    read_user_variables_file(path)
}
