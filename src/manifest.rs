//! Template manifest parsing and validation.
//! Turns the raw `.cloney.yaml` text of a template repository into a
//! validated [`TemplateSchema`]. The manifest is a closed schema: unknown
//! fields are errors, and every problem is collected before failing.

use crate::error::{Error, Result, ValidationError, ValidationErrors};
use crate::types::{render_value, same_structural_type, type_name};
use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Earliest manifest version that accepts `configuration.post_clone_commands`.
pub const POST_CLONE_COMMANDS_MIN_VERSION: &str = "v2";

static SEMVER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-((?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
    )
    .expect("semver pattern is valid")
});

/// Manifest as written, with everything unknown captured for reporting.
#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    template_version: Value,
    #[serde(default)]
    manifest_version: Value,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    license: Option<String>,
    #[serde(default)]
    configuration: RawConfiguration,
    #[serde(default)]
    variables: Vec<RawVariable>,
    #[serde(flatten)]
    unknown_fields: IndexMap<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfiguration {
    #[serde(default)]
    ignore_paths: Vec<String>,
    #[serde(default)]
    post_clone_commands: Vec<Vec<String>>,
    #[serde(flatten)]
    unknown_fields: IndexMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawVariable {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    default: Option<Value>,
    #[serde(default)]
    example: Option<Value>,
    #[serde(default)]
    validate: Option<bool>,
    #[serde(flatten)]
    unknown_fields: IndexMap<String, Value>,
}

/// Validated metadata of a template repository.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSchema {
    pub name: String,
    pub description: String,
    pub template_version: String,
    pub manifest_version: String,
    pub authors: Vec<String>,
    pub license: String,
    pub configuration: Configuration,
    pub variables: Vec<VariableDeclaration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    /// Glob patterns, relative to the template root, excluded from the output.
    pub ignore_paths: Vec<String>,
    /// Commands run inside the clone once it has been filled; `argv` lists.
    pub post_clone_commands: Vec<Vec<String>>,
}

/// One declared template variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub name: String,
    pub description: String,
    pub default: Option<Value>,
    /// Fixes the structural type of the variable.
    pub example: Value,
    /// When false, user input for this variable is not type checked.
    pub validate: bool,
}

impl VariableDeclaration {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Parses and validates manifest text.
///
/// # Errors
/// * `Error::ManifestSyntaxError` if the text is not a YAML manifest
/// * `Error::SchemaValidationError` with every violation found otherwise
pub fn parse_manifest(raw: &str, supported_versions: &[String]) -> Result<TemplateSchema> {
    let manifest: RawManifest = serde_yaml::from_str(raw).map_err(Error::ManifestSyntaxError)?;
    let mut errors = ValidationErrors::default();

    if !manifest.unknown_fields.is_empty() {
        errors.push(ValidationError::UnknownRootFields(keys(&manifest.unknown_fields)));
    }

    let name = manifest.name.unwrap_or_default();
    if name.trim().is_empty() {
        errors.push(ValidationError::MissingRootField("name"));
    }

    let template_version = scalar_string(&manifest.template_version);
    match &template_version {
        None => errors.push(ValidationError::MissingRootField("template_version")),
        Some(version) if !SEMVER.is_match(version) => {
            errors.push(ValidationError::InvalidSemver {
                field: "template_version",
                value: version.clone(),
            })
        }
        Some(_) => {}
    }

    let manifest_version = scalar_string(&manifest.manifest_version);
    match &manifest_version {
        None => errors.push(ValidationError::MissingRootField("manifest_version")),
        Some(version) if !supported_versions.contains(version) => {
            errors.push(ValidationError::UnsupportedManifestVersion {
                version: version.clone(),
                supported: supported_versions.to_vec(),
            })
        }
        Some(version) => {
            let configuration = &manifest.configuration;
            if !configuration.post_clone_commands.is_empty()
                && predates(version, POST_CLONE_COMMANDS_MIN_VERSION)
            {
                errors.push(ValidationError::UnsupportedFeature {
                    version: version.clone(),
                    field: "configuration.post_clone_commands",
                    minimum: POST_CLONE_COMMANDS_MIN_VERSION,
                });
            }
        }
    }

    if !manifest.configuration.unknown_fields.is_empty() {
        errors.push(ValidationError::UnknownConfigurationFields(keys(
            &manifest.configuration.unknown_fields,
        )));
    }

    let mut seen = HashSet::new();
    let mut variables = Vec::with_capacity(manifest.variables.len());
    for raw in manifest.variables {
        if let Some(variable) = validate_variable(raw, &mut seen, &mut errors) {
            variables.push(variable);
        }
    }

    if !errors.is_empty() {
        debug!("Manifest rejected with {} error(s)", errors.len());
        return Err(Error::SchemaValidationError(errors));
    }

    Ok(TemplateSchema {
        name,
        description: manifest.description.unwrap_or_default(),
        template_version: template_version.unwrap_or_default(),
        manifest_version: manifest_version.unwrap_or_default(),
        authors: manifest.authors,
        license: manifest.license.unwrap_or_default(),
        configuration: Configuration {
            ignore_paths: manifest.configuration.ignore_paths,
            post_clone_commands: manifest.configuration.post_clone_commands,
        },
        variables,
    })
}

fn validate_variable(
    raw: RawVariable,
    seen: &mut HashSet<String>,
    errors: &mut ValidationErrors,
) -> Option<VariableDeclaration> {
    let name = raw.name.unwrap_or_default();
    if name.is_empty() {
        errors.push(ValidationError::MissingVariableField { variable: name.clone(), field: "name" });
    } else if !seen.insert(name.clone()) {
        errors.push(ValidationError::DuplicateVariable(name.clone()));
    }

    if raw.example.is_none() {
        errors.push(ValidationError::MissingVariableField {
            variable: name.clone(),
            field: "example",
        });
    }

    if let (Some(example), Some(default)) = (&raw.example, &raw.default) {
        if !same_structural_type(example, default) {
            errors.push(ValidationError::DefaultTypeMismatch {
                variable: name.clone(),
                default_type: type_name(default),
                example_type: type_name(example),
            });
        }
    }

    if !raw.unknown_fields.is_empty() {
        errors.push(ValidationError::UnknownVariableFields {
            variable: name.clone(),
            fields: keys(&raw.unknown_fields),
        });
    }

    Some(VariableDeclaration {
        name,
        description: raw.description.unwrap_or_default(),
        default: raw.default,
        example: raw.example?,
        validate: raw.validate.unwrap_or(true),
    })
}

fn keys(fields: &IndexMap<String, Value>) -> Vec<String> {
    fields.keys().cloned().collect()
}

/// Scalar manifest values are accepted whether YAML typed them as text or not.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Whether manifest `version` is older than `minimum` (`vN` ordering).
fn predates(version: &str, minimum: &str) -> bool {
    match (version_number(version), version_number(minimum)) {
        (Some(version), Some(minimum)) => version < minimum,
        _ => false,
    }
}

fn version_number(version: &str) -> Option<u32> {
    version.strip_prefix('v').unwrap_or(version).parse().ok()
}

impl TemplateSchema {
    /// General information block shown by `cloney info`.
    pub fn general_info(&self) -> String {
        let mut result = String::from("General Information\n\n");
        result += &format!("Template Name: {}\n", self.name);
        result += &format!("Template Description: {}\n", self.description);
        result += &format!("Template Version: {}\n", self.template_version);
        result += &format!("Template License: {}\n", self.license);
        result += &format!("Template Author(s): {}\n", self.authors.join(", "));
        result
    }

    /// Per-variable description block shown by `cloney info`.
    pub fn variables_info(&self) -> String {
        let blocks: Vec<String> = self
            .variables
            .iter()
            .map(|variable| {
                let requirement = if variable.is_required() { "Required" } else { "Optional" };
                let mut block = format!("Variable {} ({requirement})\n\n", variable.name);
                block += &format!("Variable Description: {}\n", variable.description);
                block += &labelled("Variable Type", &type_name(&variable.example));
                if let Some(default) = &variable.default {
                    block += &labelled("Default Value", &render_value(default));
                }
                block += &labelled("Example Value", &render_value(&variable.example));
                block
            })
            .collect();
        blocks.join("\n")
    }
}

fn labelled(label: &str, value: &str) -> String {
    if value.contains('\n') {
        format!("{label}:\n{}\n", value.trim_end())
    } else {
        format!("{label}: {value}\n")
    }
}

impl std::fmt::Display for TemplateSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n{}", self.general_info(), self.variables_info())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions() -> Vec<String> {
        vec!["v1".to_string(), "v2".to_string()]
    }

    #[test]
    fn test_semver_pattern() {
        assert!(SEMVER.is_match("0.0.0"));
        assert!(SEMVER.is_match("1.2.3-beta.1+build.5"));
        assert!(!SEMVER.is_match("1.2"));
        assert!(!SEMVER.is_match("01.2.3"));
        assert!(!SEMVER.is_match("v1.2.3"));
    }

    #[test]
    fn test_predates() {
        assert!(predates("v1", "v2"));
        assert!(!predates("v2", "v2"));
        assert!(!predates("v3", "v2"));
        assert!(!predates("latest", "v2"));
    }

    #[test]
    fn test_numeric_template_version_is_read_as_text() {
        let raw = "name: t\ntemplate_version: 1.0\nmanifest_version: v1\n";
        let errors = match parse_manifest(raw, &versions()) {
            Err(Error::SchemaValidationError(errors)) => errors,
            other => panic!("Expected validation errors, got {other:?}"),
        };
        assert_eq!(
            errors.0,
            vec![ValidationError::InvalidSemver { field: "template_version", value: "1.0".into() }]
        );
    }

    #[test]
    fn test_variables_info_marks_required_variables() {
        let raw = r#"
name: t
template_version: "1.0.0"
manifest_version: v1
variables:
  - name: app_name
    description: Application name.
    example: my-app
  - name: ports
    default: [80]
    example: [8080, 8443]
"#;
        let schema = parse_manifest(raw, &versions()).unwrap();
        let info = schema.variables_info();
        assert!(info.contains("Variable app_name (Required)"));
        assert!(info.contains("Variable ports (Optional)"));
        assert!(info.contains("Variable Type:\nlist [\n  integer\n]"));
        assert!(info.contains("Default Value:\n- 80\n"));
    }
}
