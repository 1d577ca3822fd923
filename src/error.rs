//! Error handling for Cloney.
//! Defines the crate-wide error type, the schema validation error list
//! and the result alias used throughout the application.

use std::fmt;
use thiserror::Error;

/// A single problem found while validating a template manifest.
///
/// Validation never stops at the first problem; every `ValidationError`
/// found in a manifest is collected into [`ValidationErrors`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown field(s) at root level: {}", quoted(.0))]
    UnknownRootFields(Vec<String>),

    #[error("Unknown field(s) in the configuration block: {}", quoted(.0))]
    UnknownConfigurationFields(Vec<String>),

    #[error("Unknown field(s) for variable '{variable}': {}", quoted(.fields))]
    UnknownVariableFields { variable: String, fields: Vec<String> },

    #[error("Missing required field '{0}' at root level")]
    MissingRootField(&'static str),

    #[error("Missing required field '{field}' for variable '{variable}'")]
    MissingVariableField { variable: String, field: &'static str },

    #[error("Variable '{0}' is declared more than once")]
    DuplicateVariable(String),

    #[error("Invalid semantic version '{value}' for field {field}")]
    InvalidSemver { field: &'static str, value: String },

    #[error(
        "Manifest version '{version}' is not supported in this Cloney version, supported versions: {}",
        .supported.join(", ")
    )]
    UnsupportedManifestVersion { version: String, supported: Vec<String> },

    #[error(
        "Manifest version '{version}' does not support the '{field}' field, please update the manifest version to '{minimum}'"
    )]
    UnsupportedFeature {
        version: String,
        field: &'static str,
        minimum: &'static str,
    },

    #[error(
        "Variable '{variable}' has a default value of type '{default_type}' but its example value is of type '{example_type}'"
    )]
    DefaultTypeMismatch {
        variable: String,
        default_type: String,
        example_type: String,
    },
}

fn quoted(names: &[String]) -> String {
    names.iter().map(|name| format!("'{name}'")).collect::<Vec<_>>().join(", ")
}

/// Every validation problem found in one manifest, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "- {error}")?;
        }
        Ok(())
    }
}

/// Custom error types for Cloney operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The manifest text is not valid YAML or does not have the manifest shape.
    #[error("Invalid manifest: {0}.")]
    ManifestSyntaxError(#[source] serde_yaml::Error),

    /// The manifest parsed but violates the schema rules.
    #[error("The template manifest is invalid:\n{0}")]
    SchemaValidationError(ValidationErrors),

    #[error("Required variable '{name}' is not defined.")]
    MissingVariableError { name: String },

    #[error("Variable '{name}' is of type '{actual}' but must be of type '{required}'.")]
    VariableTypeError {
        name: String,
        actual: String,
        required: String,
    },

    /// Could not read user variables from inline YAML or a file.
    #[error("Variables error: {0}.")]
    VariablesSourceError(String),

    #[error("Template error: {0}.")]
    TemplateError(#[from] minijinja::Error),

    /// A generated file would land outside of the template root.
    #[error("Cannot create file outside the scope of the template directory: '{path}'.")]
    PathConfinementError { path: String },

    #[error("File '{path}' uses 'toFile', which is not supported when printing to the terminal.")]
    UnsupportedInTerminalError { path: String },

    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),

    #[error("Directory traversal error: {0}.")]
    WalkDirError(#[from] walkdir::Error),

    #[error("Invalid ignore pattern: {0}.")]
    GlobError(#[from] globset::Error),

    #[error("Git error: {0}.")]
    Git2Error(#[from] git2::Error),

    #[error("Watch error: {0}.")]
    WatchError(#[from] notify::Error),

    #[error("Post-clone command error: {0}.")]
    HookError(String),

    #[error("Prompt error: {0}.")]
    PromptError(#[from] dialoguer::Error),

    #[error("Could not find the '{file_name}' metadata file: directory '{directory}' is not a Cloney template repository.")]
    MetadataNotFoundError { file_name: String, directory: String },

    #[error("Directory '{output_dir}' already exists.")]
    OutputDirectoryExistsError { output_dir: String },

    #[error("Invalid template source: {0}.")]
    TemplateSourceError(String),
}

/// Convenience type alias for Results with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
