//! Core pipelines behind the CLI commands.
//! Each pipeline reads the manifest, binds user variables and drives the
//! filler, pruner, loader and hooks. Nothing here prints; outcomes are
//! returned to the caller and progress goes to the log.

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::filler::{fill_directory, FillMode};
use crate::hooks::run_post_clone_commands;
use crate::ignore::{to_slash, IgnoreSet};
use crate::loader::{GitRepository, TemplateSource};
use crate::manifest::{parse_manifest, TemplateSchema};
use crate::prune::prune_ignored;
use crate::variables::{bind_variables, load_user_variables, UserVariables};
use log::{debug, info, warn};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Reads and parses the manifest of the template in `directory`.
///
/// # Errors
/// * `Error::MetadataNotFoundError` if the directory has no manifest
/// * `Error::ManifestSyntaxError` / `Error::SchemaValidationError` for invalid manifests
pub fn read_metadata<P: AsRef<Path>>(directory: P, config: &AppConfig) -> Result<TemplateSchema> {
    let directory = directory.as_ref();
    let raw = read_metadata_text(directory, config)?;
    parse_manifest(&raw, &config.supported_manifest_versions)
}

fn read_metadata_text(directory: &Path, config: &AppConfig) -> Result<String> {
    let path = directory.join(&config.metadata_file_name);
    debug!("Reading manifest '{}'", path.display());
    fs::read_to_string(&path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::MetadataNotFoundError {
            file_name: config.metadata_file_name.clone(),
            directory: directory.display().to_string(),
        },
        _ => Error::IoError(e),
    })
}

/// Ignore patterns for a fill: `extra`, then the known infrastructure
/// paths, then the manifest's own `ignore_paths`.
pub fn ignore_patterns(config: &AppConfig, schema: &TemplateSchema, extra: &[String]) -> Vec<String> {
    let mut patterns = extra.to_vec();
    patterns.extend(config.known_ignore_paths.iter().cloned());
    patterns.extend(schema.configuration.ignore_paths.iter().cloned());
    patterns
}

/// Validates the manifest of a local template.
pub fn validate<P: AsRef<Path>>(directory: P, config: &AppConfig) -> Result<TemplateSchema> {
    read_metadata(directory, config)
}

/// Reads the manifest of a local template, or of a git repository through
/// a temporary clone.
pub fn info(repository: &GitRepository, config: &AppConfig) -> Result<TemplateSchema> {
    match TemplateSource::from_string(&repository.url) {
        TemplateSource::FileSystem(path) => read_metadata(path, config),
        TemplateSource::Git(url) => {
            info!("Reading template information from git repository '{url}'");
            let repository = with_config_token(repository, config);
            let raw = repository.read_file(&config.metadata_file_name).map_err(|e| match e {
                Error::IoError(io) if io.kind() == io::ErrorKind::NotFound => {
                    Error::MetadataNotFoundError {
                        file_name: config.metadata_file_name.clone(),
                        directory: url.clone(),
                    }
                }
                other => other,
            })?;
            parse_manifest(&raw, &config.supported_manifest_versions)
        }
    }
}

fn with_config_token(repository: &GitRepository, config: &AppConfig) -> GitRepository {
    let token = repository.token.clone().or_else(|| config.git_token.clone());
    repository.clone().with_token(token)
}

/// Options of a dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRunOptions {
    /// Template directory.
    pub source: PathBuf,
    /// Directory receiving the filled files; unused in terminal mode.
    pub output: PathBuf,
    pub in_terminal: bool,
    /// Inline YAML or path to a variables file.
    pub variables: String,
}

impl DryRunOptions {
    pub fn new<P: Into<PathBuf>>(source: P, config: &AppConfig) -> Self {
        Self {
            source: source.into(),
            output: PathBuf::from(&config.default_dry_run_directory_name),
            in_terminal: false,
            variables: config.default_user_variables_file_name.clone(),
        }
    }

    /// Paths under the source that must never be filled or watched: the
    /// output directory and the variables file.
    fn own_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        if !self.in_terminal {
            paths.extend(relative_to(&self.source, &self.output));
        }
        if let Some(file) = variables_file(&self.variables) {
            paths.extend(relative_to(&self.source, &file));
        }
        paths
    }
}

/// Fills the template into the output directory, or prints it to `terminal`.
///
/// # Errors
/// Any manifest, variable, rendering or I/O error. A partially written
/// output directory is removed before the error is returned.
pub fn dry_run(options: &DryRunOptions, config: &AppConfig, terminal: &mut dyn Write) -> Result<()> {
    let user_vars = load_user_variables(&options.variables)?;
    let schema = read_metadata(&options.source, config)?;
    let variables = bind_variables(&schema, user_vars)?;
    let patterns = ignore_patterns(config, &schema, &options.own_paths());

    if options.in_terminal {
        debug!("Printing filled template '{}'", options.source.display());
        return fill_directory(&options.source, &patterns, &variables, FillMode::Terminal(terminal));
    }

    remove_directory(&options.output)?;
    info!("Filling '{}' into '{}'", options.source.display(), options.output.display());
    let result = fill_directory(
        &options.source,
        &patterns,
        &variables,
        FillMode::Mirror(options.output.clone()),
    )
    .and_then(|_| prune_ignored(&options.output, &patterns, &config.ignore_prefix));

    if let Err(e) = result {
        warn!("Dry run failed, removing '{}'", options.output.display());
        let _ = remove_directory(&options.output);
        return Err(e);
    }
    Ok(())
}

/// Ignore set for watching a dry run: like the fill, except that the
/// manifest and the variables file do trigger a rerun.
pub fn dry_run_watch_set(options: &DryRunOptions, config: &AppConfig) -> Result<IgnoreSet> {
    let mut patterns = relative_to(&options.source, &options.output).into_iter().collect::<Vec<_>>();
    patterns.extend(
        config
            .known_ignore_paths
            .iter()
            .filter(|p| **p != config.metadata_file_name && **p != config.default_user_variables_file_name)
            .cloned(),
    );
    if let Ok(schema) = read_metadata(&options.source, config) {
        patterns.extend(schema.configuration.ignore_paths);
    }
    IgnoreSet::new(options.source.canonicalize()?, &patterns)
}

/// Options of a clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneOptions {
    pub repository: GitRepository,
    /// Clone destination; defaults to the repository name in the current directory.
    pub output: Option<PathBuf>,
    /// Inline YAML or path to a variables file.
    pub variables: String,
}

impl CloneOptions {
    pub fn destination(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| PathBuf::from(self.repository.name()))
    }
}

/// Clones a template repository, fills it in place and runs its
/// post-clone commands. Returns the clone directory.
///
/// # Errors
/// * `Error::OutputDirectoryExistsError` if the destination exists
/// * any loader, manifest, variable or rendering error; the clone is removed
/// * `Error::HookError` if a post-clone command fails; the clone is kept
pub fn clone(options: &CloneOptions, config: &AppConfig) -> Result<PathBuf> {
    let user_vars = load_user_variables(&options.variables)?;
    let destination = options.destination();
    if destination.exists() {
        return Err(Error::OutputDirectoryExistsError {
            output_dir: destination.display().to_string(),
        });
    }

    with_config_token(&options.repository, config).clone_into(&destination)?;

    let schema = match fill_clone(&destination, user_vars, options, config) {
        Ok(schema) => schema,
        Err(e) => {
            warn!("Clone failed, removing '{}'", destination.display());
            let _ = remove_directory(&destination);
            return Err(e);
        }
    };

    run_post_clone_commands(&destination, &schema.configuration.post_clone_commands)?;
    Ok(destination)
}

fn fill_clone(
    destination: &Path,
    user_vars: UserVariables,
    options: &CloneOptions,
    config: &AppConfig,
) -> Result<TemplateSchema> {
    let raw = read_metadata_text(destination, config)?;
    fs::remove_file(destination.join(&config.metadata_file_name))?;
    let schema = parse_manifest(&raw, &config.supported_manifest_versions)?;
    let variables = bind_variables(&schema, user_vars)?;

    let extra: Vec<String> = variables_file(&options.variables)
        .and_then(|file| file.file_name().map(|name| name.to_string_lossy().into_owned()))
        .into_iter()
        .collect();
    let patterns = ignore_patterns(config, &schema, &extra);
    fill_directory(destination, &patterns, &variables, FillMode::InPlace)?;
    prune_ignored(destination, &[] as &[&str], &config.ignore_prefix)?;
    Ok(schema)
}

/// Options of `start`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartOptions {
    /// Directory to create; defaults to the template name in the current directory.
    pub output: Option<PathBuf>,
    pub name: String,
    pub description: String,
    pub license: String,
    pub authors: Vec<String>,
}

impl StartOptions {
    /// Replaces empty values with the configured defaults.
    pub fn with_defaults(mut self, config: &AppConfig) -> Self {
        if self.name.trim().is_empty() {
            self.name = config.default_project_name.clone();
        }
        if self.description.trim().is_empty() {
            self.description = config.default_description.clone();
        }
        if self.license.trim().is_empty() {
            self.license = config.default_license.clone();
        }
        self.authors.retain(|author| !author.trim().is_empty());
        self
    }

    pub fn destination(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| PathBuf::from(&self.name))
    }
}

/// Creates a new template repository with a starter manifest. Returns the
/// created directory.
///
/// # Errors
/// * `Error::OutputDirectoryExistsError` if the directory already exists
pub fn start(options: &StartOptions, config: &AppConfig) -> Result<PathBuf> {
    let options = options.clone().with_defaults(config);
    let destination = options.destination();
    if destination.exists() {
        return Err(Error::OutputDirectoryExistsError {
            output_dir: destination.display().to_string(),
        });
    }

    fs::create_dir_all(&destination)?;
    let manifest = starter_manifest(&options, config);
    fs::write(destination.join(&config.metadata_file_name), manifest)?;
    info!("Created template repository '{}'", destination.display());
    Ok(destination)
}

/// Commented manifest written by `start`.
pub fn starter_manifest(options: &StartOptions, config: &AppConfig) -> String {
    let mut manifest = String::from("# The name of this template repository.\n");
    manifest += &format!("name: {}\n\n", yaml_scalar(&options.name));
    manifest += "# The description of this template repository.\n";
    manifest += &format!("description: {}\n\n", yaml_scalar(&options.description));
    manifest += "# The version of this template. Change it as you make changes to your template.\n";
    manifest += &format!("template_version: \"{}\"\n\n", config.default_template_version);
    manifest += "# The version of this manifest. Do not change it unless you know what you are doing.\n";
    manifest += &format!("manifest_version: {}\n\n", config.metadata_manifest_version);
    manifest += "# The license of this template repository.\n";
    manifest += &format!("license: {}\n", yaml_scalar(&options.license));
    if !options.authors.is_empty() {
        manifest += "\n# The authors of this template repository.\n";
        manifest += "authors:\n";
        for author in &options.authors {
            manifest += &format!("  - {}\n", yaml_scalar(author));
        }
    }
    manifest += "\n# Example variables. Delete this section and add your own variables.\n";
    manifest += "variables:\n";
    manifest += "  - name: app_name\n";
    manifest += "    description: The name of the application.\n";
    manifest += "    default: my-app\n";
    manifest += "    example: my-app # The example fixes the type of the variable.\n\n";
    manifest += "  - name: enable_https\n";
    manifest += "    description: Whether to enable HTTPS or not.\n";
    manifest += "    default: true # Remove the default to make the variable required.\n";
    manifest += "    example: true\n";
    manifest
}

/// Quotes values YAML would otherwise read as something other than text.
fn yaml_scalar(value: &str) -> String {
    match serde_yaml::from_str::<serde_json::Value>(value) {
        Ok(serde_json::Value::String(parsed)) if parsed == value => value.to_string(),
        _ => serde_json::Value::String(value.to_string()).to_string(),
    }
}

/// The variables source as a file path, unless it is inline YAML.
fn variables_file(source: &str) -> Option<PathBuf> {
    if source.trim().is_empty() {
        return None;
    }
    match serde_yaml::from_str::<serde_json::Value>(source) {
        Ok(serde_json::Value::Object(_)) => None,
        _ => Some(PathBuf::from(source)),
    }
}

/// `path` as a pattern relative to `base`, when it lies inside it.
fn relative_to(base: &Path, path: &Path) -> Option<String> {
    let base = std::path::absolute(base).ok()?;
    let path = std::path::absolute(path).ok()?;
    let relative = to_slash(path.strip_prefix(&base).ok()?);
    (!relative.is_empty()).then_some(relative)
}

fn remove_directory(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(Error::IoError(e)),
        _ => Ok(()),
    }
}
