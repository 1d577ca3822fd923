//! Application configuration.
//! `AppConfig` is built once at startup and handed to every pipeline step
//! by reference; nothing in the library reads global configuration.

use crate::constants::{
    DEFAULT_DESCRIPTION, DEFAULT_LICENSE, DEFAULT_PROJECT_NAME, DEFAULT_TEMPLATE_VERSION,
    DRY_RUN_DIRECTORY, GIT_TOKEN_ENV, IGNORE_PREFIX, KNOWN_IGNORE_PATHS, METADATA_FILE,
    SUPPORTED_MANIFEST_VERSIONS, USER_VARIABLES_FILE,
};
use log::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Name of the metadata file inside a template repository.
    pub metadata_file_name: String,
    /// Manifest version written by `cloney start`; always the latest supported one.
    pub metadata_manifest_version: String,
    /// Manifest versions accepted by the parser, oldest first.
    pub supported_manifest_versions: Vec<String>,
    pub default_user_variables_file_name: String,
    pub default_dry_run_directory_name: String,
    pub default_project_name: String,
    /// Paths excluded from every template, e.g. VCS metadata.
    pub known_ignore_paths: Vec<String>,
    /// Prefix of files that generate other files and are pruned afterwards.
    pub ignore_prefix: String,
    pub git_token: Option<String>,
    pub default_description: String,
    pub default_license: String,
    pub default_template_version: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let supported_manifest_versions: Vec<String> =
            SUPPORTED_MANIFEST_VERSIONS.iter().map(|v| v.to_string()).collect();
        Self {
            metadata_file_name: METADATA_FILE.to_string(),
            metadata_manifest_version: supported_manifest_versions
                .last()
                .cloned()
                .unwrap_or_default(),
            supported_manifest_versions,
            default_user_variables_file_name: USER_VARIABLES_FILE.to_string(),
            default_dry_run_directory_name: DRY_RUN_DIRECTORY.to_string(),
            default_project_name: DEFAULT_PROJECT_NAME.to_string(),
            known_ignore_paths: KNOWN_IGNORE_PATHS.iter().map(|p| p.to_string()).collect(),
            ignore_prefix: IGNORE_PREFIX.to_string(),
            git_token: None,
            default_description: DEFAULT_DESCRIPTION.to_string(),
            default_license: DEFAULT_LICENSE.to_string(),
            default_template_version: DEFAULT_TEMPLATE_VERSION.to_string(),
        }
    }
}

impl AppConfig {
    /// Builds the configuration from defaults and the process environment.
    pub fn from_env() -> Self {
        let git_token = std::env::var(GIT_TOKEN_ENV).ok().filter(|t| !t.is_empty());
        if git_token.is_some() {
            debug!("Using git token from {GIT_TOKEN_ENV}");
        }
        Self { git_token, ..Self::default() }
    }
}
