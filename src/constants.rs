//! Common constants used throughout Cloney.

/// Name of the metadata file at the root of a template repository.
pub const METADATA_FILE: &str = ".cloney.yaml";

/// Default file holding user variables.
pub const USER_VARIABLES_FILE: &str = ".cloney-vars.yaml";

pub const DRY_RUN_DIRECTORY: &str = "cloney-dry-run-results";

pub const DEFAULT_PROJECT_NAME: &str = "cloney-template";

/// Manifest versions understood by this build, oldest first.
pub const SUPPORTED_MANIFEST_VERSIONS: [&str; 2] = ["v1", "v2"];

/// Paths never copied or filled, relative to the template root.
pub const KNOWN_IGNORE_PATHS: [&str; 5] =
    [METADATA_FILE, USER_VARIABLES_FILE, ".git", "node_modules", ".venv"];

/// Files and directories starting with this prefix are rendered but never shipped.
pub const IGNORE_PREFIX: &str = "__";

/// Environment variable holding a token for private git repositories.
pub const GIT_TOKEN_ENV: &str = "CLONEY_GIT_TOKEN";

pub const DEFAULT_DESCRIPTION: &str = "A Cloney template repository";
pub const DEFAULT_LICENSE: &str = "MIT";
pub const DEFAULT_TEMPLATE_VERSION: &str = "0.0.0";
