//! Cloney clones template repositories and fills them with typed user
//! variables. A template declares its variables in a `.cloney.yaml`
//! manifest; every file of the template is rendered with MiniJinja.

/// Command-line interface module for the Cloney application
pub mod cli;

/// Explicit application configuration
pub mod config;

pub mod constants;

/// Error types and handling for the Cloney application
pub mod error;

/// Directory template filling: in place, mirrored, or to a writer
pub mod filler;

/// Post-clone command execution
pub mod hooks;

/// Ignore-pattern matching and tree enumeration
pub mod ignore;

/// Git repository loading
pub mod loader;

pub mod logger;

/// Template manifest parsing and validation
pub mod manifest;

/// Core pipelines behind each command
pub mod processor;

/// User input and interaction handling
pub mod prompt;

/// Removal of ignored and internal-only paths after filling
pub mod prune;

/// Template rendering and the template function library
pub mod renderer;

/// Variable type classification and structural comparison
pub mod types;

/// User variables and their binding to a manifest
pub mod variables;

/// Hot reload for dry runs
pub mod watch;
