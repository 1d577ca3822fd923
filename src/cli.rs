//! Command-line interface implementation for Cloney.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, Args as ClapArgs, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use crate::constants::{DRY_RUN_DIRECTORY, USER_VARIABLES_FILE};

/// Command-line arguments structure for Cloney.
#[derive(Parser, Debug)]
#[command(
    name = "cloney",
    author,
    version,
    about = "Cloney: clone template repositories and fill them with your variables",
    long_about = None
)]
pub struct Args {
    /// Enable verbose logging output
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Clone a template repository and fill it with your variables
    #[command(alias = "cl")]
    Clone(CloneArgs),

    /// Fill a local template to check what it generates
    #[command(name = "dry-run", aliases = ["dryrun", "fill"])]
    DryRun(DryRunArgs),

    /// Validate the manifest of a local template
    Validate(ValidateArgs),

    /// Show information about a template and its variables
    Info(InfoArgs),

    /// Create a new template repository
    Start(StartArgs),
}

#[derive(ClapArgs, Debug)]
pub struct CloneArgs {
    /// URL of the template repository
    #[arg(value_name = "REPOSITORY_URL")]
    pub repository_url: String,

    /// Path to clone the repository to
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Git branch
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Git tag
    #[arg(short, long, conflicts_with = "branch")]
    pub tag: Option<String>,

    /// Path to a variables file or inline YAML
    #[arg(short, long, default_value = USER_VARIABLES_FILE)]
    pub variables: String,

    /// Git token, for private repositories
    #[arg(short = 'k', long)]
    pub token: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct DryRunArgs {
    /// Template directory
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Directory receiving the filled files
    #[arg(short, long, default_value = DRY_RUN_DIRECTORY)]
    pub output: PathBuf,

    /// Print the filled files instead of writing them
    #[arg(short = 'i', long)]
    pub output_in_terminal: bool,

    /// Fill again every time the template changes
    #[arg(short = 'r', long)]
    pub hot_reload: bool,

    /// Path to a variables file or inline YAML
    #[arg(short, long, default_value = USER_VARIABLES_FILE)]
    pub variables: String,
}

#[derive(ClapArgs, Debug)]
pub struct ValidateArgs {
    /// Template directory
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,
}

#[derive(ClapArgs, Debug)]
pub struct InfoArgs {
    /// Template directory or repository URL
    #[arg(value_name = "PATH_OR_URL", default_value = ".")]
    pub source: String,

    /// Git branch
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Git tag
    #[arg(short, long, conflicts_with = "branch")]
    pub tag: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct StartArgs {
    /// Where to create the template repository
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Name of the template repository
    #[arg(short, long)]
    pub name: Option<String>,

    /// Description of the template repository
    #[arg(short, long)]
    pub description: Option<String>,

    /// License of the template repository
    #[arg(short, long)]
    pub license: Option<String>,

    /// Authors of the template repository
    #[arg(short, long = "author")]
    pub authors: Vec<String>,

    /// Skip the questions and use flags and defaults
    #[arg(short = 'y', long)]
    pub non_interactive: bool,
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 if a subcommand or required argument is missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::MissingRequiredArgument
            | ErrorKind::MissingSubcommand
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            }
            _ => e.exit(),
        },
    }
}
