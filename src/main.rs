//! Cloney's main application entry point.
//! Parses the command line, builds the configuration and dispatches to the
//! processor; all user-facing output happens here.

use cloney::{
    cli::{get_args, Args, CloneArgs, Command, DryRunArgs, InfoArgs, StartArgs},
    config::AppConfig,
    error::{default_error_handler, Result},
    loader::GitRepository,
    logger::init_logger,
    processor::{self, CloneOptions, DryRunOptions, StartOptions},
    prompt::{ask_start_options, DialoguerPrompter},
    watch::watch_directory,
};
use log::error;

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbose);

    let config = AppConfig::from_env();
    if let Err(err) = run(args, &config) {
        default_error_handler(err);
    }
}

fn run(args: Args, config: &AppConfig) -> Result<()> {
    match args.command {
        Command::Clone(args) => run_clone(args, config),
        Command::DryRun(args) => run_dry_run(args, config),
        Command::Validate(args) => {
            processor::validate(&args.path, config)?;
            println!("The template manifest is valid!");
            Ok(())
        }
        Command::Info(args) => run_info(args, config),
        Command::Start(args) => run_start(args, config),
    }
}

fn run_clone(args: CloneArgs, config: &AppConfig) -> Result<()> {
    let options = CloneOptions {
        repository: GitRepository::new(args.repository_url)
            .with_branch(args.branch)
            .with_tag(args.tag)
            .with_token(args.token),
        output: args.output,
        variables: args.variables,
    };
    println!("Cloning template repository '{}'...", options.repository.url);
    let destination = processor::clone(&options, config)?;
    println!("\nDone! Template cloned to '{}'.", destination.display());
    Ok(())
}

fn run_dry_run(args: DryRunArgs, config: &AppConfig) -> Result<()> {
    let options = DryRunOptions {
        source: args.path,
        output: args.output,
        in_terminal: args.output_in_terminal,
        variables: args.variables,
    };

    let fill = || -> Result<()> {
        let mut stdout = std::io::stdout();
        processor::dry_run(&options, config, &mut stdout)?;
        if !options.in_terminal {
            println!("\nDone! Filled template written to '{}'.", options.output.display());
        }
        Ok(())
    };

    if !args.hot_reload {
        return fill();
    }

    if let Err(e) = fill() {
        error!("{e}");
    }
    let ignore = processor::dry_run_watch_set(&options, config)?;
    println!("\nWatching '{}' for changes...", options.source.display());
    watch_directory(&ignore, || {
        println!("Changes detected, filling again...\n");
        fill()
    })
}

fn run_info(args: InfoArgs, config: &AppConfig) -> Result<()> {
    let repository = GitRepository::new(args.source).with_branch(args.branch).with_tag(args.tag);
    let schema = processor::info(&repository, config)?;
    println!("{}", schema.general_info());
    if !schema.variables.is_empty() {
        println!("{}", schema.variables_info());
    }
    Ok(())
}

fn run_start(args: StartArgs, config: &AppConfig) -> Result<()> {
    let mut options = StartOptions {
        output: args.output,
        name: args.name.unwrap_or_default(),
        description: args.description.unwrap_or_default(),
        license: args.license.unwrap_or_default(),
        authors: args.authors,
    };
    if !args.non_interactive {
        println!("Please answer the following questions to create the template repository.");
        println!("Press enter to use the default values.\n");
        options = ask_start_options(&DialoguerPrompter::new(), options, config)?;
    }
    let destination = processor::start(&options, config)?;
    println!("\nDone! Template repository created in '{}'.", destination.display());
    Ok(())
}
