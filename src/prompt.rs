//! Interactive questions asked by `cloney start`.

use crate::config::AppConfig;
use crate::error::Result;
use crate::processor::StartOptions;
use dialoguer::Input;

/// Asks the user for text answers.
pub trait Prompter {
    /// Asks `question`; an empty answer yields `default`.
    fn input(&self, question: &str, default: &str) -> Result<String>;
}

/// Terminal prompter backed by `dialoguer`.
#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for DialoguerPrompter {
    fn input(&self, question: &str, default: &str) -> Result<String> {
        let answer = Input::<String>::new()
            .with_prompt(question)
            .default(default.to_string())
            .show_default(!default.is_empty())
            .allow_empty(true)
            .interact_text()?;
        Ok(answer)
    }
}

/// Fills in the values of `options` the user did not pass as flags.
pub fn ask_start_options(
    prompter: &dyn Prompter,
    mut options: StartOptions,
    config: &AppConfig,
) -> Result<StartOptions> {
    if options.name.is_empty() {
        options.name = prompter.input(
            "What is the name of the template repository",
            &config.default_project_name,
        )?;
    }
    if options.description.is_empty() {
        options.description = prompter.input(
            "What is the description of the template repository",
            &config.default_description,
        )?;
    }
    if options.license.is_empty() {
        options.license = prompter
            .input("What is the license of the template repository", &config.default_license)?;
    }
    if options.authors.is_empty() {
        let authors = prompter
            .input("What are the authors of the template repository (separated by commas)", "")?;
        options.authors = authors
            .split(',')
            .map(str::trim)
            .filter(|author| !author.is_empty())
            .map(String::from)
            .collect();
    }
    Ok(options)
}
