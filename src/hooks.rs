//! Post-clone commands declared in a template manifest.

use crate::error::{Error, Result};
use log::{debug, warn};
use std::path::Path;
use std::process::{Command, Stdio};

/// The shell and flag used to run a command line.
pub fn default_shell() -> (String, &'static str) {
    if cfg!(windows) {
        return ("powershell".to_string(), "-Command");
    }
    let shell = std::env::var("SHELL").ok().filter(|s| !s.is_empty());
    (shell.unwrap_or_else(|| "sh".to_string()), "-c")
}

/// Runs each command through the default shell inside `working_dir`, in
/// order, with inherited stdio. Empty commands are skipped.
///
/// # Errors
/// * `Error::HookError` if a command cannot be started or exits unsuccessfully
pub fn run_post_clone_commands<P: AsRef<Path>>(working_dir: P, commands: &[Vec<String>]) -> Result<()> {
    let working_dir = working_dir.as_ref();
    let (shell, flag) = default_shell();

    for command in commands {
        let line = command.join(" ");
        if line.trim().is_empty() {
            warn!("Skipping empty post-clone command");
            continue;
        }
        debug!("Running post-clone command '{line}' in '{}'", working_dir.display());

        let status = Command::new(&shell)
            .arg(flag)
            .arg(&line)
            .current_dir(working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| Error::HookError(format!("could not run '{line}': {e}")))?;

        if !status.success() {
            return Err(Error::HookError(format!("'{line}' failed with status: {status}")));
        }
    }
    Ok(())
}
