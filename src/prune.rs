//! Removal of ignored and internal-only paths from a filled tree.

use crate::error::{Error, Result};
use crate::ignore::{is_not_found, IgnoreSet};
use log::debug;
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Deletes every path under `root` that is ignored by `patterns`, or whose
/// file name starts with `internal_prefix`. The root itself is kept.
///
/// Paths that are already gone count as removed.
///
/// # Errors
/// * `Error::GlobError` if a pattern is invalid
/// * `Error::IoError` / `Error::WalkDirError` for any other I/O failure
pub fn prune_ignored<P, S>(root: P, patterns: &[S], internal_prefix: &str) -> Result<()>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let root = root.as_ref();
    let ignore = IgnoreSet::new(root, patterns)?;

    let mut walker = WalkDir::new(root).min_depth(1).sort_by_file_name().into_iter();
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if is_not_found(&e) => continue,
            Err(e) => return Err(Error::WalkDirError(e)),
        };

        let internal = !internal_prefix.is_empty()
            && entry.file_name().to_string_lossy().starts_with(internal_prefix);
        if !internal && !ignore.is_ignored(entry.path()) {
            continue;
        }

        debug!("Pruning '{}'", entry.path().display());
        if entry.file_type().is_dir() {
            tolerate_missing(fs::remove_dir_all(entry.path()))?;
            walker.skip_current_dir();
        } else {
            tolerate_missing(fs::remove_file(entry.path()))?;
        }
    }
    Ok(())
}

fn tolerate_missing(result: io::Result<()>) -> Result<()> {
    match result {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(Error::IoError(e)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prunes_internal_prefix_and_patterns() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("__partials/nested")).unwrap();
        fs::write(root.join("__partials/nested/x.tpl"), "x").unwrap();
        fs::write(root.join("src.rs"), "keep").unwrap();
        fs::write(root.join("__helper.txt"), "drop").unwrap();
        fs::write(root.join("notes.log"), "drop").unwrap();

        prune_ignored(root, &["*.log"], "__").unwrap();

        assert!(root.join("src.rs").exists());
        assert!(!root.join("__partials").exists());
        assert!(!root.join("__helper.txt").exists());
        assert!(!root.join("notes.log").exists());
        assert!(root.exists());
    }

    #[test]
    fn test_missing_root_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(prune_ignored(dir.path().join("gone"), &[] as &[&str], "__").is_ok());
    }
}
