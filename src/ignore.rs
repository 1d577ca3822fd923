//! Ignore-path matching for template trees.
//! Patterns are shell globs relative to a base directory. A path is
//! ignored when it, or any of its ancestors below the base, matches one
//! of the patterns, so ignoring a directory ignores everything inside it.

use crate::error::{Error, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::debug;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Compiled ignore patterns scoped to a base directory.
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    base: PathBuf,
    patterns: Vec<String>,
    globs: GlobSet,
}

impl IgnoreSet {
    /// Compiles `patterns`, each relative to `base`.
    ///
    /// # Errors
    /// * `Error::GlobError` if a pattern is not a valid glob
    pub fn new<P: AsRef<Path>, S: AsRef<str>>(base: P, patterns: &[S]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let pattern = normalize_pattern(pattern.as_ref());
            if pattern.is_empty() {
                continue;
            }
            builder.add(Glob::new(&pattern)?);
            kept.push(pattern);
        }
        Ok(Self {
            base: base.as_ref().to_path_buf(),
            patterns: kept,
            globs: builder.build()?,
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether `path` (absolute, or relative to the current directory in the
    /// same way as the base) falls under an ignore pattern. The base itself
    /// and paths outside of it are never ignored.
    pub fn is_ignored<P: AsRef<Path>>(&self, path: P) -> bool {
        let Ok(relative) = path.as_ref().strip_prefix(&self.base) else {
            return false;
        };
        let relative = to_slash(relative);
        if relative.is_empty() {
            return false;
        }

        let mut candidate = relative.as_str();
        loop {
            if self.globs.is_match(candidate) {
                return true;
            }
            match candidate.rfind('/') {
                Some(index) => candidate = &candidate[..index],
                None => return false,
            }
        }
    }
}

/// Whether `path` under `base_dir` matches any of `patterns`.
pub fn should_ignore<S: AsRef<str>>(base_dir: &Path, path: &Path, patterns: &[S]) -> Result<bool> {
    Ok(IgnoreSet::new(base_dir, patterns)?.is_ignored(path))
}

fn normalize_pattern(pattern: &str) -> String {
    let pattern = pattern.trim().replace('\\', "/");
    let pattern = pattern.strip_prefix("./").unwrap_or(&pattern);
    pattern.trim_matches('/').to_string()
}

/// Path as a `/`-separated string, whatever the platform separator.
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Every non-ignored file under the base of `ignore`, in a stable order.
/// Ignored directories are not descended into.
pub fn collect_file_paths(ignore: &IgnoreSet) -> Result<Vec<PathBuf>> {
    collect_paths(ignore, |entry| entry.file_type().is_file())
}

/// Every non-ignored directory under the base of `ignore`, the base included.
pub fn collect_directory_paths(ignore: &IgnoreSet) -> Result<Vec<PathBuf>> {
    collect_paths(ignore, |entry| entry.file_type().is_dir())
}

fn collect_paths<F>(ignore: &IgnoreSet, keep: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&walkdir::DirEntry) -> bool,
{
    let mut paths = Vec::new();
    let walker = WalkDir::new(ignore.base())
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let ignored = ignore.is_ignored(entry.path());
            if ignored {
                debug!("Ignoring '{}'", entry.path().display());
            }
            !ignored
        });
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if is_not_found(&e) => continue,
            Err(e) => return Err(Error::WalkDirError(e)),
        };
        if keep(&entry) {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

pub(crate) fn is_not_found(error: &walkdir::Error) -> bool {
    error.io_error().is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pattern() {
        assert_eq!(normalize_pattern("./dist/"), "dist");
        assert_eq!(normalize_pattern("a\\b"), "a/b");
        assert_eq!(normalize_pattern("  "), "");
    }

    #[test]
    fn test_directory_pattern_covers_descendants() {
        let ignore = IgnoreSet::new("/base", &[".git"]).unwrap();
        assert!(ignore.is_ignored("/base/.git"));
        assert!(ignore.is_ignored("/base/.git/objects/ab"));
        assert!(!ignore.is_ignored("/base/.github"));
        assert!(!ignore.is_ignored("/base"));
        assert!(!ignore.is_ignored("/elsewhere/.git"));
    }

    #[test]
    fn test_wildcards() {
        let ignore = IgnoreSet::new("/base", &["*.log", "build/*"]).unwrap();
        assert!(ignore.is_ignored("/base/debug.log"));
        assert!(ignore.is_ignored("/base/nested/deep/trace.log"));
        assert!(ignore.is_ignored("/base/build/output.bin"));
        assert!(!ignore.is_ignored("/base/build"));
        assert!(!ignore.is_ignored("/base/src/main.rs"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(IgnoreSet::new("/base", &["[a-"]), Err(Error::GlobError(_))));
    }
}
