use cloney::ignore::{collect_file_paths, should_ignore, IgnoreSet};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_should_ignore_git_directory() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path();
    assert!(should_ignore(base, &base.join(".git"), &[".git"]).unwrap());
    assert!(!should_ignore(base, &base.join("src"), &[".git"]).unwrap());
}

#[test]
fn test_ignored_directories_are_not_walked() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path();
    fs::create_dir_all(base.join(".git/objects/ab")).unwrap();
    fs::write(base.join(".git/objects/ab/cdef"), "blob").unwrap();
    fs::write(base.join(".git/HEAD"), "ref: refs/heads/main").unwrap();
    fs::create_dir_all(base.join("src")).unwrap();
    fs::write(base.join("src/main.rs"), "fn main() {}").unwrap();
    fs::write(base.join("README.md"), "# readme").unwrap();

    let ignore = IgnoreSet::new(base, &[".git"]).unwrap();
    let files = collect_file_paths(&ignore).unwrap();

    assert_eq!(files, vec![base.join("README.md"), base.join("src/main.rs")]);
}

#[test]
fn test_glob_patterns_from_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path();
    fs::create_dir_all(base.join("assets/img")).unwrap();
    fs::write(base.join("assets/img/logo.png"), "png").unwrap();
    fs::write(base.join("app.log"), "log").unwrap();
    fs::write(base.join("app.txt"), "text").unwrap();

    let ignore = IgnoreSet::new(base, &["assets", "*.log"]).unwrap();
    let files = collect_file_paths(&ignore).unwrap();

    assert_eq!(files, vec![base.join("app.txt")]);
}
