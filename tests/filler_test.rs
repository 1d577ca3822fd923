use cloney::error::Error;
use cloney::filler::{fill_directory, FillMode};
use cloney::manifest::parse_manifest;
use cloney::prune::prune_ignored;
use cloney::variables::{bind_variables, parse_user_variables, BoundVariables};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const MANIFEST: &str = r#"
name: example
template_version: "1.0.0"
manifest_version: v1
variables:
  - name: name
    example: World
  - name: ports
    default: [80, 443]
    example: [8080]
"#;

fn bound(user: &str) -> BoundVariables {
    let schema = parse_manifest(MANIFEST, &["v1".to_string(), "v2".to_string()]).unwrap();
    bind_variables(&schema, parse_user_variables(user).unwrap()).unwrap()
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test_log::test]
fn test_fill_in_place() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(&root.join("a.txt"), "Hello {{ name }}");
    write(&root.join("config/ports.yaml"), "{% for p in ports %}- {{ p }}\n{% endfor %}");

    fill_directory(root, &[] as &[&str], &bound("name: World"), FillMode::InPlace).unwrap();

    assert_eq!(fs::read_to_string(root.join("a.txt")).unwrap(), "Hello World");
    assert_eq!(fs::read_to_string(root.join("config/ports.yaml")).unwrap(), "- 80\n- 443\n");
}

#[test]
fn test_ignored_files_are_left_alone() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(&root.join("a.txt"), "Hello {{ name }}");
    write(&root.join("raw/keep.txt"), "{{ not_a_variable }}");

    fill_directory(root, &["raw"], &bound("name: World"), FillMode::InPlace).unwrap();

    assert_eq!(fs::read_to_string(root.join("raw/keep.txt")).unwrap(), "{{ not_a_variable }}");
}

#[test]
fn test_mirror_is_idempotent() {
    let source = TempDir::new().unwrap();
    let targets = TempDir::new().unwrap();
    write(&source.path().join("README.md"), "# {{ name }}\n");
    write(&source.path().join("src/main.rs"), "fn main() { println!(\"{{ name }}\"); }\n");
    write(&source.path().join(".git/HEAD"), "ref: refs/heads/main");

    let vars = bound("name: demo");
    let first = targets.path().join("first");
    let second = targets.path().join("second");
    fill_directory(source.path(), &[".git"], &vars, FillMode::Mirror(first.clone())).unwrap();
    fill_directory(source.path(), &[".git"], &vars, FillMode::Mirror(second.clone())).unwrap();

    assert!(!dir_diff::is_different(&first, &second).unwrap());
    assert_eq!(fs::read_to_string(first.join("README.md")).unwrap(), "# demo\n");
    assert!(!first.join(".git").exists());
    assert_eq!(fs::read_to_string(source.path().join("README.md")).unwrap(), "# {{ name }}\n");
}

#[test]
fn test_to_file_writes_next_to_the_calling_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(&root.join("__service.txt"), "service {{ name }}");
    write(&root.join("services/index.txt"), "{{ toFile(name ~ '.txt', '__service.txt', {'name': name}) }}listed");

    fill_directory(root, &[] as &[&str], &bound("name: api"), FillMode::InPlace).unwrap();
    prune_ignored(root, &[] as &[&str], "__").unwrap();

    assert_eq!(fs::read_to_string(root.join("services/api.txt")).unwrap(), "service api");
    assert_eq!(fs::read_to_string(root.join("services/index.txt")).unwrap(), "listed");
    assert!(!root.join("__service.txt").exists());
}

#[test]
fn test_to_file_cannot_escape_the_template_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("outer/inner");
    write(
        &root.join("evil.txt"),
        "{% macro body() %}pwned{% endmacro %}{{ toFile('../../etc/passwd', 'body') }}",
    );

    let result = fill_directory(&root, &[] as &[&str], &bound("name: x"), FillMode::InPlace);

    assert!(matches!(result, Err(Error::PathConfinementError { .. })));
    assert!(!temp_dir.path().join("etc/passwd").exists());
    assert!(!temp_dir.path().join("outer/etc/passwd").exists());
}

#[test]
fn test_terminal_rejects_to_file() {
    let temp_dir = TempDir::new().unwrap();
    write(
        &temp_dir.path().join("gen.txt"),
        "{% macro body() %}x{% endmacro %}{{ toFile('out.txt', 'body') }}",
    );

    let mut out: Vec<u8> = Vec::new();
    let result = fill_directory(
        temp_dir.path(),
        &[] as &[&str],
        &bound("name: x"),
        FillMode::Terminal(&mut out),
    );

    match result {
        Err(Error::UnsupportedInTerminalError { path }) => assert_eq!(path, "gen.txt"),
        other => panic!("Expected UnsupportedInTerminalError, got {other:?}"),
    }
    assert!(!temp_dir.path().join("out.txt").exists());
}

#[test]
fn test_template_syntax_error() {
    let temp_dir = TempDir::new().unwrap();
    write(&temp_dir.path().join("bad.txt"), "{% if %}");

    let result =
        fill_directory(temp_dir.path(), &[] as &[&str], &bound("name: x"), FillMode::InPlace);
    assert!(matches!(result, Err(Error::TemplateError(_))));
}

#[cfg(unix)]
#[test]
fn test_to_file_cannot_escape_through_a_symlink() {
    let temp_dir = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    let root = temp_dir.path();
    std::os::unix::fs::symlink(outside.path(), root.join("link")).unwrap();
    write(
        &root.join("a.txt"),
        "{% macro body() %}pwned{% endmacro %}{{ toFile('link/escaped.txt', 'body') }}ok",
    );

    let result = fill_directory(root, &["link"], &bound("name: x"), FillMode::InPlace);

    match result {
        Err(Error::PathConfinementError { path }) => assert_eq!(path, "link/escaped.txt"),
        other => panic!("Expected PathConfinementError, got {other:?}"),
    }
    assert!(!outside.path().join("escaped.txt").exists());
}

#[test]
fn test_to_file_works_from_an_included_template() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(&root.join("__body.txt"), "body {{ name }}");
    write(&root.join("__writer.txt"), "{{ toFile('gen/' ~ name ~ '.txt', '__body.txt', {'name': name}) }}");
    write(&root.join("index.txt"), "{{ include('__writer.txt', {'name': name}) }}done");

    fill_directory(root, &[] as &[&str], &bound("name: api"), FillMode::InPlace).unwrap();

    assert_eq!(fs::read_to_string(root.join("gen/api.txt")).unwrap(), "body api");
    assert_eq!(fs::read_to_string(root.join("index.txt")).unwrap(), "done");
}

#[test]
fn test_terminal_prints_text_that_only_mentions_to_file() {
    let temp_dir = TempDir::new().unwrap();
    write(
        &temp_dir.path().join("README.md"),
        "Use toFile(path, name) in {{ name }} templates.",
    );

    let mut out: Vec<u8> = Vec::new();
    fill_directory(
        temp_dir.path(),
        &[] as &[&str],
        &bound("name: demo"),
        FillMode::Terminal(&mut out),
    )
    .unwrap();

    let printed = String::from_utf8(out).unwrap();
    assert_eq!(printed, "\n----- File: README.md\nUse toFile(path, name) in demo templates.\n");
}
