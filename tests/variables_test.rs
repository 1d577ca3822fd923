use cloney::error::Error;
use cloney::variables::{load_user_variables, read_user_variables_file};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_variables_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(".cloney-vars.yaml");
    fs::write(&path, "app_name: demo\nports: [80, 443]\nsettings:\n  debug: true\n").unwrap();

    let vars = load_user_variables(&path.display().to_string()).unwrap();
    assert_eq!(vars["app_name"], json!("demo"));
    assert_eq!(vars["ports"], json!([80, 443]));
    assert_eq!(vars["settings"], json!({"debug": true}));
    assert_eq!(vars.keys().collect::<Vec<_>>(), vec!["app_name", "ports", "settings"]);
}

#[test]
fn test_empty_variables_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("vars.yml");
    fs::write(&path, "").unwrap();
    assert!(read_user_variables_file(&path).unwrap().is_empty());
}

#[test]
fn test_unsupported_variables_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("vars.json");
    fs::write(&path, "{\"a\": 1}").unwrap();

    assert!(matches!(load_user_variables(&path.display().to_string()), Err(Error::VariablesSourceError(_))));
}
