#![cfg(unix)]

use cloney::error::Error;
use cloney::hooks::run_post_clone_commands;
use tempfile::TempDir;

#[test]
fn test_commands_run_in_working_dir() {
    let temp_dir = TempDir::new().unwrap();
    let commands = vec![
        vec!["echo".to_string(), "ready".to_string(), ">".to_string(), "marker.txt".to_string()],
        vec![],
    ];

    run_post_clone_commands(temp_dir.path(), &commands).unwrap();

    let marker = std::fs::read_to_string(temp_dir.path().join("marker.txt")).unwrap();
    assert_eq!(marker.trim(), "ready");
}

#[test]
fn test_failing_command_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let commands = vec![vec!["exit".to_string(), "3".to_string()]];

    match run_post_clone_commands(temp_dir.path(), &commands) {
        Err(Error::HookError(message)) => assert!(message.contains("exit 3")),
        other => panic!("Expected HookError, got {other:?}"),
    }
}
