//! End-to-end checks of the somali-bot binary's startup path.

use std::process::{Command, Output};
use tempfile::TempDir;

/// Run the binary with a clean environment, outside any directory holding a `.env`.
fn run_bot(args: &[&str], envs: &[(&str, &str)]) -> Output {
    let workdir = TempDir::new().expect("failed to create temp dir");
    let mut command = Command::new(env!("CARGO_BIN_EXE_somali-bot"));
    command.env_clear().current_dir(workdir.path()).args(args);
    for (key, value) in envs {
        command.env(key, value);
    }
    command.output().expect("failed to spawn somali-bot")
}

#[test]
fn test_missing_settings_exit_with_status_one() {
    let output = run_bot(&[], &[]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_no_authorized_chats_is_rejected() {
    let output = run_bot(
        &["check"],
        &[
            ("BOT_TOKEN", "123:abc"),
            ("OPENAI_API_KEY", "sk-test"),
            ("AUTHORIZED_CHAT_ID", "not-a-number"),
        ],
    );
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_help_lists_flags_without_secrets() {
    let output = run_bot(&["--help"], &[("BOT_TOKEN", "123:very-secret")]);
    assert!(output.status.success());

    let help = String::from_utf8_lossy(&output.stdout);
    assert!(help.contains("--bot-token"));
    assert!(help.contains("--authorized-chat-ids"));
    assert!(help.contains("check"));
    assert!(!help.contains("very-secret"));
}
