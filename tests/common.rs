//! Helpers shared by the integration tests.
#![allow(dead_code)]

use assert_cmd::Command;
use std::time::Duration;

/// Upper bound for a whole scripted session.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(20);

/// Creates a command for the compiled `smallsh` binary with logging quiet.
///
/// # Panics
/// Panics if the `smallsh` binary cannot be found via `Command::cargo_bin`.
pub fn smallsh() -> Command {
    let mut cmd = Command::cargo_bin("smallsh").expect("Failed to find smallsh binary for testing");
    cmd.env_remove("RUST_LOG").timeout(SESSION_TIMEOUT);
    cmd
}

/// Joins `lines` into one newline-terminated script for standard input.
pub fn script(lines: &[&str]) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}
