mod common;

use common::{script, smallsh};
use predicates::prelude::*;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_runs_external_program() {
    smallsh()
        .write_stdin(script(&["echo hello world", "exit"]))
        .assert()
        .success()
        .stdout(predicate::str::contains("hello world\n"));
}

#[test]
fn test_exit_value_of_last_foreground_command() {
    smallsh()
        .write_stdin(script(&["false", "status", "true", "status", "exit"]))
        .assert()
        .success()
        .stdout(predicate::str::contains("exit value 1\n: : exit value 0\n"));
}

#[test]
fn test_unknown_program_reports_and_sets_status() {
    smallsh()
        .write_stdin(script(&["nosuchprog-smallsh arg", "status", "exit"]))
        .assert()
        .success()
        .stdout(
            predicate::str::contains("nosuchprog-smallsh: no such file or directory\n")
                .and(predicate::str::contains("exit value 1")),
        );
}

#[test]
fn test_ampersand_in_the_middle_is_an_argument() {
    smallsh()
        .write_stdin(script(&["echo hi & bye", "exit"]))
        .assert()
        .success()
        .stdout(
            predicate::str::contains("hi & bye\n")
                .and(predicate::str::contains("background PID is").not()),
        );
}

#[test]
fn test_pid_expansion() {
    let output = smallsh()
        .write_stdin(script(&["echo $$ $$$", "exit"]))
        .output()
        .expect("run smallsh");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    let re = Regex::new(r"(\d+) (\d+)\$\n").unwrap();
    let caps = re.captures(&stdout).expect("expanded pid in output");
    assert_eq!(&caps[1], &caps[2]);
}

#[test]
fn test_output_then_input_redirection() {
    let dir = tempfile::tempdir().expect("create temp dir");

    smallsh()
        .current_dir(dir.path())
        .write_stdin(script(&["echo redirected > out.txt", "cat < out.txt", "exit"]))
        .assert()
        .success()
        .stdout(predicate::str::contains("redirected\n"));

    let written = fs::read_to_string(dir.path().join("out.txt")).expect("read out.txt");
    assert_eq!(written, "redirected\n");
}

#[test]
fn test_output_redirection_truncates() {
    let dir = tempfile::tempdir().expect("create temp dir");
    fs::write(dir.path().join("out.txt"), "old contents that are long\n").unwrap();

    smallsh()
        .current_dir(dir.path())
        .write_stdin(script(&["echo new > out.txt", "exit"]))
        .assert()
        .success();

    let written = fs::read_to_string(dir.path().join("out.txt")).expect("read out.txt");
    assert_eq!(written, "new\n");
}

#[test]
fn test_missing_input_file_fails_the_command_only() {
    let dir = tempfile::tempdir().expect("create temp dir");

    smallsh()
        .current_dir(dir.path())
        .write_stdin(script(&["cat < missing.txt", "status", "exit"]))
        .assert()
        .success()
        .stdout(predicate::str::contains("exit value 1"))
        .stderr(predicate::str::contains("cannot open missing.txt for input"));
}

#[test]
fn test_missing_redirection_target_exits_with_three() {
    smallsh()
        .write_stdin(script(&["cat <", "echo unreachable", "exit"]))
        .assert()
        .code(3)
        .stdout(predicate::str::contains("unreachable").not())
        .stderr(predicate::str::contains("Error getting input filename"));
}

#[test]
fn test_background_job_is_announced_and_reaped() {
    smallsh()
        .write_stdin(script(&["sleep 0.2 &", "sleep 1", "exit"]))
        .assert()
        .success()
        .stdout(
            predicate::str::is_match(r"background PID is \d+\n")
                .unwrap()
                .and(predicate::str::is_match(r"background pid \d+ is done: exit value 0\n").unwrap()),
        );
}

#[test]
fn test_background_output_goes_to_null_device() {
    smallsh()
        .write_stdin(script(&["echo hidden &", "sleep 0.5", "exit"]))
        .assert()
        .success()
        .stdout(predicate::str::contains("hidden").not());
}

#[test]
fn test_background_job_keeps_explicit_redirection() {
    let dir = tempfile::tempdir().expect("create temp dir");

    smallsh()
        .current_dir(dir.path())
        .write_stdin(script(&["echo kept > bg.txt &", "sleep 0.5", "exit"]))
        .assert()
        .success();

    let written = fs::read_to_string(dir.path().join("bg.txt")).expect("read bg.txt");
    assert_eq!(written, "kept\n");
}

#[test]
fn test_foreground_signal_is_reported_immediately() {
    let dir = tempfile::tempdir().expect("create temp dir");
    fs::write(dir.path().join("selfkill.sh"), "kill -TERM $$\n").unwrap();

    smallsh()
        .current_dir(dir.path())
        .write_stdin(script(&["sh selfkill.sh", "status", "exit"]))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            ": terminated by signal 15\n: terminated by signal 15\n",
        ));
}

/// Whether `pid` is gone or only a zombie, polling for a few seconds.
fn process_ended(pid: u32) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        match fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Err(_) => return true,
            Ok(stat) => {
                let state = stat
                    .rsplit(')')
                    .next()
                    .and_then(|rest| rest.split_whitespace().next());
                if state == Some("Z") {
                    return true;
                }
            }
        }
        thread::sleep(Duration::from_millis(50));
    }
    false
}

#[test]
fn test_exit_terminates_background_jobs() {
    let output = smallsh()
        .write_stdin(script(&["sleep 30 &", "exit"]))
        .output()
        .expect("run smallsh");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    let re = Regex::new(r"background PID is (\d+)\n").unwrap();
    let pid: u32 = re.captures(&stdout).expect("announced pid")[1]
        .parse()
        .expect("numeric pid");
    assert!(process_ended(pid), "background sleep {} still running", pid);
}

#[test]
fn test_search_skips_directory_named_like_program() {
    let dir = tempfile::tempdir().expect("create temp dir");
    fs::create_dir(dir.path().join("echo")).expect("create shadowing dir");
    let search = format!("{}:/usr/bin:/bin", dir.path().display());

    smallsh()
        .env("PATH", search)
        .write_stdin(script(&["echo found-it", "status", "exit"]))
        .assert()
        .success()
        .stdout(
            predicate::str::contains("found-it\n")
                .and(predicate::str::contains("exit value 0"))
                .and(predicate::str::contains("no such file").not()),
        );
}

#[test]
fn test_unset_path_uses_default_search() {
    assert!(Path::new("/bin/echo").exists() || Path::new("/usr/bin/echo").exists());

    smallsh()
        .env_remove("PATH")
        .write_stdin(script(&["echo found-it", "exit"]))
        .assert()
        .success()
        .stdout(
            predicate::str::contains("found-it\n")
                .and(predicate::str::contains("no such file").not()),
        );
}
