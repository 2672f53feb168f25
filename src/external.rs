//! Launching external programs.
//!
//! Everything that can be computed without a child is done before `fork`: program lookup,
//! C string conversion of the arguments. The child then only adjusts its signal
//! dispositions, rewires its standard streams and calls `execv`.

use crate::error::ShellError;
use crate::jobs;
use crate::parser::{ParsedCommand, RedirectKind};
use crate::signals::{self, ToggleDeferral};
use crate::state::ShellState;
use crate::status::ExitReport;
use nix::errno::Errno;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::{self, ForkResult, Pid};
use std::borrow::Cow;
use std::convert::Infallible;
use std::ffi::{CString, OsStr};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

/// Permissions of files created by `>`: owner read/write, group and others read.
const OUTPUT_FILE_MODE: u32 = 0o644;

/// Search path used when `PATH` is not set.
pub const DEFAULT_SEARCH_PATH: &str = "/bin:/usr/bin";

/// Command that is not a builtin, resolved and ready to fork.
#[derive(Debug)]
pub struct ExternalCommand {
    /// Name as typed, used in error messages.
    name: String,
    /// Resolved executable, `None` if lookup failed.
    program: Option<CString>,
    argv: Vec<CString>,
    input: Option<String>,
    output: Option<String>,
    background: bool,
}

impl ExternalCommand {
    /// Resolve `cmd`'s program against `search_paths` (the `PATH` value, or
    /// [`DEFAULT_SEARCH_PATH`] when unset).
    pub fn prepare(cmd: &ParsedCommand, search_paths: Option<&str>) -> Self {
        let name = cmd.program().unwrap_or_default().to_owned();
        let argv = to_cstrings(&cmd.argv);
        let program = argv.as_ref().and_then(|_| {
            let found = find_command_path(
                OsStr::new(search_paths.unwrap_or(DEFAULT_SEARCH_PATH)),
                Path::new(&name),
            )?;
            CString::new(found.as_os_str().as_encoded_bytes()).ok()
        });

        Self {
            name,
            program,
            argv: argv.unwrap_or_default(),
            input: cmd.input.clone(),
            output: cmd.output.clone(),
            background: cmd.background,
        }
    }

    /// Start the command and, for a foreground command, wait for it.
    ///
    /// Background commands are announced on `out`, probed once without blocking and recorded
    /// in the job registry. Foreground commands update `state.last_status`; if one is killed
    /// by a signal the status is printed right away.
    pub fn spawn(self, state: &mut ShellState, out: &mut dyn Write) -> Result<(), ShellError> {
        out.flush()?;
        std::io::stdout().flush()?;

        // SAFETY: the interpreter is single threaded and the child only calls
        // sigaction, open, dup2 and execv before exiting.
        let child = match unsafe { unistd::fork() } {
            Ok(ForkResult::Parent { child }) => child,
            Ok(ForkResult::Child) => self.run_child(),
            Err(e) => return Err(ShellError::system("fork", e)),
        };
        tracing::debug!(pid = %child, program = %self.name, background = self.background, "launched");

        if self.background {
            writeln!(out, "background PID is {}", child)?;
            out.flush()?;
            match waitpid(child, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => {}
                Ok(status) => tracing::debug!(pid = %child, ?status, "background job ended immediately"),
                Err(e) => tracing::warn!(pid = %child, error = %e, "background probe failed"),
            }
            state.jobs.append(child);
            return Ok(());
        }

        let report = {
            let _deferral = ToggleDeferral::acquire()?;
            wait_foreground(child)?
        };
        state.last_status = report;
        if report.terminating_signal().is_some() {
            writeln!(out, "{}", report)?;
            out.flush()?;
        }
        Ok(())
    }

    fn run_child(&self) -> ! {
        let err = match self.exec() {
            Err(e) => e,
            Ok(never) => match never {},
        };
        // A missing program is reported on standard output, everything else on stderr.
        let _ = match &err {
            ShellError::Execution { .. } => writeln!(io::stdout(), "{}", err),
            _ => writeln!(io::stderr(), "{}", err),
        };
        std::process::exit(err.exit_code())
    }

    fn exec(&self) -> Result<Infallible, ShellError> {
        signals::reset_for_child(self.background)
            .map_err(|e| ShellError::system("sigaction", e))?;
        if let Some(path) = &self.input {
            redirect(path, RedirectKind::Input)?;
        }
        if let Some(path) = &self.output {
            redirect(path, RedirectKind::Output)?;
        }
        if let Some(program) = &self.program {
            // On success execv does not return.
            let _ = unistd::execv(program, &self.argv);
        }
        Err(ShellError::Execution {
            program: self.name.clone(),
        })
    }
}

/// Open `path` and install it as standard input or output of the current process.
fn redirect(path: &str, kind: RedirectKind) -> Result<(), ShellError> {
    let opened = match kind {
        RedirectKind::Input => File::open(path),
        RedirectKind::Output => OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(OUTPUT_FILE_MODE)
            .open(path),
    };
    let file = opened.map_err(|source| ShellError::RedirectionOpen {
        path: path.to_owned(),
        kind,
        source,
    })?;

    match kind {
        RedirectKind::Input => unistd::dup2_stdin(&file),
        RedirectKind::Output => unistd::dup2_stdout(&file),
    }
    .map_err(|e| ShellError::system("dup2", e))
}

/// Block until `child` exits or is killed.
fn wait_foreground(child: Pid) -> Result<ExitReport, ShellError> {
    loop {
        match waitpid(child, None) {
            Ok(status) => {
                if let Some(report) = ExitReport::from_wait_status(&status) {
                    tracing::debug!(pid = %child, %report, "foreground command finished");
                    return Ok(report);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(ShellError::system("waitpid", e)),
        }
    }
}

/// Run `cmd` in the foreground or background according to its flag.
pub fn launch(
    cmd: &ParsedCommand,
    state: &mut ShellState,
    out: &mut dyn Write,
) -> Result<(), ShellError> {
    let search_paths = state.env.search_path();
    ExternalCommand::prepare(cmd, search_paths.as_deref()).spawn(state, out)
}

/// Reap background jobs that have finished; see [`jobs::reap_finished`].
pub fn collect_finished(state: &mut ShellState, out: &mut dyn Write) -> Result<(), ShellError> {
    jobs::reap_finished(&mut state.jobs, out)?;
    Ok(())
}

fn to_cstrings(args: &[String]) -> Option<Vec<CString>> {
    args.iter()
        .map(|arg| CString::new(arg.as_bytes()).ok())
        .collect()
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh` or `./foo`): returns it if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first executable regular file. Directories and files without an execute
///   bit are skipped.
/// - Empty path: returns `None`.
///
/// Returns either a borrowed reference to the provided `path` or an owned `PathBuf`
/// when the result is discovered via PATH lookup.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    if path.as_os_str().as_encoded_bytes().contains(&b'/') {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    match components.next() {
        // Empty path -> not found
        None => None,
        // Single component -> search in PATH
        Some(x) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|path| is_executable_file(path))
}

fn is_executable_file(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_command;
    use std::ffi::OsStr;
    use std::fs;

    fn osstr(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    #[test]
    fn absolute_existing_true() {
        let path = Path::new("/bin/sh");
        let res = find_command_path(osstr("/bin"), path);
        assert!(res.is_some(), "Expected to find /bin/sh via absolute path");
        assert_eq!(res.unwrap().as_ref(), path);
    }

    #[test]
    fn absolute_nonexisting() {
        let path = Path::new("/bin/nonexisting");
        let res = find_command_path(osstr("/bin"), path);
        assert!(
            res.is_none(),
            "Expected not to find /bin/nonexisting via absolute path"
        );
    }

    #[test]
    fn single_component_found_in_path() {
        let res = find_command_path(osstr("/nonexistent/dir:/bin"), Path::new("sh"));
        let found = res.expect("Expected to find 'sh' in /bin via PATH search");
        assert_eq!(found.as_ref(), Path::new("/bin/sh"));
    }

    #[test]
    fn single_component_not_found_in_path() {
        let res = find_command_path(osstr("/bin"), Path::new("nonexisting"));
        assert!(res.is_none(), "Expected not to find 'nonexisting' in PATH");
    }

    #[test]
    fn relative_path_with_separator_skips_search() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(tmp.path().join("bin")).expect("create temp bin dir");
        let file_path = tmp.path().join("bin").join("tool");
        File::create(&file_path).expect("touch bin/tool");

        // A name with a separator is never looked up in PATH.
        let bin = tmp.path().join("bin");
        let res = find_command_path(bin.as_os_str(), Path::new("other/tool"));
        assert!(res.is_none());

        let relative = Path::new("./definitely-missing-smallsh-tool");
        assert!(find_command_path(bin.as_os_str(), relative).is_none());
    }

    #[test]
    fn search_skips_directories_and_non_executables() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let shadow_dir = tmp.path().join("dirs");
        let shadow_file = tmp.path().join("files");
        fs::create_dir_all(shadow_dir.join("sh")).expect("create sh directory");
        fs::create_dir_all(&shadow_file).expect("create files dir");
        fs::write(shadow_file.join("sh"), "#!/bin/sh\n").expect("write plain sh file");
        fs::set_permissions(shadow_file.join("sh"), fs::Permissions::from_mode(0o644))
            .expect("chmod sh file");

        let search = std::env::join_paths([
            shadow_dir.as_path(),
            shadow_file.as_path(),
            Path::new("/bin"),
        ])
        .expect("join search path");
        let found = find_command_path(&search, Path::new("sh")).expect("sh found after skipping");
        assert_eq!(found.as_ref(), Path::new("/bin/sh"));
    }

    #[test]
    fn search_accepts_executable_file() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let tool = tmp.path().join("smallsh-tool");
        fs::write(&tool, "#!/bin/sh\n").expect("write tool");
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).expect("chmod tool");

        let found = find_command_path(tmp.path().as_os_str(), Path::new("smallsh-tool"))
            .expect("tool found");
        assert_eq!(found.as_ref(), tool.as_path());
    }

    #[test]
    fn prepare_without_path_uses_default_search() {
        let cmd = parse_command("sh -c true", false).unwrap();
        let prepared = ExternalCommand::prepare(&cmd, None);
        assert_eq!(prepared.program.as_deref(), Some(c"/bin/sh"));
    }

    #[test]
    fn empty_path_is_none() {
        let res = find_command_path(osstr("/bin"), Path::new(""));
        assert!(res.is_none(), "Empty path should not resolve to anything");
    }

    #[test]
    fn prepare_resolves_program_and_keeps_argv0() {
        let cmd = parse_command("sh -c true > out.txt", false).unwrap();
        let prepared = ExternalCommand::prepare(&cmd, Some("/bin"));
        assert_eq!(prepared.program.as_deref(), Some(c"/bin/sh"));
        assert_eq!(prepared.argv[0].as_c_str(), c"sh");
        assert_eq!(prepared.argv.len(), 3);
        assert_eq!(prepared.output.as_deref(), Some("out.txt"));
        assert!(!prepared.background);
    }

    #[test]
    fn prepare_without_match_has_no_program() {
        let cmd = parse_command("nosuchprog-smallsh &", false).unwrap();
        let prepared = ExternalCommand::prepare(&cmd, Some("/bin"));
        assert!(prepared.program.is_none());
        assert_eq!(prepared.name, "nosuchprog-smallsh");
        assert!(prepared.background);
    }

    #[test]
    fn prepare_rejects_interior_nul() {
        let cmd = ParsedCommand {
            argv: vec!["sh".to_string(), "a\0b".to_string()],
            ..Default::default()
        };
        let prepared = ExternalCommand::prepare(&cmd, Some("/bin"));
        assert!(prepared.program.is_none());
        assert!(prepared.argv.is_empty());
    }

    #[test]
    fn redirect_reports_missing_input_file() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let missing = tmp.path().join("missing.txt");
        let missing = missing.to_string_lossy();
        match redirect(&missing, RedirectKind::Input) {
            Err(ShellError::RedirectionOpen { path, kind, .. }) => {
                assert_eq!(path, missing);
                assert_eq!(kind, RedirectKind::Input);
            }
            other => panic!("expected RedirectionOpen, got {:?}", other),
        }
    }
}
