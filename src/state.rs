use crate::env::Environment;
use crate::jobs::JobRegistry;
use crate::status::ExitReport;
use nix::unistd::{Pid, getpid};

/// Everything the interpreter remembers between prompt cycles.
///
/// Only the main control flow mutates this; signal handlers never see it.
#[derive(Debug)]
pub struct ShellState {
    /// Process id substituted for `$$`. Fixed for the whole run.
    pub pid: Pid,
    /// How the most recent foreground command ended.
    pub last_status: ExitReport,
    /// Background jobs not reaped yet.
    pub jobs: JobRegistry,
    pub env: Environment,
    /// Set by `exit`; the prompt loop stops once it sees this.
    pub should_exit: bool,
}

impl ShellState {
    pub fn new(env: Environment) -> Self {
        Self {
            pid: getpid(),
            last_status: ExitReport::default(),
            jobs: JobRegistry::default(),
            env,
            should_exit: false,
        }
    }

    /// The interpreter's process id as an unsigned number, for `$$` expansion.
    pub fn pid_number(&self) -> u32 {
        self.pid.as_raw().unsigned_abs()
    }
}

impl Default for ShellState {
    fn default() -> Self {
        Self::new(Environment::new())
    }
}
