//! How a finished process ended, in the form the `status` built-in prints.

use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;
use std::fmt;

/// Exit code or terminating signal of a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReport {
    /// The process ran to completion with this exit code.
    Exited(i32),
    /// The process was killed by this signal number.
    Signaled(i32),
}

impl Default for ExitReport {
    /// What `status` reports before any foreground command has run.
    fn default() -> Self {
        ExitReport::Exited(0)
    }
}

impl ExitReport {
    /// Interpret a status returned by `waitpid`.
    ///
    /// Returns `None` for states that do not mean the process is gone (stopped, continued,
    /// still running).
    pub fn from_wait_status(status: &WaitStatus) -> Option<Self> {
        match *status {
            WaitStatus::Exited(_, code) => Some(ExitReport::Exited(code)),
            WaitStatus::Signaled(_, signal, _) => Some(ExitReport::Signaled(signal as i32)),
            _ => None,
        }
    }

    /// Interpret a raw `wait(2)` status word.
    pub fn from_raw(raw: i32) -> Option<Self> {
        WaitStatus::from_raw(Pid::from_raw(0), raw)
            .ok()
            .and_then(|status| Self::from_wait_status(&status))
    }

    /// The signal number when the process was killed by a signal.
    pub fn terminating_signal(&self) -> Option<i32> {
        match self {
            ExitReport::Signaled(signal) => Some(*signal),
            ExitReport::Exited(_) => None,
        }
    }
}

impl fmt::Display for ExitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReport::Exited(code) => write!(f, "exit value {}", code),
            ExitReport::Signaled(signal) => write!(f, "terminated by signal {}", signal),
        }
    }
}
