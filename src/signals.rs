//! Signal dispositions of the interpreter and its children, and foreground-only mode.
//!
//! The interpreter ignores SIGINT for its whole life and uses SIGTSTP (Ctrl-Z) as a toggle
//! for foreground-only mode. The toggle is the only state a signal handler touches; it lives
//! in an atomic cell and everything else reads a snapshot of it through [`mode`].

use crate::error::ShellError;
use nix::libc;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal};
use std::sync::atomic::{AtomicBool, Ordering};

/// The prompt marker printed before every line is read.
pub const PROMPT: &str = ": ";

const ENTER_FOREGROUND_ONLY: &[u8] = b"Entering foreground-only mode (& is now ignored)\n";
const EXIT_FOREGROUND_ONLY: &[u8] = b"Exiting foreground-only mode\n";

/// Whether a trailing `&` is honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// `&` is ignored and every command runs in the foreground.
    ForegroundOnly,
}

impl Mode {
    /// Message announcing that the shell has just switched into this mode.
    pub fn banner(self) -> &'static [u8] {
        match self {
            Mode::Normal => EXIT_FOREGROUND_ONLY,
            Mode::ForegroundOnly => ENTER_FOREGROUND_ONLY,
        }
    }

    pub fn is_foreground_only(self) -> bool {
        self == Mode::ForegroundOnly
    }
}

/// Atomic holder of the current [`Mode`]; safe to flip from a signal handler.
#[derive(Debug)]
pub struct ModeCell(AtomicBool);

impl Default for ModeCell {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeCell {
    pub const fn new() -> Self {
        ModeCell(AtomicBool::new(false))
    }

    pub fn get(&self) -> Mode {
        if self.0.load(Ordering::SeqCst) {
            Mode::ForegroundOnly
        } else {
            Mode::Normal
        }
    }

    /// Flip the mode and return the one now in effect.
    pub fn toggle(&self) -> Mode {
        if self.0.fetch_xor(true, Ordering::SeqCst) {
            Mode::Normal
        } else {
            Mode::ForegroundOnly
        }
    }
}

static MODE: ModeCell = ModeCell::new();

/// Snapshot of the process-wide mode.
pub fn mode() -> Mode {
    MODE.get()
}

// Runs in signal context: no allocation, no locks, no buffered output.
extern "C" fn on_toggle(_signal: libc::c_int) {
    let mode = MODE.toggle();
    write_unbuffered(mode.banner());
    write_unbuffered(PROMPT.as_bytes());
}

fn write_unbuffered(bytes: &[u8]) {
    // SAFETY: write(2) is async-signal-safe and `bytes` outlives the call.
    unsafe {
        libc::write(libc::STDOUT_FILENO, bytes.as_ptr().cast(), bytes.len());
    }
}

/// Install the interpreter's own dispositions: SIGINT ignored, SIGTSTP toggles the mode.
///
/// The toggle handler restarts interrupted reads and blocks every other signal while it runs.
pub fn install_shell_handlers() -> Result<(), ShellError> {
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    let toggle = SigAction::new(
        SigHandler::Handler(on_toggle),
        SaFlags::SA_RESTART,
        SigSet::all(),
    );

    // SAFETY: the installed handler only touches an atomic and calls write(2).
    unsafe {
        signal::sigaction(Signal::SIGINT, &ignore)
            .map_err(|e| ShellError::system("sigaction(SIGINT)", e))?;
        signal::sigaction(Signal::SIGTSTP, &toggle)
            .map_err(|e| ShellError::system("sigaction(SIGTSTP)", e))?;
    }
    tracing::debug!("shell signal handlers installed");
    Ok(())
}

/// Dispositions for a freshly forked child, applied before exec.
///
/// Foreground children get the default SIGINT back so Ctrl-C reaches them; background
/// children keep ignoring it. SIGTSTP is always ignored so toggling the mode never touches a
/// running command.
pub fn reset_for_child(background: bool) -> nix::Result<()> {
    let interrupt = if background {
        SigHandler::SigIgn
    } else {
        SigHandler::SigDfl
    };
    let interrupt = SigAction::new(interrupt, SaFlags::empty(), SigSet::empty());
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());

    // SAFETY: only default and ignore dispositions are installed.
    unsafe {
        signal::sigaction(Signal::SIGINT, &interrupt)?;
        signal::sigaction(Signal::SIGTSTP, &ignore)?;
    }
    Ok(())
}

/// Keeps SIGTSTP blocked while alive; the previous mask comes back on drop.
///
/// A toggle arriving while the guard is held stays pending and is handled as soon as the
/// guard is released.
#[must_use = "the toggle signal is only deferred while the guard is alive"]
pub struct ToggleDeferral {
    previous: SigSet,
}

impl ToggleDeferral {
    pub fn acquire() -> Result<Self, ShellError> {
        let mut block = SigSet::empty();
        block.add(Signal::SIGTSTP);
        let mut previous = SigSet::empty();
        signal::sigprocmask(SigmaskHow::SIG_BLOCK, Some(&block), Some(&mut previous))
            .map_err(|e| ShellError::system("sigprocmask", e))?;
        Ok(ToggleDeferral { previous })
    }
}

impl Drop for ToggleDeferral {
    fn drop(&mut self) {
        if let Err(e) = signal::sigprocmask(SigmaskHow::SIG_SETMASK, Some(&self.previous), None) {
            tracing::error!(error = %e, "failed to restore signal mask");
        }
    }
}
