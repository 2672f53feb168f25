use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// View of the process environment used by the interpreter.
///
/// The environment contains:
/// - `vars`: variables captured at startup (`HOME` for `cd`, `PATH` for program lookup).
/// - `current_dir`: the working directory, kept in sync by `cd`.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The current working directory, inherited by launched commands.
    pub current_dir: PathBuf,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { vars, current_dir }
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Directory `cd` moves to when called without an argument.
    pub fn home(&self) -> Option<String> {
        self.get_var("HOME")
    }

    /// Colon-separated program search path.
    pub fn search_path(&self) -> Option<String> {
        self.get_var("PATH")
    }
}
