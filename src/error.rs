//! Error types shared by the interpreter.
//!
//! Recoverable failures ([`ShellError::CommandLineTooLong`]) are printed and the prompt is
//! reissued. Everything else ends the interpreter with the code returned by
//! [`ShellError::exit_code`].

use crate::parser::{ParsingError, RedirectKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    /// The raw line (or its `$$` expansion) does not fit the configured bounds.
    #[error("the command line has a maximum length of {max} characters")]
    CommandLineTooLong { max: usize },

    /// A redirection operator had no file name after it.
    #[error(transparent)]
    Parse(#[from] ParsingError),

    /// A redirection file could not be opened by a launched command.
    #[error("cannot open {path} for {kind}")]
    RedirectionOpen {
        path: String,
        kind: RedirectKind,
        #[source]
        source: std::io::Error,
    },

    /// The program of a launched command could not be found or executed.
    #[error("{program}: no such file or directory")]
    Execution { program: String },

    /// A system call the interpreter itself depends on failed.
    #[error("{operation} failed: {source}")]
    SystemResource {
        operation: &'static str,
        #[source]
        source: nix::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShellError {
    pub(crate) fn system(operation: &'static str, source: nix::Error) -> Self {
        ShellError::SystemResource { operation, source }
    }

    /// Whether the prompt loop may continue after reporting this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ShellError::CommandLineTooLong { .. })
    }

    /// Process exit code used when this error terminates the interpreter.
    pub fn exit_code(&self) -> i32 {
        match self {
            ShellError::CommandLineTooLong { .. } => 0,
            ShellError::Parse(_) => 3,
            ShellError::RedirectionOpen { .. }
            | ShellError::Execution { .. }
            | ShellError::SystemResource { .. }
            | ShellError::Io(_) => 1,
        }
    }
}
