//! `smallsh`: a small interactive Unix shell.
//!
//! Each prompt cycle reads one line, substitutes the interpreter's process id for `$$`, and
//! either runs one of the built-ins `cd`, `status` and `exit` in-process or forks a single
//! external program with optional `<`/`>` redirection, in the foreground or, with a trailing
//! `&`, in the background. SIGINT is ignored by the shell itself and SIGTSTP toggles a
//! foreground-only mode in which `&` has no effect.
//!
//! The main entry point is [`Interpreter`], fed by any [`io_adapters::LineSource`]. The
//! remaining public modules expose the individual stages: [`expand`], [`parser`],
//! [`external`], [`jobs`], [`signals`] and [`status`].

mod builtin;
pub mod command;
pub mod env;
pub mod error;
pub mod expand;
pub mod external;
mod interpreter;
pub mod io_adapters;
pub mod jobs;
mod lexer;
pub mod parser;
pub mod signals;
pub mod state;
pub mod status;

pub use error::ShellError;
/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
