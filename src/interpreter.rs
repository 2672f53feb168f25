use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::error::ShellError;
use crate::expand::expand_pid;
use crate::external;
use crate::io_adapters::{LineRead, LineSource};
use crate::lexer;
use crate::parser::parse_command;
use crate::signals::{self, PROMPT};
use crate::state::ShellState;
use std::io::{self, Write};

/// Marks a line as a comment when its first word starts with it.
const COMMENT_MARKER: char = '#';

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate, see [`crate::builtin`].
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The prompt loop: reads a line, expands `$$`, then runs a built-in or launches a program.
///
/// The interpreter owns the [`ShellState`] and a list of [`CommandFactory`] objects that are
/// queried by the first word of each line. See [`Default`] for the built-ins included out of
/// the box.
pub struct Interpreter {
    state: ShellState,
    builtins: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of built-in factories.
    pub fn new(env: Environment, builtins: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            state: ShellState::new(env),
            builtins,
        }
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    /// Run prompt cycles against standard output until `exit`.
    pub fn run(&mut self, source: &mut dyn LineSource) -> Result<ExitCode, ShellError> {
        self.run_with_output(source, &mut io::stdout())
    }

    /// Run prompt cycles until `exit` or a fatal error.
    ///
    /// Before each prompt, finished background jobs are reported. Recoverable errors are
    /// printed to `out` and the prompt is reissued; any other error is returned.
    pub fn run_with_output(
        &mut self,
        source: &mut dyn LineSource,
        out: &mut dyn Write,
    ) -> Result<ExitCode, ShellError> {
        while !self.state.should_exit {
            external::collect_finished(&mut self.state, out)?;

            let line = match source.read_line(PROMPT) {
                LineRead::Line(line) => line,
                LineRead::NoInput => continue,
            };

            match self.execute_line_with_output(&line, out) {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => {
                    tracing::debug!(error = %e, "line rejected");
                    writeln!(out, "{}", e)?;
                    out.flush()?;
                }
                Err(e) => return Err(e),
            }
        }
        tracing::debug!("exit requested");
        Ok(0)
    }

    /// Execute one raw command line, writing the interpreter's own output to `out`.
    pub fn execute_line_with_output(
        &mut self,
        line: &str,
        out: &mut dyn Write,
    ) -> Result<(), ShellError> {
        let expanded = expand_pid(line, self.state.pid_number())?;

        let Some(name) = lexer::first_word(&expanded) else {
            return Ok(());
        };
        if name.starts_with(COMMENT_MARKER) {
            return Ok(());
        }

        let args: Vec<&str> = expanded.split_whitespace().skip(1).collect();
        if let Some(cmd) = self.create_builtin(name, &args) {
            match cmd.execute(out, &mut self.state) {
                Ok(code) => tracing::debug!(command = name, code, "builtin finished"),
                Err(e) => {
                    tracing::warn!(command = name, error = %e, "builtin output failed");
                    eprintln!("{:#}", e);
                }
            }
            return Ok(());
        }

        let foreground_only = signals::mode().is_foreground_only();
        let command = parse_command(&expanded, foreground_only)?;
        tracing::debug!(?command, foreground_only, "parsed");
        external::launch(&command, &mut self.state, out)
    }

    fn create_builtin(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        self.builtins
            .iter()
            .find_map(|factory| factory.try_create(name, args))
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the built-ins `cd`, `status` and `exit`.
    fn default() -> Self {
        use crate::builtin::*;
        Self::new(
            Environment::new(),
            vec![
                Box::new(Factory::<Cd>::default()),
                Box::new(Factory::<Status>::default()),
                Box::new(Factory::<Exit>::default()),
            ],
        )
    }
}
