//! Sources of command lines for the prompt loop.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};

/// Result of asking a [`LineSource`] for the next line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRead {
    Line(String),
    /// Nothing was read (end of input, interrupted edit, read error). The prompt is reissued.
    NoInput,
}

/// Something the interpreter can pull command lines from.
pub trait LineSource {
    /// Show `prompt` and read one line without its trailing newline.
    fn read_line(&mut self, prompt: &str) -> LineRead;
}

/// Interactive line editing on a terminal, backed by [`rustyline`].
///
/// Creating the editor on a terminal replaces the SIGINT disposition, so it must be built
/// before [`crate::signals::install_shell_handlers`].
pub struct EditorLines {
    editor: DefaultEditor,
    history: bool,
}

impl EditorLines {
    pub fn new(history: bool) -> rustyline::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            history,
        })
    }
}

impl LineSource for EditorLines {
    fn read_line(&mut self, prompt: &str) -> LineRead {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if self.history && !line.trim().is_empty() {
                    if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                        tracing::warn!(error = %e, "failed to record history entry");
                    }
                }
                LineRead::Line(line)
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => LineRead::NoInput,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read line");
                LineRead::NoInput
            }
        }
    }
}

/// Plain buffered reading for non-terminal input; the prompt goes to standard output.
pub struct StreamLines<R, W> {
    reader: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> StreamLines<R, W> {
    pub fn new(reader: R, prompt_out: W) -> Self {
        Self { reader, prompt_out }
    }
}

impl<R: BufRead, W: Write> LineSource for StreamLines<R, W> {
    fn read_line(&mut self, prompt: &str) -> LineRead {
        if let Err(e) = self
            .prompt_out
            .write_all(prompt.as_bytes())
            .and_then(|_| self.prompt_out.flush())
        {
            tracing::warn!(error = %e, "failed to write prompt");
        }

        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => LineRead::NoInput,
            Ok(_) => {
                if line.ends_with('\n') {
                    line.pop();
                }
                LineRead::Line(line)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read line");
                LineRead::NoInput
            }
        }
    }
}

/// Pick the line editor for a terminal and plain buffered reading otherwise.
pub fn stdin_source(history: bool) -> rustyline::Result<Box<dyn LineSource>> {
    if io::stdin().is_terminal() {
        Ok(Box::new(EditorLines::new(history)?))
    } else {
        tracing::debug!("standard input is not a terminal, line editing disabled");
        Ok(Box::new(StreamLines::new(io::stdin().lock(), io::stdout())))
    }
}

/// Fixed list of lines, for driving the interpreter without a terminal.
///
/// Once exhausted every read reports [`LineRead::NoInput`].
#[derive(Debug, Default)]
pub struct ScriptedLines {
    lines: VecDeque<String>,
    prompts: usize,
}

impl ScriptedLines {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            prompts: 0,
        }
    }

    /// How many times a prompt has been shown.
    pub fn prompts(&self) -> usize {
        self.prompts
    }
}

impl LineSource for ScriptedLines {
    fn read_line(&mut self, _prompt: &str) -> LineRead {
        self.prompts += 1;
        match self.lines.pop_front() {
            Some(line) => LineRead::Line(line),
            None => LineRead::NoInput,
        }
    }
}
