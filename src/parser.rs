use crate::lexer::{self, Token};
use std::fmt;
use thiserror::Error;

/// Redirection target used for background jobs that did not redirect a stream themselves.
pub const NULL_DEVICE: &str = "/dev/null";

/// A single external command, ready to be handed to the launcher.
///
/// Built fresh for every line and discarded once the process has been started.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedCommand {
    /// Program name followed by its arguments. May be empty for a line such as `> out`.
    pub argv: Vec<String>,
    /// File that replaces standard input.
    pub input: Option<String>,
    /// File that replaces standard output, created or truncated.
    pub output: Option<String>,
    /// Whether the interpreter returns to the prompt without waiting.
    pub background: bool,
}

impl ParsedCommand {
    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }
}

/// Kind of redirection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// Input redirection (`<`): reads standard input from a file.
    Input,
    /// Output redirection (`>`): writes standard output to a file, truncating it.
    Output,
}

impl fmt::Display for RedirectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectKind::Input => f.write_str("input"),
            RedirectKind::Output => f.write_str("output"),
        }
    }
}

/// Errors that can occur while turning tokens into a [`ParsedCommand`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParsingError {
    /// A redirection operator was the last token of the line.
    #[error("Error getting {0} filename")]
    MissingTarget(RedirectKind),
}

struct CommandBuilder {
    tokens: Vec<Token>,
    pos: usize,
    foreground_only: bool,
}

impl CommandBuilder {
    fn from(tokens: Vec<Token>, foreground_only: bool) -> Self {
        CommandBuilder {
            tokens,
            pos: 0,
            foreground_only,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn is_last(&self) -> bool {
        self.pos + 1 == self.tokens.len()
    }

    fn build(mut self) -> Result<ParsedCommand, ParsingError> {
        let mut cmd = ParsedCommand::default();

        while let Some(token) = self.peek() {
            match token {
                Token::RedirectLeft => {
                    self.consume();
                    cmd.input = Some(self.parse_target(RedirectKind::Input)?);
                }
                Token::RedirectRight => {
                    self.consume();
                    cmd.output = Some(self.parse_target(RedirectKind::Output)?);
                }
                Token::Ampersand if self.is_last() => {
                    self.consume();
                    // Dropped entirely while `&` is being ignored.
                    cmd.background = !self.foreground_only;
                }
                Token::Ampersand | Token::Word(_) => {
                    if let Some(token) = self.consume() {
                        cmd.argv.push(token.as_str().to_owned());
                    }
                }
            }
        }

        if cmd.background {
            cmd.input.get_or_insert_with(|| NULL_DEVICE.to_owned());
            cmd.output.get_or_insert_with(|| NULL_DEVICE.to_owned());
        }
        Ok(cmd)
    }

    /// The file name after a redirection operator. Any token is accepted as a name.
    fn parse_target(&mut self, kind: RedirectKind) -> Result<String, ParsingError> {
        match self.consume() {
            Some(token) => Ok(token.as_str().to_owned()),
            None => Err(ParsingError::MissingTarget(kind)),
        }
    }
}

/// Parse an already expanded line into a [`ParsedCommand`].
///
/// `foreground_only` is the mode snapshot taken for this line; when set, a trailing `&` is
/// silently discarded and the command runs in the foreground without default redirections.
pub fn parse_command(line: &str, foreground_only: bool) -> Result<ParsedCommand, ParsingError> {
    let tokens = lexer::split_into_tokens(line);
    CommandBuilder::from(tokens, foreground_only).build()
}
