//! `$$` expansion of a raw command line.

use crate::error::ShellError;

/// Maximum raw command line length, counting one byte for the terminator.
pub const MAX_COMMAND_LINE: usize = 2048 + 1;

/// Maximum length of a line after `$$` expansion, counting the terminator.
pub const MAX_COMMAND_LINE_EXPANDED: usize = 5120 + 1;

/// The token replaced by the interpreter's process id.
pub const PID_PLACEHOLDER: &str = "$$";

/// Replace every `$$` in `line` with the decimal digits of `pid`.
///
/// Occurrences are matched left to right without overlap, so `$$$` becomes the pid followed
/// by a single `$`. Lines at or above [`MAX_COMMAND_LINE`] are rejected before any expansion,
/// and so are lines whose expansion would not fit [`MAX_COMMAND_LINE_EXPANDED`].
pub fn expand_pid(line: &str, pid: u32) -> Result<String, ShellError> {
    if line.len() + 1 >= MAX_COMMAND_LINE {
        return Err(ShellError::CommandLineTooLong {
            max: MAX_COMMAND_LINE - 1,
        });
    }

    if !line.contains(PID_PLACEHOLDER) {
        return Ok(line.to_owned());
    }

    let expanded = line.replace(PID_PLACEHOLDER, &pid.to_string());
    if expanded.len() + 1 > MAX_COMMAND_LINE_EXPANDED {
        return Err(ShellError::CommandLineTooLong {
            max: MAX_COMMAND_LINE_EXPANDED - 1,
        });
    }
    Ok(expanded)
}
