use crate::external::ExitCode;
use rustyline::error::ReadlineError;
use std::io;
use thiserror::Error;

/// Everything that can go wrong while reading or dispatching a line.
///
/// Only [`WrapError::InputTerminated`], [`WrapError::Interrupted`] and
/// [`WrapError::Readline`] end the session. The rest are printed as a single
/// diagnostic line and the loop keeps going.
#[derive(Debug, Error)]
pub enum WrapError {
    /// Malformed builtin invocation or a line that cannot be split into words.
    #[error("{0}")]
    Usage(String),

    /// Missing directory, unknown builtin or missing base command.
    #[error("{0}")]
    NotFound(String),

    /// A child process finished with a non-zero exit code.
    #[error("[{program}] exited with code {code}")]
    Subprocess { program: String, code: ExitCode },

    /// Spawning a child or writing output failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// End of input (Ctrl-D).
    #[error("input terminated")]
    InputTerminated,

    /// Interrupt received at the prompt (Ctrl-C).
    #[error("interrupted")]
    Interrupted,

    /// The line editor failed for another reason.
    #[error("line editor: {0}")]
    Readline(#[from] ReadlineError),
}

impl WrapError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        WrapError::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether the REPL loop has to stop after this error.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WrapError::InputTerminated | WrapError::Interrupted | WrapError::Readline(_)
        )
    }
}

impl From<io::Error> for WrapError {
    fn from(e: io::Error) -> Self {
        WrapError::io("write failed", e)
    }
}

pub type Result<T> = std::result::Result<T, WrapError>;
