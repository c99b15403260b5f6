use crate::builtin::{self, BuiltinFactory};
use crate::error::{Result, WrapError};
use crate::external::ExternalCommand;
use crate::lexer;
use crate::session::Session;
use std::ffi::OsString;
use std::io::Write;

/// What the REPL loop should do after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// The class of a logical input line, decided by its first character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Nothing but whitespace.
    Empty,
    /// `:name rest`; `rest` is the trimmed remainder of the line, inner
    /// whitespace untouched.
    Builtin { name: &'a str, rest: &'a str },
    /// `!command`, with the `!` already stripped.
    ShellEscape(&'a str),
    /// Anything else; forwarded to the base command.
    PassThrough(&'a str),
}

/// Classify `line`. Surrounding whitespace is ignored.
pub fn classify(line: &str) -> LineKind<'_> {
    let line = line.trim();
    if line.is_empty() {
        LineKind::Empty
    } else if let Some(rest) = line.strip_prefix(':') {
        let body = rest.trim_start();
        let (name, rest) = body
            .split_once(char::is_whitespace)
            .unwrap_or((body, ""));
        LineKind::Builtin {
            name,
            rest: rest.trim(),
        }
    } else if let Some(rest) = line.strip_prefix('!') {
        LineKind::ShellEscape(rest.trim())
    } else {
        LineKind::PassThrough(line)
    }
}

/// Executes logical lines against a [`Session`].
///
/// The dispatcher holds no state of its own; everything a line may change
/// lives in the session passed to [`Dispatcher::dispatch`].
pub struct Dispatcher {
    builtins: Vec<Box<dyn BuiltinFactory>>,
}

impl Dispatcher {
    /// Create a dispatcher with a custom set of builtin factories.
    pub fn new(builtins: Vec<Box<dyn BuiltinFactory>>) -> Self {
        Self { builtins }
    }

    /// Handle one logical line.
    ///
    /// Builtin output goes to `stdout`; children inherit the process streams.
    /// Errors are returned to the caller, which reports them and carries on.
    pub fn dispatch(&self, line: &str, session: &mut Session, stdout: &mut dyn Write) -> Result<Flow> {
        let kind = classify(line);
        tracing::debug!(?kind, "dispatching line");
        match kind {
            LineKind::Empty => Ok(Flow::Continue),
            LineKind::Builtin { name, rest } => self.run_builtin(name, rest, session, stdout),
            LineKind::ShellEscape(rest) => {
                if let Some(cmd) = shell_command(rest, session) {
                    cmd.run_checked(&session.current_dir)?;
                }
                Ok(Flow::Continue)
            }
            LineKind::PassThrough(rest) => {
                let cmd = pass_through_command(rest, session)?;
                cmd.run_checked(&session.current_dir)?;
                Ok(Flow::Continue)
            }
        }
    }

    fn run_builtin(
        &self,
        name: &str,
        rest: &str,
        session: &mut Session,
        stdout: &mut dyn Write,
    ) -> Result<Flow> {
        for factory in &self.builtins {
            if let Some(cmd) = factory.try_create(name, rest) {
                return cmd.execute(stdout, session);
            }
        }
        Err(WrapError::NotFound(format!(
            "unknown builtin ':{name}'. Use :help"
        )))
    }
}

impl Default for Dispatcher {
    /// Create a dispatcher with every builtin: `help`, `set`, `vars`, `pwd`,
    /// `cd`, `history` and `exit`/`quit`/`q`.
    fn default() -> Self {
        Self::new(builtin::default_factories())
    }
}

/// Build the shell escape for `rest` (the text after `!`).
///
/// Variables are substituted first. A bare `!` yields `None`.
pub fn shell_command(rest: &str, session: &Session) -> Option<ExternalCommand> {
    let expanded = session.vars.substitute(rest.trim());
    if expanded.trim().is_empty() {
        return None;
    }
    Some(ExternalCommand::shell(&expanded))
}

/// Build `<base> <base-args> <words>` for a pass-through line.
pub fn pass_through_command(line: &str, session: &Session) -> Result<ExternalCommand> {
    let expanded = session.vars.substitute(line);
    let words =
        lexer::split_words(&expanded).map_err(|e| WrapError::Usage(format!("parse error: {e}")))?;
    let base = session.base();
    let args: Vec<OsString> = base
        .args
        .iter()
        .cloned()
        .chain(words)
        .map(OsString::from)
        .collect();
    Ok(ExternalCommand::new(&base.program, args, base.name()))
}
