use crate::dispatch::Flow;
use crate::error::{Result, WrapError};
use crate::lexer;
use crate::session::Session;
use argh::{EarlyExit, FromArgs};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Every builtin name, without the leading `:`.
pub const BUILTIN_NAMES: &[&str] = &[
    "help", "set", "vars", "pwd", "cd", "history", "exit", "quit", "q",
];

const HELP_FLAG: &str = "--help";

/// Colon commands interpreted by the wrapper itself.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and run in-process
/// against the [`Session`]; nothing is forwarded to the base command.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Names the command answers to, e.g. `["exit", "quit", "q"]`.
    fn names() -> &'static [&'static str];

    /// Build the command from the text after its name, verbatim, without
    /// option parsing. `None` leaves the words to argh.
    fn from_raw(_rest: &str) -> Option<Self> {
        None
    }

    /// Executes the command, writing any output to `stdout`.
    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<Flow>;
}

/// Object-safe form of a parsed builtin, ready to run.
pub trait ExecutableBuiltin {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, session: &mut Session) -> Result<Flow>;
}

impl<T: BuiltinCommand> ExecutableBuiltin for T {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, session: &mut Session) -> Result<Flow> {
        T::execute(*self, stdout, session)
    }
}

/// Factory that tries to create a builtin from a name and the rest of the line.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait BuiltinFactory {
    fn try_create(&self, name: &str, rest: &str) -> Option<Box<dyn ExecutableBuiltin>>;
}

/// Factory for one [`BuiltinCommand`] type.
pub(crate) struct Factory<T> {
    _phantom: PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T: BuiltinCommand + 'static> BuiltinFactory for Factory<T> {
    fn try_create(&self, name: &str, rest: &str) -> Option<Box<dyn ExecutableBuiltin>> {
        if !T::names().contains(&name) {
            return None;
        }
        if rest.trim() != HELP_FLAG {
            if let Some(cmd) = T::from_raw(rest) {
                return Some(Box::new(cmd));
            }
        }
        let cmd_name = format!(":{name}");
        let args: Vec<&str> = rest.split_whitespace().collect();
        Some(match T::from_args(&[cmd_name.as_str()], &args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                output,
                is_error: status.is_err(),
            }),
        })
    }
}

/// What argh produced instead of a command: `--help` text or a parse error.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableBuiltin for InvalidArgs {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, _session: &mut Session) -> Result<Flow> {
        if self.is_error {
            return Err(WrapError::Usage(self.output.trim().to_string()));
        }
        stdout.write_all(self.output.as_bytes())?;
        Ok(Flow::Continue)
    }
}

/// All builtins, in the order they are tried.
pub(crate) fn default_factories() -> Vec<Box<dyn BuiltinFactory>> {
    vec![
        Box::new(Factory::<Help>::default()),
        Box::new(Factory::<Set>::default()),
        Box::new(Factory::<Vars>::default()),
        Box::new(Factory::<Pwd>::default()),
        Box::new(Factory::<Cd>::default()),
        Box::new(Factory::<History>::default()),
        Box::new(Factory::<Exit>::default()),
    ]
}

#[derive(FromArgs)]
/// Show the list of builtins.
pub struct Help {}

impl BuiltinCommand for Help {
    fn names() -> &'static [&'static str] {
        &["help"]
    }

    fn execute(self, stdout: &mut dyn Write, _session: &mut Session) -> Result<Flow> {
        writeln!(stdout, ":help               - this help")?;
        writeln!(stdout, ":set k=v            - set a variable, used as ${{k}}")?;
        writeln!(stdout, ":vars               - list current variables")?;
        writeln!(stdout, ":pwd                - print working directory")?;
        writeln!(stdout, ":cd <path>          - change directory")?;
        writeln!(stdout, ":history            - show history")?;
        writeln!(stdout, ":exit | :quit | :q  - exit")?;
        writeln!(stdout, "!<command>          - run <command> with the system shell")?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Set a variable that can be referenced as ${key} in later lines.
pub struct Set {
    #[argh(positional, greedy)]
    /// assignment in the form key=value; the value may contain spaces.
    pub assignment: Vec<String>,
}

impl Set {
    /// Split `key=value` on the first `=`, trimming both sides.
    fn parse(assignment: &str) -> Result<(&str, &str)> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| WrapError::Usage("Usage: :set key=value".to_string()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(WrapError::Usage(
                "Usage: :set key=value (key must not be empty)".to_string(),
            ));
        }
        Ok((key, value.trim()))
    }
}

impl BuiltinCommand for Set {
    fn names() -> &'static [&'static str] {
        &["set"]
    }

    fn from_raw(rest: &str) -> Option<Self> {
        Some(Set {
            assignment: vec![rest.to_string()],
        })
    }

    fn execute(self, _stdout: &mut dyn Write, session: &mut Session) -> Result<Flow> {
        let assignment = self.assignment.join(" ");
        let (key, value) = Set::parse(&assignment)?;
        tracing::debug!(key, value, "variable set");
        session.vars.set(key, value);
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// List the variables of this session.
pub struct Vars {}

impl BuiltinCommand for Vars {
    fn names() -> &'static [&'static str] {
        &["vars"]
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<Flow> {
        for (k, v) in session.vars.list() {
            writeln!(stdout, "{k}={v}")?;
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Print the working directory commands run in.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn names() -> &'static [&'static str] {
        &["pwd"]
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<Flow> {
        writeln!(stdout, "{}", session.current_dir.display())?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Change the working directory commands run in.
/// Without a target, changes to the home directory.
pub struct Cd {
    #[argh(positional, greedy)]
    /// directory to switch to; absolute, relative to the current directory or starting with ~.
    pub target: Vec<String>,
}

impl Cd {
    fn resolve(raw: &str, current_dir: &Path) -> Result<PathBuf> {
        let raw = if raw.is_empty() { "~" } else { raw };
        let expanded = PathBuf::from(shellexpand::tilde(raw).as_ref());
        let new_dir = if expanded.is_absolute() {
            expanded
        } else {
            current_dir.join(expanded)
        };

        if !new_dir.exists() {
            return Err(WrapError::NotFound(format!(
                "cd: {}: no such file or directory",
                new_dir.display()
            )));
        }
        if !new_dir.is_dir() {
            return Err(WrapError::NotFound(format!(
                "cd: {}: not a directory",
                new_dir.display()
            )));
        }
        std::fs::canonicalize(&new_dir).map_err(|e| {
            WrapError::NotFound(format!("cd: can't canonicalize {}: {e}", new_dir.display()))
        })
    }
}

impl BuiltinCommand for Cd {
    fn names() -> &'static [&'static str] {
        &["cd"]
    }

    /// A target that reads as one quoted or escaped word is unquoted,
    /// anything else is taken as typed, inner blanks included.
    fn from_raw(rest: &str) -> Option<Self> {
        let rest = rest.trim();
        let target = match lexer::split_words(rest) {
            Ok(mut words) if words.len() == 1 => words.remove(0),
            _ => rest.to_string(),
        };
        Some(Cd {
            target: vec![target],
        })
    }

    fn execute(self, _stdout: &mut dyn Write, session: &mut Session) -> Result<Flow> {
        let target = self.target.join(" ");
        let canonical = Cd::resolve(&target, &session.current_dir)?;
        tracing::debug!(dir = %canonical.display(), "working directory changed");
        session.current_dir = canonical;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Show the lines entered so far, including earlier sessions.
pub struct History {}

impl BuiltinCommand for History {
    fn names() -> &'static [&'static str] {
        &["history"]
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<Flow> {
        for (i, line) in session.history.iter().enumerate() {
            writeln!(stdout, "{:>5}  {}", i + 1, line)?;
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Leave the REPL.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn names() -> &'static [&'static str] {
        &["exit", "quit", "q"]
    }

    fn execute(self, _stdout: &mut dyn Write, _session: &mut Session) -> Result<Flow> {
        Ok(Flow::Exit)
    }
}
