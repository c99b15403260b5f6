use crate::plugin;
use crate::vars::VariableStore;
use std::env as stdenv;
use std::path::PathBuf;

/// The wrapped program and the arguments put in front of every line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseCommand {
    /// Program name or path, e.g. `git` or `/usr/local/bin/docker`.
    pub program: String,
    /// Fixed arguments inserted between the program and the typed words.
    pub args: Vec<String>,
}

impl BaseCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Short name used in the prompt and in diagnostics.
    pub fn name(&self) -> &str {
        plugin::command_name(&self.program)
    }
}

/// Mutable state of one interactive session.
///
/// The state is threaded explicitly through the REPL loop and the dispatcher.
/// `current_dir` is the directory children run in; the process working
/// directory itself is never changed.
#[derive(Debug, Clone)]
pub struct Session {
    /// Variables set with `:set`.
    pub vars: VariableStore,
    /// Working directory for pass-through commands and shell escapes.
    pub current_dir: PathBuf,
    /// Every logical line entered, oldest first, seeded from the history file.
    pub history: Vec<String>,
    base: BaseCommand,
}

impl Session {
    /// Start a session in the process's current directory.
    pub fn new(base: BaseCommand) -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::with_dir(base, current_dir)
    }

    pub fn with_dir(base: BaseCommand, current_dir: PathBuf) -> Self {
        Self {
            vars: VariableStore::new(),
            current_dir,
            history: Vec::new(),
            base,
        }
    }

    pub fn base(&self) -> &BaseCommand {
        &self.base
    }

    pub fn record(&mut self, line: impl Into<String>) {
        self.history.push(line.into());
    }
}
