//! Completion hints for well-known base commands.
//!
//! The catalog is closed: each supported tool family is one [`Plugin`]
//! variant and [`Plugin::lookup`] maps a base command name onto it through
//! a static table. Subcommands are discovered from the tool's own help
//! output rather than from bundled lists.

use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::LazyLock;

/// A provider of subcommand names for one family of base commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plugin {
    /// `git help -a`
    Git,
    /// `docker --help` and look-alikes such as podman.
    Docker,
    /// Unknown base command, offers nothing.
    None,
}

/// Base command name to plugin. Matching is exact.
const REGISTRY: &[(&str, Plugin)] = &[
    ("git", Plugin::Git),
    ("docker", Plugin::Docker),
    ("podman", Plugin::Docker),
];

static INDENTED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s{2,}([a-z0-9][a-z0-9-]*)\*?(?:\s|$)").expect("valid listing pattern")
});

static WORD_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9-]*(?:[ ,]+[a-z0-9-]+)*$").expect("valid word list pattern")
});

impl Plugin {
    /// Find the plugin registered for `base_command`.
    ///
    /// Only the file name of the command takes part in the match, so
    /// `/usr/bin/git` resolves like `git`. Anything unregistered gets
    /// [`Plugin::None`].
    pub fn lookup(base_command: &str) -> Self {
        let name = command_name(base_command);
        REGISTRY
            .iter()
            .find(|(registered, _)| *registered == name)
            .map(|(_, plugin)| *plugin)
            .unwrap_or(Plugin::None)
    }

    /// Known subcommands of `base_command`. Never fails: when the tool cannot
    /// be queried the set is simply empty.
    pub fn subcommands(&self, base_command: &str) -> BTreeSet<String> {
        match self {
            Plugin::Git => probe(base_command, &["help", "-a"])
                .map(|out| parse_git_help(&out))
                .unwrap_or_default(),
            Plugin::Docker => probe(base_command, &["--help"])
                .map(|out| parse_command_listing(&out))
                .unwrap_or_default(),
            Plugin::None => BTreeSet::new(),
        }
    }
}

/// Last path component of a command, or the command itself.
pub fn command_name(base_command: &str) -> &str {
    Path::new(base_command)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(base_command)
}

fn probe(base_command: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(base_command)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();
    match output {
        Ok(out) if out.status.success() => Some(String::from_utf8_lossy(&out.stdout).into_owned()),
        Ok(out) => {
            tracing::debug!(base_command, ?args, status = ?out.status, "subcommand probe failed");
            None
        }
        Err(e) => {
            tracing::debug!(base_command, ?args, error = %e, "subcommand probe could not run");
            None
        }
    }
}

/// Collect command names from `git help -a` output.
///
/// Accepts both layouts git has used: indented `name   description` rows
/// and bare lines that are nothing but a list of names.
pub fn parse_git_help(output: &str) -> BTreeSet<String> {
    let mut cmds = BTreeSet::new();
    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if WORD_LIST.is_match(trimmed) {
            cmds.extend(
                trimmed
                    .split([' ', ','])
                    .filter(|tok| !tok.is_empty())
                    .map(str::to_string),
            );
        }
        if let Some(caps) = INDENTED_NAME.captures(line) {
            cmds.insert(caps[1].to_string());
        }
    }
    cmds
}

/// Collect command names from a `Commands:` style help screen
/// (docker, podman and most cobra-based tools).
///
/// Only indented rows inside sections whose header ends in `Commands:` count,
/// so option tables are ignored.
pub fn parse_command_listing(output: &str) -> BTreeSet<String> {
    let mut cmds = BTreeSet::new();
    let mut in_commands = false;
    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if !line.starts_with(char::is_whitespace) {
            in_commands = line.trim_end().ends_with("Commands:");
            continue;
        }
        if in_commands {
            if let Some(caps) = INDENTED_NAME.captures(line) {
                cmds.insert(caps[1].to_string());
            }
        }
    }
    cmds
}
