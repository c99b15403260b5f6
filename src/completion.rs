use crate::builtin::BUILTIN_NAMES;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// `rustyline` helper for the REPL: tab completion and the prompt color.
///
/// The first word completes to the base command's subcommands (or to
/// builtin names after `:`), later words complete to paths relative to the
/// session's working directory.
pub struct WrapHelper {
    subcommands: Vec<String>,
    cwd: PathBuf,
}

impl WrapHelper {
    pub fn new(subcommands: BTreeSet<String>, cwd: PathBuf) -> Self {
        Self {
            subcommands: subcommands.into_iter().collect(),
            cwd,
        }
    }

    /// Keep path completion in step with `:cd`.
    pub fn set_cwd(&mut self, cwd: &Path) {
        if self.cwd != cwd {
            self.cwd = cwd.to_path_buf();
        }
    }

    /// Completion candidates for the word ending at `pos`, together with
    /// the byte offset where that word starts.
    pub fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<Pair>) {
        let Some(before) = line.get(..pos) else {
            return (pos, Vec::new());
        };
        // The system shell owns everything after `!`.
        if before.trim_start().starts_with('!') {
            return (pos, Vec::new());
        }

        let start = before
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        let word = &before[start..];
        let first_word = before[..start].trim().is_empty();

        let candidates = if first_word {
            match word.strip_prefix(':') {
                Some(partial) => BUILTIN_NAMES
                    .iter()
                    .filter(|name| name.starts_with(partial))
                    .map(|name| plain_pair(format!(":{name}")))
                    .collect(),
                None => self
                    .subcommands
                    .iter()
                    .filter(|cmd| cmd.starts_with(word))
                    .map(|cmd| plain_pair(cmd.clone()))
                    .collect(),
            }
        } else {
            self.path_candidates(word)
        };
        (start, candidates)
    }

    fn path_candidates(&self, word: &str) -> Vec<Pair> {
        let (dir_part, partial) = match word.rfind('/') {
            Some(i) => (&word[..=i], &word[i + 1..]),
            None => ("", word),
        };
        let dir = if dir_part.is_empty() {
            self.cwd.clone()
        } else {
            let expanded = PathBuf::from(shellexpand::tilde(dir_part).as_ref());
            if expanded.is_absolute() {
                expanded
            } else {
                self.cwd.join(expanded)
            }
        };

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::trace!(dir = %dir.display(), error = %e, "no path completion");
                return Vec::new();
            }
        };

        let mut out: Vec<Pair> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                if !name.starts_with(partial) {
                    return None;
                }
                let suffix = if entry.path().is_dir() { "/" } else { "" };
                Some(Pair {
                    display: format!("{name}{suffix}"),
                    replacement: format!("{dir_part}{name}{suffix}"),
                })
            })
            .collect();
        out.sort_by(|a, b| a.replacement.cmp(&b.replacement));
        out
    }
}

fn plain_pair(s: String) -> Pair {
    Pair {
        display: s.clone(),
        replacement: s,
    }
}

impl Completer for WrapHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(self.candidates(line, pos))
    }
}

impl Hinter for WrapHelper {
    type Hint = String;
}

impl Highlighter for WrapHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        Cow::Owned(prompt.cyan().bold().to_string())
    }
}

impl Validator for WrapHelper {}

impl Helper for WrapHelper {}
