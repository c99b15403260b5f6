use crate::completion::WrapHelper;
use crate::config::Config;
use crate::dispatch::{Dispatcher, Flow};
use crate::error::{Result, WrapError};
use crate::session::Session;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Editor};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Prompt shown while a line is being continued with a trailing `\`.
pub const CONTINUATION_PROMPT: &str = "..> ";

const CONTINUATION_MARKER: char = '\\';

/// Where the REPL gets its lines from.
///
/// End of input is reported as [`WrapError::InputTerminated`] and an
/// interrupt as [`WrapError::Interrupted`].
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<String>;

    /// Called once for every non-empty logical line before it is dispatched.
    fn record(&mut self, _line: &str) {}

    /// Called after each dispatched line with the session's working directory.
    fn set_cwd(&mut self, _cwd: &Path) {}
}

/// Interactive input through `rustyline`, with persistent history.
pub struct EditorSource {
    editor: Editor<WrapHelper, DefaultHistory>,
    history_file: Option<PathBuf>,
}

impl EditorSource {
    pub fn new(config: &Config, helper: WrapHelper) -> Result<Self> {
        let rl_config = rustyline::Config::builder()
            .max_history_size(config.history_size)?
            .completion_type(CompletionType::List)
            .auto_add_history(false)
            .build();
        let mut editor = Editor::with_config(rl_config)?;
        editor.set_helper(Some(helper));

        if let Some(path) = &config.history_file {
            match editor.load_history(path) {
                Ok(()) => tracing::debug!(path = %path.display(), "history loaded"),
                Err(e) => tracing::debug!(path = %path.display(), error = %e, "history not loaded"),
            }
        }

        Ok(Self {
            editor,
            history_file: config.history_file.clone(),
        })
    }

    /// Entries loaded from the history file, oldest first.
    pub fn history_entries(&self) -> Vec<String> {
        self.editor.history().iter().cloned().collect()
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(line),
            Err(ReadlineError::Interrupted) => Err(WrapError::Interrupted),
            Err(ReadlineError::Eof) => Err(WrapError::InputTerminated),
            Err(e) => Err(e.into()),
        }
    }

    fn record(&mut self, line: &str) {
        if let Err(e) = self.editor.add_history_entry(line) {
            tracing::warn!(error = %e, "failed to add history entry");
            return;
        }
        if let Some(path) = &self.history_file {
            if let Err(e) = self.editor.append_history(path) {
                tracing::warn!(path = %path.display(), error = %e, "failed to write history");
            }
        }
    }

    fn set_cwd(&mut self, cwd: &Path) {
        if let Some(helper) = self.editor.helper_mut() {
            helper.set_cwd(cwd);
        }
    }
}

/// Read one logical line, following trailing `\` continuations.
///
/// Each continued piece loses its marker and surrounding blanks at the
/// seam; pieces are joined with a single space.
pub fn read_logical_line(source: &mut dyn LineSource, prompt: &str) -> Result<String> {
    let mut parts: Vec<String> = Vec::new();
    loop {
        let prompt = if parts.is_empty() {
            prompt
        } else {
            CONTINUATION_PROMPT
        };
        let raw = source.read_line(prompt)?;
        let piece = if parts.is_empty() {
            raw.as_str()
        } else {
            raw.trim_start()
        };
        match piece.strip_suffix(CONTINUATION_MARKER) {
            Some(stripped) => parts.push(stripped.trim_end().to_string()),
            None => {
                parts.push(piece.to_string());
                break;
            }
        }
    }
    Ok(parts.join(" ").trim().to_string())
}

/// The read-dispatch loop.
#[derive(Default)]
pub struct Repl {
    dispatcher: Dispatcher,
}

impl Repl {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Run until `:exit`, end of input or an interrupt at the prompt.
    ///
    /// Builtin output goes to `stdout`, one-line diagnostics to `stderr`.
    /// Only a line editor failure is returned as an error.
    pub fn run(
        &self,
        source: &mut dyn LineSource,
        session: &mut Session,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<()> {
        let prompt = format!("{}> ", session.base().name());
        loop {
            let line = match read_logical_line(source, &prompt) {
                Ok(line) => line,
                Err(WrapError::InputTerminated) => {
                    tracing::debug!("end of input");
                    writeln!(stdout)?;
                    return Ok(());
                }
                Err(WrapError::Interrupted) => {
                    tracing::debug!("interrupted at prompt");
                    return Ok(());
                }
                Err(e) => return Err(e),
            };
            if line.is_empty() {
                continue;
            }

            session.record(line.as_str());
            source.record(&line);

            match self.dispatcher.dispatch(&line, session, stdout) {
                Ok(Flow::Exit) => return Ok(()),
                Ok(Flow::Continue) => {}
                Err(e) => writeln!(stderr, "wrap: {e}")?,
            }
            stdout.flush()?;
            source.set_cwd(&session.current_dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::BaseCommand;
    use std::collections::VecDeque;

    /// Feeds canned lines, then reports end of input.
    struct Script {
        lines: VecDeque<String>,
        prompts: Vec<String>,
        recorded: Vec<String>,
        interrupt_at_end: bool,
    }

    impl Script {
        fn new(lines: &[&str]) -> Self {
            Self {
                lines: lines.iter().map(|s| s.to_string()).collect(),
                prompts: Vec::new(),
                recorded: Vec::new(),
                interrupt_at_end: false,
            }
        }
    }

    impl LineSource for Script {
        fn read_line(&mut self, prompt: &str) -> Result<String> {
            self.prompts.push(prompt.to_string());
            match self.lines.pop_front() {
                Some(line) => Ok(line),
                None if self.interrupt_at_end => Err(WrapError::Interrupted),
                None => Err(WrapError::InputTerminated),
            }
        }

        fn record(&mut self, line: &str) {
            self.recorded.push(line.to_string());
        }
    }

    fn session() -> Session {
        Session::with_dir(
            BaseCommand::new("git", Vec::new()),
            std::env::current_dir().unwrap(),
        )
    }

    fn run(script: &mut Script, session: &mut Session) -> (String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        Repl::default()
            .run(script, session, &mut out, &mut err)
            .unwrap();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_continuation_is_joined() {
        let mut script = Script::new(&["commit -am \\", "\"msg\""]);
        let line = read_logical_line(&mut script, "git> ").unwrap();
        assert_eq!(line, "commit -am \"msg\"");
        assert_eq!(script.prompts, vec!["git> ", CONTINUATION_PROMPT]);
    }

    #[test]
    fn test_continuation_over_three_lines() {
        let mut script = Script::new(&["log\\", "  --oneline \\", "-n 3"]);
        let line = read_logical_line(&mut script, "git> ").unwrap();
        assert_eq!(line, "log --oneline -n 3");
    }

    #[test]
    fn test_eof_during_continuation_terminates() {
        let mut script = Script::new(&["status \\"]);
        let err = read_logical_line(&mut script, "git> ").unwrap_err();
        assert!(matches!(err, WrapError::InputTerminated));
    }

    #[test]
    fn test_continued_line_is_recorded_once() {
        let mut script = Script::new(&[":set msg=a \\", "b", ":exit"]);
        let mut s = session();
        run(&mut script, &mut s);
        assert_eq!(s.vars.get("msg"), Some("a b"));
        assert_eq!(s.history, vec![":set msg=a b", ":exit"]);
        assert_eq!(script.recorded, s.history);
    }

    #[test]
    fn test_empty_lines_are_skipped() {
        let mut script = Script::new(&["", "   ", ":q"]);
        let mut s = session();
        let (out, err) = run(&mut script, &mut s);
        assert_eq!(s.history, vec![":q"]);
        assert!(out.is_empty());
        assert!(err.is_empty());
    }

    #[test]
    fn test_each_exit_alias_stops_the_loop() {
        for exit in [":exit", ":quit", ":q"] {
            let mut script = Script::new(&[exit, ":set never=reached"]);
            let mut s = session();
            let (_, err) = run(&mut script, &mut s);
            assert!(err.is_empty());
            assert_eq!(s.vars.get("never"), None);
            assert_eq!(script.lines.len(), 1);
        }
    }

    #[test]
    fn test_errors_are_reported_and_loop_continues() {
        let mut script = Script::new(&[":set nothing", ":nope", ":cd /no/such/dir", ":set ok=1", ":vars"]);
        let mut s = session();
        let before = s.current_dir.clone();
        let (out, err) = run(&mut script, &mut s);

        let diagnostics: Vec<&str> = err.lines().collect();
        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics.iter().all(|l| l.starts_with("wrap: ")));
        assert!(diagnostics[0].contains("Usage: :set key=value"));
        assert_eq!(s.current_dir, before);
        // :vars output, then the newline printed at end of input
        assert_eq!(out, "ok=1\n\n");
    }

    #[test]
    fn test_interrupt_at_prompt_exits_cleanly() {
        let mut script = Script::new(&[":set a=1"]);
        script.interrupt_at_end = true;
        let mut s = session();
        let (out, err) = run(&mut script, &mut s);
        assert!(out.is_empty());
        assert!(err.is_empty());
        assert_eq!(s.vars.get("a"), Some("1"));
    }

    #[test]
    fn test_prompt_uses_base_name() {
        let mut script = Script::new(&[":q"]);
        let mut s = Session::with_dir(
            BaseCommand::new("/usr/bin/docker", Vec::new()),
            std::env::current_dir().unwrap(),
        );
        run(&mut script, &mut s);
        assert_eq!(script.prompts, vec!["docker> "]);
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_subcommand_does_not_end_session() {
        let mut script = Script::new(&["status", ":set after=yes"]);
        let mut s = Session::with_dir(
            BaseCommand::new("false", Vec::new()),
            std::env::current_dir().unwrap(),
        );
        let (_, err) = run(&mut script, &mut s);
        assert_eq!(err, "wrap: [false] exited with code 1\n");
        assert_eq!(s.vars.get("after"), Some("yes"));
    }

    fn editor_source(history_file: &Path) -> EditorSource {
        let config = Config {
            base: BaseCommand::new("git", Vec::new()),
            history_file: Some(history_file.to_path_buf()),
            history_size: 1000,
            color: false,
            debug: false,
        };
        let helper = WrapHelper::new(Default::default(), std::env::current_dir().unwrap());
        EditorSource::new(&config, helper).unwrap()
    }

    #[test]
    fn test_history_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");

        let mut first = editor_source(&path);
        assert!(first.history_entries().is_empty());
        first.record("status");
        first.record("log --oneline");
        drop(first);

        let mut second = editor_source(&path);
        assert_eq!(second.history_entries(), vec!["status", "log --oneline"]);
        second.record(":set br=main");
        drop(second);

        let third = editor_source(&path);
        assert_eq!(
            third.history_entries(),
            vec!["status", "log --oneline", ":set br=main"]
        );
    }
}
