use crate::error::{Result, WrapError};
use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::ExitStatus;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// A child process with inherited standard streams.
///
/// Used both for pass-through lines (`<base> <args> <words>`) and for shell
/// escapes (`sh -c <line>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    name: OsString,
    args: Vec<OsString>,
    // What diagnostics call this command, e.g. `git` or `shell`.
    label: String,
}

impl ExternalCommand {
    pub fn new(name: impl Into<OsString>, args: Vec<OsString>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args,
            label: label.into(),
        }
    }

    /// A command line handed to the platform shell.
    pub fn shell(line: &str) -> Self {
        #[cfg(unix)]
        let (shell, flag) = ("sh", "-c");
        #[cfg(not(unix))]
        let (shell, flag) = ("cmd", "/C");
        Self::new(shell, vec![flag.into(), line.into()], "shell")
    }

    pub fn program(&self) -> &OsString {
        &self.name
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Run to completion in `cwd` and return the exit code.
    ///
    /// A missing program maps to [`WrapError::NotFound`]; a child killed by a
    /// signal reports `128 + signal` like a POSIX shell does.
    pub fn run(&self, cwd: &Path) -> Result<ExitCode> {
        let mut child = std::process::Command::new(&self.name)
            .args(&self.args)
            .current_dir(cwd)
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    WrapError::NotFound(format!("command not found: {}", self.name.to_string_lossy()))
                }
                _ => WrapError::io(format!("failed to spawn {}", self.label), e),
            })?;
        let exit_status = child
            .wait()
            .map_err(|e| WrapError::io(format!("failed to wait for {}", self.label), e))?;
        let code = match exit_status.code() {
            Some(x) => x,
            None => terminated_by_signal(exit_status),
        };
        tracing::debug!(command = %self.label, code, "child exited");
        Ok(code)
    }

    /// Like [`ExternalCommand::run`], but a non-zero exit becomes
    /// [`WrapError::Subprocess`].
    pub fn run_checked(&self, cwd: &Path) -> Result<()> {
        match self.run(cwd)? {
            0 => Ok(()),
            code => Err(WrapError::Subprocess {
                program: self.label.clone(),
                code,
            }),
        }
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(ExternalCommand::new("true", Vec::new(), "true").run(&cwd).unwrap(), 0);
        assert_eq!(ExternalCommand::new("false", Vec::new(), "false").run(&cwd).unwrap(), 1);
        assert_eq!(ExternalCommand::shell("exit 7").run(&cwd).unwrap(), 7);
    }

    #[test]
    fn test_run_checked_reports_label() {
        let cwd = std::env::current_dir().unwrap();
        let err = ExternalCommand::shell("exit 3").run_checked(&cwd).unwrap_err();
        match err {
            WrapError::Subprocess { program, code } => {
                assert_eq!(program, "shell");
                assert_eq!(code, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_program_is_not_found() {
        let cwd = std::env::current_dir().unwrap();
        let cmd = ExternalCommand::new("wrap-test-no-such-program", Vec::new(), "x");
        assert!(matches!(cmd.run(&cwd), Err(WrapError::NotFound(_))));
    }

    #[test]
    fn test_killed_by_signal() {
        let cwd = std::env::current_dir().unwrap();
        let code = ExternalCommand::shell("kill -9 $$").run(&cwd).unwrap();
        assert_eq!(code, 128 + 9);
    }

    #[test]
    fn test_runs_in_given_dir() {
        let dir = tempfile::tempdir().unwrap();
        ExternalCommand::shell("touch created_here")
            .run_checked(dir.path())
            .unwrap();
        assert!(dir.path().join("created_here").exists());
    }
}
