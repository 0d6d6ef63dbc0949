//! External process execution.
//!
//! Every stage that talks to `git` or `npm` goes through [`run`], which
//! captures both output streams and turns a non-zero exit into a
//! [`CommandError`] carrying the exit code.

use std::path::Path;
use std::process::Command;
use thiserror::Error;

/// Captured output of a command that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Standard output, or `None` when the command printed nothing.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        if self.stdout.trim().is_empty() {
            None
        } else {
            Some(&self.stdout)
        }
    }

    /// True when the command wrote anything at all, on either stream.
    ///
    /// Git reports some confirmations (`checkout -b`) on stderr.
    #[must_use]
    pub fn has_any_output(&self) -> bool {
        !self.stdout.trim().is_empty() || !self.stderr.trim().is_empty()
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unable to execute `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with code {}", display_code(.code))]
    Exit {
        command: String,
        /// `None` when the process was terminated by a signal.
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

impl CommandError {
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandError::Exit { code, .. } => *code,
            CommandError::Spawn { .. } => None,
        }
    }

    #[must_use]
    pub fn stderr(&self) -> &str {
        match self {
            CommandError::Exit { stderr, .. } => stderr,
            CommandError::Spawn { .. } => "",
        }
    }
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "<signal>".to_string(), |c| c.to_string())
}

/// Renders a program and its arguments the way a user would type them.
#[must_use]
pub fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs `program` with `args` inside `dir`, inheriting the environment.
pub fn run(program: &str, args: &[&str], dir: &Path) -> Result<CommandOutput, CommandError> {
    let output = Command::new(program)
        .current_dir(dir)
        .args(args)
        .output()
        .map_err(|source| CommandError::Spawn {
            command: command_line(program, args),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if output.status.success() {
        Ok(CommandOutput { stdout, stderr })
    } else {
        Err(CommandError::Exit {
            command: command_line(program, args),
            code: output.status.code(),
            stdout,
            stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_treats_blank_stdout_as_no_output() {
        let output = CommandOutput {
            stdout: " \n".to_string(),
            stderr: "Switched to a new branch 'x'\n".to_string(),
        };
        assert_eq!(output.text(), None);
        assert!(output.has_any_output());
        assert!(!CommandOutput::default().has_any_output());
    }

    #[test]
    fn test_run_rejects_with_exit_code_not_stdout() {
        let dir = std::env::temp_dir();
        let err = run("sh", &["-c", "echo partial; exit 3"], &dir).unwrap_err();
        assert_eq!(err.exit_code(), Some(3));
        assert_eq!(err.to_string(), "`sh -c echo partial; exit 3` exited with code 3");
    }

    #[test]
    fn test_run_reports_spawn_failure() {
        let dir = std::env::temp_dir();
        let err = run("definitely-not-a-real-binary", &[], &dir).unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
        assert_eq!(err.exit_code(), None);
    }

    #[test]
    fn test_command_line_joins_arguments() {
        assert_eq!(
            command_line("git", &["commit", "-m", "msg"]),
            "git commit -m msg"
        );
    }
}
