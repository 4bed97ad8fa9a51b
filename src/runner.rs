//! External process execution
//!
//! Every tool this installer depends on (xcode-select, brew, node, npm) is
//! reached through [`CommandRunner`], so the orchestration logic can be driven
//! by a scripted host in tests.

use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{InstallerError, Result};

/// Where a child's stdout/stderr go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Collected into [`CommandOutput`]
    #[default]
    Captured,
    /// Written straight to the operator's terminal (password prompts, installer logs)
    Inherited,
}

/// A single external command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub envs: Vec<(String, String)>,
    pub output: OutputMode,
}

impl CommandSpec {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            working_dir: None,
            envs: Vec::new(),
            output: OutputMode::Captured,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn inherit_output(mut self) -> Self {
        self.output = OutputMode::Inherited;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Result of a command that was started
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Exit code, `None` when the child was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Short human-readable reason for a failed command: exit code plus the
    /// last lines of stderr (or stdout when stderr is empty).
    pub fn failure_reason(&self) -> String {
        let status = match self.exit_code {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by signal".to_string(),
        };
        let text = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let tail = tail_lines(text, 10);
        if tail.is_empty() {
            status
        } else {
            format!("{}: {}", status, tail)
        }
    }
}

fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

/// Abstract command execution.
///
/// A non-zero exit is never an error; callers inspect [`CommandOutput`].
/// `Err` is reserved for commands that could not be started:
/// [`InstallerError::CommandNotFound`] when the executable does not exist,
/// [`InstallerError::CommandSpawnFailed`] for anything else.
pub trait CommandRunner {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput>;
}

/// Real command runner backed by `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        debug!(command = %command, cwd = ?command.working_dir, "spawning");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &command.envs {
            cmd.env(key, value);
        }

        let result = match command.output {
            OutputMode::Captured => cmd.stdin(Stdio::null()).output().map(|out| CommandOutput {
                exit_code: out.status.code(),
                stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
            }),
            OutputMode::Inherited => cmd.status().map(|status| CommandOutput {
                exit_code: status.code(),
                ..CommandOutput::default()
            }),
        };

        match result {
            Ok(output) => {
                debug!(command = %command, exit_code = ?output.exit_code, "finished");
                Ok(output)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(InstallerError::CommandNotFound {
                program: command.program.clone(),
            }),
            Err(e) => Err(InstallerError::CommandSpawnFailed {
                program: command.program.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_executable_is_distinct() {
        let result = SystemRunner.run(&CommandSpec::new(
            "osc-installer-definitely-not-a-command",
            ["--version"],
        ));
        assert!(matches!(
            result,
            Err(InstallerError::CommandNotFound { ref program })
                if program == "osc-installer-definitely-not-a-command"
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_not_an_error() {
        let output = SystemRunner
            .run(&CommandSpec::new("sh", ["-c", "echo oops >&2; exit 3"]))
            .unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[cfg(unix)]
    #[test]
    fn test_working_dir_and_env_are_applied() {
        let temp = tempfile::TempDir::new().unwrap();
        let output = SystemRunner
            .run(
                &CommandSpec::new("sh", ["-c", "pwd; echo $OSC_TEST_VALUE"])
                    .in_dir(temp.path())
                    .env("OSC_TEST_VALUE", "arm64"),
            )
            .unwrap();
        assert!(output.success());
        let lines: Vec<&str> = output.stdout.lines().collect();
        let expected = temp.path().canonicalize().unwrap();
        assert_eq!(
            std::path::Path::new(lines[0]).canonicalize().unwrap(),
            expected
        );
        assert_eq!(lines[1], "arm64");
    }

    #[test]
    fn test_failure_reason_uses_stderr_tail() {
        let output = CommandOutput {
            exit_code: Some(1),
            stdout: "lots of progress\n".to_string(),
            stderr: "npm ERR! one\nnpm ERR! two\n".to_string(),
        };
        assert_eq!(
            output.failure_reason(),
            "exited with status 1: npm ERR! one\nnpm ERR! two"
        );
    }

    #[test]
    fn test_failure_reason_without_output() {
        let output = CommandOutput {
            exit_code: None,
            ..CommandOutput::default()
        };
        assert_eq!(output.failure_reason(), "terminated by signal");
    }

    #[test]
    fn test_command_display() {
        let cmd = CommandSpec::new("npm", ["run", "package"]);
        assert_eq!(cmd.to_string(), "npm run package");
    }
}
