//! Shell command execution for `command` rules.
//!
//! The executor only depends on the [`CommandRunner`] trait so tests can
//! substitute canned output for real processes. [`ShellRunner`] is the
//! production implementation: `sh -c` on Unix and `cmd /C` on Windows. There
//! is no timeout, a command that hangs blocks generation.

use std::process::{Command, Stdio};

use crate::core::EnvgenError;

/// Captured output of a successful command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

/// Runs a rendered command line and returns its output
pub trait CommandRunner {
    /// Run `command` to completion
    ///
    /// # Errors
    ///
    /// Returns [`EnvgenError::CommandExecution`] when the command cannot be
    /// started or exits with a non-zero status.
    fn run(&self, command: &str) -> Result<CommandOutput, EnvgenError>;
}

/// Runs commands through the platform shell
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl ShellRunner {
    fn shell_command(command: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", command]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", command]);
            cmd
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> Result<CommandOutput, EnvgenError> {
        tracing::debug!(target: "command", "Executing command: {command}");

        let output = Self::shell_command(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| EnvgenError::CommandExecution {
                command: command.to_string(),
                code: None,
                stderr: e.to_string(),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            tracing::debug!(
                target: "command",
                "Command failed with status {:?}: {}",
                output.status.code(),
                stderr.trim()
            );
            return Err(EnvgenError::CommandExecution {
                command: command.to_string(),
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|e| EnvgenError::CommandExecution {
            command: command.to_string(),
            code: output.status.code(),
            stderr: format!("stdout is not valid UTF-8: {}", e.utf8_error()),
        })?;

        tracing::trace!(target: "command", "Command produced {} bytes of output", stdout.len());
        Ok(CommandOutput {
            stdout,
            stderr,
        })
    }
}
