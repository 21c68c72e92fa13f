//! External command execution.
//!
//! Packagers reach `helm` and `docker` only through [`CommandRunner`], so
//! tests can script tool output without the binaries installed.

use crate::error::{PackError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Timeout for a single external command (30 minutes).
/// Image builds and exports can take a long time.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(1800);

/// Captured output of a finished command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
    /// Exit code, `None` when killed by a signal.
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Stdout followed by stderr, for tools that report on either stream.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Runs external programs.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `argv[0]` with the remaining arguments, writing `input` to its
    /// stdin when given, and waits for it.
    ///
    /// A non-zero exit status is an error carrying stderr.
    async fn execute_with_input(
        &self,
        argv: &[String],
        input: Option<&[u8]>,
    ) -> Result<CommandOutput>;

    /// Runs a command with an empty stdin.
    async fn execute(&self, argv: &[String]) -> Result<CommandOutput> {
        self.execute_with_input(argv, None).await
    }
}

/// Label used in logs and errors: program plus subcommand, never secrets.
pub fn command_label(argv: &[String]) -> String {
    argv.iter().take(2).cloned().collect::<Vec<_>>().join(" ")
}

/// [`CommandRunner`] backed by real subprocesses.
#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    timeout: Duration,
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self {
            timeout: COMMAND_TIMEOUT,
        }
    }
}

impl SystemCommandRunner {
    /// Creates a runner with the default timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the per-command timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn execute_with_input(
        &self,
        argv: &[String],
        input: Option<&[u8]>,
    ) -> Result<CommandOutput> {
        let label = command_label(argv);
        let (program, args) = argv.split_first().ok_or_else(|| PackError::Command {
            command: String::new(),
            reason: "empty command line".to_string(),
        })?;

        let program_path = which::which(program).map_err(|e| PackError::Command {
            command: label.clone(),
            reason: format!("{} not found in PATH: {}", program, e),
        })?;
        log::debug!("Running {} ({})", label, program_path.display());

        let mut child = Command::new(&program_path)
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PackError::Command {
                command: label.clone(),
                reason: e.to_string(),
            })?;

        if let Some(input) = input
            && let Some(mut stdin) = child.stdin.take()
        {
            stdin
                .write_all(input)
                .await
                .map_err(|e| PackError::Command {
                    command: label.clone(),
                    reason: format!("writing stdin: {}", e),
                })?;
            // Dropping the handle closes the pipe
        }

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(PackError::Command {
                    command: label,
                    reason: e.to_string(),
                });
            }
            // Child is dropped with the future and killed via kill_on_drop
            Err(_elapsed) => {
                return Err(PackError::Command {
                    command: label,
                    reason: format!("timed out after {} minutes", self.timeout.as_secs() / 60),
                });
            }
        };

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        };

        if !output.status.success() {
            return Err(PackError::Command {
                command: label,
                reason: format!(
                    "exit code {}: {}",
                    result.code.unwrap_or(-1),
                    result.stderr.trim()
                ),
            });
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn label_omits_arguments_after_subcommand() {
        let line = argv(&["docker", "login", "--username", "robot"]);
        assert_eq!(command_label(&line), "docker login");
    }

    #[test]
    fn combined_appends_stderr() {
        let output = CommandOutput {
            stdout: "out".into(),
            stderr: "err".into(),
            code: Some(0),
        };
        assert_eq!(output.combined(), "out\nerr");
    }

    #[tokio::test]
    async fn empty_command_line_is_rejected() {
        let err = SystemCommandRunner::new().execute(&[]).await.unwrap_err();
        assert!(matches!(err, PackError::Command { .. }));
    }

    #[tokio::test]
    async fn missing_program_is_reported() {
        let err = SystemCommandRunner::new()
            .execute(&argv(&["release-pack-no-such-tool", "version"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found in PATH"), "{err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout_and_fails_on_non_zero_exit() {
        let runner = SystemCommandRunner::new();
        let ok = runner
            .execute(&argv(&["sh", "-c", "echo packaged"]))
            .await
            .unwrap();
        assert_eq!(ok.stdout.trim(), "packaged");
        assert_eq!(ok.code, Some(0));

        let err = runner
            .execute(&argv(&["sh", "-c", "echo broken >&2; exit 3"]))
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("exit code 3"), "{message}");
        assert!(message.contains("broken"), "{message}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn input_is_written_to_stdin() {
        let output = SystemCommandRunner::new()
            .execute_with_input(&argv(&["sh", "-c", "cat"]), Some(b"s3cret"))
            .await
            .unwrap();
        assert_eq!(output.stdout, "s3cret");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_commands_time_out() {
        let runner = SystemCommandRunner::new().with_timeout(Duration::from_millis(100));
        let err = runner
            .execute(&argv(&["sh", "-c", "sleep 5"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"), "{err}");
    }
}
