//! `ssh`-backed remote executor

use super::{ExecOutcome, RemoteExecutor};
use crate::{error::AppError, models::SshSettings};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Argument list for one `ssh` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshCommand {
    args: Vec<String>,
}

impl SshCommand {
    /// Build the arguments for running `command` on `hostname`
    pub fn new(settings: &SshSettings, hostname: &str, command: &str) -> Self {
        let mut args = vec![
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            "LogLevel=ERROR".to_string(),
        ];

        if let Some(key) = &settings.private_key {
            args.push("-i".to_string());
            args.push(key.clone());
        }

        let target = match &settings.user {
            Some(user) => format!("{}@{}", user, hostname),
            None => hostname.to_string(),
        };
        args.push(target);
        args.push(command.to_string());

        Self { args }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Runs commands through the local `ssh` client
#[derive(Debug, Clone, Default)]
pub struct SshExecutor {
    settings: SshSettings,
    program: String,
}

impl SshExecutor {
    pub fn new(settings: SshSettings) -> Self {
        Self {
            settings,
            program: "ssh".to_string(),
        }
    }

    /// Use another binary in place of `ssh` (wrappers, test doubles)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    async fn execute(&self, hostname: &str, command: &str) -> ExecOutcome {
        let ssh = SshCommand::new(&self.settings, hostname, command);

        let output = Command::new(&self.program)
            .args(ssh.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AppError::transport(format!("failed to start {}: {}", self.program, e)))?;

        // Combined output, stdout first
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            return Err(AppError::transport(if stderr.is_empty() {
                output.status.to_string()
            } else {
                format!("{}: {}", output.status, stderr)
            }));
        }

        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_host_arguments() {
        let cmd = SshCommand::new(&SshSettings::default(), "node-01", "echo hi");
        assert_eq!(
            cmd.args(),
            ["-o", "StrictHostKeyChecking=no", "-o", "LogLevel=ERROR", "node-01", "echo hi"]
        );
    }

    #[test]
    fn test_user_and_key_arguments() {
        let settings = SshSettings {
            user: Some("root".to_string()),
            private_key: Some("/root/.ssh/id_ed25519".to_string()),
        };
        let cmd = SshCommand::new(&settings, "node-02", "true");
        let args = cmd.args();
        assert_eq!(&args[4..6], ["-i", "/root/.ssh/id_ed25519"]);
        assert_eq!(args[6], "root@node-02");
        assert_eq!(args.last().map(String::as_str), Some("true"));
    }

    #[test]
    fn test_missing_program_is_transport_error() {
        let executor = SshExecutor::new(SshSettings::default())
            .with_program("/nonexistent/fpc-ssh-binary");
        let err = tokio_test::block_on(executor.execute("node-01", "true")).unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
        assert!(err.detail().contains("failed to start"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_transport_error() {
        // `false` ignores its arguments and exits 1
        let executor = SshExecutor::new(SshSettings::default()).with_program("false");
        let err = executor.execute("node-01", "true").await.unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success_returns_output() {
        // `echo` prints the ssh arguments, the last one is the command
        let executor = SshExecutor::new(SshSettings::default()).with_program("echo");
        let out = executor.execute("node-01", "payload").await.unwrap();
        assert!(out.trim_end().ends_with("node-01 payload"));
    }
}
