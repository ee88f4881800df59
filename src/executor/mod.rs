//! Remote execution: the transport seam and the per-host fan-out
//!
//! The pipeline only depends on [`RemoteExecutor`]: run a command on a
//! host, hand back its combined output or a transport failure.
//! [`ProbeExecutor`] launches one task per host, waits for all of them and
//! returns the outcomes in the order the commands were given.

pub mod ssh;

pub use ssh::{SshCommand, SshExecutor};

use crate::{
    error::AppError,
    logging::Logger,
};
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Raw combined output of a command, or why it could not be obtained
pub type ExecOutcome = std::result::Result<String, AppError>;

/// Runs a command on a remote host
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Execute `command` on `hostname`
    ///
    /// Non-zero exit, connection failures and the like come back as
    /// `Err(AppError::Transport(..))`.
    async fn execute(&self, hostname: &str, command: &str) -> ExecOutcome;
}

/// Outcome of one host's command
#[derive(Debug)]
pub struct HostOutcome {
    pub hostname: String,
    pub outcome: ExecOutcome,
    pub elapsed: Duration,
}

/// Fan-out/fan-in driver over a [`RemoteExecutor`]
pub struct ProbeExecutor {
    executor: Arc<dyn RemoteExecutor>,
    deadline: Option<Duration>,
    logger: Logger,
}

impl ProbeExecutor {
    pub fn new(executor: Arc<dyn RemoteExecutor>, deadline: Option<Duration>, logger: Logger) -> Self {
        Self { executor, deadline, logger }
    }

    /// Run every command concurrently, one task per host
    ///
    /// A failing, timed-out or panicking host only affects its own
    /// outcome. Results follow the (sorted) order of `commands`.
    pub async fn execute_all(&self, commands: &BTreeMap<String, String>) -> Vec<HostOutcome> {
        let mut hostnames = Vec::with_capacity(commands.len());
        let mut tasks = Vec::with_capacity(commands.len());

        for (hostname, command) in commands {
            let executor = self.executor.clone();
            let deadline = self.deadline;
            let host = hostname.clone();
            let cmd = command.clone();

            self.logger.trace("Executing precheck command")
                .field("hostname", hostname)
                .field("command_length", command.len())
                .log();

            hostnames.push(hostname.clone());
            tasks.push(tokio::spawn(async move {
                let started = Instant::now();
                let outcome = match deadline {
                    Some(limit) => match timeout(limit, executor.execute(&host, &cmd)).await {
                        Ok(outcome) => outcome,
                        Err(_) => Err(AppError::transport(format!(
                            "timed out after {}s",
                            limit.as_secs()
                        ))),
                    },
                    None => executor.execute(&host, &cmd).await,
                };
                (outcome, started.elapsed())
            }));
        }

        let joined = join_all(tasks).await;

        hostnames
            .into_iter()
            .zip(joined)
            .map(|(hostname, joined)| {
                let (outcome, elapsed) = match joined {
                    Ok(result) => result,
                    Err(e) => (
                        Err(AppError::transport(format!("probe task aborted: {}", e))),
                        Duration::ZERO,
                    ),
                };

                match &outcome {
                    Ok(output) => self.logger.debug("Precheck command finished")
                        .field("hostname", &hostname)
                        .field("output_bytes", output.len())
                        .field("elapsed_ms", elapsed.as_millis() as u64)
                        .log(),
                    Err(e) => self.logger.error("Precheck command execution failed")
                        .field("hostname", &hostname)
                        .error_info(e)
                        .log(),
                }

                HostOutcome { hostname, outcome, elapsed }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Canned responses per host; unknown hosts fail
    struct ScriptedExecutor {
        responses: HashMap<String, ExecOutcome>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl RemoteExecutor for ScriptedExecutor {
        async fn execute(&self, hostname: &str, _command: &str) -> ExecOutcome {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.responses.get(hostname) {
                Some(Ok(out)) => Ok(out.clone()),
                Some(Err(e)) => Err(AppError::transport(e.detail().to_string())),
                None => Err(AppError::transport("unknown host")),
            }
        }
    }

    fn commands(hosts: &[&str]) -> BTreeMap<String, String> {
        hosts.iter().map(|h| (h.to_string(), "true".to_string())).collect()
    }

    #[tokio::test]
    async fn test_outcomes_follow_command_order() {
        let mut responses = HashMap::new();
        responses.insert("b-host".to_string(), Ok("b".to_string()));
        responses.insert("a-host".to_string(), Ok("a".to_string()));
        responses.insert("c-host".to_string(), Err(AppError::transport("exit status: 255")));

        let (logger, _) = Logger::capturing("EXEC");
        let executor = ProbeExecutor::new(
            Arc::new(ScriptedExecutor { responses, delay: None }),
            None,
            logger,
        );

        let outcomes = executor.execute_all(&commands(&["c-host", "a-host", "b-host"])).await;
        let hosts: Vec<&str> = outcomes.iter().map(|o| o.hostname.as_str()).collect();
        assert_eq!(hosts, vec!["a-host", "b-host", "c-host"]);
        assert_eq!(outcomes[0].outcome.as_ref().unwrap(), "a");
        assert!(outcomes[2].outcome.is_err());
    }

    #[tokio::test]
    async fn test_deadline_turns_into_transport_failure() {
        let mut responses = HashMap::new();
        responses.insert("slow".to_string(), Ok("{}".to_string()));

        let (logger, _) = Logger::capturing("EXEC");
        let executor = ProbeExecutor::new(
            Arc::new(ScriptedExecutor { responses, delay: Some(Duration::from_secs(5)) }),
            Some(Duration::from_millis(20)),
            logger,
        );

        let outcomes = executor.execute_all(&commands(&["slow"])).await;
        let err = outcomes[0].outcome.as_ref().unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
        assert!(err.detail().starts_with("timed out"));
    }

    #[tokio::test]
    async fn test_no_commands_no_outcomes() {
        let (logger, _) = Logger::capturing("EXEC");
        let executor = ProbeExecutor::new(
            Arc::new(ScriptedExecutor { responses: HashMap::new(), delay: None }),
            None,
            logger,
        );
        assert!(executor.execute_all(&BTreeMap::new()).await.is_empty());
    }
}
