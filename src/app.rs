//! Main application orchestration and execution

use crate::{
    analyze::BandwidthAnalyzer,
    cli::Command,
    config::{display_config_summary, EnvManager},
    error::{AppError, Result},
    executor::{RemoteExecutor, SshExecutor},
    logging::Logger,
    models::Config,
    output::{DisplayProjector, MarkdownExporter, OutputFormatterFactory},
    probe::Prechecker,
};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Rendered result of one subcommand
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub text: String,
    pub passed: bool,
}

impl CommandOutput {
    pub fn exit_code(&self) -> i32 {
        if self.passed {
            0
        } else {
            1
        }
    }
}

/// Main application struct that coordinates all components
pub struct App {
    config: Config,
    logger: Logger,
}

impl App {
    pub fn new(config: Config) -> Self {
        let logger = Logger::with_config("APP", &config);
        logger.set_session_id(Uuid::new_v4().to_string());
        Self::with_logger(config, logger)
    }

    pub fn with_logger(config: Config, logger: Logger) -> Self {
        Self { config, logger }
    }

    /// Run a subcommand, print its output and return the process exit code
    pub async fn run(&self, command: &Command) -> Result<i32> {
        let name = match command {
            Command::Precheck { .. } => "precheck",
            Command::Analyze { .. } => "analyze",
        };
        self.logger.add_context_field("command", name);

        for warning in EnvManager::validate_current_env() {
            self.logger.warn("Ignoring environment variable").field("reason", warning).log();
        }

        if self.config.debug {
            self.logger.debug("Configuration loaded")
                .field("summary", display_config_summary(&self.config))
                .log();
        }

        let output = match command {
            Command::Precheck { json } => self.precheck(*json).await?,
            Command::Analyze { json, markdown, .. } => self.analyze(*json, markdown.as_deref())?,
        };

        println!("{}", output.text);
        Ok(output.exit_code())
    }

    /// Precheck over ssh
    pub async fn precheck(&self, json: bool) -> Result<CommandOutput> {
        let executor = Arc::new(SshExecutor::new(self.config.ssh.clone()));
        self.precheck_with(executor, json).await
    }

    /// Precheck through any executor
    pub async fn precheck_with(&self, executor: Arc<dyn RemoteExecutor>, json: bool) -> Result<CommandOutput> {
        let prechecker = Prechecker::new(self.config.clone(), executor, &self.logger);
        let summary = prechecker.summarize().await?;
        let passed = summary.check_passed;

        let text = if json {
            serde_json::to_string_pretty(&summary)?
        } else {
            let formatter = OutputFormatterFactory::create_formatter(self.config.enable_color);
            let mut display = DisplayProjector::project(&summary.results);
            display.sort_by_host_and_hca();

            let verdict = if passed {
                formatter.format_success("Precheck passed")
            } else if !summary.all_speeds_same && summary.unhealthy_count == 0 && summary.error_count == 0 {
                formatter.format_error("Precheck failed: link speeds differ across the fleet")
            } else {
                formatter.format_error("Precheck failed")
            };

            format!(
                "{}\n\n{}\n\n{}",
                formatter.format_header("HCA Precheck"),
                formatter.format_precheck(&display),
                verdict
            )
        };

        Ok(CommandOutput { text, passed })
    }

    /// Analyze the report files under the configured directory
    pub fn analyze(&self, json: bool, markdown: Option<&Path>) -> Result<CommandOutput> {
        let analyzer = BandwidthAnalyzer::new(&self.logger);
        let reports_dir = Path::new(&self.config.reports_dir);
        let report = analyzer.analyze_dir(reports_dir, self.config.stream_type)?;

        if let Some(path) = markdown {
            MarkdownExporter::write_to(&report, path)?;
            self.logger.info("Markdown report written")
                .field("path", path.display().to_string())
                .log();
        }

        let text = if json {
            serde_json::to_string_pretty(&report)?
        } else {
            let formatter = OutputFormatterFactory::create_formatter(self.config.enable_color);
            let title = format!(
                "Bandwidth Analysis ({}, nominal {} Gbps)",
                self.config.stream_type, self.config.speed
            );
            let mut text = format!(
                "{}\n\n{}",
                formatter.format_header(&title),
                formatter.format_bandwidth_report(&report)
            );
            if !report.all_ok() {
                text.push_str("\n\n");
                text.push_str(&formatter.format_warning("Some devices deviate from the theoretical bandwidth"));
            }
            text
        };

        // A report that builds is a success, deviations are informational
        Ok(CommandOutput { text, passed: true })
    }
}

/// Map a top-level failure to console text and an exit code
pub fn report_error(error: &AppError, use_color: bool) -> (String, i32) {
    (error.format_for_console(use_color), error.exit_code())
}
