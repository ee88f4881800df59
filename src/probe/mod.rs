//! Fleet precheck pipeline
//!
//! Builds one command per host, fans it out through a
//! [`RemoteExecutor`], parses each host's output and flattens the result
//! into one [`NormalizedDeviceRecord`] per adapter.

pub mod command;
pub mod health;
pub mod parser;

pub use command::CommandBuilder;
pub use health::{clean_state, is_healthy};
pub use parser::ResultParser;

use crate::{
    error::{AppError, Result},
    executor::{ProbeExecutor, RemoteExecutor},
    logging::Logger,
    models::{Config, NormalizedDeviceRecord, RawHostProbe},
    stats::{FleetAggregator, PrecheckSummary},
};
use std::sync::Arc;

/// Runs the precheck against every configured host
pub struct Prechecker {
    config: Config,
    executor: Arc<dyn RemoteExecutor>,
    logger: Logger,
}

impl Prechecker {
    pub fn new(config: Config, executor: Arc<dyn RemoteExecutor>, logger: &Logger) -> Self {
        Self {
            config,
            executor,
            logger: logger.child("PRECHECK"),
        }
    }

    /// Probe every host and return the flattened records
    ///
    /// Host failures end up on the records. The only error is a
    /// configuration without any host.
    pub async fn check(&self) -> Result<Vec<NormalizedDeviceRecord>> {
        let targets = CommandBuilder::host_targets(&self.config);
        if targets.is_empty() {
            return Err(AppError::no_targets());
        }

        let operation = self.logger.start_operation("precheck");
        let commands = CommandBuilder::build_all(&targets);

        self.logger.info("Starting precheck")
            .correlation_id(&operation)
            .field("hosts", commands.len())
            .field("timeout_seconds", self.config.probe_timeout_seconds)
            .log();

        let executor = ProbeExecutor::new(
            self.executor.clone(),
            self.config.probe_timeout(),
            self.logger.child("EXECUTOR"),
        );
        let outcomes = executor.execute_all(&commands).await;

        let parser = ResultParser::new(self.logger.child("PARSER"));
        let probes: Vec<RawHostProbe> = outcomes
            .into_iter()
            .map(|host| parser.parse(&host.hostname, host.outcome))
            .collect();

        let records = normalize(&probes);
        let failed_hosts = probes.iter().filter(|p| p.has_error()).count();
        self.logger.end_operation(&operation, "precheck", failed_hosts == 0);

        Ok(records)
    }

    /// Probe every host and fold the records into a fleet summary
    pub async fn summarize(&self) -> Result<PrecheckSummary> {
        let records = self.check().await?;
        if records.is_empty() {
            return Err(AppError::config("No HCAs configured in config file"));
        }
        Ok(FleetAggregator::aggregate(records))
    }
}

/// Flatten host probes into per-adapter records
///
/// A host with an error and no devices yields a single synthetic record;
/// otherwise each device yields one record carrying the host's serial and
/// error.
pub fn normalize(probes: &[RawHostProbe]) -> Vec<NormalizedDeviceRecord> {
    let mut records = Vec::new();

    for probe in probes {
        if let (Some(error), true) = (&probe.error, probe.devices.is_empty()) {
            records.push(NormalizedDeviceRecord::host_error(&probe.hostname, error));
            continue;
        }

        for device in &probe.devices {
            let phys_state = device.phys_state.as_str();
            let state = device.state.as_str();

            records.push(NormalizedDeviceRecord {
                hostname: probe.hostname.clone(),
                hca: device.name.clone(),
                phys_state: clean_state(phys_state),
                state: clean_state(state),
                speed: device.speed.to_string(),
                fw_ver: device.fw_ver.to_string(),
                board_id: device.board_id.to_string(),
                is_healthy: is_healthy(phys_state, state),
                serial_number: probe.serial.clone(),
                error: probe.error.clone(),
            });
        }
    }

    records
}
