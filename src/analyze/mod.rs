//! Bandwidth analysis of collected benchmark reports
//!
//! The theoretical share of each client is the total bandwidth measured
//! on the servers divided by the number of distinct client hosts. Every
//! client and server device is compared against that share.

pub mod reports;

pub use reports::{CollectedSamples, ReportCollector, ReportFileName};

use crate::{
    defaults::DELTA_THRESHOLD_PERCENT,
    error::{AppError, Result},
    logging::Logger,
    models::{
        ClientDeviceData, P2PDeviceData, P2PSummary, ReportData, SampleGroup, ServerDeviceData,
    },
    types::{Role, StreamType},
};
use std::collections::BTreeMap;
use std::path::Path;

pub const STATUS_OK: &str = "OK";
pub const STATUS_NOT_OK: &str = "NOT OK";

/// Deviation of a measurement from its theoretical value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deviation {
    pub delta: f64,
    pub delta_percent: f64,
}

impl Deviation {
    /// Percent is 0 when there is no positive theoretical value to compare with
    pub fn between(actual: f64, theoretical: f64) -> Self {
        let delta = actual - theoretical;
        let delta_percent = if theoretical > 0.0 {
            (delta / theoretical) * 100.0
        } else {
            0.0
        };
        Self { delta, delta_percent }
    }

    pub fn status(&self) -> &'static str {
        if self.delta_percent.abs() > DELTA_THRESHOLD_PERCENT {
            STATUS_NOT_OK
        } else {
            STATUS_OK
        }
    }
}

/// Builds [`ReportData`] from client/server sample groups
pub struct BandwidthAnalyzer {
    logger: Logger,
}

impl BandwidthAnalyzer {
    pub fn new(logger: &Logger) -> Self {
        Self {
            logger: logger.child("ANALYZE"),
        }
    }

    /// Collect the reports under `dir` and analyze them
    ///
    /// P2P runs read only role-less `report_<host>_<device>_<port>.json`
    /// files; the other stream types read only `c`/`s` reports. A directory
    /// whose every report was unreadable is an analysis error.
    pub fn analyze_dir(&self, dir: &Path, stream_type: StreamType) -> Result<ReportData> {
        let samples = ReportCollector::new(&self.logger)?.collect(dir)?;
        if samples.is_empty() {
            if samples.skipped > 0 {
                return Err(AppError::analysis(format!(
                    "no usable report files in {}: {} skipped",
                    dir.display(),
                    samples.skipped
                )));
            }
            self.logger.warn("No report files found")
                .field("dir", dir.display().to_string())
                .log();
        }

        if stream_type.uses_theoretical_bandwidth() {
            Ok(self.analyze(&samples.client, &samples.server, stream_type))
        } else {
            Ok(self.analyze_p2p(&[&samples.peer], stream_type))
        }
    }

    pub fn analyze(&self, client: &SampleGroup, server: &SampleGroup, stream_type: StreamType) -> ReportData {
        if !stream_type.uses_theoretical_bandwidth() {
            return self.analyze_p2p(&[client, server], stream_type);
        }

        let mut report = ReportData::empty(stream_type);
        report.total_server_bw = total_bandwidth(server);
        report.client_count = client.len();
        report.theoretical_bw_per_client = if report.client_count > 0 {
            Some(report.total_server_bw / report.client_count as f64)
        } else {
            None
        };

        let theoretical = report.theoretical_bw_per_client.unwrap_or(0.0);

        report.client_data = client
            .iter()
            .map(|(hostname, devices)| {
                let rows = devices
                    .iter()
                    .map(|(device, sample)| {
                        let deviation = Deviation::between(sample.bw_sum, theoretical);
                        let data = ClientDeviceData {
                            hostname: hostname.clone(),
                            device: device.clone(),
                            actual_bw: sample.bw_sum,
                            theoretical_bw: theoretical,
                            delta: deviation.delta,
                            delta_percent: deviation.delta_percent,
                            status: deviation.status().to_string(),
                        };
                        (device.clone(), data)
                    })
                    .collect();
                (hostname.clone(), rows)
            })
            .collect();

        report.server_data = server
            .iter()
            .map(|(hostname, devices)| {
                let rows = devices
                    .iter()
                    .map(|(device, sample)| {
                        let deviation = Deviation::between(sample.bw_sum, theoretical);
                        let data = ServerDeviceData {
                            hostname: hostname.clone(),
                            device: device.clone(),
                            rx_bw: sample.bw_sum,
                            theoretical_bw: theoretical,
                            delta: deviation.delta,
                            delta_percent: deviation.delta_percent,
                            status: deviation.status().to_string(),
                        };
                        (device.clone(), data)
                    })
                    .collect();
                (hostname.clone(), rows)
            })
            .collect();

        self.logger.info("Bandwidth analysis complete")
            .field("stream_type", stream_type.as_str())
            .field("total_server_bw", report.total_server_bw)
            .field("client_count", report.client_count)
            .field("all_ok", report.all_ok())
            .log();

        report
    }

    /// Point-to-point streams: per-device averages, no theoretical share
    fn analyze_p2p(&self, groups: &[&SampleGroup], stream_type: StreamType) -> ReportData {
        let mut data: BTreeMap<String, BTreeMap<String, P2PDeviceData>> = BTreeMap::new();
        let mut total_server_bw = 0.0;

        for group in groups {
            for (hostname, devices) in group.iter() {
                for (device, sample) in devices {
                    if sample.role == Role::Server {
                        total_server_bw += sample.bw_sum;
                    }
                    let entry = data
                        .entry(hostname.clone())
                        .or_default()
                        .entry(device.clone())
                        .or_insert_with(|| P2PDeviceData {
                            hostname: hostname.clone(),
                            device: device.clone(),
                            avg_speed: 0.0,
                            count: 0,
                        });
                    // A device seen in both roles averages over all its samples
                    let total = entry.avg_speed * entry.count as f64 + sample.bw_sum;
                    entry.count += sample.count;
                    entry.avg_speed = if entry.count > 0 { total / entry.count as f64 } else { 0.0 };
                }
            }
        }

        let averages: Vec<f64> = data.values().flat_map(|d| d.values()).map(|d| d.avg_speed).collect();
        let summary = P2PSummary {
            total_pairs: averages.len(),
            avg_speed: if averages.is_empty() {
                0.0
            } else {
                averages.iter().sum::<f64>() / averages.len() as f64
            },
        };

        self.logger.info("P2P analysis complete")
            .field("pairs", summary.total_pairs)
            .field("avg_speed", summary.avg_speed)
            .log();

        let mut report = ReportData::empty(stream_type);
        report.total_server_bw = total_server_bw;
        report.p2p_data = Some(data);
        report.p2p_summary = Some(summary);
        report
    }
}

fn total_bandwidth(group: &SampleGroup) -> f64 {
    group.values().flat_map(|d| d.values()).map(|s| s.bw_sum).sum()
}
