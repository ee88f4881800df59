//! Collection of per-stream report files into bandwidth samples

use crate::{
    error::{AppError, ErrorContext, Result},
    logging::Logger,
    models::{record_sample, SampleGroup},
    types::Role,
};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// `report_<c|s>_<host>_<device>_<port>.json`; the device may contain `_`
const REPORT_FILE_PATTERN: &str = r"^report_(c|s)_([^_]+)_(.+)_(\d+)\.json$";

/// Point-to-point runs drop the role: `report_<host>_<device>_<port>.json`
const PEER_REPORT_FILE_PATTERN: &str = r"^report_([^_]+)_(.+)_(\d+)\.json$";

/// Only the measured average matters; `test_info` and the rest are ignored
#[derive(Debug, Deserialize)]
struct ReportFile {
    results: ReportResults,
}

#[derive(Debug, Deserialize)]
struct ReportResults {
    #[serde(rename = "BW_average")]
    bw_average: f64,
}

/// Identity of a report file, taken from its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFileName {
    pub role: Role,
    pub hostname: String,
    pub device: String,
    pub port: u16,
}

/// Samples gathered from a reports directory
#[derive(Debug, Clone, Default)]
pub struct CollectedSamples {
    pub client: SampleGroup,
    pub server: SampleGroup,
    /// Role-less point-to-point reports
    pub peer: SampleGroup,
    /// Files that matched the naming scheme but could not be used
    pub skipped: usize,
}

impl CollectedSamples {
    pub fn is_empty(&self) -> bool {
        self.client.is_empty() && self.server.is_empty() && self.peer.is_empty()
    }
}

/// Walks a reports directory and folds every report into samples
pub struct ReportCollector {
    pattern: Regex,
    peer_pattern: Regex,
    logger: Logger,
}

impl ReportCollector {
    pub fn new(logger: &Logger) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(REPORT_FILE_PATTERN)?,
            peer_pattern: Regex::new(PEER_REPORT_FILE_PATTERN)?,
            logger: logger.child("COLLECTOR"),
        })
    }

    /// Split a report file name into role, host, device and port
    ///
    /// Names carrying a `c`/`s` role win over the role-less P2P form.
    pub fn parse_file_name(&self, name: &str) -> Option<ReportFileName> {
        if let Some(caps) = self.pattern.captures(name) {
            let role = match &caps[1] {
                "c" => Role::Client,
                _ => Role::Server,
            };
            return Some(ReportFileName {
                role,
                hostname: caps[2].to_string(),
                device: caps[3].to_string(),
                port: caps[4].parse().ok()?,
            });
        }

        let caps = self.peer_pattern.captures(name)?;
        Some(ReportFileName {
            role: Role::Peer,
            hostname: caps[1].to_string(),
            device: caps[2].to_string(),
            port: caps[3].parse().ok()?,
        })
    }

    /// Collect every report under `dir`, recursing into subdirectories
    ///
    /// A missing directory is an error; unreadable or malformed files are
    /// logged and skipped.
    pub fn collect(&self, dir: &Path) -> Result<CollectedSamples> {
        if !dir.is_dir() {
            return Err(AppError::io(format!("reports directory not found: {}", dir.display())));
        }

        let mut samples = CollectedSamples::default();
        self.walk(dir, &mut samples)?;

        self.logger.info("Collected report files")
            .field("dir", dir.display().to_string())
            .field("client_hosts", samples.client.len())
            .field("server_hosts", samples.server.len())
            .field("peer_hosts", samples.peer.len())
            .field("skipped", samples.skipped)
            .log();

        Ok(samples)
    }

    fn walk(&self, dir: &Path, samples: &mut CollectedSamples) -> Result<()> {
        let mut entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read reports directory {}", dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .collect::<Vec<_>>();
        entries.sort();

        for path in entries {
            if path.is_dir() {
                self.walk(&path, samples)?;
                continue;
            }

            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(".json") {
                continue;
            }
            let Some(file) = self.parse_file_name(name) else {
                self.logger.debug("Ignoring file outside the report naming scheme")
                    .field("path", path.display().to_string())
                    .log();
                continue;
            };

            match read_bandwidth(&path) {
                Ok(bandwidth) => {
                    let group = match file.role {
                        Role::Client => &mut samples.client,
                        Role::Server => &mut samples.server,
                        Role::Peer => &mut samples.peer,
                    };
                    record_sample(group, &file.hostname, &file.device, file.role, bandwidth);
                }
                Err(e) => {
                    samples.skipped += 1;
                    self.logger.warn("Skipping unreadable report file")
                        .field("path", path.display().to_string())
                        .error_info(&e)
                        .log();
                }
            }
        }

        Ok(())
    }
}

fn read_bandwidth(path: &Path) -> Result<f64> {
    let content = fs::read_to_string(path)?;
    let report: ReportFile = serde_json::from_str(&content)?;
    Ok(report.results.bw_average)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn collector() -> ReportCollector {
        let (logger, _) = Logger::capturing("TEST");
        ReportCollector::new(&logger).unwrap()
    }

    fn report(bw: f64) -> String {
        format!(
            r#"{{"test_info":{{"test":"ib_write_bw","Device":"mlx5_0"}},"results":{{"BW_average":{}}}}}"#,
            bw
        )
    }

    #[test]
    fn test_parse_file_name() {
        let parsed = collector().parse_file_name("report_c_cli-01_mlx5_0_20000.json").unwrap();
        assert_eq!(parsed.role, Role::Client);
        assert_eq!(parsed.hostname, "cli-01");
        assert_eq!(parsed.device, "mlx5_0");
        assert_eq!(parsed.port, 20000);

        let server = collector().parse_file_name("report_s_srv-01_mlx5_bond_0_20001.json").unwrap();
        assert_eq!(server.role, Role::Server);
        assert_eq!(server.device, "mlx5_bond_0");

        assert!(collector().parse_file_name("summary.json").is_none());
        assert!(collector().parse_file_name("report_h_mlx5_0.json").is_none());
    }

    #[test]
    fn test_parse_peer_file_name() {
        let peer = collector().parse_file_name("report_node-01_mlx5_bond_0_20000.json").unwrap();
        assert_eq!(peer.role, Role::Peer);
        assert_eq!(peer.hostname, "node-01");
        assert_eq!(peer.device, "mlx5_bond_0");
        assert_eq!(peer.port, 20000);
    }

    #[test]
    fn test_collect_peer_reports() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("report_node-01_mlx5_0_20000.json"), report(380.0)).unwrap();
        fs::write(dir.path().join("report_node-02_mlx5_0_20000.json"), report(370.0)).unwrap();
        fs::write(dir.path().join("report_c_cli-01_mlx5_0_20000.json"), report(90.0)).unwrap();

        let samples = collector().collect(dir.path()).unwrap();
        assert_eq!(samples.peer.len(), 2);
        assert_eq!(samples.peer["node-01"]["mlx5_0"].role, Role::Peer);
        assert_eq!(samples.client.len(), 1);
        assert!(samples.server.is_empty());
    }

    #[test]
    fn test_collect_sums_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("run-2");
        fs::create_dir(&nested).unwrap();

        fs::write(dir.path().join("report_c_cli-01_mlx5_0_20000.json"), report(40.0)).unwrap();
        fs::write(nested.join("report_c_cli-01_mlx5_0_20001.json"), report(45.0)).unwrap();
        fs::write(dir.path().join("report_s_srv-01_mlx5_0_20000.json"), report(85.0)).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let samples = collector().collect(dir.path()).unwrap();
        let client = &samples.client["cli-01"]["mlx5_0"];
        assert_eq!(client.bw_sum, 85.0);
        assert_eq!(client.count, 2);
        assert_eq!(samples.server["srv-01"]["mlx5_0"].count, 1);
        assert_eq!(samples.skipped, 0);
    }

    #[test]
    fn test_malformed_report_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("report_c_cli-01_mlx5_0_20000.json"), "{not json").unwrap();
        fs::write(dir.path().join("report_c_cli-02_mlx5_0_20000.json"), report(90.0)).unwrap();

        let samples = collector().collect(dir.path()).unwrap();
        assert_eq!(samples.skipped, 1);
        assert_eq!(samples.client.len(), 1);
        assert!(samples.client.contains_key("cli-02"));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = collector().collect(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
        assert!(err.to_string().contains("reports directory not found"));
    }
}
