//! Fabric Precheck
//!
//! Checks the health of the network adapters (HCAs) of a benchmark fleet
//! before a run and analyzes the measured bandwidth afterwards.
//!
//! The precheck fans a single diagnostic command out to every host over
//! ssh, turns each host's JSON answer into per-adapter records and folds
//! them into a fleet verdict. The analysis reads the per-stream report
//! files a benchmark leaves behind and compares every device against its
//! theoretical share of the server bandwidth.

pub mod analyze;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod output;
pub mod probe;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use analyze::{BandwidthAnalyzer, ReportCollector};
pub use error::{AppError, Result};
pub use executor::{RemoteExecutor, SshExecutor};
pub use models::{Config, NormalizedDeviceRecord, ReportData};
pub use output::{ColoredFormatter, DisplayProjector, OutputFormatter, OutputFormatterFactory, PlainFormatter};
pub use probe::Prechecker;
pub use stats::{FleetAggregator, PrecheckSummary};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build metadata stamped by `build.rs`
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const TARGET_TRIPLE: &str = env!("TARGET_TRIPLE");
pub const GIT_COMMIT: Option<&str> = option_env!("GIT_COMMIT");

/// One-line version banner, e.g. `fabric-precheck 0.1.0 (abc1234, x86_64-unknown-linux-gnu)`
pub fn version_banner() -> String {
    match GIT_COMMIT {
        Some(commit) => format!("{} {} ({}, {}, built {})", PKG_NAME, VERSION, commit, TARGET_TRIPLE, BUILD_TIME),
        None => format!("{} {} ({}, built {})", PKG_NAME, VERSION, TARGET_TRIPLE, BUILD_TIME),
    }
}

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_SPEED_GBPS: f64 = 400.0;
    pub const DEFAULT_REPORTS_DIR: &str = "reports";
    pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_ENABLE_COLOR: bool = true;
    /// Largest tolerated |delta%| before a device is reported `NOT OK`
    pub const DELTA_THRESHOLD_PERCENT: f64 = 20.0;
}
