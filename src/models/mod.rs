//! Data models shared by the probe pipeline and the bandwidth analyzer

pub mod config;
pub mod probe;
pub mod report;

// Re-export main model types
pub use config::{Config, RoleTargets, SshSettings};
pub use probe::{Attribute, HostTarget, NormalizedDeviceRecord, RawDeviceProbe, RawHostProbe};
pub use report::{
    record_sample, BandwidthSample, ClientDeviceData, P2PDeviceData, P2PSummary, ReportData, SampleGroup,
    ServerDeviceData,
};
