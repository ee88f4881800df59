//! Bandwidth report data structures

use crate::types::{Role, StreamType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Measured bandwidth accumulated for one (hostname, device) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandwidthSample {
    pub hostname: String,
    pub device: String,
    pub role: Role,
    /// Sum of every `BW_average` reported for the pair
    pub bw_sum: f64,
    /// Number of report files folded into `bw_sum`
    pub count: u32,
}

impl BandwidthSample {
    pub fn new(hostname: impl Into<String>, device: impl Into<String>, role: Role) -> Self {
        Self {
            hostname: hostname.into(),
            device: device.into(),
            role,
            bw_sum: 0.0,
            count: 0,
        }
    }

    pub fn add(&mut self, bandwidth: f64) {
        self.bw_sum += bandwidth;
        self.count += 1;
    }

    /// Mean of the folded samples, 0 when nothing was recorded
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.bw_sum / self.count as f64
        }
    }
}

/// hostname → device → sample, for one role
pub type SampleGroup = BTreeMap<String, BTreeMap<String, BandwidthSample>>;

/// Insert or accumulate a measurement into a sample group
pub fn record_sample(group: &mut SampleGroup, hostname: &str, device: &str, role: Role, bandwidth: f64) {
    group
        .entry(hostname.to_string())
        .or_default()
        .entry(device.to_string())
        .or_insert_with(|| BandwidthSample::new(hostname, device, role))
        .add(bandwidth);
}

/// Client-side comparison against the theoretical share
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientDeviceData {
    pub hostname: String,
    pub device: String,
    pub actual_bw: f64,
    pub theoretical_bw: f64,
    pub delta: f64,
    pub delta_percent: f64,
    /// `OK` or `NOT OK`
    pub status: String,
}

/// Server-side comparison against the theoretical share
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerDeviceData {
    pub hostname: String,
    pub device: String,
    pub rx_bw: f64,
    pub theoretical_bw: f64,
    pub delta: f64,
    pub delta_percent: f64,
    /// `OK` or `NOT OK`
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct P2PDeviceData {
    pub hostname: String,
    pub device: String,
    pub avg_speed: f64,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct P2PSummary {
    pub total_pairs: usize,
    pub avg_speed: f64,
}

/// Bandwidth analysis result for one benchmark stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    pub stream_type: StreamType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theoretical_bw_per_client: Option<f64>,
    pub total_server_bw: f64,
    pub client_count: usize,
    pub client_data: BTreeMap<String, BTreeMap<String, ClientDeviceData>>,
    pub server_data: BTreeMap<String, BTreeMap<String, ServerDeviceData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p2p_data: Option<BTreeMap<String, BTreeMap<String, P2PDeviceData>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p2p_summary: Option<P2PSummary>,
}

impl ReportData {
    pub fn empty(stream_type: StreamType) -> Self {
        Self {
            stream_type,
            theoretical_bw_per_client: None,
            total_server_bw: 0.0,
            client_count: 0,
            client_data: BTreeMap::new(),
            server_data: BTreeMap::new(),
            p2p_data: None,
            p2p_summary: None,
        }
    }

    /// Whether every client and server device is within tolerance
    pub fn all_ok(&self) -> bool {
        let clients_ok = self.client_data.values().flat_map(|d| d.values()).all(|d| d.status == "OK");
        let servers_ok = self.server_data.values().flat_map(|d| d.values()).all(|d| d.status == "OK");
        clients_ok && servers_ok
    }
}
