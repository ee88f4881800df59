//! Fleet-wide aggregation and outlier classification
//!
//! Counts how often each speed, firmware version and board id occurs
//! across the fleet and derives the precheck verdict. The same tables
//! drive the majority/minority coloring of the display.


use crate::{models::NormalizedDeviceRecord, types::ColorClass};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Occurrence count per distinct value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyTable(BTreeMap<String, usize>);

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a value; empty values are ignored
    pub fn record(&mut self, value: &str) {
        if !value.is_empty() {
            *self.0.entry(value.to_string()).or_insert(0) += 1;
        }
    }

    pub fn count(&self, value: &str) -> usize {
        self.0.get(value).copied().unwrap_or(0)
    }

    /// Highest count in the table, 0 when empty
    pub fn max_count(&self) -> usize {
        self.0.values().copied().max().unwrap_or(0)
    }

    /// Number of distinct values
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(value, count)| (value.as_str(), *count))
    }
}

/// Frequency tables over the error-free records of a fleet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetFrequencies {
    pub speed: FrequencyTable,
    pub fw_ver: FrequencyTable,
    pub board_id: FrequencyTable,
}

impl FleetFrequencies {
    pub fn from_records(records: &[NormalizedDeviceRecord]) -> Self {
        let mut frequencies = Self::default();
        for record in records.iter().filter(|r| !r.has_error()) {
            frequencies.speed.record(&record.speed);
            frequencies.fw_ver.record(&record.fw_ver);
            frequencies.board_id.record(&record.board_id);
        }
        frequencies
    }
}

/// Fleet-level precheck verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecheckSummary {
    pub total_hcas: usize,
    pub healthy_count: usize,
    pub unhealthy_count: usize,
    pub error_count: usize,
    pub all_healthy: bool,
    pub all_speeds_same: bool,
    pub check_passed: bool,
    pub results: Vec<NormalizedDeviceRecord>,
    pub speed_stats: FrequencyTable,
    pub fw_ver_stats: FrequencyTable,
    pub board_id_stats: FrequencyTable,
}

/// Folds normalized records into a [`PrecheckSummary`]
pub struct FleetAggregator;

impl FleetAggregator {
    pub fn aggregate(records: Vec<NormalizedDeviceRecord>) -> PrecheckSummary {
        let FleetFrequencies { speed, fw_ver, board_id } = FleetFrequencies::from_records(&records);

        let total_hcas = records.len();
        let error_count = records.iter().filter(|r| r.has_error()).count();
        let healthy_count = records
            .iter()
            .filter(|r| !r.has_error() && r.is_healthy)
            .count();
        let unhealthy_count = total_hcas - error_count - healthy_count;

        let all_healthy = healthy_count == total_hcas;
        let all_speeds_same = speed.len() <= 1;

        PrecheckSummary {
            total_hcas,
            healthy_count,
            unhealthy_count,
            error_count,
            all_healthy,
            all_speeds_same,
            check_passed: all_healthy && all_speeds_same,
            results: records,
            speed_stats: speed,
            fw_ver_stats: fw_ver,
            board_id_stats: board_id,
        }
    }
}

/// Speed coloring: the majority value is green once it is shared, minorities are red
pub fn speed_class(count: usize, max_count: usize) -> ColorClass {
    if count == max_count && max_count > 1 {
        ColorClass::Success
    } else if count < max_count {
        ColorClass::Error
    } else {
        ColorClass::Normal
    }
}

/// Firmware/board coloring: anything below the majority is flagged
pub fn consistency_class(count: usize, max_count: usize) -> ColorClass {
    if count < max_count {
        ColorClass::Warning
    } else {
        ColorClass::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(host: &str, hca: &str, speed: &str, healthy: bool) -> NormalizedDeviceRecord {
        NormalizedDeviceRecord {
            hostname: host.to_string(),
            hca: hca.to_string(),
            phys_state: "LinkUp".to_string(),
            state: "ACTIVE".to_string(),
            speed: speed.to_string(),
            fw_ver: "28.39.1002".to_string(),
            board_id: "MT_0000000838".to_string(),
            is_healthy: healthy,
            serial_number: "12345".to_string(),
            error: None,
        }
    }

    #[test]
    fn test_uniform_fleet_passes() {
        let records = vec![
            record("a", "mlx5_0", "400 Gb/sec", true),
            record("a", "mlx5_1", "400 Gb/sec", true),
            record("b", "mlx5_0", "400 Gb/sec", true),
        ];
        let summary = FleetAggregator::aggregate(records);

        assert_eq!(summary.total_hcas, 3);
        assert_eq!(summary.healthy_count, 3);
        assert!(summary.all_healthy);
        assert!(summary.all_speeds_same);
        assert!(summary.check_passed);
        assert_eq!(summary.speed_stats.count("400 Gb/sec"), 3);
    }

    #[test]
    fn test_mixed_speeds_fail_check() {
        let records = vec![
            record("a", "mlx5_0", "400 Gb/sec", true),
            record("b", "mlx5_0", "200 Gb/sec", true),
        ];
        let summary = FleetAggregator::aggregate(records);
        assert!(summary.all_healthy);
        assert!(!summary.all_speeds_same);
        assert!(!summary.check_passed);
    }

    #[test]
    fn test_error_records_are_not_counted_in_tables() {
        let mut broken = record("c", "mlx5_0", "100 Gb/sec", false);
        broken.error = Some("Failed to read serial number".to_string());

        let records = vec![
            record("a", "mlx5_0", "400 Gb/sec", true),
            record("b", "mlx5_0", "400 Gb/sec", false),
            broken,
            NormalizedDeviceRecord::host_error("d", "SSH execution failed: timed out after 60s"),
        ];
        let summary = FleetAggregator::aggregate(records);

        assert_eq!(summary.total_hcas, 4);
        assert_eq!(summary.healthy_count, 1);
        assert_eq!(summary.unhealthy_count, 1);
        assert_eq!(summary.error_count, 2);
        assert_eq!(summary.speed_stats.len(), 1);
        assert!(summary.all_speeds_same);
        assert!(!summary.check_passed);
    }

    #[test]
    fn test_summary_json_shape() {
        let summary = FleetAggregator::aggregate(vec![record("a", "mlx5_0", "400 Gb/sec", true)]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["speed_stats"]["400 Gb/sec"], 1);
        assert_eq!(json["results"][0]["error"], "");
        assert_eq!(json["check_passed"], true);
    }

    #[test]
    fn test_speed_coloring() {
        assert_eq!(speed_class(3, 3), ColorClass::Success);
        assert_eq!(speed_class(1, 3), ColorClass::Error);
        // A lone value has no majority to agree with
        assert_eq!(speed_class(1, 1), ColorClass::Normal);
    }

    #[test]
    fn test_consistency_coloring() {
        assert_eq!(consistency_class(1, 4), ColorClass::Warning);
        assert_eq!(consistency_class(4, 4), ColorClass::Normal);
        assert_eq!(consistency_class(0, 0), ColorClass::Normal);
    }

    #[test]
    fn test_frequency_table_ignores_empty() {
        let mut table = FrequencyTable::new();
        table.record("");
        table.record("x");
        table.record("x");
        assert_eq!(table.len(), 1);
        assert_eq!(table.max_count(), 2);
        assert_eq!(table.count("missing"), 0);
    }
}
