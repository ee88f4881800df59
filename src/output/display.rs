//! Display projection of precheck records
//!
//! Decides what every cell shows and which [`ColorClass`] it carries.
//! Renderers only map the class to their own palette.

use crate::{
    models::NormalizedDeviceRecord,
    stats::{consistency_class, speed_class, FleetFrequencies, FrequencyTable},
    types::ColorClass,
};
use serde::Serialize;

const NOT_AVAILABLE: &str = "N/A";

pub const STATUS_HEALTHY: &str = "[+] HEALTHY";
pub const STATUS_UNHEALTHY: &str = "[X] UNHEALTHY";
pub const STATUS_ERROR: &str = "[!] ERROR";

/// A value paired with its semantic color
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColoredField {
    pub value: String,
    pub class: ColorClass,
}

impl ColoredField {
    pub fn new(value: impl Into<String>, class: ColorClass) -> Self {
        Self { value: value.into(), class }
    }

    pub fn normal(value: impl Into<String>) -> Self {
        Self::new(value, ColorClass::Normal)
    }

    fn not_available() -> Self {
        Self::normal(NOT_AVAILABLE)
    }
}

/// One table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRecord {
    pub hostname: String,
    pub hca: String,
    pub serial_number: String,
    pub phys_state: String,
    pub state: String,
    pub speed: ColoredField,
    pub fw_ver: ColoredField,
    pub board_id: ColoredField,
    pub status: ColoredField,
}

/// Every row plus the counts shown under the table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecheckDisplayData {
    pub items: Vec<DisplayRecord>,
    pub healthy_count: usize,
    pub unhealthy_count: usize,
    pub error_count: usize,
    pub total_count: usize,
}

impl PrecheckDisplayData {
    /// Order rows by hostname, then adapter name
    pub fn sort_by_host_and_hca(&mut self) {
        self.items
            .sort_by(|a, b| a.hostname.cmp(&b.hostname).then_with(|| a.hca.cmp(&b.hca)));
    }
}

/// Projects records into colored display rows
pub struct DisplayProjector;

impl DisplayProjector {
    pub fn project(records: &[NormalizedDeviceRecord]) -> PrecheckDisplayData {
        let frequencies = FleetFrequencies::from_records(records);
        let max_speed = frequencies.speed.max_count();

        let mut data = PrecheckDisplayData {
            items: Vec::with_capacity(records.len()),
            healthy_count: 0,
            unhealthy_count: 0,
            error_count: 0,
            total_count: records.len(),
        };

        for record in records {
            let item = if record.has_error() {
                data.error_count += 1;
                DisplayRecord {
                    hostname: record.hostname.clone(),
                    hca: record.hca.clone(),
                    serial_number: NOT_AVAILABLE.to_string(),
                    phys_state: NOT_AVAILABLE.to_string(),
                    state: NOT_AVAILABLE.to_string(),
                    speed: ColoredField::not_available(),
                    fw_ver: ColoredField::not_available(),
                    board_id: ColoredField::not_available(),
                    status: ColoredField::new(STATUS_ERROR, ColorClass::Warning),
                }
            } else {
                let status = if record.is_healthy {
                    data.healthy_count += 1;
                    ColoredField::new(STATUS_HEALTHY, ColorClass::Success)
                } else {
                    data.unhealthy_count += 1;
                    ColoredField::new(STATUS_UNHEALTHY, ColorClass::Error)
                };

                DisplayRecord {
                    hostname: record.hostname.clone(),
                    hca: record.hca.clone(),
                    serial_number: or_not_available(&record.serial_number),
                    phys_state: record.phys_state.clone(),
                    state: record.state.clone(),
                    speed: color_speed(&record.speed, &frequencies.speed, max_speed),
                    fw_ver: color_consistency(&record.fw_ver, &frequencies.fw_ver),
                    board_id: color_consistency(&record.board_id, &frequencies.board_id),
                    status,
                }
            };

            data.items.push(item);
        }

        data
    }
}

fn or_not_available(value: &str) -> String {
    if value.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        value.to_string()
    }
}

fn color_speed(value: &str, table: &FrequencyTable, max_count: usize) -> ColoredField {
    if value.is_empty() {
        return ColoredField::not_available();
    }
    ColoredField::new(value, speed_class(table.count(value), max_count))
}

fn color_consistency(value: &str, table: &FrequencyTable) -> ColoredField {
    if value.is_empty() {
        return ColoredField::not_available();
    }
    ColoredField::new(value, consistency_class(table.count(value), table.max_count()))
}
