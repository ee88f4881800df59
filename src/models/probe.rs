//! Probe data: what goes out to each host and what comes back

use crate::types::ERROR_SENTINEL;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A host and the deduplicated adapters to probe on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTarget {
    pub hostname: String,
    /// Union of the adapters every role assigns to this host
    pub devices: Vec<String>,
}

/// One attribute as printed by the remote probe
///
/// The wire format marks an unreadable attribute with the literal
/// `"ERROR"`. That literal is folded into `Unreadable` on decode so the
/// rest of the pipeline never compares strings against the sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    Value(String),
    Unreadable,
}

impl Attribute {
    pub fn is_unreadable(&self) -> bool {
        matches!(self, Attribute::Unreadable)
    }

    /// Raw text of the attribute, the sentinel for unreadable values
    pub fn as_str(&self) -> &str {
        match self {
            Attribute::Value(value) => value,
            Attribute::Unreadable => ERROR_SENTINEL,
        }
    }
}

impl Default for Attribute {
    fn default() -> Self {
        Attribute::Value(String::new())
    }
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        if value == ERROR_SENTINEL {
            Attribute::Unreadable
        } else {
            Attribute::Value(value.to_string())
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Attribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Attribute {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Attribute::from(raw.as_str()))
    }
}

/// Raw attributes of one adapter, verbatim from the remote host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDeviceProbe {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phys_state: Attribute,
    #[serde(default)]
    pub state: Attribute,
    #[serde(default)]
    pub speed: Attribute,
    #[serde(default)]
    pub fw_ver: Attribute,
    #[serde(default)]
    pub board_id: Attribute,
}

impl RawDeviceProbe {
    /// Whether any attribute could not be read on the host
    pub fn has_unreadable_attribute(&self) -> bool {
        [&self.phys_state, &self.state, &self.speed, &self.fw_ver, &self.board_id]
            .iter()
            .any(|attr| attr.is_unreadable())
    }
}

/// JSON document printed by the probe command
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbePayload {
    #[serde(default)]
    pub serial: String,
    #[serde(default)]
    pub hcas: Option<Vec<RawDeviceProbe>>,
}

/// Everything learned about one host in a single probe
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawHostProbe {
    pub hostname: String,
    pub serial: String,
    pub devices: Vec<RawDeviceProbe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RawHostProbe {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Default::default()
        }
    }

    /// A host that produced no device data at all
    pub fn failed(hostname: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Record an error unless an earlier one is already present
    pub fn annotate(&mut self, error: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(error.into());
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Canonical per-adapter record consumed by aggregation and display
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDeviceRecord {
    pub hostname: String,
    pub hca: String,
    pub phys_state: String,
    pub state: String,
    pub speed: String,
    pub fw_ver: String,
    pub board_id: String,
    pub is_healthy: bool,
    pub serial_number: String,
    #[serde(
        default,
        serialize_with = "serialize_error",
        deserialize_with = "deserialize_error"
    )]
    pub error: Option<String>,
}

impl NormalizedDeviceRecord {
    /// Synthetic record standing in for a host that returned no devices
    pub fn host_error(hostname: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }
}

// The output contract always carries `error`, empty when there is none
fn serialize_error<S: Serializer>(error: &Option<String>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(error.as_deref().unwrap_or(""))
}

fn deserialize_error<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|e| !e.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_decodes_to_unreadable() {
        let device: RawDeviceProbe = serde_json::from_str(
            r#"{"name":"mlx5_0","phys_state":"5: LinkUp","state":"ERROR","speed":"200 Gb/sec (2X NDR)","fw_ver":"28.39.1002","board_id":"MT_0000000838"}"#,
        )
        .unwrap();

        assert_eq!(device.phys_state, Attribute::Value("5: LinkUp".to_string()));
        assert!(device.state.is_unreadable());
        assert_eq!(device.state.as_str(), "ERROR");
        assert!(device.has_unreadable_attribute());
    }

    #[test]
    fn test_missing_attributes_default_to_empty() {
        let device: RawDeviceProbe = serde_json::from_str(r#"{"name":"mlx5_1"}"#).unwrap();
        assert_eq!(device.speed.as_str(), "");
        assert!(!device.has_unreadable_attribute());
    }

    #[test]
    fn test_annotate_keeps_first_error() {
        let mut probe = RawHostProbe::new("node-01");
        probe.annotate("Failed to read serial number");
        probe.annotate("Failed to read some HCA attributes for mlx5_0");
        assert_eq!(probe.error.as_deref(), Some("Failed to read serial number"));
    }

    #[test]
    fn test_record_serializes_empty_error() {
        let record = NormalizedDeviceRecord {
            hostname: "node-01".to_string(),
            hca: "mlx5_0".to_string(),
            is_healthy: true,
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["error"], "");
        assert_eq!(json["is_healthy"], true);

        let back: NormalizedDeviceRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.error, None);
    }

    #[test]
    fn test_host_error_record() {
        let record = NormalizedDeviceRecord::host_error("node-02", "SSH execution failed: exit status 255");
        assert!(record.has_error());
        assert!(record.hca.is_empty());
        assert!(!record.is_healthy);
    }
}
