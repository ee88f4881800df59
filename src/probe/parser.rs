//! Decoding of raw probe output into per-host data

use crate::{
    executor::ExecOutcome,
    logging::Logger,
    models::{probe::ProbePayload, RawHostProbe},
    types::ERROR_SENTINEL,
};

/// Longest slice of undecodable output kept in an error message
pub const OUTPUT_EXCERPT_LIMIT: usize = 256;

/// Turns executor outcomes into [`RawHostProbe`]s
///
/// Parsing never fails: every problem is recorded on the host's `error`.
pub struct ResultParser {
    logger: Logger,
}

impl ResultParser {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn parse(&self, hostname: &str, outcome: ExecOutcome) -> RawHostProbe {
        let output = match outcome {
            Ok(output) => output,
            Err(e) => {
                return RawHostProbe::failed(hostname, format!("SSH execution failed: {}", e.detail()));
            }
        };

        let trimmed = output.trim();
        let payload: ProbePayload = match serde_json::from_str(trimmed) {
            Ok(payload) => payload,
            Err(e) => {
                self.logger.error("JSON parse error")
                    .field("hostname", hostname)
                    .field("error", e.to_string())
                    .log();
                return RawHostProbe::failed(
                    hostname,
                    format!("Failed to parse JSON output: {}. Output: {}", e, excerpt(trimmed)),
                );
            }
        };

        let mut probe = RawHostProbe::new(hostname);
        probe.devices = payload.hcas.unwrap_or_default();

        if payload.serial == ERROR_SENTINEL {
            probe.annotate("Failed to read serial number");
        }
        probe.serial = match payload.serial.rsplit_once('-') {
            Some((_, tail)) => tail.to_string(),
            None => payload.serial,
        };

        if let Some(device) = probe.devices.iter().find(|d| d.has_unreadable_attribute()) {
            let message = format!("Failed to read some HCA attributes for {}", device.name);
            probe.annotate(message);
        }

        self.logger.debug("Parsed precheck data")
            .field("hostname", hostname)
            .field("devices", probe.devices.len())
            .field("serial", &probe.serial)
            .field("error", probe.error.as_deref().unwrap_or(""))
            .log();

        probe
    }
}

/// At most [`OUTPUT_EXCERPT_LIMIT`] characters, `...` appended when cut
fn excerpt(output: &str) -> String {
    match output.char_indices().nth(OUTPUT_EXCERPT_LIMIT) {
        Some((idx, _)) => format!("{}...", &output[..idx]),
        None => output.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppError, models::Attribute};

    fn parser() -> ResultParser {
        ResultParser::new(Logger::capturing("PARSER").0)
    }

    const HEALTHY: &str = r#"{"serial":"SN-ABC-12345","hcas":[
        {"name":"mlx5_0","phys_state":"5: LinkUp","state":"4: ACTIVE","speed":"400 Gb/sec (4X NDR)","fw_ver":"28.39.1002","board_id":"MT_0000000838"},
        {"name":"mlx5_1","phys_state":"5: LinkUp","state":"4: ACTIVE","speed":"400 Gb/sec (4X NDR)","fw_ver":"28.39.1002","board_id":"MT_0000000838"}
    ]}"#;

    #[test]
    fn test_transport_failure() {
        let probe = parser().parse("node-01", Err(AppError::transport("exit status: 255")));
        assert_eq!(probe.error.as_deref(), Some("SSH execution failed: exit status: 255"));
        assert!(probe.devices.is_empty());
    }

    #[test]
    fn test_healthy_payload_with_serial_suffix() {
        let probe = parser().parse("node-01", Ok(format!("\n{}\n", HEALTHY)));
        assert_eq!(probe.serial, "12345");
        assert_eq!(probe.devices.len(), 2);
        assert_eq!(probe.devices[1].name, "mlx5_1");
        assert!(probe.error.is_none());
    }

    #[test]
    fn test_serial_without_dash_is_kept() {
        let probe = parser().parse("node-01", Ok(r#"{"serial":"ABC123","hcas":[]}"#.to_string()));
        assert_eq!(probe.serial, "ABC123");
        assert!(probe.devices.is_empty());
        assert!(!probe.has_error());
    }

    #[test]
    fn test_unreadable_serial() {
        let probe = parser().parse("node-01", Ok(r#"{"serial":"ERROR","hcas":[]}"#.to_string()));
        assert_eq!(probe.error.as_deref(), Some("Failed to read serial number"));
    }

    #[test]
    fn test_serial_error_wins_over_device_error() {
        let raw = r#"{"serial":"ERROR","hcas":[{"name":"mlx5_0","phys_state":"ERROR","state":"4: ACTIVE","speed":"","fw_ver":"","board_id":""}]}"#;
        let probe = parser().parse("node-01", Ok(raw.to_string()));
        assert_eq!(probe.error.as_deref(), Some("Failed to read serial number"));
        assert_eq!(probe.devices.len(), 1);
    }

    #[test]
    fn test_first_unreadable_device_is_named() {
        let raw = r#"{"serial":"S1","hcas":[
            {"name":"mlx5_0","phys_state":"5: LinkUp","state":"4: ACTIVE","speed":"400","fw_ver":"1","board_id":"B"},
            {"name":"mlx5_1","phys_state":"5: LinkUp","state":"4: ACTIVE","speed":"ERROR","fw_ver":"1","board_id":"B"},
            {"name":"mlx5_2","phys_state":"ERROR","state":"ERROR","speed":"ERROR","fw_ver":"ERROR","board_id":"ERROR"}
        ]}"#;
        let probe = parser().parse("node-01", Ok(raw.to_string()));
        assert_eq!(probe.error.as_deref(), Some("Failed to read some HCA attributes for mlx5_1"));
        assert_eq!(probe.devices.len(), 3);
        assert_eq!(probe.devices[1].speed, Attribute::Unreadable);
    }

    #[test]
    fn test_garbage_output_is_decode_error() {
        let probe = parser().parse("node-01", Ok("bash: cat: command not found".to_string()));
        let error = probe.error.unwrap();
        assert!(error.starts_with("Failed to parse JSON output: "));
        assert!(error.ends_with("Output: bash: cat: command not found"));
        assert!(probe.devices.is_empty());
    }

    #[test]
    fn test_long_output_excerpt_is_bounded() {
        let garbage = "x".repeat(1000);
        let probe = parser().parse("node-01", Ok(garbage));
        let error = probe.error.unwrap();
        let (_, tail) = error.split_once("Output: ").unwrap();
        assert_eq!(tail.len(), OUTPUT_EXCERPT_LIMIT + 3);
        assert!(tail.ends_with("..."));
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let text = "é".repeat(300);
        let cut = excerpt(&text);
        assert_eq!(cut.chars().count(), OUTPUT_EXCERPT_LIMIT + 3);
        assert_eq!(excerpt("short"), "short");
    }
}
