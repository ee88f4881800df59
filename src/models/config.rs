//! Configuration data model and validation

use crate::types::{AppError, Result, StreamType};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hosts and adapters configured for one side of the benchmark
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleTargets {
    /// Hostnames taking this role
    #[serde(default)]
    pub hostnames: Vec<String>,
    /// HCA device names used on every host of this role
    #[serde(default)]
    pub hcas: Vec<String>,
}

/// SSH connection settings shared by every host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SshSettings {
    /// Remote user, e.g. `root`
    #[serde(default)]
    pub user: Option<String>,
    /// Path of the private key passed to `ssh -i`
    #[serde(default)]
    pub private_key: Option<String>,
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server-side targets
    #[serde(default)]
    pub server: RoleTargets,

    /// Client-side targets
    #[serde(default)]
    pub client: RoleTargets,

    /// SSH settings for the probe transport
    #[serde(default)]
    pub ssh: SshSettings,

    /// Benchmark stream layout
    #[serde(default)]
    pub stream_type: StreamType,

    /// Nominal per-link speed in Gbps
    #[serde(default = "default_speed")]
    pub speed: f64,

    /// Directory holding collected report files
    #[serde(default = "default_reports_dir")]
    pub reports_dir: String,

    /// Per-host probe deadline in seconds, 0 disables it
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_seconds: u64,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: RoleTargets::default(),
            client: RoleTargets::default(),
            ssh: SshSettings::default(),
            stream_type: StreamType::default(),
            speed: default_speed(),
            reports_dir: default_reports_dir(),
            probe_timeout_seconds: default_probe_timeout_secs(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-host deadline, `None` when disabled
    pub fn probe_timeout(&self) -> Option<Duration> {
        if self.probe_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.probe_timeout_seconds))
        }
    }

    /// Whether any host is configured for either role
    pub fn has_targets(&self) -> bool {
        !self.server.hostnames.is_empty() || !self.client.hostnames.is_empty()
    }

    /// Validate the configuration and return any errors
    ///
    /// An empty target list is accepted here; the precheck itself reports
    /// it as fatal so `analyze` can still run without hosts.
    pub fn validate(&self) -> Result<()> {
        for (role, targets) in [("server", &self.server), ("client", &self.client)] {
            if targets.hostnames.iter().any(|h| h.trim().is_empty()) {
                return Err(AppError::validation(format!("{} hostname cannot be empty", role)));
            }
            if targets.hcas.iter().any(|h| h.trim().is_empty()) {
                return Err(AppError::validation(format!("{} HCA name cannot be empty", role)));
            }
        }

        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(AppError::validation(format!(
                "Speed must be a positive number of Gbps, got: {}",
                self.speed
            )));
        }

        if self.probe_timeout_seconds > 3600 {
            return Err(AppError::validation("Probe timeout cannot exceed 3600 seconds"));
        }

        if self.reports_dir.trim().is_empty() {
            return Err(AppError::validation("Reports directory cannot be empty"));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        self.merge_from_lookup(|key| std::env::var(key).ok())
    }

    /// Merge values from an arbitrary key lookup (environment, tests)
    pub fn merge_from_lookup<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(hosts) = lookup("SERVER_HOSTS") {
            self.server.hostnames = split_list(&hosts);
        }
        if let Some(hcas) = lookup("SERVER_HCAS") {
            self.server.hcas = split_list(&hcas);
        }
        if let Some(hosts) = lookup("CLIENT_HOSTS") {
            self.client.hostnames = split_list(&hosts);
        }
        if let Some(hcas) = lookup("CLIENT_HCAS") {
            self.client.hcas = split_list(&hcas);
        }

        if let Some(user) = lookup("SSH_USER") {
            self.ssh.user = non_empty(user);
        }
        if let Some(key) = lookup("SSH_PRIVATE_KEY") {
            self.ssh.private_key = non_empty(key);
        }

        if let Some(stream_type) = lookup("STREAM_TYPE") {
            self.stream_type = stream_type.parse()?;
        }

        if let Some(speed) = lookup("SPEED_GBPS") {
            self.speed = speed.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid SPEED_GBPS value '{}': {}", speed, e)))?;
        }

        if let Some(dir) = lookup("REPORTS_DIR") {
            self.reports_dir = dir.trim().to_string();
        }

        if let Some(timeout) = lookup("PROBE_TIMEOUT_SECONDS") {
            self.probe_timeout_seconds = timeout.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid PROBE_TIMEOUT_SECONDS value '{}': {}", timeout, e)))?;
        }

        if let Some(enable_color) = lookup("ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }
}

/// Split a comma-separated list, dropping blanks
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// Default value functions for serde
fn default_speed() -> f64 {
    crate::defaults::DEFAULT_SPEED_GBPS
}

fn default_reports_dir() -> String {
    crate::defaults::DEFAULT_REPORTS_DIR.to_string()
}

fn default_probe_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_PROBE_TIMEOUT.as_secs()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(!config.has_targets());
        assert_eq!(config.speed, 400.0);
        assert_eq!(config.probe_timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let config = Config {
            probe_timeout_seconds: 0,
            ..Default::default()
        };
        assert_eq!(config.probe_timeout(), None);
    }

    #[test]
    fn test_empty_hostname_invalid() {
        let mut config = Config::default();
        config.server.hostnames = vec!["".to_string()];
        let err = config.validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.detail(), "server hostname cannot be empty");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_timeout_limit_is_a_validation_error() {
        let config = Config {
            probe_timeout_seconds: 3601,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_non_positive_speed_invalid() {
        let mut config = Config::default();
        config.speed = 0.0;
        assert!(config.validate().is_err());
        config.speed = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_from_lookup() {
        let mut config = Config::default();
        config
            .merge_from_lookup(lookup_from(&[
                ("SERVER_HOSTS", "srv-01, srv-02,"),
                ("SERVER_HCAS", "mlx5_0,mlx5_1"),
                ("CLIENT_HOSTS", "cli-01"),
                ("SSH_USER", "root"),
                ("SSH_PRIVATE_KEY", "  "),
                ("STREAM_TYPE", "fullmesh"),
                ("SPEED_GBPS", "200"),
                ("ENABLE_COLOR", "false"),
            ]))
            .unwrap();

        assert_eq!(config.server.hostnames, vec!["srv-01", "srv-02"]);
        assert_eq!(config.server.hcas, vec!["mlx5_0", "mlx5_1"]);
        assert_eq!(config.client.hostnames, vec!["cli-01"]);
        assert_eq!(config.ssh.user.as_deref(), Some("root"));
        assert_eq!(config.ssh.private_key, None);
        assert_eq!(config.stream_type, StreamType::FullMesh);
        assert_eq!(config.speed, 200.0);
        assert!(!config.enable_color);
        assert!(config.has_targets());
    }

    #[test]
    fn test_merge_rejects_bad_numbers() {
        let mut config = Config::default();
        let result = config.merge_from_lookup(lookup_from(&[("SPEED_GBPS", "fast")]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
