//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use crate::types::StreamType;
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load `.env` from the working directory if present
    ///
    /// Variables already set in the process environment take precedence.
    /// Returns whether a file was loaded.
    pub fn load_env_file() -> Result<bool> {
        Self::load_env_file_from(Path::new(".env"))
    }

    pub fn load_env_file_from(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        dotenv::from_path(path)
            .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;
        Ok(true)
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        match key {
            "SERVER_HOSTS" | "CLIENT_HOSTS" | "SERVER_HCAS" | "CLIENT_HCAS" => {
                if value.split(',').any(|item| item.trim().contains(char::is_whitespace)) {
                    return Err(AppError::config(format!("{} entries cannot contain spaces: '{}'", key, value)));
                }
            }
            "STREAM_TYPE" => {
                value.parse::<StreamType>()?;
            }
            "SPEED_GBPS" => {
                let speed: f64 = value.trim().parse()
                    .map_err(|e| AppError::config(format!("Invalid SPEED_GBPS value '{}': {}", value, e)))?;
                if !speed.is_finite() || speed <= 0.0 {
                    return Err(AppError::config(format!("SPEED_GBPS must be positive, got: {}", value)));
                }
            }
            "PROBE_TIMEOUT_SECONDS" => {
                let timeout: u64 = value.trim().parse()
                    .map_err(|e| AppError::config(format!("Invalid PROBE_TIMEOUT_SECONDS value '{}': {}", value, e)))?;
                if timeout > 3600 {
                    return Err(AppError::config(format!("PROBE_TIMEOUT_SECONDS must be between 0 and 3600, got: {}", timeout)));
                }
            }
            "ENABLE_COLOR" => {
                value.trim().parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {
                // Free-form values (users, paths) and unknown variables
            }
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("SERVER_HOSTS", "Comma-separated server hostnames", "srv-01,srv-02"),
            ("SERVER_HCAS", "Comma-separated HCAs used on every server", "mlx5_0,mlx5_1"),
            ("CLIENT_HOSTS", "Comma-separated client hostnames", "cli-01,cli-02"),
            ("CLIENT_HCAS", "Comma-separated HCAs used on every client", "mlx5_0,mlx5_1"),
            ("SSH_USER", "Remote ssh user", "root"),
            ("SSH_PRIVATE_KEY", "Private key passed to ssh -i", "/root/.ssh/id_ed25519"),
            ("STREAM_TYPE", "fullmesh, incast, p2p or localtest", "incast"),
            ("SPEED_GBPS", "Nominal link speed in Gbps", "400"),
            ("REPORTS_DIR", "Directory holding benchmark report files", "reports"),
            ("PROBE_TIMEOUT_SECONDS", "Per-host probe timeout (0-3600, 0 disables)", "60"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Environment variable help shown under `--help`
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<22} {}\n", var, description));
            help.push_str(&format!("  {:<22} Example: {}\n", "", example));
        }

        help.push_str("\nConfiguration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        Self::validate_lookup(|key| std::env::var(key).ok())
    }

    /// Validate every supported variable a lookup knows about
    pub fn validate_lookup<F>(lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(var_name, _, _)| {
                let value = lookup(var_name)?;
                Self::validate_env_var(var_name, &value)
                    .err()
                    .map(|e| format!("{}: {}", var_name, e.detail()))
            })
            .collect()
    }
}
