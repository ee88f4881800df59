//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::{Cli, Command},
    config::env::EnvManager,
    error::Result,
    models::{config::split_list, Config},
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Defaults, then `.env`, then the process environment, then CLI flags
    pub fn parse(&self) -> Result<Config> {
        EnvManager::load_env_file()?;

        let mut config = Config::default();
        config.merge_from_env()?;
        self.finish(config)
    }

    /// Same layering with an explicit variable lookup in place of the environment
    pub fn parse_with<F>(&self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        config.merge_from_lookup(lookup)?;
        self.finish(config)
    }

    fn finish(&self, mut config: Config) -> Result<Config> {
        self.apply_cli_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) -> Result<()> {
        let cli = &self.cli;

        if let Some(hosts) = &cli.server_hosts {
            config.server.hostnames = split_list(hosts);
        }
        if let Some(hcas) = &cli.server_hcas {
            config.server.hcas = split_list(hcas);
        }
        if let Some(hosts) = &cli.client_hosts {
            config.client.hostnames = split_list(hosts);
        }
        if let Some(hcas) = &cli.client_hcas {
            config.client.hcas = split_list(hcas);
        }

        if let Some(user) = &cli.ssh_user {
            config.ssh.user = Some(user.clone());
        }
        if let Some(key) = &cli.ssh_key {
            config.ssh.private_key = Some(key.clone());
        }

        if let Some(stream_type) = &cli.stream_type {
            config.stream_type = stream_type.parse()?;
        }
        if let Some(speed) = cli.speed {
            config.speed = speed;
        }
        if let Some(timeout) = cli.timeout {
            config.probe_timeout_seconds = timeout;
        }

        if let Command::Analyze { reports_dir: Some(dir), .. } = &cli.command {
            config.reports_dir = dir.clone();
        }

        // Override color setting if --no-color is specified
        if cli.no_color {
            config.enable_color = false;
        }

        // Verbose and debug are CLI-only
        config.verbose = cli.verbose;
        config.debug = cli.debug;

        Ok(())
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let list = |items: &[String]| {
        if items.is_empty() {
            "(none)".to_string()
        } else {
            items.join(", ")
        }
    };

    let mut summary = Vec::new();
    summary.push(format!("Server hosts: {}", list(&config.server.hostnames)));
    summary.push(format!("Server HCAs: {}", list(&config.server.hcas)));
    summary.push(format!("Client hosts: {}", list(&config.client.hostnames)));
    summary.push(format!("Client HCAs: {}", list(&config.client.hcas)));
    summary.push(format!("SSH user: {}", config.ssh.user.as_deref().unwrap_or("(default)")));
    summary.push(format!("SSH key: {}", config.ssh.private_key.as_deref().unwrap_or("(default)")));
    summary.push(format!("Stream type: {}", config.stream_type));
    summary.push(format!("Speed: {} Gbps", config.speed));
    summary.push(format!("Reports dir: {}", config.reports_dir));
    summary.push(match config.probe_timeout() {
        Some(timeout) => format!("Probe timeout: {}s", timeout.as_secs()),
        None => "Probe timeout: disabled".to_string(),
    });
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StreamType;
    use clap::Parser;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env_or_flags() {
        let cli = Cli::parse_from(["fpc", "precheck"]);
        let config = ConfigParser::new(cli).parse_with(lookup(&[])).unwrap();

        assert_eq!(config.speed, crate::defaults::DEFAULT_SPEED_GBPS);
        assert_eq!(config.reports_dir, crate::defaults::DEFAULT_REPORTS_DIR);
        assert_eq!(config.stream_type, StreamType::InCast);
        assert!(!config.has_targets());
    }

    #[test]
    fn test_cli_overrides_env() {
        let cli = Cli::parse_from([
            "fpc",
            "--server-hosts",
            "srv-09",
            "--timeout",
            "5",
            "--no-color",
            "--verbose",
            "precheck",
        ]);
        let env = lookup(&[
            ("SERVER_HOSTS", "srv-01,srv-02"),
            ("SERVER_HCAS", "mlx5_0"),
            ("PROBE_TIMEOUT_SECONDS", "30"),
        ]);
        let config = ConfigParser::new(cli).parse_with(env).unwrap();

        assert_eq!(config.server.hostnames, vec!["srv-09"]);
        assert_eq!(config.server.hcas, vec!["mlx5_0"]);
        assert_eq!(config.probe_timeout_seconds, 5);
        assert!(!config.enable_color);
        assert!(config.verbose);
    }

    #[test]
    fn test_analyze_reports_dir_override() {
        let cli = Cli::parse_from(["fpc", "analyze", "--reports-dir", "/data/run-7", "--stream-type", "p2p"]);
        let config = ConfigParser::new(cli)
            .parse_with(lookup(&[("REPORTS_DIR", "ignored")]))
            .unwrap();
        assert_eq!(config.reports_dir, "/data/run-7");
        assert_eq!(config.stream_type, StreamType::P2P);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let cli = Cli::parse_from(["fpc", "precheck", "--speed", "0"]);
        let err = ConfigParser::new(cli).parse_with(lookup(&[])).unwrap_err();
        assert!(matches!(err, crate::error::AppError::Validation(_)));

        let cli = Cli::parse_from(["fpc", "precheck"]);
        assert!(ConfigParser::new(cli)
            .parse_with(lookup(&[("STREAM_TYPE", "ring")]))
            .is_err());
    }

    #[test]
    fn test_config_summary() {
        let summary = display_config_summary(&Config::default());
        assert!(summary.contains("Server hosts: (none)"));
        assert!(summary.contains("Probe timeout: 60s"));
        assert!(summary.contains("Stream type: incast"));
    }
}
