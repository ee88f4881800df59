//! Command-line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fabric Precheck - HCA health precheck and bandwidth analysis for benchmark fleets
#[derive(Parser, Debug, Clone)]
#[command(name = "fpc")]
#[command(version, about, long_about = None)]
#[command(after_long_help = crate::config::EnvManager::display_env_help())]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Server hostnames (comma-separated)
    #[arg(long, global = true, value_name = "HOSTS")]
    pub server_hosts: Option<String>,

    /// HCA devices used on every server host (comma-separated)
    #[arg(long, global = true, value_name = "HCAS")]
    pub server_hcas: Option<String>,

    /// Client hostnames (comma-separated)
    #[arg(long, global = true, value_name = "HOSTS")]
    pub client_hosts: Option<String>,

    /// HCA devices used on every client host (comma-separated)
    #[arg(long, global = true, value_name = "HCAS")]
    pub client_hcas: Option<String>,

    /// Remote ssh user
    #[arg(long, global = true)]
    pub ssh_user: Option<String>,

    /// Private key passed to `ssh -i`
    #[arg(long, global = true, value_name = "PATH")]
    pub ssh_key: Option<String>,

    /// Benchmark stream type (fullmesh, incast, p2p, localtest)
    #[arg(long, global = true)]
    pub stream_type: Option<String>,

    /// Nominal link speed in Gbps
    #[arg(long, global = true)]
    pub speed: Option<f64>,

    /// Per-host probe timeout in seconds, 0 disables it
    #[arg(short, long, global = true, value_parser = parse_timeout)]
    pub timeout: Option<u64>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Check link state, speed, firmware and board of every configured HCA
    Precheck {
        /// Print the summary as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Compare measured bandwidth from report files with the theoretical share
    Analyze {
        /// Directory holding report_c_*/report_s_* (or P2P report_*) files
        #[arg(long, value_name = "DIR")]
        reports_dir: Option<String>,

        /// Print the report as JSON instead of tables
        #[arg(long)]
        json: bool,

        /// Also write the report as Markdown to FILE
        #[arg(long, value_name = "FILE", num_args = 0..=1, default_missing_value = crate::output::DEFAULT_MARKDOWN_FILE)]
        markdown: Option<PathBuf>,
    },
}

impl Cli {
    /// Whether machine-readable output was requested
    pub fn json_output(&self) -> bool {
        match &self.command {
            Command::Precheck { json } => *json,
            Command::Analyze { json, .. } => *json,
        }
    }

    /// Get configuration summary for display
    pub fn get_config_summary(&self) -> String {
        let mut summary = String::from("Command line overrides:\n");
        let mut push = |label: &str, value: Option<String>| {
            if let Some(value) = value {
                summary.push_str(&format!("  {}: {}\n", label, value));
            }
        };

        push("Server hosts", self.server_hosts.clone());
        push("Server HCAs", self.server_hcas.clone());
        push("Client hosts", self.client_hosts.clone());
        push("Client HCAs", self.client_hcas.clone());
        push("SSH user", self.ssh_user.clone());
        push("SSH key", self.ssh_key.clone());
        push("Stream type", self.stream_type.clone());
        push("Speed", self.speed.map(|s| format!("{} Gbps", s)));
        push("Timeout", self.timeout.map(|t| format!("{}s", t)));

        summary
    }
}

/// Parse a probe timeout in whole seconds
fn parse_timeout(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid timeout: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid timeout: {}", s))
        .and_then(|secs| {
            if secs > 3600 {
                Err("Timeout cannot exceed 3600 seconds".to_string())
            } else {
                Ok(secs)
            }
        })
}
