//! Markdown export of bandwidth reports

use super::formatter::format_delta;
use crate::{
    error::{ErrorContext, Result},
    models::ReportData,
};
use std::fmt::Write as _;
use std::path::Path;

/// Default file written by `fpc analyze --markdown`
pub const DEFAULT_MARKDOWN_FILE: &str = "network_performance_analysis.md";

pub struct MarkdownExporter;

impl MarkdownExporter {
    pub fn render(report: &ReportData) -> String {
        let mut content = String::from("# Network Performance Analysis\n\n");
        let _ = writeln!(content, "Stream type: `{}`\n", report.stream_type);

        if let Some(p2p) = &report.p2p_data {
            content.push_str("## P2P Data\n\n");
            content.push_str("| Hostname | Device | AVG (Gbps) | Samples |\n");
            content.push_str("|----------|--------|------------|---------|\n");
            for (hostname, devices) in p2p {
                for (i, data) in devices.values().enumerate() {
                    let _ = writeln!(
                        content,
                        "| {} | {} | {:.2} | {} |",
                        first_only(hostname, i),
                        data.device,
                        data.avg_speed,
                        data.count
                    );
                }
            }
            if let Some(summary) = &report.p2p_summary {
                let _ = write!(
                    content,
                    "\nTotal pairs: {}, average speed: {:.2} Gbps\n",
                    summary.total_pairs, summary.avg_speed
                );
            }
            return content;
        }

        content.push_str("## Client Data (TX)\n\n");
        match report.theoretical_bw_per_client {
            Some(theoretical) => {
                let _ = write!(
                    content,
                    "Theoretical BW per client: {:.2} Gbps (Total server BW: {:.2} Gbps ÷ {} clients)\n\n",
                    theoretical, report.total_server_bw, report.client_count
                );
            }
            None => content.push_str("Theoretical BW per client: N/A (no client reports)\n\n"),
        }
        content.push_str("| Hostname | Device | TX (Gbps) | SPEC (Gbps) | DELTA | Status |\n");
        content.push_str("|----------|--------|-----------|-------------|-------|--------|\n");
        for (hostname, devices) in &report.client_data {
            for (i, data) in devices.values().enumerate() {
                let _ = writeln!(
                    content,
                    "| {} | {} | {:.2} | {:.2} | {} | {} |",
                    first_only(hostname, i),
                    data.device,
                    data.actual_bw,
                    data.theoretical_bw,
                    format_delta(data.delta, data.delta_percent),
                    data.status
                );
            }
        }

        content.push_str("\n## Server Data (RX)\n\n");
        content.push_str("| Hostname | Device | RX (Gbps) | SPEC (Gbps) | DELTA | Status |\n");
        content.push_str("|----------|--------|-----------|-------------|-------|--------|\n");
        for (hostname, devices) in &report.server_data {
            for (i, data) in devices.values().enumerate() {
                let _ = writeln!(
                    content,
                    "| {} | {} | {:.2} | {:.2} | {} | {} |",
                    first_only(hostname, i),
                    data.device,
                    data.rx_bw,
                    data.theoretical_bw,
                    format_delta(data.delta, data.delta_percent),
                    data.status
                );
            }
        }

        content
    }

    /// Render and write the report to `path`
    pub fn write_to(report: &ReportData, path: &Path) -> Result<()> {
        std::fs::write(path, Self::render(report))
            .with_context(|| format!("Failed to write markdown report {}", path.display()))
    }
}

fn first_only(hostname: &str, index: usize) -> &str {
    if index == 0 {
        hostname
    } else {
        ""
    }
}
