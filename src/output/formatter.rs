//! Core formatting traits and implementations
//!
//! This module defines the output formatting interface and provides
//! a plain text implementation with table formatting capabilities.
//! Table layout is shared with the colored formatter; only the painting
//! of cells differs.

use super::display::PrecheckDisplayData;
use crate::{
    models::ReportData,
    types::ColorClass,
};

/// Main trait for output formatting
pub trait OutputFormatter {
    /// Format a header section
    fn format_header(&self, title: &str) -> String;

    /// Format the precheck table and its summary line
    fn format_precheck(&self, data: &PrecheckDisplayData) -> String;

    /// Format a bandwidth analysis report
    fn format_bandwidth_report(&self, report: &ReportData) -> String;

    /// Format error messages
    fn format_error(&self, error: &str) -> String;

    /// Format warning messages
    fn format_warning(&self, warning: &str) -> String;

    /// Format success messages
    fn format_success(&self, message: &str) -> String;
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    /// Column header
    pub header: String,
    /// Column alignment
    pub alignment: Alignment,
}

impl Column {
    pub fn left(header: &str) -> Self {
        Self { header: header.to_string(), alignment: Alignment::Left }
    }

    pub fn right(header: &str) -> Self {
        Self { header: header.to_string(), alignment: Alignment::Right }
    }
}

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

/// One table cell; the class is applied after padding so widths stay right
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub class: ColorClass,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), class: ColorClass::Normal }
    }

    pub fn colored(text: impl Into<String>, class: ColorClass) -> Self {
        Self { text: text.into(), class }
    }
}

/// A data row or a horizontal rule between host groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRow {
    Cells(Vec<Cell>),
    Separator,
}

/// Bordered text table
#[derive(Debug, Clone)]
pub struct TableFormat {
    pub columns: Vec<Column>,
}

impl TableFormat {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Render rows, painting each cell with `paint`
    pub fn render(&self, rows: &[TableRow], paint: &dyn Fn(&str, ColorClass) -> String) -> String {
        let widths = self.column_widths(rows);
        let border = horizontal_border(&widths);

        let mut output = String::new();
        output.push_str(&border);
        output.push('\n');

        let headers: Vec<Cell> = self.columns.iter().map(|c| Cell::plain(c.header.clone())).collect();
        output.push_str(&self.create_row(&headers, &widths, paint));
        output.push('\n');
        output.push_str(&border);
        output.push('\n');

        for row in rows {
            match row {
                TableRow::Cells(cells) => output.push_str(&self.create_row(cells, &widths, paint)),
                TableRow::Separator => output.push_str(&border),
            }
            output.push('\n');
        }

        output.push_str(&border);
        output
    }

    fn column_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| text_width(&c.header)).collect();
        for row in rows {
            if let TableRow::Cells(cells) = row {
                for (idx, cell) in cells.iter().enumerate().take(widths.len()) {
                    widths[idx] = widths[idx].max(text_width(&cell.text));
                }
            }
        }
        widths
    }

    fn create_row(&self, cells: &[Cell], widths: &[usize], paint: &dyn Fn(&str, ColorClass) -> String) -> String {
        let mut row = String::from("|");
        for (idx, &width) in widths.iter().enumerate() {
            let cell = cells.get(idx).cloned().unwrap_or_else(|| Cell::plain(""));
            let alignment = self.columns.get(idx).map(|c| c.alignment).unwrap_or(Alignment::Left);
            let padding = " ".repeat(width.saturating_sub(text_width(&cell.text)));
            let painted = paint(&cell.text, cell.class);

            row.push(' ');
            match alignment {
                Alignment::Left => {
                    row.push_str(&painted);
                    row.push_str(&padding);
                }
                Alignment::Right => {
                    row.push_str(&padding);
                    row.push_str(&painted);
                }
            }
            row.push_str(" |");
        }
        row
    }
}

fn text_width(text: &str) -> usize {
    text.chars().count()
}

fn horizontal_border(widths: &[usize]) -> String {
    let mut border = String::from("+");
    for &width in widths {
        border.push_str(&"-".repeat(width + 2));
        border.push('+');
    }
    border
}

/// Table of precheck rows with the hostname merged across consecutive rows
pub(crate) fn precheck_table(data: &PrecheckDisplayData) -> (TableFormat, Vec<TableRow>) {
    let format = TableFormat::new(vec![
        Column::left("Serial Number"),
        Column::left("Hostname"),
        Column::left("HCA"),
        Column::left("Physical State"),
        Column::left("Logical State"),
        Column::left("Speed"),
        Column::left("FW Version"),
        Column::left("Board ID"),
        Column::left("Status"),
    ]);

    let mut rows = Vec::with_capacity(data.items.len());
    let mut last_hostname: Option<&str> = None;

    for item in &data.items {
        let hostname = if last_hostname == Some(item.hostname.as_str()) {
            String::new()
        } else {
            if last_hostname.is_some() {
                rows.push(TableRow::Separator);
            }
            last_hostname = Some(item.hostname.as_str());
            item.hostname.clone()
        };

        rows.push(TableRow::Cells(vec![
            Cell::plain(item.serial_number.clone()),
            Cell::plain(hostname),
            Cell::plain(item.hca.clone()),
            Cell::plain(item.phys_state.clone()),
            Cell::plain(item.state.clone()),
            Cell::colored(item.speed.value.clone(), item.speed.class),
            Cell::colored(item.fw_ver.value.clone(), item.fw_ver.class),
            Cell::colored(item.board_id.value.clone(), item.board_id.class),
            Cell::colored(item.status.value.clone(), item.status.class),
        ]));
    }

    (format, rows)
}

/// Summary line under the precheck table
pub(crate) fn precheck_summary(data: &PrecheckDisplayData, paint: &dyn Fn(&str, ColorClass) -> String) -> String {
    format!(
        "Summary: {}, {}, {} (Total: {} HCAs)",
        paint(&format!("{} healthy", data.healthy_count), ColorClass::Success),
        paint(&format!("{} unhealthy", data.unhealthy_count), ColorClass::Error),
        paint(&format!("{} errors", data.error_count), ColorClass::Warning),
        data.total_count
    )
}

/// `delta(percent%)` as shown in the DELTA column
pub fn format_delta(delta: f64, delta_percent: f64) -> String {
    format!("{:.1}({:.0}%)", delta, delta_percent)
}

pub(crate) fn status_class(status: &str) -> ColorClass {
    if status == "OK" {
        ColorClass::Success
    } else {
        ColorClass::Error
    }
}

pub(crate) fn theoretical_line(report: &ReportData) -> String {
    match report.theoretical_bw_per_client {
        Some(theoretical) => format!(
            "Theoretical BW per client: {:.2} Gbps (Total server BW: {:.2} Gbps ÷ {} clients)",
            theoretical, report.total_server_bw, report.client_count
        ),
        None => format!(
            "Theoretical BW per client: N/A (Total server BW: {:.2} Gbps, no client reports)",
            report.total_server_bw
        ),
    }
}

/// Comparison tables: (title, format, rows) for client and server data
pub(crate) fn bandwidth_tables(report: &ReportData) -> Vec<(&'static str, TableFormat, Vec<TableRow>)> {
    let columns = |measured: &str| {
        TableFormat::new(vec![
            Column::left("Hostname"),
            Column::left("Device"),
            Column::right(measured),
            Column::right("SPEC (Gbps)"),
            Column::left("DELTA"),
            Column::left("Status"),
        ])
    };

    let client_rows = grouped_rows(report.client_data.iter().map(|(host, devices)| {
        let rows = devices
            .values()
            .map(|d| comparison_cells(&d.device, d.actual_bw, d.theoretical_bw, d.delta, d.delta_percent, &d.status))
            .collect::<Vec<_>>();
        (host.as_str(), rows)
    }));

    let server_rows = grouped_rows(report.server_data.iter().map(|(host, devices)| {
        let rows = devices
            .values()
            .map(|d| comparison_cells(&d.device, d.rx_bw, d.theoretical_bw, d.delta, d.delta_percent, &d.status))
            .collect::<Vec<_>>();
        (host.as_str(), rows)
    }));

    vec![
        ("Client Data (TX)", columns("TX (Gbps)"), client_rows),
        ("Server Data (RX)", columns("RX (Gbps)"), server_rows),
    ]
}

/// Per-device averages for point-to-point streams
pub(crate) fn p2p_table(report: &ReportData) -> Option<(TableFormat, Vec<TableRow>)> {
    let data = report.p2p_data.as_ref()?;
    let format = TableFormat::new(vec![
        Column::left("Hostname"),
        Column::left("Device"),
        Column::right("AVG (Gbps)"),
        Column::right("Samples"),
    ]);

    let rows = grouped_rows(data.iter().map(|(host, devices)| {
        let rows = devices
            .values()
            .map(|d| {
                vec![
                    Cell::plain(d.device.clone()),
                    Cell::plain(format!("{:.2}", d.avg_speed)),
                    Cell::plain(d.count.to_string()),
                ]
            })
            .collect::<Vec<_>>();
        (host.as_str(), rows)
    }));

    Some((format, rows))
}

pub(crate) fn p2p_summary_line(report: &ReportData) -> Option<String> {
    report.p2p_summary.as_ref().map(|summary| {
        format!(
            "P2P summary: {} device pairs, average {:.2} Gbps",
            summary.total_pairs, summary.avg_speed
        )
    })
}

fn comparison_cells(device: &str, measured: f64, theoretical: f64, delta: f64, delta_percent: f64, status: &str) -> Vec<Cell> {
    vec![
        Cell::plain(device),
        Cell::plain(format!("{:.2}", measured)),
        Cell::plain(format!("{:.2}", theoretical)),
        Cell::plain(format_delta(delta, delta_percent)),
        Cell::colored(status, status_class(status)),
    ]
}

/// Prefix each host's rows with the hostname on the first row only
fn grouped_rows<'a>(hosts: impl Iterator<Item = (&'a str, Vec<Vec<Cell>>)>) -> Vec<TableRow> {
    let mut rows = Vec::new();
    for (idx, (hostname, device_rows)) in hosts.enumerate() {
        if idx > 0 {
            rows.push(TableRow::Separator);
        }
        for (i, cells) in device_rows.into_iter().enumerate() {
            let host_cell = if i == 0 { Cell::plain(hostname) } else { Cell::plain("") };
            let mut row = Vec::with_capacity(cells.len() + 1);
            row.push(host_cell);
            row.extend(cells);
            rows.push(TableRow::Cells(row));
        }
    }
    rows
}

/// Plain text formatter implementation
#[derive(Debug, Clone, Default)]
pub struct PlainFormatter;

impl PlainFormatter {
    pub fn new() -> Self {
        Self
    }

    fn paint(text: &str, _class: ColorClass) -> String {
        text.to_string()
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> String {
        let border = "=".repeat(title.chars().count() + 4);
        format!("{}\n  {}  \n{}", border, title, border)
    }

    fn format_precheck(&self, data: &PrecheckDisplayData) -> String {
        let (format, rows) = precheck_table(data);
        format!(
            "{}\n\n{}",
            format.render(&rows, &Self::paint),
            precheck_summary(data, &Self::paint)
        )
    }

    fn format_bandwidth_report(&self, report: &ReportData) -> String {
        let mut sections = Vec::new();

        if let Some((format, rows)) = p2p_table(report) {
            sections.push(format!("P2P Data\n{}", format.render(&rows, &Self::paint)));
            if let Some(line) = p2p_summary_line(report) {
                sections.push(line);
            }
            return sections.join("\n\n");
        }

        sections.push(theoretical_line(report));
        for (title, format, rows) in bandwidth_tables(report) {
            sections.push(format!("{}\n{}", title, format.render(&rows, &Self::paint)));
        }
        sections.join("\n\n")
    }

    fn format_error(&self, error: &str) -> String {
        format!("ERROR: {}", error)
    }

    fn format_warning(&self, warning: &str) -> String {
        format!("WARNING: {}", warning)
    }

    fn format_success(&self, message: &str) -> String {
        format!("SUCCESS: {}", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClientDeviceData, NormalizedDeviceRecord};
    use crate::output::display::DisplayProjector;
    use crate::types::StreamType;
    use std::collections::BTreeMap;

    fn record(host: &str, hca: &str) -> NormalizedDeviceRecord {
        NormalizedDeviceRecord {
            hostname: host.to_string(),
            hca: hca.to_string(),
            phys_state: "LinkUp".to_string(),
            state: "ACTIVE".to_string(),
            speed: "400 Gb/sec".to_string(),
            fw_ver: "28.39.1002".to_string(),
            board_id: "MT_0000000838".to_string(),
            is_healthy: true,
            serial_number: "12345".to_string(),
            error: None,
        }
    }

    #[test]
    fn test_table_alignment() {
        let format = TableFormat::new(vec![Column::left("Name"), Column::right("Value")]);
        let rows = vec![TableRow::Cells(vec![Cell::plain("a"), Cell::plain("10.00")])];
        let table = format.render(&rows, &PlainFormatter::paint);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "+------+-------+");
        assert_eq!(lines[1], "| Name | Value |");
        assert_eq!(lines[3], "| a    | 10.00 |");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_precheck_merges_hostname() {
        let data = DisplayProjector::project(&[record("a", "mlx5_0"), record("a", "mlx5_1"), record("b", "mlx5_0")]);
        let output = PlainFormatter::new().format_precheck(&data);

        assert_eq!(output.matches("| a ").count(), 1);
        assert!(output.contains("[+] HEALTHY"));
        assert!(output.ends_with("Summary: 3 healthy, 0 unhealthy, 0 errors (Total: 3 HCAs)"));
    }

    #[test]
    fn test_bandwidth_report_rows() {
        let mut report = ReportData::empty(StreamType::InCast);
        report.theoretical_bw_per_client = Some(100.0);
        report.total_server_bw = 400.0;
        report.client_count = 4;
        let mut devices = BTreeMap::new();
        devices.insert(
            "mlx5_0".to_string(),
            ClientDeviceData {
                hostname: "cli-01".to_string(),
                device: "mlx5_0".to_string(),
                actual_bw: 70.0,
                theoretical_bw: 100.0,
                delta: -30.0,
                delta_percent: -30.0,
                status: "NOT OK".to_string(),
            },
        );
        report.client_data.insert("cli-01".to_string(), devices);

        let output = PlainFormatter::new().format_bandwidth_report(&report);
        assert!(output.contains("Theoretical BW per client: 100.00 Gbps (Total server BW: 400.00 Gbps ÷ 4 clients)"));
        assert!(output.contains("-30.0(-30%)"));
        assert!(output.contains("NOT OK"));
        assert!(output.contains("Server Data (RX)"));
    }

    #[test]
    fn test_delta_format() {
        assert_eq!(format_delta(-15.0, -15.0), "-15.0(-15%)");
        assert_eq!(format_delta(2.26, 2.26), "2.3(2%)");
    }
}
