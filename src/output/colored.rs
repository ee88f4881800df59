//! Colored formatter implementation with terminal color support
//!
//! Same layout as the plain formatter; cells tagged with a
//! [`ColorClass`] are painted through `colored`.

use super::display::PrecheckDisplayData;
use super::formatter::{
    bandwidth_tables, p2p_summary_line, p2p_table, precheck_summary, precheck_table,
    theoretical_line, OutputFormatter,
};
use crate::{models::ReportData, types::ColorClass};
use colored::*;

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            muted: Color::BrightBlack,
        }
    }
}

impl ColorScheme {
    /// Terminal color for a class, `None` leaves the text untouched
    pub fn color_for(&self, class: ColorClass) -> Option<Color> {
        match class {
            ColorClass::Success => Some(self.success),
            ColorClass::Warning => Some(self.warning),
            ColorClass::Error => Some(self.error),
            ColorClass::Normal => None,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    pub fn new() -> Self {
        Self::with_color_scheme(ColorScheme::default())
    }

    /// Create a colored formatter with custom color scheme
    pub fn with_color_scheme(color_scheme: ColorScheme) -> Self {
        Self { color_scheme }
    }

    fn paint(&self, text: &str, class: ColorClass) -> String {
        match self.color_scheme.color_for(class) {
            Some(color) => text.color(color).to_string(),
            None => text.to_string(),
        }
    }

    fn section_title(&self, title: &str) -> String {
        title.color(self.color_scheme.header).bold().to_string()
    }

    /// Check if the terminal supports colors
    pub fn supports_color() -> bool {
        std::env::var("NO_COLOR").is_err()
            && std::env::var("TERM").map(|term| term != "dumb").unwrap_or(true)
    }
}

impl Default for ColoredFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> String {
        let border = "=".repeat(title.chars().count() + 4);
        format!(
            "{}\n  {}  \n{}",
            border.color(self.color_scheme.muted),
            title.color(self.color_scheme.header).bold(),
            border.color(self.color_scheme.muted)
        )
    }

    fn format_precheck(&self, data: &PrecheckDisplayData) -> String {
        let paint = |text: &str, class: ColorClass| self.paint(text, class);
        let (format, rows) = precheck_table(data);
        format!(
            "{}\n\n{}",
            format.render(&rows, &paint),
            precheck_summary(data, &paint)
        )
    }

    fn format_bandwidth_report(&self, report: &ReportData) -> String {
        let paint = |text: &str, class: ColorClass| self.paint(text, class);
        let mut sections = Vec::new();

        if let Some((format, rows)) = p2p_table(report) {
            sections.push(format!("{}\n{}", self.section_title("P2P Data"), format.render(&rows, &paint)));
            if let Some(line) = p2p_summary_line(report) {
                sections.push(line);
            }
            return sections.join("\n\n");
        }

        sections.push(theoretical_line(report));
        for (title, format, rows) in bandwidth_tables(report) {
            sections.push(format!("{}\n{}", self.section_title(title), format.render(&rows, &paint)));
        }
        sections.join("\n\n")
    }

    fn format_error(&self, error: &str) -> String {
        format!("{} {}", "ERROR:".color(self.color_scheme.error).bold(), error)
    }

    fn format_warning(&self, warning: &str) -> String {
        format!("{} {}", "WARNING:".color(self.color_scheme.warning).bold(), warning)
    }

    fn format_success(&self, message: &str) -> String {
        format!("{} {}", "SUCCESS:".color(self.color_scheme.success).bold(), message)
    }
}
