//! Output formatting and display system
//!
//! Precheck records are first projected into colored display rows, then
//! rendered as plain or colored tables. Bandwidth reports render as tables
//! or as a Markdown document.

pub mod display;
mod colored;
mod formatter;
mod markdown;

pub use self::colored::{ColorScheme, ColoredFormatter};
pub use display::{ColoredField, DisplayProjector, DisplayRecord, PrecheckDisplayData};
pub use formatter::{
    format_delta, Alignment, Cell, Column, OutputFormatter, PlainFormatter, TableFormat, TableRow,
};
pub use markdown::{MarkdownExporter, DEFAULT_MARKDOWN_FILE};

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool) -> Box<dyn OutputFormatter> {
        if enable_color && ColoredFormatter::supports_color() {
            Box::new(ColoredFormatter::new())
        } else {
            Box::new(PlainFormatter::new())
        }
    }
}
