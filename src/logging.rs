//! Structured logging for the precheck pipeline
//!
//! Every component receives its own [`Logger`] at construction. Loggers
//! created with [`Logger::child`] share the run-scoped context (session
//! id, correlation id, extra fields) of their parent, so one precheck run
//! produces one coherent stream of entries without a global logger.

use crate::error::AppError;
use crate::models::Config;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, RwLock};
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Get ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m",
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
        }
    }

    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Component that emitted the entry, e.g. `PRECHECK`
    pub logger: String,
    pub correlation_id: Option<String>,
    pub fields: HashMap<String, serde_json::Value>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// JSON format for structured logging
    Json,
    /// Compact single-line format
    Compact,
}

/// Shared logging context for correlation and session tracking
#[derive(Debug, Default)]
struct LogContext {
    session_id: Option<String>,
    current_correlation_id: Option<String>,
    context_fields: HashMap<String, serde_json::Value>,
}

/// Logger scoped to one component of one run
#[derive(Clone)]
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
    /// When set, entries are kept here instead of written out
    capture: Option<Arc<Mutex<Vec<LogEntry>>>>,
}

impl Logger {
    /// Create a new logger
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            format: LogFormat::Console,
            name: name.into(),
            context: Arc::new(RwLock::new(LogContext::default())),
            capture: None,
        }
    }

    /// Create a logger with specific configuration
    ///
    /// Debug runs log JSON, verbose runs full console lines, and the quiet
    /// default only prints compact warnings.
    pub fn with_config(name: impl Into<String>, config: &Config) -> Self {
        let (min_level, format) = if config.debug {
            (LogLevel::Debug, LogFormat::Json)
        } else if config.verbose {
            (LogLevel::Info, LogFormat::Console)
        } else {
            (LogLevel::Warn, LogFormat::Compact)
        };

        Self {
            min_level,
            use_color: config.enable_color,
            format,
            ..Self::new(name)
        }
    }

    /// A logger that records every entry in memory, for tests
    pub fn capturing(name: impl Into<String>) -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let store = Arc::new(Mutex::new(Vec::new()));
        let logger = Self {
            min_level: LogLevel::Trace,
            capture: Some(store.clone()),
            ..Self::new(name)
        };
        (logger, store)
    }

    /// Derive a logger for another component of the same run
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    /// Set session correlation ID
    pub fn set_session_id(&self, session_id: impl Into<String>) {
        if let Ok(mut context) = self.context.write() {
            context.session_id = Some(session_id.into());
        }
    }

    /// Add context field for all subsequent log entries
    pub fn add_context_field<T: Serialize>(&self, key: &str, value: T) {
        if let Ok(json_value) = serde_json::to_value(value) {
            if let Ok(mut context) = self.context.write() {
                context.context_fields.insert(key.to_string(), json_value);
            }
        }
    }

    /// Start a correlated operation
    pub fn start_operation(&self, operation_name: &str) -> String {
        let correlation_id = Uuid::new_v4().to_string();
        if let Ok(mut context) = self.context.write() {
            context.current_correlation_id = Some(correlation_id.clone());
        }

        self.info(&format!("Started operation: {}", operation_name))
            .correlation_id(&correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "start")
            .log();

        correlation_id
    }

    /// End a correlated operation
    pub fn end_operation(&self, correlation_id: &str, operation_name: &str, success: bool) {
        self.info(&format!("Completed operation: {} (success: {})", operation_name, success))
            .correlation_id(correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "end")
            .field("success", success)
            .log();

        if let Ok(mut context) = self.context.write() {
            if context.current_correlation_id.as_deref() == Some(correlation_id) {
                context.current_correlation_id = None;
            }
        }
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn trace(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Trace, message)
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    fn write_entry(&self, mut entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }

        if let Ok(context) = self.context.read() {
            if let Some(session_id) = &context.session_id {
                entry.fields.insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
            }
            if entry.correlation_id.is_none() {
                entry.correlation_id = context.current_correlation_id.clone();
            }
            for (key, value) in &context.context_fields {
                entry.fields.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }

        if let Some(capture) = &self.capture {
            if let Ok(mut entries) = capture.lock() {
                entries.push(entry);
            }
            return;
        }

        let output = match self.format {
            LogFormat::Console => self.format_console(&entry),
            LogFormat::Json => self.format_json(&entry),
            LogFormat::Compact => self.format_compact(&entry),
        };

        // Warnings and errors go to stderr so stdout stays machine-readable
        if entry.level >= LogLevel::Warn {
            let _ = writeln!(io::stderr(), "{}", output);
        } else {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}", timestamp, formatted_level, entry.logger, entry.message);

        if let Some(correlation_id) = &entry.correlation_id {
            let short = correlation_id.get(..8).unwrap_or(correlation_id);
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let mut fields: Vec<String> = entry.fields.iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            fields.sort();
            output.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => format!("{{\"error\": \"Failed to serialize log entry\", \"message\": \"{}\"}}", entry.message),
        }
    }

    fn format_compact(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%H:%M:%S");
        format!("{} {} {}: {}",
            timestamp,
            entry.level.as_str().chars().next().unwrap_or('?'),
            entry.logger,
            entry.message
        )
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: HashMap::new(),
            },
        }
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add error information
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_exit_code", error.exit_code())
            .field("error", error.to_string())
    }

    /// Finalize and write the log entry
    pub fn log(self) {
        self.logger.write_entry(self.entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Error > LogLevel::Warn);
        assert!(LogLevel::Debug > LogLevel::Trace);
        assert_eq!(LogLevel::Warn.as_str(), "WARN");
    }

    #[test]
    fn test_with_config_levels_and_formats() {
        let mut config = Config::default();
        let quiet = Logger::with_config("T", &config);
        assert!(!quiet.would_log(LogLevel::Info));
        assert_eq!(quiet.format, LogFormat::Compact);

        config.verbose = true;
        let verbose = Logger::with_config("T", &config);
        assert!(verbose.would_log(LogLevel::Info));
        assert!(!verbose.would_log(LogLevel::Trace));
        assert_eq!(verbose.format, LogFormat::Console);

        config.debug = true;
        let debug = Logger::with_config("T", &config);
        assert!(debug.would_log(LogLevel::Debug));
        assert_eq!(debug.format, LogFormat::Json);
    }

    #[test]
    fn test_trace_entries_are_captured() {
        let (logger, entries) = Logger::capturing("EXEC");
        logger.trace("command sent").field("hostname", "node-01").log();

        let entries = entries.lock().unwrap();
        assert_eq!(entries[0].level, LogLevel::Trace);
        assert_eq!(entries[0].fields["hostname"], "node-01");
    }

    #[test]
    fn test_capture_and_fields() {
        let (logger, entries) = Logger::capturing("PRECHECK");
        logger.warn("host unreachable").field("hostname", "node-07").log();

        let entries = entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].logger, "PRECHECK");
        assert_eq!(entries[0].level, LogLevel::Warn);
        assert_eq!(entries[0].fields["hostname"], "node-07");
    }

    #[test]
    fn test_child_shares_run_context() {
        let (root, entries) = Logger::capturing("APP");
        root.set_session_id("run-1");
        let child = root.child("PARSER");
        child.add_context_field("command", "precheck");

        let correlation_id = root.start_operation("precheck");
        child.debug("parsed").log();
        root.end_operation(&correlation_id, "precheck", true);

        let entries = entries.lock().unwrap();
        let parsed = entries.iter().find(|e| e.message == "parsed").unwrap();
        assert_eq!(parsed.logger, "PARSER");
        assert_eq!(parsed.fields["session_id"], "run-1");
        assert_eq!(parsed.fields["command"], "precheck");
        // Fields added through a child reach the parent's entries too
        assert_eq!(entries[0].logger, "APP");
        assert_eq!(entries[0].fields["command"], "precheck");
        assert_eq!(parsed.correlation_id.as_deref(), Some(correlation_id.as_str()));
    }

    #[test]
    fn test_console_format_without_color() {
        let config = Config {
            enable_color: false,
            verbose: true,
            ..Config::default()
        };
        let logger = Logger::with_config("EXEC", &config);
        let entry = LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::Info,
            message: "probe sent".to_string(),
            logger: "EXEC".to_string(),
            correlation_id: Some("0123456789abcdef".to_string()),
            fields: HashMap::new(),
        };
        let line = logger.format_console(&entry);
        assert!(line.contains(" INFO [EXEC] probe sent [01234567]"));
    }
}
