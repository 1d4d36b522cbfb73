//! Activity log: an append-only, timestamped record of what the controller did.
//!
//! Entries are never mutated or removed. Insertion order is chronological order.

use jiff::Zoned;
use serde::Serialize;

/// Display format for entry timestamps: 24-hour time of day.
const TIME_FORMAT: &str = "%H:%M:%S";

/// How an entry should be read and styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Info,
}

impl Severity {
    /// Uppercase label shown in the log panel and in plain-text output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
            Self::Info => "INFO",
        }
    }
}

/// A single activity log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ActivityLog {
    entries: Vec<LogEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry stamped with the current local time.
    pub fn append(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Error => tracing::warn!(%message, "activity"),
            Severity::Success | Severity::Info => tracing::info!(%message, "activity"),
        }
        self.entries.push(LogEntry {
            timestamp: Zoned::now().strftime(TIME_FORMAT).to_string(),
            severity,
            message,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
