//! Log sinks.

use std::sync::Mutex;

use crate::logging::{LogEntry, LogLevel};

/// Destination for formatted log entries.
pub trait LogSink: Send + Sync {
    /// Write one entry. `formatted` is the entry rendered in the logger's format.
    fn write(&self, entry: &LogEntry, formatted: &str);
}

/// Forwards entries to `tracing` at the matching level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, entry: &LogEntry, formatted: &str) {
        let component = entry.component.as_str();
        match entry.level {
            LogLevel::Trace => tracing::trace!(component, "{}", formatted),
            LogLevel::Debug => tracing::debug!(component, "{}", formatted),
            LogLevel::Info => tracing::info!(component, "{}", formatted),
            LogLevel::Warn => tracing::warn!(component, "{}", formatted),
            LogLevel::Error => tracing::error!(component, "{}", formatted),
        }
    }
}

/// Keeps entries in memory (for tests).
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<(LogEntry, String)>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Captured entries, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.records
            .lock()
            .map(|r| r.iter().map(|(e, _)| e.clone()).collect())
            .unwrap_or_default()
    }

    /// Captured formatted lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.records
            .lock()
            .map(|r| r.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default()
    }

    /// Whether any entry's message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries().iter().any(|e| e.message.contains(needle))
    }

    /// Count entries at a level.
    pub fn count_at(&self, level: LogLevel) -> usize {
        self.entries().iter().filter(|e| e.level == level).count()
    }
}

impl LogSink for MemorySink {
    fn write(&self, entry: &LogEntry, formatted: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.push((entry.clone(), formatted.to_string()));
        }
    }
}
