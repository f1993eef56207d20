//! Pluggable, leveled log sink.
//!
//! The tree filters by [`NavigationConfig::allows`](waypoint_core::NavigationConfig::allows)
//! before a record is built, so sinks never see lines below the configured
//! level. Logging is purely diagnostic: no sink result feeds back into
//! navigation.
//!
//! | Sink | Use |
//! |------|-----|
//! | [`TracingLogSink`] | default; forwards to `tracing` |
//! | [`MemoryLogSink`] | tests; keeps owned copies |
//! | [`NullLogSink`] | discard everything |

use std::fmt;
use std::sync::{Mutex, PoisonError};

use waypoint_core::LogLevel;

use crate::manager::ManagerId;

/// One log line from a manager.
#[derive(Debug, Clone, Copy)]
pub struct LogRecord<'a> {
    pub level: LogLevel,
    pub manager: ManagerId,
    /// The manager's human-readable identifier.
    pub identifier: &'a str,
    pub message: &'a str,
}

/// Destination for navigation log lines.
pub trait LogSink: Send + Sync {
    fn log(&self, record: &LogRecord<'_>);
}

/// Forwards records to `tracing`.
///
/// `Verbose` maps to `trace`, `Critical` to `error` with `critical = true`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&self, record: &LogRecord<'_>) {
        let manager = record.identifier;
        let id = record.manager.get();
        match record.level {
            LogLevel::Verbose => {
                tracing::trace!(target: "waypoint", manager, id, "{}", record.message);
            }
            LogLevel::Info => {
                tracing::info!(target: "waypoint", manager, id, "{}", record.message);
            }
            LogLevel::Error => {
                tracing::error!(target: "waypoint", manager, id, "{}", record.message);
            }
            LogLevel::Critical => {
                tracing::error!(
                    target: "waypoint",
                    manager,
                    id,
                    critical = true,
                    "{}",
                    record.message
                );
            }
        }
    }
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogSink;

impl LogSink for NullLogSink {
    fn log(&self, _record: &LogRecord<'_>) {}
}

/// Owned copy of a [`LogRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedLogRecord {
    pub level: LogLevel,
    pub manager: ManagerId,
    pub identifier: String,
    pub message: String,
}

impl fmt::Display for OwnedLogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.identifier, self.message)
    }
}

/// Keeps records in memory for assertions.
///
/// Share it with the tree through an `Arc` and keep a clone of the `Arc`:
///
/// ```
/// use std::sync::Arc;
/// use waypoint_runtime::{MemoryLogSink, NavigationTree};
/// use waypoint_core::{LogLevel, NavigationConfig};
///
/// let sink = Arc::new(MemoryLogSink::new());
/// let mut tree = NavigationTree::new(NavigationConfig::default())
///     .with_log_sink(sink.clone());
/// let id = tree.create_manager(Some("tab"));
/// tree.manager_mut(id).unwrap().navigate_back();
/// assert_eq!(sink.count_at(LogLevel::Critical), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    records: Mutex<Vec<OwnedLogRecord>>,
}

impl MemoryLogSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every record so far.
    #[must_use]
    pub fn records(&self) -> Vec<OwnedLogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of records at exactly `level`.
    #[must_use]
    pub fn count_at(&self, level: LogLevel) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.level == level)
            .count()
    }

    /// Whether any record's message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|r| r.message.contains(needle))
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl LogSink for MemoryLogSink {
    fn log(&self, record: &LogRecord<'_>) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(OwnedLogRecord {
                level: record.level,
                manager: record.manager,
                identifier: record.identifier.to_string(),
                message: record.message.to_string(),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(level: LogLevel, message: &str) -> LogRecord<'_> {
        LogRecord {
            level,
            manager: ManagerId::from_raw(3),
            identifier: "tab",
            message,
        }
    }

    #[test]
    fn memory_sink_keeps_records() {
        let sink = MemoryLogSink::new();
        sink.log(&record(LogLevel::Info, "pushed Home"));
        sink.log(&record(LogLevel::Critical, "ledger mismatch"));
        assert_eq!(sink.records().len(), 2);
        assert_eq!(sink.count_at(LogLevel::Critical), 1);
        assert!(sink.contains("mismatch"));
        assert_eq!(
            sink.records()[0].to_string(),
            "[info] tab: pushed Home"
        );
        sink.clear();
        assert!(sink.records().is_empty());
    }

    #[test]
    fn tracing_sink_accepts_every_level() {
        let subscriber = tracing_subscriber::registry();
        tracing::subscriber::with_default(subscriber, || {
            for level in [
                LogLevel::Verbose,
                LogLevel::Info,
                LogLevel::Error,
                LogLevel::Critical,
            ] {
                TracingLogSink.log(&record(level, "hello"));
            }
        });
    }

    #[test]
    fn null_sink_is_silent() {
        NullLogSink.log(&record(LogLevel::Critical, "ignored"));
    }
}
