//! Job log sinks
//!
//! Ingestion and removal jobs report progress as an append-only stream of
//! [`LogEntry`] records. The log is for people; nothing reads it back to make
//! decisions.

use std::sync::{Arc, Mutex};

use clidock_core::domain::log::{LogEntry, LogLevel};
use tracing::{debug, error, info, warn};

/// Destination of job log entries
pub trait LogSink: Send + Sync {
    /// Appends one entry
    fn write(&self, entry: &LogEntry);
}

/// In-memory sink
///
/// Uses Arc<Mutex<Vec<LogEntry>>> so clones share one buffer across threads.
#[derive(Clone, Default)]
pub struct InMemoryLogBuffer {
    buffer: Arc<Mutex<Vec<LogEntry>>>,
}

impl InMemoryLogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of every buffered entry
    pub fn entries(&self) -> Vec<LogEntry> {
        match self.buffer.lock() {
            Ok(buffer) => buffer.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Removes and returns every buffered entry
    pub fn drain(&self) -> Vec<LogEntry> {
        match self.buffer.lock() {
            Ok(mut buffer) => buffer.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        }
    }
}

impl LogSink for InMemoryLogBuffer {
    fn write(&self, entry: &LogEntry) {
        match self.buffer.lock() {
            Ok(mut buffer) => buffer.push(entry.clone()),
            Err(poisoned) => poisoned.into_inner().push(entry.clone()),
        }
    }
}

/// Sink forwarding entries to `tracing` at their level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn write(&self, entry: &LogEntry) {
        match entry.level {
            LogLevel::Debug => debug!(target: "clidock::job", "{}", entry.message),
            LogLevel::Info => info!(target: "clidock::job", "{}", entry.message),
            LogLevel::Warning => warn!(target: "clidock::job", "{}", entry.message),
            LogLevel::Error => error!(target: "clidock::job", "{}", entry.message),
        }
    }
}

/// Log of one job: every entry goes to the sink and is kept for the outcome
pub(crate) struct JobLog<'s> {
    sink: &'s dyn LogSink,
    entries: Vec<LogEntry>,
}

impl<'s> JobLog<'s> {
    pub fn new(sink: &'s dyn LogSink) -> Self {
        Self {
            sink,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, entry: LogEntry) {
        self.sink.write(&entry);
        self.entries.push(entry);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogEntry::info(message));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(LogEntry::warning(message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogEntry::error(message));
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }
}
