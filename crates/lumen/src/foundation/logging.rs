//! Logging utilities and the error router
//!
//! Recoverable failures (application callbacks, missing glyphs, font loading)
//! never unwind through the frame loop. They are turned into an
//! [`ErrorRecord`] and handed to the [`ErrorRouter`], whose sink can be
//! replaced at runtime. The default sink forwards records to `log`.

use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let _ = env_logger::try_init();
}

/// Stable error codes reported through the router
pub mod codes {
    /// GLFW could not be initialized
    pub const GLFW_INIT: &str = "GLFW_INIT";
    /// The window or its GL context could not be created
    pub const GLFW_WINDOW_INIT: &str = "GLFW_WINDOW_INIT";
    /// Application `start` failed
    pub const APP_START: &str = "APP_START";
    /// Application `update` failed
    pub const APP_UPDATE: &str = "APP_UPDATE";
    /// Application `draw` failed
    pub const APP_DRAW: &str = "APP_DRAW";
    /// Application `exit` failed
    pub const APP_EXIT: &str = "APP_EXIT";
    /// A per-tick looper failed
    pub const LOOPER: &str = "LOOPER";
    /// Flushing batches to the GPU failed
    pub const RENDER_FLUSH: &str = "RENDER_FLUSH";
    /// A font atlas or metrics file could not be loaded
    pub const FONT_LOAD: &str = "FONT_LOAD";
    /// A character has no glyph in the font
    pub const GLYPH_MISSING: &str = "GLYPH_MISSING";
}

/// How bad a reported error is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Something was skipped, rendering continues
    Warning,
    /// A callback or resource failed, the loop continues
    Recoverable,
    /// The engine cannot continue meaningfully
    Fatal,
}

/// A single structured error report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// Stable code, see [`codes`]
    pub code: &'static str,
    /// Severity of the failure
    pub severity: Severity,
    /// Human readable description
    pub message: String,
}

impl ErrorRecord {
    /// Create a new record
    pub fn new(code: &'static str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Destination for routed errors
pub trait ErrorSink: Send + Sync {
    /// Receive one record
    fn report(&self, record: &ErrorRecord);
}

/// Default sink: forwards records to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ErrorSink for LogSink {
    fn report(&self, record: &ErrorRecord) {
        match record.severity {
            Severity::Warning => log::warn!(target: "lumen::errors", "{record}"),
            Severity::Recoverable | Severity::Fatal => {
                log::error!(target: "lumen::errors", "{record}");
            }
        }
    }
}

/// Sink that keeps every record in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<ErrorRecord>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records received so far
    pub fn records(&self) -> Vec<ErrorRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Number of records carrying `code`
    pub fn count(&self, code: &str) -> usize {
        self.records().iter().filter(|r| r.code == code).count()
    }
}

impl ErrorSink for MemorySink {
    fn report(&self, record: &ErrorRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}

/// Shared handle to the active error sink
///
/// Clones share the same sink, so replacing it through any handle affects
/// every component that holds one.
#[derive(Clone)]
pub struct ErrorRouter {
    sink: Arc<RwLock<Arc<dyn ErrorSink>>>,
}

impl Default for ErrorRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ErrorRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorRouter").finish_non_exhaustive()
    }
}

impl ErrorRouter {
    /// Create a router with the default [`LogSink`] installed
    pub fn new() -> Self {
        Self::with_sink(LogSink)
    }

    /// Create a router with a custom sink
    pub fn with_sink(sink: impl ErrorSink + 'static) -> Self {
        Self {
            sink: Arc::new(RwLock::new(Arc::new(sink))),
        }
    }

    /// Replace the sink for every clone of this router
    pub fn set_sink(&self, sink: impl ErrorSink + 'static) {
        if let Ok(mut current) = self.sink.write() {
            *current = Arc::new(sink);
        }
    }

    /// Route a record to the active sink
    pub fn report(&self, record: ErrorRecord) {
        let sink = match self.sink.read() {
            Ok(sink) => Arc::clone(&sink),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        };
        sink.report(&record);
    }

    /// Route an error value under `code`
    pub fn send(&self, code: &'static str, severity: Severity, error: &dyn fmt::Display) {
        self.report(ErrorRecord::new(code, severity, error.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_collects_records() {
        let sink = MemorySink::new();
        let router = ErrorRouter::with_sink(sink.clone());

        router.report(ErrorRecord::new(codes::APP_DRAW, Severity::Recoverable, "boom"));
        router.send(codes::GLYPH_MISSING, Severity::Warning, &"no glyph");

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].code, codes::APP_DRAW);
        assert_eq!(records[1].severity, Severity::Warning);
        assert_eq!(sink.count(codes::GLYPH_MISSING), 1);
    }

    #[test]
    fn test_replacing_sink_affects_clones() {
        let router = ErrorRouter::new();
        let clone = router.clone();

        let sink = MemorySink::new();
        router.set_sink(sink.clone());
        clone.report(ErrorRecord::new(codes::LOOPER, Severity::Recoverable, "late"));

        assert_eq!(sink.count(codes::LOOPER), 1);
    }

    #[test]
    fn test_record_display_includes_code() {
        let record = ErrorRecord::new(codes::GLFW_INIT, Severity::Fatal, "no display");
        assert_eq!(record.to_string(), "[GLFW_INIT] no display");
    }
}
