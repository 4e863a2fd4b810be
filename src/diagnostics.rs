//! Diagnostics sink for recoverable failures.
//!
//! Stores and the initializer never raise recoverable errors to their
//! callers. They report them here instead and carry on with the last
//! known-good state.

use std::sync::{Mutex, PoisonError};

/// Fire-and-forget warning/error channel.
pub trait Diagnostics: Send + Sync {
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Emits diagnostics as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// Severity of a recorded diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Warn,
    Error,
}

/// Captures diagnostics in memory, also forwarding them to `tracing`.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    entries: Mutex<Vec<(Level, String)>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded entries in order.
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded warning messages.
    pub fn warnings(&self) -> Vec<String> {
        self.messages(Level::Warn)
    }

    /// Recorded error messages.
    pub fn errors(&self) -> Vec<String> {
        self.messages(Level::Error)
    }

    fn messages(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message)
            .collect()
    }

    fn record(&self, level: Level, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn warn(&self, message: &str) {
        TracingDiagnostics.warn(message);
        self.record(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        TracingDiagnostics.error(message);
        self.record(Level::Error, message);
    }
}
