//! Deploy progress reporting
//!
//! The deployer reports progress as ordered, human-readable lines. A
//! [`Reporter`] decides where they go: [`TracingReporter`] forwards them to
//! `tracing`, [`RecordingReporter`] keeps them in memory.

use parking_lot::Mutex;

/// Highlight color attached to a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Yellow,
}

/// Presentation hints for one message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// Only shown when verbose output is requested
    pub verbose: bool,
    pub color: Option<Color>,
}

impl LogOptions {
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            color: None,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

/// Sink for deploy progress messages
pub trait Reporter: Send + Sync {
    fn log(&self, message: &str, options: LogOptions);
}

/// Forwards messages to `tracing`
///
/// Red maps to `error`, yellow to `warn`, other verbose messages to `debug`
/// and everything else to `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn log(&self, message: &str, options: LogOptions) {
        match options.color {
            Some(Color::Red) => tracing::error!(target: "asset_sync::deploy", "{}", message),
            Some(Color::Yellow) => tracing::warn!(target: "asset_sync::deploy", "{}", message),
            _ if options.verbose => tracing::debug!(target: "asset_sync::deploy", "{}", message),
            _ => tracing::info!(target: "asset_sync::deploy", "{}", message),
        }
    }
}

/// A message captured by [`RecordingReporter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub message: String,
    pub options: LogOptions,
}

/// Keeps every message in arrival order
#[derive(Debug, Default)]
pub struct RecordingReporter {
    entries: Mutex<Vec<Recorded>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Recorded> {
        self.entries.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|entry| entry.message.clone())
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn log(&self, message: &str, options: LogOptions) {
        self.entries.lock().push(Recorded {
            message: message.to_string(),
            options,
        });
    }
}
