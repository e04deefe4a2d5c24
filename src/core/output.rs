//! Line-oriented result sinks.
//!
//! Task bodies write one result per line (`path\ttimestamp`, match lines,
//! generated paths). Workers share one sink, so implementations must keep
//! each line whole.

use std::io::Write;
use std::sync::Mutex;

/// Destination for result lines
pub trait LineSink: Send + Sync {
    /// Write one complete line (without the trailing newline)
    fn write_line(&self, line: &str);
}

/// Writes lines to standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LineSink for StdoutSink {
    fn write_line(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{}", line) {
            tracing::warn!("failed to write result line: {}", e);
        }
    }
}

/// Collects lines in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line written so far
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

impl LineSink for MemorySink {
    fn write_line(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}
