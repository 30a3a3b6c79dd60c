//! Log sinks: where assembled messages go

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::Level;

/// Destination for assembled log messages
pub trait LogSink: Send + Sync {
    /// Emit one message at debug severity
    fn emit(&self, message: &str);

    /// Whether emitted messages would be recorded at all
    fn enabled(&self) -> bool {
        true
    }
}

/// Emits through `tracing` at debug level, target `request_logging`
#[derive(Debug, Default)]
pub struct TracingSink {
    total_entries: AtomicU64,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages emitted so far
    pub fn total_entries(&self) -> u64 {
        self.total_entries.load(Ordering::Relaxed)
    }
}

impl LogSink for TracingSink {
    fn emit(&self, message: &str) {
        self.total_entries.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(target: "request_logging", "{}", message);
    }

    fn enabled(&self) -> bool {
        tracing::enabled!(target: "request_logging", Level::DEBUG)
    }
}
