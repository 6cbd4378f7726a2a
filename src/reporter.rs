// src/reporter.rs

use log::{debug, info, warn};

/// Sink for progress messages emitted by the aggregation pipeline.
///
/// The pipeline never logs through the global logger directly; callers pass
/// a reporter in, which keeps the core testable without installing a logger.
pub trait Reporter {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn debug(&self, message: &str);
}

/// Forwards messages to the `log` facade under a fixed target.
#[derive(Debug, Clone)]
pub struct LogReporter {
    target: &'static str,
}

impl LogReporter {
    pub fn new(target: &'static str) -> Self {
        Self { target }
    }
}

impl Default for LogReporter {
    fn default() -> Self {
        Self::new("vqmetrics::aggregator")
    }
}

impl Reporter for LogReporter {
    fn info(&self, message: &str) {
        info!(target: self.target, "{}", message);
    }

    fn warn(&self, message: &str) {
        warn!(target: self.target, "{}", message);
    }

    fn debug(&self, message: &str) {
        debug!(target: self.target, "{}", message);
    }
}
