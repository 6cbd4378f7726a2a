// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VqmError {
    #[error("Metrics report not found or unreadable: {path}: {source}")]
    ReportNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse metrics report {path}: {reason}")]
    ReportParse { path: PathBuf, reason: String },

    #[error("No {0} scores to summarize")]
    EmptySeries(String),

    #[error("Non-finite {metric} score at index {index}")]
    InvalidScore { metric: String, index: usize },

    #[error("VMAF is the primary metric and must be computed: {0}")]
    MissingPrimaryMetric(String),

    #[error("Failed to write comparison table {path}: {source}")]
    TableWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Comparison table schema mismatch: {0}")]
    TableSchema(String),

    #[error("Failed to parse comparison table: {0}")]
    TableParse(String),

    #[error("Plotting error: {0}")]
    Plot(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input error: {0}")]
    Input(String),
}

// Define a standard Result type for the crate
pub type Result<T> = std::result::Result<T, VqmError>;
