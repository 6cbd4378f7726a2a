// src/stats.rs

use crate::error::{Result, VqmError};
use crate::metrics::Metric;
use std::time::Duration;

/// Aggregated scores of one metric over one encode, already formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSummary {
    pub metric: Metric,
    pub mean: String,
    pub min: String,
    pub std_dev: String,
}

impl MetricSummary {
    /// Table cell text: `min | std_dev | mean`.
    pub fn cell(&self) -> String {
        format!("{} | {} | {}", self.min, self.std_dev, self.mean)
    }

    pub fn mean_value(&self) -> f64 {
        // The string came out of our own fixed-point formatter.
        self.mean.parse().unwrap_or(f64::NAN)
    }
}

/// Formats `value` with exactly `decimal_places` fractional digits.
///
/// Rounding is that of `format!`: the exact binary value is rounded to the
/// nearest representable decimal, ties to even. Formatting an already
/// formatted value again gives the same string.
pub fn force_decimal_places(value: f64, decimal_places: usize) -> String {
    format!("{:.*}", decimal_places, value)
}

/// Elapsed time in seconds, formatted like the other table values.
pub fn format_seconds(elapsed: Duration, decimal_places: usize) -> String {
    force_decimal_places(elapsed.as_secs_f64(), decimal_places)
}

/// Computes mean, minimum and population standard deviation of `scores`.
pub fn summarize(metric: Metric, scores: &[f64], decimal_places: usize) -> Result<MetricSummary> {
    if scores.is_empty() {
        return Err(VqmError::EmptySeries(metric.name().to_string()));
    }
    if let Some(index) = scores.iter().position(|s| !s.is_finite()) {
        return Err(VqmError::InvalidScore {
            metric: metric.name().to_string(),
            index,
        });
    }

    let count = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / count;
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    // Population variance (divide by N).
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / count;

    Ok(MetricSummary {
        metric,
        mean: force_decimal_places(mean, decimal_places),
        min: force_decimal_places(min, decimal_places),
        std_dev: force_decimal_places(variance.sqrt(), decimal_places),
    })
}
