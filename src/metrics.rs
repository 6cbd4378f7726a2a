// src/metrics.rs

use crate::error::{Result, VqmError};
use crate::reporter::Reporter;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;

// --- Metric Identifiers ---

/// Quality metrics the libvmaf report can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    Vmaf,
    Psnr,
    Ssim,
    MsSsim,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Vmaf, Metric::Psnr, Metric::Ssim, Metric::MsSsim];

    /// Name used in table headers, titles and graph file names.
    pub fn name(self) -> &'static str {
        match self {
            Metric::Vmaf => "VMAF",
            Metric::Psnr => "PSNR",
            Metric::Ssim => "SSIM",
            Metric::MsSsim => "MS-SSIM",
        }
    }

    /// Key libvmaf uses for this metric inside each frame's `metrics` object.
    pub fn report_key(self) -> &'static str {
        match self {
            Metric::Vmaf => "vmaf",
            Metric::Psnr => "psnr_y",
            Metric::Ssim => "float_ssim",
            Metric::MsSsim => "float_ms_ssim",
        }
    }

    fn from_report_key(key: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.report_key() == key)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// --- Data Structures ---

/// One frame's measurements, restricted to the metrics we understand.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMetricSample {
    pub frame_number: u64,
    pub scores: BTreeMap<Metric, f64>,
}

/// Per-frame scores of one metric in report order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    pub metric: Metric,
    pub frame_numbers: Vec<u64>,
    pub scores: Vec<f64>,
}

// Shape of the libvmaf JSON log; top-level keys other than `frames` are ignored.
#[derive(Deserialize, Debug)]
struct ReportDocument {
    frames: Vec<FrameEntry>,
}

#[derive(Deserialize, Debug)]
struct FrameEntry {
    #[serde(rename = "frameNum")]
    frame_num: u64,
    metrics: HashMap<String, f64>,
}

// --- Core Functions ---

/// Reads a libvmaf JSON report and extracts one series per requested metric.
///
/// Presence is decided by the first frame: a requested metric the first
/// frame does not carry is skipped with a warning. A metric the first frame
/// carries but a later frame lacks makes the report invalid, so every
/// returned series has one score per frame.
pub fn read_report(
    path: &Path,
    requested: &[Metric],
    reporter: &dyn Reporter,
) -> Result<Vec<MetricSeries>> {
    reporter.debug(&format!("Reading metrics report: {}", path.display()));
    let content = fs::read_to_string(path).map_err(|e| VqmError::ReportNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;

    let samples = parse_report(&content, path)?;
    extract_series(&samples, requested, path, reporter)
}

/// Parses report text into frame samples, validating frame ordering.
pub fn parse_report(content: &str, path: &Path) -> Result<Vec<FrameMetricSample>> {
    let parse_err = |reason: String| VqmError::ReportParse {
        path: path.to_path_buf(),
        reason,
    };

    let document: ReportDocument =
        serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?;

    if document.frames.is_empty() {
        return Err(parse_err("report contains no frames".to_string()));
    }

    let mut samples = Vec::with_capacity(document.frames.len());
    let mut previous: Option<u64> = None;
    for entry in document.frames {
        if let Some(prev) = previous {
            if entry.frame_num <= prev {
                return Err(parse_err(format!(
                    "frame numbers must be strictly increasing (frame {} follows {})",
                    entry.frame_num, prev
                )));
            }
        }
        previous = Some(entry.frame_num);

        let scores = entry
            .metrics
            .iter()
            .filter_map(|(key, value)| Metric::from_report_key(key).map(|m| (m, *value)))
            .collect();
        samples.push(FrameMetricSample {
            frame_number: entry.frame_num,
            scores,
        });
    }

    Ok(samples)
}

fn extract_series(
    samples: &[FrameMetricSample],
    requested: &[Metric],
    path: &Path,
    reporter: &dyn Reporter,
) -> Result<Vec<MetricSeries>> {
    let Some(first) = samples.first() else {
        return Ok(Vec::new());
    };

    let frame_numbers: Vec<u64> = samples.iter().map(|s| s.frame_number).collect();
    let mut series = Vec::with_capacity(requested.len());

    for &metric in requested {
        if !first.scores.contains_key(&metric) {
            reporter.warn(&format!(
                "{} was requested but is not present in {}; skipping it for this encode.",
                metric,
                path.display()
            ));
            continue;
        }

        let scores = samples
            .iter()
            .map(|sample| {
                sample.scores.get(&metric).copied().ok_or_else(|| VqmError::ReportParse {
                    path: path.to_path_buf(),
                    reason: format!(
                        "{} ({}) missing from frame {}",
                        metric,
                        metric.report_key(),
                        sample.frame_number
                    ),
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        series.push(MetricSeries {
            metric,
            frame_numbers: frame_numbers.clone(),
            scores,
        });
    }

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::testing::RecordingReporter;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const REPORT: &str = r#"{
        "version": "2.3.1",
        "frames": [
            {"frameNum": 0, "metrics": {"integer_motion": 0.0, "psnr_y": 40.5, "vmaf": 90.0}},
            {"frameNum": 8, "metrics": {"integer_motion": 1.2, "psnr_y": 41.5, "vmaf": 92.0}},
            {"frameNum": 16, "metrics": {"integer_motion": 1.1, "psnr_y": 42.5, "vmaf": 94.0}}
        ],
        "pooled_metrics": {"vmaf": {"min": 90.0, "max": 94.0, "mean": 92.0}}
    }"#;

    #[test]
    fn reads_requested_series_in_request_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        fs::write(&path, REPORT).unwrap();
        let reporter = RecordingReporter::default();

        let series = read_report(&path, &[Metric::Psnr, Metric::Vmaf], &reporter).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].metric, Metric::Psnr);
        assert_eq!(series[0].scores, vec![40.5, 41.5, 42.5]);
        assert_eq!(series[1].metric, Metric::Vmaf);
        assert_eq!(series[1].frame_numbers, vec![0, 8, 16]);
        assert!(reporter.warnings.borrow().is_empty());
    }

    #[test]
    fn metric_absent_from_first_frame_is_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        fs::write(&path, REPORT).unwrap();
        let reporter = RecordingReporter::default();

        let series = read_report(&path, &[Metric::Vmaf, Metric::Ssim], &reporter).unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].metric, Metric::Vmaf);
        let warnings = reporter.warnings.borrow();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("SSIM"));
    }

    #[test]
    fn metric_missing_from_later_frame_is_a_parse_error() {
        let content = r#"{"frames": [
            {"frameNum": 0, "metrics": {"vmaf": 90.0, "float_ssim": 0.99}},
            {"frameNum": 1, "metrics": {"vmaf": 91.0}}
        ]}"#;
        let path = PathBuf::from("report.json");
        let samples = parse_report(content, &path).unwrap();
        let reporter = RecordingReporter::default();

        let err = extract_series(&samples, &[Metric::Ssim], &path, &reporter).unwrap_err();
        assert!(matches!(err, VqmError::ReportParse { .. }));
    }

    #[test]
    fn missing_file_is_report_not_found() {
        let dir = tempdir().unwrap();
        let reporter = RecordingReporter::default();
        let err = read_report(&dir.path().join("absent.json"), &[Metric::Vmaf], &reporter)
            .unwrap_err();
        assert!(matches!(err, VqmError::ReportNotFound { .. }));
    }

    #[test]
    fn malformed_documents_are_parse_errors() {
        let path = PathBuf::from("report.json");
        for content in [
            "not json",
            r#"{"pooled_metrics": {}}"#,
            r#"{"frames": []}"#,
            r#"{"frames": [{"frameNum": 0}]}"#,
            r#"{"frames": [{"frameNum": 3, "metrics": {}}, {"frameNum": 3, "metrics": {}}]}"#,
        ] {
            let err = parse_report(content, &path).unwrap_err();
            assert!(
                matches!(err, VqmError::ReportParse { .. }),
                "expected parse error for {content}"
            );
        }
    }
}
