// src/config.rs

use crate::cli::CliArgs;
use crate::metrics::Metric;
use std::path::PathBuf;

pub const DEFAULT_TABLE_NAME: &str = "Table.txt";

/// Settings the aggregation pipeline needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Requested metrics in table order. VMAF must be present.
    pub metrics: Vec<Metric>,
    pub decimal_places: usize,
    /// Adds the encode parameter and encoding time columns to every row.
    pub transcoding_mode: bool,
    pub output_dir: PathBuf,
    pub table_path: PathBuf,
    pub subsample: u32,
    pub parameter_label: String,
}

impl AggregatorConfig {
    pub fn from_args(args: &CliArgs) -> Self {
        let output_dir = args.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        let table_path = args
            .table
            .clone()
            .unwrap_or_else(|| output_dir.join(DEFAULT_TABLE_NAME));

        Self {
            metrics: requested_metrics(args.psnr, args.ssim, args.ms_ssim),
            decimal_places: args.decimal_places,
            transcoding_mode: !args.no_transcoding_mode,
            output_dir,
            table_path,
            subsample: args.subsample,
            parameter_label: args.parameter_label.clone(),
        }
    }
}

/// VMAF first, then the optional metrics in a fixed order.
pub fn requested_metrics(psnr: bool, ssim: bool, ms_ssim: bool) -> Vec<Metric> {
    let mut metrics = vec![Metric::Vmaf];
    if psnr {
        metrics.push(Metric::Psnr);
    }
    if ssim {
        metrics.push(Metric::Ssim);
    }
    if ms_ssim {
        metrics.push(Metric::MsSsim);
    }
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn vmaf_is_always_requested_first() {
        assert_eq!(requested_metrics(false, false, false), vec![Metric::Vmaf]);
        assert_eq!(
            requested_metrics(true, false, true),
            vec![Metric::Vmaf, Metric::Psnr, Metric::MsSsim]
        );
    }

    #[test]
    fn table_defaults_into_output_dir() {
        let args = CliArgs::parse_from(["vqmetrics", "--output-dir", "results", "--ssim", "a.json"]);
        let config = AggregatorConfig::from_args(&args);

        assert_eq!(config.table_path, PathBuf::from("results").join(DEFAULT_TABLE_NAME));
        assert_eq!(config.metrics, vec![Metric::Vmaf, Metric::Ssim]);
        assert!(config.transcoding_mode);
        assert_eq!(config.decimal_places, 2);
        assert_eq!(config.parameter_label, "CRF");
    }

    #[test]
    fn no_transcoding_mode_drops_leading_columns() {
        let args = CliArgs::parse_from(["vqmetrics", "--no-transcoding-mode", "a.json"]);
        assert!(!AggregatorConfig::from_args(&args).transcoding_mode);
    }
}
