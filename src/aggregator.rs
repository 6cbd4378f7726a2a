// src/aggregator.rs

use crate::config::AggregatorConfig;
use crate::error::{Result, VqmError};
use crate::metrics::{self, Metric};
use crate::plot::{self, GraphRenderer, MetricGraph};
use crate::reporter::Reporter;
use crate::stats::{self, MetricSummary};
use crate::table::{self, ComparisonTable, EncodeInfo};
use std::fs;
use std::path::Path;

/// Turns one encode's metrics report into graphs and a comparison table row.
pub struct MetricsAggregator<'a> {
    config: &'a AggregatorConfig,
    reporter: &'a dyn Reporter,
    renderer: &'a dyn GraphRenderer,
}

impl<'a> MetricsAggregator<'a> {
    pub fn new(
        config: &'a AggregatorConfig,
        reporter: &'a dyn Reporter,
        renderer: &'a dyn GraphRenderer,
    ) -> Self {
        Self {
            config,
            reporter,
            renderer,
        }
    }

    /// Processes the report at `report_path` and returns the VMAF mean.
    ///
    /// Graphs go to `output_folder`. The row is checked against `table`
    /// before any graph is drawn, and the table file is rewritten only after
    /// every statistic and graph succeeded.
    /// `encode` supplies the leading columns and is required in transcoding
    /// mode.
    pub fn run(
        &self,
        report_path: &Path,
        output_folder: &Path,
        table: &mut ComparisonTable,
        encode: Option<&EncodeInfo>,
    ) -> Result<f64> {
        let requested = &self.config.metrics;
        if !requested.contains(&Metric::Vmaf) {
            return Err(VqmError::MissingPrimaryMetric(
                "VMAF is not among the requested metrics".to_string(),
            ));
        }

        let encode = if self.config.transcoding_mode {
            Some(encode.ok_or_else(|| {
                VqmError::Input("transcoding mode needs an encode parameter and time".to_string())
            })?)
        } else {
            None
        };

        let series = metrics::read_report(report_path, requested, self.reporter)?;
        let summaries = series
            .iter()
            .map(|s| stats::summarize(s.metric, &s.scores, self.config.decimal_places))
            .collect::<Result<Vec<MetricSummary>>>()?;

        let vmaf_mean = summaries
            .iter()
            .find(|s| s.metric == Metric::Vmaf)
            .map(MetricSummary::mean_value)
            .ok_or_else(|| {
                VqmError::MissingPrimaryMetric(format!(
                    "{} does not contain VMAF scores",
                    report_path.display()
                ))
            })?;

        // Schema problems must surface before any graph is written.
        let row = table.conform(table::build_row(&summaries, encode));
        table.check(&row, requested)?;
        let skipped = row.values.iter().filter(|v| *v == table::SKIPPED_CELL).count();
        if skipped > 0 {
            self.reporter.warn(&format!(
                "{} metric column(s) marked {} for {}",
                skipped,
                table::SKIPPED_CELL,
                report_path.display()
            ));
        }

        fs::create_dir_all(output_folder)?;
        for (s, summary) in series.iter().zip(&summaries) {
            self.reporter.info(&format!("Creating {} graph...", s.metric));
            let output_path = plot::graph_path(output_folder, s.metric);
            self.renderer.render_metric(&MetricGraph {
                metric: s.metric,
                frame_numbers: &s.frame_numbers,
                scores: &s.scores,
                mean: &summary.mean,
                subsample: self.config.subsample,
                output_path: &output_path,
            })?;
            self.reporter
                .debug(&format!("{}: {}", s.metric, summary.cell()));
        }

        table::append_and_persist(table, row, requested, &self.config.table_path)?;
        self.reporter.info(&format!(
            "{} has been updated.",
            self.config.table_path.display()
        ));

        Ok(vmaf_mean)
    }
}
