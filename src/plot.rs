// src/plot.rs

use crate::error::{Result, VqmError};
use crate::metrics::Metric;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

const GRAPH_SIZE: (u32, u32) = (1280, 720);

/// Everything needed to draw one metric's per-frame graph.
#[derive(Debug, Clone, Copy)]
pub struct MetricGraph<'a> {
    pub metric: Metric,
    pub frame_numbers: &'a [u64],
    pub scores: &'a [f64],
    /// Formatted mean shown in the legend.
    pub mean: &'a str,
    pub subsample: u32,
    pub output_path: &'a Path,
}

/// Draws per-metric graphs for the aggregator.
pub trait GraphRenderer {
    fn render_metric(&self, graph: &MetricGraph<'_>) -> Result<()>;
}

/// Renders PNG files with plotters.
///
/// Every call opens its own bitmap surface, so renders never share state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlottersRenderer;

impl GraphRenderer for PlottersRenderer {
    fn render_metric(&self, graph: &MetricGraph<'_>) -> Result<()> {
        render_graph(
            graph.metric,
            graph.frame_numbers,
            graph.scores,
            graph.mean,
            graph.subsample,
            graph.output_path,
        )
    }
}

/// Path of the graph for `metric` inside an encode's output folder.
pub fn graph_path(output_folder: &Path, metric: Metric) -> PathBuf {
    output_folder.join(format!("{}.png", metric.name()))
}

/// Draws a line graph of score against frame number.
pub fn render_graph(
    metric: Metric,
    x_values: &[u64],
    y_values: &[f64],
    mean_value: &str,
    subsample: u32,
    output_path: &Path,
) -> Result<()> {
    // --- 1. Validate Data ---
    if x_values.len() != y_values.len() {
        return Err(VqmError::Plot(format!(
            "{} graph has {} frame numbers but {} scores",
            metric,
            x_values.len(),
            y_values.len()
        )));
    }
    let (Some(&x_min), Some(&x_max)) = (x_values.first(), x_values.last()) else {
        return Err(VqmError::Plot(format!("No {} scores to plot", metric)));
    };
    if y_values.iter().any(|y| !y.is_finite()) {
        return Err(VqmError::Plot(format!("{} scores contain non-finite values", metric)));
    }

    let y_min = y_values.iter().copied().fold(f64::INFINITY, f64::min);
    let y_max = y_values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let padding = if y_max > y_min { (y_max - y_min) * 0.05 } else { 1.0 };
    let (x_min, x_max) = frame_range(x_min, x_max);

    // --- 2. Setup Plot ---
    let root = BitMapBackend::new(output_path, GRAPH_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| VqmError::Plot(format!("Failed to fill plot background: {}", e)))?;

    let caption = format!("{} (n_subsample: {})", metric, subsample);
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 24).into_font())
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, (y_min - padding)..(y_max + padding))
        .map_err(|e| VqmError::Plot(format!("Failed to build chart: {}", e)))?;

    chart
        .configure_mesh()
        .x_desc("Frame Number")
        .y_desc(metric.name())
        .y_label_formatter(&|y: &f64| format!("{:.2}", y))
        .axis_desc_style(("sans-serif", 16))
        .label_style(("sans-serif", 14))
        .draw()
        .map_err(|e| VqmError::Plot(format!("Failed to draw mesh: {:?}", e)))?;

    // --- 3. Draw Series ---
    chart
        .draw_series(LineSeries::new(
            x_values.iter().copied().zip(y_values.iter().copied()),
            BLUE.mix(0.8).stroke_width(1),
        ))
        .map_err(|e| VqmError::Plot(format!("Failed to draw {} series: {:?}", metric, e)))?
        .label(format!("{} ({})", metric, mean_value))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.filled()));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .margin(10)
        .label_font(("sans-serif", 12))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| VqmError::Plot(format!("Failed to draw legend: {:?}", e)))?;

    // --- 4. Finalize ---
    root.present().map_err(|e| VqmError::Plot(format!("Failed to save plot: {:?}", e)))?;
    Ok(())
}

// A single-frame report still needs a non-empty x range.
fn frame_range(first: u64, last: u64) -> (u64, u64) {
    if last > first {
        (first, last)
    } else if first < u64::MAX {
        (first, first + 1)
    } else {
        (first - 1, first)
    }
}

/// Draws one bar per encode, e.g. mean VMAF for each CRF value.
pub fn render_bar_graph(
    title: &str,
    x_label: &str,
    y_label: &str,
    labels: &[String],
    values: &[f64],
    output_path: &Path,
) -> Result<()> {
    if labels.len() != values.len() {
        return Err(VqmError::Plot(format!(
            "Bar graph has {} labels but {} values",
            labels.len(),
            values.len()
        )));
    }
    if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
        return Err(VqmError::Plot("Bar graph needs finite values".to_string()));
    }

    let min_value = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max_value = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (y_min, y_max) = (min_value - 1.0, max_value.ceil() + 1.0);

    let root = BitMapBackend::new(output_path, GRAPH_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| VqmError::Plot(format!("Failed to fill plot background: {}", e)))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24).into_font())
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d((0..labels.len()).into_segmented(), y_min..y_max)
        .map_err(|e| VqmError::Plot(format!("Failed to build chart: {}", e)))?;

    let x_label_format = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .x_label_formatter(&x_label_format)
        .axis_desc_style(("sans-serif", 16))
        .label_style(("sans-serif", 14))
        .draw()
        .map_err(|e| VqmError::Plot(format!("Failed to draw mesh: {:?}", e)))?;

    chart
        .draw_series(values.iter().enumerate().map(|(i, v)| {
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), y_min), (SegmentValue::Exact(i + 1), *v)],
                BLUE.mix(0.8).filled(),
            );
            bar.set_margin(0, 0, 10, 10);
            bar
        }))
        .map_err(|e| VqmError::Plot(format!("Failed to draw bars: {:?}", e)))?;

    chart
        .draw_series(values.iter().enumerate().map(|(i, v)| {
            Text::new(
                format!("{:.2}", v),
                (SegmentValue::CenterOf(i), *v),
                ("sans-serif", 12).into_font(),
            )
        }))
        .map_err(|e| VqmError::Plot(format!("Failed to draw bar labels: {:?}", e)))?;

    root.present().map_err(|e| VqmError::Plot(format!("Failed to save plot: {:?}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn graph_file_is_named_after_the_metric() {
        let path = graph_path(Path::new("out/crf23"), Metric::MsSsim);
        assert_eq!(path, Path::new("out/crf23/MS-SSIM.png"));
    }

    #[test]
    fn mismatched_series_are_rejected_before_drawing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("VMAF.png");
        let err = render_graph(Metric::Vmaf, &[0, 1], &[90.0], "90.00", 1, &path).unwrap_err();
        assert!(matches!(err, VqmError::Plot(_)));
        assert!(!path.exists());
    }

    #[test]
    fn empty_series_are_rejected_before_drawing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("PSNR.png");
        let err = render_graph(Metric::Psnr, &[], &[], "0.00", 8, &path).unwrap_err();
        assert!(matches!(err, VqmError::Plot(_)));
        assert!(!path.exists());
    }

    #[test]
    fn frame_range_is_never_empty() {
        assert_eq!(frame_range(0, 16), (0, 16));
        assert_eq!(frame_range(7, 7), (7, 8));
        assert_eq!(frame_range(u64::MAX, u64::MAX), (u64::MAX - 1, u64::MAX));
    }

    #[test]
    fn consecutive_graphs_render_to_separate_files() {
        let dir = tempdir().unwrap();
        let frames = [0, 8, 16, 24];
        let vmaf_path = graph_path(dir.path(), Metric::Vmaf);
        let psnr_path = graph_path(dir.path(), Metric::Psnr);

        render_graph(Metric::Vmaf, &frames, &[90.0, 92.5, 94.0, 91.0], "91.88", 8, &vmaf_path)
            .unwrap();
        PlottersRenderer
            .render_metric(&MetricGraph {
                metric: Metric::Psnr,
                frame_numbers: &frames,
                scores: &[40.0, 41.0, 42.0, 41.5],
                mean: "41.12",
                subsample: 8,
                output_path: &psnr_path,
            })
            .unwrap();

        for path in [&vmaf_path, &psnr_path] {
            let len = std::fs::metadata(path).unwrap().len();
            assert!(len > 0, "{} is empty", path.display());
        }
    }

    #[test]
    fn single_frame_graph_renders() {
        let dir = tempdir().unwrap();
        let path = graph_path(dir.path(), Metric::Ssim);
        render_graph(Metric::Ssim, &[42], &[0.97], "0.97", 1, &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn bar_graph_renders_one_bar_per_encode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("VMAF vs CRF.png");
        let labels = vec!["18".to_string(), "23".to_string(), "28".to_string()];
        render_bar_graph("VMAF vs CRF", "CRF", "VMAF", &labels, &[97.2, 94.5, 90.1], &path)
            .unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn bar_graph_requires_aligned_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bars.png");
        let labels = vec!["18".to_string(), "23".to_string()];
        let err = render_bar_graph("VMAF vs CRF", "CRF", "VMAF", &labels, &[95.0], &path)
            .unwrap_err();
        assert!(matches!(err, VqmError::Plot(_)));
    }
}
