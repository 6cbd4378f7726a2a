mod aggregator;
mod cli;
mod config;
mod error;
mod metrics;
mod plot;
mod reporter;
mod stats;
mod table;

use crate::aggregator::MetricsAggregator;
use crate::cli::CliArgs;
use crate::config::AggregatorConfig;
use crate::error::{Result, VqmError};
use crate::plot::PlottersRenderer;
use crate::reporter::LogReporter;
use crate::table::{ComparisonTable, EncodeInfo};
use chrono::Local;
use log::{error, info, LevelFilter};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

fn main() -> ExitCode {
    let start_time = Instant::now();

    // Parse arguments first to potentially setup logging based on them
    let args = cli::parse_args();

    if let Err(e) = setup_logging(&args) {
        eprintln!("Error setting up logging: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Starting vqmetrics...");
    info!("Arguments: {:?}", args);

    match run(args) {
        Ok(()) => {
            let duration = start_time.elapsed();
            info!("Completed successfully in {:.2?}", duration);
            ExitCode::SUCCESS
        }
        Err(e) => {
            let duration = start_time.elapsed();
            error!("Failed after {:.2?}: {}", duration, e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up logging to console and optionally to a file.
fn setup_logging(args: &CliArgs) -> std::result::Result<(), fern::InitError> {
    let base_config = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(LevelFilter::Info)
        .level_for("vqmetrics", LevelFilter::Debug);

    let console_config = fern::Dispatch::new().chain(std::io::stdout());
    let mut logger = base_config.chain(console_config);

    let mut log_path = None;
    if args.log {
        let log_filename = format!("vqmetrics_{}.log", Local::now().format("%Y%m%d_%H%M%S"));
        let path = args
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(log_filename);
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        logger = logger.chain(fern::Dispatch::new().chain(fern::log_file(&path)?));
        log_path = Some(path);
    }

    logger.apply()?;
    if let Some(path) = log_path {
        info!("Logging to file: {}", path.display());
    }
    Ok(())
}

/// Evaluates every report in order, then summarizes the run.
fn run(args: CliArgs) -> Result<()> {
    let config = AggregatorConfig::from_args(&args);
    let encodes = encode_infos(&args, &config)?;

    if !config.output_dir.exists() {
        info!("Creating output directory: {}", config.output_dir.display());
        fs::create_dir_all(&config.output_dir)?;
    }

    let mut table = ComparisonTable::new();
    table.set_info(table_info(&args, &config));

    let reporter = LogReporter::default();
    let renderer = PlottersRenderer;
    let aggregator = MetricsAggregator::new(&config, &reporter, &renderer);

    let mut results: Vec<(String, f64)> = Vec::with_capacity(args.reports.len());
    for (index, report) in args.reports.iter().enumerate() {
        let encode = encodes.get(index);
        let name = match encode {
            Some(e) => e.parameter.clone(),
            None => report_stem(report),
        };
        info!("Processing metrics for {} ({})", name, report.display());

        let output_folder = config.output_dir.join(&name);
        let vmaf = aggregator.run(report, &output_folder, &mut table, encode)?;
        info!("Mean VMAF for {}: {}", name, vmaf);
        results.push((name, vmaf));
    }

    if let Some((name, vmaf)) = best_encode(&results) {
        info!("Highest mean VMAF: {} ({})", vmaf, name);
    }

    if config.transcoding_mode && results.len() > 1 {
        let graph_path = config
            .output_dir
            .join(format!("VMAF vs {}.png", config.parameter_label));
        let (labels, values): (Vec<String>, Vec<f64>) = results.into_iter().unzip();
        plot::render_bar_graph(
            &format!("VMAF vs {}", config.parameter_label),
            &config.parameter_label,
            "VMAF",
            &labels,
            &values,
            &graph_path,
        )?;
        info!("Generated comparison graph: {}", graph_path.display());
    }

    let persisted = ComparisonTable::load(&config.table_path)?;
    info!(
        "Comparison table saved to {} ({} rows, {} info lines)",
        config.table_path.display(),
        persisted.rows().len(),
        persisted.info().len()
    );
    if let Some(title) = persisted.title() {
        info!("{}", title);
    }
    info!("Columns: {}", persisted.columns().join(", "));
    Ok(())
}

/// Pairs each report with its encode parameter and time in transcoding mode.
fn encode_infos(args: &CliArgs, config: &AggregatorConfig) -> Result<Vec<EncodeInfo>> {
    if !config.transcoding_mode {
        return Ok(Vec::new());
    }

    let count = args.reports.len();
    if args.encode_parameters.len() != count || args.times_taken.len() != count {
        return Err(VqmError::Input(format!(
            "{} reports need {} --encode-parameter and --time-taken values (got {} and {})",
            count,
            count,
            args.encode_parameters.len(),
            args.times_taken.len()
        )));
    }

    args.encode_parameters
        .iter()
        .zip(&args.times_taken)
        .map(|(parameter, &secs)| {
            let time_taken = Duration::try_from_secs_f64(secs)
                .map_err(|e| VqmError::Input(format!("Invalid encoding time {}: {}", secs, e)))?;
            Ok(EncodeInfo {
                parameter_label: config.parameter_label.clone(),
                parameter: parameter.clone(),
                time_taken: stats::format_seconds(time_taken, config.decimal_places),
            })
        })
        .collect()
}

/// Footer lines written beneath the table.
fn table_info(args: &CliArgs, config: &AggregatorConfig) -> Vec<(String, String)> {
    let mut info = Vec::new();
    if let Some(source) = &args.source {
        info.push(("File Transcoded".to_string(), source.clone()));
    }
    if let Some(bitrate) = &args.bitrate {
        info.push(("Bitrate".to_string(), bitrate.clone()));
    }
    if let Some(encoder) = &args.encoder {
        info.push(("Encoder used for the transcodes".to_string(), encoder.clone()));
    }
    if config.transcoding_mode {
        info.push(("Encode parameter".to_string(), config.parameter_label.clone()));
        info.push((
            "Filter(s) used".to_string(),
            args.filters.clone().unwrap_or_else(|| "None".to_string()),
        ));
    }
    info.push(("n_subsample".to_string(), config.subsample.to_string()));
    info
}

fn report_stem(report: &std::path::Path) -> String {
    report
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "report".to_string())
}

/// Highest VMAF wins; ties keep the earlier encode.
fn best_encode(results: &[(String, f64)]) -> Option<&(String, f64)> {
    results
        .iter()
        .fold(None, |best: Option<&(String, f64)>, candidate| match best {
            Some(b) if b.1 >= candidate.1 => Some(b),
            _ => Some(candidate),
        })
}
