// src/cli.rs

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Per-frame libvmaf JSON reports, one per encode, in evaluation order
    #[arg(required = true)]
    pub reports: Vec<PathBuf>,

    /// Include PSNR (psnr_y) in the table and graphs
    #[arg(long)]
    pub psnr: bool,

    /// Include SSIM (float_ssim) in the table and graphs
    #[arg(long)]
    pub ssim: bool,

    /// Include MS-SSIM (float_ms_ssim) in the table and graphs
    #[arg(long = "ms-ssim")]
    pub ms_ssim: bool,

    /// Number of digits after the decimal point for every table value
    #[arg(long, default_value_t = 2)]
    pub decimal_places: usize,

    /// Reports do not come from transcodes; omit the parameter and time columns
    #[arg(long)]
    pub no_transcoding_mode: bool,

    /// Encode parameter (e.g. CRF or preset value) for each report, in order
    #[arg(long = "encode-parameter", value_name = "VALUE")]
    pub encode_parameters: Vec<String>,

    /// Encoding time in seconds for each report, in order
    #[arg(long = "time-taken", value_name = "SECONDS")]
    pub times_taken: Vec<f64>,

    /// Header of the encode parameter column
    #[arg(long, default_value = "CRF")]
    pub parameter_label: String,

    /// Frame sampling interval the reports were computed with
    #[arg(long, default_value_t = 1)]
    pub subsample: u32,

    /// Specify output directory for graphs and the table (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Comparison table file (default: <output-dir>/Table.txt)
    #[arg(long, value_name = "FILE")]
    pub table: Option<PathBuf>,

    /// Source video name recorded under the table
    #[arg(long)]
    pub source: Option<String>,

    /// Bitrate of the source video recorded under the table
    #[arg(long)]
    pub bitrate: Option<String>,

    /// Encoder used for the transcodes, recorded under the table
    #[arg(long)]
    pub encoder: Option<String>,

    /// Video filters used for the transcodes, recorded under the table
    #[arg(long)]
    pub filters: Option<String>,

    /// Enable logging to file (e.g., vqmetrics_YYYYMMDD_HHMMSS.log)
    #[arg(long)]
    pub log: bool,
}

pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
