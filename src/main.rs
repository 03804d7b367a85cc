use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::fs;
use std::path::PathBuf;

use netperf_analyzer::analysis::{self, AnalysisOptions};
use netperf_analyzer::dataset::{DatasetLoader, LoaderOptions, ParserOptions};

/// Statistical analysis for MTU / DNS-backend network test sweeps
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Root directory containing the captured dataset directories
    #[arg(short, long, default_value = "results")]
    data_dir: PathBuf,

    /// Output directory for the generated reports
    #[arg(short, long, default_value = "analysis_output")]
    output: PathBuf,

    /// Maximum datasets parsed concurrently per batch
    #[arg(short = 'j', long, default_value = "4")]
    max_parallel: usize,

    /// Abort the whole run on the first dataset failure instead of skipping
    #[arg(long)]
    fail_fast: bool,

    /// File size in bytes above which results files are parsed in streaming mode
    #[arg(long, default_value = "10485760")]
    streaming_threshold: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_level.clone())).init();

    info!("Starting network performance analysis");
    info!("Data directory: {:?}", args.data_dir);
    info!("Output directory: {:?}", args.output);

    let loader = DatasetLoader::new(LoaderOptions {
        max_parallel: args.max_parallel,
        continue_on_error: !args.fail_fast,
        parser: ParserOptions {
            streaming_threshold_bytes: args.streaming_threshold,
            ..ParserOptions::default()
        },
    });
    let datasets = loader.load_directory(&args.data_dir)?;

    let report = analysis::run_analysis(&datasets, &AnalysisOptions::default())?;

    fs::create_dir_all(&args.output)?;
    analysis::generate_json_report(&report, &args.output.join("analysis_report.json"))?;
    analysis::generate_text_report(&report, &args.output.join("analysis_report.txt"))?;

    analysis::print_summary(&report);

    info!("Analysis completed successfully");
    Ok(())
}
