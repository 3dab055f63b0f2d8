#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for land-cover classification runs.
//!
//! `lulc run` classifies every configured period and prints accuracy and
//! area results as each period completes. `lulc graph` prints the encoded
//! request graphs without contacting the platform, and `lulc check`
//! validates the configuration and input files.
//!
//! Uses `indicatif-log-bridge` (via [`lulc_cli_utils::init_logger`]) to
//! route `log` output through `indicatif::MultiProgress` so that log lines
//! and progress bars never fight for the terminal.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lulc_classification_models::metrics::SQUARE_METERS_PER_HECTARE;
use lulc_cli_utils::{IndicatifProgress, MultiProgress};
use lulc_pipeline::{
    report::{render_period, write_json},
    run::{RunInputs, build_graphs, run},
    seeds::resolve_seed,
};
use lulc_pipeline_models::PipelineConfig;

#[derive(Parser)]
#[command(name = "lulc", about = "Land-cover classification of a region across periods")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every configured period and report accuracy and areas
    Run(RunArgs),
    /// Print the encoded request graphs without contacting the platform
    Graph(GraphArgs),
    /// Validate the configuration and summarize the input files
    Check(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    /// Pipeline configuration file
    #[arg(short, long, env = "LULC_CONFIG", default_value = "lulc.toml")]
    config: PathBuf,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    config: ConfigArgs,
    /// Seed for sampling, splitting and training; random if unset
    #[arg(long)]
    seed: Option<u64>,
    /// Output directory for the report and thumbnails
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Render display layers to PNG
    #[arg(long, conflicts_with = "no_thumbnails")]
    thumbnails: bool,
    /// Skip rendering display layers
    #[arg(long)]
    no_thumbnails: bool,
}

#[derive(Args)]
struct GraphArgs {
    #[command(flatten)]
    config: ConfigArgs,
    /// Seed the graphs are built with; random if unset
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = lulc_cli_utils::init_logger("info");
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_periods(args, &multi).await?,
        Commands::Graph(args) => print_graphs(&args)?,
        Commands::Check(args) => check(&args)?,
    }

    Ok(())
}

async fn run_periods(
    args: RunArgs,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = PipelineConfig::load(&args.config.config)?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(dir) = args.output {
        config.output.dir = dir;
    }
    if args.thumbnails {
        config.output.thumbnails = true;
    }
    if args.no_thumbnails {
        config.output.thumbnails = false;
    }
    config.validate_remote()?;

    let inputs = RunInputs::load(&config)?;
    let seed = resolve_seed(config.seed);
    let engine = lulc_pipeline::connect(&config.engine)?;

    let progress = IndicatifProgress::requests_bar(multi, "Preparing requests");
    let report = run(&engine, &config, &inputs, seed, progress.as_ref(), |period| {
        multi.suspend(|| println!("{}", render_period(period)));
    })
    .await?;

    if let Some(path) = config.output.report_path() {
        write_json(&report, &path).await?;
    }

    Ok(())
}

fn print_graphs(args: &GraphArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = PipelineConfig::load(&args.config.config)?;
    let inputs = RunInputs::load(&config)?;
    let seed = resolve_seed(args.seed.or(config.seed));

    let graphs: Vec<serde_json::Value> = build_graphs(&config, &inputs, seed)?
        .iter()
        .map(lulc_pipeline::graph::ClassificationGraph::encoded)
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({ "seed": seed, "periods": graphs }))?
    );
    Ok(())
}

fn check(args: &ConfigArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = PipelineConfig::load(&args.config)?;
    if let Err(e) = config.validate_remote() {
        log::warn!("{e}; `lulc run` will fail until it is set");
    }
    let inputs = RunInputs::load(&config)?;

    println!(
        "Region: {:.2} hectares",
        inputs.region.area_square_meters() / SQUARE_METERS_PER_HECTARE
    );
    println!("Training points:");
    for (class, count) in inputs.training.class_counts() {
        println!("  {class}: {count}");
    }
    let outside = inputs.training.count_outside(&inputs.region);
    if outside > 0 {
        println!("  ({outside} outside the region)");
    }
    println!("Periods:");
    for period in &config.periods {
        println!(
            "  {}: {} ({}% max cloud)",
            period.label,
            period.date_range()?,
            period.max_cloud_percent
        );
    }
    Ok(())
}
