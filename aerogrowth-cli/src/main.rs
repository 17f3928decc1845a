//! aerogrowth CLI
//!
//! Detects particle-growth events in a size-distribution record and reports
//! their growth rates.
#![allow(clippy::struct_excessive_bools)]

use aerogrowth_algorithms::{timestamp_info, EventSynthesizer};
use aerogrowth_core::{AnalysisConfig, GrowthDetector};
use aerogrowth_io::plan::NO_EVENTS_TEXT;
use aerogrowth_io::{open_loader, RecordedDetections, ReportStatus, Reporter, ResultWriter};
use clap::{Args, Parser, Subcommand};
use log::{debug, info};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    AerogrowthIo(#[from] aerogrowth_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] aerogrowth_core::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("missing {0}: give it on the command line or in the config file")]
    Missing(&'static str),
}

/// Particle growth event detection for aerosol size distributions.
#[derive(Parser)]
#[command(name = "aerogrowth")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find growth events in a record
    Run(RunArgs),

    /// Show information about a size-distribution record
    Info {
        /// Input record (.nc/.h5 or delimited text)
        input: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input record, overrides the config file
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Start date (YYYY-MM-DD[ HH:MM:SS])
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD[ HH:MM:SS])
    #[arg(long)]
    end: Option<String>,

    /// Detections JSON produced by the peak detectors and line fitters
    #[arg(short, long)]
    detections: PathBuf,

    /// Directory for JSON artifacts
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Highest diameter channel (nm) a growth line may start from
    #[arg(long)]
    max_start_channel: Option<f64>,

    /// Print final events
    #[arg(long)]
    print_events: bool,

    /// Print the per-timestamp breakdown
    #[arg(long)]
    print_timestamps: bool,

    /// Save final events as JSON
    #[arg(long)]
    save_events: bool,

    /// Save the per-timestamp breakdown as JSON
    #[arg(long)]
    save_timestamps: bool,

    /// Render every line of every method instead of events
    #[arg(long)]
    plot_all_lines: bool,

    /// Render all detected events
    #[arg(long)]
    plot_all_events: bool,

    /// Render raw peaks that no line absorbed
    #[arg(long)]
    plot_all_points: bool,

    /// Annotate rendered events with their growth-rate range
    #[arg(long)]
    plot_event_info: bool,

    /// Write the render plan as JSON
    #[arg(long)]
    plan: bool,
}

impl RunArgs {
    /// Loads the config file, if any, and applies command-line overrides.
    fn resolve(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let file = std::fs::File::open(path)?;
                serde_json::from_reader(std::io::BufReader::new(file))?
            }
            None => AnalysisConfig::default(),
        };

        if let Some(input) = &self.input {
            config.input.clone_from(input);
        }
        if let Some(start) = &self.start {
            config.start_date.clone_from(start);
        }
        if let Some(end) = &self.end {
            config.end_date.clone_from(end);
        }
        if let Some(nm) = self.max_start_channel {
            config = config.with_maximum_growth_start_channel(nm);
        }

        let results = &mut config.results;
        results.print_final_event_info |= self.print_events;
        results.print_ts_info |= self.print_timestamps;
        results.save_final_event_info |= self.save_events;
        results.save_ts_info |= self.save_timestamps;
        results.plot_all_lines |= self.plot_all_lines;
        results.plot_all_events |= self.plot_all_events;
        results.plot_all_points |= self.plot_all_points;
        results.plot_event_info |= self.plot_event_info;

        if config.input.as_os_str().is_empty() {
            return Err(CliError::Missing("input"));
        }
        if config.start_date.is_empty() {
            return Err(CliError::Missing("start date"));
        }
        if config.end_date.is_empty() {
            config.end_date.clone_from(&config.start_date);
        }
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn run(args: &RunArgs) -> Result<()> {
    let config = args.resolve()?;
    config.validate()?;
    let window = config.window()?;

    let loader = open_loader(&config.input)?;
    info!(
        "loading {} with the {} loader",
        config.input.display(),
        loader.name()
    );
    let surfaces = loader.load(&window)?;
    debug!(
        "padded surface {}x{}, display surface {}x{}",
        surfaces.padded.n_times(),
        surfaces.padded.n_diameters(),
        surfaces.display.n_times(),
        surfaces.display.n_diameters()
    );

    let detector = RecordedDetections::from_path(&args.detections)?;
    let detections = detector.detect(&surfaces.padded, &config.thresholds())?;
    detections.assert_contract();

    let epoch = surfaces.epoch();
    let sets = EventSynthesizer::new(config.events.clone()).init_events(
        &surfaces.padded,
        &surfaces.display,
        &epoch,
        &detections.mode_fitting.lines,
        &detections.max_concentration.lines,
        &detections.appearance_time.lines,
        &detections.mc_area_edges,
        config.maximum_growth_start_channel,
    );
    let timestamps = timestamp_info(&sets.all_events);

    let results = &config.results;
    let reporter = Reporter::new(results, &surfaces, &detections);
    let writer = ResultWriter::for_run(&args.output_dir, &config.input, &window);

    match reporter.status(&sets) {
        ReportStatus::Events(count) => info!("{count} final growth events"),
        ReportStatus::NoEvents => info!("{NO_EVENTS_TEXT}"),
    }
    if results.print_final_event_info {
        print!("{}", reporter.final_event_report(&sets.final_events));
    }
    if results.print_ts_info {
        print!("{}", reporter.timestamp_report(&timestamps));
    }
    reporter.save(&sets, &timestamps, &writer)?;

    if args.plan {
        if let Some(plan) = reporter.render_plan(&sets) {
            writer.write_plan(&plan)?;
        }
    }
    Ok(())
}

fn show_info(input: &Path) -> Result<()> {
    let loader = open_loader(input)?;
    let grid = loader.grid()?;

    println!("File: {}", input.display());
    println!("Loader: {}", loader.name());
    println!("Timestamps: {}", grid.recorded().len());
    if let Some((first, last)) = grid.period() {
        println!("Period: {first} - {last}");
    }
    let (channels, range) = grid.channel_summary();
    println!("Diameter channels: {channels}");
    if let Some((min, max)) = range {
        println!("Diameter range: {min:.2} - {max:.2} nm");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run(args) => run(&args)?,
        Commands::Info { input } => show_info(&input)?,
    }

    Ok(())
}
