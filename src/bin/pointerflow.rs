//! Pointerflow CLI - synthetic pointer telemetry from the command line
//!
//! Commands:
//! - simulate: Generate a labeled heatmap series
//! - validate: Check a simulation configuration
//! - synthesize: Append simulated MOVE rows to a telemetry log
//! - heatmap: Bin a recorded telemetry log into a heatmap

use clap::{Parser, Subcommand, ValueEnum};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pointerflow::encoder::SeriesEncoder;
use pointerflow::simulation::MinuteFrame;
use pointerflow::telemetry::{synthesize_log, TelemetryLog, TelemetryLogWriter};
use pointerflow::types::Canvas;
use pointerflow::{SimulationConfig, POINTERFLOW_VERSION, PRODUCER_NAME};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Pointerflow - regime-driven pointer trajectory simulator
#[derive(Parser)]
#[command(name = "pointerflow")]
#[command(version = POINTERFLOW_VERSION)]
#[command(about = "Simulate pointer telemetry and per-minute density heatmaps", long_about = None)]
struct Cli {
    /// Log progress to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a labeled heatmap series
    Simulate {
        #[command(flatten)]
        source: ConfigSource,

        /// Override the configured seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the configured number of minutes
        #[arg(long)]
        minutes: Option<u32>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format (defaults to json-pretty on a terminal, ndjson otherwise)
        #[arg(long)]
        output_format: Option<OutputFormat>,

        /// Thread one generator through every minute instead of per-minute seeds
        #[arg(long)]
        shared_stream: bool,

        /// Print "Minute m: label" lines to stderr
        #[arg(long)]
        summary: bool,
    },

    /// Validate a simulation configuration
    Validate {
        /// Configuration file path (use - for stdin)
        #[arg(short, long)]
        config: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Append simulated MOVE rows to a telemetry log
    Synthesize {
        #[command(flatten)]
        source: ConfigSource,

        /// Override the configured seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the configured number of minutes
        #[arg(long)]
        minutes: Option<u32>,

        /// Telemetry log to append to
        #[arg(short, long)]
        output: PathBuf,

        /// First event time, epoch seconds or RFC3339 (defaults to now)
        #[arg(long)]
        start: Option<String>,
    },

    /// Bin a recorded log's MOVE events into a heatmap
    Heatmap {
        /// Telemetry log path (use - for stdin)
        #[arg(short, long)]
        log: PathBuf,

        /// Monitor index to bin (omit for off-display events)
        #[arg(short, long)]
        monitor: Option<u32>,

        #[arg(long)]
        width: u32,

        #[arg(long)]
        height: u32,

        /// Pixels per cell
        #[arg(long)]
        scale: u32,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(clap::Args)]
struct ConfigSource {
    /// Simulation configuration file (use - for stdin)
    #[arg(short, long, conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Built-in configuration
    #[arg(long, required_unless_present = "config")]
    preset: Option<Preset>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    DeskSession,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Ndjson,
    Json,
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

fn run(cli: Cli) -> Result<(), PointerflowCliError> {
    match cli.command {
        Commands::Simulate {
            source,
            seed,
            minutes,
            output,
            output_format,
            shared_stream,
            summary,
        } => {
            let config = source.load(seed, minutes)?;
            cmd_simulate(&config, &output, output_format, shared_stream, summary)
        }
        Commands::Validate { config, json } => cmd_validate(&config, json),
        Commands::Synthesize {
            source,
            seed,
            minutes,
            output,
            start,
        } => {
            let config = source.load(seed, minutes)?;
            let start = match start {
                Some(raw) => parse_start(&raw)?,
                None => epoch_seconds(Utc::now()),
            };
            cmd_synthesize(&config, &output, start)
        }
        Commands::Heatmap {
            log,
            monitor,
            width,
            height,
            scale,
            pretty,
        } => cmd_heatmap(&log, monitor, Canvas::new(width, height), scale, pretty),
    }
}

impl ConfigSource {
    fn load(
        &self,
        seed: Option<u64>,
        minutes: Option<u32>,
    ) -> Result<SimulationConfig, PointerflowCliError> {
        let mut config = match (&self.config, self.preset) {
            (Some(path), _) => SimulationConfig::from_json(&read_input(path)?)?,
            (None, Some(Preset::DeskSession)) => SimulationConfig::desk_session(),
            (None, None) => return Err(PointerflowCliError::NoConfig),
        };
        if let Some(seed) = seed {
            config = config.with_seed(seed);
        }
        if let Some(minutes) = minutes {
            config = config.with_total_minutes(minutes);
        }
        Ok(config)
    }
}

fn cmd_simulate(
    config: &SimulationConfig,
    output: &Path,
    output_format: Option<OutputFormat>,
    shared_stream: bool,
    summary: bool,
) -> Result<(), PointerflowCliError> {
    let driver = config.driver()?;
    let frames = if shared_stream {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        driver.generate_with_rng(&mut rng)
    } else {
        driver.generate(config.seed)
    };

    if summary {
        for frame in &frames {
            eprintln!("Minute {}: {}", frame.minute, frame.label);
        }
    }

    let to_stdout = is_stdio(output);
    let format = output_format.unwrap_or(if to_stdout && atty::is(atty::Stream::Stdout) {
        OutputFormat::JsonPretty
    } else {
        OutputFormat::Ndjson
    });
    let rendered = format_output(&frames, config, format)?;

    if to_stdout {
        io::stdout().write_all(rendered.as_bytes())?;
    } else {
        fs::write(output, rendered)?;
        info!(path = %output.display(), frames = frames.len(), "series written");
    }
    Ok(())
}

fn cmd_validate(config_path: &Path, json: bool) -> Result<(), PointerflowCliError> {
    let report = match SimulationConfig::from_json(&read_input(config_path)?) {
        Ok(config) => {
            let (cols, rows) = config.canvas.grid_dims(config.scale);
            let timeline = config.regime_timeline();
            ValidationReport {
                valid: true,
                error: None,
                grid: Some([cols, rows]),
                total_minutes: Some(config.total_minutes),
                regimes: config.timeline.len(),
                timeline_span: Some(timeline.span()),
                max_points_per_minute: config
                    .timeline
                    .iter()
                    .map(|e| e.params.points_per_minute())
                    .chain(std::iter::once(config.default_regime.params.points_per_minute()))
                    .max(),
            }
        }
        Err(e) => ValidationReport {
            valid: false,
            error: Some(e.to_string()),
            grid: None,
            total_minutes: None,
            regimes: 0,
            timeline_span: None,
            max_points_per_minute: None,
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        match &report.error {
            None => {
                println!("Status:          valid");
                if let Some([cols, rows]) = report.grid {
                    println!("Grid:            {} x {}", cols, rows);
                }
                println!("Regimes:         {}", report.regimes);
                if let Some(minutes) = report.total_minutes {
                    println!("Total minutes:   {}", minutes);
                }
                if let Some(span) = report.timeline_span {
                    println!("Timeline span:   {}", span);
                }
                if let Some(points) = report.max_points_per_minute {
                    println!("Peak points/min: {}", points);
                }
            }
            Some(error) => {
                println!("Status:          invalid");
                println!("Error:           {}", error);
            }
        }
    }

    match report.error {
        Some(message) => Err(PointerflowCliError::ValidationFailed(message)),
        None => Ok(()),
    }
}

fn cmd_synthesize(
    config: &SimulationConfig,
    output: &Path,
    start: f64,
) -> Result<(), PointerflowCliError> {
    let driver = config.driver()?;
    let mut writer = TelemetryLogWriter::open(output)?;
    let rows = synthesize_log(&driver, config.seed, start, &mut writer)?;
    eprintln!("Appended {} rows to {}", rows, output.display());
    Ok(())
}

fn cmd_heatmap(
    log_path: &Path,
    monitor: Option<u32>,
    canvas: Canvas,
    scale: u32,
    pretty: bool,
) -> Result<(), PointerflowCliError> {
    canvas.validate(scale)?;
    let log = TelemetryLog::parse_bytes(&read_input_bytes(log_path)?);
    if log.is_empty() {
        return Err(PointerflowCliError::NoEvents);
    }

    let activity = log.by_monitor();
    let heatmap = log.move_heatmap(monitor, canvas, scale);
    let report = serde_json::json!({
        "producer": PRODUCER_NAME,
        "version": POINTERFLOW_VERSION,
        "canvas": canvas,
        "scale": scale,
        "monitor": monitor,
        "events": log.len(),
        "skipped_rows": log.skipped,
        "moves": activity.get(&monitor).map(|a| a.moves).unwrap_or(0),
        "grid": heatmap.to_grid(),
    });

    let rendered = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", rendered);
    Ok(())
}

fn format_output(
    frames: &[MinuteFrame],
    config: &SimulationConfig,
    format: OutputFormat,
) -> Result<String, PointerflowCliError> {
    let encoder = SeriesEncoder::new();
    let rendered = match format {
        OutputFormat::Ndjson => encoder.encode_to_ndjson(frames)?,
        OutputFormat::Json => {
            encoder.encode_to_json(frames, config.canvas, config.scale, config.seed)? + "\n"
        }
        OutputFormat::JsonPretty => {
            encoder.encode_to_json_pretty(frames, config.canvas, config.scale, config.seed)? + "\n"
        }
    };
    Ok(rendered)
}

fn is_stdio(path: &Path) -> bool {
    path.to_string_lossy() == "-"
}

fn read_input_bytes(path: &Path) -> Result<Vec<u8>, PointerflowCliError> {
    if is_stdio(path) {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read(path)?)
    }
}

fn read_input(path: &Path) -> Result<String, PointerflowCliError> {
    if is_stdio(path) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn parse_start(raw: &str) -> Result<f64, PointerflowCliError> {
    if let Ok(seconds) = raw.parse::<f64>() {
        return Ok(seconds);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| epoch_seconds(dt.with_timezone(&Utc)))
        .map_err(|e| PointerflowCliError::ParseError(format!("invalid start time '{}': {}", raw, e)))
}

fn epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}

// Error handling

#[derive(Debug)]
enum PointerflowCliError {
    Io(io::Error),
    Compute(pointerflow::ComputeError),
    Json(serde_json::Error),
    NoConfig,
    NoEvents,
    ValidationFailed(String),
    ParseError(String),
}

impl From<io::Error> for PointerflowCliError {
    fn from(e: io::Error) -> Self {
        PointerflowCliError::Io(e)
    }
}

impl From<pointerflow::ComputeError> for PointerflowCliError {
    fn from(e: pointerflow::ComputeError) -> Self {
        PointerflowCliError::Compute(e)
    }
}

impl From<serde_json::Error> for PointerflowCliError {
    fn from(e: serde_json::Error) -> Self {
        PointerflowCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PointerflowCliError> for CliError {
    fn from(e: PointerflowCliError) -> Self {
        match e {
            PointerflowCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PointerflowCliError::Compute(e) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'pointerflow validate' for details".to_string()),
            },
            PointerflowCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            PointerflowCliError::NoConfig => CliError {
                code: "NO_CONFIG".to_string(),
                message: "No configuration given".to_string(),
                hint: Some("Pass --config PATH or --preset desk-session".to_string()),
            },
            PointerflowCliError::NoEvents => CliError {
                code: "NO_EVENTS".to_string(),
                message: "No events found in telemetry log".to_string(),
                hint: Some("Ensure the log is not empty and uses the timestamp,monitor,type,x,y layout".to_string()),
            },
            PointerflowCliError::ValidationFailed(message) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message,
                hint: Some("Fix the configuration and retry".to_string()),
            },
            PointerflowCliError::ParseError(message) => CliError {
                code: "PARSE_ERROR".to_string(),
                message,
                hint: Some("Use epoch seconds or an RFC3339 timestamp".to_string()),
            },
        }
    }
}

#[derive(serde::Serialize)]
struct ValidationReport {
    valid: bool,
    error: Option<String>,
    grid: Option<[usize; 2]>,
    total_minutes: Option<u32>,
    regimes: usize,
    timeline_span: Option<u32>,
    max_points_per_minute: Option<u64>,
}
