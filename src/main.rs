//! Temper Sanitizer CLI
//!
//! Verify that a temperature was held long enough.

use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use temper_sanitizer::{
    collector::{Collector, CollectorConfig},
    config::{Config, ConfigError, Settings},
    core::{BakeMonitor, EndReason, Mode, TickOutcome, WriteSink},
    sensor::{HwmonSensor, ReplaySensor, SensorError, SimulatedSensor, TemperatureSource},
    stats::create_shared_stats,
    NO_DEVICE_MESSAGE, VERSION,
};
use tracing_subscriber::EnvFilter;

const EXIT_DEVICE_UNAVAILABLE: i32 = 2;
const EXIT_READ_FAILED: i32 = 7;
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser)]
#[command(name = "temper-sanitizer")]
#[command(version = VERSION)]
#[command(about = "Verify that a temperature was held long enough", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor a bake or chill until it completes
    Run {
        #[command(flatten)]
        settings: SettingsArgs,

        /// Where readings come from
        #[arg(long, value_enum, default_value = "hwmon")]
        source: SourceKind,

        /// hwmon temp*_input file to read (auto-detected if not specified)
        #[arg(long)]
        device: Option<PathBuf>,

        /// Recording to replay (one reading per line, in the configured scale)
        #[arg(long)]
        replay: Option<PathBuf>,

        /// Milliseconds between readings
        #[arg(long, default_value = "1000")]
        sample_period_ms: u64,

        /// Export the session report as JSON to the export path
        #[arg(long)]
        export: bool,
    },

    /// List available temperature devices
    Devices,

    /// Show configuration
    Config {
        #[command(flatten)]
        settings: SettingsArgs,

        /// Persist the effective settings
        #[arg(long)]
        save: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    Hwmon,
    Replay,
    Simulated,
}

/// Overrides applied on top of the settings file.
#[derive(Args, Clone, Default)]
struct SettingsArgs {
    /// Settings file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target temperature
    #[arg(long)]
    target: Option<f64>,

    /// Temperature scale (fahrenheit, f, celcius, c)
    #[arg(long)]
    scale: Option<String>,

    /// Window length in seconds
    #[arg(long)]
    interval: Option<u64>,

    /// Seconds the criterion must hold continuously
    #[arg(long)]
    min_time: Option<u64>,

    /// Comparison operator (<, <=, >, >=)
    #[arg(long, allow_hyphen_values = true)]
    compare: Option<String>,

    /// Window statistic (min, max, average)
    #[arg(long)]
    stat: Option<String>,

    /// Directory for exported reports
    #[arg(long)]
    export_path: Option<PathBuf>,
}

impl SettingsArgs {
    fn settings_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Settings::config_path)
    }

    /// Load the settings file and apply command-line overrides.
    fn resolve(&self) -> Result<Settings, ConfigError> {
        let mut settings = Settings::load_from(&self.settings_path())?;
        if let Some(target) = self.target {
            settings.target = target;
        }
        if let Some(ref scale) = self.scale {
            settings.scale = scale.clone();
        }
        if let Some(interval) = self.interval {
            settings.interval = interval;
        }
        if let Some(min_time) = self.min_time {
            settings.min_time = min_time;
        }
        if let Some(ref compare) = self.compare {
            settings.compare_op = compare.clone();
        }
        if let Some(ref stat) = self.stat {
            settings.use_stat = stat.clone();
        }
        if let Some(ref export_path) = self.export_path {
            settings.export_path = export_path.clone();
        }
        Ok(settings)
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            settings,
            source,
            device,
            replay,
            sample_period_ms,
            export,
        } => {
            cmd_run(&settings, source, device, replay, sample_period_ms, export);
        }
        Commands::Devices => {
            cmd_devices();
        }
        Commands::Config { settings, save } => {
            cmd_config(&settings, save);
        }
    }
}

/// Log to stderr so status lines on stdout stay clean.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_run(
    args: &SettingsArgs,
    source_kind: SourceKind,
    device: Option<PathBuf>,
    replay: Option<PathBuf>,
    sample_period_ms: u64,
    export: bool,
) {
    let config = match args.resolve().and_then(Config::try_from) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    };

    let source = match open_source(&config, source_kind, device, replay) {
        Ok(source) => source,
        Err(SensorError::NotFound(detail)) => {
            eprintln!("Error: {detail}");
            eprintln!("{NO_DEVICE_MESSAGE}");
            std::process::exit(EXIT_DEVICE_UNAVAILABLE);
        }
        Err(e) => {
            eprintln!("Error opening device: {e}");
            std::process::exit(EXIT_DEVICE_UNAVAILABLE);
        }
    };

    let mode = config.comparison.mode();
    println!("#Temper Sanitizer v{VERSION}");
    println!("#  Device: {}", source.name());
    println!(
        "#  {}: {} {} {}{}",
        mode.term(),
        config.statistic,
        config.comparison,
        config.target,
        config.scale.symbol()
    );
    println!(
        "#  Window: {}s, minimum {}: {}s ({}m)",
        config.interval_secs,
        mode.term_lower(),
        config.min_total_secs,
        config.min_total_secs as f64 / 60.0
    );
    println!("#  Press Ctrl+C to stop");

    let stats = create_shared_stats();
    let mut monitor = BakeMonitor::with_stats(&config, stats.clone());
    tracing::debug!("Session {} started", monitor.session_id());

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    let mut collector = Collector::new(
        source,
        CollectorConfig {
            sample_period: Duration::from_millis(sample_period_ms.max(1)),
        },
    );
    if let Err(e) = collector.start() {
        eprintln!("Error starting collector: {e}");
        std::process::exit(1);
    }

    let receiver = collector.receiver().clone();
    let mut out = WriteSink::stdout();

    let end_reason = loop {
        if !running.load(Ordering::SeqCst) {
            break EndReason::Interrupted;
        }

        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(Ok(reading)) => {
                if monitor.feed(reading.celsius, reading.timestamp, &mut out)
                    == TickOutcome::SessionComplete
                {
                    break EndReason::Completed;
                }
            }
            Ok(Err(e)) => {
                let err = monitor.read_failed(e, Utc::now());
                tracing::error!("{err}");
                break err.end_reason();
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                let err = monitor.read_failed(
                    SensorError::Read("collector disconnected unexpectedly".to_string()),
                    Utc::now(),
                );
                tracing::error!("{err}");
                break err.end_reason();
            }
        }
    };

    collector.stop();

    let report = monitor.finish(end_reason);
    for line in report.lines() {
        println!("{line}");
    }

    if export {
        match report.export(&config.export_path) {
            Ok(path) => println!("#Exported report to {path:?}"),
            Err(e) => eprintln!("Error writing report: {e}"),
        }
    }

    println!();
    println!("{}", stats.summary());

    let code = match report.end_reason {
        EndReason::Completed => 0,
        EndReason::Interrupted => EXIT_INTERRUPTED,
        EndReason::ReadFailed { .. } => EXIT_READ_FAILED,
    };
    std::process::exit(code);
}

/// Open the reading source selected on the command line.
fn open_source(
    config: &Config,
    kind: SourceKind,
    device: Option<PathBuf>,
    replay: Option<PathBuf>,
) -> Result<Box<dyn TemperatureSource>, SensorError> {
    match kind {
        SourceKind::Hwmon => {
            let sensor = match device {
                Some(path) => HwmonSensor::open(path)?,
                None => HwmonSensor::discover()?,
            };
            Ok(Box::new(sensor))
        }
        SourceKind::Replay => {
            let path = replay.ok_or_else(|| {
                SensorError::NotFound("--source replay requires --replay <file>".to_string())
            })?;
            Ok(Box::new(ReplaySensor::from_file(&path, config.scale)?))
        }
        SourceKind::Simulated => {
            // Settle just past the target so the simulated run can succeed.
            let margin = match config.comparison.mode() {
                Mode::Bake => 2.0,
                Mode::Chill => -2.0,
            };
            let setpoint = config.scale.to_celsius(config.target) + margin;
            Ok(Box::new(SimulatedSensor::new(20.0, setpoint)))
        }
    }
}

fn cmd_devices() {
    let sensors = HwmonSensor::list();
    if sensors.is_empty() {
        eprintln!("{NO_DEVICE_MESSAGE}");
        std::process::exit(EXIT_DEVICE_UNAVAILABLE);
    }

    println!("Temperature Devices");
    println!("===================");
    println!();
    for info in sensors {
        let reading = HwmonSensor::open(&info.path)
            .and_then(|mut sensor| sensor.read_celsius())
            .map(|c| format!("{c:.1}°C"))
            .unwrap_or_else(|e| format!("unreadable ({e})"));
        println!("  {}", info.path.display());
        println!("    {}: {reading}", info.display_name());
    }
}

fn cmd_config(args: &SettingsArgs, save: bool) {
    let settings = match args.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    };

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", args.settings_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&settings).unwrap_or_else(|_| "Error".to_string())
    );
    println!();

    let validation = Config::try_from(settings.clone());
    match &validation {
        Ok(config) => println!(
            "Valid: {} when {} {} {} for {}s",
            config.comparison.mode().term(),
            config.statistic,
            config.comparison,
            config.target,
            config.min_total_secs
        ),
        Err(e) => println!("Invalid: {e}"),
    }

    if save {
        if let Err(e) = validation {
            eprintln!("Refusing to save invalid settings: {e}");
            std::process::exit(e.exit_code());
        }
        if let Err(e) = settings.save_to(&args.settings_path()) {
            eprintln!("Error saving config: {e}");
            std::process::exit(1);
        }
        println!("Saved to {:?}", args.settings_path());
    }
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    }) {
        tracing::warn!("Could not set Ctrl+C handler: {e}");
    }
}
