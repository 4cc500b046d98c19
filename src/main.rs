// main.rs - Application Entry Point
mod config;
mod csv_logger;
mod detectors;
mod log_loader;
mod mqtt_reader;
mod parser;
mod state;

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::{
    DetectionConfig, DEFAULT_GRAVITY_REFERENCE, DEFAULT_SAMPLING_PERIOD,
    DEFAULT_THRESHOLD_DELTA_MODULO, DEFAULT_THRESHOLD_MODULO,
};
use crate::csv_logger::FeatureLogger;
use crate::detectors::classifier::DecisionPolicy;
use crate::log_loader::LogLoader;
use crate::mqtt_reader::{MqttReader, DEFAULT_BROKER_PORT, DEFAULT_TOPIC};
use crate::state::{create_shared_state, SharedState};

/// How often the live loop checks the sample counter
const LIMIT_POLL_MS: u64 = 200;

#[derive(Parser)]
#[command(name = "motion-calib")]
#[command(about = "Accelerometer motion classification & threshold calibration")]
struct Cli {
    /// Modulo threshold (T): modulo >= T counts as moving
    #[arg(long, default_value_t = DEFAULT_THRESHOLD_MODULO)]
    threshold_modulo: f64,

    /// Modulo-delta threshold: delta >= this counts as moving
    #[arg(long, default_value_t = DEFAULT_THRESHOLD_DELTA_MODULO)]
    threshold_delta_modulo: f64,

    /// Gravity reference magnitude of the sensor at rest
    #[arg(long, default_value_t = DEFAULT_GRAVITY_REFERENCE)]
    gravity_reference: f64,

    /// Time units attributed to each sample
    #[arg(long, default_value_t = DEFAULT_SAMPLING_PERIOD)]
    sampling_period: u64,

    /// Decision rule to apply
    #[arg(long, value_enum, default_value_t = DecisionPolicy::ModuloOnly)]
    policy: DecisionPolicy,

    /// Log every classified sample to a timestamped CSV file
    #[arg(long)]
    csv_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Subscribe to an MQTT broker and classify messages live")]
    Live {
        /// Broker host name or address
        broker: String,

        #[arg(long, default_value_t = DEFAULT_BROKER_PORT)]
        port: u16,

        #[arg(long, default_value = DEFAULT_TOPIC)]
        topic: String,

        /// Stop after this many samples and run calibration
        #[arg(long)]
        limit: Option<u64>,
    },
    #[command(about = "Replay a stored message log and calibrate")]
    Replay {
        /// Log file with one raw message payload per line
        file: PathBuf,

        /// Echo a diagnostic row for every sample
        #[arg(long)]
        echo: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = DetectionConfig {
        threshold_modulo: cli.threshold_modulo,
        threshold_delta_modulo: cli.threshold_delta_modulo,
        gravity_reference: cli.gravity_reference,
        sampling_period: cli.sampling_period,
        policy: cli.policy,
    };

    match cli.command {
        Commands::Live {
            broker,
            port,
            topic,
            limit,
        } => run_live(config, cli.csv_log, broker, port, topic, limit),
        Commands::Replay { file, echo } => run_replay(config, cli.csv_log, file, echo),
    }
}

fn run_live(
    config: DetectionConfig,
    csv_log: bool,
    broker: String,
    port: u16,
    topic: String,
    limit: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = create_shared_state(config);

    {
        let mut guard = state.lock().map_err(|e| e.to_string())?;
        // Live mode always echoes, like the condition-test tool
        guard.echo = true;
        if csv_log {
            attach_csv_logger(&mut guard);
        }
    }

    let mut reader = MqttReader::new(state.clone(), broker, port, topic);
    reader.start()?;

    match limit {
        Some(limit) => {
            // Poll until enough samples arrived, then calibrate
            loop {
                thread::sleep(Duration::from_millis(LIMIT_POLL_MS));
                let guard = state.lock().map_err(|e| e.to_string())?;
                if guard.samples_processed >= limit {
                    break;
                }
            }
            reader.stop();
            print_summary(&state)
        }
        None => {
            log::info!("no --limit given, classifying until interrupted");
            loop {
                thread::sleep(Duration::from_secs(30));
                let guard = state.lock().map_err(|e| e.to_string())?;
                if guard.receiver_active {
                    log::info!(
                        "{} samples classified, {} intervals completed",
                        guard.samples_processed,
                        guard.completed_intervals().len()
                    );
                }
            }
        }
    }
}

fn run_replay(
    config: DetectionConfig,
    csv_log: bool,
    file: PathBuf,
    echo: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = create_shared_state(config);

    {
        let mut guard = state.lock().map_err(|e| e.to_string())?;
        guard.echo = echo;
        if csv_log {
            attach_csv_logger(&mut guard);
        }
    }

    let stats = LogLoader::new().replay(&file, &state)?;
    log::info!(
        "replayed {} lines: {} samples, {} skipped",
        stats.lines,
        stats.samples,
        stats.decode_errors
    );

    print_summary(&state)
}

fn attach_csv_logger(guard: &mut crate::state::SessionState) {
    match FeatureLogger::new_with_timestamp() {
        Ok(logger) => guard.csv_logger = Some(logger),
        Err(e) => log::warn!("CSV logging disabled: {}", e),
    }
}

fn print_summary(state: &SharedState) -> Result<(), Box<dyn std::error::Error>> {
    let guard = state.lock().map_err(|e| e.to_string())?;

    // An interval still open at stream end is discarded, on purpose;
    // report it so the drop is visible.
    if let Some(open) = guard.open_interval() {
        log::info!(
            "discarding interval still open at stream end ({} time units)",
            open
        );
    }

    let result = match guard.calibrate() {
        Ok(result) => result,
        Err(e) => {
            eprintln!("calibration failed: {}", e);
            return Err(Box::new(e));
        }
    };

    println!();
    println!("  ╔═══════════════════════════════════════════════════╗");
    println!("  ║           📊 Calibration Summary                  ║");
    println!("  ╚═══════════════════════════════════════════════════╝");
    println!("  G (recommended threshold) : {:.2}", result.recommended_threshold);
    println!("  average                   : {:.2}", result.mean);
    println!("  stdev                     : {:.2}", result.stdev);
    println!("  shortest                  : {}", result.shortest);
    println!("  longest                   : {}", result.longest);
    println!();
    println!(
        "  samples: {}   skipped: {}   completed intervals: {}",
        guard.samples_processed,
        guard.decode_errors,
        guard.completed_intervals().len()
    );

    Ok(())
}
