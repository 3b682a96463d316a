// Copyright (c) 2026 sensekit contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! sensekit - headless sensing demo
//!
//! Registers simulated sensors with a [`SensorManager`], starts them and
//! prints every reading that reaches the event bus until the run duration
//! elapses or Ctrl+C is pressed.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sensekit::config::SensorsConfig;
use sensekit::sensors::{MotionSimulator, PressureSimulator, StepSimulator};
use sensekit::{
    Accelerometer, Altimeter, Config, EventBus, OutputFormat, Pedometer, Sensor, SensorData,
    SensorManager, SensorType, VERSION,
};

/// sensekit - uniform sensing over simulated backends
#[derive(Parser, Debug)]
#[command(name = "sensekit")]
#[command(version = VERSION)]
#[command(about = "Subscribe, start and stop simulated sensors from the command line")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Sensors to run, comma separated (overrides the configuration file)
    #[arg(short, long, value_delimiter = ',')]
    sensors: Vec<SensorType>,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long)]
    duration: Option<u64>,

    /// Reading output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Seed for the simulated backends
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load or create configuration
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(Level::INFO)
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("sensekit v{}", VERSION);
    info!("Configuration loaded from {:?}", config_path);

    // Override with command line args
    if !args.sensors.is_empty() {
        config.sensors.enabled = args.sensors;
    }
    if let Some(format) = args.format {
        config.output = format;
    }
    if args.seed.is_some() {
        config.sensors.seed = args.seed;
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, args.duration.map(Duration::from_secs)))
}

/// Build a simulated sensor of `sensor_type`, seeded per sensor when a seed is set
fn simulated_sensor(sensor_type: SensorType, config: &SensorsConfig) -> Result<Arc<dyn Sensor>> {
    let seed = config.seed.map(|s| s.wrapping_add(sensor_type as u64));

    let sensor: Arc<dyn Sensor> = match sensor_type {
        SensorType::Pedometer => {
            let backend = seed.map(StepSimulator::with_seed).unwrap_or_default();
            Arc::new(Pedometer::new(config.pedometer.clone(), backend)?)
        }
        SensorType::Accelerometer => {
            let backend = seed.map(MotionSimulator::with_seed).unwrap_or_default();
            Arc::new(Accelerometer::new(config.accelerometer.clone(), backend)?)
        }
        SensorType::Altimeter => {
            let backend = seed.map(PressureSimulator::with_seed).unwrap_or_default();
            Arc::new(Altimeter::new(config.altimeter.clone(), backend)?)
        }
    };
    Ok(sensor)
}

async fn run(config: Config, duration: Option<Duration>) -> Result<()> {
    let event_bus = Arc::new(EventBus::new(config.event_bus_capacity));
    let manager = SensorManager::new(event_bus.clone());

    for &sensor_type in &config.sensors.enabled {
        let sensor = simulated_sensor(sensor_type, &config.sensors)?;
        if let Err(e) = manager.register(sensor).await {
            warn!("Skipping {}: {}", sensor_type, e);
        }
    }

    let printer = tokio::spawn(print_readings(event_bus.subscribe_readings(), config.output));

    let started = manager.start_all().await;
    if started == 0 {
        warn!("No sensor could be started");
    }
    info!("{} sensor(s) running", started);
    info!("   Press Ctrl+C to shutdown");

    let deadline = async {
        match duration {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutdown signal received, cleaning up...");
        }
        _ = deadline => info!("Run duration elapsed"),
    }

    let stopped = manager.stop_all().await;
    info!("Stopped {} sensor(s)", stopped);

    printer.abort();
    info!("sensekit shutdown complete");
    Ok(())
}

async fn print_readings(mut readings: broadcast::Receiver<SensorData>, format: OutputFormat) {
    let mut headers_written = HashSet::new();

    loop {
        let reading = match readings.recv().await {
            Ok(reading) => reading,
            Err(RecvError::Lagged(n)) => {
                warn!("Output fell behind, {} readings skipped", n);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        match format {
            OutputFormat::Log => info!("{}: {:?}", reading.sensor_type(), reading.payload()),
            OutputFormat::Csv => {
                if headers_written.insert(reading.sensor_type()) {
                    println!("{}", SensorData::csv_header(reading.sensor_type()));
                }
                println!("{}", reading.to_csv());
            }
            OutputFormat::Json => match serde_json::to_string(&reading) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to encode reading: {}", e),
            },
        }
    }
}
