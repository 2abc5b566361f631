mod config;
mod sim;

use anyhow::{bail, Context, Result};
use clap::Parser;
use envwatch_connectors::telemetry_client;
use envwatch_core::sensors::SensorBoard;
use envwatch_core::time::SystemClock;
use envwatch_core::{Monitor, MonitorSettings, NetworkLink, TelemetryApi};
use log::{info, warn};
use sim::{LogIndicators, SimClimate, SimMic};
use std::path::PathBuf;

/// Polls the sensors, compares each reading against the server thresholds and
/// reports every violation.
#[derive(Parser, Debug)]
#[command(name = "envwatch-node", version)]
struct Cli {
    /// JSON device configuration; ENVWATCH_* variables and .env override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Stop after N ticks (default: run forever).
    #[arg(long, conflicts_with = "once")]
    ticks: Option<u64>,
    /// Run a single tick and exit.
    #[arg(long)]
    once: bool,
    /// Override the pause between ticks.
    #[arg(long)]
    poll_interval_ms: Option<u32>,
    /// Simulated base temperature in °C.
    #[arg(long, default_value_t = 22.0)]
    sim_temperature: f32,
    /// Simulated base relative humidity in %.
    #[arg(long, default_value_t = 45.0)]
    sim_humidity: f32,
    /// Simulated base sound level (raw ADC counts).
    #[arg(long, default_value_t = 300)]
    sim_sound: u16,
    /// Print connection statistics as JSON on exit.
    #[arg(long)]
    stats: bool,
}

fn main() -> Result<()> {
    // a missing .env is fine
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut cfg = config::resolve(cli.config.as_deref())?;
    if let Some(ms) = cli.poll_interval_ms {
        cfg.poll_interval_ms = ms;
    }

    let default_filter = if cfg.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    info!(
        "envwatch-node {} for device {} -> {}:{}",
        envwatch_core::VERSION,
        cfg.device_id,
        cfg.server.host,
        cfg.server.port
    );

    let client = telemetry_client(&cfg).context("building telemetry client")?;
    let board = SensorBoard::new(
        SimClimate::new(cli.sim_temperature, cli.sim_humidity),
        SimMic::new(cli.sim_sound, 40),
    );
    let mut monitor = Monitor::new(
        board,
        client,
        LogIndicators::default(),
        SystemClock::new(),
        MonitorSettings::from(&cfg),
    );

    let thresholds = monitor.initialize().context("initialisation failed")?;
    info!(
        "Temperature [{}, {}] °C, humidity [{}, {}] %, sound <= {}",
        thresholds.min_temp,
        thresholds.max_temp,
        thresholds.min_humidity,
        thresholds.max_humidity,
        thresholds.max_sound
    );

    let max_ticks = if cli.once { Some(1) } else { cli.ticks };
    let ticks = monitor.run(cfg.poll_interval_ms, max_ticks);
    info!("Stopped after {} tick(s)", ticks);

    let (_, mut client, _, _) = monitor.into_parts();
    if cli.stats {
        let stats = client.http().stats();
        println!("{}", serde_json::to_string_pretty(stats)?);
    }
    client.link().end();

    if monitor_halted(ticks, max_ticks) {
        bail!("control loop stopped early");
    }
    Ok(())
}

fn monitor_halted(ticks: u64, max_ticks: Option<u64>) -> bool {
    match max_ticks {
        Some(max) if ticks < max => {
            warn!("Ran {} of {} ticks", ticks, max);
            true
        }
        Some(_) => false,
        // an unbounded run only returns once the monitor stopped
        None => true,
    }
}
