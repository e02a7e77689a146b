//! `emit-tick` entry point.
//!
//! Runs a resettable ticker, prints every tick it receives, and applies
//! period changes typed on stdin while the ticker keeps running.

mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::select;
use emit_common::config::{parse_period, EmitConfig};
use emit_ticker::Ticker;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::commands::{spawn_reader, Command};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "emit-tick",
    about = "Resettable ticker - prints ticks, takes `reset <period>`, `pause`, `stop` on stdin",
    version,
    long_about = None
)]
struct Args {
    /// Path to a ticker configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initial period, e.g. `100ms` (overrides config file, `0s` starts paused).
    #[arg(long, short = 'p', value_parser = parse_period_arg)]
    period: Option<Duration>,

    /// Stop after this many ticks (0 = unbounded).
    #[arg(long, short = 'n', default_value = "0")]
    count: u64,

    /// Close the tick channel on stop.
    #[arg(long)]
    close_on_stop: bool,

    /// Drop an unconsumed tick on reset.
    #[arg(long)]
    drop_on_reset: bool,

    /// Drop an unconsumed tick on stop.
    #[arg(long)]
    drop_on_stop: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

fn parse_period_arg(text: &str) -> Result<Duration, String> {
    parse_period(text).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting emit-tick");

    let mut config = load_config(&args)?;

    // Command-line flags only ever switch behaviour on.
    if let Some(period) = args.period {
        config.period = period;
    }
    config.ticker.close_on_stop |= args.close_on_stop;
    config.ticker.drop_tick_on_reset |= args.drop_on_reset;
    config.ticker.drop_tick_on_stop |= args.drop_on_stop;

    info!(
        period = %humantime::format_duration(config.period),
        ?config.ticker,
        "Configuration loaded"
    );

    let commands = spawn_reader(std::io::BufReader::new(std::io::stdin()))
        .context("Failed to start command reader")?;
    let ticker = Ticker::with_config(config.period, config.ticker)
        .context("Failed to start ticker")?;

    let ticks = run(&ticker, &commands, args.count);

    ticker.stop();
    info!(ticks, "Ticker stopped");
    Ok(())
}

/// Initialize logging with the specified log level.
fn init_logging(level: &str) {
    let filter = format!("emit_cli={level},emit_ticker={level},emit_common={level}");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `EMIT_CONFIG_PATH` environment variable
/// 3. Built-in defaults
fn load_config(args: &Args) -> Result<EmitConfig> {
    if let Some(config_path) = &args.config {
        info!(?config_path, "Loading config from command-line argument");
        return EmitConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path));
    }

    if let Ok(env_path) = std::env::var("EMIT_CONFIG_PATH") {
        let config_path = PathBuf::from(&env_path);
        if config_path.exists() {
            info!(?config_path, "Loading config from EMIT_CONFIG_PATH");
            return EmitConfig::from_file(&config_path).with_context(|| {
                format!("Failed to load config from EMIT_CONFIG_PATH={:?}", env_path)
            });
        }
        warn!(
            path = %env_path,
            "EMIT_CONFIG_PATH set but file does not exist, using defaults"
        );
    }

    info!("Using built-in default configuration");
    Ok(EmitConfig::default())
}

/// Print ticks and apply commands until told to stop, input ends, or
/// `max_ticks` ticks have been printed. Returns the number of ticks.
fn run(ticker: &Ticker, commands: &crossbeam_channel::Receiver<Command>, max_ticks: u64) -> u64 {
    let mut count = 0u64;
    let mut last: Option<Instant> = None;

    loop {
        select! {
            recv(ticker.receiver()) -> tick => {
                let Ok(tick) = tick else {
                    break;
                };
                count += 1;
                match last {
                    Some(prev) => println!(
                        "tick {count} (+{})",
                        humantime::format_duration(tick.saturating_duration_since(prev))
                    ),
                    None => println!("tick {count}"),
                }
                last = Some(tick);

                if max_ticks > 0 && count >= max_ticks {
                    break;
                }
            }
            recv(commands) -> command => match command {
                Ok(Command::Reset(period)) => {
                    info!(period = %humantime::format_duration(period), "Resetting ticker");
                    ticker.reset(period);
                    last = None;
                }
                Ok(Command::Pause) => {
                    info!("Pausing ticker");
                    ticker.reset(Duration::ZERO);
                    last = None;
                }
                Ok(Command::Stop) | Err(_) => break,
            },
        }
    }

    count
}
