//! CLI entry point for the next-bus sensor.
//!
//! Stands in for the host platform: registers one sensor, polls it on a
//! fixed interval and logs every snapshot. `inspect` decodes a single feed
//! file or URL for checking a stop id.

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use next_bus::{
    arrivals::{arrivals_for_stop, rank},
    config::{AttributeStyle, ClientConfig, SensorConfig},
    fetch::{BasicClient, FeedSource, Fetcher, auth::ApiKey},
    output::{SensorReport, arrivals_table, print_json, print_pretty},
    parser::parse_feed,
    sensor::{NextBusSensor, SensorSnapshot},
};
use std::ffi::OsStr;
use std::path::Path;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "next_bus")]
#[command(about = "Minutes until the next bus at a GTFS-Realtime stop", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the feed on an interval and log the sensor state
    Watch {
        /// Stop identifier as published in the feed (e.g. "8220DB000334")
        #[arg(long, env = "NEXT_BUS_STOP_ID")]
        stop_id: Option<String>,

        /// JSON sensor definition; flags given on the command line override it
        #[arg(short, long, value_name = "FILE")]
        config: Option<String>,

        /// Display name of the sensor
        #[arg(long)]
        name: Option<String>,

        /// Number of upcoming arrivals to keep
        #[arg(short = 'k', long)]
        max_arrivals: Option<usize>,

        /// Seconds between polls
        #[arg(short, long)]
        interval: Option<u64>,

        /// Include the full ranked arrival list in the attributes
        #[arg(long, default_value_t = false)]
        full_attributes: bool,

        /// Number of polls to run (0 = infinite)
        #[arg(short = 'n', long, default_value_t = 0)]
        samples: usize,
    },
    /// Decode one feed from a file or URL and show the arrivals for a stop
    Inspect {
        /// Path to a .pb file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Stop identifier to filter on
        #[arg(long, env = "NEXT_BUS_STOP_ID")]
        stop_id: String,

        /// Number of upcoming arrivals to keep
        #[arg(short = 'k', long, default_value_t = next_bus::config::DEFAULT_MAX_ARRIVALS)]
        max_arrivals: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/next_bus.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("next_bus.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            stop_id,
            config,
            name,
            max_arrivals,
            interval,
            full_attributes,
            samples,
        } => {
            let mut sensor_config = match (config, stop_id) {
                (Some(path), stop_id) => {
                    let mut loaded = SensorConfig::load(&path)
                        .with_context(|| format!("loading sensor config from {path}"))?;
                    if let Some(stop_id) = stop_id {
                        loaded.stop_id = stop_id;
                    }
                    loaded
                }
                (None, Some(stop_id)) => SensorConfig::new(stop_id),
                (None, None) => bail!("either --stop-id or --config is required"),
            };
            if let Some(name) = name {
                sensor_config.name = name;
            }
            if let Some(k) = max_arrivals {
                sensor_config.max_arrivals = k;
            }
            if let Some(secs) = interval {
                sensor_config.poll_interval_secs = secs;
            }
            if full_attributes {
                sensor_config.attributes = AttributeStyle::Full;
            }

            watch(sensor_config, samples).await?;
        }
        Commands::Inspect {
            source,
            stop_id,
            max_arrivals,
        } => {
            inspect(&source, &stop_id, max_arrivals).await?;
        }
    }

    Ok(())
}

/// Registers one sensor and updates it every poll interval.
///
/// Polls never overlap: a slow fetch delays the next tick instead of
/// queueing a burst behind it.
#[tracing::instrument(skip_all, fields(stop_id = %sensor_config.stop_id, samples = samples))]
async fn watch(sensor_config: SensorConfig, samples: usize) -> Result<()> {
    let client_config = ClientConfig::from_env()?;
    debug!(?client_config, "Client configuration loaded");

    let fetcher = Fetcher::from_config(&client_config)?;
    let mut sensor = NextBusSensor::new(fetcher, sensor_config)?;

    let mut ticker = tokio::time::interval(sensor.config().poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        sensor_name = sensor.name(),
        interval_secs = sensor.config().poll_interval_secs,
        max_arrivals = sensor.config().max_arrivals,
        "Sensor registered"
    );

    let mut sample_count = 0;
    loop {
        if samples > 0 && sample_count >= samples {
            break;
        }
        ticker.tick().await;
        sample_count += 1;

        let snapshot = sensor.update().await;
        print_pretty(snapshot);
        print_json(&SensorReport::new(&sensor))?;
    }

    info!(sample_count, "Finished polling");
    Ok(())
}

/// Loads feed data from a local file path or fetches it over HTTP with the
/// configured API key, then prints the ranked arrivals for `stop_id`.
#[tracing::instrument(skip_all, fields(source = %source, stop_id = %stop_id))]
async fn inspect(source: &str, stop_id: &str, max_arrivals: usize) -> Result<()> {
    let bytes = if source.starts_with("http") {
        let client_config = ClientConfig::from_env()?;
        let client = ApiKey::x_api_key(
            BasicClient::with_timeout(client_config.timeout)?,
            &client_config.api_key,
        )?;
        Fetcher::new(client, source).fetch_feed().await?
    } else {
        std::fs::read(source).with_context(|| format!("reading {source}"))?
    };

    let feed = parse_feed(&bytes)?;
    info!(entity_count = feed.entity.len(), "Feed parsed successfully");

    let ranked = rank(arrivals_for_stop(&feed, stop_id, &Local::now()), max_arrivals);
    let snapshot = SensorSnapshot::from_arrivals(stop_id, &ranked, AttributeStyle::Full);

    print!("{}", arrivals_table(&ranked));
    println!(
        "{}",
        serde_json::to_string_pretty(&SensorReport::for_snapshot(stop_id, &snapshot))?
    );

    Ok(())
}
