mod aggregator;
mod colors;
mod config;
mod controls;
mod decay;
mod engine;
mod error;
mod feed;
mod geocache;
mod geocoder;
mod globe;
mod help;
mod ingest;
mod logger;
mod points;
mod session;
mod settings;
mod terminal;
mod watch;

use clap::{Args, Parser, Subcommand};
use config::{Config, Overrides};
use log::LevelFilter;
use logger::LogTarget;
use settings::Settings;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "packetglobe")]
#[command(author = "Terminal Art Generator")]
#[command(version = "0.1.0")]
#[command(about = "Live packet sources plotted on a rotating terminal globe", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive globe (drag to rotate, wheel to zoom, ? for help)
    Globe {
        #[command(flatten)]
        common: CommonArgs,

        /// Frame delay in seconds
        #[arg(short, long, default_value = "0.03")]
        time: f32,
    },
    /// Print the leaderboard to stdout whenever it changes
    Watch {
        #[command(flatten)]
        common: CommonArgs,

        /// Step delay in seconds
        #[arg(short, long, default_value = "0.05")]
        time: f32,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Packet feed endpoint returning a JSON array of packets
    #[arg(short = 'u', long)]
    feed_url: Option<String>,

    /// Use the built-in synthetic feed instead of HTTP
    #[arg(short, long)]
    demo: bool,

    /// Random seed for the demo feed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Nominatim-compatible reverse geocoding base URL
    #[arg(long)]
    geocoder_url: Option<String>,

    /// Never call the geocoder; every country shows as Unknown
    #[arg(long)]
    no_geocode: bool,

    /// Seconds a point stays on the globe
    #[arg(short, long)]
    max_age: Option<f64>,

    /// Feed poll interval in milliseconds
    #[arg(short, long)]
    poll_ms: Option<u64>,

    /// Leaderboard size
    #[arg(long)]
    top: Option<usize>,

    /// Log level (error, warn, info, debug, trace); defaults to RUST_LOG, then info
    #[arg(long)]
    log_level: Option<LevelFilter>,

    /// Log file (globe mode only; watch logs to stderr)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl CommonArgs {
    fn overrides(&self, time: f32) -> Overrides {
        Overrides {
            feed_url: self.feed_url.clone(),
            demo: self.demo,
            seed: self.seed,
            geocoder_url: self.geocoder_url.clone(),
            no_geocode: self.no_geocode,
            max_age: self.max_age,
            poll_ms: self.poll_ms,
            top: self.top,
            time_step: Some(time),
            log_file: self.log_file.clone(),
        }
    }
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let (settings, settings_error) = match Settings::load() {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };

    match cli.command {
        Commands::Globe { common, time } => {
            let config = Config::resolve(&settings, &common.overrides(time));
            let path = config.log_file.clone().unwrap_or_else(logger::default_log_path);
            start_logging(common.log_level, LogTarget::File(path), settings_error);
            globe::run(&config)?;
        }
        Commands::Watch { common, time } => {
            let config = Config::resolve(&settings, &common.overrides(time));
            start_logging(common.log_level, LogTarget::Stderr, settings_error);
            watch::run(&config)?;
        }
    }

    Ok(())
}

fn start_logging(
    level: Option<LevelFilter>,
    target: LogTarget,
    settings_error: Option<error::SettingsError>,
) {
    if let Err(e) = logger::init_logger(level, target) {
        eprintln!("Logging disabled: {}", e);
    }
    if let Some(e) = settings_error {
        log::warn!("Ignoring settings file: {}", e);
    }
}
