use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};

use volume_profiler::config::AppConfig;
use volume_profiler::logging::{cleanup_old_logs, init_dual_logging, init_simple_logging, log_system_info};
use volume_profiler::range::{CsvCandleSource, RangeRequest, RangeResolver};
use volume_profiler::volume_profile::VolumeProfileCalculator;

/// Compute the volume profile (POC, VAH, VAL and dominant tier) of a candle range
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Asset symbol, e.g. BTCUSDT
    asset: String,

    /// Requested candle interval: 1M, 3M, 5M, 15M or 60M
    interval: String,

    /// Range start, "YYYY-MM-DD HH:MM:SS" (UTC)
    start: String,

    /// Range end, "YYYY-MM-DD HH:MM:SS" (UTC)
    end: String,

    /// Path to the configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Directory holding <ASSET>_<interval>.csv candle files (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Include the raw bucket volumes in the output
    #[arg(long, default_value_t = false)]
    heatmap: bool,

    /// Number of price buckets (overrides config)
    #[arg(long)]
    buckets: Option<usize>,
}

fn load_config(cli: &Cli) -> AppConfig {
    let mut config = if cli.config.exists() {
        match AppConfig::from_toml(&cli.config) {
            Ok(config) => config,
            Err(e) => {
                // Logging is not up yet
                eprintln!("⚠️ Failed to load {}: {}. Using default configuration", cli.config.display(), e);
                AppConfig::default()
            }
        }
    } else {
        AppConfig::default()
    };

    if let Some(data_dir) = &cli.data_dir {
        config.range.data_dir = data_dir.clone();
    }
    if let Some(buckets) = cli.buckets {
        config.volume_profile.bucket_count = buckets;
    }
    if cli.heatmap {
        config.volume_profile.include_heatmap = true;
    }
    config
}

fn run(cli: &Cli, config: &AppConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let calculator = VolumeProfileCalculator::new(config.volume_profile.clone())?;
    let source = CsvCandleSource::new(&config.range.data_dir);
    let resolver = RangeResolver::with_max_candles(source, config.range.max_candles);
    let request = RangeRequest::parse(&cli.asset, &cli.interval, &cli.start, &cli.end)?;

    info!(
        asset = %request.asset,
        interval = %request.interval,
        start = %cli.start,
        end = %cli.end,
        data_dir = %config.range.data_dir.display(),
        "🔍 Resolving candle range"
    );

    let result = calculator.calculate_range(&resolver, &request)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let config = load_config(&cli);

    // Initialize dual logging system (console + rotating files)
    let logging_guard = match init_dual_logging(config.logging.clone()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("❌ Failed to initialize logging system: {}", e);
            if let Err(e) = init_simple_logging(&config.logging.level_filter) {
                eprintln!("❌ Failed to initialize console logging: {}", e);
            }
            warn!("⚠️ Using fallback console-only logging");
            None
        }
    };

    if let Err(e) = cleanup_old_logs(&config.logging.log_dir, config.log_cleanup_days) {
        warn!("⚠️ Failed to clean up old log files: {}", e);
    }

    log_system_info();

    info!(
        bucket_count = config.volume_profile.bucket_count,
        value_area_percentage = config.volume_profile.value_area_percentage,
        split_mode = ?config.volume_profile.volume_split_mode,
        tie_break = ?config.volume_profile.tier_tie_break,
        max_candles = config.range.max_candles,
        log_dir = %config.logging.log_dir,
        "🔧 Configuration loaded"
    );

    if let Err(e) = run(&cli, &config) {
        error!("❌ Volume profile failed: {}", e);
        // Flush buffered file logs before exiting
        drop(logging_guard);
        std::process::exit(1);
    }
}
