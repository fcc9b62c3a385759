//! Console + rotating file logging for the profiler CLI.
//!
//! The console layer writes human-readable lines to stderr so stdout only ever
//! carries profile JSON. The file layer writes to
//! `<log_dir>/volume_profiler.log.<date>` and is structured JSON by default.
//! `RUST_LOG` overrides the configured level filter on both layers.

use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::common::constants::LOG_FILE_PREFIX;

const CONSOLE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f UTC";
const FILE_JSON_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
const SECONDS_PER_DAY: u64 = 24 * 3600;

type LoggingResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_dir: String,
    /// `EnvFilter` directives, e.g. "info,volume_profiler=debug"
    pub level_filter: String,
    pub rotation: LogRotation,
    pub console_timestamps: bool,
    /// JSON lines in the log file instead of plain text
    pub file_json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            level_filter: format!("info,{}=info", LOG_FILE_PREFIX),
            rotation: LogRotation::Daily,
            console_timestamps: true,
            file_json_format: true,
        }
    }
}

/// How often the log file rolls over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    Daily,
    Hourly,
}

impl LogRotation {
    /// Parse the `rotation` value of the `[logging]` section
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "hourly" => Some(Self::Hourly),
            _ => None,
        }
    }

    fn appender_rotation(self) -> Rotation {
        match self {
            Self::Daily => Rotation::DAILY,
            Self::Hourly => Rotation::HOURLY,
        }
    }
}

fn env_filter(level_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_filter))
}

/// Install the console and rotating-file layers as the global subscriber
///
/// The returned guard flushes the background file writer when dropped, so it
/// has to live until the process is done logging.
pub fn init_dual_logging(config: LoggingConfig) -> LoggingResult<WorkerGuard> {
    std::fs::create_dir_all(&config.log_dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(config.rotation.appender_rotation())
        .filename_prefix(format!("{}.log", LOG_FILE_PREFIX))
        .build(&config.log_dir)?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let console_format = if config.console_timestamps { CONSOLE_TIME_FORMAT } else { "" };
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_timer(ChronoUtc::new(console_format.to_string()))
        .with_filter(env_filter(&config.level_filter));

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_thread_names(true);
    let file_layer = if config.file_json_format {
        file_layer
            .json()
            .with_timer(ChronoUtc::new(FILE_JSON_TIME_FORMAT.to_string()))
            .with_filter(env_filter(&config.level_filter))
            .boxed()
    } else {
        file_layer
            .with_timer(ChronoUtc::new(CONSOLE_TIME_FORMAT.to_string()))
            .with_filter(env_filter(&config.level_filter))
            .boxed()
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    tracing::info!(
        log_dir = %config.log_dir,
        rotation = ?config.rotation,
        json_format = config.file_json_format,
        "📁 Logging to console and rotating files"
    );

    Ok(guard)
}

/// Console-only fallback on stderr, used when the log directory is unusable
pub fn init_simple_logging(level_filter: &str) -> LoggingResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level_filter))
        .with_writer(std::io::stderr)
        .try_init()?;

    tracing::info!("🖥️ Console-only logging initialized");
    Ok(())
}

/// Rolled files are named `volume_profiler.log.<date>`
fn is_application_log(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(LOG_FILE_PREFIX) && name.contains(".log"))
            .unwrap_or(false)
}

fn modified_before(path: &Path, cutoff: SystemTime) -> bool {
    path.metadata()
        .and_then(|metadata| metadata.modified())
        .map(|modified| modified < cutoff)
        .unwrap_or(false)
}

/// Delete this application's log files last modified more than `keep_days` ago
///
/// A missing log directory is not an error. Returns the number of files removed.
pub fn cleanup_old_logs(log_dir: &str, keep_days: u32) -> Result<usize, std::io::Error> {
    let dir = Path::new(log_dir);
    if !dir.exists() {
        return Ok(0);
    }

    let cutoff = SystemTime::now() - Duration::from_secs(u64::from(keep_days) * SECONDS_PER_DAY);
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if is_application_log(&path) && modified_before(&path, cutoff) && std::fs::remove_file(&path).is_ok() {
            tracing::debug!("🗑️ Removed old log file: {}", path.display());
            removed += 1;
        }
    }

    if removed > 0 {
        tracing::info!("🧹 Removed {} log files older than {} days", removed, keep_days);
    }
    Ok(removed)
}

/// Log build target and available parallelism
pub fn log_system_info() {
    let cpu_count = std::thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(1);

    tracing::info!(
        package_version = env!("CARGO_PKG_VERSION"),
        target_arch = std::env::consts::ARCH,
        target_os = std::env::consts::OS,
        cpu_count,
        rayon_threads = rayon::current_num_threads(),
        "📊 System information"
    );
}
