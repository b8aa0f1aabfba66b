use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, Local};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::{LoggingConfig, LoggingMode};
use crate::constants::{DEFAULT_LOG_LEVEL_CONSOLE, DEFAULT_LOG_LEVEL_FILE};

/// The main entry point to set up logging.  Only the first call in a process installs a
/// subscriber.
pub fn init_logging(cfg: LoggingConfig) {
    let maybe_log_file: Option<PathBuf> = match &cfg.logging_mode {
        LoggingMode::Directory(log_dir) => Some(log_file_in_dir(log_dir, &cfg.prefix)),
        LoggingMode::File(path) => Some(path.clone()),
        LoggingMode::Console => None,
    };

    if let Some(log_file) = maybe_log_file {
        // Attempt logging to a file, but fall back to console logging on error.
        if let Err(e) = init_logging_to_file(&log_file, cfg.use_json, cfg.level_override.as_deref()) {
            init_logging_to_console(&cfg);
            error!("Error logging to file {log_file:?} ({e}); falling back to console logging.");
        }
    } else {
        init_logging_to_console(&cfg);
    }

    info!("product-import {}", &cfg.version);
}

fn init_logging_to_console(cfg: &LoggingConfig) {
    let registry = tracing_subscriber::registry();

    let fmt_layer_base = tracing_subscriber::fmt::layer()
        .with_line_number(true)
        .with_file(true)
        .with_target(false)
        .with_writer(std::io::stderr);
    let fmt_filter = env_filter(cfg.level_override.as_deref(), DEFAULT_LOG_LEVEL_CONSOLE);

    // A subscriber installed earlier (e.g. by a test harness) wins.
    let _ = if cfg.use_json {
        registry.with(fmt_layer_base.json().with_filter(fmt_filter)).try_init()
    } else {
        registry.with(fmt_layer_base.pretty().with_filter(fmt_filter)).try_init()
    };
}

/// `RUST_LOG` wins, then the verbosity override, then the destination's default level.
fn env_filter(level_override: Option<&str>, default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level_override.unwrap_or(default_level)))
        .unwrap_or_default()
}

/// Splits `path` into the directory and file name the appender writes to, creating the
/// directory and checking that the file is writable.
fn prepare_log_file(path: &Path) -> std::io::Result<(PathBuf, OsString)> {
    let (path, file_name) = match path.file_name() {
        Some(name) => (path.to_path_buf(), name.to_os_string()),
        None => (path.join("product-import.log"), OsString::from("product-import.log")),
    };

    let log_directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)?;
            parent.to_path_buf()
        },
        _ => PathBuf::from("."),
    };

    // Error early here so the caller can fall back to the console.
    std::fs::OpenOptions::new().create(true).append(true).open(&path)?;

    Ok((log_directory, file_name))
}

fn init_logging_to_file(path: &Path, use_json: bool, level_override: Option<&str>) -> Result<(), std::io::Error> {
    use tracing_appender::{non_blocking, rolling};

    let (log_directory, file_name) = prepare_log_file(path)?;

    // One static file, no rotation.
    let file_appender = rolling::never(log_directory, file_name);
    let (writer, guard) = non_blocking(file_appender);

    // The guard flushes on drop, so it lives for the rest of the process.
    static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
    let _ = FILE_GUARD.set(guard);

    let fmt_layer_base = tracing_subscriber::fmt::layer()
        .with_line_number(true)
        .with_file(true)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer);
    let fmt_filter = env_filter(level_override, DEFAULT_LOG_LEVEL_FILE);

    let registry = tracing_subscriber::registry();
    let _ = if use_json {
        registry.with(fmt_layer_base.json().with_filter(fmt_filter)).try_init()
    } else {
        registry.with(fmt_layer_base.pretty().with_filter(fmt_filter)).try_init()
    };

    Ok(())
}

/// Build `<prefix>_<YYYYMMDD>T<HHMMSS><mmm><+/-HHMM>_<pid>.log` in `dir`, in local time.
pub fn log_file_in_dir(dir: impl AsRef<Path>, prefix: &str) -> PathBuf {
    let now_local: DateTime<Local> = Local::now();
    let now_fixed: DateTime<FixedOffset> = now_local.with_timezone(now_local.offset());

    // ISO 8601 basic, filename-safe (no colons): 20250915T083210123-0700
    let ts = now_fixed.format("%Y%m%dT%H%M%S%3f%z");

    let pid = std::process::id();
    dir.as_ref().join(format!("{prefix}_{ts}_{pid}.log"))
}

/// Parse `<prefix>_<YYYYMMDD>T<HHMMSS><mmm><+/-HHMM>_<pid>.log`, from a full path or a bare
/// file name.  Returns (prefix, timestamp, pid).
pub fn parse_log_file_name(path: impl AsRef<Path>) -> Option<(String, DateTime<FixedOffset>, u32)> {
    let file_name = path.as_ref().file_name()?.to_str()?;
    let file_name = file_name.strip_suffix(".log")?;

    // Split from the right so the prefix may contain underscores.
    let mut parts = file_name.rsplitn(3, '_');
    let pid: u32 = parts.next()?.parse().ok()?;
    let ts = DateTime::parse_from_str(parts.next()?, "%Y%m%dT%H%M%S%3f%z").ok()?;
    let prefix = parts.next()?;

    Some((prefix.to_string(), ts, pid))
}
