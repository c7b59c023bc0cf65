//! Core logging bootstrap.
//!
//! # Responsibility
//! - Initialize rolling file logs once per process.
//! - Resolve logging settings from explicit input or the environment.
//!
//! # Invariants
//! - Initialization is idempotent for the same level and directory, and
//!   rejects any later attempt to change either.
//! - Initialization never panics.
//! - Log events carry metadata only (ids, counts, durations), never
//!   milestone titles or other user text.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "makerlog";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

/// Environment variable holding the log level.
pub const LOG_LEVEL_ENV: &str = "MAKERLOG_LOG_LEVEL";
/// Environment variable holding the absolute log directory.
pub const LOG_DIR_ENV: &str = "MAKERLOG_LOG_DIR";

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

struct LoggingState {
    config: LoggingConfig,
    _logger: LoggerHandle,
}

/// Normalized logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: &'static str,
    pub log_dir: PathBuf,
}

impl LoggingConfig {
    /// Validates and normalizes raw settings.
    ///
    /// # Errors
    /// - Unsupported level, or an empty/relative directory.
    pub fn new(level: &str, log_dir: &str) -> Result<Self, String> {
        Ok(Self {
            level: normalize_level(level)?,
            log_dir: normalize_log_dir(log_dir)?,
        })
    }

    /// Reads `MAKERLOG_LOG_DIR` and optional `MAKERLOG_LOG_LEVEL`.
    ///
    /// Returns `None` when no directory is configured; the level falls back
    /// to `default_log_level()`.
    pub fn from_env() -> Option<Result<Self, String>> {
        let log_dir = std::env::var(LOG_DIR_ENV).ok()?;
        let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| default_log_level().to_string());
        Some(Self::new(&level, &log_dir))
    }
}

/// Initializes core logging with `level` and absolute `log_dir`.
///
/// # Errors
/// - Invalid settings (see `LoggingConfig::new`).
/// - A different configuration is already active.
/// - The directory cannot be created or the backend fails to start.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), String> {
    init_logging_with(LoggingConfig::new(level, log_dir)?)
}

/// Initializes core logging from an already normalized config.
pub fn init_logging_with(config: LoggingConfig) -> Result<(), String> {
    let state = LOGGING_STATE.get_or_try_init(|| start_logger(config.clone()))?;
    ensure_same_config(&state.config, &config)
}

/// Active `(level, log_dir)`, or `None` before initialization.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.config.level, state.config.log_dir.clone()))
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_logger(config: LoggingConfig) -> Result<LoggingState, String> {
    std::fs::create_dir_all(&config.log_dir).map_err(|err| {
        format!(
            "failed to create log directory `{}`: {err}",
            config.log_dir.display()
        )
    })?;

    let logger = Logger::try_with_str(config.level)
        .map_err(|err| format!("invalid log level `{}`: {err}", config.level))?
        .log_to_file(
            FileSpec::default()
                .directory(config.log_dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))?;

    install_panic_hook_once();
    info!(
        "event=core_init module=core status=ok version={} level={} log_dir={}",
        env!("CARGO_PKG_VERSION"),
        config.level,
        config.log_dir.display()
    );

    Ok(LoggingState {
        config,
        _logger: logger,
    })
}

fn ensure_same_config(active: &LoggingConfig, requested: &LoggingConfig) -> Result<(), String> {
    if active.log_dir != requested.log_dir {
        return Err(format!(
            "logging already initialized at `{}`; refusing to switch to `{}`",
            active.log_dir.display(),
            requested.log_dir.display()
        ));
    }
    if active.level != requested.level {
        return Err(format!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            active.level, requested.level
        ));
    }
    Ok(())
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn normalize_log_dir(log_dir: &str) -> Result<PathBuf, String> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err("log_dir cannot be empty".to_string());
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(format!("log_dir must be an absolute path, got `{trimmed}`"));
    }
    Ok(path.to_path_buf())
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.set(()).is_err() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location,
            sanitize_message(&payload, MAX_PANIC_PAYLOAD_CHARS)
        );
        previous_hook(panic_info);
    }));
}

/// Flattens newlines and caps length so one panic stays one log line.
fn sanitize_message(value: &str, max_chars: usize) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized.chars().take(max_chars).collect::<String>();
    if normalized.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}
