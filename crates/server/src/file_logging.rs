//! Console and optional file logging.
//!
//! Console output is always on. When `PORTAL_FILE_LOGGING` is set, logs are
//! also written as JSON lines to daily-rotated files.
//!
//! # Configuration
//!
//! - `PORTAL_FILE_LOGGING`: "true" or "1" enables file logging
//! - `PORTAL_LOG_DIR`: log directory (defaults to `{asset_dir}/logs`)
//! - `PORTAL_LOG_MAX_FILES`: number of daily log files to keep (default: 7)

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};
use utils::assets::log_dir;

const LOG_FILE_PREFIX: &str = "record-portal.log";
const DEFAULT_MAX_FILES: usize = 7;

#[derive(Debug, Clone)]
pub struct FileLoggingConfig {
    pub enabled: bool,
    pub log_dir: PathBuf,
    /// Number of daily log files to retain.
    pub max_files: usize,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        let enabled = std::env::var("PORTAL_FILE_LOGGING")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let max_files = std::env::var("PORTAL_LOG_MAX_FILES")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(DEFAULT_MAX_FILES);

        Self {
            enabled,
            log_dir: log_dir(),
            max_files,
        }
    }
}

/// Filter directive enabling `log_level` for the workspace crates and `warn` elsewhere.
pub fn filter_directive(log_level: &str) -> String {
    format!(
        "warn,server={level},services={level},db={level},utils={level},tower_http={level}",
        level = log_level
    )
}

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(filter_directive(log_level)).unwrap_or_else(|e| {
        eprintln!("Invalid log level '{}': {}; falling back to info", log_level, e);
        EnvFilter::new(filter_directive("info"))
    })
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process. `None` when file logging is off.
pub fn init_logging(log_level: &str) -> Option<WorkerGuard> {
    let config = FileLoggingConfig::default();

    let console_layer = tracing_subscriber::fmt::layer().with_filter(env_filter(log_level));

    if !config.enabled {
        tracing_subscriber::registry().with(console_layer).init();
        return None;
    }

    if let Err(e) = std::fs::create_dir_all(&config.log_dir) {
        eprintln!("Failed to create log directory {:?}: {}", config.log_dir, e);
        tracing_subscriber::registry().with(console_layer).init();
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(env_filter(log_level));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!(
        log_dir = ?config.log_dir,
        max_files = config.max_files,
        "File logging enabled"
    );

    let log_dir = config.log_dir.clone();
    let max_files = config.max_files;
    std::thread::spawn(move || {
        cleanup_old_logs(&log_dir, max_files);
    });

    Some(guard)
}

/// Delete rotated log files beyond the newest `max_files`.
fn cleanup_old_logs(log_dir: &Path, max_files: usize) {
    let entries = match std::fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    let mut log_files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|n| n.starts_with(LOG_FILE_PREFIX))
                .unwrap_or(false)
        })
        .filter_map(|e| {
            e.metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(|t| (e.path(), t))
        })
        .collect();

    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    for (path, _) in log_files.into_iter().skip(max_files) {
        if let Err(e) = std::fs::remove_file(&path) {
            tracing::warn!("Failed to remove old log file {:?}: {}", path, e);
        } else {
            tracing::debug!("Removed old log file: {:?}", path);
        }
    }
}
