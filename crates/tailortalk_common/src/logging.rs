//! Logging utilities for the TailorTalk application.
//!
//! Every crate logs through `tracing`; the backend calls [`init_with_config`]
//! once at startup to install the subscriber.

use tailortalk_config::LoggingConfig;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File name prefix used by the rolling file appender.
const LOG_FILE_PREFIX: &str = "tailortalk.log";

/// Initialize the tracing subscriber at INFO.
pub fn init() -> Option<WorkerGuard> {
    init_with_level(Level::INFO)
}

/// Initialize the tracing subscriber with a specific log level.
pub fn init_with_level(level: Level) -> Option<WorkerGuard> {
    init_with_config(&LoggingConfig {
        level: Some(level.to_string()),
        directory: None,
    })
}

/// Initialize the tracing subscriber from the `[logging]` config section.
///
/// `RUST_LOG` takes precedence over `logging.level`. When `logging.directory`
/// is set a daily rolling file is written next to stdout; the returned guard
/// must be held for the lifetime of the process or buffered lines are lost.
pub fn init_with_config(config: &LoggingConfig) -> Option<WorkerGuard> {
    let level = config.level.as_deref().unwrap_or("info");
    let filter = build_filter(level);

    let (file_layer, guard) = match config.directory.as_deref() {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // try_init: a global subscriber may already be installed (tests, embedding)
    let result = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true),
        )
        .with(file_layer)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
    guard
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("tailortalk={level},tower_http={level}")))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log an error with context at the ERROR level.
pub fn log_error<E: std::fmt::Display>(error: E, context: &str) {
    tracing::error!("{}: {}", context, error);
}
