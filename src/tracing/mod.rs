pub mod filter;
pub mod format;

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::prelude::*;

use self::filter::DebugOnlyFilter;
use self::filter::ErrorWarnFilter;
use self::format::KashifFormat;
use crate::config::LoggingConfig;
use crate::error::EngineError;

/// Keeps the non-blocking file writers alive. Drop it only at process exit.
#[must_use]
pub struct TracingGuards {
    _guards: Vec<WorkerGuard>,
}

pub fn setup_tracing(
    engine_name: &str,
    logging_config: &LoggingConfig,
) -> Result<TracingGuards, EngineError> {
    let format = KashifFormat {
        engine_name: engine_name.to_string(),
    };

    // RUST_LOG drives the terminal output, INFO when unset
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let terminal = tracing_subscriber::fmt::Layer::default()
        .with_ansi(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_writer(std::io::stderr)
        .event_format(format.clone())
        .with_filter(env_filter);

    let mut guards = Vec::new();
    let file_layers = match logging_config.directory.as_deref() {
        Some(directory) => {
            let base_logs_dir = Path::new(directory);
            for dir in [base_logs_dir.join("debug"), base_logs_dir.join("error")] {
                std::fs::create_dir_all(&dir).map_err(|e| {
                    EngineError::SetupTracingError(format!("failed to create {}: {}", dir.display(), e))
                })?;
            }

            let debug_appender =
                RollingFileAppender::new(Rotation::DAILY, base_logs_dir.join("debug"), format!("{}.log", engine_name));
            let error_appender =
                RollingFileAppender::new(Rotation::DAILY, base_logs_dir.join("error"), format!("{}.log", engine_name));

            let (non_blocking_debug, debug_guard) = tracing_appender::non_blocking(debug_appender);
            let (non_blocking_error, error_guard) = tracing_appender::non_blocking(error_appender);
            guards.push(debug_guard);
            guards.push(error_guard);

            let layers = tracing_subscriber::fmt::Layer::default()
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .event_format(format.clone())
                .with_writer(non_blocking_debug)
                .with_filter(DebugOnlyFilter)
                .and_then(
                    tracing_subscriber::fmt::Layer::default()
                        .with_ansi(false)
                        .with_file(true)
                        .with_line_number(true)
                        .with_target(false)
                        .event_format(format)
                        .with_writer(non_blocking_error)
                        .with_filter(ErrorWarnFilter),
                );
            Some(layers)
        },
        None => None,
    };

    tracing_subscriber::registry()
        .with(terminal)
        .with(file_layers)
        .try_init()
        .map_err(|e| EngineError::SetupTracingError(e.to_string()))?;

    tracing::info!(
        "{}_logging_started::log_directory::{}",
        engine_name,
        logging_config.directory.as_deref().unwrap_or("none")
    );

    Ok(TracingGuards { _guards: guards })
}
