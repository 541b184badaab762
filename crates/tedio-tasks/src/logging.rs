//! `tracing` subscriber setup. Logs go to stderr so stdout only carries the
//! task output.

use std::io::{self, IsTerminal};

use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Logger has been already initialized")]
    AlreadyInitialized,
    #[error("Failed to initialize logger: {0}")]
    InitializationFailed(String),
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Filter directive, e.g. `warn` or `tedio_tasks=debug`.
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            with_targets: true,
            use_color: io::stderr().is_terminal(),
        }
    }
}

impl LoggerConfig {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }
}

pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = mk_filter(&cfg.level)?;
    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(cfg.use_color)
        .with_target(cfg.with_targets);

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    init_with(subscriber)
}

fn mk_filter(level: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(level).map_err(|_| LoggerError::InvalidLogLevel(level.to_string()))
}

fn as_error(e: impl std::fmt::Display) -> LoggerError {
    let s = e.to_string();
    if s.contains("SetGlobalDefaultError") || s.contains("global default") {
        LoggerError::AlreadyInitialized
    } else {
        LoggerError::InitializationFailed(s)
    }
}

fn init_with<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber.try_init().map_err(as_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_level() {
        let cfg = LoggerConfig::default().with_level("tedio_tasks=loud");
        assert!(matches!(
            logger_init(&cfg),
            Err(LoggerError::InvalidLogLevel(level)) if level == "tedio_tasks=loud"
        ));
    }

    #[test]
    fn second_init_reports_already_initialized() {
        let cfg = LoggerConfig::default();
        // Another test binary thread may have won the race, either way the
        // second call must fail.
        let _ = logger_init(&cfg);
        assert!(logger_init(&cfg).is_err());
    }
}
