//! Error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::logging::LoggerError;
use crate::runtime::JoinError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("summary file {}: {source}", .path.display())]
    Summary {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Logger(#[from] LoggerError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("expected {expected} explicit delays, got {found}")]
    DelayCount { expected: usize, found: usize },
}

/// Failure of a single task. Reported alongside successful completions and
/// never affects sibling tasks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("{0}")]
    Failed(String),
    #[error("cancelled")]
    Cancelled,
    #[error("panicked: {0}")]
    Panicked(String),
}

impl TaskError {
    pub fn failed(reason: impl Into<String>) -> Self {
        TaskError::Failed(reason.into())
    }
}

impl From<JoinError> for TaskError {
    fn from(e: JoinError) -> Self {
        match e {
            JoinError::Cancelled => TaskError::Cancelled,
            JoinError::Panicked(message) => TaskError::Panicked(message),
        }
    }
}

impl From<io::Error> for TaskError {
    fn from(e: io::Error) -> Self {
        TaskError::Failed(e.to_string())
    }
}
