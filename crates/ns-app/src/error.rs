//! Error types for the ns-app service layer.

use std::path::PathBuf;

/// Application error type wrapping the backend crates' errors behind one
/// interface for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Failed to read config file: {path}")]
    ConfigFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write config file: {path}")]
    ConfigFileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config validation failed: {0}")]
    Validation(String),

    #[error("EOS error: {0}")]
    Eos(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Sequence error: {0}")]
    Sequence(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ns-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<ns_eos::EosError> for AppError {
    fn from(err: ns_eos::EosError) -> Self {
        AppError::Eos(err.to_string())
    }
}

impl From<ns_sim::SimError> for AppError {
    fn from(err: ns_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<ns_sequence::SequenceError> for AppError {
    fn from(err: ns_sequence::SequenceError) -> Self {
        AppError::Sequence(err.to_string())
    }
}

impl From<ns_results::ResultsError> for AppError {
    fn from(err: ns_results::ResultsError) -> Self {
        match err {
            ns_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}
