//! ns-results: result records, run cache and CSV/JSON export.

pub mod export;
pub mod hash;
pub mod store;
pub mod types;

pub use export::{
    save_sequence_csv, save_star_json, write_profile_csv, write_sequence_csv, write_star_json,
};
pub use hash::{compute_run_id, eos_digest};
pub use store::RunStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },
}
