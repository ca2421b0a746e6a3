//! Shared application service layer for neutron-star studies.
//!
//! Centralizes run configuration, EOS loading, sequence/target studies,
//! result caching and export, for use by the CLI.

pub mod config;
pub mod error;
pub mod progress;
pub mod query;
pub mod run_service;
pub mod runtime;
pub mod study;

// Re-export key types for convenience
pub use config::{
    load_config, save_config, validate_config, EosSource, IntegrationSettings, LocatorSettings,
    RunConfig, SequenceSettings, TargetDef, UnitsDef,
};
pub use error::{AppError, AppResult};
pub use progress::{ProgressCallback, RunProgressEvent, RunStage};
pub use query::{get_run_summary, stable_stars, RunSummary};
pub use run_service::{
    ensure_run, ensure_run_with_progress, list_runs, load_run, RunOptions, RunRequest,
    RunResponse, RunTimingSummary, TargetOutcome,
};
pub use study::{profile_study, sequence_study, target_study};
