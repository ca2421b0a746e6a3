//! Run execution and caching service.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use ns_eos::EosTable;
use ns_results::{
    RunManifest, RunStore, RunType, SequenceRecord, StarProfileRecord, compute_run_id, eos_digest,
    save_sequence_csv, save_star_json, write_profile_csv,
};
use ns_sequence::SequenceProgress;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{
    self, IntegrationSettings, LocatorSettings, RunConfig, SequenceSettings, TargetDef,
};
use crate::error::AppResult;
use crate::progress::{ProgressCallback, RunProgressEvent, RunStage};
use crate::runtime;
use crate::study;

/// Options for running studies.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub solver_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            solver_version: "0.1.0".to_string(),
        }
    }
}

/// Request to execute a run.
pub struct RunRequest<'a> {
    pub config_path: &'a Path,
    pub options: RunOptions,
}

/// Concise timing summary for a run.
#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub load_eos_time_s: f64,
    pub sequence_time_s: f64,
    pub locate_time_s: f64,
    pub save_time_s: f64,
    pub export_time_s: f64,
    pub load_cache_time_s: f64,
    pub total_time_s: f64,
}

/// Outcome of one requested target. Failures are kept per target so one
/// unreachable target does not discard the others.
#[derive(Debug, Clone)]
pub struct TargetOutcome {
    pub target: TargetDef,
    pub label: String,
    pub result: Result<StarProfileRecord, String>,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub loaded_from_cache: bool,
    pub sequence: SequenceRecord,
    pub targets: Vec<TargetOutcome>,
    /// Files written to the configured output directory.
    pub exported: Vec<PathBuf>,
    pub timing: RunTimingSummary,
}

/// Everything that changes the numbers of a run besides the EOS.
#[derive(Serialize)]
struct CacheKey<'a> {
    sequence: &'a SequenceSettings,
    integration: &'a IntegrationSettings,
    locator: &'a LocatorSettings,
    targets: &'a [TargetDef],
}

fn emit_progress(
    progress_cb: &mut Option<ProgressCallback<'_>>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
    sequence: Option<SequenceProgress>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent {
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message,
            sequence,
        });
    }
}

/// Execute or load a run based on request.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, None)
}

/// Execute or load a run and stream progress events.
pub fn ensure_run_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<ProgressCallback<'_>>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mut timing = RunTimingSummary::default();

    emit_progress(
        &mut progress_cb,
        RunStage::LoadingConfig,
        started,
        Some("Loading run config".to_string()),
        None,
    );
    let config = config::load_config(request.config_path)?;
    config::validate_config(&config)?;
    let base_dir = request
        .config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    emit_progress(
        &mut progress_cb,
        RunStage::LoadingEos,
        started,
        Some("Loading EOS".to_string()),
        None,
    );
    let load_started = Instant::now();
    let eos = runtime::load_eos(&config.eos, &base_dir)?;
    timing.load_eos_time_s = load_started.elapsed().as_secs_f64();

    emit_progress(
        &mut progress_cb,
        RunStage::CheckingCache,
        started,
        Some("Checking run cache".to_string()),
        None,
    );
    let key = CacheKey {
        sequence: &config.sequence,
        integration: &config.integration,
        locator: &config.locator,
        targets: &config.targets,
    };
    let run_id = compute_run_id(&eos_digest(&eos), &key, &request.options.solver_version);
    let store = RunStore::for_config(request.config_path)?;

    let (manifest, sequence, targets, loaded_from_cache) =
        if request.options.use_cache && store.has_run(&run_id) {
            emit_progress(
                &mut progress_cb,
                RunStage::LoadingCachedResult,
                started,
                Some("Loading cached run".to_string()),
                None,
            );
            let load_started = Instant::now();
            let (manifest, sequence) = store.load_run(&run_id)?;
            let targets = load_targets(&store, &run_id, &config.targets)?;
            timing.load_cache_time_s = load_started.elapsed().as_secs_f64();
            info!(run_id = %run_id, "loaded cached run");
            (manifest, sequence, targets, true)
        } else {
            let (sequence, targets) =
                execute(&config, &eos, &mut progress_cb, started, &mut timing)?;

            emit_progress(
                &mut progress_cb,
                RunStage::SavingResults,
                started,
                Some("Saving results".to_string()),
                None,
            );
            let save_started = Instant::now();
            let manifest = RunManifest::new(
                run_id.clone(),
                eos.name(),
                RunType::Sequence {
                    num_points: config.sequence.num_points,
                },
                request.options.solver_version.clone(),
            );
            for outcome in &targets {
                if let Ok(star) = &outcome.result {
                    store.save_star(&run_id, &outcome.label, star)?;
                }
            }
            store.save_run(&manifest, &sequence)?;
            timing.save_time_s = save_started.elapsed().as_secs_f64();
            (manifest, sequence, targets, false)
        };

    let mut exported = Vec::new();
    if let Some(dir) = &config.output_dir {
        emit_progress(
            &mut progress_cb,
            RunStage::Exporting,
            started,
            Some("Exporting results".to_string()),
            None,
        );
        let export_started = Instant::now();
        let dir = if dir.is_relative() { base_dir.join(dir) } else { dir.clone() };
        exported = export(&dir, &runtime::run_name(&config, &eos), &sequence, &targets)?;
        timing.export_time_s = export_started.elapsed().as_secs_f64();
    }

    timing.total_time_s = started.elapsed().as_secs_f64();
    emit_progress(
        &mut progress_cb,
        RunStage::Completed,
        started,
        Some("Run completed".to_string()),
        None,
    );

    Ok(RunResponse {
        run_id,
        manifest,
        loaded_from_cache,
        sequence,
        targets,
        exported,
        timing,
    })
}

/// Build the sequence and locate every target of `config`.
fn execute(
    config: &RunConfig,
    eos: &EosTable,
    progress_cb: &mut Option<ProgressCallback<'_>>,
    started: Instant,
    timing: &mut RunTimingSummary,
) -> AppResult<(SequenceRecord, Vec<TargetOutcome>)> {
    emit_progress(
        progress_cb,
        RunStage::BuildingSequence,
        started,
        Some(format!(
            "Integrating {} stars",
            config.sequence.num_points
        )),
        None,
    );
    let sequence_started = Instant::now();
    let sequence = {
        let shared = Mutex::new(&mut *progress_cb);
        let report = |p: SequenceProgress| {
            if let Ok(mut cb) = shared.lock() {
                emit_progress(&mut **cb, RunStage::BuildingSequence, started, None, Some(p));
            }
        };
        study::sequence_study(eos, &config.sequence, &config.integration, Some(&report))?
    };
    timing.sequence_time_s = sequence_started.elapsed().as_secs_f64();

    emit_progress(
        progress_cb,
        RunStage::LocatingTargets,
        started,
        Some(format!("Locating {} targets", config.targets.len())),
        None,
    );
    let locate_started = Instant::now();
    let targets = config
        .targets
        .iter()
        .map(|def| {
            let result = study::target_study(
                eos,
                &sequence,
                runtime::target(def),
                &config.locator,
                &config.integration,
            )
            .map(|located| StarProfileRecord::from_located(&located, eos, Some(eos)))
            .map_err(|e| {
                warn!(label = %def.label(), error = %e, "target not located");
                e.to_string()
            });
            TargetOutcome {
                target: *def,
                label: def.label(),
                result,
            }
        })
        .collect();
    timing.locate_time_s = locate_started.elapsed().as_secs_f64();

    Ok((SequenceRecord::from_sequence(&sequence, Some(eos)), targets))
}

fn load_targets(
    store: &RunStore,
    run_id: &str,
    targets: &[TargetDef],
) -> AppResult<Vec<TargetOutcome>> {
    targets
        .iter()
        .map(|def| -> AppResult<TargetOutcome> {
            let label = def.label();
            let result = if store.has_star(run_id, &label) {
                Ok(store.load_star(run_id, &label)?)
            } else {
                Err("target was not located in the cached run".to_string())
            };
            Ok(TargetOutcome {
                target: *def,
                label,
                result,
            })
        })
        .collect()
}

fn export(
    dir: &Path,
    name: &str,
    sequence: &SequenceRecord,
    targets: &[TargetOutcome],
) -> AppResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let path = dir.join(format!("{name}_sequence.csv"));
    save_sequence_csv(&path, sequence)?;
    written.push(path);

    for outcome in targets {
        let Ok(star) = &outcome.result else {
            continue;
        };
        let json = dir.join(format!("{name}_{}.json", outcome.label));
        save_star_json(&json, star)?;
        written.push(json);

        let csv = dir.join(format!("{name}_{}_profile.csv", outcome.label));
        write_profile_csv(std::fs::File::create(&csv)?, star)?;
        written.push(csv);
    }
    Ok(written)
}

/// List stored runs for an EOS next to a config file.
pub fn list_runs(config_path: &Path, eos_name: &str) -> AppResult<Vec<RunManifest>> {
    let store = RunStore::for_config(config_path)?;
    Ok(store.list_runs(eos_name)?)
}

/// Load a stored sequence by run id.
pub fn load_run(config_path: &Path, run_id: &str) -> AppResult<(RunManifest, SequenceRecord)> {
    let store = RunStore::for_config(config_path)?;
    Ok(store.load_run(run_id)?)
}
