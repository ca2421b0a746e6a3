//! One-off computations on an already loaded EOS, without the run cache.

use ns_eos::EosTable;
use ns_sequence::{
    LocatedStar, MrSequence, ProgressFn, SequenceBuilder, Target, TargetLocator,
};
use ns_sim::{IntegrationOptions, NeutronStar, StarSolver};
use tracing::info;

use crate::config::{IntegrationSettings, LocatorSettings, SequenceSettings};
use crate::error::AppResult;
use crate::runtime;

/// Mass-radius sequence of `eos`.
pub fn sequence_study(
    eos: &EosTable,
    settings: &SequenceSettings,
    integration: &IntegrationSettings,
    progress: Option<ProgressFn<'_>>,
) -> AppResult<MrSequence> {
    let options = runtime::sequence_options(settings, integration, eos)?;
    let sequence = SequenceBuilder::new(eos, options)?.build_with_progress(progress)?;
    Ok(sequence)
}

/// Star of the given mass or radius on the stable branch of `sequence`.
pub fn target_study(
    eos: &EosTable,
    sequence: &MrSequence,
    target: Target,
    locator: &LocatorSettings,
    integration: &IntegrationSettings,
) -> AppResult<LocatedStar> {
    let options = runtime::locator_options(locator, integration);
    let located = TargetLocator::new(eos, sequence, options)?.locate(target)?;
    Ok(located)
}

/// Single star with its radial profile sampled every `spacing_km`.
pub fn profile_study(
    eos: &EosTable,
    p_c: f64,
    integration: &IntegrationSettings,
    spacing_km: f64,
) -> AppResult<NeutronStar> {
    let options = IntegrationOptions {
        record_profile: true,
        profile_spacing: spacing_km,
        ..runtime::integration_options(integration)
    };
    let star = StarSolver::new(eos, options)?.solve(p_c)?;
    info!(
        p_c,
        mass = star.mass_solar(),
        radius = star.radius,
        lambda = star.lambda(),
        "profile computed"
    );
    Ok(star)
}
