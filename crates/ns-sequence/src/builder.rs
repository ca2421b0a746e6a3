//! Parallel central-pressure scan producing an [`MrSequence`].

use std::sync::atomic::{AtomicUsize, Ordering};

use ns_core::units::solar_to_code;
use ns_eos::{EquationOfState, PressureGrid};
use ns_sim::{NeutronStar, SimError, SimResult, StarSolver};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{SequenceError, SequenceResult};
use crate::options::SequenceOptions;
use crate::sequence::{MrSequence, RejectedStar, RejectionReason};

/// Scan progress, reported once per finished star.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceProgress {
    pub completed: usize,
    pub total: usize,
}

impl SequenceProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Callback invoked from worker threads.
pub type ProgressFn<'a> = &'a (dyn Fn(SequenceProgress) + Sync);

/// Builds mass-radius sequences for one EOS.
pub struct SequenceBuilder<'a, E: EquationOfState + ?Sized> {
    eos: &'a E,
    options: SequenceOptions,
}

impl<'a, E: EquationOfState + ?Sized> SequenceBuilder<'a, E> {
    pub fn new(eos: &'a E, options: SequenceOptions) -> SequenceResult<Self> {
        options.validate()?;
        Ok(Self { eos, options })
    }

    pub fn options(&self) -> &SequenceOptions {
        &self.options
    }

    /// Central pressures scanned, in increasing order.
    pub fn central_pressures(&self) -> SequenceResult<Vec<f64>> {
        let range = self
            .options
            .pressure_range
            .unwrap_or_else(|| self.eos.pressure_range());
        let grid = PressureGrid::over_range(range, self.options.num_points, self.options.spacing)?;
        Ok(grid.generate_points())
    }

    pub fn build(&self) -> SequenceResult<MrSequence> {
        self.build_with_progress(None)
    }

    /// Integrates every central pressure in parallel, then filters and
    /// classifies the results on the calling thread.
    pub fn build_with_progress(&self, progress: Option<ProgressFn<'_>>) -> SequenceResult<MrSequence> {
        let solver = StarSolver::new(self.eos, self.options.integration.clone())?;
        let pressures = self.central_pressures()?;
        let total = pressures.len();
        let done = AtomicUsize::new(0);

        info!(
            eos = self.eos.name(),
            points = total,
            p_min = pressures[0],
            p_max = pressures[total - 1],
            "building sequence"
        );

        let outcomes: Vec<(f64, SimResult<NeutronStar>)> = pressures
            .par_iter()
            .map(|&p_c| {
                let outcome = solver.solve(p_c);
                if let Some(report) = progress {
                    let completed = done.fetch_add(1, Ordering::Relaxed) + 1;
                    report(SequenceProgress { completed, total });
                }
                (p_c, outcome)
            })
            .collect();

        let mut stars = Vec::with_capacity(total);
        let mut rejected = Vec::new();
        for (p_c, outcome) in outcomes {
            match self.classify(p_c, outcome) {
                Ok(star) => stars.push(star),
                Err(rejection) => rejected.push(rejection),
            }
        }

        if stars.is_empty() {
            return Err(SequenceError::EmptySequence {
                rejected: rejected.len(),
            });
        }

        let sequence = MrSequence::new(self.eos.name(), stars, rejected);
        if let Some(top) = sequence.max_mass_star() {
            info!(
                eos = sequence.eos_name(),
                stars = sequence.len(),
                rejected = sequence.rejected().len(),
                stable = sequence.stable_branch().len(),
                max_mass = top.mass_solar(),
                radius_at_max = top.radius,
                "sequence built"
            );
        }
        Ok(sequence)
    }

    fn classify(&self, p_c: f64, outcome: SimResult<NeutronStar>) -> Result<NeutronStar, RejectedStar> {
        let reject = |reason: RejectionReason, detail: String| RejectedStar {
            p_c,
            reason,
            detail,
        };

        let star = match outcome {
            Ok(star) => star,
            Err(err) => {
                let reason = match &err {
                    SimError::NonConvergent { .. } => RejectionReason::NonConvergent,
                    SimError::Unstable { .. } => RejectionReason::UnstableTidal,
                    SimError::NonFinite { .. } => RejectionReason::NonFinite,
                    _ => RejectionReason::Failed,
                };
                warn!(p_c, %reason, error = %err, "star rejected");
                return Err(reject(reason, err.to_string()));
            }
        };

        if !star.is_finite() {
            warn!(p_c, "star rejected: non-finite result");
            return Err(reject(RejectionReason::NonFinite, "non-finite mass, radius or tidal response".into()));
        }
        if !star.converged && self.options.exclude_abort_radius {
            warn!(p_c, radius = star.radius, "star rejected: no surface inside abort radius");
            return Err(reject(
                RejectionReason::NonConvergent,
                format!("no surface inside r_max = {} km", star.radius),
            ));
        }
        if star.mass < solar_to_code(self.options.min_mass_solar) {
            debug!(p_c, mass = star.mass_solar(), "star below minimum mass");
            return Err(reject(
                RejectionReason::BelowMinimumMass,
                format!("M = {:.4e} Msun", star.mass_solar()),
            ));
        }
        Ok(star)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ns_core::units::MSUN_KM;
    use ns_eos::{Polytrope, SweepType};
    use ns_sim::IntegrationOptions;
    use std::sync::Mutex;

    fn polytrope() -> Polytrope {
        Polytrope::new(100.0 * MSUN_KM * MSUN_KM, 2.0).unwrap()
    }

    fn options(num_points: usize) -> SequenceOptions {
        SequenceOptions {
            num_points,
            pressure_range: Some((1e-5, 1e-3)),
            ..Default::default()
        }
    }

    #[test]
    fn grid_follows_explicit_range() {
        let eos = polytrope();
        let builder = SequenceBuilder::new(&eos, options(5)).unwrap();
        let p = builder.central_pressures().unwrap();
        assert_eq!(p.len(), 5);
        assert_eq!(p[0], 1e-5);
        assert_eq!(p[4], 1e-3);
        assert!((p[2] - 1e-4).abs() < 1e-15);
    }

    #[test]
    fn linear_grid_over_eos_domain() {
        let eos = polytrope();
        let table = eos.tabulate(1e-6, 1e-3, 40).unwrap();
        let opts = SequenceOptions {
            num_points: 4,
            spacing: SweepType::Linear,
            ..Default::default()
        };
        let builder = SequenceBuilder::new(&table, opts).unwrap();
        let p = builder.central_pressures().unwrap();
        assert_eq!(p.first(), Some(&1e-6));
        assert_eq!(p.last(), Some(&1e-3));
    }

    #[test]
    fn reports_progress_for_every_point() {
        let eos = polytrope();
        let builder = SequenceBuilder::new(&eos, options(6)).unwrap();
        let seen = Mutex::new(Vec::new());
        let report = |p: SequenceProgress| seen.lock().unwrap().push(p);
        let sequence = builder.build_with_progress(Some(&report)).unwrap();

        let mut seen = seen.into_inner().unwrap();
        seen.sort_by_key(|p| p.completed);
        assert_eq!(seen.len(), 6);
        assert_eq!(seen.last().map(|p| p.fraction()), Some(1.0));
        assert_eq!(sequence.len() + sequence.rejected().len(), 6);
    }

    #[test]
    fn abort_radius_stars_are_rejected() {
        let eos = polytrope();
        let opts = SequenceOptions {
            integration: IntegrationOptions {
                r_max: 12.0,
                ..Default::default()
            },
            ..options(6)
        };
        let sequence = SequenceBuilder::new(&eos, opts).unwrap().build().unwrap();
        // Low-pressure stars of this polytrope are larger than 12 km.
        assert!(
            sequence
                .rejected()
                .iter()
                .any(|r| r.reason == RejectionReason::NonConvergent)
        );
        assert!(sequence.stars().all(|s| s.converged && s.radius < 12.0));
    }

    #[test]
    fn all_rejected_is_an_error() {
        let eos = polytrope();
        let opts = SequenceOptions {
            min_mass_solar: 50.0,
            ..options(4)
        };
        let err = SequenceBuilder::new(&eos, opts).unwrap().build().unwrap_err();
        assert_eq!(err, SequenceError::EmptySequence { rejected: 4 });
    }

    #[test]
    fn invalid_options_are_rejected() {
        let eos = polytrope();
        let opts = SequenceOptions {
            num_points: 0,
            ..Default::default()
        };
        assert!(SequenceBuilder::new(&eos, opts).is_err());
    }
}
