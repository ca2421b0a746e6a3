//! Mass-radius sequences and their stability classification.

use std::fmt;

use ns_core::lerp;
use ns_sim::NeutronStar;

use crate::error::{SequenceError, SequenceResult};
use crate::locator::Target;

/// Why a scanned central pressure did not make it into the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// No surface inside the abort radius, or the integrator gave up.
    NonConvergent,
    BelowMinimumMass,
    /// The tidal function diverged.
    UnstableTidal,
    NonFinite,
    /// Any other integration error.
    Failed,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectionReason::NonConvergent => "non-convergent",
            RejectionReason::BelowMinimumMass => "below minimum mass",
            RejectionReason::UnstableTidal => "unstable tidal integration",
            RejectionReason::NonFinite => "non-finite result",
            RejectionReason::Failed => "integration failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedStar {
    pub p_c: f64,
    pub reason: RejectionReason,
    pub detail: String,
}

/// A star of the sequence with its local stability label.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencePoint {
    pub star: NeutronStar,
    /// dM/dp_c > 0 at this point
    pub stable: bool,
}

/// Stable-branch values linearly interpolated at a given mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassInterpolation {
    pub mass_solar: f64,
    pub p_c: f64,
    pub radius: f64,
    pub k2: Option<f64>,
    pub lambda: Option<f64>,
}

/// Stars of one EOS ordered by increasing central pressure.
#[derive(Debug, Clone, PartialEq)]
pub struct MrSequence {
    eos_name: String,
    points: Vec<SequencePoint>,
    rejected: Vec<RejectedStar>,
}

impl MrSequence {
    /// Sorts `stars` by central pressure and labels each one. A point is
    /// stable when its mass exceeds that of its predecessor; the first point
    /// takes the label of the forward difference.
    pub fn new(
        eos_name: impl Into<String>,
        mut stars: Vec<NeutronStar>,
        mut rejected: Vec<RejectedStar>,
    ) -> Self {
        stars.sort_by(|a, b| a.p_c.total_cmp(&b.p_c));
        rejected.sort_by(|a, b| a.p_c.total_cmp(&b.p_c));

        let masses: Vec<f64> = stars.iter().map(|s| s.mass).collect();
        let points = stars
            .into_iter()
            .enumerate()
            .map(|(i, star)| {
                let stable = match (i, masses.len()) {
                    (_, 1) => true,
                    (0, _) => masses[1] > masses[0],
                    _ => masses[i] > masses[i - 1],
                };
                SequencePoint { star, stable }
            })
            .collect();

        Self {
            eos_name: eos_name.into(),
            points,
            rejected,
        }
    }

    pub fn eos_name(&self) -> &str {
        &self.eos_name
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[SequencePoint] {
        &self.points
    }

    pub fn stars(&self) -> impl Iterator<Item = &NeutronStar> {
        self.points.iter().map(|p| &p.star)
    }

    pub fn rejected(&self) -> &[RejectedStar] {
        &self.rejected
    }

    /// Index of the global mass maximum (earliest on ties).
    pub fn max_mass_index(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, p) in self.points.iter().enumerate() {
            if best.is_none_or(|b| p.star.mass > self.points[b].star.mass) {
                best = Some(i);
            }
        }
        best
    }

    pub fn max_mass_star(&self) -> Option<&NeutronStar> {
        self.max_mass_index().map(|i| &self.points[i].star)
    }

    /// Contiguous run of points ending at the maximum-mass star along which
    /// the mass strictly increases with central pressure.
    pub fn stable_branch(&self) -> &[SequencePoint] {
        let Some(top) = self.max_mass_index() else {
            return &[];
        };
        let mut start = top;
        while start > 0 && self.points[start - 1].star.mass < self.points[start].star.mass {
            start -= 1;
        }
        &self.points[start..=top]
    }

    /// R, k2 and Λ at `mass_solar`, interpolated between neighbouring
    /// stable-branch stars.
    pub fn interpolate_at_mass(&self, mass_solar: f64) -> SequenceResult<MassInterpolation> {
        let target = Target::Mass(mass_solar);
        if !mass_solar.is_finite() || mass_solar <= 0.0 {
            return Err(SequenceError::InvalidArg {
                what: "interpolation mass must be positive and finite",
            });
        }
        let branch = self.stable_branch();
        let (Some(first), Some(last)) = (branch.first(), branch.last()) else {
            return Err(SequenceError::EmptySequence {
                rejected: self.rejected.len(),
            });
        };
        let (lo, hi) = (first.star.mass_solar(), last.star.mass_solar());
        if mass_solar < lo || mass_solar > hi {
            return Err(SequenceError::unreachable(
                target,
                format!("stable branch spans {lo:.4}..{hi:.4} Msun"),
            ));
        }
        if branch.len() == 1 {
            return Ok(Self::sample(&first.star));
        }

        let pair = branch
            .windows(2)
            .find(|w| w[1].star.mass_solar() >= mass_solar)
            .ok_or_else(|| SequenceError::unreachable(target, "no bracketing stars"))?;
        let (a, b) = (&pair[0].star, &pair[1].star);
        let (ma, mb) = (a.mass_solar(), b.mass_solar());
        let at = |ya: f64, yb: f64| lerp(ma, ya, mb, yb, mass_solar);
        let both = |ya: Option<f64>, yb: Option<f64>| Some(at(ya?, yb?));

        Ok(MassInterpolation {
            mass_solar,
            p_c: at(a.p_c, b.p_c),
            radius: at(a.radius, b.radius),
            k2: both(a.k2(), b.k2()),
            lambda: both(a.lambda(), b.lambda()),
        })
    }

    fn sample(star: &NeutronStar) -> MassInterpolation {
        MassInterpolation {
            mass_solar: star.mass_solar(),
            p_c: star.p_c,
            radius: star.radius,
            k2: star.k2(),
            lambda: star.lambda(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ns_core::units::MSUN_KM;
    use ns_sim::TidalResponse;
    use proptest::prelude::*;

    pub(crate) fn star(p_c: f64, mass_solar: f64, radius: f64) -> NeutronStar {
        NeutronStar {
            p_c,
            eps_c: 10.0 * p_c,
            radius,
            mass: mass_solar * MSUN_KM,
            converged: true,
            tidal: Some(TidalResponse {
                k2: 0.1,
                lambda: 1000.0 / mass_solar,
                y_surface: 1.0,
            }),
            profile: None,
        }
    }

    fn turning_point_sequence() -> MrSequence {
        let masses = [0.5, 1.0, 1.5, 1.9, 2.0, 1.95, 1.8];
        let stars = masses
            .iter()
            .enumerate()
            .rev()
            .map(|(i, &m)| star(1e-5 * (i + 1) as f64, m, 14.0 - i as f64))
            .collect();
        MrSequence::new("toy", stars, Vec::new())
    }

    #[test]
    fn sorts_and_labels_stability() {
        let seq = turning_point_sequence();
        let p: Vec<f64> = seq.stars().map(|s| s.p_c).collect();
        assert!(p.windows(2).all(|w| w[0] < w[1]));
        let labels: Vec<bool> = seq.points().iter().map(|p| p.stable).collect();
        assert_eq!(labels, vec![true, true, true, true, true, false, false]);
    }

    #[test]
    fn maximum_mass_and_stable_branch() {
        let seq = turning_point_sequence();
        assert_eq!(seq.max_mass_index(), Some(4));
        assert!((seq.max_mass_star().unwrap().mass_solar() - 2.0).abs() < 1e-12);
        assert_eq!(seq.stable_branch().len(), 5);
    }

    #[test]
    fn stable_branch_starts_after_a_dip() {
        let stars = vec![
            star(1e-5, 0.3, 20.0),
            star(2e-5, 0.2, 18.0),
            star(3e-5, 0.9, 15.0),
            star(4e-5, 1.6, 12.0),
        ];
        let seq = MrSequence::new("dip", stars, Vec::new());
        let branch = seq.stable_branch();
        assert_eq!(branch.len(), 3);
        assert_eq!(branch[0].star.p_c, 2e-5);
    }

    #[test]
    fn interpolates_on_the_stable_branch() {
        let seq = turning_point_sequence();
        let at = seq.interpolate_at_mass(1.25).unwrap();
        assert!((at.radius - 12.5).abs() < 1e-12);
        assert!((at.p_c - 2.5e-5).abs() < 1e-17);
        assert_eq!(at.k2, Some(0.1));

        let near_top = seq.interpolate_at_mass(1.95).unwrap();
        assert!((near_top.radius - 10.5).abs() < 1e-9);
    }

    #[test]
    fn interpolation_outside_branch_is_unreachable() {
        let seq = turning_point_sequence();
        assert!(matches!(
            seq.interpolate_at_mass(2.1),
            Err(SequenceError::TargetUnreachable { .. })
        ));
        assert!(matches!(
            seq.interpolate_at_mass(0.4),
            Err(SequenceError::TargetUnreachable { .. })
        ));
    }

    #[test]
    fn empty_sequence() {
        let seq = MrSequence::new("none", Vec::new(), Vec::new());
        assert!(seq.max_mass_star().is_none());
        assert!(seq.stable_branch().is_empty());
        assert!(matches!(
            seq.interpolate_at_mass(1.4),
            Err(SequenceError::EmptySequence { .. })
        ));
    }

    proptest! {
        #[test]
        fn stable_branch_mass_is_increasing(masses in prop::collection::vec(0.05f64..3.0, 1..40)) {
            let stars = masses
                .iter()
                .enumerate()
                .map(|(i, &m)| star(1e-6 * (i + 1) as f64, m, 12.0))
                .collect();
            let seq = MrSequence::new("random", stars, Vec::new());
            let branch = seq.stable_branch();
            prop_assert!(!branch.is_empty());
            prop_assert!(branch.windows(2).all(|w| w[1].star.mass > w[0].star.mass));
            prop_assert!(branch.windows(2).all(|w| w[1].star.p_c > w[0].star.p_c));
            let top = seq.max_mass_star().unwrap();
            prop_assert_eq!(branch.last().unwrap().star.mass, top.mass);
        }
    }
}
