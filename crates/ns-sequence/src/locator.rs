//! Search for the stable star with a given mass or radius.
//!
//! The search brackets the target between adjacent stable-branch stars of an
//! existing sequence, bisects the central pressure geometrically with
//! structure-only integrations, and finishes with one full structure + tidal
//! run at the accepted pressure.

use std::fmt;

use ns_eos::EquationOfState;
use ns_sim::{NeutronStar, StarSolver};
use tracing::{debug, info};

use crate::error::{SequenceError, SequenceResult};
use crate::options::LocatorOptions;
use crate::sequence::MrSequence;

/// Quantity to match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    /// Gravitational mass in solar masses
    Mass(f64),
    /// Radius in km
    Radius(f64),
}

impl Target {
    pub fn value(&self) -> f64 {
        match *self {
            Target::Mass(m) => m,
            Target::Radius(r) => r,
        }
    }

    /// The matched quantity of `star`, in the target's units.
    pub fn measure(&self, star: &NeutronStar) -> f64 {
        match self {
            Target::Mass(_) => star.mass_solar(),
            Target::Radius(_) => star.radius,
        }
    }

    fn tolerance(&self, options: &LocatorOptions) -> f64 {
        match self {
            Target::Mass(_) => options.mass_tolerance_solar,
            Target::Radius(_) => options.radius_tolerance_km,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Mass(m) => write!(f, "M = {m} Msun"),
            Target::Radius(r) => write!(f, "R = {r} km"),
        }
    }
}

/// Star returned by a target search.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedStar {
    pub target: Target,
    pub star: NeutronStar,
    /// Structure-only integrations spent in bisection
    pub iterations: usize,
    /// Central-pressure bracket taken from the coarse sequence
    pub bracket: (f64, f64),
}

impl LocatedStar {
    /// |measured - target| of the returned star.
    pub fn error(&self) -> f64 {
        (self.target.measure(&self.star) - self.target.value()).abs()
    }
}

pub struct TargetLocator<'a, E: EquationOfState + ?Sized> {
    sequence: &'a MrSequence,
    search: StarSolver<'a, E>,
    finish: StarSolver<'a, E>,
    options: LocatorOptions,
}

impl<'a, E: EquationOfState + ?Sized> TargetLocator<'a, E> {
    /// `sequence` must have been built from `eos`.
    pub fn new(eos: &'a E, sequence: &'a MrSequence, options: LocatorOptions) -> SequenceResult<Self> {
        options.validate()?;
        Ok(Self {
            sequence,
            search: StarSolver::new(eos, options.search_integration.clone())?,
            finish: StarSolver::new(eos, options.final_integration.clone())?,
            options,
        })
    }

    pub fn options(&self) -> &LocatorOptions {
        &self.options
    }

    pub fn locate(&self, target: Target) -> SequenceResult<LocatedStar> {
        let goal = target.value();
        if !goal.is_finite() || goal <= 0.0 {
            return Err(SequenceError::InvalidArg {
                what: "target must be positive and finite",
            });
        }
        let tol = target.tolerance(&self.options);
        let (lo, hi) = self.bracket(target)?;
        debug!(goal = %target, p_lo = lo.0, p_hi = hi.0, "target bracketed");

        // Coarse star already good enough: skip bisection.
        let nearer = if (lo.1 - goal).abs() <= (hi.1 - goal).abs() { lo } else { hi };
        let (p_c, iterations) = if (nearer.1 - goal).abs() < tol {
            (nearer.0, 0)
        } else {
            self.bisect(target, lo, hi, tol)?
        };

        let star = self.finish.solve(p_c)?;
        let located = LocatedStar {
            target,
            star,
            iterations,
            bracket: (lo.0, hi.0),
        };
        let error = located.error();
        if !located.star.converged || !(error < tol) {
            return Err(SequenceError::SearchExhausted {
                iterations,
                best_error: error,
            });
        }

        info!(
            goal = %target,
            p_c,
            mass = located.star.mass_solar(),
            radius = located.star.radius,
            lambda = located.star.lambda(),
            iterations,
            "target located"
        );
        Ok(located)
    }

    /// Adjacent stable-branch stars `(p_c, value)` whose values enclose the
    /// target. R(p_c) need not be monotonic on the stable branch, so a radius
    /// can be bracketed more than once; the pair at the highest p_c wins.
    fn bracket(&self, target: Target) -> SequenceResult<((f64, f64), (f64, f64))> {
        let goal = target.value();
        let branch = self.sequence.stable_branch();
        if branch.is_empty() {
            return Err(SequenceError::EmptySequence {
                rejected: self.sequence.rejected().len(),
            });
        }

        let values: Vec<(f64, f64)> = branch
            .iter()
            .map(|p| (p.star.p_c, target.measure(&p.star)))
            .collect();
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), &(_, v)| (a.min(v), b.max(v)));

        if let Target::Mass(m) = target {
            if m > max {
                return Err(SequenceError::unreachable(
                    target,
                    format!("maximum mass is {max:.4} Msun"),
                ));
            }
        }
        if goal < min || goal > max {
            return Err(SequenceError::unreachable(
                target,
                format!("stable branch spans {min:.4}..{max:.4}"),
            ));
        }
        if values.len() == 1 {
            return Ok((values[0], values[0]));
        }

        // scan from the maximum-mass end: first hit is the densest pair
        values
            .windows(2)
            .rev()
            .find(|w| (w[0].1 - goal) * (w[1].1 - goal) <= 0.0)
            .map(|w| (w[0], w[1]))
            .ok_or_else(|| SequenceError::unreachable(target, "no bracketing stars on the stable branch"))
    }

    /// Geometric bisection on p_c; returns the accepted pressure and the
    /// number of integrations spent.
    fn bisect(
        &self,
        target: Target,
        (mut p_lo, v_lo): (f64, f64),
        (mut p_hi, _): (f64, f64),
        tol: f64,
    ) -> SequenceResult<(f64, usize)> {
        let goal = target.value();
        let below = v_lo < goal;
        let mut best_error = f64::INFINITY;

        for iteration in 1..=self.options.max_iterations {
            let p_mid = (p_lo * p_hi).sqrt();
            let star = self.search.structure(p_mid)?;
            let value = target.measure(&star);
            let error = value - goal;
            best_error = best_error.min(error.abs());
            debug!(iteration, p_c = p_mid, value, error, "bisection step");

            if star.converged && error.abs() < tol {
                return Ok((p_mid, iteration));
            }
            // Keep the sub-interval whose ends straddle the goal.
            if (value < goal) == below {
                p_lo = p_mid;
            } else {
                p_hi = p_mid;
            }
        }

        Err(SequenceError::SearchExhausted {
            iterations: self.options.max_iterations,
            best_error,
        })
    }
}
