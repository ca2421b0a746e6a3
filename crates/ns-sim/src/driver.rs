//! Radial driver: integrate a model from the centre out to the stellar surface.

use ns_core::{Tolerances, ensure_finite};
use tracing::trace;

use crate::error::{SimError, SimResult};
use crate::events::{crossed, crossing_fraction};
use crate::integrator::{DormandPrince54, Rk4, StepOutcome, Stepper};
use crate::model::{RadialModel, State};

/// Integrator selection for structure runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntegratorType {
    /// Adaptive Dormand-Prince 5(4) (default, error-controlled).
    #[default]
    DormandPrince,
    /// Fixed-step RK4 with step `initial_step`.
    Rk4,
}

/// Options for a single-star integration.
#[derive(Clone, Debug, PartialEq)]
pub struct IntegrationOptions {
    /// Relative tolerance of the adaptive stepper
    pub rtol: f64,
    /// Absolute tolerance of the adaptive stepper
    pub atol: f64,
    /// Radius (km) at which the centre series hands over to the stepper
    pub initial_radius: f64,
    /// First trial step (km); the fixed step for RK4
    pub initial_step: f64,
    /// Largest step the adaptive controller may take (km)
    pub max_step: f64,
    /// Step-size floor before the integration is declared non-convergent (km)
    pub min_step: f64,
    /// Abort radius (km): stars without a surface inside it are non-physical
    pub r_max: f64,
    /// Maximum number of attempted steps (safety limit)
    pub max_steps: usize,
    /// Surface is where p drops below this fraction of p_c (or the EOS floor)
    pub surface_pressure_fraction: f64,
    /// Radial resolution of the surface location (km)
    pub surface_resolution: f64,
    /// Additive regularization of r(r - 2m)
    pub denominator_epsilon: f64,
    /// |y| beyond which the tidal integration counts as diverged
    pub tidal_divergence_limit: f64,
    /// Integrator type (default: Dormand-Prince)
    pub integrator: IntegratorType,
    /// Keep the radial profile of the star
    pub record_profile: bool,
    /// Minimum radial spacing between recorded samples (km); 0 keeps every step
    pub profile_spacing: f64,
}

impl Default for IntegrationOptions {
    fn default() -> Self {
        Self {
            rtol: 1e-12,
            atol: 1e-14,
            initial_radius: 1e-6,
            initial_step: 1e-3,
            max_step: 0.5,
            min_step: 1e-12,
            r_max: 100.0,
            max_steps: 500_000,
            surface_pressure_fraction: 1e-12,
            surface_resolution: 1e-9,
            denominator_epsilon: 1e-30,
            tidal_divergence_limit: 1e6,
            integrator: IntegratorType::default(),
            record_profile: false,
            profile_spacing: 0.0,
        }
    }
}

impl IntegrationOptions {
    pub fn validate(&self) -> SimResult<()> {
        for (value, what) in [
            (self.rtol, "rtol"),
            (self.atol, "atol"),
            (self.initial_radius, "initial_radius"),
            (self.initial_step, "initial_step"),
            (self.max_step, "max_step"),
            (self.min_step, "min_step"),
            (self.r_max, "r_max"),
            (self.surface_pressure_fraction, "surface_pressure_fraction"),
            (self.surface_resolution, "surface_resolution"),
            (self.denominator_epsilon, "denominator_epsilon"),
            (self.tidal_divergence_limit, "tidal_divergence_limit"),
            (self.profile_spacing, "profile_spacing"),
        ] {
            ensure_finite(value, what)?;
        }

        let positive = |v: f64| v > 0.0;
        if !positive(self.rtol) || !positive(self.atol) {
            return Err(SimError::InvalidArg {
                what: "rtol and atol must be positive",
            });
        }
        if !positive(self.initial_radius) || !positive(self.initial_step) {
            return Err(SimError::InvalidArg {
                what: "initial radius and step must be positive",
            });
        }
        if !positive(self.max_step) || !positive(self.min_step) || self.min_step > self.max_step {
            return Err(SimError::InvalidArg {
                what: "step bounds must satisfy 0 < min_step <= max_step",
            });
        }
        if !(self.r_max > self.initial_radius) {
            return Err(SimError::InvalidArg {
                what: "r_max must exceed the initial radius",
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive",
            });
        }
        if !(0.0..1.0).contains(&self.surface_pressure_fraction) {
            return Err(SimError::InvalidArg {
                what: "surface_pressure_fraction must lie in [0, 1)",
            });
        }
        if !positive(self.surface_resolution) {
            return Err(SimError::InvalidArg {
                what: "surface_resolution must be positive",
            });
        }
        if !(self.denominator_epsilon >= 0.0) {
            return Err(SimError::InvalidArg {
                what: "denominator_epsilon must be non-negative",
            });
        }
        if !positive(self.tidal_divergence_limit) {
            return Err(SimError::InvalidArg {
                what: "tidal_divergence_limit must be positive",
            });
        }
        if !(self.profile_spacing >= 0.0) {
            return Err(SimError::InvalidArg {
                what: "profile_spacing must be non-negative",
            });
        }
        Ok(())
    }

    pub fn tolerances(&self) -> Tolerances {
        Tolerances {
            abs: self.atol,
            rel: self.rtol,
        }
    }
}

/// Outcome of one outward integration.
#[derive(Clone, Debug)]
pub struct RadialTrajectory<const D: usize> {
    /// Recorded radii; always holds the start and the final point.
    pub radii: Vec<f64>,
    /// States at `radii`.
    pub states: Vec<State<D>>,
    /// Surface radius, or `r_max` when no surface was found.
    pub surface_radius: f64,
    /// State at `surface_radius`.
    pub surface_state: State<D>,
    /// False when the integration reached `r_max` without a surface.
    pub converged: bool,
    /// Accepted steps.
    pub steps: usize,
}

/// Advance with the configured stepper.
fn attempt<const D: usize, M: RadialModel<D>>(
    model: &M,
    r: f64,
    x: &State<D>,
    h: f64,
    opts: &IntegrationOptions,
    tol: &Tolerances,
) -> SimResult<StepOutcome<D>> {
    match opts.integrator {
        IntegratorType::DormandPrince => DormandPrince54.step(model, r, x, h, tol),
        IntegratorType::Rk4 => Rk4.step(model, r, x, h, tol),
    }
}

/// Step-size factor from a scaled error estimate.
fn step_factor(error: f64, order: i32) -> f64 {
    const SAFETY: f64 = 0.9;
    const MIN_FACTOR: f64 = 0.2;
    const MAX_FACTOR: f64 = 5.0;
    if error == 0.0 {
        return MAX_FACTOR;
    }
    (SAFETY * error.powf(-1.0 / order as f64)).clamp(MIN_FACTOR, MAX_FACTOR)
}

struct Recorder<const D: usize> {
    enabled: bool,
    spacing: f64,
    radii: Vec<f64>,
    states: Vec<State<D>>,
}

impl<const D: usize> Recorder<D> {
    fn new(opts: &IntegrationOptions, r0: f64, x0: &State<D>) -> Self {
        Self {
            enabled: opts.record_profile,
            spacing: opts.profile_spacing,
            radii: vec![r0],
            states: vec![*x0],
        }
    }

    fn push(&mut self, r: f64, x: &State<D>) {
        if !self.enabled {
            return;
        }
        let last = self.radii[self.radii.len() - 1];
        if r - last >= self.spacing {
            self.radii.push(r);
            self.states.push(*x);
        }
    }

    fn finish(mut self, r: f64, x: &State<D>) -> (Vec<f64>, Vec<State<D>>) {
        let last = self.radii[self.radii.len() - 1];
        if r > last {
            self.radii.push(r);
            self.states.push(*x);
        } else if let Some(s) = self.states.last_mut() {
            *s = *x;
        }
        (self.radii, self.states)
    }
}

/// Integrate `model` outward from `(r0, x0)` until the pressure drops below
/// `surface_pressure`.
///
/// A step whose trial end point crosses the threshold is not accepted
/// directly. Instead the step length is bracketed by bisection (with the
/// trial steps taken from the same base point) until the bracket is narrower
/// than `surface_resolution`, and the surface state is linearly interpolated
/// inside it. Reaching `r_max` returns a trajectory with `converged = false`.
pub fn integrate_to_surface<const D: usize, M: RadialModel<D>>(
    model: &M,
    r0: f64,
    x0: State<D>,
    surface_pressure: f64,
    opts: &IntegrationOptions,
) -> SimResult<RadialTrajectory<D>> {
    opts.validate()?;
    let p0 = model.pressure(&x0);
    if crossed(p0, surface_pressure) || p0 == surface_pressure {
        return Err(SimError::non_convergent(
            p0,
            "central pressure does not exceed the surface pressure",
        ));
    }

    let tol = opts.tolerances();
    let adaptive = opts.integrator == IntegratorType::DormandPrince;
    let order = match opts.integrator {
        IntegratorType::DormandPrince => DormandPrince54.order(),
        IntegratorType::Rk4 => Rk4.order(),
    };

    let mut recorder = Recorder::new(opts, r0, &x0);
    let mut r = r0;
    let mut x = x0;
    let mut h = opts.initial_step.min(opts.max_step);
    let mut attempts = 0usize;
    let mut accepted = 0usize;

    loop {
        if r >= opts.r_max {
            trace!(r, steps = accepted, "abort radius reached without a surface");
            let (radii, states) = recorder.finish(r, &x);
            return Ok(RadialTrajectory {
                radii,
                states,
                surface_radius: r,
                surface_state: x,
                converged: false,
                steps: accepted,
            });
        }
        if attempts >= opts.max_steps {
            return Err(SimError::non_convergent(
                model.pressure(&x0),
                format!("step limit {} reached at r = {r} km", opts.max_steps),
            ));
        }
        attempts += 1;

        let h_try = h.min(opts.max_step).min(opts.r_max - r);
        let trial = attempt(model, r, &x, h_try, opts, &tol)?;
        let p_trial = model.pressure(&trial.state);

        if crossed(p_trial, surface_pressure) {
            let (r_s, x_s) = locate_surface(model, r, &x, h_try, surface_pressure, opts, &tol)?;
            model.validate(r_s, &x_s)?;
            let (radii, states) = recorder.finish(r_s, &x_s);
            trace!(radius = r_s, steps = accepted, "surface located");
            return Ok(RadialTrajectory {
                radii,
                states,
                surface_radius: r_s,
                surface_state: x_s,
                converged: true,
                steps: accepted,
            });
        }

        let error = trial.error.unwrap_or(0.0);
        if adaptive && !(error <= 1.0) {
            let factor = if error.is_finite() {
                step_factor(error, order)
            } else {
                0.2
            };
            h = h_try * factor;
            if h < opts.min_step {
                // Report the model's own diagnosis when it has one.
                model.validate(r + h_try, &trial.state)?;
                return Err(SimError::non_convergent(
                    model.pressure(&x0),
                    format!("step size underflow at r = {r} km"),
                ));
            }
            continue;
        }

        let mut x_new = trial.state;
        model.on_accepted_step(r, &x, r + h_try, &mut x_new)?;
        model.validate(r + h_try, &x_new)?;
        r += h_try;
        if opts.r_max - r < opts.min_step {
            r = opts.r_max;
        }
        x = x_new;
        accepted += 1;
        recorder.push(r, &x);

        if adaptive {
            h = h_try * step_factor(error, order);
        }
    }
}

/// Bisect the step length from `(r, x)` onto the surface threshold and
/// interpolate the state inside the final bracket.
fn locate_surface<const D: usize, M: RadialModel<D>>(
    model: &M,
    r: f64,
    x: &State<D>,
    h_cross: f64,
    threshold: f64,
    opts: &IntegrationOptions,
    tol: &Tolerances,
) -> SimResult<(f64, State<D>)> {
    let mut lo = 0.0;
    let mut x_lo = *x;
    let mut hi = h_cross;
    let mut x_hi = attempt(model, r, x, hi, opts, tol)?.state;

    while hi - lo > opts.surface_resolution {
        let mid = 0.5 * (lo + hi);
        let x_mid = attempt(model, r, x, mid, opts, tol)?.state;
        if crossed(model.pressure(&x_mid), threshold) {
            hi = mid;
            x_hi = x_mid;
        } else {
            lo = mid;
            x_lo = x_mid;
        }
    }

    let p_lo = model.pressure(&x_lo);
    let p_hi = model.pressure(&x_hi);
    let frac = if x_hi.iter().all(|v| v.is_finite()) {
        crossing_fraction(p_lo, p_hi, threshold)
    } else {
        0.0
    };
    let r_s = r + lo + frac * (hi - lo);
    let mut x_s = x_lo + (x_hi - x_lo) * frac;
    if !x_s.iter().all(|v| v.is_finite()) {
        x_s = x_lo;
    }
    model.on_accepted_step(r, x, r_s, &mut x_s)?;
    Ok((r_s, x_s))
}
