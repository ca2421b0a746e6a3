//! Quadrupolar tidal perturbation integrated alongside the TOV system.
//!
//! The even-parity l = 2 perturbation reduces to a Riccati equation for
//! y = r H'/H,
//!
//! ```text
//! dy/dr = -[y² + y F(r) + r² Q(r)] / r
//! F     = e^λ [1 + 4π r² (p - ε)]
//! r² Q  = 4π r² e^λ [5ε + 9p + (ε + p) dε/dp] - 6 e^λ - 4 e^{2λ} (m + 4π r³ p)² / r²
//! ```
//!
//! with e^λ = r² / (r(r - 2m)) and y(0) = 2.

use std::f64::consts::PI;

use ns_eos::EquationOfState;
use tracing::trace;

use crate::driver::IntegrationOptions;
use crate::error::{SimError, SimResult};
use crate::model::{RadialModel, State};
use crate::structure::{self, MASS, NU, PRESSURE, local_structure};

pub const TIDAL_Y: usize = 3;

/// Compactness below which the Newtonian limit of k2 is used; the full
/// expression cancels down to O(C⁵) and loses precision there.
pub const NEWTONIAN_COMPACTNESS: f64 = 1e-3;

/// TOV system extended with the tidal function y.
pub struct TidalTovModel<'a, E: EquationOfState + ?Sized> {
    eos: &'a E,
    denominator_epsilon: f64,
    divergence_limit: f64,
}

impl<'a, E: EquationOfState + ?Sized> TidalTovModel<'a, E> {
    pub fn new(eos: &'a E, opts: &IntegrationOptions) -> Self {
        Self {
            eos,
            denominator_epsilon: opts.denominator_epsilon,
            divergence_limit: opts.tidal_divergence_limit,
        }
    }
}

impl<E: EquationOfState + ?Sized> RadialModel<4> for TidalTovModel<'_, E> {
    fn rhs(&self, r: f64, x: &State<4>) -> SimResult<State<4>> {
        let (m, p, y) = (x[MASS], x[PRESSURE], x[TIDAL_Y]);
        let s = local_structure(self.eos, self.denominator_epsilon, r, m, p);

        let r2 = r * r;
        let e_lambda = r2 / s.denom;
        let d_eps_d_p = self.eos.d_energy_d_pressure(p);
        let f = e_lambda * (1.0 + 4.0 * PI * r2 * (p - s.eps));
        let r2q = 4.0 * PI * r2 * e_lambda * (5.0 * s.eps + 9.0 * p + (s.eps + p) * d_eps_d_p)
            - 6.0 * e_lambda
            - 4.0 * e_lambda * e_lambda * s.source * s.source / r2;
        let dy = -(y * y + y * f + r2q) / r;

        Ok(State::<4>::new(s.dm, s.dp, s.dnu, dy))
    }

    fn pressure(&self, x: &State<4>) -> f64 {
        x[PRESSURE]
    }

    fn validate(&self, r: f64, x: &State<4>) -> SimResult<()> {
        let y = x[TIDAL_Y];
        if !y.is_finite() || y.abs() > self.divergence_limit {
            return Err(SimError::Unstable { r, y });
        }
        structure::validate_structure(r, x[MASS], x[NU])
    }

    /// Crossing a first-order phase transition adds the density jump to y.
    fn on_accepted_step(
        &self,
        _r_old: f64,
        x_old: &State<4>,
        r_new: f64,
        x_new: &mut State<4>,
    ) -> SimResult<()> {
        if let Some(jump) = self.eos.phase_jump(x_old[PRESSURE], x_new[PRESSURE]) {
            let m = x_new[MASS];
            if m > 0.0 {
                let dy = 4.0 * PI * r_new.powi(3) * jump / m;
                trace!(r = r_new, jump, dy, "phase boundary crossed");
                x_new[TIDAL_Y] -= dy;
            }
        }
        Ok(())
    }
}

/// Correction of y(R) for a non-zero energy density just inside the surface.
pub fn surface_density_correction(radius: f64, mass: f64, eps_surface: f64) -> f64 {
    if mass > 0.0 && eps_surface > 0.0 {
        4.0 * PI * radius.powi(3) * eps_surface / mass
    } else {
        0.0
    }
}

/// Quadrupolar Love number k2 from y(R) and compactness C = M/R.
pub fn love_number(y: f64, c: f64) -> f64 {
    if c < NEWTONIAN_COMPACTNESS {
        return (2.0 - y) / (2.0 * (y + 3.0));
    }
    let one_m2c = 1.0 - 2.0 * c;
    let num = 8.0 / 5.0 * c.powi(5) * one_m2c * one_m2c * (2.0 + 2.0 * c * (y - 1.0) - y);
    let den = 2.0 * c * (6.0 - 3.0 * y + 3.0 * c * (5.0 * y - 8.0))
        + 4.0
            * c.powi(3)
            * (13.0 - 11.0 * y + c * (3.0 * y - 2.0) + 2.0 * c * c * (1.0 + y))
        + 3.0 * one_m2c * one_m2c * (2.0 - y + 2.0 * c * (y - 1.0)) * (-2.0 * c).ln_1p();
    num / den
}

/// Dimensionless tidal deformability Λ = (2/3) k2 / C⁵.
pub fn tidal_deformability(k2: f64, c: f64) -> f64 {
    2.0 / 3.0 * k2 / c.powi(5)
}
