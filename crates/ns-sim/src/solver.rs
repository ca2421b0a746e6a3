//! Single-star solver: series start, outward integration, surface matching.

use ns_eos::EquationOfState;
use tracing::debug;

use crate::driver::{IntegrationOptions, RadialTrajectory, integrate_to_surface};
use crate::error::{SimError, SimResult};
use crate::model::State;
use crate::star::{NeutronStar, ProfileSample, RadialProfile, TidalResponse};
use crate::structure::{CentralValues, MASS, NU, PRESSURE, TovModel};
use crate::tidal::{
    TIDAL_Y, TidalTovModel, love_number, surface_density_correction, tidal_deformability,
};

/// Integrates stars of one EOS. Immutable and `Sync` when the EOS is, so a
/// single solver can serve a parallel scan.
pub struct StarSolver<'a, E: EquationOfState + ?Sized> {
    eos: &'a E,
    options: IntegrationOptions,
}

impl<'a, E: EquationOfState + ?Sized> StarSolver<'a, E> {
    pub fn new(eos: &'a E, options: IntegrationOptions) -> SimResult<Self> {
        options.validate()?;
        Ok(Self { eos, options })
    }

    pub fn eos(&self) -> &'a E {
        self.eos
    }

    pub fn options(&self) -> &IntegrationOptions {
        &self.options
    }

    /// Same EOS, different options (e.g. profile recording for a final run).
    pub fn with_options(&self, options: IntegrationOptions) -> SimResult<Self> {
        Self::new(self.eos, options)
    }

    /// Pressure at which the surface is declared for central pressure `p_c`.
    pub fn surface_pressure(&self, p_c: f64) -> f64 {
        (self.options.surface_pressure_fraction * p_c).max(self.eos.pressure_floor())
    }

    /// Structure only: (R, M) and the (m, p, ν) profile; no tidal response.
    pub fn structure(&self, p_c: f64) -> SimResult<NeutronStar> {
        let (centre, threshold) = self.prepare(p_c)?;
        let r0 = self.options.initial_radius;
        let model = TovModel::new(self.eos, &self.options);
        let traj = integrate_to_surface(
            &model,
            r0,
            centre.structure_series(r0),
            threshold,
            &self.options,
        )?;

        let star = self.assemble(&centre, &traj, None, |_| None);
        debug!(
            p_c,
            radius = star.radius,
            mass = star.mass_solar(),
            converged = star.converged,
            steps = traj.steps,
            "structure integrated"
        );
        Ok(star)
    }

    /// Structure and tidal response integrated together.
    pub fn solve(&self, p_c: f64) -> SimResult<NeutronStar> {
        let (centre, threshold) = self.prepare(p_c)?;
        let r0 = self.options.initial_radius;
        let s = centre.structure_series(r0);
        let x0 = State::<4>::new(s[MASS], s[PRESSURE], s[NU], centre.tidal_series(r0));

        let model = TidalTovModel::new(self.eos, &self.options);
        let traj = integrate_to_surface(&model, r0, x0, threshold, &self.options)?;

        let tidal = if traj.converged {
            Some(self.tidal_response(&traj)?)
        } else {
            None
        };
        let star = self.assemble(&centre, &traj, tidal, |x| Some(x[TIDAL_Y]));
        debug!(
            p_c,
            radius = star.radius,
            mass = star.mass_solar(),
            k2 = star.k2(),
            lambda = star.lambda(),
            converged = star.converged,
            steps = traj.steps,
            "star integrated"
        );
        Ok(star)
    }

    fn prepare(&self, p_c: f64) -> SimResult<(CentralValues, f64)> {
        if !p_c.is_finite() || p_c <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "central pressure must be positive and finite",
            });
        }
        let threshold = self.surface_pressure(p_c);
        if p_c <= threshold {
            return Err(SimError::non_convergent(
                p_c,
                format!("central pressure is at or below the surface pressure {threshold:e}"),
            ));
        }
        Ok((CentralValues::new(self.eos, p_c), threshold))
    }

    fn tidal_response(&self, traj: &RadialTrajectory<4>) -> SimResult<TidalResponse> {
        let x = &traj.surface_state;
        let (radius, mass) = (traj.surface_radius, x[MASS]);
        let eps_surface = self.eos.energy_density(x[PRESSURE]);
        let y_surface = x[TIDAL_Y] - surface_density_correction(radius, mass, eps_surface);

        let c = mass / radius;
        let k2 = love_number(y_surface, c);
        let lambda = tidal_deformability(k2, c);
        if !k2.is_finite() || !lambda.is_finite() {
            return Err(SimError::NonFinite {
                what: "tidal deformability",
                r: radius,
            });
        }
        Ok(TidalResponse {
            k2,
            lambda,
            y_surface,
        })
    }

    fn assemble<const D: usize>(
        &self,
        centre: &CentralValues,
        traj: &RadialTrajectory<D>,
        tidal: Option<TidalResponse>,
        tidal_y: impl Fn(&State<D>) -> Option<f64>,
    ) -> NeutronStar {
        let radius = traj.surface_radius;
        let mass = traj.surface_state[MASS];

        let profile = self.options.record_profile.then(|| {
            let metric = 1.0 - 2.0 * mass / radius;
            let shift = if metric > 0.0 {
                metric.ln() - traj.surface_state[NU]
            } else {
                0.0
            };
            RadialProfile::new(
                traj.radii
                    .iter()
                    .zip(&traj.states)
                    .map(|(&r, x)| ProfileSample {
                        r,
                        m: x[MASS],
                        p: x[PRESSURE],
                        nu: x[NU] + shift,
                        y: tidal_y(x),
                    })
                    .collect(),
            )
        });

        NeutronStar {
            p_c: centre.p_c,
            eps_c: centre.eps_c,
            radius,
            mass,
            converged: traj.converged,
            tidal,
            profile,
        }
    }
}
