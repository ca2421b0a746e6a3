//! TOV structure equations.
//!
//! State layout (code units, km):
//! - `x[MASS]`: enclosed gravitational mass m(r)
//! - `x[PRESSURE]`: pressure p(r)
//! - `x[NU]`: metric potential ν(r), defined up to a constant until the
//!   surface matching ν(R) = ln(1 - 2M/R)

use std::f64::consts::PI;

use ns_eos::EquationOfState;

use crate::driver::IntegrationOptions;
use crate::error::{SimError, SimResult};
use crate::model::{RadialModel, State};

pub const MASS: usize = 0;
pub const PRESSURE: usize = 1;
pub const NU: usize = 2;

/// Local TOV quantities shared by the structure and tidal right-hand sides.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LocalStructure {
    /// ε(p)
    pub eps: f64,
    /// r(r - 2m) + regularization
    pub denom: f64,
    /// m + 4π r³ p
    pub source: f64,
    pub dm: f64,
    pub dp: f64,
    pub dnu: f64,
}

pub(crate) fn local_structure<E: EquationOfState + ?Sized>(
    eos: &E,
    denominator_epsilon: f64,
    r: f64,
    m: f64,
    p: f64,
) -> LocalStructure {
    let eps = eos.energy_density(p);
    let denom = r * (r - 2.0 * m) + denominator_epsilon;
    let source = m + 4.0 * PI * r * r * r * p;
    LocalStructure {
        eps,
        denom,
        source,
        dm: 4.0 * PI * r * r * eps,
        dp: -(eps + p) * source / denom,
        // -2/(ε+p) dp/dr without dividing by ε + p
        dnu: 2.0 * source / denom,
    }
}

/// Centre values of the EOS used by the series start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CentralValues {
    pub p_c: f64,
    pub eps_c: f64,
    pub d_eps_d_p: f64,
}

impl CentralValues {
    pub fn new<E: EquationOfState + ?Sized>(eos: &E, p_c: f64) -> Self {
        Self {
            p_c,
            eps_c: eos.energy_density(p_c),
            d_eps_d_p: eos.d_energy_d_pressure(p_c),
        }
    }

    /// Leading-order Taylor expansion of (m, p, ν) at small radius `r0`.
    pub fn structure_series(&self, r0: f64) -> State<3> {
        let (p, e) = (self.p_c, self.eps_c);
        let r2 = r0 * r0;
        State::<3>::new(
            4.0 / 3.0 * PI * e * r2 * r0,
            p - 2.0 / 3.0 * PI * (e + p) * (e + 3.0 * p) * r2,
            4.0 * PI * (e / 3.0 + p) * r2,
        )
    }

    /// Leading-order expansion of the tidal function: y = 2 + O(r²).
    pub fn tidal_series(&self, r0: f64) -> f64 {
        let (p, e) = (self.p_c, self.eps_c);
        2.0 - 4.0 * PI / 7.0 * (11.0 * p + e / 3.0 + (e + p) * self.d_eps_d_p) * r0 * r0
    }
}

/// Structure-only TOV system (tidal integration deferred).
pub struct TovModel<'a, E: EquationOfState + ?Sized> {
    eos: &'a E,
    denominator_epsilon: f64,
}

impl<'a, E: EquationOfState + ?Sized> TovModel<'a, E> {
    pub fn new(eos: &'a E, opts: &IntegrationOptions) -> Self {
        Self {
            eos,
            denominator_epsilon: opts.denominator_epsilon,
        }
    }
}

impl<E: EquationOfState + ?Sized> RadialModel<3> for TovModel<'_, E> {
    fn rhs(&self, r: f64, x: &State<3>) -> SimResult<State<3>> {
        let s = local_structure(self.eos, self.denominator_epsilon, r, x[MASS], x[PRESSURE]);
        Ok(State::<3>::new(s.dm, s.dp, s.dnu))
    }

    fn pressure(&self, x: &State<3>) -> f64 {
        x[PRESSURE]
    }

    fn validate(&self, r: f64, x: &State<3>) -> SimResult<()> {
        validate_structure(r, x[MASS], x[NU])
    }
}

pub(crate) fn validate_structure(r: f64, m: f64, nu: f64) -> SimResult<()> {
    if !m.is_finite() {
        return Err(SimError::NonFinite { what: "mass", r });
    }
    if !nu.is_finite() {
        return Err(SimError::NonFinite {
            what: "metric potential",
            r,
        });
    }
    Ok(())
}
