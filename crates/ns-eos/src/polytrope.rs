//! Analytic polytropic equation of state.
//!
//! `p = K ρ^Γ` with the energy density of an ideal-gas-like polytrope,
//! `ε = ρ + p / (Γ - 1)`. Mostly used to produce well-understood test
//! tables and as a smooth reference against tabulated models.

use crate::error::EosResult;
use crate::grid::{PressureGrid, SweepType};
use crate::model::{EquationOfState, validation};
use crate::table::{EosRow, EosTable};

#[derive(Debug, Clone, PartialEq)]
pub struct Polytrope {
    name: String,
    k: f64,
    gamma: f64,
}

impl Polytrope {
    /// `k` in code units (km^(2Γ-2)), `gamma > 1`.
    pub fn new(k: f64, gamma: f64) -> EosResult<Self> {
        validation::validate_positive(k, "polytropic constant K must be positive")?;
        validation::validate_positive(gamma - 1.0, "adiabatic index must exceed 1")?;
        Ok(Self {
            name: format!("polytrope(K={k}, Gamma={gamma})"),
            k,
            gamma,
        })
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Rest-mass density ρ(p); zero for non-positive pressure.
    pub fn rest_mass_density(&self, p: f64) -> f64 {
        if p > 0.0 {
            (p / self.k).powf(1.0 / self.gamma)
        } else {
            0.0
        }
    }

    /// Pressure at rest-mass density `rho`.
    pub fn pressure_at_density(&self, rho: f64) -> f64 {
        self.k * rho.max(0.0).powf(self.gamma)
    }

    /// Log-spaced table over `[p_min, p_max]` with a `rho` auxiliary column.
    pub fn tabulate(&self, p_min: f64, p_max: f64, rows: usize) -> EosResult<EosTable> {
        let grid = PressureGrid::new(p_min, p_max, rows, SweepType::Logarithmic)?;
        let rows = grid
            .generate_points()
            .into_iter()
            .map(|p| EosRow::with_aux(p, self.energy_density(p), vec![self.rest_mass_density(p)]))
            .collect();
        EosTable::new(self.name.clone(), rows)?.with_column_names(vec!["rho".to_string()])
    }
}

impl EquationOfState for Polytrope {
    fn name(&self) -> &str {
        &self.name
    }

    fn energy_density(&self, p: f64) -> f64 {
        let p = p.max(0.0);
        self.rest_mass_density(p) + p / (self.gamma - 1.0)
    }

    fn d_energy_d_pressure(&self, p: f64) -> f64 {
        let internal = 1.0 / (self.gamma - 1.0);
        if p > 0.0 {
            self.rest_mass_density(p) / (self.gamma * p) + internal
        } else {
            internal
        }
    }

    fn pressure_floor(&self) -> f64 {
        0.0
    }

    fn pressure_range(&self) -> (f64, f64) {
        (0.0, f64::INFINITY)
    }
}
