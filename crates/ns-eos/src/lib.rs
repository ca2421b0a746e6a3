//! ns-eos: cold, barotropic equations of state for stellar structure.
//!
//! Provides:
//! - `EquationOfState` trait consumed by the structure integrators
//! - `EosTable`: tabulated p/ε data with clamped piecewise-linear lookups,
//!   auxiliary columns and optional phase-transition awareness
//! - `Polytrope`: analytic `p = K ρ^Γ` model and table generator
//! - CSV loading of tables in code, MeV·fm⁻³ or CGS units
//! - `PressureGrid`: linear/logarithmic central-pressure grids
//!
//! # Example
//!
//! ```no_run
//! use ns_eos::{EquationOfState, read_eos_csv};
//!
//! let table = read_eos_csv("eos/sly4.csv").unwrap();
//! let (p_min, p_max) = table.pressure_range();
//! println!("ε(p_max) = {}", table.energy_density(p_max));
//! println!("dε/dp at p_min = {}", table.d_energy_d_pressure(p_min));
//! ```

pub mod error;
pub mod grid;
pub mod loader;
pub mod model;
pub mod polytrope;
pub mod table;

pub use error::{EosError, EosResult};
pub use grid::{MIN_LOG_PRESSURE, PressureGrid, SweepType};
pub use loader::{
    EosUnits, parse_eos_csv, parse_eos_csv_with_units, read_eos_csv, read_eos_csv_with_units,
};
pub use model::EquationOfState;
pub use polytrope::Polytrope;
pub use table::{EosRow, EosTable};
