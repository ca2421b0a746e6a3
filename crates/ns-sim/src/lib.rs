//! Stellar structure and tidal response of static, spherical stars.
//!
//! Provides:
//! - `RadialModel` trait for ODE systems integrated outward in radius
//! - Fixed-step RK4 and adaptive Dormand-Prince 5(4) steppers
//! - Radial driver with surface location and abort radius
//! - TOV structure model and the coupled TOV + tidal model
//! - Love number k2 and tidal deformability Λ
//! - `StarSolver` producing `NeutronStar` records with optional profiles

pub mod driver;
pub mod error;
pub mod integrator;
pub mod model;
pub mod solver;
pub mod star;
pub mod structure;
pub mod tidal;

// Internal modules
mod events;

// Re-exports for public API
pub use driver::{IntegrationOptions, IntegratorType, RadialTrajectory, integrate_to_surface};
pub use error::{SimError, SimResult};
pub use integrator::{DormandPrince54, Rk4, StepOutcome, Stepper};
pub use model::{RadialModel, State};
pub use solver::StarSolver;
pub use star::{NeutronStar, ProfileSample, RadialProfile, TidalResponse};
pub use structure::{CentralValues, TovModel};
pub use tidal::{TidalTovModel, love_number, tidal_deformability};
