//! RadialModel trait for systems integrated outward in radius.

use nalgebra::SVector;

use crate::error::SimResult;

/// Fixed-size state vector of a radial model.
pub type State<const D: usize> = SVector<f64, D>;

/// Trait for ODE systems integrated from the centre of a star outward.
///
/// A RadialModel must implement:
/// - RHS computation: dx/dr = f(r, x)
/// - Extraction of the pressure component (drives surface detection)
///
/// Models are immutable during integration so a single model can be shared
/// by many threads integrating different central pressures.
pub trait RadialModel<const D: usize> {
    /// Compute the state derivative dx/dr.
    fn rhs(&self, r: f64, x: &State<D>) -> SimResult<State<D>>;

    /// Pressure carried by the state.
    fn pressure(&self, x: &State<D>) -> f64;

    /// Check an accepted state. Called after every accepted step.
    fn validate(&self, _r: f64, _x: &State<D>) -> SimResult<()> {
        Ok(())
    }

    /// Hook applied to each accepted step before it is committed, for
    /// discontinuities the smooth right-hand side cannot express.
    fn on_accepted_step(
        &self,
        _r_old: f64,
        _x_old: &State<D>,
        _r_new: f64,
        _x_new: &mut State<D>,
    ) -> SimResult<()> {
        Ok(())
    }
}
