//! Equation-of-state model trait and validation helpers.

use crate::error::{EosError, EosResult};

/// Trait for cold, barotropic equations of state `ε(p)`.
///
/// Implementations must be thread-safe (Send + Sync) so that many stars can be
/// integrated against one immutable EOS in parallel. All quantities are in
/// code units (G = c = 1, km).
pub trait EquationOfState: Send + Sync {
    /// Get the model name (for debugging/logging).
    fn name(&self) -> &str;

    /// Energy density ε at pressure `p`.
    ///
    /// Pressures outside the model's domain must not extrapolate: tabulated
    /// models clamp to the nearest boundary value.
    fn energy_density(&self, p: f64) -> f64;

    /// Derivative dε/dp (inverse squared sound speed) at pressure `p`.
    fn d_energy_d_pressure(&self, p: f64) -> f64;

    /// Lowest pressure the model describes. The stellar surface is declared no
    /// later than the point where the pressure drops below this value.
    fn pressure_floor(&self) -> f64;

    /// Pressure interval `(p_min, p_max)` on which the model is defined.
    fn pressure_range(&self) -> (f64, f64);

    /// Energy-density jump `ε(dense side) - ε(dilute side)` across any phase
    /// boundary lying between `p_inner` (higher pressure) and `p_outer`.
    ///
    /// Models without phase information return `None`.
    fn phase_jump(&self, _p_inner: f64, _p_outer: f64) -> Option<f64> {
        None
    }
}

impl<T: EquationOfState + ?Sized> EquationOfState for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn energy_density(&self, p: f64) -> f64 {
        (**self).energy_density(p)
    }

    fn d_energy_d_pressure(&self, p: f64) -> f64 {
        (**self).d_energy_d_pressure(p)
    }

    fn pressure_floor(&self) -> f64 {
        (**self).pressure_floor()
    }

    fn pressure_range(&self) -> (f64, f64) {
        (**self).pressure_range()
    }

    fn phase_jump(&self, p_inner: f64, p_outer: f64) -> Option<f64> {
        (**self).phase_jump(p_inner, p_outer)
    }
}

/// Validation helpers for EOS inputs.
pub(crate) mod validation {
    use super::*;
    use ns_core::ensure_finite;

    /// Ensure a tabulated column holds only finite values.
    pub fn validate_finite(values: &[f64], what: &'static str) -> EosResult<()> {
        for (row, &v) in values.iter().enumerate() {
            if let Err(e) = ensure_finite(v, what) {
                return Err(EosError::domain(format!("{e} at row {row}")));
            }
        }
        Ok(())
    }

    /// Ensure pressure is strictly increasing (no duplicates).
    pub fn validate_strictly_increasing(p: &[f64]) -> EosResult<()> {
        match p.windows(2).position(|w| w[1] <= w[0]) {
            Some(row) => Err(EosError::domain(format!(
                "pressure column must be strictly increasing (rows {} and {})",
                row,
                row + 1
            ))),
            None => Ok(()),
        }
    }

    /// Ensure energy density never decreases with pressure.
    pub fn validate_non_decreasing(e: &[f64]) -> EosResult<()> {
        match e.windows(2).position(|w| w[1] < w[0]) {
            Some(row) => Err(EosError::domain(format!(
                "energy density must be non-decreasing (rows {} and {})",
                row,
                row + 1
            ))),
            None => Ok(()),
        }
    }

    /// Ensure a polytropic parameter is positive and finite.
    pub fn validate_positive(v: f64, what: &'static str) -> EosResult<()> {
        if !v.is_finite() || v <= 0.0 {
            return Err(EosError::InvalidArg { what });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::validation::*;

    #[test]
    fn strictly_increasing_rejects_duplicates() {
        assert!(validate_strictly_increasing(&[1.0, 2.0, 3.0]).is_ok());
        assert!(validate_strictly_increasing(&[1.0, 2.0, 2.0]).is_err());
        assert!(validate_strictly_increasing(&[2.0, 1.0]).is_err());
    }

    #[test]
    fn non_decreasing_allows_plateaus() {
        assert!(validate_non_decreasing(&[1.0, 1.0, 2.0]).is_ok());
        assert!(validate_non_decreasing(&[1.0, 0.5]).is_err());
    }

    #[test]
    fn finite_check() {
        assert!(validate_finite(&[1.0, 2.0], "p").is_ok());
        assert!(validate_finite(&[1.0, f64::NAN], "p").is_err());
        let err = validate_finite(&[f64::INFINITY], "energy density").unwrap_err();
        assert!(err.to_string().contains("energy density: inf at row 0"), "{err}");
    }

    #[test]
    fn positive_check() {
        assert!(validate_positive(2.0, "gamma").is_ok());
        assert!(validate_positive(0.0, "gamma").is_err());
        assert!(validate_positive(f64::NAN, "gamma").is_err());
    }
}
