//! Error types for stellar structure integration.

use ns_core::NsError;
use ns_eos::EosError;
use thiserror::Error;

/// Errors encountered while integrating a single star.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// The surface could not be reached (step limit, step-size underflow, or
    /// a central pressure already at the surface threshold).
    #[error("Non-convergent integration at p_c = {p_c:e}: {reason}")]
    NonConvergent { p_c: f64, reason: String },

    /// The tidal function diverged before the surface was reached.
    #[error("Unstable tidal integration: y = {y} at r = {r} km")]
    Unstable { r: f64, y: f64 },

    #[error("Non-finite {what} at r = {r} km")]
    NonFinite { what: &'static str, r: f64 },

    #[error("EOS error: {0}")]
    Eos(#[from] EosError),

    #[error("Numeric error: {0}")]
    Core(#[from] NsError),
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub(crate) fn non_convergent(p_c: f64, reason: impl Into<String>) -> Self {
        SimError::NonConvergent {
            p_c,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eos_errors_convert() {
        let err: SimError = EosError::InvalidArg { what: "bad" }.into();
        assert!(matches!(err, SimError::Eos(_)));
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn non_convergent_mentions_pressure() {
        let err = SimError::non_convergent(1e-4, "step limit reached");
        assert!(err.to_string().contains("1e-4"));
    }
}
