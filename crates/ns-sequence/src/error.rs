//! Error types for sequence building and target search.

use ns_eos::EosError;
use ns_sim::SimError;
use thiserror::Error;

use crate::locator::Target;

/// Errors raised while building a sequence or searching it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SequenceError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Every scanned central pressure was rejected.
    #[error("No physical stars in sequence ({rejected} central pressures rejected)")]
    EmptySequence { rejected: usize },

    /// The target lies outside the stable branch.
    #[error("Target {target} unreachable: {reason}")]
    TargetUnreachable { target: Target, reason: String },

    /// Bisection ran out of iterations before meeting the tolerance.
    #[error("Target search exhausted after {iterations} iterations (best error {best_error:e})")]
    SearchExhausted { iterations: usize, best_error: f64 },

    #[error("Integration error: {0}")]
    Sim(#[from] SimError),

    #[error("EOS error: {0}")]
    Eos(#[from] EosError),
}

pub type SequenceResult<T> = Result<T, SequenceError>;

impl SequenceError {
    pub(crate) fn unreachable(target: Target, reason: impl Into<String>) -> Self {
        SequenceError::TargetUnreachable {
            target,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_names_the_target() {
        let err = SequenceError::unreachable(Target::Mass(5.0), "above maximum mass 2.1");
        let msg = err.to_string();
        assert!(msg.contains("M = 5"), "{msg}");
        assert!(msg.contains("maximum mass"));
    }

    #[test]
    fn sim_errors_convert() {
        let err: SequenceError = SimError::Unstable { r: 3.0, y: 1e7 }.into();
        assert!(matches!(err, SequenceError::Sim(SimError::Unstable { .. })));
    }
}
