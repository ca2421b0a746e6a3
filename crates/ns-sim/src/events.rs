//! Surface-crossing helpers for the radial driver.

/// True once the pressure has fallen below the surface threshold.
///
/// A non-finite pressure counts as crossed so the bracket search can
/// shorten the step instead of accepting garbage.
pub(crate) fn crossed(p: f64, threshold: f64) -> bool {
    !(p >= threshold)
}

/// Fraction of the interval `[p_above, p_below]` at which the linear
/// interpolant reaches `threshold`, clamped to [0, 1].
pub(crate) fn crossing_fraction(p_above: f64, p_below: f64, threshold: f64) -> f64 {
    let drop = p_above - p_below;
    if !(drop > 0.0) {
        return 0.0;
    }
    ((p_above - threshold) / drop).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_counts_as_crossed() {
        assert!(crossed(f64::NAN, 1e-10));
        assert!(crossed(0.5e-10, 1e-10));
        assert!(!crossed(1e-10, 1e-10));
    }

    #[test]
    fn crossing_fraction_linear() {
        assert!((crossing_fraction(3.0, 1.0, 2.0) - 0.5).abs() < 1e-15);
        assert_eq!(crossing_fraction(3.0, -100.0, 2.0), 1.0 / 103.0);
        assert_eq!(crossing_fraction(1.0, f64::NAN, 0.5), 0.0);
    }
}
