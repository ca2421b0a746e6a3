use crate::{NsError, NsResult};

/// Floating point type used throughout system
pub type Real = f64;

/// Absolute/relative tolerance pair.
///
/// The default is the ODE tolerance used for stellar structure integration:
/// tidal deformability is sensitive to integration error near the surface, so
/// both tolerances are tight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-14,
            rel: 1e-12,
        }
    }
}

impl Tolerances {
    /// Error scale for one state component: `abs + rel * max(|a|, |b|)`.
    #[inline]
    pub fn scale(&self, a: Real, b: Real) -> Real {
        self.abs + self.rel * a.abs().max(b.abs())
    }
}

/// Pass `v` through, or fail with [`NsError::NonFinite`] naming `what`.
pub fn ensure_finite(v: Real, what: &'static str) -> NsResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(NsError::NonFinite { what, value: v })
    }
}

/// Linear interpolation between `(x0, y0)` and `(x1, y1)` at `x`.
///
/// Degenerate intervals (`x1 == x0`) return `y0`.
#[inline]
pub fn lerp(x0: Real, y0: Real, x1: Real, y1: Real, x: Real) -> Real {
    let dx = x1 - x0;
    if dx == 0.0 {
        return y0;
    }
    y0 + (x - x0) / dx * (y1 - y0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tolerances_are_tight() {
        let tol = Tolerances::default();
        assert_eq!(tol.rel, 1e-12);
        assert_eq!(tol.abs, 1e-14);
        assert!((tol.scale(-2.0, 1.0) - (1e-14 + 2e-12)).abs() < 1e-20);
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        assert!(matches!(err, NsError::NonFinite { what: "test", .. }));
        assert!(err.to_string().contains("Non-finite"));
        assert_eq!(ensure_finite(2.5, "test"), Ok(2.5));
    }

    #[test]
    fn lerp_midpoint_and_degenerate() {
        assert!((lerp(0.0, 1.0, 2.0, 3.0, 1.0) - 2.0).abs() < 1e-15);
        assert_eq!(lerp(1.0, 5.0, 1.0, 9.0, 1.0), 5.0);
    }
}
