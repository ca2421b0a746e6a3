//! Single-step radial integrators.

use ns_core::Tolerances;

use crate::error::SimResult;
use crate::model::{RadialModel, State};

/// Result of one trial step.
#[derive(Clone, Debug)]
pub struct StepOutcome<const D: usize> {
    /// Proposed state at `r + h`.
    pub state: State<D>,
    /// Scaled RMS error estimate (<= 1 means within tolerance). `None` for
    /// fixed-step methods.
    pub error: Option<f64>,
}

/// Trait for one-step integrators.
pub trait Stepper {
    /// Attempt one step of size `h` from `(r, x)`.
    fn step<const D: usize, M: RadialModel<D>>(
        &self,
        model: &M,
        r: f64,
        x: &State<D>,
        h: f64,
        tol: &Tolerances,
    ) -> SimResult<StepOutcome<D>>;

    /// Order used by step-size control.
    fn order(&self) -> i32;
}

/// Classical RK4 (Runge-Kutta 4th order) integrator.
#[derive(Clone, Debug)]
pub struct Rk4;

impl Stepper for Rk4 {
    fn step<const D: usize, M: RadialModel<D>>(
        &self,
        model: &M,
        r: f64,
        x: &State<D>,
        h: f64,
        _tol: &Tolerances,
    ) -> SimResult<StepOutcome<D>> {
        let k1 = model.rhs(r, x)?;
        let k2 = model.rhs(r + 0.5 * h, &(x + k1 * (0.5 * h)))?;
        let k3 = model.rhs(r + 0.5 * h, &(x + k2 * (0.5 * h)))?;
        let k4 = model.rhs(r + h, &(x + k3 * h))?;

        // x_new = x + (h/6) * (k1 + 2*k2 + 2*k3 + k4)
        let state = x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0);
        Ok(StepOutcome { state, error: None })
    }

    fn order(&self) -> i32 {
        4
    }
}

/// Dormand-Prince 5(4) embedded pair; the 5th-order solution is propagated.
#[derive(Clone, Debug)]
pub struct DormandPrince54;

mod dp {
    pub const C2: f64 = 1.0 / 5.0;
    pub const C3: f64 = 3.0 / 10.0;
    pub const C4: f64 = 4.0 / 5.0;
    pub const C5: f64 = 8.0 / 9.0;

    pub const A21: f64 = 1.0 / 5.0;
    pub const A31: f64 = 3.0 / 40.0;
    pub const A32: f64 = 9.0 / 40.0;
    pub const A41: f64 = 44.0 / 45.0;
    pub const A42: f64 = -56.0 / 15.0;
    pub const A43: f64 = 32.0 / 9.0;
    pub const A51: f64 = 19372.0 / 6561.0;
    pub const A52: f64 = -25360.0 / 2187.0;
    pub const A53: f64 = 64448.0 / 6561.0;
    pub const A54: f64 = -212.0 / 729.0;
    pub const A61: f64 = 9017.0 / 3168.0;
    pub const A62: f64 = -355.0 / 33.0;
    pub const A63: f64 = 46732.0 / 5247.0;
    pub const A64: f64 = 49.0 / 176.0;
    pub const A65: f64 = -5103.0 / 18656.0;

    // 5th-order weights (also row 7 of the tableau)
    pub const B1: f64 = 35.0 / 384.0;
    pub const B3: f64 = 500.0 / 1113.0;
    pub const B4: f64 = 125.0 / 192.0;
    pub const B5: f64 = -2187.0 / 6784.0;
    pub const B6: f64 = 11.0 / 84.0;

    // b - b* (5th minus embedded 4th order)
    pub const E1: f64 = 71.0 / 57600.0;
    pub const E3: f64 = -71.0 / 16695.0;
    pub const E4: f64 = 71.0 / 1920.0;
    pub const E5: f64 = -17253.0 / 339200.0;
    pub const E6: f64 = 22.0 / 525.0;
    pub const E7: f64 = -1.0 / 40.0;
}

impl Stepper for DormandPrince54 {
    fn step<const D: usize, M: RadialModel<D>>(
        &self,
        model: &M,
        r: f64,
        x: &State<D>,
        h: f64,
        tol: &Tolerances,
    ) -> SimResult<StepOutcome<D>> {
        use dp::*;

        let k1 = model.rhs(r, x)?;
        let k2 = model.rhs(r + C2 * h, &(x + k1 * (A21 * h)))?;
        let k3 = model.rhs(r + C3 * h, &(x + (k1 * A31 + k2 * A32) * h))?;
        let k4 = model.rhs(r + C4 * h, &(x + (k1 * A41 + k2 * A42 + k3 * A43) * h))?;
        let k5 = model.rhs(
            r + C5 * h,
            &(x + (k1 * A51 + k2 * A52 + k3 * A53 + k4 * A54) * h),
        )?;
        let k6 = model.rhs(
            r + h,
            &(x + (k1 * A61 + k2 * A62 + k3 * A63 + k4 * A64 + k5 * A65) * h),
        )?;

        let state = x + (k1 * B1 + k3 * B3 + k4 * B4 + k5 * B5 + k6 * B6) * h;
        let k7 = model.rhs(r + h, &state)?;

        let err = (k1 * E1 + k3 * E3 + k4 * E4 + k5 * E5 + k6 * E6 + k7 * E7) * h;
        Ok(StepOutcome {
            error: Some(error_norm(&err, x, &state, tol)),
            state,
        })
    }

    fn order(&self) -> i32 {
        5
    }
}

/// RMS of the error vector scaled component-wise by `atol + rtol * max(|x|, |x_new|)`.
pub fn error_norm<const D: usize>(
    err: &State<D>,
    x: &State<D>,
    x_new: &State<D>,
    tol: &Tolerances,
) -> f64 {
    let sum: f64 = (0..D)
        .map(|i| {
            let scaled = err[i] / tol.scale(x[i], x_new[i]);
            scaled * scaled
        })
        .sum();
    (sum / D as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// dx/dr = x, exact solution e^r.
    struct Growth;

    impl RadialModel<1> for Growth {
        fn rhs(&self, _r: f64, x: &State<1>) -> SimResult<State<1>> {
            Ok(*x)
        }

        fn pressure(&self, x: &State<1>) -> f64 {
            x[0]
        }
    }

    #[test]
    fn rk4_single_step_accuracy() {
        let x0 = State::<1>::new(1.0);
        let out = Rk4
            .step(&Growth, 0.0, &x0, 0.1, &Tolerances::default())
            .unwrap();
        assert!(out.error.is_none());
        assert!((out.state[0] - 0.1_f64.exp()).abs() < 1e-7);
    }

    #[test]
    fn dormand_prince_error_estimate_shrinks_with_step() {
        let x0 = State::<1>::new(1.0);
        let tol = Tolerances::default();
        let big = DormandPrince54.step(&Growth, 0.0, &x0, 0.2, &tol).unwrap();
        let small = DormandPrince54.step(&Growth, 0.0, &x0, 0.1, &tol).unwrap();
        let (e_big, e_small) = (big.error.unwrap(), small.error.unwrap());
        assert!(e_small < e_big);
        // local error of a 5(4) pair scales like h^5
        assert!(e_big / e_small > 16.0);
        // and the true one-step error like h^6
        let err_big = (big.state[0] - 0.2_f64.exp()).abs();
        let err_small = (small.state[0] - 0.1_f64.exp()).abs();
        assert!(err_big < 1e-7, "err = {err_big:e}");
        assert!(err_big / err_small > 32.0);
    }

    #[test]
    fn error_norm_is_rms() {
        let tol = Tolerances { abs: 1.0, rel: 0.0 };
        let err = State::<2>::new(3.0, 4.0);
        let zero = State::<2>::zeros();
        let norm = error_norm(&err, &zero, &zero, &tol);
        assert!((norm - (12.5_f64).sqrt()).abs() < 1e-12);
    }
}
