//! Central-pressure grid generation.
//!
//! A sequence scan samples the EOS pressure domain at `num_points` central
//! pressures, usually log-spaced since useful tables span many decades.

use crate::error::{EosError, EosResult};
use std::fmt;

/// Smallest pressure a logarithmic grid may start from.
pub const MIN_LOG_PRESSURE: f64 = 1e-15;

/// Type of grid progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepType {
    /// Uniformly spaced points
    Linear,
    /// Logarithmically spaced points
    #[default]
    Logarithmic,
}

/// Inclusive pressure grid `[start, end]` with `num_points` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct PressureGrid {
    pub start: f64,
    pub end: f64,
    pub num_points: usize,
    pub sweep_type: SweepType,
}

impl PressureGrid {
    pub fn new(start: f64, end: f64, num_points: usize, sweep_type: SweepType) -> EosResult<Self> {
        if num_points < 2 {
            return Err(EosError::InvalidArg {
                what: "pressure grid needs at least 2 points",
            });
        }
        if !start.is_finite() || !end.is_finite() || start >= end {
            return Err(EosError::InvalidArg {
                what: "pressure grid bounds must be finite with start < end",
            });
        }
        if sweep_type == SweepType::Logarithmic && start <= 0.0 {
            return Err(EosError::InvalidArg {
                what: "logarithmic pressure grid needs a positive start",
            });
        }
        Ok(Self {
            start,
            end,
            num_points,
            sweep_type,
        })
    }

    /// Grid over an EOS pressure interval. The lower end is lifted to
    /// [`MIN_LOG_PRESSURE`] for logarithmic grids so that tables starting at
    /// zero pressure remain usable.
    pub fn over_range(range: (f64, f64), num_points: usize, sweep_type: SweepType) -> EosResult<Self> {
        let (lo, hi) = range;
        let start = match sweep_type {
            SweepType::Logarithmic => lo.max(MIN_LOG_PRESSURE),
            SweepType::Linear => lo,
        };
        Self::new(start, hi, num_points, sweep_type)
    }

    /// Generate all points in the grid, in increasing order.
    pub fn generate_points(&self) -> Vec<f64> {
        match self.sweep_type {
            SweepType::Linear => self.generate_linear(),
            SweepType::Logarithmic => self.generate_logarithmic(),
        }
    }

    fn generate_linear(&self) -> Vec<f64> {
        let delta = (self.end - self.start) / (self.num_points - 1) as f64;
        let mut points: Vec<f64> = (0..self.num_points)
            .map(|i| self.start + i as f64 * delta)
            .collect();
        // Ensure exact endpoint
        points[self.num_points - 1] = self.end;
        points
    }

    fn generate_logarithmic(&self) -> Vec<f64> {
        let log_start = self.start.ln();
        let log_delta = (self.end.ln() - log_start) / (self.num_points - 1) as f64;
        let mut points: Vec<f64> = (0..self.num_points)
            .map(|i| (log_start + i as f64 * log_delta).exp())
            .collect();
        points[0] = self.start;
        points[self.num_points - 1] = self.end;
        points
    }
}

impl fmt::Display for SweepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "Linear"),
            Self::Logarithmic => write!(f, "Logarithmic"),
        }
    }
}

impl fmt::Display for PressureGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "p_c from {:e} to {:e} ({} points, {})",
            self.start, self.end, self.num_points, self.sweep_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_grid_generation() {
        let grid = PressureGrid::new(1.0, 2.0, 5, SweepType::Linear).unwrap();
        let points = grid.generate_points();
        assert_eq!(points.len(), 5);
        assert!((points[2] - 1.5).abs() < 1e-12);
        assert_eq!(points[4], 2.0);
    }

    #[test]
    fn logarithmic_grid_generation() {
        let grid = PressureGrid::new(1e-6, 1e-4, 3, SweepType::Logarithmic).unwrap();
        let points = grid.generate_points();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], 1e-6);
        assert_eq!(points[2], 1e-4);
        assert!((points[1] - 1e-5).abs() / 1e-5 < 1e-9);
    }

    #[test]
    fn over_range_lifts_zero_start() {
        let grid = PressureGrid::over_range((0.0, 1e-3), 10, SweepType::Logarithmic).unwrap();
        assert_eq!(grid.start, MIN_LOG_PRESSURE);
        let grid = PressureGrid::over_range((0.0, 1e-3), 10, SweepType::Linear).unwrap();
        assert_eq!(grid.start, 0.0);
    }

    #[test]
    fn rejects_invalid_grids() {
        assert!(PressureGrid::new(1.0, 2.0, 1, SweepType::Linear).is_err());
        assert!(PressureGrid::new(2.0, 2.0, 5, SweepType::Linear).is_err());
        assert!(PressureGrid::new(0.0, 2.0, 5, SweepType::Logarithmic).is_err());
        assert!(PressureGrid::new(f64::NAN, 2.0, 5, SweepType::Linear).is_err());
    }

    #[test]
    fn display_mentions_spacing() {
        let grid = PressureGrid::new(1e-6, 1e-4, 3, SweepType::Logarithmic).unwrap();
        assert!(grid.to_string().contains("Logarithmic"));
    }
}
