//! Configuration for sequence scans and target searches.

use ns_eos::SweepType;
use ns_sim::IntegrationOptions;

use crate::error::{SequenceError, SequenceResult};

/// Options for [`SequenceBuilder`](crate::SequenceBuilder).
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceOptions {
    /// Number of central pressures scanned.
    pub num_points: usize,
    /// Central-pressure interval; the EOS pressure domain when `None`.
    pub pressure_range: Option<(f64, f64)>,
    pub spacing: SweepType,
    /// Stars lighter than this (solar masses) are dropped as artifacts.
    pub min_mass_solar: f64,
    /// Drop stars whose integration stopped at the abort radius.
    pub exclude_abort_radius: bool,
    pub integration: IntegrationOptions,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self {
            num_points: 100,
            pressure_range: None,
            spacing: SweepType::Logarithmic,
            min_mass_solar: 0.05,
            exclude_abort_radius: true,
            integration: IntegrationOptions::default(),
        }
    }
}

impl SequenceOptions {
    pub fn validate(&self) -> SequenceResult<()> {
        if self.num_points < 2 {
            return Err(SequenceError::InvalidArg {
                what: "sequence needs at least 2 central pressures",
            });
        }
        if !self.min_mass_solar.is_finite() || self.min_mass_solar < 0.0 {
            return Err(SequenceError::InvalidArg {
                what: "minimum mass must be finite and non-negative",
            });
        }
        if let Some((lo, hi)) = self.pressure_range {
            if !(lo > 0.0 && hi > lo && hi.is_finite()) {
                return Err(SequenceError::InvalidArg {
                    what: "pressure range must satisfy 0 < p_min < p_max",
                });
            }
        }
        self.integration.validate()?;
        Ok(())
    }
}

/// Options for [`TargetLocator`](crate::TargetLocator).
#[derive(Debug, Clone, PartialEq)]
pub struct LocatorOptions {
    /// Accepted |M - target| in solar masses.
    pub mass_tolerance_solar: f64,
    /// Accepted |R - target| in km.
    pub radius_tolerance_km: f64,
    /// Bisection iteration cap.
    pub max_iterations: usize,
    /// Options for structure-only bisection runs.
    pub search_integration: IntegrationOptions,
    /// Options for the final run that produces the returned star.
    pub final_integration: IntegrationOptions,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            mass_tolerance_solar: 0.05,
            radius_tolerance_km: 0.1,
            max_iterations: 60,
            search_integration: IntegrationOptions::default(),
            final_integration: IntegrationOptions {
                max_step: 0.1,
                record_profile: true,
                ..Default::default()
            },
        }
    }
}

impl LocatorOptions {
    pub fn validate(&self) -> SequenceResult<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.mass_tolerance_solar) || !positive(self.radius_tolerance_km) {
            return Err(SequenceError::InvalidArg {
                what: "target tolerances must be positive and finite",
            });
        }
        self.search_integration.validate()?;
        self.final_integration.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SequenceOptions::default().validate().is_ok());
        assert!(LocatorOptions::default().validate().is_ok());
        assert!(LocatorOptions::default().final_integration.record_profile);
    }

    #[test]
    fn rejects_inverted_pressure_range() {
        let opts = SequenceOptions {
            pressure_range: Some((1e-3, 1e-5)),
            ..Default::default()
        };
        assert!(matches!(
            opts.validate(),
            Err(SequenceError::InvalidArg { .. })
        ));
    }

    #[test]
    fn rejects_single_point_scan() {
        let opts = SequenceOptions {
            num_points: 1,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn rejects_zero_tolerance() {
        let opts = LocatorOptions {
            radius_tolerance_km: 0.0,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }
}
