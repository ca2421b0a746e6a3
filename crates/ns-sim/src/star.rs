//! Result records for a single star.

use ns_core::units::mass_to_solar;
use ns_eos::{EosResult, EosTable, EquationOfState};

/// One sample of the radial profile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProfileSample {
    pub r: f64,
    pub m: f64,
    pub p: f64,
    /// Metric potential, matched to ln(1 - 2M/R) at the surface.
    pub nu: f64,
    /// Tidal function; absent for structure-only runs.
    pub y: Option<f64>,
}

/// Radial profile from just off the centre to the surface.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RadialProfile {
    samples: Vec<ProfileSample>,
}

impl RadialProfile {
    pub fn new(samples: Vec<ProfileSample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[ProfileSample] {
        &self.samples
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProfileSample> {
        self.samples.iter()
    }

    pub fn radii(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.r).collect()
    }

    /// ε along the profile.
    pub fn energy_density<E: EquationOfState + ?Sized>(&self, eos: &E) -> Vec<f64> {
        self.samples
            .iter()
            .map(|s| eos.energy_density(s.p))
            .collect()
    }

    /// An auxiliary EOS column evaluated along the pressure profile.
    pub fn eos_column(&self, table: &EosTable, column: usize) -> EosResult<Vec<f64>> {
        self.samples
            .iter()
            .map(|s| table.auxiliary(s.p, column))
            .collect()
    }

    pub fn eos_column_by_name(&self, table: &EosTable, name: &str) -> EosResult<Vec<f64>> {
        self.eos_column(table, table.column_index(name)?)
    }
}

/// Tidal response of a star.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TidalResponse {
    /// Love number k2
    pub k2: f64,
    /// Dimensionless tidal deformability Λ
    pub lambda: f64,
    /// y(R) after the surface-density correction
    pub y_surface: f64,
}

/// Macroscopic properties of one star, in code units (km).
#[derive(Clone, Debug, PartialEq)]
pub struct NeutronStar {
    /// Central pressure
    pub p_c: f64,
    /// Central energy density ε(p_c)
    pub eps_c: f64,
    /// Surface radius (km), or the abort radius when not converged
    pub radius: f64,
    /// Gravitational mass (km)
    pub mass: f64,
    /// False when no surface was found inside the abort radius
    pub converged: bool,
    /// Present when the tidal equation was integrated
    pub tidal: Option<TidalResponse>,
    pub profile: Option<RadialProfile>,
}

impl NeutronStar {
    pub fn mass_solar(&self) -> f64 {
        mass_to_solar(self.mass)
    }

    pub fn compactness(&self) -> f64 {
        self.mass / self.radius
    }

    pub fn k2(&self) -> Option<f64> {
        self.tidal.map(|t| t.k2)
    }

    pub fn lambda(&self) -> Option<f64> {
        self.tidal.map(|t| t.lambda)
    }

    /// True when every scalar result is finite.
    pub fn is_finite(&self) -> bool {
        let tidal_ok = self
            .tidal
            .is_none_or(|t| t.k2.is_finite() && t.lambda.is_finite());
        self.radius.is_finite() && self.mass.is_finite() && tidal_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ns_core::units::MSUN_KM;
    use ns_eos::EosRow;

    fn star() -> NeutronStar {
        NeutronStar {
            p_c: 1e-4,
            eps_c: 1e-3,
            radius: 12.0,
            mass: 1.4 * MSUN_KM,
            converged: true,
            tidal: Some(TidalResponse {
                k2: 0.1,
                lambda: 500.0,
                y_surface: 0.8,
            }),
            profile: None,
        }
    }

    #[test]
    fn solar_mass_and_compactness() {
        let s = star();
        assert!((s.mass_solar() - 1.4).abs() < 1e-12);
        assert!((s.compactness() - 1.4 * MSUN_KM / 12.0).abs() < 1e-15);
        assert_eq!(s.k2(), Some(0.1));
        assert!(s.is_finite());
    }

    #[test]
    fn non_finite_lambda_detected() {
        let mut s = star();
        s.tidal = Some(TidalResponse {
            k2: 0.1,
            lambda: f64::INFINITY,
            y_surface: 0.8,
        });
        assert!(!s.is_finite());
    }

    #[test]
    fn profile_eos_columns() {
        let table = EosTable::new(
            "t",
            vec![
                EosRow::with_aux(1.0, 1.0, vec![10.0]),
                EosRow::with_aux(2.0, 2.0, vec![20.0]),
            ],
        )
        .unwrap()
        .with_column_names(vec!["n".into()])
        .unwrap();
        let profile = RadialProfile::new(vec![
            ProfileSample {
                r: 0.0,
                m: 0.0,
                p: 2.0,
                nu: -1.0,
                y: Some(2.0),
            },
            ProfileSample {
                r: 1.0,
                m: 0.1,
                p: 1.5,
                nu: -0.9,
                y: Some(1.9),
            },
        ]);
        assert_eq!(profile.eos_column_by_name(&table, "n").unwrap(), vec![20.0, 15.0]);
        assert_eq!(profile.energy_density(&table), vec![2.0, 1.5]);
        assert_eq!(profile.radii(), vec![0.0, 1.0]);
        assert!(profile.eos_column(&table, 3).is_err());
    }
}
