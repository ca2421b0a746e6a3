//! Run configuration: YAML schema, loading, saving and validation.
//!
//! ```yaml
//! name: sly4
//! eos:
//!   kind: csv
//!   path: eos/sly4.csv
//!   units: mev_fm3
//! sequence:
//!   num_points: 100
//! targets:
//!   - mass: 1.4
//!   - radius_km: 12.0
//! output_dir: export
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Base name for exported files; the EOS name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub eos: EosSource,
    #[serde(default)]
    pub sequence: SequenceSettings,
    #[serde(default)]
    pub integration: IntegrationSettings,
    #[serde(default)]
    pub locator: LocatorSettings,
    #[serde(default)]
    pub targets: Vec<TargetDef>,
    /// Relative paths resolve against the config file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EosSource {
    /// CSV table, see `ns_eos::parse_eos_csv`.
    Csv {
        path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        phase_column: Option<String>,
        #[serde(default)]
        units: UnitsDef,
    },
    /// `p = K ρ^Γ` tabulated on a log grid.
    Polytrope {
        k: f64,
        gamma: f64,
        p_min: f64,
        p_max: f64,
        #[serde(default = "default_rows")]
        rows: usize,
    },
}

fn default_rows() -> usize {
    200
}

/// Units of the pressure and energy-density columns of a CSV table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitsDef {
    /// km⁻²
    #[default]
    Code,
    MevFm3,
    /// dyn/cm² and g/cm³
    Cgs,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpacingDef {
    Linear,
    #[default]
    Logarithmic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceSettings {
    pub num_points: usize,
    pub p_min: Option<f64>,
    pub p_max: Option<f64>,
    pub spacing: SpacingDef,
    pub min_mass_solar: f64,
    pub exclude_abort_radius: bool,
}

impl Default for SequenceSettings {
    fn default() -> Self {
        Self {
            num_points: 100,
            p_min: None,
            p_max: None,
            spacing: SpacingDef::default(),
            min_mass_solar: 0.05,
            exclude_abort_radius: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorDef {
    #[default]
    DormandPrince,
    Rk4,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationSettings {
    pub integrator: IntegratorDef,
    pub rtol: f64,
    pub atol: f64,
    pub initial_step_km: f64,
    pub max_step_km: f64,
    pub r_max_km: f64,
    pub surface_pressure_fraction: f64,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            integrator: IntegratorDef::default(),
            rtol: 1e-12,
            atol: 1e-14,
            initial_step_km: 1e-3,
            max_step_km: 0.5,
            r_max_km: 100.0,
            surface_pressure_fraction: 1e-12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorSettings {
    pub mass_tolerance_solar: f64,
    pub radius_tolerance_km: f64,
    pub max_iterations: usize,
    /// Largest radial step of the final profiled run.
    pub profile_max_step_km: f64,
}

impl Default for LocatorSettings {
    fn default() -> Self {
        Self {
            mass_tolerance_solar: 0.05,
            radius_tolerance_km: 0.1,
            max_iterations: 60,
            profile_max_step_km: 0.1,
        }
    }
}

/// A requested star: `- mass: 1.4` or `- radius_km: 12.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "TargetEntry", into = "TargetEntry")]
pub enum TargetDef {
    Mass(f64),
    RadiusKm(f64),
}

/// On-disk form of [`TargetDef`]: a one-key map.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TargetEntry {
    Mass { mass: f64 },
    RadiusKm { radius_km: f64 },
}

impl From<TargetEntry> for TargetDef {
    fn from(entry: TargetEntry) -> Self {
        match entry {
            TargetEntry::Mass { mass } => TargetDef::Mass(mass),
            TargetEntry::RadiusKm { radius_km } => TargetDef::RadiusKm(radius_km),
        }
    }
}

impl From<TargetDef> for TargetEntry {
    fn from(def: TargetDef) -> Self {
        match def {
            TargetDef::Mass(mass) => TargetEntry::Mass { mass },
            TargetDef::RadiusKm(radius_km) => TargetEntry::RadiusKm { radius_km },
        }
    }
}

impl TargetDef {
    /// Short label used in file names, e.g. `M1.4` or `R12`.
    pub fn label(&self) -> String {
        match self {
            TargetDef::Mass(m) => format!("M{m}"),
            TargetDef::RadiusKm(r) => format!("R{r}"),
        }
    }
}

/// Load a run config from a YAML file.
pub fn load_config(path: &Path) -> AppResult<RunConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::ConfigFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: RunConfig = serde_yaml::from_str(&content)
        .map_err(|e| AppError::Config(format!("Failed to parse config YAML: {}", e)))?;

    Ok(config)
}

/// Save a run config to a YAML file.
pub fn save_config(path: &Path, config: &RunConfig) -> AppResult<()> {
    let content = serde_yaml::to_string(config)
        .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))?;

    std::fs::write(path, content).map_err(|e| AppError::ConfigFileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

/// Checks that are cheap to do before any EOS is loaded.
pub fn validate_config(config: &RunConfig) -> AppResult<()> {
    if config.sequence.num_points < 2 {
        return Err(AppError::Validation(
            "sequence.num_points must be at least 2".to_string(),
        ));
    }

    if let EosSource::Polytrope {
        k,
        gamma,
        p_min,
        p_max,
        rows,
    } = &config.eos
    {
        if !(*k > 0.0 && *gamma > 1.0) {
            return Err(AppError::Validation(
                "polytrope needs k > 0 and gamma > 1".to_string(),
            ));
        }
        if !(*p_min > 0.0 && p_max > p_min) || *rows < 2 {
            return Err(AppError::Validation(
                "polytrope table needs 0 < p_min < p_max and at least 2 rows".to_string(),
            ));
        }
    }

    for target in &config.targets {
        let value = match target {
            TargetDef::Mass(v) | TargetDef::RadiusKm(v) => *v,
        };
        if !(value.is_finite() && value > 0.0) {
            return Err(AppError::Validation(format!(
                "target {} must be positive",
                target.label()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let yaml = "eos:\n  kind: csv\n  path: eos/sly4.csv\n";
        let config: RunConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.eos,
            EosSource::Csv {
                path: PathBuf::from("eos/sly4.csv"),
                phase_column: None,
                units: UnitsDef::Code,
            }
        );
        assert_eq!(config.sequence, SequenceSettings::default());
        assert!(config.targets.is_empty());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn parses_targets_and_overrides() {
        let yaml = r#"
name: toy
eos:
  kind: polytrope
  k: 218.0
  gamma: 2.0
  p_min: 2.0e-7
  p_max: 2.0e-3
sequence:
  num_points: 40
  spacing: linear
integration:
  integrator: rk4
targets:
  - mass: 1.4
  - radius_km: 12.0
"#;
        let config: RunConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sequence.num_points, 40);
        assert_eq!(config.sequence.spacing, SpacingDef::Linear);
        assert_eq!(config.sequence.min_mass_solar, 0.05);
        assert_eq!(config.integration.integrator, IntegratorDef::Rk4);
        assert_eq!(
            config.targets,
            vec![TargetDef::Mass(1.4), TargetDef::RadiusKm(12.0)]
        );
        assert!(matches!(config.eos, EosSource::Polytrope { rows: 200, .. }));
    }

    #[test]
    fn targets_are_written_as_one_key_maps() {
        let dir = std::env::temp_dir().join(format!("ns_app_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("run.yaml");

        let config = RunConfig {
            name: Some("toy".to_string()),
            eos: EosSource::Csv {
                path: "eos.csv".into(),
                phase_column: None,
                units: UnitsDef::MevFm3,
            },
            sequence: SequenceSettings::default(),
            integration: IntegrationSettings::default(),
            locator: LocatorSettings::default(),
            targets: vec![TargetDef::Mass(1.4), TargetDef::RadiusKm(12.5)],
            output_dir: None,
        };
        save_config(&path, &config).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("- mass: 1.4"), "{text}");
        assert!(text.contains("- radius_km: 12.5"), "{text}");
        assert!(!text.contains('!'));
        assert_eq!(load_config(&path).unwrap(), config);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unknown_target_kind_is_a_config_error() {
        let dir = std::env::temp_dir().join(format!("ns_app_bad_target_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("run.yaml");
        std::fs::write(
            &path,
            "eos:\n  kind: csv\n  path: eos.csv\ntargets:\n  - density: 3.0\n",
        )
        .unwrap();
        assert!(matches!(load_config(&path), Err(AppError::Config(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn target_labels() {
        assert_eq!(TargetDef::Mass(1.4).label(), "M1.4");
        assert_eq!(TargetDef::RadiusKm(12.0).label(), "R12");
    }

    #[test]
    fn rejects_non_positive_target() {
        let config = RunConfig {
            name: None,
            eos: EosSource::Csv {
                path: "t.csv".into(),
                phase_column: None,
                units: UnitsDef::Code,
            },
            sequence: SequenceSettings::default(),
            integration: IntegrationSettings::default(),
            locator: LocatorSettings::default(),
            targets: vec![TargetDef::Mass(-1.0)],
            output_dir: None,
        };
        assert!(matches!(
            validate_config(&config),
            Err(AppError::Validation(_))
        ));
    }
}
