//! Conversion of a `RunConfig` into runtime EOS and option structs.

use std::path::Path;

use ns_eos::{EosTable, EosUnits, Polytrope, SweepType, read_eos_csv_with_units};
use ns_sequence::{LocatorOptions, SequenceOptions, Target};
use ns_sim::{IntegrationOptions, IntegratorType};

use crate::config::{
    EosSource, IntegrationSettings, IntegratorDef, LocatorSettings, RunConfig, SequenceSettings,
    SpacingDef, TargetDef, UnitsDef,
};
use crate::error::{AppError, AppResult};

/// Load or tabulate the EOS. Relative CSV paths resolve against `base_dir`.
pub fn load_eos(source: &EosSource, base_dir: &Path) -> AppResult<EosTable> {
    match source {
        EosSource::Csv {
            path,
            phase_column,
            units,
        } => {
            let path = if path.is_relative() {
                base_dir.join(path)
            } else {
                path.clone()
            };
            let table = read_eos_csv_with_units(&path, eos_units(*units))?;
            match phase_column {
                Some(name) => {
                    let index = table.column_index(name)?;
                    Ok(table.with_phase_column(index)?)
                }
                None => Ok(table),
            }
        }
        EosSource::Polytrope {
            k,
            gamma,
            p_min,
            p_max,
            rows,
        } => Ok(Polytrope::new(*k, *gamma)?.tabulate(*p_min, *p_max, *rows)?),
    }
}

fn eos_units(units: UnitsDef) -> EosUnits {
    match units {
        UnitsDef::Code => EosUnits::Code,
        UnitsDef::MevFm3 => EosUnits::MevFm3,
        UnitsDef::Cgs => EosUnits::Cgs,
    }
}

pub fn integration_options(settings: &IntegrationSettings) -> IntegrationOptions {
    IntegrationOptions {
        integrator: match settings.integrator {
            IntegratorDef::DormandPrince => IntegratorType::DormandPrince,
            IntegratorDef::Rk4 => IntegratorType::Rk4,
        },
        rtol: settings.rtol,
        atol: settings.atol,
        initial_step: settings.initial_step_km,
        max_step: settings.max_step_km,
        r_max: settings.r_max_km,
        surface_pressure_fraction: settings.surface_pressure_fraction,
        ..Default::default()
    }
}

pub fn sequence_options(
    settings: &SequenceSettings,
    integration: &IntegrationSettings,
    eos: &EosTable,
) -> AppResult<SequenceOptions> {
    let (lo, hi) = eos.pressure_range();
    let pressure_range = match (settings.p_min, settings.p_max) {
        (None, None) => None,
        (p_min, p_max) => Some((p_min.unwrap_or(lo), p_max.unwrap_or(hi))),
    };
    if let Some((p_min, p_max)) = pressure_range {
        if p_min < lo || p_max > hi {
            return Err(AppError::Validation(format!(
                "central pressure range [{p_min:e}, {p_max:e}] exceeds the EOS table [{lo:e}, {hi:e}]"
            )));
        }
    }

    Ok(SequenceOptions {
        num_points: settings.num_points,
        pressure_range,
        spacing: match settings.spacing {
            SpacingDef::Linear => SweepType::Linear,
            SpacingDef::Logarithmic => SweepType::Logarithmic,
        },
        min_mass_solar: settings.min_mass_solar,
        exclude_abort_radius: settings.exclude_abort_radius,
        integration: integration_options(integration),
    })
}

pub fn locator_options(settings: &LocatorSettings, integration: &IntegrationSettings) -> LocatorOptions {
    let search = integration_options(integration);
    LocatorOptions {
        mass_tolerance_solar: settings.mass_tolerance_solar,
        radius_tolerance_km: settings.radius_tolerance_km,
        max_iterations: settings.max_iterations,
        final_integration: IntegrationOptions {
            max_step: settings.profile_max_step_km.min(search.max_step),
            record_profile: true,
            ..search.clone()
        },
        search_integration: search,
    }
}

pub fn target(def: &TargetDef) -> Target {
    match *def {
        TargetDef::Mass(m) => Target::Mass(m),
        TargetDef::RadiusKm(r) => Target::Radius(r),
    }
}

/// Base name for exported files.
pub fn run_name(config: &RunConfig, eos: &EosTable) -> String {
    config
        .name
        .clone()
        .unwrap_or_else(|| eos.name().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polytrope_source() -> EosSource {
        EosSource::Polytrope {
            k: 218.0,
            gamma: 2.0,
            p_min: 1e-7,
            p_max: 1e-3,
            rows: 50,
        }
    }

    #[test]
    fn polytrope_source_is_tabulated() {
        let table = load_eos(&polytrope_source(), Path::new(".")).unwrap();
        assert_eq!(table.len(), 50);
        assert_eq!(table.pressure_range(), (1e-7, 1e-3));
    }

    #[test]
    fn missing_csv_is_an_eos_error() {
        let source = EosSource::Csv {
            path: "definitely/not/here.csv".into(),
            phase_column: None,
            units: UnitsDef::Code,
        };
        assert!(matches!(
            load_eos(&source, Path::new("/nonexistent")),
            Err(AppError::Eos(_))
        ));
    }

    #[test]
    fn csv_source_resolves_relative_path_and_units() {
        let dir = std::env::temp_dir().join(format!("ns_app_units_{}", std::process::id()));
        std::fs::create_dir_all(dir.join("eos")).unwrap();
        std::fs::write(
            dir.join("eos/stiff.csv"),
            "p,e,phase\n1.0,100.0,0\n10.0,300.0,0\n100.0,900.0,1\n",
        )
        .unwrap();

        let source = EosSource::Csv {
            path: "eos/stiff.csv".into(),
            phase_column: Some("phase".to_string()),
            units: UnitsDef::MevFm3,
        };
        let table = load_eos(&source, &dir).unwrap();
        assert_eq!(table.name(), "stiff");
        let (p_min, p_max) = table.pressure_range();
        assert!((p_min / 1.323_790e-6 - 1.0).abs() < 1e-12);
        assert!((p_max / 1.323_790e-4 - 1.0).abs() < 1e-12);
        assert_eq!(table.phase_column(), Some(0));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn partial_pressure_range_is_completed_from_table() {
        let table = load_eos(&polytrope_source(), Path::new(".")).unwrap();
        let settings = SequenceSettings {
            p_min: Some(1e-5),
            ..Default::default()
        };
        let opts = sequence_options(&settings, &IntegrationSettings::default(), &table).unwrap();
        assert_eq!(opts.pressure_range, Some((1e-5, 1e-3)));

        let settings = SequenceSettings {
            p_max: Some(1.0),
            ..Default::default()
        };
        assert!(sequence_options(&settings, &IntegrationSettings::default(), &table).is_err());
    }

    #[test]
    fn final_run_records_profile() {
        let opts = locator_options(&LocatorSettings::default(), &IntegrationSettings::default());
        assert!(opts.final_integration.record_profile);
        assert!(!opts.search_integration.record_profile);
        assert_eq!(opts.final_integration.max_step, 0.1);
    }
}
