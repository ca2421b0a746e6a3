//! Query helpers for loaded sequence records.

use ns_results::{SequenceRecord, StarRecord};

use crate::error::{AppError, AppResult};

/// Headline numbers of a sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub star_count: usize,
    pub stable_count: usize,
    pub rejected_count: usize,
    pub max_mass_solar: f64,
    pub radius_at_max_km: f64,
    pub p_c_at_max: f64,
}

pub fn get_run_summary(record: &SequenceRecord) -> AppResult<RunSummary> {
    let top = record
        .max_mass_star()
        .ok_or_else(|| AppError::InvalidInput("No stars in sequence".to_string()))?;

    Ok(RunSummary {
        star_count: record.stars.len(),
        stable_count: record.stars.iter().filter(|s| s.stable == Some(true)).count(),
        rejected_count: record.rejected.len(),
        max_mass_solar: top.mass_solar,
        radius_at_max_km: top.radius_km,
        p_c_at_max: top.p_c,
    })
}

/// Stars flagged stable, up to and including the maximum-mass star.
pub fn stable_stars(record: &SequenceRecord) -> Vec<&StarRecord> {
    let end = record.max_mass_index.map_or(0, |i| i + 1);
    record.stars[..end.min(record.stars.len())]
        .iter()
        .filter(|s| s.stable == Some(true))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star(p_c: f64, mass_solar: f64, stable: bool) -> StarRecord {
        StarRecord {
            p_c,
            eps_c: 0.0,
            radius_km: 12.0,
            mass_code: mass_solar * 1.4766,
            mass_solar,
            k2: None,
            lambda: None,
            converged: true,
            stable: Some(stable),
            central_columns: Vec::new(),
        }
    }

    #[test]
    fn summary_of_turning_sequence() {
        let record = SequenceRecord {
            eos_name: "toy".into(),
            column_names: Vec::new(),
            stars: vec![
                star(1e-5, 1.0, true),
                star(2e-5, 2.0, true),
                star(4e-5, 1.9, false),
            ],
            max_mass_index: Some(1),
            rejected: Vec::new(),
        };
        let summary = get_run_summary(&record).unwrap();
        assert_eq!(summary.star_count, 3);
        assert_eq!(summary.stable_count, 2);
        assert_eq!(summary.max_mass_solar, 2.0);
        assert_eq!(summary.p_c_at_max, 2e-5);
        assert_eq!(stable_stars(&record).len(), 2);
    }

    #[test]
    fn empty_record_has_no_summary() {
        let record = SequenceRecord {
            eos_name: "none".into(),
            column_names: Vec::new(),
            stars: Vec::new(),
            max_mass_index: None,
            rejected: Vec::new(),
        };
        assert!(get_run_summary(&record).is_err());
        assert!(stable_stars(&record).is_empty());
    }
}
