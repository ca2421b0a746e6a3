//! Tabulated equation of state with clamped piecewise-linear interpolation.
//!
//! The table is immutable once built. Lookups at pressures outside
//! `[p_min, p_max]` return the boundary value instead of extrapolating:
//! adaptive ODE steps routinely overshoot the table edges, and extrapolated
//! energy densities can turn negative or superluminal.

use crate::error::{EosError, EosResult};
use crate::model::{EquationOfState, validation};

/// One tabulated row: pressure, energy density and any auxiliary columns.
#[derive(Debug, Clone, PartialEq)]
pub struct EosRow {
    pub p: f64,
    pub e: f64,
    pub aux: Vec<f64>,
}

impl EosRow {
    pub fn new(p: f64, e: f64) -> Self {
        Self { p, e, aux: Vec::new() }
    }

    pub fn with_aux(p: f64, e: f64, aux: Vec<f64>) -> Self {
        Self { p, e, aux }
    }
}

/// Location of a pressure inside the table: bracketing row index and the
/// fractional position within `[p_i, p_{i+1}]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    index: usize,
    frac: f64,
}

impl Segment {
    fn interpolate(self, column: &[f64]) -> f64 {
        let (a, b) = (column[self.index], column[self.index + 1]);
        if self.frac <= 0.0 {
            a
        } else if self.frac >= 1.0 {
            b
        } else {
            a + self.frac * (b - a)
        }
    }
}

/// Pressure/energy-density table in code units.
#[derive(Debug, Clone)]
pub struct EosTable {
    name: String,
    pressure: Vec<f64>,
    energy: Vec<f64>,
    /// Column-major auxiliary data: `aux[column][row]`.
    aux: Vec<Vec<f64>>,
    aux_names: Vec<String>,
    phase_column: Option<usize>,
}

impl EosTable {
    /// Build a table from rows sorted by strictly increasing pressure.
    ///
    /// Auxiliary columns get the default names `col2`, `col3`, ... (the
    /// pressure and energy-density columns being 0 and 1).
    pub fn new(name: impl Into<String>, rows: Vec<EosRow>) -> EosResult<Self> {
        if rows.len() < 2 {
            return Err(EosError::domain(format!(
                "need at least 2 rows for interpolation, got {}",
                rows.len()
            )));
        }

        let n_aux = rows[0].aux.len();
        if let Some(bad) = rows.iter().position(|r| r.aux.len() != n_aux) {
            return Err(EosError::domain(format!(
                "row {bad} has {} auxiliary values, expected {n_aux}",
                rows[bad].aux.len()
            )));
        }

        let pressure: Vec<f64> = rows.iter().map(|r| r.p).collect();
        let energy: Vec<f64> = rows.iter().map(|r| r.e).collect();
        let aux: Vec<Vec<f64>> = (0..n_aux)
            .map(|c| rows.iter().map(|r| r.aux[c]).collect())
            .collect();

        validation::validate_finite(&pressure, "pressure")?;
        validation::validate_finite(&energy, "energy density")?;
        for column in &aux {
            validation::validate_finite(column, "auxiliary value")?;
        }
        validation::validate_strictly_increasing(&pressure)?;
        validation::validate_non_decreasing(&energy)?;

        let aux_names = (0..n_aux).map(|c| format!("col{}", c + 2)).collect();

        Ok(Self {
            name: name.into(),
            pressure,
            energy,
            aux,
            aux_names,
            phase_column: None,
        })
    }

    /// Replace the auxiliary column names.
    pub fn with_column_names(mut self, names: Vec<String>) -> EosResult<Self> {
        if names.len() != self.aux.len() {
            return Err(EosError::domain(format!(
                "{} column names given for {} auxiliary columns",
                names.len(),
                self.aux.len()
            )));
        }
        self.aux_names = names;
        Ok(self)
    }

    /// Designate an auxiliary column as the phase index (e.g. 0 = hadronic,
    /// 1 = quark) for phase-transition aware sound speeds.
    pub fn with_phase_column(mut self, index: usize) -> EosResult<Self> {
        if index >= self.aux.len() {
            return Err(EosError::ColumnOutOfRange {
                index,
                len: self.aux.len(),
            });
        }
        self.phase_column = Some(index);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.pressure.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pressure.is_empty()
    }

    pub fn pressures(&self) -> &[f64] {
        &self.pressure
    }

    pub fn energies(&self) -> &[f64] {
        &self.energy
    }

    pub fn aux_columns(&self) -> &[Vec<f64>] {
        &self.aux
    }

    pub fn aux_names(&self) -> &[String] {
        &self.aux_names
    }

    pub fn phase_column(&self) -> Option<usize> {
        self.phase_column
    }

    /// Index of an auxiliary column by name.
    pub fn column_index(&self, name: &str) -> EosResult<usize> {
        self.aux_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| EosError::MissingColumn {
                name: name.to_string(),
            })
    }

    pub fn pressure_range(&self) -> (f64, f64) {
        (self.pressure[0], self.pressure[self.pressure.len() - 1])
    }

    /// ε(p), clamped to the table's boundary values.
    pub fn energy_density(&self, p: f64) -> f64 {
        self.segment(p).interpolate(&self.energy)
    }

    /// Auxiliary column value at `p`, clamped like [`Self::energy_density`].
    pub fn auxiliary(&self, p: f64, column: usize) -> EosResult<f64> {
        let values = self.aux.get(column).ok_or(EosError::ColumnOutOfRange {
            index: column,
            len: self.aux.len(),
        })?;
        Ok(self.segment(p).interpolate(values))
    }

    pub fn auxiliary_by_name(&self, p: f64, name: &str) -> EosResult<f64> {
        self.auxiliary(p, self.column_index(name)?)
    }

    /// All auxiliary columns at `p`, paired with their names.
    pub fn auxiliary_row(&self, p: f64) -> Vec<(&str, f64)> {
        let seg = self.segment(p);
        self.aux_names
            .iter()
            .zip(&self.aux)
            .map(|(name, values)| (name.as_str(), seg.interpolate(values)))
            .collect()
    }

    /// Phase index at `p`: the interpolated phase column rounded to the
    /// nearest tabulated phase.
    pub fn phase_at(&self, p: f64) -> Option<i64> {
        let column = self.phase_column?;
        Some(self.segment(p).interpolate(&self.aux[column]).round() as i64)
    }

    /// dε/dp from the same clamped segment lookup as ε(p).
    ///
    /// Outside the table the boundary segment's slope is used. When a phase
    /// column is set and the bracketing segment straddles a phase boundary,
    /// the slope comes from the nearest segment lying wholly inside the phase
    /// obtained by rounding the interpolated phase index; the transition
    /// segment itself only carries the density jump.
    pub fn d_energy_d_pressure(&self, p: f64) -> f64 {
        let seg = self.segment(p);
        let Some(column) = self.phase_column else {
            return self.slope(seg.index);
        };

        let phase = &self.aux[column];
        let i = seg.index;
        let (lo, hi) = (phase[i].round(), phase[i + 1].round());
        if lo == hi {
            return self.slope(i);
        }

        let current = seg.interpolate(phase).round();
        let inside = |j: usize| phase[j].round() == current && phase[j + 1].round() == current;
        let neighbour = if current == lo {
            (0..i).rev().find(|&j| inside(j))
        } else if current == hi {
            (i + 1..self.pressure.len() - 1).find(|&j| inside(j))
        } else {
            None
        };
        self.slope(neighbour.unwrap_or(i))
    }

    /// Sum of energy-density jumps over phase-transition segments between
    /// `p_outer` and `p_inner`, if the rounded phase differs at the two ends.
    pub fn phase_jump(&self, p_inner: f64, p_outer: f64) -> Option<f64> {
        let column = self.phase_column?;
        if self.phase_at(p_inner) == self.phase_at(p_outer) {
            return None;
        }
        let phase = &self.aux[column];
        let (from, to) = {
            let a = self.segment(p_outer).index;
            let b = self.segment(p_inner).index;
            (a.min(b), a.max(b))
        };
        let jump: f64 = (from..=to)
            .filter(|&k| phase[k].round() != phase[k + 1].round())
            .map(|k| self.energy[k + 1] - self.energy[k])
            .sum();
        (jump > 0.0).then_some(jump)
    }

    fn slope(&self, i: usize) -> f64 {
        (self.energy[i + 1] - self.energy[i]) / (self.pressure[i + 1] - self.pressure[i])
    }

    fn segment(&self, p: f64) -> Segment {
        let n = self.pressure.len();
        // NaN fails every comparison and lands on the lower clamp.
        if !(p > self.pressure[0]) {
            return Segment { index: 0, frac: 0.0 };
        }
        if p >= self.pressure[n - 1] {
            return Segment {
                index: n - 2,
                frac: 1.0,
            };
        }
        let index = self.pressure.partition_point(|&x| x <= p) - 1;
        let frac = (p - self.pressure[index]) / (self.pressure[index + 1] - self.pressure[index]);
        Segment { index, frac }
    }
}

impl EquationOfState for EosTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn energy_density(&self, p: f64) -> f64 {
        EosTable::energy_density(self, p)
    }

    fn d_energy_d_pressure(&self, p: f64) -> f64 {
        EosTable::d_energy_d_pressure(self, p)
    }

    fn pressure_floor(&self) -> f64 {
        self.pressure[0]
    }

    fn pressure_range(&self) -> (f64, f64) {
        EosTable::pressure_range(self)
    }

    fn phase_jump(&self, p_inner: f64, p_outer: f64) -> Option<f64> {
        EosTable::phase_jump(self, p_inner, p_outer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_table() -> EosTable {
        // e = 2p + 1 with an auxiliary column a = 10p
        let rows = (1..=5)
            .map(|i| {
                let p = i as f64;
                EosRow::with_aux(p, 2.0 * p + 1.0, vec![10.0 * p])
            })
            .collect();
        EosTable::new("linear", rows).unwrap()
    }

    /// Five rows with a phase transition in the segment between rows 2 and 3.
    fn two_phase_table() -> EosTable {
        let rows = vec![
            EosRow::with_aux(1.0, 1.0, vec![0.0]),
            EosRow::with_aux(2.0, 2.0, vec![0.0]),
            EosRow::with_aux(3.0, 3.0, vec![0.0]),
            EosRow::with_aux(3.1, 8.0, vec![1.0]),
            EosRow::with_aux(5.0, 12.0, vec![1.0]),
        ];
        EosTable::new("two-phase", rows)
            .unwrap()
            .with_column_names(vec!["phase".into()])
            .unwrap()
            .with_phase_column(0)
            .unwrap()
    }

    #[test]
    fn rejects_small_or_unsorted_tables() {
        assert!(matches!(
            EosTable::new("one", vec![EosRow::new(1.0, 1.0)]),
            Err(EosError::Domain { .. })
        ));
        assert!(matches!(
            EosTable::new("dup", vec![EosRow::new(1.0, 1.0), EosRow::new(1.0, 2.0)]),
            Err(EosError::Domain { .. })
        ));
        assert!(matches!(
            EosTable::new("desc", vec![EosRow::new(2.0, 1.0), EosRow::new(1.0, 2.0)]),
            Err(EosError::Domain { .. })
        ));
    }

    #[test]
    fn rejects_ragged_auxiliary_rows() {
        let rows = vec![
            EosRow::with_aux(1.0, 1.0, vec![1.0]),
            EosRow::new(2.0, 2.0),
        ];
        assert!(EosTable::new("ragged", rows).is_err());
    }

    #[test]
    fn interpolates_inside_the_table() {
        let t = linear_table();
        assert!((t.energy_density(2.5) - 6.0).abs() < 1e-12);
        assert!((t.auxiliary(3.25, 0).unwrap() - 32.5).abs() < 1e-12);
        assert!((t.d_energy_d_pressure(4.5) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn clamps_at_both_ends() {
        let t = linear_table();
        assert_eq!(t.energy_density(0.5), t.energy_density(1.0));
        assert_eq!(t.energy_density(-1e30), 3.0);
        assert_eq!(t.energy_density(5.0), 11.0);
        assert_eq!(t.energy_density(1e9), 11.0);
        assert_eq!(t.energy_density(f64::NAN), 3.0);
        // boundary segment slope outside the table
        assert!((t.d_energy_d_pressure(100.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn auxiliary_lookup_by_name_and_index() {
        let t = linear_table()
            .with_column_names(vec!["n".to_string()])
            .unwrap();
        assert_eq!(t.column_index("n").unwrap(), 0);
        assert!((t.auxiliary_by_name(2.0, "n").unwrap() - 20.0).abs() < 1e-12);
        assert!(matches!(
            t.auxiliary(2.0, 4),
            Err(EosError::ColumnOutOfRange { index: 4, len: 1 })
        ));
        assert!(matches!(
            t.auxiliary_by_name(2.0, "mu"),
            Err(EosError::MissingColumn { .. })
        ));
        let row = t.auxiliary_row(3.0);
        assert_eq!(row.len(), 1);
        assert_eq!(row[0].0, "n");
    }

    #[test]
    fn default_column_names_follow_file_positions() {
        let t = linear_table();
        assert_eq!(t.aux_names(), &["col2".to_string()]);
    }

    #[test]
    fn phase_is_rounded_not_truncated() {
        let t = two_phase_table();
        // 70% of the way through the transition segment rounds up to phase 1.
        assert_eq!(t.phase_at(3.07), Some(1));
        assert_eq!(t.phase_at(3.03), Some(0));
        assert_eq!(t.phase_at(1.5), Some(0));
    }

    #[test]
    fn transition_segment_uses_neighbouring_phase_slope() {
        let t = two_phase_table();
        let slope_hadronic = 1.0; // rows 1-2
        let slope_quark = (12.0 - 8.0) / (5.0 - 3.1); // rows 3-4
        assert!((t.d_energy_d_pressure(3.03) - slope_hadronic).abs() < 1e-12);
        assert!((t.d_energy_d_pressure(3.07) - slope_quark).abs() < 1e-12);
        // well inside each phase the own segment is used
        assert!((t.d_energy_d_pressure(4.0) - slope_quark).abs() < 1e-12);
    }

    #[test]
    fn phase_jump_reports_density_discontinuity() {
        let t = two_phase_table();
        assert_eq!(t.phase_jump(4.0, 2.5), Some(5.0));
        assert_eq!(t.phase_jump(2.5, 1.5), None);
        assert_eq!(linear_table().phase_jump(4.0, 1.0), None);
    }

    #[test]
    fn trait_object_dispatch() {
        let t = linear_table();
        let eos: &dyn EquationOfState = &t;
        assert_eq!(eos.pressure_floor(), 1.0);
        assert_eq!(eos.pressure_range(), (1.0, 5.0));
        assert_eq!(eos.name(), "linear");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn table() -> EosTable {
        let rows = (0..40)
            .map(|i| {
                let p = 10f64.powf(-6.0 + 0.1 * i as f64);
                EosRow::new(p, p.sqrt() + p)
            })
            .collect();
        EosTable::new("sqrt", rows).unwrap()
    }

    proptest! {
        #[test]
        fn below_range_equals_lower_boundary(delta in 0.0_f64..1.0) {
            let t = table();
            let (p_min, _) = t.pressure_range();
            prop_assert_eq!(t.energy_density(p_min - delta), t.energy_density(p_min));
        }

        #[test]
        fn above_range_equals_upper_boundary(delta in 0.0_f64..1e3) {
            let t = table();
            let (_, p_max) = t.pressure_range();
            prop_assert_eq!(t.energy_density(p_max + delta), t.energy_density(p_max));
        }

        #[test]
        fn interpolation_is_monotone(a in -7.0_f64..-1.0, b in -7.0_f64..-1.0) {
            let t = table();
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            let (p_lo, p_hi) = (10f64.powf(lo), 10f64.powf(hi));
            prop_assert!(t.energy_density(p_lo) <= t.energy_density(p_hi));
        }
    }
}
