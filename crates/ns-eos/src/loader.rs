//! CSV ingest for tabulated equations of state.
//!
//! Pressure and energy density are read in the [`EosUnits`] given (code
//! units by default) and stored in code units; auxiliary columns are kept
//! as they are. Lines
//! starting with `#` are comments. A first row that does not parse as numbers
//! is taken as the header; otherwise columns are named `p`, `e`, `col2`, ...
//! Rows that fail to parse are skipped (and logged), the remainder sorted by
//! pressure before the table is validated.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use ns_core::units::{density_to_code, dyn_cm2, g_cm3, mev_fm3_to_code, pressure_to_code};
use tracing::{debug, info};

use crate::error::{EosError, EosResult};
use crate::table::{EosRow, EosTable};

/// Units of the pressure and energy-density columns of an EOS file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EosUnits {
    /// km⁻² (G = c = 1)
    #[default]
    Code,
    /// MeV·fm⁻³ for both columns
    MevFm3,
    /// Pressure in dyn·cm⁻², energy density as mass density in g·cm⁻³
    Cgs,
}

impl EosUnits {
    pub fn pressure_to_code(self, v: f64) -> f64 {
        match self {
            EosUnits::Code => v,
            EosUnits::MevFm3 => mev_fm3_to_code(v),
            EosUnits::Cgs => pressure_to_code(dyn_cm2(v)),
        }
    }

    pub fn energy_density_to_code(self, v: f64) -> f64 {
        match self {
            EosUnits::Code => v,
            EosUnits::MevFm3 => mev_fm3_to_code(v),
            EosUnits::Cgs => density_to_code(g_cm3(v)),
        }
    }
}

/// Read an EOS table in code units from a CSV file; the table is named
/// after the file stem.
pub fn read_eos_csv(path: impl AsRef<Path>) -> EosResult<EosTable> {
    read_eos_csv_with_units(path, EosUnits::Code)
}

/// [`read_eos_csv`] for a file whose p and ε columns are in `units`.
pub fn read_eos_csv_with_units(path: impl AsRef<Path>, units: EosUnits) -> EosResult<EosTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| EosError::Io {
        message: format!("failed to open '{}': {e}", path.display()),
    })?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "eos".to_string());
    parse_eos_csv_with_units(file, name, units)
}

/// Parse an EOS table in code units from any CSV source.
pub fn parse_eos_csv<R: Read>(reader: R, name: impl Into<String>) -> EosResult<EosTable> {
    parse_eos_csv_with_units(reader, name, EosUnits::Code)
}

pub fn parse_eos_csv_with_units<R: Read>(
    reader: R,
    name: impl Into<String>,
    units: EosUnits,
) -> EosResult<EosTable> {
    let name = name.into();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut header: Option<Vec<String>> = None;
    let mut values: Vec<Vec<f64>> = Vec::new();
    let mut skipped = 0usize;

    for (line, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                skipped += 1;
                debug!(eos = %name, line = line + 1, error = %e, "skipping unreadable EOS row");
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }
        match parse_numbers(&record) {
            Some(row) => values.push(row),
            None if header.is_none() && values.is_empty() => {
                header = Some(record.iter().map(normalize_header_name).collect());
            }
            None => {
                skipped += 1;
                debug!(eos = %name, line = line + 1, "skipping non-numeric EOS row");
            }
        }
    }

    let width = header
        .as_ref()
        .map(Vec::len)
        .or_else(|| values.first().map(Vec::len))
        .unwrap_or(0);
    if width < 2 {
        return Err(EosError::domain(format!(
            "EOS '{name}' needs pressure and energy-density columns"
        )));
    }
    let names = header.unwrap_or_else(|| default_column_names(width));

    let p_col = find_column(&names, &["p", "pressure"]).unwrap_or(0);
    let e_col = find_column(&names, &["e", "eps", "epsilon", "energy_density"]).unwrap_or(1);
    if p_col == e_col {
        return Err(EosError::MissingColumn {
            name: "e".to_string(),
        });
    }
    let aux_cols: Vec<usize> = (0..width).filter(|&c| c != p_col && c != e_col).collect();

    let mut rows: Vec<EosRow> = Vec::with_capacity(values.len());
    for row in values {
        if row.len() != width {
            skipped += 1;
            debug!(eos = %name, expected = width, found = row.len(), "skipping ragged EOS row");
            continue;
        }
        rows.push(EosRow::with_aux(
            units.pressure_to_code(row[p_col]),
            units.energy_density_to_code(row[e_col]),
            aux_cols.iter().map(|&c| row[c]).collect(),
        ));
    }

    rows.sort_by(|a, b| a.p.total_cmp(&b.p));
    let before = rows.len();
    rows.dedup_by(|later, earlier| later.p == earlier.p);
    skipped += before - rows.len();

    let table = EosTable::new(name, rows)?
        .with_column_names(aux_cols.iter().map(|&c| names[c].clone()).collect())?;

    info!(
        eos = table.name(),
        rows = table.len(),
        skipped,
        units = ?units,
        "loaded EOS table"
    );
    Ok(table)
}

fn parse_numbers(record: &StringRecord) -> Option<Vec<f64>> {
    record.iter().map(|f| f.parse::<f64>().ok()).collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports can carry a BOM on the first header cell.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn default_column_names(width: usize) -> Vec<String> {
    (0..width)
        .map(|c| match c {
            0 => "p".to_string(),
            1 => "e".to_string(),
            _ => format!("col{c}"),
        })
        .collect()
}

fn find_column(names: &[String], candidates: &[&str]) -> Option<usize> {
    names
        .iter()
        .position(|n| candidates.iter().any(|c| n.eq_ignore_ascii_case(c)))
}
