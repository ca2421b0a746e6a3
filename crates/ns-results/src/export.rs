//! CSV export of sequences and profiles.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::ResultsResult;
use crate::types::{SequenceRecord, StarProfileRecord};

fn sci(v: f64) -> String {
    format!("{v:.6e}")
}

fn opt(v: Option<f64>) -> String {
    v.map(sci).unwrap_or_default()
}

/// Header: `p_c,R,M_code,M_solar,Lambda,k2,stable,e(pc),<col>(pc)...`.
pub fn write_sequence_csv<W: Write>(writer: W, sequence: &SequenceRecord) -> ResultsResult<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = ["p_c", "R", "M_code", "M_solar", "Lambda", "k2", "stable", "e(pc)"]
        .into_iter()
        .map(String::from)
        .collect();
    header.extend(sequence.column_names.iter().map(|c| format!("{c}(pc)")));
    csv.write_record(&header)?;

    for star in &sequence.stars {
        let mut row = vec![
            sci(star.p_c),
            sci(star.radius_km),
            sci(star.mass_code),
            sci(star.mass_solar),
            opt(star.lambda),
            opt(star.k2),
            star.stable.map(|s| s.to_string()).unwrap_or_default(),
            sci(star.eps_c),
        ];
        row.extend(star.central_columns.iter().copied().map(sci));
        csv.write_record(&row)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn save_sequence_csv(path: &Path, sequence: &SequenceRecord) -> ResultsResult<()> {
    write_sequence_csv(File::create(path)?, sequence)
}

/// Header: `r,m,p,e,nu,y,<col>...`.
pub fn write_profile_csv<W: Write>(writer: W, star: &StarProfileRecord) -> ResultsResult<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = ["r", "m", "p", "e", "nu", "y"]
        .into_iter()
        .map(String::from)
        .collect();
    header.extend(star.column_names.iter().cloned());
    csv.write_record(&header)?;

    for point in &star.profile {
        let mut row = vec![
            sci(point.r),
            sci(point.m),
            sci(point.p),
            sci(point.eps),
            sci(point.nu),
            opt(point.y),
        ];
        row.extend(point.columns.iter().copied().map(sci));
        csv.write_record(&row)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_star_json<W: Write>(writer: W, star: &StarProfileRecord) -> ResultsResult<()> {
    serde_json::to_writer_pretty(writer, star)?;
    Ok(())
}

pub fn save_star_json(path: &Path, star: &StarProfileRecord) -> ResultsResult<()> {
    write_star_json(File::create(path)?, star)
}
