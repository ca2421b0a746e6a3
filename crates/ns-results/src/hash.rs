//! Content-based hashing for run IDs.

use ns_eos::EosTable;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Digest of the table contents (values, column names, phase column). The
/// table name is not part of it, so renamed copies of a file share runs.
pub fn eos_digest(table: &EosTable) -> String {
    let mut hasher = Sha256::new();
    let mut feed = |values: &[f64]| {
        hasher.update((values.len() as u64).to_le_bytes());
        for v in values {
            hasher.update(v.to_le_bytes());
        }
    };
    feed(table.pressures());
    feed(table.energies());
    for column in table.aux_columns() {
        feed(column);
    }
    for name in table.aux_names() {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
    }
    if let Some(phase) = table.phase_column() {
        hasher.update((phase as u64).to_le_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Run id from the EOS digest, the serialized run settings and the solver
/// version.
pub fn compute_run_id<S: Serialize + ?Sized>(
    eos_digest: &str,
    settings: &S,
    solver_version: &str,
) -> String {
    let mut hasher = Sha256::new();

    hasher.update(eos_digest.as_bytes());

    let settings_json = serde_json::to_string(settings).unwrap_or_default();
    hasher.update(settings_json.as_bytes());

    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RunType;
    use ns_eos::EosRow;

    fn table(name: &str, e_last: f64) -> EosTable {
        EosTable::new(
            name,
            vec![
                EosRow::new(1e-6, 1e-4),
                EosRow::new(1e-5, 5e-4),
                EosRow::new(1e-4, e_last),
            ],
        )
        .unwrap()
    }

    #[test]
    fn hash_stability() {
        let digest = eos_digest(&table("a", 2e-3));
        let run_type = RunType::Sequence { num_points: 50 };
        let id1 = compute_run_id(&digest, &run_type, "v1");
        let id2 = compute_run_id(&digest, &run_type, "v1");
        assert_eq!(id1, id2);
        assert_eq!(id1.len(), 64);
    }

    #[test]
    fn table_name_does_not_matter() {
        assert_eq!(eos_digest(&table("a", 2e-3)), eos_digest(&table("b", 2e-3)));
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let d1 = eos_digest(&table("a", 2e-3));
        let d2 = eos_digest(&table("a", 3e-3));
        assert_ne!(d1, d2);

        let seq = RunType::Sequence { num_points: 50 };
        assert_ne!(compute_run_id(&d1, &seq, "v1"), compute_run_id(&d2, &seq, "v1"));
        assert_ne!(compute_run_id(&d1, &seq, "v1"), compute_run_id(&d1, &seq, "v2"));
        let other = RunType::Sequence { num_points: 100 };
        assert_ne!(compute_run_id(&d1, &seq, "v1"), compute_run_id(&d1, &other, "v1"));
    }
}
