//! EOS file integration tests.
//!
//! Writes small tables to a temporary directory and reads them back through
//! the public loader, checking the lookups a structure integration relies on.

use std::fs;
use std::path::PathBuf;

use ns_eos::{EosError, EquationOfState, Polytrope, read_eos_csv};

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ns-eos-test-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn polytrope_table_survives_a_file_round_trip() {
    let eos = Polytrope::new(218.03, 2.0).unwrap();
    let table = eos.tabulate(2e-7, 2e-3, 100).unwrap();

    let mut csv = String::from("# generated polytrope\np,e,rho\n");
    for ((p, e), rho) in table
        .pressures()
        .iter()
        .zip(table.energies())
        .zip(&table.aux_columns()[0])
    {
        csv.push_str(&format!("{p:e},{e:e},{rho:e}\n"));
    }
    let path = temp_file("polytrope.csv", &csv);

    let loaded = read_eos_csv(&path).unwrap();
    assert_eq!(loaded.name(), "polytrope");
    assert_eq!(loaded.len(), 100);
    assert_eq!(loaded.pressure_range(), table.pressure_range());

    let p = 7.5e-5;
    assert!((loaded.energy_density(p) - table.energy_density(p)).abs() < 1e-15);
    assert!((loaded.auxiliary_by_name(p, "rho").unwrap() - eos.rest_mass_density(p)).abs() < 1e-6);
}

#[test]
fn loaded_table_clamps_outside_its_domain() {
    let path = temp_file("clamp.csv", "1e-6,1e-4\n1e-5,5e-4\n1e-4,2e-3\n");
    let table = read_eos_csv(&path).unwrap();
    let eos: &dyn EquationOfState = &table;

    assert_eq!(eos.energy_density(0.0), 1e-4);
    assert_eq!(eos.energy_density(1.0), 2e-3);
    assert_eq!(eos.pressure_floor(), 1e-6);
}

#[test]
fn unsorted_duplicate_only_file_is_rejected() {
    let path = temp_file("dupes.csv", "p,e\n1e-5,1e-3\n1e-5,2e-3\n");
    assert!(matches!(read_eos_csv(&path), Err(EosError::Domain { .. })));
}
