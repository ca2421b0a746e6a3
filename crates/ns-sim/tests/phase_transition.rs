//! Stars crossing a first-order phase transition.

use ns_core::units::MSUN_KM;
use ns_eos::{EosRow, EosTable, EquationOfState, Polytrope};
use ns_sim::{IntegrationOptions, StarSolver};

const P_TRANSITION: f64 = 3e-5;

/// Γ = 2 polytrope table with an energy-density jump of 30% at
/// `P_TRANSITION`, marked by a phase column (0 below, 1 above).
fn two_phase_table() -> EosTable {
    let eos = Polytrope::new(100.0 * MSUN_KM * MSUN_KM, 2.0).unwrap();
    let jump = 0.3 * eos.energy_density(P_TRANSITION);

    let (ls, le) = (2e-7_f64.ln(), 2e-3_f64.ln());
    let grid: Vec<f64> = (0..100)
        .map(|i| (ls + i as f64 * (le - ls) / 99.0).exp())
        .filter(|p| ((p - P_TRANSITION) / P_TRANSITION).abs() > 0.01)
        .collect();

    let mut rows: Vec<EosRow> = grid
        .iter()
        .filter(|&&p| p < P_TRANSITION)
        .map(|&p| EosRow::with_aux(p, eos.energy_density(p), vec![0.0]))
        .collect();
    rows.push(EosRow::with_aux(
        P_TRANSITION,
        eos.energy_density(P_TRANSITION),
        vec![0.0],
    ));
    let p_dense = P_TRANSITION * (1.0 + 1e-6);
    rows.push(EosRow::with_aux(
        p_dense,
        eos.energy_density(p_dense) + jump,
        vec![1.0],
    ));
    rows.extend(
        grid.iter()
            .filter(|&&p| p > P_TRANSITION)
            .map(|&p| EosRow::with_aux(p, eos.energy_density(p) + jump, vec![1.0])),
    );

    EosTable::new("two-phase", rows)
        .unwrap()
        .with_column_names(vec!["phase".to_string()])
        .unwrap()
        .with_phase_column(0)
        .unwrap()
}

#[test]
fn table_reports_the_transition() {
    let table = two_phase_table();
    assert_eq!(table.phase_at(1e-5), Some(0));
    assert_eq!(table.phase_at(1e-4), Some(1));
    let jump = table.phase_jump(1e-4, 1e-5).unwrap();
    assert!(jump > 0.0);
}

#[test]
fn star_with_quark_core_has_finite_tidal_response() {
    let table = two_phase_table();
    let solver = StarSolver::new(&table, IntegrationOptions::default()).unwrap();

    let star = solver.solve(1e-4).unwrap();
    assert!(star.converged);
    let tidal = star.tidal.unwrap();
    assert!(tidal.k2.is_finite() && tidal.k2 > 0.0 && tidal.k2 < 0.5, "k2 = {}", tidal.k2);
    assert!(tidal.lambda.is_finite() && tidal.lambda > 0.0);
}

#[test]
fn star_below_transition_matches_single_phase_table() {
    let two_phase = two_phase_table();
    let solver = StarSolver::new(&two_phase, IntegrationOptions::default()).unwrap();
    let hadronic = solver.solve(2e-5).unwrap();

    // Same data without a phase column: no transition is crossed, so the
    // results must coincide.
    let plain = EosTable::new(
        "plain",
        two_phase
            .pressures()
            .iter()
            .zip(two_phase.energies())
            .map(|(&p, &e)| EosRow::new(p, e))
            .collect(),
    )
    .unwrap();
    let solver = StarSolver::new(&plain, IntegrationOptions::default()).unwrap();
    let reference = solver.solve(2e-5).unwrap();

    assert_eq!(hadronic.mass, reference.mass);
    assert_eq!(hadronic.k2(), reference.k2());
}
