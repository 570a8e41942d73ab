//! Integration tests for the bundled backend.

use gatesat_base::{Lit, SatBackend, SolveStatus};
use gatesat_cdcl::CdclSolver;

fn lit(dimacs: i32) -> Lit {
    Lit::from_dimacs(dimacs)
}

fn clause(solver: &mut CdclSolver, dimacs: &[i32]) {
    let lits: Vec<Lit> = dimacs.iter().map(|&d| lit(d)).collect();
    solver.add_clause(&lits);
}

#[test]
fn simple_sat_respects_all_clauses() {
    let mut solver = CdclSolver::new();
    solver.new_vars(3);
    clause(&mut solver, &[1, -2]);
    clause(&mut solver, &[2, 3]);
    clause(&mut solver, &[-1, -3]);

    assert_eq!(solver.solve(&[], false).unwrap(), SolveStatus::Sat);

    let v = |d: i32| solver.model()[(d - 1) as usize].unwrap();
    assert!(v(1) || !v(2));
    assert!(v(2) || v(3));
    assert!(!v(1) || !v(3));
}

/// Three pigeons do not fit two holes.
#[test]
fn pigeonhole_is_unsat() {
    let mut solver = CdclSolver::new();
    solver.new_vars(6);

    // each pigeon sits somewhere
    clause(&mut solver, &[1, 2]);
    clause(&mut solver, &[3, 4]);
    clause(&mut solver, &[5, 6]);

    // no two pigeons share a hole
    clause(&mut solver, &[-1, -3]);
    clause(&mut solver, &[-1, -5]);
    clause(&mut solver, &[-3, -5]);
    clause(&mut solver, &[-2, -4]);
    clause(&mut solver, &[-2, -6]);
    clause(&mut solver, &[-4, -6]);

    assert_eq!(solver.solve(&[], false).unwrap(), SolveStatus::Unsat);
}

#[test]
fn incremental_clause_addition_after_sat() {
    let mut solver = CdclSolver::new();
    solver.new_vars(2);
    clause(&mut solver, &[1, 2]);

    assert_eq!(solver.solve(&[], false).unwrap(), SolveStatus::Sat);

    clause(&mut solver, &[-1]);
    clause(&mut solver, &[-2]);
    assert_eq!(solver.solve(&[], false).unwrap(), SolveStatus::Unsat);
}

#[test]
fn assumptions_do_not_stick() {
    let mut solver = CdclSolver::new();
    solver.new_vars(2);
    clause(&mut solver, &[1, 2]);

    assert_eq!(
        solver.solve(&[lit(-1), lit(-2)], false).unwrap(),
        SolveStatus::Unsat
    );
    assert_eq!(
        solver.solve(&[lit(-1)], false).unwrap(),
        SolveStatus::Sat
    );
    assert_eq!(solver.model()[1], Some(true));
    assert_eq!(solver.solve(&[], false).unwrap(), SolveStatus::Sat);
}

#[test]
fn conflict_budget_reports_unknown() {
    let mut solver = CdclSolver::new();
    solver.new_vars(3);
    // xor chains forcing a conflict after the first decision
    clause(&mut solver, &[1, 2]);
    clause(&mut solver, &[-1, -2]);
    clause(&mut solver, &[2, 3]);
    clause(&mut solver, &[-2, -3]);
    clause(&mut solver, &[1, 3]);
    clause(&mut solver, &[-1, -3]);

    solver.set_max_conflicts(0);
    assert_eq!(solver.solve(&[], false).unwrap(), SolveStatus::Unknown);

    solver.set_max_conflicts(-1);
    assert_eq!(solver.solve(&[], false).unwrap(), SolveStatus::Unsat);
}

#[test]
fn model_covers_unconstrained_variables() {
    let mut solver = CdclSolver::new();
    solver.new_vars(4);
    clause(&mut solver, &[2]);

    assert_eq!(solver.solve(&[], false).unwrap(), SolveStatus::Sat);
    let model = solver.model();
    assert_eq!(model.len(), 4);
    assert!(model.iter().all(Option::is_some));
    assert_eq!(model[1], Some(true));
}

#[test]
fn stats_accumulate() {
    let mut solver = CdclSolver::new();
    solver.new_vars(2);
    clause(&mut solver, &[1, 2]);
    clause(&mut solver, &[-1, 2]);

    assert_eq!(solver.solve(&[], false).unwrap(), SolveStatus::Sat);
    assert!(solver.stats().propagations > 0);
}
