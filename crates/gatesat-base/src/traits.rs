//! The contract between the circuit front-end and a SAT backend.

use crate::error::Result;
use crate::lit::Lit;
use serde::{Deserialize, Serialize};

/// The outcome of a solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Satisfiable; a model is available.
    Sat,
    /// Unsatisfiable under the current clauses and assumptions.
    Unsat,
    /// Undetermined: a time or conflict budget was exhausted.
    Unknown,
}

impl SolveStatus {
    /// Returns whether the status is `Sat`.
    #[must_use]
    pub const fn is_sat(self) -> bool {
        matches!(self, Self::Sat)
    }

    /// Returns whether the status is `Unsat`.
    #[must_use]
    pub const fn is_unsat(self) -> bool {
        matches!(self, Self::Unsat)
    }
}

/// An incremental SAT solver usable as the backend of a circuit model.
///
/// The front-end drives the backend through this surface only. Variables are
/// created with [`new_vars`](Self::new_vars) before any clause mentions
/// them; clauses accumulate monotonically; [`solve`](Self::solve) may be
/// called repeatedly with varying assumption lists.
pub trait SatBackend {
    /// Raises the variable count by `n`.
    fn new_vars(&mut self, n: usize);

    /// Returns the current variable count.
    fn num_vars(&self) -> usize;

    /// Adds a clause over existing variables.
    ///
    /// Every literal's variable index must be below
    /// [`num_vars`](Self::num_vars).
    fn add_clause(&mut self, lits: &[Lit]);

    /// Solves under the given assumptions.
    ///
    /// `only_indep_solution` asks the backend to restrict the reported model
    /// to independent variables; backends without that notion may ignore it.
    fn solve(&mut self, assumptions: &[Lit], only_indep_solution: bool) -> Result<SolveStatus>;

    /// Returns the model of the last Sat solve, indexed by variable index.
    ///
    /// `None` marks a variable the backend left undefined.
    fn model(&self) -> &[Option<bool>];

    /// Bounds each solve by wall-clock time in seconds.
    ///
    /// Negative or non-finite values mean unlimited.
    fn set_max_time(&mut self, seconds: f64);

    /// Bounds each solve by a conflict count. Negative means unlimited.
    fn set_max_conflicts(&mut self, conflicts: i64);

    /// Sets the number of worker threads. Intended to be called before the
    /// first clause.
    fn set_num_threads(&mut self, threads: u32);

    /// Enables on-the-fly Gaussian elimination on backends that support it.
    /// Intended to be called before the first clause.
    fn set_allow_otf_gauss(&mut self, allow: bool);
}
