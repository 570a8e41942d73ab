//! The bundled search: watched-literal propagation with chronological
//! backtracking over a persistent clause store.

use std::time::{Duration, Instant};

use gatesat_base::{Lit, Result, SatBackend, SolveStatus, Var};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bcp::{Watch, WatchedLiterals};

/// Configuration for the bundled solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdclConfig {
    /// Worker threads. The bundled search is single-threaded; values above
    /// 1 are accepted for contract compatibility.
    pub num_threads: u32,
    /// On-the-fly Gaussian elimination. The bundled search has no XOR rail;
    /// the flag is accepted and recorded.
    pub allow_otf_gauss: bool,
    /// Per-solve wall-clock budget in seconds. `None` = unlimited.
    pub max_time_secs: Option<f64>,
    /// Per-solve conflict budget. `None` = unlimited.
    pub max_conflicts: Option<u64>,
}

impl Default for CdclConfig {
    fn default() -> Self {
        Self {
            num_threads: 1,
            allow_otf_gauss: false,
            max_time_secs: None,
            max_conflicts: None,
        }
    }
}

/// Solver statistics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SolverStats {
    /// Number of decisions made.
    pub decisions: u64,
    /// Number of conflicts encountered.
    pub conflicts: u64,
    /// Number of propagated literals.
    pub propagations: u64,
}

/// A clause in the store. The first two literals are the watched pair.
#[derive(Debug)]
struct Clause {
    lits: Vec<Lit>,
}

/// One entry of the decision stack.
#[derive(Debug, Clone, Copy)]
struct Frame {
    /// The literal decided or assumed at this depth.
    decision: Lit,
    /// Whether the opposite branch has already been explored.
    flipped: bool,
    /// Assumption frames sit below the search and are never flipped.
    assumption: bool,
    /// Trail length at frame entry.
    mark: usize,
}

/// The bundled incremental SAT solver.
pub struct CdclSolver {
    config: CdclConfig,
    clauses: Vec<Clause>,
    watches: WatchedLiterals,
    /// Current assignment per variable; `None` = unassigned.
    assigns: Vec<Option<bool>>,
    /// Assignment order; the prefix up to each frame's mark survives
    /// backtracking past that frame.
    trail: Vec<Lit>,
    frames: Vec<Frame>,
    /// Next trail position to propagate.
    qhead: usize,
    /// Set when the clause store is contradictory at the root.
    root_conflict: bool,
    /// Assignment snapshot of the last Sat solve.
    model: Vec<Option<bool>>,
    stats: SolverStats,
}

impl CdclSolver {
    /// Creates a solver with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CdclConfig::default())
    }

    /// Creates a solver with custom configuration.
    #[must_use]
    pub fn with_config(config: CdclConfig) -> Self {
        Self {
            config,
            clauses: Vec::new(),
            watches: WatchedLiterals::new(0),
            assigns: Vec::new(),
            trail: Vec::new(),
            frames: Vec::new(),
            qhead: 0,
            root_conflict: false,
            model: Vec::new(),
            stats: SolverStats::default(),
        }
    }

    /// Returns solver statistics.
    #[must_use]
    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    /// Returns the number of stored clauses.
    #[must_use]
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.assigns[lit.variable().index()].map(|b| b == lit.is_positive())
    }

    fn assign(&mut self, lit: Lit) {
        debug_assert!(self.lit_value(lit).is_none());
        self.assigns[lit.variable().index()] = Some(lit.is_positive());
        self.trail.push(lit);
    }

    fn push_frame(&mut self, decision: Lit, assumption: bool, flipped: bool) {
        self.frames.push(Frame {
            decision,
            flipped,
            assumption,
            mark: self.trail.len(),
        });
        self.assign(decision);
    }

    fn cancel_top_frame(&mut self) -> Frame {
        let frame = self.frames.pop().expect("no frame to cancel");
        for &lit in &self.trail[frame.mark..] {
            self.assigns[lit.variable().index()] = None;
        }
        self.trail.truncate(frame.mark);
        self.qhead = frame.mark;
        frame
    }

    fn backtrack_to(&mut self, depth: usize) {
        while self.frames.len() > depth {
            self.cancel_top_frame();
        }
    }

    /// Runs propagation to fixpoint. Returns the conflicting clause id, if
    /// any; on conflict the queue is drained so the caller can backtrack.
    fn propagate(&mut self) -> Option<usize> {
        while self.qhead < self.trail.len() {
            let p = self.trail[self.qhead];
            self.qhead += 1;
            self.stats.propagations += 1;

            let false_lit = p.negated();
            let mut ws = std::mem::take(self.watches.list_mut(false_lit));
            let mut kept: Vec<Watch> = Vec::with_capacity(ws.len());
            let mut conflict = None;

            let mut i = 0;
            'watches: while i < ws.len() {
                let mut w = ws[i];
                i += 1;

                if self.lit_value(w.blocker) == Some(true) {
                    kept.push(w);
                    continue;
                }

                // normalize so the false literal sits in slot 1
                if self.clauses[w.clause_id].lits[0] == false_lit {
                    self.clauses[w.clause_id].lits.swap(0, 1);
                }
                let first = self.clauses[w.clause_id].lits[0];
                debug_assert_eq!(self.clauses[w.clause_id].lits[1], false_lit);

                if first != w.blocker && self.lit_value(first) == Some(true) {
                    w.blocker = first;
                    kept.push(w);
                    continue;
                }

                let len = self.clauses[w.clause_id].lits.len();
                for k in 2..len {
                    let candidate = self.clauses[w.clause_id].lits[k];
                    if self.lit_value(candidate) != Some(false) {
                        // move the watch to the candidate
                        self.clauses[w.clause_id].lits.swap(1, k);
                        self.watches.watch(candidate, w.clause_id, first);
                        continue 'watches;
                    }
                }

                // clause is unit on `first`, or conflicting
                kept.push(Watch {
                    clause_id: w.clause_id,
                    blocker: first,
                });
                match self.lit_value(first) {
                    Some(false) => {
                        kept.extend_from_slice(&ws[i..]);
                        conflict = Some(w.clause_id);
                        break;
                    }
                    Some(true) => {}
                    None => self.assign(first),
                }
            }

            ws.clear();
            *self.watches.list_mut(false_lit) = kept;

            if conflict.is_some() {
                self.qhead = self.trail.len();
                return conflict;
            }
        }
        None
    }

    /// Undoes decisions until a branch with an unexplored polarity is found
    /// and enters that polarity. Returns false when the search space above
    /// the assumptions is exhausted.
    fn resolve_conflict(&mut self, assumption_depth: usize) -> bool {
        while self.frames.len() > assumption_depth {
            let frame = self.cancel_top_frame();
            if !frame.flipped && !frame.assumption {
                self.push_frame(frame.decision.negated(), false, true);
                return true;
            }
        }
        false
    }

    fn pick_branch(&self) -> Option<Var> {
        // first unassigned variable
        self.assigns
            .iter()
            .position(Option::is_none)
            .map(|i| Var(i as u32))
    }

    fn deadline(&self, started: Instant) -> bool {
        match self.config.max_time_secs.map(Duration::try_from_secs_f64) {
            Some(Ok(limit)) => started.elapsed() >= limit,
            _ => false,
        }
    }

    fn solve_inner(&mut self, assumptions: &[Lit]) -> SolveStatus {
        let started = Instant::now();
        self.model.clear();

        if self.root_conflict {
            return SolveStatus::Unsat;
        }
        debug_assert!(self.frames.is_empty());

        if self.propagate().is_some() {
            // contradiction at the root is permanent
            self.root_conflict = true;
            return SolveStatus::Unsat;
        }

        for &a in assumptions {
            debug_assert!(a.variable().index() < self.assigns.len());
            match self.lit_value(a) {
                Some(true) => {}
                Some(false) => {
                    self.backtrack_to(0);
                    return SolveStatus::Unsat;
                }
                None => {
                    self.push_frame(a, true, false);
                    if self.propagate().is_some() {
                        self.backtrack_to(0);
                        return SolveStatus::Unsat;
                    }
                }
            }
        }
        let assumption_depth = self.frames.len();
        let conflict_budget = self.config.max_conflicts.unwrap_or(u64::MAX);
        let mut conflicts = 0u64;

        loop {
            if self.deadline(started) {
                self.backtrack_to(0);
                debug!("solve hit time budget");
                return SolveStatus::Unknown;
            }

            let Some(var) = self.pick_branch() else {
                self.model = self.assigns.clone();
                self.backtrack_to(0);
                return SolveStatus::Sat;
            };

            self.stats.decisions += 1;
            self.push_frame(Lit::negative(var), false, false);

            while let Some(_conflict) = self.propagate() {
                self.stats.conflicts += 1;
                conflicts += 1;
                if conflicts > conflict_budget || self.deadline(started) {
                    self.backtrack_to(0);
                    debug!(conflicts, "solve hit budget");
                    return SolveStatus::Unknown;
                }
                if !self.resolve_conflict(assumption_depth) {
                    self.backtrack_to(0);
                    return SolveStatus::Unsat;
                }
            }
        }
    }
}

impl Default for CdclSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SatBackend for CdclSolver {
    fn new_vars(&mut self, n: usize) {
        let total = self.assigns.len() + n;
        self.assigns.resize(total, None);
        self.watches.grow(total);
    }

    fn num_vars(&self) -> usize {
        self.assigns.len()
    }

    fn add_clause(&mut self, lits: &[Lit]) {
        assert!(
            self.frames.is_empty(),
            "clauses may only be added between solves"
        );
        debug_assert!(lits.iter().all(|l| l.variable().index() < self.assigns.len()));

        let mut sorted = lits.to_vec();
        sorted.sort_by_key(|l| l.index());
        sorted.dedup();
        // a literal next to its own negation makes the clause a tautology
        if sorted
            .windows(2)
            .any(|w| w[0].variable() == w[1].variable())
        {
            return;
        }

        // simplify against the root trail; root assignments never retract
        let mut reduced = Vec::with_capacity(sorted.len());
        for &lit in &sorted {
            match self.lit_value(lit) {
                Some(true) => return,
                Some(false) => {}
                None => reduced.push(lit),
            }
        }

        match reduced.len() {
            0 => self.root_conflict = true,
            1 => self.assign(reduced[0]),
            _ => {
                let clause_id = self.clauses.len();
                self.watches.watch(reduced[0], clause_id, reduced[1]);
                self.watches.watch(reduced[1], clause_id, reduced[0]);
                self.clauses.push(Clause { lits: reduced });
            }
        }
    }

    fn solve(&mut self, assumptions: &[Lit], _only_indep_solution: bool) -> Result<SolveStatus> {
        let status = self.solve_inner(assumptions);
        debug!(
            ?status,
            vars = self.assigns.len(),
            clauses = self.clauses.len(),
            assumptions = assumptions.len(),
            "solve finished"
        );
        Ok(status)
    }

    fn model(&self) -> &[Option<bool>] {
        &self.model
    }

    fn set_max_time(&mut self, seconds: f64) {
        self.config.max_time_secs = (seconds.is_finite() && seconds >= 0.0).then_some(seconds);
    }

    fn set_max_conflicts(&mut self, conflicts: i64) {
        self.config.max_conflicts = u64::try_from(conflicts).ok();
    }

    fn set_num_threads(&mut self, threads: u32) {
        debug!(threads, "thread count recorded; search is single-threaded");
        self.config.num_threads = threads.max(1);
    }

    fn set_allow_otf_gauss(&mut self, allow: bool) {
        debug!(allow, "otf gauss recorded; search has no xor rail");
        self.config.allow_otf_gauss = allow;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(dimacs: i32) -> Lit {
        Lit::from_dimacs(dimacs)
    }

    #[test]
    fn empty_problem_is_sat() {
        let mut solver = CdclSolver::new();
        assert_eq!(solver.solve(&[], false).unwrap(), SolveStatus::Sat);
    }

    #[test]
    fn unit_propagates_into_model() {
        let mut solver = CdclSolver::new();
        solver.new_vars(2);
        solver.add_clause(&[lit(1)]);
        solver.add_clause(&[lit(-1), lit(2)]);

        assert_eq!(solver.solve(&[], false).unwrap(), SolveStatus::Sat);
        assert_eq!(solver.model()[0], Some(true));
        assert_eq!(solver.model()[1], Some(true));
    }

    #[test]
    fn conflicting_units_are_unsat() {
        let mut solver = CdclSolver::new();
        solver.new_vars(1);
        solver.add_clause(&[lit(1)]);
        solver.add_clause(&[lit(-1)]);

        assert_eq!(solver.solve(&[], false).unwrap(), SolveStatus::Unsat);
        // unsat at the root is permanent
        assert_eq!(solver.solve(&[], false).unwrap(), SolveStatus::Unsat);
    }

    #[test]
    fn tautologies_are_dropped() {
        let mut solver = CdclSolver::new();
        solver.new_vars(2);
        solver.add_clause(&[lit(1), lit(-1), lit(2)]);
        assert_eq!(solver.num_clauses(), 0);
        assert_eq!(solver.solve(&[], false).unwrap(), SolveStatus::Sat);
    }

    #[test]
    fn assumption_flip() {
        let mut solver = CdclSolver::new();
        solver.new_vars(2);
        solver.add_clause(&[lit(1), lit(2)]);

        assert_eq!(solver.solve(&[lit(-1)], false).unwrap(), SolveStatus::Sat);
        assert_eq!(solver.model()[0], Some(false));
        assert_eq!(solver.model()[1], Some(true));

        assert_eq!(solver.solve(&[lit(1)], false).unwrap(), SolveStatus::Sat);
        assert_eq!(solver.model()[0], Some(true));
    }

    #[test]
    fn contradictory_assumptions_are_unsat_but_recoverable() {
        let mut solver = CdclSolver::new();
        solver.new_vars(2);
        solver.add_clause(&[lit(1), lit(2)]);

        let status = solver.solve(&[lit(-1), lit(-2)], false).unwrap();
        assert_eq!(status, SolveStatus::Unsat);

        // the clause store itself is still satisfiable
        assert_eq!(solver.solve(&[], false).unwrap(), SolveStatus::Sat);
    }
}
