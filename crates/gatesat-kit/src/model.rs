//! The circuit model: gate creation, assertions, assumptions, solving, and
//! value queries.

use std::collections::VecDeque;

use bitvec::prelude::*;
use gatesat_base::{Error, Lit, Result, SatBackend, SolveStatus};
use gatesat_cdcl::CdclSolver;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::gate::{CnfTriple, Gate, GateOp};
use crate::graph::GateGraph;
use crate::vars::VarMap;

/// Model configuration, applied to the backend before any clause exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Backend worker threads (>= 1).
    pub threads: u32,
    /// On-the-fly Gaussian elimination on backends that support it.
    pub gauss: bool,
    /// Ask the backend to restrict reported models to independent
    /// variables.
    pub only_indep_solution: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            gauss: true,
            only_indep_solution: false,
        }
    }
}

/// Size counters of a model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelStats {
    /// Circuit variables minted.
    pub constraint_vars: usize,
    /// Gates in the graph.
    pub constraints: usize,
    /// CNF variables allocated.
    pub cnf_vars: usize,
    /// CNF clauses handed to the backend, unit assertions included.
    pub cnf_clauses: usize,
}

/// A combinational circuit compiled on demand into CNF.
///
/// Clients build the circuit from two-input gates over signed circuit ids
/// (negation is the sign), register assertions and assumptions, and call
/// [`solve`](Model::solve). Only gates transitively reachable from an
/// assertion or an active assumption are encoded; after a Sat result the
/// solution is extended across the whole graph, so unencoded gates are
/// valued too whenever their inputs are.
pub struct Model {
    backend: Box<dyn SatBackend>,
    config: ModelConfig,
    vars: VarMap,
    graph: GateGraph,
    /// Signed CNF ids asserted true. Monotone.
    asserts: FxHashSet<i32>,
    /// Assertions recorded but not yet emitted as unit clauses.
    pending_asserts: Vec<i32>,
    /// Signed CNF ids assumed per-solve. Mutable.
    assumptions: FxHashSet<i32>,
    /// Positive circuit id -> value, populated on Sat.
    solution: FxHashMap<i32, bool>,
    status: Option<SolveStatus>,
    cnf_clauses: usize,
    const_true: Option<i32>,
}

impl Model {
    /// Creates a model over the bundled backend with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ModelConfig::default())
    }

    /// Creates a model over the bundled backend.
    #[must_use]
    pub fn with_config(config: ModelConfig) -> Self {
        Self::with_backend(Box::new(CdclSolver::new()), config)
    }

    /// Creates a model over any backend implementing the contract.
    #[must_use]
    pub fn with_backend(mut backend: Box<dyn SatBackend>, config: ModelConfig) -> Self {
        backend.set_num_threads(config.threads.max(1));
        backend.set_allow_otf_gauss(config.gauss);
        Self {
            backend,
            config,
            vars: VarMap::new(),
            graph: GateGraph::new(),
            asserts: FxHashSet::default(),
            pending_asserts: Vec::new(),
            assumptions: FxHashSet::default(),
            solution: FxHashMap::default(),
            status: None,
            cnf_clauses: 0,
            const_true: None,
        }
    }

    /// Bounds each solve by wall-clock seconds. Negative or non-finite
    /// means unlimited.
    pub fn config_timeout(&mut self, seconds: f64) {
        self.backend.set_max_time(seconds);
    }

    /// Bounds each solve by a conflict count. Negative means unlimited.
    pub fn config_conflicts(&mut self, conflicts: i64) {
        self.backend.set_max_conflicts(conflicts);
    }

    // =========================================================================
    // Circuit construction
    // =========================================================================

    /// Mints a fresh circuit variable.
    pub fn var(&mut self) -> i32 {
        let cv = self.vars.fresh_cv();
        self.graph.seed_operand(cv);
        cv
    }

    /// A literal constrained to be true, created and asserted on first use.
    pub fn lit_true(&mut self) -> i32 {
        match self.const_true {
            Some(cv) => cv,
            None => {
                let cv = self.var();
                self.add_assert(cv);
                self.const_true = Some(cv);
                cv
            }
        }
    }

    /// A literal constrained to be false.
    pub fn lit_false(&mut self) -> i32 {
        -self.lit_true()
    }

    /// `left AND right`.
    pub fn and(&mut self, left: i32, right: i32) -> i32 {
        self.intern(left, GateOp::And, right)
    }

    /// `NOT (left AND right)`.
    pub fn nand(&mut self, left: i32, right: i32) -> i32 {
        self.intern(left, GateOp::Nand, right)
    }

    /// `left OR right`.
    pub fn or(&mut self, left: i32, right: i32) -> i32 {
        self.intern(left, GateOp::Or, right)
    }

    /// `NOT (left OR right)`.
    pub fn nor(&mut self, left: i32, right: i32) -> i32 {
        self.intern(left, GateOp::Nor, right)
    }

    /// `left XOR right`.
    pub fn xor(&mut self, left: i32, right: i32) -> i32 {
        self.intern(left, GateOp::Xor, right)
    }

    /// Creates the gate `(left, op, right)` or returns the output of an
    /// existing equal gate.
    ///
    /// # Panics
    /// Panics if either operand is 0 or names an unminted variable.
    fn intern(&mut self, left: i32, op: GateOp, right: i32) -> i32 {
        self.check_lit(left);
        self.check_lit(right);

        let (left, right) = Gate::canonical_operands(left, right);
        if let Some(value) = self.graph.find(left, op, right) {
            trace!(left, ?op, right, value, "gate deduplicated");
            return value;
        }

        let value = self.vars.fresh_cv();
        let gate = Gate::new(left, op, right, value);

        // a gate built after a solve is valued right away when its inputs
        // are, so querying it matches a re-solve
        if self.status == Some(SolveStatus::Sat) {
            if let (Some(lv), Some(rv)) = (
                lookup_signed(&self.solution, left),
                lookup_signed(&self.solution, right),
            ) {
                self.solution.insert(value, op.eval(lv, rv));
            }
        }

        self.graph.insert(gate);
        value
    }

    fn check_lit(&self, lit: i32) {
        assert!(lit != 0, "0 is not a valid circuit literal");
        assert!(
            self.vars.is_minted(lit),
            "{lit} does not name a minted circuit variable"
        );
    }

    // =========================================================================
    // Assertions and assumptions
    // =========================================================================

    /// Asserts that the signed circuit literal holds. Assertions stick
    /// across every later solve.
    ///
    /// # Panics
    /// Panics if `cv` is 0 or names an unminted variable.
    pub fn add_assert(&mut self, cv: i32) {
        self.check_lit(cv);
        let nv = self.vars.cnf_of(cv);
        if self.asserts.insert(nv) {
            self.pending_asserts.push(nv);
        }
        self.add_reachable(cv.abs());
    }

    /// Asserts every literal in the slice.
    pub fn add_asserts(&mut self, cvs: &[i32]) {
        for &cv in cvs {
            self.add_assert(cv);
        }
    }

    /// Assumes the signed circuit literal for subsequent solves. Unlike an
    /// assertion, an assumption can be removed. Encoding of the reachable
    /// subgraph happens at solve time.
    ///
    /// # Panics
    /// Panics if `cv` is 0 or names an unminted variable.
    pub fn add_assume(&mut self, cv: i32) {
        self.check_lit(cv);
        let nv = self.vars.cnf_of(cv);
        self.assumptions.insert(nv);
    }

    /// Removes both polarities of the variable from the assumption set.
    /// Removing an absent assumption is a no-op.
    pub fn remove_assume(&mut self, cv: i32) {
        self.check_lit(cv);
        let nv = self.vars.peek_cnf_of(cv.abs());
        if nv != 0 {
            self.assumptions.remove(&nv);
            self.assumptions.remove(&-nv);
        }
    }

    // =========================================================================
    // Encoding and solving
    // =========================================================================

    /// Walks the gate graph backwards from a root circuit variable and
    /// emits Tseitin clauses for every gate not already encoded.
    ///
    /// Idempotent: a second walk from the same root emits nothing.
    fn add_reachable(&mut self, root_cv: i32) {
        debug_assert!(root_cv > 0);
        let mut visited = bitvec![0; self.vars.num_cvs() + 1];
        let mut queue: VecDeque<i32> = VecDeque::new();
        let mut staged: Vec<usize> = Vec::new();

        queue.push_back(root_cv);
        while let Some(v) = queue.pop_front() {
            if visited[v as usize] {
                continue;
            }
            visited.set(v as usize, true);

            let Some(idx) = self.graph.producer(v) else {
                continue;
            };
            let (left, right, encoded) = {
                let gate = self.graph.gate(idx);
                (gate.left, gate.right, gate.is_encoded())
            };
            if !encoded {
                let triple = CnfTriple {
                    left: self.vars.cnf_of(left),
                    right: self.vars.cnf_of(right),
                    value: self.vars.cnf_of(v),
                };
                self.graph.gate_mut(idx).cnf = Some(triple);
                staged.push(idx);
            }
            for operand in [left.abs(), right.abs()] {
                if !visited[operand as usize] {
                    queue.push_back(operand);
                }
            }
        }

        // the backend must learn the variable high-water mark before any
        // clause mentions the new variables
        let need = self.vars.max_nv() as usize;
        let have = self.backend.num_vars();
        if need > have {
            self.backend.new_vars(need - have);
        }

        for idx in &staged {
            for clause in self.graph.gate(*idx).tseitin_clauses() {
                let lits: Vec<Lit> = clause.iter().map(|&d| Lit::from_dimacs(d)).collect();
                self.backend.add_clause(&lits);
                self.cnf_clauses += 1;
            }
        }
        if !staged.is_empty() {
            trace!(root = root_cv, gates = staged.len(), "encoded reachable gates");
        }
    }

    /// Compiles pending assertions, encodes assumption-reachable gates,
    /// and invokes the backend. On Sat the solution is extended across the
    /// full gate graph.
    pub fn solve(&mut self) -> Result<SolveStatus> {
        for nv in std::mem::take(&mut self.pending_asserts) {
            self.backend.add_clause(&[Lit::from_dimacs(nv)]);
            self.cnf_clauses += 1;
        }

        let mut assumed: Vec<i32> = self.assumptions.iter().copied().collect();
        assumed.sort_unstable();
        for &nv in &assumed {
            let cv = self.vars.cv_of(nv.abs());
            self.add_reachable(cv);
        }
        let assumption_lits: Vec<Lit> = assumed.iter().map(|&nv| Lit::from_dimacs(nv)).collect();

        let status = self
            .backend
            .solve(&assumption_lits, self.config.only_indep_solution)?;
        self.status = Some(status);
        debug!(
            ?status,
            vars = self.vars.num_cvs(),
            gates = self.graph.len(),
            cnf_vars = self.vars.max_nv(),
            cnf_clauses = self.cnf_clauses,
            "solve finished"
        );

        if status.is_sat() {
            self.extend_solution();
        }
        Ok(status)
    }

    /// Seeds the solution map from the backend model and propagates values
    /// to gates the encoder never saw, closing over any gate whose inputs
    /// both have values.
    fn extend_solution(&mut self) {
        self.solution.clear();
        let model = self.backend.model();
        for nv in 1..=self.vars.max_nv() {
            if let Some(value) = model.get((nv - 1) as usize).copied().flatten() {
                self.solution.insert(self.vars.cv_of(nv), value);
            }
        }

        let mut visited = bitvec![0; self.vars.num_cvs() + 1];
        let mut queue: VecDeque<i32> = self.graph.consumed_vars().collect();
        while let Some(v) = queue.pop_front() {
            if visited[v as usize] {
                continue;
            }
            // an unvalued variable is re-enqueued if a value ever arrives
            if !self.solution.contains_key(&v) {
                continue;
            }
            visited.set(v as usize, true);

            for idx in self.graph.consumers(v) {
                let gate = self.graph.gate(idx);
                if self.solution.contains_key(&gate.value) {
                    continue;
                }
                if let (Some(lv), Some(rv)) = (
                    lookup_signed(&self.solution, gate.left),
                    lookup_signed(&self.solution, gate.right),
                ) {
                    let out = gate.op.eval(lv, rv);
                    let value = gate.value;
                    self.solution.insert(value, out);
                    queue.push_back(value);
                }
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The value of a signed circuit literal after a Sat solve.
    ///
    /// Fails with [`Error::NotSatisfied`] when the last solve did not
    /// return Sat, and with [`Error::NoValue`] for a variable outside both
    /// the encoded and the extended closure.
    pub fn val(&self, cv: i32) -> Result<bool> {
        self.check_lit(cv);
        if self.status != Some(SolveStatus::Sat) {
            return Err(Error::NotSatisfied);
        }
        lookup_signed(&self.solution, cv).ok_or(Error::NoValue(cv))
    }

    /// Non-failing variant of [`val`](Model::val): `None` when unsolved or
    /// unvalued.
    pub fn value(&self, cv: i32) -> Option<bool> {
        if self.status != Some(SolveStatus::Sat) {
            return None;
        }
        lookup_signed(&self.solution, cv)
    }

    /// The signed CNF id of a circuit literal, or 0 when the variable was
    /// never reached by an assert or assume.
    pub fn cnf(&self, cv: i32) -> i32 {
        self.check_lit(cv);
        let nv = self.vars.peek_cnf_of(cv.abs());
        if cv < 0 {
            -nv
        } else {
            nv
        }
    }

    /// The status of the last solve, if any.
    pub fn status(&self) -> Option<SolveStatus> {
        self.status
    }

    /// Circuit variables minted.
    pub fn num_constraint_vars(&self) -> usize {
        self.vars.num_cvs()
    }

    /// Gates in the graph.
    pub fn num_constraints(&self) -> usize {
        self.graph.len()
    }

    /// CNF variables allocated.
    pub fn num_cnf_vars(&self) -> usize {
        self.vars.max_nv() as usize
    }

    /// CNF clauses handed to the backend.
    pub fn num_cnf_clauses(&self) -> usize {
        self.cnf_clauses
    }

    /// All size counters at once.
    pub fn stats(&self) -> ModelStats {
        ModelStats {
            constraint_vars: self.num_constraint_vars(),
            constraints: self.num_constraints(),
            cnf_vars: self.num_cnf_vars(),
            cnf_clauses: self.num_cnf_clauses(),
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads a signed circuit literal out of the positive-keyed solution map.
fn lookup_signed(solution: &FxHashMap<i32, bool>, lit: i32) -> Option<bool> {
    solution.get(&lit.abs()).map(|&b| b != (lit < 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_vars_count_from_one() {
        let mut m = Model::new();
        assert_eq!(m.var(), 1);
        assert_eq!(m.var(), 2);
        assert_eq!(m.num_constraint_vars(), 2);
        assert_eq!(m.num_cnf_vars(), 0);
    }

    #[test]
    fn gate_outputs_are_fresh_vars() {
        let mut m = Model::new();
        let a = m.var();
        let b = m.var();
        let g = m.and(a, b);
        assert_eq!(g, 3);
        assert_eq!(m.num_constraints(), 1);
    }

    #[test]
    fn nothing_encoded_without_assert() {
        let mut m = Model::new();
        let a = m.var();
        let b = m.var();
        let g = m.and(a, b);
        assert_eq!(m.cnf(a), 0);
        assert_eq!(m.cnf(g), 0);
        assert_eq!(m.num_cnf_clauses(), 0);
    }

    #[test]
    fn assert_encodes_reachable_cone() {
        let mut m = Model::new();
        let a = m.var();
        let b = m.var();
        let c = m.var();
        let g = m.and(a, b);
        let other = m.or(c, c);

        m.add_assert(g);
        assert_ne!(m.cnf(g), 0);
        assert_ne!(m.cnf(a), 0);
        assert_ne!(m.cnf(b), 0);
        // the unrelated cone stays out of the CNF
        assert_eq!(m.cnf(c), 0);
        assert_eq!(m.cnf(other), 0);
        // one AND gate: 3 clauses, no units yet
        assert_eq!(m.num_cnf_clauses(), 3);
    }

    #[test]
    fn cnf_translation_preserves_sign() {
        let mut m = Model::new();
        let a = m.var();
        m.add_assert(a);
        let nv = m.cnf(a);
        assert!(nv > 0);
        assert_eq!(m.cnf(-a), -nv);
    }

    #[test]
    fn encoding_is_idempotent() {
        let mut m = Model::new();
        let a = m.var();
        let b = m.var();
        let g = m.and(a, b);
        m.add_assert(g);
        let clauses = m.num_cnf_clauses();
        m.add_assert(g);
        assert_eq!(m.num_cnf_clauses(), clauses);
    }

    #[test]
    fn val_before_solve_is_typed_failure() {
        let mut m = Model::new();
        let a = m.var();
        assert!(matches!(m.val(a), Err(Error::NotSatisfied)));
        assert_eq!(m.value(a), None);
    }

    #[test]
    #[should_panic]
    fn zero_literal_is_rejected() {
        let mut m = Model::new();
        let a = m.var();
        let _ = m.and(a, 0);
    }

    #[test]
    #[should_panic]
    fn unminted_literal_is_rejected() {
        let mut m = Model::new();
        let a = m.var();
        let _ = m.and(a, 7);
    }

    #[test]
    fn lit_true_is_cached() {
        let mut m = Model::new();
        let t = m.lit_true();
        assert_eq!(m.lit_true(), t);
        assert_eq!(m.lit_false(), -t);
        assert_eq!(m.num_constraint_vars(), 1);
    }
}
