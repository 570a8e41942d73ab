//! The owning gate container and its lookup indices.
//!
//! Gates live in an arena `Vec` for the lifetime of the model; the indices
//! hold arena positions, never owning references. The graph is a DAG — the
//! apparent cycles exist only through the auxiliary maps.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::gate::{Gate, GateOp};

#[derive(Debug, Default)]
pub(crate) struct GateGraph {
    gates: Vec<Gate>,
    /// Positive output id -> arena index.
    by_value: FxHashMap<i32, usize>,
    /// Positive operand id -> gates referencing it. Every minted circuit
    /// variable has an entry, possibly empty, so lookups need no existence
    /// check.
    by_operand: FxHashMap<i32, FxHashSet<usize>>,
}

impl GateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Registers a minted circuit variable as a potential operand.
    pub fn seed_operand(&mut self, cv: i32) {
        debug_assert!(cv > 0);
        self.by_operand.entry(cv).or_default();
    }

    /// Dedup lookup on canonicalized operands: scans the smaller of the two
    /// operand sets, which bounds the cost of the scan.
    pub fn find(&self, left: i32, op: GateOp, right: i32) -> Option<i32> {
        let left_set = self
            .by_operand
            .get(&left.abs())
            .expect("left operand is not a minted circuit variable");
        let right_set = self
            .by_operand
            .get(&right.abs())
            .expect("right operand is not a minted circuit variable");
        let smaller = if left_set.len() <= right_set.len() {
            left_set
        } else {
            right_set
        };
        smaller.iter().find_map(|&idx| {
            let gate = &self.gates[idx];
            gate.matches(left, op, right).then_some(gate.value)
        })
    }

    /// Appends a gate and keeps every index in step.
    pub fn insert(&mut self, gate: Gate) -> usize {
        let idx = self.gates.len();
        self.by_value.insert(gate.value, idx);
        self.by_operand
            .get_mut(&gate.left.abs())
            .expect("left operand is not a minted circuit variable")
            .insert(idx);
        self.by_operand
            .get_mut(&gate.right.abs())
            .expect("right operand is not a minted circuit variable")
            .insert(idx);
        // the output is itself a legal operand from now on
        self.by_operand.entry(gate.value).or_default();
        self.gates.push(gate);
        idx
    }

    /// Arena index of the gate producing `cv`, if `cv` is a gate output.
    pub fn producer(&self, cv: i32) -> Option<usize> {
        debug_assert!(cv > 0);
        self.by_value.get(&cv).copied()
    }

    pub fn gate(&self, idx: usize) -> &Gate {
        &self.gates[idx]
    }

    pub fn gate_mut(&mut self, idx: usize) -> &mut Gate {
        &mut self.gates[idx]
    }

    /// Gates that use `cv` as an operand.
    pub fn consumers(&self, cv: i32) -> impl Iterator<Item = usize> + '_ {
        self.by_operand.get(&cv).into_iter().flatten().copied()
    }

    /// Circuit variables with at least one consumer.
    pub fn consumed_vars(&self) -> impl Iterator<Item = i32> + '_ {
        self.by_operand
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(&cv, _)| cv)
    }
}
