//! Two-input gates and their Tseitin expansions.

use serde::{Deserialize, Serialize};

/// The operator of a two-input gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateOp {
    And,
    Nand,
    Or,
    Nor,
    Xor,
}

impl GateOp {
    /// Evaluates the operator on concrete inputs.
    #[must_use]
    pub fn eval(self, left: bool, right: bool) -> bool {
        match self {
            Self::And => left && right,
            Self::Nand => !(left && right),
            Self::Or => left || right,
            Self::Nor => !(left || right),
            Self::Xor => left != right,
        }
    }
}

/// CNF ids of an encoded gate. A gate is either fully encoded or not at
/// all, so the three ids live together.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CnfTriple {
    pub left: i32,
    pub right: i32,
    pub value: i32,
}

/// An immutable gate: `(left, op, right) -> value`.
///
/// Operands are signed circuit ids, canonicalized so the smaller magnitude
/// sits on the left; signs travel with their operand. `value` is the
/// positive circuit id naming the gate's output.
#[derive(Debug, Clone)]
pub(crate) struct Gate {
    pub left: i32,
    pub right: i32,
    pub op: GateOp,
    pub value: i32,
    pub cnf: Option<CnfTriple>,
}

impl Gate {
    /// Builds a gate from already-canonicalized operands.
    pub fn new(left: i32, op: GateOp, right: i32, value: i32) -> Self {
        debug_assert!(left.unsigned_abs() <= right.unsigned_abs());
        debug_assert!(value > 0);
        Self {
            left,
            right,
            op,
            value,
            cnf: None,
        }
    }

    /// Orders two signed operands by magnitude. Only positions swap; the
    /// sign stays attached to its operand, which is what makes dedup
    /// sign-sensitive.
    pub fn canonical_operands(left: i32, right: i32) -> (i32, i32) {
        if left.unsigned_abs() <= right.unsigned_abs() {
            (left, right)
        } else {
            (right, left)
        }
    }

    /// Equality on the canonicalized operand pair and operator.
    pub fn matches(&self, left: i32, op: GateOp, right: i32) -> bool {
        self.left == left && self.op == op && self.right == right
    }

    pub fn is_encoded(&self) -> bool {
        self.cnf.is_some()
    }

    /// The Tseitin expansion of this gate over its CNF ids, as signed
    /// DIMACS literals. Must only be called once the gate is encoded.
    pub fn tseitin_clauses(&self) -> Vec<Vec<i32>> {
        let CnfTriple { left, right, value } = self.cnf.expect("gate is not encoded");
        let (l, r, v) = (left, right, value);
        match self.op {
            GateOp::And => vec![vec![-l, -r, v], vec![l, -v], vec![r, -v]],
            GateOp::Nand => vec![vec![-l, -r, -v], vec![l, v], vec![r, v]],
            GateOp::Or => vec![vec![l, r, -v], vec![-l, v], vec![-r, v]],
            GateOp::Nor => vec![vec![l, r, v], vec![-l, -v], vec![-r, -v]],
            GateOp::Xor => vec![
                vec![-l, -r, -v],
                vec![l, r, -v],
                vec![l, -r, v],
                vec![-l, r, v],
            ],
        }
    }
}
