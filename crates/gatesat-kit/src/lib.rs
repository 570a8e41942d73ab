//! # gatesat-kit
//!
//! A circuit-level front-end to a SAT solver.
//!
//! Clients build a combinational model from two-input gates (AND, NAND,
//! OR, NOR, XOR) over signed circuit ids, register assertions and
//! assumptions, and solve. The kit compiles the reachable part of the
//! circuit into CNF through the Tseitin transformation, drives the backend,
//! and reconstructs a per-variable solution — including for gates that were
//! never encoded because no assertion reached them.
//!
//! # Example
//!
//! ```
//! use gatesat_kit::{Model, SolveStatus};
//!
//! let mut m = Model::new();
//! let a = m.var();
//! let b = m.var();
//! let both = m.and(a, b);
//!
//! m.add_assert(both);
//!
//! assert_eq!(m.solve().unwrap(), SolveStatus::Sat);
//! assert!(m.val(a).unwrap() && m.val(b).unwrap());
//! ```

pub mod gadgets;
pub mod gate;
pub mod model;

mod graph;
mod vars;

// Re-export the shared surface
pub use gatesat_base::{Error, Lit, Result, SatBackend, SolveStatus, Var};

pub use gadgets::Bus;
pub use gate::GateOp;
pub use model::{Model, ModelConfig, ModelStats};
