//! # gatesat-cdcl
//!
//! The bundled SAT backend for gatesat.
//!
//! Implements:
//! - Watched-literal Boolean Constraint Propagation
//! - Depth-first search with chronological backtracking
//! - Per-solve assumptions placed below the search
//! - Time and conflict budgets that surface as `Unknown`
//!
//! The solver is deliberately small: it has no clause learning, deletion, or
//! restarts. It exists to satisfy the [`SatBackend`] contract out of the
//! box; any other implementation of the contract can replace it.
//!
//! [`SatBackend`]: gatesat_base::SatBackend

pub mod bcp;
pub mod solver;

pub use solver::{CdclConfig, CdclSolver, SolverStats};
