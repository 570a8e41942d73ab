//! # gatesat-base
//!
//! Core types shared by the gatesat crates.
//!
//! This crate provides the foundational building blocks used by both the
//! circuit front-end and the bundled SAT backend:
//!
//! - **Literals**: packed variable/literal types in the CNF namespace
//! - **Backend Contract**: the `SatBackend` trait every solver implements
//! - **Error Types**: unified error handling across the workspace

pub mod error;
pub mod lit;
pub mod traits;

pub use error::{Error, Result};
pub use lit::{Lit, Var};
pub use traits::{SatBackend, SolveStatus};
