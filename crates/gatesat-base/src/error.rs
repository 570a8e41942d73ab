//! Unified error types for gatesat.

use thiserror::Error;

/// The main error type for gatesat operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A value was requested but the last solve did not return Sat.
    #[error("model is not satisfied; solve() must return Sat first")]
    NotSatisfied,

    /// The circuit variable has no value in the current solution.
    ///
    /// After a successful solve this means the variable was reachable from
    /// neither the assertion closure nor the solution-extension closure.
    #[error("circuit variable {0} has no value in the current solution")]
    NoValue(i32),

    /// Failure propagated from the SAT backend.
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
