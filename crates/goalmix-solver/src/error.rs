use std::time::Duration;

use thiserror::Error;

/// Failures that prevent the solver from reaching any verdict
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Solver unavailable: {0}")]
    Unavailable(String),
    #[error("Solver did not finish within {0:?}")]
    Timeout(Duration),
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),
}
