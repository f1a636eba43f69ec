use goalmix_solver::SolverError;
use thiserror::Error;

/// A slider parameter that cannot be used
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Unknown parameter: {0}")]
    UnknownField(String),
    #[error("{field} = {value} is outside the allowed range {min}..={max}")]
    OutOfRange { field: String, value: f64, min: f64, max: f64 },
    #[error("{field} is not a finite number")]
    NonFinite { field: String },
}

/// A production model that cannot be turned into a linear program
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Model has no {0}")]
    Empty(&'static str),
    #[error("Duplicate {kind} name: {name}")]
    DuplicateName { kind: &'static str, name: String },
    #[error("Work center {work_center} has no processing time for product {product}")]
    MissingProcessingTime { work_center: String, product: String },
    #[error("Work center {work_center} lists a processing time for unknown product {product}")]
    UnknownProduct { work_center: String, product: String },
    #[error("{what} must not be negative (got {value})")]
    NegativeValue { what: String, value: f64 },
    #[error("{what} is not a finite number")]
    NonFinite { what: String },
    #[error("Work center {0} must have a positive capacity")]
    NonPositiveCapacity(String),
}

/// Everything that can go wrong between parameters and a production plan
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("Invalid parameter: {0}")]
    Parameter(#[from] ParameterError),
    #[error("Invalid model: {0}")]
    Model(#[from] ModelError),
    #[error("Model is infeasible: no production plan satisfies every constraint")]
    Infeasible,
    #[error("Model is unbounded: throughput can grow without limit")]
    Unbounded,
    #[error("Solver stopped without a verdict: {0}")]
    NotSolved(String),
    #[error(transparent)]
    Solver(#[from] SolverError),
}
