mod error;
mod problem;
mod solution;
mod solver;

pub use error::SolverError;
pub use problem::{Constraint, ConstraintOp, LpProblem, Objective};
pub use solution::{Analysis, ConstraintActivity, ShadowPrice, Solution, SolutionStatus};
pub use solver::Solver;
