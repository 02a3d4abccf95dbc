mod problem;
mod simplex;
mod solution;

pub use problem::{Constraint, LpProblem, ObjectiveFunction, ProblemError};
pub use simplex::{DEFAULT_MAX_ITERATIONS, Optimality, SimplexEngine, Solver};
pub use solution::{SolutionReport, SolutionStatus};
