//! Numerical root finding
//!
//! Iterative solvers for scalar and vector root problems, the ballistic
//! interception solver built on top of them, and the router that maps
//! tagged problem descriptors to registered solver instances.
//!
//! All solvers work in `f64` against snapshot data; none of them touch
//! live physics state. Failures are reported as values on
//! [`SolverDecision`], never as panics or errors.
//!
//! # Submodules
//!
//! - [`decision`] - Solver outcome type and failure reasons
//! - [`one_unknown`] - Newton iteration and bisection for one scalar
//! - [`vector_root`] - Multivariate Newton with finite-difference Jacobian
//! - [`intercept`] - Constant-speed interception of a predicted trajectory
//! - [`router`] - Tag registry dispatching problems to solvers

pub mod decision;
pub mod intercept;
pub mod one_unknown;
pub mod router;
pub mod vector_root;

// Re-export commonly used types at the solver module level
pub use decision::{FailureReason, Solution, SolverDecision};
pub use intercept::{Intercept, InterceptProblem, InterceptSolver, PredictedTrajectory};
pub use one_unknown::OneUnknownSolver;
pub use router::{InitialGuess, ProblemDescriptor, ProblemRouter, RegisteredSolver};
pub use vector_root::VectorRootSolver;
