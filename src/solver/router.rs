//! Problem routing
//!
//! Maps a typed problem descriptor to the solver registered for its tag
//! and runs it against a consistent snapshot. The router owns nothing but
//! the tag registry; it never mutates physics state, and every residual
//! it builds closes over snapshot data rather than live bodies.

use std::collections::HashMap;

use glam::DVec3;

use crate::physics::snapshot::WorldSnapshot;

use super::decision::{FailureReason, Solution, SolverDecision};
use super::intercept::{InterceptProblem, InterceptSolver, PredictedTrajectory};
use super::one_unknown::OneUnknownSolver;
use super::vector_root::VectorRootSolver;

/// Scalar residual closed over whatever the caller captured.
pub type ScalarResidual = Box<dyn Fn(f64) -> f64 + Send + Sync>;
/// Vector residual for square systems.
pub type VectorResidual = Box<dyn Fn(&[f64]) -> Vec<f64> + Send + Sync>;

/// A problem submitted to the router.
pub enum ProblemDescriptor {
    /// Find the time and point at which an interceptor reaches a body
    Intercept(InterceptProblem),
    /// Solve f(x) = target for a scalar x
    GenericRoot {
        /// The function whose root is sought
        residual: ScalarResidual,
        /// Right-hand side the function must reach
        target: f64,
    },
    /// Solve F(x) = 0 for a vector x
    GenericVectorRoot {
        /// The residual; must return one component per unknown
        residual: VectorResidual,
    },
    /// A scalar problem under a caller-chosen tag; solvable only when a
    /// solver has been registered for that tag
    Custom {
        /// Registry key to route by
        tag: String,
        /// The function whose root is sought
        residual: ScalarResidual,
        /// Right-hand side the function must reach
        target: f64,
    },
}

impl ProblemDescriptor {
    /// The registry tag this problem routes by.
    pub fn tag(&self) -> &str {
        match self {
            ProblemDescriptor::Intercept(_) => "intercept",
            ProblemDescriptor::GenericRoot { .. } => "generic-root",
            ProblemDescriptor::GenericVectorRoot { .. } => "generic-vector-root",
            ProblemDescriptor::Custom { tag, .. } => tag,
        }
    }
}

/// Initial guess handed to `solve`, matching the problem's unknown shape.
#[derive(Debug, Clone, PartialEq)]
pub enum InitialGuess {
    /// Guess for a scalar unknown
    Scalar(f64),
    /// Guess for a vector unknown
    Vector(Vec<f64>),
}

impl InitialGuess {
    fn echo(&self) -> Solution {
        match self {
            InitialGuess::Scalar(x) => Solution::Scalar(*x),
            InitialGuess::Vector(v) => Solution::Vector(v.clone()),
        }
    }
}

/// A solver instance held by the registry.
#[derive(Debug, Clone, Copy)]
pub enum RegisteredSolver {
    /// Scalar Newton/bisection solver
    Scalar(OneUnknownSolver),
    /// Multivariate Newton solver
    Vector(VectorRootSolver),
    /// Interception solver
    Intercept(InterceptSolver),
}

/// Stateless dispatcher from problem tags to solver instances.
pub struct ProblemRouter {
    registry: HashMap<String, RegisteredSolver>,
}

impl Default for ProblemRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProblemRouter {
    /// Router with the fixed default mapping: "intercept",
    /// "generic-root", and "generic-vector-root".
    pub fn new() -> Self {
        let mut registry = HashMap::new();
        registry.insert(
            "intercept".to_string(),
            RegisteredSolver::Intercept(InterceptSolver::default()),
        );
        registry.insert(
            "generic-root".to_string(),
            RegisteredSolver::Scalar(OneUnknownSolver::default()),
        );
        registry.insert(
            "generic-vector-root".to_string(),
            RegisteredSolver::Vector(VectorRootSolver::default()),
        );
        Self { registry }
    }

    /// Registers (or replaces) a solver for a tag.
    pub fn register(&mut self, tag: impl Into<String>, solver: RegisteredSolver) {
        self.registry.insert(tag.into(), solver);
    }

    /// Looks up the solver registered for a tag.
    pub fn route(&self, tag: &str) -> Option<&RegisteredSolver> {
        self.registry.get(tag)
    }

    /// Routes the problem and runs the solver against the snapshot.
    ///
    /// Never returns `Err`: unroutable problems (unregistered tag, a
    /// solver kind that cannot take the problem, an intercept target the
    /// snapshot does not contain, a guess of the wrong shape) come back as
    /// `SolverDecision { success: false, reason: UnknownProblemType }`
    /// echoing the initial guess.
    pub fn solve(
        &self,
        snapshot: &WorldSnapshot,
        problem: &ProblemDescriptor,
        guess: InitialGuess,
    ) -> SolverDecision<Solution> {
        let guess = &guess;
        let Some(solver) = self.route(problem.tag()) else {
            return unroutable(guess);
        };

        match (solver, problem) {
            (RegisteredSolver::Intercept(solver), ProblemDescriptor::Intercept(query)) => {
                let Some(target) = snapshot.body(query.target) else {
                    return unroutable(guess);
                };
                let trajectory = PredictedTrajectory::from_snapshot(target, snapshot.gravity);
                solver
                    .solve(&trajectory, query.origin, query.speed, query.t_max)
                    .map(|hit| Solution::Intercept {
                        time: hit.time,
                        point: hit.point,
                    })
            }
            (
                RegisteredSolver::Scalar(solver),
                ProblemDescriptor::GenericRoot { residual, target }
                | ProblemDescriptor::Custom {
                    residual, target, ..
                },
            ) => {
                let InitialGuess::Scalar(x0) = guess else {
                    return unroutable(guess);
                };
                solver.solve(residual, *target, *x0).map(Solution::Scalar)
            }
            (RegisteredSolver::Vector(solver), ProblemDescriptor::GenericVectorRoot { residual }) => {
                let InitialGuess::Vector(x0) = guess else {
                    return unroutable(guess);
                };
                solver.solve(residual, x0).map(Solution::Vector)
            }
            _ => unroutable(guess),
        }
    }

    /// Convenience wrapper for interception queries.
    pub fn solve_intercept(
        &self,
        snapshot: &WorldSnapshot,
        query: InterceptProblem,
    ) -> SolverDecision<Solution> {
        self.solve(
            snapshot,
            &ProblemDescriptor::Intercept(query),
            InitialGuess::Scalar(0.0),
        )
    }
}

fn unroutable(guess: &InitialGuess) -> SolverDecision<Solution> {
    SolverDecision::failed(
        guess.echo(),
        0,
        f64::INFINITY,
        FailureReason::UnknownProblemType,
    )
}

/// Extracts the intercept fields from a routed solution, if present.
pub fn as_intercept(solution: &Solution) -> Option<(f64, DVec3)> {
    match solution {
        Solution::Intercept { time, point } => Some((*time, *point)),
        _ => None,
    }
}
