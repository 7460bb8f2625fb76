//! Solver outcomes
//!
//! Every solver reports through a [`SolverDecision`] value rather than an
//! error type: "no solution found" is an ordinary outcome the UI presents,
//! not exceptional control flow.

/// Why a solve came back unsuccessful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The iteration budget ran out before convergence
    MaxIterationsExceeded,
    /// The derivative/Jacobian degenerated and no fallback recovered it
    SingularDerivative,
    /// The iterate or residual went non-finite or grew without bound
    DivergedResidual,
    /// No solver is registered for the requested problem tag
    UnknownProblemType,
}

/// Outcome record of a solver run.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverDecision<T> {
    /// True when the residual converged within tolerance
    pub success: bool,
    /// Best value found (the solution on success, the last iterate otherwise)
    pub value: T,
    /// Iterations consumed
    pub iterations: u32,
    /// Final residual magnitude
    pub residual: f64,
    /// Failure reason; `None` exactly when `success` is true
    pub reason: Option<FailureReason>,
}

impl<T> SolverDecision<T> {
    /// A converged decision.
    pub fn converged(value: T, iterations: u32, residual: f64) -> Self {
        Self {
            success: true,
            value,
            iterations,
            residual,
            reason: None,
        }
    }

    /// A failed decision carrying the best iterate seen.
    pub fn failed(value: T, iterations: u32, residual: f64, reason: FailureReason) -> Self {
        Self {
            success: false,
            value,
            iterations,
            residual,
            reason: Some(reason),
        }
    }

    /// Maps the solution value, keeping the outcome fields.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SolverDecision<U> {
        SolverDecision {
            success: self.success,
            value: f(self.value),
            iterations: self.iterations,
            residual: self.residual,
            reason: self.reason,
        }
    }
}

/// Type-erased solution value returned by the problem router.
#[derive(Debug, Clone, PartialEq)]
pub enum Solution {
    /// Scalar root
    Scalar(f64),
    /// Vector root
    Vector(Vec<f64>),
    /// Intercept time and point
    Intercept {
        /// Time of interception (seconds from the snapshot instant)
        time: f64,
        /// World-space interception point
        point: glam::DVec3,
    },
}
