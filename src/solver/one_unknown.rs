//! Scalar root finding
//!
//! Newton's method on f64 with a central-finite-difference derivative when
//! no analytic derivative is supplied, plus a plain bisection loop for
//! callers that already hold a sign-changing bracket (the intercept
//! pre-pass uses it before handing the bracket to Newton).
//!
//! The finite-difference step size is part of the configuration: near
//! singular points the default matters, so tests and callers can tune it.

use super::decision::{FailureReason, SolverDecision};

/// Solves the scalar equation f(x) = target for x.
#[derive(Debug, Clone, Copy)]
pub struct OneUnknownSolver {
    /// Convergence tolerance on |f(x) - target| and on |Δx|
    pub tolerance: f64,
    /// Iteration budget
    pub max_iterations: u32,
    /// Step size for the central finite-difference derivative
    pub fd_step: f64,
    /// Derivatives with magnitude below this are treated as singular
    pub derivative_epsilon: f64,
    /// Residual growth beyond this factor over its starting magnitude is
    /// declared divergence
    pub divergence_factor: f64,
}

impl Default for OneUnknownSolver {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 30,
            fd_step: 1e-6,
            derivative_epsilon: 1e-12,
            divergence_factor: 1e6,
        }
    }
}

impl OneUnknownSolver {
    /// Solver with a specific tolerance, other settings default.
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Default::default()
        }
    }

    /// Newton iteration from an initial guess, derivative estimated by
    /// central finite difference.
    ///
    /// Converges when |f(x) - target| < tolerance or the update shrinks
    /// below tolerance; fails with `SingularDerivative` when |f'| collapses,
    /// `DivergedResidual` when the iterate goes non-finite or the residual
    /// blows up, `MaxIterationsExceeded` at the budget.
    pub fn solve(
        &self,
        f: impl Fn(f64) -> f64,
        target: f64,
        initial_guess: f64,
    ) -> SolverDecision<f64> {
        self.solve_with_derivative(&f, |x| self.central_difference(&f, x), target, initial_guess)
    }

    /// Newton iteration with a caller-supplied analytic derivative.
    pub fn solve_with_derivative(
        &self,
        f: impl Fn(f64) -> f64,
        df: impl Fn(f64) -> f64,
        target: f64,
        initial_guess: f64,
    ) -> SolverDecision<f64> {
        let mut x = initial_guess;
        let mut residual = f(x) - target;
        let initial_magnitude = residual.abs().max(1.0);

        for iteration in 0..self.max_iterations {
            if residual.abs() < self.tolerance {
                return SolverDecision::converged(x, iteration, residual.abs());
            }

            let derivative = df(x);
            if !derivative.is_finite() || derivative.abs() < self.derivative_epsilon {
                return SolverDecision::failed(
                    x,
                    iteration,
                    residual.abs(),
                    FailureReason::SingularDerivative,
                );
            }

            let step = residual / derivative;
            let next = x - step;
            let next_residual = f(next) - target;

            if !next.is_finite()
                || !next_residual.is_finite()
                || next_residual.abs() > initial_magnitude * self.divergence_factor
            {
                return SolverDecision::failed(
                    x,
                    iteration + 1,
                    residual.abs(),
                    FailureReason::DivergedResidual,
                );
            }

            x = next;
            residual = next_residual;

            if step.abs() < self.tolerance {
                return SolverDecision::converged(x, iteration + 1, residual.abs());
            }
        }

        if residual.abs() < self.tolerance {
            SolverDecision::converged(x, self.max_iterations, residual.abs())
        } else {
            SolverDecision::failed(
                x,
                self.max_iterations,
                residual.abs(),
                FailureReason::MaxIterationsExceeded,
            )
        }
    }

    /// Bisection on a bracket where f(x) - target changes sign.
    ///
    /// Robust but linear: halves the bracket each iteration, so it is used
    /// as a pre-pass to hand Newton a good starting point rather than as
    /// the primary method.
    pub fn solve_bracketed(
        &self,
        f: impl Fn(f64) -> f64,
        target: f64,
        mut low: f64,
        mut high: f64,
    ) -> SolverDecision<f64> {
        let mut f_low = f(low) - target;
        let f_high = f(high) - target;

        if f_low == 0.0 {
            return SolverDecision::converged(low, 0, 0.0);
        }
        if f_high == 0.0 {
            return SolverDecision::converged(high, 0, 0.0);
        }
        if f_low.signum() == f_high.signum() {
            // Not a bracket; bisection has nothing to go on.
            return SolverDecision::failed(
                low,
                0,
                f_low.abs().min(f_high.abs()),
                FailureReason::DivergedResidual,
            );
        }

        let mut mid = low;
        let mut f_mid = f_low;
        for iteration in 0..self.max_iterations {
            mid = (low + high) * 0.5;
            f_mid = f(mid) - target;

            if f_mid.abs() < self.tolerance || (high - low).abs() * 0.5 < self.tolerance {
                return SolverDecision::converged(mid, iteration + 1, f_mid.abs());
            }

            if f_mid.signum() == f_low.signum() {
                low = mid;
                f_low = f_mid;
            } else {
                high = mid;
            }
        }

        SolverDecision::failed(
            mid,
            self.max_iterations,
            f_mid.abs(),
            FailureReason::MaxIterationsExceeded,
        )
    }

    fn central_difference(&self, f: &impl Fn(f64) -> f64, x: f64) -> f64 {
        let h = self.fd_step;
        (f(x + h) - f(x - h)) / (2.0 * h)
    }
}
