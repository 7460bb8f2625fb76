//! Interception solving
//!
//! Answers "at what time and point does an interceptor launched from a
//! fixed origin at a fixed speed reach a moving target". The target's
//! trajectory is predicted in closed form from a consistent snapshot
//! (ballistic arc under scaled gravity; drag is ignored for prediction),
//! and the scalar residual
//!
//! ```text
//! f(t) = |target_position(t) - origin| - speed * t
//! ```
//!
//! is driven to zero: a coarse sweep of the search horizon locates a sign
//! change, bisection shrinks the bracket, and Newton refines inside it.
//! The bisection pre-pass runs whenever the sweep finds a sign change, so
//! Newton never starts from an unbracketed guess.

use glam::DVec3;

use crate::physics::body::BodyHandle;
use crate::physics::snapshot::ObjectSnapshot;

use super::decision::{FailureReason, SolverDecision};
use super::one_unknown::OneUnknownSolver;

/// An interception query against a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterceptProblem {
    /// Body to intercept
    pub target: BodyHandle,
    /// Launch point of the interceptor
    pub origin: DVec3,
    /// Interceptor speed (m/s), assumed straight-line at full speed
    pub speed: f64,
    /// Search horizon in seconds
    pub t_max: f64,
}

impl InterceptProblem {
    /// Query with the default 10 second horizon.
    pub fn new(target: BodyHandle, origin: DVec3, speed: f64) -> Self {
        Self {
            target,
            origin,
            speed,
            t_max: 10.0,
        }
    }
}

/// A solved interception.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intercept {
    /// Seconds from the snapshot instant to interception
    pub time: f64,
    /// World-space interception point
    pub point: DVec3,
}

/// Closed-form target trajectory taken from a snapshot.
///
/// Static and frozen bodies hold position; everything else follows the
/// ballistic arc p(t) = p0 + v0 t + g_eff t²/2 with the body's gravity
/// scale applied.
#[derive(Debug, Clone, Copy)]
pub struct PredictedTrajectory {
    origin: DVec3,
    velocity: DVec3,
    acceleration: DVec3,
}

impl PredictedTrajectory {
    /// Builds the predicted trajectory of one body under the given global
    /// gravity.
    pub fn from_snapshot(body: &ObjectSnapshot, gravity: glam::Vec3) -> Self {
        if body.is_static || body.frozen {
            Self {
                origin: body.position.as_dvec3(),
                velocity: DVec3::ZERO,
                acceleration: DVec3::ZERO,
            }
        } else {
            Self {
                origin: body.position.as_dvec3(),
                velocity: body.velocity.as_dvec3(),
                acceleration: gravity.as_dvec3() * body.gravity_scale as f64,
            }
        }
    }

    /// Predicted position after `t` seconds.
    pub fn position_at(&self, t: f64) -> DVec3 {
        self.origin + self.velocity * t + self.acceleration * (0.5 * t * t)
    }
}

/// Finds the time and point at which two trajectories coincide.
#[derive(Debug, Clone, Copy)]
pub struct InterceptSolver {
    /// Scalar solver used for both the bisection pre-pass and the Newton
    /// refinement
    pub scalar: OneUnknownSolver,
    /// Number of intervals in the coarse sign-change sweep
    pub coarse_samples: u32,
}

impl Default for InterceptSolver {
    fn default() -> Self {
        Self {
            scalar: OneUnknownSolver::default(),
            coarse_samples: 64,
        }
    }
}

impl InterceptSolver {
    /// Solves an interception against a predicted target trajectory.
    ///
    /// Fails with `DivergedResidual` when the residual never changes sign
    /// across the horizon (the target is unreachable at this speed within
    /// `t_max`).
    pub fn solve(
        &self,
        trajectory: &PredictedTrajectory,
        origin: DVec3,
        speed: f64,
        t_max: f64,
    ) -> SolverDecision<Intercept> {
        let residual = |t: f64| trajectory.position_at(t).distance(origin) - speed * t;

        // Immediate coincidence: the interceptor starts on the target.
        let at_start = residual(0.0);
        if at_start.abs() < self.scalar.tolerance {
            return SolverDecision::converged(
                Intercept {
                    time: 0.0,
                    point: trajectory.position_at(0.0),
                },
                0,
                at_start.abs(),
            );
        }

        // Coarse sweep for a sign change.
        let samples = self.coarse_samples.max(1);
        let dt = t_max / samples as f64;
        let mut bracket = None;
        let mut prev_t = 0.0;
        let mut prev_f = at_start;
        for k in 1..=samples {
            let t = dt * k as f64;
            let f = residual(t);
            if f == 0.0 {
                return SolverDecision::converged(
                    Intercept {
                        time: t,
                        point: trajectory.position_at(t),
                    },
                    k,
                    0.0,
                );
            }
            if f.signum() != prev_f.signum() {
                bracket = Some((prev_t, t));
                break;
            }
            prev_t = t;
            prev_f = f;
        }

        let Some((low, high)) = bracket else {
            let best = prev_f.abs();
            return SolverDecision::failed(
                Intercept {
                    time: prev_t,
                    point: trajectory.position_at(prev_t),
                },
                samples,
                best,
                FailureReason::DivergedResidual,
            );
        };

        // Bisection shrinks the bracket, Newton polishes inside it.
        let coarse = self.scalar.solve_bracketed(residual, 0.0, low, high);
        let refined = self.scalar.solve(residual, 0.0, coarse.value);

        let (decision, iterations) = if refined.success
            && refined.value >= 0.0
            && refined.value <= t_max
        {
            (refined.clone(), coarse.iterations + refined.iterations)
        } else {
            (coarse.clone(), coarse.iterations + refined.iterations)
        };

        let time = decision.value;
        let point = trajectory.position_at(time);
        if decision.success {
            SolverDecision::converged(Intercept { time, point }, iterations, decision.residual)
        } else {
            SolverDecision::failed(
                Intercept { time, point },
                iterations,
                decision.residual,
                decision.reason.unwrap_or(FailureReason::DivergedResidual),
            )
        }
    }
}
