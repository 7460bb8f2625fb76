//! Solver Tests - Root Finding, Interception, Routing
//!
//! Integration tests exercising the scalar and vector solvers through the
//! router, including interception queries against snapshots taken from a
//! live physics system.

use glam::{DVec3, Vec3};
use motion_lab_core::physics::body::{BodyOptions, ObjectOptions, PointMassOptions};
use motion_lab_core::physics::{BodyHandle, PhysicsSystem};
use motion_lab_core::solver::router::as_intercept;
use motion_lab_core::solver::{
    FailureReason, InitialGuess, InterceptProblem, OneUnknownSolver, ProblemDescriptor,
    ProblemRouter, RegisteredSolver, Solution, VectorRootSolver,
};

fn moving_target(system: &mut PhysicsSystem, position: Vec3, velocity: Vec3) -> BodyHandle {
    system
        .add_body(BodyOptions::PointMass(PointMassOptions {
            object: ObjectOptions {
                position,
                velocity,
                ..ObjectOptions::default()
            },
        }))
        .expect("valid target options")
}

// ============================================================================
// Scalar Root Finding
// ============================================================================

#[test]
fn test_newton_finds_quadratic_root_within_budget() {
    let solver = OneUnknownSolver::default();
    let decision = solver.solve(|x| x * x - 4.0, 0.0, 3.0);
    assert!(decision.success);
    assert!((decision.value - 2.0).abs() < 1e-6);
    assert!(
        decision.iterations < 20,
        "quadratic from a nearby guess should converge fast, took {}",
        decision.iterations
    );
    assert!(decision.reason.is_none());
}

#[test]
fn test_rootless_function_reports_failure_not_panic() {
    let solver = OneUnknownSolver::default();
    // x^2 + 1 has no real root; the solver must say so in the decision
    let decision = solver.solve(|x| x * x + 1.0, 0.0, 3.0);
    assert!(!decision.success);
    assert!(decision.reason.is_some());
    assert!(decision.value.is_finite());
}

#[test]
fn test_solver_respects_custom_tolerance() {
    let loose = OneUnknownSolver::with_tolerance(1e-2);
    let tight = OneUnknownSolver::with_tolerance(1e-10);
    let f = |x: f64| x * x * x - 7.0;
    let a = loose.solve(f, 0.0, 2.0);
    let b = tight.solve(f, 0.0, 2.0);
    assert!(a.success && b.success);
    assert!(
        a.iterations <= b.iterations,
        "tighter tolerance cannot take fewer iterations"
    );
    assert!((b.value - 7.0f64.cbrt()).abs() < 1e-9);
}

// ============================================================================
// Vector Root Finding
// ============================================================================

#[test]
fn test_vector_solver_finds_circle_line_intersection() {
    let solver = VectorRootSolver::default();
    // x^2 + y^2 = 25 and x + y = 7 meet at (3, 4) and (4, 3)
    let decision = solver.solve(
        |v| vec![v[0] * v[0] + v[1] * v[1] - 25.0, v[0] + v[1] - 7.0],
        &[1.0, 5.0],
    );
    assert!(decision.success);
    let (x, y) = (decision.value[0], decision.value[1]);
    assert!((x * x + y * y - 25.0).abs() < 1e-6);
    assert!((x + y - 7.0).abs() < 1e-6);
}

#[test]
fn test_vector_solver_reports_singular_jacobian() {
    let solver = VectorRootSolver {
        damping: 0.0,
        ..VectorRootSolver::default()
    };
    // Both components depend on the same combination: rank-1 Jacobian
    let decision = solver.solve(|v| vec![v[0] + v[1] - 1.0, 2.0 * (v[0] + v[1]) - 2.0], &[5.0, 5.0]);
    assert!(!decision.success);
    assert_eq!(decision.reason, Some(FailureReason::SingularDerivative));
}

// ============================================================================
// Interception Through The Router
// ============================================================================

#[test]
fn test_intercept_stationary_target() {
    let mut system = PhysicsSystem::new(Vec3::ZERO);
    let target = moving_target(&mut system, Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO);

    let router = ProblemRouter::new();
    let decision = router.solve(
        &system.snapshot_world(),
        &ProblemDescriptor::Intercept(InterceptProblem::new(target, DVec3::ZERO, 5.0)),
        InitialGuess::Scalar(0.0),
    );

    assert!(decision.success);
    let (time, point) = as_intercept(&decision.value).expect("intercept solution shape");
    assert!((time - 2.0).abs() < 1e-3, "10 m at 5 m/s is 2 s, got {time}");
    assert!(point.distance(DVec3::new(10.0, 0.0, 0.0)) < 1e-3);
}

#[test]
fn test_intercept_falling_target_under_gravity() {
    let mut system = PhysicsSystem::new(Vec3::new(0.0, -10.0, 0.0));
    let target = moving_target(&mut system, Vec3::new(0.0, 100.0, 0.0), Vec3::ZERO);

    let router = ProblemRouter::new();
    let decision = router.solve(
        &system.snapshot_world(),
        &ProblemDescriptor::Intercept(InterceptProblem::new(target, DVec3::ZERO, 40.0)),
        InitialGuess::Scalar(0.0),
    );

    assert!(decision.success);
    let (time, point) = as_intercept(&decision.value).expect("intercept solution shape");
    // Height 100 - 5 t^2 must equal the reachable radius 40 t: t = 2
    assert!((time - 2.0).abs() < 1e-3, "expected t = 2, got {time}");
    assert!((point.y - 80.0).abs() < 1e-2);
}

#[test]
fn test_prediction_uses_snapshot_not_live_state() {
    let mut system = PhysicsSystem::new(Vec3::ZERO);
    let target = moving_target(&mut system, Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO);
    let snapshot = system.snapshot_world();

    // Mutating the live system after the snapshot must not change the answer
    system
        .body_mut(target)
        .expect("target exists")
        .velocity = Vec3::new(100.0, 0.0, 0.0);

    let router = ProblemRouter::new();
    let decision = router.solve(
        &snapshot,
        &ProblemDescriptor::Intercept(InterceptProblem::new(target, DVec3::ZERO, 5.0)),
        InitialGuess::Scalar(0.0),
    );
    assert!(decision.success);
    let (time, _) = as_intercept(&decision.value).expect("intercept solution shape");
    assert!((time - 2.0).abs() < 1e-3);
}

#[test]
fn test_unreachable_target_fails_with_diverged_residual() {
    let mut system = PhysicsSystem::new(Vec3::ZERO);
    // Receding at 8 m/s, interceptor capped at 5 m/s: never catches up
    let target = moving_target(
        &mut system,
        Vec3::new(5.0, 0.0, 0.0),
        Vec3::new(8.0, 0.0, 0.0),
    );

    let router = ProblemRouter::new();
    let decision = router.solve(
        &system.snapshot_world(),
        &ProblemDescriptor::Intercept(InterceptProblem::new(target, DVec3::ZERO, 5.0)),
        InitialGuess::Scalar(0.0),
    );
    assert!(!decision.success);
    assert_eq!(decision.reason, Some(FailureReason::DivergedResidual));
}

// ============================================================================
// Routing
// ============================================================================

#[test]
fn test_router_solves_generic_problems_by_tag() {
    let router = ProblemRouter::new();
    let snapshot = PhysicsSystem::new(Vec3::ZERO).snapshot_world();

    let decision = router.solve(
        &snapshot,
        &ProblemDescriptor::GenericRoot {
            residual: Box::new(|x| x.exp() - 3.0),
            target: 0.0,
        },
        InitialGuess::Scalar(1.0),
    );
    assert!(decision.success);
    match decision.value {
        Solution::Scalar(x) => assert!((x - 3.0f64.ln()).abs() < 1e-6),
        other => panic!("expected scalar solution, got {other:?}"),
    }
}

#[test]
fn test_unknown_tag_and_missing_target_report_unknown_problem_type() {
    let router = ProblemRouter::new();
    let snapshot = PhysicsSystem::new(Vec3::ZERO).snapshot_world();

    let unknown_tag = router.solve(
        &snapshot,
        &ProblemDescriptor::Custom {
            tag: "time-of-closest-approach".to_string(),
            residual: Box::new(|x| x),
            target: 0.0,
        },
        InitialGuess::Scalar(0.0),
    );
    assert!(!unknown_tag.success);
    assert_eq!(unknown_tag.reason, Some(FailureReason::UnknownProblemType));

    // Registered tag, but the snapshot has no such body
    let missing_body = router.solve(
        &snapshot,
        &ProblemDescriptor::Intercept(InterceptProblem::new(
            BodyHandle::new(999),
            DVec3::ZERO,
            5.0,
        )),
        InitialGuess::Scalar(0.0),
    );
    assert!(!missing_body.success);
    assert_eq!(missing_body.reason, Some(FailureReason::UnknownProblemType));
}

#[test]
fn test_registering_a_solver_enables_a_custom_tag() {
    let mut router = ProblemRouter::new();
    router.register(
        "time-of-closest-approach",
        RegisteredSolver::Scalar(OneUnknownSolver::default()),
    );
    let snapshot = PhysicsSystem::new(Vec3::ZERO).snapshot_world();

    let decision = router.solve(
        &snapshot,
        &ProblemDescriptor::Custom {
            tag: "time-of-closest-approach".to_string(),
            residual: Box::new(|t| 2.0 * t - 6.0),
            target: 0.0,
        },
        InitialGuess::Scalar(0.0),
    );
    assert!(decision.success);
    assert_eq!(decision.value, Solution::Scalar(3.0));
}
