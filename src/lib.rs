//! Motion Lab Core
//!
//! A rigid-body and point-mass simulation library with collision
//! detection/resolution and a numerical root-solver framework for
//! trajectory queries such as interception.
//!
//! # Modules
//!
//! - [`physics`] - Bodies, colliders, the stepping loop, and the simulation worker thread
//! - [`solver`] - Scalar/vector root finders, interception, and problem routing
//! - [`error`] - Validation errors for body and simulation configuration
//!
//! # Example
//!
//! ```
//! use motion_lab_core::physics::{PhysicsSystem, PointMassOptions, Vec3};
//! use motion_lab_core::physics::body::{BodyOptions, ObjectOptions};
//! use motion_lab_core::solver::{InitialGuess, InterceptProblem, ProblemDescriptor, ProblemRouter};
//! use motion_lab_core::solver::router::as_intercept;
//! use glam::DVec3;
//!
//! // A target at x = 10 receding along +x at 5 m/s, no gravity
//! let mut system = PhysicsSystem::new(Vec3::ZERO);
//! let target = system
//!     .add_body(BodyOptions::PointMass(PointMassOptions {
//!         object: ObjectOptions {
//!             position: Vec3::new(10.0, 0.0, 0.0),
//!             velocity: Vec3::new(5.0, 0.0, 0.0),
//!             ..ObjectOptions::default()
//!         },
//!     }))
//!     .unwrap();
//!
//! // Ask when a 10 m/s interceptor launched from the origin reaches it
//! let snapshot = system.snapshot_world();
//! let router = ProblemRouter::new();
//! let decision = router.solve(
//!     &snapshot,
//!     &ProblemDescriptor::Intercept(InterceptProblem::new(target, DVec3::ZERO, 10.0)),
//!     InitialGuess::Scalar(0.0),
//! );
//! assert!(decision.success);
//! let (time, _point) = as_intercept(&decision.value).unwrap();
//! assert!((time - 2.0).abs() < 1e-3);
//! ```

pub mod error;
pub mod physics;
pub mod solver;

// Re-export the most commonly used types at crate level for convenience
pub use error::ConfigError;
pub use physics::{
    Body, BodyHandle, BodyOptions, PhysicsSystem, SimulationStopCondition, SimulationWorker,
    WorldSnapshot,
};
pub use solver::{ProblemRouter, SolverDecision};
