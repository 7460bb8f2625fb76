//! Physics core
//!
//! The body/collider data model and the stepping loop. Built from scratch
//! on glam math, no external physics library.
//!
//! # Unit System
//!
//! **1 unit = 1 meter** (SI units throughout)
//!
//! - Distances in meters
//! - Velocities in m/s
//! - Accelerations in m/s²
//! - Mass in kg
//!
//! # Submodules
//!
//! - [`types`] - Core mathematical types re-exported from glam
//! - [`bounding`] - AABB/oriented-box colliders and narrow-phase tests
//! - [`body`] - Point-mass and rigid-body state, options, validation
//! - [`system`] - The stepping loop: integration, collision, resolution
//! - [`snapshot`] - Consistent read-only state for observers and solvers
//! - [`worker`] - Dedicated simulation thread with step-boundary handoff

pub mod body;
pub mod bounding;
pub mod snapshot;
pub mod system;
pub mod types;
pub mod worker;

// Re-export commonly used types at the physics module level
pub use body::{Body, BodyHandle, BodyKind, BodyOptions, ObjectOptions, PointMassOptions, RigidBodyOptions};
pub use bounding::{Aabb, BoxCollider, Collider, ContactInfo, test_intersection};
pub use snapshot::{ObjectSnapshot, WorldSnapshot};
pub use system::{PhysicsSystem, SimulationStopCondition};
pub use types::{Quat, Vec3};
pub use worker::{SimCommand, SimEvent, SimulationWorker};
