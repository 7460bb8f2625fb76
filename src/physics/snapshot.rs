//! Point-in-time simulation state
//!
//! Snapshots are the only read surface the core exposes: the renderer,
//! inspector widgets, the external scene serializer, and every solver
//! residual all consume this shape instead of holding references into
//! live body state. A snapshot is taken either before or after a complete
//! step, never mid-step.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::physics::body::{Body, BodyHandle, BodyKind};

/// Read-only state of one body at a consistent instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    /// Handle of the body this snapshot was taken from
    pub handle: BodyHandle,
    /// Simulation time at capture (seconds)
    pub time: f64,
    /// World position
    pub position: Vec3,
    /// Linear velocity
    pub velocity: Vec3,
    /// Orientation; identity for point masses
    pub orientation: Quat,
    /// Angular velocity; zero for point masses
    pub angular_velocity: Vec3,
    /// Mass (kg)
    pub mass: f32,
    /// Multiplier on global gravity, needed for trajectory prediction
    pub gravity_scale: f32,
    /// Static bodies never move
    pub is_static: bool,
    /// Set when the body was frozen after producing non-finite state
    pub frozen: bool,
    /// Reason the body was frozen, if it was
    pub diagnostic: Option<String>,
}

impl ObjectSnapshot {
    pub(crate) fn capture(body: &Body, time: f64) -> Self {
        let (orientation, angular_velocity) = match &body.kind {
            BodyKind::PointMass => (Quat::IDENTITY, Vec3::ZERO),
            BodyKind::RigidBody {
                orientation,
                angular_velocity,
                ..
            } => (*orientation, *angular_velocity),
        };
        Self {
            handle: body.handle,
            time,
            position: body.position,
            velocity: body.velocity,
            orientation,
            angular_velocity,
            mass: body.mass,
            gravity_scale: body.gravity_scale,
            is_static: body.is_static,
            frozen: body.frozen,
            diagnostic: body.diagnostic.clone(),
        }
    }
}

/// Snapshot of every body in the system at one instant, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Simulation time at capture (seconds)
    pub time: f64,
    /// Number of completed steps at capture
    pub steps: u64,
    /// Global gravity at capture
    pub gravity: Vec3,
    /// Per-body snapshots in body insertion order
    pub bodies: Vec<ObjectSnapshot>,
}

impl WorldSnapshot {
    /// Finds the snapshot of a specific body.
    pub fn body(&self, handle: BodyHandle) -> Option<&ObjectSnapshot> {
        self.bodies.iter().find(|s| s.handle == handle)
    }
}
