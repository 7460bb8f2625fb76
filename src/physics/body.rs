//! Physics bodies
//!
//! Point masses and rigid bodies share one state container with an
//! enum-tagged kind, rather than a trait-object hierarchy: the set of body
//! kinds is small and closed, and the stepping loop wants plain data it
//! can iterate in insertion order.
//!
//! Forces come in two flavors, mirroring how the editor drives the core:
//! named persistent forces (`set_force("Gravity", ..)` stays applied every
//! step until replaced or cleared) and a transient accumulator
//! (`apply_force`) that the system clears at the end of each step.

use std::collections::BTreeMap;

use glam::{Quat, Vec3};

use crate::error::ConfigError;
use crate::physics::bounding::{Aabb, Collider};

/// Stable identifier for a body inside a [`crate::physics::PhysicsSystem`].
///
/// Handles are minted monotonically and never reused, so a stale handle
/// after removal simply resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct BodyHandle(u64);

impl BodyHandle {
    /// Wraps a raw handle value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw handle value.
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

/// Options shared by every body kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectOptions {
    /// Initial world position (meters)
    pub position: Vec3,
    /// Initial velocity (m/s)
    pub velocity: Vec3,
    /// Mass (kg), strictly positive
    pub mass: f32,
    /// Linear drag coefficient; the per-step drag force is `-drag * v`
    pub drag: f32,
    /// Multiplier on the system's global gravity (1.0 = full gravity)
    pub gravity_scale: f32,
    /// Static bodies never integrate and have zero inverse mass
    pub is_static: bool,
    /// Bounciness in [0, 1]; contact pairs combine with `min`
    pub restitution: f32,
    /// Coulomb friction coefficient, >= 0; pairs combine geometrically
    pub friction: f32,
}

impl Default for ObjectOptions {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            mass: 1.0,
            drag: 0.0,
            gravity_scale: 1.0,
            is_static: false,
            restitution: 0.0,
            friction: 0.0,
        }
    }
}

impl ObjectOptions {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.mass > 0.0) || !self.mass.is_finite() {
            return Err(ConfigError::InvalidMass(self.mass));
        }
        if !self.position.is_finite() {
            return Err(ConfigError::NonFinite { field: "position" });
        }
        if !self.velocity.is_finite() {
            return Err(ConfigError::NonFinite { field: "velocity" });
        }
        if self.drag < 0.0 {
            return Err(ConfigError::NegativeDrag(self.drag));
        }
        if !self.gravity_scale.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "gravity_scale",
            });
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(ConfigError::RestitutionOutOfRange(self.restitution));
        }
        if self.friction < 0.0 {
            return Err(ConfigError::NegativeFriction(self.friction));
        }
        Ok(())
    }
}

/// Options for a point mass: just the shared fields.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointMassOptions {
    /// Shared body fields
    pub object: ObjectOptions,
}

/// Options for a rigid body: shared fields plus rotational state and a
/// collider in body-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidBodyOptions {
    /// Shared body fields
    pub object: ObjectOptions,
    /// Initial orientation (normalized on creation)
    pub orientation: Quat,
    /// Initial angular velocity (rad/s, world axes)
    pub angular_velocity: Vec3,
    /// Principal diagonal of the inertia tensor (kg*m^2)
    pub inertia: Vec3,
    /// Collider in body-local space
    pub collider: Collider,
}

impl Default for RigidBodyOptions {
    fn default() -> Self {
        Self {
            object: ObjectOptions::default(),
            orientation: Quat::IDENTITY,
            angular_velocity: Vec3::ZERO,
            inertia: Vec3::ONE,
            collider: Collider::Aabb(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5))),
        }
    }
}

/// Body creation request: one variant per body kind.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyOptions {
    /// A particle with no orientation
    PointMass(PointMassOptions),
    /// A body with orientation, angular velocity, and a collider
    RigidBody(RigidBodyOptions),
}

impl BodyOptions {
    /// Validates the options without creating anything.
    ///
    /// Rejection happens before any system state mutates; values are never
    /// clamped into range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            BodyOptions::PointMass(pm) => pm.object.validate(),
            BodyOptions::RigidBody(rb) => {
                rb.object.validate()?;
                if !rb.orientation.is_finite() || !rb.angular_velocity.is_finite() {
                    return Err(ConfigError::NonFinite {
                        field: "orientation/angular_velocity",
                    });
                }
                if !(rb.inertia.x > 0.0 && rb.inertia.y > 0.0 && rb.inertia.z > 0.0) {
                    return Err(ConfigError::InvalidInertia(rb.inertia.to_array()));
                }
                let half = match &rb.collider {
                    Collider::Aabb(aabb) => aabb.half_extents(),
                    Collider::Box(b) => b.half_extents,
                };
                if half.x < 0.0 || half.y < 0.0 || half.z < 0.0 {
                    return Err(ConfigError::NegativeHalfExtents);
                }
                Ok(())
            }
        }
    }
}

/// Kind-specific body state.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyKind {
    /// No orientation; the broad phase treats it as a zero-extent box
    PointMass,
    /// Oriented body with a collider
    RigidBody {
        /// Current orientation, renormalized after every integration step
        orientation: Quat,
        /// Angular velocity (rad/s, world axes)
        angular_velocity: Vec3,
        /// Principal diagonal of the inertia tensor
        inertia: Vec3,
        /// Collider in body-local space
        collider: Collider,
    },
}

/// A simulated body. Owned exclusively by the [`crate::physics::PhysicsSystem`].
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// Stable handle, assigned at creation
    pub handle: BodyHandle,
    /// Kind-specific state
    pub kind: BodyKind,
    /// World position (meters)
    pub position: Vec3,
    /// Linear velocity (m/s)
    pub velocity: Vec3,
    /// Transient force accumulator, cleared at the end of each step
    pub accumulated_force: Vec3,
    /// Named persistent forces, re-applied every step until cleared.
    /// BTreeMap keeps summation order deterministic.
    pub forces: BTreeMap<String, Vec3>,
    /// Mass (kg)
    pub mass: f32,
    /// Linear drag coefficient
    pub drag: f32,
    /// Multiplier on global gravity
    pub gravity_scale: f32,
    /// Static bodies never move
    pub is_static: bool,
    /// Bounciness in [0, 1]
    pub restitution: f32,
    /// Coulomb friction coefficient
    pub friction: f32,
    /// Set when the body produced non-finite state and was frozen
    pub frozen: bool,
    /// Human-readable reason the body was frozen, if it was
    pub diagnostic: Option<String>,
}

impl Body {
    /// Builds a body from validated options.
    pub(crate) fn from_options(handle: BodyHandle, options: &BodyOptions) -> Self {
        let (object, kind) = match options {
            BodyOptions::PointMass(pm) => (pm.object, BodyKind::PointMass),
            BodyOptions::RigidBody(rb) => (
                rb.object,
                BodyKind::RigidBody {
                    orientation: rb.orientation.normalize(),
                    angular_velocity: rb.angular_velocity,
                    inertia: rb.inertia,
                    collider: rb.collider,
                },
            ),
        };
        Self {
            handle,
            kind,
            position: object.position,
            velocity: object.velocity,
            accumulated_force: Vec3::ZERO,
            forces: BTreeMap::new(),
            mass: object.mass,
            drag: object.drag,
            gravity_scale: object.gravity_scale,
            is_static: object.is_static,
            restitution: object.restitution,
            friction: object.friction,
            frozen: false,
            diagnostic: None,
        }
    }

    /// Inverse mass: zero for static or frozen bodies, so impulses and
    /// positional corrections leave them untouched.
    pub fn inverse_mass(&self) -> f32 {
        if self.is_static || self.frozen {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Adds to the transient force accumulator.
    pub fn apply_force(&mut self, force: Vec3) {
        self.accumulated_force += force;
    }

    /// Sets (or replaces) a named persistent force.
    pub fn set_force(&mut self, name: impl Into<String>, force: Vec3) {
        self.forces.insert(name.into(), force);
    }

    /// Removes a named persistent force. Returns the removed value.
    pub fn clear_force(&mut self, name: &str) -> Option<Vec3> {
        self.forces.remove(name)
    }

    /// Looks up a named persistent force.
    pub fn force(&self, name: &str) -> Option<Vec3> {
        self.forces.get(name).copied()
    }

    /// Sum of all forces acting this step: global gravity scaled by the
    /// body's gravity scale, named persistent forces, transient forces,
    /// and linear drag.
    pub fn net_force(&self, gravity: Vec3) -> Vec3 {
        let mut net = gravity * self.gravity_scale * self.mass + self.accumulated_force;
        for force in self.forces.values() {
            net += *force;
        }
        net -= self.velocity * self.drag;
        net
    }

    /// Applies an instantaneous impulse (momentum change).
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        let inv_mass = self.inverse_mass();
        self.velocity += impulse * inv_mass;
    }

    /// Semi-implicit Euler step: velocity from force, then position from
    /// the updated velocity. Rigid bodies also integrate angular velocity
    /// into orientation and renormalize.
    ///
    /// Static and frozen bodies are skipped entirely.
    pub fn integrate(&mut self, gravity: Vec3, dt: f32) {
        if self.is_static || self.frozen {
            return;
        }

        let acceleration = self.net_force(gravity) / self.mass;
        self.velocity += acceleration * dt;
        self.position += self.velocity * dt;

        if let BodyKind::RigidBody {
            orientation,
            angular_velocity,
            ..
        } = &mut self.kind
        {
            let omega = *angular_velocity;
            if omega != Vec3::ZERO {
                let dq = Quat::from_vec4(omega.extend(0.0)) * *orientation * (0.5 * dt);
                *orientation = (*orientation + dq).normalize();
            }
        }
    }

    /// Freezes a body that produced invalid state. The body stops
    /// integrating and resolving but stays in the system for inspection.
    pub(crate) fn freeze(&mut self, diagnostic: String) {
        self.frozen = true;
        self.is_static = true;
        self.velocity = Vec3::ZERO;
        self.diagnostic = Some(diagnostic);
    }

    /// True when position, velocity, and orientation are all finite.
    pub fn is_finite(&self) -> bool {
        let linear = self.position.is_finite() && self.velocity.is_finite();
        let angular = match &self.kind {
            BodyKind::PointMass => true,
            BodyKind::RigidBody {
                orientation,
                angular_velocity,
                ..
            } => orientation.is_finite() && angular_velocity.is_finite(),
        };
        linear && angular
    }

    /// The body's collider placed into world space. Point masses become
    /// zero-extent boxes at their position; colliders are recomputed from
    /// the current transform on every call, never cached.
    pub fn world_collider(&self) -> Collider {
        match &self.kind {
            BodyKind::PointMass => Collider::Aabb(Aabb::from_point(self.position)),
            BodyKind::RigidBody {
                orientation,
                collider,
                ..
            } => collider.in_world(self.position, *orientation),
        }
    }

    /// World-space AABB for the broad phase.
    pub fn world_aabb(&self) -> Aabb {
        self.world_collider().world_aabb()
    }
}
