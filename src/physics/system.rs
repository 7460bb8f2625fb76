//! The simulation core
//!
//! Owns every body, advances simulation time, and runs the per-step
//! pipeline: force accumulation, semi-implicit Euler integration, AABB
//! broad phase, separating-axis narrow phase, impulse resolution, and the
//! stop-condition check.
//!
//! Determinism: for a fixed dt and fixed insertion order, repeated runs
//! produce bit-identical snapshots. Bodies live in an insertion-ordered
//! Vec (a HashMap is used only for handle lookup, never for iteration),
//! and named forces are stored in a BTreeMap so their summation order is
//! stable.
//!
//! Cross-thread mutation never touches this type directly; the
//! [`crate::physics::worker::SimulationWorker`] owns the system on its own
//! thread and serializes external add/remove commands at step boundaries.

use std::collections::HashMap;

use glam::Vec3;

use crate::error::ConfigError;
use crate::physics::body::{Body, BodyHandle, BodyOptions};
use crate::physics::bounding::{Aabb, ContactInfo, test_intersection};
use crate::physics::snapshot::{ObjectSnapshot, WorldSnapshot};

/// Penetration below this depth is left alone to avoid jitter.
const PENETRATION_SLOP: f32 = 0.005;
/// Fraction of the remaining penetration removed per resolution pass.
const CORRECTION_PERCENT: f32 = 0.8;
/// Tangential speeds below this are treated as no sliding.
const FRICTION_EPSILON: f32 = 1e-6;

/// Predicate over simulation state that halts continuous stepping.
pub enum SimulationStopCondition {
    /// Stop once simulation time reaches this many seconds
    MaxTime(f64),
    /// Stop once this many total steps have completed
    MaxSteps(u64),
    /// Custom termination test over a consistent snapshot
    Custom(Box<dyn Fn(&WorldSnapshot) -> bool + Send>),
}

impl SimulationStopCondition {
    /// Evaluates the condition against the current system state.
    pub fn satisfied(&self, system: &PhysicsSystem) -> bool {
        match self {
            SimulationStopCondition::MaxTime(t) => system.time() >= *t,
            SimulationStopCondition::MaxSteps(n) => system.steps() >= *n,
            SimulationStopCondition::Custom(f) => f(&system.snapshot_world()),
        }
    }
}

impl std::fmt::Debug for SimulationStopCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationStopCondition::MaxTime(t) => write!(f, "MaxTime({t})"),
            SimulationStopCondition::MaxSteps(n) => write!(f, "MaxSteps({n})"),
            SimulationStopCondition::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Owns all bodies and advances the simulation.
#[derive(Debug)]
pub struct PhysicsSystem {
    gravity: Vec3,
    bodies: Vec<Body>,
    index: HashMap<BodyHandle, usize>,
    next_handle: u64,
    sim_time: f64,
    step_count: u64,
    paused: bool,
    recording: bool,
    frames: HashMap<BodyHandle, Vec<ObjectSnapshot>>,
    diagnostics: Vec<String>,
}

impl Default for PhysicsSystem {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, -9.81, 0.0))
    }
}

impl PhysicsSystem {
    /// Creates an empty system with the given global gravity.
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity,
            bodies: Vec::new(),
            index: HashMap::new(),
            next_handle: 0,
            sim_time: 0.0,
            step_count: 0,
            paused: false,
            recording: false,
            frames: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Global gravity acceleration.
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Replaces the global gravity acceleration.
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    /// Current simulation time in seconds. Accumulated in f64 so long runs
    /// at small timesteps do not drift against step counting.
    pub fn time(&self) -> f64 {
        self.sim_time
    }

    /// Number of completed steps.
    pub fn steps(&self) -> u64 {
        self.step_count
    }

    /// Number of bodies currently in the system.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// True when the system holds no bodies.
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Validates the options and creates a body.
    ///
    /// Rejection happens before any state mutation: an invalid
    /// configuration leaves the system untouched and mints no handle.
    pub fn add_body(&mut self, options: BodyOptions) -> Result<BodyHandle, ConfigError> {
        options.validate()?;
        let handle = BodyHandle::new(self.next_handle);
        self.next_handle += 1;
        self.insert_validated(handle, &options);
        Ok(handle)
    }

    /// Inserts a body under a pre-minted handle. The worker mints handles
    /// on the caller's thread and queues the insert; options must already
    /// be validated.
    pub(crate) fn insert_validated(&mut self, handle: BodyHandle, options: &BodyOptions) {
        debug_assert!(!self.index.contains_key(&handle));
        self.next_handle = self.next_handle.max(handle.raw() + 1);
        self.index.insert(handle, self.bodies.len());
        self.bodies.push(Body::from_options(handle, options));
    }

    /// Next handle value to mint; the worker seeds its caller-side
    /// counter from this so queued inserts never collide.
    pub(crate) fn next_handle_value(&self) -> u64 {
        self.next_handle
    }

    /// Removes a body. Returns false if the handle is stale.
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        let Some(position) = self.index.remove(&handle) else {
            return false;
        };
        self.bodies.remove(position);
        self.frames.remove(&handle);
        // Every body after the removed slot shifts down one.
        for (i, body) in self.bodies.iter().enumerate().skip(position) {
            self.index.insert(body.handle, i);
        }
        true
    }

    /// Read access to a body.
    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.index.get(&handle).map(|&i| &self.bodies[i])
    }

    /// Mutable access to a body (editor-facing: inspector edits position,
    /// velocity, per-body options between steps).
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        let i = *self.index.get(&handle)?;
        Some(&mut self.bodies[i])
    }

    /// Adds to a body's transient force accumulator for this step.
    pub fn apply_force(&mut self, handle: BodyHandle, force: Vec3) -> bool {
        match self.body_mut(handle) {
            Some(body) => {
                body.apply_force(force);
                true
            }
            None => false,
        }
    }

    /// Sets a named persistent force on a body.
    pub fn set_force(&mut self, handle: BodyHandle, name: &str, force: Vec3) -> bool {
        match self.body_mut(handle) {
            Some(body) => {
                body.set_force(name, force);
                true
            }
            None => false,
        }
    }

    /// Removes a named persistent force from a body.
    pub fn clear_force(&mut self, handle: BodyHandle, name: &str) -> bool {
        self.body_mut(handle)
            .and_then(|body| body.clear_force(name))
            .is_some()
    }

    /// Halts stepping: `step` becomes a no-op until `resume`.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resumes stepping after a pause.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// True while stepping is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Enables or disables per-step frame recording. Recorded frames feed
    /// the inspector's trajectory table and solver residuals that inspect
    /// trajectory history.
    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
    }

    /// Recorded frames for a body, oldest first.
    pub fn frames(&self, handle: BodyHandle) -> &[ObjectSnapshot] {
        self.frames.get(&handle).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drops all recorded frames.
    pub fn clear_frames(&mut self) {
        self.frames.clear();
    }

    /// Diagnostics emitted by the step loop (one entry per frozen body).
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Advances the simulation by one fixed step.
    ///
    /// Pipeline order: integrate (forces were accumulated into each body
    /// beforehand), non-finite guard, broad phase, narrow phase,
    /// resolution, accumulator clear, clock advance. A body that produces
    /// NaN or infinite state is frozen and reported; the step continues
    /// for every other body.
    pub fn step(&mut self, dt: f32) {
        if self.paused {
            return;
        }

        // Integration + invariant guard.
        let gravity = self.gravity;
        for body in &mut self.bodies {
            body.integrate(gravity, dt);
            if !body.frozen && !body.is_finite() {
                let message = format!(
                    "body {} produced non-finite state at t={:.4}; frozen",
                    body.handle.raw(),
                    self.sim_time
                );
                body.freeze(message.clone());
                self.diagnostics.push(message);
            }
        }

        // Broad phase: world AABB per body, O(n^2) pair shortlist. Fine at
        // this scale; a spatial hash could slot in here without touching
        // the narrow phase.
        let aabbs: Vec<Aabb> = self.bodies.iter().map(Body::world_aabb).collect();
        let mut contacts: Vec<(usize, usize, ContactInfo)> = Vec::new();
        for i in 0..self.bodies.len() {
            for j in (i + 1)..self.bodies.len() {
                let a = &self.bodies[i];
                let b = &self.bodies[j];
                if a.inverse_mass() == 0.0 && b.inverse_mass() == 0.0 {
                    continue;
                }
                if !aabbs[i].overlaps(&aabbs[j]) {
                    continue;
                }
                // Narrow phase on the shortlisted pair.
                if let Some(contact) = test_intersection(
                    &a.world_collider(),
                    &b.world_collider(),
                    (a.handle, b.handle),
                ) {
                    contacts.push((i, j, contact));
                }
            }
        }

        for (i, j, contact) in contacts {
            self.resolve_contact(i, j, &contact);
        }

        for body in &mut self.bodies {
            body.accumulated_force = Vec3::ZERO;
        }

        self.sim_time += dt as f64;
        self.step_count += 1;

        if self.recording {
            for body in &self.bodies {
                self.frames
                    .entry(body.handle)
                    .or_default()
                    .push(ObjectSnapshot::capture(body, self.sim_time));
            }
        }
    }

    /// Impulse-based contact resolution along the contact normal, with a
    /// Coulomb-clamped friction impulse and inverse-mass-weighted
    /// positional correction.
    fn resolve_contact(&mut self, i: usize, j: usize, contact: &ContactInfo) {
        let (a, b) = borrow_pair(&mut self.bodies, i, j);
        let inv_a = a.inverse_mass();
        let inv_b = b.inverse_mass();
        let inv_sum = inv_a + inv_b;
        if inv_sum == 0.0 {
            return;
        }

        let normal = contact.normal;
        let relative = b.velocity - a.velocity;
        let vn = relative.dot(normal);

        // Impulse only when the bodies are approaching.
        if vn < 0.0 {
            let restitution = a.restitution.min(b.restitution);
            let impulse = -(1.0 + restitution) * vn / inv_sum;
            a.velocity -= normal * (impulse * inv_a);
            b.velocity += normal * (impulse * inv_b);

            // Friction along the tangential sliding direction, clamped by
            // the normal impulse.
            let tangential = relative - normal * vn;
            if tangential.length_squared() > FRICTION_EPSILON {
                let tangent = tangential.normalize();
                let friction = (a.friction * b.friction).sqrt();
                if friction > 0.0 {
                    let jt_raw = -(b.velocity - a.velocity).dot(tangent) / inv_sum;
                    let limit = friction * impulse;
                    let jt = jt_raw.clamp(-limit, limit);
                    a.velocity -= tangent * (jt * inv_a);
                    b.velocity += tangent * (jt * inv_b);
                }
            }
        }

        // Positional correction removes most of the remaining penetration
        // beyond the slop, split by inverse mass.
        let depth = (contact.penetration - PENETRATION_SLOP).max(0.0);
        if depth > 0.0 {
            let correction = normal * (depth / inv_sum * CORRECTION_PERCENT);
            a.position -= correction * inv_a;
            b.position += correction * inv_b;
        }
    }

    /// Steps repeatedly until the stop condition is satisfied (or the
    /// system is paused). The condition is evaluated before each step, so
    /// `MaxTime(5.0)` at dt = 0.1 executes exactly 50 steps and never a
    /// 51st. Returns the number of steps executed.
    pub fn run_until(&mut self, dt: f32, stop: &SimulationStopCondition) -> u64 {
        let mut executed = 0;
        while !self.paused && !stop.satisfied(self) {
            self.step(dt);
            executed += 1;
        }
        executed
    }

    /// Snapshot of one body at the current instant.
    pub fn snapshot(&self, handle: BodyHandle) -> Option<ObjectSnapshot> {
        self.body(handle)
            .map(|body| ObjectSnapshot::capture(body, self.sim_time))
    }

    /// Snapshot of the whole system at the current instant, bodies in
    /// insertion order.
    pub fn snapshot_world(&self) -> WorldSnapshot {
        WorldSnapshot {
            time: self.sim_time,
            steps: self.step_count,
            gravity: self.gravity,
            bodies: self
                .bodies
                .iter()
                .map(|body| ObjectSnapshot::capture(body, self.sim_time))
                .collect(),
        }
    }
}

/// Mutable references to two distinct slots of the body list.
fn borrow_pair(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    debug_assert!(i != j);
    if i < j {
        let (left, right) = bodies.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = bodies.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body::{ObjectOptions, PointMassOptions, RigidBodyOptions};
    use crate::physics::bounding::Collider;

    fn point_mass(options: ObjectOptions) -> BodyOptions {
        BodyOptions::PointMass(PointMassOptions { object: options })
    }

    #[test]
    fn test_add_remove_body() {
        let mut system = PhysicsSystem::default();
        let a = system.add_body(point_mass(ObjectOptions::default())).unwrap();
        let b = system.add_body(point_mass(ObjectOptions::default())).unwrap();
        assert_ne!(a, b);
        assert_eq!(system.len(), 2);
        assert!(system.remove_body(a));
        assert!(!system.remove_body(a));
        assert_eq!(system.len(), 1);
        assert!(system.body(b).is_some());
    }

    #[test]
    fn test_invalid_options_mutate_nothing() {
        let mut system = PhysicsSystem::default();
        let bad = point_mass(ObjectOptions {
            mass: -5.0,
            ..Default::default()
        });
        assert!(system.add_body(bad).is_err());
        assert!(system.is_empty());
        // The next valid body still gets the first handle.
        let handle = system.add_body(point_mass(ObjectOptions::default())).unwrap();
        assert_eq!(handle.raw(), 0);
    }

    #[test]
    fn test_free_fall_matches_closed_form() {
        let mut system = PhysicsSystem::new(Vec3::new(0.0, -10.0, 0.0));
        let handle = system
            .add_body(point_mass(ObjectOptions {
                position: Vec3::new(0.0, 100.0, 0.0),
                ..Default::default()
            }))
            .unwrap();
        let dt = 0.001;
        for _ in 0..1000 {
            system.step(dt);
        }
        let snapshot = system.snapshot(handle).unwrap();
        // After 1s: v = -10, y ~ 95 (semi-implicit Euler lands slightly low).
        assert!((snapshot.velocity.y + 10.0).abs() < 1e-2);
        assert!((snapshot.position.y - 95.0).abs() < 0.1);
    }

    #[test]
    fn test_pause_blocks_stepping() {
        let mut system = PhysicsSystem::default();
        system
            .add_body(point_mass(ObjectOptions::default()))
            .unwrap();
        system.pause();
        system.step(0.1);
        assert_eq!(system.steps(), 0);
        assert_eq!(system.time(), 0.0);
        system.resume();
        system.step(0.1);
        assert_eq!(system.steps(), 1);
    }

    #[test]
    fn test_nan_body_is_frozen_not_fatal() {
        let mut system = PhysicsSystem::new(Vec3::ZERO);
        let bad = system
            .add_body(point_mass(ObjectOptions::default()))
            .unwrap();
        let good = system
            .add_body(point_mass(ObjectOptions {
                velocity: Vec3::new(1.0, 0.0, 0.0),
                ..Default::default()
            }))
            .unwrap();
        system.body_mut(bad).unwrap().velocity = Vec3::new(f32::NAN, 0.0, 0.0);

        system.step(0.1);
        system.step(0.1);

        let bad_snapshot = system.snapshot(bad).unwrap();
        assert!(bad_snapshot.frozen);
        assert!(bad_snapshot.diagnostic.is_some());
        assert_eq!(system.diagnostics().len(), 1);

        // The healthy body kept integrating.
        let good_snapshot = system.snapshot(good).unwrap();
        assert!((good_snapshot.position.x - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_resting_contact_on_static_floor() {
        let mut system = PhysicsSystem::new(Vec3::new(0.0, -9.81, 0.0));
        let _floor = system
            .add_body(BodyOptions::RigidBody(RigidBodyOptions {
                object: ObjectOptions {
                    is_static: true,
                    ..Default::default()
                },
                collider: Collider::Aabb(Aabb::from_center_half_extents(
                    Vec3::ZERO,
                    Vec3::new(50.0, 1.0, 50.0),
                )),
                ..Default::default()
            }))
            .unwrap();
        let ball = system
            .add_body(BodyOptions::RigidBody(RigidBodyOptions {
                object: ObjectOptions {
                    position: Vec3::new(0.0, 5.0, 0.0),
                    ..Default::default()
                },
                collider: Collider::Aabb(Aabb::from_center_half_extents(
                    Vec3::ZERO,
                    Vec3::splat(0.5),
                )),
                ..Default::default()
            }))
            .unwrap();

        for _ in 0..600 {
            system.step(1.0 / 120.0);
        }

        let snapshot = system.snapshot(ball).unwrap();
        // Settled on top of the floor: center near 1.0 + 0.5.
        assert!(
            (snapshot.position.y - 1.5).abs() < 0.05,
            "ball settled at y={}",
            snapshot.position.y
        );
        assert!(snapshot.velocity.length() < 0.5);
    }

    #[test]
    fn test_restitution_bounces() {
        let mut system = PhysicsSystem::new(Vec3::ZERO);
        let _wall = system
            .add_body(BodyOptions::RigidBody(RigidBodyOptions {
                object: ObjectOptions {
                    is_static: true,
                    restitution: 1.0,
                    ..Default::default()
                },
                collider: Collider::Aabb(Aabb::from_center_half_extents(
                    Vec3::new(5.0, 0.0, 0.0),
                    Vec3::new(0.5, 5.0, 5.0),
                )),
                ..Default::default()
            }))
            .unwrap();
        let ball = system
            .add_body(BodyOptions::RigidBody(RigidBodyOptions {
                object: ObjectOptions {
                    velocity: Vec3::new(10.0, 0.0, 0.0),
                    restitution: 1.0,
                    ..Default::default()
                },
                collider: Collider::Aabb(Aabb::from_center_half_extents(
                    Vec3::ZERO,
                    Vec3::splat(0.25),
                )),
                ..Default::default()
            }))
            .unwrap();

        for _ in 0..200 {
            system.step(1.0 / 100.0);
        }

        let snapshot = system.snapshot(ball).unwrap();
        // Perfectly elastic: speed preserved, direction reversed.
        assert!(
            (snapshot.velocity.x + 10.0).abs() < 0.1,
            "velocity after bounce: {}",
            snapshot.velocity.x
        );
    }

    #[test]
    fn test_frame_recording_round_trip() {
        let mut system = PhysicsSystem::new(Vec3::ZERO);
        let handle = system
            .add_body(point_mass(ObjectOptions {
                velocity: Vec3::X,
                ..Default::default()
            }))
            .unwrap();
        system.set_recording(true);
        for _ in 0..5 {
            system.step(0.1);
        }
        let frames = system.frames(handle);
        assert_eq!(frames.len(), 5);
        assert!(frames[4].position.x > frames[0].position.x);
        system.clear_frames();
        assert!(system.frames(handle).is_empty());
    }

    #[test]
    fn test_run_until_max_steps() {
        let mut system = PhysicsSystem::new(Vec3::ZERO);
        system
            .add_body(point_mass(ObjectOptions::default()))
            .unwrap();
        let executed = system.run_until(0.1, &SimulationStopCondition::MaxSteps(10));
        assert_eq!(executed, 10);
        assert_eq!(system.steps(), 10);
    }

    #[test]
    fn test_run_until_custom_condition() {
        let mut system = PhysicsSystem::new(Vec3::ZERO);
        let handle = system
            .add_body(point_mass(ObjectOptions {
                velocity: Vec3::new(1.0, 0.0, 0.0),
                ..Default::default()
            }))
            .unwrap();
        let stop = SimulationStopCondition::Custom(Box::new(move |snapshot: &WorldSnapshot| {
            snapshot
                .body(handle)
                .map(|s| s.position.x >= 1.0)
                .unwrap_or(true)
        }));
        system.run_until(0.1, &stop);
        let snapshot = system.snapshot(handle).unwrap();
        assert!(snapshot.position.x >= 1.0);
        assert!(snapshot.position.x < 1.2);
    }
}
