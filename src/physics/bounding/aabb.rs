//! Axis-aligned bounding boxes
//!
//! The AABB is both a collider variant in its own right and the broad-phase
//! proxy for every body. Overlap tests are plain per-axis interval checks;
//! the ray query uses the slab method.

use glam::Vec3;

/// An axis-aligned box stored as min/max corners.
///
/// Zero-extent boxes are valid: a point mass is represented in the broad
/// phase as an AABB with `min == max`. Touching boxes (shared face, edge,
/// or corner) count as overlapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner in world space
    pub min: Vec3,
    /// Maximum corner in world space
    pub max: Vec3,
}

impl Aabb {
    /// Creates an AABB from explicit min/max corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Creates an AABB from a center and half-extents.
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Creates a zero-extent AABB containing a single point.
    pub fn from_point(point: Vec3) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// Center of the box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half-extents of the box (non-negative for a well-formed AABB).
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Returns the AABB translated by `offset`.
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Tests whether two AABBs overlap. Touching counts as overlap so that
    /// degenerate zero-extent boxes can still register coincident contacts.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Tests whether a point lies inside the box (inclusive).
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Per-axis overlap amounts against another AABB.
    ///
    /// A component is negative when the boxes are separated on that axis,
    /// zero when they touch, positive when they penetrate.
    pub fn overlap_amounts(&self, other: &Aabb) -> Vec3 {
        Vec3::new(
            (self.max.x.min(other.max.x)) - (self.min.x.max(other.min.x)),
            (self.max.y.min(other.max.y)) - (self.min.y.max(other.min.y)),
            (self.max.z.min(other.max.z)) - (self.min.z.max(other.min.z)),
        )
    }

    /// Ray-AABB intersection using the slab method.
    ///
    /// Finds entry/exit times against each axis pair of planes. Returns the
    /// distance to the nearest hit in front of the origin, or the exit
    /// distance when the ray starts inside the box.
    ///
    /// # Arguments
    /// * `origin` - Ray starting point
    /// * `dir` - Ray direction (must be normalized for `t` to be a distance)
    ///
    /// # Returns
    /// * `Some(t)` - Distance along the ray to the intersection (t >= 0)
    /// * `None` - No intersection, or the box is entirely behind the origin
    pub fn ray_intersect(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        // Near-zero direction components fall back to huge inverse values
        // so the slab test degenerates to an interval containment check.
        let inv = Vec3::new(
            if dir.x.abs() > 1e-10 { 1.0 / dir.x } else { f32::MAX * dir.x.signum() },
            if dir.y.abs() > 1e-10 { 1.0 / dir.y } else { f32::MAX * dir.y.signum() },
            if dir.z.abs() > 1e-10 { 1.0 / dir.z } else { f32::MAX * dir.z.signum() },
        );

        let t0 = (self.min - origin) * inv;
        let t1 = (self.max - origin) * inv;

        let smaller = t0.min(t1);
        let bigger = t0.max(t1);

        let t_min = smaller.x.max(smaller.y).max(smaller.z);
        let t_max = bigger.x.min(bigger.y).min(bigger.z);

        if t_max >= t_min && t_max >= 0.0 {
            if t_min >= 0.0 { Some(t_min) } else { Some(t_max) }
        } else {
            None
        }
    }

    /// Outward surface normal for a point on (or near) the box surface.
    ///
    /// Picks the face whose plane the point is closest to in normalized
    /// box space. Degenerate axes (zero extent) default toward +Y.
    pub fn surface_normal(&self, point: Vec3) -> Vec3 {
        let center = self.center();
        let half = self.half_extents();
        let local = point - center;

        let normalized = Vec3::new(
            if half.x > 0.0 { local.x / half.x } else { 0.0 },
            if half.y > 0.0 { local.y / half.y } else { 0.0 },
            if half.z > 0.0 { local.z / half.z } else { 0.0 },
        );
        let a = normalized.abs();

        if a.x >= a.y && a.x >= a.z && a.x > 0.0 {
            Vec3::new(normalized.x.signum(), 0.0, 0.0)
        } else if a.y >= a.x && a.y >= a.z && a.y > 0.0 {
            Vec3::new(0.0, normalized.y.signum(), 0.0)
        } else if a.z > 0.0 {
            Vec3::new(0.0, 0.0, normalized.z.signum())
        } else {
            Vec3::Y
        }
    }
}
