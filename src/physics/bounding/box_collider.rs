//! Oriented box collider
//!
//! An OBB stored as center, half-extents, and a unit quaternion. The
//! separating-axis narrow phase (see [`super::contact`]) queries it for
//! its local axes and support points; the broad phase wraps it in a
//! conservative world-space AABB built from the absolute rotation matrix.

use glam::{Mat3, Quat, Vec3};

use super::aabb::Aabb;

/// An oriented box: center, half-extents, rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxCollider {
    /// Box center in the collider's own space
    pub center: Vec3,
    /// Half-extents along the box's local axes (non-negative)
    pub half_extents: Vec3,
    /// Rotation from local box axes to world axes
    pub rotation: Quat,
}

impl BoxCollider {
    /// Creates a new oriented box.
    pub fn new(center: Vec3, half_extents: Vec3, rotation: Quat) -> Self {
        Self {
            center,
            half_extents,
            rotation: rotation.normalize(),
        }
    }

    /// The box's three world-space axes (columns of the rotation matrix).
    pub fn axes(&self) -> [Vec3; 3] {
        let m = Mat3::from_quat(self.rotation);
        [m.x_axis, m.y_axis, m.z_axis]
    }

    /// Conservative world-space AABB around the oriented box.
    ///
    /// Uses the absolute-value rotation matrix trick: each world half-extent
    /// is the sum of the projections of the local half-extents.
    pub fn world_aabb(&self) -> Aabb {
        let m = Mat3::from_quat(self.rotation);
        let abs = Mat3::from_cols(m.x_axis.abs(), m.y_axis.abs(), m.z_axis.abs());
        let world_half = abs * self.half_extents;
        Aabb::from_center_half_extents(self.center, world_half)
    }

    /// Furthest point of the box in the given world-space direction.
    pub fn support(&self, dir: Vec3) -> Vec3 {
        let axes = self.axes();
        let mut p = self.center;
        for i in 0..3 {
            let sign = if axes[i].dot(dir) >= 0.0 { 1.0 } else { -1.0 };
            p += axes[i] * (self.half_extents[i] * sign);
        }
        p
    }

    /// Tests whether a world-space point lies inside the box (inclusive).
    pub fn contains(&self, p: Vec3) -> bool {
        let local = self.rotation.inverse() * (p - self.center);
        local.abs().cmple(self.half_extents).all()
    }

    /// Closest point on (or in) the box to a world-space point.
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        let local = self.rotation.inverse() * (p - self.center);
        let clamped = local.clamp(-self.half_extents, self.half_extents);
        self.rotation * clamped + self.center
    }

    /// Ray-box intersection: transforms the ray into box-local space and
    /// runs the slab test there.
    ///
    /// # Returns
    /// * `Some(t)` - Distance along the ray to the hit (t >= 0)
    /// * `None` - No hit in front of the origin
    pub fn ray_intersect(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        let inv_rot = self.rotation.inverse();
        let local_origin = inv_rot * (origin - self.center);
        let local_dir = inv_rot * dir;
        let local_box = Aabb::from_center_half_extents(Vec3::ZERO, self.half_extents);
        local_box.ray_intersect(local_origin, local_dir)
    }

    /// Returns this box translated and rotated by an owning body transform.
    pub fn transformed(&self, translation: Vec3, rotation: Quat) -> Self {
        Self {
            center: rotation * self.center + translation,
            half_extents: self.half_extents,
            rotation: (rotation * self.rotation).normalize(),
        }
    }
}
