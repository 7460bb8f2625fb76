//! Narrow-phase intersection tests
//!
//! Pairwise collider tests producing contact geometry. AABB pairs use a
//! per-axis interval test; any pair involving an oriented box goes through
//! a separating-axis test over both boxes' face normals plus the nine edge
//! cross products. Among all non-separating axes the one with the least
//! overlap supplies the contact normal and penetration depth (the usual
//! minimum-translation-vector policy).
//!
//! Convention, stated explicitly: `test_intersection` returns
//! `Some(ContactInfo)` iff the penetration depth is >= 0. Touching shapes
//! (including coincident zero-extent boxes) report a contact at depth 0;
//! separated shapes report `None`. The normal is a unit vector pointing
//! from collider A toward collider B.

use glam::{Quat, Vec3};

use crate::physics::body::BodyHandle;

use super::aabb::Aabb;
use super::box_collider::BoxCollider;

/// Cross products below this length are degenerate (parallel edges) and
/// skipped as SAT candidate axes.
const AXIS_EPSILON: f32 = 1e-8;

/// A world-space collider shape.
///
/// A small closed set of variants rather than a trait object: the narrow
/// phase matches on the pair and every variant knows its own bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Collider {
    /// Axis-aligned box given by min/max corners
    Aabb(Aabb),
    /// Oriented box given by center, half-extents, rotation
    Box(BoxCollider),
}

impl Collider {
    /// World-space AABB enclosing the collider, recomputed on every call
    /// so bounds always reflect the owning body's current transform.
    pub fn world_aabb(&self) -> Aabb {
        match self {
            Collider::Aabb(aabb) => *aabb,
            Collider::Box(b) => b.world_aabb(),
        }
    }

    /// Returns this collider placed into world space by an owning body's
    /// translation and rotation.
    pub fn in_world(&self, translation: Vec3, rotation: Quat) -> Collider {
        match self {
            // Rotating an AABB promotes it to an oriented box.
            Collider::Aabb(aabb) => {
                if rotation == Quat::IDENTITY {
                    Collider::Aabb(aabb.translated(translation))
                } else {
                    Collider::Box(
                        BoxCollider::new(aabb.center(), aabb.half_extents(), Quat::IDENTITY)
                            .transformed(translation, rotation),
                    )
                }
            }
            Collider::Box(b) => Collider::Box(b.transformed(translation, rotation)),
        }
    }

    /// Ray query against the collider (editor pick support).
    pub fn ray_intersect(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        match self {
            Collider::Aabb(aabb) => aabb.ray_intersect(origin, dir),
            Collider::Box(b) => b.ray_intersect(origin, dir),
        }
    }
}

/// Result of a pairwise collider test.
///
/// Created per detected contact per step and consumed by the resolution
/// pass; never persisted across steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactInfo {
    /// World-space contact point
    pub point: Vec3,
    /// Unit contact normal pointing from body A toward body B
    pub normal: Vec3,
    /// Penetration depth (>= 0; 0 means the shapes are exactly touching)
    pub penetration: f32,
    /// Handles of the two bodies involved, in (A, B) order
    pub bodies: (BodyHandle, BodyHandle),
}

/// Tests two world-space colliders for intersection.
///
/// # Arguments
/// * `a`, `b` - Colliders already placed in world space
/// * `handles` - Owning body handles recorded into the contact, (A, B)
///
/// # Returns
/// `Some(ContactInfo)` when the shapes touch or penetrate, `None` when a
/// separating axis exists.
pub fn test_intersection(
    a: &Collider,
    b: &Collider,
    handles: (BodyHandle, BodyHandle),
) -> Option<ContactInfo> {
    match (a, b) {
        (Collider::Aabb(a), Collider::Aabb(b)) => aabb_aabb(a, b, handles),
        _ => {
            let oa = as_box(a);
            let ob = as_box(b);
            box_box(&oa, &ob, handles)
        }
    }
}

fn as_box(c: &Collider) -> BoxCollider {
    match c {
        Collider::Aabb(aabb) => {
            BoxCollider::new(aabb.center(), aabb.half_extents(), Quat::IDENTITY)
        }
        Collider::Box(b) => *b,
    }
}

/// AABB-AABB: interval overlap on each axis. The axis of minimum overlap
/// determines the normal, signed toward B; the contact point is the center
/// of the overlap region.
fn aabb_aabb(a: &Aabb, b: &Aabb, handles: (BodyHandle, BodyHandle)) -> Option<ContactInfo> {
    let overlap = a.overlap_amounts(b);
    if overlap.x < 0.0 || overlap.y < 0.0 || overlap.z < 0.0 {
        return None;
    }

    let (axis_index, penetration) = min_component(overlap);
    let mut normal = Vec3::ZERO;
    normal[axis_index] = 1.0;

    let delta = b.center() - a.center();
    if delta[axis_index] < 0.0 {
        normal = -normal;
    }

    let region_min = a.min.max(b.min);
    let region_max = a.max.min(b.max);
    let point = (region_min + region_max) * 0.5;

    Some(ContactInfo {
        point,
        normal,
        penetration,
        bodies: handles,
    })
}

/// Oriented box pair: separating-axis test over 6 face normals and 9 edge
/// cross products.
fn box_box(
    a: &BoxCollider,
    b: &BoxCollider,
    handles: (BodyHandle, BodyHandle),
) -> Option<ContactInfo> {
    let a_axes = a.axes();
    let b_axes = b.axes();
    let delta = b.center - a.center;

    let mut best_overlap = f32::INFINITY;
    let mut best_axis = Vec3::ZERO;

    let mut candidates: Vec<Vec3> = Vec::with_capacity(15);
    candidates.extend_from_slice(&a_axes);
    candidates.extend_from_slice(&b_axes);
    for ax in &a_axes {
        for bx in &b_axes {
            let cross = ax.cross(*bx);
            if cross.length_squared() > AXIS_EPSILON {
                candidates.push(cross.normalize());
            }
        }
    }

    for axis in candidates {
        let ra = project_radius(a, &a_axes, axis);
        let rb = project_radius(b, &b_axes, axis);
        let dist = delta.dot(axis).abs();
        let overlap = ra + rb - dist;
        if overlap < 0.0 {
            // Found a separating axis.
            return None;
        }
        if overlap < best_overlap {
            best_overlap = overlap;
            best_axis = axis;
        }
    }

    // Point the normal from A toward B. A zero projection (coincident
    // degenerate boxes) leaves the candidate orientation unchanged.
    let mut normal = best_axis;
    if delta.dot(normal) < 0.0 {
        normal = -normal;
    }

    let pa = a.support(normal);
    let pb = b.support(-normal);
    let point = (pa + pb) * 0.5;

    Some(ContactInfo {
        point,
        normal,
        penetration: best_overlap,
        bodies: handles,
    })
}

/// Half-length of a box's projection onto a unit axis.
fn project_radius(b: &BoxCollider, axes: &[Vec3; 3], axis: Vec3) -> f32 {
    b.half_extents.x * axes[0].dot(axis).abs()
        + b.half_extents.y * axes[1].dot(axis).abs()
        + b.half_extents.z * axes[2].dot(axis).abs()
}

fn min_component(v: Vec3) -> (usize, f32) {
    if v.x <= v.y && v.x <= v.z {
        (0, v.x)
    } else if v.y <= v.z {
        (1, v.y)
    } else {
        (2, v.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    fn handles() -> (BodyHandle, BodyHandle) {
        (BodyHandle::new(0), BodyHandle::new(1))
    }

    #[test]
    fn test_aabb_pair_overlapping() {
        let a = Collider::Aabb(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE));
        let b = Collider::Aabb(Aabb::from_center_half_extents(
            Vec3::new(1.5, 0.0, 0.0),
            Vec3::ONE,
        ));
        let contact = test_intersection(&a, &b, handles()).unwrap();
        assert!((contact.penetration - 0.5).abs() < 1e-6);
        assert_eq!(contact.normal, Vec3::X);
        assert_eq!(contact.bodies, handles());
    }

    #[test]
    fn test_aabb_pair_separated() {
        let a = Collider::Aabb(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE));
        let b = Collider::Aabb(Aabb::from_center_half_extents(
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::ONE,
        ));
        assert!(test_intersection(&a, &b, handles()).is_none());
    }

    #[test]
    fn test_aabb_symmetry_depth_and_opposed_normals() {
        let a = Collider::Aabb(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE));
        let b = Collider::Aabb(Aabb::from_center_half_extents(
            Vec3::new(0.0, 1.2, 0.0),
            Vec3::ONE,
        ));
        let ab = test_intersection(&a, &b, handles()).unwrap();
        let ba = test_intersection(&b, &a, (handles().1, handles().0)).unwrap();
        assert!((ab.penetration - ba.penetration).abs() < 1e-6);
        assert_eq!(ab.normal, -ba.normal);
    }

    #[test]
    fn test_normal_points_from_a_to_b() {
        let a = Collider::Aabb(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE));
        let b = Collider::Aabb(Aabb::from_center_half_extents(
            Vec3::new(-1.5, 0.0, 0.0),
            Vec3::ONE,
        ));
        let contact = test_intersection(&a, &b, handles()).unwrap();
        assert_eq!(contact.normal, Vec3::NEG_X);
    }

    #[test]
    fn test_rotated_boxes_separated_by_sat_only() {
        // Two unit boxes rotated 45 degrees, diagonal corners near each
        // other: AABB bounds overlap but an edge-cross axis separates them.
        let rot = Quat::from_rotation_y(FRAC_PI_4);
        let a = Collider::Box(BoxCollider::new(Vec3::ZERO, Vec3::ONE, rot));
        let b = Collider::Box(BoxCollider::new(Vec3::new(2.9, 0.0, 0.0), Vec3::ONE, rot));
        // Projected half-width along X is sqrt(2), so contact ends at 2*sqrt(2) ~ 2.83.
        assert!(test_intersection(&a, &b, handles()).is_none());
    }

    #[test]
    fn test_rotated_boxes_touching() {
        let rot = Quat::from_rotation_y(FRAC_PI_4);
        let a = Collider::Box(BoxCollider::new(Vec3::ZERO, Vec3::ONE, rot));
        let b = Collider::Box(BoxCollider::new(Vec3::new(2.5, 0.0, 0.0), Vec3::ONE, rot));
        let contact = test_intersection(&a, &b, handles()).unwrap();
        assert!(contact.penetration >= 0.0);
        assert!(contact.normal.dot(Vec3::X) > 0.9);
    }

    #[test]
    fn test_aabb_vs_oriented_box() {
        let a = Collider::Aabb(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE));
        let b = Collider::Box(BoxCollider::new(
            Vec3::new(1.8, 0.0, 0.0),
            Vec3::ONE,
            Quat::from_rotation_z(FRAC_PI_4),
        ));
        let contact = test_intersection(&a, &b, handles()).unwrap();
        assert!(contact.penetration > 0.0);
        assert!(contact.normal.x > 0.0);
    }

    #[test]
    fn test_coincident_zero_extent_boxes_touch_at_depth_zero() {
        let p = Vec3::new(2.0, 3.0, 4.0);
        let a = Collider::Aabb(Aabb::from_point(p));
        let b = Collider::Aabb(Aabb::from_point(p));
        let contact = test_intersection(&a, &b, handles()).unwrap();
        assert_eq!(contact.penetration, 0.0);
        assert_eq!(contact.point, p);
    }

    #[test]
    fn test_zero_extent_vs_box_inside() {
        let a = Collider::Aabb(Aabb::from_point(Vec3::new(0.2, 0.0, 0.0)));
        let b = Collider::Box(BoxCollider::new(Vec3::ZERO, Vec3::ONE, Quat::IDENTITY));
        let contact = test_intersection(&a, &b, handles()).unwrap();
        assert!(contact.penetration > 0.0);
    }

    #[test]
    fn test_in_world_rotates_aabb_into_box() {
        let c = Collider::Aabb(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE));
        let rotated = c.in_world(Vec3::new(1.0, 0.0, 0.0), Quat::from_rotation_y(FRAC_PI_4));
        assert!(matches!(rotated, Collider::Box(_)));
        let translated = c.in_world(Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY);
        match translated {
            Collider::Aabb(aabb) => assert_eq!(aabb.center(), Vec3::new(1.0, 0.0, 0.0)),
            _ => panic!("identity rotation should keep the AABB variant"),
        }
    }
}
