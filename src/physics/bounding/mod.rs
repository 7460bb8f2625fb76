//! Bounding volumes and narrow-phase tests
//!
//! Shape representations (axis-aligned and oriented boxes) plus the
//! pairwise intersection tests that produce contact geometry. This module
//! knows nothing about bodies beyond their handles; the broad phase and
//! resolution live in [`crate::physics::system`].

pub mod aabb;
pub mod box_collider;
pub mod contact;

pub use aabb::Aabb;
pub use box_collider::BoxCollider;
pub use contact::{Collider, ContactInfo, test_intersection};
