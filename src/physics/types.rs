//! Physics type re-exports from glam
//!
//! This module provides the core mathematical types used throughout
//! the physics system, re-exported from the glam library. Simulation
//! state is single-precision; solver arithmetic runs in double
//! precision (see [`crate::solver`]).

pub use glam::{DVec3, Mat3, Quat, Vec3};
