//! Configuration errors
//!
//! Invalid body options are rejected at creation time, before any
//! simulation state is touched. Values are never silently clamped.
//! Solver failures are not errors in this sense: they come back as
//! [`crate::solver::SolverDecision`] values so callers can present
//! "no solution found" without special-casing control flow.

use thiserror::Error;

/// Rejected body configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Mass must be strictly positive and finite
    #[error("mass must be positive and finite, got {0}")]
    InvalidMass(f32),

    /// A vector field contained NaN or infinity
    #[error("{field} must be finite")]
    NonFinite {
        /// Name of the offending options field
        field: &'static str,
    },

    /// Drag coefficient must be non-negative
    #[error("drag coefficient must be >= 0, got {0}")]
    NegativeDrag(f32),

    /// Restitution must lie in [0, 1]
    #[error("restitution must be within [0, 1], got {0}")]
    RestitutionOutOfRange(f32),

    /// Friction coefficient must be non-negative
    #[error("friction must be >= 0, got {0}")]
    NegativeFriction(f32),

    /// Collider half-extents must be non-negative (zero is allowed and
    /// produces a degenerate, zero-volume collider)
    #[error("collider half-extents must be >= 0 on every axis")]
    NegativeHalfExtents,

    /// Principal inertia components must be strictly positive
    #[error("inertia components must be positive, got {0:?}")]
    InvalidInertia([f32; 3]),
}
