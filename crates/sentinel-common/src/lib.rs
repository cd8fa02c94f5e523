//! # Sentinel Common
//!
//! Common types, utilities, and shared abstractions for Project Sentinel.
//!
//! This crate provides foundational types used across all Sentinel crates:
//! - Geometry (`Vec2`, `Aabb`, scalar stepping helpers)
//! - ID types (`EntityId`) and collision layer masks
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod geometry;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::geometry::*;
    pub use crate::ids::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation() {
        let id1 = EntityId::new();
        let id2 = EntityId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_layer_mask_contains() {
        let mask = LayerMask::PLAYER | LayerMask::OBSTACLE;
        assert!(mask.contains(LayerMask::PLAYER));
        assert!(!mask.contains(LayerMask::ENEMY));
        assert!(LayerMask::NONE.is_empty());
    }

    #[test]
    fn test_aabb_center() {
        let bounds = Aabb::from_center(Vec2::new(2.0, 3.0), 0.5, 1.0);
        assert_eq!(bounds.center(), Vec2::new(2.0, 3.0));
    }
}
