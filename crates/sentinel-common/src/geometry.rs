//! 2D geometry helpers shared by perception, movement and physics queries.

use serde::{Deserialize, Serialize};

pub use glam::Vec2;

/// Squared length below which a direction is treated as zero.
pub const DIRECTION_EPSILON_SQ: f32 = 0.0001;

/// Axis-aligned bounding box (collider bounds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl Aabb {
    /// Creates a new AABB from its corners.
    #[must_use]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Creates an AABB from center and half-extents.
    #[must_use]
    pub fn from_center(center: Vec2, half_width: f32, half_height: f32) -> Self {
        let half = Vec2::new(half_width, half_height);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Returns the center of the AABB.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Returns the half-extents of the AABB.
    #[must_use]
    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Returns the AABB translated by a vector.
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Returns true if two boxes overlap (touching edges excluded).
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Returns true if a circle overlaps this box (edges inclusive).
    #[must_use]
    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        closest.distance_squared(center) <= radius * radius
    }

    /// Slab test: distance along the ray at which it enters the box, or 0.0
    /// when `origin` is inside. `direction` need not be normalized; the
    /// result is in units of `direction`.
    #[must_use]
    pub fn ray_entry(&self, origin: Vec2, direction: Vec2) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = f32::INFINITY;

        for axis in 0..2 {
            let (o, d) = (origin[axis], direction[axis]);
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d.abs() < f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
            } else {
                let inv = 1.0 / d;
                let (t1, t2) = ((lo - o) * inv, (hi - o) * inv);
                t_min = t_min.max(t1.min(t2));
                t_max = t_max.min(t1.max(t2));
                if t_min > t_max {
                    return None;
                }
            }
        }

        Some(t_min)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::from_center(Vec2::ZERO, 0.5, 0.5)
    }
}

/// Moves `current` towards `target` by at most `max_delta`, never overshooting.
#[must_use]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// Sign of `value`, treating zero as positive.
#[must_use]
pub fn sign_or_positive(value: f32) -> f32 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Returns `direction` normalized, or `fallback` when it is (nearly) zero.
#[must_use]
pub fn normalize_or(direction: Vec2, fallback: Vec2) -> Vec2 {
    if direction.length_squared() < DIRECTION_EPSILON_SQ {
        fallback
    } else {
        direction.normalize()
    }
}
