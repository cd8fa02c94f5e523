//! Physics collaborator interfaces.
//!
//! The agent never simulates collision itself. It consumes two query
//! services (circle overlap and ray cast) and drives an externally owned
//! rigid body through [`AgentBody`].

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use sentinel_common::{Aabb, EntityId, LayerMask, Vec2};

/// A collider returned by an overlap query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    /// Entity owning the collider
    pub entity: EntityId,
    /// Layer the collider lives on
    pub layer: LayerMask,
}

/// Nearest blocking hit returned by a ray query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Entity owning the collider that was hit
    pub entity: EntityId,
    /// World-space hit point
    pub point: Vec2,
    /// Distance from the ray origin
    pub distance: f32,
}

/// Shape-overlap and ray query services provided by the physics engine.
pub trait PhysicsQuery {
    /// Returns every collider on `layers` overlapping the circle.
    fn overlap_circle(&self, center: Vec2, radius: f32, layers: LayerMask) -> Vec<Collider>;

    /// Returns the nearest collider on `layers` hit by the ray, if any.
    ///
    /// `direction` is expected to be normalized.
    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        layers: LayerMask,
    ) -> Option<RayHit>;
}

/// Rigid body owned by the physics engine and steered by an agent.
pub trait AgentBody {
    /// Current world position (pivot).
    fn position(&self) -> Vec2;

    /// Current linear velocity.
    fn velocity(&self) -> Vec2;

    /// Overwrites the linear velocity.
    fn set_velocity(&mut self, velocity: Vec2);

    /// Center of the collision bounds, if the body has a collider.
    fn collider_center(&self) -> Option<Vec2> {
        None
    }

    /// Enables or disables collision response.
    fn set_collision_enabled(&mut self, enabled: bool);

    /// Collider center when available, raw position otherwise.
    fn center(&self) -> Vec2 {
        self.collider_center().unwrap_or_else(|| self.position())
    }
}

/// Shared body handle: the physics world keeps one clone and integrates it,
/// the agent steers through the other.
impl<T: AgentBody> AgentBody for Rc<RefCell<T>> {
    fn position(&self) -> Vec2 {
        self.borrow().position()
    }

    fn velocity(&self) -> Vec2 {
        self.borrow().velocity()
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.borrow_mut().set_velocity(velocity);
    }

    fn collider_center(&self) -> Option<Vec2> {
        self.borrow().collider_center()
    }

    fn set_collision_enabled(&mut self, enabled: bool) {
        self.borrow_mut().set_collision_enabled(enabled);
    }
}

// ============================================================================
// Test doubles
// ============================================================================

/// Simple body for tests: position, velocity and an optional collider.
#[derive(Debug, Clone, PartialEq)]
pub struct MockBody {
    /// Pivot position
    pub position: Vec2,
    /// Linear velocity
    pub velocity: Vec2,
    /// Collider bounds relative to the pivot
    pub collider: Option<Aabb>,
    /// Whether collision response is enabled
    pub collision_enabled: bool,
}

impl MockBody {
    /// Creates a body at `position` with no collider.
    #[must_use]
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            collider: None,
            collision_enabled: true,
        }
    }

    /// Attaches collider bounds expressed relative to the pivot.
    #[must_use]
    pub fn with_collider(mut self, local_bounds: Aabb) -> Self {
        self.collider = Some(local_bounds);
        self
    }

    /// Integrates position by the current velocity.
    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }
}

impl AgentBody for MockBody {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    fn collider_center(&self) -> Option<Vec2> {
        self.collider
            .map(|bounds| bounds.translated(self.position).center())
    }

    fn set_collision_enabled(&mut self, enabled: bool) {
        self.collision_enabled = enabled;
    }
}

/// Mock physics world made of axis-aligned boxes.
#[derive(Debug, Default)]
pub struct MockPhysics {
    boxes: AHashMap<EntityId, (Aabb, LayerMask)>,
}

impl MockPhysics {
    /// Creates an empty mock world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a box collider.
    pub fn insert(&mut self, entity: EntityId, bounds: Aabb, layer: LayerMask) {
        self.boxes.insert(entity, (bounds, layer));
    }

    /// Removes a collider.
    pub fn remove(&mut self, entity: EntityId) {
        self.boxes.remove(&entity);
    }

    /// Moves an existing collider so that it is centered at `center`.
    pub fn move_to(&mut self, entity: EntityId, center: Vec2) {
        if let Some((bounds, _)) = self.boxes.get_mut(&entity) {
            let offset = center - bounds.center();
            *bounds = bounds.translated(offset);
        }
    }
}

impl PhysicsQuery for MockPhysics {
    fn overlap_circle(&self, center: Vec2, radius: f32, layers: LayerMask) -> Vec<Collider> {
        let mut hits: Vec<Collider> = self
            .boxes
            .iter()
            .filter(|(_, (bounds, layer))| {
                layers.intersects(*layer) && bounds.overlaps_circle(center, radius)
            })
            .map(|(entity, (_, layer))| Collider {
                entity: *entity,
                layer: *layer,
            })
            .collect();
        hits.sort_by_key(|c| c.entity);
        hits
    }

    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        layers: LayerMask,
    ) -> Option<RayHit> {
        self.boxes
            .iter()
            .filter(|(_, (_, layer))| layers.intersects(*layer))
            .filter_map(|(entity, (bounds, _))| {
                bounds
                    .ray_entry(origin, direction)
                    .filter(|d| *d <= max_distance)
                    .map(|distance| RayHit {
                        entity: *entity,
                        point: origin + direction * distance,
                        distance,
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_body_center_prefers_collider() {
        let body = MockBody::new(Vec2::new(1.0, 0.0))
            .with_collider(Aabb::from_center(Vec2::new(0.0, 0.5), 0.3, 0.5));
        assert_eq!(body.center(), Vec2::new(1.0, 0.5));

        let bare = MockBody::new(Vec2::new(1.0, 0.0));
        assert_eq!(bare.center(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_shared_body_handle() {
        let shared = Rc::new(RefCell::new(MockBody::new(Vec2::ZERO)));
        let mut handle = Rc::clone(&shared);
        handle.set_velocity(Vec2::new(2.0, 0.0));
        shared.borrow_mut().integrate(0.5);

        assert_eq!(handle.position(), Vec2::new(1.0, 0.0));
        handle.set_collision_enabled(false);
        assert!(!shared.borrow().collision_enabled);
    }

    #[test]
    fn test_overlap_filters_layers() {
        let mut physics = MockPhysics::new();
        let wall = EntityId::from_raw(10);
        let player = EntityId::from_raw(11);
        physics.insert(wall, Aabb::from_center(Vec2::ZERO, 1.0, 1.0), LayerMask::OBSTACLE);
        physics.insert(player, Aabb::from_center(Vec2::ZERO, 0.5, 0.5), LayerMask::PLAYER);

        let hits = physics.overlap_circle(Vec2::ZERO, 0.1, LayerMask::PLAYER);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity, player);
    }

    #[test]
    fn test_raycast_returns_nearest() {
        let mut physics = MockPhysics::new();
        let near = EntityId::from_raw(20);
        let far = EntityId::from_raw(21);
        physics.insert(near, Aabb::from_center(Vec2::new(2.0, 0.0), 0.5, 0.5), LayerMask::OBSTACLE);
        physics.insert(far, Aabb::from_center(Vec2::new(5.0, 0.0), 0.5, 0.5), LayerMask::OBSTACLE);

        let hit = physics
            .raycast(Vec2::ZERO, Vec2::X, 10.0, LayerMask::OBSTACLE)
            .expect("ray should hit");
        assert_eq!(hit.entity, near);
        assert!((hit.distance - 1.5).abs() < 1e-5);

        assert!(physics
            .raycast(Vec2::ZERO, Vec2::X, 1.0, LayerMask::OBSTACLE)
            .is_none());
        assert!(physics
            .raycast(Vec2::ZERO, Vec2::Y, 10.0, LayerMask::OBSTACLE)
            .is_none());
    }

    #[test]
    fn test_move_to_recenters() {
        let mut physics = MockPhysics::new();
        let id = EntityId::from_raw(30);
        physics.insert(id, Aabb::from_center(Vec2::ZERO, 0.5, 0.5), LayerMask::PLAYER);
        physics.move_to(id, Vec2::new(4.0, 1.0));

        assert!(physics.overlap_circle(Vec2::new(4.0, 1.0), 0.1, LayerMask::PLAYER).len() == 1);
        assert!(physics.overlap_circle(Vec2::ZERO, 0.1, LayerMask::PLAYER).is_empty());
    }
}
