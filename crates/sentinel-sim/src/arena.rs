//! Demo arena: static walls plus moving box colliders.
//!
//! Bodies are plain kinematic boxes. Walls push them out along the axis of
//! least penetration; bodies never collide with each other.

use sentinel_ai::{AgentBody, Collider, PhysicsQuery, RayHit};
use sentinel_common::{Aabb, EntityId, LayerMask, Vec2};

use crate::config::WallConfig;

/// Kinematic box body steered by an agent.
#[derive(Debug, Clone, PartialEq)]
pub struct SimBody {
    /// Center position
    pub position: Vec2,
    /// Linear velocity
    pub velocity: Vec2,
    /// Collider half extents
    pub half_extents: Vec2,
    /// Whether the body collides with walls and shows up in queries
    pub collision_enabled: bool,
}

impl SimBody {
    /// Creates a resting body.
    #[must_use]
    pub fn new(position: Vec2, half_extents: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            half_extents,
            collision_enabled: true,
        }
    }

    /// World-space collider bounds.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.position, self.half_extents.x, self.half_extents.y)
    }

    /// Integrates position by the current velocity.
    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }
}

impl AgentBody for SimBody {
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
        Some(self.position)
    }

    fn set_collision_enabled(&mut self, enabled: bool) {
        self.collision_enabled = enabled;
    }
}

/// Static walls and the colliders of everything that moves.
#[derive(Debug, Default)]
pub struct Arena {
    walls: Vec<(EntityId, Aabb)>,
    colliders: Vec<(EntityId, Aabb, LayerMask)>,
}

impl Arena {
    /// Builds the wall set.
    #[must_use]
    pub fn new(walls: &[WallConfig]) -> Self {
        Self {
            walls: walls
                .iter()
                .map(|w| {
                    (
                        EntityId::new(),
                        Aabb::from_center(w.center, w.half_extents.x, w.half_extents.y),
                    )
                })
                .collect(),
            colliders: Vec::new(),
        }
    }

    /// Wall count.
    #[must_use]
    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }

    /// Adds or moves a dynamic collider.
    pub fn set_collider(&mut self, entity: EntityId, bounds: Aabb, layer: LayerMask) {
        match self.colliders.iter_mut().find(|(id, _, _)| *id == entity) {
            Some(entry) => {
                entry.1 = bounds;
                entry.2 = layer;
            },
            None => self.colliders.push((entity, bounds, layer)),
        }
    }

    /// Removes a dynamic collider.
    pub fn remove_collider(&mut self, entity: EntityId) {
        self.colliders.retain(|(id, _, _)| *id != entity);
    }

    /// Pushes `body` out of every wall it overlaps and cancels the velocity
    /// component driving it in.
    pub fn resolve_walls(&self, body: &mut SimBody) {
        if !body.collision_enabled {
            return;
        }

        for (_, wall) in &self.walls {
            let bounds = body.bounds();
            if !bounds.overlaps(wall) {
                continue;
            }

            let push_left = bounds.max.x - wall.min.x;
            let push_right = wall.max.x - bounds.min.x;
            let push_down = bounds.max.y - wall.min.y;
            let push_up = wall.max.y - bounds.min.y;

            let dx = if push_left < push_right { -push_left } else { push_right };
            let dy = if push_down < push_up { -push_down } else { push_up };

            if dx.abs() < dy.abs() {
                body.position.x += dx;
                if body.velocity.x * dx < 0.0 {
                    body.velocity.x = 0.0;
                }
            } else {
                body.position.y += dy;
                if body.velocity.y * dy < 0.0 {
                    body.velocity.y = 0.0;
                }
            }
        }
    }

    fn all(&self) -> impl Iterator<Item = (EntityId, &Aabb, LayerMask)> {
        self.walls
            .iter()
            .map(|(id, bounds)| (*id, bounds, LayerMask::OBSTACLE))
            .chain(
                self.colliders
                    .iter()
                    .map(|(id, bounds, layer)| (*id, bounds, *layer)),
            )
    }
}

impl PhysicsQuery for Arena {
    fn overlap_circle(&self, center: Vec2, radius: f32, layers: LayerMask) -> Vec<Collider> {
        self.all()
            .filter(|(_, bounds, layer)| {
                layers.intersects(*layer) && bounds.overlaps_circle(center, radius)
            })
            .map(|(entity, _, layer)| Collider { entity, layer })
            .collect()
    }

    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        layers: LayerMask,
    ) -> Option<RayHit> {
        self.all()
            .filter(|(_, _, layer)| layers.intersects(*layer))
            .filter_map(|(entity, bounds, _)| {
                bounds
                    .ray_entry(origin, direction)
                    .filter(|d| *d <= max_distance)
                    .map(|distance| RayHit {
                        entity,
                        point: origin + direction * distance,
                        distance,
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
