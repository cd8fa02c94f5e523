//! Line of sight, visibility memory and attack-range containment.
//!
//! Perception knows nothing about behavior states. It is refreshed once per
//! decision tick with [`Perception::tick_vision`] and queried by the states
//! afterwards. Attack-range containment is recomputed on every call and is
//! never gated by sight or stealth.

use sentinel_common::{sign_or_positive, EntityId, Vec2};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::PerceptionConfig;
use crate::physics::PhysicsQuery;
use crate::target::{Target, TargetRegistry};

/// Below this distance the direction to the target falls back to forward.
const FACING_MIN_DISTANCE: f32 = 1e-4;
/// Below this distance the obstruction ray is skipped.
const RAY_MIN_DISTANCE: f32 = 1e-3;

/// Snapshot of what an agent currently knows about its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerceptionResult {
    /// Target visible this frame
    pub has_line_of_sight: bool,
    /// Last position the target was seen at
    pub last_known_position: Vec2,
    /// Seconds since the target was last visible
    pub time_since_last_seen: f32,
}

/// Returns true if `offset` lies inside the box with the given half-extents
/// (edges inclusive).
#[must_use]
pub fn within_box(offset: Vec2, half_x: f32, half_y: f32) -> bool {
    offset.x.abs() <= half_x && offset.y.abs() <= half_y
}

/// Dot product between the forward vector for `facing` and the direction to
/// the target. The direction falls back to forward when the target is on top
/// of the agent.
#[must_use]
pub fn facing_dot(facing: f32, to_target: Vec2) -> f32 {
    let forward = Vec2::new(sign_or_positive(facing), 0.0);
    let distance = to_target.length();
    let direction = if distance > FACING_MIN_DISTANCE {
        to_target / distance
    } else {
        forward
    };
    forward.dot(direction)
}

/// Per-agent perception state.
#[derive(Debug, Clone)]
pub struct Perception {
    config: PerceptionConfig,
    target: Option<EntityId>,
    has_line_of_sight: bool,
    last_seen_time: f32,
    last_known_center: Vec2,
}

impl Perception {
    /// Creates perception with nothing seen yet.
    #[must_use]
    pub fn new(config: PerceptionConfig) -> Self {
        Self {
            config,
            target: None,
            has_line_of_sight: false,
            last_seen_time: f32::NEG_INFINITY,
            last_known_center: Vec2::ZERO,
        }
    }

    /// Perception tuning.
    #[must_use]
    pub fn config(&self) -> &PerceptionConfig {
        &self.config
    }

    /// Attack box half-extents `(x, y)`.
    #[must_use]
    pub fn attack_range(&self) -> (f32, f32) {
        (self.config.attack_range_x, self.config.attack_range_y)
    }

    /// Base view distance.
    #[must_use]
    pub fn view_distance(&self) -> f32 {
        self.config.view_distance
    }

    /// Base lose distance.
    #[must_use]
    pub fn lose_distance(&self) -> f32 {
        self.view_distance() * self.config.lose_distance_multiplier
    }

    /// Resolves the target by tag, keeping the cached id while it still
    /// resolves.
    pub fn resolve_target(&mut self, targets: &dyn TargetRegistry) -> Option<EntityId> {
        if let Some(id) = self.target {
            if targets.get(id).is_some() {
                return Some(id);
            }
            trace!("Cached target {id} no longer resolves");
            self.target = None;
        }

        self.target = targets.find_tagged(&self.config.target_tag);
        if let Some(id) = self.target {
            trace!("Resolved target '{}' to {id}", self.config.target_tag);
        }
        self.target
    }

    /// Looks up the cached target.
    #[must_use]
    pub fn target<'t>(&self, targets: &'t dyn TargetRegistry) -> Option<&'t dyn Target> {
        self.target.and_then(|id| targets.get(id))
    }

    /// Whether the target counts as stealthed under the current rules.
    #[must_use]
    pub fn is_stealthed(&self, target: &dyn Target) -> bool {
        self.config.stealth_gating && target.stance().is_stealthed()
    }

    fn stealth_scale(&self, stealthed: bool) -> f32 {
        if stealthed {
            self.config.stealth_view_multiplier
        } else {
            1.0
        }
    }

    /// Refreshes line of sight from `agent_center` facing `facing` (sign of X).
    pub fn tick_vision(
        &mut self,
        agent_center: Vec2,
        facing: f32,
        targets: &dyn TargetRegistry,
        physics: &dyn PhysicsQuery,
        now: f32,
    ) {
        self.resolve_target(targets);
        let Some(target) = self.target(targets) else {
            self.has_line_of_sight = false;
            return;
        };

        let target_center = target.center();
        let stealthed = self.is_stealthed(target);
        let sight = self.evaluate_sight(agent_center, target_center, facing, stealthed, physics);

        self.has_line_of_sight = sight;
        if sight {
            self.last_seen_time = now;
            self.last_known_center = target_center;
        }
    }

    fn evaluate_sight(
        &self,
        agent_center: Vec2,
        target_center: Vec2,
        facing: f32,
        stealthed: bool,
        physics: &dyn PhysicsQuery,
    ) -> bool {
        let to_target = target_center - agent_center;
        let distance = to_target.length();
        let scale = self.stealth_scale(stealthed);
        let effective_view = self.view_distance() * scale;
        let effective_lose = self.lose_distance() * scale;

        if distance > effective_lose {
            return false;
        }

        if stealthed
            && self.config.require_facing_when_stealthed
            && facing_dot(facing, to_target) < self.config.front_dot_threshold
        {
            return false;
        }

        if !self.config.target_layer.is_empty()
            && physics
                .overlap_circle(agent_center, effective_view, self.config.target_layer)
                .is_empty()
        {
            return false;
        }

        if !self.config.obstacle_layer.is_empty()
            && distance > RAY_MIN_DISTANCE
            && physics
                .raycast(
                    agent_center,
                    to_target / distance,
                    distance,
                    self.config.obstacle_layer,
                )
                .is_some()
        {
            return false;
        }

        distance <= effective_view
    }

    /// Target visible as of the last refresh.
    #[must_use]
    pub fn has_line_of_sight(&self) -> bool {
        self.has_line_of_sight
    }

    /// Visible now, or seen within the memory window.
    #[must_use]
    pub fn has_target_in_memory(&self, now: f32) -> bool {
        self.has_line_of_sight || (now - self.last_seen_time) <= self.config.memory_seconds
    }

    /// Time of the last sighting (`-inf` if never seen).
    #[must_use]
    pub fn last_seen_time(&self) -> f32 {
        self.last_seen_time
    }

    /// Target center at the last sighting.
    #[must_use]
    pub fn last_known_center(&self) -> Vec2 {
        self.last_known_center
    }

    /// Whether the target center lies in the attack box around `agent_center`.
    #[must_use]
    pub fn is_in_attack_range(&self, agent_center: Vec2, targets: &dyn TargetRegistry) -> bool {
        let (half_x, half_y) = self.attack_range();
        self.is_in_scaled_range(agent_center, targets, half_x, half_y)
    }

    /// Attack-box test with explicit half-extents.
    #[must_use]
    pub fn is_in_scaled_range(
        &self,
        agent_center: Vec2,
        targets: &dyn TargetRegistry,
        half_x: f32,
        half_y: f32,
    ) -> bool {
        self.target(targets)
            .is_some_and(|target| within_box(target.center() - agent_center, half_x, half_y))
    }

    /// Distance between centers, `f32::INFINITY` without a target.
    #[must_use]
    pub fn distance_to_target(&self, agent_center: Vec2, targets: &dyn TargetRegistry) -> f32 {
        self.target(targets)
            .map_or(f32::INFINITY, |target| agent_center.distance(target.center()))
    }
}
