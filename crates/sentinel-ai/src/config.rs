//! Agent tuning.
//!
//! Every struct here deserializes with `#[serde(default)]`, so a config file
//! only needs to name the values it changes. Call [`AgentConfig::validate`]
//! after loading; the runtime assumes validated values.

use sentinel_common::{ConfigError, LayerMask, Vec2};
use serde::{Deserialize, Serialize};

/// How an agent is allowed to move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveMode {
    /// Side view: steering only drives X, Y belongs to gravity.
    Platformer,
    /// Free plane: steering drives both axes.
    #[default]
    TopDown,
}

/// Max speed and acceleration for one behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementTuning {
    /// Target speed (units/s)
    pub max_speed: f32,
    /// Velocity change per second (units/s²)
    pub acceleration: f32,
}

impl MovementTuning {
    /// Creates a tuning pair.
    #[must_use]
    pub const fn new(max_speed: f32, acceleration: f32) -> Self {
        Self {
            max_speed,
            acceleration,
        }
    }

    fn validate(
        &self,
        speed_field: &'static str,
        accel_field: &'static str,
    ) -> Result<(), ConfigError> {
        ConfigError::check_distance(speed_field, self.max_speed)?;
        ConfigError::check_distance(accel_field, self.acceleration)
    }
}

/// Patrol route and pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolConfig {
    /// Explicit first anchor; defaults to center - half range on X
    pub anchor_a: Option<Vec2>,
    /// Explicit second anchor; defaults to center + half range on X
    pub anchor_b: Option<Vec2>,
    /// Patrol center; defaults to the spawn position
    pub center_override: Option<Vec2>,
    /// Half range used when anchors are not given
    pub fallback_half_range: f32,
    /// Movement while patrolling
    pub tuning: MovementTuning,
    /// Pause at each anchor (seconds)
    pub wait_seconds: f32,
    /// Alternate A/B by rotation instead of ping-pong
    pub loop_a_to_b: bool,
    /// Arrival threshold on X
    pub arrive_x: f32,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            anchor_a: None,
            anchor_b: None,
            center_override: None,
            fallback_half_range: 3.0,
            tuning: MovementTuning::new(2.2, 14.0),
            wait_seconds: 0.7,
            loop_a_to_b: false,
            arrive_x: 0.20,
        }
    }
}

/// Chase pacing and attack-commit hysteresis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaseConfig {
    /// Movement while chasing
    pub tuning: MovementTuning,
    /// Scale applied to the attack box to get the start range (clamped to [1, 2])
    pub start_range_multiplier: f32,
    /// How long after touching the start range an attack may still begin
    pub commit_seconds: f32,
}

impl ChaseConfig {
    /// Upper clamp for [`Self::start_range_multiplier`].
    pub const MAX_START_RANGE_MULTIPLIER: f32 = 2.0;

    /// Start-range multiplier clamped to `[1, MAX_START_RANGE_MULTIPLIER]`.
    #[must_use]
    pub fn clamped_start_multiplier(&self) -> f32 {
        self.start_range_multiplier
            .clamp(1.0, Self::MAX_START_RANGE_MULTIPLIER)
    }
}

impl Default for ChaseConfig {
    fn default() -> Self {
        Self {
            tuning: MovementTuning::new(3.5, 20.0),
            start_range_multiplier: 1.35,
            commit_seconds: 0.35,
        }
    }
}

/// Search after losing sight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Movement while searching
    pub tuning: MovementTuning,
    /// Give up after this long (seconds)
    pub max_seconds: f32,
    /// Stop this close to the last known position
    pub arrive_distance: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tuning: MovementTuning::new(2.8, 18.0),
            max_seconds: 4.0,
            arrive_distance: 0.35,
        }
    }
}

/// Walk back to the patrol center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReturnConfig {
    /// Movement while returning
    pub tuning: MovementTuning,
    /// Arrival threshold on X
    pub arrive_x: f32,
}

impl Default for ReturnConfig {
    fn default() -> Self {
        Self {
            tuning: MovementTuning::new(2.6, 18.0),
            arrive_x: 0.20,
        }
    }
}

/// Attack windup/recover timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackConfig {
    /// Windup duration (seconds); the agent is parryable throughout
    pub windup_seconds: f32,
    /// Recover duration (seconds)
    pub recover_seconds: f32,
    /// Skip the range re-check while winding up
    pub lock_target_during_windup: bool,
    /// Vertical bias for the direct-strike snap
    pub vertical_bias: f32,
    /// Force a vertical direct strike when |y| reaches this
    pub force_vertical_abs_y: f32,
    /// Deceleration used while winding up
    pub stop_decel: f32,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            windup_seconds: 0.22,
            recover_seconds: 0.10,
            lock_target_during_windup: true,
            vertical_bias: 0.55,
            force_vertical_abs_y: 0.05,
            stop_decel: 45.0,
        }
    }
}

/// Vision, memory and attack-range box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Tag used to resolve the target
    pub target_tag: String,
    /// Base view distance
    pub view_distance: f32,
    /// Lose distance = view distance × this (in [1, 3])
    pub lose_distance_multiplier: f32,
    /// Memory window after losing sight (seconds)
    pub memory_seconds: f32,
    /// Optional overlap precheck layer; empty skips the precheck
    pub target_layer: LayerMask,
    /// Layers blocking sight; empty skips the ray query
    pub obstacle_layer: LayerMask,
    /// Apply stance-based stealth rules at all
    pub stealth_gating: bool,
    /// Require the target in the forward cone when stealthed
    pub require_facing_when_stealthed: bool,
    /// Minimum forward dot to count as "in front" (in [-1, 1])
    pub front_dot_threshold: f32,
    /// View distance scale when the target is stealthed (in [0.1, 1])
    pub stealth_view_multiplier: f32,
    /// Attack box half-extent on X
    pub attack_range_x: f32,
    /// Attack box half-extent on Y
    pub attack_range_y: f32,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            target_tag: "Player".to_string(),
            view_distance: 6.0,
            lose_distance_multiplier: 1.25,
            memory_seconds: 2.0,
            target_layer: LayerMask::NONE,
            obstacle_layer: LayerMask::OBSTACLE,
            stealth_gating: true,
            require_facing_when_stealthed: true,
            front_dot_threshold: 0.25,
            stealth_view_multiplier: 1.0,
            attack_range_x: 1.1,
            attack_range_y: 0.6,
        }
    }
}

/// Melee hitbox, damage and cooldown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeConfig {
    /// Hit circle radius
    pub radius: f32,
    /// Distance from origin to the hit circle along the strike direction
    pub offset: f32,
    /// Damage per hit
    pub damage: i32,
    /// Cooldown between resolved attempts (seconds)
    pub cooldown_seconds: f32,
    /// Layers that can be hit
    pub target_layer: LayerMask,
    /// Offset the hit circle along the strike direction
    pub directional: bool,
    /// Snap the strike direction to 4 cardinals
    pub snap_to_four: bool,
    /// Lower values favor vertical strikes
    pub vertical_bias: f32,
    /// Force vertical when |y| reaches this
    pub force_vertical_abs_y: f32,
}

impl Default for MeleeConfig {
    fn default() -> Self {
        Self {
            radius: 0.45,
            offset: 0.6,
            damage: 1,
            cooldown_seconds: 0.8,
            target_layer: LayerMask::PLAYER,
            directional: true,
            snap_to_four: true,
            vertical_bias: 0.65,
            force_vertical_abs_y: 0.35,
        }
    }
}

/// Short states and overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionConfig {
    /// Hit stagger duration (seconds)
    pub hit_seconds: f32,
    /// Delay between death and removal (seconds)
    pub despawn_seconds: f32,
    /// Deceleration while a parry stun is active
    pub parry_stun_decel: f32,
    /// Default deceleration for the Stunned state
    pub stunned_decel: f32,
    /// Speed above which the agent counts as moving
    pub moving_threshold: f32,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            hit_seconds: 0.18,
            despawn_seconds: 1.25,
            parry_stun_decel: 60.0,
            stunned_decel: 60.0,
            moving_threshold: 0.05,
        }
    }
}

/// Complete tuning for one agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Movement mode
    pub move_mode: MoveMode,
    /// Patrol
    pub patrol: PatrolConfig,
    /// Chase
    pub chase: ChaseConfig,
    /// Search
    pub search: SearchConfig,
    /// Return to patrol
    pub return_to_patrol: ReturnConfig,
    /// Attack
    pub attack: AttackConfig,
    /// Perception
    pub perception: PerceptionConfig,
    /// Melee executor
    pub melee: MeleeConfig,
    /// Hit, death and overrides
    pub reaction: ReactionConfig,
}

impl AgentConfig {
    /// Rejects negative or non-finite durations and distances, and
    /// multipliers outside their ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.patrol;
        ConfigError::check_distance("patrol.fallback_half_range", p.fallback_half_range)?;
        p.tuning.validate("patrol.tuning.max_speed", "patrol.tuning.acceleration")?;
        ConfigError::check_duration("patrol.wait_seconds", p.wait_seconds)?;
        ConfigError::check_distance("patrol.arrive_x", p.arrive_x)?;

        let c = &self.chase;
        c.tuning.validate("chase.tuning.max_speed", "chase.tuning.acceleration")?;
        ConfigError::check_distance("chase.start_range_multiplier", c.start_range_multiplier)?;
        ConfigError::check_duration("chase.commit_seconds", c.commit_seconds)?;

        let s = &self.search;
        s.tuning.validate("search.tuning.max_speed", "search.tuning.acceleration")?;
        ConfigError::check_duration("search.max_seconds", s.max_seconds)?;
        ConfigError::check_distance("search.arrive_distance", s.arrive_distance)?;

        let r = &self.return_to_patrol;
        r.tuning.validate(
            "return_to_patrol.tuning.max_speed",
            "return_to_patrol.tuning.acceleration",
        )?;
        ConfigError::check_distance("return_to_patrol.arrive_x", r.arrive_x)?;

        let a = &self.attack;
        ConfigError::check_duration("attack.windup_seconds", a.windup_seconds)?;
        ConfigError::check_duration("attack.recover_seconds", a.recover_seconds)?;
        ConfigError::check_distance("attack.force_vertical_abs_y", a.force_vertical_abs_y)?;
        ConfigError::check_distance("attack.stop_decel", a.stop_decel)?;

        let v = &self.perception;
        ConfigError::check_distance("perception.view_distance", v.view_distance)?;
        ConfigError::check_range(
            "perception.lose_distance_multiplier",
            v.lose_distance_multiplier,
            1.0,
            3.0,
        )?;
        ConfigError::check_duration("perception.memory_seconds", v.memory_seconds)?;
        ConfigError::check_range(
            "perception.front_dot_threshold",
            v.front_dot_threshold,
            -1.0,
            1.0,
        )?;
        ConfigError::check_range(
            "perception.stealth_view_multiplier",
            v.stealth_view_multiplier,
            0.1,
            1.0,
        )?;
        ConfigError::check_distance("perception.attack_range_x", v.attack_range_x)?;
        ConfigError::check_distance("perception.attack_range_y", v.attack_range_y)?;

        let m = &self.melee;
        ConfigError::check_distance("melee.radius", m.radius)?;
        ConfigError::check_distance("melee.offset", m.offset)?;
        ConfigError::check_duration("melee.cooldown_seconds", m.cooldown_seconds)?;
        ConfigError::check_distance("melee.force_vertical_abs_y", m.force_vertical_abs_y)?;

        let h = &self.reaction;
        ConfigError::check_duration("reaction.hit_seconds", h.hit_seconds)?;
        ConfigError::check_duration("reaction.despawn_seconds", h.despawn_seconds)?;
        ConfigError::check_distance("reaction.parry_stun_decel", h.parry_stun_decel)?;
        ConfigError::check_distance("reaction.stunned_decel", h.stunned_decel)?;
        ConfigError::check_distance("reaction.moving_threshold", h.moving_threshold)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(AgentConfig::default().validate().is_ok());
    }

    #[test]
    fn test_negative_duration_rejected() {
        let mut config = AgentConfig::default();
        config.attack.windup_seconds = -0.1;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidDuration {
                field: "attack.windup_seconds",
                value: -0.1
            })
        );
    }

    #[test]
    fn test_negative_radius_rejected() {
        let mut config = AgentConfig::default();
        config.melee.radius = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDistance {
                field: "melee.radius",
                ..
            })
        ));
    }

    #[test]
    fn test_lose_multiplier_range() {
        let mut config = AgentConfig::default();
        config.perception.lose_distance_multiplier = 0.9;
        assert!(config.validate().is_err());
        config.perception.lose_distance_multiplier = 3.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_start_multiplier_clamped() {
        let mut chase = ChaseConfig::default();
        assert!((chase.clamped_start_multiplier() - 1.35).abs() < f32::EPSILON);
        chase.start_range_multiplier = 5.0;
        assert_eq!(chase.clamped_start_multiplier(), 2.0);
        chase.start_range_multiplier = 0.5;
        assert_eq!(chase.clamped_start_multiplier(), 1.0);
    }
}
