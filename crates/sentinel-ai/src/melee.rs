//! Cooldown-gated melee executor.
//!
//! The executor owns a cooldown and a hit circle. It does not know about
//! behavior states; any caller may invoke [`MeleeAttack::try_attack`]
//! repeatedly and the cooldown decides whether a strike resolves.

use sentinel_common::{sign_or_positive, EntityId, Vec2, DIRECTION_EPSILON_SQ};
use tracing::{trace, warn};

use crate::config::MeleeConfig;
use crate::physics::PhysicsQuery;
use crate::target::DamageReceiver;

/// Snaps `raw` to one of the four cardinal directions.
///
/// Vertical wins when `|y| >= force_vertical_abs_y` or when
/// `|y| >= |x| * vertical_bias`. A zero component counts as positive.
/// A (near) zero input snaps to right.
#[must_use]
pub fn snap_to_cardinal(raw: Vec2, vertical_bias: f32, force_vertical_abs_y: f32) -> Vec2 {
    if raw.length_squared() < DIRECTION_EPSILON_SQ {
        return Vec2::X;
    }

    let (ax, ay) = (raw.x.abs(), raw.y.abs());
    let vertical = ay >= force_vertical_abs_y || ay >= ax * vertical_bias;
    if vertical {
        Vec2::new(0.0, sign_or_positive(raw.y))
    } else {
        Vec2::new(sign_or_positive(raw.x), 0.0)
    }
}

/// Melee executor state.
#[derive(Debug, Clone)]
pub struct MeleeAttack {
    config: MeleeConfig,
    cooldown: f32,
    last_hits: Vec<EntityId>,
}

impl MeleeAttack {
    /// Creates an executor ready to strike.
    #[must_use]
    pub fn new(config: MeleeConfig) -> Self {
        Self {
            config,
            cooldown: 0.0,
            last_hits: Vec::new(),
        }
    }

    /// Executor tuning.
    #[must_use]
    pub fn config(&self) -> &MeleeConfig {
        &self.config
    }

    /// True when the cooldown has elapsed.
    #[must_use]
    pub fn can_attack(&self) -> bool {
        self.cooldown <= 0.0
    }

    /// Seconds left on the cooldown.
    #[must_use]
    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown
    }

    /// Restarts the cooldown without striking.
    pub fn force_cooldown(&mut self) {
        self.cooldown = self.config.cooldown_seconds;
    }

    /// Advances the cooldown.
    pub fn tick(&mut self, dt: f32) {
        if self.cooldown > 0.0 {
            self.cooldown = (self.cooldown - dt).max(0.0);
        }
    }

    /// Entities damaged by the most recent resolved attempt.
    #[must_use]
    pub fn last_hits(&self) -> &[EntityId] {
        &self.last_hits
    }

    /// Direction the hit circle is offset along for a requested direction.
    #[must_use]
    pub fn resolve_direction(&self, direction: Vec2) -> Vec2 {
        if self.config.directional && self.config.snap_to_four {
            let raw = if direction.length_squared() < DIRECTION_EPSILON_SQ {
                Vec2::X
            } else {
                direction
            };
            snap_to_cardinal(raw, self.config.vertical_bias, self.config.force_vertical_abs_y)
        } else if direction.length_squared() < DIRECTION_EPSILON_SQ {
            Vec2::X
        } else {
            direction.normalize()
        }
    }

    /// Center of the hit circle for a strike from `origin`.
    #[must_use]
    pub fn hit_point(&self, origin: Vec2, direction: Vec2) -> Vec2 {
        if self.config.directional {
            origin + self.resolve_direction(direction) * self.config.offset
        } else {
            origin
        }
    }

    /// Strikes from `origin` along `direction`.
    ///
    /// Rejected (returns false, no side effects) while on cooldown. Otherwise
    /// the cooldown restarts whether or not anything is hit, and every
    /// overlapped entity that accepts damage takes it once, attributed to
    /// `source`. Returns whether any damage was applied.
    pub fn try_attack(
        &mut self,
        origin: Vec2,
        source: Vec2,
        direction: Vec2,
        physics: &dyn PhysicsQuery,
        receivers: &mut dyn DamageReceiver,
    ) -> bool {
        if !self.can_attack() {
            trace!("Melee blocked by cooldown ({:.2}s)", self.cooldown);
            return false;
        }

        if self.config.target_layer.is_empty() {
            warn!("Melee target layer is empty; strikes can never hit");
        }

        self.cooldown = self.config.cooldown_seconds;
        self.last_hits.clear();

        let point = self.hit_point(origin, direction);
        let colliders = physics.overlap_circle(point, self.config.radius, self.config.target_layer);
        trace!(
            "Melee strike raw={direction} point={point} r={} hits={}",
            self.config.radius,
            colliders.len()
        );

        for collider in colliders {
            if self.last_hits.contains(&collider.entity) {
                continue;
            }
            if receivers.apply_damage(collider.entity, self.config.damage, source) {
                trace!("Melee hit {} for {}", collider.entity, self.config.damage);
                self.last_hits.push(collider.entity);
            }
        }

        !self.last_hits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::MockPhysics;
    use crate::target::MockReceivers;
    use proptest::prelude::*;
    use sentinel_common::{Aabb, LayerMask};

    fn player() -> EntityId {
        EntityId::from_raw(50)
    }

    fn setup(player_at: Vec2) -> (MockPhysics, MockReceivers) {
        let mut physics = MockPhysics::new();
        physics.insert(player(), Aabb::from_center(player_at, 0.3, 0.5), LayerMask::PLAYER);
        let mut receivers = MockReceivers::new();
        receivers.accept(player());
        (physics, receivers)
    }

    #[test]
    fn test_snap_directions() {
        assert_eq!(snap_to_cardinal(Vec2::new(1.0, 0.2), 0.65, 0.35), Vec2::X);
        assert_eq!(snap_to_cardinal(Vec2::new(-1.0, 0.2), 0.65, 0.35), Vec2::NEG_X);
        assert_eq!(snap_to_cardinal(Vec2::new(1.0, 0.7), 0.65, 5.0), Vec2::Y);
        assert_eq!(snap_to_cardinal(Vec2::new(3.0, -0.4), 0.65, 0.35), Vec2::NEG_Y);
        assert_eq!(snap_to_cardinal(Vec2::ZERO, 0.65, 0.35), Vec2::X);
    }

    #[test]
    fn test_hit_applies_damage() {
        let (physics, mut receivers) = setup(Vec2::new(0.6, 0.0));
        let mut melee = MeleeAttack::new(MeleeConfig::default());

        assert!(melee.try_attack(Vec2::ZERO, Vec2::ZERO, Vec2::X, &physics, &mut receivers));
        assert_eq!(receivers.total(player()), 1);
        assert_eq!(melee.last_hits(), &[player()]);
    }

    #[test]
    fn test_miss_still_resets_cooldown() {
        let (physics, mut receivers) = setup(Vec2::new(0.6, 0.0));
        let mut melee = MeleeAttack::new(MeleeConfig::default());

        assert!(!melee.try_attack(Vec2::ZERO, Vec2::ZERO, Vec2::NEG_X, &physics, &mut receivers));
        assert!(!melee.can_attack());
        assert_eq!(receivers.total(player()), 0);
    }

    #[test]
    fn test_blocked_by_cooldown() {
        let (physics, mut receivers) = setup(Vec2::new(0.6, 0.0));
        let mut melee = MeleeAttack::new(MeleeConfig::default());

        assert!(melee.try_attack(Vec2::ZERO, Vec2::ZERO, Vec2::X, &physics, &mut receivers));
        assert!(!melee.try_attack(Vec2::ZERO, Vec2::ZERO, Vec2::X, &physics, &mut receivers));
        assert_eq!(receivers.total(player()), 1);
    }

    #[test]
    fn test_cooldown_law() {
        let (physics, mut receivers) = setup(Vec2::new(10.0, 0.0));
        let mut config = MeleeConfig::default();
        config.cooldown_seconds = 0.75;
        let mut melee = MeleeAttack::new(config);

        melee.try_attack(Vec2::ZERO, Vec2::ZERO, Vec2::X, &physics, &mut receivers);
        assert!(!melee.can_attack());
        melee.tick(0.25);
        melee.tick(0.25);
        assert!(!melee.can_attack());
        melee.tick(0.25);
        assert!(melee.can_attack());
    }

    #[test]
    fn test_force_cooldown() {
        let mut melee = MeleeAttack::new(MeleeConfig::default());
        assert!(melee.can_attack());
        melee.force_cooldown();
        assert!(!melee.can_attack());
        assert_eq!(melee.cooldown_remaining(), 0.8);
    }

    #[test]
    fn test_non_receiver_not_counted() {
        let mut physics = MockPhysics::new();
        physics.insert(
            EntityId::from_raw(77),
            Aabb::from_center(Vec2::new(0.6, 0.0), 0.3, 0.3),
            LayerMask::PLAYER,
        );
        let mut receivers = MockReceivers::new();
        let mut melee = MeleeAttack::new(MeleeConfig::default());

        assert!(!melee.try_attack(Vec2::ZERO, Vec2::ZERO, Vec2::X, &physics, &mut receivers));
        assert!(melee.last_hits().is_empty());
    }

    #[test]
    fn test_non_directional_hits_at_origin() {
        let mut config = MeleeConfig::default();
        config.directional = false;
        let melee = MeleeAttack::new(config);
        assert_eq!(melee.hit_point(Vec2::new(1.0, 1.0), Vec2::Y), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_unsnapped_direction_normalized() {
        let mut config = MeleeConfig::default();
        config.snap_to_four = false;
        let melee = MeleeAttack::new(config);
        let dir = melee.resolve_direction(Vec2::new(3.0, 4.0));
        assert!((dir - Vec2::new(0.6, 0.8)).length() < 1e-6);
        assert_eq!(melee.resolve_direction(Vec2::ZERO), Vec2::X);
    }

    proptest! {
        #[test]
        fn prop_snap_is_cardinal(
            x in -10.0f32..10.0,
            y in -10.0f32..10.0,
            bias in 0.2f32..1.0,
            force in 0.0f32..5.0,
        ) {
            prop_assume!(Vec2::new(x, y).length_squared() >= DIRECTION_EPSILON_SQ);
            let dir = snap_to_cardinal(Vec2::new(x, y), bias, force);
            prop_assert!([Vec2::X, Vec2::NEG_X, Vec2::Y, Vec2::NEG_Y].contains(&dir));
            if dir.x != 0.0 && x != 0.0 {
                prop_assert_eq!(dir.x.signum(), x.signum());
            }
            if dir.y != 0.0 && y != 0.0 {
                prop_assert_eq!(dir.y.signum(), y.signum());
            }
        }
    }
}
