//! Target capability surface.
//!
//! Agents never own their target. They look it up by tag through a
//! [`TargetRegistry`], cache the resulting [`EntityId`], and read position
//! and stance through the [`Target`] trait each frame.

use ahash::AHashMap;
use sentinel_common::{EntityId, Vec2};
use serde::{Deserialize, Serialize};

/// Stealth-relevant stance flags reported by a target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stance {
    /// Target is crouching
    pub crouching: bool,
    /// Target is lying prone
    pub prone: bool,
}

impl Stance {
    /// Standing upright.
    pub const STANDING: Self = Self {
        crouching: false,
        prone: false,
    };

    /// Lying prone.
    pub const PRONE: Self = Self {
        crouching: false,
        prone: true,
    };

    /// Crouching.
    pub const CROUCHING: Self = Self {
        crouching: true,
        prone: false,
    };

    /// Returns true when the stance reduces visibility.
    #[must_use]
    pub const fn is_stealthed(self) -> bool {
        self.crouching || self.prone
    }
}

/// Read-only view of something an agent can perceive and chase.
pub trait Target {
    /// World position (pivot).
    fn position(&self) -> Vec2;

    /// Center of the collision bounds, if any.
    fn collider_center(&self) -> Option<Vec2> {
        None
    }

    /// Current stance.
    fn stance(&self) -> Stance {
        Stance::STANDING
    }

    /// Collider center when available, raw position otherwise.
    fn center(&self) -> Vec2 {
        self.collider_center().unwrap_or_else(|| self.position())
    }
}

/// Lookup service resolving targets by tag and id.
pub trait TargetRegistry {
    /// Finds the entity carrying `tag`.
    fn find_tagged(&self, tag: &str) -> Option<EntityId>;

    /// Resolves a previously found entity. `None` once it no longer exists.
    fn get(&self, id: EntityId) -> Option<&dyn Target>;
}

/// Damage intake capability.
pub trait DamageReceiver {
    /// Applies damage to `entity` from a source at `source`.
    ///
    /// Returns false when the entity does not accept damage.
    fn apply_damage(&mut self, entity: EntityId, amount: i32, source: Vec2) -> bool;
}

// ============================================================================
// Test doubles
// ============================================================================

/// Plain target for tests and the demo host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MockTarget {
    /// Pivot position
    pub position: Vec2,
    /// Offset from pivot to collider center, if the target has a collider
    pub center_offset: Option<Vec2>,
    /// Current stance
    pub stance: Stance,
}

impl MockTarget {
    /// Creates a standing target at `position` without a collider.
    #[must_use]
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            center_offset: None,
            stance: Stance::STANDING,
        }
    }
}

impl Target for MockTarget {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn collider_center(&self) -> Option<Vec2> {
        self.center_offset.map(|offset| self.position + offset)
    }

    fn stance(&self) -> Stance {
        self.stance
    }
}

/// Tag-indexed collection of [`MockTarget`]s.
#[derive(Debug, Default)]
pub struct MockTargets {
    targets: AHashMap<EntityId, MockTarget>,
    tags: AHashMap<String, EntityId>,
}

impl MockTargets {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a target under `tag`, replacing any previous holder.
    pub fn insert(&mut self, tag: &str, id: EntityId, target: MockTarget) {
        self.targets.insert(id, target);
        self.tags.insert(tag.to_string(), id);
    }

    /// Removes a target; its tag stops resolving.
    pub fn remove(&mut self, id: EntityId) {
        self.targets.remove(&id);
        self.tags.retain(|_, v| *v != id);
    }

    /// Mutable access for scripting movement and stance.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut MockTarget> {
        self.targets.get_mut(&id)
    }
}

impl TargetRegistry for MockTargets {
    fn find_tagged(&self, tag: &str) -> Option<EntityId> {
        self.tags.get(tag).copied()
    }

    fn get(&self, id: EntityId) -> Option<&dyn Target> {
        self.targets.get(&id).map(|t| t as &dyn Target)
    }
}

/// Damage ledger that accepts damage for a fixed set of entities.
#[derive(Debug, Default)]
pub struct MockReceivers {
    accepting: AHashMap<EntityId, i32>,
    /// Every accepted application, in order: (entity, amount, source)
    pub log: Vec<(EntityId, i32, Vec2)>,
}

impl MockReceivers {
    /// Creates a ledger accepting nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `entity` accept damage.
    pub fn accept(&mut self, entity: EntityId) {
        self.accepting.entry(entity).or_insert(0);
    }

    /// Total damage taken by `entity`.
    #[must_use]
    pub fn total(&self, entity: EntityId) -> i32 {
        self.accepting.get(&entity).copied().unwrap_or(0)
    }
}

impl DamageReceiver for MockReceivers {
    fn apply_damage(&mut self, entity: EntityId, amount: i32, source: Vec2) -> bool {
        match self.accepting.get_mut(&entity) {
            Some(total) => {
                *total += amount;
                self.log.push((entity, amount, source));
                true
            },
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stance_stealth() {
        assert!(!Stance::STANDING.is_stealthed());
        assert!(Stance::PRONE.is_stealthed());
        assert!(Stance::CROUCHING.is_stealthed());
    }

    #[test]
    fn test_target_center_prefers_collider() {
        let mut target = MockTarget::at(Vec2::new(2.0, 0.0));
        assert_eq!(target.center(), Vec2::new(2.0, 0.0));

        target.center_offset = Some(Vec2::new(0.0, 0.5));
        assert_eq!(target.center(), Vec2::new(2.0, 0.5));
    }

    #[test]
    fn test_registry_drops_removed() {
        let mut targets = MockTargets::new();
        let id = EntityId::from_raw(7);
        targets.insert("Player", id, MockTarget::at(Vec2::ZERO));

        assert_eq!(targets.find_tagged("Player"), Some(id));
        assert!(targets.get(id).is_some());

        targets.remove(id);
        assert_eq!(targets.find_tagged("Player"), None);
        assert!(targets.get(id).is_none());
    }

    #[test]
    fn test_receivers_only_accept_registered() {
        let mut receivers = MockReceivers::new();
        let player = EntityId::from_raw(1);
        let crate_box = EntityId::from_raw(2);
        receivers.accept(player);

        assert!(receivers.apply_damage(player, 2, Vec2::ZERO));
        assert!(!receivers.apply_damage(crate_box, 2, Vec2::ZERO));
        assert_eq!(receivers.total(player), 2);
        assert_eq!(receivers.log.len(), 1);
    }
}
