//! # Sentinel AI
//!
//! Enemy agent behavior for 2D action games.
//!
//! This crate provides:
//! - Perception (line of sight, short-term memory, stealth gating)
//! - A cooldown-gated melee executor with cardinal direction snapping
//! - The behavior state machine (Patrol, Chase, Attack, Search, ...)
//! - The agent controller with decision / physics ticks and stun / push overrides
//! - Host seams (`PhysicsQuery`, `AgentBody`, `TargetRegistry`,
//!   `DamageReceiver`, `AttackAnimator`) plus in-memory mocks
//! - Event bus for lifecycle notifications

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod agent;
pub mod animation;
pub mod config;
pub mod events;
pub mod melee;
pub mod movement;
pub mod perception;
pub mod physics;
pub mod states;
pub mod target;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::agent::*;
    pub use crate::animation::*;
    pub use crate::config::*;
    pub use crate::events::*;
    pub use crate::melee::*;
    pub use crate::perception::*;
    pub use crate::physics::*;
    pub use crate::states::*;
    pub use crate::target::*;
}

pub use prelude::*;
