//! Event bus for agent notifications.
//!
//! Agents publish through a cloned [`Sender`]; the host drains the bus once
//! per frame. Agents send with `try_send`: when the bus is full the event is
//! dropped.

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use sentinel_common::{EntityId, Vec2};

use crate::states::StateKind;

/// Event types published by agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentEvent {
    /// A behavior state was entered
    StateEntered {
        /// Agent
        agent: EntityId,
        /// State entered
        state: StateKind,
    },
    /// A behavior state was exited
    StateExited {
        /// Agent
        agent: EntityId,
        /// State exited
        state: StateKind,
    },
    /// A strike was dispatched at the end of a windup
    AttackDispatched {
        /// Attacking agent
        agent: EntityId,
        /// Raw direction towards the target
        direction: Vec2,
        /// Whether the strike went through the animation hook
        via_animator: bool,
        /// Whether a direct strike damaged anything
        hit: bool,
    },
    /// A parry attempt against the agent succeeded
    Parried {
        /// Parried agent
        agent: EntityId,
    },
    /// The agent died (published exactly once)
    Killed {
        /// Dead agent
        agent: EntityId,
        /// Position at death
        position: Vec2,
    },
    /// The despawn delay elapsed and the agent was marked for removal
    Despawned {
        /// Removed agent
        agent: EntityId,
    },
}

impl AgentEvent {
    /// Agent the event concerns.
    #[must_use]
    pub fn agent(&self) -> EntityId {
        match self {
            Self::StateEntered { agent, .. }
            | Self::StateExited { agent, .. }
            | Self::AttackDispatched { agent, .. }
            | Self::Parried { agent }
            | Self::Killed { agent, .. }
            | Self::Despawned { agent } => *agent,
        }
    }
}

/// Bounded queue between agents and the host.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<AgentEvent>,
    receiver: Receiver<AgentEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a bus holding up to `capacity` undrained events (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self { sender, receiver }
    }

    /// Handle agents publish through.
    #[must_use]
    pub fn sender(&self) -> Sender<AgentEvent> {
        self.sender.clone()
    }

    /// Takes every queued event, oldest first.
    pub fn drain(&self) -> Vec<AgentEvent> {
        self.receiver.try_iter().collect()
    }
}
