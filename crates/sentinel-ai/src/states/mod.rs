//! Behavior state machine.
//!
//! Exactly one [`BehaviorState`] is active per agent. Each state implements
//! [`AgentState`]: `enter` once when it becomes active, `tick` every decision
//! frame, `fixed_tick` every physics step not pre-empted by an override, and
//! `exit` once when it is replaced. `tick` and `fixed_tick` request a
//! transition by returning the next state; the agent applies it at once
//! (old `exit`, then new `enter`) and the old state is dropped.

mod attack;
mod chase;
mod die;
mod hit;
mod idle;
mod patrol;
mod return_to_patrol;
mod search;
mod stunned;

pub use attack::{AttackPhase, AttackState};
pub use chase::ChaseState;
pub use die::DieState;
pub use hit::HitState;
pub use idle::IdleState;
pub use patrol::PatrolState;
pub use return_to_patrol::ReturnToPatrolState;
pub use search::SearchState;
pub use stunned::StunnedState;

use serde::{Deserialize, Serialize};

use crate::agent::{AgentContext, AgentCore};

/// State requested by `tick` / `fixed_tick`, if any.
pub type Transition = Option<BehaviorState>;

/// Enter / Tick / FixedTick / Exit contract shared by every state.
pub trait AgentState {
    /// Called once when the state becomes active.
    fn enter(&mut self, _core: &mut AgentCore) {}

    /// Decision step (variable rate).
    fn tick(&mut self, core: &mut AgentCore, ctx: &mut AgentContext<'_>, dt: f32) -> Transition;

    /// Physics step (fixed rate).
    fn fixed_tick(
        &mut self,
        _core: &mut AgentCore,
        _ctx: &mut AgentContext<'_>,
        _dt: f32,
    ) -> Transition {
        None
    }

    /// Called once when the state is replaced.
    fn exit(&mut self, _core: &mut AgentCore) {}
}

/// Discriminant of [`BehaviorState`], used in events and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateKind {
    /// Standing still
    Idle,
    /// Walking between anchors
    Patrol,
    /// Pursuing a visible target
    Chase,
    /// Walking to the last known position
    Search,
    /// Walking back to the patrol center
    ReturnToPatrol,
    /// Winding up or recovering from a strike
    Attack,
    /// Staggered by damage
    Hit,
    /// Locked by a stun
    Stunned,
    /// Dead, waiting for removal
    Die,
}

impl StateKind {
    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Patrol => "Patrol",
            Self::Chase => "Chase",
            Self::Search => "Search",
            Self::ReturnToPatrol => "ReturnToPatrol",
            Self::Attack => "Attack",
            Self::Hit => "Hit",
            Self::Stunned => "Stunned",
            Self::Die => "Die",
        }
    }
}

impl std::fmt::Display for StateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The active behavior of an agent.
#[derive(Debug, Clone, PartialEq)]
pub enum BehaviorState {
    /// See [`IdleState`]
    Idle(IdleState),
    /// See [`PatrolState`]
    Patrol(PatrolState),
    /// See [`ChaseState`]
    Chase(ChaseState),
    /// See [`SearchState`]
    Search(SearchState),
    /// See [`ReturnToPatrolState`]
    ReturnToPatrol(ReturnToPatrolState),
    /// See [`AttackState`]
    Attack(AttackState),
    /// See [`HitState`]
    Hit(HitState),
    /// See [`StunnedState`]
    Stunned(StunnedState),
    /// See [`DieState`]
    Die(DieState),
}

macro_rules! dispatch {
    ($self:ident, $state:ident => $body:expr) => {
        match $self {
            BehaviorState::Idle($state) => $body,
            BehaviorState::Patrol($state) => $body,
            BehaviorState::Chase($state) => $body,
            BehaviorState::Search($state) => $body,
            BehaviorState::ReturnToPatrol($state) => $body,
            BehaviorState::Attack($state) => $body,
            BehaviorState::Hit($state) => $body,
            BehaviorState::Stunned($state) => $body,
            BehaviorState::Die($state) => $body,
        }
    };
}

impl BehaviorState {
    /// Fresh Idle state.
    #[must_use]
    pub fn idle() -> Self {
        Self::Idle(IdleState)
    }

    /// Fresh Patrol state.
    #[must_use]
    pub fn patrol() -> Self {
        Self::Patrol(PatrolState::default())
    }

    /// Fresh Chase state.
    #[must_use]
    pub fn chase() -> Self {
        Self::Chase(ChaseState::default())
    }

    /// Fresh Search state.
    #[must_use]
    pub fn search() -> Self {
        Self::Search(SearchState::default())
    }

    /// Fresh ReturnToPatrol state.
    #[must_use]
    pub fn return_to_patrol() -> Self {
        Self::ReturnToPatrol(ReturnToPatrolState)
    }

    /// Fresh Attack state.
    #[must_use]
    pub fn attack() -> Self {
        Self::Attack(AttackState::default())
    }

    /// Discriminant.
    #[must_use]
    pub fn kind(&self) -> StateKind {
        match self {
            Self::Idle(_) => StateKind::Idle,
            Self::Patrol(_) => StateKind::Patrol,
            Self::Chase(_) => StateKind::Chase,
            Self::Search(_) => StateKind::Search,
            Self::ReturnToPatrol(_) => StateKind::ReturnToPatrol,
            Self::Attack(_) => StateKind::Attack,
            Self::Hit(_) => StateKind::Hit,
            Self::Stunned(_) => StateKind::Stunned,
            Self::Die(_) => StateKind::Die,
        }
    }
}

impl AgentState for BehaviorState {
    fn enter(&mut self, core: &mut AgentCore) {
        dispatch!(self, state => state.enter(core));
    }

    fn tick(&mut self, core: &mut AgentCore, ctx: &mut AgentContext<'_>, dt: f32) -> Transition {
        dispatch!(self, state => state.tick(core, ctx, dt))
    }

    fn fixed_tick(
        &mut self,
        core: &mut AgentCore,
        ctx: &mut AgentContext<'_>,
        dt: f32,
    ) -> Transition {
        dispatch!(self, state => state.fixed_tick(core, ctx, dt))
    }

    fn exit(&mut self, core: &mut AgentCore) {
        dispatch!(self, state => state.exit(core));
    }
}

/// Chase when the target is visible or remembered, otherwise `fallback`.
fn chase_or(core: &AgentCore, fallback: BehaviorState) -> BehaviorState {
    if core.can_see_target() || core.has_target_in_memory() {
        BehaviorState::chase()
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(BehaviorState::patrol().kind(), StateKind::Patrol);
        assert_eq!(BehaviorState::return_to_patrol().kind().to_string(), "ReturnToPatrol");
        assert_eq!(
            BehaviorState::Stunned(StunnedState::new(1.0, 60.0)).kind(),
            StateKind::Stunned
        );
    }
}
