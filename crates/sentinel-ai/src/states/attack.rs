use serde::{Deserialize, Serialize};

use super::{AgentState, BehaviorState, Transition};
use crate::agent::{AgentContext, AgentCore};

/// Sub-phase of [`AttackState`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackPhase {
    /// Telegraphing; the agent is parryable.
    #[default]
    Windup,
    /// Strike dispatched, waiting to resume the chase.
    Recover,
}

/// Windup then Recover. The strike is dispatched when the windup expires.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttackState {
    phase: AttackPhase,
    timer: f32,
}

impl AttackState {
    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> AttackPhase {
        self.phase
    }

    /// Seconds left in the current phase.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        self.timer
    }
}

impl AgentState for AttackState {
    fn enter(&mut self, core: &mut AgentCore) {
        self.phase = AttackPhase::Windup;
        self.timer = core.config.attack.windup_seconds;
        core.parryable = true;
        core.stop(core.config.attack.stop_decel);
    }

    fn tick(&mut self, core: &mut AgentCore, ctx: &mut AgentContext<'_>, dt: f32) -> Transition {
        let Some(target_center) = core.target_center(ctx.targets) else {
            core.parryable = false;
            return Some(BehaviorState::return_to_patrol());
        };

        let locked =
            core.config.attack.lock_target_during_windup && self.phase == AttackPhase::Windup;
        if !locked && !core.is_target_in_attack_range(ctx.targets) {
            core.parryable = false;
            return Some(if !core.can_see_target() && core.has_target_in_memory() {
                BehaviorState::search()
            } else {
                BehaviorState::chase()
            });
        }

        self.timer -= dt;
        if self.timer > 0.0 {
            return None;
        }

        match self.phase {
            AttackPhase::Windup => {
                core.parryable = false;
                let raw = target_center - core.center();
                core.dispatch_strike(raw, ctx);
                self.phase = AttackPhase::Recover;
                self.timer = core.config.attack.recover_seconds;
                None
            },
            AttackPhase::Recover => Some(BehaviorState::chase()),
        }
    }

    fn fixed_tick(
        &mut self,
        core: &mut AgentCore,
        _ctx: &mut AgentContext<'_>,
        _dt: f32,
    ) -> Transition {
        if self.phase == AttackPhase::Windup {
            core.stop(core.config.attack.stop_decel);
        }
        None
    }

    fn exit(&mut self, core: &mut AgentCore) {
        core.parryable = false;
    }
}
