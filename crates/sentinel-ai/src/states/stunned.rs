use super::{chase_or, AgentState, BehaviorState, Transition};
use crate::agent::{AgentContext, AgentCore};

/// Timed lock with its own deceleration profile.
#[derive(Debug, Clone, PartialEq)]
pub struct StunnedState {
    duration: f32,
    decel: f32,
    timer: f32,
}

impl StunnedState {
    /// Stun lasting `seconds`, braking at `decel`. Both clamp to zero.
    #[must_use]
    pub fn new(seconds: f32, decel: f32) -> Self {
        let duration = seconds.max(0.0);
        Self {
            duration,
            decel: decel.max(0.0),
            timer: duration,
        }
    }

    /// Seconds of stun left.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        self.timer
    }
}

impl AgentState for StunnedState {
    fn enter(&mut self, core: &mut AgentCore) {
        self.timer = self.duration;
        core.parryable = false;
        core.stop(self.decel);
    }

    fn tick(&mut self, core: &mut AgentCore, _ctx: &mut AgentContext<'_>, dt: f32) -> Transition {
        self.timer -= dt;
        if self.timer > 0.0 {
            return None;
        }
        Some(chase_or(core, BehaviorState::return_to_patrol()))
    }

    fn fixed_tick(
        &mut self,
        core: &mut AgentCore,
        _ctx: &mut AgentContext<'_>,
        _dt: f32,
    ) -> Transition {
        core.stop(self.decel);
        None
    }
}
