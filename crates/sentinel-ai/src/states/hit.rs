use super::{chase_or, AgentState, BehaviorState, Transition};
use crate::agent::{AgentContext, AgentCore};

const ENTER_DECEL: f32 = 60.0;
const HOLD_DECEL: f32 = 70.0;

/// Short stagger after taking damage.
#[derive(Debug, Clone, PartialEq)]
pub struct HitState {
    timer: f32,
}

impl HitState {
    /// Stagger lasting `seconds` (negative clamps to zero).
    #[must_use]
    pub fn new(seconds: f32) -> Self {
        Self {
            timer: seconds.max(0.0),
        }
    }

    /// Seconds of stagger left.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        self.timer
    }
}

impl AgentState for HitState {
    fn enter(&mut self, core: &mut AgentCore) {
        core.stop(ENTER_DECEL);
    }

    fn tick(&mut self, core: &mut AgentCore, _ctx: &mut AgentContext<'_>, dt: f32) -> Transition {
        self.timer -= dt;
        if self.timer > 0.0 {
            return None;
        }
        Some(chase_or(core, BehaviorState::patrol()))
    }

    fn fixed_tick(
        &mut self,
        core: &mut AgentCore,
        _ctx: &mut AgentContext<'_>,
        _dt: f32,
    ) -> Transition {
        core.stop(HOLD_DECEL);
        None
    }
}
