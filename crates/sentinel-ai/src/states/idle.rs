use super::{AgentState, BehaviorState, Transition};
use crate::agent::{AgentContext, AgentCore};

const STOP_DECEL: f32 = 30.0;

/// Stands still until the target is seen or remembered.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IdleState;

impl AgentState for IdleState {
    fn enter(&mut self, core: &mut AgentCore) {
        core.stop(STOP_DECEL);
    }

    fn tick(&mut self, core: &mut AgentCore, _ctx: &mut AgentContext<'_>, _dt: f32) -> Transition {
        (core.can_see_target() || core.has_target_in_memory()).then(BehaviorState::chase)
    }

    fn fixed_tick(
        &mut self,
        core: &mut AgentCore,
        _ctx: &mut AgentContext<'_>,
        _dt: f32,
    ) -> Transition {
        core.stop(STOP_DECEL);
        None
    }
}
