use sentinel_common::Vec2;

use super::{AgentState, BehaviorState, Transition};
use crate::agent::{AgentContext, AgentCore};

const ARRIVE_DECEL: f32 = 40.0;

/// Walks back to the patrol center on X, then resumes patrolling.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReturnToPatrolState;

impl AgentState for ReturnToPatrolState {
    fn tick(&mut self, core: &mut AgentCore, _ctx: &mut AgentContext<'_>, _dt: f32) -> Transition {
        core.can_see_target().then(BehaviorState::chase)
    }

    fn fixed_tick(
        &mut self,
        core: &mut AgentCore,
        _ctx: &mut AgentContext<'_>,
        _dt: f32,
    ) -> Transition {
        let center = core.patrol_center();
        let position = core.position();
        let tuning = core.config.return_to_patrol.tuning;
        core.steer(Vec2::new(center.x, position.y), tuning);
        core.zero_vertical();

        if (position.x - center.x).abs() <= core.config.return_to_patrol.arrive_x {
            core.stop(ARRIVE_DECEL);
            return Some(BehaviorState::patrol());
        }
        None
    }
}
