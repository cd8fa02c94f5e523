use sentinel_common::Vec2;

use super::{AgentState, BehaviorState, Transition};
use crate::agent::{AgentContext, AgentCore};

const ARRIVE_DECEL: f32 = 30.0;

/// Walks to the last known target position and waits there for a while.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    timer: f32,
    search_target: Vec2,
}

impl SearchState {
    /// Point being searched.
    #[must_use]
    pub fn search_target(&self) -> Vec2 {
        self.search_target
    }

    /// Seconds before giving up.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        self.timer
    }
}

impl AgentState for SearchState {
    fn enter(&mut self, core: &mut AgentCore) {
        self.timer = core.config.search.max_seconds;
        self.search_target = core.last_known_target_position;
    }

    fn tick(&mut self, core: &mut AgentCore, ctx: &mut AgentContext<'_>, dt: f32) -> Transition {
        if core.can_see_target() {
            return Some(BehaviorState::chase());
        }

        self.search_target = core.last_known_target_position;
        self.timer -= dt;
        if self.timer <= 0.0 {
            return Some(BehaviorState::return_to_patrol());
        }

        if core.is_target_in_attack_range(ctx.targets) && core.has_target_in_memory() {
            return Some(BehaviorState::attack());
        }
        None
    }

    fn fixed_tick(
        &mut self,
        core: &mut AgentCore,
        _ctx: &mut AgentContext<'_>,
        _dt: f32,
    ) -> Transition {
        let search = &core.config.search;
        let (tuning, arrive) = (search.tuning, search.arrive_distance);
        core.steer(self.search_target, tuning);
        if core.is_at(self.search_target, arrive) {
            core.stop(ARRIVE_DECEL);
        }
        None
    }
}
