use sentinel_common::Vec2;
use tracing::{debug, info};

use super::{AgentState, Transition};
use crate::agent::{AgentContext, AgentCore};
use crate::events::AgentEvent;

/// Terminal state: no collision, no movement, removal after a delay.
#[derive(Debug, Clone, PartialEq)]
pub struct DieState {
    timer: f32,
    despawned: bool,
}

impl DieState {
    /// Death with removal after `despawn_seconds`.
    #[must_use]
    pub fn new(despawn_seconds: f32) -> Self {
        Self {
            timer: despawn_seconds.max(0.0),
            despawned: false,
        }
    }

    /// Seconds until removal.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        self.timer
    }
}

impl AgentState for DieState {
    fn enter(&mut self, core: &mut AgentCore) {
        core.parryable = false;
        core.clear_overrides();
        core.body.set_velocity(Vec2::ZERO);
        core.body.set_collision_enabled(false);

        let position = core.position();
        info!("Agent {} died at {position}", core.id);
        core.publish(AgentEvent::Killed {
            agent: core.id,
            position,
        });
    }

    fn tick(&mut self, core: &mut AgentCore, _ctx: &mut AgentContext<'_>, dt: f32) -> Transition {
        if self.despawned {
            return None;
        }
        self.timer -= dt;
        if self.timer <= 0.0 {
            self.despawned = true;
            core.marked_for_removal = true;
            debug!("Agent {} marked for removal", core.id);
            core.publish(AgentEvent::Despawned { agent: core.id });
        }
        None
    }

    fn fixed_tick(
        &mut self,
        core: &mut AgentCore,
        _ctx: &mut AgentContext<'_>,
        _dt: f32,
    ) -> Transition {
        core.body.set_velocity(Vec2::ZERO);
        None
    }
}
