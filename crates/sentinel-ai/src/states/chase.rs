use tracing::debug;

use super::{AgentState, BehaviorState, Transition};
use crate::agent::{AgentContext, AgentCore};

const NO_TARGET_DECEL: f32 = 30.0;

/// Pursues the visible target and decides when to start an attack.
///
/// Besides the tight attack box, an enlarged start range records a commit
/// time whenever the target is inside it. An attack still begins while the
/// commit window since that time is open, so a fast target that slips out
/// of the tight box right after entering the start range is still engaged.
#[derive(Debug, Clone, PartialEq)]
pub struct ChaseState {
    last_in_start_range: f32,
}

impl Default for ChaseState {
    fn default() -> Self {
        Self {
            last_in_start_range: f32::NEG_INFINITY,
        }
    }
}

impl ChaseState {
    /// Chase that already touched the start range at `time`.
    #[must_use]
    pub fn committed_at(time: f32) -> Self {
        Self {
            last_in_start_range: time,
        }
    }

    /// Last time the target was inside the start range.
    #[must_use]
    pub fn last_in_start_range(&self) -> f32 {
        self.last_in_start_range
    }
}

impl AgentState for ChaseState {
    fn tick(&mut self, core: &mut AgentCore, ctx: &mut AgentContext<'_>, _dt: f32) -> Transition {
        if core.target_position(ctx.targets).is_none() {
            return Some(BehaviorState::return_to_patrol());
        }

        if !core.can_see_target() {
            return Some(if core.has_target_in_memory() {
                BehaviorState::search()
            } else {
                BehaviorState::return_to_patrol()
            });
        }

        if core.is_target_in_attack_range(ctx.targets) {
            debug!("Agent {} engaging (in range)", core.id);
            return Some(BehaviorState::attack());
        }

        let multiplier = core.config.chase.clamped_start_multiplier();
        let (range_x, range_y) = core.perception.attack_range();
        if range_x > 0.0
            && range_y > 0.0
            && core.is_target_within(ctx.targets, range_x * multiplier, range_y * multiplier)
        {
            self.last_in_start_range = core.now;
        }

        let since = core.now - self.last_in_start_range;
        if since <= core.config.chase.commit_seconds {
            debug!("Agent {} engaging (committed {since:.2}s ago)", core.id);
            return Some(BehaviorState::attack());
        }
        None
    }

    fn fixed_tick(
        &mut self,
        core: &mut AgentCore,
        ctx: &mut AgentContext<'_>,
        _dt: f32,
    ) -> Transition {
        match core.target_position(ctx.targets) {
            Some(target) => {
                let tuning = core.config.chase.tuning;
                core.steer(target, tuning);
            },
            None => core.stop(NO_TARGET_DECEL),
        }
        None
    }
}
