use sentinel_common::Vec2;

use super::{AgentState, BehaviorState, Transition};
use crate::agent::{AgentContext, AgentCore};

const ARRIVE_DECEL: f32 = 35.0;
const WAIT_DECEL: f32 = 25.0;

/// Walks between the two patrol anchors on X, pausing at each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatrolState {
    current_target: Vec2,
    going_to_b: bool,
    wait_timer: f32,
}

impl PatrolState {
    /// Anchor currently walked to.
    #[must_use]
    pub fn current_target(&self) -> Vec2 {
        self.current_target
    }

    /// Seconds left of the pause at the last anchor.
    #[must_use]
    pub fn wait_remaining(&self) -> f32 {
        self.wait_timer
    }

    fn advance(&mut self, a: Vec2, b: Vec2, loop_a_to_b: bool) {
        if loop_a_to_b {
            self.current_target = if self.current_target == a { b } else { a };
            self.going_to_b = self.current_target == b;
        } else if self.going_to_b {
            self.current_target = a;
            self.going_to_b = false;
        } else {
            self.current_target = b;
            self.going_to_b = true;
        }
    }
}

impl AgentState for PatrolState {
    fn enter(&mut self, core: &mut AgentCore) {
        let (a, b) = core.patrol_anchors();
        let x = core.position().x;
        // Ties go to A.
        self.current_target = if (x - a.x).abs() <= (x - b.x).abs() { a } else { b };
        self.going_to_b = self.current_target == b;
        self.wait_timer = 0.0;
    }

    fn tick(&mut self, core: &mut AgentCore, _ctx: &mut AgentContext<'_>, dt: f32) -> Transition {
        if core.can_see_target() {
            return Some(BehaviorState::chase());
        }
        if self.wait_timer > 0.0 {
            self.wait_timer = (self.wait_timer - dt).max(0.0);
        }
        None
    }

    fn fixed_tick(
        &mut self,
        core: &mut AgentCore,
        _ctx: &mut AgentContext<'_>,
        _dt: f32,
    ) -> Transition {
        if self.wait_timer > 0.0 {
            core.stop(WAIT_DECEL);
            core.zero_vertical();
            return None;
        }

        let position = core.position();
        let tuning = core.config.patrol.tuning;
        core.steer(Vec2::new(self.current_target.x, position.y), tuning);
        core.zero_vertical();

        if (position.x - self.current_target.x).abs() <= core.config.patrol.arrive_x {
            core.stop(ARRIVE_DECEL);
            self.wait_timer = core.config.patrol.wait_seconds;
            let (a, b) = core.patrol_anchors();
            self.advance(a, b, core.config.patrol.loop_a_to_b);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_pong_alternates() {
        let (a, b) = (Vec2::new(-3.0, 0.0), Vec2::new(3.0, 0.0));
        let mut state = PatrolState {
            current_target: a,
            going_to_b: false,
            wait_timer: 0.0,
        };
        state.advance(a, b, false);
        assert_eq!(state.current_target(), b);
        state.advance(a, b, false);
        assert_eq!(state.current_target(), a);
    }

    #[test]
    fn test_loop_rotates() {
        let (a, b) = (Vec2::new(-3.0, 0.0), Vec2::new(3.0, 0.0));
        let mut state = PatrolState {
            current_target: b,
            going_to_b: true,
            wait_timer: 0.0,
        };
        state.advance(a, b, true);
        assert_eq!(state.current_target(), a);
        assert!(!state.going_to_b);
        state.advance(a, b, true);
        assert_eq!(state.current_target(), b);
    }
}
