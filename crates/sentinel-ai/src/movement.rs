//! Direct steering primitives.
//!
//! No pathfinding: agents accelerate straight at a point. In
//! [`MoveMode::Platformer`] only the X velocity is steered and Y is left to
//! gravity; in [`MoveMode::TopDown`] both axes are steered independently.

use sentinel_common::{move_towards, Vec2, DIRECTION_EPSILON_SQ};

use crate::config::{MoveMode, MovementTuning};
use crate::physics::AgentBody;

/// Accelerates the body towards `target` at `tuning`.
pub fn steer_towards(
    body: &mut dyn AgentBody,
    mode: MoveMode,
    target: Vec2,
    tuning: MovementTuning,
    dt: f32,
) {
    let position = body.position();
    let velocity = body.velocity();
    let step = tuning.acceleration * dt;

    let mut offset = target - position;
    if mode == MoveMode::Platformer {
        offset.y = 0.0;
    }
    let desired = if offset.length_squared() < DIRECTION_EPSILON_SQ {
        Vec2::ZERO
    } else {
        offset.normalize() * tuning.max_speed
    };

    let next = match mode {
        MoveMode::Platformer => Vec2::new(move_towards(velocity.x, desired.x, step), velocity.y),
        MoveMode::TopDown => Vec2::new(
            move_towards(velocity.x, desired.x, step),
            move_towards(velocity.y, desired.y, step),
        ),
    };
    body.set_velocity(next);
}

/// Decelerates towards rest by at most `decel * dt` per axis.
pub fn stop_smooth(body: &mut dyn AgentBody, mode: MoveMode, decel: f32, dt: f32) {
    let velocity = body.velocity();
    let step = decel * dt;
    let vx = move_towards(velocity.x, 0.0, step);
    let vy = match mode {
        MoveMode::Platformer => velocity.y,
        MoveMode::TopDown => move_towards(velocity.y, 0.0, step),
    };
    body.set_velocity(Vec2::new(vx, vy));
}

/// Clears vertical velocity (patrol drift guard).
pub fn zero_vertical(body: &mut dyn AgentBody) {
    let velocity = body.velocity();
    body.set_velocity(Vec2::new(velocity.x, 0.0));
}

/// Returns true when the body pivot is within `distance` of `point`.
#[must_use]
pub fn is_at(body: &dyn AgentBody, point: Vec2, distance: f32) -> bool {
    body.position().distance(point) <= distance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::MockBody;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_topdown_steers_both_axes() {
        let mut body = MockBody::new(Vec2::ZERO);
        let tuning = MovementTuning::new(3.0, 60.0);
        steer_towards(&mut body, MoveMode::TopDown, Vec2::new(0.0, 5.0), tuning, DT);
        assert!(body.velocity.y > 0.0);
        assert!((body.velocity.y - 1.0).abs() < 1e-4);
        assert_eq!(body.velocity.x, 0.0);
    }

    #[test]
    fn test_platformer_keeps_vertical() {
        let mut body = MockBody::new(Vec2::ZERO);
        body.velocity = Vec2::new(0.0, -4.0);
        let tuning = MovementTuning::new(3.0, 60.0);
        steer_towards(&mut body, MoveMode::Platformer, Vec2::new(5.0, 5.0), tuning, DT);
        assert!((body.velocity.x - 1.0).abs() < 1e-4);
        assert_eq!(body.velocity.y, -4.0);
    }

    #[test]
    fn test_steer_caps_at_max_speed() {
        let mut body = MockBody::new(Vec2::ZERO);
        let tuning = MovementTuning::new(2.0, 20.0);
        for _ in 0..120 {
            steer_towards(&mut body, MoveMode::TopDown, Vec2::new(100.0, 0.0), tuning, DT);
        }
        assert!((body.velocity.x - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_stop_smooth_modes() {
        let mut body = MockBody::new(Vec2::ZERO);
        body.velocity = Vec2::new(1.0, 1.0);
        stop_smooth(&mut body, MoveMode::TopDown, 30.0, DT);
        assert!((body.velocity.x - 0.5).abs() < 1e-4);
        assert!((body.velocity.y - 0.5).abs() < 1e-4);

        body.velocity = Vec2::new(1.0, 1.0);
        stop_smooth(&mut body, MoveMode::Platformer, 120.0, DT);
        assert_eq!(body.velocity, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_zero_vertical_and_is_at() {
        let mut body = MockBody::new(Vec2::new(1.0, 0.0));
        body.velocity = Vec2::new(2.0, 3.0);
        zero_vertical(&mut body);
        assert_eq!(body.velocity, Vec2::new(2.0, 0.0));
        assert!(is_at(&body, Vec2::new(1.3, 0.0), 0.35));
        assert!(!is_at(&body, Vec2::new(2.0, 0.0), 0.35));
    }
}
