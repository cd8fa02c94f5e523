//! Optional animation collaborator.
//!
//! When an agent has an [`AttackAnimator`], strikes are handed to it and the
//! animation decides when the hit lands (calling back into
//! `Agent::perform_melee_hit`). Without one the agent strikes directly.

use sentinel_common::Vec2;

/// Animation hooks driven by an agent.
pub trait AttackAnimator {
    /// Starts an attack animation aimed along `raw_direction` (unsnapped).
    fn begin_attack(&mut self, raw_direction: Vec2);

    /// Plays the parried reaction.
    fn trigger_parried(&mut self);

    /// Locomotion feedback, refreshed every decision tick.
    fn set_locomotion(&mut self, _speed: f32, _moving: bool) {}
}

/// Calls recorded by [`RecordingAnimator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimatorCall {
    /// `begin_attack`
    BeginAttack(Vec2),
    /// `trigger_parried`
    Parried,
}

/// Animator that records attack and parry calls.
#[derive(Debug, Default, Clone)]
pub struct RecordingAnimator {
    /// Attack and parry calls in order
    pub calls: Vec<AnimatorCall>,
    /// Last locomotion values received
    pub locomotion: (f32, bool),
}

impl RecordingAnimator {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttackAnimator for RecordingAnimator {
    fn begin_attack(&mut self, raw_direction: Vec2) {
        self.calls.push(AnimatorCall::BeginAttack(raw_direction));
    }

    fn trigger_parried(&mut self) {
        self.calls.push(AnimatorCall::Parried);
    }

    fn set_locomotion(&mut self, speed: f32, moving: bool) {
        self.locomotion = (speed, moving);
    }
}

/// Shared handle so tests can inspect a recorder after boxing it into an agent.
impl<T: AttackAnimator> AttackAnimator for std::rc::Rc<std::cell::RefCell<T>> {
    fn begin_attack(&mut self, raw_direction: Vec2) {
        self.borrow_mut().begin_attack(raw_direction);
    }

    fn trigger_parried(&mut self) {
        self.borrow_mut().trigger_parried();
    }

    fn set_locomotion(&mut self, speed: f32, moving: bool) {
        self.borrow_mut().set_locomotion(speed, moving);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_recording_animator() {
        let mut animator = RecordingAnimator::new();
        animator.begin_attack(Vec2::X);
        animator.trigger_parried();
        animator.set_locomotion(1.5, true);

        assert_eq!(
            animator.calls,
            vec![AnimatorCall::BeginAttack(Vec2::X), AnimatorCall::Parried]
        );
        assert_eq!(animator.locomotion, (1.5, true));
    }

    #[test]
    fn test_shared_handle_forwards() {
        let shared = Rc::new(RefCell::new(RecordingAnimator::new()));
        let mut handle = Rc::clone(&shared);
        handle.trigger_parried();
        assert_eq!(shared.borrow().calls, vec![AnimatorCall::Parried]);
    }
}
