//! Agent controller.
//!
//! An [`Agent`] owns its behavior state, perception, melee executor and
//! override timers, and drives them in a fixed order:
//!
//! - [`Agent::tick`] (decision, once per frame): melee cooldown, perception
//!   and memory, locomotion feedback, then the state's `tick`.
//! - [`Agent::fixed_tick`] (physics, fixed rate): an external push wins over
//!   a stun; while either is active the state's `fixed_tick` is skipped.
//!
//! External systems (parry, damage, stealth kills) call into the agent
//! synchronously between frames.

use crossbeam_channel::Sender;
use sentinel_common::{normalize_or, sign_or_positive, EntityId, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::animation::AttackAnimator;
use crate::config::{AgentConfig, MovementTuning};
use crate::events::AgentEvent;
use crate::melee::{snap_to_cardinal, MeleeAttack};
use crate::movement;
use crate::perception::{facing_dot, Perception, PerceptionResult};
use crate::physics::{AgentBody, PhysicsQuery};
use crate::states::{AgentState, BehaviorState, DieState, HitState, StateKind, StunnedState};
use crate::target::{DamageReceiver, TargetRegistry};

/// Physics step assumed until the first `fixed_tick`.
const DEFAULT_FIXED_DT: f32 = 1.0 / 60.0;

/// Collaborators borrowed for one decision or physics step.
pub struct AgentContext<'a> {
    /// Overlap and ray queries
    pub physics: &'a dyn PhysicsQuery,
    /// Target lookup
    pub targets: &'a dyn TargetRegistry,
    /// Damage intake for direct strikes
    pub receivers: &'a mut dyn DamageReceiver,
    /// Simulation time (seconds)
    pub now: f32,
}

impl<'a> AgentContext<'a> {
    /// Bundles collaborators for one step.
    pub fn new(
        physics: &'a dyn PhysicsQuery,
        targets: &'a dyn TargetRegistry,
        receivers: &'a mut dyn DamageReceiver,
        now: f32,
    ) -> Self {
        Self {
            physics,
            targets,
            receivers,
            now,
        }
    }
}

/// Locomotion feedback derived every decision tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Locomotion {
    /// Current speed
    pub speed: f32,
    /// Speed above the moving threshold
    pub moving: bool,
}

/// Everything a state may read or change besides itself.
pub struct AgentCore {
    pub(crate) id: EntityId,
    pub(crate) config: AgentConfig,
    pub(crate) body: Box<dyn AgentBody>,
    pub(crate) perception: Perception,
    pub(crate) melee: MeleeAttack,
    pub(crate) animator: Option<Box<dyn AttackAnimator>>,
    pub(crate) events: Option<Sender<AgentEvent>>,
    pub(crate) spawn_position: Vec2,
    pub(crate) parryable: bool,
    pub(crate) stun_timer: f32,
    pub(crate) push_velocity: Vec2,
    pub(crate) push_timer: f32,
    pub(crate) last_known_target_position: Vec2,
    pub(crate) time_since_last_seen: f32,
    pub(crate) facing: f32,
    pub(crate) locomotion: Locomotion,
    pub(crate) fixed_dt: f32,
    pub(crate) now: f32,
    pub(crate) marked_for_removal: bool,
}

impl std::fmt::Debug for AgentCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentCore")
            .field("id", &self.id)
            .field("position", &self.body.position())
            .field("parryable", &self.parryable)
            .field("stun_timer", &self.stun_timer)
            .field("push_timer", &self.push_timer)
            .field("facing", &self.facing)
            .finish_non_exhaustive()
    }
}

impl AgentCore {
    /// Pivot position.
    pub(crate) fn position(&self) -> Vec2 {
        self.body.position()
    }

    /// Collider center, falling back to the pivot.
    pub(crate) fn center(&self) -> Vec2 {
        self.body.center()
    }

    pub(crate) fn patrol_center(&self) -> Vec2 {
        self.config
            .patrol
            .center_override
            .unwrap_or(self.spawn_position)
    }

    pub(crate) fn patrol_anchors(&self) -> (Vec2, Vec2) {
        let center = self.patrol_center();
        let half = Vec2::new(self.config.patrol.fallback_half_range, 0.0);
        (
            self.config.patrol.anchor_a.unwrap_or(center - half),
            self.config.patrol.anchor_b.unwrap_or(center + half),
        )
    }

    pub(crate) fn can_see_target(&self) -> bool {
        self.perception.has_line_of_sight()
    }

    pub(crate) fn has_target_in_memory(&self) -> bool {
        self.perception.has_target_in_memory(self.now)
    }

    /// Raw target position, if a target is resolved.
    pub(crate) fn target_position(&self, targets: &dyn TargetRegistry) -> Option<Vec2> {
        self.perception.target(targets).map(|t| t.position())
    }

    /// Target collider center, if a target is resolved.
    pub(crate) fn target_center(&self, targets: &dyn TargetRegistry) -> Option<Vec2> {
        self.perception.target(targets).map(|t| t.center())
    }

    pub(crate) fn is_target_in_attack_range(&self, targets: &dyn TargetRegistry) -> bool {
        self.perception.is_in_attack_range(self.center(), targets)
    }

    pub(crate) fn is_target_within(
        &self,
        targets: &dyn TargetRegistry,
        half_x: f32,
        half_y: f32,
    ) -> bool {
        self.perception
            .is_in_scaled_range(self.center(), targets, half_x, half_y)
    }

    pub(crate) fn is_at(&self, point: Vec2, distance: f32) -> bool {
        movement::is_at(self.body.as_ref(), point, distance)
    }

    pub(crate) fn steer(&mut self, target: Vec2, tuning: MovementTuning) {
        movement::steer_towards(
            self.body.as_mut(),
            self.config.move_mode,
            target,
            tuning,
            self.fixed_dt,
        );
    }

    pub(crate) fn stop(&mut self, decel: f32) {
        movement::stop_smooth(self.body.as_mut(), self.config.move_mode, decel, self.fixed_dt);
    }

    pub(crate) fn zero_vertical(&mut self) {
        movement::zero_vertical(self.body.as_mut());
    }

    pub(crate) fn clear_overrides(&mut self) {
        self.stun_timer = 0.0;
        self.push_timer = 0.0;
        self.push_velocity = Vec2::ZERO;
    }

    pub(crate) fn publish(&self, event: AgentEvent) {
        if let Some(sender) = &self.events {
            if sender.try_send(event).is_err() {
                warn!("Event bus full, dropped event from agent {}", self.id);
            }
        }
    }

    /// Hands the strike to the animator, or strikes directly when there is
    /// none and the executor is ready.
    pub(crate) fn dispatch_strike(&mut self, raw: Vec2, ctx: &mut AgentContext<'_>) {
        let (via_animator, hit) = if let Some(animator) = self.animator.as_mut() {
            animator.begin_attack(raw);
            (true, false)
        } else if self.melee.can_attack() {
            let attack = &self.config.attack;
            let direction =
                snap_to_cardinal(raw, attack.vertical_bias, attack.force_vertical_abs_y);
            let origin = self.body.position();
            let hit = self
                .melee
                .try_attack(origin, origin, direction, ctx.physics, &mut *ctx.receivers);
            (false, hit)
        } else {
            trace!("Agent {} strike skipped, melee on cooldown", self.id);
            return;
        };

        debug!(
            "Agent {} strike dispatched raw={raw} animator={via_animator} hit={hit}",
            self.id
        );
        self.publish(AgentEvent::AttackDispatched {
            agent: self.id,
            direction: raw,
            via_animator,
            hit,
        });
    }

    fn refresh_perception(&mut self, dt: f32, ctx: &AgentContext<'_>) {
        let had_sight = self.perception.has_line_of_sight();
        let center = self.center();
        self.perception
            .tick_vision(center, self.facing, ctx.targets, ctx.physics, self.now);

        let seen = self
            .perception
            .target(ctx.targets)
            .filter(|_| self.perception.has_line_of_sight())
            .map(|t| t.position());
        match seen {
            Some(position) => {
                self.last_known_target_position = position;
                self.time_since_last_seen = 0.0;
            },
            None => self.time_since_last_seen += dt,
        }

        let has_sight = self.perception.has_line_of_sight();
        if had_sight != has_sight {
            debug!(
                "Agent {} {} target",
                self.id,
                if has_sight { "acquired" } else { "lost" }
            );
        }
    }

    fn update_locomotion(&mut self) {
        let velocity = self.body.velocity();
        let threshold = self.config.reaction.moving_threshold;
        let speed = velocity.length();
        self.locomotion = Locomotion {
            speed,
            moving: speed > threshold,
        };
        if velocity.x.abs() > threshold {
            self.facing = sign_or_positive(velocity.x);
        }
        if let Some(animator) = self.animator.as_mut() {
            animator.set_locomotion(speed, speed > threshold);
        }
    }
}

/// An enemy agent.
#[derive(Debug)]
pub struct Agent {
    core: AgentCore,
    state: BehaviorState,
    started: bool,
}

impl Agent {
    /// Creates an agent at the body's position. Its initial state is Patrol,
    /// entered on the first step or external call.
    pub fn new(config: AgentConfig, body: Box<dyn AgentBody>) -> Self {
        let spawn_position = body.position();
        let perception = Perception::new(config.perception.clone());
        let melee = MeleeAttack::new(config.melee.clone());
        Self {
            core: AgentCore {
                id: EntityId::new(),
                config,
                body,
                perception,
                melee,
                animator: None,
                events: None,
                spawn_position,
                parryable: false,
                stun_timer: 0.0,
                push_velocity: Vec2::ZERO,
                push_timer: 0.0,
                last_known_target_position: Vec2::ZERO,
                time_since_last_seen: f32::INFINITY,
                facing: 1.0,
                locomotion: Locomotion::default(),
                fixed_dt: DEFAULT_FIXED_DT,
                now: 0.0,
                marked_for_removal: false,
            },
            state: BehaviorState::patrol(),
            started: false,
        }
    }

    /// Overrides the generated id.
    #[must_use]
    pub fn with_id(mut self, id: EntityId) -> Self {
        self.core.id = id;
        self
    }

    /// Routes strikes through an animation hook.
    #[must_use]
    pub fn with_animator(mut self, animator: Box<dyn AttackAnimator>) -> Self {
        self.core.animator = Some(animator);
        self
    }

    /// Publishes lifecycle events on `sender`.
    #[must_use]
    pub fn with_events(mut self, sender: Sender<AgentEvent>) -> Self {
        self.core.events = Some(sender);
        self
    }

    /// Replaces the initial state. Has no effect once started.
    #[must_use]
    pub fn with_initial_state(mut self, state: BehaviorState) -> Self {
        if !self.started {
            self.state = state;
        }
        self
    }

    /// Enters the initial state if that has not happened yet.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.state.enter(&mut self.core);
        debug!("Agent {} spawned in {}", self.core.id, self.state.kind());
        self.core.publish(AgentEvent::StateEntered {
            agent: self.core.id,
            state: self.state.kind(),
        });
    }

    /// Replaces the active state: old `exit`, then new `enter`. Ignored
    /// once dead.
    fn transition_to(&mut self, next: BehaviorState) {
        self.start();
        let from = self.state.kind();
        if from == StateKind::Die {
            return;
        }

        self.state.exit(&mut self.core);
        self.core.publish(AgentEvent::StateExited {
            agent: self.core.id,
            state: from,
        });

        self.state = next;
        self.state.enter(&mut self.core);
        let to = self.state.kind();
        debug!("Agent {} {from} -> {to}", self.core.id);
        self.core.publish(AgentEvent::StateEntered {
            agent: self.core.id,
            state: to,
        });
    }

    /// Decision step.
    pub fn tick(&mut self, dt: f32, ctx: &mut AgentContext<'_>) {
        self.start();
        self.core.now = ctx.now;
        self.core.melee.tick(dt);
        self.core.refresh_perception(dt, ctx);
        self.core.update_locomotion();

        if let Some(next) = self.state.tick(&mut self.core, ctx, dt) {
            self.transition_to(next);
        }
    }

    /// Physics step.
    pub fn fixed_tick(&mut self, dt: f32, ctx: &mut AgentContext<'_>) {
        self.start();
        self.core.fixed_dt = dt;

        if self.core.push_timer > 0.0 {
            self.core.push_timer = (self.core.push_timer - dt).max(0.0);
            let velocity = self.core.push_velocity;
            self.core.body.set_velocity(velocity);
            return;
        }

        if self.core.stun_timer > 0.0 {
            self.core.stun_timer = (self.core.stun_timer - dt).max(0.0);
            let decel = self.core.config.reaction.parry_stun_decel;
            self.core.stop(decel);
            return;
        }

        if let Some(next) = self.state.fixed_tick(&mut self.core, ctx, dt) {
            self.transition_to(next);
        }
    }

    // ------------------------------------------------------------------
    // External entry points
    // ------------------------------------------------------------------

    /// Overrides velocity for `lock_seconds`. A zero direction pushes right;
    /// the lock never shortens an active one.
    pub fn apply_parry_push(&mut self, direction: Vec2, speed: f32, lock_seconds: f32) {
        if self.is_dead() {
            return;
        }
        self.core.push_velocity = normalize_or(direction, Vec2::X) * speed;
        self.core.push_timer = self.core.push_timer.max(lock_seconds);
    }

    /// Freezes the agent for `seconds` (ignored when not positive); never
    /// shortens an active stun.
    pub fn apply_parry_stun(&mut self, seconds: f32) {
        if seconds <= 0.0 || self.is_dead() {
            return;
        }
        self.core.stun_timer = self.core.stun_timer.max(seconds);
    }

    /// Sets the parryable flag.
    pub fn set_parryable(&mut self, parryable: bool) {
        self.core.parryable = parryable;
    }

    /// Parry attempt. Succeeds only while parryable; cancels the attack and
    /// switches to Chase.
    pub fn try_parry(&mut self) -> bool {
        if !self.core.parryable || self.is_dead() {
            return false;
        }
        self.core.parryable = false;
        if let Some(animator) = self.core.animator.as_mut() {
            animator.trigger_parried();
        }
        debug!("Agent {} parried", self.core.id);
        self.core.publish(AgentEvent::Parried { agent: self.core.id });
        self.transition_to(BehaviorState::chase());
        true
    }

    /// Damage intake: staggers the agent into Hit. Returns false when dead.
    pub fn take_damage(&mut self, amount: i32, source: Vec2) -> bool {
        if self.is_dead() {
            return false;
        }
        debug!("Agent {} took {amount} damage from {source}", self.core.id);
        let seconds = self.core.config.reaction.hit_seconds;
        self.transition_to(BehaviorState::Hit(HitState::new(seconds)));
        true
    }

    /// Kills the agent. Returns false if it was already dead.
    pub fn kill(&mut self) -> bool {
        if self.is_dead() {
            return false;
        }
        let seconds = self.core.config.reaction.despawn_seconds;
        self.transition_to(BehaviorState::Die(DieState::new(seconds)));
        true
    }

    /// Switches to a Stunned state of `seconds`, braking at `decel` or the
    /// configured `reaction.stunned_decel`.
    pub fn stun(&mut self, seconds: f32, decel: Option<f32>) -> bool {
        if self.is_dead() {
            return false;
        }
        let decel = decel.unwrap_or(self.core.config.reaction.stunned_decel);
        self.transition_to(BehaviorState::Stunned(StunnedState::new(seconds, decel)));
        true
    }

    /// Whether something at `point` is behind the agent and unseen: no line
    /// of sight, and the forward dot towards it is below `-behind_threshold`.
    #[must_use]
    pub fn is_exposed_from_behind(&self, point: Vec2, behind_threshold: f32) -> bool {
        !self.core.can_see_target()
            && facing_dot(self.core.facing, point - self.core.position()) < -behind_threshold
    }

    /// Animation callback: strikes along `direction` through the executor.
    pub fn perform_melee_hit(&mut self, direction: Vec2, ctx: &mut AgentContext<'_>) -> bool {
        if self.is_dead() {
            return false;
        }
        let origin = self.core.position();
        let direction = normalize_or(direction, Vec2::X);
        self.core
            .melee
            .try_attack(origin, origin, direction, ctx.physics, &mut *ctx.receivers)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Agent id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.core.id
    }

    /// Agent tuning.
    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.core.config
    }

    /// Active state.
    #[must_use]
    pub fn state(&self) -> &BehaviorState {
        &self.state
    }

    /// Active state discriminant.
    #[must_use]
    pub fn state_kind(&self) -> StateKind {
        self.state.kind()
    }

    /// Pivot position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.core.position()
    }

    /// Current velocity.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.core.body.velocity()
    }

    /// Facing sign on X (`1.0` right, `-1.0` left).
    #[must_use]
    pub fn facing(&self) -> f32 {
        self.core.facing
    }

    /// Sets the facing sign on X.
    pub fn set_facing(&mut self, facing: f32) {
        self.core.facing = sign_or_positive(facing);
    }

    /// Locomotion feedback from the last decision tick.
    #[must_use]
    pub fn locomotion(&self) -> Locomotion {
        self.core.locomotion
    }

    /// Whether a parry would currently succeed.
    #[must_use]
    pub fn is_parryable(&self) -> bool {
        self.core.parryable
    }

    /// Seconds of parry stun left.
    #[must_use]
    pub fn stun_remaining(&self) -> f32 {
        self.core.stun_timer
    }

    /// Seconds of push lock left.
    #[must_use]
    pub fn push_remaining(&self) -> f32 {
        self.core.push_timer
    }

    /// Whether a parry stun is active.
    #[must_use]
    pub fn is_stunned(&self) -> bool {
        self.core.stun_timer > 0.0
    }

    /// Whether the agent is in its terminal state.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.state.kind() == StateKind::Die
    }

    /// Whether the despawn delay has elapsed.
    #[must_use]
    pub fn is_marked_for_removal(&self) -> bool {
        self.core.marked_for_removal
    }

    /// Perception state.
    #[must_use]
    pub fn perception(&self) -> &Perception {
        &self.core.perception
    }

    /// Melee executor.
    #[must_use]
    pub fn melee(&self) -> &MeleeAttack {
        &self.core.melee
    }

    /// Melee executor, for cooldown control.
    pub fn melee_mut(&mut self) -> &mut MeleeAttack {
        &mut self.core.melee
    }

    /// Target visible as of the last decision tick.
    #[must_use]
    pub fn can_see_target(&self) -> bool {
        self.core.can_see_target()
    }

    /// Target visible or remembered.
    #[must_use]
    pub fn has_target_in_memory(&self) -> bool {
        self.core.has_target_in_memory()
    }

    /// Current perception snapshot.
    #[must_use]
    pub fn perception_result(&self) -> PerceptionResult {
        PerceptionResult {
            has_line_of_sight: self.core.can_see_target(),
            last_known_position: self.core.last_known_target_position,
            time_since_last_seen: self.core.time_since_last_seen,
        }
    }

    /// Whether the target is inside the attack box right now.
    #[must_use]
    pub fn is_target_in_attack_range(&self, targets: &dyn TargetRegistry) -> bool {
        self.core.is_target_in_attack_range(targets)
    }

    /// Center-to-center distance to the target (`INFINITY` without one).
    #[must_use]
    pub fn distance_to_target(&self, targets: &dyn TargetRegistry) -> f32 {
        self.core
            .perception
            .distance_to_target(self.core.center(), targets)
    }

    /// Patrol center (override or spawn position).
    #[must_use]
    pub fn patrol_center(&self) -> Vec2 {
        self.core.patrol_center()
    }

    /// Overrides the patrol center; `None` reverts to the spawn position.
    pub fn set_patrol_center(&mut self, center: Option<Vec2>) {
        self.core.config.patrol.center_override = center;
    }

    /// Patrol anchors `(A, B)`.
    #[must_use]
    pub fn patrol_anchors(&self) -> (Vec2, Vec2) {
        self.core.patrol_anchors()
    }

    /// The steered body.
    #[must_use]
    pub fn body(&self) -> &dyn AgentBody {
        self.core.body.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimatorCall, RecordingAnimator};
    use crate::events::EventBus;
    use crate::physics::{MockBody, MockPhysics};
    use crate::states::AttackPhase;
    use crate::target::{MockReceivers, MockTarget, MockTargets};
    use std::cell::RefCell;
    use std::rc::Rc;

    const DT: f32 = 1.0 / 60.0;

    struct Rig {
        physics: MockPhysics,
        targets: MockTargets,
        receivers: MockReceivers,
        now: f32,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                physics: MockPhysics::new(),
                targets: MockTargets::new(),
                receivers: MockReceivers::new(),
                now: 0.0,
            }
        }

        fn with_player(mut self, at: Vec2) -> Self {
            self.targets
                .insert("Player", EntityId::from_raw(999), MockTarget::at(at));
            self
        }

        fn tick(&mut self, agent: &mut Agent, dt: f32) {
            self.now += dt;
            let mut ctx =
                AgentContext::new(&self.physics, &self.targets, &mut self.receivers, self.now);
            agent.tick(dt, &mut ctx);
        }

        fn fixed(&mut self, agent: &mut Agent, dt: f32) {
            let mut ctx =
                AgentContext::new(&self.physics, &self.targets, &mut self.receivers, self.now);
            agent.fixed_tick(dt, &mut ctx);
        }
    }

    fn agent_at(position: Vec2) -> Agent {
        Agent::new(AgentConfig::default(), Box::new(MockBody::new(position)))
    }

    #[test]
    fn test_starts_in_patrol() {
        let mut agent = agent_at(Vec2::ZERO);
        agent.start();
        assert_eq!(agent.state_kind(), StateKind::Patrol);
        assert_eq!(agent.patrol_center(), Vec2::ZERO);
        assert_eq!(agent.patrol_anchors(), (Vec2::new(-3.0, 0.0), Vec2::new(3.0, 0.0)));
    }

    #[test]
    fn test_sight_starts_chase_and_attack() {
        let mut rig = Rig::new().with_player(Vec2::new(1.0, 0.0));
        let mut agent = agent_at(Vec2::ZERO);

        rig.tick(&mut agent, DT);
        assert_eq!(agent.state_kind(), StateKind::Chase);
        rig.tick(&mut agent, DT);
        assert_eq!(agent.state_kind(), StateKind::Attack);
        assert!(agent.is_parryable());
    }

    #[test]
    fn test_memory_fields_follow_sight() {
        let mut rig = Rig::new().with_player(Vec2::new(2.0, 0.0));
        let mut agent = agent_at(Vec2::ZERO);

        rig.tick(&mut agent, DT);
        let result = agent.perception_result();
        assert!(result.has_line_of_sight);
        assert_eq!(result.last_known_position, Vec2::new(2.0, 0.0));
        assert_eq!(result.time_since_last_seen, 0.0);

        if let Some(t) = rig.targets.get_mut(EntityId::from_raw(999)) {
            t.position = Vec2::new(40.0, 0.0);
        }
        rig.tick(&mut agent, 0.5);
        let result = agent.perception_result();
        assert!(!result.has_line_of_sight);
        assert_eq!(result.time_since_last_seen, 0.5);
        assert!(agent.has_target_in_memory());
    }

    #[test]
    fn test_parry_only_while_parryable() {
        let mut rig = Rig::new().with_player(Vec2::new(1.0, 0.0));
        let animator = Rc::new(RefCell::new(RecordingAnimator::new()));
        let mut agent = agent_at(Vec2::ZERO).with_animator(Box::new(Rc::clone(&animator)));

        assert!(!agent.try_parry());
        rig.tick(&mut agent, DT);
        rig.tick(&mut agent, DT);
        assert_eq!(agent.state_kind(), StateKind::Attack);

        assert!(agent.try_parry());
        assert!(!agent.is_parryable());
        assert_eq!(agent.state_kind(), StateKind::Chase);
        assert_eq!(animator.borrow().calls, vec![AnimatorCall::Parried]);
        assert!(!agent.try_parry());
    }

    #[test]
    fn test_windup_dispatches_through_animator() {
        let mut rig = Rig::new().with_player(Vec2::new(1.0, 0.0));
        let animator = Rc::new(RefCell::new(RecordingAnimator::new()));
        let mut agent = agent_at(Vec2::ZERO).with_animator(Box::new(Rc::clone(&animator)));

        rig.tick(&mut agent, DT);
        rig.tick(&mut agent, DT);
        rig.tick(&mut agent, 0.25);

        match agent.state() {
            BehaviorState::Attack(attack) => assert_eq!(attack.phase(), AttackPhase::Recover),
            other => panic!("expected Attack, got {:?}", other.kind()),
        }
        assert!(!agent.is_parryable());
        assert_eq!(
            animator.borrow().calls,
            vec![AnimatorCall::BeginAttack(Vec2::new(1.0, 0.0))]
        );
        assert!(agent.melee().can_attack());
    }

    #[test]
    fn test_windup_strikes_directly_without_animator() {
        let mut rig = Rig::new().with_player(Vec2::new(0.6, 0.0));
        let player = EntityId::from_raw(999);
        rig.physics.insert(
            player,
            sentinel_common::Aabb::from_center(Vec2::new(0.6, 0.0), 0.3, 0.5),
            sentinel_common::LayerMask::PLAYER,
        );
        rig.receivers.accept(player);
        let mut agent = agent_at(Vec2::ZERO);

        rig.tick(&mut agent, DT);
        rig.tick(&mut agent, DT);
        rig.tick(&mut agent, 0.25);

        assert_eq!(rig.receivers.total(player), 1);
        assert!(!agent.melee().can_attack());

        rig.tick(&mut agent, 0.25);
        assert_eq!(agent.state_kind(), StateKind::Chase);
    }

    #[test]
    fn test_take_damage_enters_hit() {
        let mut rig = Rig::new();
        let mut agent = agent_at(Vec2::ZERO);

        assert!(agent.take_damage(1, Vec2::new(1.0, 0.0)));
        assert_eq!(agent.state_kind(), StateKind::Hit);

        rig.tick(&mut agent, 0.1);
        assert_eq!(agent.state_kind(), StateKind::Hit);
        rig.tick(&mut agent, 0.1);
        assert_eq!(agent.state_kind(), StateKind::Patrol);
    }

    #[test]
    fn test_kill_is_terminal() {
        let bus = EventBus::new(64);
        let mut rig = Rig::new().with_player(Vec2::new(1.0, 0.0));
        let mut agent = agent_at(Vec2::ZERO).with_events(bus.sender());

        assert!(agent.kill());
        assert!(!agent.kill());
        assert!(!agent.take_damage(1, Vec2::ZERO));
        assert!(!agent.stun(1.0, None));

        for _ in 0..10 {
            rig.tick(&mut agent, 0.1);
            rig.fixed(&mut agent, DT);
            assert_eq!(agent.velocity(), Vec2::ZERO);
        }
        assert_eq!(agent.state_kind(), StateKind::Die);
        assert!(!agent.is_marked_for_removal());

        for _ in 0..3 {
            rig.tick(&mut agent, 0.1);
        }
        assert!(agent.is_marked_for_removal());

        let events = bus.drain();
        let killed = events
            .iter()
            .filter(|e| matches!(e, AgentEvent::Killed { .. }))
            .count();
        let despawned = events
            .iter()
            .filter(|e| matches!(e, AgentEvent::Despawned { .. }))
            .count();
        assert_eq!((killed, despawned), (1, 1));
    }

    #[test]
    fn test_die_disables_collision() {
        let body = Rc::new(RefCell::new(MockBody::new(Vec2::ZERO)));
        body.borrow_mut().velocity = Vec2::new(3.0, 1.0);
        let mut agent = Agent::new(AgentConfig::default(), Box::new(Rc::clone(&body)));

        agent.kill();
        assert!(!body.borrow().collision_enabled);
        assert_eq!(body.borrow().velocity, Vec2::ZERO);
    }

    #[test]
    fn test_push_and_stun_ignored_when_dead() {
        let mut agent = agent_at(Vec2::ZERO);
        agent.kill();
        agent.apply_parry_push(Vec2::X, 8.5, 0.18);
        agent.apply_parry_stun(1.2);
        assert_eq!(agent.push_remaining(), 0.0);
        assert_eq!(agent.stun_remaining(), 0.0);
    }

    #[test]
    fn test_push_zero_direction_goes_right() {
        let mut rig = Rig::new();
        let mut agent = agent_at(Vec2::ZERO);
        agent.apply_parry_push(Vec2::ZERO, 8.5, 0.18);
        agent.apply_parry_push(Vec2::ZERO, 8.5, 0.05);
        assert_eq!(agent.push_remaining(), 0.18);

        rig.fixed(&mut agent, DT);
        assert_eq!(agent.velocity(), Vec2::new(8.5, 0.0));
    }

    #[test]
    fn test_stun_ignores_non_positive() {
        let mut agent = agent_at(Vec2::ZERO);
        agent.apply_parry_stun(0.0);
        agent.apply_parry_stun(-1.0);
        assert!(!agent.is_stunned());
        agent.apply_parry_stun(1.2);
        agent.apply_parry_stun(0.5);
        assert_eq!(agent.stun_remaining(), 1.2);
    }

    #[test]
    fn test_stunned_state_clears_parryable() {
        let mut rig = Rig::new();
        let mut agent = agent_at(Vec2::ZERO);
        agent.set_parryable(true);
        assert!(agent.stun(0.2, Some(60.0)));
        assert!(!agent.is_parryable());
        assert_eq!(agent.state_kind(), StateKind::Stunned);

        rig.tick(&mut agent, 0.25);
        assert_eq!(agent.state_kind(), StateKind::ReturnToPatrol);
    }

    #[test]
    fn test_exposed_from_behind() {
        let mut agent = agent_at(Vec2::ZERO);
        agent.set_facing(1.0);
        assert!(agent.is_exposed_from_behind(Vec2::new(-1.0, 0.0), 0.35));
        assert!(!agent.is_exposed_from_behind(Vec2::new(1.0, 0.0), 0.35));
        assert!(!agent.is_exposed_from_behind(Vec2::new(-0.2, 1.0), 0.35));

        agent.set_facing(-1.0);
        assert!(agent.is_exposed_from_behind(Vec2::new(1.0, 0.0), 0.35));
    }

    #[test]
    fn test_facing_follows_velocity() {
        let mut rig = Rig::new();
        let body = Rc::new(RefCell::new(MockBody::new(Vec2::ZERO)));
        let mut agent = Agent::new(AgentConfig::default(), Box::new(Rc::clone(&body)));

        body.borrow_mut().velocity = Vec2::new(-2.0, 0.0);
        rig.tick(&mut agent, DT);
        assert_eq!(agent.facing(), -1.0);
        assert!(agent.locomotion().moving);
        assert_eq!(agent.locomotion().speed, 2.0);

        body.borrow_mut().velocity = Vec2::new(0.01, 0.0);
        rig.tick(&mut agent, DT);
        assert_eq!(agent.facing(), -1.0);
        assert!(!agent.locomotion().moving);
    }

    #[test]
    fn test_perform_melee_hit_uses_executor() {
        let mut rig = Rig::new();
        let player = EntityId::from_raw(999);
        rig.physics.insert(
            player,
            sentinel_common::Aabb::from_center(Vec2::new(0.0, 0.6), 0.3, 0.3),
            sentinel_common::LayerMask::PLAYER,
        );
        rig.receivers.accept(player);
        let mut agent = agent_at(Vec2::ZERO);

        let mut ctx = AgentContext::new(&rig.physics, &rig.targets, &mut rig.receivers, 0.0);
        assert!(agent.perform_melee_hit(Vec2::new(0.1, 1.0), &mut ctx));
        assert!(!agent.perform_melee_hit(Vec2::new(0.1, 1.0), &mut ctx));
    }

    #[test]
    fn test_patrol_center_override() {
        let mut agent = agent_at(Vec2::ZERO);
        agent.set_patrol_center(Some(Vec2::new(10.0, 0.0)));
        assert_eq!(agent.patrol_anchors().0, Vec2::new(7.0, 0.0));
        agent.set_patrol_center(None);
        assert_eq!(agent.patrol_center(), Vec2::ZERO);
    }
}
