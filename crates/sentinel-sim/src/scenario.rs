//! Scripted scenario runner.
//!
//! One frame of the simulation:
//! 1. decision tick for every agent
//! 2. scripted player reactions (parry, stealth kill)
//! 3. as many fixed physics steps as the clock hands out
//! 4. damage bookkeeping and despawn
//!
//! The event bus is drained after every phase.

use std::cell::RefCell;
use std::rc::Rc;

use sentinel_ai::{
    Agent, AgentContext, AgentEvent, DamageReceiver, EventBus, PhysicsQuery, Stance, StateKind,
    Target, TargetRegistry,
};
use sentinel_common::{sign_or_positive, Aabb, EntityId, LayerMask, Vec2, DIRECTION_EPSILON_SQ};
use serde::Serialize;
use tracing::{debug, info};

use crate::arena::{Arena, SimBody};
use crate::config::{SimConfig, TargetScript};
use crate::timing::FixedStepClock;

// ============================================================================
// Scripted target
// ============================================================================

/// Player stand-in walking a waypoint loop.
#[derive(Debug, Clone)]
pub struct ScriptedTarget {
    id: EntityId,
    script: TargetScript,
    leg: usize,
    position: Vec2,
    facing: f32,
    health: i32,
}

impl ScriptedTarget {
    /// Places the target on the first waypoint.
    #[must_use]
    pub fn new(script: TargetScript) -> Self {
        let position = script.waypoints.first().copied().unwrap_or(Vec2::ZERO);
        Self {
            id: EntityId::new(),
            health: script.health,
            script,
            leg: 0,
            position,
            facing: 1.0,
        }
    }

    /// Target id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Index of the leg being walked.
    #[must_use]
    pub fn leg(&self) -> usize {
        self.leg
    }

    /// Facing sign on X.
    #[must_use]
    pub fn facing(&self) -> f32 {
        self.facing
    }

    /// Remaining hit points.
    #[must_use]
    pub fn health(&self) -> i32 {
        self.health
    }

    /// Whether the target still has hit points.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Collider bounds.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        let half = self.script.half_extents;
        Aabb::from_center(self.position, half.x, half.y)
    }

    /// Walks `speed * dt` along the loop, carrying over waypoint corners.
    pub fn step(&mut self, dt: f32) {
        let count = self.script.waypoints.len();
        if count < 2 || !self.is_alive() {
            return;
        }

        let mut budget = self.script.speed * dt;
        for _ in 0..count {
            if budget <= 0.0 {
                break;
            }
            let next = self.script.waypoints[(self.leg + 1) % count];
            let offset = next - self.position;
            let distance = offset.length();
            if offset.x.abs() > 1e-4 {
                self.facing = sign_or_positive(offset.x);
            }

            if distance <= budget {
                self.position = next;
                self.leg = (self.leg + 1) % count;
                budget -= distance;
            } else {
                self.position += offset / distance * budget;
                budget = 0.0;
            }
        }
    }

    /// Applies damage; returns the remaining hit points.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        self.health -= amount;
        self.health
    }
}

impl Target for ScriptedTarget {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn collider_center(&self) -> Option<Vec2> {
        Some(self.position)
    }

    fn stance(&self) -> Stance {
        if self.script.prone_legs.contains(&self.leg) {
            Stance::PRONE
        } else if self.script.crouch_legs.contains(&self.leg) {
            Stance::CROUCHING
        } else {
            Stance::STANDING
        }
    }
}

/// Registry holding the single scripted target under its tag.
#[derive(Debug)]
pub struct TargetBoard {
    tag: String,
    target: ScriptedTarget,
}

impl TargetBoard {
    /// Registers `target` under `tag`.
    #[must_use]
    pub fn new(tag: impl Into<String>, target: ScriptedTarget) -> Self {
        Self {
            tag: tag.into(),
            target,
        }
    }

    /// The scripted target.
    #[must_use]
    pub fn target(&self) -> &ScriptedTarget {
        &self.target
    }
}

impl TargetRegistry for TargetBoard {
    fn find_tagged(&self, tag: &str) -> Option<EntityId> {
        (tag == self.tag && self.target.is_alive()).then_some(self.target.id)
    }

    fn get(&self, id: EntityId) -> Option<&dyn Target> {
        (id == self.target.id && self.target.is_alive()).then_some(&self.target as &dyn Target)
    }
}

/// Collects strikes on the player until the end of the frame.
#[derive(Debug)]
pub struct DamageLedger {
    player: EntityId,
    pending: Vec<(i32, Vec2)>,
}

impl DamageLedger {
    /// Ledger accepting damage for `player` only.
    #[must_use]
    pub fn new(player: EntityId) -> Self {
        Self {
            player,
            pending: Vec::new(),
        }
    }

    /// Strikes recorded since the last drain.
    #[must_use]
    pub fn pending(&self) -> &[(i32, Vec2)] {
        &self.pending
    }
}

impl DamageReceiver for DamageLedger {
    fn apply_damage(&mut self, entity: EntityId, amount: i32, source: Vec2) -> bool {
        if entity != self.player {
            return false;
        }
        self.pending.push((amount, source));
        true
    }
}

// ============================================================================
// Summary
// ============================================================================

/// A state entered by an agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionRecord {
    /// Simulation time of the frame the event was collected in
    pub time: f32,
    /// Agent
    pub agent: EntityId,
    /// State entered
    pub state: StateKind,
}

/// Final state of an agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSnapshot {
    /// Agent
    pub agent: EntityId,
    /// Active state
    pub state: StateKind,
    /// Final position
    pub position: Vec2,
}

/// Result of a run, printed as JSON by the binary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimSummary {
    /// Simulated time
    pub duration_seconds: f32,
    /// Decision frames
    pub frames: u64,
    /// Fixed physics steps
    pub physics_steps: u64,
    /// Every state entered, in order
    pub transitions: Vec<TransitionRecord>,
    /// Strikes dispatched by agents
    pub strikes: u32,
    /// Strikes that damaged the player
    pub player_hits: u32,
    /// Total damage dealt to the player
    pub player_damage: i32,
    /// Whether the player survived
    pub player_alive: bool,
    /// Successful parries
    pub parries: u32,
    /// Agents killed from behind
    pub stealth_kills: u32,
    /// Agents killed by any means
    pub kills: u32,
    /// Agents removed after their despawn delay
    pub despawned: u32,
    /// Agents still present at the end
    pub agents: Vec<AgentSnapshot>,
}

// ============================================================================
// Simulation
// ============================================================================

#[derive(Debug)]
struct SimAgent {
    agent: Agent,
    body: Rc<RefCell<SimBody>>,
    windups: u32,
    was_parryable: bool,
}

/// Headless simulation of agents hunting the scripted target.
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    arena: Arena,
    board: TargetBoard,
    ledger: DamageLedger,
    agents: Vec<SimAgent>,
    bus: EventBus,
    clock: FixedStepClock,
    now: f32,
    parry_cooldown: f32,
    summary: SimSummary,
}

impl Simulation {
    /// Builds the arena and spawns one agent per spawn point.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        let mut arena = Arena::new(&config.walls);
        let target = ScriptedTarget::new(config.target.clone());
        arena.set_collider(target.id(), target.bounds(), LayerMask::PLAYER);
        let ledger = DamageLedger::new(target.id());
        let board = TargetBoard::new(config.target.tag.clone(), target);
        let bus = EventBus::new(config.event_capacity);

        let agents = config
            .spawns
            .iter()
            .map(|&spawn| {
                let body = Rc::new(RefCell::new(SimBody::new(spawn, config.agent_half_extents)));
                let mut agent = Agent::new(config.agent.clone(), Box::new(Rc::clone(&body)))
                    .with_events(bus.sender());
                agent.start();
                arena.set_collider(agent.id(), body.borrow().bounds(), LayerMask::ENEMY);
                info!("Spawned agent {} at {spawn}", agent.id());
                SimAgent {
                    agent,
                    body,
                    windups: 0,
                    was_parryable: false,
                }
            })
            .collect();

        info!(
            "Arena ready: {} walls, {} agents",
            arena.wall_count(),
            config.spawns.len()
        );

        Self {
            clock: FixedStepClock::new(config.physics_hz),
            config,
            arena,
            board,
            ledger,
            agents,
            bus,
            now: 0.0,
            parry_cooldown: 0.0,
            summary: SimSummary::default(),
        }
    }

    /// Current simulation time.
    #[must_use]
    pub fn now(&self) -> f32 {
        self.now
    }

    /// Summary so far.
    #[must_use]
    pub fn summary(&self) -> &SimSummary {
        &self.summary
    }

    /// The scripted target.
    #[must_use]
    pub fn target(&self) -> &ScriptedTarget {
        self.board.target()
    }

    /// Agents still in the world.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().map(|entry| &entry.agent)
    }

    /// Runs for the configured duration.
    pub fn run(mut self) -> SimSummary {
        info!("Running for {:.1}s", self.config.duration_seconds);
        while self.now < self.config.duration_seconds {
            self.frame();
        }
        self.finish()
    }

    /// Advances one decision frame.
    pub fn frame(&mut self) {
        let dt = self.config.frame_seconds;
        self.now += dt;
        self.summary.frames += 1;

        self.decide(dt);
        self.collect_events();
        self.player_actions(dt);
        self.collect_events();

        let fixed_dt = self.clock.fixed_dt();
        for _ in 0..self.clock.accumulate(dt) {
            self.physics_step(fixed_dt);
            self.collect_events();
        }

        self.apply_player_damage();
        self.remove_despawned();
    }

    fn decide(&mut self, dt: f32) {
        let Self {
            arena,
            board,
            ledger,
            agents,
            now,
            ..
        } = self;
        for entry in agents.iter_mut() {
            let mut ctx = AgentContext::new(&*arena, &*board, &mut *ledger, *now);
            entry.agent.tick(dt, &mut ctx);
        }
    }

    fn player_actions(&mut self, dt: f32) {
        self.parry_cooldown = (self.parry_cooldown - dt).max(0.0);
        let target = self.board.target();
        if !target.is_alive() {
            return;
        }
        let player = target.position();
        let facing = Vec2::new(target.facing(), 0.0);
        let stealthed = target.stance().is_stealthed();
        let actions = &self.config.player;

        // Parry: react to the rising edge of a windup in reach.
        let hitbox = player + facing * actions.parry_offset;
        let in_reach = self
            .arena
            .overlap_circle(hitbox, actions.parry_radius, LayerMask::ENEMY);
        for entry in &mut self.agents {
            let parryable = entry.agent.is_parryable();
            let rising = parryable && !entry.was_parryable;
            entry.was_parryable = parryable;
            if !rising {
                continue;
            }
            entry.windups += 1;

            let id = entry.agent.id();
            let wants = actions.parry_every > 0 && entry.windups % actions.parry_every == 0;
            if !wants || self.parry_cooldown > 0.0 || !in_reach.iter().any(|c| c.entity == id) {
                continue;
            }
            if !entry.agent.try_parry() {
                continue;
            }

            let mut push = entry.agent.position() - player;
            if push.length_squared() < DIRECTION_EPSILON_SQ {
                push = facing;
            }
            entry.agent.apply_parry_push(push, actions.push_speed, actions.push_seconds);
            entry.agent.apply_parry_stun(actions.stun_seconds);
            entry.was_parryable = false;
            self.parry_cooldown = actions.parry_cooldown;
            self.summary.parries += 1;
            info!("Player parried agent {id} at t={:.2}", self.now);
        }

        // Stealth kill: first unaware agent in reach with its back turned.
        if !actions.stealth_kills || !stealthed {
            return;
        }
        let reach = self
            .arena
            .overlap_circle(player, actions.kill_radius, LayerMask::ENEMY);
        for entry in &mut self.agents {
            let id = entry.agent.id();
            if entry.agent.is_dead() || !reach.iter().any(|c| c.entity == id) {
                continue;
            }
            if entry.agent.is_exposed_from_behind(player, actions.behind_threshold)
                && entry.agent.kill()
            {
                self.summary.stealth_kills += 1;
                info!("Player stealth-killed agent {id} at t={:.2}", self.now);
                break;
            }
        }
    }

    fn physics_step(&mut self, dt: f32) {
        self.summary.physics_steps += 1;
        self.board.target.step(dt);
        let target = &self.board.target;
        if target.is_alive() {
            self.arena
                .set_collider(target.id(), target.bounds(), LayerMask::PLAYER);
        }

        for entry in &mut self.agents {
            {
                let mut ctx =
                    AgentContext::new(&self.arena, &self.board, &mut self.ledger, self.now);
                entry.agent.fixed_tick(dt, &mut ctx);
            }

            let mut body = entry.body.borrow_mut();
            body.integrate(dt);
            self.arena.resolve_walls(&mut body);
            if body.collision_enabled {
                self.arena
                    .set_collider(entry.agent.id(), body.bounds(), LayerMask::ENEMY);
            } else {
                self.arena.remove_collider(entry.agent.id());
            }
        }
    }

    fn apply_player_damage(&mut self) {
        if self.ledger.pending.is_empty() {
            return;
        }
        for (amount, source) in self.ledger.pending.drain(..) {
            self.summary.player_hits += 1;
            self.summary.player_damage += amount;
            if !self.board.target.is_alive() {
                continue;
            }
            let left = self.board.target.take_damage(amount);
            debug!("Player took {amount} from {source}, {left} left");
            if left <= 0 {
                info!("Player down at t={:.2}", self.now);
                self.arena.remove_collider(self.board.target.id());
            }
        }
    }

    fn collect_events(&mut self) {
        for event in self.bus.drain() {
            match event {
                AgentEvent::StateEntered { agent, state } => {
                    self.summary.transitions.push(TransitionRecord {
                        time: self.now,
                        agent,
                        state,
                    });
                },
                AgentEvent::AttackDispatched { .. } => self.summary.strikes += 1,
                AgentEvent::Killed { .. } => self.summary.kills += 1,
                AgentEvent::Despawned { .. } => self.summary.despawned += 1,
                AgentEvent::StateExited { .. } | AgentEvent::Parried { .. } => {},
            }
        }
    }

    fn remove_despawned(&mut self) {
        let arena = &mut self.arena;
        self.agents.retain(|entry| {
            if entry.agent.is_marked_for_removal() {
                arena.remove_collider(entry.agent.id());
                debug!("Removed agent {}", entry.agent.id());
                false
            } else {
                true
            }
        });
    }

    fn finish(mut self) -> SimSummary {
        self.summary.duration_seconds = self.now;
        self.summary.player_alive = self.board.target.is_alive();
        self.summary.agents = self
            .agents
            .iter()
            .map(|entry| AgentSnapshot {
                agent: entry.agent.id(),
                state: entry.agent.state_kind(),
                position: entry.agent.position(),
            })
            .collect();
        info!(
            "Run finished: {} strikes, {} hits, {} parries, {} kills",
            self.summary.strikes, self.summary.player_hits, self.summary.parries, self.summary.kills
        );
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WallConfig;

    fn lone_agent_config(spawn: Vec2, target: TargetScript) -> SimConfig {
        let mut config = SimConfig {
            duration_seconds: 5.0,
            spawns: vec![spawn],
            walls: Vec::new(),
            target,
            ..SimConfig::default()
        };
        // Hold position at the spawn point.
        config.agent.patrol.anchor_a = Some(spawn);
        config.agent.patrol.anchor_b = Some(spawn);
        config
    }

    #[test]
    fn test_target_walks_loop() {
        let mut target = ScriptedTarget::new(TargetScript {
            waypoints: vec![Vec2::ZERO, Vec2::new(1.0, 0.0)],
            speed: 1.0,
            prone_legs: vec![1],
            ..TargetScript::default()
        });
        assert_eq!(target.stance(), Stance::STANDING);

        target.step(0.5);
        assert_eq!(target.position(), Vec2::new(0.5, 0.0));
        target.step(0.75);
        assert_eq!(target.leg(), 1);
        assert_eq!(target.facing(), -1.0);
        assert!((target.position().x - 0.75).abs() < 1e-5);
        assert_eq!(target.stance(), Stance::PRONE);
    }

    #[test]
    fn test_single_waypoint_stays_put() {
        let mut target = ScriptedTarget::new(TargetScript {
            waypoints: vec![Vec2::new(2.0, 1.0)],
            ..TargetScript::default()
        });
        target.step(1.0);
        assert_eq!(target.position(), Vec2::new(2.0, 1.0));
    }

    #[test]
    fn test_board_hides_dead_target() {
        let target = ScriptedTarget::new(TargetScript::default());
        let id = target.id();
        let mut board = TargetBoard::new("Player", target);
        assert_eq!(board.find_tagged("Player"), Some(id));
        assert_eq!(board.find_tagged("Boss"), None);

        board.target.take_damage(100);
        assert_eq!(board.find_tagged("Player"), None);
        assert!(board.get(id).is_none());
    }

    #[test]
    fn test_ledger_accepts_only_player() {
        let player = EntityId::from_raw(1);
        let mut ledger = DamageLedger::new(player);
        assert!(ledger.apply_damage(player, 2, Vec2::ZERO));
        assert!(!ledger.apply_damage(EntityId::from_raw(2), 2, Vec2::ZERO));
        assert_eq!(ledger.pending(), &[(2, Vec2::ZERO)]);
    }

    #[test]
    fn test_default_run_produces_summary() {
        let config = SimConfig {
            duration_seconds: 10.0,
            ..SimConfig::default()
        };
        let summary = Simulation::new(config).run();

        assert_eq!(summary.physics_steps, summary.frames);
        assert!(summary.frames >= 600);
        assert!(summary
            .transitions
            .iter()
            .any(|t| t.state == StateKind::Patrol));

        let json = serde_json::to_string(&summary).expect("summary serializes");
        assert!(json.contains("\"transitions\""));
    }

    #[test]
    fn test_player_parries_windup() {
        let target = TargetScript {
            waypoints: vec![Vec2::new(-1.0, 0.0)],
            health: 1000,
            ..TargetScript::default()
        };
        let mut config = lone_agent_config(Vec2::ZERO, target);
        config.player.parry_every = 1;
        let summary = Simulation::new(config).run();

        assert!(summary.parries >= 1);
        assert!(summary.transitions.iter().any(|t| t.state == StateKind::Attack));
    }

    #[test]
    fn test_player_without_parry_gets_hit() {
        let target = TargetScript {
            waypoints: vec![Vec2::new(-0.8, 0.0)],
            health: 1000,
            ..TargetScript::default()
        };
        let mut config = lone_agent_config(Vec2::ZERO, target);
        config.player.parry_every = 0;
        let summary = Simulation::new(config).run();

        assert_eq!(summary.parries, 0);
        assert!(summary.strikes >= 1);
        assert!(summary.player_hits >= 1);
    }

    #[test]
    fn test_crouched_player_kills_from_behind() {
        let target = TargetScript {
            waypoints: vec![Vec2::new(-4.0, 0.0), Vec2::new(0.0, 0.0)],
            speed: 2.0,
            crouch_legs: vec![0, 1],
            prone_legs: Vec::new(),
            ..TargetScript::default()
        };
        let config = lone_agent_config(Vec2::ZERO, target);
        let mut sim = Simulation::new(config);

        while sim.now() < 3.0 {
            sim.frame();
        }

        assert_eq!(sim.summary().stealth_kills, 1);
        assert_eq!(sim.summary().kills, 1);
        assert!(sim.summary().player_hits == 0);
    }

    #[test]
    fn test_smallest_event_bus_keeps_kill() {
        let target = TargetScript {
            waypoints: vec![Vec2::new(-4.0, 0.0), Vec2::new(0.0, 0.0)],
            speed: 2.0,
            crouch_legs: vec![0, 1],
            prone_legs: Vec::new(),
            ..TargetScript::default()
        };
        let mut config = lone_agent_config(Vec2::ZERO, target);
        config.event_capacity = crate::config::MIN_EVENT_CAPACITY as usize;
        config.validate().expect("smallest capacity is valid");
        let mut sim = Simulation::new(config);

        while sim.now() < 3.0 {
            sim.frame();
        }

        let summary = sim.summary();
        assert_eq!(summary.stealth_kills, 1);
        assert_eq!(summary.kills, 1);
        assert!(summary.transitions.iter().any(|t| t.state == StateKind::Die));
    }

    #[test]
    fn test_wall_hides_player() {
        let target = TargetScript {
            waypoints: vec![Vec2::new(4.0, 0.0)],
            ..TargetScript::default()
        };
        let mut config = lone_agent_config(Vec2::ZERO, target);
        config.walls = vec![WallConfig::new(Vec2::new(2.0, 0.0), Vec2::new(0.2, 2.0))];
        config.duration_seconds = 1.0;
        let mut sim = Simulation::new(config);
        sim.frame();

        assert!(sim.agents().all(|agent| !agent.can_see_target()));
        let summary = sim.finish();
        assert!(summary.transitions.iter().all(|t| t.state == StateKind::Patrol));
    }
}
