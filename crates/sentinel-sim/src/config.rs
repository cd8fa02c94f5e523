//! Simulation configuration.
//!
//! Run length, arena layout, the scripted target, the player's reactions and
//! the shared agent tuning. Loaded from TOML; missing fields keep their
//! defaults.

use sentinel_ai::AgentConfig;
use sentinel_common::{ConfigError, SentinelError, SentinelResult, Vec2};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::timing::DEFAULT_PHYSICS_HZ;

/// Configuration file name.
pub const CONFIG_FILE: &str = "sentinel.toml";

/// Smallest accepted event bus capacity. The host drains after every phase
/// and one phase publishes at most a handful of events per agent.
pub const MIN_EVENT_CAPACITY: f32 = 16.0;

/// Largest accepted event bus capacity.
const MAX_EVENT_CAPACITY: f32 = 1_048_576.0;

/// Axis-aligned wall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallConfig {
    /// Wall center
    pub center: Vec2,
    /// Half width and half height
    pub half_extents: Vec2,
}

impl WallConfig {
    /// Creates a wall.
    #[must_use]
    pub const fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents,
        }
    }
}

/// Waypoint loop walked by the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetScript {
    /// Tag agents look the target up by
    pub tag: String,
    /// Loop of points; leg `i` runs from point `i` to point `i + 1`
    pub waypoints: Vec<Vec2>,
    /// Walking speed (units/s)
    pub speed: f32,
    /// Legs walked prone
    pub prone_legs: Vec<usize>,
    /// Legs walked crouching
    pub crouch_legs: Vec<usize>,
    /// Collider half extents
    pub half_extents: Vec2,
    /// Hit points
    pub health: i32,
}

impl Default for TargetScript {
    fn default() -> Self {
        Self {
            tag: "Player".to_string(),
            waypoints: vec![
                Vec2::new(-9.0, 0.0),
                Vec2::new(9.0, 0.0),
                Vec2::new(9.0, 4.0),
                Vec2::new(-9.0, 4.0),
            ],
            speed: 2.4,
            prone_legs: vec![2],
            crouch_legs: Vec::new(),
            half_extents: Vec2::new(0.3, 0.5),
            health: 5,
        }
    }
}

/// How the scripted player reacts to agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerActions {
    /// Parry every Nth windup in reach (0 = never)
    pub parry_every: u32,
    /// Parry hitbox radius
    pub parry_radius: f32,
    /// Parry hitbox offset along facing
    pub parry_offset: f32,
    /// Minimum time between parries (seconds)
    pub parry_cooldown: f32,
    /// Push speed applied to a parried agent
    pub push_speed: f32,
    /// Push lock (seconds)
    pub push_seconds: f32,
    /// Extra stun on a parried agent (0 = none)
    pub stun_seconds: f32,
    /// Kill unaware agents from behind while stealthed
    pub stealth_kills: bool,
    /// Stealth kill reach
    pub kill_radius: f32,
    /// Required "behind" dot
    pub behind_threshold: f32,
}

impl Default for PlayerActions {
    fn default() -> Self {
        Self {
            parry_every: 2,
            parry_radius: 0.55,
            parry_offset: 0.65,
            parry_cooldown: 0.45,
            push_speed: 8.5,
            push_seconds: 0.18,
            stun_seconds: 1.2,
            stealth_kills: true,
            kill_radius: 0.6,
            behind_threshold: 0.35,
        }
    }
}

/// Simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Run ===
    /// Simulated time (seconds)
    pub duration_seconds: f32,
    /// Decision tick length (seconds)
    pub frame_seconds: f32,
    /// Physics rate
    pub physics_hz: u32,
    /// Event bus capacity
    pub event_capacity: usize,

    // === World ===
    /// Agent spawn points
    pub spawns: Vec<Vec2>,
    /// Agent collider half extents
    pub agent_half_extents: Vec2,
    /// Static walls
    pub walls: Vec<WallConfig>,
    /// Scripted target
    pub target: TargetScript,
    /// Player reactions
    pub player: PlayerActions,

    // === Agents ===
    /// Tuning shared by every agent
    pub agent: AgentConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 30.0,
            frame_seconds: 1.0 / 60.0,
            physics_hz: DEFAULT_PHYSICS_HZ,
            event_capacity: 1024,
            spawns: vec![Vec2::new(-4.0, 0.0), Vec2::new(5.0, 4.0)],
            agent_half_extents: Vec2::new(0.3, 0.5),
            walls: vec![WallConfig::new(Vec2::new(0.5, 2.0), Vec2::new(0.25, 0.6))],
            target: TargetScript::default(),
            player: PlayerActions::default(),
            agent: AgentConfig::default(),
        }
    }
}

impl SimConfig {
    /// Reads and parses a config file.
    pub fn read<P: AsRef<Path>>(path: P) -> SentinelResult<Self> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| SentinelError::Serialization(e.to_string()))
    }

    /// Loads `path`, falling back to defaults when the file is missing or
    /// cannot be parsed.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        match Self::read(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Ignoring config file {}: {e}", path.display());
                Self::default()
            },
        }
    }

    /// Writes the config as TOML, creating parent directories.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> SentinelResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| SentinelError::Serialization(e.to_string()))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Checks run parameters and agent tuning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_duration("duration_seconds", self.duration_seconds)?;
        ConfigError::check_range("frame_seconds", self.frame_seconds, 0.001, 0.25)?;
        ConfigError::check_range("physics_hz", self.physics_hz as f32, 1.0, 1000.0)?;
        ConfigError::check_range(
            "event_capacity",
            self.event_capacity as f32,
            MIN_EVENT_CAPACITY,
            MAX_EVENT_CAPACITY,
        )?;
        ConfigError::check_distance("agent_half_extents.x", self.agent_half_extents.x)?;
        ConfigError::check_distance("agent_half_extents.y", self.agent_half_extents.y)?;

        for wall in &self.walls {
            ConfigError::check_distance("walls.half_extents.x", wall.half_extents.x)?;
            ConfigError::check_distance("walls.half_extents.y", wall.half_extents.y)?;
        }

        if self.target.waypoints.is_empty() {
            return Err(ConfigError::Empty {
                field: "target.waypoints",
            });
        }
        ConfigError::check_distance("target.speed", self.target.speed)?;

        let player = &self.player;
        ConfigError::check_distance("player.parry_radius", player.parry_radius)?;
        ConfigError::check_duration("player.parry_cooldown", player.parry_cooldown)?;
        ConfigError::check_duration("player.push_seconds", player.push_seconds)?;
        ConfigError::check_duration("player.stun_seconds", player.stun_seconds)?;
        ConfigError::check_distance("player.kill_radius", player.kill_radius)?;
        ConfigError::check_range("player.behind_threshold", player.behind_threshold, 0.0, 1.0)?;

        self.agent.validate()
    }
}
