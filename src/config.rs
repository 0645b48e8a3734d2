//! # Game Configuration
//!
//! Tunable parameters for the dungeon simulation. Every field has a default, so
//! a config file only needs to name the values it overrides.
//!
//! ## Loading
//! ```no_run
//! use voxel_dungeon::config::GameConfig;
//!
//! let config = GameConfig::load("dungeon.json").unwrap_or_default();
//! assert_eq!(config.timing.ticks_per_second, 60);
//! ```
//!
//! The voxel scale factor is deliberately absent: every cell is a 2-unit cube.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_PATH_ENV: &str = "VOXEL_DUNGEON_CONFIG";

/// Root configuration for a dungeon run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Grid and dungeon dimensions
    pub world: WorldConfig,
    /// Physics constants
    pub physics: PhysicsConfig,
    /// Delays and lifetimes, in ticks
    pub timing: TimingConfig,
    /// Damage, reach and progression
    pub combat: CombatConfig,
    /// Per-level population
    pub spawning: SpawningConfig,
}

impl GameConfig {
    /// Loads a config from a JSON file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it does not match the schema.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parses a config from a JSON string.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads the file named by [`CONFIG_PATH_ENV`], falling back to defaults.
    ///
    /// A file that fails to load is reported and ignored.
    pub fn from_env() -> Self {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => match Self::load(&path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path);
                    config
                }
                Err(err) => {
                    log::warn!("Ignoring config {}: {}", path, err);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

/// Dimensions of the voxel grid and of the dungeon graph it is built from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Grid cells along x
    pub grid_width: usize,
    /// Grid cells along y
    pub grid_height: usize,
    /// Grid cells along z
    pub grid_depth: usize,
    /// Dungeon tiles along x; each tile covers `grid_width / dungeon_width` cells
    pub dungeon_width: usize,
    /// Dungeon tiles along z
    pub dungeon_depth: usize,
    /// Grid layer tested for horizontal wall collisions
    pub collision_layer: i32,
    /// World-space height of the floor plane
    pub ground_level: f32,
    /// World-space height of the ceiling plane
    pub ceiling_level: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid_width: 50,
            grid_height: 10,
            grid_depth: 50,
            dungeon_width: 25,
            dungeon_depth: 25,
            collision_layer: 1,
            ground_level: 1.0,
            ceiling_level: 5.0,
        }
    }
}

/// Constants of the physics integrator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration per tick
    pub gravity: f32,
    /// Velocity multiplier on wall contact
    pub wall_bounce: f32,
    /// Velocity multiplier on floor and ceiling contact
    pub floor_bounce: f32,
    /// Repulsion per unit of cone overlap
    pub cone_stiffness: f32,
    /// Share of approaching velocity returned by a cone contact
    pub cone_restitution: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.006,
            wall_bounce: -0.3,
            floor_bounce: -0.3,
            cone_stiffness: 0.02,
            cone_restitution: 0.5,
        }
    }
}

/// Delays and lifetimes, all in simulation ticks.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Simulation ticks per second
    pub ticks_per_second: u32,
    /// Delay between a matched word and its effect
    pub command_delay_ticks: u64,
    /// Delay between an invalid word and its rejection
    pub reject_delay_ticks: u64,
    /// Alpha removed from a fading text buffer per tick
    pub fade_per_tick: f32,
    /// Lifetime of a typed letter or damage number
    pub letter_lifetime_ticks: u64,
    /// Idle ticks after which the letter fan-out restarts
    pub letter_burst_window_ticks: u64,
    /// Lifetime of a notification banner
    pub notification_ticks: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 60,
            command_delay_ticks: 18,
            reject_delay_ticks: 18,
            fade_per_tick: 0.05,
            letter_lifetime_ticks: 90,
            letter_burst_window_ticks: 24,
            notification_ticks: 180,
        }
    }
}

/// Damage, reach and progression.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Player starting health
    pub player_health: i32,
    /// Player starting mana
    pub player_mana: i32,
    /// Dice rolled by the `hit` command
    pub player_weapon_dice: String,
    /// Maximum distance of the `hit` command
    pub player_reach: f32,
    /// Dice rolled by the `zap` command
    pub zap_dice: String,
    /// Mana spent per `zap`
    pub zap_mana_cost: i32,
    /// Mob starting health
    pub mob_health: i32,
    /// Dice rolled by mob attacks
    pub mob_attack_dice: String,
    /// Distance at which mobs stop and attack
    pub mob_attack_range: f32,
    /// Ticks between mob attacks
    pub mob_attack_cooldown_ticks: u32,
    /// Pursuit acceleration per tick
    pub mob_acceleration: f32,
    /// Distance beyond which mobs ignore the player
    pub mob_sight_range: f32,
    /// Experience awarded for a kill
    pub mob_xp_value: u32,
    /// Experience needed for the first level-up
    pub xp_first_level: u32,
    /// Extra max health per level-up
    pub health_per_level: i32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            player_health: 30,
            player_mana: 10,
            player_weapon_dice: "2d4+3".to_string(),
            player_reach: 4.0,
            zap_dice: "2d6+0".to_string(),
            zap_mana_cost: 5,
            mob_health: 10,
            mob_attack_dice: "1d4+0".to_string(),
            mob_attack_range: 3.0,
            mob_attack_cooldown_ticks: 90,
            mob_acceleration: 0.002,
            mob_sight_range: 30.0,
            mob_xp_value: 10,
            xp_first_level: 20,
            health_per_level: 5,
        }
    }
}

/// Entity population of each level.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpawningConfig {
    /// Mobs placed per level
    pub mobs_per_level: usize,
    /// Items placed per level
    pub items_per_level: usize,
    /// Random tries when looking for a free tile before giving up
    pub max_free_tile_tries: usize,
    /// Minimum light intensity of a room light
    pub light_intensity_min: f32,
    /// Random extra intensity added to a room light
    pub light_intensity_spread: f32,
}

impl Default for SpawningConfig {
    fn default() -> Self {
        Self {
            mobs_per_level: 4,
            items_per_level: 1,
            max_free_tile_tries: 50,
            light_intensity_min: 4.0,
            light_intensity_spread: 5.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GameConfig::from_json(r#"{ "physics": { "gravity": 0.01 } }"#).unwrap();
        assert_eq!(config.physics.gravity, 0.01);
        assert_eq!(config.physics.wall_bounce, -0.3);
        assert_eq!(config.world.grid_width, 50);
        assert_eq!(config.timing.ticks_per_second, 60);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = GameConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = GameConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
