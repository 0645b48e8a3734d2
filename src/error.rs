//! # Error Types
//!
//! Errors surfaced by the fallible parts of the dungeon core: dice notation
//! parsing, configuration loading and level population.

use thiserror::Error;

/// Errors produced while parsing `NdS+M` dice notation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiceError {
    /// The notation did not have the `NdS`, `NdS+M` or `NdS-M` shape.
    #[error("malformed dice notation: {0:?}")]
    Malformed(String),

    /// A die must have at least one side.
    #[error("dice notation {0:?} has zero-sided dice")]
    ZeroSides(String),
}

/// Errors produced while loading a [`GameConfig`](crate::config::GameConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file was not valid JSON for the config schema.
    #[error("could not parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors produced when copying a dungeon graph into the voxel grid.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LevelError {
    /// The dungeon footprint does not fit the voxel grid.
    #[error("dungeon of {dungeon_width}x{dungeon_depth} tiles does not fit a {grid_width}x{grid_depth} grid")]
    DungeonTooLarge {
        /// Dungeon width in dungeon tiles.
        dungeon_width: usize,
        /// Dungeon depth in dungeon tiles.
        dungeon_depth: usize,
        /// Grid width in cells.
        grid_width: usize,
        /// Grid depth in cells.
        grid_depth: usize,
    },

    /// The dungeon graph has no rooms to place the player in.
    #[error("dungeon has no rooms")]
    NoRooms,

    /// The dungeon graph names a starting room it does not have.
    #[error("initial room {initial_room} is out of range for {room_count} rooms")]
    InitialRoomOutOfRange {
        /// Index reported by the graph.
        initial_room: usize,
        /// Number of rooms in the graph.
        room_count: usize,
    },
}
