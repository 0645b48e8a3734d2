//! # Tile Module
//!
//! Tile identities stored in the voxel grid and the atlas frames each one
//! samples for its top, side and bottom faces.

use num_derive::FromPrimitive;

pub mod tile_side;

use tile_side::FaceGroup;

/// The underlying integer type used to store tile keys in the grid.
/// `0` is reserved for empty cells.
pub type TileKeySize = u8;

/// Columns of frames in the texture atlas.
pub const ATLAS_COLUMNS: u8 = 4;
/// Rows of frames in the texture atlas.
pub const ATLAS_ROWS: u8 = 1;

/// Enumerates the materials a grid cell can hold.
///
/// Discriminants start at 1 so the compact grid storage can use 0 for empty.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub enum TileKey {
    /// Walkable ground layer
    FLOOR = 1,
    /// Dungeon walls in the walkable band
    WALL = 2,
    /// Everything above the walkable band
    CEILING = 3,
    /// Floor cell that advances the level when stood on
    EXIT = 4,
}

impl TileKey {
    /// Converts a stored `TileKeySize` back to a key, `None` for empty cells.
    ///
    /// # Panics
    /// Debug builds panic on a value that names no tile.
    pub fn from_stored(value: TileKeySize) -> Option<Self> {
        if value == 0 {
            return None;
        }
        let key = num::FromPrimitive::from_u8(value);
        debug_assert!(key.is_some(), "grid holds unknown tile key {}", value);
        key
    }

    /// The compact value stored in the grid.
    pub fn stored(self) -> TileKeySize {
        self as TileKeySize
    }

    /// The atlas frames used by this tile.
    pub fn definition(self) -> TileDefinition {
        TILE_DEFINITIONS[self as usize - 1]
    }
}

/// A frame of the texture atlas, addressed by column and row.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AtlasFrame {
    /// Column in the atlas grid
    pub column: u8,
    /// Row in the atlas grid
    pub row: u8,
}

impl AtlasFrame {
    /// Creates a frame reference.
    pub const fn new(column: u8, row: u8) -> Self {
        AtlasFrame { column, row }
    }

    /// Maps a face-local texture coordinate (0..1) into atlas space.
    pub fn map_uv(self, uv: [f32; 2]) -> [f32; 2] {
        [
            (self.column as f32 + uv[0]) / ATLAS_COLUMNS as f32,
            (self.row as f32 + uv[1]) / ATLAS_ROWS as f32,
        ]
    }
}

/// Maps a tile to the atlas frames of its top, side and bottom faces.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TileDefinition {
    /// Frame of upward-facing faces
    pub top: AtlasFrame,
    /// Frame of vertical faces
    pub side: AtlasFrame,
    /// Frame of downward-facing faces
    pub bottom: AtlasFrame,
}

impl TileDefinition {
    /// The frame sampled by the given face group.
    pub fn frame(&self, group: FaceGroup) -> AtlasFrame {
        match group {
            FaceGroup::Top => self.top,
            FaceGroup::Side => self.side,
            FaceGroup::Bottom => self.bottom,
        }
    }
}

/// Atlas frames per tile, indexed by `TileKey as usize - 1`.
///
/// Atlas layout: 0 flagstone, 1 brick, 2 rough stone, 3 exit grate.
pub static TILE_DEFINITIONS: [TileDefinition; 4] = [
    // FLOOR
    TileDefinition {
        top: AtlasFrame::new(0, 0),
        side: AtlasFrame::new(2, 0),
        bottom: AtlasFrame::new(2, 0),
    },
    // WALL
    TileDefinition {
        top: AtlasFrame::new(2, 0),
        side: AtlasFrame::new(1, 0),
        bottom: AtlasFrame::new(2, 0),
    },
    // CEILING
    TileDefinition {
        top: AtlasFrame::new(2, 0),
        side: AtlasFrame::new(2, 0),
        bottom: AtlasFrame::new(2, 0),
    },
    // EXIT
    TileDefinition {
        top: AtlasFrame::new(3, 0),
        side: AtlasFrame::new(2, 0),
        bottom: AtlasFrame::new(2, 0),
    },
];
