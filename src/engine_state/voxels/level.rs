//! # Level Population
//!
//! Copies an externally generated dungeon graph into the voxel grid.
//!
//! ## Layers
//! - `y = 0`: floor everywhere (one cell becomes the exit)
//! - `y` in [`WALL_LAYERS`]: walls wherever the dungeon reports one
//! - everything above: solid ceiling
//!
//! Each dungeon tile covers `grid_width / dungeon_width` cells along x (and the
//! matching ratio along z).

use std::ops::RangeInclusive;

use bitvec::prelude::BitVec;
use cgmath::{MetricSpace, Point2, Point3};

use super::{
    grid::{VoxelGrid, HALF_VOXEL, VOXEL_SCALE},
    tile::TileKey,
};
use crate::error::LevelError;

/// Grid layers forming the walkable band between floor and ceiling.
pub const WALL_LAYERS: RangeInclusive<usize> = 1..=2;

/// A rectangular room of the dungeon graph, in dungeon tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    /// Lowest x and z tile covered by the room
    pub position: [usize; 2],
    /// Extent along x and z
    pub size: [usize; 2],
    /// Tiles just outside the room where a corridor leaves it
    pub exits: Vec<[usize; 2]>,
}

impl Room {
    /// Creates a room without exits.
    pub fn new(position: [usize; 2], size: [usize; 2]) -> Self {
        Room {
            position,
            size,
            exits: Vec::new(),
        }
    }

    /// Tile at the middle of the room.
    pub fn center(&self) -> [usize; 2] {
        [
            self.position[0] + self.size[0] / 2,
            self.position[1] + self.size[1] / 2,
        ]
    }

    /// Whether a tile lies inside the room.
    pub fn contains(&self, tile: [usize; 2]) -> bool {
        (self.position[0]..self.position[0] + self.size[0]).contains(&tile[0])
            && (self.position[1]..self.position[1] + self.size[1]).contains(&tile[1])
    }

    fn center_point(&self) -> Point2<f32> {
        let [x, z] = self.center();
        Point2::new(x as f32, z as f32)
    }
}

/// The level generator boundary: a room graph plus wall occupancy.
pub trait DungeonGraph {
    /// Width and depth in dungeon tiles.
    fn size(&self) -> [usize; 2];

    /// Every room of the dungeon.
    fn rooms(&self) -> &[Room];

    /// Index into [`DungeonGraph::rooms`] of the room the player starts in.
    fn initial_room(&self) -> usize;

    /// Whether the tile is a wall. Tiles outside the dungeon are walls.
    fn is_wall(&self, x: usize, z: usize) -> bool;
}

/// A dungeon graph built by carving rooms and corridors out of solid rock.
///
/// Used by the host as its level source and by tests to build small,
/// predictable layouts.
#[derive(Debug, Clone)]
pub struct DungeonLayout {
    width: usize,
    depth: usize,
    walls: BitVec,
    rooms: Vec<Room>,
    initial_room: usize,
}

impl DungeonLayout {
    /// Creates a dungeon that is wall everywhere.
    pub fn new(width: usize, depth: usize) -> Self {
        DungeonLayout {
            width,
            depth,
            walls: BitVec::repeat(true, width * depth),
            rooms: Vec::new(),
            initial_room: 0,
        }
    }

    fn clear_tile(&mut self, x: usize, z: usize) {
        if x < self.width && z < self.depth {
            self.walls.set(x + z * self.width, false);
        }
    }

    /// Clears a room's tiles and returns its index.
    pub fn carve_room(&mut self, position: [usize; 2], size: [usize; 2]) -> usize {
        for z in position[1]..position[1] + size[1] {
            for x in position[0]..position[0] + size[0] {
                self.clear_tile(x, z);
            }
        }
        self.rooms.push(Room::new(position, size));
        self.rooms.len() - 1
    }

    /// Clears an L-shaped corridor between two tiles, x first, then z.
    ///
    /// Returns the tiles of the corridor in walking order.
    pub fn carve_corridor(&mut self, from: [usize; 2], to: [usize; 2]) -> Vec<[usize; 2]> {
        let mut path = Vec::new();
        let [mut x, mut z] = from;
        path.push([x, z]);
        while x != to[0] {
            x = if x < to[0] { x + 1 } else { x - 1 };
            path.push([x, z]);
        }
        while z != to[1] {
            z = if z < to[1] { z + 1 } else { z - 1 };
            path.push([x, z]);
        }
        for &[x, z] in &path {
            self.clear_tile(x, z);
        }
        path
    }

    /// Joins two rooms with a corridor between their centres and records
    /// where it leaves each of them.
    pub fn connect(&mut self, a: usize, b: usize) {
        let path = self.carve_corridor(self.rooms[a].center(), self.rooms[b].center());

        let leaving_a = path.iter().find(|tile| !self.rooms[a].contains(**tile)).copied();
        let entering_b = path
            .iter()
            .rev()
            .find(|tile| !self.rooms[b].contains(**tile))
            .copied();

        if let Some(exit) = leaving_a {
            self.rooms[a].exits.push(exit);
        }
        if let Some(exit) = entering_b {
            self.rooms[b].exits.push(exit);
        }
    }

    /// Marks which room the player starts in.
    pub fn set_initial_room(&mut self, room: usize) {
        debug_assert!(room < self.rooms.len());
        self.initial_room = room;
    }

    /// Scatters up to `room_count` non-overlapping rooms and chains them with
    /// corridors. The first room is a small starting room.
    ///
    /// Placement gives up on a room after a bounded number of tries, so the
    /// result may hold fewer rooms than requested.
    pub fn scatter(width: usize, depth: usize, room_count: usize, rng: &mut fastrand::Rng) -> Self {
        const TRIES_PER_ROOM: usize = 30;
        let mut layout = DungeonLayout::new(width, depth);

        for n in 0..room_count {
            let (min, max) = if n == 0 { (3, 3) } else { (4, 7) };
            for _ in 0..TRIES_PER_ROOM {
                let size = [rng.usize(min..=max), rng.usize(min..=max)];
                if size[0] + 2 > width || size[1] + 2 > depth {
                    break;
                }
                let position = [
                    rng.usize(1..=width - size[0] - 1),
                    rng.usize(1..=depth - size[1] - 1),
                ];
                let candidate = Room::new(position, size);
                if layout.rooms.iter().all(|room| !overlaps(room, &candidate, 1)) {
                    layout.carve_room(position, size);
                    break;
                }
            }
        }

        for n in 1..layout.rooms.len() {
            layout.connect(n - 1, n);
        }

        log::debug!(
            "Scattered {} of {} rooms over {}x{} tiles",
            layout.rooms.len(),
            room_count,
            width,
            depth
        );
        layout
    }
}

fn overlaps(a: &Room, b: &Room, margin: usize) -> bool {
    let separated = |a_pos: usize, a_size: usize, b_pos: usize, b_size: usize| {
        a_pos + a_size + margin <= b_pos || b_pos + b_size + margin <= a_pos
    };
    !(separated(a.position[0], a.size[0], b.position[0], b.size[0])
        || separated(a.position[1], a.size[1], b.position[1], b.size[1]))
}

impl DungeonGraph for DungeonLayout {
    fn size(&self) -> [usize; 2] {
        [self.width, self.depth]
    }

    fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    fn initial_room(&self) -> usize {
        self.initial_room
    }

    fn is_wall(&self, x: usize, z: usize) -> bool {
        if x >= self.width || z >= self.depth {
            return true;
        }
        self.walls[x + z * self.width]
    }
}

/// How a dungeon graph was mapped onto the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelMap {
    /// Grid cells per dungeon tile along x and z
    pub tile_scale: [usize; 2],
    /// Grid column (x, z) of the exit cell, if an exit room exists
    pub exit_cell: Option<[usize; 2]>,
}

impl LevelMap {
    /// World-space point at the middle of a dungeon tile, at height `y`.
    pub fn tile_to_world(&self, tile: [usize; 2], y: f32) -> Point3<f32> {
        let axis = |tile: usize, scale: usize| {
            (tile * scale) as f32 * VOXEL_SCALE + (scale - 1) as f32 * HALF_VOXEL
        };
        Point3::new(
            axis(tile[0], self.tile_scale[0]),
            y,
            axis(tile[1], self.tile_scale[1]),
        )
    }

    /// Whether a grid column is the exit cell.
    pub fn is_exit(&self, x: i32, z: i32) -> bool {
        self.exit_cell
            .is_some_and(|[ex, ez]| ex as i32 == x && ez as i32 == z)
    }
}

/// The room farthest from the initial room, or `None` if there is no other room.
pub fn farthest_room(dungeon: &dyn DungeonGraph) -> Option<usize> {
    let rooms = dungeon.rooms();
    let initial = rooms.get(dungeon.initial_room())?.center_point();
    rooms
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != dungeon.initial_room())
        .map(|(index, room)| (index, room.center_point().distance2(initial)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

/// Fills the grid from the dungeon graph and marks the exit cell.
///
/// The grid is cleared first. Geometry is not generated here.
///
/// # Errors
/// [`LevelError::DungeonTooLarge`] if a dungeon tile would cover less than one
/// grid cell, [`LevelError::NoRooms`] if the dungeon is empty and
/// [`LevelError::InitialRoomOutOfRange`] if the starting room does not exist.
pub fn populate_grid(
    grid: &mut VoxelGrid,
    dungeon: &dyn DungeonGraph,
) -> Result<LevelMap, LevelError> {
    let [dungeon_width, dungeon_depth] = dungeon.size();
    let too_large = || LevelError::DungeonTooLarge {
        dungeon_width,
        dungeon_depth,
        grid_width: grid.width(),
        grid_depth: grid.depth(),
    };
    if dungeon_width == 0 || dungeon_depth == 0 {
        return Err(too_large());
    }
    let tile_scale = [grid.width() / dungeon_width, grid.depth() / dungeon_depth];
    if tile_scale[0] == 0 || tile_scale[1] == 0 {
        return Err(too_large());
    }
    let room_count = dungeon.rooms().len();
    if room_count == 0 {
        return Err(LevelError::NoRooms);
    }
    if dungeon.initial_room() >= room_count {
        return Err(LevelError::InitialRoomOutOfRange {
            initial_room: dungeon.initial_room(),
            room_count,
        });
    }

    grid.clear();
    for y in 0..grid.height() {
        for z in 0..grid.depth() {
            for x in 0..grid.width() {
                let tile = if y == 0 {
                    Some(TileKey::FLOOR)
                } else if WALL_LAYERS.contains(&y) {
                    dungeon
                        .is_wall(x / tile_scale[0], z / tile_scale[1])
                        .then_some(TileKey::WALL)
                } else {
                    Some(TileKey::CEILING)
                };
                grid.set(x, y, z, tile);
            }
        }
    }

    let exit_cell = farthest_room(dungeon).map(|room| {
        let [tx, tz] = dungeon.rooms()[room].center();
        [tx * tile_scale[0], tz * tile_scale[1]]
    });
    match exit_cell {
        Some([x, z]) => grid.set(x, 0, z, Some(TileKey::EXIT)),
        None => log::warn!("Dungeon has a single room, level has no exit"),
    }

    Ok(LevelMap {
        tile_scale,
        exit_cell,
    })
}

/// Picks a random open tile in a room other than the initial one.
///
/// Gives up after `tries` attempts and returns `None`.
pub fn find_free_tile(
    dungeon: &dyn DungeonGraph,
    rng: &mut fastrand::Rng,
    tries: usize,
    mut occupied: impl FnMut([usize; 2]) -> bool,
) -> Option<[usize; 2]> {
    let rooms = dungeon.rooms();
    let candidates: Vec<&Room> = rooms
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != dungeon.initial_room() || rooms.len() == 1)
        .map(|(_, room)| room)
        .collect();
    if candidates.is_empty() {
        return None;
    }

    for _ in 0..tries {
        let room = candidates[rng.usize(..candidates.len())];
        let tile = [
            room.position[0] + rng.usize(..room.size[0].max(1)),
            room.position[1] + rng.usize(..room.size[1].max(1)),
        ];
        if !dungeon.is_wall(tile[0], tile[1]) && !occupied(tile) {
            return Some(tile);
        }
    }
    log::debug!("No free tile after {} tries", tries);
    None
}
