//! # Voxel Grid
//!
//! Dense storage of the level's tiles plus the mesh built from them.
//!
//! ## Memory Layout
//! - `cells`: one `TileKeySize` per cell, `0` for empty
//! - `solid`: a bit vector mirroring `cells != 0`, used by every solidity test
//! - `face_offsets`: for each cell and side, the offset of that face's first
//!   vertex in the mesh, or `None` when the face was culled
//!
//! Cells are stored in row-major order: x, then z, then y.
//!
//! ## World Space
//! Each cell is a cube of edge [`VOXEL_SCALE`] centred on `cell * VOXEL_SCALE`.
//! Geometry is rebuilt in one pass on level load; faces are never added or
//! removed incrementally afterwards.

use bitvec::prelude::BitVec;
use cgmath::{Point3, Vector3};

use super::tile::{tile_side::TileSide, TileKey, TileKeySize};
use crate::engine_state::rendering::meshing::{mesh::VERTICES_PER_FACE, Face, Mesh};

/// Edge length of one voxel in world units.
pub const VOXEL_SCALE: f32 = 2.0;

/// Half the edge length of one voxel.
pub const HALF_VOXEL: f32 = VOXEL_SCALE / 2.0;

/// The level's voxel grid and its generated geometry.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    width: usize,
    height: usize,
    depth: usize,
    cells: Vec<TileKeySize>,
    solid: BitVec,
    mesh: Mesh,
    face_offsets: Vec<[Option<u32>; 6]>,
}

impl VoxelGrid {
    /// Creates an empty grid of `width × height × depth` cells.
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        let size = width * height * depth;
        VoxelGrid {
            width,
            height,
            depth,
            cells: vec![0; size],
            solid: BitVec::repeat(false, size),
            mesh: Mesh::new(),
            face_offsets: vec![[None; 6]; size],
        }
    }

    /// Cells along x.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Cells along y.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Cells along z.
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + z * self.width + y * self.width * self.depth
    }

    /// Whether the coordinate names a cell inside the grid.
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && (x as usize) < self.width
            && (y as usize) < self.height
            && (z as usize) < self.depth
    }

    /// Writes a tile into a cell, `None` to empty it.
    ///
    /// The caller must stay within the grid extents; debug builds assert it.
    /// Geometry is not updated until the next [`VoxelGrid::generate_geometry`].
    pub fn set(&mut self, x: usize, y: usize, z: usize, tile: Option<TileKey>) {
        debug_assert!(
            x < self.width && y < self.height && z < self.depth,
            "cell ({}, {}, {}) outside {}x{}x{} grid",
            x,
            y,
            z,
            self.width,
            self.height,
            self.depth
        );
        let index = self.index(x, y, z);
        self.cells[index] = tile.map_or(0, TileKey::stored);
        self.solid.set(index, tile.is_some());
    }

    /// Reads a cell, `None` for empty cells and coordinates outside the grid.
    pub fn get(&self, x: i32, y: i32, z: i32) -> Option<TileKey> {
        if !self.contains(x, y, z) {
            return None;
        }
        TileKey::from_stored(self.cells[self.index(x as usize, y as usize, z as usize)])
    }

    /// Empties every cell and drops the geometry.
    pub fn clear(&mut self) {
        self.cells.fill(0);
        self.solid.fill(false);
        self.mesh.clear();
        self.face_offsets.fill([None; 6]);
    }

    /// Solidity test used by meshing, collision and line of sight.
    ///
    /// Anything outside the horizontal extents is solid, as is anything below
    /// the grid. Anything at or above the grid's height is open.
    pub fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
        if x < 0 || z < 0 || x as usize >= self.width || z as usize >= self.depth {
            return true;
        }
        if y < 0 {
            return true;
        }
        if y as usize >= self.height {
            return false;
        }
        self.solid[self.index(x as usize, y as usize, z as usize)]
    }

    /// Solidity of the cell containing a world-space point.
    pub fn is_solid_at(&self, point: Point3<f32>) -> bool {
        let (x, y, z) = world_to_cell(point);
        self.is_solid(x, y, z)
    }

    /// Rebuilds the mesh from the current cells.
    ///
    /// For every occupied cell, a face is emitted toward each non-solid
    /// neighbour. Cells whose six neighbours are all solid emit nothing.
    /// New vertices start unlit.
    pub fn generate_geometry(&mut self) {
        self.mesh.clear();
        self.face_offsets.fill([None; 6]);

        for y in 0..self.height {
            for z in 0..self.depth {
                for x in 0..self.width {
                    let index = self.index(x, y, z);
                    let Some(tile) = TileKey::from_stored(self.cells[index]) else {
                        continue;
                    };
                    let definition = tile.definition();
                    let center = cell_center(x as i32, y as i32, z as i32);

                    for side in TileSide::all() {
                        let (dx, dy, dz) = side.neighbor_offset();
                        if self.is_solid(x as i32 + dx, y as i32 + dy, z as i32 + dz) {
                            continue;
                        }
                        let frame = definition.frame(side.face_group());
                        let face = Face::new(center, HALF_VOXEL, side, frame);
                        self.face_offsets[index][side as usize] = Some(self.mesh.push_face(&face));
                    }
                }
            }
        }

        log::debug!(
            "Generated {} faces for {}x{}x{} grid",
            self.mesh.face_count(),
            self.width,
            self.height,
            self.depth
        );
    }

    /// Overwrites the light color of every emitted vertex of a cell.
    ///
    /// `light` receives each vertex's world position and face normal.
    /// Culled faces have no vertices and are skipped.
    pub fn light_box_set<F>(&mut self, x: usize, y: usize, z: usize, light: F)
    where
        F: FnMut(Point3<f32>, Vector3<f32>) -> [f32; 3],
    {
        self.light_box(x, y, z, light, Mesh::set_color);
    }

    /// Adds to the light color of every emitted vertex of a cell.
    ///
    /// Same contract as [`VoxelGrid::light_box_set`], accumulating instead.
    pub fn light_box_add<F>(&mut self, x: usize, y: usize, z: usize, light: F)
    where
        F: FnMut(Point3<f32>, Vector3<f32>) -> [f32; 3],
    {
        self.light_box(x, y, z, light, Mesh::add_color);
    }

    fn light_box<F>(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        mut light: F,
        mut write: impl FnMut(&mut Mesh, u32, [f32; 3]),
    ) where
        F: FnMut(Point3<f32>, Vector3<f32>) -> [f32; 3],
    {
        let offsets = self.face_offsets[self.index(x, y, z)];
        for side in TileSide::all() {
            let Some(offset) = offsets[side as usize] else {
                continue;
            };
            let normal = side.normal();
            for slot in 0..VERTICES_PER_FACE {
                let index = offset + slot;
                let position = self.mesh.vertices[index as usize].point();
                let color = light(position, normal);
                write(&mut self.mesh, index, color);
            }
        }
    }

    /// Whether a cell emitted at least one face in the last build.
    pub fn has_faces(&self, x: usize, y: usize, z: usize) -> bool {
        self.face_offsets[self.index(x, y, z)]
            .iter()
            .any(Option::is_some)
    }

    /// Number of faces a cell emitted in the last build.
    pub fn face_count_at(&self, x: usize, y: usize, z: usize) -> usize {
        self.face_offsets[self.index(x, y, z)]
            .iter()
            .filter(|offset| offset.is_some())
            .count()
    }

    /// The generated level mesh.
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }
}

/// World-space centre of a cell.
pub fn cell_center(x: i32, y: i32, z: i32) -> Point3<f32> {
    Point3::new(x as f32, y as f32, z as f32) * VOXEL_SCALE
}

/// The cell containing a world-space point.
pub fn world_to_cell(point: Point3<f32>) -> (i32, i32, i32) {
    let cell = |v: f32| ((v + HALF_VOXEL) / VOXEL_SCALE).floor() as i32;
    (cell(point.x), cell(point.y), cell(point.z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::tile::tile_side::FACE_INDICES;

    fn filled(width: usize, height: usize, depth: usize) -> VoxelGrid {
        let mut grid = VoxelGrid::new(width, height, depth);
        for y in 0..height {
            for z in 0..depth {
                for x in 0..width {
                    grid.set(x, y, z, Some(TileKey::CEILING));
                }
            }
        }
        grid
    }

    #[test]
    fn solidity_is_asymmetric_at_the_bounds() {
        let grid = VoxelGrid::new(2, 2, 2);
        assert!(grid.is_solid(-1, 0, 0));
        assert!(grid.is_solid(0, 0, 2));
        assert!(grid.is_solid(0, -1, 0));
        assert!(!grid.is_solid(0, 2, 0));
        assert!(!grid.is_solid(0, 0, 0));
    }

    #[test]
    fn enclosed_cells_emit_no_faces() {
        let mut grid = filled(3, 3, 3);
        grid.generate_geometry();
        assert!(!grid.has_faces(1, 1, 1));
        assert!(!grid.has_faces(1, 0, 1));
        // only the open top of the upper layer is visible
        assert_eq!(grid.mesh().face_count(), 9);
        assert_eq!(grid.face_count_at(1, 2, 1), 1);
    }

    #[test]
    fn face_count_matches_open_neighbours() {
        let mut grid = VoxelGrid::new(3, 3, 3);
        grid.set(1, 1, 1, Some(TileKey::WALL));
        grid.set(1, 0, 1, Some(TileKey::FLOOR));
        grid.generate_geometry();

        // the wall sits on the floor cell, so its bottom is culled
        assert_eq!(grid.face_count_at(1, 1, 1), 5);
        // the floor cell is below the grid's solid bottom and under the wall
        assert_eq!(grid.face_count_at(1, 0, 1), 4);

        let mesh = grid.mesh();
        assert_eq!(mesh.vertices.len(), 9 * 4);
        assert_eq!(mesh.indices.len(), 9 * 6);
        for quad in mesh.indices.chunks(6) {
            let base = quad[0];
            let relative: Vec<u32> = quad.iter().map(|i| i - base).collect();
            assert_eq!(relative, FACE_INDICES);
        }
    }

    #[test]
    fn world_boundary_culls_faces() {
        let mut grid = filled(1, 1, 1);
        grid.generate_geometry();
        assert_eq!(grid.face_count_at(0, 0, 0), 1);
        assert!(grid.mesh().vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn vertices_sit_on_the_scaled_cell() {
        let mut grid = VoxelGrid::new(3, 3, 3);
        grid.set(1, 1, 1, Some(TileKey::WALL));
        grid.generate_geometry();
        for vertex in &grid.mesh().vertices {
            for axis in vertex.position {
                assert!(axis == 1.0 || axis == 3.0, "vertex off cell: {:?}", vertex.position);
            }
        }
    }

    #[test]
    fn world_points_map_back_to_cells() {
        assert_eq!(world_to_cell(Point3::new(0.0, 0.0, 0.0)), (0, 0, 0));
        assert_eq!(world_to_cell(Point3::new(0.99, 1.01, -1.01)), (0, 1, -1));
        assert_eq!(world_to_cell(cell_center(4, 2, 7)), (4, 2, 7));
    }

    #[test]
    fn light_box_skips_culled_faces() {
        let mut grid = filled(1, 1, 1);
        grid.generate_geometry();
        let mut calls = 0;
        grid.light_box_set(0, 0, 0, |_, normal| {
            calls += 1;
            assert_eq!(normal, Vector3::unit_y());
            [0.1, 0.1, 0.1]
        });
        assert_eq!(calls, 4);
    }

    #[test]
    fn light_box_add_is_linear_and_clamps_per_evaluation() {
        let light = Point3::new(2.0, 6.0, 2.0);
        let falloff = |intensity: f32| {
            move |pos: Point3<f32>, _: Vector3<f32>| {
                let d2 = (pos.x - light.x).powi(2)
                    + (pos.y - light.y).powi(2)
                    + (pos.z - light.z).powi(2);
                let b = (intensity / d2).clamp(0.0, 2.0);
                [b, b, b]
            }
        };

        for intensity in [3.0, 500.0] {
            let mut twice = VoxelGrid::new(3, 3, 3);
            twice.set(1, 1, 1, Some(TileKey::WALL));
            twice.generate_geometry();
            let mut doubled = twice.clone();

            twice.light_box_add(1, 1, 1, falloff(intensity));
            twice.light_box_add(1, 1, 1, falloff(intensity));
            doubled.light_box_add(1, 1, 1, |pos, normal| {
                falloff(intensity)(pos, normal).map(|c| c * 2.0)
            });

            for (a, b) in twice.mesh().vertices.iter().zip(&doubled.mesh().vertices) {
                for (x, y) in a.color.iter().zip(b.color) {
                    assert!((x - y).abs() < 1e-6);
                }
            }
        }

        // a saturating light reaches 4 after two passes, not 2
        let mut grid = VoxelGrid::new(3, 3, 3);
        grid.set(1, 1, 1, Some(TileKey::WALL));
        grid.generate_geometry();
        grid.light_box_add(1, 1, 1, falloff(1.0e6));
        grid.light_box_add(1, 1, 1, falloff(1.0e6));
        assert!(grid.mesh().vertices.iter().all(|v| v.color[0] == 4.0));
    }
}
