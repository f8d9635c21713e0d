//! Terrain Grid
//!
//! Destructible voxel map plus the gravity-collapse rule.
//!
//! ## Layout
//!
//! ```text
//! cells: [ col(0,0) z0..height | col(1,0) z0..height | ... ]
//! tops:  [ top(0,0)            | top(1,0)            | ... ]
//! ```
//!
//! Every column owns a fixed `height`-sized slice of one flat arena. `top`
//! counts cells up to and including the highest non-sky cell, so every cell
//! at `z >= top` is sky. Writes keep that invariant; reads never look past it.

use serde::{Serialize, Deserialize};
use tracing::warn;

use crate::core::hash::StateHasher;
use crate::core::vec3::GridPos;

/// One voxel's material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Material {
    /// Empty
    #[default]
    Sky = 0,
    /// Water, never destroyed
    Sea = 1,
    /// Island ground, never destroyed
    Land = 2,
    /// Fresh stone
    Stone1 = 3,
    /// Stone hit once
    Stone2 = 4,
    /// Stone hit twice
    Stone3 = 5,
}

impl Material {
    /// Next destruction stage. Sky, sea and land are unaffected.
    pub fn degrade(self) -> Self {
        match self {
            Material::Stone1 => Material::Stone2,
            Material::Stone2 => Material::Stone3,
            Material::Stone3 => Material::Sky,
            other => other,
        }
    }

    /// One of the three stone stages.
    #[inline]
    pub fn is_stone(self) -> bool {
        matches!(self, Material::Stone1 | Material::Stone2 | Material::Stone3)
    }

    /// Blocks a falling piece.
    #[inline]
    pub fn is_solid(self) -> bool {
        self.is_stone() || self == Material::Land
    }

    /// Empty cell.
    #[inline]
    pub fn is_sky(self) -> bool {
        self == Material::Sky
    }
}

/// Destructible voxel terrain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerrainGrid {
    width: i32,
    depth: i32,
    height: i32,
    cells: Vec<Material>,
    tops: Vec<i32>,
}

impl TerrainGrid {
    /// All-sky grid of `width × depth` columns, each `height` cells tall.
    ///
    /// Non-positive dimensions are clamped to one.
    pub fn new(width: i32, depth: i32, height: i32) -> Self {
        let (width, depth, height) = (width.max(1), depth.max(1), height.max(1));
        let columns = (width * depth) as usize;
        Self {
            width,
            depth,
            height,
            cells: vec![Material::Sky; columns * height as usize],
            tops: vec![0; columns],
        }
    }

    /// Columns along x.
    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Columns along y.
    #[inline]
    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Maximum column height.
    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Column (x, y) lies on the board.
    #[inline]
    pub fn column_in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.depth
    }

    /// Cell lies inside the board volume.
    #[inline]
    pub fn contains(&self, pos: GridPos) -> bool {
        self.column_in_bounds(pos.x, pos.y) && pos.z >= 0 && pos.z < self.height
    }

    #[inline]
    fn column_index(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    #[inline]
    fn cell_index(&self, column: usize, z: i32) -> usize {
        column * self.height as usize + z as usize
    }

    /// Material at `pos`.
    ///
    /// Anything above the column top is sky. Coordinates off the board are
    /// logged and read as sky.
    pub fn get(&self, pos: GridPos) -> Material {
        if !self.column_in_bounds(pos.x, pos.y) || pos.z < 0 {
            warn!(x = pos.x, y = pos.y, z = pos.z, "terrain read outside map");
            return Material::Sky;
        }
        let column = self.column_index(pos.x, pos.y);
        if pos.z >= self.tops[column] {
            return Material::Sky;
        }
        self.cells[self.cell_index(column, pos.z)]
    }

    /// Write `material` at `pos`, growing or trimming the column top.
    ///
    /// Returns false (and logs) when `pos` is outside the board volume.
    pub fn set(&mut self, pos: GridPos, material: Material) -> bool {
        if !self.contains(pos) {
            warn!(x = pos.x, y = pos.y, z = pos.z, ?material, "terrain write outside map ignored");
            return false;
        }
        let column = self.column_index(pos.x, pos.y);
        let idx = self.cell_index(column, pos.z);
        self.cells[idx] = material;

        if material.is_sky() {
            self.trim_column(column);
        } else if pos.z >= self.tops[column] {
            self.tops[column] = pos.z + 1;
        }
        true
    }

    /// Push `material` on top of column (x, y). Used by map generation.
    pub fn push(&mut self, x: i32, y: i32, material: Material) -> bool {
        let top = self.top(x, y);
        self.set(GridPos::new(x, y, top), material)
    }

    /// Number of cells up to the highest non-sky cell. Zero off the board.
    pub fn top(&self, x: i32, y: i32) -> i32 {
        if !self.column_in_bounds(x, y) {
            return 0;
        }
        self.tops[self.column_index(x, y)]
    }

    /// Height of the highest non-sky cell, or -1 for an empty column.
    #[inline]
    pub fn ground_z(&self, x: i32, y: i32) -> i32 {
        self.top(x, y) - 1
    }

    /// Cells of column (x, y) up to its top.
    pub fn column(&self, x: i32, y: i32) -> &[Material] {
        if !self.column_in_bounds(x, y) {
            return &[];
        }
        let column = self.column_index(x, y);
        let start = self.cell_index(column, 0);
        &self.cells[start..start + self.tops[column] as usize]
    }

    fn trim_column(&mut self, column: usize) {
        let start = self.cell_index(column, 0);
        let mut top = self.tops[column];
        while top > 0 && self.cells[start + top as usize - 1].is_sky() {
            top -= 1;
        }
        self.tops[column] = top;
    }

    /// One gravity pass over every column.
    ///
    /// Scanning upward, a stone cell resting on sky drops into it. Because the
    /// vacated cell is visited next, a whole floating stack sinks one cell per
    /// pass. Returns true if anything moved.
    pub fn collapse_pass(&mut self) -> bool {
        let mut moved = false;
        for column in 0..self.tops.len() {
            let start = self.cell_index(column, 0);
            let top = self.tops[column] as usize;
            for z in 0..top.saturating_sub(1) {
                let below = start + z;
                if self.cells[below].is_sky() && self.cells[below + 1].is_stone() {
                    self.cells[below] = self.cells[below + 1];
                    self.cells[below + 1] = Material::Sky;
                    moved = true;
                }
            }
            self.trim_column(column);
        }
        moved
    }

    /// No stone cell anywhere rests directly on sky.
    pub fn is_settled(&self) -> bool {
        (0..self.tops.len()).all(|column| {
            let start = self.cell_index(column, 0);
            let top = self.tops[column] as usize;
            (0..top.saturating_sub(1)).all(|z| {
                !(self.cells[start + z].is_sky() && self.cells[start + z + 1].is_stone())
            })
        })
    }

    /// Count of cells holding `material`.
    pub fn count(&self, material: Material) -> usize {
        (0..self.tops.len())
            .map(|column| {
                let start = self.cell_index(column, 0);
                self.cells[start..start + self.tops[column] as usize]
                    .iter()
                    .filter(|m| **m == material)
                    .count()
            })
            .sum()
    }

    /// Every column's cells, row-major by (y, x), for the renderer.
    pub fn columns(&self) -> Vec<Vec<Material>> {
        let mut out = Vec::with_capacity(self.tops.len());
        for y in 0..self.depth {
            for x in 0..self.width {
                out.push(self.column(x, y).to_vec());
            }
        }
        out
    }

    /// Feed the terrain into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_i32(self.width);
        hasher.update_i32(self.depth);
        hasher.update_i32(self.height);
        for column in 0..self.tops.len() {
            let start = self.cell_index(column, 0);
            let top = self.tops[column];
            hasher.update_i32(top);
            for m in &self.cells[start..start + top as usize] {
                hasher.update_u8(*m as u8);
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
