//! Piece Simulator
//!
//! A falling four-cell piece per player during Build. Each fall interval the
//! piece either drops one cell, lands (turning into stone), or sinks.

use serde::{Serialize, Deserialize};

use crate::core::clock::Millis;
use crate::core::rng::DeterministicRng;
use crate::core::vec3::GridPos;
use crate::game::config::{Dimensionality, GameConfig};
use crate::game::map;
use crate::game::shapes::{self, ShapeKind, CELLS_PER_PIECE, ROTATION_COUNT};
use crate::game::state::Player;
use crate::game::terrain::{Material, TerrainGrid};

/// Cells of one placed piece.
pub type PieceCells = [GridPos; CELLS_PER_PIECE];

/// A player's falling piece.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    /// Owner
    pub player: Player,
    /// Pivot cell
    pub anchor: GridPos,
    /// Rotation index 0..4
    pub rotation: u8,
    /// Shape
    pub shape: ShapeKind,
    /// Current fall interval
    pub fall_ms: Millis,
    /// Time of the last fall step (or spawn)
    pub last_updated: Millis,
}

/// What a fall step did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PieceOutcome {
    /// Fall interval not yet elapsed
    Waiting,
    /// Dropped one cell
    Fell,
    /// Came to rest on something solid; its cells are now stone
    Landed,
    /// Went fully under water or reached the sea bed
    Sank,
}

impl Piece {
    /// New piece above the player's island with a random shape and rotation.
    pub fn spawn(config: &GameConfig, player: Player, rng: &mut DeterministicRng, now: Millis) -> Self {
        let rotation = rng.next_int(ROTATION_COUNT as u32) as u8;
        let shape = ShapeKind::ALL[rng.next_index(ShapeKind::ALL.len())];
        Self {
            player,
            anchor: map::piece_spawn(config, player),
            rotation,
            shape,
            fall_ms: config.piece_fall_slow_ms,
            last_updated: now,
        }
    }

    /// Grid cells of the piece as it stands.
    pub fn cells(&self, dimensionality: Dimensionality) -> PieceCells {
        self.cells_at(dimensionality, self.anchor, self.rotation)
    }

    /// Grid cells the piece would occupy at another anchor and rotation.
    pub fn cells_at(&self, dimensionality: Dimensionality, anchor: GridPos, rotation: u8) -> PieceCells {
        shapes::cells(self.shape, rotation).map(|offset| map::project(dimensionality, anchor, offset))
    }

    /// Shift horizontally if the new cells are free. Returns whether it moved.
    pub fn try_move(&mut self, terrain: &TerrainGrid, dimensionality: Dimensionality, dx: i32, dy: i32) -> bool {
        let anchor = self.anchor.offset(dx, dy, 0);
        if !fits(terrain, &self.cells_at(dimensionality, anchor, self.rotation)) {
            return false;
        }
        self.anchor = anchor;
        true
    }

    /// Rotate a quarter turn if the new cells are free. Returns whether it turned.
    pub fn try_rotate(&mut self, terrain: &TerrainGrid, dimensionality: Dimensionality) -> bool {
        let rotation = (self.rotation + 1) % ROTATION_COUNT;
        if !fits(terrain, &self.cells_at(dimensionality, self.anchor, rotation)) {
            return false;
        }
        self.rotation = rotation;
        true
    }

    /// Switch to the fast fall interval.
    pub fn fast_drop(&mut self, config: &GameConfig) {
        self.fall_ms = config.piece_fall_fast_ms;
    }

    /// Run one fall step at `now`.
    ///
    /// The interval must be strictly exceeded. On landing the piece's current
    /// cells become `Stone1`; the caller replaces a landed or sunk piece.
    pub fn step(&mut self, terrain: &mut TerrainGrid, dimensionality: Dimensionality, now: Millis) -> PieceOutcome {
        if now <= self.last_updated.saturating_add(self.fall_ms) {
            return PieceOutcome::Waiting;
        }

        let current = self.cells(dimensionality);
        let lowered = self.cells_at(dimensionality, self.anchor.below(), self.rotation);

        if hits_solid(terrain, &lowered) {
            for cell in current {
                terrain.set(cell, Material::Stone1);
            }
            return PieceOutcome::Landed;
        }

        if lowered.iter().any(|c| c.z < 0) || fully_submerged(terrain, &lowered) {
            return PieceOutcome::Sank;
        }

        self.anchor = self.anchor.below();
        self.last_updated = now;
        PieceOutcome::Fell
    }
}

/// Any cell overlaps land or stone.
pub fn hits_solid(terrain: &TerrainGrid, cells: &[GridPos]) -> bool {
    cells
        .iter()
        .any(|c| terrain.contains(*c) && terrain.get(*c).is_solid())
}

/// Every cell overlaps sea.
pub fn fully_submerged(terrain: &TerrainGrid, cells: &[GridPos]) -> bool {
    cells
        .iter()
        .all(|c| terrain.contains(*c) && terrain.get(*c) == Material::Sea)
}

/// All cells are on the board and none is solid.
pub fn fits(terrain: &TerrainGrid, cells: &[GridPos]) -> bool {
    cells.iter().all(|c| terrain.contains(*c)) && !hits_solid(terrain, cells)
}

// =============================================================================
// TESTS
// =============================================================================
