//! Piece shape table.
//!
//! Cell offsets for every (shape, rotation) pair, written out explicitly so
//! rotation is a table lookup rather than runtime math. Offsets are `(u, v)`
//! in the shape's own plane; `config::Dimensionality` decides how they land in
//! the grid.

use serde::{Serialize, Deserialize};

/// Number of distinct shapes.
pub const SHAPE_COUNT: usize = 3;

/// Rotations per shape.
pub const ROTATION_COUNT: u8 = 4;

/// Cells per piece.
pub const CELLS_PER_PIECE: usize = 4;

/// One cell offset in the shape plane.
pub type Offset = (i32, i32);

/// Cells of one oriented shape.
pub type ShapeCells = [Offset; CELLS_PER_PIECE];

/// The three block shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ShapeKind {
    /// 2×2 square
    Square = 0,
    /// 1×4 bar
    Bar = 1,
    /// T
    Tee = 2,
}

impl ShapeKind {
    /// All shapes, in table order.
    pub const ALL: [ShapeKind; SHAPE_COUNT] = [ShapeKind::Square, ShapeKind::Bar, ShapeKind::Tee];
}

static SHAPE_TABLE: [[ShapeCells; ROTATION_COUNT as usize]; SHAPE_COUNT] = [
    // Square: the 2×2 block pivots around its corner
    [
        [(-1, -1), (0, -1), (-1, 0), (0, 0)],
        [(-1, 0), (0, 0), (-1, 1), (0, 1)],
        [(0, 0), (1, 0), (0, 1), (1, 1)],
        [(0, -1), (1, -1), (0, 0), (1, 0)],
    ],
    // Bar
    [
        [(-2, 0), (-1, 0), (0, 0), (1, 0)],
        [(0, -1), (0, 0), (0, 1), (0, 2)],
        [(-1, 0), (0, 0), (1, 0), (2, 0)],
        [(0, -2), (0, -1), (0, 0), (0, 1)],
    ],
    // Tee
    [
        [(0, -1), (-1, 0), (0, 0), (1, 0)],
        [(0, -1), (-1, 0), (0, 0), (0, 1)],
        [(-1, 0), (0, 0), (1, 0), (0, 1)],
        [(0, -1), (0, 0), (1, 0), (0, 1)],
    ],
];

/// Offsets for `shape` at `rotation` (taken modulo four).
#[inline]
pub fn cells(shape: ShapeKind, rotation: u8) -> &'static ShapeCells {
    &SHAPE_TABLE[shape as usize][(rotation % ROTATION_COUNT) as usize]
}
