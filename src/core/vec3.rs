//! Fixed-Point 3D Vector and Grid Coordinates
//!
//! `FixedVec3` is the continuous position of a bomb in flight, `GridPos`
//! addresses one voxel. Height (`z`) grows upward from the sea floor.

use std::fmt;
use std::ops::{Add, Sub};
use serde::{Serialize, Deserialize};

use super::fixed::{Fixed, FIXED_SCALE, fixed_round, isqrt_u64, to_float};

/// 3D vector with fixed-point components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FixedVec3 {
    /// X component (Q16.16 fixed-point)
    pub x: Fixed,
    /// Y component (Q16.16 fixed-point)
    pub y: Fixed,
    /// Z component, height (Q16.16 fixed-point)
    pub z: Fixed,
}

impl FixedVec3 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };

    /// Create a new vector from fixed-point components.
    #[inline]
    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Self { x, y, z }
    }

    /// Create a vector from integer components.
    #[inline]
    pub const fn from_ints(x: i32, y: i32, z: i32) -> Self {
        Self {
            x: x << FIXED_SCALE,
            y: y << FIXED_SCALE,
            z: z << FIXED_SCALE,
        }
    }

    /// Centre of a grid cell.
    #[inline]
    pub const fn from_grid(pos: GridPos) -> Self {
        Self::from_ints(pos.x, pos.y, pos.z)
    }

    /// Round every component to the nearest cell.
    #[inline]
    pub fn round(self) -> GridPos {
        GridPos::new(fixed_round(self.x), fixed_round(self.y), fixed_round(self.z))
    }

    /// Length of the horizontal (x, y) component.
    #[inline]
    pub fn horizontal_length(self) -> Fixed {
        // sqrt of the raw squares is already in Q16.16
        let x = self.x.unsigned_abs() as u64;
        let y = self.y.unsigned_abs() as u64;
        isqrt_u64(x * x + y * y).min(i32::MAX as u64) as Fixed
    }

    /// Convert to floats for rendering.
    #[inline]
    pub fn to_floats(self) -> (f32, f32, f32) {
        (to_float(self.x), to_float(self.y), to_float(self.z))
    }
}

impl Add for FixedVec3 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.x.wrapping_add(rhs.x),
            self.y.wrapping_add(rhs.y),
            self.z.wrapping_add(rhs.z),
        )
    }
}

impl Sub for FixedVec3 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.x.wrapping_sub(rhs.x),
            self.y.wrapping_sub(rhs.y),
            self.z.wrapping_sub(rhs.z),
        )
    }
}

impl fmt::Debug for FixedVec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, z) = self.to_floats();
        write!(f, "Vec3({:.3}, {:.3}, {:.3})", x, y, z)
    }
}

// =============================================================================
// GRID POSITION
// =============================================================================

/// Integer voxel coordinate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug, Serialize, Deserialize)]
pub struct GridPos {
    /// Column x
    pub x: i32,
    /// Column y (always 0 on a planar board)
    pub y: i32,
    /// Height
    pub z: i32,
}

impl GridPos {
    /// Create a grid position.
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Translate by a delta.
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The cell directly beneath.
    #[inline]
    pub const fn below(self) -> Self {
        self.offset(0, 0, -1)
    }

    /// The cell directly above.
    #[inline]
    pub const fn above(self) -> Self {
        self.offset(0, 0, 1)
    }

    /// Same column (x, y) regardless of height.
    #[inline]
    pub fn same_column(self, other: Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{to_fixed, FIXED_ONE};

    #[test]
    fn test_round_to_grid() {
        let v = FixedVec3::new(to_fixed(2.5), to_fixed(-0.4), to_fixed(9.49));
        assert_eq!(v.round(), GridPos::new(3, 0, 9));
        assert_eq!(FixedVec3::from_grid(GridPos::new(4, 5, 6)).round(), GridPos::new(4, 5, 6));
    }

    #[test]
    fn test_horizontal_length() {
        let v = FixedVec3::from_ints(3, 4, 100);
        assert_eq!(v.horizontal_length(), 5 * FIXED_ONE);

        let far = FixedVec3::from_ints(200, 0, 0);
        assert_eq!(far.horizontal_length(), 200 * FIXED_ONE);
    }

    #[test]
    fn test_add_sub() {
        let a = FixedVec3::from_ints(1, 2, 3);
        let b = FixedVec3::from_ints(4, 5, 6);
        assert_eq!(a + b, FixedVec3::from_ints(5, 7, 9));
        assert_eq!(b - a, FixedVec3::from_ints(3, 3, 3));
    }

    #[test]
    fn test_grid_neighbours() {
        let p = GridPos::new(3, 1, 5);
        assert_eq!(p.below(), GridPos::new(3, 1, 4));
        assert_eq!(p.above(), GridPos::new(3, 1, 6));
        assert!(p.same_column(GridPos::new(3, 1, 0)));
        assert!(!p.same_column(GridPos::new(3, 2, 5)));
    }
}
