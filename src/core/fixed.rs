//! Q16.16 Fixed-Point Arithmetic
//!
//! Deterministic fixed-point math for the ballistic solver.
//! All operations use integer arithmetic only - no floats in simulation logic.
//!
//! ## Format: Q16.16
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Bit Layout: Q16.16 (32-bit signed integer)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  [S][IIIIIIIIIIIIIIII][FFFFFFFFFFFFFFFF]                    │
//! │   │  └──── 16 bits ────┘└──── 16 bits ────┘                 │
//! │   └─ Sign bit                                               │
//! │                                                             │
//! │  Range: -32768.0 to +32767.99998 (approx)                   │
//! │  Precision: 1/65536 ≈ 0.000015 units                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Grid coordinates stay well below 1000 cells, so the integer range is
//! ample as long as products are formed in i64.

/// Q16.16 fixed-point number stored as i32.
/// 16 bits integer, 16 bits fractional.
pub type Fixed = i32;

/// Number of fractional bits (16)
pub const FIXED_SCALE: i32 = 16;

/// 1.0 in fixed-point (65536)
pub const FIXED_ONE: Fixed = 1 << FIXED_SCALE; // 65536

/// 0.5 in fixed-point (32768)
pub const FIXED_HALF: Fixed = FIXED_ONE >> 1; // 32768

// =============================================================================
// BALLISTIC CONSTANTS (All as integer literals - NO float conversion!)
// =============================================================================

/// Numerator of the arc curvature: `a = CURVATURE_NUMERATOR / width²`.
///
/// For the standard 50-cell board this is 125 / 2500 = 0.05 per step².
pub const CURVATURE_NUMERATOR: i64 = 125;

/// Upper bound on the flight time used for interpolation, in steps.
///
/// Keeps `a·t²` inside the Q16.16 range when the scheduler stalls.
pub const MAX_FLIGHT_STEPS: Fixed = 400 * FIXED_ONE;

// =============================================================================
// CORE OPERATIONS (All deterministic, wrapping semantics)
// =============================================================================

/// Convert a compile-time float to fixed-point.
///
/// # Warning
/// Only use at compile-time or initialization. NEVER in tick loop.
///
/// # Example
/// ```
/// use castle_bombard::core::fixed::{to_fixed, FIXED_ONE};
/// const MY_VALUE: i32 = to_fixed(2.5);
/// assert_eq!(MY_VALUE, FIXED_ONE * 2 + FIXED_ONE / 2);
/// ```
#[inline]
pub const fn to_fixed(f: f64) -> Fixed {
    (f * (FIXED_ONE as f64)) as Fixed
}

/// Convert an integer to fixed-point.
#[inline]
pub const fn from_int(i: i32) -> Fixed {
    i << FIXED_SCALE
}

/// Convert fixed-point to float for display/rendering.
///
/// # Warning
/// Only use for visual output. NEVER use result in simulation logic.
#[inline]
pub fn to_float(f: Fixed) -> f32 {
    f as f32 / FIXED_ONE as f32
}

/// Round to the nearest integer, halves rounding up (toward +∞).
///
/// `-0.5` rounds to `0` and `2.5` rounds to `3`.
#[inline]
pub fn fixed_round(f: Fixed) -> i32 {
    ((f as i64 + FIXED_HALF as i64) >> FIXED_SCALE) as i32
}

/// Divide two fixed-point numbers.
///
/// Pre-shifts numerator to maintain precision.
/// Returns 0 on divide-by-zero.
#[inline]
pub fn fixed_div(a: Fixed, b: Fixed) -> Fixed {
    if b == 0 {
        return 0; // Deterministic: don't panic
    }
    let wide = (a as i64) << FIXED_SCALE;
    (wide / b as i64) as Fixed
}

/// Integer square root (floor) by Newton iteration.
pub fn isqrt_u64(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = x / 2 + (x & 1);
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

/// Elapsed milliseconds expressed as a fractional step count.
///
/// Clamped to `[0, MAX_FLIGHT_STEPS]`. A zero step length yields zero.
#[inline]
pub fn steps_from_millis(elapsed_ms: u64, step_ms: u64) -> Fixed {
    if step_ms == 0 {
        return 0;
    }
    let wide = ((elapsed_ms as i128) << FIXED_SCALE) / step_ms as i128;
    wide.min(MAX_FLIGHT_STEPS as i128) as Fixed
}

// =============================================================================
// TESTS
// =============================================================================
