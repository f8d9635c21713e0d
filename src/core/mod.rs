//! Core deterministic primitives.
//!
//! Everything here is integer-only and platform independent. The game
//! modules build on these so that a seed plus a command stream always
//! reproduces the same state hash.

pub mod fixed;
pub mod vec3;
pub mod rng;
pub mod hash;
pub mod clock;

// Re-export core types
pub use fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use vec3::{FixedVec3, GridPos};
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash, StateHasher};
pub use clock::{Clock, ManualClock, MonotonicClock, Millis};
