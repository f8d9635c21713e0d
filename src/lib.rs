//! # Castle Bombard
//!
//! Deterministic simulation core for a two-player build-and-bombard game.
//! Players stack falling pieces into a castle, then shell each other's
//! castle across a strait. Rendering and input wiring live elsewhere; this
//! crate is ticked once per frame and read back through a snapshot.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CASTLE BOMBARD                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── fixed.rs    - Q16.16 fixed-point arithmetic             │
//! │  ├── vec3.rs     - Fixed-point and grid positions            │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  ├── hash.rs     - State hashing for verification            │
//! │  └── clock.rs    - Monotonic and manual clocks               │
//! │                                                              │
//! │  game/           - Simulation                                │
//! │  ├── terrain.rs  - Voxel columns and collapse                │
//! │  ├── piece.rs    - Falling pieces                            │
//! │  ├── ballistics.rs - Bomb arcs and hit resolution            │
//! │  ├── cannon.rs   - Barrel tracking and aim                   │
//! │  ├── phase.rs    - Turn-cycle state machine                  │
//! │  ├── tick.rs     - Per-frame driver                          │
//! │  └── input.rs    - Commands, recording, replay               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! Simulation logic uses integers and fixed-point only; time is an explicit
//! millisecond argument and piece randomness comes from a seeded generator.
//! A config, a seed, and a timed stream of ticks and commands reproduce the
//! same state hash on any platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use core::fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use core::vec3::{FixedVec3, GridPos};
pub use core::rng::DeterministicRng;
pub use core::clock::{Clock, ManualClock, MonotonicClock, Millis};
pub use game::config::{ConfigError, Dimensionality, GameConfig};
pub use game::input::{Command, Recording};
pub use game::state::{Player, SimState, Snapshot};
pub use game::tick::Simulation;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
