//! Game Logic Module
//!
//! All simulation code. Deterministic given a seed and a timed command stream.
//!
//! ## Module Structure
//!
//! - `config`: Board size, timings, presets and validation
//! - `terrain`: Voxel columns, materials, collapse
//! - `shapes`: Static piece offset table
//! - `map`: Island layout and spawn sites
//! - `piece`: Falling pieces
//! - `ballistics`: Bomb arcs, voxel paths, hit resolution
//! - `cannon`: Barrel tracking, reload, aim
//! - `effects`: Splash and explosion markers
//! - `phase`: Turn-cycle state machine
//! - `state`: Simulation context and renderer snapshot
//! - `input`: Commands, recording, replay
//! - `tick`: Per-frame driver
//! - `events`: Informational events

pub mod config;
pub mod terrain;
pub mod shapes;
pub mod map;
pub mod piece;
pub mod ballistics;
pub mod cannon;
pub mod effects;
pub mod phase;
pub mod state;
pub mod input;
pub mod tick;
pub mod events;

// Re-export key types
pub use config::{ConfigError, Dimensionality, GameConfig};
pub use terrain::{Material, TerrainGrid};
pub use state::{Player, SimState, Snapshot};
pub use phase::{Phase, PhaseKind};
pub use input::{apply_command, Command, Recording};
pub use tick::{tick, Simulation, TickResult, TrajectoryPreview};
pub use events::{SimEvent, SimEventData};
