//! Player Commands and Recording
//!
//! Discrete commands from the outside world, applied synchronously between
//! ticks. A command the current phase does not accept is a silent no-op;
//! `apply_command` reports whether anything changed.
//!
//! ```text
//!   keyboard / network ──▶ Command ──▶ apply_command(state) ──▶ bool
//!                             │
//!                             └──▶ Recording ──▶ replay() ──▶ SimState
//! ```

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::clock::{Clock, ManualClock, Millis};
use crate::game::ballistics::Bomb;
use crate::game::config::{ConfigError, GameConfig};
use crate::game::events::{SimEvent, SimEventData};
use crate::game::state::{Player, SimState};
use crate::game::tick::Simulation;

// =============================================================================
// COMMANDS
// =============================================================================

/// A single player or session command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Shift the falling piece horizontally
    MovePiece {
        /// Whose piece
        player: Player,
        /// Step along x
        dx: i32,
        /// Step along y (spatial only)
        dy: i32,
    },
    /// Turn the falling piece a quarter turn
    RotatePiece {
        /// Whose piece
        player: Player,
    },
    /// Switch the falling piece to the fast interval
    FastDrop {
        /// Whose piece
        player: Player,
    },
    /// Move the cannon's aim point
    MoveAim {
        /// Whose cannon
        player: Player,
        /// Step along x
        dx: i32,
        /// Step along y; on a planar board, the screen row (negative is up)
        dy: i32,
        /// Explicit height change
        dz: i32,
    },
    /// Fire the cannon
    Fire {
        /// Whose cannon
        player: Player,
    },
    /// Stop or resume ticking
    TogglePause,
    /// Show or hide the trajectory preview
    ToggleDebug,
}

impl Command {
    /// Player the command acts for, if any.
    pub fn player(&self) -> Option<Player> {
        match *self {
            Command::MovePiece { player, .. }
            | Command::RotatePiece { player }
            | Command::FastDrop { player }
            | Command::MoveAim { player, .. }
            | Command::Fire { player } => Some(player),
            Command::TogglePause | Command::ToggleDebug => None,
        }
    }
}

/// Apply one command at `now`. Returns whether state changed.
///
/// Gameplay commands are ignored while paused and outside the phases that
/// accept them. Pause and debug toggles are always accepted.
pub fn apply_command(state: &mut SimState, config: &GameConfig, command: Command, now: Millis) -> bool {
    let phase = state.phase.kind;
    let dimensionality = config.dimensionality;

    let changed = match command {
        Command::TogglePause => {
            state.paused = !state.paused;
            debug!(paused = state.paused, "pause toggled");
            true
        }
        Command::ToggleDebug => {
            state.debug = !state.debug;
            true
        }
        _ if state.paused => false,

        Command::MovePiece { player, dx, dy } if phase.accepts_piece_commands() => {
            let SimState { pieces, terrain, .. } = state;
            pieces
                .iter_mut()
                .find(|p| p.player == player)
                .is_some_and(|piece| piece.try_move(terrain, dimensionality, dx, dy))
        }
        Command::RotatePiece { player } if phase.accepts_piece_commands() => {
            let SimState { pieces, terrain, .. } = state;
            pieces
                .iter_mut()
                .find(|p| p.player == player)
                .is_some_and(|piece| piece.try_rotate(terrain, dimensionality))
        }
        Command::FastDrop { player } if phase.accepts_piece_commands() => {
            match state.piece_mut(player) {
                Some(piece) if piece.fall_ms != config.piece_fall_fast_ms => {
                    piece.fast_drop(config);
                    true
                }
                _ => false,
            }
        }
        Command::MoveAim { player, dx, dy, dz } if phase.accepts_aim() => {
            let SimState { cannons, terrain, .. } = state;
            cannons
                .iter_mut()
                .find(|c| c.owner == player)
                .is_some_and(|cannon| cannon.move_aim(terrain, dimensionality, dx, dy, dz))
        }
        Command::Fire { player } if phase.accepts_fire() => fire(state, config, player, now),
        _ => false,
    };

    if changed {
        state.request_redraw();
    }
    changed
}

/// Fire a player's cannon if it is loaded.
fn fire(state: &mut SimState, config: &GameConfig, player: Player, now: Millis) -> bool {
    let Some(cannon) = state.cannon(player) else {
        return false;
    };
    if !cannon.ready(now) {
        return false;
    }

    let muzzle = cannon.muzzle();
    let target = cannon.aim;
    let Some(bomb) = Bomb::launch(player, muzzle, target, &state.terrain, config, now) else {
        return false;
    };

    state.bombs.push(bomb);
    if let Some(cannon) = state.cannon_mut(player) {
        cannon.record_shot(now);
    }
    state.push_event(SimEvent::new(now, SimEventData::BombFired { player, muzzle, target }));
    true
}

// =============================================================================
// RECORDING
// =============================================================================

/// What happened at one recorded instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordedStep {
    /// The scheduler ran a tick
    Tick,
    /// A command was applied
    Command(Command),
}

/// A timestamped recorded step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    /// Clock reading when the step ran
    pub at: Millis,
    /// The step
    pub step: RecordedStep,
}

/// Time-ordered stream of ticks and commands for one session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Configuration the session started with (includes the seed)
    pub config: GameConfig,
    /// Clock reading at session start
    pub started_at: Millis,
    /// Recorded steps, oldest first
    pub entries: Vec<RecordEntry>,
}

impl Recording {
    /// Empty recording for a session starting at `started_at`.
    pub fn new(config: GameConfig, started_at: Millis) -> Self {
        Self {
            config,
            started_at,
            entries: Vec::new(),
        }
    }

    /// RNG seed of the recorded session.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    /// Record a tick at `at`.
    pub fn record_tick(&mut self, at: Millis) {
        self.entries.push(RecordEntry { at, step: RecordedStep::Tick });
    }

    /// Record a command at `at`.
    pub fn record_command(&mut self, at: Millis, command: Command) {
        self.entries.push(RecordEntry { at, step: RecordedStep::Command(command) });
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Nothing recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rebuild the session from scratch and feed the stream back.
    pub fn replay(&self) -> Result<SimState, ConfigError> {
        let clock = ManualClock::new(self.started_at);
        let mut sim = Simulation::new(self.config.clone(), clock.clone())?;

        for entry in &self.entries {
            clock.set(entry.at);
            match entry.step {
                RecordedStep::Tick => {
                    sim.tick();
                }
                RecordedStep::Command(command) => {
                    sim.apply(command);
                }
            }
        }

        debug!(steps = self.entries.len(), at = clock.now_ms(), "replay finished");
        Ok(sim.into_state())
    }
}

// =============================================================================
// TESTS
// =============================================================================
