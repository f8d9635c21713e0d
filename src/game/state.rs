//! Simulation State
//!
//! One value owns everything the tick mutates: terrain, pieces, cannons,
//! bombs, effects and the phase. Components receive it (or parts of it) by
//! reference; nothing lives in globals.

use serde::{Serialize, Deserialize};

use crate::core::clock::Millis;
use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::DeterministicRng;
use crate::core::vec3::GridPos;
use crate::game::ballistics::Bomb;
use crate::game::cannon::Cannon;
use crate::game::config::{Dimensionality, GameConfig};
use crate::game::effects::Effect;
use crate::game::events::SimEvent;
use crate::game::map;
use crate::game::phase::{Phase, PhaseDurations, PhaseKind};
use crate::game::piece::Piece;
use crate::game::shapes::ShapeKind;
use crate::game::terrain::{Material, TerrainGrid};

// =============================================================================
// PLAYER
// =============================================================================

/// One of the two sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Player {
    /// West island
    One = 0,
    /// East island
    Two = 1,
}

impl Player {
    /// Both players in turn order.
    pub const ALL: [Player; 2] = [Player::One, Player::Two];

    /// The other side.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Player::One => "Player 1",
            Player::Two => "Player 2",
        }
    }
}

// =============================================================================
// FRAME RATE
// =============================================================================

/// Rolling frames-per-second estimate. Diagnostic only; never hashed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FpsMeter {
    fps: f32,
    last_frame: Option<Millis>,
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self { fps: 60.0, last_frame: None }
    }
}

impl FpsMeter {
    /// Fold one frame at `now` into the estimate (1/32 weight).
    pub fn record(&mut self, now: Millis) {
        if let Some(last) = self.last_frame {
            let dt = now.saturating_sub(last);
            if dt > 0 {
                self.fps = (self.fps * 31.0 + 1000.0 / dt as f32) / 32.0;
            }
        }
        self.last_frame = Some(now);
    }

    /// Current estimate.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

// =============================================================================
// SIMULATION STATE
// =============================================================================

/// Complete simulation context.
#[derive(Clone, Debug)]
pub struct SimState {
    /// Voxel terrain
    pub terrain: TerrainGrid,
    /// Falling pieces (Build only)
    pub pieces: Vec<Piece>,
    /// Cannons (from the end of the first Build on)
    pub cannons: Vec<Cannon>,
    /// Bombs in flight
    pub bombs: Vec<Bomb>,
    /// Visual markers
    pub effects: Vec<Effect>,
    /// Active phase
    pub phase: Phase,
    /// Ticks are ignored while paused
    pub paused: bool,
    /// Debug overlay (trajectory preview)
    pub debug: bool,
    /// Seed the RNG started from
    pub rng_seed: u64,
    /// Piece RNG
    pub rng: DeterministicRng,
    /// Number of ticks processed
    pub tick_count: u64,
    /// Time of the last processed tick
    pub now: Millis,
    /// Frame-rate estimate
    pub fps: FpsMeter,
    /// Whole-second phase timer shown at the last tick
    pub last_display_timer: Option<i64>,
    redraw: bool,
    pending_events: Vec<SimEvent>,
}

impl SimState {
    /// Fresh session at `now`: island terrain, Build phase, a piece per player.
    pub fn new(config: &GameConfig, now: Millis) -> Self {
        let mut state = Self {
            terrain: map::generate_terrain(config),
            pieces: Vec::new(),
            cannons: Vec::new(),
            bombs: Vec::new(),
            effects: Vec::new(),
            phase: Phase::new(PhaseKind::Build, now),
            paused: false,
            debug: false,
            rng_seed: config.seed,
            rng: DeterministicRng::new(config.seed),
            tick_count: 0,
            now,
            fps: FpsMeter::default(),
            last_display_timer: None,
            redraw: true,
            pending_events: Vec::new(),
        };
        state.spawn_pieces(config, now);
        state
    }

    /// Spawn one piece per player.
    pub fn spawn_pieces(&mut self, config: &GameConfig, now: Millis) {
        self.pieces = Player::ALL
            .iter()
            .map(|p| Piece::spawn(config, *p, &mut self.rng, now))
            .collect();
    }

    /// Place a fresh cannon per player.
    pub fn place_cannons(&mut self, config: &GameConfig, now: Millis) {
        self.cannons = Player::ALL
            .iter()
            .map(|p| Cannon::place(&self.terrain, config, *p, now))
            .collect();
    }

    /// A player's piece, if one is falling.
    pub fn piece_mut(&mut self, player: Player) -> Option<&mut Piece> {
        self.pieces.iter_mut().find(|p| p.player == player)
    }

    /// A player's cannon, if placed.
    pub fn cannon(&self, player: Player) -> Option<&Cannon> {
        self.cannons.iter().find(|c| c.owner == player)
    }

    /// A player's cannon, mutably.
    pub fn cannon_mut(&mut self, player: Player) -> Option<&mut Cannon> {
        self.cannons.iter_mut().find(|c| c.owner == player)
    }

    /// Mark visible state as changed.
    #[inline]
    pub fn request_redraw(&mut self) {
        self.redraw = true;
    }

    /// Visible state changed since the last call. Clears the flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    /// Peek at the redraw flag without clearing it.
    #[inline]
    pub fn redraw_requested(&self) -> bool {
        self.redraw
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a simulation event.
    pub fn push_event(&mut self, event: SimEvent) {
        self.pending_events.push(event);
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick_count, self.now, |hasher| {
            hasher.update_u64(self.rng_seed);
            let [s0, s1] = self.rng.state();
            hasher.update_u64(s0);
            hasher.update_u64(s1);

            hasher.update_u8(self.phase.kind as u8);
            hasher.update_u64(self.phase.started_at);
            hasher.update_bool(self.paused);
            hasher.update_bool(self.debug);

            self.terrain.hash_into(hasher);

            hasher.update_u32(self.pieces.len() as u32);
            for piece in &self.pieces {
                hasher.update_u8(piece.player as u8);
                hasher.update_grid(piece.anchor);
                hasher.update_u8(piece.rotation);
                hasher.update_u8(piece.shape as u8);
                hasher.update_u64(piece.fall_ms);
                hasher.update_u64(piece.last_updated);
            }

            hasher.update_u32(self.cannons.len() as u32);
            for cannon in &self.cannons {
                hasher.update_u8(cannon.owner as u8);
                hasher.update_grid(cannon.barrel);
                hasher.update_grid(cannon.aim);
                hasher.update_u64(cannon.last_shot as u64);
            }

            hasher.update_u32(self.bombs.len() as u32);
            for bomb in &self.bombs {
                hasher.update_u8(bomb.owner as u8);
                hasher.update_vec3(bomb.position);
                hasher.update_grid(bomb.target);
                hasher.update_u64(bomb.created_at);
                hasher.update_u32(bomb.trajectory.len() as u32);
            }

            hasher.update_u32(self.effects.len() as u32);
            for effect in &self.effects {
                hasher.update_u8(effect.kind as u8);
                hasher.update_grid(effect.pos);
                hasher.update_u64(effect.created_at);
            }
        })
    }

    /// Read-only view for the renderer.
    pub fn snapshot(&self, config: &GameConfig) -> Snapshot {
        let durations = PhaseDurations::from(config);
        Snapshot {
            dimensionality: config.dimensionality,
            width: self.terrain.width(),
            depth: self.terrain.depth(),
            height: self.terrain.height(),
            columns: self.terrain.columns(),
            pieces: self
                .pieces
                .iter()
                .filter(|_| self.phase.kind == PhaseKind::Build)
                .map(|p| PieceView {
                    player: p.player,
                    shape: p.shape,
                    rotation: p.rotation,
                    anchor: p.anchor,
                    cells: p.cells(config.dimensionality).to_vec(),
                })
                .collect(),
            cannons: self.cannons.clone(),
            bombs: self
                .bombs
                .iter()
                .map(|b| BombView {
                    owner: b.owner,
                    position: b.position.to_floats(),
                    cell: b.position.round(),
                    target: b.target,
                })
                .collect(),
            effects: self.effects.clone(),
            phase: self.phase.kind,
            title: self.phase.kind.title(),
            remaining_ms: self.phase.remaining(&durations, self.now),
            display_timer: self.phase.display_timer(&durations, self.now),
            fps: self.fps.fps(),
            paused: self.paused,
            debug: self.debug,
            tick: self.tick_count,
            now: self.now,
        }
    }

    /// Material at a cell (renderer convenience).
    pub fn material_at(&self, pos: GridPos) -> Material {
        self.terrain.get(pos)
    }
}

// =============================================================================
// RENDERER SNAPSHOT
// =============================================================================

/// A falling piece as the renderer sees it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceView {
    /// Owner
    pub player: Player,
    /// Shape
    pub shape: ShapeKind,
    /// Rotation index
    pub rotation: u8,
    /// Pivot cell
    pub anchor: GridPos,
    /// Occupied cells
    pub cells: Vec<GridPos>,
}

/// A bomb as the renderer sees it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BombView {
    /// Firing player
    pub owner: Player,
    /// Continuous position
    pub position: (f32, f32, f32),
    /// Nearest cell
    pub cell: GridPos,
    /// Aim point at launch
    pub target: GridPos,
}

/// Post-tick state for drawing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    /// Board kind
    pub dimensionality: Dimensionality,
    /// Columns along x
    pub width: i32,
    /// Columns along y
    pub depth: i32,
    /// Maximum column height
    pub height: i32,
    /// Column cells, row-major by (y, x)
    pub columns: Vec<Vec<Material>>,
    /// Falling pieces; empty outside Build
    pub pieces: Vec<PieceView>,
    /// Cannons
    pub cannons: Vec<Cannon>,
    /// Bombs in flight
    pub bombs: Vec<BombView>,
    /// Visual markers
    pub effects: Vec<Effect>,
    /// Active phase
    pub phase: PhaseKind,
    /// Banner text
    pub title: &'static str,
    /// Milliseconds until the phase expires
    pub remaining_ms: Option<Millis>,
    /// Whole seconds shown on the phase timer
    pub display_timer: Option<i64>,
    /// Frame-rate estimate
    pub fps: f32,
    /// Paused
    pub paused: bool,
    /// Debug overlay
    pub debug: bool,
    /// Ticks processed
    pub tick: u64,
    /// Simulation time
    pub now: Millis,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_opponent() {
        assert_eq!(Player::One.opponent(), Player::Two);
        assert_eq!(Player::Two.opponent(), Player::One);
        assert!(Player::One < Player::Two);
    }

    #[test]
    fn test_new_state() {
        let config = GameConfig::planar();
        let state = SimState::new(&config, 1_000);

        assert_eq!(state.phase, Phase::new(PhaseKind::Build, 1_000));
        assert_eq!(state.pieces.len(), 2);
        assert!(state.cannons.is_empty());
        assert!(state.redraw_requested());
        assert_eq!(state.pieces[0].player, Player::One);
        assert_eq!(state.pieces[1].anchor, GridPos::new(40, 0, 44));
    }

    #[test]
    fn test_hash_determinism() {
        let config = GameConfig { seed: 99, ..GameConfig::spatial() };
        let a = SimState::new(&config, 0);
        let b = SimState::new(&config, 0);
        assert_eq!(a.compute_hash(), b.compute_hash());

        let other = SimState::new(&GameConfig { seed: 100, ..config }, 0);
        assert_ne!(a.compute_hash(), other.compute_hash());
    }

    #[test]
    fn test_redraw_flag() {
        let mut state = SimState::new(&GameConfig::planar(), 0);
        assert!(state.take_redraw());
        assert!(!state.take_redraw());
        state.request_redraw();
        assert!(state.take_redraw());
    }

    #[test]
    fn test_fps_meter() {
        let mut meter = FpsMeter::default();
        meter.record(0);
        assert_eq!(meter.fps(), 60.0);
        meter.record(10);
        // (60·31 + 100) / 32
        assert!((meter.fps() - 61.25).abs() < 1e-4);
        meter.record(10);
        assert!((meter.fps() - 61.25).abs() < 1e-4);
    }

    #[test]
    fn test_snapshot_shape() {
        let config = GameConfig::spatial();
        let mut state = SimState::new(&config, 0);
        state.place_cannons(&config, 0);
        let snap = state.snapshot(&config);

        assert_eq!(snap.columns.len(), 50 * 50);
        assert_eq!(snap.pieces.len(), 2);
        assert_eq!(snap.pieces[0].cells.len(), 4);
        assert_eq!(snap.cannons.len(), 2);
        assert_eq!(snap.phase, PhaseKind::Build);
        assert_eq!(snap.display_timer, Some(10));
        assert!(serde_json::to_string(&snap).is_ok());
    }

    #[test]
    fn test_snapshot_hides_pieces_after_build() {
        let config = GameConfig::planar();
        let mut state = SimState::new(&config, 0);
        state.place_cannons(&config, 0);
        state.phase = Phase::new(PhaseKind::Shoot, 0);

        assert_eq!(state.pieces.len(), 2);
        assert!(state.snapshot(&config).pieces.is_empty());
    }
}
