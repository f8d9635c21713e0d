//! Simulation Tick
//!
//! One tick per rendered frame. The phase decides which components run:
//!
//! ```text
//! Phase               pieces  collapse  cannons  bombs
//! ------------------  ------  --------  -------  -----
//! Build                 yes     opt.       -       -
//! CollapseAfterBuild     -    per window  yes      -
//! PrepareToShoot         -       -         -       -
//! Shoot                  -      yes       yes     yes
//! WaitForBombs           -      yes       yes     yes
//! PrepareToBuild         -      yes       yes     yes
//! ```
//!
//! Effects expire every tick, then the transition rule runs. All timers are
//! elapsed-since-timestamp checks, so a late tick simply catches up.

use tracing::{debug, info};

use crate::core::clock::{Clock, MonotonicClock, Millis};
use crate::game::ballistics::{discretize, Arc, BombOutcome, TrajectoryPoint};
use crate::game::config::{ConfigError, GameConfig};
use crate::game::effects::{self, Effect, EffectKind};
use crate::game::events::{SimEvent, SimEventData};
use crate::game::input::{apply_command, Command, Recording};
use crate::game::phase::{transition, Phase, PhaseDurations, PhaseKind, Signals, Transition};
use crate::game::piece::{Piece, PieceOutcome};
use crate::game::state::{Player, SimState, Snapshot};
use crate::game::terrain::Material;

/// Result of a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickResult {
    /// Tick was skipped because the session is paused
    pub paused: bool,
    /// Phase entered during this tick
    pub entered: Option<PhaseKind>,
    /// The collapse pass moved terrain
    pub collapsed: bool,
}

/// Run one simulation tick at `now`.
///
/// A clock reading older than the last tick is treated as the last tick's
/// time. Nothing happens while paused.
pub fn tick(state: &mut SimState, config: &GameConfig, now: Millis) -> TickResult {
    let mut result = TickResult::default();
    if state.paused {
        result.paused = true;
        return result;
    }

    let now = now.max(state.now);
    state.fps.record(now);
    state.now = now;
    state.tick_count += 1;

    let durations = PhaseDurations::from(config);
    let kind = state.phase.kind;
    let mut collapse_pending = false;

    match kind {
        PhaseKind::Build => {
            if state.pieces.is_empty() {
                state.spawn_pieces(config, now);
                state.request_redraw();
            }
            step_pieces(state, config, now);
            if config.collapse_during_build {
                result.collapsed = run_collapse(state);
            }
        }
        PhaseKind::CollapseAfterBuild => {
            if state.phase.expired(&durations, now) {
                collapse_pending = run_collapse(state);
                result.collapsed = collapse_pending;
                track_cannons(state, now);
            }
        }
        PhaseKind::PrepareToShoot => {}
        PhaseKind::Shoot | PhaseKind::WaitForBombs | PhaseKind::PrepareToBuild => {
            result.collapsed = run_collapse(state);
            track_cannons(state, now);
            resolve_bombs(state, config, now);
        }
    }

    if effects::expire(&mut state.effects, now) {
        state.request_redraw();
    }

    let display = state.phase.display_timer(&durations, now);
    if display != state.last_display_timer {
        state.last_display_timer = display;
        state.request_redraw();
    }

    let signals = Signals {
        collapse_pending,
        bombs_live: !state.bombs.is_empty(),
    };
    match transition(kind, state.phase.elapsed(now), &durations, signals) {
        Transition::Stay => {}
        Transition::RestartWindow => {
            state.phase = Phase::new(kind, now);
            state.request_redraw();
        }
        Transition::Enter(next) => {
            enter_phase(state, config, next, now);
            result.entered = Some(next);
        }
    }

    result
}

/// Switch phases and run the entry side effects.
fn enter_phase(state: &mut SimState, config: &GameConfig, next: PhaseKind, now: Millis) {
    let from = state.phase.kind;
    match next {
        PhaseKind::CollapseAfterBuild => state.place_cannons(config, now),
        PhaseKind::Shoot => state.bombs.clear(),
        PhaseKind::Build => state.pieces.clear(),
        _ => {}
    }

    state.phase = Phase::new(next, now);
    state.last_display_timer = state.phase.display_timer(&PhaseDurations::from(config), now);
    state.request_redraw();
    state.push_event(SimEvent::phase_changed(now, from, next));
    info!(?from, to = ?next, at = now, "phase changed");
}

/// Advance every falling piece; replace the ones that landed or sank.
fn step_pieces(state: &mut SimState, config: &GameConfig, now: Millis) {
    let dimensionality = config.dimensionality;

    for i in 0..state.pieces.len() {
        let cells = state.pieces[i].cells(dimensionality);
        let outcome = state.pieces[i].step(&mut state.terrain, dimensionality, now);
        let player = state.pieces[i].player;

        match outcome {
            PieceOutcome::Waiting => continue,
            PieceOutcome::Fell => {}
            PieceOutcome::Landed => {
                debug!(?player, anchor = %state.pieces[i].anchor, "piece landed");
                state.push_event(SimEvent::new(now, SimEventData::PieceLanded {
                    player,
                    cells: cells.to_vec(),
                }));
                state.pieces[i] = Piece::spawn(config, player, &mut state.rng, now);
            }
            PieceOutcome::Sank => {
                let anchor = state.pieces[i].anchor;
                debug!(?player, %anchor, "piece sank");
                state.effects.push(Effect::new(EffectKind::Splash, anchor, now, config.splash_ttl_ms));
                state.push_event(SimEvent::new(now, SimEventData::PieceSunk { player, anchor }));
                state.pieces[i] = Piece::spawn(config, player, &mut state.rng, now);
            }
        }
        state.request_redraw();
    }
}

/// One collapse pass. Returns whether anything fell.
fn run_collapse(state: &mut SimState) -> bool {
    let moved = state.terrain.collapse_pass();
    if moved {
        state.request_redraw();
    }
    moved
}

/// Let barrels follow the terrain and refresh reload timers.
fn track_cannons(state: &mut SimState, now: Millis) {
    let mut sunk = Vec::new();
    let mut changed = false;

    for cannon in &mut state.cannons {
        let update = cannon.track(&state.terrain, now);
        if update.sank {
            sunk.push((cannon.owner, cannon.barrel));
        }
        changed |= update.sank || update.timer_changed;
    }

    for (player, barrel) in sunk {
        state.push_event(SimEvent::new(now, SimEventData::CannonSank { player, barrel }));
    }
    if changed {
        state.request_redraw();
    }
}

/// Advance bombs, apply hits, and drop exploded ones.
fn resolve_bombs(state: &mut SimState, config: &GameConfig, now: Millis) {
    if state.bombs.is_empty() {
        return;
    }

    let mut events = Vec::new();
    for bomb in &mut state.bombs {
        match bomb.resolve(&mut state.terrain, config, now) {
            BombOutcome::InFlight => {}
            BombOutcome::Hit { pos, material } => {
                let effect = if material == Material::Sea {
                    Effect::new(EffectKind::Splash, pos, now, config.splash_ttl_ms)
                } else {
                    Effect::new(EffectKind::Explosion, pos, now, config.explosion_ttl_ms)
                };
                state.effects.push(effect);
                events.push(SimEvent::bomb_hit(now, bomb.owner, pos, material));
            }
            BombOutcome::Lost => {
                events.push(SimEvent::new(now, SimEventData::BombLost { player: bomb.owner }));
            }
        }
    }

    state.bombs.retain(|b| !b.exploded);
    for event in events {
        state.push_event(event);
    }
    state.request_redraw();
}

// =============================================================================
// TRAJECTORY PREVIEW
// =============================================================================

/// A cannon's would-fire path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrajectoryPreview {
    /// Cannon owner
    pub player: Player,
    /// Path from the current muzzle to the current aim
    pub points: Vec<TrajectoryPoint>,
}

/// Paths each cannon would fire at `now`. Empty unless debug is on.
pub fn preview_trajectories(state: &SimState, config: &GameConfig, now: Millis) -> Vec<TrajectoryPreview> {
    if !state.debug {
        return Vec::new();
    }

    state
        .cannons
        .iter()
        .filter_map(|cannon| {
            let arc = Arc::solve(cannon.muzzle(), cannon.aim, config.width)?;
            Some(TrajectoryPreview {
                player: cannon.owner,
                points: discretize(&arc, now, &state.terrain, config.bomb_step_ms, config.trajectory_budget),
            })
        })
        .collect()
}

// =============================================================================
// SIMULATION DRIVER
// =============================================================================

/// A session bound to a clock: reads time, ticks, applies commands, and
/// optionally records everything for replay.
pub struct Simulation<C: Clock = MonotonicClock> {
    config: GameConfig,
    clock: C,
    state: SimState,
    started_at: Millis,
    recording: Option<Recording>,
}

impl<C: Clock> Simulation<C> {
    /// Validate `config` and start a session at the clock's current time.
    pub fn new(config: GameConfig, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let started_at = clock.now_ms();
        let state = SimState::new(&config, started_at);
        info!(
            dimensionality = ?config.dimensionality,
            width = config.width,
            depth = config.depth,
            height = config.height,
            seed = config.seed,
            "simulation started"
        );
        Ok(Self {
            config,
            clock,
            state,
            started_at,
            recording: None,
        })
    }

    /// Run one tick at the clock's current time.
    pub fn tick(&mut self) -> TickResult {
        let now = self.clock.now_ms();
        if let Some(recording) = &mut self.recording {
            recording.record_tick(now);
        }
        tick(&mut self.state, &self.config, now)
    }

    /// Apply a command at the clock's current time. Returns whether it took effect.
    pub fn apply(&mut self, command: Command) -> bool {
        let now = self.clock.now_ms();
        if let Some(recording) = &mut self.recording {
            recording.record_command(now, command);
        }
        apply_command(&mut self.state, &self.config, command, now)
    }

    /// Shift a player's piece.
    pub fn move_piece(&mut self, player: Player, dx: i32, dy: i32) -> bool {
        self.apply(Command::MovePiece { player, dx, dy })
    }

    /// Rotate a player's piece.
    pub fn rotate_piece(&mut self, player: Player) -> bool {
        self.apply(Command::RotatePiece { player })
    }

    /// Drop a player's piece fast.
    pub fn fast_drop(&mut self, player: Player) -> bool {
        self.apply(Command::FastDrop { player })
    }

    /// Move a player's aim point.
    pub fn move_aim(&mut self, player: Player, dx: i32, dy: i32, dz: i32) -> bool {
        self.apply(Command::MoveAim { player, dx, dy, dz })
    }

    /// Fire a player's cannon.
    pub fn fire(&mut self, player: Player) -> bool {
        self.apply(Command::Fire { player })
    }

    /// Pause or resume.
    pub fn toggle_pause(&mut self) -> bool {
        self.apply(Command::TogglePause)
    }

    /// Show or hide the trajectory preview.
    pub fn toggle_debug(&mut self) -> bool {
        self.apply(Command::ToggleDebug)
    }

    /// Would-fire paths for the debug overlay.
    pub fn preview_trajectories(&self) -> Vec<TrajectoryPreview> {
        preview_trajectories(&self.state, &self.config, self.clock.now_ms())
    }

    /// Begin recording. Call before the first tick or command.
    pub fn start_recording(&mut self) {
        self.recording = Some(Recording::new(self.config.clone(), self.started_at));
    }

    /// Stop recording and hand over what was captured.
    pub fn take_recording(&mut self) -> Option<Recording> {
        self.recording.take()
    }

    /// Visible state changed since the last call.
    pub fn take_redraw(&mut self) -> bool {
        self.state.take_redraw()
    }

    /// Drain pending events.
    pub fn take_events(&mut self) -> Vec<SimEvent> {
        self.state.take_events()
    }

    /// Renderer view of the current state.
    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot(&self.config)
    }

    /// Current state.
    pub fn state(&self) -> &SimState {
        &self.state
    }

    /// Active configuration.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The clock driving this session.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Consume the session, keeping its state.
    pub fn into_state(self) -> SimState {
        self.state
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::vec3::GridPos;
    use crate::game::terrain::TerrainGrid;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn planar_sim(seed: u64) -> (Simulation<ManualClock>, ManualClock) {
        let clock = ManualClock::new(0);
        let config = GameConfig { seed, ..GameConfig::planar() };
        let sim = Simulation::new(config, clock.clone()).unwrap();
        (sim, clock)
    }

    /// Tick every 16 ms until `until`.
    fn run_until(sim: &mut Simulation<ManualClock>, clock: &ManualClock, until: Millis) -> Vec<TickResult> {
        let mut results = Vec::new();
        while clock.now_ms() < until {
            clock.advance(16);
            results.push(sim.tick());
        }
        results
    }

    #[test]
    fn test_build_expiry_enters_collapse_once() {
        let (mut sim, clock) = planar_sim(1);
        assert!(sim.state().cannons.is_empty());

        let results = run_until(&mut sim, &clock, 10_100);
        let entered: Vec<_> = results.iter().filter_map(|r| r.entered).collect();

        assert_eq!(entered, vec![PhaseKind::CollapseAfterBuild]);
        assert_eq!(sim.state().phase.kind, PhaseKind::CollapseAfterBuild);
        assert_eq!(sim.state().cannons.len(), 2);
    }

    #[test]
    fn test_cannons_exist_right_after_build() {
        let clock = ManualClock::new(0);
        let mut sim = Simulation::new(GameConfig::spatial(), clock.clone()).unwrap();
        clock.set(9_999);
        assert_eq!(sim.tick().entered, None);
        clock.set(10_000);
        assert_eq!(sim.tick().entered, Some(PhaseKind::CollapseAfterBuild));
        assert_eq!(sim.state().cannons.len(), 2);
        clock.set(10_001);
        assert_eq!(sim.tick().entered, None);
    }

    #[test]
    fn test_full_turn_cycle() {
        let (mut sim, clock) = planar_sim(2);
        let results = run_until(&mut sim, &clock, 60_000);
        let entered: Vec<_> = results.iter().filter_map(|r| r.entered).collect();

        assert_eq!(
            &entered[..5],
            &[
                PhaseKind::CollapseAfterBuild,
                PhaseKind::PrepareToShoot,
                PhaseKind::Shoot,
                PhaseKind::WaitForBombs,
                PhaseKind::PrepareToBuild,
            ]
        );

        let phase_events = sim
            .take_events()
            .into_iter()
            .filter(|e| matches!(e.data, SimEventData::PhaseChanged { .. }))
            .count();
        assert!(phase_events >= 5);
    }

    #[test]
    fn test_pieces_land_and_respawn() {
        let (mut sim, clock) = planar_sim(3);
        let stone_before = sim.state().terrain.count(Material::Stone1);

        sim.fast_drop(Player::One);
        sim.fast_drop(Player::Two);
        run_until(&mut sim, &clock, 5_000);

        assert!(sim.state().terrain.count(Material::Stone1) > stone_before);
        assert_eq!(sim.state().pieces.len(), 2);
        assert!(sim
            .take_events()
            .iter()
            .any(|e| matches!(e.data, SimEventData::PieceLanded { .. })));
    }

    #[test]
    fn test_piece_into_open_sea_sinks() {
        let clock = ManualClock::new(0);
        let config = GameConfig::planar();
        let mut sim = Simulation::new(config, clock.clone()).unwrap();

        // steer player one's piece off the island over deep water
        for _ in 0..20 {
            sim.move_piece(Player::One, 1, 0);
        }
        sim.fast_drop(Player::One);
        run_until(&mut sim, &clock, 3_000);

        let events = sim.take_events();
        assert!(events
            .iter()
            .any(|e| matches!(e.data, SimEventData::PieceSunk { player: Player::One, .. })));
    }

    #[test]
    fn test_paused_tick_is_noop() {
        let (mut sim, clock) = planar_sim(4);
        sim.toggle_pause();
        let hash = sim.state().compute_hash();

        clock.set(20_000);
        assert!(sim.tick().paused);
        assert_eq!(sim.state().compute_hash(), hash);
        assert_eq!(sim.state().phase.kind, PhaseKind::Build);

        sim.toggle_pause();
        assert_eq!(sim.tick().entered, Some(PhaseKind::CollapseAfterBuild));
    }

    #[test]
    fn test_collapse_window_repeats_until_settled() {
        let config = GameConfig::planar();
        let mut state = SimState::new(&config, 0);
        state.phase = Phase::new(PhaseKind::CollapseAfterBuild, 0);
        state.pieces.clear();
        // a three-high tower hanging two cells over the water
        for z in 20..23 {
            state.terrain.set(GridPos::new(25, 0, z), Material::Stone1);
        }

        let mut restarts = 0;
        let mut now = 0;
        while state.phase.kind == PhaseKind::CollapseAfterBuild && now < 100_000 {
            now += 200;
            let before = state.phase.started_at;
            tick(&mut state, &config, now);
            if state.phase.kind == PhaseKind::CollapseAfterBuild && state.phase.started_at != before {
                restarts += 1;
            }
        }

        assert_eq!(state.phase.kind, PhaseKind::PrepareToShoot);
        assert!(restarts > 0);
        assert!(state.terrain.is_settled());
    }

    #[test]
    fn test_bomb_hits_and_degrades() {
        let config = GameConfig::planar();
        let mut state = SimState::new(&config, 0);
        state.pieces.clear();
        state.place_cannons(&config, 0);
        state.phase = Phase::new(PhaseKind::Shoot, 0);

        assert!(apply_command(&mut state, &config, Command::Fire { player: Player::One }, 0));
        let land_before = state.terrain.count(Material::Land);
        let target = state.cannon(Player::One).map(|c| c.aim);

        let mut now = 0;
        while !state.bombs.is_empty() && now < 20_000 {
            now += 16;
            tick(&mut state, &config, now);
        }

        assert!(state.bombs.is_empty());
        let events = state.take_events();
        assert!(events
            .iter()
            .any(|e| matches!(e.data, SimEventData::BombHit { player: Player::One, material: Material::Land, .. })));
        // land absorbs hits without degrading
        assert_eq!(state.terrain.count(Material::Land), land_before);
        assert_eq!(target.map(|t| state.terrain.get(t)), Some(Material::Land));
        assert!(state.effects.iter().any(|e| e.kind == EffectKind::Explosion));
    }

    #[test]
    fn test_wait_for_bombs_holds_while_in_flight() {
        let config = GameConfig::planar();
        let mut state = SimState::new(&config, 0);
        state.pieces.clear();
        state.place_cannons(&config, 0);
        state.phase = Phase::new(PhaseKind::Shoot, 0);
        apply_command(&mut state, &config, Command::Fire { player: Player::Two }, 29_990);

        tick(&mut state, &config, 30_000);
        assert_eq!(state.phase.kind, PhaseKind::WaitForBombs);
        tick(&mut state, &config, 30_016);
        assert_eq!(state.phase.kind, PhaseKind::WaitForBombs);
        assert!(!state.bombs.is_empty());
    }

    #[test]
    fn test_preview_requires_debug() {
        let config = GameConfig::spatial();
        let mut state = SimState::new(&config, 0);
        state.place_cannons(&config, 0);

        assert!(preview_trajectories(&state, &config, 0).is_empty());
        state.debug = true;
        let previews = preview_trajectories(&state, &config, 0);
        assert_eq!(previews.len(), 2);
        assert!(previews.iter().all(|p| !p.points.is_empty()));
        assert!(state.bombs.is_empty());
    }

    #[test]
    fn test_redraw_on_display_timer() {
        let (mut sim, clock) = planar_sim(5);
        sim.take_redraw();
        clock.set(1);
        sim.tick();
        assert!(sim.take_redraw());
        clock.set(2);
        sim.tick();
        assert!(!sim.take_redraw());
        clock.set(1_001);
        sim.tick();
        assert!(sim.take_redraw());
    }

    fn random_command(rng: &mut StdRng) -> Command {
        let player = if rng.gen_bool(0.5) { Player::One } else { Player::Two };
        match rng.gen_range(0..7) {
            0 => Command::MovePiece { player, dx: rng.gen_range(-1..=1), dy: rng.gen_range(-1..=1) },
            1 => Command::RotatePiece { player },
            2 => Command::FastDrop { player },
            3 => Command::MoveAim {
                player,
                dx: rng.gen_range(-1..=1),
                dy: rng.gen_range(-1..=1),
                dz: rng.gen_range(-1..=1),
            },
            4 | 5 => Command::Fire { player },
            _ => Command::ToggleDebug,
        }
    }

    fn assert_piece_clear(state: &SimState, config: &GameConfig, player: Player) {
        if let Some(piece) = state.pieces.iter().find(|p| p.player == player) {
            for cell in piece.cells(config.dimensionality) {
                assert!(!state.terrain.get(cell).is_solid(), "piece overlaps terrain at {cell}");
            }
        }
    }

    fn assert_invariants(state: &SimState, config: &GameConfig) {
        let terrain: &TerrainGrid = &state.terrain;
        for piece in &state.pieces {
            for cell in piece.cells(config.dimensionality) {
                assert!(terrain.column_in_bounds(cell.x, cell.y), "piece left the board: {cell}");
                assert!(cell.z >= 0 && cell.z < terrain.height());
            }
        }
        for cannon in &state.cannons {
            assert!(terrain.column_in_bounds(cannon.aim.x, cannon.aim.y));
            assert!(cannon.barrel.z >= 0);
        }
        for bomb in &state.bombs {
            assert!(bomb
                .trajectory
                .windows(2)
                .all(|w| w[0].arrival_ms <= w[1].arrival_ms));
        }
    }

    #[test]
    fn test_command_storm_keeps_invariants() {
        for (seed, config) in [(11u64, GameConfig::planar()), (12, GameConfig::spatial())] {
            let mut rng = StdRng::seed_from_u64(seed);
            let clock = ManualClock::new(0);
            let mut sim = Simulation::new(GameConfig { seed, ..config }, clock.clone()).unwrap();

            for _ in 0..4_000 {
                clock.advance(rng.gen_range(1..40));
                for _ in 0..rng.gen_range(0..3) {
                    let command = random_command(&mut rng);
                    let applied = sim.apply(command);
                    if applied && matches!(command, Command::MovePiece { .. } | Command::RotatePiece { .. }) {
                        if let Some(player) = command.player() {
                            assert_piece_clear(sim.state(), sim.config(), player);
                        }
                    }
                }
                sim.tick();
                assert_invariants(sim.state(), sim.config());
            }
        }
    }
}
