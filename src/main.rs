//! Castle Bombard headless demo
//!
//! Plays a scripted session against a manual clock, then replays the
//! recording and checks the state hashes match.
//!
//! Usage: `castle-bombard [planar | spatial | <config.json>]`

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use castle_bombard::{
    VERSION,
    Clock, Command, GameConfig, ManualClock, Player, Simulation,
    game::{events::SimEventData, phase::PhaseKind},
};

/// Frame interval of the scripted session (about 60 Hz).
const FRAME_MS: u64 = 16;

/// Length of the scripted session.
const SESSION_MS: u64 = 120_000;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Castle Bombard v{}", VERSION);

    let config = load_config(std::env::args().nth(1).as_deref())?.with_env_overrides();
    config.validate().context("config rejected")?;

    demo_session(config)
}

fn load_config(arg: Option<&str>) -> Result<GameConfig> {
    Ok(match arg {
        None | Some("planar") => GameConfig::planar(),
        Some("spatial") => GameConfig::spatial(),
        Some(path) => GameConfig::load(path).with_context(|| format!("loading {path}"))?,
    })
}

/// Scripted inputs for one frame.
fn script(frame: u64, phase: PhaseKind) -> Vec<Command> {
    let mut commands = Vec::new();
    match phase {
        PhaseKind::Build => {
            if frame % 45 == 0 {
                commands.push(Command::MovePiece { player: Player::One, dx: if frame % 90 == 0 { 1 } else { -1 }, dy: 0 });
            }
            if frame % 70 == 0 {
                commands.push(Command::RotatePiece { player: Player::Two });
            }
            if frame % 120 == 60 {
                commands.push(Command::FastDrop { player: Player::One });
                commands.push(Command::FastDrop { player: Player::Two });
            }
        }
        PhaseKind::PrepareToShoot => {
            if frame % 30 == 0 {
                commands.push(Command::MoveAim { player: Player::Two, dx: 1, dy: 0, dz: 0 });
            }
        }
        PhaseKind::Shoot => {
            commands.push(Command::Fire { player: Player::One });
            commands.push(Command::Fire { player: Player::Two });
        }
        _ => {}
    }
    commands
}

fn demo_session(config: GameConfig) -> Result<()> {
    info!("=== Starting Demo Session ===");
    info!("Board: {:?} {}x{}x{}", config.dimensionality, config.width, config.depth, config.height);
    info!("RNG Seed: {}", config.seed);

    let clock = ManualClock::new(0);
    let mut sim = Simulation::new(config, clock.clone())?;
    sim.start_recording();

    let mut frames_drawn = 0u64;
    let mut hits = 0usize;
    let mut frame = 0u64;

    while clock.now_ms() < SESSION_MS {
        for command in script(frame, sim.state().phase.kind) {
            sim.apply(command);
        }

        sim.tick();
        if sim.take_redraw() {
            frames_drawn += 1;
        }

        for event in sim.take_events() {
            match &event.data {
                SimEventData::PhaseChanged { to, .. } => {
                    info!("{:>6} ms: {}", event.at, to.title());
                }
                SimEventData::BombHit { player, pos, material } => {
                    hits += 1;
                    info!("{:>6} ms: {} hit {:?} at {}", event.at, player.name(), material, pos);
                }
                _ => {}
            }
        }

        frame += 1;
        clock.advance(FRAME_MS);
    }

    // Print final results
    info!("=== Session Results ===");
    let hash = sim.state().compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));
    info!("Frames: {}, redrawn: {}, bomb hits: {}", frame, frames_drawn, hits);

    let snapshot = sim.snapshot();
    info!(
        "Phase: {} ({:?} s left), fps estimate {:.1}",
        snapshot.title, snapshot.display_timer, snapshot.fps
    );

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let recording = sim.take_recording().context("recording missing")?;
    let replayed = recording.replay()?;
    let replay_hash = replayed.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash {
        bail!("determinism failure: hashes differ");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");

    println!("{}", serde_json::to_string(&snapshot.cannons)?);
    Ok(())
}
