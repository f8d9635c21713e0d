//! Phase State Machine
//!
//! The turn cycle, as a closed enum plus a pure transition function.
//!
//! ```text
//! Build ──▶ CollapseAfterBuild ──▶ PrepareToShoot ──▶ Shoot ──▶ WaitForBombs
//!   ▲            │  ▲                                                 │
//!   │            └──┘ (window restarts while terrain still moves)     │
//!   └──────────────────────── PrepareToBuild ◀────────────────────────┘
//! ```
//!
//! Timed phases expire when `now >= started_at + duration`.

use serde::{Serialize, Deserialize};

use crate::core::clock::Millis;
use crate::game::config::GameConfig;

/// One segment of the turn cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    /// Players steer falling pieces onto their islands
    Build,
    /// Terrain settles one collapse window at a time
    CollapseAfterBuild,
    /// Countdown before shooting; aiming allowed
    PrepareToShoot,
    /// Cannons fire
    Shoot,
    /// No more firing; in-flight bombs resolve
    WaitForBombs,
    /// Countdown before the next build
    PrepareToBuild,
}

impl PhaseKind {
    /// Banner text for the renderer.
    pub fn title(self) -> &'static str {
        match self {
            PhaseKind::Build => "Build the castle!",
            PhaseKind::CollapseAfterBuild => "collapse after build",
            PhaseKind::PrepareToShoot => "prepare to shoot",
            PhaseKind::Shoot => "Attack!",
            PhaseKind::WaitForBombs => "wait for bombs",
            PhaseKind::PrepareToBuild => "prepare to build",
        }
    }

    /// Fixed length of this phase; `None` for WaitForBombs.
    pub fn duration(self, durations: &PhaseDurations) -> Option<Millis> {
        match self {
            PhaseKind::Build => Some(durations.build),
            PhaseKind::CollapseAfterBuild => Some(durations.collapse),
            PhaseKind::PrepareToShoot | PhaseKind::PrepareToBuild => Some(durations.prepare),
            PhaseKind::Shoot => Some(durations.shoot),
            PhaseKind::WaitForBombs => None,
        }
    }

    /// Pieces may be moved, rotated and dropped.
    #[inline]
    pub fn accepts_piece_commands(self) -> bool {
        self == PhaseKind::Build
    }

    /// Aim points may be moved.
    #[inline]
    pub fn accepts_aim(self) -> bool {
        matches!(self, PhaseKind::PrepareToShoot | PhaseKind::Shoot)
    }

    /// Cannons may fire.
    #[inline]
    pub fn accepts_fire(self) -> bool {
        self == PhaseKind::Shoot
    }
}

/// The active phase and when it began.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    /// Which phase
    pub kind: PhaseKind,
    /// Start of the phase (or of the current collapse window)
    pub started_at: Millis,
}

impl Phase {
    /// Phase `kind` starting at `now`.
    pub fn new(kind: PhaseKind, now: Millis) -> Self {
        Self { kind, started_at: now }
    }

    /// Milliseconds since the phase began.
    #[inline]
    pub fn elapsed(&self, now: Millis) -> Millis {
        now.saturating_sub(self.started_at)
    }

    /// Milliseconds until expiry, floored at zero; `None` if untimed.
    pub fn remaining(&self, durations: &PhaseDurations, now: Millis) -> Option<Millis> {
        self.kind
            .duration(durations)
            .map(|d| d.saturating_sub(self.elapsed(now)))
    }

    /// Whole seconds left for display; `None` if untimed.
    pub fn display_timer(&self, durations: &PhaseDurations, now: Millis) -> Option<i64> {
        self.kind.duration(durations).map(|d| {
            (self.started_at as i64 + d as i64 - now as i64).div_euclid(1000)
        })
    }

    /// Timed phase has run its course at `now`.
    pub fn expired(&self, durations: &PhaseDurations, now: Millis) -> bool {
        self.kind
            .duration(durations)
            .is_some_and(|d| self.elapsed(now) >= d)
    }
}

/// Lengths of the timed phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDurations {
    /// Build
    pub build: Millis,
    /// One collapse window
    pub collapse: Millis,
    /// Both prepare phases
    pub prepare: Millis,
    /// Shoot
    pub shoot: Millis,
}

impl From<&GameConfig> for PhaseDurations {
    fn from(config: &GameConfig) -> Self {
        Self {
            build: config.build_ms,
            collapse: config.collapse_ms,
            prepare: config.prepare_ms,
            shoot: config.shoot_ms,
        }
    }
}

/// Facts about the world the transition rule depends on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Signals {
    /// The collapse pass just run moved something
    pub collapse_pending: bool,
    /// Bombs are still in flight
    pub bombs_live: bool,
}

/// Outcome of the transition rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Remain in the current phase
    Stay,
    /// Remain, but start a fresh window at `now`
    RestartWindow,
    /// Switch to another phase
    Enter(PhaseKind),
}

/// Total transition rule: `(phase, elapsed, signals) -> transition`.
pub fn transition(
    kind: PhaseKind,
    elapsed: Millis,
    durations: &PhaseDurations,
    signals: Signals,
) -> Transition {
    let expired = kind.duration(durations).is_some_and(|d| elapsed >= d);
    match kind {
        PhaseKind::Build if expired => Transition::Enter(PhaseKind::CollapseAfterBuild),
        PhaseKind::CollapseAfterBuild if expired => {
            if signals.collapse_pending {
                Transition::RestartWindow
            } else {
                Transition::Enter(PhaseKind::PrepareToShoot)
            }
        }
        PhaseKind::PrepareToShoot if expired => Transition::Enter(PhaseKind::Shoot),
        PhaseKind::Shoot if expired => Transition::Enter(PhaseKind::WaitForBombs),
        PhaseKind::WaitForBombs if !signals.bombs_live => Transition::Enter(PhaseKind::PrepareToBuild),
        PhaseKind::PrepareToBuild if expired => Transition::Enter(PhaseKind::Build),
        _ => Transition::Stay,
    }
}
