//! Ballistics Engine
//!
//! Parabolic bomb arcs, their discretization into a voxel path with arrival
//! times, and per-tick collision resolution against the terrain.
//!
//! ## Arc
//!
//! ```text
//! horizontal(t) = start + t · dir          (|dir| = 1 cell per step)
//! z(t)          = start_z − a·t² − b·t
//!
//! a = 125 / width²                         (fixed curvature)
//! b = −dz / dh − a·dh                      (so z(dh) = target_z)
//! ```
//!
//! `t` counts bomb steps (`bomb_step_ms` of wall time each). All math is
//! Q16.16 with i64 intermediates.

use serde::{Serialize, Deserialize};
use tracing::debug;
#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::core::clock::Millis;
use crate::core::fixed::{
    Fixed, CURVATURE_NUMERATOR, FIXED_SCALE,
    fixed_div, from_int, steps_from_millis,
};
use crate::core::vec3::{FixedVec3, GridPos};
use crate::game::config::GameConfig;
use crate::game::state::Player;
use crate::game::terrain::{Material, TerrainGrid};

/// Closed-form parabola from a muzzle through a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arc {
    /// Muzzle position
    pub start: FixedVec3,
    /// Quadratic coefficient `a`
    pub curvature: Fixed,
    /// Linear coefficient `b`
    pub linear: Fixed,
    /// Unit horizontal direction, x
    pub dir_x: Fixed,
    /// Unit horizontal direction, y
    pub dir_y: Fixed,
}

impl Arc {
    /// Solve the arc from `muzzle` through `target` on a board `width` wide.
    ///
    /// Returns `None` when the target is straight above or below the muzzle.
    pub fn solve(muzzle: GridPos, target: GridPos, width: i32) -> Option<Self> {
        let delta = FixedVec3::from_grid(target) - FixedVec3::from_grid(muzzle);
        let dh = delta.horizontal_length();
        if dh == 0 {
            return None;
        }

        let width_sq = (width.max(1) as i64) * (width.max(1) as i64);
        let curvature = ((CURVATURE_NUMERATOR << FIXED_SCALE) / width_sq) as Fixed;
        let linear = -fixed_div(delta.z, dh) - mul_wide(curvature as i64, dh as i64) as Fixed;

        Some(Self {
            start: FixedVec3::from_grid(muzzle),
            curvature,
            linear,
            dir_x: fixed_div(delta.x, dh),
            dir_y: fixed_div(delta.y, dh),
        })
    }

    /// Continuous position after `t` steps.
    pub fn position(&self, t: Fixed) -> FixedVec3 {
        let t = t as i64;
        let a_t = mul_wide(self.curvature as i64, t);
        let drop = mul_wide(a_t, t) + mul_wide(self.linear as i64, t);
        FixedVec3::new(
            saturate(self.start.x as i64 + mul_wide(self.dir_x as i64, t)),
            saturate(self.start.y as i64 + mul_wide(self.dir_y as i64, t)),
            saturate(self.start.z as i64 - drop),
        )
    }
}

#[inline]
fn mul_wide(a: i64, b: i64) -> i64 {
    (a * b) >> FIXED_SCALE
}

#[inline]
fn saturate(v: i64) -> Fixed {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as Fixed
}

/// Which axis the path cursor moved along to reach a point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAxis {
    /// x or y step
    Horizontal,
    /// z step
    Vertical,
}

/// One voxel on a bomb's path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// Voxel
    pub pos: GridPos,
    /// Wall time the bomb reaches this voxel
    pub arrival_ms: Millis,
    /// Axis of the step into this voxel
    pub axis: StepAxis,
    /// Arc was ascending during this step
    pub rising: bool,
}

#[inline]
fn toward(from: i32, to: i32) -> i32 {
    (to - from).signum()
}

/// Walk the arc one step at a time and record every voxel the cursor visits.
///
/// Within a step the cursor closes x first, then y, then z. Each step's
/// voxels share its wall-time window evenly, so arrival times never decrease.
/// The walk ends when the cursor leaves the board horizontally, drops below
/// the sea floor, or `budget` moves are spent.
pub fn discretize(
    arc: &Arc,
    launched_at: Millis,
    terrain: &TerrainGrid,
    step_ms: Millis,
    budget: u32,
) -> Vec<TrajectoryPoint> {
    let mut points = Vec::new();
    let mut cursor = arc.start.round();
    let mut remaining = budget;
    let mut previous_z = arc.start.z;
    let mut step: u64 = 1;

    'walk: while remaining > 0 {
        remaining -= 1;

        let exact = arc.position(from_int(step as i32));
        let target = exact.round();
        let rising = exact.z >= previous_z;
        previous_z = exact.z;

        let mut path = Vec::new();
        let mut stopped = false;
        while cursor != target && remaining > 0 {
            remaining -= 1;
            let axis = if cursor.x != target.x {
                cursor.x += toward(cursor.x, target.x);
                StepAxis::Horizontal
            } else if cursor.y != target.y {
                cursor.y += toward(cursor.y, target.y);
                StepAxis::Horizontal
            } else {
                cursor.z += toward(cursor.z, target.z);
                StepAxis::Vertical
            };
            if !terrain.column_in_bounds(cursor.x, cursor.y) || cursor.z < 0 {
                stopped = true;
                break;
            }
            path.push((cursor, axis));
        }

        let n = path.len() as u64;
        let window_start = launched_at + (step - 1) * step_ms;
        for (j, (pos, axis)) in path.into_iter().enumerate() {
            let arrival_ms = window_start + (j as u64 + 1) * step_ms / n;
            #[cfg(feature = "debug-tracing")]
            trace!(%pos, arrival_ms, ?axis, rising, "trajectory point");
            points.push(TrajectoryPoint { pos, arrival_ms, axis, rising });
        }

        if stopped {
            break 'walk;
        }
        step += 1;
    }

    points
}

/// A bomb in flight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bomb {
    /// Firing player
    pub owner: Player,
    /// Flight arc
    pub arc: Arc,
    /// Aim point at launch
    pub target: GridPos,
    /// Remaining path, oldest first
    pub trajectory: Vec<TrajectoryPoint>,
    /// Continuous position at the last resolution
    pub position: FixedVec3,
    /// Launch time
    pub created_at: Millis,
    /// Hit something or left the board
    pub exploded: bool,
}

/// What a resolution pass did to one bomb.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BombOutcome {
    /// Still flying
    InFlight,
    /// Struck `material` at `pos`; the cell has been degraded one stage
    Hit {
        /// Struck voxel
        pos: GridPos,
        /// Material before the hit
        material: Material,
    },
    /// Drifted off the board without hitting anything
    Lost,
}

impl Bomb {
    /// Fire from `muzzle` at `target`. `None` if no arc exists.
    pub fn launch(
        owner: Player,
        muzzle: GridPos,
        target: GridPos,
        terrain: &TerrainGrid,
        config: &GameConfig,
        now: Millis,
    ) -> Option<Self> {
        let arc = Arc::solve(muzzle, target, config.width)?;
        let trajectory = discretize(&arc, now, terrain, config.bomb_step_ms, config.trajectory_budget);
        debug!(?owner, %muzzle, %target, points = trajectory.len(), "bomb launched");
        Some(Self {
            owner,
            arc,
            target,
            trajectory,
            position: arc.start,
            created_at: now,
            exploded: false,
        })
    }

    /// Advance the bomb to `now` and resolve collisions.
    ///
    /// Among path points already passed, the first non-sky voxel is hit and
    /// degraded. A bomb whose continuous position leaves the board (plus
    /// `bomb_margin`) first is lost. Passed points are pruned either way.
    pub fn resolve(&mut self, terrain: &mut TerrainGrid, config: &GameConfig, now: Millis) -> BombOutcome {
        let t = steps_from_millis(now.saturating_sub(self.created_at), config.bomb_step_ms);
        self.position = self.arc.position(t);

        let outcome = if self.off_board(terrain, config.bomb_margin) {
            self.exploded = true;
            debug!(owner = ?self.owner, position = ?self.position, "bomb left the board");
            BombOutcome::Lost
        } else if let Some(pos) = self
            .trajectory
            .iter()
            .filter(|p| p.arrival_ms < now)
            .map(|p| p.pos)
            .find(|pos| !terrain.get(*pos).is_sky())
        {
            let material = terrain.get(pos);
            terrain.set(pos, material.degrade());
            self.exploded = true;
            debug!(owner = ?self.owner, %pos, ?material, "bomb hit");
            BombOutcome::Hit { pos, material }
        } else {
            BombOutcome::InFlight
        };

        self.trajectory.retain(|p| p.arrival_ms >= now);
        outcome
    }

    fn off_board(&self, terrain: &TerrainGrid, margin: i32) -> bool {
        let p = self.position;
        p.x < from_int(-margin)
            || p.y < from_int(-margin)
            || p.z < from_int(-margin)
            || p.x >= from_int(terrain.width() + margin)
            || p.y >= from_int(terrain.depth() + margin)
            || p.z >= from_int(terrain.height() + margin)
    }
}

// =============================================================================
// TESTS
// =============================================================================
