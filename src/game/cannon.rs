//! Cannon Tracker
//!
//! Each player gets one cannon per shoot round. The barrel rides the terrain
//! down as the structure under it is destroyed; the aim point moves only on
//! player commands.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::clock::Millis;
use crate::core::vec3::GridPos;
use crate::game::config::{Dimensionality, GameConfig};
use crate::game::map;
use crate::game::state::Player;
use crate::game::terrain::TerrainGrid;

/// A player's cannon and its aim point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cannon {
    /// Owner
    pub owner: Player,
    /// Barrel cell, directly above the ground
    pub barrel: GridPos,
    /// Aim point
    pub aim: GridPos,
    /// Reload time
    pub reload_ms: Millis,
    /// Time of the last shot; may precede the clock origin
    pub last_shot: i64,
    /// Whole seconds of reload left, as last tracked
    pub timer: i64,
}

/// Result of one tracking update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CannonUpdate {
    /// Barrel dropped a cell
    pub sank: bool,
    /// Whole-second reload timer changed
    pub timer_changed: bool,
}

impl Cannon {
    /// Place a loaded cannon on the owner's island, aimed at the opponent's.
    pub fn place(terrain: &TerrainGrid, config: &GameConfig, owner: Player, now: Millis) -> Self {
        let reload_ms = config.cannon_reload_ms;
        Self {
            owner,
            barrel: map::cannon_site(terrain, config, owner),
            aim: map::aim_start(terrain, config, owner),
            reload_ms,
            last_shot: now as i64 - reload_ms as i64,
            timer: 0,
        }
    }

    /// Launch point, one cell above the barrel.
    #[inline]
    pub fn muzzle(&self) -> GridPos {
        self.barrel.above()
    }

    /// Reload seconds left at `now`, rounded down. Zero or less means loaded.
    pub fn timer_at(&self, now: Millis) -> i64 {
        (self.last_shot + self.reload_ms as i64 - now as i64).div_euclid(1000)
    }

    /// Loaded and allowed to fire at `now`.
    #[inline]
    pub fn ready(&self, now: Millis) -> bool {
        self.timer_at(now) <= 0
    }

    /// Restart the reload after a shot at `now`.
    pub fn record_shot(&mut self, now: Millis) {
        self.last_shot = now as i64;
        self.timer = self.timer_at(now);
    }

    /// Sink the barrel if the cell under it is gone, and refresh the timer.
    pub fn track(&mut self, terrain: &TerrainGrid, now: Millis) -> CannonUpdate {
        let mut update = CannonUpdate::default();

        if self.barrel.z > 0 && terrain.get(self.barrel.below()).is_sky() {
            self.barrel = self.barrel.below();
            update.sank = true;
            debug!(owner = ?self.owner, barrel = %self.barrel, "cannon sank");
        }

        let timer = self.timer_at(now);
        if timer != self.timer {
            self.timer = timer;
            update.timer_changed = true;
        }
        update
    }

    /// Move the aim point. Returns whether it moved.
    ///
    /// The aim stays on the board and never sits on the barrel column. A
    /// non-zero `dz` raises or lowers it; otherwise a spatial aim snaps to the
    /// ground at its new column and a planar aim keeps its height.
    ///
    /// A planar board has no depth, so there `dy` is the screen row: negative
    /// moves the aim up, positive moves it down.
    pub fn move_aim(
        &mut self,
        terrain: &TerrainGrid,
        dimensionality: Dimensionality,
        dx: i32,
        dy: i32,
        dz: i32,
    ) -> bool {
        let (dy, dz) = match dimensionality {
            Dimensionality::Planar => (0, dz - dy),
            Dimensionality::Spatial => (dy, dz),
        };

        let x = self.aim.x + dx;
        let y = self.aim.y + dy;
        if !terrain.column_in_bounds(x, y) || self.barrel.same_column(GridPos::new(x, y, 0)) {
            return false;
        }

        let z = if dz != 0 {
            (self.aim.z + dz).clamp(0, terrain.height() - 1)
        } else {
            match dimensionality {
                Dimensionality::Spatial => terrain.ground_z(x, y).max(0),
                Dimensionality::Planar => self.aim.z,
            }
        };

        self.aim = GridPos::new(x, y, z);
        true
    }
}
