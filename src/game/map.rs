//! Island Map Geometry
//!
//! Deterministic terrain generation, spawn anchors, and the projection of
//! shape offsets into grid cells for both board kinds.
//!
//! ```text
//! Planar (side view)                 Spatial (top view)
//!
//!  z                                  y
//!  │      ▄▄▄            ▄▄▄          │    ( ◎ )          ( ◎ )
//!  │  ▄▄▄▄▄▄▄▄▄▄▄    ▄▄▄▄▄▄▄▄▄▄▄      │   west isle      east isle
//!  │~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~    │
//!  └──────────────────────────── x    └──────────────────────────── x
//! ```

use crate::core::vec3::GridPos;
use crate::game::config::{Dimensionality, GameConfig};
use crate::game::shapes::Offset;
use crate::game::state::Player;
use crate::game::terrain::{Material, TerrainGrid};

/// `round(n / d)` for non-negative integers, halves rounding up.
#[inline]
fn round_div(n: i32, d: i32) -> i32 {
    (2 * n + d) / (2 * d)
}

/// x of a player's island centre column.
///
/// The west island belongs to player one, the east island to player two.
pub fn island_center_x(width: i32, player: Player) -> i32 {
    match player {
        Player::One => round_div(width * 9, 50),
        Player::Two => width - round_div(width * 10, 50),
    }
}

/// y of both island centres.
pub fn island_center_y(config: &GameConfig) -> i32 {
    match config.dimensionality {
        Dimensionality::Planar => 0,
        Dimensionality::Spatial => config.depth / 2,
    }
}

/// Generate the starting terrain for `config`.
pub fn generate_terrain(config: &GameConfig) -> TerrainGrid {
    match config.dimensionality {
        Dimensionality::Planar => planar_islands(config.width, config.height),
        Dimensionality::Spatial => spatial_islands(config.width, config.depth, config.height),
    }
}

/// Sea along the bottom, two one-cell land strips with a raised plateau each.
fn planar_islands(width: i32, height: i32) -> TerrainGrid {
    let mut grid = TerrainGrid::new(width, 1, height);
    let sea_rows = height - 1 - (height * 8) / 10;

    for x in 0..width {
        for _ in 0..sea_rows {
            grid.push(x, 0, Material::Sea);
        }
    }

    let strip = (width + 3) / 4;
    for start in [width / 16, (width * 11) / 16] {
        for x in start..(start + strip).min(width) {
            grid.set(GridPos::new(x, 0, sea_rows), Material::Land);
        }
    }

    let plateau = (width + 7) / 8;
    for start in [(width * 2) / 16, (width * 12) / 16] {
        for x in start..(start + plateau).min(width) {
            grid.set(GridPos::new(x, 0, sea_rows + 1), Material::Land);
        }
    }

    grid
}

/// A sea floor everywhere, with two round two-tier islands on the centre line.
fn spatial_islands(width: i32, depth: i32, height: i32) -> TerrainGrid {
    let mut grid = TerrainGrid::new(width, depth, height);

    // Sixteenths of a cell keep the island circles exact in integers.
    let centres = [(width * 3, depth * 8), (width * 12, depth * 8)];
    let outer_sq = (width * 2) as i64 * (width * 2) as i64;
    let inner_sq = width as i64 * width as i64;

    for y in 0..depth {
        for x in 0..width {
            grid.push(x, y, Material::Sea);

            let nearest_sq = centres
                .iter()
                .map(|(cx, cy)| {
                    let dx = (x * 16 - cx) as i64;
                    let dy = (y * 16 - cy) as i64;
                    dx * dx + dy * dy
                })
                .min()
                .unwrap_or(i64::MAX);

            if nearest_sq < outer_sq {
                grid.push(x, y, Material::Land);
            }
            if nearest_sq < inner_sq {
                grid.push(x, y, Material::Land);
            }
        }
    }

    grid
}

/// Grid cell of shape offset `(u, v)` for a piece anchored at `anchor`.
///
/// Planar shapes stand upright (`v` grows downward on screen, so it lowers
/// `z`); spatial shapes lie flat at the anchor height.
#[inline]
pub fn project(dimensionality: Dimensionality, anchor: GridPos, (u, v): Offset) -> GridPos {
    match dimensionality {
        Dimensionality::Planar => GridPos::new(anchor.x + u, anchor.y, anchor.z - v),
        Dimensionality::Spatial => GridPos::new(anchor.x + u, anchor.y + v, anchor.z),
    }
}

/// Where a player's new piece appears.
pub fn piece_spawn(config: &GameConfig, player: Player) -> GridPos {
    GridPos::new(
        island_center_x(config.width, player),
        island_center_y(config),
        config.piece_spawn_height,
    )
}

/// Barrel cell of a player's cannon: first empty cell above the island centre.
pub fn cannon_site(terrain: &TerrainGrid, config: &GameConfig, player: Player) -> GridPos {
    let x = island_center_x(config.width, player);
    let y = island_center_y(config);
    GridPos::new(x, y, terrain.top(x, y))
}

/// Initial aim point: the opponent's island centre at ground height.
pub fn aim_start(terrain: &TerrainGrid, config: &GameConfig, player: Player) -> GridPos {
    let x = island_center_x(config.width, player.opponent());
    let y = island_center_y(config);
    GridPos::new(x, y, terrain.ground_z(x, y).max(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_island_centres() {
        assert_eq!(island_center_x(50, Player::One), 9);
        assert_eq!(island_center_x(50, Player::Two), 40);
        assert_eq!(island_center_x(100, Player::One), 18);
        assert_eq!(island_center_x(100, Player::Two), 80);
    }

    #[test]
    fn test_planar_layout() {
        let grid = generate_terrain(&GameConfig::planar());

        // open sea column
        assert_eq!(grid.top(0, 0), 9);
        assert_eq!(grid.get(GridPos::new(0, 0, 8)), Material::Sea);

        // island strip edges
        assert_eq!(grid.get(GridPos::new(2, 0, 9)), Material::Sky);
        assert_eq!(grid.get(GridPos::new(3, 0, 9)), Material::Land);
        assert_eq!(grid.get(GridPos::new(15, 0, 9)), Material::Land);
        assert_eq!(grid.get(GridPos::new(16, 0, 9)), Material::Sky);
        assert_eq!(grid.get(GridPos::new(34, 0, 9)), Material::Land);
        assert_eq!(grid.get(GridPos::new(46, 0, 9)), Material::Land);

        // plateaus
        assert_eq!(grid.ground_z(6, 0), 10);
        assert_eq!(grid.ground_z(12, 0), 10);
        assert_eq!(grid.ground_z(13, 0), 9);
        assert_eq!(grid.ground_z(37, 0), 10);
        assert_eq!(grid.ground_z(43, 0), 10);
    }

    #[test]
    fn test_spatial_layout() {
        let grid = generate_terrain(&GameConfig::spatial());

        assert_eq!(grid.top(0, 0), 1);
        assert_eq!(grid.get(GridPos::new(0, 0, 0)), Material::Sea);

        // centre of the west island (9.375, 25) has two land cells
        assert_eq!(grid.top(9, 25), 3);
        assert_eq!(grid.get(GridPos::new(9, 25, 2)), Material::Land);

        // centre of the east island (37.5, 25)
        assert_eq!(grid.top(37, 25), 3);

        // 5 cells out: outer ring only (radius 6.25 outer, 3.125 inner)
        assert_eq!(grid.top(9, 30), 2);
        // 7 cells out: sea
        assert_eq!(grid.top(9, 32), 1);
    }

    #[test]
    fn test_aim_starts_on_opponent_ground() {
        let config = GameConfig::planar();
        let grid = generate_terrain(&config);
        assert_eq!(aim_start(&grid, &config, Player::One), GridPos::new(40, 0, 10));
        assert_eq!(aim_start(&grid, &config, Player::Two), GridPos::new(9, 0, 10));
    }

    #[test]
    fn test_projection() {
        let anchor = GridPos::new(10, 0, 20);
        assert_eq!(project(Dimensionality::Planar, anchor, (1, -1)), GridPos::new(11, 0, 21));

        let anchor = GridPos::new(10, 25, 20);
        assert_eq!(project(Dimensionality::Spatial, anchor, (1, -1)), GridPos::new(11, 24, 20));
    }

    #[test]
    fn test_cannon_and_aim_sites() {
        let config = GameConfig::planar();
        let grid = generate_terrain(&config);

        assert_eq!(cannon_site(&grid, &config, Player::One), GridPos::new(9, 0, 11));
        assert_eq!(aim_start(&grid, &config, Player::One), GridPos::new(40, 0, 10));
        assert_eq!(aim_start(&grid, &config, Player::Two), GridPos::new(9, 0, 10));
        assert_eq!(piece_spawn(&config, Player::Two), GridPos::new(40, 0, 44));
    }
}
