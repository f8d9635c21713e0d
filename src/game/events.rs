//! Simulation Events
//!
//! Informational events emitted by ticks and commands, drained with
//! `SimState::take_events()`. The renderer may ignore them; tests and the
//! demo binary use them to follow what happened.

use serde::{Serialize, Deserialize};

use crate::core::clock::Millis;
use crate::core::vec3::GridPos;
use crate::game::phase::PhaseKind;
use crate::game::state::Player;
use crate::game::terrain::Material;

/// Event payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEventData {
    /// Phase changed
    PhaseChanged {
        from: PhaseKind,
        to: PhaseKind,
    },

    /// A piece came to rest and became stone
    PieceLanded {
        player: Player,
        cells: Vec<GridPos>,
    },

    /// A piece went under water
    PieceSunk {
        player: Player,
        anchor: GridPos,
    },

    /// A cannon fired
    BombFired {
        player: Player,
        muzzle: GridPos,
        target: GridPos,
    },

    /// A bomb struck terrain
    BombHit {
        player: Player,
        pos: GridPos,
        material: Material,
    },

    /// A bomb left the board
    BombLost {
        player: Player,
    },

    /// A cannon dropped one cell
    CannonSank {
        player: Player,
        barrel: GridPos,
    },
}

/// A timestamped event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimEvent {
    /// Simulation time
    pub at: Millis,
    /// Payload
    pub data: SimEventData,
}

impl SimEvent {
    /// Create a new event.
    pub fn new(at: Millis, data: SimEventData) -> Self {
        Self { at, data }
    }

    /// Player the event concerns, if any.
    pub fn player(&self) -> Option<Player> {
        match &self.data {
            SimEventData::PhaseChanged { .. } => None,
            SimEventData::PieceLanded { player, .. }
            | SimEventData::PieceSunk { player, .. }
            | SimEventData::BombFired { player, .. }
            | SimEventData::BombHit { player, .. }
            | SimEventData::BombLost { player }
            | SimEventData::CannonSank { player, .. } => Some(*player),
        }
    }

    /// Create phase changed event.
    pub fn phase_changed(at: Millis, from: PhaseKind, to: PhaseKind) -> Self {
        Self::new(at, SimEventData::PhaseChanged { from, to })
    }

    /// Create bomb hit event.
    pub fn bomb_hit(at: Millis, player: Player, pos: GridPos, material: Material) -> Self {
        Self::new(at, SimEventData::BombHit { player, pos, material })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_player() {
        let e = SimEvent::bomb_hit(10, Player::Two, GridPos::new(1, 0, 9), Material::Stone1);
        assert_eq!(e.player(), Some(Player::Two));

        let p = SimEvent::phase_changed(10, PhaseKind::Build, PhaseKind::CollapseAfterBuild);
        assert_eq!(p.player(), None);
    }

    #[test]
    fn test_event_serializes() {
        let e = SimEvent::new(5, SimEventData::BombLost { player: Player::One });
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("BombLost"));
    }
}
