//! Visual effect markers.
//!
//! Short-lived splash and explosion markers for the renderer. They carry no
//! simulation weight beyond their own expiry.

use serde::{Serialize, Deserialize};

use crate::core::clock::Millis;
use crate::core::vec3::GridPos;

/// Marker kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Bomb struck stone or land
    Explosion,
    /// Bomb or piece went into the sea
    Splash,
}

/// One marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    /// Kind
    pub kind: EffectKind,
    /// Cell
    pub pos: GridPos,
    /// Creation time
    pub created_at: Millis,
    /// Lifetime
    pub ttl_ms: Millis,
}

impl Effect {
    /// Marker created at `now`.
    pub fn new(kind: EffectKind, pos: GridPos, now: Millis, ttl_ms: Millis) -> Self {
        Self { kind, pos, created_at: now, ttl_ms }
    }

    /// Lifetime has run out at `now`.
    #[inline]
    pub fn expired(&self, now: Millis) -> bool {
        self.created_at.saturating_add(self.ttl_ms) <= now
    }
}

/// Drop expired markers. Returns true if any were removed.
pub fn expire(effects: &mut Vec<Effect>, now: Millis) -> bool {
    let before = effects.len();
    effects.retain(|e| !e.expired(now));
    effects.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundary() {
        let mut effects = vec![
            Effect::new(EffectKind::Explosion, GridPos::new(1, 0, 1), 1_000, 300),
            Effect::new(EffectKind::Splash, GridPos::new(2, 0, 1), 1_100, 300),
        ];

        assert!(!expire(&mut effects, 1_299));
        assert_eq!(effects.len(), 2);

        assert!(expire(&mut effects, 1_300));
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].kind, EffectKind::Splash);

        assert!(expire(&mut effects, 5_000));
        assert!(effects.is_empty());
    }
}
