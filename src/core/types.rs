//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatantId(pub Uuid);

impl CombatantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CombatantId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CombatantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sampling tick counter (one per decision cycle)
pub type Tick = u64;

/// Battle clock: time elapsed since the battle started
pub type GameTime = std::time::Duration;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combatant_id_uniqueness() {
        let a = CombatantId::new();
        let b = CombatantId::new();
        assert_ne!(a, b);
        assert_eq!(a, a);
    }

    #[test]
    fn test_combatant_id_hash() {
        use std::collections::HashMap;
        let id = CombatantId::new();
        let mut map: HashMap<CombatantId, &str> = HashMap::new();
        map.insert(id, "wingman");
        assert_eq!(map.get(&id), Some(&"wingman"));
    }
}
