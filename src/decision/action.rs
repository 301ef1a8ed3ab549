//! Action categories a combatant can choose between
//!
//! The set is closed. Declaration order doubles as the deterministic
//! tie-break order for weighted selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    NormalAttack,
    StrongAttack,
    Approach,
    KeepDistance,
    Evade,
    Step,
    Special,
}

impl ActionCategory {
    /// Number of categories; every bias table holds exactly this many weights
    pub const COUNT: usize = 7;

    /// All categories in declaration order
    pub const ALL: [ActionCategory; Self::COUNT] = [
        ActionCategory::NormalAttack,
        ActionCategory::StrongAttack,
        ActionCategory::Approach,
        ActionCategory::KeepDistance,
        ActionCategory::Evade,
        ActionCategory::Step,
        ActionCategory::Special,
    ];

    /// Categories that spend ammunition/energy on the target
    pub const ATTACKS: [ActionCategory; 3] = [
        ActionCategory::NormalAttack,
        ActionCategory::StrongAttack,
        ActionCategory::Special,
    ];

    /// Categories that move the combatant out of harm's way
    pub const EVASIVE: [ActionCategory; 2] = [ActionCategory::Evade, ActionCategory::Step];

    /// Slot of this category inside a bias table
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_attack(self) -> bool {
        Self::ATTACKS.contains(&self)
    }

    pub fn is_evasive(self) -> bool {
        Self::EVASIVE.contains(&self)
    }

    /// Configuration-file name of this category
    pub fn name(self) -> &'static str {
        match self {
            ActionCategory::NormalAttack => "normal_attack",
            ActionCategory::StrongAttack => "strong_attack",
            ActionCategory::Approach => "approach",
            ActionCategory::KeepDistance => "keep_distance",
            ActionCategory::Evade => "evade",
            ActionCategory::Step => "step",
            ActionCategory::Special => "special",
        }
    }

    /// Parse a category from its snake_case or PascalCase name
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "normal_attack" | "NormalAttack" => Some(ActionCategory::NormalAttack),
            "strong_attack" | "StrongAttack" => Some(ActionCategory::StrongAttack),
            "approach" | "Approach" => Some(ActionCategory::Approach),
            "keep_distance" | "KeepDistance" => Some(ActionCategory::KeepDistance),
            "evade" | "Evade" => Some(ActionCategory::Evade),
            "step" | "Step" => Some(ActionCategory::Step),
            "special" | "Special" => Some(ActionCategory::Special),
            _ => None,
        }
    }
}

impl FromStr for ActionCategory {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| EngineError::UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
