//! Orders & Instinct - semi-autonomous combatant decision engine

pub mod core;
pub mod decision;
pub mod runtime;

pub use crate::core::{EngineConfig, EngineError, Result};
pub use crate::decision::{
    ActionCategory, Archetype, BattleOutcomeRecord, BiasTable, CombatantController,
    PersonalityProfile, SensorSnapshot,
};
