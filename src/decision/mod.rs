//! Per-tick combatant decision pipeline
//!
//! sensors -> situational + order bias -> personality modulation ->
//! weighted draw -> delayed execution, with personality evolving between
//! battles.

pub mod action;
pub mod bias;
pub mod controller;
pub mod orders;
pub mod personality;
pub mod progression;
pub mod scheduler;
pub mod selector;
pub mod sensor;
pub mod situational;

pub use action::ActionCategory;
pub use bias::BiasTable;
pub use controller::{CombatantController, TickReport};
pub use orders::{ActiveOrder, OrderBiasResolver};
pub use personality::{load_personality, parse_personality, Archetype, PersonalityProfile, Sliders};
pub use progression::{BattleOutcomeRecord, ProgressionReport, ProgressionTracker};
pub use scheduler::{
    ActionSink, Decision, DelayModel, ExecutionScheduler, FnSink, PreemptionPolicy,
    RecordingSink, ScheduleOutcome,
};
pub use selector::{distribution, draw_with, ranked, ActionSelector, CategoricalSampler, FixedDraw, SeededSampler};
pub use sensor::{Resources, SensorSnapshot, TargetClass};
pub use situational::SituationalBiasRule;
