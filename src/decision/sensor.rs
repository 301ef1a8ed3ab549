//! Per-tick world readout as seen by one combatant
//!
//! Produced by the world-state collaborator every sampling tick, consumed
//! by one decision cycle and then dropped.

use serde::{Deserialize, Serialize};

/// Priority class of the nearest relevant target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetClass {
    Mob,
    Elite,
    Boss,
}

impl TargetClass {
    /// Canonical target score for this class (Boss > Elite > Mob)
    pub fn score(self) -> f32 {
        match self {
            TargetClass::Mob => 1.0,
            TargetClass::Elite => 2.0,
            TargetClass::Boss => 3.0,
        }
    }
}

/// Resource gauges of the combatant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    /// Energy, consumed by strong attacks
    pub energy: f32,
    /// Weapon heat; high values suppress attacks
    pub heat: f32,
    /// Special gauge (0 - 100)
    pub special_gauge: f32,
    /// Hit points as a percentage of maximum (0 - 100)
    pub hp: f32,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            energy: 100.0,
            heat: 0.0,
            special_gauge: 0.0,
            hp: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    /// Incoming danger (0.0 - 1.0)
    pub threat_level: f32,
    /// Priority of the nearest relevant target (>= 0)
    pub target_score: f32,
    /// Distance to that target (>= 0)
    pub distance: f32,
    pub resources: Resources,
    /// Player/AI synchronization (0.0 - 1.0); shortens reaction delay
    pub sync: f32,
    /// Whether the dodge-step is off cooldown
    pub step_ready: bool,
}

impl Default for SensorSnapshot {
    fn default() -> Self {
        Self {
            threat_level: 0.0,
            target_score: TargetClass::Mob.score(),
            distance: 0.0,
            resources: Resources::default(),
            sync: 0.0,
            step_ready: true,
        }
    }
}

impl SensorSnapshot {
    /// Calm snapshot: no threat, full resources
    pub fn calm() -> Self {
        Self::default()
    }

    pub fn with_threat(mut self, threat_level: f32) -> Self {
        self.threat_level = threat_level;
        self
    }

    pub fn with_target(mut self, class: TargetClass, distance: f32) -> Self {
        self.target_score = class.score();
        self.distance = distance;
        self
    }

    pub fn with_resources(mut self, resources: Resources) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_sync(mut self, sync: f32) -> Self {
        self.sync = sync;
        self
    }

    pub fn with_step_ready(mut self, step_ready: bool) -> Self {
        self.step_ready = step_ready;
        self
    }
}
