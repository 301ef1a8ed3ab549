//! Instinctive reactions to the current situation
//!
//! Rules are evaluated fresh every tick against instantaneous values. They
//! are independent and additive: a hot, drained, threatened combatant gets
//! every matching adjustment at once.

use crate::core::config::SituationalThresholds;
use crate::decision::action::ActionCategory;
use crate::decision::bias::BiasTable;
use crate::decision::sensor::SensorSnapshot;

#[derive(Debug, Clone, Default)]
pub struct SituationalBiasRule {
    thresholds: SituationalThresholds,
}

impl SituationalBiasRule {
    pub fn new(thresholds: SituationalThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &SituationalThresholds {
        &self.thresholds
    }

    /// Bias produced by a snapshot. Pure.
    pub fn evaluate(&self, snapshot: &SensorSnapshot) -> BiasTable {
        let t = &self.thresholds;
        let r = &snapshot.resources;
        let mut bias = BiasTable::new();

        if snapshot.threat_level > t.high_threat {
            bias.adjust(ActionCategory::Evade, t.threat_evade_bonus);
            bias.adjust(ActionCategory::Step, t.threat_step_bonus);
        }

        if r.energy < t.low_energy {
            bias.adjust(ActionCategory::StrongAttack, -t.low_energy_strong_penalty);
        }

        if r.heat > t.overheat {
            for category in ActionCategory::ATTACKS {
                bias.adjust(category, -t.overheat_attack_penalty);
            }
            bias.adjust(ActionCategory::Evade, t.overheat_evade_bonus);
        }

        if r.hp < t.low_hp {
            bias.adjust(ActionCategory::KeepDistance, t.low_hp_keep_distance_bonus);
        }

        if r.special_gauge >= t.special_ready {
            bias.adjust(ActionCategory::Special, t.special_ready_bonus);
        }

        bias
    }
}
