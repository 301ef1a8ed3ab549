//! Cross-battle personality evolution
//!
//! The only path by which a personality changes. Runs once per battle,
//! after the combatant's decision loop has stopped.

use serde::{Deserialize, Serialize};

use crate::core::config::ProgressionConfig;
use crate::decision::personality::{Archetype, PersonalityProfile, Sliders};

/// Result of one battle, supplied by the game at battle end
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BattleOutcomeRecord {
    pub won: bool,
    pub damage_dealt: f32,
    pub damage_taken: f32,
}

impl BattleOutcomeRecord {
    pub fn victory(damage_dealt: f32, damage_taken: f32) -> Self {
        Self {
            won: true,
            damage_dealt,
            damage_taken,
        }
    }

    pub fn defeat(damage_dealt: f32, damage_taken: f32) -> Self {
        Self {
            won: false,
            damage_dealt,
            damage_taken,
        }
    }
}

/// What a progression step did to a profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressionReport {
    pub before: Sliders,
    pub after: Sliders,
    pub previous_archetype: Archetype,
    pub archetype: Archetype,
}

impl ProgressionReport {
    pub fn archetype_changed(&self) -> bool {
        self.previous_archetype != self.archetype
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgressionTracker {
    config: ProgressionConfig,
}

impl ProgressionTracker {
    pub fn new(config: ProgressionConfig) -> Self {
        Self { config }
    }

    /// Slider increments earned by an outcome, before renormalization
    pub fn increments(&self, outcome: &BattleOutcomeRecord) -> Sliders {
        let c = &self.config;
        let mut deltas = Sliders::new(0.0, 0.0, 0.0);

        if outcome.won {
            if outcome.damage_dealt >= outcome.damage_taken {
                deltas.aggressiveness += c.win_aggressiveness_step;
            }
            if outcome.damage_taken > c.high_damage_threshold {
                deltas.prudence += c.win_prudence_step;
            }
        } else {
            deltas.skittishness += c.loss_skittishness_step;
        }

        deltas
    }

    /// Permanently apply an outcome to `profile`
    pub fn apply(
        &self,
        outcome: &BattleOutcomeRecord,
        profile: &mut PersonalityProfile,
    ) -> ProgressionReport {
        let before = profile.sliders();
        let deltas = self.increments(outcome);
        let previous_archetype = profile.apply_deltas(deltas);

        let report = ProgressionReport {
            before,
            after: profile.sliders(),
            previous_archetype,
            archetype: profile.archetype(),
        };

        if report.archetype_changed() {
            tracing::info!(
                profile = %profile.name,
                from = %previous_archetype,
                to = %report.archetype,
                "Personality archetype shifted"
            );
        } else {
            tracing::debug!(
                profile = %profile.name,
                aggressiveness = report.after.aggressiveness,
                prudence = report.after.prudence,
                skittishness = report.after.skittishness,
                "Personality updated"
            );
        }

        report
    }
}
