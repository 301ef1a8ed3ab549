//! Combatant personality: archetype label plus continuous trait sliders
//!
//! Sliders always sum to a fixed budget. The archetype is derived from
//! the dominant slider and is never set directly. Modulation blends all
//! three traits at once, each in proportion to its share of the budget,
//! so behavior shifts smoothly as the profile evolves between battles.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::config::ModulationConfig;
use crate::core::error::{EngineError, Result};
use crate::decision::action::ActionCategory;
use crate::decision::bias::BiasTable;

const SLIDER_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    Aggressive,
    Prudent,
    Skittish,
}

impl Archetype {
    /// Classification priority order, used to break ties
    pub const ALL: [Archetype; 3] = [Archetype::Aggressive, Archetype::Prudent, Archetype::Skittish];

    /// Archetype of the highest slider; ties go to the earlier archetype
    pub fn classify(sliders: &Sliders) -> Archetype {
        let Sliders {
            aggressiveness: a,
            prudence: p,
            skittishness: s,
        } = *sliders;

        if a >= p && a >= s {
            Archetype::Aggressive
        } else if p >= s {
            Archetype::Prudent
        } else {
            Archetype::Skittish
        }
    }

    /// Preferred order for deferred actions, most wanted first
    ///
    /// Used by the scheduler's ranked preemption policy to decide whether a
    /// fresh decision may replace one that is still waiting to execute.
    pub fn ordering_hint(self) -> [ActionCategory; ActionCategory::COUNT] {
        use ActionCategory::*;
        match self {
            Archetype::Aggressive => [
                StrongAttack,
                Special,
                NormalAttack,
                Approach,
                Step,
                Evade,
                KeepDistance,
            ],
            Archetype::Prudent => [
                Evade,
                Step,
                KeepDistance,
                NormalAttack,
                StrongAttack,
                Special,
                Approach,
            ],
            Archetype::Skittish => [
                KeepDistance,
                Evade,
                Step,
                NormalAttack,
                Approach,
                StrongAttack,
                Special,
            ],
        }
    }

    /// Sliders of the shipped preset for this archetype, before budgeting
    fn preset_sliders(self) -> Sliders {
        match self {
            Archetype::Aggressive => Sliders::new(0.6, 0.25, 0.15),
            Archetype::Prudent => Sliders::new(0.2, 0.6, 0.2),
            Archetype::Skittish => Sliders::new(0.15, 0.25, 0.6),
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Archetype::Aggressive => "Aggressive",
            Archetype::Prudent => "Prudent",
            Archetype::Skittish => "Skittish",
        };
        f.write_str(name)
    }
}

/// Trait sliders, each within [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sliders {
    pub aggressiveness: f32,
    pub prudence: f32,
    pub skittishness: f32,
}

impl Sliders {
    pub fn new(aggressiveness: f32, prudence: f32, skittishness: f32) -> Self {
        Self {
            aggressiveness,
            prudence,
            skittishness,
        }
    }

    pub fn sum(&self) -> f32 {
        self.aggressiveness + self.prudence + self.skittishness
    }

    fn to_array(self) -> [f32; 3] {
        [self.aggressiveness, self.prudence, self.skittishness]
    }

    fn from_array(values: [f32; 3]) -> Self {
        Self::new(values[0], values[1], values[2])
    }

    /// Each slider divided by `budget`
    pub fn normalized(&self, budget: f32) -> Sliders {
        Sliders::new(
            self.aggressiveness / budget,
            self.prudence / budget,
            self.skittishness / budget,
        )
    }
}

/// Rescale `values` so they sum to `target` while each stays within [0, 1]
///
/// Sliders pinned at a bound are held fixed and the remainder is spread over
/// the others, so the budget is met whenever it is reachable (0 < target <= 3).
fn renormalize(values: [f32; 3], target: f32) -> [f32; 3] {
    let mut v = values.map(|x| if x.is_finite() { x.clamp(0.0, 1.0) } else { 0.0 });

    for _ in 0..4 {
        let sum: f32 = v.iter().sum();
        if (sum - target).abs() <= SLIDER_EPSILON {
            break;
        }

        let growing = target > sum;
        let free: Vec<usize> = (0..3)
            .filter(|&i| if growing { v[i] < 1.0 } else { v[i] > 0.0 })
            .collect();
        if free.is_empty() {
            break;
        }

        let free_sum: f32 = free.iter().map(|&i| v[i]).sum();
        let fixed_sum = sum - free_sum;

        if free_sum <= SLIDER_EPSILON {
            let share = (target - fixed_sum) / free.len() as f32;
            for &i in &free {
                v[i] = share.clamp(0.0, 1.0);
            }
        } else {
            let factor = (target - fixed_sum) / free_sum;
            for &i in &free {
                v[i] = (v[i] * factor).clamp(0.0, 1.0);
            }
        }
    }

    v
}

/// A combatant's persistent personality
///
/// Deserializing re-runs `PersonalityProfile::new`, so a saved profile is
/// clamped onto its budget and reclassified rather than trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SavedProfile")]
pub struct PersonalityProfile {
    pub name: String,
    archetype: Archetype,
    sliders: Sliders,
    budget: f32,
}

impl PersonalityProfile {
    /// Create a profile, rescaling the sliders onto `budget`
    pub fn new(name: impl Into<String>, sliders: Sliders, budget: f32) -> Result<Self> {
        let values = sliders.to_array();
        if values.iter().any(|x| !x.is_finite() || *x < 0.0 || *x > 1.0) {
            return Err(EngineError::Configuration(format!(
                "personality sliders must be within [0, 1], got {:?}",
                sliders
            )));
        }
        if !(budget > 0.0 && budget <= 3.0) {
            return Err(EngineError::Configuration(format!(
                "slider budget ({}) must be within (0, 3]",
                budget
            )));
        }

        let sliders = Sliders::from_array(renormalize(values, budget));
        Ok(Self {
            name: name.into(),
            archetype: Archetype::classify(&sliders),
            sliders,
            budget,
        })
    }

    /// Shipped preset for an archetype
    pub fn preset(archetype: Archetype, budget: f32) -> Result<Self> {
        let name = archetype.to_string().to_lowercase();
        Self::new(name, archetype.preset_sliders(), budget)
    }

    /// Equal sliders; classifies as Aggressive by tie priority
    pub fn balanced(budget: f32) -> Result<Self> {
        Self::new("balanced", Sliders::new(1.0, 1.0, 1.0), budget)
    }

    pub fn archetype(&self) -> Archetype {
        self.archetype
    }

    pub fn sliders(&self) -> Sliders {
        self.sliders
    }

    pub fn budget(&self) -> f32 {
        self.budget
    }

    /// Sliders as shares of the budget
    pub fn normalized(&self) -> Sliders {
        self.sliders.normalized(self.budget)
    }

    /// Fuzzy archetype membership, in classification order
    pub fn archetype_weights(&self) -> [(Archetype, f32); 3] {
        let n = self.normalized();
        [
            (Archetype::Aggressive, n.aggressiveness),
            (Archetype::Prudent, n.prudence),
            (Archetype::Skittish, n.skittishness),
        ]
    }

    /// Preferred order for deferred actions under the current archetype
    pub fn ordering_hint(&self) -> [ActionCategory; ActionCategory::COUNT] {
        self.archetype.ordering_hint()
    }

    /// Apply the blended personality adjustment to a raw bias table
    ///
    /// Multiplicative terms first, then the flat skittish terms. The result
    /// may contain negative weights; the selector floors them.
    pub fn modulate(&self, bias: &BiasTable, coefficients: &ModulationConfig) -> BiasTable {
        let n = self.normalized();
        let c = coefficients;

        let attack_factor = (1.0 + c.aggressive_attack_gain * n.aggressiveness)
            * (1.0 - c.prudent_attack_loss * n.prudence);
        let evade_factor = (1.0 - c.aggressive_evade_loss * n.aggressiveness)
            * (1.0 + c.prudent_evade_gain * n.prudence);

        let mut out = *bias;
        for category in ActionCategory::ATTACKS {
            out.multiply(category, attack_factor);
        }
        for category in ActionCategory::EVASIVE {
            out.multiply(category, evade_factor);
        }

        out.adjust(
            ActionCategory::KeepDistance,
            c.skittish_keep_distance_bonus * n.skittishness,
        );
        out.adjust(
            ActionCategory::Special,
            -c.skittish_special_penalty * n.skittishness,
        );

        out
    }

    /// Add slider deltas, restore the budget and reclassify
    ///
    /// Returns the archetype before the change.
    pub(crate) fn apply_deltas(&mut self, deltas: Sliders) -> Archetype {
        let previous = self.archetype;

        let raw = [
            self.sliders.aggressiveness + deltas.aggressiveness,
            self.sliders.prudence + deltas.prudence,
            self.sliders.skittishness + deltas.skittishness,
        ];
        self.sliders = Sliders::from_array(renormalize(raw, self.budget));
        self.archetype = Archetype::classify(&self.sliders);
        previous
    }
}

/// Persisted shape of a profile; the archetype is derived, never read
#[derive(Debug, Deserialize)]
struct SavedProfile {
    name: String,
    sliders: Sliders,
    budget: f32,
}

impl TryFrom<SavedProfile> for PersonalityProfile {
    type Error = EngineError;

    fn try_from(saved: SavedProfile) -> Result<Self> {
        PersonalityProfile::new(saved.name, saved.sliders, saved.budget)
    }
}

/// On-disk personality preset
#[derive(Debug, Deserialize)]
struct PersonalityFile {
    aggressiveness: f32,
    prudence: f32,
    skittishness: f32,
}

/// Parse a personality preset from TOML text
pub fn parse_personality(name: &str, contents: &str, budget: f32) -> Result<PersonalityProfile> {
    let file: PersonalityFile = toml::from_str(contents)?;
    PersonalityProfile::new(
        name,
        Sliders::new(file.aggressiveness, file.prudence, file.skittishness),
        budget,
    )
}

/// Load personality from TOML file
///
/// Loads from `{dir}/{name}.toml`
pub fn load_personality(dir: &Path, name: &str, budget: f32) -> Result<PersonalityProfile> {
    let path = personality_path(dir, name);
    let contents = fs::read_to_string(&path)?;
    parse_personality(name, &contents, budget)
}

fn personality_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.toml", name))
}
