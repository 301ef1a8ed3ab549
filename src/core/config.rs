//! Engine configuration with documented constants
//!
//! Every tunable number the decision loop uses lives here so that balance
//! can change without touching code. `EngineConfig::default()` matches the
//! shipped `data/engine.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};
use crate::decision::action::ActionCategory;
use crate::decision::bias::BiasTable;

/// Thresholds and bonuses for the situational rules
///
/// Each rule fires independently; bonuses are added to the raw weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SituationalThresholds {
    /// Threat level (0.0 - 1.0) above which the combatant wants out
    pub high_threat: f32,
    /// Added to Evade when threat is high
    pub threat_evade_bonus: f32,
    /// Added to Step when threat is high
    pub threat_step_bonus: f32,

    /// Energy below which strong attacks are discouraged
    pub low_energy: f32,
    /// Subtracted from StrongAttack when energy is low
    pub low_energy_strong_penalty: f32,

    /// Heat above which the weapon is close to overheating
    pub overheat: f32,
    /// Subtracted from every attack-type category when overheated
    pub overheat_attack_penalty: f32,
    /// Added to Evade when overheated
    pub overheat_evade_bonus: f32,

    /// HP percentage (0 - 100) below which the combatant backs off
    pub low_hp: f32,
    /// Added to KeepDistance when HP is low
    pub low_hp_keep_distance_bonus: f32,

    /// Special gauge value at which the special move is charged
    pub special_ready: f32,
    /// Added to Special when the gauge is full
    pub special_ready_bonus: f32,
}

impl Default for SituationalThresholds {
    fn default() -> Self {
        Self {
            high_threat: 0.7,
            threat_evade_bonus: 40.0,
            threat_step_bonus: 15.0,
            low_energy: 20.0,
            low_energy_strong_penalty: 30.0,
            overheat: 70.0,
            overheat_attack_penalty: 20.0,
            overheat_evade_bonus: 20.0,
            low_hp: 30.0,
            low_hp_keep_distance_bonus: 20.0,
            special_ready: 100.0,
            special_ready_bonus: 15.0,
        }
    }
}

/// Strength of each personality slider's influence
///
/// Multiplicative terms are scaled by the slider's normalized value, so a
/// slider at 1.0 applies the full coefficient and a slider at 0.0 none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulationConfig {
    /// Attack multiplier gain from aggressiveness: ×(1 + gain·a)
    pub aggressive_attack_gain: f32,
    /// Evade multiplier loss from aggressiveness: ×(1 - loss·a)
    pub aggressive_evade_loss: f32,
    /// Evade multiplier gain from prudence: ×(1 + gain·p)
    pub prudent_evade_gain: f32,
    /// Attack multiplier loss from prudence: ×(1 - loss·p)
    pub prudent_attack_loss: f32,
    /// Flat KeepDistance bonus from skittishness: +bonus·s
    pub skittish_keep_distance_bonus: f32,
    /// Flat Special penalty from skittishness: -penalty·s
    pub skittish_special_penalty: f32,
}

impl Default for ModulationConfig {
    fn default() -> Self {
        Self {
            aggressive_attack_gain: 0.3,
            aggressive_evade_loss: 0.3,
            prudent_evade_gain: 0.3,
            prudent_attack_loss: 0.2,
            skittish_keep_distance_bonus: 20.0,
            skittish_special_penalty: 15.0,
        }
    }
}

/// How battle outcomes perturb personality sliders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Aggressiveness gained by winning without taking more than dealt
    pub win_aggressiveness_step: f32,
    /// Damage taken above which a win still teaches caution
    pub high_damage_threshold: f32,
    /// Prudence gained by a costly win
    pub win_prudence_step: f32,
    /// Skittishness gained by losing
    pub loss_skittishness_step: f32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            win_aggressiveness_step: 0.05,
            high_damage_threshold: 50.0,
            win_prudence_step: 0.05,
            loss_skittishness_step: 0.10,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // === WEIGHTS ===
    /// Starting weight of every category before any bias is applied
    pub base_weights: BiasTable,

    /// Directive token (lowercase) -> bias added while that directive is active
    pub order_biases: AHashMap<String, BiasTable>,

    // === TIMING ===
    /// How often each combatant samples its sensors and decides
    pub sampling_interval: Duration,

    /// Reaction delay at zero synchronization
    pub base_delay: Duration,

    /// Half-width of the uniform jitter added to every delay (seconds)
    pub jitter_secs: f32,

    /// Floor for the computed delay (seconds)
    pub min_delay_secs: f32,

    /// Synchronization is clamped to this before reducing the delay
    ///
    /// Below 1.0 a perfectly synchronized combatant still hesitates a little.
    pub max_sync: f32,

    // === PERSONALITY ===
    /// Fixed total the three personality sliders always sum to
    pub slider_budget: f32,

    pub thresholds: SituationalThresholds,
    pub modulation: ModulationConfig,
    pub progression: ProgressionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_weights: BiasTable::from_pairs(&[
                (ActionCategory::NormalAttack, 25.0),
                (ActionCategory::StrongAttack, 10.0),
                (ActionCategory::Approach, 20.0),
                (ActionCategory::KeepDistance, 20.0),
                (ActionCategory::Evade, 15.0),
                (ActionCategory::Step, 5.0),
                (ActionCategory::Special, 5.0),
            ]),
            order_biases: default_order_biases(),
            sampling_interval: Duration::from_millis(200),
            base_delay: Duration::from_millis(350),
            jitter_secs: 0.08,
            min_delay_secs: 0.0,
            max_sync: 0.9,
            slider_budget: 1.0,
            thresholds: SituationalThresholds::default(),
            modulation: ModulationConfig::default(),
            progression: ProgressionConfig::default(),
        }
    }
}

/// Directive vocabulary shipped with the game
fn default_order_biases() -> AHashMap<String, BiasTable> {
    use ActionCategory::*;

    let entries: [(&str, &[(ActionCategory, f32)]); 8] = [
        ("all-out", &[(NormalAttack, 40.0), (StrongAttack, 40.0)]),
        ("hold", &[(KeepDistance, 40.0)]),
        ("conserve", &[(Special, -100.0)]),
        (
            "aggressive",
            &[(NormalAttack, 25.0), (StrongAttack, 35.0), (Approach, 15.0)],
        ),
        (
            "defensive",
            &[(Evade, 30.0), (KeepDistance, 25.0), (Step, 20.0)],
        ),
        ("focus", &[(NormalAttack, 10.0), (StrongAttack, 10.0)]),
        ("special", &[(Special, 45.0)]),
        ("balanced", &[]),
    ];

    entries
        .iter()
        .map(|(token, pairs)| (token.to_string(), BiasTable::from_pairs(pairs)))
        .collect()
}

/// On-disk shape of the configuration
///
/// Weights are read as name-keyed maps so that unknown or missing
/// categories surface as configuration errors instead of serde noise.
#[derive(Debug, Deserialize)]
struct EngineConfigFile {
    base_weights: BTreeMap<String, f32>,
    #[serde(default)]
    order_biases: BTreeMap<String, BTreeMap<String, f32>>,
    #[serde(default = "default_sampling_interval_ms")]
    sampling_interval_ms: u64,
    #[serde(default = "default_base_delay_ms")]
    base_delay_ms: u64,
    #[serde(default = "default_jitter_secs")]
    jitter_secs: f32,
    #[serde(default)]
    min_delay_secs: f32,
    #[serde(default = "default_max_sync")]
    max_sync: f32,
    #[serde(default = "default_slider_budget")]
    slider_budget: f32,
    #[serde(default)]
    thresholds: SituationalThresholds,
    #[serde(default)]
    modulation: ModulationConfig,
    #[serde(default)]
    progression: ProgressionConfig,
}

fn default_sampling_interval_ms() -> u64 {
    200
}

fn default_base_delay_ms() -> u64 {
    350
}

fn default_jitter_secs() -> f32 {
    0.08
}

fn default_max_sync() -> f32 {
    0.9
}

fn default_slider_budget() -> f32 {
    1.0
}

impl TryFrom<EngineConfigFile> for EngineConfig {
    type Error = EngineError;

    fn try_from(file: EngineConfigFile) -> Result<Self> {
        let base_weights = BiasTable::from_complete_map(&file.base_weights)?;

        let mut order_biases = AHashMap::with_capacity(file.order_biases.len());
        for (token, weights) in &file.order_biases {
            let bias = BiasTable::from_sparse_map(weights).map_err(|e| {
                EngineError::Configuration(format!("order bias '{}': {}", token, e))
            })?;
            order_biases.insert(normalize_token(token), bias);
        }

        Ok(Self {
            base_weights,
            order_biases,
            sampling_interval: Duration::from_millis(file.sampling_interval_ms),
            base_delay: Duration::from_millis(file.base_delay_ms),
            jitter_secs: file.jitter_secs,
            min_delay_secs: file.min_delay_secs,
            max_sync: file.max_sync,
            slider_budget: file.slider_budget,
            thresholds: file.thresholds,
            modulation: file.modulation,
            progression: file.progression,
        })
    }
}

/// Canonical form of a directive token used as lookup key
pub fn normalize_token(token: &str) -> String {
    token.trim().to_lowercase()
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: EngineConfigFile = toml::from_str(contents)?;
        let config = Self::try_from(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(
            path = %path.display(),
            directives = config.order_biases.len(),
            "Loaded engine config"
        );
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.base_weights.iter().any(|(_, w)| !w.is_finite()) {
            return Err(EngineError::Configuration(
                "base_weights must be finite".into(),
            ));
        }

        for (token, bias) in &self.order_biases {
            if bias.iter().any(|(_, w)| !w.is_finite()) {
                return Err(EngineError::Configuration(format!(
                    "order bias '{}' must be finite",
                    token
                )));
            }
        }

        if self.sampling_interval.is_zero() {
            return Err(EngineError::Configuration(
                "sampling_interval must be positive".into(),
            ));
        }

        // Duration::from_secs_f32 panics on values it cannot represent
        for (name, value) in [
            ("jitter_secs", self.jitter_secs),
            ("min_delay_secs", self.min_delay_secs),
        ] {
            if !(0.0..=MAX_DELAY_SECS).contains(&value) {
                return Err(EngineError::Configuration(format!(
                    "{} ({}) must be within [0, {}]",
                    name, value, MAX_DELAY_SECS
                )));
            }
        }

        if self.base_delay.as_secs_f32() > MAX_DELAY_SECS {
            return Err(EngineError::Configuration(format!(
                "base_delay must not exceed {}s",
                MAX_DELAY_SECS
            )));
        }

        if !(0.0..=1.0).contains(&self.max_sync) {
            return Err(EngineError::Configuration(format!(
                "max_sync ({}) must be within [0, 1]",
                self.max_sync
            )));
        }

        // Sliders live in [0, 1] each, so three of them can never exceed 3
        if !(self.slider_budget > 0.0 && self.slider_budget <= 3.0) {
            return Err(EngineError::Configuration(format!(
                "slider_budget ({}) must be within (0, 3]",
                self.slider_budget
            )));
        }

        let t = &self.thresholds;
        if !(0.0..=1.0).contains(&t.high_threat) {
            return Err(EngineError::Configuration(format!(
                "high_threat ({}) must be within [0, 1]",
                t.high_threat
            )));
        }
        require_finite(
            "thresholds",
            &[
                ("threat_evade_bonus", t.threat_evade_bonus),
                ("threat_step_bonus", t.threat_step_bonus),
                ("low_energy", t.low_energy),
                ("low_energy_strong_penalty", t.low_energy_strong_penalty),
                ("overheat", t.overheat),
                ("overheat_attack_penalty", t.overheat_attack_penalty),
                ("overheat_evade_bonus", t.overheat_evade_bonus),
                ("low_hp", t.low_hp),
                ("low_hp_keep_distance_bonus", t.low_hp_keep_distance_bonus),
                ("special_ready", t.special_ready),
                ("special_ready_bonus", t.special_ready_bonus),
            ],
        )?;

        let m = &self.modulation;
        require_finite(
            "modulation",
            &[
                ("aggressive_attack_gain", m.aggressive_attack_gain),
                ("prudent_evade_gain", m.prudent_evade_gain),
                ("skittish_keep_distance_bonus", m.skittish_keep_distance_bonus),
                ("skittish_special_penalty", m.skittish_special_penalty),
            ],
        )?;
        if m.aggressive_attack_gain < 0.0 || m.prudent_evade_gain < 0.0 {
            return Err(EngineError::Configuration(
                "modulation gain coefficients must be non-negative".into(),
            ));
        }
        if !(0.0..=1.0).contains(&m.aggressive_evade_loss)
            || !(0.0..=1.0).contains(&m.prudent_attack_loss)
        {
            return Err(EngineError::Configuration(
                "modulation loss coefficients must be within [0, 1]".into(),
            ));
        }

        let p = &self.progression;
        require_finite(
            "progression",
            &[
                ("win_aggressiveness_step", p.win_aggressiveness_step),
                ("high_damage_threshold", p.high_damage_threshold),
                ("win_prudence_step", p.win_prudence_step),
                ("loss_skittishness_step", p.loss_skittishness_step),
            ],
        )?;
        if p.win_aggressiveness_step < 0.0
            || p.win_prudence_step < 0.0
            || p.loss_skittishness_step < 0.0
        {
            return Err(EngineError::Configuration(
                "progression steps must be non-negative".into(),
            ));
        }

        Ok(())
    }
}

/// Longest delay component (seconds) a config may ask for
const MAX_DELAY_SECS: f32 = 60.0;

fn require_finite(section: &str, fields: &[(&str, f32)]) -> Result<()> {
    match fields.iter().find(|(_, value)| !value.is_finite()) {
        Some((name, value)) => Err(EngineError::Configuration(format!(
            "{}.{} ({}) must be finite",
            section, name, value
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[base_weights]
normal_attack = 50
strong_attack = 50
approach = 50
keep_distance = 50
evade = 50
step = 50
special = 50
"#;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sampling_interval, Duration::from_millis(200));
        assert!(config.order_biases.contains_key("all-out"));
    }

    #[test]
    fn test_minimal_toml_fills_defaults() {
        let config = EngineConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.base_weights, BiasTable::uniform(50.0));
        assert_eq!(config.thresholds, SituationalThresholds::default());
        assert!((config.jitter_secs - 0.08).abs() < 1e-6);
        assert!(config.order_biases.is_empty());
    }

    #[test]
    fn test_missing_base_weight_is_an_error() {
        let toml = r#"
[base_weights]
normal_attack = 50
"#;
        let err = EngineConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, EngineError::MissingCategory(_)));
    }

    #[test]
    fn test_malformed_order_bias_is_an_error() {
        let toml = format!(
            "{}\n[order_biases.all-out]\nnormal_atack = 40\n",
            MINIMAL
        );
        let err = EngineConfig::from_toml_str(&toml).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(ref msg) if msg.contains("all-out")));
    }

    #[test]
    fn test_order_bias_tokens_are_normalized() {
        let toml = format!("{}\n[order_biases.All-Out]\nnormal_attack = 40\n", MINIMAL);
        let config = EngineConfig::from_toml_str(&toml).unwrap();
        let bias = config.order_biases.get("all-out").unwrap();
        assert_eq!(bias[ActionCategory::NormalAttack], 40.0);
    }

    #[test]
    fn test_wrong_type_is_a_parse_error() {
        let toml = MINIMAL.replace("evade = 50", "evade = \"lots\"");
        assert!(matches!(
            EngineConfig::from_toml_str(&toml),
            Err(EngineError::TomlError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_sync_cap() {
        let mut config = EngineConfig::default();
        config.max_sync = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let mut config = EngineConfig::default();
        config.slider_budget = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_infinite_delay_floor_is_rejected() {
        let toml = format!("min_delay_secs = inf\n{}", MINIMAL);
        let err = EngineConfig::from_toml_str(&toml).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(ref msg) if msg.contains("min_delay_secs")));

        let toml = format!("jitter_secs = 1e30\n{}", MINIMAL);
        assert!(EngineConfig::from_toml_str(&toml).is_err());
    }

    #[test]
    fn test_nan_threshold_bonus_is_rejected() {
        let toml = format!("{}\n[thresholds]\nthreat_evade_bonus = nan\n", MINIMAL);
        let err = EngineConfig::from_toml_str(&toml).unwrap_err();
        assert!(
            matches!(err, EngineError::Configuration(ref msg) if msg.contains("threat_evade_bonus"))
        );
    }

    #[test]
    fn test_negative_gain_is_rejected() {
        let mut config = EngineConfig::default();
        config.modulation.prudent_evade_gain = -0.5;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.modulation.skittish_special_penalty = f32::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_progression_is_rejected() {
        let mut config = EngineConfig::default();
        config.progression.high_damage_threshold = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.order_biases
            .insert("broken".into(), BiasTable::uniform(f32::INFINITY));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = Path::new("data/engine.toml");
        if path.exists() {
            let config = EngineConfig::load(path).unwrap();
            let default = EngineConfig::default();
            assert_eq!(config.base_weights, default.base_weights);
            assert_eq!(config.base_delay, default.base_delay);
            assert_eq!(config.order_biases.len(), default.order_biases.len());
        }
    }
}
