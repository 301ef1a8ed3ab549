//! Weighted action selection
//!
//! Bias sources are summed onto the base weights, modulated by personality
//! and floored at zero. The result is turned into a categorical
//! distribution and sampled with a single uniform draw, so the same weights
//! and the same draw always give the same category.

use ordered_float::OrderedFloat;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::config::ModulationConfig;
use crate::decision::action::ActionCategory;
use crate::decision::bias::BiasTable;
use crate::decision::personality::PersonalityProfile;

/// Strategy that picks one category from non-negative weights
pub trait CategoricalSampler: Send {
    fn sample(&mut self, weights: &BiasTable) -> ActionCategory;
}

/// Default sampler backed by a seeded ChaCha stream
#[derive(Debug, Clone)]
pub struct SeededSampler {
    rng: ChaCha8Rng,
}

impl SeededSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl CategoricalSampler for SeededSampler {
    fn sample(&mut self, weights: &BiasTable) -> ActionCategory {
        let u: f64 = self.rng.gen();
        draw_with(weights, u)
    }
}

/// Sampler that always uses the same draw value; for replays and tests
#[derive(Debug, Clone, Copy)]
pub struct FixedDraw(pub f64);

impl CategoricalSampler for FixedDraw {
    fn sample(&mut self, weights: &BiasTable) -> ActionCategory {
        draw_with(weights, self.0)
    }
}

/// Probability of each category, in declaration order
///
/// Negative weights count as zero. When nothing is left the distribution is
/// uniform over every category.
pub fn distribution(weights: &BiasTable) -> [f32; ActionCategory::COUNT] {
    let clamped = weights.clamp_non_negative();
    let total = clamped.total();

    if !(total > 0.0) || !total.is_finite() {
        return [1.0 / ActionCategory::COUNT as f32; ActionCategory::COUNT];
    }

    let mut probabilities = *clamped.as_array();
    for p in probabilities.iter_mut() {
        *p /= total;
    }
    probabilities
}

/// Pick the category whose cumulative mass first exceeds `u · Σw`
///
/// `u` is a uniform draw in [0, 1); values outside are clamped. Categories
/// are walked in declaration order, which is also the tie-break order.
pub fn draw_with(weights: &BiasTable, u: f64) -> ActionCategory {
    let u = if u.is_finite() { u.clamp(0.0, 1.0) } else { 0.0 };
    let clamped = weights.clamp_non_negative();
    let total: f64 = clamped.iter().map(|(_, w)| w as f64).sum();

    if !(total > 0.0) || !total.is_finite() {
        let slot = ((u * ActionCategory::COUNT as f64) as usize).min(ActionCategory::COUNT - 1);
        return ActionCategory::ALL[slot];
    }

    let target = u * total;
    let mut cumulative = 0.0;
    let mut last_positive = ActionCategory::ALL[0];
    for (category, weight) in clamped.iter() {
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight as f64;
        last_positive = category;
        if target < cumulative {
            return category;
        }
    }

    // u == 1.0 or rounding at the top end
    last_positive
}

/// Categories sorted by probability, highest first; ties keep declaration order
pub fn ranked(weights: &BiasTable) -> Vec<(ActionCategory, f32)> {
    let probabilities = distribution(weights);
    let mut ranked: Vec<(ActionCategory, f32)> = ActionCategory::ALL
        .iter()
        .map(|&category| (category, probabilities[category.index()]))
        .collect();
    ranked.sort_by_key(|&(_, p)| std::cmp::Reverse(OrderedFloat(p)));
    ranked
}

/// Combines bias sources and draws the action for one tick
pub struct ActionSelector<S = SeededSampler> {
    base_weights: BiasTable,
    modulation: ModulationConfig,
    sampler: S,
}

impl ActionSelector<SeededSampler> {
    pub fn seeded(base_weights: BiasTable, modulation: ModulationConfig, seed: u64) -> Self {
        Self::new(base_weights, modulation, SeededSampler::new(seed))
    }
}

impl<S: CategoricalSampler> ActionSelector<S> {
    pub fn new(base_weights: BiasTable, modulation: ModulationConfig, sampler: S) -> Self {
        Self {
            base_weights,
            modulation,
            sampler,
        }
    }

    pub fn base_weights(&self) -> &BiasTable {
        &self.base_weights
    }

    /// Base + situational + order, before personality
    pub fn raw_weights(&self, situational: &BiasTable, order: &BiasTable) -> BiasTable {
        self.base_weights.add(situational).add(order)
    }

    /// Final non-negative weights for one tick
    pub fn combine(
        &self,
        situational: &BiasTable,
        order: &BiasTable,
        profile: &PersonalityProfile,
    ) -> BiasTable {
        let raw = self.raw_weights(situational, order);
        profile.modulate(&raw, &self.modulation).clamp_non_negative()
    }

    /// Draw one category from final weights
    pub fn select(&mut self, weights: &BiasTable) -> ActionCategory {
        self.sampler.sample(weights)
    }
}
