//! Per-category weight vectors
//!
//! A `BiasTable` always carries one weight for every `ActionCategory`.
//! Backing it with a fixed array makes a partially populated table
//! unrepresentable; every arithmetic operation is elementwise and total.

use std::collections::BTreeMap;
use std::ops::{Add, AddAssign, Index, IndexMut, Mul};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::core::error::{EngineError, Result};
use crate::decision::action::ActionCategory;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BiasTable {
    weights: [f32; ActionCategory::COUNT],
}

impl BiasTable {
    /// All-zero table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the same weight in every category
    pub fn uniform(weight: f32) -> Self {
        Self {
            weights: [weight; ActionCategory::COUNT],
        }
    }

    /// Zero table with the listed entries set
    pub fn from_pairs(pairs: &[(ActionCategory, f32)]) -> Self {
        let mut table = Self::new();
        for &(category, weight) in pairs {
            table.set(category, weight);
        }
        table
    }

    /// Build from a name-keyed map that must name every category
    ///
    /// Used for starting weights, where a missing entry is a configuration
    /// mistake rather than an implicit zero.
    pub fn from_complete_map(map: &BTreeMap<String, f32>) -> Result<Self> {
        let table = Self::from_sparse_map(map)?;
        for category in ActionCategory::ALL {
            let named = map
                .keys()
                .any(|key| ActionCategory::parse(key) == Some(category));
            if !named {
                return Err(EngineError::MissingCategory(category.name().to_string()));
            }
        }
        Ok(table)
    }

    /// Build from a name-keyed map; unnamed categories default to 0
    pub fn from_sparse_map(map: &BTreeMap<String, f32>) -> Result<Self> {
        let mut table = Self::new();
        for (key, &weight) in map {
            let category: ActionCategory = key.parse()?;
            if !weight.is_finite() {
                return Err(EngineError::Configuration(format!(
                    "weight for {} is not finite",
                    category
                )));
            }
            table.set(category, weight);
        }
        Ok(table)
    }

    pub fn get(&self, category: ActionCategory) -> f32 {
        self.weights[category.index()]
    }

    pub fn set(&mut self, category: ActionCategory, weight: f32) {
        self.weights[category.index()] = weight;
    }

    /// Add `delta` to one category
    pub fn adjust(&mut self, category: ActionCategory, delta: f32) {
        self.weights[category.index()] += delta;
    }

    /// Multiply one category by `factor`
    pub fn multiply(&mut self, category: ActionCategory, factor: f32) {
        self.weights[category.index()] *= factor;
    }

    /// Elementwise sum
    pub fn add(&self, other: &BiasTable) -> BiasTable {
        let mut out = *self;
        for (w, o) in out.weights.iter_mut().zip(other.weights.iter()) {
            *w += *o;
        }
        out
    }

    /// Elementwise scalar multiply
    pub fn scale(&self, factor: f32) -> BiasTable {
        let mut out = *self;
        for w in out.weights.iter_mut() {
            *w *= factor;
        }
        out
    }

    /// Clamp every weight into `[min, max]`
    pub fn clamp(&self, min: f32, max: f32) -> BiasTable {
        let mut out = *self;
        for w in out.weights.iter_mut() {
            *w = w.clamp(min, max);
        }
        out
    }

    /// Floor every weight at zero
    pub fn clamp_non_negative(&self) -> BiasTable {
        self.clamp(0.0, f32::INFINITY)
    }

    /// Sum of all weights
    pub fn total(&self) -> f32 {
        self.weights.iter().sum()
    }

    pub fn is_zero(&self) -> bool {
        self.weights.iter().all(|w| *w == 0.0)
    }

    /// Weights in category declaration order
    pub fn as_array(&self) -> &[f32; ActionCategory::COUNT] {
        &self.weights
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActionCategory, f32)> + '_ {
        ActionCategory::ALL
            .iter()
            .map(move |&category| (category, self.get(category)))
    }
}

impl Add for BiasTable {
    type Output = BiasTable;
    fn add(self, rhs: BiasTable) -> BiasTable {
        BiasTable::add(&self, &rhs)
    }
}

impl AddAssign for BiasTable {
    fn add_assign(&mut self, rhs: BiasTable) {
        *self = BiasTable::add(self, &rhs);
    }
}

impl Mul<f32> for BiasTable {
    type Output = BiasTable;
    fn mul(self, rhs: f32) -> BiasTable {
        self.scale(rhs)
    }
}

impl Index<ActionCategory> for BiasTable {
    type Output = f32;
    fn index(&self, category: ActionCategory) -> &f32 {
        &self.weights[category.index()]
    }
}

impl IndexMut<ActionCategory> for BiasTable {
    fn index_mut(&mut self, category: ActionCategory) -> &mut f32 {
        &mut self.weights[category.index()]
    }
}

impl Serialize for BiasTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(ActionCategory::COUNT))?;
        for (category, weight) in self.iter() {
            map.serialize_entry(category.name(), &weight)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(pairs: &[(&str, f32)]) -> BTreeMap<String, f32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_new_table_is_zero_everywhere() {
        let table = BiasTable::new();
        assert!(table.is_zero());
        assert_eq!(table.iter().count(), ActionCategory::COUNT);
    }

    #[test]
    fn test_add_and_scale_are_elementwise() {
        let a = BiasTable::from_pairs(&[(ActionCategory::Evade, 10.0), (ActionCategory::Step, -4.0)]);
        let b = BiasTable::uniform(2.0);

        let sum = a + b;
        assert_eq!(sum[ActionCategory::Evade], 12.0);
        assert_eq!(sum[ActionCategory::Step], -2.0);
        assert_eq!(sum[ActionCategory::Approach], 2.0);

        let scaled = sum * 0.5;
        assert_eq!(scaled[ActionCategory::Evade], 6.0);
        assert_eq!(scaled[ActionCategory::Step], -1.0);
    }

    #[test]
    fn test_clamp_non_negative_floors_only_negatives() {
        let table = BiasTable::from_pairs(&[
            (ActionCategory::Special, -15.0),
            (ActionCategory::Approach, 7.5),
        ]);
        let clamped = table.clamp_non_negative();
        assert_eq!(clamped[ActionCategory::Special], 0.0);
        assert_eq!(clamped[ActionCategory::Approach], 7.5);
        assert!(clamped.iter().all(|(_, w)| w >= 0.0));
    }

    #[test]
    fn test_total() {
        let table = BiasTable::uniform(50.0);
        assert!((table.total() - 350.0).abs() < 1e-4);
    }

    #[test]
    fn test_complete_map_requires_every_category() {
        let mut map = names(&[
            ("normal_attack", 25.0),
            ("strong_attack", 10.0),
            ("approach", 20.0),
            ("keep_distance", 20.0),
            ("evade", 15.0),
            ("step", 5.0),
        ]);
        let err = BiasTable::from_complete_map(&map).unwrap_err();
        assert!(matches!(err, EngineError::MissingCategory(ref c) if c == "special"));

        map.insert("special".to_string(), 5.0);
        let table = BiasTable::from_complete_map(&map).unwrap();
        assert_eq!(table[ActionCategory::NormalAttack], 25.0);
        assert_eq!(table[ActionCategory::Special], 5.0);
    }

    #[test]
    fn test_sparse_map_rejects_unknown_names() {
        let map = names(&[("evade", 30.0), ("teleport", 99.0)]);
        assert!(matches!(
            BiasTable::from_sparse_map(&map),
            Err(EngineError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_sparse_map_defaults_missing_to_zero() {
        let map = names(&[("keep_distance", 40.0)]);
        let table = BiasTable::from_sparse_map(&map).unwrap();
        assert_eq!(table[ActionCategory::KeepDistance], 40.0);
        assert_eq!(table.total(), 40.0);
    }

    #[test]
    fn test_serializes_as_named_map() {
        let table = BiasTable::from_pairs(&[(ActionCategory::Evade, 3.0)]);
        let json = serde_json::to_value(table).unwrap();
        assert_eq!(json["evade"], 3.0);
        assert_eq!(json["special"], 0.0);
    }
}
