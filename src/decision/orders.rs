//! Player directives translated into bias tables
//!
//! The directive vocabulary is data: tokens and their tables come from the
//! engine configuration. Unknown tokens are not an error; they simply add
//! nothing.

use ahash::AHashMap;

use crate::core::config::normalize_token;
use crate::decision::bias::BiasTable;

#[derive(Debug, Clone, Default)]
pub struct OrderBiasResolver {
    table: AHashMap<String, BiasTable>,
}

impl OrderBiasResolver {
    /// Build a resolver; keys are normalized on the way in
    pub fn new(table: AHashMap<String, BiasTable>) -> Self {
        let table = table
            .into_iter()
            .map(|(token, bias)| (normalize_token(&token), bias))
            .collect();
        Self { table }
    }

    /// Register or replace one directive
    pub fn insert(&mut self, token: &str, bias: BiasTable) {
        self.table.insert(normalize_token(token), bias);
    }

    pub fn is_known(&self, token: &str) -> bool {
        self.table.contains_key(&normalize_token(token))
    }

    /// Bias for a directive token; unknown tokens resolve to the zero table
    pub fn resolve(&self, token: &str) -> BiasTable {
        match self.table.get(&normalize_token(token)) {
            Some(bias) => *bias,
            None => {
                tracing::debug!(token, "Unknown directive, applying no order bias");
                BiasTable::new()
            }
        }
    }

    /// Known directive tokens, sorted
    pub fn tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self.table.keys().map(String::as_str).collect();
        tokens.sort_unstable();
        tokens
    }
}

/// Order bias for the currently active directive
///
/// Resolved once when the directive changes and reused on every tick
/// until it changes again.
#[derive(Debug, Clone, Default)]
pub struct ActiveOrder {
    token: Option<String>,
    bias: BiasTable,
}

impl ActiveOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn bias(&self) -> &BiasTable {
        &self.bias
    }

    /// Switch to `token`, re-resolving only if it differs from the current one
    ///
    /// Returns true when the bias was recomputed.
    pub fn update(&mut self, resolver: &OrderBiasResolver, token: &str) -> bool {
        let token = normalize_token(token);
        if self.token.as_deref() == Some(token.as_str()) {
            return false;
        }
        self.bias = resolver.resolve(&token);
        tracing::debug!(directive = %token, "Directive changed");
        self.token = Some(token);
        true
    }

    /// Drop the active directive
    pub fn clear(&mut self) {
        self.token = None;
        self.bias = BiasTable::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::decision::action::ActionCategory;

    fn resolver() -> OrderBiasResolver {
        OrderBiasResolver::new(EngineConfig::default().order_biases)
    }

    #[test]
    fn test_known_directive() {
        let bias = resolver().resolve("all-out");
        assert_eq!(bias[ActionCategory::NormalAttack], 40.0);
        assert_eq!(bias[ActionCategory::StrongAttack], 40.0);
        assert_eq!(bias[ActionCategory::Evade], 0.0);
    }

    #[test]
    fn test_lookup_ignores_case_and_whitespace() {
        let bias = resolver().resolve("  HOLD ");
        assert_eq!(bias[ActionCategory::KeepDistance], 40.0);
    }

    #[test]
    fn test_unknown_directive_is_zero() {
        let resolver = resolver();
        assert!(!resolver.is_known("dance"));
        assert!(resolver.resolve("dance").is_zero());
    }

    #[test]
    fn test_insert_extends_vocabulary() {
        let mut resolver = OrderBiasResolver::default();
        resolver.insert("Kite", BiasTable::from_pairs(&[(ActionCategory::KeepDistance, 30.0)]));
        assert!(resolver.is_known("kite"));
        assert_eq!(resolver.tokens(), vec!["kite"]);
    }

    #[test]
    fn test_active_order_caches_until_change() {
        let resolver = resolver();
        let mut active = ActiveOrder::new();

        assert!(active.update(&resolver, "conserve"));
        assert_eq!(active.bias()[ActionCategory::Special], -100.0);
        assert!(!active.update(&resolver, "Conserve"));

        assert!(active.update(&resolver, "hold"));
        assert_eq!(active.token(), Some("hold"));
        assert_eq!(active.bias()[ActionCategory::Special], 0.0);

        active.clear();
        assert!(active.token().is_none());
        assert!(active.bias().is_zero());
    }
}
