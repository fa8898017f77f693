//! Per-biome surface rules and their aggregation into a level's rule chain.

use hashbrown::{HashMap, HashSet};

use crate::ident::{BiomeId, SurfaceRuleId};
use crate::settings::GeneratorSettings;

/// One surface rule per biome, kept in registration order.
#[derive(Clone, Debug, Default)]
pub struct SurfaceRuleAggregator {
    rules: Vec<(BiomeId, SurfaceRuleId)>,
    index: HashMap<BiomeId, usize>,
}

impl SurfaceRuleAggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `rule` with `biome`.
    ///
    /// A later rule for the same biome replaces the earlier one but keeps its
    /// position in the chain.
    pub fn register_surface_rule(&mut self, biome: BiomeId, rule: SurfaceRuleId) {
        match self.index.get(&biome) {
            Some(&slot) => self.rules[slot].1 = rule,
            None => {
                self.index.insert(biome.clone(), self.rules.len());
                self.rules.push((biome, rule));
            }
        }
    }

    /// Rule currently registered for `biome`.
    pub fn get(&self, biome: &BiomeId) -> Option<&SurfaceRuleId> {
        self.index.get(biome).map(|&slot| &self.rules[slot].1)
    }

    /// Rules of the biomes in `active`, in registration order.
    pub fn collect_rules(&self, active: &HashSet<BiomeId>) -> Vec<SurfaceRuleId> {
        self.rules
            .iter()
            .filter(|(biome, _)| active.contains(biome))
            .map(|(_, rule)| rule.clone())
            .collect()
    }

    /// Installs the rule chain of `active` into `settings`.
    ///
    /// An empty chain clears whatever was installed before. Returns the number
    /// of rules installed.
    pub fn apply_to_level(&self, active: &HashSet<BiomeId>, settings: &mut GeneratorSettings) -> usize {
        let rules = self.collect_rules(active);
        let count = rules.len();
        if rules.is_empty() {
            settings.clear_custom_surface_rules();
        } else {
            settings.set_custom_surface_rules(rules);
        }
        tracing::debug!("Installed {count} surface rules into {}", settings.id());
        count
    }

    /// Number of biomes with a rule.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(names: &[&str]) -> HashSet<BiomeId> {
        names.iter().map(|n| BiomeId::parse(n)).collect()
    }

    #[test]
    fn test_last_write_wins_per_biome() {
        let mut surface = SurfaceRuleAggregator::new();
        surface.register_surface_rule("a".into(), "rule_1".into());
        surface.register_surface_rule("b".into(), "rule_b".into());
        surface.register_surface_rule("a".into(), "rule_2".into());

        assert_eq!(surface.get(&BiomeId::parse("a")), Some(&SurfaceRuleId::parse("rule_2")));
        assert_eq!(surface.len(), 2);
        assert_eq!(
            surface.collect_rules(&active(&["a", "b"])),
            vec![SurfaceRuleId::parse("rule_2"), SurfaceRuleId::parse("rule_b")]
        );
    }

    #[test]
    fn test_apply_only_active_biomes_in_order() {
        let mut surface = SurfaceRuleAggregator::new();
        surface.register_surface_rule("c".into(), "rule_c".into());
        surface.register_surface_rule("a".into(), "rule_a".into());
        surface.register_surface_rule("b".into(), "rule_b".into());

        let mut settings = GeneratorSettings::new("nether");
        assert_eq!(surface.apply_to_level(&active(&["a", "c"]), &mut settings), 2);
        assert_eq!(
            settings.custom_surface_rules(),
            &[SurfaceRuleId::parse("rule_c"), SurfaceRuleId::parse("rule_a")]
        );
    }

    #[test]
    fn test_empty_chain_clears_stale_rules() {
        let mut surface = SurfaceRuleAggregator::new();
        surface.register_surface_rule("a".into(), "rule_a".into());

        let mut settings = GeneratorSettings::new("nether");
        surface.apply_to_level(&active(&["a"]), &mut settings);
        assert_eq!(settings.custom_surface_rules().len(), 1);

        assert_eq!(surface.apply_to_level(&active(&["z"]), &mut settings), 0);
        assert!(settings.custom_surface_rules().is_empty());
    }

    #[test]
    fn test_unknown_biome_has_no_rule() {
        let surface = SurfaceRuleAggregator::new();
        assert!(surface.get(&BiomeId::parse("missing")).is_none());
        assert!(surface.is_empty());
    }
}
