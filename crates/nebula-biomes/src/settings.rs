//! Generator settings: the shared per-dimension object that structure starts
//! and custom surface rules are merged into.

use std::collections::{BTreeMap, BTreeSet};

use crate::ident::{BiomeId, SettingsId, StructureId, StructureTypeId, SurfaceRuleId};

/// Structure type → configured structure → eligible biomes.
pub type StructureStarts = BTreeMap<StructureTypeId, BTreeMap<StructureId, BTreeSet<BiomeId>>>;

/// A configured structure instance and the structure type it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfiguredStructure {
    /// Identity of the configured instance.
    pub id: StructureId,
    /// Structure type it instantiates.
    pub kind: StructureTypeId,
}

impl ConfiguredStructure {
    /// Creates a configured structure of type `kind`.
    pub fn new(id: impl Into<StructureId>, kind: impl Into<StructureTypeId>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
        }
    }
}

/// Noise generator settings for one dimension, as far as biome placement cares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorSettings {
    id: SettingsId,
    structure_starts: StructureStarts,
    custom_surface_rules: Vec<SurfaceRuleId>,
}

impl GeneratorSettings {
    /// Creates settings with no structure starts and no custom rules.
    pub fn new(id: impl Into<SettingsId>) -> Self {
        Self {
            id: id.into(),
            structure_starts: StructureStarts::new(),
            custom_surface_rules: Vec::new(),
        }
    }

    /// Settings identity (`minecraft:nether`, `minecraft:end`, ...).
    pub fn id(&self) -> &SettingsId {
        &self.id
    }

    /// All structure starts.
    pub fn structure_starts(&self) -> &StructureStarts {
        &self.structure_starts
    }

    /// Makes `structure` eligible in `biome`. Returns `false` if it already was.
    pub fn add_structure_start(&mut self, structure: &ConfiguredStructure, biome: BiomeId) -> bool {
        self.structure_starts
            .entry(structure.kind.clone())
            .or_default()
            .entry(structure.id.clone())
            .or_default()
            .insert(biome)
    }

    /// Biomes `structure` may start in.
    pub fn eligible_biomes(&self, structure: &ConfiguredStructure) -> Option<&BTreeSet<BiomeId>> {
        self.structure_starts
            .get(&structure.kind)
            .and_then(|by_id| by_id.get(&structure.id))
    }

    /// Returns `true` if `structure` may start in `biome`.
    pub fn is_eligible(&self, structure: &ConfiguredStructure, biome: &BiomeId) -> bool {
        self.eligible_biomes(structure)
            .is_some_and(|biomes| biomes.contains(biome))
    }

    /// Custom surface rule chain, in order.
    pub fn custom_surface_rules(&self) -> &[SurfaceRuleId] {
        &self.custom_surface_rules
    }

    /// Installs a custom rule chain, replacing the previous one.
    pub fn set_custom_surface_rules(&mut self, rules: Vec<SurfaceRuleId>) {
        self.custom_surface_rules = rules;
    }

    /// Removes any installed custom rule chain.
    pub fn clear_custom_surface_rules(&mut self) {
        self.custom_surface_rules.clear();
    }
}
