//! Structure-start registrations, replayed into every generator settings object.

use std::collections::BTreeSet;

use crate::ident::BiomeId;
use crate::settings::{ConfiguredStructure, GeneratorSettings};

/// Union-only record of which structures may start in which biomes.
///
/// Registrations persist for the process lifetime (until
/// [`clear`](Self::clear)) and are replayed into settings objects created
/// after them. Nothing here ever removes a biome another source added.
#[derive(Clone, Debug, Default)]
pub struct StructureReplacementRegistry {
    registrations: Vec<(ConfiguredStructure, BiomeId)>,
    seen: BTreeSet<(ConfiguredStructure, BiomeId)>,
}

impl StructureReplacementRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `structure` as eligible in `biome` and merges it into `known`.
    ///
    /// Returns `false` if the pair was already recorded.
    pub fn register_structure<'a>(
        &mut self,
        structure: ConfiguredStructure,
        biome: BiomeId,
        known: impl IntoIterator<Item = &'a mut GeneratorSettings>,
    ) -> bool {
        if !self.seen.insert((structure.clone(), biome.clone())) {
            return false;
        }
        for settings in known {
            settings.add_structure_start(&structure, biome.clone());
        }
        tracing::debug!("Structure {} may start in {}", structure.id, biome);
        self.registrations.push((structure, biome));
        true
    }

    /// Merges every recorded registration into `settings`, in registration order.
    pub fn apply(&self, settings: &mut GeneratorSettings) {
        for (structure, biome) in &self.registrations {
            settings.add_structure_start(structure, biome.clone());
        }
    }

    /// Registrations in order.
    pub fn registrations(&self) -> impl Iterator<Item = (&ConfiguredStructure, &BiomeId)> {
        self.registrations.iter().map(|(s, b)| (s, b))
    }

    /// Number of recorded registrations.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns `true` if nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Drops every recorded registration. Settings already merged keep their entries.
    pub fn clear(&mut self) {
        self.registrations.clear();
        self.seen.clear();
    }
}
