//! Host-side biome definitions: decoration phases, carvers, and spawn tables.

use std::collections::BTreeMap;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use super::{BiomeHandle, HostCategory};
use crate::ident::{BiomeId, CarverId, EntityTypeId, FeatureId};

// ---------------------------------------------------------------------------
// Phases and stages
// ---------------------------------------------------------------------------

/// Ordered decoration step in which placed features run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DecorationPhase {
    /// Terrain-shaping features that run first.
    RawGeneration,
    /// Lava and water lakes.
    Lakes,
    /// Geodes, icebergs and similar local edits.
    LocalModifications,
    /// Small underground structures such as fossils.
    UndergroundStructures,
    /// Small surface structures such as wells.
    SurfaceStructures,
    /// Reserved for strongholds.
    Strongholds,
    /// Ore veins and disks.
    UndergroundOres,
    /// Cave decoration such as glowstone.
    UndergroundDecoration,
    /// Lava and water springs.
    FluidSprings,
    /// Trees, plants and fungi.
    VegetalDecoration,
    /// Final surface pass (snow, freezing).
    TopLayerModification,
}

impl DecorationPhase {
    /// Every phase, in generation order.
    pub const ALL: [Self; 11] = [
        Self::RawGeneration,
        Self::Lakes,
        Self::LocalModifications,
        Self::UndergroundStructures,
        Self::SurfaceStructures,
        Self::Strongholds,
        Self::UndergroundOres,
        Self::UndergroundDecoration,
        Self::FluidSprings,
        Self::VegetalDecoration,
        Self::TopLayerModification,
    ];

    /// Position of the phase in generation order.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Carving stage a carver runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CarvingStage {
    /// Carves air pockets.
    Air,
    /// Carves through liquid.
    Liquid,
}

/// Spawn-table bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MobCategory {
    /// Hostile mobs.
    Monster,
    /// Passive land mobs.
    Creature,
    /// Ambient mobs such as bats.
    Ambient,
    /// Axolotls.
    Axolotls,
    /// Water mobs that spawn in caves.
    UndergroundWaterCreature,
    /// Water mobs.
    WaterCreature,
    /// Ambient water mobs such as fish.
    WaterAmbient,
    /// Everything else.
    Misc,
}

/// One weighted spawn-table row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnerData {
    /// Entity to spawn.
    pub entity: EntityTypeId,
    /// Spawn weight relative to the other rows of the same category.
    pub weight: u32,
    /// Minimum group size.
    pub min_count: u32,
    /// Maximum group size.
    pub max_count: u32,
}

// ---------------------------------------------------------------------------
// Generation settings
// ---------------------------------------------------------------------------

/// Per-biome decoration lists: placed features per phase and carvers per stage.
#[derive(Clone, Debug, Default)]
pub struct GenerationSettings {
    features: Vec<Vec<FeatureId>>,
    feature_set: HashSet<FeatureId>,
    carvers: BTreeMap<CarvingStage, Vec<CarverId>>,
}

impl GenerationSettings {
    /// Creates settings with no features and no carvers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Features declared for `phase`, in current order.
    pub fn features(&self, phase: DecorationPhase) -> &[FeatureId] {
        self.features
            .get(phase.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterates `(phase, features)` for every phase that has a list.
    pub fn phases(&self) -> impl Iterator<Item = (DecorationPhase, &[FeatureId])> {
        DecorationPhase::ALL
            .into_iter()
            .zip(self.features.iter())
            .map(|(phase, list)| (phase, list.as_slice()))
    }

    /// Returns `true` if the feature appears in any phase.
    pub fn has_feature(&self, feature: &FeatureId) -> bool {
        self.feature_set.contains(feature)
    }

    /// Appends a feature to `phase`.
    pub fn add_feature(&mut self, feature: FeatureId, phase: DecorationPhase) {
        self.add_features([feature], phase);
    }

    /// Appends several features to `phase`, in order.
    pub fn add_features(
        &mut self,
        features: impl IntoIterator<Item = FeatureId>,
        phase: DecorationPhase,
    ) {
        let features: Vec<FeatureId> = features.into_iter().collect();
        self.feature_set.extend(features.iter().cloned());
        self.phase_list_mut(phase).extend(features);
    }

    /// Carvers registered for `stage`.
    pub fn carvers(&self, stage: CarvingStage) -> &[CarverId] {
        self.carvers.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Appends a carver to `stage`.
    pub fn add_carver(&mut self, carver: CarverId, stage: CarvingStage) {
        self.carvers.entry(stage).or_default().push(carver);
    }

    pub(crate) fn phase_lists_mut(&mut self) -> &mut [Vec<FeatureId>] {
        &mut self.features
    }

    fn phase_list_mut(&mut self, phase: DecorationPhase) -> &mut Vec<FeatureId> {
        let index = phase.index();
        if self.features.len() <= index {
            self.features.resize_with(index + 1, Vec::new);
        }
        &mut self.features[index]
    }
}

// ---------------------------------------------------------------------------
// Spawn settings
// ---------------------------------------------------------------------------

/// Per-biome spawn tables.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpawnSettings {
    spawners: BTreeMap<MobCategory, Vec<SpawnerData>>,
}

impl SpawnSettings {
    /// Creates empty spawn tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows for `category`.
    pub fn spawners(&self, category: MobCategory) -> &[SpawnerData] {
        self.spawners
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Adds a spawn row. The category's table is rebuilt as a new list.
    pub fn add_spawn(&mut self, category: MobCategory, data: SpawnerData) {
        let mut rows = self.spawners.get(&category).cloned().unwrap_or_default();
        rows.push(data);
        self.spawners.insert(category, rows);
    }
}

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// Where a definition in the active registry came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BiomeOrigin {
    /// Built into the engine or registered by a mod at startup.
    Builtin,
    /// Loaded from a datapack for the current world.
    Datapack,
}

/// A biome as the host engine's registry sees it.
#[derive(Clone, Debug)]
pub struct BiomeDefinition {
    /// Biome identity.
    pub id: BiomeId,
    /// Host classification.
    pub host_category: HostCategory,
    /// Origin of this definition.
    pub origin: BiomeOrigin,
    /// Declared generation weight, used for datapack biomes unknown to the context.
    pub weight: f64,
    /// Declared fog density.
    pub fog_density: f32,
    /// Feature and carver lists.
    pub generation: GenerationSettings,
    /// Spawn tables.
    pub spawns: SpawnSettings,
    pub(crate) handle: BiomeHandle,
}

impl BiomeDefinition {
    /// Creates a built-in definition with default weight and no decorations.
    pub fn new(id: BiomeId, host_category: HostCategory) -> Self {
        Self {
            id,
            host_category,
            origin: BiomeOrigin::Builtin,
            weight: 1.0,
            fog_density: 1.0,
            generation: GenerationSettings::new(),
            spawns: SpawnSettings::new(),
            handle: BiomeHandle(u32::MAX),
        }
    }

    /// Marks the definition as datapack-provided.
    pub fn from_datapack(mut self) -> Self {
        self.origin = BiomeOrigin::Datapack;
        self
    }

    /// Sets the declared weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Engine handle assigned by the snapshot this definition lives in.
    pub fn handle(&self) -> BiomeHandle {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_feature_extends_phase_and_set() {
        let mut settings = GenerationSettings::new();
        let ore = FeatureId::parse("ore_quartz");
        settings.add_feature(ore.clone(), DecorationPhase::UndergroundDecoration);
        assert_eq!(
            settings.features(DecorationPhase::UndergroundDecoration),
            [ore.clone()]
        );
        assert!(settings.features(DecorationPhase::RawGeneration).is_empty());
        assert!(settings.has_feature(&ore));
    }

    #[test]
    fn test_phases_pads_earlier_lists() {
        let mut settings = GenerationSettings::new();
        settings.add_feature(FeatureId::parse("spring"), DecorationPhase::FluidSprings);
        let phases: Vec<_> = settings.phases().map(|(phase, _)| phase).collect();
        assert_eq!(phases.len(), DecorationPhase::FluidSprings.index() + 1);
        assert_eq!(phases.last(), Some(&DecorationPhase::FluidSprings));
    }

    #[test]
    fn test_carvers_per_stage() {
        let mut settings = GenerationSettings::new();
        settings.add_carver(CarverId::parse("nether_cave"), CarvingStage::Air);
        assert_eq!(settings.carvers(CarvingStage::Air).len(), 1);
        assert!(settings.carvers(CarvingStage::Liquid).is_empty());
    }

    #[test]
    fn test_add_spawn_appends() {
        let mut spawns = SpawnSettings::new();
        let row = |name: &str| SpawnerData {
            entity: EntityTypeId::parse(name),
            weight: 10,
            min_count: 1,
            max_count: 4,
        };
        spawns.add_spawn(MobCategory::Monster, row("ghast"));
        spawns.add_spawn(MobCategory::Monster, row("strider"));
        let names: Vec<_> = spawns
            .spawners(MobCategory::Monster)
            .iter()
            .map(|s| s.entity.to_string())
            .collect();
        assert_eq!(names, ["minecraft:ghast", "minecraft:strider"]);
        assert!(spawns.spawners(MobCategory::Creature).is_empty());
    }
}
