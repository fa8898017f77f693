//! The built-in Nether and End biome set.

use crate::biome::{BiomeDefinition, BiomeEntry, DecorationPhase, HostCategory, RegistrySnapshot};
use crate::context::BiomeContext;
use crate::error::BiomeError;
use crate::ident::{BiomeId, FeatureId};

/// `minecraft:nether_wastes`.
pub const NETHER_WASTES: &str = "minecraft:nether_wastes";
/// `minecraft:crimson_forest`.
pub const CRIMSON_FOREST: &str = "minecraft:crimson_forest";
/// `minecraft:warped_forest`.
pub const WARPED_FOREST: &str = "minecraft:warped_forest";
/// `minecraft:soul_sand_valley`.
pub const SOUL_SAND_VALLEY: &str = "minecraft:soul_sand_valley";
/// `minecraft:basalt_deltas`.
pub const BASALT_DELTAS: &str = "minecraft:basalt_deltas";

/// `minecraft:the_end`.
pub const THE_END: &str = "minecraft:the_end";
/// `minecraft:end_midlands`.
pub const END_MIDLANDS: &str = "minecraft:end_midlands";
/// `minecraft:end_highlands`.
pub const END_HIGHLANDS: &str = "minecraft:end_highlands";
/// `minecraft:end_barrens`.
pub const END_BARRENS: &str = "minecraft:end_barrens";
/// `minecraft:small_end_islands`.
pub const SMALL_END_ISLANDS: &str = "minecraft:small_end_islands";

/// Nether biomes, in registration order.
pub const NETHER_BIOMES: [&str; 5] = [
    NETHER_WASTES,
    CRIMSON_FOREST,
    WARPED_FOREST,
    SOUL_SAND_VALLEY,
    BASALT_DELTAS,
];

/// Chance that each End island sub-biome replaces `the_end`.
const END_SUB_BIOME_CHANCE: f64 = 0.5;

/// Registers the vanilla Nether and End biomes into their categories.
///
/// `the_end` is the single island biome and carries `end_midlands` and
/// `end_highlands` as sub-biomes; `end_barrens` and `small_end_islands` fill
/// the void.
///
/// # Errors
///
/// Propagates a rejection caused by a config override with an invalid weight.
pub fn register(context: &mut BiomeContext) -> Result<(), BiomeError> {
    for id in NETHER_BIOMES {
        context.register_nether_biome(BiomeEntry::new(BiomeId::parse(id)))?;
    }

    context.register_end_land_biome(BiomeEntry::new(BiomeId::parse(THE_END)))?;
    let the_end = BiomeId::parse(THE_END);
    for sub in [END_MIDLANDS, END_HIGHLANDS] {
        context.register_sub_biome(
            &the_end,
            BiomeEntry::new(BiomeId::parse(sub)),
            END_SUB_BIOME_CHANCE,
        )?;
    }

    for id in [END_BARRENS, SMALL_END_ISLANDS] {
        context.register_end_void_biome(BiomeEntry::new(BiomeId::parse(id)))?;
    }
    Ok(())
}

/// A registry snapshot holding the vanilla Nether and End definitions with a
/// representative set of decoration features.
pub fn snapshot(generation: u64) -> RegistrySnapshot {
    let mut snapshot = RegistrySnapshot::new(generation);

    for id in NETHER_BIOMES {
        let mut def = BiomeDefinition::new(BiomeId::parse(id), HostCategory::Nether);
        def.generation.add_features(
            features(&["spring_lava", "spring_open", "patch_fire", "glowstone"]),
            DecorationPhase::UndergroundDecoration,
        );
        def.generation.add_features(
            features(&["ore_gravel_nether", "ore_quartz_nether", "ore_ancient_debris_small"]),
            DecorationPhase::UndergroundDecoration,
        );
        snapshot.insert(def);
    }

    for id in [THE_END, END_MIDLANDS, END_HIGHLANDS, END_BARRENS, SMALL_END_ISLANDS] {
        let mut def = BiomeDefinition::new(BiomeId::parse(id), HostCategory::TheEnd);
        if id == END_HIGHLANDS {
            def.generation
                .add_feature(FeatureId::parse("end_gateway_return"), DecorationPhase::SurfaceStructures);
            def.generation
                .add_feature(FeatureId::parse("chorus_plant"), DecorationPhase::VegetalDecoration);
        }
        if id == SMALL_END_ISLANDS {
            def.generation
                .add_feature(FeatureId::parse("end_island_decorated"), DecorationPhase::RawGeneration);
        }
        snapshot.insert(def);
    }

    snapshot
}

fn features(names: &[&str]) -> Vec<FeatureId> {
    names.iter().map(|n| FeatureId::parse(n)).collect()
}
