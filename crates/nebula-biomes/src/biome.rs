//! Biome data model: entries with sub-biome hierarchies, generation categories,
//! host definitions with their decoration lists, and registry snapshots.

mod category;
mod definition;
mod entry;
mod snapshot;

pub use category::{GenerationCategory, HostCategory};
pub use definition::{
    BiomeDefinition, BiomeOrigin, CarvingStage, DecorationPhase, GenerationSettings, MobCategory,
    SpawnSettings, SpawnerData,
};
pub use entry::{BiomeEntry, EMPTY_BIOME_ID, SubBiome};
pub use snapshot::{BiomeHandle, RegistrySnapshot};
