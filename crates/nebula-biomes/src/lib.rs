//! Biome distribution for the Nether and End.
//!
//! Biomes are registered into generation categories on a [`BiomeContext`],
//! each category sampled by a [`WeightedBiomePicker`] over an irregular cell
//! grid ([`SpatialBiomeMap`]). A [`BiomeSourceAdapter`] exposes the per-dimension
//! `get_biome` contract to the host terrain engine. The context also owns the
//! process-wide decoration order, structure starts, surface rules, and
//! biome modifications.
//!
//! ```no_run
//! use nebula_biomes::{BiomeContext, BiomeSource, BiomeSourceAdapter, vanilla};
//!
//! let mut context = BiomeContext::default();
//! vanilla::register(&mut context)?;
//! let mut snapshot = vanilla::snapshot(1);
//! context.init_registry(&mut snapshot);
//!
//! let nether = BiomeSourceAdapter::nether(&mut context, &snapshot, 42);
//! let biome = nether.get_biome(256, 16, 512)?;
//! # Ok::<(), nebula_biomes::BiomeError>(())
//! ```

pub mod biome;
pub mod context;
pub mod error;
pub mod feature_order;
pub mod ident;
pub mod map;
pub mod picker;
pub mod seed;
pub mod settings;
pub mod source;
pub mod structure;
pub mod surface;
pub mod vanilla;

pub use biome::{
    BiomeDefinition, BiomeEntry, BiomeHandle, BiomeOrigin, DecorationPhase, GenerationCategory,
    GenerationSettings, HostCategory, RegistrySnapshot,
};
pub use context::{BiomeContext, BiomeModification};
pub use error::BiomeError;
pub use feature_order::FeatureOrderResolver;
pub use ident::{BiomeId, DimensionId, FeatureId, Identifier, SettingsId, SurfaceRuleId};
pub use map::{CellPos, SpatialBiomeMap};
pub use picker::WeightedBiomePicker;
pub use settings::{ConfiguredStructure, GeneratorSettings};
pub use source::{AdapterState, BiomeSource, BiomeSourceAdapter, TerrainSample};
pub use structure::StructureReplacementRegistry;
pub use surface::SurfaceRuleAggregator;
