//! Configuration for the Nebula biome generator.
//!
//! Settings persist to disk as RON files, accept CLI overrides via clap, and
//! carry per-biome overrides for generation weight and fog density.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    BiomeOverride, BiomesConfig, Config, DebugConfig, GeneratorConfig, MAX_BIOME_SIZE,
    MIN_BIOME_SIZE,
};
pub use error::ConfigError;
