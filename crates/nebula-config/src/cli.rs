//! Command-line argument parsing for the biome generator tools.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Biome generator command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "nebula-biome-probe", about = "Nebula biome placement report")]
pub struct CliArgs {
    /// Nether biome grid scale in blocks.
    #[arg(long)]
    pub nether_biome_size: Option<u32>,

    /// End island biome grid scale in blocks.
    #[arg(long)]
    pub end_land_biome_size: Option<u32>,

    /// End void biome grid scale in blocks.
    #[arg(long)]
    pub end_void_biome_size: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// World seed.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(size) = args.nether_biome_size {
            self.generator.nether_biome_size = size;
        }
        if let Some(size) = args.end_land_biome_size {
            self.generator.end_land_biome_size = size;
        }
        if let Some(size) = args.end_void_biome_size {
            self.generator.end_void_biome_size = size;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
