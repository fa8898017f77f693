//! Configuration structs with sensible defaults and RON persistence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Smallest accepted biome grid scale, in blocks.
pub const MIN_BIOME_SIZE: u32 = 1;
/// Largest accepted biome grid scale, in blocks.
pub const MAX_BIOME_SIZE: u32 = 8192;

/// Top-level generator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Biome source settings.
    pub generator: GeneratorConfig,
    /// Per-biome overrides.
    pub biomes: BiomesConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Biome source configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Nether biome grid scale in blocks.
    pub nether_biome_size: u32,
    /// End island biome grid scale in blocks.
    pub end_land_biome_size: u32,
    /// End void biome grid scale in blocks.
    pub end_void_biome_size: u32,
    /// Height in blocks of one Nether biome layer in a tall Nether.
    pub nether_vertical_biome_size: u32,
    /// Split a tall Nether into vertically stacked biome layers.
    pub vertical_biomes_in_tall_nether: bool,
    /// Install the custom Nether biome source.
    pub custom_nether_biome_source: bool,
    /// Install the custom End biome source.
    pub custom_end_biome_source: bool,
    /// Radius in blocks around the End origin kept as the central End biome.
    pub far_end_biomes: u32,
    /// Cells a biome map caches before clearing itself.
    pub cache_capacity: usize,
}

/// Per-biome overrides, keyed by `namespace.path`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BiomesConfig {
    /// Overrides by biome key.
    pub overrides: HashMap<String, BiomeOverride>,
}

/// Generation parameters a user may override for one biome.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BiomeOverride {
    /// Generation weight.
    pub generation_chance: Option<f64>,
    /// Fog density.
    pub fog_density: Option<f32>,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            nether_biome_size: 256,
            end_land_biome_size: 256,
            end_void_biome_size: 256,
            nether_vertical_biome_size: 86,
            vertical_biomes_in_tall_nether: true,
            custom_nether_biome_source: true,
            custom_end_biome_source: true,
            far_end_biomes: 1000,
            cache_capacity: 4096,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Accessors ---

impl GeneratorConfig {
    /// Nether grid scale, clamped to the accepted range.
    pub fn nether_biome_size(&self) -> u32 {
        self.nether_biome_size.clamp(MIN_BIOME_SIZE, MAX_BIOME_SIZE)
    }

    /// Tall Nether layer height, clamped to the accepted range.
    pub fn nether_vertical_biome_size(&self) -> u32 {
        self.nether_vertical_biome_size
            .clamp(MIN_BIOME_SIZE, MAX_BIOME_SIZE)
    }

    /// End island grid scale, clamped to the accepted range.
    pub fn end_land_biome_size(&self) -> u32 {
        self.end_land_biome_size
            .clamp(MIN_BIOME_SIZE, MAX_BIOME_SIZE)
    }

    /// End void grid scale, clamped to the accepted range.
    pub fn end_void_biome_size(&self) -> u32 {
        self.end_void_biome_size
            .clamp(MIN_BIOME_SIZE, MAX_BIOME_SIZE)
    }

    /// Squared central End radius, in blocks².
    pub fn far_end_biomes_sq(&self) -> i64 {
        let r = i64::from(self.far_end_biomes);
        r * r
    }
}

impl BiomesConfig {
    /// Override for the biome with config key `key` (`namespace.path`).
    pub fn get(&self, key: &str) -> Option<&BiomeOverride> {
        self.overrides.get(key)
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Platform config directory for the generator, if the platform has one.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("nebula-biomes"))
    }

    /// Resolve the config directory (`override_dir` first, then the platform
    /// default) and load or create `config.ron` there.
    pub fn load_from(override_dir: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let dir = match override_dir {
            Some(dir) => dir.to_path_buf(),
            None => Self::default_dir().ok_or(ConfigError::NoConfigDir)?,
        };
        let config = Self::load_or_create(&dir)?;
        Ok((config, dir))
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
