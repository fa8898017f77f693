//! Spatial biome map: world (x, z) to a quantized, irregular cell, and cell to a
//! deterministically sampled biome, with a concurrent per-cell cache.

use std::sync::Arc;

use dashmap::DashMap;
use noise::{NoiseFn, Simplex};

use crate::biome::BiomeEntry;
use crate::error::BiomeError;
use crate::picker::WeightedBiomePicker;
use crate::seed::{cell_rng, noise_seed};

/// Cells kept before the map clears its cache on its own.
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Displacement of cell borders, in cells.
const WARP_AMPLITUDE: f64 = 0.35;
/// Frequency of the border-warp noise, in cycles per cell.
const WARP_FREQUENCY: f64 = 0.9;

const WARP_SALT_X: u64 = 0x5EED_0000_0000_0001;
const WARP_SALT_Z: u64 = 0xDEAD_BEEF;

/// Quantized cell coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellPos {
    /// Cell index along X.
    pub x: i32,
    /// Cell index along Z.
    pub z: i32,
}

/// Deterministic world-coordinate → biome mapping for one seed and grid scale.
///
/// For a fixed seed, grid scale, and picker, the biome of a cell is a pure
/// function of the cell: the cache only saves recomputation and may be cleared
/// at any time, from any thread.
pub struct SpatialBiomeMap {
    seed: u64,
    biome_size: u32,
    picker: Arc<WeightedBiomePicker>,
    warp_x: Simplex,
    warp_z: Simplex,
    cache: DashMap<CellPos, Arc<BiomeEntry>>,
    cache_capacity: usize,
}

impl SpatialBiomeMap {
    /// Creates a map sampling `picker` on cells of `biome_size` blocks.
    ///
    /// `biome_size` of zero is treated as one.
    pub fn new(seed: u64, biome_size: u32, picker: Arc<WeightedBiomePicker>) -> Self {
        Self {
            seed,
            biome_size: biome_size.max(1),
            picker,
            warp_x: Simplex::new(noise_seed(seed, WARP_SALT_X)),
            warp_z: Simplex::new(noise_seed(seed, WARP_SALT_Z)),
            cache: DashMap::new(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    /// Sets how many cells are cached before the cache clears itself.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity.max(1);
        self
    }

    /// World seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Grid scale in blocks.
    pub fn biome_size(&self) -> u32 {
        self.biome_size
    }

    /// Cells cached before the cache clears itself.
    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    /// The picker this map samples.
    pub fn picker(&self) -> &Arc<WeightedBiomePicker> {
        &self.picker
    }

    /// Cell enclosing the block position `(x, z)`.
    ///
    /// The position is scaled to cell units, displaced by two seeded simplex
    /// fields, then floored, so cell borders wander instead of forming a grid.
    pub fn cell_at(&self, x: i32, z: i32) -> CellPos {
        let scale = f64::from(self.biome_size);
        let fx = f64::from(x) / scale;
        let fz = f64::from(z) / scale;
        let sample = [fx * WARP_FREQUENCY, fz * WARP_FREQUENCY];
        let wx = fx + WARP_AMPLITUDE * self.warp_x.get(sample);
        let wz = fz + WARP_AMPLITUDE * self.warp_z.get(sample);
        CellPos {
            x: wx.floor() as i32,
            z: wz.floor() as i32,
        }
    }

    /// Biome at block position `(x, z)`.
    ///
    /// # Errors
    ///
    /// Returns [`BiomeError::NoBiomesAvailable`] if the picker is empty.
    pub fn resolve(&self, x: i32, z: i32) -> Result<Arc<BiomeEntry>, BiomeError> {
        self.resolve_cell(self.cell_at(x, z))
    }

    /// Biome of a cell, from the cache or freshly sampled.
    ///
    /// # Errors
    ///
    /// Returns [`BiomeError::NoBiomesAvailable`] if the picker is empty.
    pub fn resolve_cell(&self, cell: CellPos) -> Result<Arc<BiomeEntry>, BiomeError> {
        if let Some(hit) = self.cache.get(&cell) {
            return Ok(Arc::clone(hit.value()));
        }

        let resolved = self.sample_cell(cell)?;
        if self.cache.len() >= self.cache_capacity {
            tracing::debug!("Biome cache full ({} cells), clearing", self.cache.len());
            self.cache.clear();
        }
        // Racing writers of the same cell insert identical values.
        self.cache.insert(cell, Arc::clone(&resolved));
        Ok(resolved)
    }

    /// Samples a cell without consulting or filling the cache.
    ///
    /// The cell's random source supplies the picker draw first, then one draw
    /// per sub-biome tested.
    ///
    /// # Errors
    ///
    /// Returns [`BiomeError::NoBiomesAvailable`] if the picker is empty.
    pub fn sample_cell(&self, cell: CellPos) -> Result<Arc<BiomeEntry>, BiomeError> {
        let mut rng = cell_rng(self.seed, cell.x, cell.z);
        let parent = self.picker.pick(&mut rng)?;
        Ok(parent.resolve_sub_biome(&mut rng))
    }

    /// Drops every cached cell.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of cells currently cached.
    pub fn cached_cells(&self) -> usize {
        self.cache.len()
    }
}
