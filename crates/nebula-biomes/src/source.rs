//! Biome sources: the per-dimension `get_biome` contract the host terrain
//! engine calls, and the adapter implementing it on top of [`SpatialBiomeMap`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::biome::{BiomeEntry, GenerationCategory, RegistrySnapshot};
use crate::context::BiomeContext;
use crate::error::BiomeError;
use crate::ident::{BiomeId, DimensionId};
use crate::map::SpatialBiomeMap;
use crate::picker::WeightedBiomePicker;
use crate::seed::mix64;
use crate::vanilla;

/// Host coordinates are in quarter-resolution units; one unit is `1 << 2` blocks.
pub const UNIT_SHIFT: u32 = 2;

/// Caches are cleared whenever both unit coordinates are multiples of this.
const CACHE_CLEAR_ALIGNMENT: i32 = 64;

/// Nether height in blocks above which the Nether counts as tall.
pub const VANILLA_NETHER_HEIGHT: u32 = 256;

const LAYER_SALT: u64 = 0x4E45_5448_4552_4C59;

/// Per-dimension biome lookup, called concurrently by the chunk generator.
pub trait BiomeSource: Send + Sync {
    /// Biome at host coordinates `(x, y, z)` (quarter-resolution units).
    ///
    /// # Errors
    ///
    /// Returns [`BiomeError::NoBiomesAvailable`] if the source has nothing to sample.
    fn get_biome(&self, x: i32, y: i32, z: i32) -> Result<BiomeId, BiomeError>;

    /// Every identity this source can produce.
    fn possible_biomes(&self) -> &[BiomeId];

    /// World seed the source was built with.
    fn seed(&self) -> u64;

    /// A new source for `seed` with the same configuration.
    fn with_seed(&self, seed: u64) -> Self
    where
        Self: Sized;
}

/// Opaque land/void test for End-like dimensions, in block coordinates.
pub trait TerrainSample: Send + Sync {
    /// Returns `true` where island terrain generates.
    fn is_land(&self, x: i32, z: i32) -> bool;
}

/// Implements [`TerrainSample`] for any closure `Fn(i32, i32) -> bool`.
impl<F> TerrainSample for F
where
    F: Fn(i32, i32) -> bool + Send + Sync,
{
    fn is_land(&self, x: i32, z: i32) -> bool {
        self(x, z)
    }
}

/// Lifecycle of an adapter. Construction is the only way out of the
/// uninitialised state, so an adapter value is always at least `Built`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdapterState {
    /// Maps constructed, no lookup served yet.
    Built,
    /// At least one lookup served.
    Active,
}

enum DimensionLayout {
    Nether {
        /// One map per vertical layer, bottom first. A single map when the
        /// Nether is not layered.
        layers: Vec<SpatialBiomeMap>,
        vertical_size: u32,
    },
    End {
        land: SpatialBiomeMap,
        void: SpatialBiomeMap,
        terrain: Arc<dyn TerrainSample>,
        center: Option<Arc<BiomeEntry>>,
        far_sq: i64,
    },
}

impl DimensionLayout {
    fn maps(&self) -> Vec<&SpatialBiomeMap> {
        match self {
            Self::Nether { layers, .. } => layers.iter().collect(),
            Self::End { land, void, .. } => vec![land, void],
        }
    }

    fn reseed(&self, seed: u64) -> Self {
        let remap = |map: &SpatialBiomeMap| {
            SpatialBiomeMap::new(seed, map.biome_size(), Arc::clone(map.picker()))
                .with_cache_capacity(map.cache_capacity())
        };
        match self {
            Self::Nether {
                layers,
                vertical_size,
            } => Self::Nether {
                layers: layers
                    .iter()
                    .enumerate()
                    .map(|(layer, map)| {
                        SpatialBiomeMap::new(layer_seed(seed, layer), map.biome_size(), Arc::clone(map.picker()))
                            .with_cache_capacity(map.cache_capacity())
                    })
                    .collect(),
                vertical_size: *vertical_size,
            },
            Self::End {
                land,
                void,
                terrain,
                center,
                far_sq,
            } => Self::End {
                land: remap(land),
                void: remap(void),
                terrain: Arc::clone(terrain),
                center: center.clone(),
                far_sq: *far_sq,
            },
        }
    }
}

/// [`BiomeSource`] backed by one spatial map per generation category of the
/// dimension.
///
/// Pickers are snapshotted from the [`BiomeContext`] when the adapter is built:
/// later registrations do not reach an existing adapter. Adapters are
/// seed-immutable; [`with_seed`](BiomeSource::with_seed) builds a fresh one
/// and leaves the original untouched.
pub struct BiomeSourceAdapter {
    dimension: DimensionId,
    seed: u64,
    layout: DimensionLayout,
    possible: Vec<BiomeId>,
    active: AtomicBool,
}

impl BiomeSourceAdapter {
    /// Nether source for a vanilla-height Nether: a single map over the Nether
    /// picker, including datapack Nether biomes of `snapshot`.
    pub fn nether(context: &mut BiomeContext, snapshot: &RegistrySnapshot, seed: u64) -> Self {
        Self::tall_nether(context, snapshot, seed, VANILLA_NETHER_HEIGHT)
    }

    /// Nether source for a Nether `height` blocks tall.
    ///
    /// Above [`VANILLA_NETHER_HEIGHT`], and with vertical biomes enabled, the
    /// Nether is split into layers of `nether_vertical_biome_size` blocks, each
    /// with its own map. The bottom layer samples exactly like the flat source.
    pub fn tall_nether(
        context: &mut BiomeContext,
        snapshot: &RegistrySnapshot,
        seed: u64,
        height: u32,
    ) -> Self {
        let config = context.generator_config().clone();
        let picker = context.prepare_picker(GenerationCategory::Nether, snapshot, true);
        let vertical_size = config.nether_vertical_biome_size();
        let layer_count = if height > VANILLA_NETHER_HEIGHT && config.vertical_biomes_in_tall_nether {
            height.div_ceil(vertical_size) as usize
        } else {
            1
        };
        let layers = (0..layer_count)
            .map(|layer| {
                SpatialBiomeMap::new(layer_seed(seed, layer), config.nether_biome_size(), Arc::clone(&picker))
                    .with_cache_capacity(config.cache_capacity)
            })
            .collect();
        Self::build(
            DimensionId::nether(),
            seed,
            DimensionLayout::Nether {
                layers,
                vertical_size,
            },
        )
    }

    /// End source: island and void maps chosen by `terrain`, with the central
    /// End biome forced within `far_end_biomes` blocks of the origin.
    ///
    /// Datapack End biomes are admitted to the island picker only.
    pub fn end(
        context: &mut BiomeContext,
        snapshot: &RegistrySnapshot,
        seed: u64,
        terrain: impl TerrainSample + 'static,
    ) -> Self {
        let config = context.generator_config().clone();
        let land_picker = context.prepare_picker(GenerationCategory::EndLand, snapshot, true);
        let void_picker = context.prepare_picker(GenerationCategory::EndVoid, snapshot, false);
        let center = land_picker
            .get(&BiomeId::parse(vanilla::THE_END))
            .cloned();

        let land = SpatialBiomeMap::new(seed, config.end_land_biome_size(), land_picker)
            .with_cache_capacity(config.cache_capacity);
        let void = SpatialBiomeMap::new(seed, config.end_void_biome_size(), void_picker)
            .with_cache_capacity(config.cache_capacity);
        Self::build(
            DimensionId::end(),
            seed,
            DimensionLayout::End {
                land,
                void,
                terrain: Arc::new(terrain),
                center,
                far_sq: config.far_end_biomes_sq(),
            },
        )
    }

    fn build(dimension: DimensionId, seed: u64, layout: DimensionLayout) -> Self {
        let mut possible = Vec::new();
        if let DimensionLayout::End {
            center: Some(center),
            ..
        } = &layout
        {
            possible.push(center.id().clone());
        }
        for map in layout.maps() {
            collect_identities(map.picker(), &mut possible);
        }
        tracing::debug!(
            "Built {} biome source for seed {seed}: {} maps, {} possible biomes",
            dimension,
            layout.maps().len(),
            possible.len()
        );
        Self {
            dimension,
            seed,
            layout,
            possible,
            active: AtomicBool::new(false),
        }
    }

    /// Dimension this source serves.
    pub fn dimension(&self) -> &DimensionId {
        &self.dimension
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AdapterState {
        if self.active.load(Ordering::Acquire) {
            AdapterState::Active
        } else {
            AdapterState::Built
        }
    }

    /// Cells currently cached across every map of this source.
    pub(crate) fn cached_cells(&self) -> usize {
        self.layout.maps().iter().map(|map| map.cached_cells()).sum()
    }

    /// Number of spatial maps backing this source.
    pub fn map_count(&self) -> usize {
        self.layout.maps().len()
    }

    /// Resolved entry at host coordinates, carrying the bound engine handle.
    ///
    /// # Errors
    ///
    /// Returns [`BiomeError::NoBiomesAvailable`] if the relevant picker is empty.
    pub fn get_biome_entry(&self, x: i32, y: i32, z: i32) -> Result<Arc<BiomeEntry>, BiomeError> {
        self.active.store(true, Ordering::Release);
        if x & (CACHE_CLEAR_ALIGNMENT - 1) == 0 && z & (CACHE_CLEAR_ALIGNMENT - 1) == 0 {
            for map in self.layout.maps() {
                map.clear_cache();
            }
        }

        // Maps take wrapped block coordinates; distances are measured unwrapped.
        let bx = x.wrapping_shl(UNIT_SHIFT);
        let bz = z.wrapping_shl(UNIT_SHIFT);
        match &self.layout {
            DimensionLayout::Nether {
                layers,
                vertical_size,
            } => {
                let by = i64::from(y) << UNIT_SHIFT;
                let layer = (by.max(0) / i64::from(*vertical_size)) as usize;
                match layers.get(layer).or_else(|| layers.last()) {
                    Some(map) => map.resolve(bx, bz),
                    None => Err(BiomeError::NoBiomesAvailable),
                }
            }
            DimensionLayout::End {
                land,
                void,
                terrain,
                center,
                far_sq,
            } => {
                if let Some(center) = center {
                    let wx = i64::from(x) << UNIT_SHIFT;
                    let wz = i64::from(z) << UNIT_SHIFT;
                    let distance_sq = wx.saturating_mul(wx).saturating_add(wz.saturating_mul(wz));
                    if distance_sq <= *far_sq {
                        return Ok(Arc::clone(center));
                    }
                }
                if terrain.is_land(bx, bz) {
                    land.resolve(bx, bz)
                } else {
                    void.resolve(bx, bz)
                }
            }
        }
    }
}

impl BiomeSource for BiomeSourceAdapter {
    fn get_biome(&self, x: i32, y: i32, z: i32) -> Result<BiomeId, BiomeError> {
        self.get_biome_entry(x, y, z).map(|entry| entry.id().clone())
    }

    fn possible_biomes(&self) -> &[BiomeId] {
        &self.possible
    }

    fn seed(&self) -> u64 {
        self.seed
    }

    fn with_seed(&self, seed: u64) -> Self {
        Self::build(self.dimension.clone(), seed, self.layout.reseed(seed))
    }
}

/// Seed of the map for vertical layer `layer`; the bottom layer keeps the world seed.
fn layer_seed(seed: u64, layer: usize) -> u64 {
    if layer == 0 {
        seed
    } else {
        mix64(seed ^ LAYER_SALT.wrapping_mul(layer as u64))
    }
}

/// Appends every identity in the picker's hierarchies, keeping first occurrences.
fn collect_identities(picker: &WeightedBiomePicker, out: &mut Vec<BiomeId>) {
    fn walk(entry: &BiomeEntry, out: &mut Vec<BiomeId>) {
        if !out.contains(entry.id()) {
            out.push(entry.id().clone());
        }
        for sub in entry.sub_biomes() {
            walk(&sub.entry, out);
        }
    }
    for entry in picker.entries() {
        walk(entry, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::{BiomeDefinition, HostCategory};
    use nebula_config::Config;

    fn vanilla_context() -> (BiomeContext, RegistrySnapshot) {
        let mut context = BiomeContext::default();
        vanilla::register(&mut context).unwrap();
        let mut snapshot = vanilla::snapshot(1);
        context.init_registry(&mut snapshot);
        (context, snapshot)
    }

    fn islands(x: i32, z: i32) -> bool {
        (x / 512 + z / 512) % 2 == 0
    }

    #[test]
    fn test_nether_source_deterministic() {
        let (mut context, snapshot) = vanilla_context();
        let source = BiomeSourceAdapter::nether(&mut context, &snapshot, 42);
        let other = BiomeSourceAdapter::nether(&mut context, &snapshot, 42);
        for (x, z) in [(0, 0), (257, -31), (1024, 2048), (-640, 5)] {
            let first = source.get_biome(x, 0, z).unwrap();
            assert_eq!(first, source.get_biome(x, 0, z).unwrap());
            assert_eq!(first, other.get_biome(x, 0, z).unwrap());
            assert!(context.is_nether_biome(&first), "{first} is not a Nether biome");
        }
    }

    #[test]
    fn test_state_becomes_active_on_first_lookup() {
        let (mut context, snapshot) = vanilla_context();
        let source = BiomeSourceAdapter::nether(&mut context, &snapshot, 1);
        assert_eq!(source.state(), AdapterState::Built);
        source.get_biome(3, 0, 3).unwrap();
        assert_eq!(source.state(), AdapterState::Active);
    }

    #[test]
    fn test_with_seed_builds_independent_source() {
        let (mut context, snapshot) = vanilla_context();
        let source = BiomeSourceAdapter::nether(&mut context, &snapshot, 1);
        let before: Vec<_> = (0..64).map(|i| source.get_biome(i * 37, 0, i * 11).unwrap()).collect();

        let reseeded = source.with_seed(2);
        assert_eq!(reseeded.seed(), 2);
        assert_eq!(reseeded.state(), AdapterState::Built);
        assert_eq!(reseeded.possible_biomes(), source.possible_biomes());
        assert_eq!(source.seed(), 1);

        let after: Vec<_> = (0..64).map(|i| source.get_biome(i * 37, 0, i * 11).unwrap()).collect();
        assert_eq!(before, after);

        let fresh = BiomeSourceAdapter::nether(&mut context, &snapshot, 2);
        for i in 0..64 {
            assert_eq!(
                reseeded.get_biome(i * 37, 0, i * 11).unwrap(),
                fresh.get_biome(i * 37, 0, i * 11).unwrap()
            );
        }
    }

    #[test]
    fn test_possible_biomes_include_sub_biomes() {
        let (mut context, snapshot) = vanilla_context();
        let end = BiomeSourceAdapter::end(&mut context, &snapshot, 9, islands);
        let possible = end.possible_biomes();
        for id in [vanilla::THE_END, vanilla::END_MIDLANDS, vanilla::END_HIGHLANDS, vanilla::END_BARRENS] {
            assert!(possible.contains(&BiomeId::parse(id)), "{id} missing");
        }
        assert_eq!(possible[0], BiomeId::parse(vanilla::THE_END));
        assert!(!possible.contains(&BiomeId::parse(vanilla::NETHER_WASTES)));
    }

    #[test]
    fn test_end_center_forced_within_radius() {
        let (mut context, snapshot) = vanilla_context();
        let end = BiomeSourceAdapter::end(&mut context, &snapshot, 5, |_: i32, _: i32| false);
        let the_end = BiomeId::parse(vanilla::THE_END);
        assert_eq!(end.get_biome(0, 0, 0).unwrap(), the_end);
        // 240 units = 960 blocks, inside the default 1000 block radius.
        assert_eq!(end.get_biome(240, 0, 0).unwrap(), the_end);

        let far = end.get_biome(4000, 0, 4000).unwrap();
        assert!(
            [vanilla::END_BARRENS, vanilla::SMALL_END_ISLANDS]
                .map(BiomeId::parse)
                .contains(&far),
            "void lookup returned {far}"
        );
    }

    #[test]
    fn test_end_radius_measured_in_blocks() {
        let (mut context, snapshot) = vanilla_context();
        let end = BiomeSourceAdapter::end(&mut context, &snapshot, 5, |_: i32, _: i32| false);
        let the_end = BiomeId::parse(vanilla::THE_END);
        // 250 units = 1000 blocks sits on the radius; 260 units = 1040 blocks is past it.
        assert_eq!(end.get_biome(250, 0, 0).unwrap(), the_end);
        for (x, z) in [(260, 0), (0, -260), (190, 190)] {
            assert_ne!(end.get_biome(x, 0, z).unwrap(), the_end, "({x}, {z}) resolved to the center");
        }
    }

    #[test]
    fn test_extreme_coordinates_resolve() {
        let (mut context, snapshot) = vanilla_context();
        let end = BiomeSourceAdapter::end(&mut context, &snapshot, 5, islands);
        let nether = BiomeSourceAdapter::tall_nether(&mut context, &snapshot, 5, 512);
        for (x, z) in [
            (i32::MIN / 4, i32::MIN / 4),
            (i32::MIN, i32::MIN),
            (i32::MAX, i32::MAX),
            (i32::MIN, i32::MAX),
        ] {
            let far = end.get_biome(x, 0, z).unwrap();
            assert_ne!(far, BiomeId::parse(vanilla::THE_END), "({x}, {z}) resolved to the center");
            nether.get_biome(x, i32::MAX, z).unwrap();
            nether.get_biome(x, i32::MIN, z).unwrap();
        }
    }

    #[test]
    fn test_aligned_lookup_clears_caches() {
        let (mut context, snapshot) = vanilla_context();
        let source = BiomeSourceAdapter::nether(&mut context, &snapshot, 11);
        source.get_biome(1, 0, 1).unwrap();
        source.get_biome(301, 0, 7).unwrap();
        source.get_biome(-333, 0, 517).unwrap();
        assert!(source.cached_cells() >= 2, "{} cells cached", source.cached_cells());

        source.get_biome(64, 0, -128).unwrap();
        assert_eq!(source.cached_cells(), 1);

        source.get_biome(65, 0, -128).unwrap();
        source.get_biome(700, 0, 3).unwrap();
        assert!(source.cached_cells() >= 2);
    }

    #[test]
    fn test_tall_nether_layers() {
        let (mut context, snapshot) = vanilla_context();
        let flat = BiomeSourceAdapter::nether(&mut context, &snapshot, 21);
        assert_eq!(flat.map_count(), 1);
        assert_eq!(
            BiomeSourceAdapter::tall_nether(&mut context, &snapshot, 21, VANILLA_NETHER_HEIGHT).map_count(),
            1
        );

        // 512 blocks in layers of 86.
        let tall = BiomeSourceAdapter::tall_nether(&mut context, &snapshot, 21, 512);
        assert_eq!(tall.map_count(), 6);
        assert_eq!(tall.with_seed(22).map_count(), 6);

        let coords: Vec<(i32, i32)> = (0..256).map(|i| (i * 41 + 3, i * 23 - 999)).collect();
        for &(x, z) in &coords {
            assert_eq!(tall.get_biome(x, 0, z).unwrap(), flat.get_biome(x, 0, z).unwrap());
        }
        // y = 50 units = 200 blocks, the third layer.
        let differs = coords
            .iter()
            .filter(|&&(x, z)| tall.get_biome(x, 50, z).unwrap() != tall.get_biome(x, 0, z).unwrap())
            .count();
        assert!(differs > 0, "upper layer matched the bottom layer everywhere");
    }

    #[test]
    fn test_vertical_biomes_disabled_keeps_single_map() {
        let mut config = Config::default();
        config.generator.vertical_biomes_in_tall_nether = false;
        let mut context = BiomeContext::new(&config);
        vanilla::register(&mut context).unwrap();
        let mut snapshot = vanilla::snapshot(1);
        context.init_registry(&mut snapshot);

        let tall = BiomeSourceAdapter::tall_nether(&mut context, &snapshot, 3, 512);
        assert_eq!(tall.map_count(), 1);
        assert_eq!(tall.get_biome(40, 100, 40).unwrap(), tall.get_biome(40, 0, 40).unwrap());
    }

    #[test]
    fn test_end_terrain_selects_land_map() {
        let (mut context, snapshot) = vanilla_context();
        let end = BiomeSourceAdapter::end(&mut context, &snapshot, 5, |_: i32, _: i32| true);
        let land_ids = [vanilla::THE_END, vanilla::END_MIDLANDS, vanilla::END_HIGHLANDS].map(BiomeId::parse);
        for i in 0..128 {
            let id = end.get_biome(2000 + i * 53, 0, -2000 - i * 17).unwrap();
            assert!(land_ids.contains(&id), "land lookup returned {id}");
        }
    }

    #[test]
    fn test_datapack_biome_admitted_for_matching_dimension() {
        let mut context = BiomeContext::default();
        vanilla::register(&mut context).unwrap();
        let mut snapshot = vanilla::snapshot(1);
        snapshot.insert(
            BiomeDefinition::new(BiomeId::parse("pack:ember_fields"), HostCategory::Nether)
                .from_datapack()
                .with_weight(50.0),
        );
        context.init_registry(&mut snapshot);

        let nether = BiomeSourceAdapter::nether(&mut context, &snapshot, 3);
        let ember = BiomeId::parse("pack:ember_fields");
        assert!(nether.possible_biomes().contains(&ember));
        let hits = (0..256)
            .filter(|i| nether.get_biome(i * 97, 0, i * 61).unwrap() == ember)
            .count();
        assert!(hits > 0, "heavily weighted datapack biome never generated");

        let end = BiomeSourceAdapter::end(&mut context, &snapshot, 3, islands);
        assert!(!end.possible_biomes().contains(&ember));
    }

    #[test]
    fn test_entry_carries_engine_handle() {
        let (mut context, snapshot) = vanilla_context();
        let source = BiomeSourceAdapter::nether(&mut context, &snapshot, 77);
        let entry = source.get_biome_entry(100, 0, 100).unwrap();
        let handle = snapshot.get(entry.id()).unwrap().handle();
        assert_eq!(entry.handle(), Some(handle));
    }

    #[test]
    fn test_empty_category_reports_no_biomes() {
        let mut context = BiomeContext::new(&Config::default());
        let snapshot = RegistrySnapshot::new(1);
        let source = BiomeSourceAdapter::nether(&mut context, &snapshot, 0);
        assert!(source.possible_biomes().is_empty());
        assert_eq!(source.get_biome(1, 0, 1), Err(BiomeError::NoBiomesAvailable));
    }

    #[test]
    fn test_concurrent_lookups_agree() {
        let (mut context, snapshot) = vanilla_context();
        let source = Arc::new(BiomeSourceAdapter::end(&mut context, &snapshot, 99, islands));
        let coords: Vec<(i32, i32)> = (0..512).map(|i| (i * 13 - 2048, 4096 - i * 7)).collect();
        let expected: Vec<BiomeId> = coords
            .iter()
            .map(|&(x, z)| source.get_biome(x, 0, z).unwrap())
            .collect();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let source = Arc::clone(&source);
                let coords = coords.clone();
                std::thread::spawn(move || {
                    coords
                        .iter()
                        .map(|&(x, z)| source.get_biome(x, 0, z).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
