//! Process-wide, append-only ordering of placed features.
//!
//! Every distinct feature receives an index the first time it is seen; the
//! index never changes afterwards. Sorting a decoration phase by these indices
//! keeps features that were already baked into generated terrain in the same
//! relative order no matter which biomes are registered later.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use dashmap::DashMap;
use hashbrown::HashSet;

use crate::biome::GenerationSettings;
use crate::ident::FeatureId;

/// Sort key for features that have no index.
pub const UNASSIGNED_INDEX: u32 = u32::MAX;

/// Global first-seen feature index table.
///
/// All methods take `&self`; concurrent callers assigning the same feature
/// observe the same index.
#[derive(Debug, Default)]
pub struct FeatureOrderResolver {
    order: DashMap<FeatureId, u32>,
    next: AtomicU32,
    seeded: AtomicBool,
}

impl FeatureOrderResolver {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns indices to the built-in features, in declaration order.
    ///
    /// Runs once; later calls return `false` without touching the table.
    pub fn seed_from_base<'a>(
        &self,
        base: impl IntoIterator<Item = &'a GenerationSettings>,
    ) -> bool {
        if self.seeded.swap(true, Ordering::AcqRel) {
            return false;
        }
        for settings in base {
            for (_, features) in settings.phases() {
                for feature in features {
                    self.assign_or_get(feature);
                }
            }
        }
        tracing::debug!("Seeded feature order with {} features", self.order.len());
        true
    }

    /// Returns `true` once [`seed_from_base`](Self::seed_from_base) has run.
    pub fn is_seeded(&self) -> bool {
        self.seeded.load(Ordering::Acquire)
    }

    /// Index of `feature`, assigning the next free index if unseen.
    pub fn assign_or_get(&self, feature: &FeatureId) -> u32 {
        if let Some(index) = self.order.get(feature) {
            return *index;
        }
        *self
            .order
            .entry(feature.clone())
            .or_insert_with(|| self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Index of `feature` if it has one.
    pub fn index_of(&self, feature: &FeatureId) -> Option<u32> {
        self.order.get(feature).map(|index| *index)
    }

    /// Number of features with an index.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if no feature has an index yet.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Deduplicates `features`, indexes unseen members, and returns them
    /// stably sorted by index.
    ///
    /// Duplicates collapse onto their first occurrence before sorting.
    pub fn sort_phase(&self, features: &[FeatureId]) -> Vec<FeatureId> {
        let mut seen = HashSet::with_capacity(features.len());
        let mut keyed: Vec<(u32, FeatureId)> = features
            .iter()
            .filter(|feature| seen.insert(*feature))
            .map(|feature| (self.assign_or_get(feature), feature.clone()))
            .collect();
        keyed.sort_by_key(|(index, _)| *index);
        keyed.into_iter().map(|(_, feature)| feature).collect()
    }

    /// Sorts every decoration phase of a biome in place.
    pub fn sort_biome(&self, settings: &mut GenerationSettings) {
        for list in settings.phase_lists_mut() {
            *list = self.sort_phase(list);
        }
    }

    /// Stable sort by the current table without assigning new indices.
    ///
    /// Unknown features go last, in their original relative order.
    pub fn sort_known(&self, features: &mut [FeatureId]) {
        features.sort_by_cached_key(|feature| self.index_of(feature).unwrap_or(UNASSIGNED_INDEX));
    }
}
