//! Weighted biome picker: an immutable base set plus a per-world mutable overlay,
//! sampled through a cumulative-weight table.

use std::sync::Arc;

use hashbrown::HashMap;
use rand::Rng;

use crate::biome::{BiomeEntry, BiomeHandle};
use crate::error::BiomeError;
use crate::ident::BiomeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Immutable(usize),
    Mutable(usize),
}

/// Search table built from the union of both partitions at the last rebuild.
#[derive(Clone, Debug, Default)]
struct SamplingTable {
    entries: Vec<Arc<BiomeEntry>>,
    cumulative: Vec<f64>,
    total_weight: f64,
}

/// Weighted sampler over [`BiomeEntry`] values.
///
/// Entries live in two partitions: the immutable set (known at startup, never
/// removed) and the mutable overlay (biomes that exist only for the current
/// world, cleared on every registry swap). An identity present in the
/// immutable set is never duplicated into the overlay.
///
/// Sampling goes through a cumulative-weight table that must be rebuilt with
/// [`rebuild`](Self::rebuild) after any change. Picking from a stale table
/// panics in debug builds; release builds silently sample the table as it was
/// at the last rebuild.
#[derive(Clone, Debug, Default)]
pub struct WeightedBiomePicker {
    immutable: Vec<Arc<BiomeEntry>>,
    mutable: Vec<Arc<BiomeEntry>>,
    slots: HashMap<BiomeId, Slot>,
    table: SamplingTable,
    revision: u64,
    built_revision: u64,
}

impl WeightedBiomePicker {
    /// Creates an empty picker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry into the immutable set or the mutable overlay.
    ///
    /// Re-adding an identity to the same partition replaces the stored entry in
    /// place (weight, fog, and sub-biomes update; insertion order does not).
    /// Adding an identity to the overlay that the immutable set already holds
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`BiomeError::InvalidWeight`] for non-positive weights; the
    /// picker is left unchanged.
    pub fn add(
        &mut self,
        entry: impl Into<Arc<BiomeEntry>>,
        mutable: bool,
    ) -> Result<(), BiomeError> {
        let entry = entry.into();
        if let Err(err) = entry.validate() {
            tracing::warn!("Rejected biome {}: {}", entry.id(), err);
            return Err(err);
        }

        match (self.slots.get(entry.id()).copied(), mutable) {
            (Some(Slot::Immutable(_)), true) => {
                tracing::debug!(
                    "Biome {} already in immutable set, overlay skipped",
                    entry.id()
                );
                return Ok(());
            }
            (Some(Slot::Immutable(index)), false) => self.immutable[index] = entry,
            (Some(Slot::Mutable(index)), true) => self.mutable[index] = entry,
            (Some(Slot::Mutable(index)), false) => {
                self.mutable.remove(index);
                self.reindex_mutable();
                self.push_immutable(entry);
            }
            (None, true) => {
                self.slots
                    .insert(entry.id().clone(), Slot::Mutable(self.mutable.len()));
                self.mutable.push(entry);
            }
            (None, false) => self.push_immutable(entry),
        }
        self.revision += 1;
        Ok(())
    }

    /// Empties the mutable overlay, leaving the immutable set intact.
    pub fn clear_mutable(&mut self) {
        if self.mutable.is_empty() {
            return;
        }
        for entry in self.mutable.drain(..) {
            self.slots.remove(entry.id());
        }
        self.revision += 1;
    }

    /// Binds engine handles throughout every entry's hierarchy.
    pub fn rebind(&mut self, handles: &HashMap<BiomeId, BiomeHandle>) {
        for entry in self.immutable.iter_mut().chain(self.mutable.iter_mut()) {
            *entry = Arc::new(entry.rebind(handles));
        }
        self.revision += 1;
    }

    /// Rebuilds the cumulative-weight table from both partitions.
    pub fn rebuild(&mut self) {
        let entries: Vec<Arc<BiomeEntry>> = self
            .immutable
            .iter()
            .chain(self.mutable.iter())
            .cloned()
            .collect();
        let mut total_weight = 0.0;
        let cumulative: Vec<f64> = entries
            .iter()
            .map(|entry| {
                total_weight += entry.weight();
                total_weight
            })
            .collect();
        tracing::debug!(
            "Rebuilt biome picker: {} immutable, {} overlay, total weight {}",
            self.immutable.len(),
            self.mutable.len(),
            total_weight
        );
        self.table = SamplingTable {
            entries,
            cumulative,
            total_weight,
        };
        self.built_revision = self.revision;
    }

    /// Returns `true` if the partitions changed since the last rebuild.
    pub fn is_stale(&self) -> bool {
        self.revision != self.built_revision
    }

    /// Draws one entry using a single uniform draw from `rng`.
    ///
    /// The draw lands in `[0, total_weight)`; a value exactly on the boundary
    /// between two ranges resolves to the lower-indexed entry.
    ///
    /// # Errors
    ///
    /// Returns [`BiomeError::NoBiomesAvailable`] when the table is empty.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if the picker is stale.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&Arc<BiomeEntry>, BiomeError> {
        debug_assert!(
            !self.is_stale(),
            "biome picker sampled before rebuild (revision {}, built {})",
            self.revision,
            self.built_revision
        );
        let table = &self.table;
        if table.entries.is_empty() || table.total_weight <= 0.0 {
            return Err(BiomeError::NoBiomesAvailable);
        }
        let value = rng.random::<f64>() * table.total_weight;
        let index = table
            .cumulative
            .partition_point(|&edge| edge < value)
            .min(table.entries.len() - 1);
        Ok(&table.entries[index])
    }

    /// Like [`pick`](Self::pick) but reports a stale table as an error in every build.
    ///
    /// # Errors
    ///
    /// Returns [`BiomeError::StaleSamplingStructure`] or [`BiomeError::NoBiomesAvailable`].
    pub fn try_pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&Arc<BiomeEntry>, BiomeError> {
        if self.is_stale() {
            return Err(BiomeError::StaleSamplingStructure {
                current: self.revision,
                built: self.built_revision,
            });
        }
        self.pick(rng)
    }

    /// Returns `true` if the identity is in the immutable set.
    pub fn contains_immutable(&self, id: &BiomeId) -> bool {
        matches!(self.slots.get(id), Some(Slot::Immutable(_)))
    }

    /// Returns `true` if the identity is in either partition.
    pub fn contains(&self, id: &BiomeId) -> bool {
        self.slots.contains_key(id)
    }

    /// Entry for an identity in either partition.
    pub fn get(&self, id: &BiomeId) -> Option<&Arc<BiomeEntry>> {
        self.slots.get(id).map(|slot| match *slot {
            Slot::Immutable(index) => &self.immutable[index],
            Slot::Mutable(index) => &self.mutable[index],
        })
    }

    /// All entries: immutable set first, then the overlay, each in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &Arc<BiomeEntry>> {
        self.immutable.iter().chain(self.mutable.iter())
    }

    /// Total weight of the table as of the last rebuild.
    pub fn total_weight(&self) -> f64 {
        self.table.total_weight
    }

    /// Number of entries in both partitions.
    pub fn len(&self) -> usize {
        self.immutable.len() + self.mutable.len()
    }

    /// Returns `true` if both partitions are empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries in the mutable overlay.
    pub fn mutable_len(&self) -> usize {
        self.mutable.len()
    }

    fn push_immutable(&mut self, entry: Arc<BiomeEntry>) {
        self.slots
            .insert(entry.id().clone(), Slot::Immutable(self.immutable.len()));
        self.immutable.push(entry);
    }

    fn reindex_mutable(&mut self) {
        for (index, entry) in self.mutable.iter().enumerate() {
            self.slots.insert(entry.id().clone(), Slot::Mutable(index));
        }
    }
}
