//! Registry snapshot: the host's keyed collection of biome definitions for one world.

use hashbrown::HashMap;

use super::BiomeDefinition;
use crate::ident::BiomeId;

/// Opaque engine-level biome handle (the host registry's raw id).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BiomeHandle(pub u32);

/// Enumerable, keyed biome definitions as seen by one world load or datapack reload.
///
/// Handles are assigned in insertion order. `generation` distinguishes one
/// snapshot from the next so repeated initialisation with the same snapshot
/// can be detected.
#[derive(Clone, Debug, Default)]
pub struct RegistrySnapshot {
    generation: u64,
    biomes: Vec<BiomeDefinition>,
    by_id: HashMap<BiomeId, usize>,
}

impl RegistrySnapshot {
    /// Creates an empty snapshot tagged with `generation`.
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            biomes: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    /// Reload counter of this snapshot.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Inserts or replaces a definition and returns its handle.
    ///
    /// Replacing keeps the existing handle.
    pub fn insert(&mut self, mut def: BiomeDefinition) -> BiomeHandle {
        if let Some(&index) = self.by_id.get(&def.id) {
            def.handle = self.biomes[index].handle;
            self.biomes[index] = def;
            return self.biomes[index].handle;
        }
        let index = self.biomes.len();
        def.handle = BiomeHandle(index as u32);
        self.by_id.insert(def.id.clone(), index);
        self.biomes.push(def);
        BiomeHandle(index as u32)
    }

    /// Definition by identity.
    pub fn get(&self, id: &BiomeId) -> Option<&BiomeDefinition> {
        self.by_id.get(id).map(|&index| &self.biomes[index])
    }

    /// Mutable definition by identity.
    pub fn get_mut(&mut self, id: &BiomeId) -> Option<&mut BiomeDefinition> {
        self.by_id.get(id).map(|&index| &mut self.biomes[index])
    }

    /// Definition by engine handle.
    pub fn by_handle(&self, handle: BiomeHandle) -> Option<&BiomeDefinition> {
        self.biomes.get(handle.0 as usize)
    }

    /// Returns `true` if the identity is present.
    pub fn contains(&self, id: &BiomeId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Definitions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &BiomeDefinition> {
        self.biomes.iter()
    }

    /// Mutable definitions in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BiomeDefinition> {
        self.biomes.iter_mut()
    }

    /// Identity → handle table.
    pub fn handles(&self) -> HashMap<BiomeId, BiomeHandle> {
        self.biomes
            .iter()
            .map(|def| (def.id.clone(), def.handle))
            .collect()
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    /// Returns `true` if the snapshot holds no definitions.
    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::HostCategory;

    #[test]
    fn test_handles_follow_insertion_order() {
        let mut snapshot = RegistrySnapshot::new(1);
        let a = snapshot.insert(BiomeDefinition::new("a".into(), HostCategory::Nether));
        let b = snapshot.insert(BiomeDefinition::new("b".into(), HostCategory::Nether));
        assert_eq!(a, BiomeHandle(0));
        assert_eq!(b, BiomeHandle(1));
        assert_eq!(snapshot.by_handle(b).unwrap().id, BiomeId::parse("b"));
    }

    #[test]
    fn test_replace_keeps_handle() {
        let mut snapshot = RegistrySnapshot::new(1);
        snapshot.insert(BiomeDefinition::new("a".into(), HostCategory::Nether));
        let again = snapshot.insert(
            BiomeDefinition::new("a".into(), HostCategory::TheEnd).from_datapack(),
        );
        assert_eq!(again, BiomeHandle(0));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(
            snapshot.get(&BiomeId::parse("a")).unwrap().host_category,
            HostCategory::TheEnd
        );
    }
}
