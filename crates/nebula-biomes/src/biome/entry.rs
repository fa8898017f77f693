//! Biome entries and their sub-biome hierarchy.

use std::sync::{Arc, LazyLock};

use hashbrown::HashMap;
use rand::Rng;

use super::{BiomeHandle, GenerationCategory};
use crate::error::BiomeError;
use crate::ident::BiomeId;

/// Identity of the placeholder biome returned for unknown lookups.
pub const EMPTY_BIOME_ID: &str = "minecraft:the_void";

static EMPTY: LazyLock<Arc<BiomeEntry>> =
    LazyLock::new(|| Arc::new(BiomeEntry::new(BiomeId::parse(EMPTY_BIOME_ID))));

/// A sub-biome node owned by its parent, with its replacement probability.
#[derive(Clone, Debug)]
pub struct SubBiome {
    /// The replacing biome.
    pub entry: Arc<BiomeEntry>,
    /// Probability in `(0, 1]` that this sub-biome replaces the parent.
    pub chance: f64,
}

/// A biome identity with its generation parameters.
///
/// Entries are immutable values once they reach a picker; changes produce a
/// new entry that replaces the old one under the same identity.
#[derive(Clone, Debug)]
pub struct BiomeEntry {
    id: BiomeId,
    weight: f64,
    fog_density: f32,
    parent: Option<BiomeId>,
    category: Option<GenerationCategory>,
    sub_biomes: Vec<SubBiome>,
    handle: Option<BiomeHandle>,
}

impl BiomeEntry {
    /// Creates an entry with weight `1.0` and fog density `1.0`.
    pub fn new(id: BiomeId) -> Self {
        Self {
            id,
            weight: 1.0,
            fog_density: 1.0,
            parent: None,
            category: None,
            sub_biomes: Vec::new(),
            handle: None,
        }
    }

    /// The shared placeholder entry (`minecraft:the_void`). Never registered anywhere.
    pub fn empty() -> Arc<Self> {
        Arc::clone(&EMPTY)
    }

    /// Returns `true` for the placeholder entry.
    pub fn is_empty(&self) -> bool {
        self.id.ident().as_str() == EMPTY_BIOME_ID
    }

    /// Sets the generation weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Sets the fog density.
    pub fn with_fog_density(mut self, fog_density: f32) -> Self {
        self.fog_density = fog_density;
        self
    }

    /// Appends a sub-biome in declaration order.
    ///
    /// A sub-biome with the same identity is replaced where it stands.
    ///
    /// # Errors
    ///
    /// Returns [`BiomeError::InvalidChance`] if `chance` is not in `(0, 1]`.
    pub fn with_sub_biome(mut self, sub: BiomeEntry, chance: f64) -> Result<Self, BiomeError> {
        if !(chance > 0.0 && chance <= 1.0) {
            return Err(BiomeError::InvalidChance { id: sub.id, chance });
        }
        let mut sub = sub;
        sub.parent = Some(self.id.clone());
        sub.category = self.category;
        let node = SubBiome {
            entry: Arc::new(sub),
            chance,
        };
        match self
            .sub_biomes
            .iter()
            .position(|s| s.entry.id == node.entry.id)
        {
            Some(index) => self.sub_biomes[index] = node,
            None => self.sub_biomes.push(node),
        }
        Ok(self)
    }

    /// Replaces the stored copy of an existing sub-biome, keeping its chance
    /// and position. Returns `false` if no direct sub-biome has that identity.
    pub(crate) fn replace_sub_biome(&mut self, sub: Arc<BiomeEntry>) -> bool {
        match self.sub_biomes.iter_mut().find(|s| s.entry.id == sub.id) {
            Some(slot) => {
                slot.entry = sub;
                true
            }
            None => false,
        }
    }

    /// Moves the entry, and every sub-biome below it, into `category`.
    pub(crate) fn into_category(mut self, category: GenerationCategory) -> Self {
        self.category = Some(category);
        self.sub_biomes = self
            .sub_biomes
            .iter()
            .map(|sub| SubBiome {
                entry: Arc::new((*sub.entry).clone().into_category(category)),
                chance: sub.chance,
            })
            .collect();
        self
    }

    /// Identity of this biome.
    pub fn id(&self) -> &BiomeId {
        &self.id
    }

    /// Generation weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Fog density.
    pub fn fog_density(&self) -> f32 {
        self.fog_density
    }

    /// Parent identity, for sub-biomes.
    pub fn parent(&self) -> Option<&BiomeId> {
        self.parent.as_ref()
    }

    /// Generation category the entry was registered into.
    pub fn category(&self) -> Option<GenerationCategory> {
        self.category
    }

    /// Sub-biomes in declaration order.
    pub fn sub_biomes(&self) -> &[SubBiome] {
        &self.sub_biomes
    }

    /// Engine handle bound by the active registry, if any.
    pub fn handle(&self) -> Option<BiomeHandle> {
        self.handle
    }

    /// Checks the weight invariant for sampling.
    ///
    /// # Errors
    ///
    /// Returns [`BiomeError::InvalidWeight`] for non-positive or non-finite weights.
    pub fn validate(&self) -> Result<(), BiomeError> {
        if self.weight.is_finite() && self.weight > 0.0 {
            Ok(())
        } else {
            Err(BiomeError::InvalidWeight {
                id: self.id.clone(),
                weight: self.weight,
            })
        }
    }

    /// Runs the sub-biome replacement walk starting at this entry.
    ///
    /// Each sub-biome, in declaration order, takes one draw from `rng`; the first
    /// draw below its chance wins and the walk continues into that sub-biome's own
    /// children. When no draw succeeds the current entry stands.
    pub fn resolve_sub_biome<R: Rng + ?Sized>(self: &Arc<Self>, rng: &mut R) -> Arc<BiomeEntry> {
        let mut current = Arc::clone(self);
        loop {
            let next = current
                .sub_biomes
                .iter()
                .find(|sub| rng.random::<f64>() < sub.chance)
                .map(|sub| Arc::clone(&sub.entry));
            match next {
                Some(sub) => current = sub,
                None => return current,
            }
        }
    }

    /// Returns a copy with engine handles bound throughout the hierarchy.
    ///
    /// Identities missing from `handles` lose any previous binding.
    pub fn rebind(&self, handles: &HashMap<BiomeId, BiomeHandle>) -> BiomeEntry {
        let mut bound = self.clone();
        bound.handle = handles.get(&self.id).copied();
        bound.sub_biomes = self
            .sub_biomes
            .iter()
            .map(|sub| SubBiome {
                entry: Arc::new(sub.entry.rebind(handles)),
                chance: sub.chance,
            })
            .collect();
        bound
    }

    /// Finds `id` among this entry and its descendants.
    pub fn find(&self, id: &BiomeId) -> Option<&BiomeEntry> {
        if &self.id == id {
            return Some(self);
        }
        self.sub_biomes.iter().find_map(|sub| sub.entry.find(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn entry(name: &str) -> BiomeEntry {
        BiomeEntry::new(BiomeId::parse(name))
    }

    #[test]
    fn test_zero_weight_rejected() {
        let err = entry("a").with_weight(0.0).validate().unwrap_err();
        assert!(matches!(err, BiomeError::InvalidWeight { .. }));
        assert!(entry("a").with_weight(f64::NAN).validate().is_err());
        assert!(entry("a").with_weight(-2.0).validate().is_err());
        assert!(entry("a").with_weight(0.1).validate().is_ok());
    }

    #[test]
    fn test_sub_biome_chance_bounds() {
        assert!(entry("a").with_sub_biome(entry("b"), 0.0).is_err());
        assert!(entry("a").with_sub_biome(entry("b"), 1.5).is_err());
        assert!(entry("a").with_sub_biome(entry("b"), 1.0).is_ok());
    }

    #[test]
    fn test_sub_biome_links_parent() {
        let parent = entry("a").with_sub_biome(entry("a1"), 0.5).unwrap();
        let sub = &parent.sub_biomes()[0];
        assert_eq!(sub.entry.parent(), Some(&BiomeId::parse("a")));
        assert!(parent.find(&BiomeId::parse("a1")).is_some());
    }

    #[test]
    fn test_first_successful_sub_biome_wins() {
        let parent = Arc::new(
            entry("p")
                .with_sub_biome(entry("first"), 1.0)
                .unwrap()
                .with_sub_biome(entry("second"), 1.0)
                .unwrap(),
        );
        for seed in 0..64 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let resolved = parent.resolve_sub_biome(&mut rng);
            assert_eq!(resolved.id(), &BiomeId::parse("first"));
        }
    }

    #[test]
    fn test_no_sub_biomes_returns_parent() {
        let parent = Arc::new(entry("p"));
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert!(Arc::ptr_eq(&parent.resolve_sub_biome(&mut rng), &parent));
    }

    #[test]
    fn test_rebind_reaches_sub_biomes() {
        let parent = entry("p").with_sub_biome(entry("c"), 0.5).unwrap();
        let mut handles = HashMap::new();
        handles.insert(BiomeId::parse("p"), BiomeHandle(3));
        handles.insert(BiomeId::parse("c"), BiomeHandle(9));
        let bound = parent.rebind(&handles);
        assert_eq!(bound.handle(), Some(BiomeHandle(3)));
        assert_eq!(bound.sub_biomes()[0].entry.handle(), Some(BiomeHandle(9)));
        assert_eq!(parent.handle(), None);
    }

    #[test]
    fn test_sub_biome_replaced_in_place() {
        let parent = entry("p")
            .with_sub_biome(entry("x"), 0.2)
            .unwrap()
            .with_sub_biome(entry("y"), 0.3)
            .unwrap()
            .with_sub_biome(entry("x").with_fog_density(0.5), 0.9)
            .unwrap();
        let order: Vec<_> = parent.sub_biomes().iter().map(|s| s.entry.id().to_string()).collect();
        assert_eq!(order, ["minecraft:x", "minecraft:y"]);
        assert_eq!(parent.sub_biomes()[0].chance, 0.9);
    }

    #[test]
    fn test_into_category_reaches_sub_biomes() {
        let parent = entry("p")
            .with_sub_biome(entry("c").with_sub_biome(entry("g"), 1.0).unwrap(), 0.5)
            .unwrap()
            .into_category(GenerationCategory::EndLand);
        let grandchild = parent.find(&BiomeId::parse("g")).unwrap();
        assert_eq!(grandchild.category(), Some(GenerationCategory::EndLand));
    }

    #[test]
    fn test_replace_sub_biome_keeps_chance() {
        let mut parent = entry("p").with_sub_biome(entry("c"), 0.25).unwrap();
        let updated = Arc::new(entry("c").with_weight(4.0));
        assert!(parent.replace_sub_biome(updated));
        assert_eq!(parent.sub_biomes()[0].chance, 0.25);
        assert_eq!(parent.sub_biomes()[0].entry.weight(), 4.0);
        assert!(!parent.replace_sub_biome(Arc::new(entry("other"))));
    }

    #[test]
    fn test_empty_placeholder() {
        let empty = BiomeEntry::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.id().to_string(), EMPTY_BIOME_ID);
    }
}
