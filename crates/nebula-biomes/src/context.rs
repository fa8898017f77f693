//! Process-scoped biome state: registered entries, per-category pickers,
//! decoration ordering, structure starts, surface rules, and biome
//! modifications.
//!
//! Registration takes `&mut BiomeContext` and belongs to the single-threaded
//! setup phase. Biome sources snapshot what they need when they are built and
//! never reach back into the context while generating.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use nebula_config::{BiomesConfig, Config, GeneratorConfig};

use crate::biome::{
    BiomeDefinition, BiomeEntry, BiomeHandle, BiomeOrigin, GenerationCategory, HostCategory,
    RegistrySnapshot,
};
use crate::error::BiomeError;
use crate::feature_order::FeatureOrderResolver;
use crate::ident::{BiomeId, DimensionId, SettingsId, SurfaceRuleId};
use crate::picker::WeightedBiomePicker;
use crate::settings::{ConfiguredStructure, GeneratorSettings};
use crate::structure::StructureReplacementRegistry;
use crate::surface::SurfaceRuleAggregator;

// ---------------------------------------------------------------------------
// Modifications
// ---------------------------------------------------------------------------

/// Callback run on a biome definition when it enters the active registry.
pub trait BiomeModification: Send + Sync {
    /// Mutate the definition of `id`.
    fn modify(&self, id: &BiomeId, biome: &mut BiomeDefinition);
}

/// Blanket implementation for closures.
impl<F> BiomeModification for F
where
    F: Fn(&BiomeId, &mut BiomeDefinition) + Send + Sync,
{
    fn modify(&self, id: &BiomeId, biome: &mut BiomeDefinition) {
        self(id, biome);
    }
}

fn dimension_of(host: HostCategory) -> DimensionId {
    match host {
        HostCategory::Overworld => DimensionId::overworld(),
        HostCategory::Nether => DimensionId::nether(),
        HostCategory::TheEnd => DimensionId::end(),
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Explicit container for every process-wide biome table.
///
/// Built once at startup, filled during setup, and re-initialised on each
/// registry reload with [`init_registry`](Self::init_registry).
pub struct BiomeContext {
    generator: GeneratorConfig,
    overrides: BiomesConfig,
    biomes: HashMap<BiomeId, Arc<BiomeEntry>>,
    builtin: HashSet<BiomeId>,
    pickers: [WeightedBiomePicker; 3],
    handles: HashMap<BiomeHandle, BiomeId>,
    registry_generation: Option<u64>,
    feature_order: FeatureOrderResolver,
    surface_rules: SurfaceRuleAggregator,
    structures: StructureReplacementRegistry,
    generator_settings: Vec<GeneratorSettings>,
    modifications: BTreeMap<DimensionId, Vec<Box<dyn BiomeModification>>>,
    modified: HashSet<BiomeId>,
}

impl Default for BiomeContext {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl fmt::Debug for BiomeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BiomeContext")
            .field("biomes", &self.biomes.len())
            .field("registry_generation", &self.registry_generation)
            .field("features_ordered", &self.feature_order.len())
            .field("surface_rules", &self.surface_rules.len())
            .field("structures", &self.structures.len())
            .field("generator_settings", &self.generator_settings.len())
            .finish_non_exhaustive()
    }
}

impl BiomeContext {
    /// Creates an empty context configured from `config`.
    pub fn new(config: &Config) -> Self {
        Self {
            generator: config.generator.clone(),
            overrides: config.biomes.clone(),
            biomes: HashMap::new(),
            builtin: HashSet::new(),
            pickers: Default::default(),
            handles: HashMap::new(),
            registry_generation: None,
            feature_order: FeatureOrderResolver::new(),
            surface_rules: SurfaceRuleAggregator::new(),
            structures: StructureReplacementRegistry::new(),
            generator_settings: Vec::new(),
            modifications: BTreeMap::new(),
            modified: HashSet::new(),
        }
    }

    /// Biome source settings this context was created with.
    pub fn generator_config(&self) -> &GeneratorConfig {
        &self.generator
    }

    // --- Registration ---

    /// Registers an entry (and its sub-biomes) for lookup, without placing it
    /// in any picker.
    ///
    /// # Errors
    ///
    /// Returns [`BiomeError::InvalidWeight`] for non-positive weights.
    pub fn register_biome(&mut self, entry: BiomeEntry) -> Result<Arc<BiomeEntry>, BiomeError> {
        if let Err(err) = entry.validate() {
            tracing::warn!("Rejected biome {}: {}", entry.id(), err);
            return Err(err);
        }
        let entry = Arc::new(entry);
        self.index_hierarchy(&entry);
        Ok(entry)
    }

    /// Registers an entry into a generation category's picker.
    ///
    /// Config overrides for the biome (`namespace.path`) replace its weight and
    /// fog density before the entry is validated.
    ///
    /// # Errors
    ///
    /// Returns [`BiomeError::InvalidWeight`] for non-positive weights.
    pub fn register_in_category(
        &mut self,
        category: GenerationCategory,
        entry: BiomeEntry,
    ) -> Result<Arc<BiomeEntry>, BiomeError> {
        let entry = Arc::new(self.apply_overrides(entry).into_category(category));
        self.pickers[category.index()].add(Arc::clone(&entry), false)?;
        self.index_hierarchy(&entry);
        tracing::debug!("Registered {} biome {}", category.name(), entry.id());
        Ok(entry)
    }

    /// Registers a Nether biome.
    ///
    /// # Errors
    ///
    /// See [`register_in_category`](Self::register_in_category).
    pub fn register_nether_biome(&mut self, entry: BiomeEntry) -> Result<Arc<BiomeEntry>, BiomeError> {
        self.register_in_category(GenerationCategory::Nether, entry)
    }

    /// Registers an End island biome.
    ///
    /// # Errors
    ///
    /// See [`register_in_category`](Self::register_in_category).
    pub fn register_end_land_biome(
        &mut self,
        entry: BiomeEntry,
    ) -> Result<Arc<BiomeEntry>, BiomeError> {
        self.register_in_category(GenerationCategory::EndLand, entry)
    }

    /// Registers an End void biome.
    ///
    /// # Errors
    ///
    /// See [`register_in_category`](Self::register_in_category).
    pub fn register_end_void_biome(
        &mut self,
        entry: BiomeEntry,
    ) -> Result<Arc<BiomeEntry>, BiomeError> {
        self.register_in_category(GenerationCategory::EndVoid, entry)
    }

    /// Attaches `sub` to a registered parent with replacement probability `chance`.
    ///
    /// The parent (and every ancestor above it) is replaced by an updated copy,
    /// in the lookup table and in whichever picker holds the hierarchy.
    ///
    /// # Errors
    ///
    /// Returns [`BiomeError::UnknownParent`], [`BiomeError::InvalidWeight`], or
    /// [`BiomeError::InvalidChance`]; nothing changes on error.
    pub fn register_sub_biome(
        &mut self,
        parent: &BiomeId,
        sub: BiomeEntry,
        chance: f64,
    ) -> Result<Arc<BiomeEntry>, BiomeError> {
        let Some(parent_entry) = self.biomes.get(parent).cloned() else {
            let err = BiomeError::UnknownParent {
                parent: parent.clone(),
                child: sub.id().clone(),
            };
            tracing::warn!("{err}");
            return Err(err);
        };
        if let Err(err) = sub.validate() {
            tracing::warn!("Rejected sub-biome {}: {}", sub.id(), err);
            return Err(err);
        }

        let sub_id = sub.id().clone();
        let sub = self.apply_overrides(sub);
        let updated = (*parent_entry).clone().with_sub_biome(sub, chance)?;
        self.replace_in_tree(updated)?;
        tracing::debug!("Registered sub-biome {sub_id} of {parent} (chance {chance})");
        Ok(self.biome(&sub_id))
    }

    /// Registers biomes contributed by other biome APIs, skipping identities
    /// already known. Returns how many were added.
    pub fn import_external_biomes(
        &mut self,
        category: GenerationCategory,
        biomes: impl IntoIterator<Item = (BiomeId, f64)>,
    ) -> usize {
        let mut added = 0;
        for (id, weight) in biomes {
            if self.has_biome(&id) {
                continue;
            }
            if self
                .register_in_category(category, BiomeEntry::new(id).with_weight(weight))
                .is_ok()
            {
                added += 1;
            }
        }
        if added > 0 {
            tracing::info!("Imported {added} external {} biomes", category.name());
        }
        added
    }

    // --- Lookups ---

    /// Returns `true` if the identity has been registered.
    pub fn has_biome(&self, id: &BiomeId) -> bool {
        self.biomes.contains_key(id)
    }

    /// Entry for `id`, or the placeholder entry if it was never registered.
    pub fn biome(&self, id: &BiomeId) -> Arc<BiomeEntry> {
        self.biomes.get(id).cloned().unwrap_or_else(BiomeEntry::empty)
    }

    /// Entry for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`BiomeError::UnknownBiomeIdentity`] if it was never registered.
    pub fn try_biome(&self, id: &BiomeId) -> Result<Arc<BiomeEntry>, BiomeError> {
        self.biomes
            .get(id)
            .cloned()
            .ok_or_else(|| BiomeError::UnknownBiomeIdentity(id.clone()))
    }

    /// Identity bound to an engine handle by the active registry.
    pub fn biome_id(&self, handle: BiomeHandle) -> Option<&BiomeId> {
        self.handles.get(&handle)
    }

    /// Entry for an engine handle, or the placeholder entry.
    pub fn biome_by_handle(&self, handle: BiomeHandle) -> Arc<BiomeEntry> {
        match self.handles.get(&handle) {
            Some(id) => self.biome(id),
            None => BiomeEntry::empty(),
        }
    }

    /// Returns `true` for identities that were not registered at startup.
    pub fn is_datapack_biome(&self, id: &BiomeId) -> bool {
        !self.builtin.contains(id)
    }

    /// Returns `true` if `id`, or the hierarchy root it belongs to, is in the
    /// picker of `category`.
    pub fn is_in_category(&self, id: &BiomeId, category: GenerationCategory) -> bool {
        let picker = &self.pickers[category.index()];
        let mut current = id;
        loop {
            if picker.contains(current) {
                return true;
            }
            match self.biomes.get(current).and_then(|entry| entry.parent()) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Returns `true` for Nether biomes.
    pub fn is_nether_biome(&self, id: &BiomeId) -> bool {
        self.is_in_category(id, GenerationCategory::Nether)
    }

    /// Returns `true` for End island or End void biomes.
    pub fn is_end_biome(&self, id: &BiomeId) -> bool {
        self.is_in_category(id, GenerationCategory::EndLand)
            || self.is_in_category(id, GenerationCategory::EndVoid)
    }

    /// Picker of a generation category.
    pub fn picker(&self, category: GenerationCategory) -> &WeightedBiomePicker {
        &self.pickers[category.index()]
    }

    /// The global feature order table.
    pub fn feature_order(&self) -> &FeatureOrderResolver {
        &self.feature_order
    }

    // --- Surface rules and structures ---

    /// Associates a surface rule with a biome (last write wins).
    pub fn register_surface_rule(&mut self, biome: BiomeId, rule: SurfaceRuleId) {
        self.surface_rules.register_surface_rule(biome, rule);
    }

    /// Surface rule registered for `biome`.
    pub fn surface_rule(&self, biome: &BiomeId) -> Option<&SurfaceRuleId> {
        self.surface_rules.get(biome)
    }

    /// Makes `structure` eligible in `biome` in every known generator settings
    /// object, and in every one registered later.
    pub fn register_structure(&mut self, structure: ConfiguredStructure, biome: BiomeId) -> bool {
        self.structures
            .register_structure(structure, biome, self.generator_settings.iter_mut())
    }

    /// Drops every recorded structure registration.
    pub fn clear_structure_starts(&mut self) {
        self.structures.clear();
    }

    /// Adds a generator settings object, replaying every structure
    /// registration into it and, once a registry is active, installing the
    /// surface rules of every biome in that registry.
    ///
    /// Replaces a previously registered object with the same identity.
    pub fn register_generator_settings(&mut self, mut settings: GeneratorSettings) -> &GeneratorSettings {
        self.structures.apply(&mut settings);
        if self.registry_generation.is_some() {
            let active: HashSet<BiomeId> = self.handles.values().cloned().collect();
            self.surface_rules.apply_to_level(&active, &mut settings);
        }

        let index = match self
            .generator_settings
            .iter()
            .position(|known| known.id() == settings.id())
        {
            Some(index) => {
                self.generator_settings[index] = settings;
                index
            }
            None => {
                self.generator_settings.push(settings);
                self.generator_settings.len() - 1
            }
        };
        &self.generator_settings[index]
    }

    /// Known generator settings object by identity.
    pub fn generator_settings(&self, id: &SettingsId) -> Option<&GeneratorSettings> {
        self.generator_settings.iter().find(|s| s.id() == id)
    }

    // --- Modifications ---

    /// Registers a modification for biomes of `dimension`.
    pub fn register_modification<M: BiomeModification + 'static>(
        &mut self,
        dimension: DimensionId,
        modification: M,
    ) {
        self.modifications
            .entry(dimension)
            .or_default()
            .push(Box::new(modification));
    }

    /// Registers a modification for Overworld biomes.
    pub fn register_overworld_modification<M: BiomeModification + 'static>(&mut self, modification: M) {
        self.register_modification(DimensionId::overworld(), modification);
    }

    /// Registers a modification for Nether biomes.
    pub fn register_nether_modification<M: BiomeModification + 'static>(&mut self, modification: M) {
        self.register_modification(DimensionId::nether(), modification);
    }

    /// Registers a modification for End biomes.
    pub fn register_end_modification<M: BiomeModification + 'static>(&mut self, modification: M) {
        self.register_modification(DimensionId::end(), modification);
    }

    // --- Registry lifecycle ---

    /// Binds the context to a new active registry.
    ///
    /// Engine handles are bound into every entry, datapack entries from the
    /// previous registry are forgotten, the feature order is seeded from the
    /// built-in `minecraft` biomes on first use, and every definition in the
    /// snapshot goes through modifications and feature sorting.
    ///
    /// Returns `false` without doing anything if this snapshot generation is
    /// already active.
    pub fn init_registry(&mut self, snapshot: &mut RegistrySnapshot) -> bool {
        if self.registry_generation == Some(snapshot.generation()) {
            return false;
        }
        self.registry_generation = Some(snapshot.generation());
        self.modified.clear();

        let handles = snapshot.handles();
        self.handles = handles.iter().map(|(id, handle)| (*handle, id.clone())).collect();
        self.biomes.retain(|id, _| self.builtin.contains(id));

        for picker in &mut self.pickers {
            picker.clear_mutable();
            picker.rebind(&handles);
            picker.rebuild();
        }
        let roots: Vec<Arc<BiomeEntry>> = self
            .pickers
            .iter()
            .flat_map(|picker| picker.entries().cloned())
            .collect();
        for root in &roots {
            self.index_hierarchy(root);
        }
        for entry in self.biomes.values_mut() {
            *entry = Arc::new(entry.rebind(&handles));
        }

        self.feature_order.seed_from_base(
            snapshot
                .iter()
                .filter(|def| {
                    def.origin == BiomeOrigin::Builtin && def.id.ident().namespace() == "minecraft"
                })
                .map(|def| &def.generation),
        );
        for def in snapshot.iter_mut() {
            let dimension = dimension_of(def.host_category);
            self.on_added_biome(&dimension, def);
        }

        tracing::info!(
            "Initialised biome registry generation {}: {} biomes, {} features ordered",
            snapshot.generation(),
            snapshot.len(),
            self.feature_order.len()
        );
        true
    }

    /// Prepares a generated level of `dimension` whose source can produce `possible`.
    ///
    /// Installs the surface rules of those biomes into the dimension's generator
    /// settings (clearing stale rules when none apply) and runs the dimension's
    /// modifications and feature sorting on their definitions.
    pub fn apply_to_level(
        &mut self,
        dimension: &DimensionId,
        possible: &[BiomeId],
        snapshot: &mut RegistrySnapshot,
    ) {
        let active: HashSet<BiomeId> = possible.iter().cloned().collect();
        let settings_id = dimension.settings_id();
        if let Some(settings) = self
            .generator_settings
            .iter_mut()
            .find(|s| s.id() == &settings_id)
        {
            self.surface_rules.apply_to_level(&active, settings);
        }

        for id in possible {
            if let Some(def) = snapshot.get_mut(id) {
                self.on_added_biome(dimension, def);
            }
        }
    }

    /// Snapshot of a category's picker for a new biome source.
    ///
    /// The overlay is refilled with datapack definitions of the category's host
    /// classification (when `admit_datapack` is set), built from their declared
    /// weight and fog density, then the picker is rebuilt.
    pub(crate) fn prepare_picker(
        &mut self,
        category: GenerationCategory,
        snapshot: &RegistrySnapshot,
        admit_datapack: bool,
    ) -> Arc<WeightedBiomePicker> {
        let index = category.index();
        self.pickers[index].clear_mutable();

        if admit_datapack {
            let handles = snapshot.handles();
            let host = category.host_category();
            let admitted: Vec<Arc<BiomeEntry>> = snapshot
                .iter()
                .filter(|def| def.host_category == host && self.is_datapack_biome(&def.id))
                .filter(|def| !self.pickers[index].contains_immutable(&def.id))
                .map(|def| {
                    Arc::new(
                        BiomeEntry::new(def.id.clone())
                            .with_weight(def.weight)
                            .with_fog_density(def.fog_density)
                            .into_category(category)
                            .rebind(&handles),
                    )
                })
                .collect();
            for entry in admitted {
                if self.pickers[index].add(Arc::clone(&entry), true).is_ok() {
                    self.biomes.insert(entry.id().clone(), entry);
                }
            }
        }

        let picker = &mut self.pickers[index];
        picker.rebuild();
        Arc::new(picker.clone())
    }

    // --- Internals ---

    fn apply_overrides(&self, mut entry: BiomeEntry) -> BiomeEntry {
        let key = entry.id().ident().config_key();
        if let Some(overrides) = self.overrides.get(&key) {
            if let Some(weight) = overrides.generation_chance {
                entry = entry.with_weight(weight);
            }
            if let Some(fog) = overrides.fog_density {
                entry = entry.with_fog_density(fog);
            }
            tracing::debug!("Applied config overrides to {}", entry.id());
        }
        entry
    }

    /// Records `entry` and its descendants as registered, built-in identities.
    fn index_hierarchy(&mut self, entry: &Arc<BiomeEntry>) {
        self.builtin.insert(entry.id().clone());
        self.biomes.insert(entry.id().clone(), Arc::clone(entry));
        for sub in entry.sub_biomes() {
            self.index_hierarchy(&sub.entry);
        }
    }

    /// Stores an updated entry and propagates it up to its hierarchy root.
    fn replace_in_tree(&mut self, updated: BiomeEntry) -> Result<(), BiomeError> {
        let entry = Arc::new(updated);
        self.index_hierarchy(&entry);

        if let Some(parent_id) = entry.parent().cloned() {
            if let Some(parent) = self.biomes.get(&parent_id) {
                let mut parent = (**parent).clone();
                parent.replace_sub_biome(entry);
                return self.replace_in_tree(parent);
            }
            return Ok(());
        }

        for picker in &mut self.pickers {
            if picker.contains(entry.id()) {
                let mutable = !picker.contains_immutable(entry.id());
                picker.add(Arc::clone(&entry), mutable)?;
            }
        }
        Ok(())
    }

    /// Runs `dimension`'s modifications on a definition entering the active
    /// registry, then sorts its features.
    ///
    /// Built-in biomes are modified the first time they are observed in the
    /// active registry; datapack biomes every time.
    fn on_added_biome(&mut self, dimension: &DimensionId, def: &mut BiomeDefinition) {
        if let Some(modifications) = self.modifications.get(dimension) {
            let modify = def.origin == BiomeOrigin::Datapack || self.modified.insert(def.id.clone());
            if modify {
                let id = def.id.clone();
                for modification in modifications {
                    modification.modify(&id, def);
                }
                tracing::trace!("Applied {} modifications to {}", modifications.len(), id);
            }
        }
        self.feature_order.sort_biome(&mut def.generation);
    }
}
