//! Definition store: loading, contribution merging and override resolution.

use std::sync::{Arc, PoisonError, RwLock};

use hashbrown::{HashMap, HashSet};
use hotbar_types::{ContributionPack, IndexDocument, WeaponDocument};

use super::model::{OverridePatch, WeaponDefinition};
use super::source::{DocumentSource, normalize_path, read_json};
use super::normalize_item_id;
use crate::error::DefinitionError;

/// Counts reported after loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub definitions: usize,
    pub patches: usize,
    pub shorthand: usize,
    pub indexes_visited: usize,
    pub materialized: usize,
}

/// All known weapon definitions and the patches that derive new ones.
///
/// Loading and contribution registration take `&mut self` and are expected to
/// finish before the store is shared. After that the store is read-only apart
/// from the cache of materialized overrides, which sits behind a lock so that
/// [`resolve`](Self::resolve) works through `&self`.
#[derive(Debug, Default)]
pub struct DefinitionStore {
    /// Definitions read directly from weapon documents
    definitions: HashMap<String, Arc<WeaponDefinition>>,
    /// Rich overrides, keyed by the item they produce
    patches: HashMap<String, OverridePatch>,
    /// Shorthand overrides: item id -> definition id
    shorthand: HashMap<String, String>,
    /// (namespace, index path) pairs already walked
    visited: HashSet<(String, String)>,
    /// Overrides resolved so far
    materialized: RwLock<HashMap<String, Arc<WeaponDefinition>>>,
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Loading ────────────────────────────────────────────────────────────

    /// Walk an index document and everything it includes.
    ///
    /// Returns the number of weapon documents loaded. Unreadable entries are
    /// logged and skipped; an index already walked from the same source is a
    /// no-op.
    pub fn load(&mut self, base_index: &str, source: &dyn DocumentSource) -> usize {
        let mut loaded = 0;
        self.walk_index(base_index, source, &mut loaded);
        self.invalidate_cache();
        tracing::info!(
            source = source.name(),
            index = base_index,
            loaded,
            "Loaded ability definitions"
        );
        loaded
    }

    fn walk_index(&mut self, path: &str, source: &dyn DocumentSource, loaded: &mut usize) {
        let key = (source.name().to_string(), normalize_path(path));
        if !self.visited.insert(key) {
            tracing::debug!(source = source.name(), path, "Index already visited");
            return;
        }

        let index: IndexDocument = match read_json(source, path) {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping definition index");
                return;
            }
        };

        for weapon_path in index.weapon_paths() {
            if self.load_weapon(weapon_path, source) {
                *loaded += 1;
            }
        }

        for include in &index.includes {
            self.walk_index(include, source, loaded);
        }
    }

    fn load_weapon(&mut self, path: &str, source: &dyn DocumentSource) -> bool {
        match read_json::<WeaponDocument>(source, path) {
            Ok(doc) if normalize_item_id(&doc.item_id).is_empty() => {
                tracing::warn!(source = source.name(), path, "Weapon document has no ItemId");
                false
            }
            Ok(doc) => {
                self.insert_definition(WeaponDefinition::from_document(&doc));
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Skipping weapon document");
                false
            }
        }
    }

    /// Add or replace a concrete definition.
    pub fn insert_definition(&mut self, def: WeaponDefinition) {
        if self.definitions.contains_key(&def.item_id) {
            tracing::warn!(item_id = %def.item_id, "Duplicate weapon definition, replacing");
        }
        self.definitions.insert(def.item_id.clone(), Arc::new(def));
        self.invalidate_cache();
    }

    // ─── Contributions ──────────────────────────────────────────────────────

    /// Merge a contribution pack.
    ///
    /// `source` is the contributor's own namespace; its `Indexes` are walked
    /// there. Later registrations win field-by-field for rich overrides and
    /// per entry for shorthand overrides.
    pub fn register_contribution(&mut self, source: &dyn DocumentSource, pack: &ContributionPack) {
        for (item_id, use_definition) in &pack.overrides {
            let item_id = normalize_item_id(item_id);
            let use_definition = normalize_item_id(use_definition);
            if item_id.is_empty() || use_definition.is_empty() {
                tracing::warn!(source = source.name(), "Ignoring empty shorthand override");
                continue;
            }
            self.shorthand
                .insert(item_id.to_string(), use_definition.to_string());
        }

        let mut loaded = 0;
        for index in &pack.indexes {
            self.walk_index(index, source, &mut loaded);
        }

        for doc in &pack.override_list {
            let patch = OverridePatch::from_document(doc);
            if patch.item_id.is_empty() {
                tracing::warn!(source = source.name(), "Ignoring override without ItemId");
                continue;
            }
            match self.patches.get_mut(&patch.item_id) {
                Some(existing) => existing.merge_from(&patch),
                None => {
                    self.patches.insert(patch.item_id.clone(), patch);
                }
            }
        }

        self.invalidate_cache();
        tracing::info!(
            source = source.name(),
            shorthand = pack.overrides.len(),
            overrides = pack.override_list.len(),
            weapons = loaded,
            "Registered contribution pack"
        );
    }

    /// Read `pack_path` from `source` and register it.
    pub fn register_contribution_file(
        &mut self,
        source: &dyn DocumentSource,
        pack_path: &str,
    ) -> Result<(), DefinitionError> {
        let pack: ContributionPack = read_json(source, pack_path)?;
        self.register_contribution(source, &pack);
        Ok(())
    }

    /// Register several packs in lexicographic order of source name.
    pub fn register_contributions<S: DocumentSource>(&mut self, mut packs: Vec<(S, ContributionPack)>) {
        packs.sort_by(|(a, _), (b, _)| a.name().cmp(b.name()));
        for (source, pack) in &packs {
            self.register_contribution(source, pack);
        }
    }

    // ─── Resolution ─────────────────────────────────────────────────────────

    /// Resolve an item to its ability configuration.
    ///
    /// Configuration problems (dangling references, cycles) are logged and
    /// resolve to `None`.
    pub fn resolve(&self, item_id: &str) -> Option<Arc<WeaponDefinition>> {
        match self.try_resolve(item_id) {
            Ok(def) => def,
            Err(e) => {
                tracing::warn!(error = %e, "Override did not resolve");
                None
            }
        }
    }

    /// Like [`resolve`](Self::resolve) but reports why a configured override failed.
    ///
    /// `Ok(None)` means the item has no configuration at all.
    pub fn try_resolve(
        &self,
        item_id: &str,
    ) -> Result<Option<Arc<WeaponDefinition>>, DefinitionError> {
        let id = normalize_item_id(item_id);
        if id.is_empty() {
            return Ok(None);
        }
        let mut visiting = Vec::new();
        self.resolve_chain(id, &mut visiting)
    }

    pub fn is_registered(&self, item_id: &str) -> bool {
        self.resolve(item_id).is_some()
    }

    /// Concrete definition loaded from a document, without override resolution.
    pub fn definition(&self, item_id: &str) -> Option<&Arc<WeaponDefinition>> {
        self.definitions.get(normalize_item_id(item_id))
    }

    fn resolve_chain(
        &self,
        id: &str,
        visiting: &mut Vec<String>,
    ) -> Result<Option<Arc<WeaponDefinition>>, DefinitionError> {
        if let Some(def) = self.definitions.get(id) {
            return Ok(Some(Arc::clone(def)));
        }
        if let Some(def) = self.cached(id) {
            return Ok(Some(def));
        }

        if visiting.iter().any(|v| v == id) {
            return Err(DefinitionError::Cycle {
                item_id: visiting.first().cloned().unwrap_or_default(),
                repeated: id.to_string(),
            });
        }
        visiting.push(id.to_string());

        let resolved = if let Some(patch) = self.patches.get(id) {
            let Some(base_id) = patch.use_definition.as_deref() else {
                return Err(DefinitionError::DanglingOverride {
                    item_id: id.to_string(),
                    use_definition: String::new(),
                });
            };
            let base = self.resolve_chain(base_id, visiting)?.ok_or_else(|| {
                DefinitionError::DanglingOverride {
                    item_id: id.to_string(),
                    use_definition: base_id.to_string(),
                }
            })?;
            base.derive(id, patch)
        } else if let Some(base_id) = self.shorthand.get(id) {
            let base = self.resolve_chain(base_id, visiting)?.ok_or_else(|| {
                DefinitionError::DanglingOverride {
                    item_id: id.to_string(),
                    use_definition: base_id.clone(),
                }
            })?;
            base.renamed(id)
        } else {
            visiting.pop();
            return Ok(None);
        };

        visiting.pop();
        let resolved = Arc::new(resolved);
        self.materialized
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), Arc::clone(&resolved));
        tracing::debug!(item_id = id, "Materialized override");
        Ok(Some(resolved))
    }

    fn cached(&self, id: &str) -> Option<Arc<WeaponDefinition>> {
        self.materialized
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn invalidate_cache(&mut self) {
        self.materialized
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            definitions: self.definitions.len(),
            patches: self.patches.len(),
            shorthand: self.shorthand.len(),
            indexes_visited: self.visited.len(),
            materialized: self
                .materialized
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
        }
    }
}
