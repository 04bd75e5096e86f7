//! In-memory source definition registry with query support.

use crate::{
    definition::SourceDefinition,
    error::{Result, SourceError},
    loader::SourceLoader,
};
use jobhound_core::SourceId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

type Cache = HashMap<SourceId, SourceDefinition>;

/// In-memory cache of source definitions with query capabilities.
///
/// The registry loads definitions from disk and caches them in memory
/// for fast lookups. `reload` swaps the whole cache, so a crawl that
/// already fetched its definitions keeps running against the old ones.
#[derive(Clone)]
pub struct SourceRegistry {
    definitions: Arc<RwLock<Cache>>,
}

impl SourceRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            definitions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a registry and load all definitions from the given loader.
    ///
    /// # Errors
    /// Returns error if loading fails.
    pub fn load_from(loader: &SourceLoader) -> Result<Self> {
        let registry = Self::new();
        registry.reload(loader)?;
        Ok(registry)
    }

    /// Reload all source definitions from the loader, replacing the
    /// current cache.
    ///
    /// # Errors
    /// Returns error if loading fails.
    pub fn reload(&self, loader: &SourceLoader) -> Result<()> {
        let definitions = loader.load_all()?;

        let mut cache = self.write_cache();
        cache.clear();
        for definition in definitions {
            let source_id = definition.id().clone();
            cache.insert(source_id, definition);
        }

        info!(count = cache.len(), "reloaded source definitions");
        Ok(())
    }

    /// Get a source definition by ID.
    ///
    /// # Errors
    /// Returns error if the source is not found.
    pub fn get(&self, source_id: &SourceId) -> Result<SourceDefinition> {
        self.read_cache()
            .get(source_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                source_id: source_id.to_string(),
            })
    }

    /// Get all source definitions.
    #[must_use]
    pub fn get_all(&self) -> Vec<SourceDefinition> {
        self.read_cache().values().cloned().collect()
    }

    /// Get the total number of sources in the registry.
    #[must_use]
    pub fn count(&self) -> usize {
        self.read_cache().len()
    }

    /// Check if a source exists in the registry.
    #[must_use]
    pub fn contains(&self, source_id: &SourceId) -> bool {
        self.read_cache().contains_key(source_id)
    }

    /// Get all source IDs in the registry.
    #[must_use]
    pub fn get_all_ids(&self) -> Vec<SourceId> {
        self.read_cache().keys().cloned().collect()
    }

    /// Add or update a source definition, validating it first.
    ///
    /// # Errors
    /// Returns error if the definition fails validation.
    pub fn insert(&self, definition: SourceDefinition) -> Result<()> {
        definition.validate()?;

        let source_id = definition.id().clone();
        self.write_cache().insert(source_id.clone(), definition);

        debug!(source_id = %source_id, "inserted source definition");
        Ok(())
    }

    /// Remove a source definition from the registry.
    ///
    /// Returns `true` if the source was present, `false` otherwise.
    pub fn remove(&self, source_id: &SourceId) -> bool {
        let removed = self.write_cache().remove(source_id).is_some();
        if removed {
            debug!(source_id = %source_id, "removed source definition");
        }
        removed
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, Cache> {
        self.definitions
            .read()
            .expect("acquire read lock on definitions")
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, Cache> {
        self.definitions
            .write()
            .expect("acquire write lock on definitions")
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
