//! Canonical brand identity: cache, registry-backed resolution, aliases.

mod extract;
mod similarity;

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use revdoc_core::{now_kst, BrandSeed};
use revdoc_store::registry::{self, RegistryRecord};
use revdoc_store::{StoreError, TabularStore};
use tokio::task::JoinSet;

pub use extract::{
    extract_pure_brand_name, normalize_key, prefix3, ExtractionRule, EXTRACTION_RULES,
    KNOWN_BRANCH_TOKENS,
};
pub use similarity::{same_brand_group, similarity, SIMILARITY_THRESHOLD};

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// One canonical brand as projected into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandEntry {
    pub normalized_key: String,
    pub standard_name: String,
    /// Registry row backing this entry, when it has been persisted.
    pub registry_row: Option<usize>,
    pub aliases: Vec<String>,
}

impl From<RegistryRecord> for BrandEntry {
    fn from(record: RegistryRecord) -> Self {
        Self {
            normalized_key: record.normalized_key,
            standard_name: record.standard_name,
            registry_row: Some(record.row),
            aliases: record.aliases,
        }
    }
}

/// In-memory projection of the brand registry, in registration order.
///
/// Lookups scan by 3-character prefix and return the first hit. Two brands
/// that share a prefix therefore resolve to whichever registered first; the
/// cache only saves the registry round trip.
#[derive(Debug, Default)]
pub struct BrandCache {
    entries: RwLock<Vec<BrandEntry>>,
}

impl BrandCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// First entry whose key shares `prefix`.
    #[must_use]
    pub fn find_by_prefix(&self, prefix: &str) -> Option<BrandEntry> {
        self.entries
            .read()
            .iter()
            .find(|e| prefix3(&e.normalized_key) == prefix)
            .cloned()
    }

    #[must_use]
    pub fn find_exact(&self, normalized_key: &str) -> Option<BrandEntry> {
        self.entries
            .read()
            .iter()
            .find(|e| e.normalized_key == normalized_key)
            .cloned()
    }

    /// Insert unless an entry with the same key already exists.
    pub fn insert(&self, entry: BrandEntry) -> bool {
        let mut entries = self.entries.write();
        if entries
            .iter()
            .any(|e| e.normalized_key == entry.normalized_key)
        {
            return false;
        }
        entries.push(entry);
        true
    }

    pub fn replace_all(&self, entries: Vec<BrandEntry>) {
        *self.entries.write() = entries;
    }

    /// Append `alias` to the entry keyed `normalized_key`.
    ///
    /// Returns the registry row and the full updated alias list when the alias
    /// was new; `None` if it was already known or the entry is absent.
    pub fn add_alias(&self, normalized_key: &str, alias: &str) -> Option<(Option<usize>, Vec<String>)> {
        let mut entries = self.entries.write();
        let entry = entries
            .iter_mut()
            .find(|e| e.normalized_key == normalized_key)?;
        if entry.aliases.iter().any(|a| a == alias) {
            return None;
        }
        entry.aliases.push(alias.to_string());
        Some((entry.registry_row, entry.aliases.clone()))
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<BrandEntry> {
        self.entries.read().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Maps noisy brand spellings to a stable canonical name, persisting new
/// brands and aliases in the registry section of `registry_table`.
pub struct BrandIdentityResolver {
    store: Arc<dyn TabularStore>,
    registry_table: String,
    cache: Arc<BrandCache>,
    alias_writes: Mutex<JoinSet<()>>,
}

impl std::fmt::Debug for BrandIdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrandIdentityResolver")
            .field("registry_table", &self.registry_table)
            .field("cached_brands", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl BrandIdentityResolver {
    #[must_use]
    pub fn new(
        store: Arc<dyn TabularStore>,
        registry_table: impl Into<String>,
        cache: Arc<BrandCache>,
    ) -> Self {
        Self {
            store,
            registry_table: registry_table.into(),
            cache,
            alias_writes: Mutex::new(JoinSet::new()),
        }
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<BrandCache> {
        &self.cache
    }

    /// Rebuild the cache from the registry.
    ///
    /// Without `force`, a non-empty cache is left as is. A registry failure
    /// is logged and leaves the cache untouched. Returns the cached entry count.
    pub async fn load_cache(&self, force: bool) -> usize {
        if !force && !self.cache.is_empty() {
            return self.cache.len();
        }
        match registry::load_registry(self.store.as_ref(), &self.registry_table).await {
            Ok(records) => {
                let entries: Vec<BrandEntry> = records.into_iter().map(BrandEntry::from).collect();
                let count = entries.len();
                self.cache.replace_all(entries);
                tracing::info!(brands = count, "brand cache loaded");
                count
            }
            Err(e) => {
                tracing::warn!(error = %e, "brand cache load failed, continuing with current cache");
                self.cache.len()
            }
        }
    }

    /// Register manual mappings whose keys are not yet in the registry.
    ///
    /// Returns the number of mappings added.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the registry cannot be read or written.
    pub async fn seed(&self, seeds: &[BrandSeed]) -> Result<usize, StoreError> {
        let existing = registry::load_registry(self.store.as_ref(), &self.registry_table).await?;
        let today = now_kst().date_naive();
        let mut added = 0;

        for seed in seeds {
            let key = normalize_key(&seed.key);
            if key.is_empty() || existing.iter().any(|r| r.normalized_key == key) {
                continue;
            }
            let aliases = vec![seed.key.trim().to_string()];
            let row = registry::append_brand(
                self.store.as_ref(),
                &self.registry_table,
                &key,
                seed.standard.trim(),
                today,
                &aliases,
            )
            .await?;
            self.cache.insert(BrandEntry {
                normalized_key: key.clone(),
                standard_name: seed.standard.trim().to_string(),
                registry_row: Some(row),
                aliases,
            });
            tracing::info!(key = %key, standard = %seed.standard, "brand seed registered");
            added += 1;
        }

        Ok(added)
    }

    /// Resolve `raw` to its canonical name, registering it when unseen.
    ///
    /// Never fails: registry errors degrade to the normalized name.
    pub async fn resolve(&self, raw: &str) -> String {
        let key = normalize_key(raw);
        if key.is_empty() {
            return key;
        }
        let prefix = prefix3(&key);

        if let Some(entry) = self.cache.find_by_prefix(&prefix) {
            if entry.normalized_key != key {
                self.record_alias(&entry.normalized_key, raw.trim());
            }
            return entry.standard_name;
        }

        match self.resolve_from_registry(raw, &key, &prefix).await {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(brand = %key, error = %e, "brand registry unavailable, using normalized name");
                key
            }
        }
    }

    /// Cache-only resolution for bulk paths; unseen prefixes fall back to the
    /// normalized name.
    #[must_use]
    pub fn resolve_sync(&self, raw: &str) -> String {
        let key = normalize_key(raw);
        if key.is_empty() {
            return key;
        }
        self.cache
            .find_by_prefix(&prefix3(&key))
            .map_or(key, |entry| entry.standard_name)
    }

    /// Wait for all outstanding best-effort alias writes.
    pub async fn flush_alias_writes(&self) {
        let mut pending = std::mem::take(&mut *self.alias_writes.lock());
        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "alias write task did not complete");
            }
        }
    }

    async fn resolve_from_registry(
        &self,
        raw: &str,
        key: &str,
        prefix: &str,
    ) -> Result<String, StoreError> {
        let records = registry::load_registry(self.store.as_ref(), &self.registry_table).await?;

        if let Some(record) = records
            .into_iter()
            .find(|r| prefix3(&r.normalized_key) == prefix)
        {
            let entry = BrandEntry::from(record);
            let standard = entry.standard_name.clone();
            let matched_key = entry.normalized_key.clone();
            self.cache.insert(entry);
            if matched_key != key {
                self.record_alias(&matched_key, raw.trim());
            }
            return Ok(standard);
        }

        let aliases = vec![raw.trim().to_string()];
        let row = registry::append_brand(
            self.store.as_ref(),
            &self.registry_table,
            key,
            key,
            now_kst().date_naive(),
            &aliases,
        )
        .await?;
        self.cache.insert(BrandEntry {
            normalized_key: key.to_string(),
            standard_name: key.to_string(),
            registry_row: Some(row),
            aliases,
        });
        tracing::info!(brand = %key, "new brand registered");
        Ok(key.to_string())
    }

    /// Fire-and-forget registry update; failures are logged and dropped.
    fn record_alias(&self, normalized_key: &str, alias: &str) {
        let Some((Some(row), aliases)) = self.cache.add_alias(normalized_key, alias) else {
            return;
        };
        let store = Arc::clone(&self.store);
        let table = self.registry_table.clone();
        let key = normalized_key.to_string();
        let mut writes = self.alias_writes.lock();
        while writes.try_join_next().is_some() {}
        writes.spawn(async move {
            match registry::write_aliases(store.as_ref(), &table, row, &aliases).await {
                Ok(()) => tracing::debug!(brand = %key, aliases = aliases.len(), "brand alias recorded"),
                Err(e) => tracing::warn!(brand = %key, error = %e, "brand alias write failed"),
            }
        });
    }
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
