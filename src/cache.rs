use crate::error::Result;
use crate::metrics::CacheMetrics;
use crate::providers::reconcile;
use crate::storage::{load_json, write_json_atomic};
use crate::types::{EnrichmentRecord, MovieIdentity, ProviderEntry};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Write-through enrichment cache keyed by [`MovieIdentity::key`].
///
/// The whole store is loaded at construction and rewritten after every
/// mutation. Entries are never evicted.
pub struct EnrichmentCache {
    path: PathBuf,
    provider_limit: usize,
    entries: Mutex<BTreeMap<String, EnrichmentRecord>>,
}

impl EnrichmentCache {
    /// Load the store at `path`. An unreadable or corrupt file is treated as
    /// an empty cache.
    pub fn open(path: impl AsRef<Path>, provider_limit: usize) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries: BTreeMap<String, EnrichmentRecord> = load_json(&path).unwrap_or_default();
        info!("Loaded {} cached enrichment records from {}", entries.len(), path.display());
        Self {
            path,
            provider_limit,
            entries: Mutex::new(entries),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, EnrichmentRecord>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn get(&self, identity: &MovieIdentity) -> Option<EnrichmentRecord> {
        self.lock().get(&identity.key()).cloned()
    }

    /// Store `record` and persist the whole cache before returning.
    pub fn put(&self, identity: &MovieIdentity, record: EnrichmentRecord) -> Result<()> {
        let mut entries = self.lock();
        entries.insert(identity.key(), record);
        write_json_atomic(&self.path, &*entries)?;
        debug!("Cached enrichment for {}", identity);
        Ok(())
    }

    /// Return the cached record for `identity`, computing and storing it on a
    /// miss.
    ///
    /// A hit whose provider list is empty consults `backfill`; if that yields
    /// entries they are reconciled into the record, which is persisted and
    /// returned. Persistence failures are logged, never returned: the caller
    /// still receives the record.
    pub async fn get_or_compute<B, F, Fut>(
        &self,
        identity: &MovieIdentity,
        backfill: B,
        compute: F,
    ) -> EnrichmentRecord
    where
        B: FnOnce() -> Vec<ProviderEntry>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = EnrichmentRecord>,
    {
        if let Some(mut cached) = self.get(identity) {
            CacheMetrics::record_hit();
            if cached.providers.is_empty() {
                let extra = backfill();
                if !extra.is_empty() {
                    cached.providers = reconcile(&[cached.providers, extra], self.provider_limit);
                    CacheMetrics::record_backfill();
                    info!("Backfilled {} providers for {}", cached.providers.len(), identity);
                    self.put_logged(identity, cached.clone());
                }
            }
            return cached;
        }

        CacheMetrics::record_miss();
        let record = compute().await;
        self.put_logged(identity, record.clone());
        record
    }

    fn put_logged(&self, identity: &MovieIdentity, record: EnrichmentRecord) {
        if let Err(e) = self.put(identity, record) {
            CacheMetrics::record_persist_error();
            warn!("Failed to persist cache entry for {}: {}", identity, e);
        }
    }
}
