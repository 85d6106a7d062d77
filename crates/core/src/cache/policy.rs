//! Sync status and expiration bookkeeping for one entity type
//!
//! Every status change goes through [`CachePolicy`], which persists the
//! record and stamps its cache metadata.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{Duration, Utc};
use lubesync_domain::{CachedEntity, LubeSyncError, Result, SyncStatus};
use tracing::debug;

use super::configurations::CacheConfigurations;
use super::ports::EntityStore;

/// Freshness and dirty-tracking rules for one entity type.
///
/// Every mutating operation persists through the store and is idempotent
/// for identical entity state.
pub struct CachePolicy<T: CachedEntity> {
    store: Arc<dyn EntityStore<T>>,
    configurations: Arc<CacheConfigurations>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: CachedEntity> Clone for CachePolicy<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            configurations: Arc::clone(&self.configurations),
            _entity: PhantomData,
        }
    }
}

impl<T: CachedEntity> CachePolicy<T> {
    pub fn new(store: Arc<dyn EntityStore<T>>, configurations: Arc<CacheConfigurations>) -> Self {
        Self { store, configurations, _entity: PhantomData }
    }

    pub fn store(&self) -> &Arc<dyn EntityStore<T>> {
        &self.store
    }

    /// A missing record counts as expired.
    pub async fn is_expired(&self, id: i64) -> Result<bool> {
        let now = Utc::now();
        Ok(self.store.find(id).await?.map_or(true, |entity| entity.metadata().is_expired_at(now)))
    }

    /// True iff any stored record of this type has expired.
    pub async fn needs_refresh(&self) -> Result<bool> {
        let now = Utc::now();
        let expired = self.store.query(&move |entity: &T| entity.metadata().is_expired_at(now)).await?;
        Ok(!expired.is_empty())
    }

    /// Push the expiration to now plus the configured lifetime and persist.
    pub async fn update_expiration(&self, entity: &mut T) -> Result<()> {
        let minutes = self.expiration_minutes();
        entity.metadata_mut().expires_at = Some(Utc::now() + Duration::minutes(minutes));
        self.store.upsert(entity).await
    }

    pub fn expiration_minutes(&self) -> i64 {
        self.configurations.expiration_minutes(T::ENTITY_TYPE)
    }

    pub fn is_critical(&self) -> bool {
        self.configurations.is_critical(T::ENTITY_TYPE)
    }

    /// Every stored record not in `Synced`, in store order.
    pub async fn pending_sync_items(&self) -> Result<Vec<T>> {
        self.store.query(&|entity: &T| entity.metadata().sync_status != SyncStatus::Synced).await
    }

    /// Clear the dirty flag and stamp the sync time, then persist.
    pub async fn mark_synced(&self, entity: &mut T) -> Result<()> {
        let metadata = entity.metadata_mut();
        metadata.sync_status = SyncStatus::Synced;
        metadata.last_sync = Some(Utc::now());
        metadata.is_dirty = false;
        self.store.upsert(entity).await
    }

    /// Flag a record as carrying local work. `Synced` is rejected: it is
    /// reachable only through [`mark_synced`](Self::mark_synced).
    pub async fn mark_for_sync(&self, entity: &mut T, status: SyncStatus) -> Result<()> {
        if status == SyncStatus::Synced {
            return Err(LubeSyncError::InvalidState(format!(
                "{} {} cannot be marked for sync as synced",
                T::ENTITY_TYPE,
                entity.id()
            )));
        }
        let metadata = entity.metadata_mut();
        metadata.sync_status = status;
        metadata.is_dirty = true;
        debug!(entity_type = %T::ENTITY_TYPE, id = entity.id(), %status, "entity_marked_for_sync");
        self.store.upsert(entity).await
    }

    /// Next free temporary id for a record created offline.
    ///
    /// Temporary ids are negative so they never collide with server ids.
    pub async fn allocate_local_id(&self) -> Result<i64> {
        let lowest = self.store.query(&|entity: &T| entity.id() <= 0).await?;
        Ok(lowest.iter().map(CachedEntity::id).min().unwrap_or(0) - 1)
    }
}
