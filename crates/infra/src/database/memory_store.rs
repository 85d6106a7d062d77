//! In-memory entity store

use std::collections::BTreeMap;

use async_trait::async_trait;
use lubesync_core::cache::ports::{EntityFilter, EntityStore};
use lubesync_domain::{CachedEntity, LubeSyncError, Result};
use parking_lot::RwLock;

/// Volatile store, ordered by id. Used when no database path is configured.
pub struct InMemoryEntityStore<T> {
    records: RwLock<BTreeMap<i64, T>>,
}

impl<T: CachedEntity> InMemoryEntityStore<T> {
    pub fn new() -> Self {
        Self { records: RwLock::new(BTreeMap::new()) }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl<T: CachedEntity> Default for InMemoryEntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: CachedEntity> EntityStore<T> for InMemoryEntityStore<T> {
    async fn find(&self, id: i64) -> Result<Option<T>> {
        Ok(self.records.read().get(&id).cloned())
    }

    async fn add(&self, entity: &T) -> Result<()> {
        let mut records = self.records.write();
        if records.contains_key(&entity.id()) {
            return Err(LubeSyncError::Database(format!(
                "{} {} already exists",
                T::ENTITY_TYPE,
                entity.id()
            )));
        }
        records.insert(entity.id(), entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &T) -> Result<()> {
        match self.records.write().get_mut(&entity.id()) {
            Some(slot) => {
                *slot = entity.clone();
                Ok(())
            }
            None => Err(LubeSyncError::NotFound(format!("{} {}", T::ENTITY_TYPE, entity.id()))),
        }
    }

    async fn remove(&self, id: i64) -> Result<bool> {
        Ok(self.records.write().remove(&id).is_some())
    }

    async fn query(&self, filter: EntityFilter<'_, T>) -> Result<Vec<T>> {
        Ok(self.records.read().values().filter(|entity| filter(entity)).cloned().collect())
    }

    async fn upsert(&self, entity: &T) -> Result<()> {
        self.records.write().insert(entity.id(), entity.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use lubesync_domain::{CacheMetadata, SyncStatus, UserPreference};

    use super::*;

    fn preference(id: i64, key: &str, status: SyncStatus) -> UserPreference {
        UserPreference {
            id,
            key: key.into(),
            value: "on".into(),
            cache: CacheMetadata { sync_status: status, ..CacheMetadata::default() },
        }
    }

    #[tokio::test]
    async fn add_rejects_duplicates_and_update_requires_existing() {
        let store = InMemoryEntityStore::new();
        store.add(&preference(1, "units", SyncStatus::Synced)).await.unwrap();

        assert!(store.add(&preference(1, "units", SyncStatus::Synced)).await.is_err());
        assert!(matches!(
            store.update(&preference(2, "theme", SyncStatus::Synced)).await,
            Err(LubeSyncError::NotFound(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn query_filters_in_id_order() {
        let store = InMemoryEntityStore::new();
        store.upsert(&preference(5, "theme", SyncStatus::PendingUpdate)).await.unwrap();
        store.upsert(&preference(-1, "units", SyncStatus::PendingUpload)).await.unwrap();
        store.upsert(&preference(3, "locale", SyncStatus::Synced)).await.unwrap();

        let pending = store
            .query(&|entity: &UserPreference| entity.cache.sync_status != SyncStatus::Synced)
            .await
            .unwrap();

        let ids: Vec<i64> = pending.iter().map(|entity| entity.id).collect();
        assert_eq!(ids, vec![-1, 5]);
        assert!(store.remove(5).await.unwrap());
        assert!(!store.remove(5).await.unwrap());
    }
}
