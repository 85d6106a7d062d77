//! In-memory mock for the `EntityStore` port.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lubesync_core::cache::ports::EntityFilter;
use lubesync_core::EntityStore;
use lubesync_domain::{CachedEntity, LubeSyncError, Result as DomainResult};
use parking_lot::Mutex;

/// Clones share the same records, so a test can keep a handle for
/// assertions after handing one to the engine.
#[derive(Clone)]
pub struct MockEntityStore<T> {
    records: Arc<Mutex<BTreeMap<i64, T>>>,
    fail_writes: Arc<AtomicBool>,
    rejected_ids: Arc<Mutex<BTreeSet<i64>>>,
}

impl<T: CachedEntity> MockEntityStore<T> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(BTreeMap::new())),
            fail_writes: Arc::default(),
            rejected_ids: Arc::default(),
        }
    }

    pub fn with_entity(self, entity: T) -> Self {
        self.records.lock().insert(entity.id(), entity);
        self
    }

    /// Make every subsequent add/update/remove fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make writes of the record with `id` fail; other ids are unaffected.
    pub fn reject_writes_for(self, id: i64) -> Self {
        self.rejected_ids.lock().insert(id);
        self
    }

    pub fn get(&self, id: i64) -> Option<T> {
        self.records.lock().get(&id).cloned()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.records.lock().keys().copied().collect()
    }

    fn check_writable(&self, id: i64) -> DomainResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) || self.rejected_ids.lock().contains(&id) {
            return Err(LubeSyncError::Database("disk I/O error".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl<T: CachedEntity> EntityStore<T> for MockEntityStore<T> {
    async fn find(&self, id: i64) -> DomainResult<Option<T>> {
        Ok(self.get(id))
    }

    async fn add(&self, entity: &T) -> DomainResult<()> {
        self.check_writable(entity.id())?;
        let mut records = self.records.lock();
        if records.contains_key(&entity.id()) {
            return Err(LubeSyncError::Database(format!("duplicate id {}", entity.id())));
        }
        records.insert(entity.id(), entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &T) -> DomainResult<()> {
        self.check_writable(entity.id())?;
        let mut records = self.records.lock();
        match records.get_mut(&entity.id()) {
            Some(slot) => {
                *slot = entity.clone();
                Ok(())
            }
            None => Err(LubeSyncError::NotFound(format!("id {}", entity.id()))),
        }
    }

    async fn remove(&self, id: i64) -> DomainResult<bool> {
        self.check_writable(id)?;
        Ok(self.records.lock().remove(&id).is_some())
    }

    async fn query(&self, filter: EntityFilter<'_, T>) -> DomainResult<Vec<T>> {
        Ok(self.records.lock().values().filter(|entity| filter(entity)).cloned().collect())
    }
}
