//! Port interfaces for the durable local store

use async_trait::async_trait;
use lubesync_domain::{CachedEntity, Result};

/// Predicate passed to [`EntityStore::query`].
pub type EntityFilter<'a, T> = &'a (dyn Fn(&T) -> bool + Send + Sync);

/// Keyed store for one entity type.
///
/// Every write is an independent commit; nothing here spans entities.
#[async_trait]
pub trait EntityStore<T: CachedEntity>: Send + Sync {
    /// Find a record by id
    async fn find(&self, id: i64) -> Result<Option<T>>;

    /// Insert a new record; fails if the id is taken
    async fn add(&self, entity: &T) -> Result<()>;

    /// Replace an existing record; fails with `NotFound` if absent
    async fn update(&self, entity: &T) -> Result<()>;

    /// Remove a record, returning whether it existed
    async fn remove(&self, id: i64) -> Result<bool>;

    /// All records matching `filter`, in ascending id order
    async fn query(&self, filter: EntityFilter<'_, T>) -> Result<Vec<T>>;

    /// Add or replace
    async fn upsert(&self, entity: &T) -> Result<()> {
        if self.find(entity.id()).await?.is_some() {
            self.update(entity).await
        } else {
            self.add(entity).await
        }
    }
}
