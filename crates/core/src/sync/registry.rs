//! Type-erased lookup of synchronizers by entity type

use std::collections::HashMap;
use std::sync::Arc;

use lubesync_domain::{CachedEntity, EntityType};
use tracing::debug;

use super::events::SyncEventBus;
use super::ports::ResourceAdapter;
use super::synchronizer::{EntitySynchronizer, TypedSynchronizer};
use crate::cache::ports::EntityStore;
use crate::cache::CacheConfigurations;

/// Synchronizers keyed by entity type.
pub struct SyncRegistry {
    synchronizers: HashMap<EntityType, Arc<dyn EntitySynchronizer>>,
    configurations: Arc<CacheConfigurations>,
    events: SyncEventBus,
}

impl SyncRegistry {
    pub fn new(configurations: Arc<CacheConfigurations>, events: SyncEventBus) -> Self {
        Self { synchronizers: HashMap::new(), configurations, events }
    }

    /// Register the store and remote adapter for `T`, replacing any earlier
    /// registration of the same type.
    pub fn register<T: CachedEntity>(
        &mut self,
        store: Arc<dyn EntityStore<T>>,
        adapter: Arc<dyn ResourceAdapter<T>>,
    ) -> &mut Self {
        let synchronizer = TypedSynchronizer::new(
            store,
            adapter,
            Arc::clone(&self.configurations),
            self.events.clone(),
        );
        self.insert(Arc::new(synchronizer))
    }

    /// Register a prebuilt synchronizer.
    pub fn insert(&mut self, synchronizer: Arc<dyn EntitySynchronizer>) -> &mut Self {
        let entity_type = synchronizer.entity_type();
        debug!(%entity_type, "synchronizer_registered");
        self.synchronizers.insert(entity_type, synchronizer);
        self
    }

    pub fn get(&self, entity_type: EntityType) -> Option<Arc<dyn EntitySynchronizer>> {
        self.synchronizers.get(&entity_type).cloned()
    }

    pub fn len(&self) -> usize {
        self.synchronizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.synchronizers.is_empty()
    }

    pub fn configurations(&self) -> &Arc<CacheConfigurations> {
        &self.configurations
    }

    pub fn events(&self) -> &SyncEventBus {
        &self.events
    }

    /// Registered synchronizers by ascending sync priority, ties broken by
    /// type name.
    pub fn ordered(&self) -> Vec<Arc<dyn EntitySynchronizer>> {
        let mut ordered: Vec<_> = self.synchronizers.values().cloned().collect();
        ordered.sort_by(|a, b| {
            let (a, b) = (a.entity_type(), b.entity_type());
            self.configurations
                .sync_priority(a)
                .cmp(&self.configurations.sync_priority(b))
                .then_with(|| a.name().cmp(b.name()))
        });
        ordered
    }
}
