//! Mock remote resources and probes.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lubesync_core::{ConnectivityProbe, RemoteHealthProbe, ResourceAdapter};
use lubesync_domain::{CacheMetadata, CachedEntity, SyncError};
use parking_lot::Mutex;

/// Ordered log of remote calls shared across adapters, e.g. `Vehicle:create:-1`.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, call: String) {
        self.0.lock().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn count_of(&self, prefix: &str) -> usize {
        self.0.lock().iter().filter(|call| call.starts_with(prefix)).count()
    }
}

/// Remote collection held in memory.
#[derive(Clone)]
pub struct MockResourceAdapter<T> {
    remote: Arc<Mutex<BTreeMap<i64, T>>>,
    calls: CallLog,
    next_id: Arc<AtomicI64>,
    failures: Arc<Mutex<HashMap<&'static str, SyncError>>>,
    list_delay: Option<Duration>,
}

impl<T: CachedEntity> MockResourceAdapter<T> {
    pub fn new(calls: CallLog) -> Self {
        Self {
            remote: Arc::default(),
            calls,
            next_id: Arc::new(AtomicI64::new(100)),
            failures: Arc::default(),
            list_delay: None,
        }
    }

    /// Seed a server-side record; local metadata is stripped.
    pub fn with_remote(self, mut entity: T) -> Self {
        *entity.metadata_mut() = CacheMetadata::default();
        self.remote.lock().insert(entity.id(), entity);
        self
    }

    /// Fail every call of `operation` (`get_all`, `get_one`, `create`,
    /// `update`, `delete`) with `error`.
    pub fn with_failure(self, operation: &'static str, error: SyncError) -> Self {
        self.failures.lock().insert(operation, error);
        self
    }

    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    pub fn remote(&self, id: i64) -> Option<T> {
        self.remote.lock().get(&id).cloned()
    }

    fn record(&self, operation: &'static str, id: Option<i64>) -> Result<(), SyncError> {
        let suffix = id.map(|id| format!(":{id}")).unwrap_or_default();
        self.calls.push(format!("{}:{operation}{suffix}", T::ENTITY_TYPE));
        match self.failures.lock().get(operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<T: CachedEntity> ResourceAdapter<T> for MockResourceAdapter<T> {
    async fn get_all(&self) -> Result<Vec<T>, SyncError> {
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        self.record("get_all", None)?;
        Ok(self.remote.lock().values().cloned().collect())
    }

    async fn get_one(&self, id: i64) -> Result<Option<T>, SyncError> {
        self.record("get_one", Some(id))?;
        Ok(self.remote(id))
    }

    async fn create(&self, entity: &T) -> Result<i64, SyncError> {
        self.record("create", Some(entity.id()))?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut stored = entity.clone();
        stored.set_id(id);
        *stored.metadata_mut() = CacheMetadata::default();
        self.remote.lock().insert(id, stored);
        Ok(id)
    }

    async fn update(&self, entity: &T) -> Result<(), SyncError> {
        self.record("update", Some(entity.id()))?;
        let mut remote = self.remote.lock();
        if !remote.contains_key(&entity.id()) {
            return Err(SyncError::NotFound(format!("id {}", entity.id())));
        }
        let mut stored = entity.clone();
        *stored.metadata_mut() = CacheMetadata::default();
        remote.insert(entity.id(), stored);
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), SyncError> {
        self.record("delete", Some(id))?;
        match self.remote.lock().remove(&id) {
            Some(_) => Ok(()),
            None => Err(SyncError::NotFound(format!("id {id}"))),
        }
    }
}

/// Connectivity and health probe with a switchable answer.
#[derive(Clone)]
pub struct StaticProbe {
    up: Arc<AtomicBool>,
}

impl StaticProbe {
    pub fn up() -> Self {
        Self { up: Arc::new(AtomicBool::new(true)) }
    }

    pub fn down() -> Self {
        Self { up: Arc::new(AtomicBool::new(false)) }
    }
}

#[async_trait]
impl ConnectivityProbe for StaticProbe {
    async fn is_connected(&self) -> bool {
        self.up.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteHealthProbe for StaticProbe {
    async fn is_healthy(&self) -> bool {
        self.up.load(Ordering::SeqCst)
    }
}
