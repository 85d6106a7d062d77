//! Application context - dependency injection container

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lubesync_core::{
    CacheConfigurations, ConnectivityProbe, EntityStore, RemoteHealthProbe, SyncEventBus, SyncOrchestrator,
    SyncRegistry,
};
use lubesync_domain::{
    CachedEntity, Config, EntityType, GasRecord, LubeSyncError, OdometerRecord, PlanRecord, Reminder,
    RepairRecord, Result, ServiceRecord, TaxRecord, UpgradeRecord, UserPreference, Vehicle,
};
use lubesync_infra::{
    DbManager, HostConnectivityProbe, HttpResourceAdapter, InMemoryEntityStore, ResilientTransport,
    SqliteEntityStore,
};
use tracing::info;

/// Where the local records live.
enum StoreBackend {
    Sqlite(Arc<DbManager>),
    Memory,
}

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub transport: Arc<ResilientTransport>,
    pub orchestrator: Arc<SyncOrchestrator>,
    pub db: Option<Arc<DbManager>>,
    /// `Arc<dyn EntityStore<T>>` per type, shared with the registry.
    stores: HashMap<EntityType, Box<dyn Any + Send + Sync>>,
}

impl AppContext {
    /// Build every service from `config`.
    ///
    /// Opens and migrates the SQLite store when `store.path` is set, otherwise
    /// records are kept in memory for the life of the process.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let transport = Arc::new(
            ResilientTransport::new(config.api.clone())
                .map_err(|e| LubeSyncError::Config(format!("transport: {e}")))?,
        );
        let connectivity: Arc<dyn ConnectivityProbe> = Arc::new(
            HostConnectivityProbe::from_base_url(
                &config.api.base_url,
                Duration::from_millis(config.sync.connectivity_timeout_ms),
            )
            .map_err(|e| LubeSyncError::Config(e.to_string()))?,
        );

        let db = match &config.store.path {
            Some(path) => {
                let db = DbManager::new(path, config.store.pool_size)?;
                db.run_migrations()?;
                info!(path = %path.display(), "local_store_opened");
                Some(Arc::new(db))
            }
            None => {
                info!("local_store_in_memory");
                None
            }
        };
        let backend = db.as_ref().map_or(StoreBackend::Memory, |db| StoreBackend::Sqlite(Arc::clone(db)));

        let configurations = Arc::new(CacheConfigurations::with_overrides(config.cache.clone()));
        let events = SyncEventBus::new(config.sync.event_buffer);
        let mut wiring = Wiring {
            registry: SyncRegistry::new(configurations, events),
            stores: HashMap::new(),
            backend,
            transport: Arc::clone(&transport),
        };
        wiring.register::<Vehicle>();
        wiring.register::<OdometerRecord>();
        wiring.register::<PlanRecord>();
        wiring.register::<ServiceRecord>();
        wiring.register::<RepairRecord>();
        wiring.register::<UpgradeRecord>();
        wiring.register::<TaxRecord>();
        wiring.register::<GasRecord>();
        wiring.register::<Reminder>();
        wiring.register::<UserPreference>();

        let Wiring { registry, stores, .. } = wiring;
        let orchestrator = Arc::new(SyncOrchestrator::new(
            registry,
            connectivity,
            Arc::clone(&transport) as Arc<dyn RemoteHealthProbe>,
        ));

        Ok(Self { config, transport, orchestrator, db, stores })
    }

    /// The local store registered for `T`.
    pub fn store<T: CachedEntity>(&self) -> Option<Arc<dyn EntityStore<T>>> {
        self.stores
            .get(&T::ENTITY_TYPE)
            .and_then(|store| store.downcast_ref::<Arc<dyn EntityStore<T>>>())
            .cloned()
    }
}

/// Registration state while the context is being assembled.
struct Wiring {
    registry: SyncRegistry,
    stores: HashMap<EntityType, Box<dyn Any + Send + Sync>>,
    backend: StoreBackend,
    transport: Arc<ResilientTransport>,
}

impl Wiring {
    fn register<T: CachedEntity>(&mut self) {
        let store: Arc<dyn EntityStore<T>> = match &self.backend {
            StoreBackend::Sqlite(db) => Arc::new(SqliteEntityStore::<T>::new(Arc::clone(db))),
            StoreBackend::Memory => Arc::new(InMemoryEntityStore::<T>::new()),
        };
        let adapter = Arc::new(HttpResourceAdapter::<T>::new(Arc::clone(&self.transport)));

        self.registry.register::<T>(Arc::clone(&store), adapter);
        self.stores.insert(T::ENTITY_TYPE, Box::new(store));
    }
}
