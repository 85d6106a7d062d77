//! Sync campaigns across every registered entity type
//!
//! A campaign checks connectivity and server health, uploads pending local
//! work in priority order, then downloads the types whose cache has gone
//! stale. Only one campaign runs at a time; a second caller gets an empty
//! result. Cancellation is observed between types and between records.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lubesync_domain::constants::ALL_ENTITY_TYPES;
use lubesync_domain::{
    CachedEntity, EntityType, SyncEvent, SyncEventStatus, SyncOperation, SyncReport, SyncResult,
};
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::events::SyncEventBus;
use super::ports::{ConnectivityProbe, RemoteHealthProbe};
use super::registry::SyncRegistry;
use super::synchronizer::EntitySynchronizer;

/// Drives sync campaigns across every registered entity type.
///
/// At most one campaign runs at a time for the whole process. A campaign
/// uploads pending local changes for every type (ascending priority) before
/// any download starts. Cancellation is cooperative and only observed
/// between items and between types.
pub struct SyncOrchestrator {
    registry: SyncRegistry,
    connectivity: Arc<dyn ConnectivityProbe>,
    health: Arc<dyn RemoteHealthProbe>,
    campaign: tokio::sync::Mutex<()>,
    cancellation: Mutex<CancellationToken>,
    last_sync: RwLock<HashMap<EntityType, DateTime<Utc>>>,
}

impl SyncOrchestrator {
    pub fn new(
        registry: SyncRegistry,
        connectivity: Arc<dyn ConnectivityProbe>,
        health: Arc<dyn RemoteHealthProbe>,
    ) -> Self {
        Self {
            registry,
            connectivity,
            health,
            campaign: tokio::sync::Mutex::new(()),
            cancellation: Mutex::new(CancellationToken::new()),
            last_sync: RwLock::new(HashMap::new()),
        }
    }

    pub fn events(&self) -> &SyncEventBus {
        self.registry.events()
    }

    /// New receiver for progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.registry.events().subscribe()
    }

    /// Registered entity types in the order campaigns visit them.
    pub fn entity_types(&self) -> Vec<EntityType> {
        self.registry.ordered().iter().map(|sync| sync.entity_type()).collect()
    }

    pub fn is_syncing(&self) -> bool {
        self.campaign.try_lock().is_err()
    }

    pub fn last_sync_time(&self, entity_type: EntityType) -> Option<DateTime<Utc>> {
        self.last_sync.read().get(&entity_type).copied()
    }

    /// Signal the running campaign to stop at its next boundary.
    ///
    /// Writes already applied stay applied.
    pub fn cancel_sync(&self) {
        info!("sync_cancellation_requested");
        self.cancellation.lock().cancel();
    }

    /// Local connectivity first, then remote health.
    pub async fn is_online(&self) -> bool {
        self.connectivity.is_connected().await && self.health.is_healthy().await
    }

    /// Full campaign: upload everything pending, then refresh every type
    /// with expired records.
    #[instrument(skip(self))]
    pub async fn sync_all(&self) -> SyncReport {
        if !self.check_online(ALL_ENTITY_TYPES).await {
            return SyncReport::skipped();
        }
        let Ok(_guard) = self.campaign.try_lock() else {
            return self.busy(ALL_ENTITY_TYPES);
        };

        let synchronizers = self.registry.ordered();
        self.run_campaign(ALL_ENTITY_TYPES, &synchronizers, true).await
    }

    /// Both passes for one type. The download is unconditional.
    pub async fn sync_entity<T: CachedEntity>(&self) -> SyncReport {
        self.sync_entity_type(T::ENTITY_TYPE).await
    }

    #[instrument(skip(self))]
    pub async fn sync_entity_type(&self, entity_type: EntityType) -> SyncReport {
        let Some(synchronizer) = self.registry.get(entity_type) else {
            return Self::unregistered(entity_type);
        };
        if !self.check_online(entity_type.name()).await {
            return SyncReport::skipped();
        }
        let Ok(_guard) = self.campaign.try_lock() else {
            return self.busy(entity_type.name());
        };

        self.run_campaign(entity_type.name(), &[synchronizer], false).await
    }

    /// Upload one record unconditionally, then re-download it.
    pub async fn force_sync_entity<T: CachedEntity>(&self, id: i64) -> SyncReport {
        self.force_sync_entity_type(T::ENTITY_TYPE, id).await
    }

    #[instrument(skip(self))]
    pub async fn force_sync_entity_type(&self, entity_type: EntityType, id: i64) -> SyncReport {
        let Some(synchronizer) = self.registry.get(entity_type) else {
            return Self::unregistered(entity_type);
        };
        if !self.check_online(entity_type.name()).await {
            return SyncReport::skipped();
        }
        let Ok(_guard) = self.campaign.try_lock() else {
            return self.busy(entity_type.name());
        };

        let result = synchronizer.force_sync(id).await;
        info!(
            %entity_type,
            id,
            succeeded = result.success_count,
            failed = result.failure_count,
            "force_sync_finished"
        );
        SyncReport::from_result(result)
    }

    async fn check_online(&self, scope: &str) -> bool {
        let reason = if !self.connectivity.is_connected().await {
            "no network connectivity"
        } else if !self.health.is_healthy().await {
            "remote service unavailable"
        } else {
            return true;
        };

        info!(scope, reason, "sync_skipped_offline");
        self.events().emit(
            scope,
            SyncOperation::ConnectivityCheck,
            SyncEventStatus::Skipped,
            Some(reason.to_string()),
        );
        false
    }

    fn busy(&self, scope: &str) -> SyncReport {
        debug!(scope, "sync_skipped_already_running");
        self.events().emit(
            scope,
            SyncOperation::Refresh,
            SyncEventStatus::Skipped,
            Some("sync already in progress".to_string()),
        );
        SyncReport::skipped()
    }

    fn unregistered(entity_type: EntityType) -> SyncReport {
        warn!(%entity_type, "No synchronizer registered");
        let mut result = SyncResult::new();
        result.record_failure(entity_type.name(), None, "no synchronizer registered");
        SyncReport::from_result(result.finish())
    }

    fn begin_campaign(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.cancellation.lock() = token.clone();
        token
    }

    /// Upload pass over `synchronizers`, then the download pass. With
    /// `refresh_gated`, only types holding expired records download.
    async fn run_campaign(
        &self,
        scope: &str,
        synchronizers: &[Arc<dyn EntitySynchronizer>],
        refresh_gated: bool,
    ) -> SyncReport {
        let cancel = self.begin_campaign();
        let run_id = Uuid::now_v7();
        info!(%run_id, scope, types = synchronizers.len(), "sync_campaign_started");
        self.events().emit(scope, SyncOperation::Refresh, SyncEventStatus::Started, None);

        let mut total = SyncResult::new();

        for synchronizer in synchronizers {
            if cancel.is_cancelled() {
                total.cancelled = true;
                break;
            }
            total.merge(synchronizer.upload(&cancel).await);
        }

        if !total.cancelled {
            for synchronizer in synchronizers {
                if cancel.is_cancelled() {
                    total.cancelled = true;
                    break;
                }
                if refresh_gated {
                    match synchronizer.needs_refresh().await {
                        Ok(true) => {}
                        Ok(false) => {
                            debug!(entity_type = %synchronizer.entity_type(), "Cache fresh; skipping download");
                            continue;
                        }
                        Err(err) => {
                            total.record_failure(synchronizer.entity_type().name(), None, &err);
                            continue;
                        }
                    }
                }
                total.merge(synchronizer.download(&cancel).await);
            }
        }

        let total = total.finish();
        if !total.cancelled {
            let mut last_sync = self.last_sync.write();
            for synchronizer in synchronizers {
                last_sync.insert(synchronizer.entity_type(), total.end_time);
            }
        }

        let report = SyncReport::from_result(total);
        let (status, message) = if report.result.cancelled {
            (SyncEventStatus::Skipped, "cancelled".to_string())
        } else if report.result.failure_count > 0 {
            (SyncEventStatus::Failed, format!("{} failed", report.result.failure_count))
        } else {
            (SyncEventStatus::Completed, format!("{} synced", report.result.success_count))
        };
        self.events().emit(scope, SyncOperation::Refresh, status, Some(message));

        info!(
            %run_id,
            scope,
            state = %report.state,
            succeeded = report.result.success_count,
            failed = report.result.failure_count,
            skipped = report.result.skipped_count,
            conflicts = report.result.conflict_count,
            cancelled = report.result.cancelled,
            "sync_campaign_finished"
        );
        report
    }
}
