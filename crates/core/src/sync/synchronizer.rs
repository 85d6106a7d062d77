//! Per-type upload and download passes
//!
//! Uploads pick create, update or delete from each record's sync status.
//! Downloads reconcile server copies against local records, keeping the
//! server version when both sides changed.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use lubesync_domain::{
    looks_server_assigned, CachedEntity, EntityType, Result, SyncError, SyncEventStatus,
    SyncOperation, SyncResult, SyncStatus,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::events::SyncEventBus;
use super::ports::ResourceAdapter;
use super::reconcile::{reconcile, Reconciliation};
use crate::cache::ports::EntityStore;
use crate::cache::{CacheConfigurations, CachePolicy};

/// Type-erased synchronizer, one per registered entity type.
#[async_trait]
pub trait EntitySynchronizer: Send + Sync {
    fn entity_type(&self) -> EntityType;

    /// True iff any stored record of this type has expired
    async fn needs_refresh(&self) -> Result<bool>;

    /// Push every pending local change, item by item
    async fn upload(&self, cancel: &CancellationToken) -> SyncResult;

    /// Fetch the remote collection and reconcile it into the local store
    async fn download(&self, cancel: &CancellationToken) -> SyncResult;

    /// Upload one record unconditionally, then re-download it
    async fn force_sync(&self, id: i64) -> SyncResult;
}

/// Remote call chosen for a pending record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadAction {
    Create,
    Update,
    Delete,
    /// Deletion of a record the server never saw; only the local copy goes.
    DiscardLocal,
}

impl UploadAction {
    /// `SyncFailed` (and a forced `Synced`) infer Create or Update from
    /// whether the id looks server-assigned.
    pub fn for_record(id: i64, status: SyncStatus) -> Self {
        match status {
            SyncStatus::PendingUpload => Self::Create,
            SyncStatus::PendingUpdate => Self::Update,
            SyncStatus::PendingDeletion if looks_server_assigned(id) => Self::Delete,
            SyncStatus::PendingDeletion => Self::DiscardLocal,
            SyncStatus::SyncFailed | SyncStatus::Synced if looks_server_assigned(id) => Self::Update,
            SyncStatus::SyncFailed | SyncStatus::Synced => Self::Create,
        }
    }
}

/// Upload and download passes for one entity type.
pub struct TypedSynchronizer<T: CachedEntity> {
    policy: CachePolicy<T>,
    adapter: Arc<dyn ResourceAdapter<T>>,
    events: SyncEventBus,
}

impl<T: CachedEntity> TypedSynchronizer<T> {
    pub fn new(
        store: Arc<dyn EntityStore<T>>,
        adapter: Arc<dyn ResourceAdapter<T>>,
        configurations: Arc<CacheConfigurations>,
        events: SyncEventBus,
    ) -> Self {
        Self { policy: CachePolicy::new(store, configurations), adapter, events }
    }

    pub fn policy(&self) -> &CachePolicy<T> {
        &self.policy
    }

    fn emit(&self, operation: SyncOperation, status: SyncEventStatus, message: Option<String>) {
        self.events.emit(T::ENTITY_TYPE.name(), operation, status, message);
    }

    fn emit_outcome(&self, operation: SyncOperation, result: &SyncResult) {
        let (status, message) = if result.cancelled {
            (SyncEventStatus::Skipped, Some("cancelled".to_string()))
        } else if result.failure_count > 0 {
            (SyncEventStatus::Failed, Some(format!("{} failed", result.failure_count)))
        } else {
            (SyncEventStatus::Completed, Some(format!("{} synced", result.success_count)))
        };
        self.emit(operation, status, message);
    }

    /// Send one pending record to the server.
    ///
    /// Returns the record's id after the call, or `None` once it is deleted.
    async fn upload_one(&self, mut entity: T) -> std::result::Result<Option<i64>, SyncError> {
        let id = entity.id();
        let action = UploadAction::for_record(id, entity.metadata().sync_status);
        debug!(entity_type = %T::ENTITY_TYPE, id, ?action, "uploading_entity");

        match action {
            UploadAction::DiscardLocal => {
                self.policy.store().remove(id).await?;
                Ok(None)
            }
            UploadAction::Delete => match self.adapter.delete(id).await {
                Ok(()) | Err(SyncError::NotFound(_)) => {
                    self.policy.store().remove(id).await?;
                    Ok(None)
                }
                // Stays PendingDeletion so the next pass retries the delete.
                Err(err) => Err(err),
            },
            UploadAction::Create => match self.adapter.create(&entity).await {
                Ok(server_id) => {
                    // The server copy is stored before the temporary row goes away.
                    entity.set_id(server_id);
                    self.commit(&mut entity).await?;
                    if server_id != id {
                        self.policy.store().remove(id).await?;
                    }
                    Ok(Some(server_id))
                }
                Err(err) => {
                    self.mark_failed(&mut entity).await;
                    Err(err)
                }
            },
            UploadAction::Update => match self.adapter.update(&entity).await {
                Ok(()) => {
                    self.commit(&mut entity).await?;
                    Ok(Some(id))
                }
                Err(err) => {
                    self.mark_failed(&mut entity).await;
                    Err(err)
                }
            },
        }
    }

    async fn commit(&self, entity: &mut T) -> Result<()> {
        self.policy.mark_synced(entity).await?;
        self.policy.update_expiration(entity).await
    }

    async fn mark_failed(&self, entity: &mut T) {
        if let Err(err) = self.policy.mark_for_sync(entity, SyncStatus::SyncFailed).await {
            warn!(
                entity_type = %T::ENTITY_TYPE,
                id = entity.id(),
                error = %err,
                "Failed to persist sync failure status"
            );
        }
    }

    async fn reconcile_into(&self, remote: T, result: &mut SyncResult) {
        let id = remote.id();
        match reconcile(&self.policy, &self.events, remote).await {
            Ok(Reconciliation::ConflictResolved) => {
                result.record_success();
                result.record_conflict();
            }
            Ok(Reconciliation::Inserted | Reconciliation::Overwritten) => result.record_success(),
            Err(err) => {
                warn!(entity_type = %T::ENTITY_TYPE, id, error = %err, "Failed to store downloaded entity");
                result.record_failure(T::ENTITY_TYPE.name(), Some(id), &err);
            }
        }
    }

    /// Drop synced local records the server no longer lists.
    async fn prune_missing(&self, remote_ids: &HashSet<i64>, result: &mut SyncResult) {
        let stale = self
            .policy
            .store()
            .query(&|entity: &T| {
                entity.metadata().sync_status == SyncStatus::Synced
                    && !remote_ids.contains(&entity.id())
            })
            .await;

        let stale = match stale {
            Ok(stale) => stale,
            Err(err) => {
                result.record_failure(T::ENTITY_TYPE.name(), None, &err);
                return;
            }
        };

        for entity in stale {
            if let Err(err) = self.policy.store().remove(entity.id()).await {
                result.record_failure(T::ENTITY_TYPE.name(), Some(entity.id()), &err);
            }
        }
    }
}

#[async_trait]
impl<T: CachedEntity> EntitySynchronizer for TypedSynchronizer<T> {
    fn entity_type(&self) -> EntityType {
        T::ENTITY_TYPE
    }

    async fn needs_refresh(&self) -> Result<bool> {
        self.policy.needs_refresh().await
    }

    #[instrument(skip_all, fields(entity_type = %T::ENTITY_TYPE))]
    async fn upload(&self, cancel: &CancellationToken) -> SyncResult {
        let name = T::ENTITY_TYPE.name();
        let mut result = SyncResult::new();

        let pending = match self.policy.pending_sync_items().await {
            Ok(pending) => pending,
            Err(err) => {
                warn!(error = %err, "Failed to query pending entities");
                result.record_failure(name, None, &err);
                self.emit(SyncOperation::Upload, SyncEventStatus::Failed, Some(err.to_string()));
                return result.finish();
            }
        };

        if pending.is_empty() {
            return result.finish();
        }

        self.emit(
            SyncOperation::Upload,
            SyncEventStatus::Started,
            Some(format!("{} pending", pending.len())),
        );

        for entity in pending {
            if cancel.is_cancelled() {
                result.cancelled = true;
                break;
            }
            let id = entity.id();
            match self.upload_one(entity).await {
                Ok(_) => result.record_success(),
                Err(err) => {
                    warn!(id, error = %err, "Entity upload failed");
                    result.record_failure(name, Some(id), &err);
                }
            }
        }

        info!(
            succeeded = result.success_count,
            failed = result.failure_count,
            cancelled = result.cancelled,
            "upload_pass_finished"
        );
        self.emit_outcome(SyncOperation::Upload, &result);
        result.finish()
    }

    #[instrument(skip_all, fields(entity_type = %T::ENTITY_TYPE))]
    async fn download(&self, cancel: &CancellationToken) -> SyncResult {
        let name = T::ENTITY_TYPE.name();
        let mut result = SyncResult::new();
        if cancel.is_cancelled() {
            result.cancelled = true;
            return result.finish();
        }

        self.emit(SyncOperation::Download, SyncEventStatus::Started, None);

        let remote = match self.adapter.get_all().await {
            Ok(remote) => remote,
            Err(err) => {
                warn!(error = %err, "Failed to fetch remote collection");
                result.record_failure(name, None, &err);
                self.emit(SyncOperation::Download, SyncEventStatus::Failed, Some(err.to_string()));
                return result.finish();
            }
        };

        let mut remote_ids = HashSet::with_capacity(remote.len());
        for record in remote {
            if cancel.is_cancelled() {
                result.cancelled = true;
                break;
            }
            remote_ids.insert(record.id());
            self.reconcile_into(record, &mut result).await;
        }

        if !result.cancelled {
            self.prune_missing(&remote_ids, &mut result).await;
        }

        info!(
            reconciled = result.success_count,
            conflicts = result.conflict_count,
            failed = result.failure_count,
            cancelled = result.cancelled,
            "download_pass_finished"
        );
        self.emit_outcome(SyncOperation::Download, &result);
        result.finish()
    }

    #[instrument(skip(self), fields(entity_type = %T::ENTITY_TYPE))]
    async fn force_sync(&self, id: i64) -> SyncResult {
        let name = T::ENTITY_TYPE.name();
        let mut result = SyncResult::new();
        self.emit(SyncOperation::Refresh, SyncEventStatus::Started, Some(format!("id {id}")));

        let target = match self.policy.store().find(id).await {
            Ok(Some(entity)) => match self.upload_one(entity).await {
                Ok(target) => {
                    result.record_success();
                    target
                }
                Err(err) => {
                    result.record_failure(name, Some(id), &err);
                    looks_server_assigned(id).then_some(id)
                }
            },
            Ok(None) => {
                result.record_skipped();
                looks_server_assigned(id).then_some(id)
            }
            Err(err) => {
                result.record_failure(name, Some(id), &err);
                None
            }
        };

        if let Some(target) = target {
            match self.adapter.get_one(target).await {
                Ok(Some(remote)) => self.reconcile_into(remote, &mut result).await,
                Ok(None) => {
                    debug!(id = target, "Entity no longer exists remotely");
                    result.record_skipped();
                }
                Err(err) => result.record_failure(name, Some(target), &err),
            }
        }

        self.emit_outcome(SyncOperation::Refresh, &result);
        result.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_action_follows_status() {
        assert_eq!(UploadAction::for_record(-1, SyncStatus::PendingUpload), UploadAction::Create);
        assert_eq!(UploadAction::for_record(8, SyncStatus::PendingUpdate), UploadAction::Update);
        assert_eq!(UploadAction::for_record(8, SyncStatus::PendingDeletion), UploadAction::Delete);
        assert_eq!(
            UploadAction::for_record(-2, SyncStatus::PendingDeletion),
            UploadAction::DiscardLocal
        );
    }

    #[test]
    fn failed_records_infer_create_or_update() {
        assert_eq!(UploadAction::for_record(14, SyncStatus::SyncFailed), UploadAction::Update);
        assert_eq!(UploadAction::for_record(-4, SyncStatus::SyncFailed), UploadAction::Create);
        assert_eq!(UploadAction::for_record(14, SyncStatus::Synced), UploadAction::Update);
        assert_eq!(UploadAction::for_record(0, SyncStatus::Synced), UploadAction::Create);
    }
}
