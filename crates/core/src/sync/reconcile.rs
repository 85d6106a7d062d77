//! Server-wins reconciliation of one downloaded record.

use lubesync_domain::constants::SERVER_WINS;
use lubesync_domain::{CacheMetadata, CachedEntity, Result, SyncEventStatus, SyncOperation};
use tracing::info;

use super::events::SyncEventBus;
use crate::cache::CachePolicy;

/// What happened to the local copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Inserted,
    Overwritten,
    /// The local copy carried an uncommitted edit that was discarded.
    ConflictResolved,
}

/// Apply `remote` to the local store.
///
/// The server is authoritative: its fields always win and the result is
/// stored as `Synced` with a fresh expiration. A discarded local edit is
/// announced on the event bus.
pub(crate) async fn reconcile<T: CachedEntity>(
    policy: &CachePolicy<T>,
    events: &SyncEventBus,
    remote: T,
) -> Result<Reconciliation> {
    let Some(mut local) = policy.store().find(remote.id()).await? else {
        let mut entity = remote;
        *entity.metadata_mut() = CacheMetadata::default();
        policy.mark_synced(&mut entity).await?;
        policy.update_expiration(&mut entity).await?;
        return Ok(Reconciliation::Inserted);
    };

    let previous = local.metadata().sync_status;
    local.apply_remote(&remote);
    policy.mark_synced(&mut local).await?;
    policy.update_expiration(&mut local).await?;

    if !previous.has_uncommitted_edit() {
        return Ok(Reconciliation::Overwritten);
    }

    info!(
        entity_type = %T::ENTITY_TYPE,
        id = local.id(),
        discarded = %previous,
        "conflict_resolved_server_wins"
    );
    events.emit(
        T::ENTITY_TYPE.name(),
        SyncOperation::ConflictResolution,
        SyncEventStatus::ConflictDetected,
        Some(format!("{} {}: local {previous} edit discarded, {SERVER_WINS}", T::ENTITY_TYPE, local.id())),
    );
    Ok(Reconciliation::ConflictResolved)
}
