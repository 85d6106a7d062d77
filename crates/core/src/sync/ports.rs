//! Port interfaces for sync operations

use async_trait::async_trait;
use lubesync_domain::{CachedEntity, SyncError};

/// Remote resource family for one entity type.
#[async_trait]
pub trait ResourceAdapter<T: CachedEntity>: Send + Sync {
    /// Fetch the full remote collection
    async fn get_all(&self) -> Result<Vec<T>, SyncError>;

    /// Fetch one resource; `None` when the server does not know the id
    async fn get_one(&self, id: i64) -> Result<Option<T>, SyncError>;

    /// Create the resource and return the server-assigned id
    async fn create(&self, entity: &T) -> Result<i64, SyncError>;

    /// Replace the remote resource with the local fields
    async fn update(&self, entity: &T) -> Result<(), SyncError>;

    /// Delete the remote resource
    async fn delete(&self, id: i64) -> Result<(), SyncError>;
}

/// Local network reachability
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_connected(&self) -> bool;
}

/// Remote service health
#[async_trait]
pub trait RemoteHealthProbe: Send + Sync {
    async fn is_healthy(&self) -> bool;
}
