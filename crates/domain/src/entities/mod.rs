//! Cached entity records.
//!
//! Every record embeds a [`CacheMetadata`] under the `cache` key. The key is
//! stripped before anything is sent to the server.

mod records;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use records::{
    GasRecord, OdometerRecord, PlanRecord, Reminder, RepairRecord, ServiceRecord, TaxRecord,
    UpgradeRecord, UserPreference, Vehicle,
};

use crate::types::{CacheMetadata, EntityType};

/// Serialized field name of the embedded cache metadata.
pub const CACHE_METADATA_FIELD: &str = "cache";

/// A record kind tracked by the sync engine.
pub trait CachedEntity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const ENTITY_TYPE: EntityType;

    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);

    fn metadata(&self) -> &CacheMetadata;

    fn metadata_mut(&mut self) -> &mut CacheMetadata;

    /// Copy every server-owned field from `remote`, keeping local metadata.
    fn apply_remote(&mut self, remote: &Self) {
        let metadata = self.metadata().clone();
        *self = remote.clone();
        *self.metadata_mut() = metadata;
    }
}
