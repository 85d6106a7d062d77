//! Cache bookkeeping shared by every tracked record kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Tracked record kinds. The string form is the cache configuration key and
/// the entity name carried by progress events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    Vehicle,
    OdometerRecord,
    PlanRecord,
    ServiceRecord,
    RepairRecord,
    UpgradeRecord,
    TaxRecord,
    GasRecord,
    Reminder,
    UserPreference,
}

impl EntityType {
    pub const ALL: [Self; 10] = [
        Self::Vehicle,
        Self::OdometerRecord,
        Self::PlanRecord,
        Self::ServiceRecord,
        Self::RepairRecord,
        Self::UpgradeRecord,
        Self::TaxRecord,
        Self::GasRecord,
        Self::Reminder,
        Self::UserPreference,
    ];

    /// Stable type name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Vehicle => "Vehicle",
            Self::OdometerRecord => "OdometerRecord",
            Self::PlanRecord => "PlanRecord",
            Self::ServiceRecord => "ServiceRecord",
            Self::RepairRecord => "RepairRecord",
            Self::UpgradeRecord => "UpgradeRecord",
            Self::TaxRecord => "TaxRecord",
            Self::GasRecord => "GasRecord",
            Self::Reminder => "Reminder",
            Self::UserPreference => "UserPreference",
        }
    }

    /// Look up a type by its stable name (exact match).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|entity_type| entity_type.name() == name)
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Position of a record in the local sync state machine.
///
/// `Synced` is entered only by a successful sync; every other state means
/// the record carries work for the next upload pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    #[default]
    Synced,
    PendingUpload,
    PendingUpdate,
    PendingDeletion,
    SyncFailed,
}

impl_domain_status_conversions!(SyncStatus {
    Synced => "synced",
    PendingUpload => "pending_upload",
    PendingUpdate => "pending_update",
    PendingDeletion => "pending_deletion",
    SyncFailed => "sync_failed",
});

impl SyncStatus {
    /// True for states holding a local edit the server has not seen yet.
    pub const fn has_uncommitted_edit(&self) -> bool {
        matches!(self, Self::PendingUpload | Self::PendingUpdate | Self::PendingDeletion)
    }
}

/// Locally minted ids are zero or negative; the server hands out positive ids.
pub const fn looks_server_assigned(id: i64) -> bool {
    id > 0
}

/// Sync bookkeeping embedded in every cached record. Never sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    pub last_sync: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub sync_status: SyncStatus,
    pub is_dirty: bool,
}

impl CacheMetadata {
    /// Metadata for a record created locally and not yet uploaded.
    pub fn pending_upload() -> Self {
        Self { sync_status: SyncStatus::PendingUpload, is_dirty: true, ..Self::default() }
    }

    /// A record with no expiration has never been stamped and counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expires_at| expires_at < now)
    }
}

/// Freshness and ordering policy for one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfiguration {
    pub entity_type_name: String,
    pub expiration_minutes: i64,
    pub is_critical: bool,
    /// Lower values sync earlier.
    pub sync_priority: u32,
}

impl CacheConfiguration {
    pub fn new(
        entity_type: EntityType,
        expiration_minutes: i64,
        is_critical: bool,
        sync_priority: u32,
    ) -> Self {
        Self {
            entity_type_name: entity_type.name().to_string(),
            expiration_minutes,
            is_critical,
            sync_priority,
        }
    }

    /// Rows seeded at startup before configuration overrides apply.
    pub fn seed_defaults() -> Vec<Self> {
        const DAY: i64 = 24 * 60;
        const HALF_DAY: i64 = 12 * 60;

        vec![
            Self::new(EntityType::Vehicle, DAY, true, 1),
            Self::new(EntityType::UserPreference, DAY, true, 1),
            Self::new(EntityType::OdometerRecord, HALF_DAY, true, 2),
            Self::new(EntityType::Reminder, HALF_DAY, true, 2),
            Self::new(EntityType::PlanRecord, HALF_DAY, false, 3),
            Self::new(EntityType::ServiceRecord, HALF_DAY, false, 3),
            Self::new(EntityType::RepairRecord, HALF_DAY, false, 3),
            Self::new(EntityType::UpgradeRecord, HALF_DAY, false, 3),
            Self::new(EntityType::GasRecord, HALF_DAY, false, 3),
            Self::new(EntityType::TaxRecord, DAY, false, 4),
        ]
    }
}
