use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::impl_cached_entity;
use crate::types::CacheMetadata;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: i64,
    pub year: i32,
    pub make: String,
    pub model: String,
    pub license_plate: String,
    #[serde(default)]
    pub is_electric: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub cache: CacheMetadata,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OdometerRecord {
    pub id: i64,
    pub vehicle_id: i64,
    pub date: NaiveDate,
    pub mileage: i64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub cache: CacheMetadata,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRecord {
    pub id: i64,
    pub vehicle_id: i64,
    pub description: String,
    pub priority: String,
    pub progress: String,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub cache: CacheMetadata,
}

/// Service, repair and upgrade records share one wire shape.
macro_rules! maintenance_record {
    ($($(#[$doc:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
            #[serde(rename_all = "camelCase")]
            pub struct $name {
                pub id: i64,
                pub vehicle_id: i64,
                pub date: NaiveDate,
                pub mileage: i64,
                pub description: String,
                #[serde(default)]
                pub cost: f64,
                #[serde(default)]
                pub notes: Option<String>,
                #[serde(default)]
                pub cache: CacheMetadata,
            }
        )+
    };
}

maintenance_record!(
    /// Scheduled maintenance performed on a vehicle.
    ServiceRecord,
    /// Unscheduled repair work.
    RepairRecord,
    /// Aftermarket upgrade.
    UpgradeRecord,
);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRecord {
    pub id: i64,
    pub vehicle_id: i64,
    pub date: NaiveDate,
    pub description: String,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub cache: CacheMetadata,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasRecord {
    pub id: i64,
    pub vehicle_id: i64,
    pub date: NaiveDate,
    pub mileage: i64,
    pub gallons: f64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub is_fill_to_full: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub cache: CacheMetadata,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: i64,
    pub vehicle_id: i64,
    pub description: String,
    pub urgency: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_mileage: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub cache: CacheMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreference {
    pub id: i64,
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub cache: CacheMetadata,
}

impl_cached_entity!(
    Vehicle => Vehicle,
    OdometerRecord => OdometerRecord,
    PlanRecord => PlanRecord,
    ServiceRecord => ServiceRecord,
    RepairRecord => RepairRecord,
    UpgradeRecord => UpgradeRecord,
    TaxRecord => TaxRecord,
    GasRecord => GasRecord,
    Reminder => Reminder,
    UserPreference => UserPreference,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::CachedEntity;
    use crate::types::{EntityType, SyncStatus};

    #[test]
    fn remote_payload_without_cache_metadata_deserializes() {
        let json = r#"{"id":7,"year":2019,"make":"Mazda","model":"3","licensePlate":"ABC123"}"#;
        let vehicle: Vehicle = serde_json::from_str(json).unwrap();

        assert_eq!(vehicle.id, 7);
        assert_eq!(vehicle.license_plate, "ABC123");
        assert_eq!(vehicle.cache, CacheMetadata::default());
        assert_eq!(Vehicle::ENTITY_TYPE, EntityType::Vehicle);
    }

    #[test]
    fn apply_remote_keeps_local_metadata() {
        let mut local = ServiceRecord {
            id: 4,
            description: "oil change".into(),
            cache: CacheMetadata::pending_upload(),
            ..ServiceRecord::default()
        };
        let remote = ServiceRecord {
            id: 4,
            description: "oil and filter".into(),
            mileage: 42_000,
            ..ServiceRecord::default()
        };

        local.apply_remote(&remote);

        assert_eq!(local.description, "oil and filter");
        assert_eq!(local.mileage, 42_000);
        assert_eq!(local.metadata().sync_status, SyncStatus::PendingUpload);
        assert!(local.metadata().is_dirty);
    }

    #[test]
    fn set_id_rewrites_identity() {
        let mut reminder = Reminder { id: -1, ..Reminder::default() };
        reminder.set_id(55);
        assert_eq!(reminder.id(), 55);
        assert_eq!(<Reminder as CachedEntity>::ENTITY_TYPE.name(), "Reminder");
    }
}
