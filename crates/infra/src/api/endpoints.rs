//! Endpoint paths per resource family

use lubesync_domain::EntityType;

/// Paths for the five operations of one resource family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEndpoints {
    pub list: String,
    pub get: String,
    pub add: String,
    pub update: String,
    pub delete: String,
}

impl ResourceEndpoints {
    /// Standard layout under `/api/{family}`.
    pub fn under(root: &str) -> Self {
        let root = root.trim_end_matches('/');
        Self {
            list: root.to_string(),
            get: format!("{root}/get"),
            add: format!("{root}/add"),
            update: format!("{root}/update"),
            delete: format!("{root}/delete"),
        }
    }

    pub fn for_entity(entity_type: EntityType) -> Self {
        Self::under(&format!("/api/{}", family(entity_type)))
    }
}

/// URL segment of the resource family serving `entity_type`.
pub const fn family(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Vehicle => "vehicles",
        EntityType::OdometerRecord => "odometerrecords",
        EntityType::PlanRecord => "planrecords",
        EntityType::ServiceRecord => "servicerecords",
        EntityType::RepairRecord => "repairrecords",
        EntityType::UpgradeRecord => "upgraderecords",
        EntityType::TaxRecord => "taxrecords",
        EntityType::GasRecord => "gasrecords",
        EntityType::Reminder => "reminders",
        EntityType::UserPreference => "preferences",
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn service_records_layout() {
        let endpoints = ResourceEndpoints::for_entity(EntityType::ServiceRecord);
        assert_eq!(endpoints.list, "/api/servicerecords");
        assert_eq!(endpoints.get, "/api/servicerecords/get");
        assert_eq!(endpoints.add, "/api/servicerecords/add");
        assert_eq!(endpoints.update, "/api/servicerecords/update");
        assert_eq!(endpoints.delete, "/api/servicerecords/delete");
    }

    #[test]
    fn every_type_has_its_own_family() {
        let families: HashSet<_> = EntityType::ALL.into_iter().map(family).collect();
        assert_eq!(families.len(), EntityType::ALL.len());
    }
}
