use std::collections::HashMap;

use lubesync_domain::constants::{DEFAULT_EXPIRATION_MINUTES, DEFAULT_SYNC_PRIORITY};
use lubesync_domain::{CacheConfiguration, EntityType};
use parking_lot::RwLock;
use tracing::debug;

/// Per-type cache configuration, keyed by entity type name.
///
/// Seeded once at startup and read-mostly afterwards.
#[derive(Debug)]
pub struct CacheConfigurations {
    rows: RwLock<HashMap<String, CacheConfiguration>>,
}

impl Default for CacheConfigurations {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl CacheConfigurations {
    /// Registry without any rows; every lookup falls back to defaults.
    pub fn empty() -> Self {
        Self { rows: RwLock::new(HashMap::new()) }
    }

    /// Registry holding the seeded default rows.
    pub fn with_defaults() -> Self {
        Self::with_overrides(Vec::new())
    }

    /// Seed defaults, then apply `overrides` row by row.
    pub fn with_overrides(overrides: Vec<CacheConfiguration>) -> Self {
        let registry = Self::empty();
        for row in CacheConfiguration::seed_defaults().into_iter().chain(overrides) {
            registry.upsert(row);
        }
        registry
    }

    pub fn upsert(&self, row: CacheConfiguration) {
        debug!(
            entity_type = %row.entity_type_name,
            expiration_minutes = row.expiration_minutes,
            priority = row.sync_priority,
            "cache_configuration_upserted"
        );
        self.rows.write().insert(row.entity_type_name.clone(), row);
    }

    pub fn get(&self, entity_type_name: &str) -> Option<CacheConfiguration> {
        self.rows.read().get(entity_type_name).cloned()
    }

    /// Configured lifetime in minutes, 60 when unconfigured.
    pub fn expiration_minutes(&self, entity_type: EntityType) -> i64 {
        self.rows
            .read()
            .get(entity_type.name())
            .map_or(DEFAULT_EXPIRATION_MINUTES, |row| row.expiration_minutes)
    }

    pub fn is_critical(&self, entity_type: EntityType) -> bool {
        self.rows.read().get(entity_type.name()).is_some_and(|row| row.is_critical)
    }

    /// Configured priority; unconfigured types sort last.
    pub fn sync_priority(&self, entity_type: EntityType) -> u32 {
        self.rows
            .read()
            .get(entity_type.name())
            .map_or(DEFAULT_SYNC_PRIORITY, |row| row.sync_priority)
    }

    /// All rows by ascending priority, ties broken by type name.
    pub fn ordered(&self) -> Vec<CacheConfiguration> {
        let mut rows: Vec<_> = self.rows.read().values().cloned().collect();
        rows.sort_by(|a, b| {
            a.sync_priority
                .cmp(&b.sync_priority)
                .then_with(|| a.entity_type_name.cmp(&b.entity_type_name))
        });
        rows
    }
}
