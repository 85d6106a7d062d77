//! SQLite implementation of the entity store port
//!
//! Every record kind shares the `cached_entities` table, keyed by
//! `(entity_type, id)`. The record itself is kept as JSON; the sync columns
//! mirror its metadata for inspection and indexing.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use lubesync_core::cache::ports::{EntityFilter, EntityStore};
use lubesync_domain::{CachedEntity, LubeSyncError, Result};
use rusqlite::{named_params, params, Connection, OptionalExtension};

use super::manager::{map_sql_error, DbManager};

const UPSERT_SQL: &str = "INSERT INTO cached_entities
        (entity_type, id, sync_status, is_dirty, expiration_ts, payload_json)
     VALUES (:entity_type, :id, :sync_status, :is_dirty, :expiration_ts, :payload_json)
     ON CONFLICT (entity_type, id) DO UPDATE SET
        sync_status = excluded.sync_status,
        is_dirty = excluded.is_dirty,
        expiration_ts = excluded.expiration_ts,
        payload_json = excluded.payload_json";

/// Column values for one record.
struct StoredRow {
    entity_type: &'static str,
    id: i64,
    sync_status: &'static str,
    is_dirty: bool,
    expiration_ts: Option<i64>,
    payload_json: String,
}

impl StoredRow {
    fn from_entity<T: CachedEntity>(entity: &T) -> Result<Self> {
        let metadata = entity.metadata();
        Ok(Self {
            entity_type: T::ENTITY_TYPE.name(),
            id: entity.id(),
            sync_status: metadata.sync_status.as_str(),
            is_dirty: metadata.is_dirty,
            expiration_ts: metadata.expires_at.map(|expires_at| expires_at.timestamp()),
            payload_json: serde_json::to_string(entity)?,
        })
    }
}

/// Durable store for records of type `T`.
pub struct SqliteEntityStore<T> {
    db: Arc<DbManager>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: CachedEntity> SqliteEntityStore<T> {
    /// The schema must already exist; see [`DbManager::run_migrations`].
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db, _entity: PhantomData }
    }

    async fn blocking<R, F>(&self, task: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            task(&conn)
        })
        .await
        .map_err(|e| LubeSyncError::Internal(format!("store task failed: {e}")))?
    }
}

#[async_trait]
impl<T: CachedEntity> EntityStore<T> for SqliteEntityStore<T> {
    async fn find(&self, id: i64) -> Result<Option<T>> {
        let entity_type = T::ENTITY_TYPE.name();
        let payload: Option<String> = self
            .blocking(move |conn| {
                conn.query_row(
                    "SELECT payload_json FROM cached_entities WHERE entity_type = ?1 AND id = ?2",
                    params![entity_type, id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(map_sql_error)
            })
            .await?;

        Ok(payload.map(|json| serde_json::from_str(&json)).transpose()?)
    }

    async fn add(&self, entity: &T) -> Result<()> {
        let row = StoredRow::from_entity(entity)?;
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO cached_entities
                    (entity_type, id, sync_status, is_dirty, expiration_ts, payload_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    row.entity_type,
                    row.id,
                    row.sync_status,
                    row.is_dirty,
                    row.expiration_ts,
                    row.payload_json
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }

    async fn update(&self, entity: &T) -> Result<()> {
        let row = StoredRow::from_entity(entity)?;
        self.blocking(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE cached_entities
                     SET sync_status = ?3, is_dirty = ?4, expiration_ts = ?5, payload_json = ?6
                     WHERE entity_type = ?1 AND id = ?2",
                    params![
                        row.entity_type,
                        row.id,
                        row.sync_status,
                        row.is_dirty,
                        row.expiration_ts,
                        row.payload_json
                    ],
                )
                .map_err(map_sql_error)?;
            if changed == 0 {
                return Err(LubeSyncError::NotFound(format!("{} {}", row.entity_type, row.id)));
            }
            Ok(())
        })
        .await
    }

    async fn remove(&self, id: i64) -> Result<bool> {
        let entity_type = T::ENTITY_TYPE.name();
        self.blocking(move |conn| {
            let removed = conn
                .execute(
                    "DELETE FROM cached_entities WHERE entity_type = ?1 AND id = ?2",
                    params![entity_type, id],
                )
                .map_err(map_sql_error)?;
            Ok(removed > 0)
        })
        .await
    }

    async fn query(&self, filter: EntityFilter<'_, T>) -> Result<Vec<T>> {
        let entity_type = T::ENTITY_TYPE.name();
        let payloads: Vec<String> = self
            .blocking(move |conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT payload_json FROM cached_entities WHERE entity_type = ?1 ORDER BY id",
                    )
                    .map_err(map_sql_error)?;
                let rows = stmt
                    .query_map(params![entity_type], |row| row.get(0))
                    .map_err(map_sql_error)?
                    .collect::<rusqlite::Result<Vec<String>>>()
                    .map_err(map_sql_error)?;
                Ok(rows)
            })
            .await?;

        let mut matching = Vec::new();
        for json in payloads {
            let entity: T = serde_json::from_str(&json)?;
            if filter(&entity) {
                matching.push(entity);
            }
        }
        Ok(matching)
    }

    async fn upsert(&self, entity: &T) -> Result<()> {
        let row = StoredRow::from_entity(entity)?;
        self.blocking(move |conn| {
            conn.execute(
                UPSERT_SQL,
                named_params! {
                    ":entity_type": row.entity_type,
                    ":id": row.id,
                    ":sync_status": row.sync_status,
                    ":is_dirty": row.is_dirty,
                    ":expiration_ts": row.expiration_ts,
                    ":payload_json": row.payload_json,
                },
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }
}
