//! SQLite-backed persistence. One database file holds the cached
//! records, the mutation queue, the conflict history, and the settings
//! document.

use crate::application::ports::{StoreCount, SyncPersistence};
use crate::domain::entities::{ConflictItem, LocalEntityRecord, SyncQueueItem, SyncSettings};
use crate::domain::value_objects::{EntityId, Resolution, StoreKey};
use crate::infrastructure::storage::rows::{
    to_millis, ConflictRow, LocalRecordRow, StoreCountRow, SyncQueueItemRow,
};
use crate::shared::error::{EngineError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::Sqlite;
use uuid::Uuid;

const SETTINGS_KEY: &str = "global";

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS local_records (
        store TEXT NOT NULL,
        entity_id TEXT NOT NULL,
        data TEXT NOT NULL,
        local_version INTEGER NOT NULL,
        local_timestamp INTEGER NOT NULL,
        server_version INTEGER,
        server_timestamp INTEGER,
        dirty INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (store, entity_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_local_records_dirty ON local_records (dirty)",
    "CREATE TABLE IF NOT EXISTS sync_queue (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        store TEXT NOT NULL,
        entity_id TEXT NOT NULL,
        operation TEXT NOT NULL,
        payload TEXT,
        enqueued_at INTEGER NOT NULL,
        attempts INTEGER NOT NULL DEFAULT 0,
        last_error TEXT,
        failed INTEGER NOT NULL DEFAULT 0,
        UNIQUE (store, entity_id)
    )",
    "CREATE TABLE IF NOT EXISTS conflicts (
        id TEXT PRIMARY KEY,
        store TEXT NOT NULL,
        entity_id TEXT NOT NULL,
        conflict_type TEXT NOT NULL,
        local_data TEXT,
        server_data TEXT,
        server_version INTEGER,
        local_timestamp INTEGER NOT NULL,
        server_timestamp INTEGER NOT NULL,
        resolved INTEGER NOT NULL DEFAULT 0,
        resolution TEXT,
        resolved_at INTEGER
    )",
    "CREATE INDEX IF NOT EXISTS idx_conflicts_entity
        ON conflicts (store, entity_id, resolved)",
    "CREATE TABLE IF NOT EXISTS sync_settings (
        settings_key TEXT PRIMARY KEY,
        payload TEXT NOT NULL
    )",
];

pub struct SqlitePersistence {
    pool: SqlitePool,
}

impl SqlitePersistence {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn initialize_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn payload_json(record: &LocalEntityRecord) -> Result<String> {
    Ok(serde_json::to_string(&record.data)?)
}

async fn upsert_record_with<'e, E>(executor: E, record: &LocalEntityRecord) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO local_records
            (store, entity_id, data, local_version, local_timestamp,
             server_version, server_timestamp, dirty)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (store, entity_id) DO UPDATE SET
            data = excluded.data,
            local_version = excluded.local_version,
            local_timestamp = excluded.local_timestamp,
            server_version = excluded.server_version,
            server_timestamp = excluded.server_timestamp,
            dirty = excluded.dirty",
    )
    .bind(record.store.as_str())
    .bind(record.id.as_str())
    .bind(payload_json(record)?)
    .bind(record.local_version)
    .bind(to_millis(record.local_timestamp))
    .bind(record.server_version)
    .bind(record.server_timestamp.map(to_millis))
    .bind(record.dirty)
    .execute(executor)
    .await?;
    Ok(())
}

async fn upsert_queue_item_with<'e, E>(executor: E, item: &SyncQueueItem) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let payload = item
        .payload
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    sqlx::query(
        "INSERT INTO sync_queue
            (store, entity_id, operation, payload, enqueued_at,
             attempts, last_error, failed)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (store, entity_id) DO UPDATE SET
            operation = excluded.operation,
            payload = excluded.payload,
            enqueued_at = excluded.enqueued_at,
            attempts = excluded.attempts,
            last_error = excluded.last_error,
            failed = excluded.failed",
    )
    .bind(item.store.as_str())
    .bind(item.entity_id.as_str())
    .bind(item.operation.as_str())
    .bind(payload)
    .bind(to_millis(item.enqueued_at))
    .bind(item.attempts as i64)
    .bind(item.last_error.as_deref())
    .bind(item.failed)
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl SyncPersistence for SqlitePersistence {
    async fn upsert_record(&self, record: &LocalEntityRecord) -> Result<()> {
        upsert_record_with(&self.pool, record).await
    }

    async fn get_record(
        &self,
        store: &StoreKey,
        id: &EntityId,
    ) -> Result<Option<LocalEntityRecord>> {
        let row = sqlx::query_as::<_, LocalRecordRow>(
            "SELECT store, entity_id, data, local_version, local_timestamp,
                    server_version, server_timestamp, dirty
             FROM local_records WHERE store = ? AND entity_id = ?",
        )
        .bind(store.as_str())
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(LocalEntityRecord::try_from).transpose()
    }

    async fn list_records(&self, store: &StoreKey) -> Result<Vec<LocalEntityRecord>> {
        let rows = sqlx::query_as::<_, LocalRecordRow>(
            "SELECT store, entity_id, data, local_version, local_timestamp,
                    server_version, server_timestamp, dirty
             FROM local_records WHERE store = ?
             ORDER BY local_timestamp DESC, entity_id ASC",
        )
        .bind(store.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(LocalEntityRecord::try_from).collect()
    }

    async fn delete_record(&self, store: &StoreKey, id: &EntityId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM local_records WHERE store = ? AND entity_id = ?")
            .bind(store.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_clean_records_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM local_records
             WHERE dirty = 0
               AND server_timestamp IS NOT NULL
               AND server_timestamp < ?",
        )
        .bind(to_millis(cutoff))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn record_counts_by_store(&self) -> Result<Vec<StoreCount>> {
        let rows = sqlx::query_as::<_, StoreCountRow>(
            "SELECT store, COUNT(*) AS records
             FROM local_records GROUP BY store ORDER BY store ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| {
                Ok(StoreCount {
                    store: StoreKey::new(row.store).map_err(EngineError::Database)?,
                    records: row.records,
                })
            })
            .collect()
    }

    async fn save_local_mutation(
        &self,
        record: &LocalEntityRecord,
        queue_item: Option<&SyncQueueItem>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        upsert_record_with(&mut *tx, record).await?;
        match queue_item {
            Some(item) => upsert_queue_item_with(&mut *tx, item).await?,
            None => {
                sqlx::query("DELETE FROM sync_queue WHERE store = ? AND entity_id = ?")
                    .bind(record.store.as_str())
                    .bind(record.id.as_str())
                    .execute(&mut *tx)
                    .await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn upsert_queue_item(&self, item: &SyncQueueItem) -> Result<()> {
        upsert_queue_item_with(&self.pool, item).await
    }

    async fn get_queue_item(
        &self,
        store: &StoreKey,
        id: &EntityId,
    ) -> Result<Option<SyncQueueItem>> {
        let row = sqlx::query_as::<_, SyncQueueItemRow>(
            "SELECT store, entity_id, operation, payload, enqueued_at,
                    attempts, last_error, failed
             FROM sync_queue WHERE store = ? AND entity_id = ?",
        )
        .bind(store.as_str())
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(SyncQueueItem::try_from).transpose()
    }

    async fn delete_queue_item(&self, store: &StoreKey, id: &EntityId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sync_queue WHERE store = ? AND entity_id = ?")
            .bind(store.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_pushable_queue_items(
        &self,
        store: &StoreKey,
        max_items: u32,
    ) -> Result<Vec<SyncQueueItem>> {
        let rows = sqlx::query_as::<_, SyncQueueItemRow>(
            "SELECT q.store, q.entity_id, q.operation, q.payload, q.enqueued_at,
                    q.attempts, q.last_error, q.failed
             FROM sync_queue q
             WHERE q.store = ?
               AND q.failed = 0
               AND NOT EXISTS (
                   SELECT 1 FROM conflicts c
                   WHERE c.store = q.store
                     AND c.entity_id = q.entity_id
                     AND c.resolved = 0
               )
             ORDER BY q.enqueued_at ASC, q.id ASC
             LIMIT ?",
        )
        .bind(store.as_str())
        .bind(max_items as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(SyncQueueItem::try_from).collect()
    }

    async fn pending_queue_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_queue WHERE failed = 0")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_hard_failures(&self) -> Result<Vec<SyncQueueItem>> {
        let rows = sqlx::query_as::<_, SyncQueueItemRow>(
            "SELECT store, entity_id, operation, payload, enqueued_at,
                    attempts, last_error, failed
             FROM sync_queue WHERE failed = 1
             ORDER BY enqueued_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(SyncQueueItem::try_from).collect()
    }

    async fn insert_conflict(&self, conflict: &ConflictItem) -> Result<()> {
        let local_data = conflict
            .local_data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let server_data = conflict
            .server_data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        sqlx::query(
            "INSERT INTO conflicts
                (id, store, entity_id, conflict_type, local_data, server_data,
                 server_version, local_timestamp, server_timestamp,
                 resolved, resolution, resolved_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(conflict.id.to_string())
        .bind(conflict.store.as_str())
        .bind(conflict.entity_id.as_str())
        .bind(conflict.conflict_type.as_str())
        .bind(local_data)
        .bind(server_data)
        .bind(conflict.server_version)
        .bind(to_millis(conflict.local_timestamp))
        .bind(to_millis(conflict.server_timestamp))
        .bind(conflict.resolved)
        .bind(conflict.resolution.map(|r| r.as_str().to_string()))
        .bind(conflict.resolved_at.map(to_millis))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_conflict(&self, id: Uuid) -> Result<Option<ConflictItem>> {
        let row = sqlx::query_as::<_, ConflictRow>(
            "SELECT id, store, entity_id, conflict_type, local_data, server_data,
                    server_version, local_timestamp, server_timestamp,
                    resolved, resolution, resolved_at
             FROM conflicts WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(ConflictItem::try_from).transpose()
    }

    async fn find_unresolved_conflict(
        &self,
        store: &StoreKey,
        id: &EntityId,
    ) -> Result<Option<ConflictItem>> {
        let row = sqlx::query_as::<_, ConflictRow>(
            "SELECT id, store, entity_id, conflict_type, local_data, server_data,
                    server_version, local_timestamp, server_timestamp,
                    resolved, resolution, resolved_at
             FROM conflicts
             WHERE store = ? AND entity_id = ? AND resolved = 0
             ORDER BY rowid ASC LIMIT 1",
        )
        .bind(store.as_str())
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(ConflictItem::try_from).transpose()
    }

    async fn list_conflicts(&self, resolved: bool) -> Result<Vec<ConflictItem>> {
        let rows = sqlx::query_as::<_, ConflictRow>(
            "SELECT id, store, entity_id, conflict_type, local_data, server_data,
                    server_version, local_timestamp, server_timestamp,
                    resolved, resolution, resolved_at
             FROM conflicts WHERE resolved = ?
             ORDER BY rowid ASC",
        )
        .bind(resolved)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ConflictItem::try_from).collect()
    }

    async fn unresolved_conflict_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conflicts WHERE resolved = 0")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn mark_conflict_resolved(
        &self,
        id: Uuid,
        resolution: Resolution,
        resolved_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE conflicts SET resolved = 1, resolution = ?, resolved_at = ?
             WHERE id = ? AND resolved = 0",
        )
        .bind(resolution.as_str())
        .bind(to_millis(resolved_at))
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn load_settings(&self) -> Result<Option<SyncSettings>> {
        let payload: Option<String> =
            sqlx::query_scalar("SELECT payload FROM sync_settings WHERE settings_key = ?")
                .bind(SETTINGS_KEY)
                .fetch_optional(&self.pool)
                .await?;
        payload
            .map(|json| serde_json::from_str(&json).map_err(EngineError::from))
            .transpose()
    }

    async fn save_settings(&self, settings: &SyncSettings) -> Result<()> {
        let payload = serde_json::to_string(settings)?;
        sqlx::query(
            "INSERT INTO sync_settings (settings_key, payload) VALUES (?, ?)
             ON CONFLICT (settings_key) DO UPDATE SET payload = excluded.payload",
        )
        .bind(SETTINGS_KEY)
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear_business_data(&self, keep_dirty: bool) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut removed = 0u64;
        if keep_dirty {
            removed += sqlx::query("DELETE FROM local_records WHERE dirty = 0")
                .execute(&mut *tx)
                .await?
                .rows_affected();
            // Queue items and open conflicts describe unpushed local
            // work; only resolved history is disposable.
            removed += sqlx::query("DELETE FROM conflicts WHERE resolved = 1")
                .execute(&mut *tx)
                .await?
                .rows_affected();
        } else {
            removed += sqlx::query("DELETE FROM local_records")
                .execute(&mut *tx)
                .await?
                .rows_affected();
            removed += sqlx::query("DELETE FROM sync_queue")
                .execute(&mut *tx)
                .await?
                .rows_affected();
            removed += sqlx::query("DELETE FROM conflicts")
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{ConflictType, EntityPayload, SyncOperation};
    use crate::domain::entities::ConflictDraft;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup() -> SqlitePersistence {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let persistence = SqlitePersistence::new(pool);
        persistence.initialize_schema().await.unwrap();
        persistence
    }

    fn store(name: &str) -> StoreKey {
        StoreKey::new(name.to_string()).unwrap()
    }

    fn id(value: &str) -> EntityId {
        EntityId::new(value.to_string()).unwrap()
    }

    fn payload(value: serde_json::Value) -> EntityPayload {
        EntityPayload::new(value).unwrap()
    }

    fn dirty_record(store_name: &str, entity: &str) -> LocalEntityRecord {
        LocalEntityRecord::new_local(
            store(store_name),
            id(entity),
            payload(json!({"titulo": "x"})),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn record_round_trips_with_metadata() {
        let persistence = setup().await;
        let mut record = dirty_record("ordensServico", "os-1");
        record.accept_server_snapshot(payload(json!({"titulo": "y"})), 7, Utc::now());

        persistence.upsert_record(&record).await.unwrap();
        let loaded = persistence
            .get_record(&record.store, &record.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(loaded.server_version, Some(7));
        assert!(!loaded.dirty);
        assert_eq!(loaded.data, record.data);
        // Millisecond precision survives the epoch round trip.
        assert_eq!(
            loaded.local_timestamp.timestamp_millis(),
            record.local_timestamp.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn local_mutation_persists_record_and_queue_atomically() {
        let persistence = setup().await;
        let record = dirty_record("ordensServico", "os-1");
        let item = SyncQueueItem::new(
            record.store.clone(),
            record.id.clone(),
            SyncOperation::Update,
            Some(record.data.clone()),
            Utc::now(),
        );

        persistence
            .save_local_mutation(&record, Some(&item))
            .await
            .unwrap();

        assert!(persistence
            .get_record(&record.store, &record.id)
            .await
            .unwrap()
            .is_some());
        assert!(persistence
            .get_queue_item(&record.store, &record.id)
            .await
            .unwrap()
            .is_some());

        // A second mutation with no queue item drops the pending push.
        persistence.save_local_mutation(&record, None).await.unwrap();
        assert!(persistence
            .get_queue_item(&record.store, &record.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn pushable_items_skip_entities_with_open_conflicts() {
        let persistence = setup().await;
        let frozen = SyncQueueItem::new(
            store("ordensServico"),
            id("os-1"),
            SyncOperation::Update,
            Some(payload(json!({"titulo": "a"}))),
            Utc::now(),
        );
        let free = SyncQueueItem::new(
            store("ordensServico"),
            id("os-2"),
            SyncOperation::Update,
            Some(payload(json!({"titulo": "b"}))),
            Utc::now(),
        );
        persistence.upsert_queue_item(&frozen).await.unwrap();
        persistence.upsert_queue_item(&free).await.unwrap();

        let conflict = ConflictItem::from_draft(ConflictDraft {
            store: store("ordensServico"),
            entity_id: id("os-1"),
            conflict_type: ConflictType::UpdateUpdate,
            local_data: Some(payload(json!({"titulo": "a"}))),
            server_data: Some(payload(json!({"titulo": "s"}))),
            server_version: Some(2),
            local_timestamp: Utc::now(),
            server_timestamp: Utc::now(),
        });
        persistence.insert_conflict(&conflict).await.unwrap();

        let pushable = persistence
            .list_pushable_queue_items(&store("ordensServico"), 10)
            .await
            .unwrap();
        assert_eq!(pushable.len(), 1);
        assert_eq!(pushable[0].entity_id, id("os-2"));

        // Resolving the conflict unfreezes the item.
        persistence
            .mark_conflict_resolved(conflict.id, Resolution::Local, Utc::now())
            .await
            .unwrap();
        let pushable = persistence
            .list_pushable_queue_items(&store("ordensServico"), 10)
            .await
            .unwrap();
        assert_eq!(pushable.len(), 2);
    }

    #[tokio::test]
    async fn resolving_twice_reports_already_resolved() {
        let persistence = setup().await;
        let conflict = ConflictItem::from_draft(ConflictDraft {
            store: store("timelines"),
            entity_id: id("t-1"),
            conflict_type: ConflictType::UpdateDelete,
            local_data: Some(payload(json!({"texto": "oi"}))),
            server_data: None,
            server_version: None,
            local_timestamp: Utc::now(),
            server_timestamp: Utc::now(),
        });
        persistence.insert_conflict(&conflict).await.unwrap();

        assert!(persistence
            .mark_conflict_resolved(conflict.id, Resolution::Local, Utc::now())
            .await
            .unwrap());
        assert!(!persistence
            .mark_conflict_resolved(conflict.id, Resolution::Server, Utc::now())
            .await
            .unwrap());

        let stored = persistence.get_conflict(conflict.id).await.unwrap().unwrap();
        assert_eq!(stored.resolution, Some(Resolution::Local));
    }

    #[tokio::test]
    async fn purge_never_touches_dirty_records() {
        let persistence = setup().await;
        let old = Utc::now() - chrono::Duration::days(90);

        let mut stale_clean = dirty_record("boletos", "b-1");
        stale_clean.accept_server_snapshot(payload(json!({"valor": 10})), 1, old);
        let mut stale_dirty = dirty_record("boletos", "b-2");
        stale_dirty.server_timestamp = Some(old);
        persistence.upsert_record(&stale_clean).await.unwrap();
        persistence.upsert_record(&stale_dirty).await.unwrap();

        let removed = persistence
            .purge_clean_records_before(Utc::now() - chrono::Duration::days(30))
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert!(persistence
            .get_record(&store("boletos"), &id("b-2"))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn settings_survive_as_a_single_document() {
        let persistence = setup().await;
        assert!(persistence.load_settings().await.unwrap().is_none());

        let mut settings = SyncSettings::default();
        settings.global_auto_sync = false;
        settings.max_retry_attempts = 9;
        persistence.save_settings(&settings).await.unwrap();

        let loaded = persistence.load_settings().await.unwrap().unwrap();
        assert_eq!(loaded, settings);
    }

    #[tokio::test]
    async fn clear_without_force_keeps_unpushed_work() {
        let persistence = setup().await;
        let mut clean = dirty_record("documentos", "d-1");
        clean.accept_server_snapshot(payload(json!({"nome": "ata"})), 1, Utc::now());
        let dirty = dirty_record("documentos", "d-2");
        persistence.upsert_record(&clean).await.unwrap();
        persistence.upsert_record(&dirty).await.unwrap();
        let item = SyncQueueItem::new(
            dirty.store.clone(),
            dirty.id.clone(),
            SyncOperation::Create,
            Some(dirty.data.clone()),
            Utc::now(),
        );
        persistence.upsert_queue_item(&item).await.unwrap();

        persistence.clear_business_data(true).await.unwrap();

        assert!(persistence
            .get_record(&store("documentos"), &id("d-1"))
            .await
            .unwrap()
            .is_none());
        assert!(persistence
            .get_record(&store("documentos"), &id("d-2"))
            .await
            .unwrap()
            .is_some());
        assert_eq!(persistence.pending_queue_count().await.unwrap(), 1);

        persistence.clear_business_data(false).await.unwrap();
        assert_eq!(persistence.pending_queue_count().await.unwrap(), 0);
        assert!(persistence
            .get_record(&store("documentos"), &id("d-2"))
            .await
            .unwrap()
            .is_none());
    }
}
