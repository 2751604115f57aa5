use crate::application::ports::{PushOutcome, StoreCount, SyncPersistence};
use crate::application::services::sync_queue::SyncQueue;
use crate::domain::entities::{ConflictDraft, LocalEntityRecord, SyncQueueItem};
use crate::domain::value_objects::{
    ConflictType, EntityId, EntityPayload, StoreKey, SyncOperation,
};
use crate::shared::error::{EngineError, Result};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// What happened to an incoming server snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotOutcome {
    /// The record was clean (or unknown); the snapshot was applied
    /// directly.
    Applied,
    /// The record is dirty but the server has not moved since the last
    /// sync: no conflict, the pending item just has not been pushed yet.
    PendingPush,
    /// Both sides changed. The divergence must be recorded in the
    /// conflict store; the record is frozen until it is resolved.
    Conflict(ConflictDraft),
    /// An unresolved conflict is already open for this entity; no second
    /// one is created.
    AlreadyConflicted,
}

/// Per-store collections of entity snapshots with local sync metadata.
/// Local mutations are written optimistically, marked dirty, and queued
/// for push in the same transaction.
pub struct RecordStore {
    persistence: Arc<dyn SyncPersistence>,
    queue: Arc<SyncQueue>,
}

impl RecordStore {
    pub fn new(persistence: Arc<dyn SyncPersistence>, queue: Arc<SyncQueue>) -> Self {
        Self { persistence, queue }
    }

    /// Inserts or updates an entity locally. Entities created offline
    /// get a temporary local id until the server assigns a permanent
    /// one. Record and queue item are persisted atomically.
    pub async fn put(
        &self,
        store: &StoreKey,
        id: Option<EntityId>,
        data: EntityPayload,
    ) -> Result<LocalEntityRecord> {
        let now = Utc::now();
        let (record, operation) = match &id {
            Some(id) => match self.persistence.get_record(store, id).await? {
                Some(mut existing) => {
                    existing.apply_local_edit(data, now);
                    (existing, SyncOperation::Update)
                }
                None => (
                    LocalEntityRecord::new_local(store.clone(), id.clone(), data, now),
                    SyncOperation::Create,
                ),
            },
            None => (
                LocalEntityRecord::new_local(store.clone(), EntityId::new_local(), data, now),
                SyncOperation::Create,
            ),
        };

        let queue_item = self
            .queue
            .plan_enqueue(store, &record.id, operation, Some(record.data.clone()))
            .await?;
        self.persistence
            .save_local_mutation(&record, queue_item.as_ref())
            .await?;
        self.queue.refresh_count().await?;
        debug!(store = %store, entity = %record.id, version = record.local_version, "local mutation stored");
        Ok(record)
    }

    /// Registers a local delete intent. The record stays as a dirty
    /// tombstone until the delete is pushed, unless the entity only ever
    /// existed locally, in which case everything is dropped outright.
    pub async fn delete(&self, store: &StoreKey, id: &EntityId) -> Result<()> {
        let Some(mut record) = self.persistence.get_record(store, id).await? else {
            return Err(EngineError::NotFound(format!(
                "record {store}/{id} does not exist"
            )));
        };

        let queue_item = self
            .queue
            .plan_enqueue(store, id, SyncOperation::Delete, None)
            .await?;
        match queue_item {
            Some(item) => {
                record.local_version += 1;
                record.local_timestamp = Utc::now();
                record.dirty = true;
                self.persistence
                    .save_local_mutation(&record, Some(&item))
                    .await?;
            }
            None => {
                // Queued create annihilated: the server never saw this
                // entity, so the local snapshot goes with it.
                self.persistence.delete_queue_item(store, id).await?;
                self.persistence.delete_record(store, id).await?;
            }
        }
        self.queue.refresh_count().await?;
        Ok(())
    }

    pub async fn get(&self, store: &StoreKey, id: &EntityId) -> Result<Option<LocalEntityRecord>> {
        self.persistence.get_record(store, id).await
    }

    pub async fn list(&self, store: &StoreKey) -> Result<Vec<LocalEntityRecord>> {
        self.persistence.list_records(store).await
    }

    /// Reconciles one server change against the local record. Dirty
    /// records are never overwritten directly; a genuine concurrent edit
    /// comes back as `SnapshotOutcome::Conflict` for the conflict store.
    pub async fn apply_server_snapshot(
        &self,
        store: &StoreKey,
        id: &EntityId,
        server_data: Option<EntityPayload>,
        server_version: i64,
        server_timestamp: DateTime<Utc>,
    ) -> Result<SnapshotOutcome> {
        let existing = self.persistence.get_record(store, id).await?;

        let Some(mut record) = existing else {
            // First sight of this entity.
            if let Some(data) = server_data {
                let record = LocalEntityRecord::from_server(
                    store.clone(),
                    id.clone(),
                    data,
                    server_version,
                    server_timestamp,
                    Utc::now(),
                );
                self.persistence.upsert_record(&record).await?;
            }
            return Ok(SnapshotOutcome::Applied);
        };

        if !record.dirty {
            match server_data {
                Some(data) => {
                    record.accept_server_snapshot(data, server_version, server_timestamp);
                    self.persistence.upsert_record(&record).await?;
                }
                None => {
                    self.persistence.delete_record(store, id).await?;
                }
            }
            return Ok(SnapshotOutcome::Applied);
        }

        // Dirty record: only a server that moved past our last common
        // version makes this a real conflict.
        if let Some(known) = record.server_timestamp {
            if server_timestamp <= known {
                return Ok(SnapshotOutcome::PendingPush);
            }
        }

        if self
            .persistence
            .find_unresolved_conflict(store, id)
            .await?
            .is_some()
        {
            return Ok(SnapshotOutcome::AlreadyConflicted);
        }

        let pending_operation = self
            .persistence
            .get_queue_item(store, id)
            .await?
            .map(|item| item.operation);
        let local_deleted = pending_operation == Some(SyncOperation::Delete);

        if local_deleted && server_data.is_none() {
            // Both sides deleted: nothing to adjudicate.
            self.persistence.delete_queue_item(store, id).await?;
            self.persistence.delete_record(store, id).await?;
            self.queue.refresh_count().await?;
            return Ok(SnapshotOutcome::Applied);
        }

        let conflict_type = if local_deleted {
            ConflictType::DeleteUpdate
        } else if server_data.is_none() {
            ConflictType::UpdateDelete
        } else {
            ConflictType::UpdateUpdate
        };

        let draft = ConflictDraft {
            store: store.clone(),
            entity_id: id.clone(),
            conflict_type,
            local_data: if local_deleted {
                None
            } else {
                Some(record.data.clone())
            },
            server_data,
            server_version: Some(server_version),
            local_timestamp: record.local_timestamp,
            server_timestamp,
        };
        Ok(SnapshotOutcome::Conflict(draft))
    }

    /// Commits a server acknowledgment for one pushed item: confirms the
    /// server version/timestamp and adopts the permanent id the server
    /// assigned to an offline create.
    pub async fn confirm_push(
        &self,
        pushed: &SyncQueueItem,
        outcome: &PushOutcome,
    ) -> Result<()> {
        let PushOutcome::Acknowledged {
            id,
            server_version,
            server_timestamp,
        } = outcome
        else {
            return Ok(());
        };

        if pushed.operation == SyncOperation::Delete {
            self.persistence
                .delete_record(&pushed.store, &pushed.entity_id)
                .await?;
            return Ok(());
        }

        let Some(mut record) = self
            .persistence
            .get_record(&pushed.store, &pushed.entity_id)
            .await?
        else {
            return Ok(());
        };

        if id != &pushed.entity_id {
            info!(
                store = %pushed.store,
                local = %pushed.entity_id,
                assigned = %id,
                "adopting server-assigned id for offline create"
            );
            self.persistence
                .delete_record(&pushed.store, &pushed.entity_id)
                .await?;
            record.id = id.clone();
        }

        record.server_version = Some(*server_version);
        record.server_timestamp = Some(*server_timestamp);
        // A local edit that landed during the push keeps the record
        // dirty; otherwise the pushed payload is now the server truth.
        record.dirty = Some(&record.data) != pushed.payload.as_ref();
        self.persistence.upsert_record(&record).await?;
        Ok(())
    }

    /// Removes clean records older than the retention window. Dirty
    /// records are kept no matter how old they are.
    pub async fn purge_older_than(&self, age_days: u32) -> Result<u64> {
        let cutoff = Utc::now() - Duration::days(i64::from(age_days));
        let purged = self.persistence.purge_clean_records_before(cutoff).await?;
        if purged > 0 {
            info!(purged, age_days, "purged records past offline retention");
        }
        Ok(purged)
    }

    pub async fn counts_by_store(&self) -> Result<Vec<StoreCount>> {
        self.persistence.record_counts_by_store().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::status_facade::StatusHub;
    use crate::domain::entities::SyncSettings;
    use crate::infrastructure::storage::SqlitePersistence;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::RwLock;

    async fn setup() -> (RecordStore, Arc<dyn SyncPersistence>) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let persistence = SqlitePersistence::new(pool);
        persistence.initialize_schema().await.unwrap();
        let persistence: Arc<dyn SyncPersistence> = Arc::new(persistence);
        let queue = Arc::new(SyncQueue::new(
            persistence.clone(),
            Arc::new(RwLock::new(SyncSettings::default())),
            Arc::new(StatusHub::new()),
        ));
        (RecordStore::new(persistence.clone(), queue), persistence)
    }

    fn store() -> StoreKey {
        StoreKey::new("manutencoes".to_string()).unwrap()
    }

    fn payload(value: serde_json::Value) -> EntityPayload {
        EntityPayload::new(value).unwrap()
    }

    #[tokio::test]
    async fn put_marks_dirty_and_enqueues() {
        let (records, persistence) = setup().await;

        let record = records
            .put(&store(), None, payload(json!({"titulo": "Troca de lampada"})))
            .await
            .unwrap();

        assert!(record.dirty);
        assert!(record.id.is_local());
        assert_eq!(record.local_version, 1);

        let item = persistence
            .get_queue_item(&store(), &record.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.operation, SyncOperation::Create);
    }

    #[tokio::test]
    async fn clean_records_accept_server_snapshots_directly() {
        let (records, _) = setup().await;
        let id = EntityId::new("m-1".to_string()).unwrap();
        let t1 = Utc::now();

        let outcome = records
            .apply_server_snapshot(&store(), &id, Some(payload(json!({"titulo": "A"}))), 1, t1)
            .await
            .unwrap();
        assert_eq!(outcome, SnapshotOutcome::Applied);

        let record = records.get(&store(), &id).await.unwrap().unwrap();
        assert!(!record.dirty);
        assert_eq!(record.server_version, Some(1));
    }

    #[tokio::test]
    async fn dirty_record_with_unmoved_server_is_pending_push() {
        let (records, _) = setup().await;
        let id = EntityId::new("m-2".to_string()).unwrap();
        let t1 = Utc::now();

        records
            .apply_server_snapshot(&store(), &id, Some(payload(json!({"titulo": "A"}))), 1, t1)
            .await
            .unwrap();
        records
            .put(&store(), Some(id.clone()), payload(json!({"titulo": "B"})))
            .await
            .unwrap();

        // Server re-sends the same snapshot it already gave us.
        let outcome = records
            .apply_server_snapshot(&store(), &id, Some(payload(json!({"titulo": "A"}))), 1, t1)
            .await
            .unwrap();
        assert_eq!(outcome, SnapshotOutcome::PendingPush);

        let record = records.get(&store(), &id).await.unwrap().unwrap();
        assert_eq!(record.data, payload(json!({"titulo": "B"})));
    }

    #[tokio::test]
    async fn dirty_record_with_newer_server_yields_conflict_not_overwrite() {
        let (records, _) = setup().await;
        let id = EntityId::new("m-3".to_string()).unwrap();
        let t1 = Utc::now();
        let t2 = t1 + Duration::seconds(10);

        records
            .apply_server_snapshot(&store(), &id, Some(payload(json!({"titulo": "A"}))), 1, t1)
            .await
            .unwrap();
        records
            .put(&store(), Some(id.clone()), payload(json!({"titulo": "B"})))
            .await
            .unwrap();

        let outcome = records
            .apply_server_snapshot(&store(), &id, Some(payload(json!({"titulo": "C"}))), 2, t2)
            .await
            .unwrap();

        let SnapshotOutcome::Conflict(draft) = outcome else {
            panic!("expected conflict, got {outcome:?}");
        };
        assert_eq!(draft.conflict_type, ConflictType::UpdateUpdate);
        assert_eq!(draft.local_data, Some(payload(json!({"titulo": "B"}))));
        assert_eq!(draft.server_data, Some(payload(json!({"titulo": "C"}))));

        // The local data was not silently overwritten.
        let record = records.get(&store(), &id).await.unwrap().unwrap();
        assert_eq!(record.data, payload(json!({"titulo": "B"})));
        assert!(record.dirty);
    }

    #[tokio::test]
    async fn server_delete_of_dirty_record_is_update_delete_conflict() {
        let (records, _) = setup().await;
        let id = EntityId::new("m-4".to_string()).unwrap();
        let t1 = Utc::now();
        let t2 = t1 + Duration::seconds(10);

        records
            .apply_server_snapshot(&store(), &id, Some(payload(json!({"titulo": "A"}))), 1, t1)
            .await
            .unwrap();
        records
            .put(&store(), Some(id.clone()), payload(json!({"titulo": "B"})))
            .await
            .unwrap();

        let outcome = records
            .apply_server_snapshot(&store(), &id, None, 2, t2)
            .await
            .unwrap();

        let SnapshotOutcome::Conflict(draft) = outcome else {
            panic!("expected conflict, got {outcome:?}");
        };
        assert_eq!(draft.conflict_type, ConflictType::UpdateDelete);
        assert!(draft.server_data.is_none());
    }

    #[tokio::test]
    async fn purge_never_touches_dirty_records() {
        let (records, persistence) = setup().await;
        let id_clean = EntityId::new("old-clean".to_string()).unwrap();
        let id_dirty = EntityId::new("old-dirty".to_string()).unwrap();
        let long_ago = Utc::now() - Duration::days(90);

        records
            .apply_server_snapshot(
                &store(),
                &id_clean,
                Some(payload(json!({"titulo": "A"}))),
                1,
                long_ago,
            )
            .await
            .unwrap();
        records
            .apply_server_snapshot(
                &store(),
                &id_dirty,
                Some(payload(json!({"titulo": "B"}))),
                1,
                long_ago,
            )
            .await
            .unwrap();
        records
            .put(&store(), Some(id_dirty.clone()), payload(json!({"titulo": "B2"})))
            .await
            .unwrap();

        let purged = records.purge_older_than(30).await.unwrap();
        assert_eq!(purged, 1);

        assert!(records.get(&store(), &id_clean).await.unwrap().is_none());
        assert!(records.get(&store(), &id_dirty).await.unwrap().is_some());
        let _ = persistence;
    }

    #[tokio::test]
    async fn confirm_push_adopts_server_assigned_id() {
        let (records, persistence) = setup().await;

        let record = records
            .put(&store(), None, payload(json!({"titulo": "Nova OS"})))
            .await
            .unwrap();
        let item = persistence
            .get_queue_item(&store(), &record.id)
            .await
            .unwrap()
            .unwrap();

        let assigned = EntityId::new("srv-77".to_string()).unwrap();
        let outcome = PushOutcome::Acknowledged {
            id: assigned.clone(),
            server_version: 1,
            server_timestamp: Utc::now(),
        };
        records.confirm_push(&item, &outcome).await.unwrap();

        assert!(records.get(&store(), &record.id).await.unwrap().is_none());
        let adopted = records.get(&store(), &assigned).await.unwrap().unwrap();
        assert!(!adopted.dirty);
        assert_eq!(adopted.server_version, Some(1));
    }
}
