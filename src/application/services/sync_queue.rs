use crate::application::ports::SyncPersistence;
use crate::application::services::status_facade::StatusHub;
use crate::domain::entities::{SyncQueueItem, SyncSettings};
use crate::domain::value_objects::{EntityId, EntityPayload, StoreKey, SyncOperation};
use crate::shared::error::Result;
use chrono::Utc;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Ordered list of pending local mutations, coalesced to one item per
/// (store, entity id). Items are only removed on acknowledged push or
/// when a conflict resolution supersedes them.
pub struct SyncQueue {
    persistence: Arc<dyn SyncPersistence>,
    settings: Arc<RwLock<SyncSettings>>,
    hub: Arc<StatusHub>,
}

impl SyncQueue {
    pub fn new(
        persistence: Arc<dyn SyncPersistence>,
        settings: Arc<RwLock<SyncSettings>>,
        hub: Arc<StatusHub>,
    ) -> Self {
        Self {
            persistence,
            settings,
            hub,
        }
    }

    /// Computes the coalesced queue item for a new mutation without
    /// persisting it, so the record store can write record and queue
    /// item in one transaction. `None` means the pending item must be
    /// dropped (create annihilated by delete).
    pub async fn plan_enqueue(
        &self,
        store: &StoreKey,
        entity_id: &EntityId,
        operation: SyncOperation,
        payload: Option<EntityPayload>,
    ) -> Result<Option<SyncQueueItem>> {
        match self.persistence.get_queue_item(store, entity_id).await? {
            Some(mut existing) => {
                if existing.coalesce(operation, payload) {
                    Ok(Some(existing))
                } else {
                    Ok(None)
                }
            }
            None => Ok(Some(SyncQueueItem::new(
                store.clone(),
                entity_id.clone(),
                operation,
                payload,
                Utc::now(),
            ))),
        }
    }

    /// Enqueues a mutation, coalescing with any pending item for the
    /// same entity.
    pub async fn enqueue(
        &self,
        store: &StoreKey,
        entity_id: &EntityId,
        operation: SyncOperation,
        payload: Option<EntityPayload>,
    ) -> Result<Option<SyncQueueItem>> {
        let planned = self
            .plan_enqueue(store, entity_id, operation, payload)
            .await?;
        match &planned {
            Some(item) => self.persistence.upsert_queue_item(item).await?,
            None => {
                self.persistence.delete_queue_item(store, entity_id).await?;
                debug!(store = %store, entity = %entity_id, "queued create annihilated by delete");
            }
        }
        self.refresh_count().await?;
        Ok(planned)
    }

    /// Pushable items for one store in FIFO enqueue order. Items frozen
    /// behind an unresolved conflict or past the retry ceiling are
    /// excluded. Items are not removed here; removal happens on `ack`.
    pub async fn dequeue_batch(
        &self,
        store: &StoreKey,
        max_items: u32,
    ) -> Result<Vec<SyncQueueItem>> {
        self.persistence
            .list_pushable_queue_items(store, max_items)
            .await
    }

    /// Removes the pending item after the server acknowledged the push,
    /// unless a newer local mutation coalesced into it while the push
    /// was in flight (that mutation still needs its own push).
    pub async fn ack_pushed(&self, pushed: &SyncQueueItem) -> Result<()> {
        let current = self
            .persistence
            .get_queue_item(&pushed.store, &pushed.entity_id)
            .await?;
        if let Some(current) = current {
            if current.operation == pushed.operation && current.payload == pushed.payload {
                self.persistence
                    .delete_queue_item(&pushed.store, &pushed.entity_id)
                    .await?;
            } else {
                debug!(
                    store = %pushed.store,
                    entity = %pushed.entity_id,
                    "pending item changed during push; keeping for next cycle"
                );
            }
        }
        self.refresh_count().await?;
        Ok(())
    }

    /// Records a server rejection. Past the retry ceiling the item is
    /// flagged as a hard failure requiring user attention; it is never
    /// silently retried forever nor auto-discarded.
    pub async fn fail(&self, store: &StoreKey, entity_id: &EntityId, error: String) -> Result<()> {
        let Some(mut item) = self.persistence.get_queue_item(store, entity_id).await? else {
            return Ok(());
        };
        let ceiling = self.retry_ceiling();
        item.register_failure(error, ceiling);
        if item.failed {
            warn!(
                store = %store,
                entity = %entity_id,
                attempts = item.attempts,
                "queued mutation exceeded retry ceiling; surfacing as hard failure"
            );
        }
        self.persistence.upsert_queue_item(&item).await?;
        self.refresh_count().await?;
        Ok(())
    }

    pub async fn pending_count(&self) -> Result<i64> {
        self.persistence.pending_queue_count().await
    }

    pub async fn hard_failures(&self) -> Result<Vec<SyncQueueItem>> {
        self.persistence.list_hard_failures().await
    }

    /// Re-reads the pending count and pushes it through the status hub.
    pub async fn refresh_count(&self) -> Result<()> {
        let count = self.persistence.pending_queue_count().await?;
        self.hub.set_queue_count(count);
        Ok(())
    }

    fn retry_ceiling(&self) -> u32 {
        self.settings
            .read()
            .map(|s| s.max_retry_attempts)
            .unwrap_or(5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::SqlitePersistence;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup() -> SyncQueue {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let persistence = SqlitePersistence::new(pool);
        persistence.initialize_schema().await.unwrap();
        SyncQueue::new(
            Arc::new(persistence),
            Arc::new(RwLock::new(SyncSettings::default())),
            Arc::new(StatusHub::new()),
        )
    }

    fn store() -> StoreKey {
        StoreKey::new("ordensServico".to_string()).unwrap()
    }

    fn payload(value: serde_json::Value) -> Option<EntityPayload> {
        Some(EntityPayload::new(value).unwrap())
    }

    #[tokio::test]
    async fn repeated_mutations_coalesce_into_one_item() {
        let queue = setup().await;
        let id = EntityId::new("os-1".to_string()).unwrap();

        queue
            .enqueue(&store(), &id, SyncOperation::Update, payload(json!({"titulo": "A"})))
            .await
            .unwrap();
        let first = queue
            .persistence
            .get_queue_item(&store(), &id)
            .await
            .unwrap()
            .unwrap();

        queue
            .enqueue(&store(), &id, SyncOperation::Update, payload(json!({"titulo": "B"})))
            .await
            .unwrap();
        queue
            .enqueue(&store(), &id, SyncOperation::Update, payload(json!({"titulo": "C"})))
            .await
            .unwrap();

        assert_eq!(queue.pending_count().await.unwrap(), 1);
        let item = queue
            .persistence
            .get_queue_item(&store(), &id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.payload, payload(json!({"titulo": "C"})));
        assert_eq!(item.attempts, 0);
        assert_eq!(item.enqueued_at, first.enqueued_at);
    }

    #[tokio::test]
    async fn create_followed_by_update_stays_a_create() {
        let queue = setup().await;
        let id = EntityId::new_local();

        queue
            .enqueue(&store(), &id, SyncOperation::Create, payload(json!({"titulo": "A"})))
            .await
            .unwrap();
        queue
            .enqueue(&store(), &id, SyncOperation::Update, payload(json!({"titulo": "B"})))
            .await
            .unwrap();

        let item = queue
            .persistence
            .get_queue_item(&store(), &id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.operation, SyncOperation::Create);
        assert_eq!(item.payload, payload(json!({"titulo": "B"})));
    }

    #[tokio::test]
    async fn create_followed_by_delete_annihilates() {
        let queue = setup().await;
        let id = EntityId::new_local();

        queue
            .enqueue(&store(), &id, SyncOperation::Create, payload(json!({"titulo": "A"})))
            .await
            .unwrap();
        let planned = queue
            .enqueue(&store(), &id, SyncOperation::Delete, None)
            .await
            .unwrap();

        assert!(planned.is_none());
        assert_eq!(queue.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failures_past_ceiling_become_hard_failures() {
        let queue = setup().await;
        let id = EntityId::new("os-2".to_string()).unwrap();

        queue
            .enqueue(&store(), &id, SyncOperation::Update, payload(json!({"titulo": "A"})))
            .await
            .unwrap();

        let ceiling = queue.retry_ceiling();
        for _ in 0..ceiling {
            queue
                .fail(&store(), &id, "validation failed".to_string())
                .await
                .unwrap();
        }

        let failures = queue.hard_failures().await.unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].attempts, ceiling);
        assert_eq!(failures[0].last_error.as_deref(), Some("validation failed"));

        // Hard failures are no longer handed out for pushing.
        assert!(queue.dequeue_batch(&store(), 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ack_keeps_item_that_changed_during_push() {
        let queue = setup().await;
        let id = EntityId::new("os-3".to_string()).unwrap();

        let pushed = queue
            .enqueue(&store(), &id, SyncOperation::Update, payload(json!({"titulo": "A"})))
            .await
            .unwrap()
            .unwrap();

        // A newer edit lands while the push is in flight.
        queue
            .enqueue(&store(), &id, SyncOperation::Update, payload(json!({"titulo": "B"})))
            .await
            .unwrap();

        queue.ack_pushed(&pushed).await.unwrap();
        assert_eq!(queue.pending_count().await.unwrap(), 1);
    }
}
