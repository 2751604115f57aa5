use crate::domain::value_objects::{EntityId, EntityPayload, StoreKey, SyncOperation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One pending local mutation awaiting transmission.
///
/// At most one item exists per (store, entity_id); later mutations
/// coalesce into it, keeping the first `enqueued_at` and the `attempts`
/// counter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncQueueItem {
    pub store: StoreKey,
    pub entity_id: EntityId,
    pub operation: SyncOperation,
    /// Absent for delete operations.
    pub payload: Option<EntityPayload>,
    pub enqueued_at: DateTime<Utc>,
    pub attempts: u32,
    pub last_error: Option<String>,
    /// Set once `attempts` exceeds the retry ceiling; the item is then
    /// surfaced as a hard failure instead of being retried.
    pub failed: bool,
}

impl SyncQueueItem {
    pub fn new(
        store: StoreKey,
        entity_id: EntityId,
        operation: SyncOperation,
        payload: Option<EntityPayload>,
        enqueued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            store,
            entity_id,
            operation,
            payload,
            enqueued_at,
            attempts: 0,
            last_error: None,
            failed: false,
        }
    }

    /// Folds a newer mutation into this pending item.
    ///
    /// Returns `false` when the pair annihilates (a create followed by a
    /// delete: the server never saw the entity, so nothing needs pushing).
    /// A create followed by an update stays a create carrying the newer
    /// payload, because the server has no id to update yet.
    pub fn coalesce(
        &mut self,
        operation: SyncOperation,
        payload: Option<EntityPayload>,
    ) -> bool {
        match (self.operation, operation) {
            (SyncOperation::Create, SyncOperation::Delete) => false,
            (SyncOperation::Create, SyncOperation::Update) => {
                self.payload = payload;
                true
            }
            _ => {
                self.operation = operation;
                self.payload = payload;
                true
            }
        }
    }

    /// Records one failed transmission attempt.
    pub fn register_failure(&mut self, error: String, retry_ceiling: u32) {
        self.attempts += 1;
        self.last_error = Some(error);
        if self.attempts >= retry_ceiling {
            self.failed = true;
        }
    }
}
