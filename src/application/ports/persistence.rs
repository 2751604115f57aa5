use crate::domain::entities::{ConflictItem, LocalEntityRecord, SyncQueueItem, SyncSettings};
use crate::domain::value_objects::{EntityId, Resolution, StoreKey};
use crate::shared::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Per-store record count, backing the offline statistics view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCount {
    pub store: StoreKey,
    pub records: i64,
}

/// Durable storage behind the engine. Every method persists before
/// returning; implementations must make the paired record+queue write of
/// a local mutation atomic.
///
/// The concrete store ships as SQLite via sqlx, but nothing outside
/// `infrastructure` may assume that.
#[async_trait]
pub trait SyncPersistence: Send + Sync {
    // Local records
    async fn upsert_record(&self, record: &LocalEntityRecord) -> Result<()>;
    async fn get_record(&self, store: &StoreKey, id: &EntityId)
        -> Result<Option<LocalEntityRecord>>;
    async fn list_records(&self, store: &StoreKey) -> Result<Vec<LocalEntityRecord>>;
    async fn delete_record(&self, store: &StoreKey, id: &EntityId) -> Result<bool>;
    /// Removes clean records whose server timestamp predates the cutoff.
    /// Dirty records are never touched, regardless of age.
    async fn purge_clean_records_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
    async fn record_counts_by_store(&self) -> Result<Vec<StoreCount>>;

    /// Atomically persists a local mutation: the record plus its
    /// coalesced queue item (`None` deletes any pending item, for the
    /// create-then-delete annihilation case).
    async fn save_local_mutation(
        &self,
        record: &LocalEntityRecord,
        queue_item: Option<&SyncQueueItem>,
    ) -> Result<()>;

    // Sync queue
    async fn upsert_queue_item(&self, item: &SyncQueueItem) -> Result<()>;
    async fn get_queue_item(&self, store: &StoreKey, id: &EntityId)
        -> Result<Option<SyncQueueItem>>;
    async fn delete_queue_item(&self, store: &StoreKey, id: &EntityId) -> Result<bool>;
    /// Pending items for one store in FIFO enqueue order, excluding hard
    /// failures and items frozen behind an unresolved conflict.
    async fn list_pushable_queue_items(
        &self,
        store: &StoreKey,
        max_items: u32,
    ) -> Result<Vec<SyncQueueItem>>;
    async fn pending_queue_count(&self) -> Result<i64>;
    async fn list_hard_failures(&self) -> Result<Vec<SyncQueueItem>>;

    // Conflicts
    async fn insert_conflict(&self, conflict: &ConflictItem) -> Result<()>;
    async fn get_conflict(&self, id: Uuid) -> Result<Option<ConflictItem>>;
    async fn find_unresolved_conflict(
        &self,
        store: &StoreKey,
        id: &EntityId,
    ) -> Result<Option<ConflictItem>>;
    async fn list_conflicts(&self, resolved: bool) -> Result<Vec<ConflictItem>>;
    async fn unresolved_conflict_count(&self) -> Result<i64>;
    /// Marks a conflict resolved. Returns `false` when it was already
    /// resolved; history is never rewritten.
    async fn mark_conflict_resolved(
        &self,
        id: Uuid,
        resolution: Resolution,
        resolved_at: DateTime<Utc>,
    ) -> Result<bool>;

    // Settings
    async fn load_settings(&self) -> Result<Option<SyncSettings>>;
    async fn save_settings(&self, settings: &SyncSettings) -> Result<()>;

    /// Drops cached business data: records, queue items, and resolved
    /// conflict history. With `keep_dirty` set, dirty records and their
    /// queue items survive.
    async fn clear_business_data(&self, keep_dirty: bool) -> Result<u64>;
}
