use crate::application::ports::SyncPersistence;
use crate::application::services::record_store::RecordStore;
use crate::application::services::status_facade::StatusHub;
use crate::application::services::sync_queue::SyncQueue;
use crate::domain::entities::{ConflictDraft, ConflictItem, LocalEntityRecord};
use crate::domain::field_comparator;
use crate::domain::value_objects::{BulkStrategy, EntityPayload, Resolution, SyncOperation};
use crate::shared::error::{EngineError, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Pending and resolved conflicts, split for the adjudication UI.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictOverview {
    pub pending: Vec<ConflictItem>,
    pub resolved: Vec<ConflictItem>,
}

/// Result of one resolve call.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    Resolved {
        resolution: Resolution,
        /// True when the resolved snapshot differs from the server's and
        /// was re-queued for push.
        requeued: bool,
    },
    /// The conflict was already resolved; nothing changed (guards
    /// against double-submission).
    AlreadyResolved,
}

/// Holds detected conflicts and applies resolution strategies, committing
/// the outcome back to the record store.
pub struct ConflictService {
    persistence: Arc<dyn SyncPersistence>,
    records: Arc<RecordStore>,
    queue: Arc<SyncQueue>,
    hub: Arc<StatusHub>,
}

impl ConflictService {
    pub fn new(
        persistence: Arc<dyn SyncPersistence>,
        records: Arc<RecordStore>,
        queue: Arc<SyncQueue>,
        hub: Arc<StatusHub>,
    ) -> Self {
        Self {
            persistence,
            records,
            queue,
            hub,
        }
    }

    /// Stores a divergence detected during pull. At most one unresolved
    /// conflict exists per entity; a duplicate detection returns the
    /// already-open item.
    pub async fn record_conflict(&self, draft: ConflictDraft) -> Result<ConflictItem> {
        if let Some(open) = self
            .persistence
            .find_unresolved_conflict(&draft.store, &draft.entity_id)
            .await?
        {
            debug!(store = %draft.store, entity = %draft.entity_id, "conflict already open");
            return Ok(open);
        }

        let conflict = ConflictItem::from_draft(draft);
        self.persistence.insert_conflict(&conflict).await?;
        info!(
            store = %conflict.store,
            entity = %conflict.entity_id,
            kind = %conflict.conflict_type,
            "conflict recorded for adjudication"
        );
        self.refresh_pending_count().await?;
        Ok(conflict)
    }

    pub async fn list_conflicts(&self) -> Result<ConflictOverview> {
        Ok(ConflictOverview {
            pending: self.persistence.list_conflicts(false).await?,
            resolved: self.persistence.list_conflicts(true).await?,
        })
    }

    pub async fn pending_count(&self) -> Result<i64> {
        self.persistence.unresolved_conflict_count().await
    }

    /// Applies one resolution and commits the outcome. Resolving an
    /// already-resolved conflict is a no-op that leaves history intact.
    pub async fn resolve(
        &self,
        conflict_id: Uuid,
        resolution: Resolution,
    ) -> Result<ResolutionOutcome> {
        let Some(conflict) = self.persistence.get_conflict(conflict_id).await? else {
            return Err(EngineError::NotFound(format!(
                "conflict {conflict_id} does not exist"
            )));
        };
        if conflict.resolved {
            return Ok(ResolutionOutcome::AlreadyResolved);
        }

        // Commit the outcome before flipping the conflict row. A storage
        // failure mid-commit leaves the conflict open and the entity
        // frozen, so the call can simply be retried.
        let resolved_data = Self::resolved_data(&conflict, resolution);
        let requeued = self.commit(&conflict, resolved_data).await?;
        if !self
            .persistence
            .mark_conflict_resolved(conflict_id, resolution, Utc::now())
            .await?
        {
            return Ok(ResolutionOutcome::AlreadyResolved);
        }

        info!(
            store = %conflict.store,
            entity = %conflict.entity_id,
            resolution = %resolution,
            requeued,
            "conflict resolved"
        );
        self.refresh_pending_count().await?;
        self.queue.refresh_count().await?;
        Ok(ResolutionOutcome::Resolved {
            resolution,
            requeued,
        })
    }

    /// Applies one bulk rule across every pending conflict, so a user
    /// back from a long offline stretch is not forced to adjudicate one
    /// item at a time. Timestamp ties resolve to local.
    pub async fn resolve_all(&self, strategy: BulkStrategy) -> Result<Vec<(Uuid, Resolution)>> {
        let pending = self.persistence.list_conflicts(false).await?;
        let mut applied = Vec::with_capacity(pending.len());
        for conflict in pending {
            let resolution = Self::pick_resolution(&conflict, strategy);
            self.resolve(conflict.id, resolution).await?;
            applied.push((conflict.id, resolution));
        }
        Ok(applied)
    }

    /// Resolves one conflict with a bulk rule; used by the scheduler
    /// when a non-manual default policy is configured.
    pub async fn resolve_with_strategy(
        &self,
        conflict_id: Uuid,
        strategy: BulkStrategy,
    ) -> Result<ResolutionOutcome> {
        let Some(conflict) = self.persistence.get_conflict(conflict_id).await? else {
            return Err(EngineError::NotFound(format!(
                "conflict {conflict_id} does not exist"
            )));
        };
        let resolution = Self::pick_resolution(&conflict, strategy);
        self.resolve(conflict_id, resolution).await
    }

    fn pick_resolution(conflict: &ConflictItem, strategy: BulkStrategy) -> Resolution {
        match strategy {
            BulkStrategy::Local => Resolution::Local,
            BulkStrategy::Server => Resolution::Server,
            BulkStrategy::Newest => {
                if conflict.local_timestamp >= conflict.server_timestamp {
                    Resolution::Local
                } else {
                    Resolution::Server
                }
            }
            BulkStrategy::Oldest => {
                if conflict.local_timestamp <= conflict.server_timestamp {
                    Resolution::Local
                } else {
                    Resolution::Server
                }
            }
        }
    }

    /// Final snapshot produced by a resolution choice. `None` means the
    /// entity ends up deleted.
    fn resolved_data(conflict: &ConflictItem, resolution: Resolution) -> Option<EntityPayload> {
        match resolution {
            Resolution::Local => conflict.local_data.clone(),
            Resolution::Server => conflict.server_data.clone(),
            Resolution::Merge => match (&conflict.local_data, &conflict.server_data) {
                (Some(local), Some(server)) => {
                    Some(field_comparator::merge_conflict_data(local, server))
                }
                // Merge degenerates to the surviving side of a delete
                // conflict, keeping the local choice when both exist.
                (Some(local), None) => Some(local.clone()),
                (None, server) => server.clone(),
            },
        }
    }

    /// Writes the resolved snapshot back. Returns whether a push was
    /// re-queued.
    async fn commit(
        &self,
        conflict: &ConflictItem,
        resolved_data: Option<EntityPayload>,
    ) -> Result<bool> {
        // Matching the server exactly means there is nothing left to
        // push: confirm the server snapshot and drop the queued item.
        if resolved_data == conflict.server_data {
            match &conflict.server_data {
                Some(server_data) => {
                    let record = match self
                        .records
                        .get(&conflict.store, &conflict.entity_id)
                        .await?
                    {
                        Some(mut record) => {
                            record.accept_server_snapshot(
                                server_data.clone(),
                                conflict.server_version.unwrap_or(0),
                                conflict.server_timestamp,
                            );
                            record
                        }
                        None => LocalEntityRecord::from_server(
                            conflict.store.clone(),
                            conflict.entity_id.clone(),
                            server_data.clone(),
                            conflict.server_version.unwrap_or(0),
                            conflict.server_timestamp,
                            Utc::now(),
                        ),
                    };
                    self.persistence.upsert_record(&record).await?;
                }
                None => {
                    self.persistence
                        .delete_record(&conflict.store, &conflict.entity_id)
                        .await?;
                }
            }
            self.persistence
                .delete_queue_item(&conflict.store, &conflict.entity_id)
                .await?;
            return Ok(false);
        }

        match resolved_data {
            Some(data) => {
                // Differs from the server: store it as a fresh local
                // mutation so it is pushed on the next cycle.
                let mut record = self
                    .records
                    .put(&conflict.store, Some(conflict.entity_id.clone()), data)
                    .await?;
                self.adopt_server_state(&mut record, conflict).await?;
            }
            None => {
                // Local delete prevailed; make sure the delete intent is
                // still queued now that the entity is unfrozen.
                self.queue
                    .enqueue(
                        &conflict.store,
                        &conflict.entity_id,
                        SyncOperation::Delete,
                        None,
                    )
                    .await?;
                if let Some(mut record) = self
                    .records
                    .get(&conflict.store, &conflict.entity_id)
                    .await?
                {
                    self.adopt_server_state(&mut record, conflict).await?;
                }
            }
        }
        Ok(true)
    }

    /// Records the adjudicated snapshot as the last known server state.
    /// The record stays dirty; this only moves the reconciliation
    /// baseline so a re-delivered copy of the same server change reads
    /// as already seen instead of as a fresh divergence.
    async fn adopt_server_state(
        &self,
        record: &mut LocalEntityRecord,
        conflict: &ConflictItem,
    ) -> Result<()> {
        record.server_version = conflict.server_version.or(record.server_version);
        record.server_timestamp = Some(conflict.server_timestamp);
        self.persistence.upsert_record(record).await
    }

    async fn refresh_pending_count(&self) -> Result<()> {
        let count = self.persistence.unresolved_conflict_count().await?;
        self.hub.set_pending_conflicts(count);
        Ok(())
    }
}
