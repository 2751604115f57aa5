use crate::domain::value_objects::{
    ConflictType, EntityId, EntityPayload, Resolution, StoreKey,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Divergence detected between a dirty local record and a newer server
/// snapshot. Both sides are handed to the conflict store by the pull
/// phase of a sync cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConflictDraft {
    pub store: StoreKey,
    pub entity_id: EntityId,
    pub conflict_type: ConflictType,
    /// Absent when the local side is a pending delete.
    pub local_data: Option<EntityPayload>,
    /// Absent when the server side deleted the entity.
    pub server_data: Option<EntityPayload>,
    /// Version reported with the server snapshot, kept so a
    /// resolve-with-server can commit the snapshot as confirmed.
    pub server_version: Option<i64>,
    pub local_timestamp: DateTime<Utc>,
    pub server_timestamp: DateTime<Utc>,
}

/// One detected divergence event, created exactly once. Resolved items
/// are immutable history: a later divergence opens a new item rather than
/// reopening this one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConflictItem {
    pub id: Uuid,
    pub store: StoreKey,
    pub entity_id: EntityId,
    pub conflict_type: ConflictType,
    pub local_data: Option<EntityPayload>,
    pub server_data: Option<EntityPayload>,
    pub server_version: Option<i64>,
    pub local_timestamp: DateTime<Utc>,
    pub server_timestamp: DateTime<Utc>,
    pub resolved: bool,
    pub resolution: Option<Resolution>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ConflictItem {
    pub fn from_draft(draft: ConflictDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            store: draft.store,
            entity_id: draft.entity_id,
            conflict_type: draft.conflict_type,
            local_data: draft.local_data,
            server_data: draft.server_data,
            server_version: draft.server_version,
            local_timestamp: draft.local_timestamp,
            server_timestamp: draft.server_timestamp,
            resolved: false,
            resolution: None,
            resolved_at: None,
        }
    }
}
