//! Raw table rows and their conversions into domain types. Timestamps
//! are stored as epoch milliseconds; payloads as JSON text.

use crate::domain::entities::{ConflictItem, LocalEntityRecord, SyncQueueItem};
use crate::domain::value_objects::{
    ConflictType, EntityId, EntityPayload, Resolution, StoreKey, SyncOperation,
};
use crate::shared::error::EngineError;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

pub(crate) fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> Result<DateTime<Utc>, EngineError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| EngineError::Database(format!("Timestamp out of range: {ms}")))
}

fn corrupt(detail: String) -> EngineError {
    EngineError::Database(format!("Corrupt row: {detail}"))
}

#[derive(Debug, FromRow)]
pub(crate) struct LocalRecordRow {
    pub store: String,
    pub entity_id: String,
    pub data: String,
    pub local_version: i64,
    pub local_timestamp: i64,
    pub server_version: Option<i64>,
    pub server_timestamp: Option<i64>,
    pub dirty: bool,
}

impl TryFrom<LocalRecordRow> for LocalEntityRecord {
    type Error = EngineError;

    fn try_from(row: LocalRecordRow) -> Result<Self, Self::Error> {
        Ok(LocalEntityRecord {
            store: StoreKey::new(row.store).map_err(corrupt)?,
            id: EntityId::new(row.entity_id).map_err(corrupt)?,
            data: EntityPayload::from_json_str(&row.data).map_err(corrupt)?,
            local_version: row.local_version,
            local_timestamp: from_millis(row.local_timestamp)?,
            server_version: row.server_version,
            server_timestamp: row.server_timestamp.map(from_millis).transpose()?,
            dirty: row.dirty,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct SyncQueueItemRow {
    pub store: String,
    pub entity_id: String,
    pub operation: String,
    pub payload: Option<String>,
    pub enqueued_at: i64,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub failed: bool,
}

impl TryFrom<SyncQueueItemRow> for SyncQueueItem {
    type Error = EngineError;

    fn try_from(row: SyncQueueItemRow) -> Result<Self, Self::Error> {
        Ok(SyncQueueItem {
            store: StoreKey::new(row.store).map_err(corrupt)?,
            entity_id: EntityId::new(row.entity_id).map_err(corrupt)?,
            operation: SyncOperation::parse(&row.operation).map_err(corrupt)?,
            payload: row
                .payload
                .as_deref()
                .map(EntityPayload::from_json_str)
                .transpose()
                .map_err(corrupt)?,
            enqueued_at: from_millis(row.enqueued_at)?,
            attempts: row.attempts.max(0) as u32,
            last_error: row.last_error,
            failed: row.failed,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ConflictRow {
    pub id: String,
    pub store: String,
    pub entity_id: String,
    pub conflict_type: String,
    pub local_data: Option<String>,
    pub server_data: Option<String>,
    pub server_version: Option<i64>,
    pub local_timestamp: i64,
    pub server_timestamp: i64,
    pub resolved: bool,
    pub resolution: Option<String>,
    pub resolved_at: Option<i64>,
}

impl TryFrom<ConflictRow> for ConflictItem {
    type Error = EngineError;

    fn try_from(row: ConflictRow) -> Result<Self, Self::Error> {
        Ok(ConflictItem {
            id: Uuid::parse_str(&row.id).map_err(|e| corrupt(e.to_string()))?,
            store: StoreKey::new(row.store).map_err(corrupt)?,
            entity_id: EntityId::new(row.entity_id).map_err(corrupt)?,
            conflict_type: ConflictType::parse(&row.conflict_type).map_err(corrupt)?,
            local_data: row
                .local_data
                .as_deref()
                .map(EntityPayload::from_json_str)
                .transpose()
                .map_err(corrupt)?,
            server_data: row
                .server_data
                .as_deref()
                .map(EntityPayload::from_json_str)
                .transpose()
                .map_err(corrupt)?,
            server_version: row.server_version,
            local_timestamp: from_millis(row.local_timestamp)?,
            server_timestamp: from_millis(row.server_timestamp)?,
            resolved: row.resolved,
            resolution: row
                .resolution
                .as_deref()
                .map(Resolution::parse)
                .transpose()
                .map_err(corrupt)?,
            resolved_at: row.resolved_at.map(from_millis).transpose()?,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct StoreCountRow {
    pub store: String,
    pub records: i64,
}
