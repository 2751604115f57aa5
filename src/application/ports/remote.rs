use crate::domain::value_objects::{EntityId, EntityPayload, StoreKey, SyncOperation};
use crate::shared::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One record change reported by the server. `data: None` means the
/// server deleted the entity.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteChange {
    pub id: EntityId,
    pub data: Option<EntityPayload>,
    pub server_version: i64,
    pub server_timestamp: DateTime<Utc>,
}

/// Outcome of pushing one queued mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    Acknowledged {
        /// Permanent id assigned by the server when the pushed entity
        /// carried a locally-generated temporary id.
        id: EntityId,
        server_version: i64,
        server_timestamp: DateTime<Utc>,
    },
    /// The server refused the mutation for a non-transient reason
    /// (validation, authorization). Counted against the retry ceiling.
    Rejected { reason: String },
}

/// The remote data service, an opaque collaborator across the network
/// boundary. Errors from these calls are transient network failures;
/// non-transient refusals come back as `PushOutcome::Rejected`.
#[async_trait]
pub trait RemoteDataService: Send + Sync {
    async fn fetch_since(
        &self,
        store: &StoreKey,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<RemoteChange>>;

    async fn push(
        &self,
        store: &StoreKey,
        operation: SyncOperation,
        id: &EntityId,
        payload: Option<&EntityPayload>,
    ) -> Result<PushOutcome>;
}
