use crate::domain::value_objects::{EntityId, EntityPayload, StoreKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One business object cached on the client, with the local metadata the
/// reconciliation protocol needs.
///
/// Invariant: `dirty == false` means `data` is identical to the last known
/// server snapshot. A dirty record may diverge and is a conflict candidate
/// on the next pull.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalEntityRecord {
    pub store: StoreKey,
    pub id: EntityId,
    pub data: EntityPayload,
    /// Monotonically increasing counter bumped on every local mutation.
    pub local_version: i64,
    pub local_timestamp: DateTime<Utc>,
    /// Last values confirmed by the server; `None` until first sync.
    pub server_version: Option<i64>,
    pub server_timestamp: Option<DateTime<Utc>>,
    pub dirty: bool,
}

impl LocalEntityRecord {
    /// Fresh record created by a local mutation that the server has never
    /// seen.
    pub fn new_local(store: StoreKey, id: EntityId, data: EntityPayload, now: DateTime<Utc>) -> Self {
        Self {
            store,
            id,
            data,
            local_version: 1,
            local_timestamp: now,
            server_version: None,
            server_timestamp: None,
            dirty: true,
        }
    }

    /// Record materialized from a server snapshot on first pull.
    pub fn from_server(
        store: StoreKey,
        id: EntityId,
        data: EntityPayload,
        server_version: i64,
        server_timestamp: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            store,
            id,
            data,
            local_version: 0,
            local_timestamp: now,
            server_version: Some(server_version),
            server_timestamp: Some(server_timestamp),
            dirty: false,
        }
    }

    /// Applies a local edit: bumps the version, stamps the clock, marks
    /// the record dirty.
    pub fn apply_local_edit(&mut self, data: EntityPayload, now: DateTime<Utc>) {
        self.data = data;
        self.local_version += 1;
        self.local_timestamp = now;
        self.dirty = true;
    }

    /// Accepts a server snapshot verbatim, returning the record to the
    /// clean state.
    pub fn accept_server_snapshot(
        &mut self,
        data: EntityPayload,
        server_version: i64,
        server_timestamp: DateTime<Utc>,
    ) {
        self.data = data;
        self.server_version = Some(server_version);
        self.server_timestamp = Some(server_timestamp);
        self.dirty = false;
    }
}
