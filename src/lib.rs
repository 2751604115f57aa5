//! Offline-first synchronization engine for a condominium-management
//! client: a local SQLite cache with optimistic writes, a coalescing
//! push queue, pull-based conflict detection, and user-adjudicated
//! conflict resolution.

pub mod application;
pub mod domain;
pub mod engine;
pub mod infrastructure;
pub mod shared;

pub use application::ports::{
    PushOutcome, RemoteChange, RemoteDataService, StoreCount, SyncPersistence,
};
pub use application::services::{
    ConflictOverview, ConflictService, ModuleSyncOutcome, OfflineStats, RecordStore,
    ResolutionOutcome, SnapshotOutcome, SyncQueue, SyncReport, SyncScheduler, SyncStatusFacade,
    SyncStatusSnapshot,
};
pub use domain::entities::{
    ConflictDraft, ConflictItem, LocalEntityRecord, ModuleSyncConfig, SyncQueueItem, SyncSettings,
};
pub use domain::value_objects::{
    BulkStrategy, ConflictResolutionPolicy, ConflictType, EntityId, EntityPayload, ModuleKey,
    ModuleState, Resolution, StoreKey, SyncOperation, SyncPriority,
};
pub use engine::SyncEngine;
pub use shared::error::{EngineError, Result};
