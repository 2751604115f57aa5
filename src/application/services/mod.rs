pub mod conflict_service;
pub mod record_store;
pub mod scheduler;
pub mod status_facade;
pub mod sync_queue;

pub use conflict_service::{ConflictOverview, ConflictService, ResolutionOutcome};
pub use record_store::{RecordStore, SnapshotOutcome};
pub use scheduler::{ModuleSyncOutcome, SyncReport, SyncScheduler};
pub use status_facade::{OfflineStats, StatusHub, SyncStatusFacade, SyncStatusSnapshot};
pub use sync_queue::SyncQueue;
