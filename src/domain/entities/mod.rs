pub mod conflict_item;
pub mod local_record;
pub mod sync_config;
pub mod sync_queue_item;

pub use conflict_item::{ConflictDraft, ConflictItem};
pub use local_record::LocalEntityRecord;
pub use sync_config::{ModuleSyncConfig, SyncSettings};
pub use sync_queue_item::SyncQueueItem;
