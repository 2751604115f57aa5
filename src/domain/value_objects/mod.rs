pub mod conflict_type;
pub mod entity_id;
pub mod module_key;
pub mod module_state;
pub mod payload;
pub mod resolution;
pub mod store_key;
pub mod sync_operation;
pub mod sync_priority;

pub use conflict_type::ConflictType;
pub use entity_id::EntityId;
pub use module_key::ModuleKey;
pub use module_state::ModuleState;
pub use payload::EntityPayload;
pub use resolution::{BulkStrategy, ConflictResolutionPolicy, Resolution};
pub use store_key::StoreKey;
pub use sync_operation::SyncOperation;
pub use sync_priority::SyncPriority;
